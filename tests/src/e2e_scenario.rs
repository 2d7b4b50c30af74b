//! End-to-end scenario tests for nassec
//!
//! Each test runs primary authentication and the key hierarchy on a UE
//! context and an AMF context independently, then exchanges protected NAS
//! messages over the wire encoding.

use nassec_common::SecurityConfig;
use nassec_crypto::kdf;
use nassec_nas::{
    calculate_eap_aka_prime_mac, decrypt, encrypt, verify_eap_aka_prime_mac, CipheringAlgorithm,
    EapAkaPrime, EapAkaSubType, EapCode, IntegrityAlgorithm, MmMessageType, NasCount,
    NasEndpoint, NasMessage, NasSecurityAlgorithms, NasSecurityContext, SecurityContextState,
    SecurityError, SecurityHeaderType, SmMessageType,
};
use nassec_tests::{init_test_logging, transfer, AuthMethod, TestSubscriber};

fn algs(c: CipheringAlgorithm, i: IntegrityAlgorithm) -> NasSecurityAlgorithms {
    NasSecurityAlgorithms::new(c, i)
}

fn registration_request() -> NasMessage {
    NasMessage::mm(
        MmMessageType::RegistrationRequest,
        hex::decode("7900 0d01 02f8 3900 0000 0000 0000 01".replace(' ', "")).unwrap(),
    )
}

#[test]
fn test_e2e_5g_aka_registration_exchange() {
    init_test_logging();
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2),
        )
        .unwrap();
    assert_eq!(ue.keys().kamf(), amf.keys().kamf());
    assert_eq!(ue.keys().knas_int(), amf.keys().knas_int());

    let smc = NasMessage::mm(MmMessageType::SecurityModeComplete, vec![]);
    let secured = encrypt(&smc, &mut ue).unwrap();
    assert_eq!(
        secured.security_header_type,
        SecurityHeaderType::IntegrityProtectedAndCipheredWithNewSecurityContext
    );
    assert_eq!(decrypt(&secured, &mut amf).unwrap(), Some(smc));

    let accept = NasMessage::mm(MmMessageType::RegistrationAccept, vec![0x01, 0x01]);
    assert_eq!(transfer(&accept, &mut amf, &mut ue).unwrap(), Some(accept));

    let complete = NasMessage::mm(MmMessageType::RegistrationComplete, vec![]);
    assert_eq!(transfer(&complete, &mut ue, &mut amf).unwrap(), Some(complete));

    assert_eq!(ue.uplink_count(), NasCount::new(0, 2));
    assert_eq!(amf.uplink_count(), NasCount::new(0, 1));
    assert_eq!(ue.downlink_count(), NasCount::new(0, 0));
    assert_eq!(amf.downlink_count(), NasCount::new(0, 1));
}

#[test]
fn test_e2e_eap_aka_prime_with_zuc() {
    init_test_logging();
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::EapAkaPrime,
            algs(CipheringAlgorithm::Ea3, IntegrityAlgorithm::Ia3),
        )
        .unwrap();
    assert!(ue.keys().ck_prime().is_some());

    for i in 0..10u8 {
        let up = NasMessage::sm(1, i, SmMessageType::PduSessionEstablishmentRequest, vec![i; 33]);
        assert_eq!(transfer(&up, &mut ue, &mut amf).unwrap(), Some(up));
        let down = NasMessage::mm(MmMessageType::DlNasTransport, vec![i; 7]);
        assert_eq!(transfer(&down, &mut amf, &mut ue).unwrap(), Some(down));
    }
}

#[test]
fn test_e2e_eap_aka_prime_mac_exchange() {
    let subscriber = TestSubscriber::default();
    let mut ue = NasSecurityContext::default();
    let mk = nassec_nas::establish_eap_aka_prime(
        &mut ue,
        &subscriber.ck,
        &subscriber.ik,
        &subscriber.sn_name,
        &subscriber.sqn_xor_ak,
        &subscriber.supi,
    );
    let keys = kdf::split_mk(&mk).unwrap();

    let mut challenge = EapAkaPrime::new(EapCode::Request, 1, EapAkaSubType::AkaChallenge);
    challenge.attributes.put_rand(&[0x23; 16]);
    challenge.attributes.put_autn(&[0x45; 16]);
    challenge.attributes.put_kdf(1);
    challenge.attributes.put_kdf_input(&subscriber.sn_name);
    let mac = calculate_eap_aka_prime_mac(keys.k_aut, &challenge).unwrap();
    challenge.attributes.put_mac(&mac);

    let wire = nassec_nas::Eap::AkaPrime(challenge).encode().unwrap();
    let received = match nassec_nas::Eap::decode(&wire).unwrap() {
        nassec_nas::Eap::AkaPrime(m) => m,
        other => panic!("unexpected EAP message {other:?}"),
    };
    assert!(verify_eap_aka_prime_mac(keys.k_aut, &received));
    assert_eq!(
        received.attributes.kdf_input(),
        Some(subscriber.sn_name.as_bytes())
    );
    assert!(!verify_eap_aka_prime_mac(keys.k_re, &received));
}

#[test]
fn test_e2e_both_auth_methods_give_distinct_keys() {
    let subscriber = TestSubscriber::default();
    let selected = algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2);
    let (aka_ue, _) = subscriber.establish(AuthMethod::FiveGAka, selected).unwrap();
    let (eap_ue, _) = subscriber.establish(AuthMethod::EapAkaPrime, selected).unwrap();
    assert_ne!(aka_ue.keys().kausf(), eap_ue.keys().kausf());
    assert_ne!(aka_ue.keys().knas_enc(), eap_ue.keys().knas_enc());
}

#[test]
fn test_e2e_mismatched_network_name_rejects() {
    let selected = algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2);
    let home = TestSubscriber::default();
    let roaming = TestSubscriber {
        sn_name: "5G:mnc001.mcc001.3gppnetwork.org".to_string(),
        ..TestSubscriber::default()
    };
    let (mut ue, _) = home.establish(AuthMethod::FiveGAka, selected).unwrap();
    let (_, mut amf) = roaming.establish(AuthMethod::FiveGAka, selected).unwrap();

    assert_eq!(transfer(&registration_request(), &mut ue, &mut amf).unwrap(), None);
    assert!(!amf.has_accepted_receive());
}

#[test]
fn test_e2e_counts_survive_sequence_wrap() {
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia3),
        )
        .unwrap();
    let msg = registration_request();
    for _ in 0..600 {
        assert!(transfer(&msg, &mut ue, &mut amf).unwrap().is_some());
    }
    assert_eq!(ue.uplink_count(), NasCount::from_u32(600));
    assert_eq!(amf.uplink_count(), NasCount::from_u32(599));
    assert_eq!(amf.uplink_count().overflow, 2);
}

#[test]
fn test_e2e_lost_and_late_messages() {
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2),
        )
        .unwrap();
    let msg = registration_request();
    let first = encrypt(&msg, &mut ue).unwrap();
    let second = encrypt(&msg, &mut ue).unwrap();
    let third = encrypt(&msg, &mut ue).unwrap();

    assert!(decrypt(&first, &mut amf).unwrap().is_some());
    // second is lost in transit
    assert!(decrypt(&third, &mut amf).unwrap().is_some());
    // arrives late: its SQN now implies the next overflow, so the MAC fails
    assert_eq!(decrypt(&second, &mut amf).unwrap(), None);
    assert_eq!(decrypt(&third, &mut amf).unwrap(), None);
    assert_eq!(amf.uplink_count(), NasCount::new(0, 2));
}

#[test]
fn test_e2e_rekey_resets_counts() {
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2),
        )
        .unwrap();
    let msg = registration_request();
    for _ in 0..3 {
        assert!(transfer(&msg, &mut ue, &mut amf).unwrap().is_some());
    }
    let stale = encrypt(&msg, &mut ue).unwrap();

    let selected = algs(CipheringAlgorithm::Ea3, IntegrityAlgorithm::Ia3);
    for ctx in [&mut ue, &mut amf] {
        subscriber
            .derive_into(ctx, AuthMethod::FiveGAka, selected)
            .unwrap();
        assert_eq!(ctx.state(), SecurityContextState::Derived);
        assert_eq!(ctx.uplink_count(), NasCount::default());
        ctx.activate().unwrap();
    }

    assert_eq!(decrypt(&stale, &mut amf).unwrap(), None);
    assert_eq!(transfer(&msg, &mut ue, &mut amf).unwrap(), Some(msg));
}

#[test]
fn test_e2e_retired_context() {
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2),
        )
        .unwrap();
    let secured = encrypt(&registration_request(), &mut ue).unwrap();
    amf.retire();

    assert!(amf.keys().kamf().is_none());
    assert!(matches!(
        decrypt(&secured, &mut amf),
        Err(SecurityError::SecurityContextNotActive(SecurityContextState::Retired))
    ));
    assert!(matches!(
        subscriber.derive_into(
            &mut amf,
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2)
        ),
        Err(SecurityError::InvalidStateTransition { .. })
    ));
}

#[test]
fn test_e2e_config_driven_negotiation() {
    init_test_logging();
    let yaml = r#"
serving_network_name: "5G:mnc093.mcc208.3gppnetwork.org"
supi: "imsi-208930000000001"
connection_identifier: 1
supported_algs:
  nea2: false
  nia2: false
gate_null_integrity: true
log_level: debug
"#;
    let config = SecurityConfig::from_yaml(yaml).unwrap();
    let selected = NasSecurityAlgorithms::select(&config.supported_algs).unwrap();
    assert_eq!(selected.ciphering, CipheringAlgorithm::Ea3);
    assert_eq!(selected.integrity, IntegrityAlgorithm::Ia3);

    let subscriber = TestSubscriber::from_config(&config);
    let mut ue = NasSecurityContext::from_config(&config).unwrap();
    assert_eq!(ue.endpoint(), NasEndpoint::Ue);
    assert!(ue.gate_null_integrity());
    subscriber
        .derive_into(&mut ue, AuthMethod::FiveGAka, selected)
        .unwrap();
    ue.activate().unwrap();

    let mut amf = NasSecurityContext::new(NasEndpoint::Network, ue.connection_identifier());
    subscriber
        .derive_into(&mut amf, AuthMethod::FiveGAka, selected)
        .unwrap();
    amf.activate().unwrap();

    let accept = NasMessage::mm(MmMessageType::RegistrationAccept, vec![]);
    assert_eq!(transfer(&accept, &mut amf, &mut ue).unwrap(), Some(accept));
}

#[test]
fn test_e2e_gated_null_integrity_rejects_downlink() {
    let subscriber = TestSubscriber::default();
    let (mut ue, mut amf) = subscriber
        .establish(
            AuthMethod::FiveGAka,
            algs(CipheringAlgorithm::Ea0, IntegrityAlgorithm::Ia0),
        )
        .unwrap();
    let accept = NasMessage::mm(MmMessageType::RegistrationAccept, vec![]);

    assert_eq!(transfer(&accept, &mut amf, &mut ue).unwrap(), Some(accept.clone()));
    ue.set_gate_null_integrity(true);
    assert_eq!(transfer(&accept, &mut amf, &mut ue).unwrap(), None);
    assert_eq!(ue.downlink_count(), NasCount::new(0, 0));
}
