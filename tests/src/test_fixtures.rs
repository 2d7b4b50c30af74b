//! Test fixtures and configuration helpers
//!
//! Provides a subscriber profile with fixed authentication vector outputs and
//! builders that run the key hierarchy on both ends of an association.

use nassec_common::SecurityConfig;
use nassec_crypto::kdf::KEY_128_SIZE;
use nassec_nas::{
    derive_kausf_5g_aka, derive_keys_seaf_amf, derive_nas_keys, establish_eap_aka_prime,
    ConnectionIdentifier, NasEndpoint, NasSecurityAlgorithms, NasSecurityContext, SecurityError,
};

/// Primary authentication method used to reach KAUSF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    FiveGAka,
    EapAkaPrime,
}

/// Outputs of one authentication run, as both ends see them
#[derive(Debug, Clone)]
pub struct TestSubscriber {
    /// SUPI
    pub supi: String,
    /// Serving network name
    pub sn_name: String,
    /// Cipher key from the authentication vector
    pub ck: [u8; KEY_128_SIZE],
    /// Integrity key from the authentication vector
    pub ik: [u8; KEY_128_SIZE],
    /// SQN xor AK from AUTN
    pub sqn_xor_ak: [u8; 6],
    /// ABBA parameter
    pub abba: Vec<u8>,
}

impl Default for TestSubscriber {
    fn default() -> Self {
        Self {
            supi: "imsi-208930000000001".to_string(),
            sn_name: "5G:mnc093.mcc208.3gppnetwork.org".to_string(),
            ck: [
                0xb4, 0x0b, 0xa9, 0xa3, 0xc5, 0x8b, 0x2a, 0x05, 0xbb, 0xf0, 0xd9, 0x87, 0xb2, 0x1b,
                0xf8, 0xcb,
            ],
            ik: [
                0xf7, 0x69, 0xbc, 0xd7, 0x51, 0x04, 0x46, 0x04, 0x12, 0x76, 0x72, 0x71, 0x1c, 0x6d,
                0x34, 0x41,
            ],
            sqn_xor_ak: [0x55, 0xf3, 0x28, 0xb4, 0x35, 0x32],
            abba: vec![0x00, 0x00],
        }
    }
}

impl TestSubscriber {
    /// Build a subscriber matching a configuration's identity and network
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            supi: config.supi.clone(),
            sn_name: config.serving_network_name.clone(),
            ..Self::default()
        }
    }

    /// Run authentication and key derivation into `ctx`, leaving it `Derived`.
    pub fn derive_into(
        &self,
        ctx: &mut NasSecurityContext,
        method: AuthMethod,
        algorithms: NasSecurityAlgorithms,
    ) -> Result<(), SecurityError> {
        ctx.keys_mut().set_abba(&self.abba);
        match method {
            AuthMethod::FiveGAka => {
                derive_kausf_5g_aka(ctx, &self.ck, &self.ik, &self.sn_name, &self.sqn_xor_ak)
            }
            AuthMethod::EapAkaPrime => {
                establish_eap_aka_prime(
                    ctx,
                    &self.ck,
                    &self.ik,
                    &self.sn_name,
                    &self.sqn_xor_ak,
                    &self.supi,
                );
            }
        }
        derive_keys_seaf_amf(ctx, &self.sn_name, &self.supi)?;
        ctx.set_algorithms(algorithms);
        derive_nas_keys(ctx)
    }

    /// UE and AMF contexts sharing one active security context
    pub fn establish(
        &self,
        method: AuthMethod,
        algorithms: NasSecurityAlgorithms,
    ) -> Result<(NasSecurityContext, NasSecurityContext), SecurityError> {
        let mut ue = NasSecurityContext::new(NasEndpoint::Ue, ConnectionIdentifier::ThreeGpp);
        let mut amf =
            NasSecurityContext::new(NasEndpoint::Network, ConnectionIdentifier::ThreeGpp);
        for ctx in [&mut ue, &mut amf] {
            self.derive_into(ctx, method, algorithms)?;
            ctx.activate()?;
        }
        Ok((ue, amf))
    }
}
