//! Key hierarchy wiring for a security context
//!
//! The KDF functions in [`nassec_crypto::kdf`] are pure; these helpers read
//! the inputs from a [`NasSecurityContext`] and store the results back into
//! it, in the order an authentication run produces them:
//!
//! ```text
//! CK, IK ──> KAUSF (5G-AKA)            CK, IK ──> CK', IK' ──> MK ──> KAUSF (EAP-AKA')
//!                 └──────────────┬───────────────────────────────────────┘
//!                                v
//!                   KAUSF ──> KSEAF ──> KAMF ──> KNASenc, KNASint
//! ```

use nassec_common::logging::{log_eap_message, log_key, Direction};
use nassec_crypto::kdf::{self, DEFAULT_ABBA, EAP_MAC_SIZE, KEY_128_SIZE};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::context::NasSecurityContext;
use crate::eap::{Eap, EapAkaPrime, EapError};
use crate::security::{constant_time_eq, SecurityError};

/// Derive KAUSF from a 5G-AKA run and store it.
pub fn derive_kausf_5g_aka(
    ctx: &mut NasSecurityContext,
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &str,
    sqn_xor_ak: &[u8; 6],
) {
    let kausf = Zeroizing::new(kdf::derive_kausf(ck, ik, sn_name, sqn_xor_ak));
    log_key("KAUSF", &*kausf);
    ctx.keys_mut().set_kausf(&kausf);
}

/// Run the EAP-AKA' key derivation: store CK'/IK' and KAUSF, return MK.
///
/// MK is returned so the caller can take K_aut from it for AT_MAC. It is
/// wiped when the caller drops it.
pub fn establish_eap_aka_prime(
    ctx: &mut NasSecurityContext,
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &str,
    sqn_xor_ak: &[u8; 6],
    supi: &str,
) -> Zeroizing<Vec<u8>> {
    let primes = Zeroizing::new(kdf::derive_ck_ik_prime(ck, ik, sn_name, sqn_xor_ak));
    let (ck_prime, ik_prime) = (&primes.0, &primes.1);
    log_key("CK'", ck_prime);
    log_key("IK'", ik_prime);
    ctx.keys_mut().set_ck_ik_prime(ck_prime, ik_prime);

    let mk = Zeroizing::new(kdf::derive_mk(ck_prime, ik_prime, supi));
    let kausf = Zeroizing::new(kdf::derive_kausf_eap_aka_prime(&mk));
    log_key("KAUSF", &*kausf);
    ctx.keys_mut().set_kausf(&kausf);
    debug!(sn_name, "EAP-AKA' keys established");
    mk
}

/// Derive KSEAF and KAMF from the stored KAUSF.
///
/// Uses the stored ABBA, or `00 00` when none was received.
pub fn derive_keys_seaf_amf(
    ctx: &mut NasSecurityContext,
    sn_name: &str,
    supi: &str,
) -> Result<(), SecurityError> {
    let kausf = Zeroizing::new(
        *ctx.keys().kausf().ok_or(SecurityError::MissingKey("KAUSF"))?,
    );
    let kseaf = Zeroizing::new(kdf::derive_kseaf(&kausf, sn_name));
    let abba = match ctx.keys().abba() {
        [] => DEFAULT_ABBA.to_vec(),
        abba => abba.to_vec(),
    };
    let kamf = Zeroizing::new(kdf::derive_kamf(&kseaf, supi, &abba));

    log_key("KSEAF", &*kseaf);
    log_key("KAMF", &*kamf);
    ctx.keys_mut().set_kseaf(&kseaf);
    ctx.keys_mut().set_kamf(&kamf);
    Ok(())
}

/// Derive KNASenc/KNASint for the selected algorithms and install them.
///
/// Moves the context to `Derived` and resets both counts.
pub fn derive_nas_keys(ctx: &mut NasSecurityContext) -> Result<(), SecurityError> {
    let kamf = Zeroizing::new(
        *ctx.keys().kamf().ok_or(SecurityError::MissingKey("KAMF"))?,
    );
    let algorithms = ctx.algorithms();
    let knas_enc = Zeroizing::new(kdf::derive_knas_enc(&kamf, algorithms.ciphering.id()));
    let knas_int = Zeroizing::new(kdf::derive_knas_int(&kamf, algorithms.integrity.id()));

    log_key("KNASenc", &*knas_enc);
    log_key("KNASint", &*knas_int);
    ctx.install_nas_keys(&knas_enc, &knas_int)?;
    debug!(
        ciphering = %algorithms.ciphering,
        integrity = %algorithms.integrity,
        "NAS keys derived"
    );
    Ok(())
}

/// Compute AT_MAC for an EAP-AKA' message.
///
/// The MAC covers the whole EAP packet with AT_MAC set to zero; the message
/// itself is not modified.
pub fn calculate_eap_aka_prime_mac(
    k_aut: &[u8],
    message: &EapAkaPrime,
) -> Result<[u8; EAP_MAC_SIZE], EapError> {
    let zeroed = Eap::AkaPrime(message.with_zero_mac()).encode()?;
    Ok(kdf::eap_aka_prime_mac(k_aut, &zeroed))
}

/// Check the AT_MAC carried by a received EAP-AKA' message.
///
/// A message that cannot be encoded never verifies.
pub fn verify_eap_aka_prime_mac(k_aut: &[u8], message: &EapAkaPrime) -> bool {
    let wire = match Eap::AkaPrime(message.clone()).encode() {
        Ok(wire) => wire,
        Err(e) => {
            warn!(error = %e, "EAP-AKA' message rejected");
            return false;
        }
    };
    log_eap_message(Direction::Rx, &format!("{:?}", message.sub_type), &wire);
    match (message.attributes.mac(), calculate_eap_aka_prime_mac(k_aut, message)) {
        (Some(received), Ok(expected)) => constant_time_eq(received, &expected),
        _ => false,
    }
}
