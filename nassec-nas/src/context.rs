//! NAS security context
//!
//! One [`NasSecurityContext`] holds everything a peer needs to protect its
//! side of a NAS association: the key hierarchy, both NAS COUNTs, the
//! negotiated algorithms and the connection identifier used as the bearer.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──derive──> Derived ──activate──> Active ──retire──> Retired
//!                              ^                    │
//!                              └──── new context ───┘
//! ```
//!
//! Every path into `Active` goes through `Derived`, and only `Active`
//! contexts may protect or unprotect messages. Deriving a new context resets
//! both counts.
//!
//! The context only stores counts. Whether a received message is fresh is
//! decided by [`protection::decrypt`](crate::protection::decrypt), which
//! estimates the count first and commits it through
//! [`NasSecurityContext::advance_on_receive`] once the message is accepted.

use std::fmt;

use nassec_common::SecurityConfig;
use nassec_crypto::kdf::{KEY_128_SIZE, KEY_256_SIZE};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::security::{
    estimate_downlink_count, NasCount, NasDirection, NasKeySetIdentifier, NasSecurityAlgorithms,
    SecurityError,
};

/// State of the NAS security context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityContextState {
    /// No keys yet
    #[default]
    Uninitialized,
    /// NAS keys derived, counts reset, not yet in use
    Derived,
    /// Protecting messages
    Active,
    /// Association released; keys wiped
    Retired,
}

/// Connection identifier, used as the BEARER input of the NAS algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ConnectionIdentifier {
    /// 3GPP access
    #[default]
    ThreeGpp = 1,
    /// Non-3GPP access
    NonThreeGpp = 2,
}

/// Which end of the association this context belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NasEndpoint {
    /// Sends uplink, receives downlink
    #[default]
    Ue,
    /// Sends downlink, receives uplink
    Network,
}

impl NasEndpoint {
    /// Direction of messages this endpoint protects
    pub fn send_direction(self) -> NasDirection {
        match self {
            NasEndpoint::Ue => NasDirection::Uplink,
            NasEndpoint::Network => NasDirection::Downlink,
        }
    }

    /// Direction of messages this endpoint unprotects
    pub fn receive_direction(self) -> NasDirection {
        match self {
            NasEndpoint::Ue => NasDirection::Downlink,
            NasEndpoint::Network => NasDirection::Uplink,
        }
    }
}

/// Key hierarchy of one association
///
/// ```text
/// CK, IK
///    ├── CK', IK' (EAP-AKA')
///    └── KAUSF
///           └── KSEAF
///                  └── KAMF
///                         ├── KNASint
///                         └── KNASenc
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct UeKeys {
    abba: Vec<u8>,
    kausf: Option<[u8; KEY_256_SIZE]>,
    kseaf: Option<[u8; KEY_256_SIZE]>,
    kamf: Option<[u8; KEY_256_SIZE]>,
    knas_int: Option<[u8; KEY_128_SIZE]>,
    knas_enc: Option<[u8; KEY_128_SIZE]>,
    ck_prime: Option<[u8; KEY_128_SIZE]>,
    ik_prime: Option<[u8; KEY_128_SIZE]>,
}

impl UeKeys {
    /// Create an empty key set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_abba(&mut self, abba: &[u8]) {
        self.abba = abba.to_vec();
    }

    /// ABBA parameter, empty until set
    pub fn abba(&self) -> &[u8] {
        &self.abba
    }

    pub fn set_kausf(&mut self, key: &[u8; KEY_256_SIZE]) {
        self.kausf = Some(*key);
    }

    pub fn kausf(&self) -> Option<&[u8; KEY_256_SIZE]> {
        self.kausf.as_ref()
    }

    pub fn set_kseaf(&mut self, key: &[u8; KEY_256_SIZE]) {
        self.kseaf = Some(*key);
    }

    pub fn kseaf(&self) -> Option<&[u8; KEY_256_SIZE]> {
        self.kseaf.as_ref()
    }

    pub fn set_kamf(&mut self, key: &[u8; KEY_256_SIZE]) {
        self.kamf = Some(*key);
    }

    pub fn kamf(&self) -> Option<&[u8; KEY_256_SIZE]> {
        self.kamf.as_ref()
    }

    pub fn set_knas_int(&mut self, key: &[u8; KEY_128_SIZE]) {
        self.knas_int = Some(*key);
    }

    pub fn knas_int(&self) -> Option<&[u8; KEY_128_SIZE]> {
        self.knas_int.as_ref()
    }

    pub fn set_knas_enc(&mut self, key: &[u8; KEY_128_SIZE]) {
        self.knas_enc = Some(*key);
    }

    pub fn knas_enc(&self) -> Option<&[u8; KEY_128_SIZE]> {
        self.knas_enc.as_ref()
    }

    /// Store the EAP-AKA' CK' / IK' pair
    pub fn set_ck_ik_prime(&mut self, ck_prime: &[u8; KEY_128_SIZE], ik_prime: &[u8; KEY_128_SIZE]) {
        self.ck_prime = Some(*ck_prime);
        self.ik_prime = Some(*ik_prime);
    }

    pub fn ck_prime(&self) -> Option<&[u8; KEY_128_SIZE]> {
        self.ck_prime.as_ref()
    }

    pub fn ik_prime(&self) -> Option<&[u8; KEY_128_SIZE]> {
        self.ik_prime.as_ref()
    }

    /// Returns true if either NAS key is present
    pub fn has_any_nas_key(&self) -> bool {
        self.knas_int.is_some() || self.knas_enc.is_some()
    }

    /// Overwrite every key with zeros and drop it
    pub fn clear(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for UeKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // presence only; key bytes are logged at trace level elsewhere
        f.debug_struct("UeKeys")
            .field("abba", &self.abba)
            .field("kausf", &self.kausf.is_some())
            .field("kseaf", &self.kseaf.is_some())
            .field("kamf", &self.kamf.is_some())
            .field("knas_int", &self.knas_int.is_some())
            .field("knas_enc", &self.knas_enc.is_some())
            .field("ck_ik_prime", &self.ck_prime.is_some())
            .finish()
    }
}

/// Per-association NAS security state
///
/// # Example
///
/// ```rust
/// use nassec_nas::context::{NasSecurityContext, SecurityContextState};
///
/// let mut ctx = NasSecurityContext::default();
/// assert_eq!(ctx.state(), SecurityContextState::Uninitialized);
///
/// ctx.advance_on_send().unwrap();
/// assert_eq!(ctx.uplink_count().sqn, 1);
///
/// ctx.advance_on_receive(255).unwrap();
/// ctx.advance_on_receive(0).unwrap();
/// assert_eq!(ctx.downlink_count().overflow, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NasSecurityContext {
    state: SecurityContextState,
    endpoint: NasEndpoint,
    keys: UeKeys,
    uplink_count: NasCount,
    downlink_count: NasCount,
    /// Whether a message has been accepted on the receive count since the last reset
    receive_accepted: bool,
    algorithms: NasSecurityAlgorithms,
    connection_identifier: ConnectionIdentifier,
    nas_ksi: NasKeySetIdentifier,
    gate_null_integrity: bool,
}

impl NasSecurityContext {
    /// Create an uninitialized context
    pub fn new(endpoint: NasEndpoint, connection_identifier: ConnectionIdentifier) -> Self {
        Self {
            endpoint,
            connection_identifier,
            ..Self::default()
        }
    }

    /// Create a UE-side context from configuration
    pub fn from_config(config: &SecurityConfig) -> Result<Self, SecurityError> {
        config.validate()?;
        let connection_identifier = ConnectionIdentifier::try_from(config.connection_identifier)
            .map_err(|_| {
                nassec_common::Error::Config(format!(
                    "connection_identifier must be 1 or 2, got {}",
                    config.connection_identifier
                ))
            })?;
        let mut ctx = Self::new(NasEndpoint::Ue, connection_identifier);
        ctx.gate_null_integrity = config.gate_null_integrity;
        Ok(ctx)
    }

    pub fn state(&self) -> SecurityContextState {
        self.state
    }

    /// Returns true if the context may protect messages
    pub fn is_active(&self) -> bool {
        self.state == SecurityContextState::Active
    }

    pub fn endpoint(&self) -> NasEndpoint {
        self.endpoint
    }

    pub fn keys(&self) -> &UeKeys {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut UeKeys {
        &mut self.keys
    }

    pub fn algorithms(&self) -> NasSecurityAlgorithms {
        self.algorithms
    }

    /// Set the negotiated algorithms. NAS keys must be re-derived afterwards.
    pub fn set_algorithms(&mut self, algorithms: NasSecurityAlgorithms) {
        self.algorithms = algorithms;
    }

    pub fn connection_identifier(&self) -> ConnectionIdentifier {
        self.connection_identifier
    }

    /// BEARER input of the algorithms
    pub fn bearer(&self) -> u8 {
        self.connection_identifier.into()
    }

    pub fn nas_ksi(&self) -> NasKeySetIdentifier {
        self.nas_ksi
    }

    pub fn set_nas_ksi(&mut self, nas_ksi: NasKeySetIdentifier) {
        self.nas_ksi = nas_ksi;
    }

    /// Reject NIA0-protected received messages instead of advancing the count
    pub fn gate_null_integrity(&self) -> bool {
        self.gate_null_integrity
    }

    pub fn set_gate_null_integrity(&mut self, gate: bool) {
        self.gate_null_integrity = gate;
    }

    pub fn uplink_count(&self) -> NasCount {
        self.uplink_count
    }

    pub fn downlink_count(&self) -> NasCount {
        self.downlink_count
    }

    /// Count of the next message this endpoint sends
    pub fn send_count(&self) -> NasCount {
        match self.endpoint {
            NasEndpoint::Ue => self.uplink_count,
            NasEndpoint::Network => self.downlink_count,
        }
    }

    /// Count of the last message this endpoint accepted
    pub fn receive_count(&self) -> NasCount {
        match self.endpoint {
            NasEndpoint::Ue => self.downlink_count,
            NasEndpoint::Network => self.uplink_count,
        }
    }

    /// Returns true if a message has been accepted since the counts were reset
    pub fn has_accepted_receive(&self) -> bool {
        self.receive_accepted
    }

    fn send_count_mut(&mut self) -> &mut NasCount {
        match self.endpoint {
            NasEndpoint::Ue => &mut self.uplink_count,
            NasEndpoint::Network => &mut self.downlink_count,
        }
    }

    fn receive_count_mut(&mut self) -> &mut NasCount {
        match self.endpoint {
            NasEndpoint::Ue => &mut self.downlink_count,
            NasEndpoint::Network => &mut self.uplink_count,
        }
    }

    /// Advance the send count after a message has been protected.
    pub fn advance_on_send(&mut self) -> Result<(), SecurityError> {
        self.send_count_mut().increment()
    }

    /// Full receive count implied by `sqn`, without committing it.
    pub fn estimate_receive_count(&self, sqn: u8) -> Result<NasCount, SecurityError> {
        estimate_downlink_count(self.receive_count(), sqn)
    }

    /// Reconcile the receive count with a received sequence number.
    ///
    /// A `sqn` below the stored one rolls the overflow by exactly one.
    /// Returns the committed count. At the overflow ceiling the stored count
    /// is left untouched and [`SecurityError::NasCountOverflow`] is returned.
    pub fn advance_on_receive(&mut self, sqn: u8) -> Result<NasCount, SecurityError> {
        let count = self.estimate_receive_count(sqn)?;
        *self.receive_count_mut() = count;
        self.receive_accepted = true;
        Ok(count)
    }

    /// Reset both counts to zero.
    pub fn reset_counts(&mut self) {
        self.uplink_count = NasCount::default();
        self.downlink_count = NasCount::default();
        self.receive_accepted = false;
    }

    /// Install freshly derived NAS keys and move to `Derived`.
    ///
    /// Allowed from every state except `Retired`; a new context replaces the
    /// active one and restarts both counts.
    pub fn install_nas_keys(
        &mut self,
        knas_enc: &[u8; KEY_128_SIZE],
        knas_int: &[u8; KEY_128_SIZE],
    ) -> Result<(), SecurityError> {
        self.transition(SecurityContextState::Derived)?;
        self.keys.set_knas_enc(knas_enc);
        self.keys.set_knas_int(knas_int);
        self.reset_counts();
        self.state = SecurityContextState::Derived;
        Ok(())
    }

    /// Move from `Derived` to `Active`.
    pub fn activate(&mut self) -> Result<(), SecurityError> {
        self.transition(SecurityContextState::Active)?;
        self.state = SecurityContextState::Active;
        Ok(())
    }

    /// Release the association: zeroise keys, reset counts, move to `Retired`.
    pub fn retire(&mut self) {
        self.keys.clear();
        self.reset_counts();
        self.algorithms = NasSecurityAlgorithms::default();
        self.nas_ksi = NasKeySetIdentifier::no_key();
        self.state = SecurityContextState::Retired;
    }

    fn transition(&self, to: SecurityContextState) -> Result<(), SecurityError> {
        use SecurityContextState::*;
        let allowed = match to {
            Derived => self.state != Retired,
            Active => self.state == Derived,
            Uninitialized | Retired => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(SecurityError::InvalidStateTransition {
                from: self.state,
                to,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived() -> NasSecurityContext {
        let mut ctx = NasSecurityContext::default();
        ctx.install_nas_keys(&[1u8; 16], &[2u8; 16]).unwrap();
        ctx
    }

    #[test]
    fn test_defaults() {
        let ctx = NasSecurityContext::default();
        assert_eq!(ctx.state(), SecurityContextState::Uninitialized);
        assert_eq!(ctx.endpoint(), NasEndpoint::Ue);
        assert_eq!(ctx.bearer(), 1);
        assert!(ctx.nas_ksi().is_no_key());
        assert!(!ctx.has_accepted_receive());
        assert!(!ctx.keys().has_any_nas_key());
    }

    #[test]
    fn test_from_config() {
        let mut config = SecurityConfig::new("test.network", "imsi-001010000000001");
        config.connection_identifier = 2;
        config.gate_null_integrity = true;
        let ctx = NasSecurityContext::from_config(&config).unwrap();
        assert_eq!(ctx.connection_identifier(), ConnectionIdentifier::NonThreeGpp);
        assert!(ctx.gate_null_integrity());

        config.connection_identifier = 3;
        assert!(matches!(
            NasSecurityContext::from_config(&config),
            Err(SecurityError::Config(_))
        ));
    }

    #[test]
    fn test_lifecycle() {
        let mut ctx = NasSecurityContext::default();
        assert!(matches!(
            ctx.activate(),
            Err(SecurityError::InvalidStateTransition { .. })
        ));

        ctx.install_nas_keys(&[1u8; 16], &[2u8; 16]).unwrap();
        assert_eq!(ctx.state(), SecurityContextState::Derived);
        ctx.activate().unwrap();
        assert!(ctx.is_active());
        // activating twice skips Derived
        assert!(ctx.activate().is_err());

        ctx.retire();
        assert_eq!(ctx.state(), SecurityContextState::Retired);
        assert!(ctx.keys().knas_enc().is_none());
        assert!(ctx.install_nas_keys(&[1u8; 16], &[2u8; 16]).is_err());
    }

    #[test]
    fn test_new_context_resets_counts() {
        let mut ctx = derived();
        ctx.activate().unwrap();
        ctx.advance_on_send().unwrap();
        ctx.advance_on_receive(4).unwrap();
        assert!(ctx.has_accepted_receive());

        ctx.install_nas_keys(&[3u8; 16], &[4u8; 16]).unwrap();
        assert_eq!(ctx.state(), SecurityContextState::Derived);
        assert_eq!(ctx.uplink_count(), NasCount::default());
        assert_eq!(ctx.downlink_count(), NasCount::default());
        assert!(!ctx.has_accepted_receive());
        assert_eq!(ctx.keys().knas_enc(), Some(&[3u8; 16]));
    }

    #[test]
    fn test_advance_on_send_is_uplink_for_ue() {
        let mut ctx = NasSecurityContext::default();
        for expected in 1..=300u32 {
            ctx.advance_on_send().unwrap();
            assert_eq!(ctx.uplink_count().to_u32(), expected);
        }
        assert_eq!(ctx.downlink_count(), NasCount::default());
    }

    #[test]
    fn test_network_endpoint_mirrors_counts() {
        let mut ctx = NasSecurityContext::new(NasEndpoint::Network, ConnectionIdentifier::ThreeGpp);
        ctx.advance_on_send().unwrap();
        ctx.advance_on_receive(9).unwrap();
        assert_eq!(ctx.downlink_count(), NasCount::new(0, 1));
        assert_eq!(ctx.uplink_count(), NasCount::new(0, 9));
        assert_eq!(ctx.endpoint().send_direction(), NasDirection::Downlink);
    }

    #[test]
    fn test_advance_on_receive_wraps_once() {
        let mut ctx = NasSecurityContext::default();
        assert_eq!(ctx.advance_on_receive(250).unwrap(), NasCount::new(0, 250));
        assert_eq!(ctx.estimate_receive_count(3).unwrap(), NasCount::new(1, 3));
        // estimate does not commit
        assert_eq!(ctx.downlink_count(), NasCount::new(0, 250));
        assert_eq!(ctx.advance_on_receive(3).unwrap(), NasCount::new(1, 3));
        assert_eq!(ctx.advance_on_receive(3).unwrap(), NasCount::new(1, 3));
        assert_eq!(ctx.advance_on_receive(4).unwrap(), NasCount::new(1, 4));
    }

    #[test]
    fn test_advance_on_receive_stops_at_ceiling() {
        let mut ctx = NasSecurityContext::default();
        for _ in 0..u16::MAX {
            ctx.advance_on_receive(200).unwrap();
            ctx.advance_on_receive(5).unwrap();
        }
        ctx.advance_on_receive(200).unwrap();
        assert_eq!(ctx.downlink_count(), NasCount::new(u16::MAX, 200));

        assert!(matches!(
            ctx.advance_on_receive(5),
            Err(SecurityError::NasCountOverflow)
        ));
        assert_eq!(ctx.downlink_count(), NasCount::new(u16::MAX, 200));
        assert_eq!(ctx.advance_on_receive(255).unwrap(), NasCount::MAX);
    }

    #[test]
    fn test_send_overflow() {
        let mut ctx = NasSecurityContext::default();
        ctx.uplink_count = NasCount::MAX;
        assert!(matches!(ctx.advance_on_send(), Err(SecurityError::NasCountOverflow)));
        assert_eq!(ctx.uplink_count(), NasCount::MAX);
    }

    #[test]
    fn test_keys_clear() {
        let mut keys = UeKeys::new();
        keys.set_kamf(&[9u8; 32]);
        keys.set_abba(&[0, 0]);
        keys.set_ck_ik_prime(&[1u8; 16], &[2u8; 16]);
        keys.clear();
        assert!(keys.kamf().is_none());
        assert!(keys.ck_prime().is_none());
        assert!(keys.abba().is_empty());
    }

    #[test]
    fn test_keys_zeroize_on_drop() {
        fn wiped_on_drop<T: ZeroizeOnDrop>() {}
        wiped_on_drop::<UeKeys>();

        let mut keys = UeKeys::new();
        keys.set_kausf(&[0x11; 32]);
        keys.set_knas_enc(&[0x22; 16]);
        keys.set_abba(&[0x00, 0x01]);
        keys.zeroize();
        assert!(keys.kausf().is_none());
        assert!(keys.knas_enc().is_none());
        assert!(!keys.has_any_nas_key());
        assert!(keys.abba().is_empty());
    }

    #[test]
    fn test_keys_debug_hides_material() {
        let mut keys = UeKeys::new();
        keys.set_knas_int(&[0xAB; 16]);
        let text = format!("{keys:?}");
        assert!(text.contains("knas_int: true"));
        assert!(!text.contains("171"));
    }
}
