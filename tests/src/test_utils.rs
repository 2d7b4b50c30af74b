//! Test utility functions for integration tests
//!
//! Provides common utilities for test setup, logging, and assertions.

use nassec_nas::{decrypt, encrypt, NasMessage, NasSecurityContext, SecurityError};
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize logging for tests
///
/// Uses RUST_LOG environment variable if set, otherwise defaults to "info"
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Protect `message` at `sender`, put it on the wire and unprotect it at `receiver`.
///
/// Returns what the receiver accepted, `None` if it rejected the container.
pub fn transfer(
    message: &NasMessage,
    sender: &mut NasSecurityContext,
    receiver: &mut NasSecurityContext,
) -> Result<Option<NasMessage>, SecurityError> {
    let wire = encrypt(message, sender)?.encode();
    let secured = nassec_nas::SecuredNasMessage::decode(&wire)?;
    decrypt(&secured, receiver)
}
