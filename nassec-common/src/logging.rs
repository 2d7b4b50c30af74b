//! Logging infrastructure for nassec
//!
//! Configurable logging on top of the `tracing` crate, plus helpers for logging
//! NAS traffic and key material with hex formatting.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::error::Error;

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level, also prints payload and key dumps
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    #[default]
    Info,
    /// Warn level
    #[serde(alias = "warning")]
    Warn,
    /// Error level
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("unknown log level: {s}")),
        }
    }
}

/// Initialize the tracing subscriber with the specified log level.
///
/// The level can be overridden by the `RUST_LOG` environment variable.
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```
/// use nassec_common::logging::{init_logging, LogLevel};
///
/// let _ = init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) -> Result<(), Error> {
    init_logging_with_filter(&level.to_string())
}

/// Initialize logging with a custom filter string.
///
/// # Example
///
/// ```
/// use nassec_common::logging::init_logging_with_filter;
///
/// // Default to info, but show MAC computations from the NAS crate
/// let _ = init_logging_with_filter("info,nassec_nas=debug");
/// ```
pub fn init_logging_with_filter(filter: &str) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_span_events(FmtSpan::NONE)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {e}")))
}

/// Protocol direction for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Incoming/received message
    Rx,
    /// Outgoing/transmitted message
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => write!(f, "RX"),
            Direction::Tx => write!(f, "TX"),
        }
    }
}

/// Log a protocol message at debug level with a hex dump at trace level.
pub fn log_protocol_message(protocol: &str, direction: Direction, msg_type: &str, data: &[u8]) {
    tracing::debug!(
        protocol = protocol,
        direction = %direction,
        msg_type = msg_type,
        len = data.len(),
        "{} {} message",
        direction,
        protocol
    );
    tracing::trace!(
        protocol = protocol,
        hex = %HexDump(data),
        "{} payload",
        protocol
    );
}

/// Log a NAS message
pub fn log_nas_message(direction: Direction, msg_type: &str, data: &[u8]) {
    log_protocol_message("NAS", direction, msg_type, data);
}

/// Log an EAP message
pub fn log_eap_message(direction: Direction, msg_type: &str, data: &[u8]) {
    log_protocol_message("EAP", direction, msg_type, data);
}

/// Log derived key material. Only emitted at trace level.
pub fn log_key(name: &str, key: &[u8]) {
    tracing::trace!(key = name, len = key.len(), value = %HexDump(key), "derived {}", name);
}

/// Wrapper for hex dump formatting
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Format bytes as a compact hex string with optional grouping.
///
/// ```
/// use nassec_common::logging::format_hex_compact;
///
/// let mac = [0x12, 0x34, 0x56, 0x78];
/// assert_eq!(format_hex_compact(&mac, 0), "12345678");
/// assert_eq!(format_hex_compact(&mac, 2), "1234 5678");
/// ```
pub fn format_hex_compact(data: &[u8], group_size: usize) -> String {
    if group_size == 0 {
        return hex::encode(data);
    }

    data.chunks(group_size)
        .map(hex::encode)
        .collect::<Vec<_>>()
        .join(" ")
}
