//! Common types and utilities for nassec
//!
//! This crate provides the binary primitives every protocol field rides on
//! (bits, octet groups, octet strings and a bounds-checked cursor), plus the
//! shared error type, logging setup and configuration used by the other crates.

pub mod bit_string;
pub mod config;
pub mod error;
pub mod logging;
pub mod octet;
pub mod octet_string;
pub mod octet_view;

pub use bit_string::BitString;
pub use config::{SecurityConfig, SupportedAlgs};
pub use error::Error;
pub use logging::{
    format_hex_compact, init_logging, init_logging_with_filter, log_eap_message, log_key,
    log_nas_message, log_protocol_message, Direction, HexDump, LogLevel,
};
pub use octet::{Endianness, Octet, Octet2, Octet3, Octet4};
pub use octet_string::OctetString;
pub use octet_view::OctetView;
