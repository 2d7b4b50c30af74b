//! Integration test framework for nassec
#![allow(missing_docs)]
//!
//! Fixtures and helpers shared by the end-to-end scenarios, which run the key
//! hierarchy on a UE context and a network context and then exchange
//! protected NAS messages between them.
//!
//! # Components
//!
//! - [`test_fixtures`] - Subscriber profile and context builders
//! - [`test_utils`] - Logging setup and the protect/transmit/unprotect helper

pub mod test_fixtures;
pub mod test_utils;

pub use test_fixtures::{AuthMethod, TestSubscriber};
pub use test_utils::{init_test_logging, transfer, TestResult};
