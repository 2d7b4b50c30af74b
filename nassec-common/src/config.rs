//! Configuration structures for the security engine
//!
//! A [`SecurityConfig`] describes one UE-side security association: which
//! network it serves, which identity it authenticates with, which NAS
//! algorithms it offers and how strictly downlink counters are guarded.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::logging::LogLevel;

/// NAS security algorithms supported by the UE.
///
/// Each flag enables the corresponding 128-bit algorithm. The null
/// algorithms (NEA0/NIA0) are always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportedAlgs {
    /// NIA1 (SNOW3G-based integrity)
    pub nia1: bool,
    /// NIA2 (AES-based integrity)
    pub nia2: bool,
    /// NIA3 (ZUC-based integrity)
    pub nia3: bool,
    /// NEA1 (SNOW3G-based ciphering)
    pub nea1: bool,
    /// NEA2 (AES-based ciphering)
    pub nea2: bool,
    /// NEA3 (ZUC-based ciphering)
    pub nea3: bool,
}

impl Default for SupportedAlgs {
    fn default() -> Self {
        Self {
            nia1: false,
            nia2: true,
            nia3: true,
            nea1: false,
            nea2: true,
            nea3: true,
        }
    }
}

impl SupportedAlgs {
    /// Ciphering algorithm identifiers offered, strongest first, ending with 0.
    pub fn ciphering_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = [(2, self.nea2), (3, self.nea3), (1, self.nea1)]
            .into_iter()
            .filter_map(|(id, on)| on.then_some(id))
            .collect();
        ids.push(0);
        ids
    }

    /// Integrity algorithm identifiers offered, strongest first, ending with 0.
    pub fn integrity_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = [(2, self.nia2), (3, self.nia3), (1, self.nia1)]
            .into_iter()
            .filter_map(|(id, on)| on.then_some(id))
            .collect();
        ids.push(0);
        ids
    }

    /// Returns true if the ciphering algorithm `id` is offered.
    pub fn supports_ciphering(&self, id: u8) -> bool {
        self.ciphering_ids().contains(&id)
    }

    /// Returns true if the integrity algorithm `id` is offered.
    pub fn supports_integrity(&self, id: u8) -> bool {
        self.integrity_ids().contains(&id)
    }
}

/// Security engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Serving network name, e.g. `5G:mnc093.mcc208.3gppnetwork.org`
    pub serving_network_name: String,
    /// Subscription permanent identifier, e.g. `imsi-208930000000001`
    pub supi: String,
    /// Connection identifier used as the bearer input (1 = 3GPP, 2 = non-3GPP)
    #[serde(default = "default_connection_identifier")]
    pub connection_identifier: u8,
    /// Offered NAS algorithms
    #[serde(default)]
    pub supported_algs: SupportedAlgs,
    /// Reject downlink messages under NIA0 instead of advancing the count
    #[serde(default)]
    pub gate_null_integrity: bool,
    /// Default log level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_connection_identifier() -> u8 {
    1
}

impl SecurityConfig {
    /// Creates a configuration with default algorithms for the given network and identity.
    pub fn new(serving_network_name: impl Into<String>, supi: impl Into<String>) -> Self {
        Self {
            serving_network_name: serving_network_name.into(),
            supi: supi.into(),
            connection_identifier: default_connection_identifier(),
            supported_algs: SupportedAlgs::default(),
            gate_null_integrity: false,
            log_level: LogLevel::default(),
        }
    }

    /// Checks field ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if !matches!(self.connection_identifier, 1 | 2) {
            return Err(Error::Config(format!(
                "connection_identifier must be 1 or 2, got {}",
                self.connection_identifier
            )));
        }
        if self.serving_network_name.is_empty() {
            return Err(Error::Config("serving_network_name is empty".into()));
        }
        if self.supi.is_empty() {
            return Err(Error::Config("supi is empty".into()));
        }
        Ok(())
    }

    /// Parses and validates a configuration from a YAML string.
    ///
    /// # Example
    /// ```
    /// use nassec_common::SecurityConfig;
    ///
    /// let yaml = r#"
    /// serving_network_name: "5G:mnc093.mcc208.3gppnetwork.org"
    /// supi: "imsi-208930000000001"
    /// supported_algs:
    ///   nea3: false
    /// "#;
    ///
    /// let config = SecurityConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.connection_identifier, 1);
    /// assert!(!config.supported_algs.nea3);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}
