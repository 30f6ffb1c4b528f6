//! Service configuration and validation
//!
//! # Example
//!
//! ```
//! use ftn_crypt::{CryptConfig, LocalPart, TagArea};
//!
//! let config = CryptConfig::default()
//!     .with_local_part(LocalPart::new("crypt.gate").unwrap())
//!     .with_marker_area(TagArea::Footer);
//! assert!(config.validate().is_ok());
//! ```

use crate::domain::entities::LocalPart;
use crate::domain::envelope::TagArea;
use crate::domain::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Default domain appended to node FQDNs.
pub const DEFAULT_FQDN_DOMAIN: &str = "fidonet.org";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Cannot load configuration: {0}")]
    Load(String),
}

/// Encryption service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptConfig {
    /// Local-part of every destination address
    pub local_part: LocalPart,
    /// Domain suffix for node FQDNs
    pub fqdn_domain: String,
    /// Where the `ENC:` marker goes on encrypt
    pub marker_area: TagArea,
}

impl Default for CryptConfig {
    fn default() -> Self {
        Self {
            local_part: LocalPart::default(),
            fqdn_domain: DEFAULT_FQDN_DOMAIN.to_string(),
            marker_area: TagArea::Header,
        }
    }
}

impl CryptConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FTN_CRYPT_LOCAL_PART`: destination local-part (default: sysop)
    /// - `FTN_CRYPT_DOMAIN`: FQDN domain suffix (default: fidonet.org)
    /// - `FTN_CRYPT_MARKER_AREA`: `header` or `footer` (default: header)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("FTN_CRYPT_LOCAL_PART") {
            config.local_part =
                LocalPart::new(&value).map_err(|e| ConfigError::InvalidValue {
                    key: "FTN_CRYPT_LOCAL_PART",
                    reason: e.to_string(),
                })?;
        }

        if let Ok(value) = env::var("FTN_CRYPT_DOMAIN") {
            config.fqdn_domain = value;
        }

        if let Ok(value) = env::var("FTN_CRYPT_MARKER_AREA") {
            config.marker_area = value.parse().map_err(|e: EnvelopeError| {
                ConfigError::InvalidValue {
                    key: "FTN_CRYPT_MARKER_AREA",
                    reason: e.to_string(),
                }
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain = self.fqdn_domain.as_str();
        if domain.is_empty()
            || domain.starts_with('.')
            || domain.ends_with('.')
            || domain.contains(char::is_whitespace)
        {
            return Err(ConfigError::InvalidValue {
                key: "fqdn_domain",
                reason: format!("{domain:?} is not a domain name"),
            });
        }
        Ok(())
    }

    pub fn with_local_part(mut self, local_part: LocalPart) -> Self {
        self.local_part = local_part;
        self
    }

    pub fn with_fqdn_domain(mut self, domain: impl Into<String>) -> Self {
        self.fqdn_domain = domain.into();
        self
    }

    pub fn with_marker_area(mut self, area: TagArea) -> Self {
        self.marker_area = area;
        self
    }
}
