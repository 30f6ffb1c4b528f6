//! # Encryption Methods
//!
//! The closed set of methods a node may advertise. Anything else a
//! directory record carries is treated as "no capability".

use crate::domain::errors::CapabilityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encryption method advertised by a node and recorded in `ENC:` tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionMethod {
    #[serde(rename = "PGP2")]
    Pgp2,
    #[serde(rename = "PGP5")]
    Pgp5,
    #[serde(rename = "GnuPG")]
    GnuPg,
}

impl EncryptionMethod {
    /// All supported methods, in wire-name order.
    pub const ALL: [EncryptionMethod; 3] = [
        EncryptionMethod::Pgp2,
        EncryptionMethod::Pgp5,
        EncryptionMethod::GnuPg,
    ];

    /// Wire name as it appears in directory flags and tag-lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMethod::Pgp2 => "PGP2",
            EncryptionMethod::Pgp5 => "PGP5",
            EncryptionMethod::GnuPg => "GnuPG",
        }
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMethod {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CapabilityError::UnsupportedMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_names() {
        assert_eq!("PGP2".parse::<EncryptionMethod>(), Ok(EncryptionMethod::Pgp2));
        assert_eq!("PGP5".parse::<EncryptionMethod>(), Ok(EncryptionMethod::Pgp5));
        assert_eq!("GnuPG".parse::<EncryptionMethod>(), Ok(EncryptionMethod::GnuPg));
    }

    /// Wire names are case-sensitive
    #[test]
    fn test_parse_rejects_other_spellings() {
        assert!("gnupg".parse::<EncryptionMethod>().is_err());
        assert!("PGP6".parse::<EncryptionMethod>().is_err());
        assert!("".parse::<EncryptionMethod>().is_err());
    }

    #[test]
    fn test_display_matches_wire_name() {
        for method in EncryptionMethod::ALL {
            assert_eq!(method.to_string().parse::<EncryptionMethod>(), Ok(method));
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&EncryptionMethod::GnuPg).unwrap();
        assert_eq!(json, "\"GnuPG\"");
    }
}
