//! # Domain Entities
//!
//! Core data structures shared by the resolver and the orchestrator.

use crate::domain::address::FtnAddress;
use crate::domain::errors::CryptError;
use crate::domain::method::EncryptionMethod;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static LOCAL_PART_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+([.-]\w+)*$").expect("static pattern compiles"));

// =============================================================================
// Destination identity
// =============================================================================

/// Local-part of an email-style destination address.
///
/// Word characters, optionally split into groups by single dots or hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalPart(String);

impl LocalPart {
    pub fn new(value: &str) -> Result<Self, CryptError> {
        if LOCAL_PART_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(CryptError::Validation(format!(
                "invalid destination local-part: {value:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LocalPart {
    fn default() -> Self {
        Self("sysop".to_string())
    }
}

impl fmt::Display for LocalPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LocalPart {
    type Error = CryptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LocalPart> for String {
    fn from(value: LocalPart) -> Self {
        value.0
    }
}

// =============================================================================
// Directory and capability
// =============================================================================

/// A node's entry as returned by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Canonical node address
    pub address: FtnAddress,
    /// Advertised flags in listing order, `NAME` or `NAME:VALUE`
    pub flags: Vec<String>,
}

impl NodeRecord {
    pub fn new(address: FtnAddress, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            address,
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Encryption capability of one node, recomputed for every call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapability {
    /// Email-style address the crypto engine encrypts to
    pub destination_address: String,
    /// Supported method, or `None` when the node advertises none
    pub method: Option<EncryptionMethod>,
}

impl NodeCapability {
    pub fn is_capable(&self) -> bool {
        self.method.is_some()
    }
}

// =============================================================================
// Operation result
// =============================================================================

/// Outcome of one encrypt or decrypt call.
///
/// `text_or_error` holds the resulting message on success and the rendered
/// error otherwise; `error` keeps the failure kind for callers that branch
/// on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResult {
    pub ok: bool,
    pub text_or_error: String,
    pub error: Option<CryptError>,
}

impl OperationResult {
    pub fn success(text: String) -> Self {
        Self {
            ok: true,
            text_or_error: text,
            error: None,
        }
    }

    pub fn failure(error: CryptError) -> Self {
        Self {
            ok: false,
            text_or_error: error.to_string(),
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<String, CryptError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.text_or_error),
        }
    }
}

impl From<Result<String, CryptError>> for OperationResult {
    fn from(result: Result<String, CryptError>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(err) => Self::failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_part_accepts_segmented_words() {
        for ok in ["sysop", "john.doe", "a-b.c_d", "x1"] {
            assert!(LocalPart::new(ok).is_ok(), "rejected {ok:?}");
        }
    }

    #[test]
    fn test_local_part_rejects_bad_shapes() {
        for bad in ["", ".sysop", "sysop.", "a..b", "a-.b", "john doe", "a@b"] {
            assert!(
                matches!(LocalPart::new(bad), Err(CryptError::Validation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_local_part_deserialize_validates() {
        assert!(serde_json::from_str::<LocalPart>("\"ok.name\"").is_ok());
        assert!(serde_json::from_str::<LocalPart>("\"bad name\"").is_err());
    }

    #[test]
    fn test_operation_result_from_error() {
        let result = OperationResult::from(Err(CryptError::NotEncrypted));
        assert!(!result.ok);
        assert_eq!(result.text_or_error, "message is not encrypted");
        assert_eq!(result.into_result(), Err(CryptError::NotEncrypted));
    }

    #[test]
    fn test_operation_result_from_text() {
        let result = OperationResult::from(Ok("text".to_string()));
        assert!(result.ok);
        assert_eq!(result.error, None);
        assert_eq!(result.into_result(), Ok("text".to_string()));
    }
}
