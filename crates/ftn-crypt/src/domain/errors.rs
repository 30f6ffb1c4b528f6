//! # Domain Errors
//!
//! Error types for envelope handling, capability resolution and the
//! encrypt/decrypt protocol.

use crate::domain::method::EncryptionMethod;
use crate::ports::outbound::{DirectoryError, EngineError};
use thiserror::Error;

/// Errors raised by the envelope codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Raw message bytes could not be decoded as text
    #[error("Malformed message: {0}")]
    Format(String),

    /// Tag text must not be empty
    #[error("Tag text is empty")]
    EmptyTag,

    /// A tag-line is exactly one line
    #[error("Tag text spans multiple lines")]
    MultiLineTag,

    /// Tag area must be `header` or `footer`
    #[error("Unknown tag area: {0}")]
    UnknownArea(String),
}

/// Errors parsing a network address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Malformed node address: {0}")]
    Malformed(String),
}

/// Errors from capability resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The directory has no record for the address
    #[error("Node {address} is not listed")]
    NotFound { address: String },

    /// The node advertises a method outside the supported set
    #[error("Unsupported encryption method: {0}")]
    UnsupportedMethod(String),

    /// The node does not advertise the encryption flag
    #[error("Node does not advertise encryption")]
    MissingFlag,

    /// The directory could not be consulted
    #[error("Directory lookup failed: {0}")]
    Directory(String),
}

impl From<DirectoryError> for CapabilityError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound { address } => CapabilityError::NotFound { address },
            DirectoryError::Unavailable(reason) => CapabilityError::Directory(reason),
        }
    }
}

/// Errors produced by a single encrypt or decrypt call.
///
/// The `Display` text of each variant is what callers see in
/// `OperationResult::text_or_error`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptError {
    /// Bad or missing caller input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Address absent from the directory
    #[error("no encryption-capable destination")]
    NotFound { address: String },

    /// Node has no flag, or advertises an unsupported method
    #[error("no encryption-capable destination")]
    NoCapability,

    /// Decrypt was asked for a message with no method marker
    #[error("message is not encrypted")]
    NotEncrypted,

    /// Method recorded in the message differs from the node's current one
    #[error("method mismatch: message uses {recorded}, node now advertises {advertised}")]
    MethodMismatch {
        recorded: String,
        advertised: EncryptionMethod,
    },

    /// Opaque failure from the crypto engine, passed through verbatim
    #[error("{0}")]
    Engine(String),

    /// The directory could not be consulted
    #[error("Directory lookup failed: {0}")]
    Directory(String),
}

impl From<EnvelopeError> for CryptError {
    fn from(err: EnvelopeError) -> Self {
        CryptError::Validation(err.to_string())
    }
}

impl From<AddressError> for CryptError {
    fn from(err: AddressError) -> Self {
        CryptError::Validation(err.to_string())
    }
}

impl From<CapabilityError> for CryptError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::NotFound { address } => CryptError::NotFound { address },
            CapabilityError::UnsupportedMethod(_) | CapabilityError::MissingFlag => {
                CryptError::NoCapability
            }
            CapabilityError::Directory(reason) => CryptError::Directory(reason),
        }
    }
}

impl From<EngineError> for CryptError {
    fn from(err: EngineError) -> Self {
        CryptError::Engine(err.0)
    }
}
