//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators this subsystem needs but does not implement: the node
//! directory, the address formatter and the crypto engine.
//!
//! Implementations must be safe for concurrent read access; lookups and
//! engine calls may block on I/O.

use crate::domain::address::FtnAddress;
use crate::domain::entities::NodeRecord;
use crate::domain::method::EncryptionMethod;
use thiserror::Error;

/// Error from directory lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// No record for the address
    #[error("Node {address} not found")]
    NotFound { address: String },

    /// The directory source could not be read
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Opaque failure from the crypto engine. The message is surfaced verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Node directory (nodelist or address book).
pub trait Directory: Send + Sync {
    /// Fetch the record for `address`.
    ///
    /// # Errors
    /// * `DirectoryError::NotFound` - no record exists
    /// * `DirectoryError::Unavailable` - the source could not be consulted
    fn lookup(&self, address: &FtnAddress) -> Result<NodeRecord, DirectoryError>;
}

/// Canonical formatting of network addresses.
pub trait AddressFormatter: Send + Sync {
    /// Fully-qualified domain name for `address`. Pure and deterministic.
    fn fqdn(&self, address: &FtnAddress) -> String;
}

/// External encryption engine.
pub trait CryptoEngine: Send + Sync {
    /// Encrypt `plaintext` to `recipient`, returning armoured ciphertext.
    fn encrypt(
        &self,
        plaintext: &str,
        method: EncryptionMethod,
        recipient: &str,
    ) -> Result<String, EngineError>;

    /// Decrypt `ciphertext` using the holder's `passphrase`.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        method: EncryptionMethod,
        passphrase: &str,
    ) -> Result<String, EngineError>;

    /// Strip the ASCII armour from `text`.
    fn unarmour(&self, text: &str) -> Result<Vec<u8>, EngineError>;
}

impl<T: Directory + ?Sized> Directory for std::sync::Arc<T> {
    fn lookup(&self, address: &FtnAddress) -> Result<NodeRecord, DirectoryError> {
        (**self).lookup(address)
    }
}

impl<T: AddressFormatter + ?Sized> AddressFormatter for std::sync::Arc<T> {
    fn fqdn(&self, address: &FtnAddress) -> String {
        (**self).fqdn(address)
    }
}

impl<T: CryptoEngine + ?Sized> CryptoEngine for std::sync::Arc<T> {
    fn encrypt(
        &self,
        plaintext: &str,
        method: EncryptionMethod,
        recipient: &str,
    ) -> Result<String, EngineError> {
        (**self).encrypt(plaintext, method, recipient)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        method: EncryptionMethod,
        passphrase: &str,
    ) -> Result<String, EngineError> {
        (**self).decrypt(ciphertext, method, passphrase)
    }

    fn unarmour(&self, text: &str) -> Result<Vec<u8>, EngineError> {
        (**self).unarmour(text)
    }
}
