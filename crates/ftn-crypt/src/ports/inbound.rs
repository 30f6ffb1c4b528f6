//! # Inbound Ports (Driving Ports / API)
//!
//! The public API of the encryption subsystem.

use crate::domain::address::FtnAddress;
use crate::domain::entities::{NodeCapability, OperationResult};
use crate::domain::errors::CryptError;

/// Netmail encryption API.
///
/// Every call is an independent pipeline over its own envelope; nothing is
/// shared between calls, so implementations are `Send + Sync`.
pub trait MessageCryptApi: Send + Sync {
    /// Resolve the current encryption capability of `address`.
    fn capability(&self, address: &FtnAddress) -> Result<NodeCapability, CryptError>;

    /// Encrypt the body of `raw_message` for `address`.
    ///
    /// On success the result holds the re-encoded message carrying an
    /// `ENC: <method>` tag.
    fn encrypt(&self, address: &FtnAddress, raw_message: &str) -> OperationResult;

    /// Decrypt the body of `raw_message` received for `address`.
    ///
    /// # Security
    /// The method recorded in the message must match the method the node
    /// advertises now; a mismatch is always reported, never resolved.
    fn decrypt(&self, address: &FtnAddress, raw_message: &str, passphrase: &str)
        -> OperationResult;
}
