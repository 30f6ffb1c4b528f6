//! # Capability Resolution
//!
//! Decides from a node's directory flags whether it accepts encrypted
//! netmail, and with which method.
//!
//! A flag is either `NAME` (boolean) or `NAME:VALUE`, split on the first
//! colon. The node is capable when its `CRYPT` flag carries a supported
//! method, e.g. `CRYPT:GnuPG`.

use crate::domain::address::FtnAddress;
use crate::domain::entities::{LocalPart, NodeCapability};
use crate::domain::errors::CapabilityError;
use crate::domain::method::EncryptionMethod;
use crate::ports::outbound::{AddressFormatter, Directory};
use std::collections::HashMap;
use tracing::debug;

/// Directory flag advertising an encryption method.
pub const CAPABILITY_FLAG: &str = "CRYPT";

/// Parsed value of one directory flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagValue {
    /// Flag listed without a value
    Set,
    /// `NAME:VALUE` form
    Value(String),
}

/// Build the flag mapping. Duplicated names keep their last occurrence.
pub fn parse_flags<S: AsRef<str>>(flags: &[S]) -> HashMap<String, FlagValue> {
    flags
        .iter()
        .map(|flag| match flag.as_ref().split_once(':') {
            Some((name, value)) => (name.to_string(), FlagValue::Value(value.to_string())),
            None => (flag.as_ref().to_string(), FlagValue::Set),
        })
        .collect()
}

/// Method advertised by a flag set.
///
/// # Errors
/// * `CapabilityError::MissingFlag` - no `CRYPT` flag
/// * `CapabilityError::UnsupportedMethod` - flag without value, or unknown method
pub fn advertised_method<S: AsRef<str>>(flags: &[S]) -> Result<EncryptionMethod, CapabilityError> {
    match parse_flags(flags).remove(CAPABILITY_FLAG) {
        None => Err(CapabilityError::MissingFlag),
        Some(FlagValue::Set) => Err(CapabilityError::UnsupportedMethod(String::new())),
        Some(FlagValue::Value(value)) => value.parse(),
    }
}

/// Resolves node addresses to [`NodeCapability`] through the directory.
///
/// Holds no per-call state; every resolution is a fresh lookup.
pub struct CapabilityResolver<D: Directory, F: AddressFormatter> {
    directory: D,
    formatter: F,
    local_part: LocalPart,
}

impl<D: Directory, F: AddressFormatter> CapabilityResolver<D, F> {
    pub fn new(directory: D, formatter: F, local_part: LocalPart) -> Self {
        Self {
            directory,
            formatter,
            local_part,
        }
    }

    /// Resolve the capability of `address`.
    ///
    /// A missing or unsupported method yields `method: None`; only a
    /// directory miss or failure is an error.
    pub fn resolve(&self, address: &FtnAddress) -> Result<NodeCapability, CapabilityError> {
        let record = self.directory.lookup(address)?;

        let method = match advertised_method(&record.flags) {
            Ok(method) => Some(method),
            Err(reason) => {
                debug!(%address, %reason, "node has no usable encryption method");
                None
            }
        };

        let destination_address = self.destination_for(address);
        debug!(%address, destination = %destination_address, ?method, "capability resolved");

        Ok(NodeCapability {
            destination_address,
            method,
        })
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Whether `address` can currently receive encrypted mail.
    pub fn is_capable(&self, address: &FtnAddress) -> bool {
        self.resolve(address)
            .map(|capability| capability.is_capable())
            .unwrap_or(false)
    }

    /// Email-style destination: `<local-part>@<fqdn>`.
    pub fn destination_for(&self, address: &FtnAddress) -> String {
        format!("{}@{}", self.local_part, self.formatter.fqdn(address))
    }
}
