//! # Directory Adapters
//!
//! Two reference implementations of the `Directory` port:
//! - `InMemoryDirectory`: records held in a map, for tests and embedders
//! - `JsonDirectory`: records loaded from a JSON file mapping addresses to
//!   flag lists, e.g. `{ "2:5020/1042": ["CM", "CRYPT:GnuPG"] }`

use crate::domain::address::FtnAddress;
use crate::domain::entities::NodeRecord;
use crate::ports::outbound::{Directory, DirectoryError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Directory backed by an in-process map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    records: HashMap<FtnAddress, Vec<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of one node's flags.
    pub fn with_node(
        mut self,
        address: FtnAddress,
        flags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.insert(address, flags);
        self
    }

    pub fn insert(
        &mut self,
        address: FtnAddress,
        flags: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.records
            .insert(address, flags.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Directory for InMemoryDirectory {
    fn lookup(&self, address: &FtnAddress) -> Result<NodeRecord, DirectoryError> {
        self.records
            .get(address)
            .map(|flags| NodeRecord::new(*address, flags.iter().cloned()))
            .ok_or_else(|| DirectoryError::NotFound {
                address: address.to_string(),
            })
    }
}

/// Directory loaded once from a JSON file.
#[derive(Clone, Debug)]
pub struct JsonDirectory {
    inner: InMemoryDirectory,
}

impl JsonDirectory {
    /// Load and parse `path`.
    ///
    /// # Errors
    /// * `DirectoryError::Unavailable` - the file is unreadable or malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DirectoryError::Unavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let directory = Self::from_json(&text)?;
        info!(path = %path.display(), nodes = directory.inner.len(), "directory loaded");
        Ok(directory)
    }

    pub fn from_json(text: &str) -> Result<Self, DirectoryError> {
        let records: HashMap<FtnAddress, Vec<String>> = serde_json::from_str(text)
            .map_err(|e| DirectoryError::Unavailable(format!("malformed directory: {e}")))?;
        Ok(Self {
            inner: InMemoryDirectory { records },
        })
    }
}

impl Directory for JsonDirectory {
    fn lookup(&self, address: &FtnAddress) -> Result<NodeRecord, DirectoryError> {
        self.inner.lookup(address)
    }
}
