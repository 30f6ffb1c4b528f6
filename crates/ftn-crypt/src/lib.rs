//! # FTN-Crypt
//!
//! Optional end-to-end encryption of FidoNet-technology netmail.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): envelope framing, flag parsing, typed model; no I/O
//! - **Ports Layer** (`ports/`): the driving API and the driven collaborators
//! - **Service Layer** (`service.rs`): the encrypt/decrypt protocol over the ports
//! - **Adapters** (`adapters/`): directory, FQDN formatter and command engine
//!
//! ## Security Notes
//!
//! - **Consistency gate**: decrypt re-resolves the node's method and refuses
//!   when it differs from the `ENC:` marker recorded in the message
//! - **No partial writes**: envelopes change only after the engine succeeded
//! - Passphrases and message text are never logged

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::address::FtnAddress;
pub use domain::capability::{
    advertised_method, parse_flags, CapabilityResolver, FlagValue, CAPABILITY_FLAG,
};
pub use domain::config::{ConfigError, CryptConfig, DEFAULT_FQDN_DOMAIN};
pub use domain::entities::{LocalPart, NodeCapability, NodeRecord, OperationResult};
pub use domain::envelope::{Envelope, TagArea, DISPLAY_SEPARATOR, LINE_SEPARATOR, TAG_MARKER};
pub use domain::errors::{AddressError, CapabilityError, CryptError, EnvelopeError};
pub use domain::method::EncryptionMethod;
pub use ports::inbound::MessageCryptApi;
pub use ports::outbound::{AddressFormatter, CryptoEngine, Directory, DirectoryError, EngineError};
pub use service::{is_armoured, MessageCryptService, ARMOUR_BEGIN, METHOD_TAG};
pub use adapters::{
    CommandEngine, CommandEngineConfig, CommandSpec, FidonetFqdn, InMemoryDirectory,
    JsonDirectory, MethodCommands, PassphraseInput,
};
