//! # Adapters
//!
//! Reference implementations of the outbound ports.

pub mod command_engine;
pub mod directory;
pub mod fqdn;

pub use command_engine::{
    CommandEngine, CommandEngineConfig, CommandSpec, MethodCommands, PassphraseInput,
};
pub use directory::{InMemoryDirectory, JsonDirectory};
pub use fqdn::FidonetFqdn;
