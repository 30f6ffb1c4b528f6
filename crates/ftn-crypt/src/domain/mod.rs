//! # Domain Layer
//!
//! Envelope framing, flag parsing and the typed model, with no I/O.
//! This is the inner layer of the hexagonal architecture.

pub mod address;
pub mod capability;
pub mod config;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod method;
