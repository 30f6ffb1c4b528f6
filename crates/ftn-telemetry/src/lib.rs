//! # FTN Telemetry
//!
//! Logging setup shared by the FTN-Crypt binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ftn_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     init_logging(&TelemetryConfig::from_env()).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `ftn-crypt` | Service name in log events |
//! | `FTN_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `FTN_CONSOLE_OUTPUT` | `true` | Write log output at all |
//! | `FTN_JSON_LOGS` | `false` | JSON lines instead of text |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}
