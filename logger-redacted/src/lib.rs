//! Logging for the authorization workspace
//!
//! - [`init_logging`] installs a `tracing` subscriber (pretty or JSON) with an
//!   `EnvFilter` taken from `RUST_LOG` or the configured level.
//! - [`LogRedactor`] keeps raw subject ids and e-mail addresses out of log
//!   output. Subject ids are replaced by a short SHA-256 fingerprint so that
//!   one subject can still be correlated across lines.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{LogRedactor, LoggerConfig};
//!
//! let config = LoggerConfig::default();
//! let redactor = LogRedactor::from_enabled(config.redaction_enabled);
//! tracing::info!(subject = %redactor.subject("u1"), "Granted owner");
//! ```

pub mod config;
pub mod init;
pub mod redactor;

pub use config::*;
pub use init::*;
pub use redactor::*;
