//! Configuration management for the authorization workspace
//!
//! Settings are layered with `figment`:
//! - **Defaults**: in-memory tuple store, `info` logging, redaction on
//! - **File**: YAML or TOML, selected by extension
//! - **Environment**: `AUTHZ_*` variables, `__` for nesting
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::ConfigEngine;
//!
//! let config = ConfigEngine::new().with_file("authz.yaml").load()?;
//! println!("store backend: {}", config.store.backend);
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod engine;
pub mod error;
pub mod settings;

pub use engine::*;
pub use error::*;
pub use settings::*;
