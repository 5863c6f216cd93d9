//! Common error handling utilities for the authorization workspace
//!
//! Every crate keeps its own `thiserror` enum, but classifies each variant
//! into one [`ErrorKind`] through the [`HasErrorKind`] trait. The kind drives
//! HTTP status selection, stable error codes and log severity.
//!
//! # Example
//!
//! ```rust
//! use error_common::{ErrorKind, HasErrorKind};
//!
//! fn status_for<E: HasErrorKind>(error: &E) -> u16 {
//!     error.kind().http_status()
//! }
//!
//! assert_eq!(ErrorKind::Forbidden.http_status(), 403);
//! ```

pub mod codes;
pub mod types;

pub use types::*;
