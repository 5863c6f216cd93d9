//! Authorization adapters for route handlers
//!
//! [`AuthGateway`] resolves the current user through a [`SessionProvider`]
//! and asks the Zanzibar engine whether they hold a relation:
//!
//! - `require_admin` / `require_moderator` / `require_relation` return the
//!   user id or a [`GatewayError`] whose kind is `Unauthorized` (no session),
//!   `Forbidden` (relation absent) or `ServerError`
//! - `is_admin` / `is_moderator` never fail: every error maps to `false`
//!
//! `GatewayError` converts into an `axum` response with the matching status
//! and a JSON body `{ "error": { "code", "kind", "message" } }`.
//!
//! # Example
//!
//! ```rust
//! use auth_gateway::{AuthGateway, StaticSessionProvider};
//! use auth_zanzibar::{AuthorizationEngine, SystemRole};
//! use auth_zanzibar::repository::InMemoryTupleRepository;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), auth_gateway::GatewayError> {
//! let engine = Arc::new(AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new())));
//! engine.set_system_role("a1", SystemRole::Admin).await?;
//!
//! let gateway = AuthGateway::new(engine, Arc::new(StaticSessionProvider::authenticated("a1")));
//! let admin_id = gateway.require_admin().await?;
//! assert_eq!(admin_id, "a1");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod response;
pub mod session;

pub use error::*;
pub use gateway::*;
pub use session::*;
