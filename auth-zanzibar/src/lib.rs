//! Zanzibar-style authorization engine for the community platform
//!
//! Permissions are stored as relation tuples: *subject has relation on
//! namespace:object*. A check resolves, first match wins:
//!
//! 1. **Direct**: the exact tuple exists
//! 2. **Inherited**: the user holds a stronger relation that implies the
//!    requested one (`owner ⊇ {editor, viewer}`, `admin ⊇ {moderator, member}`)
//! 3. **System override**: `system:global#admin` passes every check outside
//!    the `system` namespace; `system:global#moderator` passes moderator and
//!    admin checks
//! 4. **Wildcard**: the tuple exists for subject `*` (any authenticated user)
//!
//! # Core Concepts
//!
//! - **Namespace**: kind of protected resource (`post`, `comment`, `system`, ...)
//! - **Relation**: permission level (`owner`, `viewer`, `moderator`, ...)
//! - **Tuple**: one grant, unique over its five fields
//! - **Inheritance map**: immutable, injected at engine construction
//!
//! # Example
//!
//! ```rust
//! use auth_zanzibar::{AuthorizationEngine, Namespace, Relation};
//! use auth_zanzibar::repository::InMemoryTupleRepository;
//! use std::sync::Arc;
//!
//! # async fn demo() -> auth_zanzibar::Result<()> {
//! let engine = AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()));
//!
//! // The author of a post becomes its owner
//! engine.grant_owner(Namespace::Post, "p1", "u1").await?;
//!
//! // Owner implies editor
//! assert!(engine.check("u1", Namespace::Post, "p1", Relation::Editor).await?);
//!
//! // Deleting the post cascades to its tuples
//! engine.revoke_all(Namespace::Post, "p1").await?;
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;

pub use engine::*;
pub use error::*;
pub use models::*;
pub use schema::*;
