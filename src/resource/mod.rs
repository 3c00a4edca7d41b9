//! Resource bindings for idpform
//!
//! Each binding implements [`declarative::Lifecycle`] for one resource type:
//! - State shape (desired fields plus computed ones)
//! - Validation of desired state before any remote call
//! - Create/read/update/delete against the remote API

pub mod resource_server;
pub mod scopes;
pub mod validate;

pub use resource_server::{ResourceServerBinding, ResourceServerConfig, TYPE_NAME};
pub use scopes::ScopeDef;
