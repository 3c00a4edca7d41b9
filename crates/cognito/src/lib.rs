//! # cognito
//!
//! Blocking client for user pool resource-server operations.
//!
//! This crate provides:
//! - Typed request/response shapes for the four resource-server calls
//! - An error taxonomy that separates not-found, conflicting, throttled
//!   and transient failures
//! - An HTTP backend speaking the JSON 1.1 protocol
//! - An in-memory backend for tests and offline runs
//!
//! ## Example
//!
//! ```no_run
//! use cognito::{Client, DescribeResourceServerInput};
//!
//! let client = Client::for_region("us-east-1");
//! let server = client
//!     .describe_resource_server(&DescribeResourceServerInput {
//!         user_pool_id: "us-east-1_abc123".into(),
//!         identifier: "https://api.example.com".into(),
//!     })
//!     .expect("describe failed");
//! println!("{} has {} scopes", server.name, server.scopes.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    CreateResourceServerInput, DeleteResourceServerInput, DescribeResourceServerInput, Operation,
    ResourceServer, ResourceServerScope, UpdateResourceServerInput,
};

use backend::Backend;
use backend::http::HttpBackend;

/// High-level client for resource-server operations.
///
/// The client wraps a backend and logs each call. It is the handle the
/// orchestration layer passes explicitly to every lifecycle operation.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client against the regional public endpoint.
    pub fn for_region(region: &str) -> Self {
        Self::with_backend(Box::new(HttpBackend::for_region(region)))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Create a resource server.
    pub fn create_resource_server(
        &self,
        input: &CreateResourceServerInput,
    ) -> Result<ResourceServer> {
        log::debug!(
            "CreateResourceServer {} in {}",
            input.identifier,
            input.user_pool_id
        );
        self.backend.create_resource_server(input)
    }

    /// Describe a resource server.
    pub fn describe_resource_server(
        &self,
        input: &DescribeResourceServerInput,
    ) -> Result<ResourceServer> {
        log::debug!(
            "DescribeResourceServer {} in {}",
            input.identifier,
            input.user_pool_id
        );
        self.backend.describe_resource_server(input)
    }

    /// Update a resource server.
    pub fn update_resource_server(
        &self,
        input: &UpdateResourceServerInput,
    ) -> Result<ResourceServer> {
        log::debug!(
            "UpdateResourceServer {} in {} (scopes: {})",
            input.identifier,
            input.user_pool_id,
            if input.scopes.is_some() { "sent" } else { "unchanged" }
        );
        self.backend.update_resource_server(input)
    }

    /// Delete a resource server.
    pub fn delete_resource_server(&self, input: &DeleteResourceServerInput) -> Result<()> {
        log::debug!(
            "DeleteResourceServer {} in {}",
            input.identifier,
            input.user_pool_id
        );
        self.backend.delete_resource_server(input)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
