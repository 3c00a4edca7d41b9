//! Backend abstraction for identity-provider calls.
//!
//! The [`Backend`] trait defines the four resource-server operations,
//! allowing for different implementations (HTTP service, in-memory fake).

pub mod http;
pub mod memory;

use crate::error::Result;
use crate::types::{
    CreateResourceServerInput, DeleteResourceServerInput, DescribeResourceServerInput,
    ResourceServer, UpdateResourceServerInput,
};

/// Backend trait for resource-server operations.
///
/// This trait abstracts the transport, enabling:
/// - Real calls against the JSON 1.1 service endpoint
/// - An in-memory implementation for tests and offline runs
pub trait Backend: Send + Sync {
    /// Create a resource server and return it as stored.
    fn create_resource_server(&self, input: &CreateResourceServerInput) -> Result<ResourceServer>;

    /// Describe a resource server. Fails with a not-found error when absent.
    fn describe_resource_server(
        &self,
        input: &DescribeResourceServerInput,
    ) -> Result<ResourceServer>;

    /// Update a resource server and return it as stored.
    fn update_resource_server(&self, input: &UpdateResourceServerInput) -> Result<ResourceServer>;

    /// Delete a resource server.
    fn delete_resource_server(&self, input: &DeleteResourceServerInput) -> Result<()>;
}

/// Shared backends, so a test can keep a handle to a [`memory::MemoryBackend`]
/// while a client owns another.
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn create_resource_server(&self, input: &CreateResourceServerInput) -> Result<ResourceServer> {
        (**self).create_resource_server(input)
    }

    fn describe_resource_server(
        &self,
        input: &DescribeResourceServerInput,
    ) -> Result<ResourceServer> {
        (**self).describe_resource_server(input)
    }

    fn update_resource_server(&self, input: &UpdateResourceServerInput) -> Result<ResourceServer> {
        (**self).update_resource_server(input)
    }

    fn delete_resource_server(&self, input: &DeleteResourceServerInput) -> Result<()> {
        (**self).delete_resource_server(input)
    }
}
