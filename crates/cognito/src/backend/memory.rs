//! In-memory backend.
//!
//! Keeps resource servers in a map keyed by `(user_pool_id, identifier)`,
//! records every request it receives and can be told to fail upcoming
//! calls. Used by tests and by offline runs of the CLI.

use crate::backend::Backend;
use crate::error::{Error, INVALID_PARAMETER, Result};
use crate::types::{
    CreateResourceServerInput, DeleteResourceServerInput, DescribeResourceServerInput, Operation,
    ResourceServer, UpdateResourceServerInput,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A request as received by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Create(CreateResourceServerInput),
    Describe(DescribeResourceServerInput),
    Update(UpdateResourceServerInput),
    Delete(DeleteResourceServerInput),
}

impl RecordedRequest {
    /// The operation this request was sent for.
    pub fn operation(&self) -> Operation {
        match self {
            RecordedRequest::Create(_) => Operation::CreateResourceServer,
            RecordedRequest::Describe(_) => Operation::DescribeResourceServer,
            RecordedRequest::Update(_) => Operation::UpdateResourceServer,
            RecordedRequest::Delete(_) => Operation::DeleteResourceServer,
        }
    }
}

#[derive(Debug)]
struct InjectedFailure {
    operation: Operation,
    code: String,
    message: String,
}

#[derive(Debug, Default)]
struct Inner {
    pools: BTreeSet<String>,
    servers: BTreeMap<(String, String), ResourceServer>,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<InjectedFailure>,
}

/// In-memory stand-in for the identity-provider service.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    /// Create an empty backend with no user pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user pool so resource servers can be created in it.
    pub fn with_pool(self, user_pool_id: impl Into<String>) -> Self {
        self.lock().pools.insert(user_pool_id.into());
        self
    }

    /// Store a resource server directly, bypassing request recording.
    ///
    /// Registers its pool as a side effect.
    pub fn insert(&self, server: ResourceServer) {
        let mut inner = self.lock();
        inner.pools.insert(server.user_pool_id.clone());
        inner.servers.insert(
            (server.user_pool_id.clone(), server.identifier.clone()),
            server,
        );
    }

    /// Remove a resource server directly, as if deleted out of band.
    pub fn remove(&self, user_pool_id: &str, identifier: &str) -> Option<ResourceServer> {
        self.lock()
            .servers
            .remove(&(user_pool_id.to_string(), identifier.to_string()))
    }

    /// Look up a stored resource server.
    pub fn get(&self, user_pool_id: &str, identifier: &str) -> Option<ResourceServer> {
        self.lock()
            .servers
            .get(&(user_pool_id.to_string(), identifier.to_string()))
            .cloned()
    }

    /// Number of stored resource servers.
    pub fn len(&self) -> usize {
        self.lock().servers.len()
    }

    /// Whether no resource servers are stored.
    pub fn is_empty(&self) -> bool {
        self.lock().servers.is_empty()
    }

    /// Fail the next call of `operation` with the given service error code.
    ///
    /// Failures queue up in order; each one is consumed by the first
    /// matching call.
    pub fn fail_next(&self, operation: Operation, code: impl Into<String>, message: impl Into<String>) {
        self.lock().failures.push_back(InjectedFailure {
            operation,
            code: code.into(),
            message: message.into(),
        });
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn take_failure(&mut self, operation: Operation) -> Option<Error> {
        let pos = self
            .failures
            .iter()
            .position(|f| f.operation == operation)?;
        let failure = self.failures.remove(pos)?;
        Some(Error::api(failure.code, failure.message, 400))
    }

    fn ensure_pool(&self, user_pool_id: &str) -> Result<()> {
        if self.pools.contains(user_pool_id) {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "User pool {user_pool_id} does not exist."
            )))
        }
    }

    fn existing(&self, user_pool_id: &str, identifier: &str) -> Result<&ResourceServer> {
        self.ensure_pool(user_pool_id)?;
        self.servers
            .get(&(user_pool_id.to_string(), identifier.to_string()))
            .ok_or_else(|| {
                Error::not_found(format!(
                    "Resource server {identifier} does not exist in pool {user_pool_id}."
                ))
            })
    }
}

impl Backend for MemoryBackend {
    fn create_resource_server(&self, input: &CreateResourceServerInput) -> Result<ResourceServer> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest::Create(input.clone()));
        if let Some(err) = inner.take_failure(Operation::CreateResourceServer) {
            return Err(err);
        }
        inner.ensure_pool(&input.user_pool_id)?;

        let key = (input.user_pool_id.clone(), input.identifier.clone());
        if inner.servers.contains_key(&key) {
            return Err(Error::api(
                INVALID_PARAMETER,
                format!("{} already exists in pool {}.", input.identifier, input.user_pool_id),
                400,
            ));
        }

        let server = ResourceServer {
            user_pool_id: input.user_pool_id.clone(),
            identifier: input.identifier.clone(),
            name: input.name.clone(),
            scopes: input.scopes.clone().unwrap_or_default(),
        };
        inner.servers.insert(key, server.clone());
        Ok(server)
    }

    fn describe_resource_server(
        &self,
        input: &DescribeResourceServerInput,
    ) -> Result<ResourceServer> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest::Describe(input.clone()));
        if let Some(err) = inner.take_failure(Operation::DescribeResourceServer) {
            return Err(err);
        }
        inner
            .existing(&input.user_pool_id, &input.identifier)
            .cloned()
    }

    fn update_resource_server(&self, input: &UpdateResourceServerInput) -> Result<ResourceServer> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest::Update(input.clone()));
        if let Some(err) = inner.take_failure(Operation::UpdateResourceServer) {
            return Err(err);
        }
        inner.existing(&input.user_pool_id, &input.identifier)?;

        let key = (input.user_pool_id.clone(), input.identifier.clone());
        let server = inner
            .servers
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(format!("Resource server {} vanished.", input.identifier)))?;
        server.name = input.name.clone();
        if let Some(scopes) = &input.scopes {
            server.scopes = scopes.clone();
        }
        Ok(server.clone())
    }

    fn delete_resource_server(&self, input: &DeleteResourceServerInput) -> Result<()> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest::Delete(input.clone()));
        if let Some(err) = inner.take_failure(Operation::DeleteResourceServer) {
            return Err(err);
        }
        inner.existing(&input.user_pool_id, &input.identifier)?;
        inner
            .servers
            .remove(&(input.user_pool_id.clone(), input.identifier.clone()));
        Ok(())
    }
}
