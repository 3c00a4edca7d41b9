//! Lifecycle trait for declarative resources
//!
//! A resource type binds a typed state to four remote operations. The
//! engine owns the state between runs and hands it to the binding together
//! with an explicit client handle.

use crate::data::ResourceData;
use crate::schema::Schema;
use crate::types::Timeouts;
use anyhow::{Result, bail};
use std::fmt;

/// Core trait for resource type bindings
///
/// Every binding provides:
/// - Identity (type name) and a schema declaration
/// - Validation of a desired state
/// - Change detection between two states
/// - The create/read/update/delete operations
///
/// # Example
///
/// ```ignore
/// use declarative::{Lifecycle, ResourceData, Schema, Attribute};
///
/// struct Bucket;
///
/// impl Lifecycle for Bucket {
///     type State = String;
///     type Client = StorageClient;
///
///     fn type_name(&self) -> &'static str { "bucket" }
///     fn schema(&self) -> Schema {
///         Schema::v0().with_attribute("name", Attribute::required_string().force_new())
///     }
///     fn changed_fields(&self, prior: &String, desired: &String) -> Vec<&'static str> {
///         if prior == desired { vec![] } else { vec!["name"] }
///     }
///     fn create(&self, data: &mut ResourceData<String>, client: &StorageClient) -> anyhow::Result<()> {
///         client.create_bucket(data.state())?;
///         data.set_id(data.state().clone());
///         self.read(data, client)
///     }
///     // read, update, delete ...
/// }
/// ```
pub trait Lifecycle {
    /// Typed desired/observed state
    type State: Clone + PartialEq + fmt::Debug;

    /// Remote API handle passed to every operation
    type Client: ?Sized;

    /// Type name used in addresses (`type.alias`)
    fn type_name(&self) -> &'static str;

    /// Schema declaration exposed to the engine
    fn schema(&self) -> Schema;

    /// Timeouts used when the configuration sets none
    fn default_timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Check a desired state before any remote call
    fn validate(&self, _state: &Self::State) -> Result<()> {
        Ok(())
    }

    /// Names of configurable fields that differ between two states
    ///
    /// Computed fields must not be reported.
    fn changed_fields(&self, prior: &Self::State, desired: &Self::State) -> Vec<&'static str>;

    /// Create the remote object and populate `data`
    fn create(&self, data: &mut ResourceData<Self::State>, client: &Self::Client) -> Result<()>;

    /// Refresh `data` from the remote object
    ///
    /// Clears the identity key when the object no longer exists.
    fn read(&self, data: &mut ResourceData<Self::State>, client: &Self::Client) -> Result<()>;

    /// Apply the changes flagged in `data`
    fn update(&self, data: &mut ResourceData<Self::State>, client: &Self::Client) -> Result<()>;

    /// Delete the remote object and clear the identity key
    fn delete(&self, data: &mut ResourceData<Self::State>, client: &Self::Client) -> Result<()>;

    /// Adopt an existing remote object addressed by an import id
    fn import(&self, id: &str, _client: &Self::Client) -> Result<ResourceData<Self::State>> {
        bail!("{} does not support import (id: {})", self.type_name(), id)
    }
}
