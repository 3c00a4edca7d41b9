//! Typed resource data passed to lifecycle operations
//!
//! `ResourceData` carries the identity key, the typed state and the set of
//! fields the engine saw change since the last apply. Lifecycle operations
//! read and write it in place.

use crate::types::{DEFAULT_TIMEOUT, Timeouts};
use std::collections::BTreeSet;
use std::time::Duration;

/// State of one resource instance plus its engine bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceData<T> {
    id: String,
    state: T,
    changed: BTreeSet<String>,
    timeouts: Timeouts,
}

impl<T> ResourceData<T> {
    /// Data for a resource that does not exist yet
    pub fn new(state: T) -> Self {
        Self {
            id: String::new(),
            state,
            changed: BTreeSet::new(),
            timeouts: Timeouts::default(),
        }
    }

    /// Data for a resource known by `id`
    pub fn with_id(id: impl Into<String>, state: T) -> Self {
        Self {
            id: id.into(),
            ..Self::new(state)
        }
    }

    /// Record the fields the engine detected as changed
    pub fn with_changes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Attach operation timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Identity key, empty when the resource does not exist
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether an identity key is set
    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    /// Set the identity key
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Clear the identity key, marking the resource as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    pub fn into_state(self) -> T {
        self.state
    }

    /// Whether the engine flagged `field` as changed
    pub fn has_change(&self, field: &str) -> bool {
        self.changed.contains(field)
    }

    /// Fields flagged as changed
    pub fn changes(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Delete budget, falling back to [`DEFAULT_TIMEOUT`]
    pub fn delete_timeout(&self) -> Duration {
        self.timeouts.delete.unwrap_or(DEFAULT_TIMEOUT)
    }
}
