//! Scope marshaling between local state and the API
//!
//! The API returns scopes in no particular order and the local state keeps
//! them as a set, so reads go through [`reconcile`] instead of overwriting.

use cognito::ResourceServerScope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A scope as declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeDef {
    pub scope_name: String,
    pub scope_description: String,
}

impl ScopeDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            scope_name: name.into(),
            scope_description: description.into(),
        }
    }
}

impl From<&ScopeDef> for ResourceServerScope {
    fn from(scope: &ScopeDef) -> Self {
        ResourceServerScope::new(scope.scope_name.clone(), scope.scope_description.clone())
    }
}

impl From<&ResourceServerScope> for ScopeDef {
    fn from(scope: &ResourceServerScope) -> Self {
        ScopeDef::new(scope.scope_name.clone(), scope.scope_description.clone())
    }
}

/// Flatten a scope set into request entries
pub fn expand(scopes: &BTreeSet<ScopeDef>) -> Vec<ResourceServerScope> {
    scopes.iter().map(ResourceServerScope::from).collect()
}

/// Merge remote scopes into the configured set
///
/// Membership follows `configured`; descriptions follow `remote` for
/// entries with a matching name. Remote-only scopes are dropped.
pub fn reconcile(
    configured: &BTreeSet<ScopeDef>,
    remote: &[ResourceServerScope],
) -> BTreeSet<ScopeDef> {
    configured
        .iter()
        .map(|local| {
            remote
                .iter()
                .find(|r| r.scope_name == local.scope_name)
                .map_or_else(|| local.clone(), ScopeDef::from)
        })
        .collect()
}

/// `"{identifier}/{scope_name}"` for every scope, sorted
pub fn scope_identifiers(identifier: &str, scopes: &BTreeSet<ScopeDef>) -> Vec<String> {
    let mut ids: Vec<String> = scopes
        .iter()
        .map(|s| format!("{}/{}", identifier, s.scope_name))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[(&str, &str)]) -> BTreeSet<ScopeDef> {
        items.iter().map(|(n, d)| ScopeDef::new(*n, *d)).collect()
    }

    #[test]
    fn test_reconcile_remote_description_wins_and_extras_dropped() {
        let configured = set(&[("foo", "bar")]);
        let remote = vec![
            ResourceServerScope::new("foo", "baz"),
            ResourceServerScope::new("extra", "x"),
        ];
        assert_eq!(reconcile(&configured, &remote), set(&[("foo", "baz")]));
    }

    #[test]
    fn test_reconcile_keeps_configured_missing_remotely() {
        let configured = set(&[("read", "Read"), ("write", "Write")]);
        let remote = vec![ResourceServerScope::new("read", "Read things")];
        assert_eq!(
            reconcile(&configured, &remote),
            set(&[("read", "Read things"), ("write", "Write")])
        );
    }

    #[test]
    fn test_reconcile_ignores_remote_order() {
        let configured = set(&[("a", "1"), ("b", "2")]);
        let forward = vec![
            ResourceServerScope::new("a", "1"),
            ResourceServerScope::new("b", "2"),
        ];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(
            reconcile(&configured, &forward),
            reconcile(&configured, &backward)
        );
    }

    #[test]
    fn test_reconcile_empty_configured() {
        let remote = vec![ResourceServerScope::new("a", "1")];
        assert!(reconcile(&BTreeSet::new(), &remote).is_empty());
    }

    #[test]
    fn test_expand() {
        let scopes = expand(&set(&[("read", "Read")]));
        assert_eq!(scopes, vec![ResourceServerScope::new("read", "Read")]);
    }

    #[test]
    fn test_scope_identifiers() {
        let ids = scope_identifiers("https://api", &set(&[("write", "W"), ("read", "R")]));
        assert_eq!(ids, vec!["https://api/read", "https://api/write"]);
    }
}
