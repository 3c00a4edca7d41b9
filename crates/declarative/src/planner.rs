//! Execution planner - builds change plans from declared and recorded state

use crate::diff::{Action, DiffSummary, compute_action};
use crate::resource::Lifecycle;
use crate::types::Timeouts;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Address of a resource instance: `type.alias`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub resource_type: String,
    pub alias: String,
}

impl Address {
    pub fn new(resource_type: &str, alias: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            alias: alias.to_string(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.alias)
    }
}

/// A resource as declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Declared<S> {
    pub state: S,
    pub timeouts: Timeouts,
}

/// A resource as recorded after the last apply
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded<S> {
    pub id: String,
    pub state: S,
    pub timeouts: Timeouts,
}

/// One planned change
#[derive(Debug, Clone)]
pub struct PlannedChange<S> {
    pub address: Address,
    pub action: Action,
    /// Identity key of the existing instance
    pub id: Option<String>,
    pub prior: Option<S>,
    pub desired: Option<S>,
    pub timeouts: Timeouts,
}

/// An ordered list of planned changes
#[derive(Debug, Clone)]
pub struct ExecutionPlan<S> {
    pub changes: Vec<PlannedChange<S>>,
}

impl<S: Clone + PartialEq + fmt::Debug> ExecutionPlan<S> {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Plan converging `recorded` to `declared`
    ///
    /// Every declared state is validated first. Deletions are ordered
    /// before creations so that an alias moving to a new identifier frees
    /// the old one first.
    pub fn build<L>(
        resource: &L,
        declared: &BTreeMap<String, Declared<S>>,
        recorded: &BTreeMap<String, Recorded<S>>,
    ) -> Result<Self>
    where
        L: Lifecycle<State = S>,
    {
        for (alias, decl) in declared {
            resource
                .validate(&decl.state)
                .with_context(|| format!("Invalid {}.{}", resource.type_name(), alias))?;
        }

        let defaults = resource.default_timeouts();
        let aliases: BTreeSet<&String> = declared.keys().chain(recorded.keys()).collect();

        let mut deletes = Vec::new();
        let mut others = Vec::new();
        for alias in aliases {
            let decl = declared.get(alias);
            let rec = recorded.get(alias);
            let action = compute_action(
                resource,
                rec.map(|r| &r.state),
                decl.map(|d| &d.state),
            );
            let timeouts = decl
                .map(|d| d.timeouts)
                .or(rec.map(|r| r.timeouts))
                .unwrap_or_default()
                .or(defaults);

            let change = PlannedChange {
                address: Address::new(resource.type_name(), alias),
                action,
                id: rec.map(|r| r.id.clone()),
                prior: rec.map(|r| r.state.clone()),
                desired: decl.map(|d| d.state.clone()),
                timeouts,
            };
            if matches!(change.action, Action::Delete) {
                deletes.push(change);
            } else {
                others.push(change);
            }
        }

        deletes.extend(others);
        Ok(Self { changes: deletes })
    }

    /// Plan deleting every recorded resource
    pub fn destroy<L>(resource: &L, recorded: &BTreeMap<String, Recorded<S>>) -> Self
    where
        L: Lifecycle<State = S>,
    {
        let defaults = resource.default_timeouts();
        let changes = recorded
            .iter()
            .map(|(alias, rec)| PlannedChange {
                address: Address::new(resource.type_name(), alias),
                action: Action::Delete,
                id: Some(rec.id.clone()),
                prior: Some(rec.state.clone()),
                desired: None,
                timeouts: rec.timeouts.or(defaults),
            })
            .collect();
        Self { changes }
    }

    /// Filter plan to only include changes matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&PlannedChange<S>) -> bool,
    {
        Self {
            changes: self.changes.into_iter().filter(|c| predicate(c)).collect(),
        }
    }

    /// Filter plan to only include changes matching a target pattern
    ///
    /// Target format: "type", "type.alias" or "alias"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, alias) = parse_target(t);
                self.filter(|c| matches_filter(&c.address, resource_type.as_deref(), alias.as_deref()))
            }
        }
    }

    /// Summary of the actions in this plan
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_actions(self.changes.iter().map(|c| &c.action))
    }

    /// Whether any change would modify remote state
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.action.is_change())
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<S: Clone + PartialEq + fmt::Debug> Default for ExecutionPlan<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a target string like "type.alias" into (type, alias)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.len() {
        1 => (None, Some(parts[0].to_string())),
        2 => (Some(parts[0].to_string()), Some(parts[1].to_string())),
        _ => (None, Some(target.to_string())),
    }
}

/// Check if an address matches the filter criteria
///
/// A lone word matches either the type or the alias.
fn matches_filter(address: &Address, resource_type: Option<&str>, alias: Option<&str>) -> bool {
    match (resource_type, alias) {
        (Some(rt), Some(a)) => address.resource_type == rt && address.alias == a,
        (None, Some(word)) => address.resource_type == word || address.alias == word,
        (Some(rt), None) => address.resource_type == rt,
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::tests::{Pair, PairResource, pair};
    use std::time::Duration;

    fn declared(entries: &[(&str, Pair)]) -> BTreeMap<String, Declared<Pair>> {
        entries
            .iter()
            .map(|(alias, p)| {
                (
                    (*alias).to_string(),
                    Declared {
                        state: p.clone(),
                        timeouts: Timeouts::default(),
                    },
                )
            })
            .collect()
    }

    fn recorded(entries: &[(&str, Pair)]) -> BTreeMap<String, Recorded<Pair>> {
        entries
            .iter()
            .map(|(alias, p)| {
                (
                    (*alias).to_string(),
                    Recorded {
                        id: p.key.clone(),
                        state: p.clone(),
                        timeouts: Timeouts::delete(Duration::from_secs(60)),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("pair"), (None, Some("pair".to_string())));
        assert_eq!(
            parse_target("pair.main"),
            (Some("pair".to_string()), Some("main".to_string()))
        );
        assert_eq!(parse_target("a.b.c"), (None, Some("a.b.c".to_string())));
    }

    #[test]
    fn test_build_orders_deletes_first() {
        let plan = ExecutionPlan::build(
            &PairResource,
            &declared(&[("a", pair("a", "1")), ("c", pair("c", "1"))]),
            &recorded(&[("b", pair("b", "1")), ("c", pair("c", "1"))]),
        )
        .unwrap();

        let actions: Vec<_> = plan
            .changes
            .iter()
            .map(|c| (c.address.alias.as_str(), c.action.clone()))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("b", Action::Delete),
                ("a", Action::Create),
                ("c", Action::NoOp),
            ]
        );
        assert_eq!(plan.summary().total(), 2);
        assert!(plan.has_changes());
    }

    #[test]
    fn test_destroy_plans_every_recorded() {
        let plan = ExecutionPlan::destroy(
            &PairResource,
            &recorded(&[("a", pair("a", "1")), ("b", pair("b", "2"))]),
        );
        assert_eq!(plan.summary().removals, 2);
        assert_eq!(plan.changes[0].id.as_deref(), Some("a"));
        assert_eq!(
            plan.changes[0].timeouts.delete,
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_filter_by_target() {
        let plan = ExecutionPlan::build(
            &PairResource,
            &declared(&[("a", pair("a", "1")), ("b", pair("b", "1"))]),
            &BTreeMap::new(),
        )
        .unwrap();

        let only_b = plan.clone().filter_by_target(Some("pair.b"));
        assert_eq!(only_b.changes.len(), 1);
        assert_eq!(only_b.changes[0].address.to_string(), "pair.b");

        let by_type = plan.clone().filter_by_target(Some("pair"));
        assert_eq!(by_type.changes.len(), 2);

        let by_alias = plan.clone().filter_by_target(Some("a"));
        assert_eq!(by_alias.changes.len(), 1);

        let none = plan.filter_by_target(Some("other.a"));
        assert!(none.is_empty());
    }
}
