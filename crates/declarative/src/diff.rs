//! Diff computation between prior and desired state

use crate::resource::Lifecycle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the engine will do to one resource instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Prior and desired state agree
    NoOp,
    /// Resource is declared but does not exist
    Create,
    /// Mutable fields changed
    Update { fields: Vec<String> },
    /// A force-new field changed; delete then create
    Replace { fields: Vec<String> },
    /// Resource exists but is no longer declared
    Delete,
}

impl Action {
    /// Plan symbol, terraform style
    pub fn symbol(&self) -> &'static str {
        match self {
            Action::NoOp => " ",
            Action::Create => "+",
            Action::Update { .. } => "~",
            Action::Replace { .. } => "-/+",
            Action::Delete => "-",
        }
    }

    /// Whether this action changes anything
    pub fn is_change(&self) -> bool {
        !matches!(self, Action::NoOp)
    }

    /// Changed fields for update/replace
    pub fn fields(&self) -> &[String] {
        match self {
            Action::Update { fields } | Action::Replace { fields } => fields,
            _ => &[],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOp => write!(f, "no changes"),
            Action::Create => write!(f, "create"),
            Action::Update { fields } => write!(f, "update in-place ({})", fields.join(", ")),
            Action::Replace { fields } => write!(f, "replace ({})", fields.join(", ")),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Compute the action for one instance
///
/// `prior` is the last observed state (None when the resource does not
/// exist), `desired` the declared state (None when no longer declared).
pub fn compute_action<L: Lifecycle>(
    resource: &L,
    prior: Option<&L::State>,
    desired: Option<&L::State>,
) -> Action {
    match (prior, desired) {
        (None, None) => Action::NoOp,
        (None, Some(_)) => Action::Create,
        (Some(_), None) => Action::Delete,
        (Some(prior), Some(desired)) => {
            let changed = resource.changed_fields(prior, desired);
            if changed.is_empty() {
                return Action::NoOp;
            }
            let schema = resource.schema();
            let fields: Vec<String> = changed.iter().map(|f| (*f).to_string()).collect();
            if changed.iter().any(|f| schema.forces_new(f)) {
                Action::Replace { fields }
            } else {
                Action::Update { fields }
            }
        }
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub updates: usize,
    pub replacements: usize,
    pub removals: usize,
}

impl DiffSummary {
    /// Create a summary from a list of actions
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action {
                Action::NoOp => {}
                Action::Create => summary.additions += 1,
                Action::Update { .. } => summary.updates += 1,
                Action::Replace { .. } => summary.replacements += 1,
                Action::Delete => summary.removals += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.updates + self.replacements + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to replace, {} to destroy",
            self.additions, self.updates, self.replacements, self.removals
        )
    }
}
