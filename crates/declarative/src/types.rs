//! Core types for declarative resource management

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delete budget when neither the resource nor the manifest sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Time budgets for lifecycle operations.
///
/// Only delete retries until a deadline, so it is the only budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub delete: Option<Duration>,
}

impl Timeouts {
    /// Timeouts with a delete budget set
    pub fn delete(timeout: Duration) -> Self {
        Self {
            delete: Some(timeout),
        }
    }

    /// Fill unset budgets from `defaults`
    pub fn or(self, defaults: Timeouts) -> Self {
        Self {
            delete: self.delete.or(defaults.delete),
        }
    }
}

/// Parse a duration like `"30s"`, `"5m"`, `"1h"` or `"1h30m"`.
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Empty duration");
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            bail!("Invalid duration '{input}': unit '{c}' without a number");
        }
        let value: u64 = digits.parse()?;
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => bail!("Invalid duration '{input}': unknown unit '{c}'"),
        };
        total = match value.checked_mul(unit).and_then(|v| total.checked_add(v)) {
            Some(total) => total,
            None => bail!("Invalid duration '{input}': too large"),
        };
        digits.clear();
    }
    if !digits.is_empty() {
        bail!("Invalid duration '{input}': trailing number without a unit");
    }
    Ok(Duration::from_secs(total))
}

/// Result of applying a planned change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was updated in place
    Updated,
    /// Resource was deleted and created again
    Replaced,
    /// Resource was deleted
    Deleted,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Updated | Self::Replaced | Self::Deleted
        )
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Updated => self.updated += 1,
            ApplyResult::Replaced => self.replaced += 1,
            ApplyResult::Deleted => self.deleted += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Stop at the first failed change
    pub fail_fast: bool,
}
