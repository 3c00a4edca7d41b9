use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use declarative::{Recorded, StateChange, Timeouts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::resource::{ResourceServerConfig, TYPE_NAME};

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Recorded state of every managed resource server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateFile {
    pub version: u32,

    /// Last time the state was written
    pub last_updated: DateTime<Utc>,

    /// Entries keyed by alias
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceEntry>,
}

/// One recorded resource
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceEntry {
    #[serde(rename = "type", default = "default_type")]
    pub resource_type: String,

    /// Identity key returned by the API
    pub id: String,

    #[serde(default)]
    pub timeouts: Timeouts,

    /// Last observed attributes
    pub attributes: ResourceServerConfig,
}

fn default_type() -> String {
    TYPE_NAME.to_string()
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// Load state from disk, or return default if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using empty state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: StateFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save(path)
    }

    /// Entries as the planner expects them
    pub fn recorded(&self) -> BTreeMap<String, Recorded<ResourceServerConfig>> {
        self.resources
            .iter()
            .filter(|(_, entry)| entry.resource_type == TYPE_NAME)
            .map(|(alias, entry)| {
                (
                    alias.clone(),
                    Recorded {
                        id: entry.id.clone(),
                        state: entry.attributes.clone(),
                        timeouts: entry.timeouts,
                    },
                )
            })
            .collect()
    }

    /// Record or forget one alias
    pub fn set(&mut self, alias: &str, recorded: Option<Recorded<ResourceServerConfig>>) {
        match recorded {
            Some(rec) => {
                self.resources.insert(
                    alias.to_string(),
                    ResourceEntry {
                        resource_type: default_type(),
                        id: rec.id,
                        timeouts: rec.timeouts,
                        attributes: rec.state,
                    },
                );
            }
            None => {
                self.resources.remove(alias);
            }
        }
    }

    /// Merge the state changes produced by an apply
    pub fn apply_changes(&mut self, changes: BTreeMap<String, StateChange<ResourceServerConfig>>) {
        for (alias, change) in changes {
            match change {
                StateChange::Set(rec) => self.set(&alias, Some(rec)),
                StateChange::Removed => self.set(&alias, None),
            }
        }
    }
}
