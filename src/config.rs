use anyhow::{Context, Result, bail};
use cognito::Client;
use cognito::backend::http::{HttpBackend, StaticHeader};
use cognito::backend::memory::MemoryBackend;
use declarative::{Declared, Recorded, Timeouts, parse_duration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::resource::{ResourceServerConfig, ScopeDef};

/// Default manifest file name
pub const DEFAULT_MANIFEST: &str = "idpform.toml";

pub const ENDPOINT_ENV: &str = "IDPFORM_ENDPOINT";
pub const REGION_ENV: &str = "AWS_REGION";
pub const AUTH_HEADER_ENV: &str = "IDPFORM_AUTH_HEADER";

// ============================================================================
// Manifest
// ============================================================================

/// Top-level manifest: provider settings plus declared resource servers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Resource servers keyed by alias
    #[serde(default)]
    pub resource: BTreeMap<String, ResourceServerBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub region: Option<String>,

    /// Full service URL, overrides the regional endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Extra header sent with every request, as `Name: value`
    #[serde(default)]
    pub auth_header: Option<String>,
}

/// One `[resource.<alias>]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceServerBlock {
    pub identifier: String,
    pub name: String,
    pub user_pool_id: String,
    #[serde(default)]
    pub scopes: Vec<ScopeDef>,
    #[serde(default)]
    pub timeouts: TimeoutsBlock,
}

/// Delete budget as a duration string (`"30s"`, `"5m"`, `"1h"`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsBlock {
    #[serde(default)]
    pub delete: Option<String>,
}

impl TimeoutsBlock {
    fn parse(&self) -> Result<Timeouts> {
        let delete = self
            .delete
            .as_deref()
            .map(parse_duration)
            .transpose()
            .context("Invalid delete timeout")?;
        Ok(Timeouts { delete })
    }
}

impl ResourceServerBlock {
    fn to_declared(&self) -> Result<Declared<ResourceServerConfig>> {
        let mut state =
            ResourceServerConfig::new(&self.identifier, &self.name, &self.user_pool_id);
        state.scopes = self.scopes.iter().cloned().collect();
        Ok(Declared {
            state,
            timeouts: self.timeouts.parse()?,
        })
    }
}

impl Manifest {
    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let manifest: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid manifest format: {}", path.display()))?;
        log::debug!(
            "Loaded {} resource(s) from {}",
            manifest.resource.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Desired state per alias
    pub fn declared(&self) -> Result<BTreeMap<String, Declared<ResourceServerConfig>>> {
        self.resource
            .iter()
            .map(|(alias, block)| {
                let declared = block
                    .to_declared()
                    .with_context(|| format!("In [resource.{alias}]"))?;
                Ok((alias.clone(), declared))
            })
            .collect()
    }
}

/// Path of the state file that belongs to a manifest
pub fn default_state_path(manifest: &Path) -> PathBuf {
    let stem = manifest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "idpform".to_string());
    manifest.with_file_name(format!("{stem}.state.toml"))
}

// ============================================================================
// Provider
// ============================================================================

impl ProviderConfig {
    /// Apply environment overrides on top of the manifest values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(region) = lookup(REGION_ENV) {
            self.region = Some(region);
        }
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
        if let Some(header) = lookup(AUTH_HEADER_ENV) {
            self.auth_header = Some(header);
        }
        self
    }

    /// Build a client for the configured endpoint
    pub fn client(&self) -> Result<Client> {
        let backend = match (&self.endpoint, &self.region) {
            (Some(endpoint), _) => HttpBackend::with_endpoint(endpoint.clone()),
            (None, Some(region)) => HttpBackend::for_region(region),
            (None, None) => bail!(
                "No region configured: set [provider].region, {REGION_ENV} or {ENDPOINT_ENV}"
            ),
        };
        log::debug!("Using endpoint {}", backend.endpoint());

        let backend = match &self.auth_header {
            Some(line) => backend.with_auth(Box::new(
                StaticHeader::parse(line).context("Invalid auth header")?,
            )),
            None => backend,
        };
        Ok(Client::with_backend(Box::new(backend)))
    }
}

/// Build an in-memory client seeded from manifest pools and recorded state
///
/// Lets `plan` and `apply` run without network access.
pub fn offline_client(
    manifest: &Manifest,
    recorded: &BTreeMap<String, Recorded<ResourceServerConfig>>,
) -> Client {
    let backend = manifest
        .resource
        .values()
        .fold(MemoryBackend::new(), |backend, block| {
            backend.with_pool(block.user_pool_id.clone())
        });
    for rec in recorded.values() {
        backend.insert(cognito::ResourceServer {
            user_pool_id: rec.state.user_pool_id.clone(),
            identifier: rec.id.clone(),
            name: rec.state.name.clone(),
            scopes: crate::resource::scopes::expand(&rec.state.scopes),
        });
    }
    Client::with_backend(Box::new(backend))
}
