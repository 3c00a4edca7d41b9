//! User pool resource server binding
//!
//! Maps `aws_cognito_user_pool_resource_server` onto the four remote
//! resource-server calls. The identity key is the server's `identifier`;
//! every remote lookup pairs it with `user_pool_id`.

use anyhow::{Result, anyhow, bail};
use cognito::{
    Client, CreateResourceServerInput, DeleteResourceServerInput, DescribeResourceServerInput,
    ResourceServer, UpdateResourceServerInput,
};
use declarative::{
    Attribute, Block, Lifecycle, LogCallback, ResourceData, RetryConfig, RetryError, Schema,
    Timeouts, retry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use super::scopes::{self, ScopeDef};
use super::validate;

/// Resource type name used in addresses and manifests
pub const TYPE_NAME: &str = "aws_cognito_user_pool_resource_server";

/// Time budget for delete when none is configured
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Separator between pool id and identifier in import ids
const IMPORT_SEPARATOR: char = '|';

/// Desired and observed state of one resource server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceServerConfig {
    pub identifier: String,
    pub name: String,
    pub user_pool_id: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub scopes: BTreeSet<ScopeDef>,
    /// Computed: `"{identifier}/{scope_name}"` per scope
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope_identifiers: Vec<String>,
}

impl ResourceServerConfig {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        user_pool_id: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            user_pool_id: user_pool_id.into(),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, name: &str, description: &str) -> Self {
        self.scopes.insert(ScopeDef::new(name, description));
        self
    }

    /// Overwrite observed fields from a remote response
    ///
    /// Scopes are reconciled against the current set rather than replaced.
    fn apply_remote(&mut self, server: &ResourceServer) {
        self.name = server.name.clone();
        self.user_pool_id = server.user_pool_id.clone();
        self.identifier = server.identifier.clone();
        self.scopes = scopes::reconcile(&self.scopes, &server.scopes);
        self.scope_identifiers = scopes::scope_identifiers(&self.identifier, &self.scopes);
    }
}

/// Binding between resource-server state and the remote API
#[derive(Debug, Clone, Default)]
pub struct ResourceServerBinding {
    retry: RetryConfig,
}

impl ResourceServerBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the backoff used while deleting
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

fn describe_input(state: &ResourceServerConfig) -> DescribeResourceServerInput {
    DescribeResourceServerInput {
        identifier: state.identifier.clone(),
        user_pool_id: state.user_pool_id.clone(),
    }
}

impl Lifecycle for ResourceServerBinding {
    type State = ResourceServerConfig;
    type Client = Client;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let scope = Block::new()
            .with_attribute("scope_name", Attribute::required_string())
            .with_attribute("scope_description", Attribute::required_string());

        Schema::v0()
            .with_attribute(
                "identifier",
                Attribute::required_string()
                    .force_new()
                    .with_description("Unique identifier within the user pool"),
            )
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Display name"),
            )
            .with_attribute(
                "user_pool_id",
                Attribute::required_string()
                    .force_new()
                    .with_description("User pool the resource server belongs to"),
            )
            .with_attribute(
                "scopes",
                Attribute::optional_set(scope).with_description("OAuth scopes, keyed by name"),
            )
            .with_attribute(
                "scope_identifiers",
                Attribute::computed_list_of_strings()
                    .with_description("Fully qualified scope names"),
            )
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts::delete(DEFAULT_DELETE_TIMEOUT)
    }

    fn validate(&self, state: &ResourceServerConfig) -> Result<()> {
        let errors = validate::validate(state);
        if errors.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("{}", messages.join("; "))
    }

    fn changed_fields(
        &self,
        prior: &ResourceServerConfig,
        desired: &ResourceServerConfig,
    ) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if prior.identifier != desired.identifier {
            fields.push("identifier");
        }
        if prior.name != desired.name {
            fields.push("name");
        }
        if prior.user_pool_id != desired.user_pool_id {
            fields.push("user_pool_id");
        }
        if prior.scopes != desired.scopes {
            fields.push("scopes");
        }
        fields
    }

    fn create(&self, data: &mut ResourceData<ResourceServerConfig>, client: &Client) -> Result<()> {
        log::debug!("Creating Cognito Resource Server");

        let state = data.state();
        let input = CreateResourceServerInput {
            name: state.name.clone(),
            identifier: state.identifier.clone(),
            user_pool_id: state.user_pool_id.clone(),
            scopes: (!state.scopes.is_empty()).then(|| scopes::expand(&state.scopes)),
        };

        let created = client
            .create_resource_server(&input)
            .map_err(|e| anyhow!("Error creating Cognito Resource Server: {e}"))?;
        data.set_id(created.identifier);

        self.read(data, client)
    }

    fn read(&self, data: &mut ResourceData<ResourceServerConfig>, client: &Client) -> Result<()> {
        log::debug!("Reading Cognito Resource Server: {}", data.id());

        let server = match client.describe_resource_server(&describe_input(data.state())) {
            Ok(server) => server,
            Err(e) if e.is_not_found() => {
                log::warn!(
                    "Cognito Resource Server {} not found, removing from state",
                    data.id()
                );
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        data.state_mut().apply_remote(&server);
        Ok(())
    }

    fn update(&self, data: &mut ResourceData<ResourceServerConfig>, client: &Client) -> Result<()> {
        log::debug!("Updating Cognito Resource Server: {}", data.id());

        let state = data.state();
        let input = UpdateResourceServerInput {
            user_pool_id: state.user_pool_id.clone(),
            identifier: state.identifier.clone(),
            name: state.name.clone(),
            scopes: data
                .has_change("scopes")
                .then(|| scopes::expand(&state.scopes)),
        };

        client
            .update_resource_server(&input)
            .map_err(|e| anyhow!("Error updating Cognito Resource Server: {e}"))?;

        self.read(data, client)
    }

    /// A not-found response counts as already deleted.
    fn delete(&self, data: &mut ResourceData<ResourceServerConfig>, client: &Client) -> Result<()> {
        log::debug!("Deleting Cognito Resource Server: {}", data.id());

        let state = data.state();
        let input = DeleteResourceServerInput {
            identifier: state.identifier.clone(),
            user_pool_id: state.user_pool_id.clone(),
        };

        retry(
            data.delete_timeout(),
            &self.retry,
            Some(&LogCallback),
            || match client.delete_resource_server(&input) {
                Ok(()) => Ok(()),
                Err(e) if e.is_not_found() => {
                    log::debug!("Cognito Resource Server {} already gone", input.identifier);
                    Ok(())
                }
                Err(e) if e.is_retryable() => Err(RetryError::Retryable(e)),
                Err(e) => Err(RetryError::NonRetryable(e)),
            },
        )
        .map_err(|e| anyhow!("Error deleting Cognito Resource Server: {e}"))?;

        data.clear_id();
        Ok(())
    }

    /// Import id format: `{user_pool_id}|{identifier}`
    ///
    /// With no local configuration to reconcile against, every remote scope
    /// is adopted.
    fn import(&self, id: &str, client: &Client) -> Result<ResourceData<ResourceServerConfig>> {
        let (user_pool_id, identifier) = id
            .split_once(IMPORT_SEPARATOR)
            .filter(|(pool, ident)| !pool.is_empty() && !ident.is_empty())
            .ok_or_else(|| {
                anyhow!("Invalid import id '{id}', expected 'user_pool_id{IMPORT_SEPARATOR}identifier'")
            })?;

        let mut state = ResourceServerConfig::new(identifier, "", user_pool_id);
        let server = client
            .describe_resource_server(&describe_input(&state))
            .map_err(|e| anyhow!("Error importing Cognito Resource Server {id}: {e}"))?;

        state.scopes = server.scopes.iter().map(ScopeDef::from).collect();
        state.apply_remote(&server);

        Ok(ResourceData::with_id(server.identifier, state)
            .with_timeouts(self.default_timeouts()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognito::backend::memory::{MemoryBackend, RecordedRequest};
    use cognito::error::{CONCURRENT_MODIFICATION, INVALID_PARAMETER, RESOURCE_NOT_FOUND};
    use cognito::{Operation, ResourceServerScope};
    use std::sync::Arc;

    const POOL: &str = "us-east-1_Pool1";

    fn setup() -> (Arc<MemoryBackend>, Client) {
        let backend = Arc::new(MemoryBackend::new().with_pool(POOL));
        let client = Client::with_backend(Box::new(Arc::clone(&backend)));
        (backend, client)
    }

    fn fast_binding() -> ResourceServerBinding {
        ResourceServerBinding::new().with_retry_config(RetryConfig {
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(2),
        })
    }

    fn created(
        binding: &ResourceServerBinding,
        client: &Client,
        config: ResourceServerConfig,
    ) -> ResourceData<ResourceServerConfig> {
        let mut data = ResourceData::new(config).with_timeouts(binding.default_timeouts());
        binding.create(&mut data, client).unwrap();
        data
    }

    #[test]
    fn test_create_sends_fields_then_reads() {
        let backend = Arc::new(MemoryBackend::new().with_pool("pool-1"));
        let client = Client::with_backend(Box::new(Arc::clone(&backend)));
        let binding = ResourceServerBinding::new();

        let mut data = ResourceData::new(ResourceServerConfig::new("id-1", "srv-1", "pool-1"));
        binding.create(&mut data, &client).unwrap();

        assert_eq!(
            backend.requests(),
            vec![
                RecordedRequest::Create(CreateResourceServerInput {
                    name: "srv-1".into(),
                    identifier: "id-1".into(),
                    user_pool_id: "pool-1".into(),
                    scopes: None,
                }),
                RecordedRequest::Describe(DescribeResourceServerInput {
                    identifier: "id-1".into(),
                    user_pool_id: "pool-1".into(),
                }),
            ]
        );
        assert_eq!(data.id(), "id-1");
    }

    #[test]
    fn test_create_then_read_consistency() {
        let (_backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));

        assert_eq!(data.state().name, "API");
        assert_eq!(data.state().identifier, "api");
        assert_eq!(data.state().user_pool_id, POOL);
        assert!(data.state().scopes.is_empty());
        assert!(data.state().scope_identifiers.is_empty());
    }

    #[test]
    fn test_create_with_scopes_sends_them() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let data = created(
            &binding,
            &client,
            ResourceServerConfig::new("api", "API", POOL).with_scope("foo", "bar"),
        );

        match &backend.requests()[0] {
            RecordedRequest::Create(input) => assert_eq!(
                input.scopes,
                Some(vec![ResourceServerScope::new("foo", "bar")])
            ),
            other => panic!("unexpected request: {other:?}"),
        }
        assert_eq!(data.state().scope_identifiers, vec!["api/foo"]);
    }

    #[test]
    fn test_create_error_is_prefixed() {
        let (backend, client) = setup();
        backend.fail_next(Operation::CreateResourceServer, INVALID_PARAMETER, "bad name");

        let mut data = ResourceData::new(ResourceServerConfig::new("api", "API", POOL));
        let err = ResourceServerBinding::new()
            .create(&mut data, &client)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error creating Cognito Resource Server: InvalidParameterException: bad name"
        );
        assert!(!data.exists());
        assert_eq!(backend.requests().len(), 1);
    }

    #[test]
    fn test_read_is_idempotent() {
        let (_backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(
            &binding,
            &client,
            ResourceServerConfig::new("api", "API", POOL).with_scope("read", "Read"),
        );

        binding.read(&mut data, &client).unwrap();
        let first = data.clone();
        binding.read(&mut data, &client).unwrap();
        assert_eq!(first, data);
    }

    #[test]
    fn test_read_reconciles_scopes() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        backend.insert(ResourceServer {
            user_pool_id: POOL.into(),
            identifier: "api".into(),
            name: "API".into(),
            scopes: vec![
                ResourceServerScope::new("foo", "baz"),
                ResourceServerScope::new("extra", "x"),
            ],
        });

        let mut data = ResourceData::with_id(
            "api",
            ResourceServerConfig::new("api", "API", POOL).with_scope("foo", "bar"),
        );
        binding.read(&mut data, &client).unwrap();

        let expected: BTreeSet<ScopeDef> = [ScopeDef::new("foo", "baz")].into_iter().collect();
        assert_eq!(data.state().scopes, expected);
        assert_eq!(data.state().scope_identifiers, vec!["api/foo"]);
    }

    #[test]
    fn test_read_overwrites_name() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));

        backend.insert(ResourceServer {
            user_pool_id: POOL.into(),
            identifier: "api".into(),
            name: "Renamed elsewhere".into(),
            scopes: vec![],
        });
        binding.read(&mut data, &client).unwrap();
        assert_eq!(data.state().name, "Renamed elsewhere");
    }

    #[test]
    fn test_read_not_found_clears_id() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));

        backend.remove(POOL, "api");
        binding.read(&mut data, &client).unwrap();
        assert!(!data.exists());
    }

    #[test]
    fn test_read_other_error_propagates_unwrapped() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));

        backend.fail_next(Operation::DescribeResourceServer, "NotAuthorizedException", "denied");
        let err = binding.read(&mut data, &client).unwrap_err();
        assert_eq!(err.to_string(), "NotAuthorizedException: denied");
        assert!(data.exists());
    }

    fn last_update(backend: &MemoryBackend) -> UpdateResourceServerInput {
        backend
            .requests()
            .into_iter()
            .find_map(|r| match r {
                RecordedRequest::Update(input) => Some(input),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_update_without_scope_change_omits_scopes() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let data = created(
            &binding,
            &client,
            ResourceServerConfig::new("api", "API", POOL).with_scope("read", "Read"),
        );
        backend.clear_requests();

        let mut desired = data.state().clone();
        desired.name = "API v2".into();
        let mut data = ResourceData::with_id(data.id(), desired).with_changes(["name"]);
        binding.update(&mut data, &client).unwrap();

        let input = last_update(&backend);
        assert_eq!(input.name, "API v2");
        assert_eq!(input.identifier, "api");
        assert_eq!(input.user_pool_id, POOL);
        assert_eq!(input.scopes, None);
        assert_eq!(data.state().name, "API v2");
        assert_eq!(backend.get(POOL, "api").unwrap().scopes.len(), 1);
    }

    #[test]
    fn test_update_with_scope_change_sends_scopes() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let data = created(
            &binding,
            &client,
            ResourceServerConfig::new("api", "API", POOL).with_scope("read", "Read"),
        );
        backend.clear_requests();

        let desired = data.state().clone().with_scope("write", "Write");
        let mut data = ResourceData::with_id(data.id(), desired).with_changes(["scopes"]);
        binding.update(&mut data, &client).unwrap();

        let input = last_update(&backend);
        assert_eq!(input.name, "API");
        assert_eq!(
            input.scopes,
            Some(vec![
                ResourceServerScope::new("read", "Read"),
                ResourceServerScope::new("write", "Write"),
            ])
        );
        assert_eq!(
            data.state().scope_identifiers,
            vec!["api/read", "api/write"]
        );
        // Update is followed by a read
        assert!(matches!(
            backend.requests().last(),
            Some(RecordedRequest::Describe(_))
        ));
    }

    #[test]
    fn test_update_clearing_scopes_sends_empty_list() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let data = created(
            &binding,
            &client,
            ResourceServerConfig::new("api", "API", POOL).with_scope("read", "Read"),
        );

        let mut desired = data.state().clone();
        desired.scopes.clear();
        let mut data = ResourceData::with_id(data.id(), desired).with_changes(["scopes"]);
        binding.update(&mut data, &client).unwrap();

        assert_eq!(last_update(&backend).scopes, Some(vec![]));
        assert!(backend.get(POOL, "api").unwrap().scopes.is_empty());
    }

    #[test]
    fn test_update_error_is_prefixed() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));
        backend.fail_next(Operation::UpdateResourceServer, CONCURRENT_MODIFICATION, "busy");

        let mut data = ResourceData::with_id(data.id(), data.state().clone()).with_changes(["name"]);
        let err = binding.update(&mut data, &client).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Error updating Cognito Resource Server: ConcurrentModificationException")
        );
        // No retry on update
        let updates = backend
            .requests()
            .iter()
            .filter(|r| r.operation() == Operation::UpdateResourceServer)
            .count();
        assert_eq!(updates, 1);
    }

    #[test]
    fn test_delete_clears_id() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));

        binding.delete(&mut data, &client).unwrap();
        assert!(!data.exists());
        assert!(backend.get(POOL, "api").is_none());
    }

    #[test]
    fn test_delete_retries_transient_errors() {
        let (backend, client) = setup();
        let binding = fast_binding();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));
        backend.fail_next(Operation::DeleteResourceServer, CONCURRENT_MODIFICATION, "busy");
        backend.fail_next(Operation::DeleteResourceServer, "TooManyRequestsException", "slow down");

        binding.delete(&mut data, &client).unwrap();
        assert!(!data.exists());
        let deletes = backend
            .requests()
            .iter()
            .filter(|r| r.operation() == Operation::DeleteResourceServer)
            .count();
        assert_eq!(deletes, 3);
    }

    #[test]
    fn test_delete_terminal_error_stops() {
        let (backend, client) = setup();
        let binding = fast_binding();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));
        backend.fail_next(Operation::DeleteResourceServer, INVALID_PARAMETER, "nope");

        let err = binding.delete(&mut data, &client).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error deleting Cognito Resource Server: InvalidParameterException: nope"
        );
        assert!(data.exists());
        assert_eq!(
            backend
                .requests()
                .iter()
                .filter(|r| r.operation() == Operation::DeleteResourceServer)
                .count(),
            1
        );
    }

    #[test]
    fn test_delete_gives_up_at_deadline() {
        let (backend, client) = setup();
        let binding = fast_binding();
        let data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));
        for _ in 0..1000 {
            backend.fail_next(Operation::DeleteResourceServer, CONCURRENT_MODIFICATION, "busy");
        }

        let mut data = ResourceData::with_id(data.id(), data.state().clone())
            .with_timeouts(Timeouts::delete(Duration::from_millis(20)));
        let err = binding.delete(&mut data, &client).unwrap_err();
        assert!(err.to_string().contains(CONCURRENT_MODIFICATION));
        assert!(data.exists());
    }

    #[test]
    fn test_delete_already_gone_succeeds() {
        let (backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));
        backend.remove(POOL, "api");

        binding.delete(&mut data, &client).unwrap();
        assert!(!data.exists());
    }

    #[test]
    fn test_destroy_check_sees_not_found() {
        let (_backend, client) = setup();
        let binding = ResourceServerBinding::new();
        let mut data = created(&binding, &client, ResourceServerConfig::new("api", "API", POOL));
        binding.delete(&mut data, &client).unwrap();

        let err = client
            .describe_resource_server(&describe_input(data.state()))
            .unwrap_err();
        assert_eq!(err.code(), Some(RESOURCE_NOT_FOUND));
    }

    #[test]
    fn test_import_adopts_remote_scopes() {
        let (backend, client) = setup();
        backend.insert(ResourceServer {
            user_pool_id: POOL.into(),
            identifier: "https://api".into(),
            name: "API".into(),
            scopes: vec![
                ResourceServerScope::new("write", "Write"),
                ResourceServerScope::new("read", "Read"),
            ],
        });

        let data = ResourceServerBinding::new()
            .import(&format!("{POOL}|https://api"), &client)
            .unwrap();
        assert_eq!(data.id(), "https://api");
        assert_eq!(data.state().name, "API");
        assert_eq!(data.state().scopes.len(), 2);
        assert_eq!(
            data.state().scope_identifiers,
            vec!["https://api/read", "https://api/write"]
        );
        assert_eq!(data.delete_timeout(), DEFAULT_DELETE_TIMEOUT);
    }

    #[test]
    fn test_import_rejects_bad_ids() {
        let (_backend, client) = setup();
        let binding = ResourceServerBinding::new();
        assert!(binding.import("no-separator", &client).is_err());
        assert!(binding.import("|ident", &client).is_err());
        assert!(binding.import(&format!("{POOL}|missing"), &client).is_err());
    }

    #[test]
    fn test_changed_fields_ignores_computed() {
        let binding = ResourceServerBinding::new();
        let prior = ResourceServerConfig::new("api", "API", POOL).with_scope("read", "Read");
        let mut desired = prior.clone();
        desired.scope_identifiers = vec!["api/read".into()];
        assert!(binding.changed_fields(&prior, &desired).is_empty());

        desired.name = "Other".into();
        desired.user_pool_id = "us-east-1_Other".into();
        assert_eq!(
            binding.changed_fields(&prior, &desired),
            vec!["name", "user_pool_id"]
        );
    }

    #[test]
    fn test_schema_force_new() {
        let schema = ResourceServerBinding::new().schema();
        assert_eq!(schema.force_new_fields(), vec!["identifier", "user_pool_id"]);
        assert_eq!(
            schema.required_fields(),
            vec!["identifier", "name", "user_pool_id"]
        );
        assert!(schema.attribute("scope_identifiers").unwrap().computed);
    }

    #[test]
    fn test_validate_reports_all_errors() {
        let err = ResourceServerBinding::new()
            .validate(&ResourceServerConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "identifier is required; name is required; user_pool_id is required"
        );
    }
}
