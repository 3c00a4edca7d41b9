//! Request and response shapes for resource-server operations.
//!
//! Field names follow the service's PascalCase wire format.

use serde::{Deserialize, Serialize};

/// A scope defined by a resource server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceServerScope {
    /// Scope name, e.g. `read`.
    pub scope_name: String,
    /// Free-form description of what the scope grants.
    pub scope_description: String,
}

impl ResourceServerScope {
    /// Create a scope from a name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            scope_name: name.into(),
            scope_description: description.into(),
        }
    }
}

/// A resource server as the service describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceServer {
    /// The user pool the resource server belongs to.
    pub user_pool_id: String,
    /// Identifier, unique within the pool.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Scopes in no guaranteed order.
    #[serde(default)]
    pub scopes: Vec<ResourceServerScope>,
}

/// Input for `CreateResourceServer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateResourceServerInput {
    /// Owning user pool.
    pub user_pool_id: String,
    /// Identifier, unique within the pool.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Omitted from the request when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<ResourceServerScope>>,
}

/// Input for `DescribeResourceServer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeResourceServerInput {
    /// Owning user pool.
    pub user_pool_id: String,
    /// Identifier of the resource server.
    pub identifier: String,
}

/// Input for `UpdateResourceServer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateResourceServerInput {
    /// Owning user pool.
    pub user_pool_id: String,
    /// Identifier, unique within the pool.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Omitted from the request when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<ResourceServerScope>>,
}

/// Input for `DeleteResourceServer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteResourceServerInput {
    /// Owning user pool.
    pub user_pool_id: String,
    /// Identifier of the resource server.
    pub identifier: String,
}

/// Output of create, describe and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceServerOutput {
    /// The stored resource server.
    pub resource_server: ResourceServer,
}

/// Operations exposed by the service, used for the `X-Amz-Target` header
/// and for request recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operation {
    CreateResourceServer,
    DescribeResourceServer,
    UpdateResourceServer,
    DeleteResourceServer,
}

impl Operation {
    /// Wire name of the operation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateResourceServer => "CreateResourceServer",
            Operation::DescribeResourceServer => "DescribeResourceServer",
            Operation::UpdateResourceServer => "UpdateResourceServer",
            Operation::DeleteResourceServer => "DeleteResourceServer",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_omits_empty_scopes() {
        let input = CreateResourceServerInput {
            user_pool_id: "us-east-1_abc".into(),
            identifier: "https://api.example.com".into(),
            name: "api".into(),
            scopes: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["UserPoolId"], "us-east-1_abc");
        assert_eq!(json["Identifier"], "https://api.example.com");
        assert_eq!(json["Name"], "api");
        assert!(json.get("Scopes").is_none());
    }

    #[test]
    fn test_output_parses_without_scopes() {
        let body = r#"{"ResourceServer":{"UserPoolId":"p_1","Identifier":"id","Name":"n"}}"#;
        let out: ResourceServerOutput = serde_json::from_str(body).unwrap();
        assert!(out.resource_server.scopes.is_empty());
        assert_eq!(out.resource_server.name, "n");
    }

    #[test]
    fn test_scope_wire_names() {
        let json = serde_json::to_string(&ResourceServerScope::new("read", "Read access")).unwrap();
        assert_eq!(
            json,
            r#"{"ScopeName":"read","ScopeDescription":"Read access"}"#
        );
    }
}
