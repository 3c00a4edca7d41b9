//! Field validation for resource servers
//!
//! Limits mirror what the service enforces, so bad input fails at plan
//! time instead of halfway through an apply.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

use super::resource_server::ResourceServerConfig;

/// Most scopes a single resource server may define
pub const MAX_SCOPES: usize = 100;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x21\x23-\x5B\x5D-\x7E]+$").expect("identifier pattern"));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s+=,.@-]+$").expect("name pattern"));
static USER_POOL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+_[0-9a-zA-Z]+$").expect("user pool id pattern"));
static SCOPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x21\x23-\x2E\x30-\x5B\x5D-\x7E]+$").expect("scope name pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be at most {max} characters (got {len})")]
    TooLong {
        field: String,
        max: usize,
        len: usize,
    },

    #[error("{field} contains invalid characters: '{value}'")]
    Pattern { field: String, value: String },

    #[error("at most 100 scopes are allowed (got {0})")]
    TooManyScopes(usize),

    #[error("scope '{0}' is declared more than once")]
    DuplicateScope(String),
}

fn check(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: &str,
    max: usize,
    pattern: Option<&Regex>,
) {
    let len = value.chars().count();
    if len > max {
        errors.push(ValidationError::TooLong {
            field: field.to_string(),
            max,
            len,
        });
    }
    if let Some(re) = pattern
        && !re.is_match(value)
    {
        errors.push(ValidationError::Pattern {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

/// Validate a desired resource server, returning every problem found
pub fn validate(config: &ResourceServerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value, max, pattern) in [
        ("identifier", &config.identifier, 256, &*IDENTIFIER),
        ("name", &config.name, 256, &*NAME),
        ("user_pool_id", &config.user_pool_id, 55, &*USER_POOL_ID),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::Missing { field });
        } else {
            check(&mut errors, field, value, max, Some(pattern));
        }
    }

    if config.scopes.len() > MAX_SCOPES {
        errors.push(ValidationError::TooManyScopes(config.scopes.len()));
    }

    let mut seen = BTreeSet::new();
    for scope in &config.scopes {
        if scope.scope_name.is_empty() {
            errors.push(ValidationError::Missing {
                field: "scope_name",
            });
            continue;
        }
        if !seen.insert(scope.scope_name.as_str()) {
            errors.push(ValidationError::DuplicateScope(scope.scope_name.clone()));
        }
        let field = format!("scopes[{}].scope_name", scope.scope_name);
        check(&mut errors, &field, &scope.scope_name, 256, Some(&*SCOPE_NAME));

        if scope.scope_description.is_empty() {
            errors.push(ValidationError::Missing {
                field: "scope_description",
            });
        } else {
            let field = format!("scopes[{}].scope_description", scope.scope_name);
            check(&mut errors, &field, &scope.scope_description, 256, None);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::scopes::ScopeDef;

    fn valid() -> ResourceServerConfig {
        ResourceServerConfig::new("https://api.example.com", "api", "us-east-1_AbC123")
    }

    #[test]
    fn test_valid_config() {
        let mut config = valid();
        config.scopes.insert(ScopeDef::new("read", "Read access"));
        assert!(validate(&config).is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate(&ResourceServerConfig::default());
        assert_eq!(
            errors,
            vec![
                ValidationError::Missing { field: "identifier" },
                ValidationError::Missing { field: "name" },
                ValidationError::Missing {
                    field: "user_pool_id"
                },
            ]
        );
    }

    #[test]
    fn test_bad_user_pool_id() {
        let mut config = valid();
        config.user_pool_id = "not a pool".into();
        let errors = validate(&config);
        assert!(matches!(&errors[..], [ValidationError::Pattern { field, .. }] if field == "user_pool_id"));
    }

    #[test]
    fn test_scope_name_rejects_slash() {
        let mut config = valid();
        config.scopes.insert(ScopeDef::new("read/all", "Read"));
        assert_eq!(validate(&config).len(), 1);
    }

    #[test]
    fn test_duplicate_scope_names() {
        let mut config = valid();
        config.scopes.insert(ScopeDef::new("read", "One"));
        config.scopes.insert(ScopeDef::new("read", "Two"));
        assert_eq!(
            validate(&config),
            vec![ValidationError::DuplicateScope("read".into())]
        );
    }

    #[test]
    fn test_too_many_scopes() {
        let mut config = valid();
        for i in 0..=MAX_SCOPES {
            config.scopes.insert(ScopeDef::new(format!("s{i}"), "d"));
        }
        assert!(validate(&config).contains(&ValidationError::TooManyScopes(MAX_SCOPES + 1)));
    }

    #[test]
    fn test_name_too_long() {
        let mut config = valid();
        config.name = "a".repeat(257);
        assert!(matches!(
            &validate(&config)[..],
            [ValidationError::TooLong { max: 256, len: 257, .. }]
        ));
    }
}
