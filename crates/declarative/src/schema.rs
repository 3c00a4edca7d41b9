//! Schema declarations for resource types
//!
//! A schema tells the engine which fields a resource has, which are
//! required, which the remote side computes, and which force a
//! replacement when they change.

use serde::{Deserialize, Serialize};

/// The value type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A single string
    String,
    /// An ordered list of strings
    ListOfStrings,
    /// An unordered set of nested blocks
    Set(Block),
}

/// A nested block (e.g. one scope entry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub attributes: Vec<(String, Attribute)>,
}

impl Block {
    /// Create an empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.push((name.to_string(), attribute));
        self
    }
}

/// A single attribute declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub ty: AttributeType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    /// Changing this attribute replaces the resource
    #[serde(default)]
    pub force_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    fn new(ty: AttributeType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            description: None,
        }
    }

    /// A required string
    pub fn required_string() -> Self {
        Self {
            required: true,
            ..Self::new(AttributeType::String)
        }
    }

    /// A list of strings computed by the remote side
    pub fn computed_list_of_strings() -> Self {
        Self {
            computed: true,
            ..Self::new(AttributeType::ListOfStrings)
        }
    }

    /// An optional set of nested blocks
    pub fn optional_set(block: Block) -> Self {
        Self {
            optional: true,
            ..Self::new(AttributeType::Set(block))
        }
    }

    /// Mark the attribute as forcing replacement on change
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Schema of a resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub version: u32,
    pub attributes: Vec<(String, Attribute)>,
}

impl Schema {
    /// Version 0 schema with no attributes
    pub fn v0() -> Self {
        Self::default()
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.push((name.to_string(), attribute));
        self
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// Names of attributes that force replacement
    pub fn force_new_fields(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.force_new)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Names of required attributes
    pub fn required_fields(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.required)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Whether changing `field` replaces the resource
    pub fn forces_new(&self, field: &str) -> bool {
        self.attribute(field).is_some_and(|a| a.force_new)
    }
}
