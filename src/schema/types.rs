//! Attribute types and definitions for schema metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::Value;

/// Attribute types supported by the record store.
///
/// Every stored value is one of these four; the codec turns them into the
/// wire-safe string representation kept in the record hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    /// `true` / `false`.
    Boolean,
    /// Finite numbers (integer or floating point).
    Number,
    /// Plain text.
    String,
    /// Arbitrary structured values (objects, arrays, scalars).
    Json,
}

impl AttrType {
    /// Check if a value matches this attribute type.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (AttrType::Boolean, Value::Bool(_))
                | (AttrType::Number, Value::Number(_))
                | (AttrType::String, Value::Str(_))
                | (AttrType::Json, Value::Json(_))
        )
    }

    /// Get the declaration name for this type.
    pub fn name(&self) -> &'static str {
        match self {
            AttrType::Boolean => "boolean",
            AttrType::Number => "number",
            AttrType::String => "string",
            AttrType::Json => "json",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Relationship marker on an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    /// Single reference to another model; the attribute stores the
    /// referenced record's primary key and is always indexed.
    Model(String),
    /// Plural reference. Collection attributes are resolved by the upstream
    /// ORM through the other side's index; they are never persisted on the
    /// owning record and never indexed.
    Collection(String),
}

/// Full attribute definition: name, type, flags, and storage mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name as the caller sees it.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub attr_type: AttrType,
    /// Whether a value must always be present.
    #[serde(default)]
    pub required: bool,
    /// Whether a secondary index is maintained for this attribute.
    #[serde(default)]
    pub indexed: bool,
    /// Storage column name; defaults to the attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Relationship marker, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<Association>,
}

impl AttributeDef {
    /// Create a new attribute definition.
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            indexed: false,
            column_name: None,
            association: None,
        }
    }

    /// Mark the attribute as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the attribute as indexed.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Set an explicit storage column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    /// Mark the attribute as a single reference to another model.
    pub fn references(mut self, model: impl Into<String>) -> Self {
        self.association = Some(Association::Model(model.into()));
        self
    }

    /// Mark the attribute as a plural reference to another model.
    pub fn collection_of(mut self, model: impl Into<String>) -> Self {
        self.association = Some(Association::Collection(model.into()));
        self
    }

    /// The storage column this attribute maps to.
    pub fn column(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether an index set is maintained for this attribute.
    ///
    /// Single-reference associations are indexed regardless of the flag;
    /// relationship lookups resolve through the index.
    pub fn is_indexed(&self) -> bool {
        if self.is_collection() {
            return false;
        }
        self.indexed || matches!(self.association, Some(Association::Model(_)))
    }

    /// Whether this is a plural association (never persisted, never indexed).
    pub fn is_collection(&self) -> bool {
        matches!(self.association, Some(Association::Collection(_)))
    }
}

impl fmt::Display for AttributeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.attr_type)?;
        if self.required {
            write!(f, " required")?;
        }
        if self.is_indexed() {
            write!(f, " indexed")?;
        }
        Ok(())
    }
}
