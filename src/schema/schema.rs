//! Table schema definitions and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Association, AttrType, AttributeDef};
use crate::store::{InvalidNameError, TableName};

/// Per-table schema: the metadata driving codec and index behavior.
///
/// Constructed once from ORM-supplied `(attributeDefinitions, primaryKeyName,
/// tableName)` metadata and validated at build time; the record store derives
/// its indexed-column list from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table identifier, embedded in every storage key.
    pub table: TableName,
    /// Name of the primary-key attribute (always of type `string`).
    pub primary_key: String,
    /// Attribute definitions, in declaration order.
    pub attributes: Vec<AttributeDef>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl TableSchema {
    /// Create a schema, validating the table invariants.
    pub fn new(
        table: TableName,
        primary_key: impl Into<String>,
        attributes: Vec<AttributeDef>,
    ) -> Result<Self, SchemaError> {
        let schema = Self {
            table,
            primary_key: primary_key.into(),
            attributes,
            created_at: Utc::now(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Get an attribute definition by its declared name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Resolve a name that may be either an attribute name or a storage
    /// column name. Record keys arriving from callers and fields read back
    /// from storage both go through this.
    pub fn resolve(&self, name: &str) -> Option<&AttributeDef> {
        self.get_attribute(name)
            .or_else(|| self.attributes.iter().find(|a| a.column() == name))
    }

    /// Declared attribute names.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// The primary-key attribute definition.
    pub fn primary_key_attr(&self) -> &AttributeDef {
        // validate() guarantees presence
        self.get_attribute(&self.primary_key)
            .expect("validated schema has a primary key attribute")
    }

    /// Storage column of the primary key.
    pub fn primary_key_column(&self) -> &str {
        self.primary_key_attr().column()
    }

    /// Whether the given name (attribute or column) refers to the primary key.
    pub fn is_primary_key(&self, name: &str) -> bool {
        let pk = self.primary_key_attr();
        pk.name == name || pk.column() == name
    }

    /// Storage columns with a secondary index, in declaration order.
    ///
    /// Computed from the explicit `indexed` flag or a single-reference
    /// association; collections are excluded.
    pub fn indexed_columns(&self) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|a| a.is_indexed())
            .map(|a| a.column().to_string())
            .collect()
    }

    /// Validate the schema invariants.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for attr in &self.attributes {
            if !seen.insert(attr.name.as_str()) {
                return Err(SchemaError::DuplicateAttribute(attr.name.clone()));
            }
        }

        // No storage column may shadow another attribute's name or column.
        for attr in &self.attributes {
            let column = attr.column();
            let collides = self.attributes.iter().any(|other| {
                other.name != attr.name && (other.name == column || other.column() == column)
            });
            if collides {
                return Err(SchemaError::ColumnCollision {
                    attribute: attr.name.clone(),
                    column: column.to_string(),
                });
            }
        }

        let pk = self
            .get_attribute(&self.primary_key)
            .ok_or_else(|| SchemaError::UnknownPrimaryKey(self.primary_key.clone()))?;

        if pk.attr_type != AttrType::String {
            return Err(SchemaError::PrimaryKeyType(pk.attr_type));
        }
        if pk.is_collection() {
            return Err(SchemaError::PrimaryKeyCollection(pk.name.clone()));
        }

        // Single references store the other model's primary key.
        for attr in &self.attributes {
            if matches!(attr.association, Some(Association::Model(_)))
                && attr.attr_type != AttrType::String
            {
                return Err(SchemaError::ReferenceType {
                    attribute: attr.name.clone(),
                    found: attr.attr_type,
                });
            }
        }

        Ok(())
    }
}

/// Schema-related errors.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),

    #[error("storage column \"{column}\" of attribute \"{attribute}\" collides with another attribute")]
    ColumnCollision { attribute: String, column: String },

    #[error("primary key \"{0}\" is not a declared attribute")]
    UnknownPrimaryKey(String),

    #[error("primary key must be of type string, found {0}")]
    PrimaryKeyType(AttrType),

    #[error("primary key \"{0}\" cannot be a collection")]
    PrimaryKeyCollection(String),

    #[error("reference attribute \"{attribute}\" must be of type string, found {found}")]
    ReferenceType { attribute: String, found: AttrType },

    #[error("invalid table name: {0}")]
    InvalidTableName(#[from] InvalidNameError),
}

/// Builder for table schemas.
pub struct SchemaBuilder {
    table: Result<TableName, InvalidNameError>,
    primary_key: Option<String>,
    attributes: Vec<AttributeDef>,
}

impl SchemaBuilder {
    /// Start building a schema for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: TableName::new(table),
            primary_key: None,
            attributes: Vec::new(),
        }
    }

    /// Add a full attribute definition.
    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a simple attribute with just name and type.
    pub fn add_attribute(mut self, name: impl Into<String>, attr_type: AttrType) -> Self {
        self.attributes.push(AttributeDef::new(name, attr_type));
        self
    }

    /// Add an indexed attribute.
    pub fn add_indexed_attribute(mut self, name: impl Into<String>, attr_type: AttrType) -> Self {
        self.attributes.push(AttributeDef::new(name, attr_type).indexed());
        self
    }

    /// Set the primary-key attribute. When the named attribute has not been
    /// added explicitly, a required string attribute is created for it.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    /// Build and validate the schema.
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        let table = self.table?;
        let primary_key = self.primary_key.unwrap_or_else(|| "id".to_string());

        let mut attributes = self.attributes;
        if !attributes.iter().any(|a| a.name == primary_key) {
            attributes.insert(
                0,
                AttributeDef::new(primary_key.clone(), AttrType::String).required(),
            );
        }

        TableSchema::new(table, primary_key, attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> TableSchema {
        SchemaBuilder::new("users")
            .attribute(AttributeDef::new("id", AttrType::String).required())
            .attribute(AttributeDef::new("firstName", AttrType::String).indexed())
            .add_attribute("lastName", AttrType::String)
            .add_attribute("age", AttrType::Number)
            .attribute(AttributeDef::new("owner", AttrType::String).references("account"))
            .attribute(AttributeDef::new("pets", AttrType::Json).collection_of("pet"))
            .primary_key("id")
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_validation() {
        let schema = sample_schema();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.primary_key, "id");
        assert_eq!(schema.primary_key_column(), "id");
    }

    #[test]
    fn test_indexed_columns() {
        let schema = sample_schema();
        // explicit flag + model reference; collection excluded
        assert_eq!(schema.indexed_columns(), vec!["firstName", "owner"]);
    }

    #[test]
    fn test_default_primary_key_attribute() {
        let schema = SchemaBuilder::new("notes")
            .add_attribute("body", AttrType::String)
            .build()
            .unwrap();
        let pk = schema.primary_key_attr();
        assert_eq!(pk.name, "id");
        assert!(pk.required);
        assert_eq!(pk.attr_type, AttrType::String);
    }

    #[test]
    fn test_duplicate_attribute() {
        let result = SchemaBuilder::new("bad")
            .add_attribute("name", AttrType::String)
            .add_attribute("name", AttrType::Number)
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateAttribute(_))));
    }

    #[test]
    fn test_column_collision() {
        let result = SchemaBuilder::new("bad")
            .attribute(AttributeDef::new("display", AttrType::String).with_column("name"))
            .add_attribute("name", AttrType::String)
            .build();
        assert!(matches!(result, Err(SchemaError::ColumnCollision { .. })));
    }

    #[test]
    fn test_primary_key_must_be_string() {
        let result = SchemaBuilder::new("bad")
            .attribute(AttributeDef::new("id", AttrType::Number).required())
            .primary_key("id")
            .build();
        assert!(matches!(result, Err(SchemaError::PrimaryKeyType(_))));
    }

    #[test]
    fn test_reference_must_be_string() {
        let result = SchemaBuilder::new("bad")
            .attribute(AttributeDef::new("owner", AttrType::Number).references("account"))
            .build();
        assert!(matches!(result, Err(SchemaError::ReferenceType { .. })));
    }

    #[test]
    fn test_resolve_by_name_or_column() {
        let schema = SchemaBuilder::new("people")
            .attribute(AttributeDef::new("firstName", AttrType::String).with_column("first_name"))
            .build()
            .unwrap();

        assert_eq!(schema.resolve("firstName").unwrap().name, "firstName");
        assert_eq!(schema.resolve("first_name").unwrap().name, "firstName");
        assert!(schema.resolve("nope").is_none());
    }

    #[test]
    fn test_schema_serialization() {
        let schema = sample_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back.table, schema.table);
        assert_eq!(back.primary_key, schema.primary_key);
        assert_eq!(back.attributes.len(), schema.attributes.len());
    }
}
