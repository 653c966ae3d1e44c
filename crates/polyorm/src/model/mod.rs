//! Table and column metadata.
//!
//! A [`ModelDefinition`] describes one entity: its table name, optional schema,
//! the ordered list of [`FieldDefinition`]s and any composite indexes or keys.
//! Definitions are built through [`ModelDefinitionBuilder`], which validates the
//! shape up front so that SQL generation never sees an inconsistent model.
//!
//! # Example
//! ```ignore
//! use polyorm::model::{FieldDefinition, FieldType, ModelDefinition};
//!
//! let person = ModelDefinition::builder("Person")
//!     .field(FieldDefinition::new("Id", FieldType::Int32).primary_key().auto_increment())
//!     .field(FieldDefinition::new("Name", FieldType::String).length(100))
//!     .field(FieldDefinition::new("Age", FieldType::Int32).nullable())
//!     .build()?;
//! # Ok::<(), polyorm::OrmError>(())
//! ```

mod entity;

pub use entity::{Entity, Record, RowValues, model_definition};

use crate::error::{OrmError, OrmResult};
use std::collections::HashSet;
use std::fmt;

/// Name of the field picked as primary key when none is declared.
pub const ID_FIELD: &str = "Id";

/// Description of an enum-typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    /// Variant names, indexed by ordinal.
    pub variants: Vec<String>,
    /// Store the ordinal instead of the variant name.
    pub store_as_int: bool,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
            store_as_int: false,
        }
    }

    /// Store ordinals (`INTEGER` column) instead of names.
    pub fn as_int(mut self) -> Self {
        self.store_as_int = true;
        self
    }

    pub fn variant(&self, ordinal: i64) -> Option<&str> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.variants.get(i))
            .map(String::as_str)
    }

    pub fn ordinal(&self, variant: &str) -> Option<i64> {
        self.variants
            .iter()
            .position(|v| v == variant)
            .and_then(|i| i64::try_from(i).ok())
    }
}

/// Logical column type, mapped to a dialect type name at DDL time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    String,
    Guid,
    DateTime,
    Date,
    Time,
    Bytes,
    Enum(EnumType),
}

impl FieldType {
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Int16 | FieldType::Int32 | FieldType::Int64)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, FieldType::Bool)
    }

    /// Types whose values are references in the source language, nullable by default.
    fn nullable_by_default(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Bytes)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Enum(e) => write!(f, "enum {}", e.name),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Referential action for `ON DELETE` / `ON UPDATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

/// Foreign key from a field to another table's column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referenced table (model name, naming strategy still applies).
    pub table: String,
    /// Referenced column (field name).
    pub column: String,
    pub schema: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    /// Explicit constraint name.
    pub name: Option<String>,
}

impl ForeignKey {
    /// Reference `table.Id`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: ID_FIELD.to_string(),
            schema: None,
            on_delete: None,
            on_update: None,
            name: None,
        }
    }

    /// Reference the primary key of another model.
    pub fn to_model(model: &ModelDefinition) -> Self {
        let column = model
            .primary_key()
            .map(|pk| pk.field_name().to_string())
            .unwrap_or_else(|| ID_FIELD.to_string());
        Self {
            table: model.model_name().to_string(),
            column,
            schema: model.schema.clone(),
            on_delete: None,
            on_update: None,
            name: None,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Source identifier.
    pub name: String,
    /// Column name override.
    pub alias: Option<String>,
    pub field_type: FieldType,
    pub is_primary_key: bool,
    pub auto_increment: bool,
    /// Explicit sequence backing this field.
    pub sequence: Option<String>,
    pub is_nullable: bool,
    pub is_computed: bool,
    pub is_indexed: bool,
    pub is_unique: bool,
    /// String length, or decimal precision.
    pub field_length: Option<u32>,
    /// Decimal scale.
    pub scale: Option<u32>,
    /// Raw SQL default expression.
    pub default_value: Option<String>,
    pub foreign_key: Option<ForeignKey>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let is_nullable = field_type.nullable_by_default();
        Self {
            name: name.into(),
            alias: None,
            field_type,
            is_primary_key: false,
            auto_increment: false,
            sequence: None,
            is_nullable,
            is_computed: false,
            is_indexed: false,
            is_unique: false,
            field_length: None,
            scale: None,
            default_value: None,
            foreign_key: None,
        }
    }

    /// Mapped column name: the alias if set, otherwise the field name.
    pub fn field_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn sequence(mut self, name: impl Into<String>) -> Self {
        self.sequence = Some(name.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.is_computed = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_indexed = true;
        self.is_unique = true;
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.field_length = Some(length);
        self
    }

    /// Decimal precision and scale.
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.field_length = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn default_value(mut self, sql: impl Into<String>) -> Self {
        self.default_value = Some(sql.into());
        self
    }

    pub fn references(mut self, fk: ForeignKey) -> Self {
        self.foreign_key = Some(fk);
        self
    }

    /// Whether the value is generated by the database (identity or sequence).
    pub fn is_generated(&self) -> bool {
        self.auto_increment || self.sequence.is_some()
    }
}

/// Index over several fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIndex {
    /// Field names, each optionally followed by ` ASC` / ` DESC`.
    pub field_names: Vec<String>,
    pub unique: bool,
    pub name: Option<String>,
}

impl CompositeIndex {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            unique: false,
            name: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Split each entry into `(field, descending)`.
    pub fn columns(&self) -> impl Iterator<Item = (&str, bool)> {
        self.field_names.iter().map(|entry| {
            let mut parts = entry.split_whitespace();
            let field = parts.next().unwrap_or_default();
            let desc = parts
                .next()
                .is_some_and(|dir| dir.eq_ignore_ascii_case("DESC"));
            (field, desc)
        })
    }
}

/// Metadata for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    /// Source type name.
    pub name: String,
    /// Table name override.
    pub alias: Option<String>,
    pub schema: Option<String>,
    pub field_definitions: Vec<FieldDefinition>,
    pub composite_indexes: Vec<CompositeIndex>,
    /// Multi-column primary key (field names); empty when a single key field is used.
    pub composite_key: Vec<String>,
}

impl ModelDefinition {
    pub fn builder(name: impl Into<String>) -> ModelDefinitionBuilder {
        ModelDefinitionBuilder::new(name)
    }

    /// Table name: the alias if set, otherwise the type name.
    pub fn model_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_in_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// The single primary key field, if any.
    pub fn primary_key(&self) -> Option<&FieldDefinition> {
        self.field_definitions.iter().find(|f| f.is_primary_key)
    }

    /// All key fields: the composite key in declared order, or the single key.
    pub fn primary_keys(&self) -> Vec<&FieldDefinition> {
        if self.composite_key.is_empty() {
            return self.primary_key().into_iter().collect();
        }
        self.composite_key
            .iter()
            .filter_map(|name| self.field(name))
            .collect()
    }

    pub fn is_key_field(&self, field: &FieldDefinition) -> bool {
        field.is_primary_key || self.composite_key.iter().any(|k| *k == field.name)
    }

    /// Look up a field by source name, falling back to the column name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.field_definitions
            .iter()
            .find(|f| f.name == name)
            .or_else(|| {
                self.field_definitions
                    .iter()
                    .find(|f| f.field_name().eq_ignore_ascii_case(name))
            })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.field_definitions.iter()
    }
}

/// Builder that validates a [`ModelDefinition`].
#[derive(Debug, Clone)]
pub struct ModelDefinitionBuilder {
    def: ModelDefinition,
}

impl ModelDefinitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: ModelDefinition {
                name: name.into(),
                alias: None,
                schema: None,
                field_definitions: Vec::new(),
                composite_indexes: Vec::new(),
                composite_key: Vec::new(),
            },
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.def.alias = Some(alias.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.def.schema = Some(schema.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.def.field_definitions.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDefinition>) -> Self {
        self.def.field_definitions.extend(fields);
        self
    }

    pub fn composite_index(mut self, index: CompositeIndex) -> Self {
        self.def.composite_indexes.push(index);
        self
    }

    pub fn composite_key<I, S>(mut self, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.composite_key = field_names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and finish the definition.
    pub fn build(self) -> OrmResult<ModelDefinition> {
        let mut def = self.def;
        let model = def.name.clone();

        if model.trim().is_empty() {
            return Err(OrmError::definition("model name cannot be empty"));
        }
        if def.field_definitions.is_empty() {
            return Err(OrmError::definition(format!("{model} declares no fields")));
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for field in &def.field_definitions {
            if field.name.trim().is_empty() {
                return Err(OrmError::definition(format!("{model} has a field with an empty name")));
            }
            if !names.insert(field.name.as_str()) {
                return Err(OrmError::definition(format!(
                    "{model}.{} is declared twice",
                    field.name
                )));
            }
            if !columns.insert(field.field_name().to_ascii_lowercase()) {
                return Err(OrmError::definition(format!(
                    "{model}.{} maps to column `{}` which is already mapped",
                    field.name,
                    field.field_name()
                )));
            }
            if field.is_generated() && !field.field_type.is_integer() {
                return Err(OrmError::definition(format!(
                    "{model}.{} is generated but has type {}",
                    field.name, field.field_type
                )));
            }
            if let Some(fk) = &field.foreign_key {
                if fk.table.trim().is_empty() || fk.column.trim().is_empty() {
                    return Err(OrmError::definition(format!(
                        "{model}.{} has an incomplete foreign key",
                        field.name
                    )));
                }
            }
        }

        for index in &def.composite_indexes {
            if index.field_names.is_empty() {
                return Err(OrmError::definition(format!("{model} has an empty composite index")));
            }
            for (field, _) in index.columns() {
                if !names.contains(field) {
                    return Err(OrmError::definition(format!(
                        "composite index on {model} references undeclared field `{field}`"
                    )));
                }
            }
        }

        let explicit_keys = def
            .field_definitions
            .iter()
            .filter(|f| f.is_primary_key)
            .count();

        if !def.composite_key.is_empty() {
            if explicit_keys > 0 {
                return Err(OrmError::definition(format!(
                    "{model} declares both a composite key and a primary key field"
                )));
            }
            for key in &def.composite_key {
                if !names.contains(key.as_str()) {
                    return Err(OrmError::definition(format!(
                        "composite key on {model} references undeclared field `{key}`"
                    )));
                }
            }
            let keys = def.composite_key.clone();
            for field in def
                .field_definitions
                .iter_mut()
                .filter(|f| keys.contains(&f.name))
            {
                field.is_nullable = false;
            }
        } else if explicit_keys > 1 {
            return Err(OrmError::definition(format!(
                "{model} declares {explicit_keys} primary key fields; use a composite key"
            )));
        } else if explicit_keys == 0 {
            if let Some(id) = def
                .field_definitions
                .iter_mut()
                .find(|f| f.name == ID_FIELD)
            {
                id.is_primary_key = true;
                id.is_nullable = false;
            }
        }

        Ok(def)
    }
}
