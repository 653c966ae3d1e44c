//! Model definitions declared in a TOML or JSON file.
//!
//! ```toml
//! [[models]]
//! name = "Person"
//!
//! [[models.fields]]
//! name = "Id"
//! type = "int32"
//! auto_increment = true
//!
//! [[models.fields]]
//! name = "Name"
//! type = "string"
//! length = 100
//! nullable = false
//!
//! [[models.indexes]]
//! fields = ["Name", "Id DESC"]
//! unique = true
//! ```
//!
//! Each model goes through [`ModelDefinition::builder`], so the file gets the
//! same validation as definitions written in code.

use crate::error::{OrmError, OrmResult};
use crate::model::{
    CompositeIndex, EnumType, FieldDefinition, FieldType, ForeignKey, ModelDefinition,
    ReferentialAction,
};
use crate::settings::DialectSettings;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    /// Optional dialect settings shipped with the schema.
    #[serde(default)]
    pub dialect: Option<DialectSettings>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    pub name: String,
    pub alias: Option<String>,
    pub schema: Option<String>,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    #[serde(default)]
    pub composite_key: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeName {
    Bool,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    String,
    Guid,
    #[serde(alias = "timestamp")]
    DateTime,
    Date,
    Time,
    Bytes,
    Enum,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumSpec {
    pub name: String,
    pub variants: Vec<String>,
    #[serde(default)]
    pub store_as_int: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl From<ActionName> for ReferentialAction {
    fn from(action: ActionName) -> Self {
        match action {
            ActionName::Cascade => ReferentialAction::Cascade,
            ActionName::SetNull => ReferentialAction::SetNull,
            ActionName::SetDefault => ReferentialAction::SetDefault,
            ActionName::Restrict => ReferentialAction::Restrict,
            ActionName::NoAction => ReferentialAction::NoAction,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeySpec {
    pub table: String,
    pub column: Option<String>,
    pub schema: Option<String>,
    pub on_delete: Option<ActionName>,
    pub on_update: Option<ActionName>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: TypeName,
    pub alias: Option<String>,
    #[serde(rename = "enum")]
    pub enum_type: Option<EnumSpec>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    pub sequence: Option<String>,
    /// Unset keeps the type's default nullability.
    pub nullable: Option<bool>,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub unique: bool,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default: Option<String>,
    pub references: Option<ForeignKeySpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSpec {
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    pub name: Option<String>,
}

impl FieldSpec {
    fn field_type(&self) -> OrmResult<FieldType> {
        let field_type = match self.type_name {
            TypeName::Bool => FieldType::Bool,
            TypeName::Int16 => FieldType::Int16,
            TypeName::Int32 => FieldType::Int32,
            TypeName::Int64 => FieldType::Int64,
            TypeName::Float => FieldType::Float,
            TypeName::Double => FieldType::Double,
            TypeName::Decimal => FieldType::Decimal,
            TypeName::String => FieldType::String,
            TypeName::Guid => FieldType::Guid,
            TypeName::DateTime => FieldType::DateTime,
            TypeName::Date => FieldType::Date,
            TypeName::Time => FieldType::Time,
            TypeName::Bytes => FieldType::Bytes,
            TypeName::Enum => {
                let spec = self.enum_type.as_ref().ok_or_else(|| {
                    OrmError::config(format!(
                        "field `{}` has type enum but no [enum] table",
                        self.name
                    ))
                })?;
                let mut enum_type = EnumType::new(&spec.name, spec.variants.iter().cloned());
                if spec.store_as_int {
                    enum_type = enum_type.as_int();
                }
                FieldType::Enum(enum_type)
            }
        };
        if self.enum_type.is_some() && self.type_name != TypeName::Enum {
            return Err(OrmError::config(format!(
                "field `{}` declares enum variants but is not of type enum",
                self.name
            )));
        }
        Ok(field_type)
    }

    pub fn to_definition(&self) -> OrmResult<FieldDefinition> {
        let mut field = FieldDefinition::new(&self.name, self.field_type()?);
        if let Some(alias) = &self.alias {
            field = field.alias(alias);
        }
        if self.primary_key {
            field = field.primary_key();
        }
        if self.auto_increment {
            field = field.auto_increment();
        }
        if let Some(sequence) = &self.sequence {
            field = field.sequence(sequence);
        }
        match self.nullable {
            Some(true) => field = field.nullable(),
            Some(false) => field = field.required(),
            None => {}
        }
        if self.computed {
            field = field.computed();
        }
        if self.indexed {
            field = field.indexed();
        }
        if self.unique {
            field = field.unique();
        }
        match (self.precision, self.length) {
            (Some(_), Some(_)) => {
                return Err(OrmError::config(format!(
                    "field `{}` sets both length and precision",
                    self.name
                )));
            }
            (Some(precision), None) => {
                field = field.precision(precision, self.scale.unwrap_or(0));
            }
            (None, Some(length)) => field = field.length(length),
            (None, None) => {
                if let Some(scale) = self.scale {
                    field.scale = Some(scale);
                }
            }
        }
        if let Some(default) = &self.default {
            field = field.default_value(default);
        }
        if let Some(fk) = &self.references {
            let mut key = ForeignKey::new(&fk.table);
            if let Some(column) = &fk.column {
                key = key.column(column);
            }
            if let Some(action) = fk.on_delete {
                key = key.on_delete(action.into());
            }
            if let Some(action) = fk.on_update {
                key = key.on_update(action.into());
            }
            if let Some(name) = &fk.name {
                key = key.named(name);
            }
            key.schema = fk.schema.clone();
            field = field.references(key);
        }
        Ok(field)
    }
}

impl ModelSpec {
    pub fn to_definition(&self) -> OrmResult<ModelDefinition> {
        let mut builder = ModelDefinition::builder(&self.name);
        if let Some(alias) = &self.alias {
            builder = builder.alias(alias);
        }
        if let Some(schema) = &self.schema {
            builder = builder.schema(schema);
        }
        for field in &self.fields {
            builder = builder.field(field.to_definition()?);
        }
        for index in &self.indexes {
            let mut composite = CompositeIndex::new(index.fields.iter().cloned());
            if index.unique {
                composite = composite.unique();
            }
            if let Some(name) = &index.name {
                composite = composite.named(name);
            }
            builder = builder.composite_index(composite);
        }
        if !self.composite_key.is_empty() {
            builder = builder.composite_key(self.composite_key.iter().cloned());
        }
        builder.build()
    }
}

impl SchemaFile {
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let file: Self = toml::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    pub fn from_json_str(raw: &str) -> OrmResult<Self> {
        let file: Self = serde_json::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    /// Load by extension: `.json` is JSON, anything else TOML.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read schema file {}: {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_toml_str(&raw)
        }
    }

    fn validate(&self) -> OrmResult<()> {
        if let Some(settings) = &self.dialect {
            settings.validate()?;
        }
        Ok(())
    }

    /// Build every model, in file order.
    pub fn definitions(&self) -> OrmResult<Vec<ModelDefinition>> {
        self.models.iter().map(ModelSpec::to_definition).collect()
    }
}
