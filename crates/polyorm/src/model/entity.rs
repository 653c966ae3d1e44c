//! Entity types and the per-type definition cache.

use super::ModelDefinition;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Field-level access to a row, used to read values for DML and to write back
/// sequence values resolved during insert.
pub trait RowValues {
    /// Value of the field with the given source name; `Value::Null` when absent.
    fn get_value(&self, field: &str) -> Value;

    /// Write a value back into the field.
    fn set_value(&mut self, field: &str, value: Value) -> OrmResult<()>;
}

/// A type with a static model definition.
///
/// ```ignore
/// impl Entity for Person {
///     fn define() -> OrmResult<ModelDefinition> {
///         ModelDefinition::builder("Person")
///             .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
///             .field(FieldDefinition::new("Name", FieldType::String))
///             .build()
///     }
/// }
/// ```
pub trait Entity: RowValues + 'static {
    fn define() -> OrmResult<ModelDefinition>;
}

type DefinitionCache = Mutex<HashMap<TypeId, Arc<ModelDefinition>>>;

static DEFINITIONS: OnceLock<DefinitionCache> = OnceLock::new();

/// Return the cached definition for `T`, building it on first use.
///
/// Concurrent first calls may each run `T::define()`; the first inserted
/// definition wins and every caller observes that one.
pub fn model_definition<T: Entity>() -> OrmResult<Arc<ModelDefinition>> {
    let cache = DEFINITIONS.get_or_init(|| Mutex::new(HashMap::new()));
    let key = TypeId::of::<T>();

    if let Some(def) = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(def));
    }

    // Build outside the lock so `define` may resolve other models.
    let built = Arc::new(T::define()?);
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(guard.entry(key).or_insert(built)))
}

/// A dynamic row keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

impl RowValues for Record {
    fn get_value(&self, field: &str) -> Value {
        self.values.get(field).cloned().unwrap_or_default()
    }

    fn set_value(&mut self, field: &str, value: Value) -> OrmResult<()> {
        if field.is_empty() {
            return Err(OrmError::validation("field name cannot be empty"));
        }
        self.values.insert(field.to_string(), value);
        Ok(())
    }
}
