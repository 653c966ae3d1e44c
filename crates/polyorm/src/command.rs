//! Executor seam and bound parameters.
//!
//! polyorm does not talk to databases itself. Operations that need a round
//! trip (fetching a sequence value, creating a table with its sequences)
//! go through a caller-supplied [`Command`].

use crate::dialect::{Dialect, DuplicateSequencePolicy};
use crate::error::OrmResult;
use crate::model::ModelDefinition;
use crate::value::Value;

/// Ordered list of named parameter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Names of the entries from position `start` on.
    pub fn names_from(&self, start: usize) -> Vec<String> {
        self.entries
            .iter()
            .skip(start)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Drop the entries with the given names.
    pub fn remove_all(&mut self, names: &[String]) {
        if !names.is_empty() {
            self.entries.retain(|(n, _)| !names.contains(n));
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }
}

/// Executes SQL on behalf of the generator.
pub trait Command {
    /// Run a statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64>;

    /// Run a query returning a single value.
    fn scalar(&mut self, sql: &str, params: &Params) -> OrmResult<Value>;
}

/// Create the sequences, table and indexes for `model`.
///
/// Sequence creation failures that report an existing object are tolerated
/// when the dialect's [`DuplicateSequencePolicy`] is `Ignore`.
pub fn create_table(
    cmd: &mut dyn Command,
    dialect: &dyn Dialect,
    model: &ModelDefinition,
) -> OrmResult<()> {
    let empty = Params::new();
    let policy = dialect.config().duplicate_sequence_policy;

    for sql in dialect.create_sequence_statements(model) {
        trace_sql!(kind = "ddl", sql = %sql);
        match cmd.execute(&sql, &empty) {
            Ok(_) => {}
            Err(err)
                if policy == DuplicateSequencePolicy::Ignore && err.is_duplicate_object() =>
            {
                warn_sql!(sql = %sql, error = %err, "sequence already exists, continuing");
            }
            Err(err) => return Err(err),
        }
    }

    let sql = dialect.create_table_statement(model)?;
    trace_sql!(kind = "ddl", sql = %sql);
    cmd.execute(&sql, &empty)?;

    for sql in dialect.create_index_statements(model) {
        trace_sql!(kind = "ddl", sql = %sql);
        cmd.execute(&sql, &empty)?;
    }
    Ok(())
}

/// Drop the table for `model`.
pub fn drop_table(
    cmd: &mut dyn Command,
    dialect: &dyn Dialect,
    model: &ModelDefinition,
) -> OrmResult<()> {
    let sql = dialect.drop_table_statement(model);
    trace_sql!(kind = "ddl", sql = %sql);
    cmd.execute(&sql, &Params::new())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_order_and_removal() {
        let mut params = Params::new();
        params.push("@0", Value::Int(1));
        params.push("@1", Value::Int(2));
        params.push("@2", Value::Int(3));
        params.remove_all(&["@1".to_string()]);
        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["@0", "@2"]);
        assert_eq!(params.get("@2"), Some(&Value::Int(3)));
        assert_eq!(params.names_from(1), ["@2"]);
    }
}
