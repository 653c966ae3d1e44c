//! Shared row-level DML synthesis.

use super::Dialect;
use crate::command::{Command, Params};
use crate::error::{OrmError, OrmResult};
use crate::model::{FieldDefinition, ModelDefinition, RowValues};
use crate::value::Value;

fn selected(field: &FieldDefinition, allow: &[String]) -> bool {
    allow.is_empty() || allow.iter().any(|name| *name == field.name)
}

/// Resolve the next sequence value, write it back into the row and remember it.
fn next_sequence_value<D: Dialect + ?Sized>(
    dialect: &D,
    cmd: &mut dyn Command,
    sequence: &str,
    field: &FieldDefinition,
    row: &mut dyn RowValues,
) -> OrmResult<Value> {
    let sql = dialect.next_sequence_value_sql(sequence)?;
    trace_sql!(kind = "sequence", sql = %sql);
    let value = cmd.scalar(&sql, &Params::new())?;
    let id = value.as_i64().ok_or_else(|| {
        OrmError::command(format!(
            "sequence {sequence} returned a {} value",
            value.kind()
        ))
    })?;
    row.set_value(&field.name, Value::Int(id))?;
    dialect.sequence_cache().store(id);
    Ok(Value::Int(id))
}

/// `INSERT INTO t (cols) VALUES (vals)`
///
/// Computed fields are skipped. Generated fields are skipped unless a command
/// is supplied and the field is sequence-backed, in which case the next value
/// is fetched first.
pub fn insert_row<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    row: &mut dyn RowValues,
    insert_fields: &[String],
    mut cmd: Option<&mut dyn Command>,
) -> OrmResult<String> {
    let mut columns = Vec::new();
    let mut values = Vec::new();

    for field in model.fields() {
        if field.is_computed || !selected(field, insert_fields) {
            continue;
        }
        let value = if field.is_generated() {
            let sequence = dialect.sequence_name(model, field);
            match (sequence, cmd.as_deref_mut()) {
                (Some(sequence), Some(cmd)) => {
                    next_sequence_value(dialect, cmd, &sequence, field, row)?
                }
                _ => continue,
            }
        } else {
            row.get_value(&field.name)
        };
        columns.push(dialect.quoted_column_name(field.field_name()));
        values.push(dialect.field_value(field, &value)?);
    }

    let table = dialect.quoted_table_name(model);
    if columns.is_empty() {
        return Ok(dialect.insert_default_values(&table));
    }
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(","),
        values.join(",")
    ))
}

/// `key = value AND ...` over the primary key, or over every stored field
/// when the model has no key.
pub fn row_filter<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    row: &dyn RowValues,
) -> OrmResult<String> {
    let keys = model.primary_keys();
    let fields: Vec<&FieldDefinition> = if keys.is_empty() {
        model.fields().filter(|f| !f.is_computed).collect()
    } else {
        keys
    };

    let mut conditions = Vec::with_capacity(fields.len());
    for field in fields {
        let column = dialect.quoted_column_name(field.field_name());
        let value = row.get_value(&field.name);
        if value.is_null() {
            conditions.push(format!("{column} IS NULL"));
        } else {
            conditions.push(format!("{column} = {}", dialect.field_value(field, &value)?));
        }
    }
    Ok(conditions.join(" AND "))
}

/// `UPDATE t SET col = v, ... WHERE key = v`
pub fn update_row<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    row: &dyn RowValues,
    update_fields: &[String],
) -> OrmResult<String> {
    if model.primary_keys().is_empty() {
        return Err(OrmError::validation(format!(
            "cannot update a {} row without a primary key",
            model.name
        )));
    }

    let mut assignments = Vec::new();
    for field in model.fields() {
        if model.is_key_field(field)
            || field.is_computed
            || field.auto_increment
            || !selected(field, update_fields)
        {
            continue;
        }
        assignments.push(format!(
            "{} = {}",
            dialect.quoted_column_name(field.field_name()),
            dialect.field_value(field, &row.get_value(&field.name))?
        ));
    }
    if assignments.is_empty() {
        return Err(OrmError::validation(format!(
            "no updatable fields selected for {}",
            model.name
        )));
    }

    Ok(format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.quoted_table_name(model),
        assignments.join(", "),
        row_filter(dialect, model, row)?
    ))
}

/// `DELETE FROM t WHERE key = v`
pub fn delete_row<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    row: &dyn RowValues,
) -> OrmResult<String> {
    Ok(format!(
        "DELETE FROM {} WHERE {}",
        dialect.quoted_table_name(model),
        row_filter(dialect, model, row)?
    ))
}

/// Procedure argument list in field order, skipping computed fields.
pub fn procedure_arguments<D: Dialect + ?Sized>(
    dialect: &D,
    procedure: &ModelDefinition,
    args: &dyn RowValues,
) -> OrmResult<Vec<String>> {
    procedure
        .fields()
        .filter(|f| !f.is_computed)
        .map(|f| dialect.field_value(f, &args.get_value(&f.name)))
        .collect()
}

/// `SELECT cols FROM proc(args) [WHERE filter]`
pub fn select_from_procedure<D: Dialect + ?Sized>(
    dialect: &D,
    procedure: &ModelDefinition,
    args: &dyn RowValues,
    output: &ModelDefinition,
    filter: &str,
) -> OrmResult<String> {
    let columns = output
        .fields()
        .map(|f| dialect.quoted_column_name(f.field_name()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "SELECT {columns} FROM {}({})",
        dialect.quoted_table_name(procedure),
        procedure_arguments(dialect, procedure, args)?.join(", ")
    );
    if !filter.trim().is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(filter.trim());
    }
    Ok(sql)
}
