//! Shared DDL synthesis. Backends override the pieces that differ.

use super::Dialect;
use super::config::GuidFormat;
use super::rules::Identity;
use crate::error::{OrmError, OrmResult};
use crate::model::{FieldDefinition, FieldType, ModelDefinition};

/// Dialect type name for a field.
pub fn column_type<D: Dialect + ?Sized>(dialect: &D, field: &FieldDefinition) -> OrmResult<String> {
    let types = &dialect.rules().types;
    let config = dialect.config();

    let name = match &field.field_type {
        FieldType::Bool => types.bool.to_string(),
        FieldType::Int16 => types.int16.to_string(),
        FieldType::Int32 => types.int32.to_string(),
        FieldType::Int64 => types.int64.to_string(),
        FieldType::Float => types.float.to_string(),
        FieldType::Double => types.double.to_string(),
        FieldType::Decimal => {
            let precision = field
                .field_length
                .unwrap_or(config.default_decimal_precision);
            let scale = field.scale.unwrap_or(config.default_decimal_scale);
            if precision > types.max_decimal_precision {
                return Err(OrmError::not_supported(format!(
                    "{} supports DECIMAL precision up to {}, {} declares {precision}",
                    dialect.rules().name,
                    types.max_decimal_precision,
                    field.name
                )));
            }
            if scale > precision {
                return Err(OrmError::definition(format!(
                    "{} has scale {scale} larger than precision {precision}",
                    field.name
                )));
            }
            format!("{}({precision},{scale})", types.decimal)
        }
        FieldType::String => string_type(dialect, field.field_length),
        FieldType::Guid => match config.guid_format {
            GuidFormat::String => types.guid_string.to_string(),
            GuidFormat::Binary => types.guid_binary.to_string(),
        },
        FieldType::DateTime => types.datetime.to_string(),
        FieldType::Date => types.date.to_string(),
        FieldType::Time => types.time.to_string(),
        FieldType::Bytes => types.bytes.to_string(),
        FieldType::Enum(e) if e.store_as_int => types.int32.to_string(),
        FieldType::Enum(_) => string_type(dialect, field.field_length),
    };
    Ok(name)
}

fn string_type<D: Dialect + ?Sized>(dialect: &D, length: Option<u32>) -> String {
    let types = &dialect.rules().types;
    let config = dialect.config();
    let length = length.unwrap_or(config.default_string_length);
    match (length > types.max_string_length, config.use_unicode) {
        (true, false) => types.text.to_string(),
        (true, true) => types.unicode_text.to_string(),
        (false, false) => format!("{}({length})", types.string),
        (false, true) => format!("{}({length})", types.unicode_string),
    }
}

/// Whether the database itself numbers `field`. A named sequence on a dialect
/// without sequences falls back to the dialect's identity column.
pub fn is_identity<D: Dialect + ?Sized>(dialect: &D, field: &FieldDefinition) -> bool {
    match &field.sequence {
        Some(_) => !dialect.rules().supports_sequences,
        None => field.auto_increment,
    }
}

/// Explicit default, else the next value of the field's sequence where the
/// dialect can express one.
fn column_default<D: Dialect + ?Sized>(dialect: &D, field: &FieldDefinition) -> Option<String> {
    if let Some(default) = &field.default_value {
        return Some(default.clone());
    }
    let sequence = field.sequence.as_deref()?;
    if !dialect.rules().supports_sequences {
        return None;
    }
    dialect.sequence_default(sequence)
}

/// `name TYPE [PRIMARY KEY [identity]] [NULL|NOT NULL] [DEFAULT x]`
pub fn column_definition<D: Dialect + ?Sized>(
    dialect: &D,
    field: &FieldDefinition,
) -> OrmResult<String> {
    let mut sql = format!(
        "{} {}",
        dialect.quoted_column_name(field.field_name()),
        dialect.column_type(field)?
    );

    if field.is_primary_key {
        sql.push_str(" PRIMARY KEY");
        if is_identity(dialect, field) {
            if let Identity::Keyword(keyword) = dialect.rules().identity {
                sql.push(' ');
                sql.push_str(keyword);
            }
        }
    } else if field.is_nullable {
        sql.push_str(" NULL");
    } else {
        sql.push_str(" NOT NULL");
    }

    if let Some(default) = column_default(dialect, field) {
        sql.push_str(&dialect.default_clause(&default));
    }
    Ok(sql)
}

fn foreign_key_constraint<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    field: &FieldDefinition,
) -> Option<String> {
    let fk = field.foreign_key.as_ref()?;
    let table = dialect.table_name(model);
    let ref_table = dialect.config().naming_strategy.table_name(&fk.table);
    let name = fk.name.clone().unwrap_or_else(|| {
        dialect.rules().clamp_identifier(format!(
            "FK_{table}_{ref_table}_{}",
            dialect.column_name(field.field_name())
        ))
    });

    let quoted_ref_table = match &fk.schema {
        Some(schema) => format!(
            "{}.{}",
            dialect.quote_name(schema),
            dialect.quote_name(&ref_table)
        ),
        None => dialect.quote_name(&ref_table),
    };

    let mut sql = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        dialect.quote_name(&name),
        dialect.quoted_column_name(field.field_name()),
        quoted_ref_table,
        dialect.quoted_column_name(&fk.column)
    );
    if let Some(action) = fk.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = fk.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    Some(sql)
}

/// `CREATE TABLE` with column definitions, foreign keys and composite key.
pub fn create_table<D: Dialect + ?Sized>(dialect: &D, model: &ModelDefinition) -> OrmResult<String> {
    let mut lines = Vec::with_capacity(model.field_definitions.len());
    for field in model.fields() {
        lines.push(dialect.column_definition(field)?);
    }

    let mut constraints: Vec<String> = model
        .fields()
        .filter_map(|field| foreign_key_constraint(dialect, model, field))
        .collect();

    if !model.composite_key.is_empty() {
        let columns = model
            .primary_keys()
            .iter()
            .map(|f| dialect.quoted_column_name(f.field_name()))
            .collect::<Vec<_>>()
            .join(", ");
        constraints.insert(0, format!("PRIMARY KEY ({columns})"));
    }

    let mut body = lines.join(",\n  ");
    if !constraints.is_empty() {
        body.push_str(",\n\n  ");
        body.push_str(&constraints.join(",\n  "));
    }

    Ok(format!(
        "CREATE TABLE {} \n(\n  {}\n);",
        dialect.quoted_table_name(model),
        body
    ))
}

/// Default index name: `idx_` or `uidx_`, table and columns, lower-cased.
pub fn index_name<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    unique: bool,
    columns: &[String],
) -> String {
    let name = format!(
        "{}idx_{}_{}",
        if unique { "u" } else { "" },
        dialect.table_name(model),
        columns.join("_")
    )
    .to_lowercase();
    dialect.rules().clamp_identifier(name)
}

/// One `CREATE INDEX` per indexed field, then one per composite index.
pub fn create_indexes<D: Dialect + ?Sized>(dialect: &D, model: &ModelDefinition) -> Vec<String> {
    let table = dialect.quoted_table_name(model);
    let mut statements = Vec::new();

    for field in model.fields() {
        if !field.is_indexed || model.is_key_field(field) {
            continue;
        }
        let column = dialect.column_name(field.field_name());
        let name = dialect.index_name(model, field.is_unique, std::slice::from_ref(&column));
        statements.push(format!(
            "CREATE {}INDEX {} ON {} ({} ASC);",
            if field.is_unique { "UNIQUE " } else { "" },
            dialect.quote_name(&name),
            table,
            dialect.quote_name(&column)
        ));
    }

    for index in &model.composite_indexes {
        let mut names = Vec::new();
        let mut columns = Vec::new();
        for (field_name, desc) in index.columns() {
            let field = model.field(field_name);
            let column = dialect.column_name(field.map_or(field_name, |f| f.field_name()));
            columns.push(format!(
                "{} {}",
                dialect.quote_name(&column),
                if desc { "DESC" } else { "ASC" }
            ));
            names.push(column);
        }
        let name = index
            .name
            .clone()
            .unwrap_or_else(|| dialect.index_name(model, index.unique, &names));
        statements.push(format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.unique { "UNIQUE " } else { "" },
            dialect.quote_name(&name),
            table,
            columns.join(", ")
        ));
    }
    statements
}

/// `{table}_{column}_GEN`, clamped to the identifier limit.
pub fn generator_name<D: Dialect + ?Sized>(
    dialect: &D,
    model: &ModelDefinition,
    field: &FieldDefinition,
) -> String {
    dialect.rules().clamp_identifier(format!(
        "{}_{}_GEN",
        dialect.table_name(model),
        dialect.column_name(field.field_name())
    ))
}
