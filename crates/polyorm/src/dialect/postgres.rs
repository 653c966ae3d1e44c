use super::config::GuidFormat;
use super::rules::{DialectRules, Identity, LimitStyle, TypeNames};
use super::{Dialect, DialectKind, ddl, dialect_identity, dialect_instance, dml, literal};
use crate::error::OrmResult;
use crate::expr::BinaryOp;
use crate::model::{FieldDefinition, FieldType, ModelDefinition, RowValues};
use uuid::Uuid;

static RULES: DialectRules = DialectRules {
    name: "PostgreSQL",
    open_quote: '"',
    close_quote: '"',
    reserved_words: &[
        "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC",
        "AUTHORIZATION", "BINARY", "BOTH", "CASE", "CAST", "CHECK", "COLLATE", "COLLATION",
        "COLUMN", "CONCURRENTLY", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_CATALOG",
        "CURRENT_DATE", "CURRENT_ROLE", "CURRENT_SCHEMA", "CURRENT_TIME",
        "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DEFERRABLE", "DESC", "DISTINCT",
        "DO", "ELSE", "END", "EXCEPT", "FALSE", "FETCH", "FOR", "FOREIGN", "FREEZE", "FROM",
        "FULL", "GRANT", "GROUP", "HAVING", "ILIKE", "IN", "INITIALLY", "INNER", "INTERSECT",
        "INTO", "IS", "ISNULL", "JOIN", "LATERAL", "LEADING", "LEFT", "LIKE", "LIMIT",
        "LOCALTIME", "LOCALTIMESTAMP", "NATURAL", "NOT", "NOTNULL", "NULL", "OFFSET", "ON",
        "ONLY", "OR", "ORDER", "OUTER", "OVERLAPS", "PLACING", "PRIMARY", "REFERENCES",
        "RETURNING", "RIGHT", "SELECT", "SESSION_USER", "SIMILAR", "SOME", "SYMMETRIC",
        "TABLE", "TABLESAMPLE", "THEN", "TO", "TRAILING", "TRUE", "UNION", "UNIQUE", "USER",
        "USING", "VARIADIC", "VERBOSE", "WHEN", "WHERE", "WINDOW", "WITH",
    ],
    true_literal: "true",
    false_literal: "false",
    param_prefix: ":",
    limit_style: LimitStyle::LimitOffset,
    unbounded_rows: "ALL",
    identity: Identity::Serial,
    supports_sequences: true,
    dual_table: None,
    max_identifier_length: Some(63),
    last_insert_id_sql: Some("SELECT lastval()"),
    types: TypeNames {
        bool: "BOOLEAN",
        int16: "SMALLINT",
        int32: "INTEGER",
        int64: "BIGINT",
        float: "REAL",
        double: "DOUBLE PRECISION",
        decimal: "NUMERIC",
        max_decimal_precision: 1000,
        string: "VARCHAR",
        unicode_string: "VARCHAR",
        text: "TEXT",
        unicode_text: "TEXT",
        max_string_length: 10_485_760,
        guid_string: "UUID",
        guid_binary: "BYTEA",
        datetime: "TIMESTAMP",
        date: "DATE",
        time: "TIME",
        bytes: "BYTEA",
    },
};

dialect_instance!(PostgresDialect, DialectKind::Postgres);

impl Dialect for PostgresDialect {
    dialect_identity!(DialectKind::Postgres, RULES);

    fn guid_literal(&self, value: &Uuid) -> String {
        match self.config().guid_format {
            GuidFormat::String => format!("'{value}'::uuid"),
            GuidFormat::Binary => self.bytes_literal(value.as_bytes()),
        }
    }

    fn bytes_literal(&self, value: &[u8]) -> String {
        format!("decode('{}', 'hex')", literal::hex(value))
    }

    /// Auto-increment keys use the serial pseudo-types.
    fn column_type(&self, field: &FieldDefinition) -> OrmResult<String> {
        if ddl::is_identity(self, field) {
            match field.field_type {
                FieldType::Int16 => return Ok("SMALLSERIAL".to_string()),
                FieldType::Int32 => return Ok("SERIAL".to_string()),
                FieldType::Int64 => return Ok("BIGSERIAL".to_string()),
                _ => {}
            }
        }
        ddl::column_type(self, field)
    }

    fn sequence_default(&self, sequence: &str) -> Option<String> {
        Some(format!(
            "nextval({})",
            literal::quote_string(&self.quote_name(sequence))
        ))
    }

    fn next_sequence_value_sql(&self, sequence: &str) -> OrmResult<String> {
        Ok(format!(
            "SELECT nextval({})",
            literal::quote_string(&self.quote_name(sequence))
        ))
    }

    fn alter_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String> {
        let column = self.quoted_column_name(field.field_name());
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {column} TYPE {}, ALTER COLUMN {column} {} NOT NULL;",
            self.quoted_table_name(model),
            ddl::column_type(self, field)?,
            if field.is_nullable { "DROP" } else { "SET" }
        ))
    }

    fn change_column_name_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
        old_name: &str,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            self.quoted_table_name(model),
            self.quoted_column_name(old_name),
            self.quoted_column_name(field.field_name())
        ))
    }

    fn select_from_procedure_statement(
        &self,
        procedure: &ModelDefinition,
        args: &dyn RowValues,
        output: &ModelDefinition,
        filter: &str,
    ) -> OrmResult<String> {
        dml::select_from_procedure(self, procedure, args, output, filter)
    }

    fn execute_procedure_statement(
        &self,
        procedure: &ModelDefinition,
        args: &dyn RowValues,
    ) -> OrmResult<String> {
        Ok(format!(
            "CALL {}({})",
            self.quoted_table_name(procedure),
            dml::procedure_arguments(self, procedure, args)?.join(", ")
        ))
    }

    fn substring(&self, sql: &str, start: i64, len: Option<i64>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({sql} FROM {start} FOR {len})"),
            None => format!("SUBSTRING({sql} FROM {start})"),
        }
    }

    fn bitwise(&self, op: BinaryOp, left: &str, right: &str) -> String {
        match op {
            BinaryOp::BitXor => format!("({left} # {right})"),
            _ => format!("({left} {} {right})", op.sql_operator()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_identity() {
        let d = PostgresDialect::new();
        let id = FieldDefinition::new("Id", FieldType::Int64)
            .primary_key()
            .auto_increment();
        assert_eq!(d.column_definition(&id).unwrap(), "\"Id\" BIGSERIAL PRIMARY KEY");
    }

    #[test]
    fn test_bool_literals() {
        let d = PostgresDialect::new();
        assert_eq!(d.bool_literal(true), "true");
        assert_eq!(d.bool_literal(false), "false");
    }

    #[test]
    fn test_limit_offset() {
        let d = PostgresDialect::new();
        assert_eq!(d.limit_expression(Some(10), Some(100), true), "LIMIT 100 OFFSET 10");
        assert_eq!(d.limit_expression(Some(10), None, true), "OFFSET 10");
    }
}
