use super::config::GuidFormat;
use super::rules::{DialectRules, Identity, LimitStyle, TypeNames};
use super::{Dialect, DialectKind, dialect_identity, dialect_instance, dml, literal, where_suffix};
use crate::error::OrmResult;
use crate::expr::BinaryOp;
use crate::model::{FieldDefinition, ModelDefinition, RowValues};
use uuid::Uuid;

static RULES: DialectRules = DialectRules {
    name: "SQL Server",
    open_quote: '[',
    close_quote: ']',
    reserved_words: &[
        "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AUTHORIZATION", "BACKUP", "BEGIN",
        "BETWEEN", "BREAK", "BROWSE", "BULK", "BY", "CASCADE", "CASE", "CHECK", "CHECKPOINT",
        "CLOSE", "CLUSTERED", "COALESCE", "COLLATE", "COLUMN", "COMMIT", "COMPUTE",
        "CONSTRAINT", "CONTAINS", "CONTINUE", "CONVERT", "CREATE", "CROSS", "CURRENT",
        "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "CURSOR",
        "DATABASE", "DEALLOCATE", "DECLARE", "DEFAULT", "DELETE", "DENY", "DESC", "DISK",
        "DISTINCT", "DOUBLE", "DROP", "DUMP", "ELSE", "END", "ERRLVL", "ESCAPE", "EXCEPT",
        "EXEC", "EXECUTE", "EXISTS", "EXIT", "FETCH", "FILE", "FILLFACTOR", "FOR", "FOREIGN",
        "FREETEXT", "FROM", "FULL", "FUNCTION", "GOTO", "GRANT", "GROUP", "HAVING",
        "HOLDLOCK", "IDENTITY", "IF", "IN", "INDEX", "INNER", "INSERT", "INTERSECT", "INTO",
        "IS", "JOIN", "KEY", "KILL", "LEFT", "LIKE", "LINENO", "MERGE", "NATIONAL",
        "NOCHECK", "NONCLUSTERED", "NOT", "NULL", "NULLIF", "OF", "OFF", "OFFSETS", "ON",
        "OPEN", "OPTION", "OR", "ORDER", "OUTER", "OVER", "PERCENT", "PIVOT", "PLAN",
        "PRIMARY", "PRINT", "PROC", "PROCEDURE", "PUBLIC", "RAISERROR", "READ", "RECONFIGURE",
        "REFERENCES", "REPLICATION", "RESTORE", "RESTRICT", "RETURN", "REVERT", "REVOKE",
        "RIGHT", "ROLLBACK", "ROWCOUNT", "RULE", "SAVE", "SCHEMA", "SELECT", "SESSION_USER",
        "SET", "SHUTDOWN", "SOME", "STATISTICS", "SYSTEM_USER", "TABLE", "TEXTSIZE", "THEN",
        "TO", "TOP", "TRAN", "TRANSACTION", "TRIGGER", "TRUNCATE", "UNION", "UNIQUE",
        "UNPIVOT", "UPDATE", "USE", "USER", "VALUES", "VARYING", "VIEW", "WAITFOR", "WHEN",
        "WHERE", "WHILE", "WITH",
    ],
    true_literal: "1",
    false_literal: "0",
    param_prefix: "@",
    limit_style: LimitStyle::OffsetFetch,
    unbounded_rows: "",
    identity: Identity::Keyword("IDENTITY(1,1)"),
    supports_sequences: true,
    dual_table: None,
    max_identifier_length: Some(128),
    last_insert_id_sql: Some("SELECT SCOPE_IDENTITY()"),
    types: TypeNames {
        bool: "BIT",
        int16: "SMALLINT",
        int32: "INT",
        int64: "BIGINT",
        float: "REAL",
        double: "FLOAT",
        decimal: "DECIMAL",
        max_decimal_precision: 38,
        string: "VARCHAR",
        unicode_string: "NVARCHAR",
        text: "VARCHAR(MAX)",
        unicode_text: "NVARCHAR(MAX)",
        max_string_length: 8000,
        guid_string: "UNIQUEIDENTIFIER",
        guid_binary: "BINARY(16)",
        datetime: "DATETIME2(3)",
        date: "DATE",
        time: "TIME(3)",
        bytes: "VARBINARY(MAX)",
    },
};

dialect_instance!(SqlServerDialect, DialectKind::SqlServer);

impl Dialect for SqlServerDialect {
    dialect_identity!(DialectKind::SqlServer, RULES);

    fn string_literal(&self, value: &str) -> String {
        let quoted = literal::quote_string(value);
        if self.config().use_unicode {
            format!("N{quoted}")
        } else {
            quoted
        }
    }

    /// `uniqueidentifier` stores the first three groups little-endian.
    fn guid_literal(&self, value: &Uuid) -> String {
        match self.config().guid_format {
            GuidFormat::String => format!("CAST('{value}' AS UNIQUEIDENTIFIER)"),
            GuidFormat::Binary => self.bytes_literal(&value.to_bytes_le()),
        }
    }

    fn bytes_literal(&self, value: &[u8]) -> String {
        format!("0x{}", literal::hex(value))
    }

    fn default_clause(&self, default: &str) -> String {
        format!(" DEFAULT ({default})")
    }

    fn create_sequence_statements(&self, model: &ModelDefinition) -> Vec<String> {
        self.sequence_names(model)
            .iter()
            .map(|name| {
                format!(
                    "CREATE SEQUENCE {} AS BIGINT START WITH 1 INCREMENT BY 1;",
                    self.quote_name(name)
                )
            })
            .collect()
    }

    fn sequence_default(&self, sequence: &str) -> Option<String> {
        Some(format!("NEXT VALUE FOR {}", self.quote_name(sequence)))
    }

    fn next_sequence_value_sql(&self, sequence: &str) -> OrmResult<String> {
        Ok(format!("SELECT NEXT VALUE FOR {}", self.quote_name(sequence)))
    }

    fn add_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {};",
            self.quoted_table_name(model),
            self.column_definition(field)?
        ))
    }

    fn alter_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {};",
            self.quoted_table_name(model),
            self.quoted_column_name(field.field_name()),
            self.column_type(field)?,
            if field.is_nullable { "NULL" } else { "NOT NULL" }
        ))
    }

    fn change_column_name_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
        old_name: &str,
    ) -> OrmResult<String> {
        let mut object = self.table_name(model);
        if let Some(schema) = &model.schema {
            object = format!("{schema}.{object}");
        }
        Ok(format!(
            "EXEC sp_rename {}, {}, 'COLUMN';",
            literal::quote_string(&format!("{object}.{}", self.column_name(old_name))),
            literal::quote_string(&self.column_name(field.field_name()))
        ))
    }

    fn exists_statement(&self, model: &ModelDefinition, filter: &str) -> String {
        format!(
            "SELECT CASE WHEN EXISTS(SELECT 1 FROM {}{}) THEN 1 ELSE 0 END",
            self.quoted_table_name(model),
            where_suffix(filter)
        )
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
        let args = dml::procedure_arguments(self, procedure, args)?;
        let name = self.quoted_table_name(procedure);
        if args.is_empty() {
            return Ok(format!("EXEC {name}"));
        }
        Ok(format!("EXEC {name} {}", args.join(", ")))
    }

    fn trim(&self, sql: &str) -> String {
        format!("LTRIM(RTRIM({sql}))")
    }

    fn substring(&self, sql: &str, start: i64, len: Option<i64>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({sql}, {start}, {len})"),
            None => format!("SUBSTRING({sql}, {start}, LEN({sql}))"),
        }
    }

    fn modulo(&self, left: &str, right: &str) -> String {
        format!("({left} % {right})")
    }

    fn bitwise(&self, op: BinaryOp, left: &str, right: &str) -> String {
        match op {
            BinaryOp::Shl => format!("({left} * POWER(2, {right}))"),
            BinaryOp::Shr => format!("({left} / POWER(2, {right}))"),
            _ => format!("({left} {} {right})", op.sql_operator()),
        }
    }

    fn concat(&self, left: &str, right: &str) -> String {
        format!("({left} + {right})")
    }
}
