use super::rules::{DialectRules, Identity, LimitStyle, TypeNames};
use super::{Dialect, DialectKind, ddl, dialect_identity, dialect_instance, dml, literal, where_suffix};
use crate::command::Command;
use crate::error::{OrmError, OrmResult};
use crate::expr::BinaryOp;
use crate::model::{FieldDefinition, FieldType, ModelDefinition, RowValues};

static RULES: DialectRules = DialectRules {
    name: "Firebird",
    open_quote: '"',
    close_quote: '"',
    reserved_words: &[
        "ACTIVE", "ADD", "ADMIN", "AFTER", "ALL", "ALTER", "AND", "ANY", "AS", "ASC",
        "ASCENDING", "AT", "AUTO", "AVG", "BEFORE", "BEGIN", "BETWEEN", "BIGINT", "BIT_LENGTH",
        "BLOB", "BOOLEAN", "BOTH", "BY", "CASE", "CAST", "CHAR", "CHARACTER", "CHECK",
        "CLOSE", "COLLATE", "COLUMN", "COMMIT", "COMPUTED", "CONNECT", "CONSTRAINT", "COUNT",
        "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
        "CURRENT_USER", "CURSOR", "DATA", "DATE", "DAY", "DEC", "DECIMAL", "DECLARE",
        "DEFAULT", "DELETE", "DESC", "DESCENDING", "DISTINCT", "DO", "DOMAIN", "DOUBLE",
        "DROP", "ELSE", "END", "ENTRY_POINT", "ESCAPE", "EXCEPTION", "EXECUTE", "EXISTS",
        "EXIT", "EXTERNAL", "EXTRACT", "FALSE", "FETCH", "FILTER", "FLOAT", "FOR", "FOREIGN",
        "FROM", "FULL", "FUNCTION", "GDSCODE", "GENERATOR", "GEN_ID", "GLOBAL", "GRANT",
        "GROUP", "HAVING", "HOUR", "IF", "IN", "INACTIVE", "INDEX", "INNER", "INSERT", "INT",
        "INTEGER", "INTO", "IS", "JOIN", "KEY", "LEADING", "LEFT", "LIKE", "LONG", "LOWER",
        "MAX", "MAXIMUM_SEGMENT", "MERGE", "MIN", "MINUTE", "MONTH", "NATIONAL", "NATURAL",
        "NCHAR", "NO", "NOT", "NULL", "NUMERIC", "OCTET_LENGTH", "OF", "ON", "ONLY", "OPEN",
        "OR", "ORDER", "OUTER", "PARAMETER", "PASSWORD", "PLAN", "POSITION", "POST_EVENT",
        "PRECISION", "PRIMARY", "PROCEDURE", "RDB$DB_KEY", "REAL", "RECORD_VERSION",
        "RECREATE", "REFERENCES", "RELEASE", "RETURN", "RETURNING_VALUES", "RETURNS",
        "REVOKE", "RIGHT", "ROLLBACK", "ROWS", "ROW_COUNT", "SAVEPOINT", "SECOND", "SELECT",
        "SENSITIVE", "SET", "SIMILAR", "SMALLINT", "SOME", "SQLCODE", "SQLSTATE", "START",
        "SUM", "TABLE", "THEN", "TIME", "TIMESTAMP", "TO", "TRAILING", "TRIGGER", "TRIM",
        "TRUE", "TYPE", "UNION", "UNIQUE", "UNKNOWN", "UPDATE", "UPPER", "USER", "USING",
        "VALUE", "VALUES", "VARCHAR", "VARIABLE", "VARYING", "VIEW", "WHEN", "WHERE", "WHILE",
        "WITH", "YEAR",
    ],
    true_literal: "1",
    false_literal: "0",
    param_prefix: "@",
    limit_style: LimitStyle::Rows,
    unbounded_rows: "2147483647",
    identity: Identity::Generator,
    supports_sequences: true,
    dual_table: Some("RDB$DATABASE"),
    max_identifier_length: Some(31),
    last_insert_id_sql: None,
    types: TypeNames {
        bool: "SMALLINT",
        int16: "SMALLINT",
        int32: "INTEGER",
        int64: "BIGINT",
        float: "FLOAT",
        double: "DOUBLE PRECISION",
        decimal: "DECIMAL",
        max_decimal_precision: 18,
        string: "VARCHAR",
        unicode_string: "VARCHAR",
        text: "BLOB SUB_TYPE TEXT",
        unicode_text: "BLOB SUB_TYPE TEXT CHARACTER SET UTF8",
        max_string_length: 32765,
        guid_string: "CHAR(36)",
        guid_binary: "CHAR(16) CHARACTER SET OCTETS",
        datetime: "TIMESTAMP",
        date: "DATE",
        time: "TIME",
        bytes: "BLOB SUB_TYPE BINARY",
    },
};

dialect_instance!(FirebirdDialect, DialectKind::Firebird);

impl Dialect for FirebirdDialect {
    dialect_identity!(DialectKind::Firebird, RULES);

    fn bytes_literal(&self, value: &[u8]) -> String {
        format!("x'{}'", literal::hex(value))
    }

    fn column_type(&self, field: &FieldDefinition) -> OrmResult<String> {
        let name = ddl::column_type(self, field)?;
        let sized_string = matches!(field.field_type, FieldType::String | FieldType::Enum(_))
            && name.starts_with(RULES.types.unicode_string);
        if self.config().use_unicode && sized_string {
            return Ok(format!("{name} CHARACTER SET UTF8"));
        }
        Ok(name)
    }

    /// `name TYPE [DEFAULT x] [NOT NULL] [PRIMARY KEY]`; nullable columns
    /// carry no `NULL` keyword.
    fn column_definition(&self, field: &FieldDefinition) -> OrmResult<String> {
        let mut sql = format!(
            "{} {}",
            self.quoted_column_name(field.field_name()),
            self.column_type(field)?
        );
        if let Some(default) = &field.default_value {
            sql.push_str(&self.default_clause(default));
        }
        if field.is_primary_key {
            sql.push_str(" NOT NULL PRIMARY KEY");
        } else if !field.is_nullable {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    fn create_sequence_statements(&self, model: &ModelDefinition) -> Vec<String> {
        self.sequence_names(model)
            .iter()
            .map(|name| format!("CREATE GENERATOR {};", self.quote_name(name)))
            .collect()
    }

    fn next_sequence_value_sql(&self, sequence: &str) -> OrmResult<String> {
        Ok(format!(
            "SELECT GEN_ID({}, 1) FROM RDB$DATABASE",
            self.quote_name(sequence)
        ))
    }

    /// The value fetched by the last sequence-backed insert on this instance.
    fn last_insert_id(&self, _cmd: &mut dyn Command) -> OrmResult<i64> {
        self.sequence_cache().last().ok_or_else(|| {
            OrmError::validation("no generator value has been fetched by an insert yet")
        })
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
            "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
            self.quoted_table_name(model),
            self.quoted_column_name(field.field_name()),
            self.column_type(field)?
        ))
    }

    fn change_column_name_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
        old_name: &str,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TO {};",
            self.quoted_table_name(model),
            self.quoted_column_name(old_name),
            self.quoted_column_name(field.field_name())
        ))
    }

    fn exists_statement(&self, model: &ModelDefinition, filter: &str) -> String {
        format!(
            "SELECT 1 FROM RDB$DATABASE WHERE EXISTS(SELECT 1 FROM {}{})",
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
            return Ok(format!("EXECUTE PROCEDURE {name}"));
        }
        Ok(format!("EXECUTE PROCEDURE {name}({})", args.join(", ")))
    }

    fn ltrim(&self, sql: &str) -> String {
        format!("TRIM(LEADING FROM {sql})")
    }

    fn rtrim(&self, sql: &str) -> String {
        format!("TRIM(TRAILING FROM {sql})")
    }

    fn substring(&self, sql: &str, start: i64, len: Option<i64>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({sql} FROM {start} FOR {len})"),
            None => format!("SUBSTRING({sql} FROM {start})"),
        }
    }

    fn bitwise(&self, op: BinaryOp, left: &str, right: &str) -> String {
        let func = match op {
            BinaryOp::BitAnd => "BIN_AND",
            BinaryOp::BitOr => "BIN_OR",
            BinaryOp::BitXor => "BIN_XOR",
            BinaryOp::Shl => "BIN_SHL",
            _ => "BIN_SHR",
        };
        format!("{func}({left}, {right})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ModelDefinition {
        ModelDefinition::builder("Person")
            .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
            .field(FieldDefinition::new("Name", FieldType::String).required())
            .build()
            .unwrap()
    }

    #[test]
    fn test_generator_for_auto_increment() {
        let d = FirebirdDialect::new();
        assert_eq!(
            d.create_sequence_statements(&person()),
            ["CREATE GENERATOR Person_Id_GEN;"]
        );
        assert_eq!(
            d.next_sequence_value_sql("Person_Id_GEN").unwrap(),
            "SELECT GEN_ID(Person_Id_GEN, 1) FROM RDB$DATABASE"
        );
    }

    #[test]
    fn test_rows_paging() {
        let d = FirebirdDialect::new();
        assert_eq!(d.limit_expression(Some(10), Some(100), false), "ROWS 11 TO 110");
        assert_eq!(d.limit_expression(None, Some(5), false), "ROWS 5");
    }

    #[test]
    fn test_rows_paging_clamps_huge_bounds() {
        let d = FirebirdDialect::new();
        assert_eq!(
            d.limit_expression(Some(10), Some(usize::MAX), false),
            "ROWS 11 TO 2147483647"
        );
        let sql = crate::visitor::SqlExpression::new(std::sync::Arc::new(d), std::sync::Arc::new(person()))
            .limit(10, usize::MAX)
            .to_select_statement();
        assert!(sql.ends_with("ROWS 11 TO 2147483647"), "{sql}");
    }

    #[test]
    fn test_column_definition_has_no_null_keyword() {
        let d = FirebirdDialect::new();
        let nullable = FieldDefinition::new("Nick", FieldType::String).length(20);
        assert_eq!(d.column_definition(&nullable).unwrap(), "Nick VARCHAR(20)");
        let with_default = FieldDefinition::new("Age", FieldType::Int32).default_value("0");
        assert_eq!(
            d.column_definition(&with_default).unwrap(),
            "Age INTEGER DEFAULT 0 NOT NULL"
        );
    }

    #[test]
    fn test_last_insert_id_requires_fetched_value() {
        struct NoCommand;
        impl Command for NoCommand {
            fn execute(&mut self, _: &str, _: &crate::command::Params) -> OrmResult<u64> {
                Ok(0)
            }
            fn scalar(
                &mut self,
                _: &str,
                _: &crate::command::Params,
            ) -> OrmResult<crate::value::Value> {
                Ok(crate::value::Value::Null)
            }
        }

        let d = FirebirdDialect::new();
        assert!(d.last_insert_id(&mut NoCommand).is_err());
        d.sequence_cache().store(9);
        assert_eq!(d.last_insert_id(&mut NoCommand).unwrap(), 9);
    }
}
