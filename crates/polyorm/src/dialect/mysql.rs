use super::rules::{DialectRules, Identity, LimitStyle, TypeNames};
use super::{Dialect, DialectKind, dialect_identity, dialect_instance, dml, literal};
use crate::error::OrmResult;
use crate::model::{FieldDefinition, ModelDefinition, RowValues};

static RULES: DialectRules = DialectRules {
    name: "MySQL",
    open_quote: '`',
    close_quote: '`',
    reserved_words: &[
        "ACCESSIBLE", "ADD", "ALL", "ALTER", "ANALYZE", "AND", "AS", "ASC", "BEFORE",
        "BETWEEN", "BIGINT", "BINARY", "BLOB", "BOTH", "BY", "CALL", "CASCADE", "CASE",
        "CHANGE", "CHAR", "CHARACTER", "CHECK", "COLLATE", "COLUMN", "CONDITION",
        "CONSTRAINT", "CONTINUE", "CONVERT", "CREATE", "CROSS", "CURRENT_DATE",
        "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "CURSOR", "DATABASE",
        "DATABASES", "DEC", "DECIMAL", "DECLARE", "DEFAULT", "DELAYED", "DELETE", "DESC",
        "DESCRIBE", "DISTINCT", "DIV", "DOUBLE", "DROP", "DUAL", "EACH", "ELSE", "ELSEIF",
        "ENCLOSED", "ESCAPED", "EXISTS", "EXIT", "EXPLAIN", "FALSE", "FETCH", "FLOAT", "FOR",
        "FORCE", "FOREIGN", "FROM", "FULLTEXT", "GENERATED", "GRANT", "GROUP", "GROUPS",
        "HAVING", "IF", "IGNORE", "IN", "INDEX", "INNER", "INOUT", "INSERT", "INT",
        "INTEGER", "INTERVAL", "INTO", "IS", "ITERATE", "JOIN", "KEY", "KEYS", "KILL",
        "LEADING", "LEAVE", "LEFT", "LIKE", "LIMIT", "LINES", "LOAD", "LOCK", "LONG",
        "LOOP", "MATCH", "MOD", "NATURAL", "NOT", "NULL", "NUMERIC", "ON", "OPTION", "OR",
        "ORDER", "OUT", "OUTER", "PARTITION", "PRECISION", "PRIMARY", "PROCEDURE", "RANGE",
        "RANK", "READ", "REAL", "REFERENCES", "REGEXP", "RELEASE", "RENAME", "REPEAT",
        "REPLACE", "REQUIRE", "RESTRICT", "RETURN", "REVOKE", "RIGHT", "RLIKE", "ROW",
        "ROWS", "SCHEMA", "SELECT", "SET", "SHOW", "SMALLINT", "SPATIAL", "SQL", "TABLE",
        "THEN", "TINYINT", "TO", "TRAILING", "TRIGGER", "TRUE", "UNION", "UNIQUE", "UNLOCK",
        "UNSIGNED", "UPDATE", "USAGE", "USE", "USING", "VALUES", "VARCHAR", "WHEN", "WHERE",
        "WHILE", "WITH", "WRITE", "XOR", "ZEROFILL",
    ],
    true_literal: "1",
    false_literal: "0",
    param_prefix: "@",
    limit_style: LimitStyle::CommaLimit,
    unbounded_rows: "18446744073709551615",
    identity: Identity::Keyword("AUTO_INCREMENT"),
    supports_sequences: false,
    dual_table: Some("DUAL"),
    max_identifier_length: Some(64),
    last_insert_id_sql: Some("SELECT LAST_INSERT_ID()"),
    types: TypeNames {
        bool: "TINYINT(1)",
        int16: "SMALLINT",
        int32: "INT",
        int64: "BIGINT",
        float: "FLOAT",
        double: "DOUBLE",
        decimal: "DECIMAL",
        max_decimal_precision: 65,
        string: "VARCHAR",
        unicode_string: "VARCHAR",
        text: "TEXT",
        unicode_text: "TEXT",
        max_string_length: 16383,
        guid_string: "CHAR(36)",
        guid_binary: "BINARY(16)",
        datetime: "DATETIME(3)",
        date: "DATE",
        time: "TIME(3)",
        bytes: "LONGBLOB",
    },
};

dialect_instance!(MySqlDialect, DialectKind::MySql);

impl Dialect for MySqlDialect {
    dialect_identity!(DialectKind::MySql, RULES);

    /// Backslash is an escape character in MySQL string literals.
    fn string_literal(&self, value: &str) -> String {
        literal::quote_string(&value.replace('\\', "\\\\"))
    }

    fn bytes_literal(&self, value: &[u8]) -> String {
        if value.is_empty() {
            return "X''".to_string();
        }
        format!("0x{}", literal::hex(value))
    }

    fn insert_default_values(&self, quoted_table: &str) -> String {
        format!("INSERT INTO {quoted_table} () VALUES ()")
    }

    fn alter_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} MODIFY COLUMN {};",
            self.quoted_table_name(model),
            self.column_definition(field)?
        ))
    }

    fn change_column_name_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
        old_name: &str,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} CHANGE COLUMN {} {};",
            self.quoted_table_name(model),
            self.quoted_column_name(old_name),
            self.column_definition(field)?
        ))
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

    fn concat(&self, left: &str, right: &str) -> String {
        format!("CONCAT({left}, {right})")
    }
}
