use super::rules::{DialectRules, Identity, LimitStyle, TypeNames};
use super::{Dialect, DialectKind, dialect_identity, dialect_instance};
use crate::error::{OrmError, OrmResult};
use crate::expr::BinaryOp;
use crate::model::{FieldDefinition, ModelDefinition};

static RULES: DialectRules = DialectRules {
    name: "SQLite",
    open_quote: '"',
    close_quote: '"',
    reserved_words: &[
        "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ANALYZE", "AND", "AS", "ASC",
        "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE",
        "CAST", "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE",
        "CROSS", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
        "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DROP", "EACH",
        "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL", "FOR",
        "FOREIGN", "FROM", "FULL", "GLOB", "GROUP", "HAVING", "IF", "IGNORE", "IMMEDIATE",
        "IN", "INDEX", "INDEXED", "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT",
        "INTO", "IS", "ISNULL", "JOIN", "KEY", "LEFT", "LIKE", "LIMIT", "MATCH", "NATURAL",
        "NO", "NOT", "NOTNULL", "NULL", "OF", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PLAN",
        "PRAGMA", "PRIMARY", "QUERY", "RAISE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX",
        "RELEASE", "RENAME", "REPLACE", "RESTRICT", "RIGHT", "ROLLBACK", "ROW", "SAVEPOINT",
        "SELECT", "SET", "TABLE", "TEMP", "TEMPORARY", "THEN", "TO", "TRANSACTION", "TRIGGER",
        "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
        "WHERE", "WITH", "WITHOUT",
    ],
    true_literal: "1",
    false_literal: "0",
    param_prefix: "@",
    limit_style: LimitStyle::CommaLimit,
    unbounded_rows: "-1",
    identity: Identity::Keyword("AUTOINCREMENT"),
    supports_sequences: false,
    dual_table: None,
    max_identifier_length: None,
    last_insert_id_sql: Some("SELECT last_insert_rowid()"),
    types: TypeNames {
        bool: "INTEGER",
        int16: "INTEGER",
        int32: "INTEGER",
        int64: "INTEGER",
        float: "REAL",
        double: "REAL",
        decimal: "DECIMAL",
        max_decimal_precision: 38,
        string: "VARCHAR",
        unicode_string: "NVARCHAR",
        text: "TEXT",
        unicode_text: "TEXT",
        max_string_length: 1_000_000,
        guid_string: "CHAR(36)",
        guid_binary: "BLOB",
        datetime: "DATETIME",
        date: "DATE",
        time: "TIME",
        bytes: "BLOB",
    },
};

dialect_instance!(SqliteDialect, DialectKind::Sqlite);

impl Dialect for SqliteDialect {
    dialect_identity!(DialectKind::Sqlite, RULES);

    fn alter_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String> {
        Err(OrmError::not_supported(format!(
            "SQLite cannot alter column {} of {}; rebuild the table instead",
            field.field_name(),
            model.model_name()
        )))
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

    fn substring(&self, sql: &str, start: i64, len: Option<i64>) -> String {
        match len {
            Some(len) => format!("SUBSTR({sql}, {start}, {len})"),
            None => format!("SUBSTR({sql}, {start})"),
        }
    }

    fn modulo(&self, left: &str, right: &str) -> String {
        format!("({left} % {right})")
    }

    fn bitwise(&self, op: BinaryOp, left: &str, right: &str) -> String {
        match op {
            // no XOR operator
            BinaryOp::BitXor => format!("(({left} | {right}) - ({left} & {right}))"),
            _ => format!("({left} {} {right})", op.sql_operator()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    #[test]
    fn test_limit_forms() {
        let d = SqliteDialect::new();
        assert_eq!(d.limit_expression(Some(10), Some(100), false), "LIMIT 10,100");
        assert_eq!(d.limit_expression(None, Some(5), false), "LIMIT 5");
        assert_eq!(d.limit_expression(Some(3), None, false), "LIMIT 3,-1");
        assert_eq!(d.limit_expression(None, None, false), "");
    }

    #[test]
    fn test_alter_column_not_supported() {
        let d = SqliteDialect::new();
        let model = ModelDefinition::builder("Person")
            .field(FieldDefinition::new("Id", FieldType::Int32))
            .build()
            .unwrap();
        let err = d
            .alter_column_statement(&model, &model.field_definitions[0])
            .unwrap_err();
        assert!(err.is_not_supported());
    }
}
