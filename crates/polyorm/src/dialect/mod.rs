//! Dialect providers.
//!
//! A [`Dialect`] renders identifiers, literals, DDL, row-level DML and query
//! fragments for one database. Most behavior lives in default methods driven by
//! the static [`DialectRules`] table; each backend overrides only what differs.
//!
//! Instances are immutable and shared as `Arc<dyn Dialect>`. To change a
//! setting, derive a new instance with [`Dialect::with_config`].

pub mod config;
pub mod ddl;
pub mod dml;
pub mod literal;
pub mod rules;

mod firebird;
mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use config::{DialectConfig, DuplicateSequencePolicy, GuidFormat, QuoteMode};
pub use firebird::FirebirdDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use rules::{DialectRules, Identity, LimitStyle, TypeNames};
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::command::Command;
use crate::error::{OrmError, OrmResult};
use crate::expr::BinaryOp;
use crate::model::{FieldDefinition, FieldType, ModelDefinition, RowValues};
use crate::value::Value;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Supported databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Firebird,
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgresql")]
    Postgres,
    #[serde(alias = "mssql")]
    SqlServer,
    Sqlite,
}

impl DialectKind {
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Firebird,
        DialectKind::MySql,
        DialectKind::Postgres,
        DialectKind::SqlServer,
        DialectKind::Sqlite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Firebird => "firebird",
            DialectKind::MySql => "mysql",
            DialectKind::Postgres => "postgres",
            DialectKind::SqlServer => "sqlserver",
            DialectKind::Sqlite => "sqlite",
        }
    }

    /// Configuration a fresh instance of this dialect starts with.
    pub fn default_config(&self) -> DialectConfig {
        let config = DialectConfig::default();
        match self {
            DialectKind::Firebird => config
                .with_quote_mode(QuoteMode::Reserved)
                .with_guid_format(GuidFormat::Binary)
                .with_duplicate_sequence_policy(DuplicateSequencePolicy::Ignore),
            _ => config,
        }
    }

    /// Create an instance, with the kind's default configuration if none is given.
    pub fn create(&self, config: Option<DialectConfig>) -> Arc<dyn Dialect> {
        let config = config.unwrap_or_else(|| self.default_config());
        match self {
            DialectKind::Firebird => Arc::new(FirebirdDialect::with(config)),
            DialectKind::MySql => Arc::new(MySqlDialect::with(config)),
            DialectKind::Postgres => Arc::new(PostgresDialect::with(config)),
            DialectKind::SqlServer => Arc::new(SqlServerDialect::with(config)),
            DialectKind::Sqlite => Arc::new(SqliteDialect::with(config)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebird" | "fb" => Ok(DialectKind::Firebird),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "sqlserver" | "mssql" => Ok(DialectKind::SqlServer),
            "sqlite" => Ok(DialectKind::Sqlite),
            other => Err(OrmError::config(format!("unknown dialect `{other}`"))),
        }
    }
}

/// Create a dialect instance.
pub fn create_dialect(kind: DialectKind, config: Option<DialectConfig>) -> Arc<dyn Dialect> {
    kind.create(config)
}

/// Last sequence value fetched by an insert on this instance.
#[derive(Debug, Default)]
pub struct SequenceCache {
    last: Mutex<Option<i64>>,
}

impl SequenceCache {
    pub fn store(&self, value: i64) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    pub fn last(&self) -> Option<i64> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// SQL rendering for one database.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    fn rules(&self) -> &'static DialectRules;

    fn config(&self) -> &DialectConfig;

    /// New instance of the same dialect with another configuration.
    fn with_config(&self, config: DialectConfig) -> Arc<dyn Dialect>;

    fn sequence_cache(&self) -> &SequenceCache;

    // ---- identifiers ------------------------------------------------------

    fn is_reserved(&self, name: &str) -> bool {
        self.rules().is_reserved(name)
    }

    /// Unconditionally quote `name`, doubling embedded closing quotes.
    fn escape_name(&self, name: &str) -> String {
        let rules = self.rules();
        let close = rules.close_quote;
        let mut out = String::with_capacity(name.len() + 2);
        out.push(rules.open_quote);
        for ch in name.chars() {
            if ch == close {
                out.push(close);
            }
            out.push(ch);
        }
        out.push(close);
        out
    }

    /// Quote `name` if the quote mode, a reserved-word collision or its
    /// characters require it.
    fn quote_name(&self, name: &str) -> String {
        let plain = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if self.config().quote_mode == QuoteMode::Always || !plain || self.is_reserved(name) {
            self.escape_name(name)
        } else {
            name.to_string()
        }
    }

    /// Table name after the naming strategy, unquoted.
    fn table_name(&self, model: &ModelDefinition) -> String {
        self.config().naming_strategy.table_name(model.model_name())
    }

    /// Quoted table name, schema-qualified when the model has a schema.
    fn quoted_table_name(&self, model: &ModelDefinition) -> String {
        let table = self.quote_name(&self.table_name(model));
        match &model.schema {
            Some(schema) => format!("{}.{}", self.quote_name(schema), table),
            None => table,
        }
    }

    /// Column name after the naming strategy, unquoted.
    fn column_name(&self, field_name: &str) -> String {
        self.config().naming_strategy.column_name(field_name)
    }

    fn quoted_column_name(&self, field_name: &str) -> String {
        self.quote_name(&self.column_name(field_name))
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("{}{index}", self.rules().param_prefix)
    }

    // ---- literals ---------------------------------------------------------

    fn bool_literal(&self, value: bool) -> &'static str {
        let rules = self.rules();
        if value {
            rules.true_literal
        } else {
            rules.false_literal
        }
    }

    fn string_literal(&self, value: &str) -> String {
        literal::quote_string(value)
    }

    fn guid_literal(&self, value: &Uuid) -> String {
        match self.config().guid_format {
            GuidFormat::String => format!("'{value}'"),
            GuidFormat::Binary => self.bytes_literal(value.as_bytes()),
        }
    }

    fn bytes_literal(&self, value: &[u8]) -> String {
        format!("X'{}'", literal::hex(value))
    }

    fn datetime_literal(&self, value: &NaiveDateTime) -> String {
        literal::quote_string(&literal::format_datetime(value))
    }

    /// Render a value as an inline literal.
    fn quoted_value(&self, value: &Value, field_type: Option<&FieldType>) -> OrmResult<String> {
        literal::quoted_value(self, value, field_type)
    }

    /// Render a value for a specific field, checking decimal scale.
    fn field_value(&self, field: &FieldDefinition, value: &Value) -> OrmResult<String> {
        literal::field_value(self, field, value)
    }

    // ---- DDL --------------------------------------------------------------

    fn column_type(&self, field: &FieldDefinition) -> OrmResult<String> {
        ddl::column_type(self, field)
    }

    fn default_clause(&self, default: &str) -> String {
        format!(" DEFAULT {default}")
    }

    fn column_definition(&self, field: &FieldDefinition) -> OrmResult<String> {
        ddl::column_definition(self, field)
    }

    fn create_table_statement(&self, model: &ModelDefinition) -> OrmResult<String> {
        ddl::create_table(self, model)
    }

    fn drop_table_statement(&self, model: &ModelDefinition) -> String {
        format!("DROP TABLE {};", self.quoted_table_name(model))
    }

    fn index_name(&self, model: &ModelDefinition, unique: bool, columns: &[String]) -> String {
        ddl::index_name(self, model, unique, columns)
    }

    fn create_index_statements(&self, model: &ModelDefinition) -> Vec<String> {
        ddl::create_indexes(self, model)
    }

    /// Sequence feeding `field`, if this dialect uses one for it.
    fn sequence_name(&self, model: &ModelDefinition, field: &FieldDefinition) -> Option<String> {
        let rules = self.rules();
        if let Some(sequence) = &field.sequence {
            return rules.supports_sequences.then(|| sequence.clone());
        }
        (field.auto_increment && rules.identity == Identity::Generator)
            .then(|| ddl::generator_name(self, model, field))
    }

    fn sequence_names(&self, model: &ModelDefinition) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in model.fields().filter_map(|f| self.sequence_name(model, f)) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn create_sequence_statements(&self, model: &ModelDefinition) -> Vec<String> {
        self.sequence_names(model)
            .iter()
            .map(|name| format!("CREATE SEQUENCE {};", self.quote_name(name)))
            .collect()
    }

    /// Column default drawing from `sequence`, for inserts that leave the
    /// column out.
    fn sequence_default(&self, _sequence: &str) -> Option<String> {
        None
    }

    /// Query returning the next value of `sequence`.
    fn next_sequence_value_sql(&self, sequence: &str) -> OrmResult<String> {
        Err(OrmError::not_supported(format!(
            "{} has no sequences (requested {sequence})",
            self.rules().name
        )))
    }

    fn add_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {};",
            self.quoted_table_name(model),
            self.column_definition(field)?
        ))
    }

    fn alter_column_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> OrmResult<String>;

    fn change_column_name_statement(
        &self,
        model: &ModelDefinition,
        field: &FieldDefinition,
        old_name: &str,
    ) -> OrmResult<String>;

    // ---- DML --------------------------------------------------------------

    /// `INSERT` for one row. With `cmd`, sequence-backed fields are fetched,
    /// written back into `row` and included.
    fn insert_row_statement(
        &self,
        model: &ModelDefinition,
        row: &mut dyn RowValues,
        insert_fields: &[String],
        cmd: Option<&mut dyn Command>,
    ) -> OrmResult<String> {
        dml::insert_row(self, model, row, insert_fields, cmd)
    }

    fn insert_default_values(&self, quoted_table: &str) -> String {
        format!("INSERT INTO {quoted_table} DEFAULT VALUES")
    }

    fn update_row_statement(
        &self,
        model: &ModelDefinition,
        row: &dyn RowValues,
        update_fields: &[String],
    ) -> OrmResult<String> {
        dml::update_row(self, model, row, update_fields)
    }

    fn delete_row_statement(
        &self,
        model: &ModelDefinition,
        row: &dyn RowValues,
    ) -> OrmResult<String> {
        dml::delete_row(self, model, row)
    }

    /// Query returning whether any row matches `filter`.
    fn exists_statement(&self, model: &ModelDefinition, filter: &str) -> String {
        format!(
            "SELECT EXISTS(SELECT 1 FROM {}{})",
            self.quoted_table_name(model),
            where_suffix(filter)
        )
    }

    fn select_from_procedure_statement(
        &self,
        procedure: &ModelDefinition,
        _args: &dyn RowValues,
        _output: &ModelDefinition,
        _filter: &str,
    ) -> OrmResult<String> {
        Err(OrmError::not_supported(format!(
            "{} cannot select from procedure {}",
            self.rules().name,
            procedure.model_name()
        )))
    }

    fn execute_procedure_statement(
        &self,
        procedure: &ModelDefinition,
        _args: &dyn RowValues,
    ) -> OrmResult<String> {
        Err(OrmError::not_supported(format!(
            "{} cannot execute procedure {}",
            self.rules().name,
            procedure.model_name()
        )))
    }

    /// Identity generated by the last insert on `cmd`'s connection.
    fn last_insert_id(&self, cmd: &mut dyn Command) -> OrmResult<i64> {
        let sql = self.rules().last_insert_id_sql.ok_or_else(|| {
            OrmError::not_supported(format!("{} has no last-insert-id query", self.rules().name))
        })?;
        let value = cmd.scalar(sql, &crate::command::Params::new())?;
        value.as_i64().ok_or_else(|| {
            OrmError::command(format!("{sql} returned a {} value", value.kind()))
        })
    }

    // ---- query fragments --------------------------------------------------

    /// Paging clause, empty when neither bound is set.
    fn limit_expression(&self, skip: Option<usize>, rows: Option<usize>, has_order_by: bool) -> String {
        let rules = self.rules();
        match (skip, rows) {
            (None, None) => String::new(),
            _ => match rules.limit_style {
                LimitStyle::CommaLimit => match (skip, rows) {
                    (None, Some(rows)) => format!("LIMIT {rows}"),
                    (Some(skip), Some(rows)) => format!("LIMIT {skip},{rows}"),
                    (Some(skip), None) => format!("LIMIT {skip},{}", rules.unbounded_rows),
                    (None, None) => String::new(),
                },
                LimitStyle::LimitOffset => match (skip, rows) {
                    (None, Some(rows)) => format!("LIMIT {rows}"),
                    (Some(skip), Some(rows)) => format!("LIMIT {rows} OFFSET {skip}"),
                    (Some(skip), None) => format!("OFFSET {skip}"),
                    (None, None) => String::new(),
                },
                LimitStyle::OffsetFetch => {
                    let mut sql = String::new();
                    if !has_order_by {
                        sql.push_str("ORDER BY (SELECT NULL) ");
                    }
                    sql.push_str(&format!("OFFSET {} ROWS", skip.unwrap_or(0)));
                    if let Some(rows) = rows {
                        sql.push_str(&format!(" FETCH NEXT {rows} ROWS ONLY"));
                    }
                    sql
                }
                LimitStyle::Rows => match (skip, rows) {
                    (None, Some(rows)) => format!("ROWS {rows}"),
                    (Some(skip), Some(rows)) => {
                        // past BIGINT the range is unbounded
                        let last = skip
                            .checked_add(rows)
                            .filter(|last| i64::try_from(*last).is_ok())
                            .map_or_else(|| rules.unbounded_rows.to_string(), |last| last.to_string());
                        format!("ROWS {} TO {last}", skip.saturating_add(1))
                    }
                    (Some(skip), None) => {
                        format!("ROWS {} TO {}", skip.saturating_add(1), rules.unbounded_rows)
                    }
                    (None, None) => String::new(),
                },
            },
        }
    }

    fn upper(&self, sql: &str) -> String {
        format!("UPPER({sql})")
    }

    fn lower(&self, sql: &str) -> String {
        format!("LOWER({sql})")
    }

    fn trim(&self, sql: &str) -> String {
        format!("TRIM({sql})")
    }

    fn ltrim(&self, sql: &str) -> String {
        format!("LTRIM({sql})")
    }

    fn rtrim(&self, sql: &str) -> String {
        format!("RTRIM({sql})")
    }

    /// Substring with a 1-based `start`.
    fn substring(&self, sql: &str, start: i64, len: Option<i64>) -> String {
        match len {
            Some(len) => format!("SUBSTRING({sql}, {start}, {len})"),
            None => format!("SUBSTRING({sql}, {start})"),
        }
    }

    fn modulo(&self, left: &str, right: &str) -> String {
        format!("MOD({left},{right})")
    }

    fn coalesce(&self, left: &str, right: &str) -> String {
        format!("COALESCE({left},{right})")
    }

    fn bitwise(&self, op: BinaryOp, left: &str, right: &str) -> String {
        format!("({left} {} {right})", op.sql_operator())
    }

    fn concat(&self, left: &str, right: &str) -> String {
        format!("({left} || {right})")
    }
}

pub(crate) fn where_suffix(filter: &str) -> String {
    let filter = filter.trim();
    if filter.is_empty() {
        String::new()
    } else {
        format!(" WHERE {filter}")
    }
}

/// Boilerplate shared by every backend: configuration, sequence cache and the
/// identity parts of [`Dialect`].
macro_rules! dialect_instance {
    ($name:ident, $kind:expr) => {
        #[derive(Debug)]
        pub struct $name {
            config: $crate::dialect::DialectConfig,
            sequences: $crate::dialect::SequenceCache,
        }

        impl $name {
            /// Instance with this dialect's default configuration.
            pub fn new() -> Self {
                Self::with($kind.default_config())
            }

            pub fn with(config: $crate::dialect::DialectConfig) -> Self {
                Self {
                    config,
                    sequences: $crate::dialect::SequenceCache::default(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// The identity methods of [`Dialect`], expanded inside each backend's impl.
macro_rules! dialect_identity {
    ($kind:expr, $rules:expr) => {
        fn kind(&self) -> $crate::dialect::DialectKind {
            $kind
        }

        fn rules(&self) -> &'static $crate::dialect::DialectRules {
            &$rules
        }

        fn config(&self) -> &$crate::dialect::DialectConfig {
            &self.config
        }

        fn with_config(
            &self,
            config: $crate::dialect::DialectConfig,
        ) -> std::sync::Arc<dyn $crate::dialect::Dialect> {
            std::sync::Arc::new(Self::with(config))
        }

        fn sequence_cache(&self) -> &$crate::dialect::SequenceCache {
            &self.sequences
        }
    };
}

pub(crate) use dialect_identity;
pub(crate) use dialect_instance;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("mssql".parse::<DialectKind>().unwrap(), DialectKind::SqlServer);
        assert!("oracle".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_with_config_leaves_original_untouched() {
        let sqlite = create_dialect(DialectKind::Sqlite, None);
        let reserved = sqlite.with_config(
            DialectKind::Sqlite
                .default_config()
                .with_quote_mode(QuoteMode::Reserved),
        );
        assert_eq!(sqlite.quote_name("Name"), "\"Name\"");
        assert_eq!(reserved.quote_name("Name"), "Name");
        assert_eq!(reserved.quote_name("order"), "\"order\"");
    }

    #[test]
    fn test_escape_name_doubles_close_quote() {
        let sqlserver = create_dialect(DialectKind::SqlServer, None);
        assert_eq!(sqlserver.escape_name("a]b"), "[a]]b]");
    }

    #[test]
    fn test_firebird_defaults() {
        let config = DialectKind::Firebird.default_config();
        assert_eq!(config.quote_mode, QuoteMode::Reserved);
        assert_eq!(config.duplicate_sequence_policy, DuplicateSequencePolicy::Ignore);
    }

    #[test]
    fn test_sequence_cache() {
        let cache = SequenceCache::default();
        assert_eq!(cache.last(), None);
        cache.store(42);
        assert_eq!(cache.last(), Some(42));
    }
}
