//! Naming strategies applied to table and column names before quoting.

use heck::ToSnakeCase;
use std::fmt::Debug;

/// Maps model and field names to database identifiers.
pub trait NamingStrategy: Send + Sync + Debug {
    fn table_name(&self, name: &str) -> String;
    fn column_name(&self, name: &str) -> String;
}

/// Use names exactly as declared (alias or source name).
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasNamingStrategy;

impl NamingStrategy for AliasNamingStrategy {
    fn table_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn column_name(&self, name: &str) -> String {
        name.to_string()
    }
}

/// `OrderLine` -> `order_line`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseNamingStrategy;

impl NamingStrategy for SnakeCaseNamingStrategy {
    fn table_name(&self, name: &str) -> String {
        name.to_snake_case()
    }

    fn column_name(&self, name: &str) -> String {
        name.to_snake_case()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LowerCaseNamingStrategy;

impl NamingStrategy for LowerCaseNamingStrategy {
    fn table_name(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn column_name(&self, name: &str) -> String {
        name.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpperCaseNamingStrategy;

impl NamingStrategy for UpperCaseNamingStrategy {
    fn table_name(&self, name: &str) -> String {
        name.to_uppercase()
    }

    fn column_name(&self, name: &str) -> String {
        name.to_uppercase()
    }
}

/// Prepends fixed prefixes to table and column names.
#[derive(Debug, Clone, Default)]
pub struct PrefixNamingStrategy {
    pub table_prefix: String,
    pub column_prefix: String,
}

impl PrefixNamingStrategy {
    pub fn new(table_prefix: impl Into<String>, column_prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into(),
            column_prefix: column_prefix.into(),
        }
    }
}

impl NamingStrategy for PrefixNamingStrategy {
    fn table_name(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }

    fn column_name(&self, name: &str) -> String {
        format!("{}{}", self.column_prefix, name)
    }
}
