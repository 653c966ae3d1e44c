//! Per-instance dialect configuration.

use crate::naming::{AliasNamingStrategy, NamingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// When identifiers are wrapped in the dialect's quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Quote every table and column name.
    #[default]
    Always,
    /// Quote only names that collide with a reserved word.
    Reserved,
}

/// Literal form used for GUID values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidFormat {
    #[default]
    String,
    Binary,
}

/// What `create_table` does when creating a sequence fails because it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSequencePolicy {
    #[default]
    Fail,
    /// Log a warning and continue.
    Ignore,
}

/// Immutable configuration held by a dialect instance.
///
/// Use [`Dialect::with_config`](super::Dialect::with_config) to obtain an
/// instance with different settings; instances never change after creation.
#[derive(Debug, Clone)]
pub struct DialectConfig {
    pub quote_mode: QuoteMode,
    pub naming_strategy: Arc<dyn NamingStrategy>,
    /// Emit Unicode string types and literals.
    pub use_unicode: bool,
    pub default_string_length: u32,
    pub default_decimal_precision: u32,
    pub default_decimal_scale: u32,
    pub guid_format: GuidFormat,
    /// Compile values to bound parameters instead of inline literals.
    pub parameterized: bool,
    pub duplicate_sequence_policy: DuplicateSequencePolicy,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            quote_mode: QuoteMode::Always,
            naming_strategy: Arc::new(AliasNamingStrategy),
            use_unicode: false,
            default_string_length: 255,
            default_decimal_precision: 18,
            default_decimal_scale: 12,
            guid_format: GuidFormat::String,
            parameterized: false,
            duplicate_sequence_policy: DuplicateSequencePolicy::Fail,
        }
    }
}

impl DialectConfig {
    pub fn with_quote_mode(mut self, mode: QuoteMode) -> Self {
        self.quote_mode = mode;
        self
    }

    pub fn with_naming_strategy(mut self, strategy: impl NamingStrategy + 'static) -> Self {
        self.naming_strategy = Arc::new(strategy);
        self
    }

    pub fn with_unicode(mut self, use_unicode: bool) -> Self {
        self.use_unicode = use_unicode;
        self
    }

    pub fn with_default_string_length(mut self, length: u32) -> Self {
        self.default_string_length = length;
        self
    }

    pub fn with_decimal(mut self, precision: u32, scale: u32) -> Self {
        self.default_decimal_precision = precision;
        self.default_decimal_scale = scale;
        self
    }

    pub fn with_guid_format(mut self, format: GuidFormat) -> Self {
        self.guid_format = format;
        self
    }

    pub fn with_parameterized(mut self, parameterized: bool) -> Self {
        self.parameterized = parameterized;
        self
    }

    pub fn with_duplicate_sequence_policy(mut self, policy: DuplicateSequencePolicy) -> Self {
        self.duplicate_sequence_policy = policy;
        self
    }
}
