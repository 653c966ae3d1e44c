//! Dialect settings loaded from TOML or JSON.
//!
//! Every key is optional; unset keys keep the dialect kind's defaults.
//!
//! ```toml
//! kind = "firebird"
//! quote = "reserved"
//! naming = "snake_case"
//! use_unicode = true
//! ```

use crate::dialect::{
    Dialect, DialectConfig, DialectKind, DuplicateSequencePolicy, GuidFormat, QuoteMode,
};
use crate::error::{OrmError, OrmResult};
use crate::naming::{
    AliasNamingStrategy, LowerCaseNamingStrategy, PrefixNamingStrategy, SnakeCaseNamingStrategy,
    UpperCaseNamingStrategy,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingKind {
    #[default]
    Alias,
    SnakeCase,
    LowerCase,
    UpperCase,
    Prefix,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialectSettings {
    pub kind: Option<DialectKind>,
    pub quote: Option<QuoteMode>,
    pub naming: Option<NamingKind>,
    pub table_prefix: Option<String>,
    pub column_prefix: Option<String>,
    pub use_unicode: Option<bool>,
    pub default_string_length: Option<u32>,
    pub decimal_precision: Option<u32>,
    pub decimal_scale: Option<u32>,
    pub guid_format: Option<GuidFormat>,
    pub parameterized: Option<bool>,
    pub duplicate_sequence_policy: Option<DuplicateSequencePolicy>,
}

impl DialectSettings {
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(raw: &str) -> OrmResult<Self> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> OrmResult<()> {
        if self.default_string_length == Some(0) {
            return Err(OrmError::config("default_string_length must be positive"));
        }
        if let (Some(precision), Some(scale)) = (self.decimal_precision, self.decimal_scale) {
            if scale > precision {
                return Err(OrmError::config(format!(
                    "decimal_scale {scale} exceeds decimal_precision {precision}"
                )));
            }
        }
        let has_prefix = self.table_prefix.is_some() || self.column_prefix.is_some();
        if has_prefix && self.naming != Some(NamingKind::Prefix) {
            return Err(OrmError::config(
                "table_prefix and column_prefix require naming = \"prefix\"",
            ));
        }
        Ok(())
    }

    /// Settings from `self`, with unset keys taken from `base`.
    pub fn overlay(&self, base: &DialectSettings) -> DialectSettings {
        DialectSettings {
            kind: self.kind.or(base.kind),
            quote: self.quote.or(base.quote),
            naming: self.naming.or(base.naming),
            table_prefix: self.table_prefix.clone().or_else(|| base.table_prefix.clone()),
            column_prefix: self
                .column_prefix
                .clone()
                .or_else(|| base.column_prefix.clone()),
            use_unicode: self.use_unicode.or(base.use_unicode),
            default_string_length: self.default_string_length.or(base.default_string_length),
            decimal_precision: self.decimal_precision.or(base.decimal_precision),
            decimal_scale: self.decimal_scale.or(base.decimal_scale),
            guid_format: self.guid_format.or(base.guid_format),
            parameterized: self.parameterized.or(base.parameterized),
            duplicate_sequence_policy: self
                .duplicate_sequence_policy
                .or(base.duplicate_sequence_policy),
        }
    }

    /// Dialect kind, falling back to `default` when the settings name none.
    pub fn kind_or(&self, default: DialectKind) -> DialectKind {
        self.kind.unwrap_or(default)
    }

    /// Apply the settings on top of `kind`'s default configuration.
    pub fn to_config(&self, kind: DialectKind) -> DialectConfig {
        let mut config = kind.default_config();
        if let Some(quote) = self.quote {
            config = config.with_quote_mode(quote);
        }
        if let Some(naming) = self.naming {
            config.naming_strategy = match naming {
                NamingKind::Alias => Arc::new(AliasNamingStrategy),
                NamingKind::SnakeCase => Arc::new(SnakeCaseNamingStrategy),
                NamingKind::LowerCase => Arc::new(LowerCaseNamingStrategy),
                NamingKind::UpperCase => Arc::new(UpperCaseNamingStrategy),
                NamingKind::Prefix => Arc::new(PrefixNamingStrategy::new(
                    self.table_prefix.clone().unwrap_or_default(),
                    self.column_prefix.clone().unwrap_or_default(),
                )),
            };
        }
        if let Some(use_unicode) = self.use_unicode {
            config = config.with_unicode(use_unicode);
        }
        if let Some(length) = self.default_string_length {
            config = config.with_default_string_length(length);
        }
        let precision = self
            .decimal_precision
            .unwrap_or(config.default_decimal_precision);
        let scale = self.decimal_scale.unwrap_or(config.default_decimal_scale);
        config = config.with_decimal(precision, scale);
        if let Some(format) = self.guid_format {
            config = config.with_guid_format(format);
        }
        if let Some(parameterized) = self.parameterized {
            config = config.with_parameterized(parameterized);
        }
        if let Some(policy) = self.duplicate_sequence_policy {
            config = config.with_duplicate_sequence_policy(policy);
        }
        config
    }

    /// Build the configured dialect. A `kind` in the settings wins over `default`.
    pub fn into_dialect(&self, default: DialectKind) -> Arc<dyn Dialect> {
        let kind = self.kind_or(default);
        kind.create(Some(self.to_config(kind)))
    }
}
