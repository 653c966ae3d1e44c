//! Static per-dialect data: quoting, reserved words, literals and type names.

/// Paging clause form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// `LIMIT skip,rows`
    CommaLimit,
    /// `LIMIT rows OFFSET skip`
    LimitOffset,
    /// `OFFSET skip ROWS FETCH NEXT rows ROWS ONLY`
    OffsetFetch,
    /// `ROWS first TO last` (1-based, inclusive)
    Rows,
}

/// How auto-increment keys are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Keyword appended after `PRIMARY KEY`.
    Keyword(&'static str),
    /// Serial pseudo-types replace the integer type.
    Serial,
    /// A generator named `{table}_{column}_GEN` feeds the column.
    Generator,
}

/// Column type names.
#[derive(Debug, Clone, Copy)]
pub struct TypeNames {
    pub bool: &'static str,
    pub int16: &'static str,
    pub int32: &'static str,
    pub int64: &'static str,
    pub float: &'static str,
    pub double: &'static str,
    pub decimal: &'static str,
    pub max_decimal_precision: u32,
    pub string: &'static str,
    pub unicode_string: &'static str,
    /// Unbounded text, used past `max_string_length`.
    pub text: &'static str,
    pub unicode_text: &'static str,
    pub max_string_length: u32,
    pub guid_string: &'static str,
    pub guid_binary: &'static str,
    pub datetime: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub bytes: &'static str,
}

/// Data-only description of a dialect.
#[derive(Debug)]
pub struct DialectRules {
    pub name: &'static str,
    pub open_quote: char,
    pub close_quote: char,
    /// Upper-case reserved words.
    pub reserved_words: &'static [&'static str],
    pub true_literal: &'static str,
    pub false_literal: &'static str,
    pub param_prefix: &'static str,
    pub limit_style: LimitStyle,
    /// Row bound used when only `skip` is given.
    pub unbounded_rows: &'static str,
    pub identity: Identity,
    pub supports_sequences: bool,
    /// Single-row table for `SELECT` without a real source.
    pub dual_table: Option<&'static str>,
    pub max_identifier_length: Option<usize>,
    pub last_insert_id_sql: Option<&'static str>,
    pub types: TypeNames,
}

impl DialectRules {
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_words
            .iter()
            .any(|w| w.eq_ignore_ascii_case(name))
    }

    /// Truncate a generated identifier to the dialect's limit.
    pub fn clamp_identifier(&self, name: String) -> String {
        match self.max_identifier_length {
            Some(max) if name.chars().count() > max => name.chars().take(max).collect(),
            _ => name,
        }
    }
}
