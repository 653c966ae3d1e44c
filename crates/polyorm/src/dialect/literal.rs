//! Rendering of plain values as inline SQL literals.

use super::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::model::{EnumType, FieldDefinition, FieldType};
use crate::value::Value;
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;

/// Longest plain-notation float literal before switching to exponent form.
const MAX_FLOAT_LITERAL_LEN: usize = 32;

/// Quote a string, doubling embedded single quotes.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Upper-case hex without prefix.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

/// `yyyy-MM-dd` at midnight, `yyyy-MM-dd HH:mm:ss.fff` otherwise.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

pub fn format_time(t: &NaiveTime) -> String {
    if t.nanosecond() == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M:%S%.3f").to_string()
    }
}

/// Shortest round-trip text, in exponent form when plain notation is too long.
pub fn format_float(f: f64, single: bool) -> OrmResult<String> {
    if !f.is_finite() {
        return Err(OrmError::literal(format!("{f} has no SQL literal form")));
    }
    let plain = if single {
        (f as f32).to_string()
    } else {
        f.to_string()
    };
    if plain.len() <= MAX_FLOAT_LITERAL_LEN {
        return Ok(plain);
    }
    Ok(if single {
        format!("{:e}", f as f32)
    } else {
        format!("{f:e}")
    })
}

fn enum_variant_literal<D: Dialect + ?Sized>(
    dialect: &D,
    enum_type: &EnumType,
    ordinal: i64,
) -> OrmResult<String> {
    let variant = enum_type.variant(ordinal).ok_or_else(|| {
        OrmError::literal(format!("{ordinal} is not a variant of {}", enum_type.name))
    })?;
    Ok(dialect.string_literal(variant))
}

/// Render `value` as a literal, using `field_type` as a hint where the value
/// alone is ambiguous (booleans stored as integers, enums, GUID text).
pub fn quoted_value<D: Dialect + ?Sized>(
    dialect: &D,
    value: &Value,
    field_type: Option<&FieldType>,
) -> OrmResult<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => match field_type {
            Some(t) if t.is_integer() => Ok(if *b { "1" } else { "0" }.to_string()),
            _ => Ok(dialect.bool_literal(*b).to_string()),
        },
        Value::Int(i) => match field_type {
            Some(FieldType::Bool) => Ok(dialect.bool_literal(*i != 0).to_string()),
            Some(FieldType::Enum(e)) if !e.store_as_int => enum_variant_literal(dialect, e, *i),
            _ => Ok(i.to_string()),
        },
        Value::Float(f) => format_float(*f, matches!(field_type, Some(FieldType::Float))),
        Value::Decimal(d) => Ok(d.to_string()),
        Value::Text(s) => match field_type {
            Some(FieldType::Guid) => {
                let guid = uuid::Uuid::parse_str(s)
                    .map_err(|e| OrmError::literal(format!("`{s}` is not a GUID: {e}")))?;
                Ok(dialect.guid_literal(&guid))
            }
            Some(FieldType::Enum(e)) if e.store_as_int => e
                .ordinal(s)
                .map(|o| o.to_string())
                .ok_or_else(|| OrmError::literal(format!("`{s}` is not a variant of {}", e.name))),
            _ => Ok(dialect.string_literal(s)),
        },
        Value::Guid(g) => Ok(dialect.guid_literal(g)),
        Value::DateTime(dt) => Ok(dialect.datetime_literal(dt)),
        Value::Date(d) => Ok(quote_string(&d.format("%Y-%m-%d").to_string())),
        Value::Time(t) => Ok(quote_string(&format_time(t))),
        Value::Bytes(b) => Ok(dialect.bytes_literal(b)),
        Value::Enum(e) => match field_type {
            Some(FieldType::Enum(t)) if t.store_as_int => Ok(e.ordinal.to_string()),
            Some(t) if t.is_integer() => Ok(e.ordinal.to_string()),
            _ => Ok(dialect.string_literal(&e.variant)),
        },
        Value::List(items) => {
            let rendered = items
                .iter()
                .map(|v| quoted_value(dialect, v, field_type))
                .collect::<OrmResult<Vec<_>>>()?;
            Ok(rendered.join(","))
        }
    }
}

/// Render a value destined for `field`, rejecting decimals that would lose
/// digits in the declared scale.
pub fn field_value<D: Dialect + ?Sized>(
    dialect: &D,
    field: &FieldDefinition,
    value: &Value,
) -> OrmResult<String> {
    if let (FieldType::Decimal, Value::Decimal(d)) = (&field.field_type, value) {
        let scale = field
            .scale
            .unwrap_or(dialect.config().default_decimal_scale);
        check_decimal_scale(&field.name, d, scale)?;
    }
    quoted_value(dialect, value, Some(&field.field_type))
}

fn check_decimal_scale(field: &str, d: &Decimal, scale: u32) -> OrmResult<()> {
    if d.normalize().scale() > scale {
        return Err(OrmError::literal(format!(
            "{d} does not fit the scale {scale} of {field}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_quote_string_doubles_quotes() {
        assert_eq!(quote_string("O'Brien"), "'O''Brien'");
        assert_eq!(quote_string(""), "''");
    }

    #[test]
    fn test_format_datetime() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(format_datetime(&d.and_hms_opt(0, 0, 0).unwrap()), "2024-01-02");
        assert_eq!(
            format_datetime(&d.and_hms_milli_opt(3, 4, 5, 678).unwrap()),
            "2024-01-02 03:04:05.678"
        );
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.1, false).unwrap(), "0.1");
        assert_eq!(format_float(0.1, true).unwrap(), "0.1");
        assert_eq!(format_float(1e300, false).unwrap(), "1e300");
        assert!(format_float(f64::NAN, false).is_err());
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x00, 0xab, 0x10]), "00AB10");
    }

    #[test]
    fn test_decimal_scale() {
        let d: Decimal = "1.250".parse().unwrap();
        assert!(check_decimal_scale("Price", &d, 2).is_ok());
        let d: Decimal = "1.255".parse().unwrap();
        assert!(check_decimal_scale("Price", &d, 2).is_err());
    }
}
