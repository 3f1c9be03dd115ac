use crate::model::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::str::FromStr;

/// A reported value that does not fit the declared field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CoercionError(pub String);

/// Coerce one reported value to `data_type`.
///
/// Returns `Ok(None)` for null and placeholder values ("", "N/A", "-" and the like).
pub fn coerce_value(value: &Value, data_type: FieldType) -> Result<Option<Value>, CoercionError> {
    if value.is_null() {
        return Ok(None);
    }
    if let Value::String(s) = value {
        if is_placeholder(s) {
            return Ok(None);
        }
    }

    let coerced = match data_type {
        FieldType::String => coerce_string(value),
        FieldType::Number => coerce_number(value)?,
        FieldType::Date => coerce_date(value)?,
        FieldType::Boolean => coerce_boolean(value)?,
    };
    Ok(Some(coerced))
}

fn is_placeholder(s: &str) -> bool {
    let s = s.trim();
    s.is_empty()
        || s == "-"
        || s == "*"
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("none")
        || s.eq_ignore_ascii_case("n/a")
        || s.eq_ignore_ascii_case("n.a.")
}

fn coerce_string(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn coerce_number(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => {
            let decimal = parse_decimal(s)?;
            decimal_to_json(decimal)
        }
        other => Err(CoercionError(format!("expected a number, got {}", other))),
    }
}

fn decimal_to_json(decimal: Decimal) -> Result<Value, CoercionError> {
    Number::from_str(&decimal.normalize().to_string())
        .map(Value::Number)
        .map_err(|e| CoercionError(format!("number '{}' out of range: {}", decimal, e)))
}

/// Parse an amount as written in a document.
///
/// Handles formats like:
/// - "1250" / "1250.00"
/// - "$1,250.00", "1 250,00 €", "EUR 1.250,00"
/// - "12,5" -> 12.5 (decimal comma)
/// - "(300.00)" -> -300 (accounting negative)
pub fn parse_decimal(s: &str) -> Result<Decimal, CoercionError> {
    let original = s.trim();
    let mut body = original;

    let mut negative = false;
    if let Some(inner) = body.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        negative = true;
        body = inner;
    }

    // Drop currency symbols, codes and digit grouping spaces.
    let mut cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if cleaned.starts_with('-') {
        negative = !negative;
        cleaned.remove(0);
    } else if cleaned.starts_with('+') {
        cleaned.remove(0);
    }

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(CoercionError(format!("invalid number '{}'", original)));
    }

    let normalized = normalize_separators(&cleaned);
    let mut decimal = Decimal::from_str(&normalized)
        .map_err(|e| CoercionError(format!("invalid number '{}': {}", original, e)))?;
    if negative {
        decimal.set_sign_negative(true);
    }
    Ok(decimal)
}

/// Resolve which of `.` and `,` is the decimal separator and drop the other.
fn normalize_separators(s: &str) -> String {
    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    match (dots, commas) {
        (0, 0) => s.to_string(),
        (_, 0) if dots > 1 => s.replace('.', ""),
        (_, 0) => s.to_string(),
        (0, 1) => {
            // "1,250" groups thousands, "12,5" and "0,030" use a decimal comma.
            let (before, after) = s.split_once(',').unwrap_or((s, ""));
            if after.len() == 3 && !before.is_empty() && !before.starts_with('0') {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            }
        }
        (0, _) => s.replace(',', ""),
        _ => {
            let last_dot = s.rfind('.').unwrap_or(0);
            let last_comma = s.rfind(',').unwrap_or(0);
            if last_comma > last_dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// Parse a date as written in a document into a calendar date.
///
/// Slash dates are read month-first; day-first is tried when that fails
/// ("25/12/2024").
pub fn parse_date(s: &str) -> Result<NaiveDate, CoercionError> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }

    let cleaned = strip_ordinal_suffixes(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .ok_or_else(|| CoercionError(format!("unrecognised date '{}'", trimmed)))
}

/// "March 5th, 2024" -> "March 5, 2024"
fn strip_ordinal_suffixes(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let bare = word.trim_end_matches(',');
            let comma = &word[bare.len()..];
            for suffix in ["st", "nd", "rd", "th"] {
                if let Some(num) = bare.strip_suffix(suffix) {
                    if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) {
                        return format!("{}{}", num, comma);
                    }
                }
            }
            word.to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn coerce_date(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(s) => {
            let date = parse_date(s)?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }
        other => Err(CoercionError(format!("expected a date, got {}", other))),
    }
}

/// Parse yes/no style answers.
pub fn parse_boolean(s: &str) -> Result<bool, CoercionError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(CoercionError(format!("invalid boolean '{}'", s.trim()))),
    }
}

fn coerce_boolean(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => parse_boolean(s).map(Value::Bool),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Ok(Value::Bool(false)),
            Some(x) if x == 1.0 => Ok(Value::Bool(true)),
            _ => Err(CoercionError(format!("invalid boolean {}", n))),
        },
        other => Err(CoercionError(format!("expected a boolean, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_decimal("68").unwrap(), dec!(68));
        assert_eq!(parse_decimal("  0.030 ").unwrap(), dec!(0.030));
        assert_eq!(parse_decimal("-12.5").unwrap(), dec!(-12.5));
    }

    #[test]
    fn test_currency_and_grouping() {
        assert_eq!(parse_decimal("$1,250.00").unwrap(), dec!(1250.00));
        assert_eq!(parse_decimal("1 250,00 €").unwrap(), dec!(1250.00));
        assert_eq!(parse_decimal("EUR 1.250,00").unwrap(), dec!(1250.00));
        assert_eq!(parse_decimal("1,250,000").unwrap(), dec!(1250000));
        assert_eq!(parse_decimal("1.250.000").unwrap(), dec!(1250000));
        assert_eq!(parse_decimal("USD 99").unwrap(), dec!(99));
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_decimal("12,5").unwrap(), dec!(12.5));
        assert_eq!(parse_decimal("0,030").unwrap(), dec!(0.030));
    }

    #[test]
    fn test_thousands_comma() {
        assert_eq!(parse_decimal("1,250").unwrap(), dec!(1250));
    }

    #[test]
    fn test_parenthesised_negative() {
        assert_eq!(parse_decimal("(300.00)").unwrap(), dec!(-300.00));
        assert_eq!(parse_decimal("($1,000)").unwrap(), dec!(-1000));
    }

    #[test]
    fn test_invalid_number() {
        assert!(parse_decimal("abc").is_err());
        assert!(parse_decimal("$").is_err());
        assert!(parse_decimal("1.2.3,4,5").is_err());
    }

    #[test]
    fn test_number_coercion_to_json() {
        assert_eq!(
            coerce_value(&json!("$1,250.00"), FieldType::Number).unwrap(),
            Some(json!(1250))
        );
        assert_eq!(
            coerce_value(&json!("12,50"), FieldType::Number).unwrap(),
            Some(json!(12.5))
        );
        assert_eq!(
            coerce_value(&json!(42.5), FieldType::Number).unwrap(),
            Some(json!(42.5))
        );
        assert!(coerce_value(&json!(true), FieldType::Number).is_err());
    }

    #[test]
    fn test_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for input in [
            "2024-03-15",
            "2024/03/15",
            "15.03.2024",
            "03/15/2024",
            "15/03/2024",
            "March 15, 2024",
            "Mar 15, 2024",
            "15 March 2024",
            "March 15th, 2024",
            "2024-03-15T10:30:00Z",
            "2024-03-15T10:30:00+02:00",
            "2024-03-15 08:00:00",
        ] {
            assert_eq!(parse_date(input).unwrap(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_slash_dates_read_month_first() {
        assert_eq!(
            parse_date("04/05/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_invalid_date() {
        assert!(parse_date("next tuesday").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(coerce_value(&json!(20240315), FieldType::Date).is_err());
    }

    #[test]
    fn test_date_coercion_normalises() {
        assert_eq!(
            coerce_value(&json!("15.03.2024"), FieldType::Date).unwrap(),
            Some(json!("2024-03-15"))
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(coerce_value(&json!("Yes"), FieldType::Boolean).unwrap(), Some(json!(true)));
        assert_eq!(coerce_value(&json!("n"), FieldType::Boolean).unwrap(), Some(json!(false)));
        assert_eq!(coerce_value(&json!(1), FieldType::Boolean).unwrap(), Some(json!(true)));
        assert_eq!(coerce_value(&json!(false), FieldType::Boolean).unwrap(), Some(json!(false)));
        assert!(coerce_value(&json!("maybe"), FieldType::Boolean).is_err());
        assert!(coerce_value(&json!(2), FieldType::Boolean).is_err());
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            coerce_value(&json!("  ACME Corp "), FieldType::String).unwrap(),
            Some(json!("ACME Corp"))
        );
        assert_eq!(coerce_value(&json!(42), FieldType::String).unwrap(), Some(json!("42")));
        assert_eq!(
            coerce_value(&json!(["a", "b"]), FieldType::String).unwrap(),
            Some(json!(r#"["a","b"]"#))
        );
    }

    #[test]
    fn test_placeholders_are_missing() {
        for v in [json!(null), json!(""), json!("  "), json!("N/A"), json!("-"), json!("null")] {
            assert_eq!(coerce_value(&v, FieldType::Number).unwrap(), None);
        }
    }
}
