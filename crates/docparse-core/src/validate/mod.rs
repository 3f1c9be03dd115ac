//! Validation of model replies against the requested field schema.

pub mod coerce;

use crate::error::DocParseError;
use crate::model::{ConfigurableField, IssueKind, ValidationIssue};
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub use coerce::{coerce_value, CoercionError};

const ENVELOPE_FIELDS: &str = "configurable_fields";
const ENVELOPE_DISCOVERED: &str = "discovered_fields";
const ENVELOPE_CONFIDENCE: &str = "confidence_score";
const ENVELOPE_NOTES: &str = "processing_notes";

/// A reply checked against the field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    /// One entry per expected field, in schema order.
    pub values: IndexMap<String, Value>,
    pub discovered_fields: IndexMap<String, Value>,
    pub model_confidence: Option<f64>,
    pub processing_notes: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

/// Parse a raw reply and validate it against `fields`.
///
/// Only an unparseable reply is an error. Per-field problems are recorded
/// as issues with a null value.
pub fn validate_response(
    raw: &str,
    fields: &[ConfigurableField],
    discovery_mode: bool,
) -> Result<ValidatedResponse, DocParseError> {
    let object = parse_reply(raw)?;

    let (field_map, envelope) = match object.get(ENVELOPE_FIELDS) {
        Some(Value::Object(map)) => (map.clone(), Some(&object)),
        _ => (object.clone(), None),
    };

    let mut values = IndexMap::with_capacity(fields.len());
    let mut issues = Vec::new();

    for field in fields {
        let reported = lookup(&field_map, &field.name);
        let value = match reported.map(|v| coerce_value(v, field.data_type)) {
            None | Some(Ok(None)) => {
                issues.push(ValidationIssue {
                    field: field.name.clone(),
                    kind: IssueKind::Missing,
                    detail: "no value reported".to_string(),
                });
                Value::Null
            }
            Some(Ok(Some(value))) => value,
            Some(Err(e)) => {
                issues.push(ValidationIssue {
                    field: field.name.clone(),
                    kind: IssueKind::Invalid,
                    detail: format!("expected {}: {}", field.data_type, e),
                });
                Value::Null
            }
        };
        values.insert(field.name.clone(), value);
    }

    let mut discovered_fields = IndexMap::new();
    if discovery_mode {
        for (key, value) in &field_map {
            let expected = fields.iter().any(|f| f.name.eq_ignore_ascii_case(key));
            if !expected && (envelope.is_some() || !is_envelope_key(key)) {
                discovered_fields.insert(key.clone(), value.clone());
            }
        }
        if let Some(Value::Object(extra)) = object.get(ENVELOPE_DISCOVERED) {
            for (key, value) in extra {
                discovered_fields
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    let source = envelope.unwrap_or(&object);
    let model_confidence = source
        .get(ENVELOPE_CONFIDENCE)
        .and_then(confidence_from_value);
    let processing_notes = source
        .get(ENVELOPE_NOTES)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ValidatedResponse {
        values,
        discovered_fields,
        model_confidence,
        processing_notes,
        issues,
    })
}

/// Parse the reply into a JSON object, tolerating code fences and prose.
pub fn parse_reply(raw: &str) -> Result<Map<String, Value>, DocParseError> {
    let candidate = extract_json(raw);
    if candidate.is_empty() {
        return Err(DocParseError::ResponseParse("empty reply".into()));
    }
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DocParseError::ResponseParse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(DocParseError::ResponseParse(format!(
            "reply is not valid JSON: {}",
            e
        ))),
    }
}

/// Find the JSON payload inside a reply.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    // ```json ... ``` anywhere in the reply
    if let Some(open) = text.find("```") {
        let after_open = &text[open + 3..];
        if let Some(newline) = after_open.find('\n') {
            let body = &after_open[newline + 1..];
            if let Some(close) = body.find("```") {
                return body[..close].trim();
            }
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }

    text
}

fn lookup<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn is_envelope_key(key: &str) -> bool {
    matches!(
        key,
        ENVELOPE_FIELDS | ENVELOPE_DISCOVERED | ENVELOPE_CONFIDENCE | ENVELOPE_NOTES
    )
}

fn confidence_from_value(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    // Some models answer in percent.
    let x = if x > 1.0 && x <= 100.0 { x / 100.0 } else { x };
    (0.0..=1.0).contains(&x).then_some(x)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use serde_json::json;

    fn invoice_fields() -> Vec<ConfigurableField> {
        vec![
            ConfigurableField::new("invoice_number", "Invoice number").required(),
            ConfigurableField::new("total_amount", "Total").with_type(FieldType::Number),
            ConfigurableField::new("invoice_date", "Date").with_type(FieldType::Date),
        ]
    }

    #[test]
    fn test_flat_reply() {
        let raw = r#"{"invoice_number": "INV-001", "total_amount": "$1,250.00", "invoice_date": "03/15/2024"}"#;
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert_eq!(v.values["invoice_number"], json!("INV-001"));
        assert_eq!(v.values["total_amount"], json!(1250));
        assert_eq!(v.values["invoice_date"], json!("2024-03-15"));
        assert!(v.issues.is_empty());
        assert!(v.model_confidence.is_none());
    }

    #[test]
    fn test_envelope_reply() {
        let raw = r#"{
            "configurable_fields": {"invoice_number": "INV-7", "total_amount": 99.5, "invoice_date": null},
            "discovered_fields": {"po_number": "PO-1"},
            "confidence_score": 0.9,
            "processing_notes": "Scanned copy"
        }"#;
        let v = validate_response(raw, &invoice_fields(), true).unwrap();
        assert_eq!(v.values["total_amount"], json!(99.5));
        assert_eq!(v.values["invoice_date"], Value::Null);
        assert_eq!(v.discovered_fields["po_number"], json!("PO-1"));
        assert_eq!(v.model_confidence, Some(0.9));
        assert_eq!(v.processing_notes.as_deref(), Some("Scanned copy"));
        assert_eq!(v.issues.len(), 1);
        assert_eq!(v.issues[0].kind, IssueKind::Missing);
    }

    #[test]
    fn test_values_follow_schema_order() {
        let raw = r#"{"invoice_date": "2024-01-01", "invoice_number": "A"}"#;
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        let keys: Vec<&str> = v.values.keys().map(String::as_str).collect();
        assert_eq!(keys, ["invoice_number", "total_amount", "invoice_date"]);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let raw = r#"{"Invoice_Number": "INV-9"}"#;
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert_eq!(v.values["invoice_number"], json!("INV-9"));
    }

    #[test]
    fn test_invalid_value_recorded_as_issue() {
        let raw = r#"{"invoice_number": "INV-1", "total_amount": "about a thousand"}"#;
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert_eq!(v.values["total_amount"], Value::Null);
        let issue = v.issues.iter().find(|i| i.field == "total_amount").unwrap();
        assert_eq!(issue.kind, IssueKind::Invalid);
        assert!(issue.detail.contains("number"));
    }

    #[test]
    fn test_markdown_fences_stripped() {
        let raw = "Here is the result:\n```json\n{\"invoice_number\": \"INV-2\"}\n```\nLet me know!";
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert_eq!(v.values["invoice_number"], json!("INV-2"));
    }

    #[test]
    fn test_surrounding_prose_stripped() {
        let raw = "Sure! {\"invoice_number\": \"INV-3\"} Hope this helps.";
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert_eq!(v.values["invoice_number"], json!("INV-3"));
    }

    #[test]
    fn test_non_json_rejected() {
        for raw in ["I could not read the document.", "", "[1, 2]", "\"INV-1\""] {
            assert!(
                matches!(
                    validate_response(raw, &invoice_fields(), false),
                    Err(DocParseError::ResponseParse(_))
                ),
                "reply {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_extra_keys_dropped_without_discovery() {
        let raw = r#"{"invoice_number": "INV-1", "iban": "DE00"}"#;
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert!(v.discovered_fields.is_empty());
        assert!(!v.values.contains_key("iban"));
    }

    #[test]
    fn test_extra_keys_kept_with_discovery() {
        let raw = r#"{"invoice_number": "INV-1", "iban": "DE00", "confidence_score": 0.4}"#;
        let v = validate_response(raw, &invoice_fields(), true).unwrap();
        assert_eq!(v.discovered_fields.len(), 1);
        assert_eq!(v.discovered_fields["iban"], json!("DE00"));
        assert_eq!(v.values["invoice_number"], json!("INV-1"));
        assert_eq!(v.model_confidence, Some(0.4));
    }

    #[test]
    fn test_nested_discovered_fields_in_flat_reply() {
        let raw = r#"{"invoice_number": "A", "iban": "DE00", "discovered_fields": {"po": "1"}}"#;
        let v = validate_response(raw, &invoice_fields(), true).unwrap();
        assert_eq!(v.values["invoice_number"], json!("A"));
        assert_eq!(v.discovered_fields.len(), 2);
        assert_eq!(v.discovered_fields["iban"], json!("DE00"));
        assert_eq!(v.discovered_fields["po"], json!("1"));
        assert!(!v.discovered_fields.contains_key("discovered_fields"));

        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert!(v.discovered_fields.is_empty());
    }

    #[test]
    fn test_percent_confidence() {
        let raw = r#"{"configurable_fields": {}, "confidence_score": "85%"}"#;
        let v = validate_response(raw, &invoice_fields(), false).unwrap();
        assert_eq!(v.model_confidence, Some(0.85));
    }
}
