use docparse_core::model::{ConfigurableField, ExtractionResult};
use serde_json::Value;
use std::fmt::Write;

/// Human-readable rendering of an extraction result.
pub fn format_result(result: &ExtractionResult) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        "Source: {}    Confidence: {:.2}",
        result.source, result.confidence_score
    );
    if let Some(model) = result.model_confidence {
        let _ = write!(out, " (model: {:.2})", model);
    }
    out.push_str("\n\n");

    out.push_str("Fields:\n");
    push_values(&mut out, result.values.iter());

    if !result.discovered_fields.is_empty() {
        out.push_str("\nDiscovered:\n");
        push_values(&mut out, result.discovered_fields.iter());
    }

    if !result.issues.is_empty() {
        out.push_str("\nIssues:\n");
        for issue in &result.issues {
            let _ = writeln!(out, "  - {}: {}", issue.field, issue.detail);
        }
    }

    if let Some(notes) = &result.processing_notes {
        let _ = writeln!(out, "\nNotes: {}", notes);
    }

    out
}

/// Table of a field list: name, type, required flag, description.
pub fn format_fields(fields: &[ConfigurableField]) -> String {
    let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(4).max(4);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "  {:<width$}  {:<8}  {:<8}  Description",
        "Name",
        "Type",
        "Required",
        width = width
    );
    let _ = writeln!(out, "  {}", "-".repeat(width + 34));
    for field in fields {
        let _ = writeln!(
            out,
            "  {:<width$}  {:<8}  {:<8}  {}",
            field.name,
            field.data_type.to_string(),
            if field.required { "yes" } else { "no" },
            field.description,
            width = width
        );
    }
    out
}

fn push_values<'a>(out: &mut String, values: impl Iterator<Item = (&'a String, &'a Value)>) {
    let entries: Vec<_> = values.collect();
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in entries {
        let _ = writeln!(out, "  {:<width$}  {}", key, display_value(value), width = width);
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
