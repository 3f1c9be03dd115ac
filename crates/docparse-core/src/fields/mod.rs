pub mod builtin;

use crate::error::DocParseError;
use crate::model::ConfigurableField;
use std::collections::HashSet;
use std::path::Path;

/// Load a field list from a JSON file.
pub fn load_fields(path: &Path) -> Result<Vec<ConfigurableField>, DocParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| DocParseError::FieldsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let fields: Vec<ConfigurableField> =
        serde_json::from_str(&content).map_err(|e| DocParseError::FieldsLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_fields(&fields)?;
    Ok(fields)
}

/// Parse a field list from a JSON string (no file path context).
pub fn parse_fields_str(json: &str) -> Result<Vec<ConfigurableField>, DocParseError> {
    let fields: Vec<ConfigurableField> = serde_json::from_str(json)
        .map_err(|e| DocParseError::FieldSchema(format!("invalid field list JSON: {}", e)))?;
    validate_fields(&fields)?;
    Ok(fields)
}

/// Validate that a field list is usable for extraction.
///
/// Names are matched case-insensitively against model output, so two fields
/// differing only in case would be indistinguishable.
pub fn validate_fields(fields: &[ConfigurableField]) -> Result<(), DocParseError> {
    if fields.is_empty() {
        return Err(DocParseError::FieldSchema(
            "at least one field is required".into(),
        ));
    }

    let mut seen = HashSet::new();
    for field in fields {
        let name = field.name.trim();
        if name.is_empty() {
            return Err(DocParseError::FieldSchema(
                "field name must not be empty".into(),
            ));
        }
        if name != field.name {
            return Err(DocParseError::FieldSchema(format!(
                "field name '{}' has leading or trailing whitespace",
                field.name
            )));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(DocParseError::FieldSchema(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_fields() {
        let json = r#"[
            {"name": "invoice_number", "description": "Invoice or bill number", "required": true},
            {"name": "total_amount", "description": "Total amount due", "data_type": "number"}
        ]"#;
        let fields = parse_fields_str(json).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].required);
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(parse_fields_str("[]").is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let json = r#"[{"name": "  ", "description": "x"}]"#;
        assert!(parse_fields_str(json).is_err());
    }

    #[test]
    fn test_case_insensitive_duplicate_rejected() {
        let json = r#"[
            {"name": "Total", "description": "x"},
            {"name": "total", "description": "y"}
        ]"#;
        let err = parse_fields_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"[{"name": "a", "description": "x", "data_type": "blob"}]"#;
        assert!(parse_fields_str(json).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_fields(Path::new("/nonexistent/fields.json")).unwrap_err();
        assert!(matches!(err, DocParseError::FieldsLoad { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.json");
        std::fs::write(&path, r#"[{"name": "po_number", "description": "Purchase order"}]"#)
            .unwrap();
        let fields = load_fields(&path).unwrap();
        assert_eq!(fields[0].name, "po_number");
    }
}
