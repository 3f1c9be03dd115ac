use crate::error::DocParseError;
use crate::model::ConfigurableField;

const DEFAULT_FIELDS_JSON: &str = include_str!("../../../../fields/default.json");
const INVOICE_FIELDS_JSON: &str = include_str!("../../../../fields/invoice.json");

/// Available predefined field lists.
pub const PRESETS: &[&str] = &["default", "invoice"];

/// Short description of a preset, for listings.
pub fn describe_preset(name: &str) -> Option<&'static str> {
    match name {
        "default" => Some("General-purpose fields found in most business documents"),
        "invoice" => Some("Invoice header fields; number, dates, vendor and total are required"),
        _ => None,
    }
}

/// Load a predefined field list by name.
pub fn load_preset(name: &str) -> Result<Vec<ConfigurableField>, DocParseError> {
    let json = match name {
        "default" => DEFAULT_FIELDS_JSON,
        "invoice" => INVOICE_FIELDS_JSON,
        _ => {
            return Err(DocParseError::FieldSchema(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    let fields: Vec<ConfigurableField> = serde_json::from_str(json)?;
    Ok(fields)
}

/// The fields used when a caller supplies none.
pub fn default_fields() -> Result<Vec<ConfigurableField>, DocParseError> {
    load_preset("default")
}
