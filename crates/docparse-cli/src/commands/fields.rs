use docparse_core::error::DocParseError;
use docparse_core::fields::builtin;
use docparse_core::model::ConfigurableField;
use std::path::Path;

use crate::output;

pub fn list() -> Result<(), DocParseError> {
    println!("Available predefined field lists:\n");
    for name in builtin::PRESETS {
        let fields = builtin::load_preset(name)?;
        let required = fields.iter().filter(|f| f.required).count();
        println!(
            "  {:<8} {} field(s), {} required",
            name,
            fields.len(),
            required
        );
        if let Some(desc) = builtin::describe_preset(name) {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), DocParseError> {
    let fields = builtin::load_preset(preset)?;
    if let Some(desc) = builtin::describe_preset(preset) {
        println!("{}\n", desc);
    }
    print!("{}", output::table::format_fields(&fields));
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), DocParseError> {
    let fields = docparse_core::fields::load_fields(file)?;
    let required = fields.iter().filter(|f| f.required).count();

    println!("Field list '{}' is valid.", file.display());
    println!("  Fields: {} ({} required)", fields.len(), required);

    let warnings = field_warnings(&fields);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Problems that do not make a field list unusable but weaken extraction.
fn field_warnings(fields: &[ConfigurableField]) -> Vec<String> {
    let mut warnings = Vec::new();
    for field in fields {
        if field.description.trim().is_empty() {
            warnings.push(format!(
                "field '{}' has no description; the model only sees its name",
                field.name
            ));
        }
        if field.name.contains(char::is_whitespace) {
            warnings.push(format!(
                "field '{}' contains spaces; snake_case names match more reliably",
                field.name
            ));
        }
    }
    if !fields.iter().any(|f| f.required) {
        warnings.push(
            "no field is required; the confidence score counts every field".to_string(),
        );
    }
    warnings
}
