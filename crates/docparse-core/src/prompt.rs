//! Prompt construction for field extraction.
//!
//! The model is asked for a single JSON object:
//!
//! ```json
//! {
//!   "configurable_fields": { "<field name>": <value or null> },
//!   "discovered_fields": { "<other name>": <value> },
//!   "confidence_score": <0.0 - 1.0>,
//!   "processing_notes": "<free text>"
//! }
//! ```

use crate::error::DocParseError;
use crate::model::{ConfigurableField, ExtractionRequest};
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are an expert document parser. Extract information accurately and return it in the specified JSON format.";

pub const VISION_SYSTEM_PROMPT: &str = "You are an expert document parser. Analyze document images and extract information accurately, returning it in the specified JSON format.";

/// How insistent the prompt is about the reply format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Standard,
    /// Used after a reply that could not be parsed as JSON.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the text-mode prompt for a request.
pub fn build_prompt(
    request: &ExtractionRequest,
    style: PromptStyle,
) -> Result<Prompt, DocParseError> {
    if request.document_text.trim().is_empty() {
        return Err(DocParseError::EmptyDocument);
    }

    let mut user = String::new();
    user.push_str(
        "Please analyze the following document and extract information according to these requirements:\n\n",
    );
    push_fields(&mut user, &request.fields);
    user.push_str("\nDOCUMENT TEXT:\n");
    user.push_str(request.document_text.trim());
    user.push_str("\n\n");
    push_instructions(
        &mut user,
        "document text",
        request.discovery_mode,
        request.extraction_instructions.as_deref(),
        style,
    );

    Ok(Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    })
}

/// Build the prompt used when the document is sent as page images.
pub fn build_image_prompt(
    fields: &[ConfigurableField],
    discovery_mode: bool,
    extraction_instructions: Option<&str>,
    style: PromptStyle,
) -> Prompt {
    let mut user = String::new();
    user.push_str(
        "Please analyze the attached document page images and extract information according to these requirements:\n\n",
    );
    push_fields(&mut user, fields);
    user.push('\n');
    push_instructions(
        &mut user,
        "page images",
        discovery_mode,
        extraction_instructions,
        style,
    );

    Prompt {
        system: VISION_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// One line per field: `- name (type, required): description`.
pub fn describe_field(field: &ConfigurableField) -> String {
    format!(
        "- {} ({}, {}): {}",
        field.name,
        field.data_type,
        if field.required { "required" } else { "optional" },
        field.description
    )
}

fn push_fields(out: &mut String, fields: &[ConfigurableField]) {
    out.push_str("CONFIGURABLE FIELDS TO EXTRACT:\n");
    for field in fields {
        out.push_str(&describe_field(field));
        out.push('\n');
    }
}

fn push_instructions(
    out: &mut String,
    source: &str,
    discovery_mode: bool,
    extraction_instructions: Option<&str>,
    style: PromptStyle,
) {
    out.push_str("INSTRUCTIONS:\n");
    out.push_str("1. Extract values for the configurable fields listed above, using the field names exactly as given. If a field is not found in the document, set its value to null.\n");
    if discovery_mode {
        out.push_str("2. Additionally, identify any other notable field-like information in the document (identifiers, dates, parties, amounts, references) and report it under \"discovered_fields\" using short snake_case names.\n");
    } else {
        out.push_str("2. Do not report fields other than the ones listed above; leave \"discovered_fields\" empty.\n");
    }
    let _ = writeln!(
        out,
        "3. Provide your own confidence score between 0.0 and 1.0 based on how readable the {} was and how certain you are about each value.",
        source
    );
    out.push_str("4. Return the response in the following JSON format:\n\n");
    out.push_str(
        "{\n    \"configurable_fields\": {\n        \"field_name\": \"extracted_value_or_null\"\n    },\n    \"discovered_fields\": {\n        \"other_field_name\": \"extracted_value\"\n    },\n    \"confidence_score\": <number_between_0_and_1>,\n    \"processing_notes\": \"Any relevant notes about the extraction process\"\n}\n\n",
    );
    out.push_str("For dates, use ISO format (YYYY-MM-DD). For amounts, extract numeric values without currency symbols. For booleans, use true or false.\n");

    if let Some(extra) = extraction_instructions {
        let _ = writeln!(out, "\nADDITIONAL EXTRACTION INSTRUCTIONS:\n{}", extra.trim());
    }

    match style {
        PromptStyle::Standard => {
            out.push_str("\nPlease ensure the JSON is valid and complete.\n");
        }
        PromptStyle::Strict => {
            out.push_str("\nIMPORTANT: your previous reply could not be parsed. Reply with exactly one JSON object and nothing else: no markdown code fences, no comments, no text before or after the object.\n");
        }
    }
}
