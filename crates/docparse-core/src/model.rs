use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared type of a configurable field. Drives coercion of model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    #[serde(alias = "text", alias = "str")]
    String,
    #[serde(alias = "integer", alias = "float", alias = "decimal", alias = "amount")]
    Number,
    #[serde(alias = "datetime")]
    Date,
    #[serde(alias = "bool")]
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A caller-specified datum to extract from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurableField {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub data_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl ConfigurableField {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ConfigurableField {
            name: name.into(),
            description: description.into(),
            data_type: FieldType::String,
            required: false,
        }
    }

    pub fn with_type(mut self, data_type: FieldType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// One extraction job over already-extracted document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub document_text: String,
    pub fields: Vec<ConfigurableField>,
    #[serde(default)]
    pub discovery_mode: bool,
    /// Free-form guidance appended to the prompt.
    #[serde(default)]
    pub extraction_instructions: Option<String>,
}

impl ExtractionRequest {
    pub fn new(document_text: impl Into<String>, fields: Vec<ConfigurableField>) -> Self {
        ExtractionRequest {
            document_text: document_text.into(),
            fields,
            discovery_mode: false,
            extraction_instructions: None,
        }
    }

    pub fn with_discovery(mut self, discovery_mode: bool) -> Self {
        self.discovery_mode = discovery_mode;
        self
    }

    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.extraction_instructions = instructions.filter(|s| !s.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The model did not report a value.
    Missing,
    /// A value was reported but could not be coerced to the declared type.
    Invalid,
}

/// A per-field validation failure, recorded instead of aborting the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub kind: IssueKind,
    pub detail: String,
}

/// Whether the model saw extracted text or rendered page images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    #[default]
    Text,
    Vision,
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Text => write!(f, "text"),
            ResultSource::Vision => write!(f, "vision"),
        }
    }
}

/// Outcome of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// One entry per requested field, in request order. `null` when not extracted.
    pub values: IndexMap<String, Value>,
    /// Extra field-like data reported in discovery mode.
    pub discovered_fields: IndexMap<String, Value>,
    /// Completeness score in [0, 1].
    pub confidence_score: f64,
    /// The model's own estimate, if it gave one. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub source: ResultSource,
}

impl ExtractionResult {
    /// Number of requested fields that received a value.
    pub fn populated_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_null()).count()
    }
}
