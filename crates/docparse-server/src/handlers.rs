//! HTTP request handlers for API endpoints

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use docparse_core::fields::{self, builtin};
use docparse_core::model::{ConfigurableField, ExtractionResult};
use docparse_core::ParseOptions;
use serde::{Deserialize, Serialize};

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub vision_model: String,
    pub max_file_size_mb: usize,
    pub allowed_extensions: Vec<&'static str>,
    pub extractor: String,
    pub vision_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct DefaultFieldsResponse {
    pub default_fields: Vec<ConfigurableField>,
}

/// Body of the `parse_request` form field on `/parse-with-json`.
#[derive(Debug, Deserialize)]
pub struct ParseRequestBody {
    #[serde(default)]
    pub custom_fields: Option<Vec<ConfigurableField>>,
    #[serde(default)]
    pub extraction_instructions: Option<String>,
    #[serde(default = "default_discovery")]
    pub discovery_mode: bool,
}

fn default_discovery() -> bool {
    true
}

pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Document Parser API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.parser.config();
    Json(HealthResponse {
        status: "healthy",
        model: config.model.clone(),
        vision_model: config.vision_model.clone(),
        max_file_size_mb: config.max_file_size_mb(),
        allowed_extensions: ALLOWED_EXTENSIONS.to_vec(),
        extractor: state.parser.extractor_name().to_string(),
        vision_fallback: state.parser.vision_available(),
    })
}

pub async fn default_fields() -> Result<Json<DefaultFieldsResponse>, ApiError> {
    Ok(Json(DefaultFieldsResponse {
        default_fields: builtin::default_fields()?,
    }))
}

/// `POST /parse`: multipart `file` plus optional `custom_fields`,
/// `extraction_instructions` and `discovery_mode` form fields.
pub async fn parse_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let upload = form.pdf_upload()?;

    let fields = match form.text("custom_fields") {
        Some(json) => fields::parse_fields_str(json)?,
        None => builtin::default_fields()?,
    };
    let discovery_mode = match form.text("discovery_mode") {
        Some(value) => parse_flag(value)?,
        None => true,
    };
    let options = ParseOptions {
        fields,
        discovery_mode,
        extraction_instructions: form.text("extraction_instructions").map(str::to_string),
    };

    run_parse(&state, upload, options).await
}

/// `POST /parse-with-json`: multipart `file` plus a `parse_request` JSON object.
pub async fn parse_document_with_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let upload = form.pdf_upload()?;

    let raw = form
        .text("parse_request")
        .ok_or_else(|| ApiError::bad_request("missing 'parse_request' form field"))?;
    let request: ParseRequestBody = serde_json::from_str(raw)
        .map_err(|e| ApiError::bad_request(format!("invalid parse_request JSON: {}", e)))?;

    let fields = match request.custom_fields {
        Some(custom) if !custom.is_empty() => {
            fields::validate_fields(&custom)?;
            custom
        }
        _ => builtin::default_fields()?,
    };
    let options = ParseOptions {
        fields,
        discovery_mode: request.discovery_mode,
        extraction_instructions: request.extraction_instructions,
    };

    run_parse(&state, upload, options).await
}

async fn run_parse(
    state: &AppState,
    upload: Upload<'_>,
    options: ParseOptions,
) -> Result<Json<ExtractionResult>, ApiError> {
    tracing::info!(
        file = upload.file_name,
        bytes = upload.bytes.len(),
        fields = options.fields.len(),
        discovery = options.discovery_mode,
        "parse request"
    );
    let result = state.parser.parse_pdf(upload.bytes, options).await?;
    Ok(Json(result))
}

fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "invalid discovery_mode '{}': expected true or false",
            other
        ))),
    }
}

struct Upload<'a> {
    file_name: &'a str,
    bytes: &'a [u8],
}

/// Multipart form buffered in memory. The router's body limit bounds its size.
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    texts: Vec<(String, String)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some((file_name, bytes.to_vec()));
            } else {
                let text = field.text().await.map_err(multipart_error)?;
                form.texts.push((name, text));
            }
        }
        Ok(form)
    }

    /// Non-blank text value of a form field.
    fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    fn pdf_upload(&self) -> Result<Upload<'_>, ApiError> {
        let (file_name, bytes) = self
            .file
            .as_ref()
            .ok_or_else(|| ApiError::bad_request("missing 'file' form field"))?;
        let is_pdf = file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| {
                ALLOWED_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            });
        if !is_pdf {
            return Err(ApiError::bad_request("Only PDF files are supported"));
        }
        Ok(Upload { file_name, bytes })
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError {
        status: err.status(),
        error: "invalid_upload",
        details: err.body_text(),
    }
}
