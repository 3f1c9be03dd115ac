pub mod client;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fields;
pub mod model;
pub mod prompt;
pub mod scoring;
pub mod validate;

use client::{CompletionRequest, ModelClient, OpenAiClient, RetryingClient};
use config::{ExtractorConfig, OpenAiSettings};
use error::DocParseError;
use extraction::lopdf_text::LopdfExtractor;
use extraction::pdftoppm::PdftoppmRenderer;
use extraction::pdftotext::PdftotextExtractor;
use extraction::{PageRenderer, PdfExtractor};
use model::{ConfigurableField, ExtractionRequest, ExtractionResult, ResultSource};
use prompt::{Prompt, PromptStyle};
use std::sync::Arc;
use std::time::Instant;
use validate::ValidatedResponse;

/// Per-call options for [`DocumentParser::parse_pdf`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub fields: Vec<ConfigurableField>,
    pub discovery_mode: bool,
    pub extraction_instructions: Option<String>,
}

impl ParseOptions {
    pub fn new(fields: Vec<ConfigurableField>) -> Self {
        ParseOptions {
            fields,
            ..Default::default()
        }
    }
}

/// Extraction pipeline: PDF bytes or text in, validated and scored fields out.
///
/// Immutable once built. Share it between concurrent requests with an `Arc`.
pub struct DocumentParser {
    config: ExtractorConfig,
    client: Arc<dyn ModelClient>,
    extractor: Arc<dyn PdfExtractor>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl DocumentParser {
    pub fn new(
        config: ExtractorConfig,
        client: Arc<dyn ModelClient>,
        extractor: Arc<dyn PdfExtractor>,
    ) -> Result<Self, DocParseError> {
        config.validate()?;
        Ok(DocumentParser {
            config,
            client,
            extractor,
            renderer: None,
        })
    }

    /// Enable the vision fallback for PDFs without a text layer.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Build a parser against the OpenAI API configured in the environment.
    ///
    /// Uses pdftotext when installed and falls back to lopdf. The vision
    /// fallback is wired up only when pdftoppm is installed.
    pub fn from_env(config: ExtractorConfig) -> Result<Self, DocParseError> {
        let settings = OpenAiSettings::from_env()?;
        let client = RetryingClient::new(OpenAiClient::new(&settings)?, config.retry.clone());

        let extractor: Arc<dyn PdfExtractor> = if PdftotextExtractor::is_available() {
            Arc::new(PdftotextExtractor::new())
        } else {
            tracing::warn!("pdftotext not found, using lopdf for text extraction");
            Arc::new(LopdfExtractor::new())
        };

        let parser = DocumentParser::new(config, Arc::new(client), extractor)?;
        if parser.config.vision_fallback && PdftoppmRenderer::is_available() {
            Ok(parser.with_renderer(Arc::new(PdftoppmRenderer::new())))
        } else {
            Ok(parser)
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.backend_name()
    }

    pub fn client_name(&self) -> &str {
        self.client.backend_name()
    }

    pub fn vision_available(&self) -> bool {
        self.config.vision_fallback && self.renderer.is_some()
    }

    /// Parse a PDF document.
    ///
    /// Size and format are checked before anything else; an oversized or
    /// non-PDF file never reaches the extractor or the model.
    pub async fn parse_pdf(
        &self,
        pdf_bytes: &[u8],
        options: ParseOptions,
    ) -> Result<ExtractionResult, DocParseError> {
        self.check_size(pdf_bytes.len())?;
        extraction::validate_pdf(pdf_bytes)?;
        fields::validate_fields(&options.fields)?;

        let bytes = Arc::new(pdf_bytes.to_vec());
        let extractor = Arc::clone(&self.extractor);
        let input = Arc::clone(&bytes);
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&input))
            .await
            .map_err(|e| DocParseError::Extraction(format!("extraction task failed: {}", e)))??;

        let text = extraction::join_pages(&pages);
        tracing::info!(
            backend = self.extractor.backend_name(),
            pages = pages.len(),
            chars = text.len(),
            "extracted document text"
        );

        if !text.is_empty() {
            let request = ExtractionRequest::new(text, options.fields)
                .with_discovery(options.discovery_mode)
                .with_instructions(options.extraction_instructions);
            return self.extract(&request).await;
        }

        match &self.renderer {
            Some(renderer) if self.config.vision_fallback => {
                tracing::info!("no text layer found, falling back to page images");
                self.extract_from_images(Arc::clone(renderer), bytes, options)
                    .await
            }
            _ => Err(DocParseError::EmptyDocument),
        }
    }

    /// Extract fields from already-extracted document text.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, DocParseError> {
        fields::validate_fields(&request.fields)?;
        self.check_size(request.document_text.len())?;
        // Fail on empty text before any network call.
        prompt::build_prompt(request, PromptStyle::Standard)?;

        let validated = self
            .complete_validated(
                &self.config.model,
                Vec::new(),
                &request.fields,
                request.discovery_mode,
                |style| prompt::build_prompt(request, style),
            )
            .await?;

        Ok(self.finish(&request.fields, validated, ResultSource::Text))
    }

    async fn extract_from_images(
        &self,
        renderer: Arc<dyn PageRenderer>,
        bytes: Arc<Vec<u8>>,
        options: ParseOptions,
    ) -> Result<ExtractionResult, DocParseError> {
        let images = tokio::task::spawn_blocking(move || renderer.render_pages(&bytes))
            .await
            .map_err(|e| DocParseError::Extraction(format!("render task failed: {}", e)))??;
        tracing::info!(pages = images.len(), "rendered page images");

        let pngs: Vec<String> = images.into_iter().map(|i| i.png_base64).collect();
        let instructions = options.extraction_instructions.as_deref();

        let validated = self
            .complete_validated(
                &self.config.vision_model,
                pngs,
                &options.fields,
                options.discovery_mode,
                |style| {
                    Ok(prompt::build_image_prompt(
                        &options.fields,
                        options.discovery_mode,
                        instructions,
                        style,
                    ))
                },
            )
            .await?;

        Ok(self.finish(&options.fields, validated, ResultSource::Vision))
    }

    /// Call the model and validate the reply. An unparseable reply is retried
    /// once with the strict prompt.
    async fn complete_validated<F>(
        &self,
        model: &str,
        images: Vec<String>,
        fields: &[ConfigurableField],
        discovery_mode: bool,
        build: F,
    ) -> Result<ValidatedResponse, DocParseError>
    where
        F: Fn(PromptStyle) -> Result<Prompt, DocParseError>,
    {
        let mut request = CompletionRequest {
            model: model.to_string(),
            system: String::new(),
            user: String::new(),
            images,
            expected_fields: fields.iter().map(|f| f.name.clone()).collect(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut style = PromptStyle::Standard;
        loop {
            let prompt = build(style)?;
            request.system = prompt.system;
            request.user = prompt.user;

            let start = Instant::now();
            let reply = self.client.complete(&request).await?;
            tracing::info!(
                model = %request.model,
                elapsed = ?start.elapsed(),
                reply_chars = reply.len(),
                "model replied"
            );

            match validate::validate_response(&reply, fields, discovery_mode) {
                Err(DocParseError::ResponseParse(reason)) if style == PromptStyle::Standard => {
                    tracing::warn!(%reason, "unparseable reply, retrying with strict prompt");
                    style = PromptStyle::Strict;
                }
                other => return other,
            }
        }
    }

    fn finish(
        &self,
        fields: &[ConfigurableField],
        validated: ValidatedResponse,
        source: ResultSource,
    ) -> ExtractionResult {
        let confidence_score = scoring::confidence_score(
            fields,
            &validated.values,
            validated.discovered_fields.len(),
            &self.config.scoring,
        );

        let result = ExtractionResult {
            values: validated.values,
            discovered_fields: validated.discovered_fields,
            confidence_score,
            model_confidence: validated.model_confidence,
            processing_notes: validated.processing_notes,
            issues: validated.issues,
            source,
        };
        tracing::info!(
            %source,
            populated = result.populated_count(),
            requested = fields.len(),
            discovered = result.discovered_fields.len(),
            confidence = result.confidence_score,
            "extraction complete"
        );
        result
    }

    fn check_size(&self, size: usize) -> Result<(), DocParseError> {
        if size > self.config.max_document_bytes {
            return Err(DocParseError::DocumentTooLarge {
                size,
                limit: self.config.max_document_bytes,
            });
        }
        Ok(())
    }
}
