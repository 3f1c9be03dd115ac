pub mod lopdf_text;
pub mod pdftoppm;
pub mod pdftotext;

use crate::error::DocParseError;

/// Text extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    pub text: String,
}

/// A rendered page, PNG-encoded and base64-wrapped for a multimodal request.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page_number: usize,
    pub png_base64: String,
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, DocParseError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for backends that rasterise PDF pages for the vision fallback.
pub trait PageRenderer: Send + Sync {
    fn render_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageImage>, DocParseError>;

    fn backend_name(&self) -> &str;
}

/// Join page texts into one document, dropping blank pages.
pub fn join_pages(pages: &[PageContent]) -> String {
    pages
        .iter()
        .map(|p| p.text.trim_end())
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Check for the `%PDF-` signature. Some producers emit junk before it, so
/// the first kilobyte is searched rather than only the first bytes.
pub fn validate_pdf(pdf_bytes: &[u8]) -> Result<(), DocParseError> {
    if pdf_bytes.is_empty() {
        return Err(DocParseError::InvalidPdf("file is empty".into()));
    }
    let head = &pdf_bytes[..pdf_bytes.len().min(1024)];
    if head.windows(5).any(|w| w == b"%PDF-") {
        Ok(())
    } else {
        Err(DocParseError::InvalidPdf("missing %PDF- header".into()))
    }
}
