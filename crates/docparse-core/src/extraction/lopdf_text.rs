use crate::error::DocParseError;
use crate::extraction::{PageContent, PdfExtractor};
use ::lopdf::Document;

/// Pure-Rust extraction backend built on `lopdf`.
///
/// Lower fidelity than pdftotext (no layout preservation) but needs no
/// external tools.
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        LopdfExtractor
    }
}

impl Default for LopdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, DocParseError> {
        let doc =
            Document::load_mem(pdf_bytes).map_err(|e| DocParseError::InvalidPdf(e.to_string()))?;

        let mut pages = Vec::new();
        for (index, page_number) in doc.get_pages().keys().enumerate() {
            let text = match doc.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(e) => {
                    // Unsupported fonts or encodings: keep the page, without text
                    tracing::warn!(page = *page_number, error = %e, "lopdf could not extract page text");
                    String::new()
                }
            };
            pages.push(PageContent {
                page_number: index + 1,
                text,
            });
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_invalid_pdf() {
        let err = LopdfExtractor::new()
            .extract_pages(b"this is not a pdf")
            .unwrap_err();
        assert!(matches!(err, DocParseError::InvalidPdf(_)));
    }
}
