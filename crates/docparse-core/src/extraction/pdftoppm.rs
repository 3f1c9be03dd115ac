use crate::error::DocParseError;
use crate::extraction::{PageImage, PageRenderer};
use base64::Engine;
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Page rasteriser using pdftoppm (from poppler-utils).
pub struct PdftoppmRenderer {
    /// Render resolution. 200 DPI keeps small print legible for the vision model.
    pub dpi: u32,
    /// Only the first `max_pages` pages are rendered.
    pub max_pages: usize,
}

impl PdftoppmRenderer {
    pub fn new() -> Self {
        PdftoppmRenderer {
            dpi: 200,
            max_pages: 10,
        }
    }

    pub fn is_available() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageImage>, DocParseError> {
        let workdir = tempfile::tempdir().map_err(|e| DocParseError::Extraction(e.to_string()))?;
        let input = workdir.path().join("input.pdf");
        let mut file = std::fs::File::create(&input)?;
        file.write_all(pdf_bytes)?;
        drop(file);

        let prefix = workdir.path().join("page");
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-l")
            .arg(self.max_pages.to_string())
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DocParseError::PopplerNotFound { tool: "pdftoppm" }
                } else {
                    DocParseError::Extraction(format!("pdftoppm failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DocParseError::PopplerFailed {
                tool: "pdftoppm",
                code,
                stderr,
            });
        }

        let mut rendered = Vec::new();
        for entry in std::fs::read_dir(workdir.path())? {
            let path = entry?.path();
            if let Some(page_number) = page_number_from_path(&path) {
                rendered.push((page_number, path));
            }
        }
        rendered.sort_by_key(|(n, _)| *n);

        let mut images = Vec::with_capacity(rendered.len());
        for (page_number, path) in rendered {
            let png = std::fs::read(&path)?;
            images.push(PageImage {
                page_number,
                png_base64: base64::engine::general_purpose::STANDARD.encode(png),
            });
        }

        if images.is_empty() {
            return Err(DocParseError::Extraction(
                "pdftoppm produced no page images".into(),
            ));
        }

        Ok(images)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// pdftoppm names pages `page-1.png` or `page-01.png` depending on page count.
fn page_number_from_path(path: &Path) -> Option<usize> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix("page-")?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_from_path() {
        assert_eq!(page_number_from_path(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number_from_path(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number_from_path(Path::new("/tmp/x/input.pdf")), None);
        assert_eq!(page_number_from_path(Path::new("/tmp/x/other-1.png")), None);
    }
}
