//! Embedded text extraction using pdf-extract.

use std::path::Path;

use tracing::debug;

use super::{catch_decoder_panic, Result, TextLayer};
use crate::error::PdfError;

/// Text layer reader backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextLayer;

impl PdfTextLayer {
    pub fn new() -> Self {
        Self
    }

    /// Whole-document text of a PDF on disk.
    pub fn file_text(&self, path: &Path) -> Result<String> {
        catch_decoder_panic(|| {
            pdf_extract::extract_text(path).map_err(|e| PdfError::TextExtraction(e.to_string()))
        })
    }
}

impl TextLayer for PdfTextLayer {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>> {
        if data.is_empty() {
            return Err(PdfError::Parse("empty input".to_string()));
        }

        let pages = catch_decoder_panic(|| {
            pdf_extract::extract_text_from_mem_by_pages(data)
                .map_err(|e| PdfError::TextExtraction(e.to_string()))
        })?;

        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!(
            "Text layer: {} pages, {} chars",
            pages.len(),
            pages.iter().map(String::len).sum::<usize>()
        );
        Ok(pages)
    }
}
