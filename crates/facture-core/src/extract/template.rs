//! Template-based strategy.

use std::path::PathBuf;

use tracing::debug;

use super::{Extractor, StrategyKind};
use crate::error::ResourceError;
use crate::models::document::Document;
use crate::models::extraction::ExtractionResult;
use crate::pdf::PdfTextLayer;
use crate::template::{ScratchDocument, TemplateCatalog};

/// Extracts fields with the issuer template that matches the document.
///
/// The template reader works on files, so each attempt writes a scratch
/// copy of the document that is removed before the attempt returns.
#[derive(Debug)]
pub struct TemplateExtractor {
    catalog: TemplateCatalog,
    scratch_dir: Option<PathBuf>,
    reader: PdfTextLayer,
}

impl TemplateExtractor {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self {
            catalog,
            scratch_dir: None,
            reader: PdfTextLayer::new(),
        }
    }

    /// Write scratch copies to `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }
}

impl Extractor for TemplateExtractor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Template
    }

    fn extract(&self, document: &Document) -> Result<ExtractionResult, ResourceError> {
        if self.catalog.is_empty() || document.is_empty() {
            return Ok(ExtractionResult::new());
        }

        let scratch = ScratchDocument::create(self.scratch_dir.as_deref(), document.bytes())?;

        let text = match self.reader.file_text(scratch.path()) {
            Ok(text) => text,
            Err(e) => {
                debug!("Template stage cannot read {}: {}", document.display_name(), e);
                return Ok(ExtractionResult::new());
            }
        };

        Ok(self.catalog.extract(&text))
    }
}
