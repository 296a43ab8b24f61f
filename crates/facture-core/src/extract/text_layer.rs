//! Embedded text layer strategy.

use tracing::debug;

use super::{Extractor, StrategyKind};
use crate::error::ResourceError;
use crate::fields::PatternMatcher;
use crate::models::document::Document;
use crate::models::extraction::ExtractionResult;
use crate::pdf::{PdfTextLayer, TextLayer};

/// Matches fields against the document's own text.
pub struct TextLayerExtractor {
    layer: Box<dyn TextLayer>,
    matcher: PatternMatcher,
}

impl TextLayerExtractor {
    /// Text layer extractor backed by `pdf-extract`.
    pub fn new(matcher: PatternMatcher) -> Self {
        Self::with_layer(Box::new(PdfTextLayer::new()), matcher)
    }

    pub fn with_layer(layer: Box<dyn TextLayer>, matcher: PatternMatcher) -> Self {
        Self { layer, matcher }
    }
}

impl Extractor for TextLayerExtractor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextLayer
    }

    fn extract(&self, document: &Document) -> Result<ExtractionResult, ResourceError> {
        let pages = match self.layer.page_texts(document.bytes()) {
            Ok(pages) => pages,
            Err(e) => {
                debug!("No text layer in {}: {}", document.display_name(), e);
                return Ok(ExtractionResult::new());
            }
        };

        Ok(self.matcher.match_text(&pages.join("\n")))
    }
}
