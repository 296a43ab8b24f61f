//! Extraction strategies.
//!
//! Each strategy reads a document its own way and reports the fields it
//! found. Decoding problems stay inside a strategy and show up as an
//! empty result; only [`ResourceError`] crosses the boundary.

pub mod ocr;
pub mod template;
pub mod text_layer;

pub use ocr::OcrExtractor;
pub use template::TemplateExtractor;
pub use text_layer::TextLayerExtractor;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::models::document::Document;
use crate::models::extraction::ExtractionResult;

/// Strategies in the order the pipeline tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Template,
    TextLayer,
    Ocr,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Template => "template",
            StrategyKind::TextLayer => "text_layer",
            StrategyKind::Ocr => "ocr",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way of reading fields out of a document.
pub trait Extractor: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Extract fields from `document`.
    ///
    /// An unreadable document or one without matches gives an empty
    /// result. Errors are reserved for resources the strategy could not
    /// acquire.
    fn extract(&self, document: &Document) -> Result<ExtractionResult, ResourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_sort_in_pipeline_order() {
        let mut kinds = vec![StrategyKind::Ocr, StrategyKind::Template, StrategyKind::TextLayer];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![StrategyKind::Template, StrategyKind::TextLayer, StrategyKind::Ocr]
        );
        assert_eq!(StrategyKind::TextLayer.to_string(), "text_layer");
    }
}
