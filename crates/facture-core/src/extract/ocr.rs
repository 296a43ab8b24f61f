//! OCR strategy for scanned documents.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{Extractor, StrategyKind};
use crate::error::ResourceError;
use crate::fields::PatternMatcher;
use crate::models::document::Document;
use crate::models::extraction::ExtractionResult;
use crate::ocr::TextRecognizer;
use crate::pdf::{LopdfRasterizer, PageRasterizer};

/// Recognizes page images and matches fields in the recognized text.
pub struct OcrExtractor {
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn TextRecognizer>,
    matcher: PatternMatcher,
    timeout: Option<Duration>,
    max_pages: usize,
}

impl OcrExtractor {
    /// OCR extractor rendering pages with lopdf.
    pub fn new(recognizer: Box<dyn TextRecognizer>, matcher: PatternMatcher) -> Self {
        Self::with_rasterizer(Box::new(LopdfRasterizer::new()), recognizer, matcher)
    }

    pub fn with_rasterizer(
        rasterizer: Box<dyn PageRasterizer>,
        recognizer: Box<dyn TextRecognizer>,
        matcher: PatternMatcher,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            matcher,
            timeout: None,
            max_pages: 0,
        }
    }

    /// Give up on a document once `timeout` has elapsed.
    ///
    /// The deadline is checked between pages and after the last one; a run
    /// that ends past it yields an empty result.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recognize at most `max_pages` pages (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Recognized text of the document's pages, in order.
    ///
    /// `None` when the document cannot be opened or the deadline passes.
    fn recognize_pages(&self, document: &Document) -> Option<String> {
        let started = Instant::now();
        let name = document.display_name();

        let pages = match self.rasterizer.rasterize(document.bytes()) {
            Ok(pages) => pages,
            Err(e) => {
                debug!("Cannot rasterize {}: {}", name, e);
                return None;
            }
        };

        let limit = if self.max_pages == 0 { usize::MAX } else { self.max_pages };
        let mut texts = Vec::new();

        for (index, page) in pages.take(limit).enumerate() {
            if self.deadline_passed(started) {
                warn!("OCR of {} timed out after {} pages", name, index);
                return None;
            }

            let text = page
                .map_err(|e| e.to_string())
                .and_then(|image| self.recognizer.recognize(&image).map_err(|e| e.to_string()));

            match text {
                Ok(text) => texts.push(text),
                Err(reason) => {
                    warn!("OCR of {} page {} failed: {}", name, index + 1, reason);
                    texts.push(String::new());
                }
            }
        }

        if self.deadline_passed(started) {
            warn!("OCR of {} timed out on its last page", name);
            return None;
        }

        debug!(
            "OCR of {}: {} pages in {}ms",
            name,
            texts.len(),
            started.elapsed().as_millis()
        );
        Some(texts.join("\n"))
    }

    fn deadline_passed(&self, started: Instant) -> bool {
        self.timeout.is_some_and(|timeout| started.elapsed() >= timeout)
    }
}

impl Extractor for OcrExtractor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ocr
    }

    fn extract(&self, document: &Document) -> Result<ExtractionResult, ResourceError> {
        Ok(self
            .recognize_pages(document)
            .map(|text| self.matcher.match_text(&text))
            .unwrap_or_default())
    }
}
