//! PDF decoding capabilities used by the extractors.

mod rasterizer;
mod text_layer;

pub use rasterizer::LopdfRasterizer;
pub use text_layer::PdfTextLayer;

use std::panic::{self, AssertUnwindSafe};

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Rendered pages of one document, produced lazily in page order.
///
/// Each item is one page; a page that cannot be rendered is an `Err`
/// without ending the iteration.
pub type PageImages<'a> = Box<dyn Iterator<Item = Result<DynamicImage>> + 'a>;

/// Reads the embedded text layer of a document.
pub trait TextLayer: Send + Sync {
    /// Text of every page, in page order.
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>>;
}

/// Turns document pages into images for recognition.
pub trait PageRasterizer: Send + Sync {
    /// Open `data` and return its pages as images.
    ///
    /// Fails only when the document itself cannot be opened.
    fn rasterize<'a>(&'a self, data: &'a [u8]) -> Result<PageImages<'a>>;
}

/// Run a `pdf-extract` call, turning a panic into a parse error.
///
/// `pdf-extract` panics on some malformed fonts and streams instead of
/// returning an error.
pub(crate) fn catch_decoder_panic<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "decoder panicked".to_string());
            Err(PdfError::Parse(reason))
        }
    }
}
