//! Error types for the facture-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::field::Field;

/// Main error type for the facture library.
#[derive(Error, Debug)]
pub enum FactureError {
    /// PDF decoding error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR engine error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invalid field catalog.
    #[error("field catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Invalid template catalog.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Scratch resources could not be acquired.
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while decoding a document.
///
/// Strategies never surface these to the pipeline caller: an undecodable
/// document simply yields an empty result for that strategy.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract the text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a page image.
    #[error("failed to rasterize page {page}: {reason}")]
    Rasterize { page: u32, reason: String },

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// No recognition model exists for the requested language.
    #[error("unsupported OCR language: {0}")]
    UnsupportedLanguage(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// A field rule that cannot be used.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The rule does not compile.
    #[error("rule for {field} does not compile: {source}")]
    InvalidRule {
        field: Field,
        #[source]
        source: regex::Error,
    },

    /// The rule has no capture group to read a value from.
    #[error("rule for {field} has no capture group")]
    NoCaptureGroup { field: Field },
}

/// A template file that cannot be loaded.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Failed to read the template directory or file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template file is not valid JSON for the template schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A keyword or field rule does not compile.
    #[error("template '{issuer}': invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        issuer: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The template declares no keywords, so it would match every document.
    #[error("template '{0}' has no keywords")]
    NoKeywords(String),

    /// A required field has no extraction rule.
    #[error("template '{issuer}': required field {field} has no rule")]
    MissingRule { issuer: String, field: Field },

    /// A date format string is not a valid `chrono` format.
    #[error("template '{issuer}': invalid date format '{format}'")]
    InvalidDateFormat { issuer: String, format: String },
}

/// Scratch resources a strategy could not acquire.
///
/// This is the only failure class that escapes the pipeline: no later
/// strategy can make up for a missing scratch area, so the caller skips
/// the document.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Creating or writing a scratch copy of the document failed.
    #[error("failed to materialize scratch document in {dir}: {source}")]
    ScratchFile {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for the facture library.
pub type Result<T> = std::result::Result<T, FactureError>;
