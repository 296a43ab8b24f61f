//! Core library for French invoice field extraction.
//!
//! This crate provides:
//! - A field catalog of label-anchored rules (amount due, IBAN, VAT, quantity, due date)
//! - Issuer templates with typed values (amounts, dates, integers)
//! - Text layer extraction and OCR of scanned pages
//! - A pipeline trying template, text layer and OCR in turn, keeping the first non-empty result

pub mod error;
pub mod extract;
pub mod fields;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod template;

#[cfg(test)]
mod test_support;

pub use error::{FactureError, ResourceError, Result};
pub use extract::{Extractor, StrategyKind};
pub use fields::{FieldCatalog, PatternMatcher};
pub use models::config::FactureConfig;
pub use models::document::Document;
pub use models::extraction::ExtractionResult;
pub use models::field::Field;
pub use pipeline::{ExtractionPipeline, PipelineOutcome};
pub use template::TemplateCatalog;
