//! Optical character recognition capability.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::OnnxRecognizer;

use image::DynamicImage;

use crate::error::OcrError;

/// Converts one page image into text.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text of a page, lines in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Recognition model family for an ISO 639-2 language code.
///
/// PaddleOCR ships one recognition model per script; all Latin-script
/// languages share the `latin` model.
pub fn script_for_language(language: &str) -> Result<&'static str, OcrError> {
    let code = language.trim().to_lowercase();
    match code.as_str() {
        "fra" | "fre" | "eng" | "deu" | "ger" | "spa" | "ita" | "por" | "nld" | "dut" | "pol"
        | "cat" | "ron" | "rum" => Ok("latin"),
        "rus" | "ukr" | "bul" | "srp" => Ok("cyrillic"),
        "ara" | "fas" | "per" | "urd" => Ok("arabic"),
        _ => Err(OcrError::UnsupportedLanguage(language.to_string())),
    }
}
