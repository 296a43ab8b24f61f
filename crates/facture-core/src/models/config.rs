//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::field::Field;

/// Main configuration for facture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactureConfig {
    /// Field catalog configuration.
    pub extraction: ExtractionConfig,

    /// Template-based extraction configuration.
    pub templates: TemplateConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Output and batch configuration.
    pub output: OutputConfig,
}

/// Field catalog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rules replacing the built-in rule for a field.
    ///
    /// Rules are compiled case-insensitive and multiline, and must contain
    /// at least one capture group.
    pub patterns: BTreeMap<Field, String>,
}

/// Template catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Run the template stage.
    pub enabled: bool,

    /// Directory of `*.json` template files. The stage is skipped when unset.
    pub dir: Option<PathBuf>,

    /// Where scratch copies of documents are written (system temp dir if unset).
    pub scratch_dir: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            scratch_dir: None,
        }
    }
}

/// OCR stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run the OCR stage.
    pub enabled: bool,

    /// Document language (ISO 639-2 code, e.g. "fra").
    pub language: String,

    /// Per-document budget for the OCR stage, in seconds (0 = unlimited).
    pub timeout_secs: u64,

    /// Maximum pages to recognize (0 = unlimited).
    pub max_pages: usize,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "fra".to_string(),
            timeout_secs: 120,
            max_pages: 10,
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// The OCR deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// OCR model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
        }
    }
}

impl ModelConfig {
    /// Detection model path.
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }

    /// Recognition model and dictionary paths for a script family.
    pub fn recognition_paths(&self, script: &str) -> (PathBuf, PathBuf) {
        (
            self.model_dir.join(format!("{}_rec.onnx", script)),
            self.model_dir.join(format!("{}_dict.txt", script)),
        )
    }
}

/// Output and batch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV ledger that results are appended to.
    pub csv_path: PathBuf,

    /// Number of documents processed concurrently in batch mode.
    pub jobs: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("extracted_data.csv"),
            jobs: 4,
        }
    }
}

impl FactureConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{
            "ocr": {"language": "eng"},
            "extraction": {"patterns": {"quantity": "(Qty):?\\s*(\\d+)"}}
        }"#;
        let config: FactureConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.timeout_secs, 120);
        assert!(config.templates.enabled);
        assert_eq!(config.output.jobs, 4);
        assert!(config.extraction.patterns.contains_key(&Field::Quantity));
    }

    #[test]
    fn test_zero_timeout_means_unlimited() {
        let mut ocr = OcrConfig::default();
        assert_eq!(ocr.timeout(), Some(Duration::from_secs(120)));
        ocr.timeout_secs = 0;
        assert_eq!(ocr.timeout(), None);
    }

    #[test]
    fn test_recognition_paths_follow_script() {
        let models = ModelConfig::default();
        let (rec, dict) = models.recognition_paths("latin");
        assert_eq!(rec, PathBuf::from("models/latin_rec.onnx"));
        assert_eq!(dict, PathBuf::from("models/latin_dict.txt"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FactureConfig::default();
        config.output.jobs = 2;
        config.save(&path).unwrap();

        let loaded = FactureConfig::from_file(&path).unwrap();
        assert_eq!(loaded.output.jobs, 2);
    }
}
