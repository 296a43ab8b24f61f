//! The fallback chain: template, then text layer, then OCR.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{FactureError, ResourceError};
use crate::extract::{Extractor, StrategyKind, TemplateExtractor, TextLayerExtractor};
use crate::fields::{FieldCatalog, PatternMatcher};
use crate::models::config::FactureConfig;
use crate::models::document::Document;
use crate::models::extraction::ExtractionResult;
use crate::template::TemplateCatalog;

/// What the pipeline produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Fields of the winning strategy, or empty.
    pub result: ExtractionResult,

    /// The strategy that produced `result`; `None` when nothing was found.
    pub strategy: Option<StrategyKind>,

    /// Wall time spent on the document.
    pub elapsed: Duration,
}

impl PipelineOutcome {
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// Runs strategies in priority order and keeps the first non-empty result.
///
/// Results are never merged across strategies. The pipeline is immutable
/// once built and can be shared between threads.
pub struct ExtractionPipeline {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractionPipeline {
    /// Build a pipeline; strategies are ordered by kind, not by position.
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        let mut extractors = extractors;
        extractors.sort_by_key(|e| e.kind());
        Self { extractors }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Assemble the configured strategies.
    ///
    /// The template stage needs a template directory. The OCR stage is
    /// left out with a warning when its models are not available.
    pub fn from_config(config: &FactureConfig) -> Result<Self, FactureError> {
        let catalog = Arc::new(FieldCatalog::from_config(&config.extraction)?);
        let matcher = PatternMatcher::new(catalog);
        let mut builder = Self::builder();

        match (config.templates.enabled, &config.templates.dir) {
            (true, Some(dir)) => {
                let mut extractor = TemplateExtractor::new(TemplateCatalog::load_dir(dir)?);
                if let Some(scratch) = &config.templates.scratch_dir {
                    extractor = extractor.with_scratch_dir(scratch);
                }
                builder = builder.with_extractor(Box::new(extractor));
            }
            (true, None) => debug!("No template directory configured, template stage disabled"),
            (false, _) => debug!("Template stage disabled"),
        }

        builder = builder.with_extractor(Box::new(TextLayerExtractor::new(matcher.clone())));

        if config.ocr.enabled {
            if let Some(extractor) = ocr_stage(config, matcher)? {
                builder = builder.with_extractor(extractor);
            }
        } else {
            debug!("OCR stage disabled");
        }

        Ok(builder.build())
    }

    /// Strategies in the order they run.
    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.extractors.iter().map(|e| e.kind()).collect()
    }

    /// Extract fields from one document.
    ///
    /// Fails only when a strategy cannot acquire its scratch resources;
    /// the document should then be skipped.
    pub fn run(&self, document: &Document) -> Result<PipelineOutcome, ResourceError> {
        let started = Instant::now();
        let name = document.display_name();

        for extractor in &self.extractors {
            let kind = extractor.kind();
            let result = extractor.extract(document)?;

            if !result.is_empty() {
                info!("{}: {} fields via {}", name, result.len(), kind);
                return Ok(PipelineOutcome {
                    result,
                    strategy: Some(kind),
                    elapsed: started.elapsed(),
                });
            }
            debug!("{}: {} stage found nothing", name, kind);
        }

        info!("{}: no relevant data found", name);
        Ok(PipelineOutcome {
            result: ExtractionResult::new(),
            strategy: None,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(feature = "native")]
fn ocr_stage(
    config: &FactureConfig,
    matcher: PatternMatcher,
) -> Result<Option<Box<dyn Extractor>>, FactureError> {
    use crate::error::OcrError;
    use crate::extract::OcrExtractor;
    use crate::ocr::OnnxRecognizer;

    match OnnxRecognizer::from_config(&config.models, &config.ocr) {
        Ok(recognizer) => {
            let extractor: Box<dyn Extractor> = Box::new(
                OcrExtractor::new(Box::new(recognizer), matcher)
                    .with_timeout(config.ocr.timeout())
                    .with_max_pages(config.ocr.max_pages),
            );
            Ok(Some(extractor))
        }
        Err(OcrError::UnsupportedLanguage(language)) => Err(FactureError::Config(format!(
            "no OCR model for language '{}'",
            language
        ))),
        Err(e) => {
            warn!("OCR stage disabled: {}", e);
            Ok(None)
        }
    }
}

#[cfg(not(feature = "native"))]
fn ocr_stage(
    _config: &FactureConfig,
    _matcher: PatternMatcher,
) -> Result<Option<Box<dyn Extractor>>, FactureError> {
    warn!("OCR stage disabled: built without the `native` feature");
    Ok(None)
}

/// Collects strategies for an [`ExtractionPipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    extractors: Vec<Box<dyn Extractor>>,
}

impl PipelineBuilder {
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn build(self) -> ExtractionPipeline {
        ExtractionPipeline::new(self.extractors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::field::Field;
    use crate::test_support::text_pdf;

    struct Scripted {
        kind: StrategyKind,
        result: ExtractionResult,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(kind: StrategyKind, fields: &[(Field, &str)]) -> Self {
            Self {
                kind,
                result: fields.iter().map(|(f, v)| (*f, v.to_string())).collect(),
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(kind: StrategyKind) -> Self {
            Self {
                fail: true,
                ..Self::new(kind, &[])
            }
        }
    }

    impl Extractor for Scripted {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn extract(&self, _document: &Document) -> Result<ExtractionResult, ResourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ResourceError::ScratchFile {
                    dir: "/nonexistent".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
                });
            }
            Ok(self.result.clone())
        }
    }

    fn doc() -> Document {
        Document::new(b"%PDF-1.5".to_vec()).with_name("invoice.pdf")
    }

    #[test]
    fn test_first_non_empty_strategy_wins() {
        let template = Scripted::new(StrategyKind::Template, &[(Field::AmountDue, "100.00")]);
        let text = Scripted::new(StrategyKind::TextLayer, &[(Field::Iban, "FR76 3000")]);
        let ocr = Scripted::new(StrategyKind::Ocr, &[(Field::Quantity, "2")]);
        let (text_calls, ocr_calls) = (text.calls.clone(), ocr.calls.clone());

        let pipeline = ExtractionPipeline::builder()
            .with_extractor(Box::new(template))
            .with_extractor(Box::new(text))
            .with_extractor(Box::new(ocr))
            .build();

        let outcome = pipeline.run(&doc()).unwrap();
        assert_eq!(outcome.strategy, Some(StrategyKind::Template));
        assert_eq!(outcome.result.get(Field::AmountDue), Some("100.00"));
        assert!(!outcome.result.contains(Field::Iban));
        assert_eq!(text_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ocr_result_is_final_when_earlier_stages_are_empty() {
        let ocr = Scripted::new(StrategyKind::Ocr, &[(Field::DueDate, "30/04/2024")]);
        let pipeline = ExtractionPipeline::new(vec![
            Box::new(ocr),
            Box::new(Scripted::new(StrategyKind::TextLayer, &[])),
            Box::new(Scripted::new(StrategyKind::Template, &[])),
        ]);

        assert_eq!(
            pipeline.strategies(),
            vec![StrategyKind::Template, StrategyKind::TextLayer, StrategyKind::Ocr]
        );

        let outcome = pipeline.run(&doc()).unwrap();
        assert_eq!(outcome.strategy, Some(StrategyKind::Ocr));
        assert_eq!(outcome.result.get(Field::DueDate), Some("30/04/2024"));
    }

    #[test]
    fn test_all_empty_gives_empty_outcome() {
        let pipeline = ExtractionPipeline::new(vec![
            Box::new(Scripted::new(StrategyKind::TextLayer, &[])),
            Box::new(Scripted::new(StrategyKind::Ocr, &[])),
        ]);

        let outcome = pipeline.run(&doc()).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.strategy, None);
    }

    #[test]
    fn test_resource_failure_propagates() {
        let text = Scripted::new(StrategyKind::TextLayer, &[(Field::Quantity, "1")]);
        let text_calls = text.calls.clone();
        let pipeline = ExtractionPipeline::new(vec![
            Box::new(Scripted::failing(StrategyKind::Template)),
            Box::new(text),
        ]);

        assert!(matches!(pipeline.run(&doc()), Err(ResourceError::ScratchFile { .. })));
        assert_eq!(text_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_is_idempotent() {
        let pipeline = ExtractionPipeline::new(vec![Box::new(Scripted::new(
            StrategyKind::TextLayer,
            &[(Field::Iban, "FR76 3000"), (Field::TaxAmount, "20,00")],
        ))]);

        let first = pipeline.run(&doc()).unwrap();
        let second = pipeline.run(&doc()).unwrap();
        assert_eq!(first.result, second.result);
        assert_eq!(first.strategy, second.strategy);
    }

    #[test]
    fn test_from_config_runs_real_text_layer() {
        let mut config = FactureConfig::default();
        config.ocr.enabled = false;

        let pipeline = ExtractionPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.strategies(), vec![StrategyKind::TextLayer]);

        let outcome = pipeline
            .run(&Document::new(text_pdf(&["Facture", "Taxe : 19,60 %", "Qte : 5"])))
            .unwrap();
        assert_eq!(outcome.strategy, Some(StrategyKind::TextLayer));
        assert_eq!(outcome.result.get(Field::Quantity), Some("5"));
        assert_eq!(outcome.result.get(Field::TaxAmount), Some("19,60 %"));
    }

    #[test]
    fn test_from_config_with_templates_and_missing_models() {
        let templates = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        std::fs::write(
            templates.path().join("acme.json"),
            r#"{"issuer": "ACME", "keywords": ["ACME"], "fields": {"quantity": "Lot (\\d+)"}}"#,
        )
        .unwrap();

        let mut config = FactureConfig::default();
        config.templates.dir = Some(templates.path().to_path_buf());
        config.models.model_dir = models.path().to_path_buf();

        let pipeline = ExtractionPipeline::from_config(&config).unwrap();
        assert_eq!(
            pipeline.strategies(),
            vec![StrategyKind::Template, StrategyKind::TextLayer]
        );

        let outcome = pipeline
            .run(&Document::new(text_pdf(&["ACME\nLot 12\nQuantite : 99"])))
            .unwrap();
        assert_eq!(outcome.strategy, Some(StrategyKind::Template));
        assert_eq!(outcome.result.get(Field::Quantity), Some("12"));
    }

    #[test]
    fn test_from_config_rejects_bad_rule() {
        let mut config = FactureConfig::default();
        config
            .extraction
            .patterns
            .insert(Field::Quantity, "Qty (\\d+".to_string());

        assert!(matches!(
            ExtractionPipeline::from_config(&config),
            Err(FactureError::Catalog(_))
        ));
    }

    #[test]
    fn test_empty_and_garbage_documents() {
        let mut config = FactureConfig::default();
        config.ocr.enabled = false;
        let pipeline = ExtractionPipeline::from_config(&config).unwrap();

        assert!(pipeline.run(&Document::new(Vec::new())).unwrap().is_empty());
        assert!(pipeline.run(&Document::new(b"GIF89a".to_vec())).unwrap().is_empty());
    }
}
