//! Loading and selecting invoice templates.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::layout::{CompiledTemplate, InvoiceTemplate};
use crate::error::TemplateError;
use crate::models::extraction::ExtractionResult;

/// An ordered set of templates. Earlier templates win classification.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<CompiledTemplate>,
}

impl TemplateCatalog {
    /// A catalog that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `*.json` file of a directory, in file name order.
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let read_err = |source| TemplateError::Read {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(read_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let templates = paths
            .iter()
            .map(|path| Self::load_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = Self::from_templates(templates)?;
        info!("Loaded {} templates from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    /// Parse one template file.
    pub fn load_file(path: &Path) -> Result<InvoiceTemplate, TemplateError> {
        let content = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compile templates and order them by descending priority.
    ///
    /// Templates of equal priority keep their given order.
    pub fn from_templates(templates: Vec<InvoiceTemplate>) -> Result<Self, TemplateError> {
        let mut templates = templates
            .into_iter()
            .map(CompiledTemplate::compile)
            .collect::<Result<Vec<_>, _>>()?;
        templates.sort_by_key(|t| std::cmp::Reverse(t.priority()));
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[CompiledTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The first template whose keywords match `text`.
    pub fn classify(&self, text: &str) -> Option<&CompiledTemplate> {
        self.templates
            .iter()
            .find(|t| t.matches(&t.prepare(text)))
    }

    /// Classify `text` and extract with the selected template.
    ///
    /// Only the first matching template is used; an unmatched document or a
    /// matched one missing required fields gives an empty result.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        match self.classify(text) {
            Some(template) => {
                debug!("Document classified as '{}'", template.issuer());
                template.extract(&template.prepare(text))
            }
            None => {
                debug!("No template matches document");
                ExtractionResult::new()
            }
        }
    }
}
