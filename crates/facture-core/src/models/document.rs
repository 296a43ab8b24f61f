//! Input documents.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// One invoice file, as raw bytes.
///
/// Cloning is cheap and shares the buffer; the bytes are never mutated.
#[derive(Clone)]
pub struct Document {
    data: Arc<[u8]>,
    name: Option<String>,
}

impl Document {
    /// Wrap raw bytes.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            data: data.into(),
            name: None,
        }
    }

    /// Attach a display name (usually the attachment filename).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a document from disk, named after its file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let doc = Self::new(data);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => doc.with_name(name),
            None => doc,
        })
    }

    /// The document bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Display name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for log lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

impl From<Vec<u8>> for Document {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Document {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}
