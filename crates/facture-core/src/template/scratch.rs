//! Temporary on-disk copies of in-memory documents.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::ResourceError;

/// A document written to a temporary `.pdf` file.
///
/// The file is removed when the value is dropped, whether extraction
/// succeeded or not.
#[derive(Debug)]
pub struct ScratchDocument {
    file: NamedTempFile,
}

impl ScratchDocument {
    /// Write `data` to a new file in `dir`, or in the system temp dir.
    pub fn create(dir: Option<&Path>, data: &[u8]) -> Result<Self, ResourceError> {
        let target = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let scratch_err = |source| ResourceError::ScratchFile {
            dir: target.clone(),
            source,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("facture-").suffix(".pdf");
        let mut file = builder.tempfile_in(&target).map_err(scratch_err)?;
        file.write_all(data).map_err(scratch_err)?;
        file.flush().map_err(scratch_err)?;

        trace!("Scratch copy at {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_holds_data_and_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDocument::create(Some(dir.path()), b"%PDF-1.5 test").unwrap();

        let path = scratch.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 test");
        assert_eq!(path.extension().unwrap(), "pdf");
        assert_eq!(path.parent(), Some(dir.path()));

        drop(scratch);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_dir_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        match ScratchDocument::create(Some(&missing), b"data") {
            Err(ResourceError::ScratchFile { dir, .. }) => assert_eq!(dir, missing),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
