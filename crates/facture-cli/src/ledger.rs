//! Append-only CSV ledger of extracted fields.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use facture_core::ExtractionResult;

/// A `Field,Value` CSV file that results are appended to.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row per field, in field order, labelled for humans.
    ///
    /// The header is written when the file is new or empty. An empty result
    /// leaves the file untouched. Returns the number of rows written.
    pub fn append(&self, result: &ExtractionResult) -> anyhow::Result<usize> {
        if result.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            wtr.write_record(["Field", "Value"])?;
        }
        for (field, value) in result.iter() {
            wtr.write_record([field.label(), value])?;
        }

        wtr.flush()?;
        Ok(result.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facture_core::Field;

    fn result(fields: &[(Field, &str)]) -> ExtractionResult {
        fields.iter().map(|(f, v)| (*f, v.to_string())).collect()
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("extracted_data.csv"));

        ledger.append(&result(&[(Field::Iban, "FR76 3000")])).unwrap();
        ledger
            .append(&result(&[(Field::DueDate, "01/02/2024"), (Field::AmountDue, "10,00 €")]))
            .unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(
            content,
            "Field,Value\nIBAN,FR76 3000\nMontant Dû,\"10,00 €\"\nÉchéance,01/02/2024\n"
        );
    }

    #[test]
    fn test_existing_empty_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "").unwrap();

        Ledger::new(&path).append(&result(&[(Field::Quantity, "3")])).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Field,Value\nQuantité,3\n"
        );
    }

    #[test]
    fn test_empty_result_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("out").join("ledger.csv"));

        assert_eq!(ledger.append(&ExtractionResult::new()).unwrap(), 0);
        assert!(!ledger.path().exists());
    }
}
