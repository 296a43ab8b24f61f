//! Per-document extraction results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::field::Field;

/// Fields found in one document by one strategy.
///
/// A key is present only for a field that was found; values are never
/// empty. Results from different strategies are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    fields: BTreeMap<Field, String>,
}

impl ExtractionResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. Surrounding whitespace is trimmed; a value that is
    /// empty after trimming is not recorded. Returns whether it was kept.
    pub fn insert(&mut self, field: Field, value: impl AsRef<str>) -> bool {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return false;
        }
        self.fields.insert(field, value.to_string());
        true
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

impl FromIterator<(Field, String)> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (field, value) in iter {
            result.insert(field, value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_trims_and_skips_blank_values() {
        let mut result = ExtractionResult::new();
        assert!(result.insert(Field::Quantity, " 12\n"));
        assert!(!result.insert(Field::Iban, "  \n"));

        assert_eq!(result.get(Field::Quantity), Some("12"));
        assert!(!result.contains(Field::Iban));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_iter_follows_field_order() {
        let result: ExtractionResult = [
            (Field::DueDate, "01/02/2024".to_string()),
            (Field::AmountDue, "10,00".to_string()),
        ]
        .into_iter()
        .collect();

        let fields: Vec<Field> = result.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::AmountDue, Field::DueDate]);
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let result: ExtractionResult = [(Field::Iban, "FR76 3000".to_string())].into_iter().collect();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"iban":"FR76 3000"}"#);
    }
}
