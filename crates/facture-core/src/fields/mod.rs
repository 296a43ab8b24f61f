//! Field pattern matching over plain text.

pub mod catalog;

pub use catalog::{default_rule, FieldCatalog, FieldDefinition, FieldMatch};

use std::sync::Arc;

use tracing::trace;

use crate::models::extraction::ExtractionResult;

/// Run every rule of `catalog` against `text`, keeping the first match per field.
pub fn match_fields(text: &str, catalog: &FieldCatalog) -> ExtractionResult {
    let mut result = ExtractionResult::new();

    for definition in catalog.definitions() {
        if let Some(found) = definition.find(text) {
            if result.insert(definition.field(), found.value) {
                trace!(
                    "{} matched at {}..{}: {:?}",
                    definition.field(),
                    found.position.0,
                    found.position.1,
                    found.value
                );
            }
        }
    }

    result
}

/// A shared handle to a catalog, used by the text-based extractors.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    catalog: Arc<FieldCatalog>,
}

impl PatternMatcher {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn match_text(&self, text: &str) -> ExtractionResult {
        match_fields(text, &self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::Field;
    use pretty_assertions::assert_eq;

    fn french() -> FieldCatalog {
        FieldCatalog::french().unwrap()
    }

    #[test]
    fn test_amount_due_with_spaces_and_currency() {
        let result = match_fields("Montant total TTC: 1 234,56€\nMerci", &french());
        assert_eq!(result.get(Field::AmountDue), Some("1 234,56€"));
    }

    #[test]
    fn test_amount_due_label_variants() {
        let catalog = french();
        let cases = [
            ("montant total ht : 980,00 €", "980,00 €"),
            ("MONTANT TOTAL T.T.C. 1.200,50", "1.200,50"),
            ("Net à payer: 75,20", "75,20"),
            ("Total général 3 000", "3 000"),
            ("Somme à régler : 12.5 EUR", "12.5 EUR"),
            ("Solde dû: 40,00", "40,00"),
        ];

        for (text, expected) in cases {
            let result = match_fields(text, &catalog);
            assert_eq!(result.get(Field::AmountDue), Some(expected), "text: {}", text);
        }
    }

    #[test]
    fn test_iban_with_short_final_group() {
        let text = "Coordonnées bancaires\nIBAN: FR76 3000 6000 0112 3456 7890 189\nBIC: AGRIFRPP";
        let result = match_fields(text, &french());
        assert_eq!(result.get(Field::Iban), Some("FR76 3000 6000 0112 3456 7890 189"));
    }

    #[test]
    fn test_iban_stops_before_following_word() {
        let catalog = french();
        let cases = [
            (
                "IBAN : ES91 2100 0418 4502 0005 1332 BIC : CAIXESBBXXX",
                "ES91 2100 0418 4502 0005 1332",
            ),
            ("IBAN : BE68 5390 0754 7034 SWIFT GKCCBEBB", "BE68 5390 0754 7034"),
            ("IBAN GB29 NWBK 6016 1331 9268 19 BIC NWBKGB2L", "GB29 NWBK 6016 1331 9268 19"),
            ("IBAN: NL91ABNA0417164300", "NL91ABNA0417164300"),
        ];

        for (text, expected) in cases {
            let result = match_fields(text, &catalog);
            assert_eq!(result.get(Field::Iban), Some(expected), "text: {}", text);
        }
    }

    #[test]
    fn test_iban_lowercase_label() {
        let result = match_fields("iban : de89 3704 0044 0532 0130 00", &french());
        assert_eq!(result.get(Field::Iban), Some("de89 3704 0044 0532 0130 00"));
    }

    #[test]
    fn test_tax_quantity_and_due_date() {
        let text = "\
Quantité : 3
Total TVA : 41,15 €
Date d'échéance : 15/03/2024
";
        let result = match_fields(text, &french());

        assert_eq!(result.get(Field::Quantity), Some("3"));
        assert_eq!(result.get(Field::TaxAmount), Some("41,15 €"));
        assert_eq!(result.get(Field::DueDate), Some("15/03/2024"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "Qté: 2\nQuantité: 9\nÉchéance : 01/01/2024\nÉchéance : 02/02/2024";
        let result = match_fields(text, &french());
        assert_eq!(result.get(Field::Quantity), Some("2"));
        assert_eq!(result.get(Field::DueDate), Some("01/01/2024"));
    }

    #[test]
    fn test_label_without_value_does_not_match() {
        let text = "TVA intracommunautaire : FR12345678901\nÉchéance : à réception";
        let result = match_fields(text, &french());
        assert!(!result.contains(Field::TaxAmount));
        assert!(!result.contains(Field::DueDate));
    }

    #[test]
    fn test_value_stops_at_line_end() {
        let text = "Net à payer : 120,00\n2024 Paris";
        let result = match_fields(text, &french());
        assert_eq!(result.get(Field::AmountDue), Some("120,00"));
    }

    #[test]
    fn test_no_fields_in_unrelated_text() {
        let result = match_fields("Bonjour, veuillez trouver ci-joint notre brochure.", &french());
        assert!(result.is_empty());
    }

    #[test]
    fn test_matcher_shares_catalog() {
        let matcher = PatternMatcher::new(Arc::new(french()));
        let copy = matcher.clone();
        assert_eq!(
            matcher.match_text("Qté 4"),
            copy.match_text("Qté 4"),
        );
        assert_eq!(matcher.catalog().len(), 5);
    }
}
