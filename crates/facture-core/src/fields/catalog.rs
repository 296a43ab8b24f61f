//! The field catalog: one labeled rule per field.

use regex::{Regex, RegexBuilder};

use crate::error::CatalogError;
use crate::models::config::ExtractionConfig;
use crate::models::field::Field;

// Values never span a line break: amounts and IBAN groups use `[ \t]`
// separators rather than `\s`.

/// "Total amount" labels followed by an amount with optional currency.
pub const AMOUNT_DUE_RULE: &str = r"(Montant\s*total\s*(?:HT|TTC|T\.T\.C\.?)|Net\s*[àa]\s*payer|Total\s*g[ée]n[ée]ral|Somme\s*[àa]\s*r[ée]gler|Solde\s*d[ûu]|Total\s*d[ûu])[ \t]*:?[ \t]*(\d[\d \t\u{00a0},.]*(?:[ \t]?(?:€|EUR))?)";

/// "IBAN" followed by country code, check digits and grouped blocks.
///
/// Only the first block may be all letters (bank codes such as `NWBK`).
/// Later blocks need a digit, so a trailing `BIC` or `SWIFT` stays out.
pub const IBAN_RULE: &str = concat!(
    r"(IBAN)[ \t]*:?[ \t]*([A-Z]{2}\d{2}(?:[ \t]?[A-Z0-9]{4})?",
    r"(?:[ \t]?(?:\d[A-Z0-9]{3}|[A-Z]\d[A-Z0-9]{2}|[A-Z]{2}\d[A-Z0-9]|[A-Z]{3}\d))*",
    r"(?:[ \t]?(?:\d[A-Z0-9]{0,2}|[A-Z]\d[A-Z0-9]?|[A-Z]{2}\d))?)",
);

/// Tax labels followed by an amount.
pub const TAX_AMOUNT_RULE: &str = r"(Montant\s*de\s*la\s*TVA|Taux\s*de\s*TVA|Total\s*TVA|TVA|Taxe)[ \t]*:?[ \t]*(\d[\d \t\u{00a0},.]*(?:[ \t]?(?:€|EUR|%))?)";

/// Quantity labels followed by an integer.
pub const QUANTITY_RULE: &str = r"(Quantit[ée]|Qt[ée]|Nombre\s*d['’]unit[ée]s|Total\s*produits|Nombre\s*de\s*produits|Nombre\s*d['’]articles)[ \t]*:?[ \t]*(\d+)";

/// Due-date labels, a colon, and a DD/MM/YYYY date.
pub const DUE_DATE_RULE: &str = r"(Date\s*d['’][ée]ch[ée]ance|[ée]ch[ée]ance|D[ée]lai\s*de\s*paiement|[àa]\s*payer\s*avant\s*le)\s*:\s*(\d{2}/\d{2}/\d{4})";

/// Built-in rule for a field.
pub fn default_rule(field: Field) -> &'static str {
    match field {
        Field::AmountDue => AMOUNT_DUE_RULE,
        Field::Iban => IBAN_RULE,
        Field::TaxAmount => TAX_AMOUNT_RULE,
        Field::Quantity => QUANTITY_RULE,
        Field::DueDate => DUE_DATE_RULE,
    }
}

/// A located field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch<'t> {
    /// Selected value (not yet trimmed).
    pub value: &'t str,
    /// Byte span of the whole match in the searched text.
    pub position: (usize, usize),
}

/// A compiled rule for one field.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    field: Field,
    regex: Regex,
}

impl FieldDefinition {
    /// Compile a rule: case-insensitive, multiline, `.` stays on one line.
    pub fn new(field: Field, rule: &str) -> Result<Self, CatalogError> {
        let regex = RegexBuilder::new(rule)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|source| CatalogError::InvalidRule { field, source })?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            return Err(CatalogError::NoCaptureGroup { field });
        }

        Ok(Self { field, regex })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// The rule source.
    pub fn rule(&self) -> &str {
        self.regex.as_str()
    }

    /// Find the first match in `text`.
    ///
    /// With more than one capture group the value is group 2, otherwise the
    /// whole match. Later groups are ignored. A rule whose group 2 did not
    /// take part in the match yields nothing.
    pub fn find<'t>(&self, text: &'t str) -> Option<FieldMatch<'t>> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let value = if self.regex.captures_len() > 2 {
            caps.get(2)?
        } else {
            whole
        };

        Some(FieldMatch {
            value: value.as_str(),
            position: (whole.start(), whole.end()),
        })
    }
}

/// The validated set of field rules.
///
/// Built once, before the first document, and shared read-only.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    definitions: Vec<FieldDefinition>,
}

impl FieldCatalog {
    /// The built-in French catalog.
    pub fn french() -> Result<Self, CatalogError> {
        Self::from_rules(Field::ALL.iter().map(|&f| (f, default_rule(f))))
    }

    /// Built-in rules with the configured overrides applied.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, CatalogError> {
        Self::from_rules(Field::ALL.iter().map(|&field| {
            let rule = config
                .patterns
                .get(&field)
                .map(String::as_str)
                .unwrap_or_else(|| default_rule(field));
            (field, rule)
        }))
    }

    /// Compile an explicit rule list. Fails on the first bad rule.
    pub fn from_rules<'r, I>(rules: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (Field, &'r str)>,
    {
        let mut definitions: Vec<FieldDefinition> = Vec::new();
        for (field, rule) in rules {
            let definition = FieldDefinition::new(field, rule)?;
            match definitions.iter_mut().find(|d| d.field == field) {
                Some(existing) => *existing = definition,
                None => definitions.push(definition),
            }
        }
        definitions.sort_by_key(|d| d.field);
        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &[FieldDefinition] {
        &self.definitions
    }

    pub fn get(&self, field: Field) -> Option<&FieldDefinition> {
        self.definitions.iter().find(|d| d.field == field)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
