//! Financial fields extracted from invoices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the financial values the extractors look for.
///
/// The declaration order is the output order of an
/// [`ExtractionResult`](super::extraction::ExtractionResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Total amount to pay (Montant Dû).
    AmountDue,
    /// Payee bank account.
    Iban,
    /// Tax amount (TVA).
    TaxAmount,
    /// Number of units.
    Quantity,
    /// Payment due date.
    DueDate,
}

impl Field {
    /// All fields, in output order.
    pub const ALL: [Field; 5] = [
        Field::AmountDue,
        Field::Iban,
        Field::TaxAmount,
        Field::Quantity,
        Field::DueDate,
    ];

    /// Stable identifier used in config files and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::AmountDue => "amount_due",
            Field::Iban => "iban",
            Field::TaxAmount => "tax_amount",
            Field::Quantity => "quantity",
            Field::DueDate => "due_date",
        }
    }

    /// Label written to the CSV ledger.
    pub fn label(&self) -> &'static str {
        match self {
            Field::AmountDue => "Montant Dû",
            Field::Iban => "IBAN",
            Field::TaxAmount => "TVA",
            Field::Quantity => "Quantité",
            Field::DueDate => "Échéance",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "amount_due" | "amountdue" | "amount" => Ok(Field::AmountDue),
            "iban" => Ok(Field::Iban),
            "tax_amount" | "taxamount" | "tax" | "vat" => Ok(Field::TaxAmount),
            "quantity" | "qty" => Ok(Field::Quantity),
            "due_date" | "duedate" => Ok(Field::DueDate),
            other => Err(format!("unknown field: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_str_accepts_aliases() {
        assert_eq!("amount_due".parse::<Field>(), Ok(Field::AmountDue));
        assert_eq!("Due-Date".parse::<Field>(), Ok(Field::DueDate));
        assert_eq!("VAT".parse::<Field>(), Ok(Field::TaxAmount));
        assert!("total".parse::<Field>().is_err());
    }

    #[test]
    fn test_field_serde_uses_snake_case() {
        let json = serde_json::to_string(&Field::TaxAmount).unwrap();
        assert_eq!(json, "\"tax_amount\"");
        let field: Field = serde_json::from_str("\"iban\"").unwrap();
        assert_eq!(field, Field::Iban);
    }
}
