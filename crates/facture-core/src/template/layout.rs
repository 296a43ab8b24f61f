//! Invoice layout templates: classification keywords and field rules.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TemplateError;
use crate::models::extraction::ExtractionResult;
use crate::models::field::Field;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Output format for coerced date fields (DD/MM/YYYY).
pub const DATE_OUTPUT_FORMAT: &str = "%d/%m/%Y";

/// How a template field value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Trimmed text.
    Text,
    /// Decimal amount, normalized to `1234.56`.
    Amount,
    /// Date, normalized to `DD/MM/YYYY`.
    Date,
    /// Unsigned integer.
    Integer,
}

impl FieldKind {
    /// Kind used when a rule does not state one.
    pub fn default_for(field: Field) -> Self {
        match field {
            Field::AmountDue | Field::TaxAmount => FieldKind::Amount,
            Field::DueDate => FieldKind::Date,
            Field::Quantity => FieldKind::Integer,
            Field::Iban => FieldKind::Text,
        }
    }
}

/// A field rule: a bare pattern, or a pattern with an explicit kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRule {
    Pattern(String),
    Typed {
        regex: String,
        #[serde(default)]
        kind: Option<FieldKind>,
    },
}

impl FieldRule {
    fn pattern(&self) -> &str {
        match self {
            FieldRule::Pattern(p) => p,
            FieldRule::Typed { regex, .. } => regex,
        }
    }

    fn kind(&self, field: Field) -> FieldKind {
        match self {
            FieldRule::Typed { kind: Some(kind), .. } => *kind,
            _ => FieldKind::default_for(field),
        }
    }
}

/// Text preparation and value parsing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Decimal separator used by amounts in this layout.
    pub decimal_separator: char,

    /// `chrono` formats tried in order for date fields.
    pub date_formats: Vec<String>,

    /// Strip all whitespace from the text before matching.
    pub remove_whitespace: bool,

    /// Lowercase the text before matching.
    pub lowercase: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
            date_formats: vec![
                "%d/%m/%Y".to_string(),
                "%d.%m.%Y".to_string(),
                "%d-%m-%Y".to_string(),
                "%Y-%m-%d".to_string(),
            ],
            remove_whitespace: false,
            lowercase: false,
        }
    }
}

/// A template as written in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceTemplate {
    /// Issuer the layout belongs to.
    pub issuer: String,

    /// Layout revision, informational.
    #[serde(default)]
    pub version: Option<String>,

    /// Higher priorities are tried first.
    #[serde(default)]
    pub priority: i32,

    /// Patterns that must all occur for the template to apply.
    pub keywords: Vec<String>,

    /// Patterns that must not occur.
    #[serde(default)]
    pub exclude_keywords: Vec<String>,

    /// Where each field is read from.
    pub fields: BTreeMap<Field, FieldRule>,

    /// Fields without which the template yields nothing.
    #[serde(default)]
    pub required_fields: Vec<Field>,

    #[serde(default)]
    pub options: TemplateOptions,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    kind: FieldKind,
}

/// A validated template, ready to classify and extract.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    issuer: String,
    version: Option<String>,
    priority: i32,
    keywords: Vec<Regex>,
    exclude_keywords: Vec<Regex>,
    rules: BTreeMap<Field, CompiledRule>,
    required_fields: Vec<Field>,
    options: TemplateOptions,
}

fn compile(issuer: &str, pattern: &str) -> Result<Regex, TemplateError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| TemplateError::InvalidPattern {
            issuer: issuer.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

impl CompiledTemplate {
    /// Compile and validate a template.
    pub fn compile(template: InvoiceTemplate) -> Result<Self, TemplateError> {
        let issuer = template.issuer;

        if template.keywords.is_empty() {
            return Err(TemplateError::NoKeywords(issuer));
        }

        let keywords = template
            .keywords
            .iter()
            .map(|k| compile(&issuer, k))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_keywords = template
            .exclude_keywords
            .iter()
            .map(|k| compile(&issuer, k))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rules = BTreeMap::new();
        for (field, rule) in &template.fields {
            rules.insert(
                *field,
                CompiledRule {
                    regex: compile(&issuer, rule.pattern())?,
                    kind: rule.kind(*field),
                },
            );
        }

        if let Some(field) = template.required_fields.iter().find(|f| !rules.contains_key(*f)) {
            return Err(TemplateError::MissingRule { issuer, field: *field });
        }

        if let Some(format) = template
            .options
            .date_formats
            .iter()
            .find(|f| StrftimeItems::new(f).any(|item| matches!(item, Item::Error)))
        {
            return Err(TemplateError::InvalidDateFormat {
                issuer,
                format: format.clone(),
            });
        }

        Ok(Self {
            issuer,
            version: template.version,
            priority: template.priority,
            keywords,
            exclude_keywords,
            rules,
            required_fields: template.required_fields,
            options: template.options,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Apply the template's text options.
    pub fn prepare<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut text = Cow::Borrowed(text);
        if self.options.remove_whitespace {
            text = Cow::Owned(WHITESPACE.replace_all(&text, "").into_owned());
        }
        if self.options.lowercase {
            text = Cow::Owned(text.to_lowercase());
        }
        text
    }

    /// Whether prepared text belongs to this layout.
    pub fn matches(&self, prepared: &str) -> bool {
        self.keywords.iter().all(|k| k.is_match(prepared))
            && !self.exclude_keywords.iter().any(|k| k.is_match(prepared))
    }

    /// Read every field from prepared text.
    ///
    /// Returns an empty result when a required field is missing.
    pub fn extract(&self, prepared: &str) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        for (field, rule) in &self.rules {
            let Some(caps) = rule.regex.captures(prepared) else {
                continue;
            };
            let Some(raw) = (if rule.regex.captures_len() > 1 { caps.get(1) } else { caps.get(0) })
            else {
                continue;
            };

            match self.coerce(rule.kind, raw.as_str()) {
                Some(value) => {
                    result.insert(*field, value);
                }
                None => debug!(
                    "Template '{}': could not read {} from {:?} as {:?}",
                    self.issuer,
                    field,
                    raw.as_str(),
                    rule.kind
                ),
            }
        }

        if let Some(missing) = self.required_fields.iter().find(|f| !result.contains(**f)) {
            warn!(
                "Template '{}' matched but required field {} is missing",
                self.issuer, missing
            );
            return ExtractionResult::new();
        }

        result
    }

    fn coerce(&self, kind: FieldKind, raw: &str) -> Option<String> {
        match kind {
            FieldKind::Text => Some(raw.trim().to_string()),
            FieldKind::Amount => {
                parse_amount(raw, self.options.decimal_separator).map(|d| d.to_string())
            }
            FieldKind::Date => parse_date(raw, &self.options.date_formats)
                .map(|d| d.format(DATE_OUTPUT_FORMAT).to_string()),
            FieldKind::Integer => {
                let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                digits.parse::<u64>().ok().map(|n| n.to_string())
            }
        }
    }
}

/// Parse an amount such as `1 234,56 €` or `1,234.56`.
///
/// Everything except digits, a leading minus and the decimal separator is
/// dropped, so thousands separators and currency marks are ignored.
pub fn parse_amount(raw: &str, decimal_separator: char) -> Option<Decimal> {
    let raw = raw.trim();
    let negative = raw.starts_with('-');

    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
        } else if c == decimal_separator {
            cleaned.push('.');
        }
    }

    if cleaned.is_empty() || cleaned.matches('.').count() > 1 {
        return None;
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a date with the first matching format.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}
