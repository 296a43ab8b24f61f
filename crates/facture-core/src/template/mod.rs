//! Issuer templates: layout-specific extraction rules.

pub mod catalog;
pub mod layout;
pub mod scratch;

pub use catalog::TemplateCatalog;
pub use layout::{
    parse_amount, parse_date, CompiledTemplate, FieldKind, FieldRule, InvoiceTemplate,
    TemplateOptions,
};
pub use scratch::ScratchDocument;
