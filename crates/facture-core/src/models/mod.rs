//! Data models.

pub mod config;
pub mod document;
pub mod extraction;
pub mod field;
