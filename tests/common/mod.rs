//! Common test utilities and helpers.
//!
//! Shared across the integration tests:
//! - Document fixtures built in memory (PDF via lopdf, DOCX via zip)
//! - PDF inspection helpers

#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_helpers;

pub use fixtures::*;
pub use pdf_helpers::*;
