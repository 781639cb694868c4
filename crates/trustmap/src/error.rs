//! Error types for Trustmap operations.
//!
//! This module provides the main error type [`TrustmapError`] which wraps
//! the error conditions of each pipeline stage.

use std::io;

use thiserror::Error;

use trustmap_core::draw::IconError;
use trustmap_parser::error::ParseError;

use crate::structure::GroupingError;

/// The main error type for Trustmap operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with source
/// spans into the document, so that reporters can show the offending XML.
#[derive(Debug, Error)]
pub enum TrustmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Render error: {0}")]
    Render(#[from] IconError),

    #[error("Grouping error: {0}")]
    Grouping(#[from] GroupingError),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::export::Error> for TrustmapError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl TrustmapError {
    /// Create a new `Parse` error with the associated source document.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
