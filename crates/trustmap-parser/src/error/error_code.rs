//! Error codes for the mapper diagnostic system.
//!
//! Codes are organized by cause:
//! - `E0xx` - The document is not well-formed text or XML
//! - `E1xx` - Required document structure is missing
//! - `E2xx` - A value is present but cannot be interpreted
//! - `W3xx` - Content that is skipped with a warning

use std::fmt;

/// Codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Document Errors (E0xx)
    // =========================================================================
    /// XML syntax error.
    ///
    /// The document is not well-formed XML.
    E001,

    /// Invalid text encoding.
    ///
    /// The document bytes are not valid UTF-8.
    E002,

    // =========================================================================
    // Structure Errors (E1xx)
    // =========================================================================
    /// Unexpected root element.
    ///
    /// The document root is not a `ThreatModel` element.
    E100,

    /// Missing required element.
    ///
    /// An element the mapper needs (knowledge base, surface sections,
    /// geometry, element properties) is absent.
    E101,

    /// Missing drawing surface.
    ///
    /// The drawing surface list is empty.
    E102,

    // =========================================================================
    // Value Errors (E2xx)
    // =========================================================================
    /// Invalid numeric value.
    ///
    /// A geometry element holds text that is not a number.
    E200,

    // =========================================================================
    // Warnings (W3xx)
    // =========================================================================
    /// Unsupported element kind.
    ///
    /// The element's generic type id is not one this tool can draw. The
    /// element is skipped.
    W300,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::W300 => "W300",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "invalid XML",
            ErrorCode::E002 => "invalid UTF-8",
            ErrorCode::E100 => "unexpected root element",
            ErrorCode::E101 => "missing required element",
            ErrorCode::E102 => "missing drawing surface",
            ErrorCode::E200 => "invalid numeric value",
            ErrorCode::W300 => "unsupported element kind",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
