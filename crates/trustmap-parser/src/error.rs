//! Error and diagnostic system for the threat-model mapper.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled byte spans pointing into the source document
//! - Severity levels, so that skipped elements can be reported as warnings
//!
//! # Example
//!
//! ```
//! # use trustmap_parser::error::{Diagnostic, ErrorCode};
//! # use trustmap_parser::Span;
//!
//! let diag = Diagnostic::error("missing `<Borders>` element")
//!     .with_code(ErrorCode::E101)
//!     .with_label(Span::new(120..480), "expected inside this element")
//!     .with_help("threat-model surfaces list their shapes under `<Borders>`");
//! ```

mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
