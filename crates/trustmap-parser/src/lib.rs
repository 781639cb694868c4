//! # Trustmap Parser
//!
//! Reads threat-model documents (the namespaced XML written by
//! threat-modeling desktop tools) into a typed [`ThreatModel`].
//!
//! ## Usage
//!
//! ```no_run
//! # use trustmap_parser::{parse, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = std::fs::read_to_string("model.tm7").unwrap_or_default();
//!     let model = parse(&source)?;
//!     for entry in model.cross_references() {
//!         println!("{entry}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Malformed documents fail with a [`error::ParseError`] whose diagnostics
//! carry byte spans into the source. Elements of an unsupported kind are
//! skipped and reported through [`ThreatModel::warnings`].

pub mod error;
mod mapper;
mod span;
mod threat_model;

pub use span::Span;
pub use threat_model::ThreatModel;

use error::{Diagnostic, ErrorCode, ParseError};

/// Parses document text into a threat model.
///
/// Only the first drawing surface is mapped. A leading byte-order mark is
/// ignored; diagnostic spans still refer to the text as given.
///
/// # Errors
///
/// Returns a [`ParseError`] when the text is not well-formed XML or lacks
/// a required element, or when a geometry value is not a number.
pub fn parse(source: &str) -> Result<ThreatModel, ParseError> {
    Ok(mapper::map(source)?)
}

/// Parses raw document bytes, which must be UTF-8.
///
/// # Errors
///
/// Fails with an `E002` diagnostic on invalid UTF-8, and otherwise as
/// [`parse`] does.
pub fn parse_bytes(bytes: &[u8]) -> Result<ThreatModel, ParseError> {
    let source = std::str::from_utf8(bytes).map_err(|err| {
        let start = err.valid_up_to();
        let end = start + err.error_len().unwrap_or(0);
        Diagnostic::error(format!("document is not valid UTF-8: {err}"))
            .with_code(ErrorCode::E002)
            .with_label(Span::new(start..end), "invalid byte sequence")
            .with_help("save the threat model as UTF-8")
    })?;
    parse(source)
}

/// Cheap check whether `bytes` look like a threat-model document: the
/// first element, after an optional byte-order mark and XML declaration,
/// is `<ThreatModel`.
///
/// # Examples
///
/// ```
/// # use trustmap_parser::is_threat_model;
/// assert!(is_threat_model(b"<?xml version=\"1.0\"?>\n<ThreatModel xmlns=\"x\"/>"));
/// assert!(!is_threat_model(b"<svg/>"));
/// ```
pub fn is_threat_model(bytes: &[u8]) -> bool {
    let mut rest = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes).trim_ascii_start();
    if rest.starts_with(b"<?xml") {
        let Some(end) = rest.windows(2).position(|pair| pair == b"?>") else {
            return false;
        };
        rest = rest[end + 2..].trim_ascii_start();
    }
    rest.starts_with(b"<ThreatModel")
}
