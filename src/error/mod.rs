//! Error types for parsing, pattern compilation, and indexed access.
//!
//! Three failure families exist, and they surface very differently:
//!
//! - [`ParseError`] is returned by the `Document` constructors. No partial
//!   document is ever produced on failure. In recovery mode the HTML parser
//!   instead collects [`ParseDiagnostic`]s on the document it builds.
//! - [`PatternError`] is returned only by [`crate::matcher::Pattern::compile`],
//!   the one entry point that exposes selector compilation directly. Every
//!   operation that consumes a pattern internally (filter, find, add, the
//!   until-boundary walks, content-by-pattern insertion) compiles leniently:
//!   an invalid pattern degrades to a matcher that matches nothing, so those
//!   operations return empty results rather than errors.
//! - [`OutOfRangeError`] is returned by the indexed Selection accessors
//!   (`eq`, `get`, `slice`). Out-of-range is fatal to that call — there is no
//!   silent clamping — but negative indices count from the end and are valid.

use thiserror::Error;

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A non-fatal issue that doesn't prevent parsing.
    Warning,
    /// A recoverable error — parsing continued but the input is malformed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location within an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single diagnostic emitted while parsing in recovery mode.
///
/// The HTML parser is error-tolerant: it records recovered problems here
/// (on [`crate::Document::diagnostics`]) while still producing a tree.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Where in the source the problem was found.
    pub location: SourceLocation,
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.severity, self.message, self.location
        )
    }
}

/// The error returned when document parsing fails outright.
#[derive(Debug, Clone, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the fatal error occurred.
    pub location: SourceLocation,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// The error returned when a selector pattern fails to compile.
///
/// Only [`crate::matcher::Pattern::compile`] surfaces this; all internal
/// pattern consumers swallow it into a never-matching pattern.
#[derive(Debug, Clone, Error)]
#[error("invalid pattern at offset {position}: {message}")]
pub struct PatternError {
    /// Human-readable description of what was wrong.
    pub message: String,
    /// 0-based byte offset in the pattern where the error was detected.
    pub position: usize,
}

/// The error returned by indexed Selection access (`eq`, `get`, `slice`)
/// when an index falls outside the Selection.
#[derive(Debug, Clone, Copy, Error)]
#[error("index {index} out of range for selection of length {len}")]
pub struct OutOfRangeError {
    /// The requested index, as resolved against the selection length
    /// (negative input indices are reported after from-end resolution).
    pub index: isize,
    /// The length of the selection at the time of the call.
    pub len: usize,
}
