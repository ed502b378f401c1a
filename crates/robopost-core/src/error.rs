//! Error handling for RoboPost
//!
//! G-Code errors are raised while transforming a document. Settings file
//! errors live with the settings crate.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors found while transforming a G-Code document. A transform
/// never recovers from these: the whole document is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A parameter value could not be parsed as a number
    #[error(
        "Invalid parameter '{param}' at layer {layer} line {line_number}: '{value}' ({reason})"
    )]
    InvalidParameter {
        /// Zero-based index of the layer (block) containing the line.
        layer: usize,
        /// One-based line number within the layer.
        line_number: usize,
        /// The parameter letter.
        param: char,
        /// The text that failed to parse.
        value: String,
        /// The reason the value is invalid.
        reason: String,
    },
}

/// Result type for G-Code processing
pub type Result<T> = std::result::Result<T, GcodeError>;
