// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for structcodec.
//!
//! Errors fall into two groups:
//! - Fatal kinds (structural violations, unresolved types, ambiguous
//!   resolution, union case failures) abort the current traversal.
//! - Recoverable kinds (unknown fields, validation failures) are normally
//!   reported as [`Diagnostic`]s against the source and the decode continues.
//!
//! Every error that happens inside a traversal carries the cursor path
//! (e.g. `$.items[2].name`).

use std::fmt;

use thiserror::Error;

/// Errors raised by the token protocol, the resolver and the binders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A protocol call was made when the cursor was not in the required state.
    #[error("structural violation at {path}: {message}")]
    StructuralViolation {
        /// Cursor path at the time of the call
        path: String,
        /// What was expected
        message: String,
    },

    /// A struct field that is outside the known feature range.
    #[error("unknown field '{field}' at {path}")]
    UnknownField {
        /// Cursor path of the field
        path: String,
        /// Field name, or `#<index>` when only the index is known
        field: String,
    },

    /// The resolver produced the unsupported sentinel and it was used.
    #[error("no codec for type {type_name} qualifier {qualifier}")]
    UnresolvedType {
        /// Rust type name
        type_name: String,
        /// Qualifier tag, `none` when unqualified
        qualifier: String,
    },

    /// Two factories at the same priority both claim a (type, qualifier) pair.
    #[error(
        "ambiguous codec for type {type_name} qualifier {qualifier} at priority {priority}: {}",
        .factories.join(", ")
    )]
    AmbiguousResolution {
        /// Rust type name
        type_name: String,
        /// Qualifier tag, `none` when unqualified
        qualifier: String,
        /// Priority tier the contenders share
        priority: i32,
        /// Names of every contending factory
        factories: Vec<String>,
    },

    /// Builder-reported violations after a struct decode.
    #[error("validation failed at {path}: {}", .violations.join("; "))]
    ValidationFailure {
        /// Cursor path of the struct
        path: String,
        /// Violation messages
        violations: Vec<String>,
    },

    /// A union value without its discriminator field.
    #[error("no case discriminator '{field}' found at {path}, expected one of {{{}}}", .expected.join(", "))]
    MissingDiscriminator {
        /// Cursor path of the union value
        path: String,
        /// Reserved discriminator field name
        field: String,
        /// Known case names
        expected: Vec<String>,
    },

    /// A union value whose case could not be matched.
    #[error("{detail} at {path}, expected one of {{{}}}", .expected.join(", "))]
    UnmatchedCase {
        /// Cursor path of the union value
        path: String,
        /// What failed to match
        detail: String,
        /// Known case names
        expected: Vec<String>,
    },

    /// Internal contract violation (a bug in a codec or backend, not bad input).
    #[error("invariant violation: {invariant}")]
    InvariantViolation {
        /// Description of the invariant that was violated
        invariant: String,
    },

    /// Backend-specific failure (malformed document, unrepresentable value).
    #[error("{backend} backend error: {message}")]
    Backend {
        /// Backend name (e.g. "json", "toml")
        backend: String,
        /// Error message
        message: String,
    },
}

/// Fieldless classification of [`CodecError`] and [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    StructuralViolation,
    UnknownField,
    UnresolvedType,
    AmbiguousResolution,
    ValidationFailure,
    MissingDiscriminator,
    UnmatchedCase,
    InvariantViolation,
    Backend,
}

impl ErrorKind {
    /// Whether a decode may continue after this kind of problem.
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::UnknownField | ErrorKind::ValidationFailure)
    }

    /// Convert to string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::StructuralViolation => "structural_violation",
            ErrorKind::UnknownField => "unknown_field",
            ErrorKind::UnresolvedType => "unresolved_type",
            ErrorKind::AmbiguousResolution => "ambiguous_resolution",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::MissingDiscriminator => "missing_discriminator",
            ErrorKind::UnmatchedCase => "unmatched_case",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::Backend => "backend",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CodecError {
    /// Create a structural violation error.
    pub fn structural(path: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::StructuralViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error.
    pub fn unknown_field(path: impl Into<String>, field: impl Into<String>) -> Self {
        CodecError::UnknownField {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Create an unresolved type error.
    pub fn unresolved(type_name: impl Into<String>, qualifier: impl fmt::Display) -> Self {
        CodecError::UnresolvedType {
            type_name: type_name.into(),
            qualifier: qualifier.to_string(),
        }
    }

    /// Create a validation failure.
    pub fn validation(path: impl Into<String>, violations: Vec<String>) -> Self {
        CodecError::ValidationFailure {
            path: path.into(),
            violations,
        }
    }

    /// Create an invariant violation error.
    pub fn invariant_violation(invariant: impl Into<String>) -> Self {
        CodecError::InvariantViolation {
            invariant: invariant.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::StructuralViolation { .. } => ErrorKind::StructuralViolation,
            CodecError::UnknownField { .. } => ErrorKind::UnknownField,
            CodecError::UnresolvedType { .. } => ErrorKind::UnresolvedType,
            CodecError::AmbiguousResolution { .. } => ErrorKind::AmbiguousResolution,
            CodecError::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            CodecError::MissingDiscriminator { .. } => ErrorKind::MissingDiscriminator,
            CodecError::UnmatchedCase { .. } => ErrorKind::UnmatchedCase,
            CodecError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            CodecError::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Whether a decode may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        self.kind().is_recoverable()
    }

    /// Cursor path carried by this error, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::StructuralViolation { path, .. }
            | CodecError::UnknownField { path, .. }
            | CodecError::ValidationFailure { path, .. }
            | CodecError::MissingDiscriminator { path, .. }
            | CodecError::UnmatchedCase { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Fill in the path of an error raised without cursor context
    /// (e.g. by a builder). Errors that already carry a path are unchanged.
    pub fn with_path(mut self, at: &str) -> Self {
        match &mut self {
            CodecError::StructuralViolation { path, .. }
            | CodecError::UnknownField { path, .. }
            | CodecError::ValidationFailure { path, .. }
            | CodecError::MissingDiscriminator { path, .. }
            | CodecError::UnmatchedCase { path, .. }
                if path.is_empty() =>
            {
                *path = at.to_string();
            }
            _ => {}
        }
        self
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::StructuralViolation { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            CodecError::UnknownField { path, field } => {
                vec![("path", path.clone()), ("field", field.clone())]
            }
            CodecError::UnresolvedType {
                type_name,
                qualifier,
            } => vec![("type", type_name.clone()), ("qualifier", qualifier.clone())],
            CodecError::AmbiguousResolution {
                type_name,
                qualifier,
                priority,
                factories,
            } => vec![
                ("type", type_name.clone()),
                ("qualifier", qualifier.clone()),
                ("priority", priority.to_string()),
                ("factories", factories.join(",")),
            ],
            CodecError::ValidationFailure { path, violations } => {
                vec![("path", path.clone()), ("violations", violations.join("; "))]
            }
            CodecError::MissingDiscriminator {
                path,
                field,
                expected,
            } => vec![
                ("path", path.clone()),
                ("field", field.clone()),
                ("expected", expected.join(",")),
            ],
            CodecError::UnmatchedCase {
                path,
                detail,
                expected,
            } => vec![
                ("path", path.clone()),
                ("detail", detail.clone()),
                ("expected", expected.join(",")),
            ],
            CodecError::InvariantViolation { invariant } => {
                vec![("invariant", invariant.clone())]
            }
            CodecError::Backend { backend, message } => {
                vec![("backend", backend.clone()), ("message", message.clone())]
            }
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::backend("json", err.to_string())
    }
}

impl From<toml::de::Error> for CodecError {
    fn from(err: toml::de::Error) -> Self {
        CodecError::backend("toml", err.to_string())
    }
}

/// Result type for structcodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// A recoverable problem recorded against the cursor path.
///
/// Decoders report these through [`Source::report`](crate::protocol::Source::report)
/// instead of aborting; the caller decides whether accumulated diagnostics
/// should fail the overall operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Cursor path where the problem was found
    pub path: String,
    /// Problem classification
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(path: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Diagnostic for a field outside the known feature range.
    pub fn unknown_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::UnknownField, message)
    }

    /// Diagnostic for a builder violation.
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::ValidationFailure, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.path, self.message)
    }
}

impl From<&CodecError> for Diagnostic {
    fn from(err: &CodecError) -> Self {
        Diagnostic::new(err.path().unwrap_or("$"), err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error() {
        let err = CodecError::structural("$.items[2]", "expected Int, found String");
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "structural violation at $.items[2]: expected Int, found String"
        );
        assert_eq!(err.path(), Some("$.items[2]"));
    }

    #[test]
    fn test_ambiguous_error_names_factories() {
        let err = CodecError::AmbiguousResolution {
            type_name: "i32".to_string(),
            qualifier: "none".to_string(),
            priority: 5,
            factories: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "ambiguous codec for type i32 qualifier none at priority 5: first, second"
        );
        assert_eq!(err.path(), None);
    }

    #[test]
    fn test_case_errors_list_expected() {
        let err = CodecError::MissingDiscriminator {
            path: "$".to_string(),
            field: "@case".to_string(),
            expected: vec!["Circle".to_string(), "Square".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no case discriminator '@case' found at $, expected one of {Circle, Square}"
        );

        let err = CodecError::UnmatchedCase {
            path: "$.shape".to_string(),
            detail: "unknown case 'Triangle'".to_string(),
            expected: vec!["Circle".to_string(), "Square".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown case 'Triangle' at $.shape, expected one of {Circle, Square}"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(CodecError::unknown_field("$.x", "x").is_recoverable());
        assert!(CodecError::validation("$", vec!["bad".to_string()]).is_recoverable());
        assert!(!CodecError::unresolved("Foo", "none").is_recoverable());
        assert!(!CodecError::invariant_violation("oops").is_recoverable());
    }

    #[test]
    fn test_with_path_fills_only_empty_paths() {
        let err = CodecError::validation("", vec!["missing".to_string()]).with_path("$.person");
        assert_eq!(err.path(), Some("$.person"));

        let err = CodecError::structural("$.a", "bad").with_path("$.b");
        assert_eq!(err.path(), Some("$.a"));
    }

    #[test]
    fn test_log_fields() {
        let err = CodecError::unresolved("Foo", "json");
        let fields = err.log_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("type", "Foo".to_string()));
        assert_eq!(fields[1], ("qualifier", "json".to_string()));

        let err = CodecError::backend("json", "eof");
        let fields = err.log_fields();
        assert_eq!(fields[0], ("backend", "json".to_string()));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::unknown_field("$.extra", "field is not known");
        assert_eq!(
            diagnostic.to_string(),
            "unknown_field at $.extra: field is not known"
        );

        let err = CodecError::validation("$", vec!["age must be positive".to_string()]);
        let diagnostic = Diagnostic::from(&err);
        assert_eq!(diagnostic.kind, ErrorKind::ValidationFailure);
        assert_eq!(diagnostic.path, "$");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CodecError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }
}
