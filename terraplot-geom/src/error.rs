//! Error type for geometry parsing and packed-array traversal.

use std::fmt;

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Categories of geometry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryErrorKind {
    /// Malformed well-known-text: unmatched parentheses, a dangling X with
    /// no Y, an unrecognized geometry keyword, a malformed numeric token.
    InvalidText,
    /// A packed geometry array that does not decode to exactly one
    /// geometry: bad type tag, bad segment op, trailing or missing values.
    BadArray,
}

impl fmt::Display for GeometryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidText => write!(f, "invalid geometry text"),
            Self::BadArray => write!(f, "malformed geometry array"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error produced by the geometry codecs.
///
/// Geometry coercion is attempted lazily (e.g. "does this string parse as
/// geometry?"), so callers routinely catch this error to fall back to
/// treating a value as a plain string.
#[derive(Debug, Clone)]
pub struct GeometryError {
    /// What went wrong.
    pub kind: GeometryErrorKind,
    /// Human-readable message carrying the offending text or array slice.
    pub message: String,
}

impl GeometryError {
    /// Create a new error.
    #[must_use]
    pub fn new(kind: GeometryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A malformed-WKT error carrying the offending substring.
    #[must_use]
    pub fn invalid_text(detail: impl Into<String>) -> Self {
        Self::new(GeometryErrorKind::InvalidText, detail)
    }

    /// A malformed packed-array error.
    #[must_use]
    pub fn bad_array(detail: impl Into<String>) -> Self {
        Self::new(GeometryErrorKind::BadArray, detail)
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GeometryError {}

/// Convenience type alias for results using [`GeometryError`].
pub type GeomResult<T> = Result<T, GeometryError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GeometryError::invalid_text("unexpected `]` in `POINT ]`");
        let s = format!("{err}");
        assert!(s.contains("invalid geometry text"), "missing kind: {s}");
        assert!(s.contains("unexpected `]`"), "missing detail: {s}");
    }

    #[test]
    fn bad_array_kind() {
        let err = GeometryError::bad_array("truncated at index 3");
        assert_eq!(err.kind, GeometryErrorKind::BadArray);
    }
}
