//! Error types for the expression parser and evaluator.
//!
//! A [`ParseError`] is fatal to the current expression and carries the
//! source position supplied by the character stream. An [`EvalError`] is
//! fatal to the current statement; the statement executor (outside this
//! crate) attaches file/line context when reporting it. Neither is ever
//! retried or logged here — the engine only returns them.

use std::fmt;

use terraplot_geom::GeometryError;

use crate::stream::SourcePos;

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Categories of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A character that cannot start or continue the expected construct.
    UnexpectedToken,
    /// Unmatched `(`, `[`, `{` or their closers.
    UnbalancedDelimiter,
    /// A numeric literal that does not parse or is out of range.
    InvalidNumber,
    /// A bad backslash escape, octal, or unicode sequence in a string.
    InvalidEscape,
    /// A string literal with no closing quote on the same line.
    UnterminatedString,
    /// A function call with too few or too many arguments.
    WrongArgumentCount,
    /// A call to a name in neither the built-in nor the user table.
    UnknownFunction,
    /// Input ended in the middle of an expression.
    UnexpectedEof,
    /// An assignment or increment target that is not a variable or map
    /// entry.
    VariableExpected,
    /// An array/map literal nested inside another literal.
    NestedLiteral,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::UnbalancedDelimiter => write!(f, "unbalanced delimiter"),
            Self::InvalidNumber => write!(f, "invalid number"),
            Self::InvalidEscape => write!(f, "invalid escape sequence"),
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::WrongArgumentCount => write!(f, "wrong argument count"),
            Self::UnknownFunction => write!(f, "unknown function"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::VariableExpected => write!(f, "variable expected"),
            Self::NestedLiteral => write!(f, "nested array literal"),
        }
    }
}

/// A syntax error produced by the expression parser.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Human-readable message carrying the offending token.
    pub message: String,
    /// Where it went wrong.
    pub pos: SourcePos,
}

impl ParseError {
    /// Create a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            kind,
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Convenience type alias for results using [`ParseError`].
pub type ParseResult<T> = Result<T, ParseError>;

// ---------------------------------------------------------------------------
// Evaluation errors
// ---------------------------------------------------------------------------

/// Categories of runtime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// A value of the wrong kind for an operation (e.g. arithmetic on a
    /// map).
    TypeMismatch,
    /// An IEEE result that is infinite or NaN, including divide-by-zero.
    NumericOverflow,
    /// A map key that is neither numeric nor string.
    InvalidKeyType,
    /// An attempt to construct or store a map inside a map.
    NestedMap,
    /// A map entry written through a variable bound to a non-map.
    NotAMap,
    /// A value that does not convert to geometry.
    InvalidGeometry,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch => write!(f, "type mismatch"),
            Self::NumericOverflow => write!(f, "numeric overflow"),
            Self::InvalidKeyType => write!(f, "invalid map key"),
            Self::NestedMap => write!(f, "nested map"),
            Self::NotAMap => write!(f, "not a map"),
            Self::InvalidGeometry => write!(f, "invalid geometry"),
        }
    }
}

/// A runtime error produced by the evaluator or an invoked function.
#[derive(Debug, Clone)]
pub struct EvalError {
    /// What went wrong.
    pub kind: EvalErrorKind,
    /// Human-readable message carrying the offending value or operation.
    pub message: String,
}

impl EvalError {
    /// Create a new evaluation error.
    #[must_use]
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The same error with a context label (a function name) prefixed to
    /// the message.
    #[must_use]
    pub fn prefixed(self, label: &str) -> Self {
        Self {
            kind: self.kind,
            message: format!("{label}: {}", self.message),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

impl From<GeometryError> for EvalError {
    fn from(err: GeometryError) -> Self {
        Self::new(EvalErrorKind::InvalidGeometry, err.to_string())
    }
}

/// Convenience type alias for results using [`EvalError`].
pub type EvalResult<T> = Result<T, EvalError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
