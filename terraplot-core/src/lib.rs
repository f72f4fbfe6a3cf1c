//! Expression engine for the Terraplot map-plotting language.
//!
//! The engine parses one C/awk-like expression at a time from a character
//! stream into an operator tree ([`expr::Expression`]) and evaluates the
//! tree against an externally-owned variable store, producing a runtime
//! [`value::Value`]. Statement-level control flow, dataset readers, and
//! rendering backends are callers of this crate, not part of it.

pub mod error;
pub mod eval;
pub mod expr;
pub mod functions;
pub mod order;
pub mod stream;
pub mod value;
pub mod variables;

pub use error::{EvalError, EvalErrorKind, ParseError, ParseErrorKind};
pub use eval::evaluate;
pub use expr::{parse_expression, Expression};
pub use functions::{Function, FunctionHandle, FunctionRegistry, NativeFunction};
pub use stream::{CharStream, SourcePos};
pub use value::{Value, ValueKind, ValueMap};
pub use variables::{Variables, VariableStore};

#[cfg(test)]
mod tests;
