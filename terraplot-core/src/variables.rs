//! Variable storage seam.
//!
//! The engine owns no variable state: every evaluation call receives a
//! mutable reference to an externally-owned [`VariableStore`]. In the
//! wider system each interpretation context owns an independent store;
//! the engine only requires "one store, accessed by one evaluation at a
//! time". [`Variables`] is the plain HashMap-backed implementation used
//! by the CLI and tests.

use std::collections::HashMap;

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::value::{Value, ValueMap};

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// External variable storage consumed by the evaluator.
pub trait VariableStore {
    /// Look up a variable; `None` when it was never defined.
    fn get_variable(&self, name: &str) -> Option<Value>;

    /// Define or replace a variable.
    fn define_variable(&mut self, name: &str, value: Value);

    /// Write one entry of the named map variable, creating the map when
    /// the variable is undefined. Fails when the variable exists and is
    /// not a map.
    fn define_map_entry(&mut self, name: &str, key: String, value: Value) -> EvalResult<()>;
}

// ---------------------------------------------------------------------------
// Default implementation
// ---------------------------------------------------------------------------

/// HashMap-backed variable storage.
#[derive(Debug, Default)]
pub struct Variables {
    vars: HashMap<String, Value>,
}

impl Variables {
    /// Create empty variable storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariableStore for Variables {
    fn get_variable(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn define_variable(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_owned(), value);
    }

    fn define_map_entry(&mut self, name: &str, key: String, value: Value) -> EvalResult<()> {
        match self
            .vars
            .entry(name.to_owned())
            .or_insert_with(|| Value::Map(ValueMap::new()))
        {
            Value::Map(map) => {
                map.set(key, value);
                Ok(())
            }
            other => Err(EvalError::new(
                EvalErrorKind::NotAMap,
                format!("variable `{name}` is a {}, not a map", other.kind()),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_variable_is_none() {
        let vars = Variables::new();
        assert_eq!(vars.get_variable("x"), None);
    }

    #[test]
    fn define_and_read_back() {
        let mut vars = Variables::new();
        vars.define_variable("x", Value::Numeric(7.0));
        assert_eq!(vars.get_variable("x"), Some(Value::Numeric(7.0)));
    }

    #[test]
    fn map_entry_creates_map_on_demand() {
        let mut vars = Variables::new();
        vars.define_map_entry("a", "1".to_owned(), Value::Numeric(5.0))
            .unwrap();
        let Some(Value::Map(map)) = vars.get_variable("a") else {
            panic!("expected a map");
        };
        assert_eq!(map.get("1"), Value::Numeric(5.0));
    }

    #[test]
    fn map_entry_through_scalar_fails() {
        let mut vars = Variables::new();
        vars.define_variable("x", Value::Numeric(1.0));
        let err = vars
            .define_map_entry("x", "1".to_owned(), Value::one())
            .unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::NotAMap);
    }
}
