//! Function registry seam.
//!
//! The parser resolves call names against a [`FunctionRegistry`] passed by
//! reference — there is no process-wide function table. Built-in names are
//! consulted before user-defined ones. The registry hands out
//! [`FunctionHandle`]s; the parser checks arity against the handle and
//! stores it in the tree, so evaluation invokes the function directly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::EvalResult;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Function seam
// ---------------------------------------------------------------------------

/// A callable function, built-in or user-defined.
pub trait Function {
    /// The name scripts call this function by.
    fn name(&self) -> &str;

    /// Minimum number of arguments.
    fn min_args(&self) -> usize;

    /// Maximum number of arguments.
    fn max_args(&self) -> usize;

    /// Invoke with already-evaluated arguments.
    fn call(&self, args: Vec<Value>) -> EvalResult<Value>;
}

/// A shared handle to a registered function.
#[derive(Clone)]
pub struct FunctionHandle(Arc<dyn Function>);

impl FunctionHandle {
    /// Wrap a function implementation.
    #[must_use]
    pub fn new(function: Arc<dyn Function>) -> Self {
        Self(function)
    }

    /// The function's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Minimum number of arguments.
    #[must_use]
    pub fn min_args(&self) -> usize {
        self.0.min_args()
    }

    /// Maximum number of arguments.
    #[must_use]
    pub fn max_args(&self) -> usize {
        self.0.max_args()
    }

    /// Invoke the function.
    pub fn invoke(&self, args: Vec<Value>) -> EvalResult<Value> {
        self.0.call(args)
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionHandle({})", self.name())
    }
}

// ---------------------------------------------------------------------------
// Native function helper
// ---------------------------------------------------------------------------

/// A function backed by a plain Rust fn, for built-in tables and tests.
pub struct NativeFunction {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    body: fn(Vec<Value>) -> EvalResult<Value>,
}

impl NativeFunction {
    /// Create a native function with a fixed arity range.
    #[must_use]
    pub const fn new(
        name: &'static str,
        min_args: usize,
        max_args: usize,
        body: fn(Vec<Value>) -> EvalResult<Value>,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            body,
        }
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn min_args(&self) -> usize {
        self.min_args
    }

    fn max_args(&self) -> usize {
        self.max_args
    }

    fn call(&self, args: Vec<Value>) -> EvalResult<Value> {
        (self.body)(args)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name → function tables, built-in names shadowing user-defined ones.
#[derive(Default)]
pub struct FunctionRegistry {
    builtins: HashMap<String, FunctionHandle>,
    user: HashMap<String, FunctionHandle>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in function.
    pub fn register_builtin(&mut self, function: Arc<dyn Function>) {
        self.builtins
            .insert(function.name().to_owned(), FunctionHandle::new(function));
    }

    /// Register a user-defined function.
    pub fn register_user(&mut self, function: Arc<dyn Function>) {
        self.user
            .insert(function.name().to_owned(), FunctionHandle::new(function));
    }

    /// Resolve a name, checking built-ins before user functions.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<FunctionHandle> {
        self.builtins
            .get(name)
            .or_else(|| self.user.get(name))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn first_arg(mut args: Vec<Value>) -> EvalResult<Value> {
        Ok(args.remove(0))
    }

    fn always_two(_args: Vec<Value>) -> EvalResult<Value> {
        Ok(Value::Numeric(2.0))
    }

    #[test]
    fn resolve_unknown_is_none() {
        let registry = FunctionRegistry::new();
        assert!(registry.resolve("nope").is_none());
    }

    #[test]
    fn builtin_shadows_user_function() {
        let mut registry = FunctionRegistry::new();
        registry.register_user(Arc::new(NativeFunction::new("f", 1, 1, first_arg)));
        registry.register_builtin(Arc::new(NativeFunction::new("f", 0, 0, always_two)));
        let handle = registry.resolve("f").unwrap();
        assert_eq!(handle.max_args(), 0, "built-in table is consulted first");
    }

    #[test]
    fn handle_reports_arity_and_invokes() {
        let mut registry = FunctionRegistry::new();
        registry.register_builtin(Arc::new(NativeFunction::new("id", 1, 1, first_arg)));
        let handle = registry.resolve("id").unwrap();
        assert_eq!((handle.min_args(), handle.max_args()), (1, 1));
        let out = handle.invoke(vec![Value::Numeric(9.0)]).unwrap();
        assert_eq!(out, Value::Numeric(9.0));
    }
}
