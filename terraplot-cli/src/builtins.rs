//! Built-in functions for the CLI.
//!
//! A small math/string/geometry table standing in for the full function
//! library that lives outside the engine. Everything here goes through
//! the same [`FunctionRegistry`] seam user functions would.

use std::sync::Arc;

use terraplot_core::{
    EvalError, EvalErrorKind, FunctionRegistry, NativeFunction, Value,
};

/// Register every built-in into `registry`.
pub fn register(registry: &mut FunctionRegistry) {
    let table = vec![
        NativeFunction::new("abs", 1, 1, |args| numeric1(&args, f64::abs)),
        NativeFunction::new("ceil", 1, 1, |args| numeric1(&args, f64::ceil)),
        NativeFunction::new("floor", 1, 1, |args| numeric1(&args, f64::floor)),
        NativeFunction::new("round", 1, 1, |args| numeric1(&args, f64::round)),
        NativeFunction::new("sqrt", 1, 1, |args| numeric1(&args, f64::sqrt)),
        NativeFunction::new("min", 2, 2, |args| numeric2(&args, f64::min)),
        NativeFunction::new("max", 2, 2, |args| numeric2(&args, f64::max)),
        NativeFunction::new("pow", 2, 2, |args| numeric2(&args, f64::powf)),
        NativeFunction::new("length", 1, 1, length),
        NativeFunction::new("lower", 1, 1, |args| {
            Ok(Value::string(args[0].to_text().to_lowercase()))
        }),
        NativeFunction::new("upper", 1, 1, |args| {
            Ok(Value::string(args[0].to_text().to_uppercase()))
        }),
        NativeFunction::new("substr", 2, 3, substr),
        NativeFunction::new("wkt", 1, 1, wkt),
    ];
    for f in table {
        registry.register_builtin(Arc::new(f));
    }
}

/// Reject infinite/NaN results the same way the evaluator does.
fn finite(v: f64) -> Result<Value, EvalError> {
    if v.is_finite() {
        Ok(Value::numeric(v))
    } else {
        Err(EvalError::new(
            EvalErrorKind::NumericOverflow,
            "result is infinite or undefined",
        ))
    }
}

fn numeric1(args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    finite(f(args[0].as_numeric()?))
}

fn numeric2(args: &[Value], f: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    finite(f(args[0].as_numeric()?, args[1].as_numeric()?))
}

/// Element count for maps, character count for everything else.
#[allow(clippy::cast_precision_loss)]
fn length(args: Vec<Value>) -> Result<Value, EvalError> {
    let n = match &args[0] {
        Value::Map(map) => map.len(),
        other => other.to_text().chars().count(),
    };
    Ok(Value::numeric(n as f64))
}

/// `substr(text, offset)` or `substr(text, offset, count)` with a 1-based
/// offset, clamped to the text.
fn substr(args: Vec<Value>) -> Result<Value, EvalError> {
    let text = args[0].to_text();
    #[allow(clippy::cast_possible_truncation)]
    let offset = args[1].as_numeric()?.floor() as i64;
    let count = match args.get(2) {
        #[allow(clippy::cast_possible_truncation)]
        Some(v) => v.as_numeric()?.floor() as i64,
        None => i64::MAX,
    };
    if count <= 0 {
        return Ok(Value::empty_str());
    }
    let skip = offset.max(1) - 1;
    // A negative offset eats into the count, awk-style.
    let count = count.saturating_add(offset.min(1) - 1);
    if count <= 0 {
        return Ok(Value::empty_str());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let out: String = text
        .chars()
        .skip(skip as usize)
        .take(count as usize)
        .collect();
    Ok(Value::string(out))
}

/// Parse a WKT string into a geometry value.
fn wkt(args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::Geometry(args[0].as_geometry()?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
