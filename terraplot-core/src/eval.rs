//! Tree-walking evaluator.
//!
//! A recursive post-order walk over the parsed tree, producing a
//! [`Value`]. All variable state lives in the caller's [`VariableStore`].
//!
//! Semantics worth naming:
//! - an unset variable reads as the empty-string value, awk-style
//! - `and`/`or` evaluate BOTH operands, always — the language has no
//!   boolean short-circuit, and scripts rely on both side effects
//! - the conditional `?:` evaluates exactly one branch
//! - any arithmetic result that is infinite or NaN (divide-by-zero
//!   included) raises a numeric-overflow error instead of propagating
//! - `%` keeps C `fmod` semantics: the sign follows the dividend

use std::cmp::Ordering;

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::expr::{BinaryOp, ExprNode, Expression};
use crate::value::{Value, ValueMap};
use crate::variables::VariableStore;

/// Upper bound on the bytes a string-repeat may produce.
const MAX_REPEAT_BYTES: u64 = 1 << 32;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Evaluate a parsed expression against a variable store.
pub fn evaluate(expr: &Expression, vars: &mut dyn VariableStore) -> EvalResult<Value> {
    eval_node(expr.root(), vars)
}

// ---------------------------------------------------------------------------
// Recursive walk
// ---------------------------------------------------------------------------

fn eval_node(node: &ExprNode, vars: &mut dyn VariableStore) -> EvalResult<Value> {
    match node {
        ExprNode::Leaf(Value::VarRef(name)) => {
            Ok(vars.get_variable(name).unwrap_or_else(Value::empty_str))
        }
        ExprNode::Leaf(value) => Ok(value.clone()),

        ExprNode::Negate(operand) => {
            let v = eval_node(operand, vars)?.as_numeric()?;
            finite(-v).map(Value::numeric)
        }

        ExprNode::Not(operand) => {
            let truth = eval_node(operand, vars)?.truthy()?;
            Ok(Value::boolean(!truth))
        }

        ExprNode::Binary { op, left, right } => {
            // Both sides evaluate unconditionally, including for `and`/`or`.
            let l = eval_node(left, vars)?;
            let r = eval_node(right, vars)?;
            eval_binary(*op, &l, &r)
        }

        ExprNode::Ternary {
            cond,
            when_true,
            when_false,
        } => {
            if eval_node(cond, vars)?.truthy()? {
                eval_node(when_true, vars)
            } else {
                eval_node(when_false, vars)
            }
        }

        ExprNode::Subscript { map, key } => {
            let map_value = eval_node(map, vars)?;
            let key_value = eval_node(key, vars)?;
            let key_text = map_key_text(&key_value)?;
            // A missing variable or a non-map value reads as empty, like a
            // missing key would.
            match map_value {
                Value::Map(m) => Ok(m.get(&key_text)),
                _ => Ok(Value::empty_str()),
            }
        }

        ExprNode::MapLiteral { entries } => {
            let mut map = ValueMap::new();
            for (key_node, value_node) in entries {
                let key = map_key_text(&eval_node(key_node, vars)?)?;
                let value = eval_node(value_node, vars)?;
                if matches!(value, Value::Map(_)) {
                    return Err(EvalError::new(
                        EvalErrorKind::NestedMap,
                        "maps cannot nest inside map literals",
                    ));
                }
                map.set(key, value);
            }
            Ok(Value::Map(map))
        }

        ExprNode::FunctionCall { function, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_node(arg, vars)?);
            }
            function
                .invoke(values)
                .map_err(|e| e.prefixed(function.name()))
        }

        ExprNode::Assign { target, value } => {
            let value = eval_node(value, vars)?;
            write_target(target, value.clone(), vars)?;
            Ok(value)
        }

        ExprNode::Increment {
            target,
            delta,
            postfix,
        } => {
            // A still-unset variable reads as the empty string, which
            // coerces to numeric 0.
            let old = eval_node(target, vars)?.as_numeric()?;
            let new = finite(old + delta)?;
            write_target(target, Value::numeric(new), vars)?;
            Ok(Value::numeric(if *postfix { old } else { new }))
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment targets
// ---------------------------------------------------------------------------

fn write_target(target: &ExprNode, value: Value, vars: &mut dyn VariableStore) -> EvalResult<()> {
    match target {
        ExprNode::Leaf(Value::VarRef(name)) => {
            vars.define_variable(name, value);
            Ok(())
        }
        ExprNode::Subscript { map, key } => {
            let ExprNode::Leaf(Value::VarRef(name)) = map.as_ref() else {
                return Err(EvalError::new(
                    EvalErrorKind::NestedMap,
                    "cannot assign through a nested subscript; maps do not nest",
                ));
            };
            if matches!(value, Value::Map(_)) {
                return Err(EvalError::new(
                    EvalErrorKind::NestedMap,
                    "cannot store a map inside a map",
                ));
            }
            let key_value = eval_node(key, vars)?;
            let key_text = map_key_text(&key_value)?;
            vars.define_map_entry(name, key_text, value)
        }
        // The parser only produces the two target shapes above.
        _ => Err(EvalError::new(
            EvalErrorKind::TypeMismatch,
            "assignment target must be a variable or map entry",
        )),
    }
}

fn map_key_text(key: &Value) -> EvalResult<String> {
    match key {
        Value::Numeric(_) | Value::Str(_) => Ok(key.to_text()),
        _ => Err(EvalError::new(
            EvalErrorKind::InvalidKeyType,
            format!("map key must be a number or string, not a {}", key.kind()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------------

fn finite(v: f64) -> EvalResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EvalError::new(
            EvalErrorKind::NumericOverflow,
            "arithmetic overflow (infinite or undefined result)",
        ))
    }
}

fn arithmetic(l: &Value, r: &Value, op: fn(f64, f64) -> f64) -> EvalResult<Value> {
    finite(op(l.as_numeric()?, r.as_numeric()?)).map(Value::numeric)
}

fn numeric_compare(l: &Value, r: &Value, predicate: fn(Ordering) -> bool) -> EvalResult<Value> {
    let a = l.as_numeric()?;
    let b = r.as_numeric()?;
    Ok(Value::boolean(a.partial_cmp(&b).is_some_and(predicate)))
}

fn lexical_compare(l: &Value, r: &Value, predicate: fn(Ordering) -> bool) -> EvalResult<Value> {
    Ok(Value::boolean(predicate(l.to_text().cmp(&r.to_text()))))
}

fn eval_binary(op: BinaryOp, l: &Value, r: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => arithmetic(l, r, |a, b| a + b),
        BinaryOp::Subtract => arithmetic(l, r, |a, b| a - b),
        BinaryOp::Multiply => arithmetic(l, r, |a, b| a * b),
        BinaryOp::Divide => arithmetic(l, r, |a, b| a / b),
        // f64 `%` is fmod: the sign follows the dividend.
        BinaryOp::Modulo => arithmetic(l, r, |a, b| a % b),

        BinaryOp::Concat => Ok(Value::string(format!("{}{}", l.to_text(), r.to_text()))),

        BinaryOp::Repeat => {
            let count = r.as_numeric()?.floor();
            if count < 1.0 {
                return Ok(Value::empty_str());
            }
            let text = l.to_text();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = count as u64;
            if (text.len() as u64).saturating_mul(count) > MAX_REPEAT_BYTES {
                return Err(EvalError::new(
                    EvalErrorKind::NumericOverflow,
                    format!("string repeat count {count} is too large"),
                ));
            }
            #[allow(clippy::cast_possible_truncation)]
            let count = count as usize;
            Ok(Value::string(text.repeat(count)))
        }

        BinaryOp::And => {
            let a = l.truthy()?;
            let b = r.truthy()?;
            Ok(Value::boolean(a && b))
        }
        BinaryOp::Or => {
            let a = l.truthy()?;
            let b = r.truthy()?;
            Ok(Value::boolean(a || b))
        }

        BinaryOp::NumericEqual => numeric_compare(l, r, |o| o == Ordering::Equal),
        BinaryOp::NumericNotEqual => numeric_compare(l, r, |o| o != Ordering::Equal),
        BinaryOp::NumericLess => numeric_compare(l, r, |o| o == Ordering::Less),
        BinaryOp::NumericLessEqual => numeric_compare(l, r, |o| o != Ordering::Greater),
        BinaryOp::NumericGreater => numeric_compare(l, r, |o| o == Ordering::Greater),
        BinaryOp::NumericGreaterEqual => numeric_compare(l, r, |o| o != Ordering::Less),

        BinaryOp::LexicalEqual => lexical_compare(l, r, |o| o == Ordering::Equal),
        BinaryOp::LexicalNotEqual => lexical_compare(l, r, |o| o != Ordering::Equal),
        BinaryOp::LexicalLess => lexical_compare(l, r, |o| o == Ordering::Less),
        BinaryOp::LexicalLessEqual => lexical_compare(l, r, |o| o != Ordering::Greater),
        BinaryOp::LexicalGreater => lexical_compare(l, r, |o| o == Ordering::Greater),
        BinaryOp::LexicalGreaterEqual => lexical_compare(l, r, |o| o != Ordering::Less),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse_expression;
    use crate::functions::FunctionRegistry;
    use crate::stream::CharStream;
    use crate::variables::Variables;

    fn eval_with(text: &str, vars: &mut Variables) -> EvalResult<Value> {
        let mut stream = CharStream::new(text, "test");
        let expr = parse_expression(&mut stream, &FunctionRegistry::new()).unwrap();
        evaluate(&expr, vars)
    }

    fn eval(text: &str) -> Value {
        eval_with(text, &mut Variables::new()).unwrap()
    }

    fn eval_err(text: &str) -> EvalError {
        eval_with(text, &mut Variables::new()).unwrap_err()
    }

    // -- arithmetic --

    #[test]
    fn precedence_and_arithmetic() {
        assert_eq!(eval("3 + 4 * 2"), Value::Numeric(11.0));
        assert_eq!(eval("(3 + 4) * 2"), Value::Numeric(14.0));
        assert_eq!(eval("10 - 2 - 3"), Value::Numeric(5.0), "left fold");
        assert_eq!(eval("7 / 2"), Value::Numeric(3.5));
    }

    #[test]
    fn modulo_keeps_dividend_sign() {
        assert_eq!(eval("5 % 3"), Value::Numeric(2.0));
        assert_eq!(eval("-5 % 3"), Value::Numeric(-2.0));
        assert_eq!(eval("5 % -3"), Value::Numeric(2.0));
    }

    #[test]
    fn divide_by_zero_raises_overflow() {
        let err = eval_err("1 / 0");
        assert_eq!(err.kind, EvalErrorKind::NumericOverflow);
        assert_eq!(eval_err("0 % 0").kind, EvalErrorKind::NumericOverflow);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(eval("-5 + 2"), Value::Numeric(-3.0));
        assert_eq!(eval("- -5"), Value::Numeric(5.0));
    }

    #[test]
    fn strings_coerce_in_arithmetic() {
        assert_eq!(eval("'3' + '4'"), Value::Numeric(7.0));
        assert_eq!(eval("'oak' + 1"), Value::Numeric(1.0), "bad text reads as 0");
    }

    #[test]
    fn arithmetic_on_a_map_is_a_type_error() {
        assert_eq!(eval_err("[1, 2] + 1").kind, EvalErrorKind::TypeMismatch);
    }

    // -- strings --

    #[test]
    fn concatenation_stringifies_both_sides() {
        assert_eq!(eval("'foo' . 'bar'"), Value::string("foobar"));
        assert_eq!(eval("'n=' . 5"), Value::string("n=5"));
    }

    #[test]
    fn string_repeat_floors_its_count() {
        assert_eq!(eval("'ab' x 3"), Value::string("ababab"));
        assert_eq!(eval("'ab' x 2.9"), Value::string("abab"));
        assert_eq!(eval("'ab' x 0"), Value::empty_str());
        assert_eq!(eval("'ab' x -2"), Value::empty_str());
    }

    // -- comparisons --

    #[test]
    fn numeric_comparisons() {
        assert_eq!(eval("1 < 2"), Value::one());
        assert_eq!(eval("2 <= 2"), Value::one());
        assert_eq!(eval("3 > 4"), Value::zero());
        assert_eq!(eval("2 == 2"), Value::one());
        assert_eq!(eval("2 != 2"), Value::zero());
        // numeric comparison coerces strings
        assert_eq!(eval("'10' == 10"), Value::one());
    }

    #[test]
    fn lexical_comparisons() {
        assert_eq!(eval("'abc' lt 'abd'"), Value::one());
        assert_eq!(eval("'2' gt '10'"), Value::one(), "lexical, not numeric");
        assert_eq!(eval("'a' eq 'a'"), Value::one());
        assert_eq!(eval("5 ne 5"), Value::zero(), "numbers stringify first");
    }

    // -- truthiness and booleans --

    #[test]
    fn not_uses_string_emptiness() {
        assert_eq!(eval("not 0"), Value::one());
        assert_eq!(eval("not 2"), Value::zero());
        assert_eq!(eval("not ''"), Value::one());
        assert_eq!(eval("not '0'"), Value::zero(), "non-empty string is true");
    }

    #[test]
    fn and_or_evaluate_both_sides() {
        let mut vars = Variables::new();
        // Assignments as side effects: with short-circuiting `b` would
        // stay unset.
        let out = eval_with("(a = 1) or (b = 2)", &mut vars).unwrap();
        assert_eq!(out, Value::one());
        assert_eq!(vars.get_variable("a"), Some(Value::Numeric(1.0)));
        assert_eq!(vars.get_variable("b"), Some(Value::Numeric(2.0)));

        let mut vars = Variables::new();
        let out = eval_with("(c = 0) and (d = 4)", &mut vars).unwrap();
        assert_eq!(out, Value::zero());
        assert_eq!(vars.get_variable("d"), Some(Value::Numeric(4.0)));
    }

    #[test]
    fn ternary_evaluates_one_branch_only() {
        let mut vars = Variables::new();
        let out = eval_with("1 ? (t = 1) : (f = 2)", &mut vars).unwrap();
        assert_eq!(out, Value::one());
        assert_eq!(vars.get_variable("t"), Some(Value::Numeric(1.0)));
        assert_eq!(vars.get_variable("f"), None, "untaken branch must not run");
    }

    #[test]
    fn chained_ternary_nests_right() {
        assert_eq!(eval("0 ? 1 : 0 ? 2 : 3"), Value::Numeric(3.0));
        assert_eq!(eval("0 ? 1 : 1 ? 2 : 3"), Value::Numeric(2.0));
    }

    // -- variables --

    #[test]
    fn unset_variable_reads_as_empty_string() {
        assert_eq!(eval("ghost"), Value::empty_str());
        assert_eq!(eval("ghost + 1"), Value::Numeric(1.0));
    }

    #[test]
    fn assignment_returns_the_assigned_value() {
        let mut vars = Variables::new();
        assert_eq!(eval_with("a = 5", &mut vars).unwrap(), Value::Numeric(5.0));
        assert_eq!(vars.get_variable("a"), Some(Value::Numeric(5.0)));
        // chained
        assert_eq!(eval_with("b = c = 7", &mut vars).unwrap(), Value::Numeric(7.0));
        assert_eq!(vars.get_variable("b"), Some(Value::Numeric(7.0)));
        assert_eq!(vars.get_variable("c"), Some(Value::Numeric(7.0)));
    }

    #[test]
    fn increment_and_decrement() {
        let mut vars = Variables::new();
        vars.define_variable("n", Value::Numeric(5.0));
        assert_eq!(eval_with("++n", &mut vars).unwrap(), Value::Numeric(6.0));
        assert_eq!(
            eval_with("n++", &mut vars).unwrap(),
            Value::Numeric(6.0),
            "postfix returns the pre-increment value"
        );
        assert_eq!(vars.get_variable("n"), Some(Value::Numeric(7.0)));
        assert_eq!(eval_with("--n", &mut vars).unwrap(), Value::Numeric(6.0));
        assert_eq!(eval_with("n--", &mut vars).unwrap(), Value::Numeric(6.0));
        assert_eq!(vars.get_variable("n"), Some(Value::Numeric(5.0)));
    }

    #[test]
    fn postfix_increment_of_unset_variable_counts_from_zero() {
        let mut vars = Variables::new();
        assert_eq!(eval_with("u++", &mut vars).unwrap(), Value::zero());
        assert_eq!(vars.get_variable("u"), Some(Value::Numeric(1.0)));
    }

    // -- maps --

    #[test]
    fn map_entry_assignment_creates_the_map() {
        let mut vars = Variables::new();
        assert_eq!(
            eval_with("a[1] = 5", &mut vars).unwrap(),
            Value::Numeric(5.0)
        );
        let Some(value) = vars.get_variable("a") else {
            panic!("map was not created");
        };
        assert_eq!(value.to_text(), "[5]");
    }

    #[test]
    fn subscript_reads() {
        let mut vars = Variables::new();
        eval_with("a['k'] = 'v'", &mut vars).unwrap();
        assert_eq!(eval_with("a['k']", &mut vars).unwrap(), Value::string("v"));
        assert_eq!(
            eval_with("a['missing']", &mut vars).unwrap(),
            Value::empty_str()
        );
        // missing variable, and non-map variable, both read as empty
        assert_eq!(eval_with("b[1]", &mut vars).unwrap(), Value::empty_str());
        eval_with("s = 3", &mut vars).unwrap();
        assert_eq!(eval_with("s[1]", &mut vars).unwrap(), Value::empty_str());
    }

    #[test]
    fn numeric_keys_stringify() {
        let mut vars = Variables::new();
        eval_with("a[1] = 'one'", &mut vars).unwrap();
        assert_eq!(eval_with("a['1']", &mut vars).unwrap(), Value::string("one"));
    }

    #[test]
    fn subscript_of_literal_and_literal_values() {
        assert_eq!(eval("[10, 20][2]"), Value::Numeric(20.0));
        assert_eq!(eval("{'k': 9}['k']"), Value::Numeric(9.0));
        assert_eq!(eval("[10, 20].''"), Value::string("[10, 20]"));
    }

    #[test]
    fn map_entry_through_scalar_variable_fails() {
        let mut vars = Variables::new();
        eval_with("x = 1", &mut vars).unwrap();
        let err = eval_with("x[1] = 2", &mut vars).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::NotAMap);
    }

    #[test]
    fn maps_never_nest() {
        let mut vars = Variables::new();
        eval_with("m[1] = 0", &mut vars).unwrap();
        let err = eval_with("m[1] = [2]", &mut vars).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::NestedMap);

        let err = eval_with("m[1][2] = 3", &mut vars).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::NestedMap);
    }

    #[test]
    fn invalid_key_types_are_rejected() {
        let err = eval_err("a[[1]] = 2");
        assert_eq!(err.kind, EvalErrorKind::InvalidKeyType);
    }

    // -- overflow policy --

    #[test]
    fn overflow_raises_not_infinity() {
        assert_eq!(eval_err("1e308 * 10").kind, EvalErrorKind::NumericOverflow);
        assert_eq!(eval_err("1 / 0").kind, EvalErrorKind::NumericOverflow);
    }
}
