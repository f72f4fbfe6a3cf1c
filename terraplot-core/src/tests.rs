//! End-to-end engine tests: parse → evaluate → stringify, plus the
//! geometry round trips the engine's callers depend on.

use std::sync::Arc;

use terraplot_geom::wkt::parse_wkt;

use crate::error::EvalErrorKind;
use crate::eval::evaluate;
use crate::expr::parse_expression;
use crate::functions::{FunctionRegistry, NativeFunction};
use crate::stream::CharStream;
use crate::value::Value;
use crate::variables::{Variables, VariableStore};

fn run(text: &str, vars: &mut Variables) -> Value {
    let mut stream = CharStream::new(text, "test");
    let expr = parse_expression(&mut stream, &FunctionRegistry::new()).unwrap();
    evaluate(&expr, vars).unwrap()
}

#[test]
fn arithmetic_end_to_end() {
    let mut vars = Variables::new();
    assert_eq!(run("3 + 4 * 2", &mut vars), Value::Numeric(11.0));
}

#[test]
fn arithmetic_results_equal_the_shared_constants() {
    let mut vars = Variables::new();
    let out = run("1.0 + 0.0", &mut vars);
    assert_eq!(out, Value::one());
    assert_eq!(out.compare(&Value::one()), std::cmp::Ordering::Equal);
}

#[test]
fn concatenation_end_to_end() {
    let mut vars = Variables::new();
    assert_eq!(run("'foo' . 'bar'", &mut vars), Value::string("foobar"));
}

#[test]
fn map_assignment_end_to_end() {
    let mut vars = Variables::new();
    assert_eq!(run("a[1] = 5", &mut vars), Value::Numeric(5.0));
    let Some(Value::Map(map)) = vars.get_variable("a") else {
        panic!("`a` should be a map after subscript assignment");
    };
    assert_eq!(map.get("1"), Value::Numeric(5.0));
    assert_eq!(vars.get_variable("a").unwrap().to_text(), "[5]");
}

#[test]
fn point_packs_to_the_documented_array() {
    let g = parse_wkt("POINT (10 20)").unwrap();
    assert_eq!(g.coords(), &[1.0, 1.0, 0.0, 10.0, 20.0]);
    assert_eq!(g.to_wkt(), "POINT (10 20)");
}

#[test]
fn empty_polygon_to_geojson() {
    let g = parse_wkt("POLYGON EMPTY").unwrap();
    assert!(g.is_empty());
    assert_eq!(g.to_geojson(), r#"{"type":"Polygon","coordinates":null}"#);
}

#[test]
fn fmod_signs_end_to_end() {
    let mut vars = Variables::new();
    assert_eq!(run("5 % 3", &mut vars), Value::Numeric(2.0));
    assert_eq!(run("-5 % 3", &mut vars), Value::Numeric(-2.0));
}

#[test]
fn wkt_round_trips_through_the_value_layer() {
    let mut vars = Variables::new();
    vars.define_variable(
        "shape",
        Value::Geometry(parse_wkt("LINESTRING (0 0, 10 10, 20 0)").unwrap()),
    );
    let text = run("shape", &mut vars).to_text();
    assert_eq!(text, "LINESTRING (0 0, 10 10, 20 0)");
    // and back through the lazy string coercion
    let mut vars = Variables::new();
    vars.define_variable("wkt", Value::string(text));
    let geom = run("wkt", &mut vars).as_geometry().unwrap();
    assert_eq!(geom, parse_wkt("LINESTRING (0 0, 10 10, 20 0)").unwrap());
}

#[test]
fn function_errors_carry_the_function_name() {
    let mut registry = FunctionRegistry::new();
    registry.register_builtin(Arc::new(NativeFunction::new("half", 1, 1, |args| {
        let v = args[0].as_numeric()?;
        Ok(Value::numeric(v / 2.0))
    })));
    registry.register_builtin(Arc::new(NativeFunction::new("fail", 0, 0, |_| {
        Err(crate::error::EvalError::new(
            EvalErrorKind::TypeMismatch,
            "needs a geometry",
        ))
    })));

    let mut stream = CharStream::new("half(9) + fail()", "test");
    let expr = parse_expression(&mut stream, &registry).unwrap();
    let err = evaluate(&expr, &mut Variables::new()).unwrap_err();
    assert_eq!(err.message, "fail: needs a geometry");
}

#[test]
fn function_arguments_evaluate_left_to_right() {
    let mut registry = FunctionRegistry::new();
    registry.register_builtin(Arc::new(NativeFunction::new("second", 2, 2, |mut args| {
        Ok(args.remove(1))
    })));
    let mut stream = CharStream::new("second(a = 1, a + 1)", "test");
    let expr = parse_expression(&mut stream, &registry).unwrap();
    let mut vars = Variables::new();
    let out = evaluate(&expr, &mut vars).unwrap();
    assert_eq!(out, Value::Numeric(2.0), "second argument sees the first's write");
}

#[test]
fn variables_persist_across_expressions() {
    let mut vars = Variables::new();
    run("total = 0", &mut vars);
    run("total = total + 5", &mut vars);
    run("total++", &mut vars);
    assert_eq!(vars.get_variable("total"), Some(Value::Numeric(6.0)));
}

#[test]
fn geometry_bbox_through_the_value_layer() {
    let g = parse_wkt("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 30 40))").unwrap();
    let rect = g.bbox().unwrap();
    assert!((rect.min_x - 0.0).abs() < 1e-12);
    assert!((rect.max_x - 30.0).abs() < 1e-12);
    assert!((rect.max_y - 40.0).abs() < 1e-12);
}
