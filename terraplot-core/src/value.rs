//! Runtime values.
//!
//! Every expression evaluates to a [`Value`]: a number, a string, a
//! variable reference (the name, not its contents), an associative map, or
//! a geometry. A value's kind never changes after construction; coercions
//! such as reading a string as a number derive a new representation
//! without mutating the value.
//!
//! Coercion rules:
//! - string → numeric is total: text that does not parse yields 0.0
//! - map and geometry have no numeric form; coercing them is a type error
//! - string → geometry is attempted lazily via a WKT parse, and callers
//!   catch the failure to keep treating the value as a plain string

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use terraplot_geom::types::format_scalar;
use terraplot_geom::{Geometry, GeometryError, GeometryType};

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::order;

// ---------------------------------------------------------------------------
// Value kind
// ---------------------------------------------------------------------------

/// The kind of a [`Value`], used in diagnostics and type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Str,
    VarRef,
    Map,
    Geometry(GeometryType),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "number"),
            Self::Str => write!(f, "string"),
            Self::VarRef => write!(f, "variable reference"),
            Self::Map => write!(f, "map"),
            Self::Geometry(ty) => write!(f, "geometry ({ty})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Associative map
// ---------------------------------------------------------------------------

/// A string-keyed map of values — the language's only composite type.
///
/// Reads of absent keys yield the empty-string value rather than an error,
/// matching awk/Perl array semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: HashMap<String, Value>,
}

impl ValueMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key; absent keys yield the empty-string value.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(Value::empty_str)
    }

    /// Insert or replace an entry.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in numeric-aware sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        order::sort_keys(&mut keys);
        keys
    }

    /// Keys ordered by their values ([`Value::compare`], stable).
    #[must_use]
    pub fn keys_sorted_by_value(&self) -> Vec<String> {
        let mut keys = self.keys();
        keys.sort_by(|a, b| self.get(a).compare(&self.get(b)));
        keys
    }

    /// Whether the key set is exactly `"1", "2", ..., "N"` in any order.
    #[must_use]
    pub fn is_sequential_list(&self) -> bool {
        let keys = self.keys();
        keys.iter()
            .enumerate()
            .all(|(i, k)| *k == (i + 1).to_string())
    }

    /// Canonical text form: a bracketed list when the keys are exactly
    /// `"1".."N"`, a braced object otherwise.
    #[must_use]
    pub fn to_text(&self) -> String {
        let keys = self.keys();
        if self.is_sequential_list() {
            let body: Vec<String> = keys.iter().map(|k| entry_text(&self.get(k))).collect();
            format!("[{}]", body.join(", "))
        } else {
            let body: Vec<String> = keys
                .iter()
                .map(|k| format!("\"{k}\": {}", entry_text(&self.get(k))))
                .collect();
            format!("{{{}}}", body.join(", "))
        }
    }
}

/// Numbers, strings, and maps print bare inside a stringified map; every
/// other kind is quoted.
fn entry_text(value: &Value) -> String {
    match value {
        Value::Numeric(_) | Value::Str(_) | Value::Map(_) => value.to_text(),
        _ => format!("\"{}\"", value.to_text()),
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A number. Arithmetic never stores a non-finite value here; the
    /// evaluator raises a numeric-overflow error first.
    Numeric(f64),
    /// A string.
    Str(Arc<str>),
    /// A reference to a variable by name — the name itself, not its
    /// contents. Produced for assignment/increment targets.
    VarRef(Arc<str>),
    /// An associative map.
    Map(ValueMap),
    /// A geometry in packed-array form.
    Geometry(Geometry),
}

static EMPTY_STR: OnceLock<Arc<str>> = OnceLock::new();

impl Value {
    /// The shared numeric zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self::Numeric(0.0)
    }

    /// The shared numeric one.
    #[must_use]
    pub const fn one() -> Self {
        Self::Numeric(1.0)
    }

    /// The shared numeric minus-one.
    #[must_use]
    pub const fn minus_one() -> Self {
        Self::Numeric(-1.0)
    }

    /// The shared empty string. Unset variables and absent map keys read
    /// as this value.
    #[must_use]
    pub fn empty_str() -> Self {
        Self::Str(Arc::clone(EMPTY_STR.get_or_init(|| Arc::from(""))))
    }

    /// The shared empty geometry: a collection with no elements.
    #[must_use]
    pub fn empty_geometry() -> Self {
        Self::Geometry(Geometry::empty())
    }

    /// A numeric value, routed through the shared constants when exact.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn numeric(v: f64) -> Self {
        if v == 0.0 {
            Self::zero()
        } else if v == 1.0 {
            Self::one()
        } else {
            Self::Numeric(v)
        }
    }

    /// A string value.
    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// A truth value: the numeric one or zero.
    #[must_use]
    pub fn boolean(b: bool) -> Self {
        if b {
            Self::one()
        } else {
            Self::zero()
        }
    }

    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Numeric(_) => ValueKind::Numeric,
            Self::Str(_) => ValueKind::Str,
            Self::VarRef(_) => ValueKind::VarRef,
            Self::Map(_) => ValueKind::Map,
            Self::Geometry(g) => ValueKind::Geometry(g.geometry_type()),
        }
    }

    /// Numeric form of this value.
    ///
    /// Strings parse leniently: unparseable text coerces to 0.0. Calling
    /// this twice always yields the same result and never changes the
    /// value's kind.
    pub fn as_numeric(&self) -> EvalResult<f64> {
        match self {
            Self::Numeric(v) => Ok(*v),
            Self::Str(s) => Ok(s.trim().parse().unwrap_or(0.0)),
            Self::VarRef(name) => Err(EvalError::new(
                EvalErrorKind::TypeMismatch,
                format!("unresolved variable reference `{name}`"),
            )),
            Self::Map(_) | Self::Geometry(_) => Err(EvalError::new(
                EvalErrorKind::TypeMismatch,
                format!("cannot use a {} as a number", self.kind()),
            )),
        }
    }

    /// Truthiness: a number is true when non-zero, a string when
    /// non-empty. Other kinds have no truth value.
    pub fn truthy(&self) -> EvalResult<bool> {
        match self {
            Self::Numeric(v) => Ok(*v != 0.0),
            Self::Str(s) => Ok(!s.is_empty()),
            _ => Err(EvalError::new(
                EvalErrorKind::TypeMismatch,
                format!("cannot use a {} as a condition", self.kind()),
            )),
        }
    }

    /// Geometry form of this value. Strings are lazily parsed as WKT;
    /// callers routinely catch the failure and fall back to treating the
    /// value as a plain string.
    pub fn as_geometry(&self) -> Result<Geometry, GeometryError> {
        match self {
            Self::Geometry(g) => Ok(g.clone()),
            Self::Str(s) => terraplot_geom::wkt::parse_wkt(s),
            _ => Err(GeometryError::invalid_text(format!(
                "cannot interpret a {} as geometry",
                self.kind()
            ))),
        }
    }

    /// Canonical text form, used by concatenation, map stringification,
    /// and every downstream consumer.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Numeric(v) => format_scalar(*v),
            Self::Str(s) => s.to_string(),
            Self::VarRef(name) => name.to_string(),
            Self::Map(m) => m.to_text(),
            Self::Geometry(g) => g.to_wkt(),
        }
    }

    /// Well-known-text form, coercing through [`Self::as_geometry`].
    pub fn to_wkt(&self) -> Result<String, GeometryError> {
        Ok(self.as_geometry()?.to_wkt())
    }

    /// GeoJSON form, coercing through [`Self::as_geometry`].
    pub fn to_geojson(&self) -> Result<String, GeometryError> {
        Ok(self.as_geometry()?.to_geojson())
    }

    /// Total order for sorting: numeric when both sides are numbers,
    /// lexical on the canonical text otherwise.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            _ => self.to_text().cmp(&other.to_text()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
