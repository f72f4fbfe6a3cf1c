//! Core geometry types: subtype tags, segment ops, and the packed array.
//!
//! Every geometry value is one flat `f64` sequence:
//!
//! | Subtype             | Layout                                          |
//! |---------------------|-------------------------------------------------|
//! | point / linestring  | `[type, count, (op, x, y) × count]`             |
//! | polygon             | same, `count` = total vertices over all rings;  |
//! |                     | a `MOVETO` op starts a new ring                 |
//! | multi / collection  | `[type, subCount, <sub>, <sub>, ...]` where     |
//! |                     | each sub recursively follows this layout        |
//!
//! `count == 0` denotes an empty geometry. A valid array is consumed
//! exactly by one recursive decode; no trailing or missing elements are
//! tolerated.

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::bbox::{self, Rect};
use crate::error::{GeomResult, GeometryError};
use crate::transform::{self, Transform};

/// Coordinate scalar. The packed array, transforms, and bounding boxes all
/// use `f64`.
pub type Scalar = f64;

/// Segment op: start of a figure (or ring).
pub const MOVETO: Scalar = 0.0;
/// Segment op: continuation of the current figure.
pub const LINETO: Scalar = 1.0;

// ---------------------------------------------------------------------------
// Geometry subtype tags
// ---------------------------------------------------------------------------

/// The subtype of a geometry value.
///
/// Discriminants are the type codes stored in slot 0 of the packed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl GeometryType {
    /// The type code as stored in the packed array.
    #[must_use]
    pub const fn code(self) -> Scalar {
        self as u8 as Scalar
    }

    /// Decode a type code read from a packed array.
    #[must_use]
    pub fn from_code(code: Scalar) -> Option<Self> {
        if code.fract() != 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let code = code as i64;
        match code {
            1 => Some(Self::Point),
            2 => Some(Self::LineString),
            3 => Some(Self::Polygon),
            4 => Some(Self::MultiPoint),
            5 => Some(Self::MultiLineString),
            6 => Some(Self::MultiPolygon),
            7 => Some(Self::GeometryCollection),
            _ => None,
        }
    }

    /// Whether the payload is a list of nested sub-geometries rather than
    /// a coordinate list.
    #[must_use]
    pub const fn is_multi(self) -> bool {
        matches!(
            self,
            Self::MultiPoint
                | Self::MultiLineString
                | Self::MultiPolygon
                | Self::GeometryCollection
        )
    }

    /// The WKT keyword for this subtype.
    #[must_use]
    pub const fn wkt_keyword(self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    /// The GeoJSON `"type"` member for this subtype.
    #[must_use]
    pub const fn geojson_name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wkt_keyword())
    }
}

// ---------------------------------------------------------------------------
// Scalar formatting
// ---------------------------------------------------------------------------

/// Canonical text form of a scalar: integral values print without a
/// fractional part (`10`, not `10.0`), everything else uses the shortest
/// `f64` representation.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_scalar(v: Scalar) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A geometry value: subtype tag, packed coordinate array, and a lazily
/// computed bounding box.
///
/// The coordinate array is shared on clone; a `Geometry` is immutable once
/// constructed. Bounding boxes are cached on first request for every
/// subtype except [`GeometryType::Point`], which is cheap to recompute.
#[derive(Debug, Clone)]
pub struct Geometry {
    geometry_type: GeometryType,
    coords: Arc<[Scalar]>,
    bbox: OnceCell<Option<Rect>>,
}

impl Geometry {
    /// Build a geometry from a packed array, validating that the array is
    /// consumed exactly by one recursive decode.
    pub fn from_packed(coords: Vec<Scalar>) -> GeomResult<Self> {
        let end = validate(&coords, 0)?;
        if end != coords.len() {
            return Err(GeometryError::bad_array(format!(
                "{} trailing values after geometry of length {end}",
                coords.len() - end
            )));
        }
        let geometry_type = GeometryType::from_code(coords[0]).ok_or_else(|| {
            GeometryError::bad_array(format!("bad type code {}", coords[0]))
        })?;
        Ok(Self {
            geometry_type,
            coords: coords.into(),
            bbox: OnceCell::new(),
        })
    }

    /// Build from parts known to satisfy the packed-array invariant
    /// (used by the codecs after a shape-preserving rewrite).
    pub(crate) fn from_packed_unchecked(geometry_type: GeometryType, coords: Vec<Scalar>) -> Self {
        Self {
            geometry_type,
            coords: coords.into(),
            bbox: OnceCell::new(),
        }
    }

    /// The empty geometry: a collection with no elements.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_packed_unchecked(
            GeometryType::GeometryCollection,
            vec![GeometryType::GeometryCollection.code(), 0.0],
        )
    }

    /// Subtype tag.
    #[must_use]
    pub const fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// The packed coordinate array, including the leading type tag.
    #[must_use]
    pub fn coords(&self) -> &[Scalar] {
        &self.coords
    }

    /// Whether this geometry has no coordinates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.len() == 2
    }

    /// Bounding box over every vertex, or `None` for an empty geometry.
    ///
    /// Cached on first request, except for points.
    #[must_use]
    pub fn bbox(&self) -> Option<Rect> {
        if self.geometry_type == GeometryType::Point {
            return bbox::packed_bbox(&self.coords);
        }
        *self
            .bbox
            .get_or_init(|| bbox::packed_bbox(&self.coords))
    }

    /// Apply an affine transform, producing a brand-new geometry with the
    /// same shape. The source is never mutated.
    #[must_use]
    pub fn transformed(&self, t: &Transform) -> Self {
        let mut dst = self.coords.to_vec();
        let mut cursor = 0;
        transform::transform_packed(t, &mut dst, &mut cursor);
        Self::from_packed_unchecked(self.geometry_type, dst)
    }

    /// Serialize to well-known text.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        crate::wkt::format_wkt(&self.coords)
    }

    /// Serialize to a GeoJSON geometry object.
    #[must_use]
    pub fn to_geojson(&self) -> String {
        crate::geojson::format_geojson(&self.coords)
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.geometry_type == other.geometry_type && *self.coords == *other.coords
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wkt())
    }
}

// ---------------------------------------------------------------------------
// Packed-array validation
// ---------------------------------------------------------------------------

/// Check one geometry record starting at `at`; return the index just past
/// it. Every reader in this crate may then walk the array without bounds
/// failures.
fn validate(coords: &[Scalar], at: usize) -> GeomResult<usize> {
    let header = coords
        .get(at..at + 2)
        .ok_or_else(|| GeometryError::bad_array(format!("truncated header at index {at}")))?;
    let ty = GeometryType::from_code(header[0])
        .ok_or_else(|| GeometryError::bad_array(format!("bad type code {}", header[0])))?;
    let count = header[1];
    if count < 0.0 || count.fract() != 0.0 {
        return Err(GeometryError::bad_array(format!("bad count {count}")));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = count as usize;

    if ty.is_multi() {
        let mut next = at + 2;
        for _ in 0..count {
            next = validate(coords, next)?;
        }
        Ok(next)
    } else {
        let end = at + 2 + 3 * count;
        if end > coords.len() {
            return Err(GeometryError::bad_array(format!(
                "coordinate list truncated at index {at}"
            )));
        }
        for i in 0..count {
            let op = coords[at + 2 + 3 * i];
            if !(op == MOVETO || op == LINETO) {
                return Err(GeometryError::bad_array(format!("bad segment op {op}")));
            }
        }
        Ok(end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for ty in [
            GeometryType::Point,
            GeometryType::LineString,
            GeometryType::Polygon,
            GeometryType::MultiPoint,
            GeometryType::MultiLineString,
            GeometryType::MultiPolygon,
            GeometryType::GeometryCollection,
        ] {
            assert_eq!(GeometryType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(GeometryType::from_code(0.0), None);
        assert_eq!(GeometryType::from_code(3.5), None);
    }

    #[test]
    fn point_array_validates() {
        let g = Geometry::from_packed(vec![1.0, 1.0, MOVETO, 10.0, 20.0]).unwrap();
        assert_eq!(g.geometry_type(), GeometryType::Point);
        assert!(!g.is_empty());
    }

    #[test]
    fn trailing_values_rejected() {
        let err = Geometry::from_packed(vec![1.0, 1.0, MOVETO, 10.0, 20.0, 99.0]).unwrap_err();
        assert_eq!(err.kind, crate::error::GeometryErrorKind::BadArray);
    }

    #[test]
    fn truncated_array_rejected() {
        assert!(Geometry::from_packed(vec![2.0, 2.0, MOVETO, 0.0, 0.0]).is_err());
    }

    #[test]
    fn nested_multi_validates() {
        // MULTIPOINT of two points
        let g = Geometry::from_packed(vec![
            4.0, 2.0, //
            1.0, 1.0, MOVETO, 1.0, 2.0, //
            1.0, 1.0, MOVETO, 3.0, 4.0,
        ])
        .unwrap();
        assert_eq!(g.geometry_type(), GeometryType::MultiPoint);
    }

    #[test]
    fn bad_segment_op_rejected() {
        assert!(Geometry::from_packed(vec![1.0, 1.0, 7.0, 10.0, 20.0]).is_err());
    }

    #[test]
    fn empty_geometry() {
        let g = Geometry::empty();
        assert!(g.is_empty());
        assert_eq!(g.bbox(), None);
    }

    #[test]
    fn format_scalar_integral() {
        assert_eq!(format_scalar(10.0), "10");
        assert_eq!(format_scalar(-3.0), "-3");
        assert_eq!(format_scalar(0.0), "0");
    }

    #[test]
    fn format_scalar_fractional() {
        assert_eq!(format_scalar(2.5), "2.5");
        assert_eq!(format_scalar(-0.125), "-0.125");
    }
}
