//! Axis-aligned bounding box computation over the packed geometry array.

use crate::types::{GeometryType, Scalar};

// ---------------------------------------------------------------------------
// Rect type
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: Scalar,
    pub min_y: Scalar,
    pub max_x: Scalar,
    pub max_y: Scalar,
}

impl Rect {
    /// An empty (inverted) bounding box.
    pub const EMPTY: Self = Self {
        min_x: Scalar::INFINITY,
        min_y: Scalar::INFINITY,
        max_x: Scalar::NEG_INFINITY,
        max_y: Scalar::NEG_INFINITY,
    };

    /// Check if this bounding box is valid (non-empty).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Width.
    #[must_use]
    pub fn width(&self) -> Scalar {
        if self.is_valid() {
            self.max_x - self.min_x
        } else {
            0.0
        }
    }

    /// Height.
    #[must_use]
    pub fn height(&self) -> Scalar {
        if self.is_valid() {
            self.max_y - self.min_y
        } else {
            0.0
        }
    }

    /// Expand to include a point.
    pub fn include_point(&mut self, x: Scalar, y: Scalar) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Expand to include another bounding box.
    pub fn union(&mut self, other: &Self) {
        if other.is_valid() {
            self.min_x = self.min_x.min(other.min_x);
            self.min_y = self.min_y.min(other.min_y);
            self.max_x = self.max_x.max(other.max_x);
            self.max_y = self.max_y.max(other.max_y);
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ---------------------------------------------------------------------------
// Packed-array traversal
// ---------------------------------------------------------------------------

/// Bounding box of the geometry record starting at index 0, or `None` when
/// no vertex contributes (empty geometry, empty collection).
#[must_use]
pub fn packed_bbox(coords: &[Scalar]) -> Option<Rect> {
    let mut rect = Rect::EMPTY;
    let mut cursor = 0;
    accumulate(coords, &mut cursor, &mut rect);
    rect.is_valid().then_some(rect)
}

/// Union the extent of one geometry record at `*cursor` into `rect`,
/// advancing the cursor past it.
///
/// Sibling sub-geometries of a multi-geometry share the cursor, so they
/// consume the array in strict left-to-right order with no overlap or gap.
pub fn accumulate(coords: &[Scalar], cursor: &mut usize, rect: &mut Rect) {
    let Some(&code) = coords.get(*cursor) else {
        return;
    };
    let Some(ty) = GeometryType::from_code(code) else {
        return;
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = coords.get(*cursor + 1).copied().unwrap_or(0.0) as usize;
    *cursor += 2;

    if ty.is_multi() {
        for _ in 0..count {
            accumulate(coords, cursor, rect);
        }
    } else {
        for _ in 0..count {
            if let Some(pair) = coords.get(*cursor + 1..*cursor + 3) {
                rect.include_point(pair[0], pair[1]);
            }
            *cursor += 3;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    reason = "exact float comparisons are intentional in tests"
)]
mod tests {
    use super::*;
    use crate::types::{LINETO, MOVETO};

    #[test]
    fn rect_empty_is_invalid() {
        let r = Rect::EMPTY;
        assert!(!r.is_valid());
        assert_eq!(r.width(), 0.0);
        assert_eq!(r.height(), 0.0);
    }

    #[test]
    fn rect_include_point() {
        let mut r = Rect::EMPTY;
        r.include_point(1.0, 2.0);
        r.include_point(5.0, 8.0);
        assert!(r.is_valid());
        assert_eq!(r.min_x, 1.0);
        assert_eq!(r.min_y, 2.0);
        assert_eq!(r.max_x, 5.0);
        assert_eq!(r.max_y, 8.0);
    }

    #[test]
    fn rect_union() {
        let mut a = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 5.0,
            max_y: 5.0,
        };
        let b = Rect {
            min_x: 3.0,
            min_y: -1.0,
            max_x: 10.0,
            max_y: 4.0,
        };
        a.union(&b);
        assert_eq!(a.min_y, -1.0);
        assert_eq!(a.max_x, 10.0);
    }

    #[test]
    fn rect_union_with_empty_is_noop() {
        let mut a = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        };
        let before = a;
        a.union(&Rect::EMPTY);
        assert_eq!(a, before);
    }

    #[test]
    fn point_bbox() {
        let r = packed_bbox(&[1.0, 1.0, MOVETO, 10.0, 20.0]).unwrap();
        assert_eq!(r.min_x, 10.0);
        assert_eq!(r.max_x, 10.0);
        assert_eq!(r.min_y, 20.0);
        assert_eq!(r.max_y, 20.0);
    }

    #[test]
    fn linestring_bbox_covers_all_vertices() {
        let r = packed_bbox(&[
            2.0, 3.0, //
            MOVETO, 0.0, 0.0, //
            LINETO, 10.0, -5.0, //
            LINETO, 4.0, 7.0,
        ])
        .unwrap();
        assert_eq!(r.min_x, 0.0);
        assert_eq!(r.max_x, 10.0);
        assert_eq!(r.min_y, -5.0);
        assert_eq!(r.max_y, 7.0);
    }

    #[test]
    fn empty_geometry_has_no_bbox() {
        assert_eq!(packed_bbox(&[3.0, 0.0]), None);
        assert_eq!(packed_bbox(&[7.0, 0.0]), None);
    }

    #[test]
    fn multi_geometry_unions_siblings_in_order() {
        // MULTIPOINT ((1 2), (30 40)) nested layout
        let r = packed_bbox(&[
            4.0, 2.0, //
            1.0, 1.0, MOVETO, 1.0, 2.0, //
            1.0, 1.0, MOVETO, 30.0, 40.0,
        ])
        .unwrap();
        assert_eq!(r.min_x, 1.0);
        assert_eq!(r.max_x, 30.0);
        assert_eq!(r.max_y, 40.0);
    }

    #[test]
    fn collection_skips_empty_members() {
        // GEOMETRYCOLLECTION (POLYGON EMPTY, POINT (5 6))
        let r = packed_bbox(&[
            7.0, 2.0, //
            3.0, 0.0, //
            1.0, 1.0, MOVETO, 5.0, 6.0,
        ])
        .unwrap();
        assert_eq!(r.min_x, 5.0);
        assert_eq!(r.min_y, 6.0);
    }
}
