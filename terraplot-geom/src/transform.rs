//! Affine transforms over geometry values.
//!
//! A [`Transform`] maps point (x, y) to
//! `(tx + txx*x + txy*y, ty + tyx*x + tyy*y)` and wraps `kurbo::Affine`
//! with named components. [`transform_packed`] walks a packed geometry
//! array with the same recursion as the bounding-box traversal, rewriting
//! only the coordinate pairs and leaving type/count/op tags untouched.

use kurbo::Affine;

use crate::types::{GeometryType, Scalar};

// ---------------------------------------------------------------------------
// Transform type
// ---------------------------------------------------------------------------

/// A 6-component affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub tx: Scalar,
    pub ty: Scalar,
    pub txx: Scalar,
    pub txy: Scalar,
    pub tyx: Scalar,
    pub tyy: Scalar,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        tx: 0.0,
        ty: 0.0,
        txx: 1.0,
        txy: 0.0,
        tyx: 0.0,
        tyy: 1.0,
    };

    /// Convert to a kurbo `Affine`.
    ///
    /// kurbo Affine coefficients: [a, b, c, d, e, f]
    /// mapping: x' = a*x + c*y + e,  y' = b*x + d*y + f
    #[inline]
    #[must_use]
    pub const fn to_affine(self) -> Affine {
        Affine::new([self.txx, self.tyx, self.txy, self.tyy, self.tx, self.ty])
    }

    /// Create from a kurbo `Affine`.
    #[inline]
    #[must_use]
    pub fn from_affine(a: Affine) -> Self {
        let c = a.as_coeffs();
        Self {
            txx: c[0],
            tyx: c[1],
            txy: c[2],
            tyy: c[3],
            tx: c[4],
            ty: c[5],
        }
    }

    /// Apply this transform to a coordinate pair.
    #[inline]
    #[must_use]
    pub fn apply(&self, x: Scalar, y: Scalar) -> (Scalar, Scalar) {
        (
            self.txy.mul_add(y, self.txx.mul_add(x, self.tx)),
            self.tyy.mul_add(y, self.tyx.mul_add(x, self.ty)),
        )
    }

    /// Compose: `self` applied first, then `other`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        Self::from_affine(other.to_affine() * self.to_affine())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Standard transform constructors
// ---------------------------------------------------------------------------

/// Create a translation transform.
#[must_use]
pub const fn shifted(dx: Scalar, dy: Scalar) -> Transform {
    Transform {
        tx: dx,
        ty: dy,
        ..Transform::IDENTITY
    }
}

/// Create a uniform scaling transform.
#[must_use]
pub const fn scaled(factor: Scalar) -> Transform {
    Transform {
        tx: 0.0,
        ty: 0.0,
        txx: factor,
        txy: 0.0,
        tyx: 0.0,
        tyy: factor,
    }
}

/// Create a rotation transform (angle in degrees, counter-clockwise).
#[must_use]
pub fn rotated(degrees: Scalar) -> Transform {
    let rad = degrees.to_radians();
    let c = rad.cos();
    let s = rad.sin();
    Transform {
        tx: 0.0,
        ty: 0.0,
        txx: c,
        txy: -s,
        tyx: s,
        tyy: c,
    }
}

// ---------------------------------------------------------------------------
// Packed-array traversal
// ---------------------------------------------------------------------------

/// Transform the coordinate pairs of one geometry record at `*cursor` in
/// place, advancing the cursor past it.
///
/// The destination keeps the source's exact shape: only x/y slots change.
pub fn transform_packed(t: &Transform, coords: &mut [Scalar], cursor: &mut usize) {
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
            transform_packed(t, coords, cursor);
        }
    } else {
        for _ in 0..count {
            if let Some(pair) = coords.get(*cursor + 1..*cursor + 3) {
                let (x, y) = t.apply(pair[0], pair[1]);
                coords[*cursor + 1] = x;
                coords[*cursor + 2] = y;
            }
            *cursor += 3;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, LINETO, MOVETO};

    const EPSILON: Scalar = 1e-10;

    #[test]
    fn shifted_moves_a_point() {
        let (x, y) = shifted(3.0, 4.0).apply(0.0, 0.0);
        assert!((x - 3.0).abs() < EPSILON);
        assert!((y - 4.0).abs() < EPSILON);
    }

    #[test]
    fn scaled_scales_both_axes() {
        let (x, y) = scaled(3.0).apply(2.0, 5.0);
        assert!((x - 6.0).abs() < EPSILON);
        assert!((y - 15.0).abs() < EPSILON);
    }

    #[test]
    fn rotated_90_degrees() {
        let (x, y) = rotated(90.0).apply(1.0, 0.0);
        assert!(x.abs() < EPSILON);
        assert!((y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn compose_shift_then_rotate() {
        let c = shifted(1.0, 0.0).then(&rotated(90.0));
        // (0,0) → shifted → (1,0) → rotated 90 → (0,1)
        let (x, y) = c.apply(0.0, 0.0);
        assert!(x.abs() < EPSILON);
        assert!((y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn affine_round_trip() {
        let t = rotated(30.0).then(&shifted(5.0, -3.0));
        let back = Transform::from_affine(t.to_affine());
        assert!((t.tx - back.tx).abs() < EPSILON);
        assert!((t.tyy - back.tyy).abs() < EPSILON);
    }

    #[test]
    fn transform_leaves_tags_untouched() {
        let g = Geometry::from_packed(vec![
            2.0, 2.0, //
            MOVETO, 1.0, 1.0, //
            LINETO, 2.0, 2.0,
        ])
        .unwrap();
        let moved = g.transformed(&shifted(10.0, 20.0));
        let c = moved.coords();
        assert_eq!(c[0], 2.0, "type tag must survive");
        assert_eq!(c[1], 2.0, "count must survive");
        assert_eq!(c[2], MOVETO);
        assert_eq!(c[5], LINETO);
        assert!((c[3] - 11.0).abs() < EPSILON);
        assert!((c[4] - 21.0).abs() < EPSILON);
    }

    #[test]
    fn transform_recurses_into_multi_geometries() {
        // MULTIPOINT ((1 2), (3 4))
        let g = Geometry::from_packed(vec![
            4.0, 2.0, //
            1.0, 1.0, MOVETO, 1.0, 2.0, //
            1.0, 1.0, MOVETO, 3.0, 4.0,
        ])
        .unwrap();
        let moved = g.transformed(&scaled(2.0));
        let c = moved.coords();
        assert!((c[5] - 2.0).abs() < EPSILON);
        assert!((c[6] - 4.0).abs() < EPSILON);
        assert!((c[10] - 6.0).abs() < EPSILON);
        assert!((c[11] - 8.0).abs() < EPSILON);
    }

    #[test]
    fn transform_does_not_mutate_source() {
        let g = Geometry::from_packed(vec![1.0, 1.0, MOVETO, 1.0, 2.0]).unwrap();
        let _ = g.transformed(&shifted(100.0, 100.0));
        assert_eq!(g.coords()[3], 1.0);
        assert_eq!(g.coords()[4], 2.0);
    }
}
