//! Flattening a triangle into its own plane.

use nalgebra::{Point2, Point3, Vector3};

/// A triangle expressed in a local orthonormal frame of its plane.
///
/// `z0` is the origin and `z1` lies on the positive x-axis, so only
/// `z1.x`, `z2.x` and `z2.y` carry information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTriangle {
    /// Image of the first corner, always the origin.
    pub z0: Point2<f64>,
    /// Image of the second corner, `(‖p1 − p0‖, 0)`.
    pub z1: Point2<f64>,
    /// Image of the third corner.
    pub z2: Point2<f64>,
}

/// Normalize, leaving a zero vector as is.
#[inline]
fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm != 0.0 {
        v / norm
    } else {
        Vector3::zeros()
    }
}

/// Project a 3D triangle into a 2D frame that preserves its edge lengths
/// and its angle at `p0`.
///
/// The frame is X along `p0 → p1`, Z the face normal and Y = Z × X.
/// Degenerate input is not an error: a zero-length first edge or collinear
/// corners leave the affected axes at zero, which collapses `z2` (and
/// possibly `z1`) instead of producing NaNs.
///
/// ```
/// use unfold::algo::parameterize::project_triangle;
/// use nalgebra::Point3;
///
/// let t = project_triangle(
///     &Point3::new(1.0, 1.0, 1.0),
///     &Point3::new(1.0, 1.0, 3.0),
///     &Point3::new(1.0, 2.0, 1.0),
/// );
/// assert_eq!(t.z1.x, 2.0);
/// assert!((t.z2.x - 0.0).abs() < 1e-12 && (t.z2.y - 1.0).abs() < 1e-12);
/// ```
pub fn project_triangle(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> LocalTriangle {
    let e1 = p1 - p0;
    let e2 = p2 - p0;

    let x = normalize_or_zero(e1);
    let z = normalize_or_zero(x.cross(&e2));
    let y = z.cross(&x);

    LocalTriangle {
        z0: Point2::origin(),
        z1: Point2::new(e1.norm(), 0.0),
        z2: Point2::new(e2.dot(&x), e2.dot(&y)),
    }
}
