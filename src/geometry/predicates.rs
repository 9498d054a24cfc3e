//! Geometric predicates for 2D triangulations.
//!
//! All predicates take an absolute tolerance `eps`. With `eps == 0.0` the
//! tests are exact plain floating-point arithmetic; with `eps > 0.0` any
//! predicate value whose magnitude is at most `eps` is treated as the
//! degenerate case (collinear / on-boundary). Ties at the tolerance boundary
//! always resolve to the degenerate or "outside" answer, which is what
//! guarantees that flip legalization terminates.
//!
//! # References
//!
//! - J. R. Shewchuk, "Adaptive Precision Floating-Point Arithmetic and Fast
//!   Robust Geometric Predicates", Discrete & Computational Geometry, 1997
//!   (for the determinant formulations; this module uses the plain versions).

use crate::geometry::point::Point2;

/// Classification of point `c` against the directed segment `a -> b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `c` lies strictly to the right of `a -> b` (clockwise turn).
    Clockwise,
    /// `a`, `b`, `c` are collinear within tolerance.
    Collinear,
    /// `c` lies strictly to the left of `a -> b` (counter-clockwise turn).
    CounterClockwise,
}

/// Signed double area of the triangle `(a, b, c)`.
///
/// Positive for counter-clockwise winding.
#[inline]
#[must_use]
pub fn signed_area(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Orientation of `c` relative to the directed segment `a -> b`.
///
/// # Examples
///
/// ```rust
/// use cdt2d::geometry::point::Point2;
/// use cdt2d::geometry::predicates::{orientation, Orientation};
///
/// let a = Point2::new(0.0, 0.0);
/// let b = Point2::new(1.0, 0.0);
/// assert_eq!(orientation(a, b, Point2::new(0.5, 1.0), 0.0), Orientation::CounterClockwise);
/// assert_eq!(orientation(a, b, Point2::new(0.5, -1.0), 0.0), Orientation::Clockwise);
/// assert_eq!(orientation(a, b, Point2::new(2.0, 0.0), 0.0), Orientation::Collinear);
/// ```
#[inline]
#[must_use]
pub fn orientation(a: Point2, b: Point2, c: Point2, eps: f64) -> Orientation {
    let area = signed_area(a, b, c);
    if area > eps {
        Orientation::CounterClockwise
    } else if area < -eps {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Tests whether `d` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `(a, b, c)`.
///
/// Boundary cases (determinant within `eps` of zero) count as outside, so a
/// cocircular configuration never triggers an edge flip.
///
/// # Examples
///
/// ```rust
/// use cdt2d::geometry::point::Point2;
/// use cdt2d::geometry::predicates::in_circle;
///
/// let a = Point2::new(0.0, 0.0);
/// let b = Point2::new(1.0, 0.0);
/// let c = Point2::new(0.0, 1.0);
/// assert!(in_circle(a, b, c, Point2::new(0.3, 0.3), 0.0));
/// assert!(!in_circle(a, b, c, Point2::new(2.0, 2.0), 0.0));
/// // On the circle through the right triangle: counts as outside.
/// assert!(!in_circle(a, b, c, Point2::new(1.0, 1.0), 0.0));
/// ```
#[must_use]
pub fn in_circle(a: Point2, b: Point2, c: Point2, d: Point2, eps: f64) -> bool {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;

    let ad2 = adx * adx + ady * ady;
    let bd2 = bdx * bdx + bdy * bdy;
    let cd2 = cdx * cdx + cdy * cdy;

    let det = adx * (bdy * cd2 - cdy * bd2) - ady * (bdx * cd2 - cdx * bd2)
        + ad2 * (bdx * cdy - cdx * bdy);

    det > eps
}

/// Tests whether a point `p`, known to be collinear with segment `a -> b`,
/// lies strictly between `a` and `b`.
#[inline]
#[must_use]
pub fn collinear_point_within_segment(a: Point2, b: Point2, p: Point2) -> bool {
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len2 = (b.x - a.x) * (b.x - a.x) + (b.y - a.y) * (b.y - a.y);
    dot > 0.0 && dot < len2
}

/// Tests whether segments `(a, b)` and `(u, v)` cross at a single interior
/// point of both.
///
/// Shared endpoints and touching configurations do not count as crossings.
#[must_use]
pub fn segments_cross(a: Point2, b: Point2, u: Point2, v: Point2, eps: f64) -> bool {
    let o_u = orientation(a, b, u, eps);
    let o_v = orientation(a, b, v, eps);
    if o_u == Orientation::Collinear || o_v == Orientation::Collinear || o_u == o_v {
        return false;
    }
    let o_a = orientation(u, v, a, eps);
    let o_b = orientation(u, v, b, eps);
    o_a != Orientation::Collinear && o_b != Orientation::Collinear && o_a != o_b
}

/// Intersection point of the lines through `(a, b)` and `(u, v)`.
///
/// The caller must have established that the segments properly cross (for
/// example with [`segments_cross`]); the construction is the parametric form
/// `a + t (b - a)` with `t` derived from the cross-product ratio, which is
/// deterministic for identical inputs.
#[must_use]
pub fn intersection_point(a: Point2, b: Point2, u: Point2, v: Point2) -> Point2 {
    let r_x = b.x - a.x;
    let r_y = b.y - a.y;
    let s_x = v.x - u.x;
    let s_y = v.y - u.y;
    let denom = r_x * s_y - r_y * s_x;
    let t = ((u.x - a.x) * s_y - (u.y - a.y) * s_x) / denom;
    Point2::new(a.x + t * r_x, a.y + t * r_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orientation_antisymmetry() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 1.0);
        let c = Point2::new(1.0, 3.0);
        assert_eq!(orientation(a, b, c, 0.0), Orientation::CounterClockwise);
        assert_eq!(orientation(b, a, c, 0.0), Orientation::Clockwise);
    }

    #[test]
    fn orientation_respects_tolerance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        let c = Point2::new(5.0, 1e-9);
        assert_eq!(orientation(a, b, c, 0.0), Orientation::CounterClockwise);
        assert_eq!(orientation(a, b, c, 1e-6), Orientation::Collinear);
    }

    #[test]
    fn in_circle_cocircular_is_outside() {
        // Unit square corners are cocircular.
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(1.0, 1.0);
        let d = Point2::new(0.0, 1.0);
        assert!(!in_circle(a, b, c, d, 0.0));
    }

    #[test]
    fn in_circle_detects_interior_point() {
        let a = Point2::new(-1.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(in_circle(a, b, c, Point2::new(0.0, 0.1), 0.0));
        assert!(!in_circle(a, b, c, Point2::new(0.0, -5.0), 0.0));
    }

    #[test]
    fn collinear_within_segment_excludes_endpoints() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(4.0, 0.0);
        assert!(collinear_point_within_segment(a, b, Point2::new(2.0, 0.0)));
        assert!(!collinear_point_within_segment(a, b, a));
        assert!(!collinear_point_within_segment(a, b, b));
        assert!(!collinear_point_within_segment(a, b, Point2::new(5.0, 0.0)));
    }

    #[test]
    fn segments_cross_diamond_diagonals() {
        let a = Point2::new(-1.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let u = Point2::new(0.0, 0.5);
        let v = Point2::new(0.0, -0.5);
        assert!(segments_cross(a, b, u, v, 0.0));
        // Sharing an endpoint is not a crossing.
        assert!(!segments_cross(a, b, a, u, 0.0));
    }

    #[test]
    fn intersection_point_of_diamond_diagonals() {
        let x = intersection_point(
            Point2::new(-1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.5),
            Point2::new(0.0, -0.5),
        );
        assert_relative_eq!(x.x, 0.0);
        assert_relative_eq!(x.y, 0.0);
    }
}
