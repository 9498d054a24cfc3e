//! 2D point type used throughout the triangulation.
//!
//! Coordinates are plain `f64` values. Construction through [`Point2::new`]
//! accepts any values; [`Point2::try_new`] additionally rejects non-finite
//! coordinates, which is what the triangulation input boundary uses. The type
//! is `Copy` and serializes as an `{ x, y }` record.

use serde::{Deserialize, Serialize};

/// A point (or vector) in the plane.
///
/// # Examples
///
/// ```rust
/// use cdt2d::geometry::point::Point2;
///
/// let p = Point2::new(1.0, -0.5);
/// assert_eq!(p.x, 1.0);
/// assert_eq!(p.y, -0.5);
/// assert_eq!(p, Point2::from([1.0, -0.5]));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2 {
    /// Creates a point from raw coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a point, returning `None` if either coordinate is NaN or
    /// infinite.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cdt2d::geometry::point::Point2;
    ///
    /// assert!(Point2::try_new(0.0, 1.0).is_some());
    /// assert!(Point2::try_new(f64::NAN, 1.0).is_none());
    /// assert!(Point2::try_new(0.0, f64::INFINITY).is_none());
    /// ```
    #[inline]
    #[must_use]
    pub fn try_new(x: f64, y: f64) -> Option<Self> {
        if x.is_finite() && y.is_finite() {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl From<[f64; 2]> for Point2 {
    #[inline]
    fn from(xy: [f64; 2]) -> Self {
        Self::new(xy[0], xy[1])
    }
}

impl From<(f64, f64)> for Point2 {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point2> for [f64; 2] {
    #[inline]
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}
