//! Canonical undirected edge identifiers.
//!
//! Constraint edges and mesh edges are identified purely by their two vertex
//! indices, canonicalized so the smaller index comes first. `(a, b)` and
//! `(b, a)` therefore map to the same [`Edge`], which makes the fixed-edge
//! set, overlap counts and provenance maps duplicate-free by construction.

use serde::{Deserialize, Serialize};

use crate::core::triangle::VertInd;

/// Canonical identifier for an undirected edge between two vertex indices.
///
/// # Examples
///
/// ```rust
/// use cdt2d::core::edge::Edge;
///
/// let e = Edge::new(5, 2);
/// assert_eq!(e, Edge::new(2, 5));
/// assert_eq!(e.v1(), 2);
/// assert_eq!(e.v2(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    v1: VertInd,
    v2: VertInd,
}

impl Edge {
    /// Creates a canonical edge; endpoints are reordered so `v1() <= v2()`.
    #[inline]
    #[must_use]
    pub fn new(a: VertInd, b: VertInd) -> Self {
        if a <= b {
            Self { v1: a, v2: b }
        } else {
            Self { v1: b, v2: a }
        }
    }

    /// The smaller endpoint index.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> VertInd {
        self.v1
    }

    /// The larger endpoint index.
    #[inline]
    #[must_use]
    pub const fn v2(self) -> VertInd {
        self.v2
    }

    /// Both endpoints as a `(v1, v2)` tuple.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (VertInd, VertInd) {
        (self.v1, self.v2)
    }

    /// Returns this edge with both endpoints passed through `f`.
    ///
    /// Used by the compacting eraser to rewrite edges under an index remap;
    /// the result is re-canonicalized.
    #[inline]
    #[must_use]
    pub fn map_vertices(self, mut f: impl FnMut(VertInd) -> VertInd) -> Self {
        Self::new(f(self.v1), f(self.v2))
    }
}

impl From<(VertInd, VertInd)> for Edge {
    #[inline]
    fn from((a, b): (VertInd, VertInd)) -> Self {
        Self::new(a, b)
    }
}

impl From<[VertInd; 2]> for Edge {
    #[inline]
    fn from([a, b]: [VertInd; 2]) -> Self {
        Self::new(a, b)
    }
}
