//! Triangle records of the index-addressed mesh arena.
//!
//! A triangle stores its three vertex indices in counter-clockwise winding and
//! three neighbor triangle indices, with the invariant that `neighbors[i]` is
//! the triangle across the edge opposite `vertices[i]`. Absent neighbors (mesh
//! boundary) and absent vertices use the shared sentinel `u32::MAX`.

use serde::{Deserialize, Serialize};

/// Index of a vertex in the triangulation's vertex arena.
pub type VertInd = u32;

/// Index of a triangle in the triangulation's triangle arena.
pub type TriInd = u32;

/// Sentinel marking "no neighboring triangle" (mesh boundary).
pub const NO_NEIGHBOR: TriInd = TriInd::MAX;

/// Sentinel marking "no vertex".
pub const NO_VERTEX: VertInd = VertInd::MAX;

/// Next local index in counter-clockwise order.
#[inline]
#[must_use]
pub const fn ccw(i: usize) -> usize {
    (i + 1) % 3
}

/// Previous local index in counter-clockwise order.
#[inline]
#[must_use]
pub const fn cw(i: usize) -> usize {
    (i + 2) % 3
}

/// A triangle of the mesh: three vertices (CCW) and three neighbors, one
/// opposite each vertex.
///
/// # Examples
///
/// ```rust
/// use cdt2d::core::triangle::{Triangle, NO_NEIGHBOR};
///
/// let t = Triangle::new([0, 1, 2], [NO_NEIGHBOR, 4, 5]);
/// assert_eq!(t.vertex_index(1), Some(1));
/// assert_eq!(t.neighbors[0], NO_NEIGHBOR);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertex indices in counter-clockwise winding.
    pub vertices: [VertInd; 3],
    /// `neighbors[i]` lies across the edge opposite `vertices[i]`.
    pub neighbors: [TriInd; 3],
}

impl Triangle {
    /// Creates a triangle record.
    #[inline]
    #[must_use]
    pub const fn new(vertices: [VertInd; 3], neighbors: [TriInd; 3]) -> Self {
        Self {
            vertices,
            neighbors,
        }
    }

    /// Local index of vertex `v`, if present.
    #[inline]
    #[must_use]
    pub fn vertex_index(&self, v: VertInd) -> Option<usize> {
        self.vertices.iter().position(|&x| x == v)
    }

    /// Local index of neighbor `n`, if present.
    ///
    /// Because `neighbors[i]` is opposite `vertices[i]`, this is also the
    /// local index of the vertex opposed to the shared edge.
    #[inline]
    #[must_use]
    pub fn neighbor_index(&self, n: TriInd) -> Option<usize> {
        self.neighbors.iter().position(|&x| x == n)
    }

    /// Whether vertex `v` is a corner of this triangle.
    #[inline]
    #[must_use]
    pub fn contains_vertex(&self, v: VertInd) -> bool {
        self.vertices.contains(&v)
    }

    /// Endpoints of the edge opposite local vertex `i`, in CCW order.
    #[inline]
    #[must_use]
    pub fn edge_opposite(&self, i: usize) -> (VertInd, VertInd) {
        (self.vertices[ccw(i)], self.vertices[cw(i)])
    }

    /// Replaces the neighbor slot currently holding `old` with `new`.
    ///
    /// Does nothing if `old` is not a neighbor; used when adjacent triangles
    /// are rewired by splits and flips.
    #[inline]
    pub fn change_neighbor(&mut self, old: TriInd, new: TriInd) {
        if let Some(i) = self.neighbor_index(old) {
            self.neighbors[i] = new;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_index_cycles() {
        assert_eq!(ccw(0), 1);
        assert_eq!(ccw(2), 0);
        assert_eq!(cw(0), 2);
        assert_eq!(cw(1), 0);
    }

    #[test]
    fn edge_opposite_matches_winding() {
        let t = Triangle::new([10, 11, 12], [0, 1, 2]);
        assert_eq!(t.edge_opposite(0), (11, 12));
        assert_eq!(t.edge_opposite(1), (12, 10));
        assert_eq!(t.edge_opposite(2), (10, 11));
    }

    #[test]
    fn change_neighbor_rewires_single_slot() {
        let mut t = Triangle::new([0, 1, 2], [7, NO_NEIGHBOR, 9]);
        t.change_neighbor(9, 3);
        assert_eq!(t.neighbors, [7, NO_NEIGHBOR, 3]);
        t.change_neighbor(100, 5); // absent: no-op
        assert_eq!(t.neighbors, [7, NO_NEIGHBOR, 3]);
    }
}
