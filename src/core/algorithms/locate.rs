//! Point location by orientation walk.
//!
//! Starting from a seed triangle (the most recently created one works well for
//! incremental insertion, where consecutive points tend to be near each
//! other), the walk repeatedly tests the query point against the current
//! triangle's edges and steps across any edge the point lies strictly outside
//! of, until the point is inside or on the boundary of the current triangle.
//!
//! Tie rule: an orientation within tolerance of zero counts as collinear. The
//! walk only classifies a point as on-edge or on-vertex once no
//! strictly-outside edge remains; collinearity with one edge then means the
//! point lies on that edge's interior, collinearity with two edges means it
//! coincides with their shared vertex.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.

use crate::core::collections::{FastHashSet, SmallBuffer};
use crate::core::error::TriangulationError;
use crate::core::triangle::{TriInd, VertInd, NO_NEIGHBOR};
use crate::core::triangulation_data_structure::Tds;
use crate::geometry::point::Point2;
use crate::geometry::predicates::{orientation, Orientation};

/// Safety limit for cycle detection during the walk.
const MAX_STEPS: usize = 10_000;

/// Where a query point lies in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    /// Strictly inside the triangle.
    InsideTriangle(TriInd),
    /// On the interior of the edge opposite local vertex `1` of the triangle
    /// (`.1` is the local index of the opposed vertex).
    OnEdge(TriInd, usize),
    /// Coincides with an existing vertex.
    OnVertex(VertInd),
}

/// Locates `p` by walking the adjacency graph from `seed`.
///
/// # Errors
///
/// Returns [`TriangulationError::DegenerateInput`] if the walk exits the mesh
/// boundary (the point lies outside the bounding super-triangle) and
/// [`TriangulationError::InconsistentTopology`] if the walk cycles, which
/// indicates numerical degeneracy or corrupted adjacency.
pub fn locate(
    tds: &Tds,
    eps: f64,
    p: Point2,
    seed: TriInd,
) -> Result<PointLocation, TriangulationError> {
    let mut current = seed;
    let mut visited: FastHashSet<TriInd> = FastHashSet::default();

    for _ in 0..MAX_STEPS {
        if !visited.insert(current) {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("point location cycled at triangle {current}"),
            });
        }

        let tri = tds.triangle(current);
        let mut collinear: SmallBuffer<usize, 2> = SmallBuffer::new();
        let mut stepped = false;

        for i in 0..3 {
            let (a, b) = tri.edge_opposite(i);
            // The interior lies to the left of every CCW-directed edge.
            match orientation(tds.vertex(a), tds.vertex(b), p, eps) {
                Orientation::Clockwise => {
                    let neighbor = tri.neighbors[i];
                    if neighbor == NO_NEIGHBOR {
                        return Err(TriangulationError::DegenerateInput {
                            message: format!(
                                "point ({}, {}) lies outside the triangulation bounds",
                                p.x, p.y
                            ),
                        });
                    }
                    current = neighbor;
                    stepped = true;
                    break;
                }
                Orientation::Collinear => collinear.push(i),
                Orientation::CounterClockwise => {}
            }
        }
        if stepped {
            continue;
        }

        return match collinear.len() {
            0 => Ok(PointLocation::InsideTriangle(current)),
            1 => Ok(PointLocation::OnEdge(current, collinear[0])),
            2 => {
                // Collinear with two edges: p coincides with their shared
                // vertex, the one opposite neither edge.
                let shared = 3 - collinear[0] - collinear[1];
                Ok(PointLocation::OnVertex(tri.vertices[shared]))
            }
            _ => Err(TriangulationError::InconsistentTopology {
                message: format!("triangle {current} is degenerate during point location"),
            }),
        };
    }

    Err(TriangulationError::InconsistentTopology {
        message: format!("point location exceeded {MAX_STEPS} steps"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triangle::Triangle;

    /// Two CCW triangles covering the unit square: (0,0) (1,0) (1,1) (0,1).
    fn square_mesh() -> Tds {
        let mut tds = Tds::new();
        tds.add_vertex(Point2::new(0.0, 0.0)); // 0
        tds.add_vertex(Point2::new(1.0, 0.0)); // 1
        tds.add_vertex(Point2::new(1.0, 1.0)); // 2
        tds.add_vertex(Point2::new(0.0, 1.0)); // 3
        // t0 = (0, 1, 2), t1 = (0, 2, 3), sharing edge (0, 2).
        tds.add_triangle(Triangle::new([0, 1, 2], [NO_NEIGHBOR, 1, NO_NEIGHBOR]));
        tds.add_triangle(Triangle::new([0, 2, 3], [NO_NEIGHBOR, NO_NEIGHBOR, 0]));
        tds
    }

    #[test]
    fn locates_interior_point() {
        let tds = square_mesh();
        let loc = locate(&tds, 0.0, Point2::new(0.8, 0.2), 1).unwrap();
        assert_eq!(loc, PointLocation::InsideTriangle(0));
        let loc = locate(&tds, 0.0, Point2::new(0.2, 0.8), 0).unwrap();
        assert_eq!(loc, PointLocation::InsideTriangle(1));
    }

    #[test]
    fn locates_point_on_shared_edge() {
        let tds = square_mesh();
        let loc = locate(&tds, 0.0, Point2::new(0.5, 0.5), 0).unwrap();
        match loc {
            PointLocation::OnEdge(t, i) => {
                let (a, b) = tds.triangle(t).edge_opposite(i);
                assert_eq!(crate::core::edge::Edge::new(a, b), crate::core::edge::Edge::new(0, 2));
            }
            other => panic!("expected OnEdge, got {other:?}"),
        }
    }

    #[test]
    fn locates_existing_vertex() {
        let tds = square_mesh();
        let loc = locate(&tds, 0.0, Point2::new(1.0, 1.0), 1).unwrap();
        assert_eq!(loc, PointLocation::OnVertex(2));
    }

    #[test]
    fn outside_point_is_rejected() {
        let tds = square_mesh();
        let result = locate(&tds, 0.0, Point2::new(5.0, 5.0), 0);
        assert!(matches!(
            result,
            Err(TriangulationError::DegenerateInput { .. })
        ));
    }
}
