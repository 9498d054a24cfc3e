//! Incremental point insertion with Delaunay legalization.
//!
//! # Algorithm
//!
//! Each point is located with [`locate`], then inserted by splitting the
//! containing triangle into three (interior hit) or the two triangles sharing
//! the containing edge into four (edge hit). The edges opposite the new vertex
//! are then legalized: while the far vertex of a neighboring triangle lies
//! strictly inside the circumcircle of the triangle under test, the shared
//! edge is flipped and the two new edges opposite the inserted vertex are
//! pushed for re-testing. Fixed edges and boundary edges are never flipped.
//!
//! Splitting an edge that is fixed forwards to the fixed-edge bookkeeping so
//! both halves inherit the constraint.
//!
//! # References
//!
//! - C. L. Lawson, "Software for C1 surface interpolation", Mathematical
//!   Software III, 1977 (flip-based legalization).
//! - S. W. Sloan, "A fast algorithm for constructing Delaunay triangulations
//!   in the plane", Advances in Engineering Software, 1987.

use crate::core::algorithms::locate::{locate, PointLocation};
use crate::core::collections::SmallBuffer;
use crate::core::edge::Edge;
use crate::core::error::TriangulationError;
use crate::core::triangle::{ccw, cw, TriInd, Triangle, VertInd, NO_NEIGHBOR};
use crate::core::triangulation_data_structure::Tds;
use crate::geometry::point::Point2;
use crate::geometry::predicates::in_circle;

/// Result of inserting one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointInsertion {
    /// A new vertex was created.
    Inserted(VertInd),
    /// The point coincides (within tolerance) with an existing vertex; no
    /// mutation took place.
    Duplicate(VertInd),
}

/// Inserts `p` into the mesh, walking from `seed` for location.
///
/// # Errors
///
/// Propagates location failures; see [`locate`].
pub fn insert_point(
    tds: &mut Tds,
    eps: f64,
    p: Point2,
    seed: TriInd,
) -> Result<PointInsertion, TriangulationError> {
    match locate(tds, eps, p, seed)? {
        PointLocation::OnVertex(v) => Ok(PointInsertion::Duplicate(v)),
        PointLocation::InsideTriangle(t) => {
            if let Some(v) = coincident_corner(tds, eps, p, t) {
                return Ok(PointInsertion::Duplicate(v));
            }
            Ok(PointInsertion::Inserted(split_triangle(tds, eps, t, p)?))
        }
        PointLocation::OnEdge(t, i) => {
            if let Some(v) = coincident_corner(tds, eps, p, t) {
                return Ok(PointInsertion::Duplicate(v));
            }
            Ok(PointInsertion::Inserted(split_edge(tds, eps, t, i, p)?))
        }
    }
}

/// A corner of triangle `t` within distance `eps` of `p`, if any.
///
/// Orientation tests alone can miss a near-coincident point that falls just
/// inside a sliver, so proximity to the located triangle's corners is checked
/// explicitly before splitting.
fn coincident_corner(tds: &Tds, eps: f64, p: Point2, t: TriInd) -> Option<VertInd> {
    if eps == 0.0 {
        return None;
    }
    tds.triangle(t)
        .vertices
        .iter()
        .copied()
        .find(|&v| tds.vertex(v).distance_squared(&p) <= eps * eps)
}

/// Splits triangle `t` into three at interior point `p` and legalizes the
/// triangle fan around the new vertex.
pub fn split_triangle(
    tds: &mut Tds,
    eps: f64,
    t: TriInd,
    p: Point2,
) -> Result<VertInd, TriangulationError> {
    let tri = *tds.triangle(t);
    let [v1, v2, v3] = tri.vertices;
    let [n1, n2, n3] = tri.neighbors;

    let new_v = tds.add_vertex(p);
    let t2 = tds.triangles().len() as TriInd;
    let t3 = t2 + 1;

    // Fan of three CCW triangles around the new vertex; `t` is reused.
    tds.replace_triangle(t, Triangle::new([new_v, v1, v2], [n3, t2, t3]));
    tds.add_triangle(Triangle::new([new_v, v2, v3], [n1, t3, t]));
    tds.add_triangle(Triangle::new([new_v, v3, v1], [n2, t, t2]));
    tds.change_neighbor(n1, t, t2);
    tds.change_neighbor(n2, t, t3);

    let mut stack: SmallBuffer<TriInd, 32> = SmallBuffer::new();
    stack.push(t);
    stack.push(t2);
    stack.push(t3);
    legalize(tds, eps, new_v, &mut stack)?;
    Ok(new_v)
}

/// Splits the edge opposite local vertex `i` of triangle `t` at point `p`,
/// producing four triangles, and legalizes around the new vertex.
///
/// If the split edge is fixed, both halves inherit its constraint
/// bookkeeping.
///
/// # Errors
///
/// Returns [`TriangulationError::InconsistentTopology`] if the edge is a
/// boundary edge, which cannot occur while the bounding super-triangle is in
/// place.
pub fn split_edge(
    tds: &mut Tds,
    eps: f64,
    t: TriInd,
    i: usize,
    p: Point2,
) -> Result<VertInd, TriangulationError> {
    let tri = *tds.triangle(t);
    let c = tri.vertices[i];
    let (a, b) = tri.edge_opposite(i);
    let t_opo = tri.neighbors[i];
    if t_opo == NO_NEIGHBOR {
        return Err(TriangulationError::InconsistentTopology {
            message: format!("edge ({a}, {b}) split on a boundary edge of triangle {t}"),
        });
    }
    let opo = *tds.triangle(t_opo);
    let i2 = opo
        .neighbor_index(t)
        .ok_or_else(|| TriangulationError::InconsistentTopology {
            message: format!("edge split: neighbor pointer {t_opo} -> {t} missing"),
        })?;
    let d = opo.vertices[i2];
    if opo.vertices[ccw(i2)] != b || opo.vertices[cw(i2)] != a {
        return Err(TriangulationError::InconsistentTopology {
            message: format!("edge split: triangles {t} and {t_opo} disagree on edge ({a}, {b})"),
        });
    }

    // Outer neighbors of the quadrilateral (a, d, b, c) around the edge.
    let n_bc = tri.neighbors[ccw(i)];
    let n_ca = tri.neighbors[cw(i)];
    let n_ad = opo.neighbors[ccw(i2)];
    let n_db = opo.neighbors[cw(i2)];

    let new_v = tds.add_vertex(p);
    let t_cb = tds.triangles().len() as TriInd;
    let t_db = t_cb + 1;

    // Four CCW triangles around the new vertex; `t` and `t_opo` are reused
    // for the halves on the `a` side.
    tds.replace_triangle(t, Triangle::new([a, new_v, c], [t_cb, n_ca, t_opo]));
    tds.replace_triangle(t_opo, Triangle::new([new_v, a, d], [n_ad, t_db, t]));
    tds.add_triangle(Triangle::new([new_v, b, c], [n_bc, t, t_db]));
    tds.add_triangle(Triangle::new([b, new_v, d], [t_opo, n_db, t_cb]));
    tds.change_neighbor(n_bc, t, t_cb);
    tds.change_neighbor(n_db, t_opo, t_db);

    tds.split_fixed_edge(Edge::new(a, b), new_v);

    let mut stack: SmallBuffer<TriInd, 32> = SmallBuffer::new();
    stack.push(t);
    stack.push(t_opo);
    stack.push(t_cb);
    stack.push(t_db);
    legalize(tds, eps, new_v, &mut stack)?;
    Ok(new_v)
}

/// Inserts `p` on the mesh edge `(a, b)` without a location walk, reusing an
/// existing endpoint if `p` coincides with it within tolerance.
///
/// Used by constraint recovery and conforming subdivision, which compute the
/// intersection point on a known crossed edge.
///
/// # Errors
///
/// Returns [`TriangulationError::InconsistentTopology`] if `(a, b)` is not a
/// mesh edge.
pub fn insert_point_on_edge(
    tds: &mut Tds,
    eps: f64,
    a: VertInd,
    b: VertInd,
    p: Point2,
) -> Result<VertInd, TriangulationError> {
    if eps > 0.0 {
        for v in [a, b] {
            if tds.vertex(v).distance_squared(&p) <= eps * eps {
                return Ok(v);
            }
        }
    }
    let tris = tds.triangles_of_edge(a, b);
    let t = *tris
        .first()
        .ok_or_else(|| TriangulationError::InconsistentTopology {
            message: format!("({a}, {b}) is not a mesh edge"),
        })?;
    let tri = tds.triangle(t);
    let i = (0..3)
        .find(|&i| tri.vertices[i] != a && tri.vertices[i] != b)
        .ok_or_else(|| TriangulationError::InconsistentTopology {
            message: format!("triangle {t} is degenerate on edge ({a}, {b})"),
        })?;
    split_edge(tds, eps, t, i, p)
}

/// Restores the Delaunay criterion around vertex `v`.
///
/// Every stacked triangle contains `v`; the edge opposite `v` is flipped when
/// the far vertex of the neighbor across it lies strictly inside the
/// triangle's circumcircle. Flipping keeps `v` in both resulting triangles,
/// so they are pushed back to test the two new edges opposite `v`.
fn legalize(
    tds: &mut Tds,
    eps: f64,
    v: VertInd,
    stack: &mut SmallBuffer<TriInd, 32>,
) -> Result<(), TriangulationError> {
    while let Some(t) = stack.pop() {
        let tri = *tds.triangle(t);
        let i = tri
            .vertex_index(v)
            .ok_or_else(|| TriangulationError::InconsistentTopology {
                message: format!("legalization: vertex {v} missing from triangle {t}"),
            })?;
        let opo = tri.neighbors[i];
        if opo == NO_NEIGHBOR {
            continue;
        }
        let (a, b) = tri.edge_opposite(i);
        if tds.is_fixed(Edge::new(a, b)) {
            continue;
        }
        let far =
            tds.opposed_vertex(opo, t)
                .ok_or_else(|| TriangulationError::InconsistentTopology {
                    message: format!("legalization: neighbor pointer {opo} -> {t} missing"),
                })?;
        let [p1, p2, p3] = tri.vertices.map(|x| tds.vertex(x));
        if in_circle(p1, p2, p3, tds.vertex(far), eps) {
            tds.flip_edge(t, opo)?;
            stack.push(t);
            stack.push(opo);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collections::FastHashSet;
    use crate::geometry::predicates::{orientation, Orientation};

    /// A single large CCW triangle enclosing the unit square.
    fn enclosing_mesh() -> Tds {
        let mut tds = Tds::new();
        tds.add_vertex(Point2::new(-10.0, -10.0)); // 0
        tds.add_vertex(Point2::new(20.0, -10.0)); // 1
        tds.add_vertex(Point2::new(0.0, 20.0)); // 2
        tds.add_triangle(Triangle::new([0, 1, 2], [NO_NEIGHBOR; 3]));
        tds
    }

    fn assert_mesh_consistent(tds: &Tds) {
        for (t, tri) in tds.triangles().iter().enumerate() {
            let [p1, p2, p3] = tri.vertices.map(|v| tds.vertex(v));
            assert_eq!(
                orientation(p1, p2, p3, 0.0),
                Orientation::CounterClockwise,
                "triangle {t} lost CCW winding"
            );
            for (i, &n) in tri.neighbors.iter().enumerate() {
                if n == NO_NEIGHBOR {
                    continue;
                }
                let back = tds.triangle(n).neighbor_index(t as TriInd);
                assert!(back.is_some(), "neighbor {n} of {t} has no back-pointer");
                let (a, b) = tri.edge_opposite(i);
                let (na, nb) = tds.triangle(n).edge_opposite(back.unwrap());
                assert_eq!((a, b), (nb, na), "shared edge mismatch between {t} and {n}");
            }
        }
        for (v, list) in tds.vertices_triangles().iter().enumerate() {
            let expected: FastHashSet<TriInd> = (0..tds.triangles().len() as TriInd)
                .filter(|&t| tds.triangle(t).contains_vertex(v as VertInd))
                .collect();
            let actual: FastHashSet<TriInd> = list.iter().copied().collect();
            assert_eq!(actual, expected, "incidence list of vertex {v} is stale");
        }
    }

    #[test]
    fn interior_insertion_splits_into_three() {
        let mut tds = enclosing_mesh();
        let result = insert_point(&mut tds, 0.0, Point2::new(1.0, 1.0), 0).unwrap();
        assert_eq!(result, PointInsertion::Inserted(3));
        assert_eq!(tds.triangles().len(), 3);
        assert_eq!(tds.vertices_triangles()[3].len(), 3);
        assert_mesh_consistent(&tds);
    }

    #[test]
    fn on_edge_insertion_splits_into_four() {
        let mut tds = enclosing_mesh();
        insert_point(&mut tds, 0.0, Point2::new(0.0, 0.0), 0).unwrap();
        // Midpoint of the interior edge from (0, 0) to (20, -10).
        let p = Point2::new(10.0, -5.0);
        let hint = tds.last_triangle();
        let result = insert_point(&mut tds, 0.0, p, hint).unwrap();
        let v = match result {
            PointInsertion::Inserted(v) => v,
            other => panic!("expected insertion, got {other:?}"),
        };
        assert_eq!(tds.triangles().len(), 5);
        // The new vertex sits on a former interior edge: four incident
        // triangles.
        assert_eq!(tds.vertices_triangles()[v as usize].len(), 4);
        assert_mesh_consistent(&tds);
    }

    #[test]
    fn duplicate_point_is_reported_not_inserted() {
        let mut tds = enclosing_mesh();
        insert_point(&mut tds, 0.0, Point2::new(1.0, 1.0), 0).unwrap();
        let before = tds.triangles().len();
        let hint = tds.last_triangle();
        let result = insert_point(&mut tds, 0.0, Point2::new(1.0, 1.0), hint);
        assert_eq!(result.unwrap(), PointInsertion::Duplicate(3));
        assert_eq!(tds.triangles().len(), before);
    }

    #[test]
    fn near_duplicate_merges_under_tolerance() {
        let mut tds = enclosing_mesh();
        let eps = 1e-6;
        insert_point(&mut tds, eps, Point2::new(1.0, 1.0), 0).unwrap();
        let hint = tds.last_triangle();
        let result = insert_point(&mut tds, eps, Point2::new(1.0 + 1e-9, 1.0), hint);
        assert_eq!(result.unwrap(), PointInsertion::Duplicate(3));
    }

    #[test]
    fn legalization_restores_delaunay() {
        let mut tds = enclosing_mesh();
        // Insert four points forming a square; every interior edge of the
        // result must satisfy the empty-circumcircle test.
        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ] {
            let hint = tds.last_triangle();
            insert_point(&mut tds, 0.0, p, hint).unwrap();
        }
        assert_mesh_consistent(&tds);
        for t in 0..tds.triangles().len() as TriInd {
            let tri = *tds.triangle(t);
            let [p1, p2, p3] = tri.vertices.map(|v| tds.vertex(v));
            for &n in &tri.neighbors {
                if n == NO_NEIGHBOR {
                    continue;
                }
                let far = tds.opposed_vertex(n, t).unwrap();
                assert!(
                    !in_circle(p1, p2, p3, tds.vertex(far), 0.0),
                    "edge between {t} and {n} is not locally Delaunay"
                );
            }
        }
    }

    #[test]
    fn splitting_fixed_edge_propagates_constraint() {
        let mut tds = enclosing_mesh();
        insert_point(&mut tds, 0.0, Point2::new(0.0, 0.0), 0).unwrap();
        let hint = tds.last_triangle();
        insert_point(&mut tds, 0.0, Point2::new(4.0, 0.0), hint).unwrap();
        let e = Edge::new(3, 4);
        assert!(tds.edge_exists(3, 4));
        tds.fix_edge(e, e);
        let hint = tds.last_triangle();
        let v = match insert_point(&mut tds, 0.0, Point2::new(2.0, 0.0), hint) {
            Ok(PointInsertion::Inserted(v)) => v,
            other => panic!("expected insertion, got {other:?}"),
        };
        assert!(!tds.is_fixed(e));
        assert!(tds.is_fixed(Edge::new(3, v)));
        assert!(tds.is_fixed(Edge::new(v, 4)));
        assert_mesh_consistent(&tds);
    }
}
