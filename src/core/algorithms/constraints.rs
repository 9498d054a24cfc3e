//! Constraint edge insertion with flip-based recovery.
//!
//! # Algorithm
//!
//! A requested edge is realized segment by segment from a work stack. Each
//! segment is resolved by one of three cases:
//!
//! 1. the segment already exists as a mesh edge and is simply marked fixed;
//! 2. an existing vertex lies exactly on the segment, splitting the request
//!    into sub-segments on either side of it;
//! 3. the segment properly crosses interior mesh edges, which are collected
//!    by walking the triangles along the segment and then eliminated by edge
//!    flips until the segment itself becomes a mesh edge.
//!
//! During the crossing walk, an already-fixed crossed edge is a true
//! constraint conflict. Under [`IntersectingConstraintEdges::Ignore`] the
//! remainder of the request is abandoned and the conflict reported; under
//! [`IntersectingConstraintEdges::Resolve`] a Steiner vertex is inserted at
//! the intersection point, splitting both edges, and both sub-segments are
//! re-queued.
//!
//! Flips performed during recovery can leave non-Delaunay edges behind; the
//! diagonals created away from the constraint are re-legalized once the
//! constraint is in place.
//!
//! # References
//!
//! - S. W. Sloan, "A fast algorithm for generating constrained Delaunay
//!   triangulations", Computers & Structures, 1993.

use std::collections::VecDeque;

use tracing::debug;

use crate::core::algorithms::incremental_insertion::insert_point_on_edge;
use crate::core::edge::Edge;
use crate::core::error::{IntersectionConflict, TriangulationError};
use crate::core::triangle::{TriInd, VertInd, NO_NEIGHBOR};
use crate::core::triangulation_data_structure::Tds;
use crate::geometry::predicates::{
    collinear_point_within_segment, in_circle, intersection_point, orientation, segments_cross,
    Orientation,
};

/// Safety limit on work-stack iterations for a single requested edge.
const MAX_SEGMENTS: usize = 10_000;

/// Policy for a requested edge that properly crosses an existing fixed edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntersectingConstraintEdges {
    /// Abandon the remainder of the request and report the conflict.
    /// Sub-segments fixed before the conflict was discovered remain fixed.
    #[default]
    Ignore,
    /// Insert a Steiner vertex at the intersection point, splitting both
    /// edges, and continue.
    Resolve,
}

/// Outcome of a batch edge-insertion call.
#[derive(Debug, Clone, Default)]
pub struct EdgeInsertionReport {
    /// Number of requested edges applied without conflict.
    pub inserted: usize,
    /// Crossings with already-fixed edges encountered under
    /// [`IntersectingConstraintEdges::Ignore`]. The requested edge uses
    /// caller indexing; the obstructing edge uses internal indexing.
    pub conflicts: Vec<IntersectionConflict>,
}

/// Realizes `edge` as a chain of fixed mesh edges attributed to `original`.
///
/// Returns the obstructing fixed edge if the request was abandoned under the
/// [`IntersectingConstraintEdges::Ignore`] policy, `None` on full success.
///
/// # Errors
///
/// Fails on internal topology violations; input validation happens before
/// this layer.
pub fn insert_edge(
    tds: &mut Tds,
    eps: f64,
    edge: Edge,
    original: Edge,
    policy: IntersectingConstraintEdges,
) -> Result<Option<Edge>, TriangulationError> {
    let mut stack: Vec<(VertInd, VertInd)> = vec![edge.endpoints()];
    for _ in 0..MAX_SEGMENTS {
        let Some((s, t)) = stack.pop() else {
            return Ok(None);
        };
        if s == t {
            continue;
        }
        if tds.edge_exists(s, t) {
            tds.fix_edge(Edge::new(s, t), original);
            continue;
        }
        match realize_segment(tds, eps, s, t, policy, original)? {
            SegmentOutcome::Realized => {}
            SegmentOutcome::SplitAtVertex(w) => stack.push((w, t)),
            SegmentOutcome::SteinerInserted(x) => {
                stack.push((x, t));
                stack.push((s, x));
            }
            SegmentOutcome::Conflict(obstructing) => {
                debug!(?edge, ?obstructing, "constraint crossing ignored");
                return Ok(Some(obstructing));
            }
        }
    }
    Err(TriangulationError::InconsistentTopology {
        message: format!(
            "edge ({}, {}) did not converge within {MAX_SEGMENTS} segments",
            edge.v1(),
            edge.v2()
        ),
    })
}

enum SegmentOutcome {
    /// `(s, t)` realized and fixed.
    Realized,
    /// `(s, w)` realized and fixed; `(w, t)` remains.
    SplitAtVertex(VertInd),
    /// A Steiner vertex was inserted; both sub-segments remain.
    SteinerInserted(VertInd),
    /// Abandoned at an already-fixed crossed edge.
    Conflict(Edge),
}

/// How a segment leaves its start vertex.
pub(crate) enum EntryOutcome {
    /// `(s, t)` is already a mesh edge.
    EdgeExists,
    /// An adjacent vertex lies on the segment's interior.
    VertexOnSegment(VertInd),
    /// The segment properly crosses the edge `(left, right)` of `tri`, with
    /// `left` on its counter-clockwise side and `right` on its clockwise
    /// side.
    Crossing {
        tri: TriInd,
        left: VertInd,
        right: VertInd,
    },
}

/// Finds how the directed segment `s -> t` leaves the triangle fan around
/// `s`: along an existing edge, through an adjacent collinear vertex, or
/// across the opposite edge of exactly one fan triangle.
pub(crate) fn find_entry(
    tds: &Tds,
    eps: f64,
    s: VertInd,
    t: VertInd,
) -> Result<EntryOutcome, TriangulationError> {
    let ps = tds.vertex(s);
    let pt = tds.vertex(t);
    let mut crossing = None;

    for &tri_ind in &tds.vertices_triangles()[s as usize] {
        let tri = tds.triangle(tri_ind);
        let i = tri
            .vertex_index(s)
            .ok_or_else(|| TriangulationError::InconsistentTopology {
                message: format!("vertex {s} stale in incidence list at triangle {tri_ind}"),
            })?;
        let (a, b) = tri.edge_opposite(i);
        if a == t || b == t {
            return Ok(EntryOutcome::EdgeExists);
        }
        let o_a = orientation(ps, pt, tds.vertex(a), eps);
        let o_b = orientation(ps, pt, tds.vertex(b), eps);
        if o_a == Orientation::Collinear && collinear_point_within_segment(ps, pt, tds.vertex(a)) {
            return Ok(EntryOutcome::VertexOnSegment(a));
        }
        if o_b == Orientation::Collinear && collinear_point_within_segment(ps, pt, tds.vertex(b)) {
            return Ok(EntryOutcome::VertexOnSegment(b));
        }
        // The fan triangle is (s, a, b) CCW; the segment enters it when `a`
        // lies strictly clockwise of s -> t and `b` strictly counter-clockwise.
        if o_a == Orientation::Clockwise && o_b == Orientation::CounterClockwise {
            crossing = Some(EntryOutcome::Crossing {
                tri: tri_ind,
                left: b,
                right: a,
            });
        }
    }

    crossing.ok_or_else(|| TriangulationError::InconsistentTopology {
        message: format!("no triangle around vertex {s} faces vertex {t}"),
    })
}

/// Realizes the single segment `s -> t`, assuming it is not already a mesh
/// edge.
fn realize_segment(
    tds: &mut Tds,
    eps: f64,
    s: VertInd,
    t: VertInd,
    policy: IntersectingConstraintEdges,
    original: Edge,
) -> Result<SegmentOutcome, TriangulationError> {
    let ps = tds.vertex(s);
    let pt = tds.vertex(t);

    let (mut cur, mut left, mut right) = match find_entry(tds, eps, s, t)? {
        EntryOutcome::EdgeExists => {
            tds.fix_edge(Edge::new(s, t), original);
            return Ok(SegmentOutcome::Realized);
        }
        EntryOutcome::VertexOnSegment(w) => {
            tds.fix_edge(Edge::new(s, w), original);
            return Ok(SegmentOutcome::SplitAtVertex(w));
        }
        EntryOutcome::Crossing { tri, left, right } => (tri, left, right),
    };

    // Collect the edges the segment crosses, before mutating anything.
    let mut crossed: Vec<Edge> = Vec::new();
    let end = loop {
        let e = Edge::new(left, right);
        if tds.is_fixed(e) {
            match policy {
                IntersectingConstraintEdges::Ignore => return Ok(SegmentOutcome::Conflict(e)),
                IntersectingConstraintEdges::Resolve => {
                    let x = intersection_point(ps, pt, tds.vertex(left), tds.vertex(right));
                    let v = insert_point_on_edge(tds, eps, left, right, x)?;
                    debug!(edge = ?original, steiner = v, "resolved constraint crossing");
                    return Ok(SegmentOutcome::SteinerInserted(v));
                }
            }
        }
        crossed.push(e);

        let next = step_across(tds, cur, left, right)?;
        let w = third_vertex(tds, next, left, right)?;
        if w == t {
            break t;
        }
        match orientation(ps, pt, tds.vertex(w), eps) {
            Orientation::Collinear if collinear_point_within_segment(ps, pt, tds.vertex(w)) => {
                break w;
            }
            Orientation::Collinear => {
                return Err(TriangulationError::InconsistentTopology {
                    message: format!(
                        "vertex {w} is collinear with but outside segment ({s}, {t})"
                    ),
                });
            }
            Orientation::CounterClockwise => left = w,
            Orientation::Clockwise => right = w,
        }
        cur = next;
    };

    let fresh = flip_crossed(tds, eps, s, end, crossed)?;
    // Fix before re-legalizing so the recovered edge itself cannot be
    // flipped away again.
    tds.fix_edge(Edge::new(s, end), original);
    restore_delaunay(tds, eps, fresh)?;
    if end == t {
        Ok(SegmentOutcome::Realized)
    } else {
        Ok(SegmentOutcome::SplitAtVertex(end))
    }
}

/// The neighbor of `cur` across its edge `(left, right)`.
fn step_across(
    tds: &Tds,
    cur: TriInd,
    left: VertInd,
    right: VertInd,
) -> Result<TriInd, TriangulationError> {
    let tri = tds.triangle(cur);
    let i = (0..3)
        .find(|&i| tri.vertices[i] != left && tri.vertices[i] != right)
        .ok_or_else(|| TriangulationError::InconsistentTopology {
            message: format!("triangle {cur} is degenerate on edge ({left}, {right})"),
        })?;
    let next = tri.neighbors[i];
    if next == NO_NEIGHBOR {
        return Err(TriangulationError::InconsistentTopology {
            message: format!("segment walk left the mesh across edge ({left}, {right})"),
        });
    }
    Ok(next)
}

/// The vertex of `t` that is neither `a` nor `b`.
fn third_vertex(tds: &Tds, t: TriInd, a: VertInd, b: VertInd) -> Result<VertInd, TriangulationError> {
    tds.triangle(t)
        .vertices
        .iter()
        .copied()
        .find(|&v| v != a && v != b)
        .ok_or_else(|| TriangulationError::InconsistentTopology {
            message: format!("triangle {t} is degenerate on edge ({a}, {b})"),
        })
}

/// Eliminates the collected crossed edges by flipping until the segment
/// `(s, t)` is a mesh edge; returns the diagonals created away from it,
/// which may need re-legalization.
fn flip_crossed(
    tds: &mut Tds,
    eps: f64,
    s: VertInd,
    t: VertInd,
    crossed: Vec<Edge>,
) -> Result<Vec<Edge>, TriangulationError> {
    let ps = tds.vertex(s);
    let pt = tds.vertex(t);
    let mut queue: VecDeque<Edge> = crossed.into();
    let mut fresh: Vec<Edge> = Vec::new();

    let cap = (queue.len() + 1) * (queue.len() + 1) * 16 + 64;
    let mut steps = 0usize;
    while let Some(e) = queue.pop_front() {
        steps += 1;
        if steps > cap {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("constraint recovery for ({s}, {t}) did not converge"),
            });
        }
        let (a, b) = e.endpoints();
        let tris = tds.triangles_of_edge(a, b);
        let [t1, t2] = tris.as_slice() else {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("crossed edge ({a}, {b}) is not interior"),
            });
        };
        let (t1, t2) = (*t1, *t2);
        let c = tds
            .opposed_vertex(t1, t2)
            .ok_or_else(|| missing_pointer(t1, t2))?;
        let d = tds
            .opposed_vertex(t2, t1)
            .ok_or_else(|| missing_pointer(t2, t1))?;

        // Flip only when the quadrilateral (a, c, b, d) is strictly convex,
        // i.e. a and b fall on opposite sides of the candidate diagonal.
        let pc = tds.vertex(c);
        let pd = tds.vertex(d);
        let o_a = orientation(pc, pd, tds.vertex(a), eps);
        let o_b = orientation(pc, pd, tds.vertex(b), eps);
        let opposite_sides = matches!(
            (o_a, o_b),
            (Orientation::Clockwise, Orientation::CounterClockwise)
                | (Orientation::CounterClockwise, Orientation::Clockwise)
        );
        if !opposite_sides {
            queue.push_back(e);
            continue;
        }

        tds.flip_edge(t1, t2)?;
        let diag = Edge::new(c, d);
        if c != s && c != t && d != s && d != t && segments_cross(ps, pt, pc, pd, eps) {
            queue.push_back(diag);
        } else {
            fresh.push(diag);
        }
    }

    Ok(fresh)
}

fn missing_pointer(from: TriInd, to: TriInd) -> TriangulationError {
    TriangulationError::InconsistentTopology {
        message: format!("neighbor pointer {from} -> {to} missing"),
    }
}

/// Repeatedly flips the given diagonals while they violate the local
/// Delaunay criterion, tracking each diagonal through its replacements.
fn restore_delaunay(
    tds: &mut Tds,
    eps: f64,
    mut edges: Vec<Edge>,
) -> Result<(), TriangulationError> {
    let cap = edges.len() * edges.len() * 8 + 64;
    let mut steps = 0usize;
    loop {
        let mut swapped = false;
        for e in edges.iter_mut() {
            steps += 1;
            if steps > cap {
                return Err(TriangulationError::InconsistentTopology {
                    message: "post-constraint legalization did not converge".to_string(),
                });
            }
            if tds.is_fixed(*e) {
                continue;
            }
            let (a, b) = e.endpoints();
            let tris = tds.triangles_of_edge(a, b);
            let [t1, t2] = tris.as_slice() else {
                continue;
            };
            let (t1, t2) = (*t1, *t2);
            let [p1, p2, p3] = tds.triangle(t1).vertices.map(|v| tds.vertex(v));
            let far = tds
                .opposed_vertex(t2, t1)
                .ok_or_else(|| missing_pointer(t2, t1))?;
            if in_circle(p1, p2, p3, tds.vertex(far), eps) {
                let (c, d) = tds.flip_edge(t1, t2)?;
                *e = Edge::new(c, d);
                swapped = true;
            }
        }
        if !swapped {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental_insertion::{insert_point, PointInsertion};
    use crate::core::triangle::Triangle;
    use crate::geometry::point::Point2;

    /// Builds a mesh from a bounding triangle plus the given points; returns
    /// the vertex indices assigned to the points (offset by the 3 bounding
    /// vertices).
    fn mesh_with(points: &[(f64, f64)]) -> (Tds, Vec<VertInd>) {
        let mut tds = Tds::new();
        tds.add_vertex(Point2::new(-100.0, -100.0));
        tds.add_vertex(Point2::new(100.0, -100.0));
        tds.add_vertex(Point2::new(0.0, 100.0));
        tds.add_triangle(Triangle::new([0, 1, 2], [NO_NEIGHBOR; 3]));
        let mut inds = Vec::new();
        for &(x, y) in points {
            let hint = tds.last_triangle();
            match insert_point(&mut tds, 0.0, Point2::new(x, y), hint).unwrap() {
                PointInsertion::Inserted(v) => inds.push(v),
                PointInsertion::Duplicate(v) => panic!("unexpected duplicate vertex {v}"),
            }
        }
        (tds, inds)
    }

    #[test]
    fn existing_edge_is_fixed_in_place() {
        let (mut tds, v) = mesh_with(&[(-1.0, 0.0), (0.0, 0.5), (1.0, 0.0), (0.0, -0.5)]);
        // The diamond's Delaunay diagonal is the horizontal one.
        let e = Edge::new(v[0], v[2]);
        assert!(tds.edge_exists(v[0], v[2]));
        let conflict = insert_edge(
            &mut tds,
            0.0,
            e,
            e,
            IntersectingConstraintEdges::Ignore,
        )
        .unwrap();
        assert!(conflict.is_none());
        assert!(tds.is_fixed(e));
        assert_eq!(tds.overlap_count()[&e], 1);
    }

    #[test]
    fn crossing_edge_is_recovered_by_flipping() {
        let (mut tds, v) = mesh_with(&[(-1.0, 0.0), (0.0, 0.5), (1.0, 0.0), (0.0, -0.5)]);
        // The vertical diagonal crosses the Delaunay diagonal and must be
        // recovered with a flip.
        let e = Edge::new(v[1], v[3]);
        assert!(!tds.edge_exists(v[1], v[3]));
        let conflict = insert_edge(
            &mut tds,
            0.0,
            e,
            e,
            IntersectingConstraintEdges::Ignore,
        )
        .unwrap();
        assert!(conflict.is_none());
        assert!(tds.edge_exists(v[1], v[3]));
        assert!(tds.is_fixed(e));
        assert!(!tds.edge_exists(v[0], v[2]));
    }

    #[test]
    fn collinear_vertex_splits_the_request() {
        let (mut tds, v) = mesh_with(&[(-2.0, 0.0), (0.0, 0.0), (2.0, 0.0), (0.0, 3.0)]);
        // v[1] lies exactly on the segment v[0] -> v[2].
        let e = Edge::new(v[0], v[2]);
        let conflict = insert_edge(
            &mut tds,
            0.0,
            e,
            e,
            IntersectingConstraintEdges::Ignore,
        )
        .unwrap();
        assert!(conflict.is_none());
        assert!(!tds.is_fixed(e));
        for piece in [Edge::new(v[0], v[1]), Edge::new(v[1], v[2])] {
            assert!(tds.is_fixed(piece), "piece {piece:?} not fixed");
            assert_eq!(tds.piece_to_originals()[&piece].as_slice(), &[e]);
        }
    }

    #[test]
    fn ignore_policy_reports_obstruction_and_keeps_fixed_edge() {
        let (mut tds, v) = mesh_with(&[(-1.0, 0.0), (0.0, 0.5), (1.0, 0.0), (0.0, -0.5)]);
        let horizontal = Edge::new(v[0], v[2]);
        insert_edge(
            &mut tds,
            0.0,
            horizontal,
            horizontal,
            IntersectingConstraintEdges::Ignore,
        )
        .unwrap();
        let vertical = Edge::new(v[1], v[3]);
        let conflict = insert_edge(
            &mut tds,
            0.0,
            vertical,
            vertical,
            IntersectingConstraintEdges::Ignore,
        )
        .unwrap();
        assert_eq!(conflict, Some(horizontal));
        assert!(tds.is_fixed(horizontal));
        assert!(!tds.is_fixed(vertical));
        assert!(!tds.edge_exists(v[1], v[3]));
    }

    #[test]
    fn resolve_policy_splits_both_edges_at_the_crossing() {
        let (mut tds, v) = mesh_with(&[(-1.0, 0.0), (0.0, 0.5), (1.0, 0.0), (0.0, -0.5)]);
        let horizontal = Edge::new(v[0], v[2]);
        insert_edge(
            &mut tds,
            0.0,
            horizontal,
            horizontal,
            IntersectingConstraintEdges::Resolve,
        )
        .unwrap();
        let vertical = Edge::new(v[1], v[3]);
        let before = tds.vertices().len();
        let conflict = insert_edge(
            &mut tds,
            0.0,
            vertical,
            vertical,
            IntersectingConstraintEdges::Resolve,
        )
        .unwrap();
        assert!(conflict.is_none());
        assert_eq!(tds.vertices().len(), before + 1);
        let x = (tds.vertices().len() - 1) as VertInd;
        assert_eq!(tds.vertex(x), Point2::new(0.0, 0.0));
        // Both diagonals are now realized as two fixed halves each.
        assert!(!tds.is_fixed(horizontal));
        assert!(!tds.is_fixed(vertical));
        for (piece, original) in [
            (Edge::new(v[0], x), horizontal),
            (Edge::new(x, v[2]), horizontal),
            (Edge::new(v[1], x), vertical),
            (Edge::new(x, v[3]), vertical),
        ] {
            assert!(tds.is_fixed(piece), "piece {piece:?} not fixed");
            assert!(
                tds.piece_to_originals()[&piece].contains(&original),
                "piece {piece:?} lost its provenance"
            );
        }
    }

    #[test]
    fn repeated_insertion_increments_overlap() {
        let (mut tds, v) = mesh_with(&[(-1.0, 0.0), (0.0, 0.5), (1.0, 0.0), (0.0, -0.5)]);
        let e = Edge::new(v[0], v[2]);
        for _ in 0..3 {
            insert_edge(&mut tds, 0.0, e, e, IntersectingConstraintEdges::Ignore).unwrap();
        }
        assert_eq!(tds.fixed_edges().len(), 1);
        assert_eq!(tds.overlap_count()[&e], 3);
    }
}
