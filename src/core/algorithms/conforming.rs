//! Conforming edge insertion by Steiner subdivision.
//!
//! # Algorithm
//!
//! Unlike flip-based constraint recovery, conforming insertion never flips an
//! edge to make room for a constraint. Each requested edge is processed from
//! a work stack of sub-segments:
//!
//! 1. a sub-segment that already exists as a mesh edge is marked fixed;
//! 2. an existing vertex on the sub-segment splits it in two;
//! 3. otherwise a Steiner vertex is inserted at the intersection of the
//!    sub-segment with the first mesh edge it crosses, and both halves are
//!    re-queued.
//!
//! Crossed fixed edges are handled the same way as ordinary edges: the
//! Steiner vertex lands on them and splits their constraint bookkeeping, so
//! conforming insertion can never produce an intersection conflict. The
//! result contains every requested edge as a chain of fixed mesh edges whose
//! provenance records the original request.

use tracing::debug;

use crate::core::algorithms::constraints::{find_entry, EntryOutcome};
use crate::core::algorithms::incremental_insertion::insert_point_on_edge;
use crate::core::edge::Edge;
use crate::core::error::TriangulationError;
use crate::core::triangle::VertInd;
use crate::core::triangulation_data_structure::Tds;
use crate::geometry::predicates::intersection_point;

/// Safety limit on work-stack iterations for a single requested edge.
const MAX_SEGMENTS: usize = 10_000;

/// Realizes `edge` as a chain of fixed mesh edges attributed to `original`,
/// subdividing the mesh instead of flipping it.
///
/// # Errors
///
/// Fails on internal topology violations; input validation happens before
/// this layer.
pub fn conform_to_edge(
    tds: &mut Tds,
    eps: f64,
    edge: Edge,
    original: Edge,
) -> Result<(), TriangulationError> {
    let mut stack: Vec<(VertInd, VertInd)> = vec![edge.endpoints()];
    for _ in 0..MAX_SEGMENTS {
        let Some((s, t)) = stack.pop() else {
            return Ok(());
        };
        if s == t {
            continue;
        }
        if tds.edge_exists(s, t) {
            tds.fix_edge(Edge::new(s, t), original);
            continue;
        }
        match find_entry(tds, eps, s, t)? {
            EntryOutcome::EdgeExists => {
                tds.fix_edge(Edge::new(s, t), original);
            }
            EntryOutcome::VertexOnSegment(w) => {
                tds.fix_edge(Edge::new(s, w), original);
                stack.push((w, t));
            }
            EntryOutcome::Crossing { left, right, .. } => {
                let x = intersection_point(
                    tds.vertex(s),
                    tds.vertex(t),
                    tds.vertex(left),
                    tds.vertex(right),
                );
                let v = insert_point_on_edge(tds, eps, left, right, x)?;
                debug!(edge = ?original, steiner = v, "conforming subdivision");
                stack.push((v, t));
                stack.push((s, v));
            }
        }
    }
    Err(TriangulationError::InconsistentTopology {
        message: format!(
            "edge ({}, {}) did not conform within {MAX_SEGMENTS} segments",
            edge.v1(),
            edge.v2()
        ),
    })
}
