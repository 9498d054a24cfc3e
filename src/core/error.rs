//! Error types for triangulation construction and editing.

use thiserror::Error;

use crate::core::edge::Edge;

/// Errors raised by triangulation operations.
///
/// Input-validation errors (`InvalidEdge`, `DegenerateInput`) fail fast before
/// any mutation, leaving the structure unchanged. `InconsistentTopology`
/// indicates an internal invariant violation and is fatal for the instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriangulationError {
    /// A constraint edge references an out-of-range or duplicate (self-loop)
    /// vertex index. Rejected before any mutation.
    #[error(
        "invalid edge ({}, {}): out-of-range or duplicate vertex index ({vertex_count} vertices)",
        edge.v1(),
        edge.v2()
    )]
    InvalidEdge {
        /// The offending edge, in caller indexing.
        edge: Edge,
        /// Number of caller vertices known to the triangulation.
        vertex_count: u32,
    },

    /// Coincident points within tolerance, or a zero-length edge, under exact
    /// (`eps == 0`) predicates. With `eps > 0` coincident points merge
    /// instead.
    #[error("degenerate input: {message}")]
    DegenerateInput {
        /// Description of the degeneracy.
        message: String,
    },

    /// An internal topological invariant was violated. This indicates an
    /// implementation defect and must never be silently absorbed.
    #[error("inconsistent topology: {message}")]
    InconsistentTopology {
        /// Description of the violated invariant.
        message: String,
    },

    /// A mutating operation was invoked after an erase operation finalized
    /// the triangulation and renumbered its indices.
    #[error("triangulation is finalized; vertices and edges can no longer be inserted")]
    Finalized,
}

/// A true crossing between a requested constraint edge and an existing fixed
/// edge, encountered under the `Ignore` policy.
///
/// Conflicts are surfaced in the [`EdgeInsertionReport`] returned by edge
/// insertion rather than raised, so a batch can run to completion and report
/// every conflict at once.
///
/// [`EdgeInsertionReport`]: crate::core::algorithms::constraints::EdgeInsertionReport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionConflict {
    /// The requested edge (caller indexing) that could not be fully inserted.
    pub edge: Edge,
    /// The already-fixed edge (internal indexing) obstructing it.
    pub obstructing: Edge,
}
