#![forbid(unsafe_code)]
//! # cdt2d
//!
//! A two-dimensional constrained Delaunay triangulation library built on
//! incremental insertion.
//!
//! Vertices are inserted into a bounding super-triangle with flip-based
//! Delaunay legalization; constraint edges are recovered by Sloan edge flips
//! or, in conforming mode, realized by Steiner subdivision. Finishing the
//! triangulation erases either just the super-triangle or everything outside
//! the constrained boundary including holes.
//!
//! ## Example
//!
//! ```rust
//! use cdt2d::prelude::*;
//!
//! let mut cdt = Triangulation::default();
//! cdt.insert_vertices(&[
//!     Point2::new(0.0, 0.0),
//!     Point2::new(4.0, 0.0),
//!     Point2::new(4.0, 4.0),
//!     Point2::new(0.0, 4.0),
//! ])?;
//! cdt.insert_edges(&[Edge::new(0, 2)])?;
//! cdt.erase_super_triangle()?;
//!
//! assert_eq!(cdt.triangles_count(), 2);
//! assert!(cdt.fixed_edges().contains(&Edge::new(0, 2)));
//! assert!(cdt.verify_topology());
//! # Ok::<(), cdt2d::core::error::TriangulationError>(())
//! ```
//!
//! ## Design
//!
//! - Index-addressed arenas: vertices and triangles are `u32` positions in
//!   `Vec`s, with `u32::MAX` as the shared "absent" sentinel. Erasure
//!   compacts the arenas and renumbers every dependent collection in one
//!   pass.
//! - Per-instance configuration, no globals: insertion order, the policy for
//!   intersecting constraint edges, and the geometric tolerance are fields
//!   of [`prelude::Triangulation`].
//! - Plain floating-point predicates with an explicit absolute tolerance;
//!   ties resolve toward the degenerate answer so legalization terminates.
//!
//! ## References
//!
//! - S. W. Sloan, "A fast algorithm for generating constrained Delaunay
//!   triangulations", Computers & Structures, 1993.
//! - L. P. Chew, "Constrained Delaunay triangulations", Algorithmica, 1989.

/// Core triangulation machinery: the mesh store, algorithms, and the public
/// [`core::triangulation::Triangulation`] interface.
pub mod core {
    /// Triangulation algorithms operating on the mesh store.
    pub mod algorithms {
        pub mod conforming;
        pub mod constraints;
        pub mod incremental_insertion;
        pub mod locate;
    }
    pub mod boundary;
    pub mod collections;
    pub mod edge;
    pub mod error;
    pub mod input;
    pub mod topology;
    pub mod triangle;
    pub mod triangulation;
    pub mod triangulation_data_structure;
}

/// Geometric primitives: the point type and tolerance-aware predicates.
pub mod geometry {
    pub mod point;
    pub mod predicates;
}

/// Convenient re-exports of the common public surface.
pub mod prelude {
    pub use crate::core::algorithms::constraints::{
        EdgeInsertionReport, IntersectingConstraintEdges,
    };
    pub use crate::core::edge::Edge;
    pub use crate::core::error::{IntersectionConflict, TriangulationError};
    pub use crate::core::input::{
        edges_from_flat, edges_from_pairs, points_from_flat, points_from_pairs,
    };
    pub use crate::core::triangle::{Triangle, TriInd, VertInd, NO_NEIGHBOR, NO_VERTEX};
    pub use crate::core::triangulation::{Triangulation, VertexInsertionOrder};
    pub use crate::geometry::point::Point2;
    pub use crate::geometry::predicates::Orientation;
}
