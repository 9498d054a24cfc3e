//! Public constrained Delaunay triangulation interface.
//!
//! A [`Triangulation`] owns the mesh store and the per-instance
//! configuration: vertex insertion order, the policy for constraint edges
//! that cross already-fixed edges, and the geometric tolerance. Construction
//! is incremental — vertex batches, then constraint edges — and ends with one
//! of the erase operations, which renumbers indices and finalizes the
//! instance.
//!
//! While the bounding super-triangle is in place, its three synthetic
//! vertices occupy internal indices `0..3` and caller vertex `i` lives at
//! internal index `i + 3` (or at the index of the vertex it merged with under
//! a positive tolerance). The erase operations compact the arenas, after
//! which the read views use the final contiguous numbering.

use tracing::debug;

use crate::core::algorithms::constraints::{
    insert_edge, EdgeInsertionReport, IntersectingConstraintEdges,
};
use crate::core::algorithms::conforming::conform_to_edge;
use crate::core::algorithms::incremental_insertion::{insert_point, PointInsertion};
use crate::core::boundary::{
    erase_outer_triangles_and_holes, erase_super_triangle, SUPER_VERTEX_COUNT,
};
use crate::core::collections::{FastHashMap, FastHashSet, OriginalEdges, VertexTriangles};
use crate::core::edge::Edge;
use crate::core::error::{IntersectionConflict, TriangulationError};
use crate::core::topology;
use crate::core::triangle::{Triangle, VertInd};
use crate::core::triangulation_data_structure::{CompactionRemap, Tds};
use crate::geometry::point::Point2;

/// Scale factor between the input bounding box and the super-triangle, large
/// enough that every Steiner point and hull edge stays interior.
const SUPER_GEOMETRY_SCALE: f64 = 1e5;

/// Order in which a vertex batch is inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VertexInsertionOrder {
    /// Insert in the order the caller provided.
    #[default]
    AsProvided,
}

/// An incrementally built constrained Delaunay triangulation.
///
/// # Examples
///
/// ```rust
/// use cdt2d::prelude::*;
///
/// let mut cdt = Triangulation::default();
/// cdt.insert_vertices(&[
///     Point2::new(-1.0, 0.0),
///     Point2::new(0.0, 0.5),
///     Point2::new(1.0, 0.0),
///     Point2::new(0.0, -0.5),
/// ])?;
/// cdt.insert_edges(&[Edge::new(0, 2)])?;
/// cdt.erase_super_triangle()?;
/// assert_eq!(cdt.vertices_count(), 4);
/// assert_eq!(cdt.triangles_count(), 2);
/// assert!(cdt.fixed_edges().contains(&Edge::new(0, 2)));
/// # Ok::<(), cdt2d::core::error::TriangulationError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    tds: Tds,
    vertex_insertion_order: VertexInsertionOrder,
    intersecting_edges: IntersectingConstraintEdges,
    tolerance: f64,
    /// Caller vertex index to internal arena index.
    caller_map: Vec<VertInd>,
    finalized: bool,
}

impl Triangulation {
    /// Creates a triangulation with the given configuration.
    ///
    /// A non-finite or negative `tolerance` is treated as `0.0` (exact
    /// arithmetic).
    #[must_use]
    pub fn new(
        vertex_insertion_order: VertexInsertionOrder,
        intersecting_edges: IntersectingConstraintEdges,
        tolerance: f64,
    ) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            0.0
        };
        Self {
            tds: Tds::new(),
            vertex_insertion_order,
            intersecting_edges,
            tolerance,
            caller_map: Vec::new(),
            finalized: false,
        }
    }

    /// The configured vertex insertion order.
    #[must_use]
    pub fn vertex_insertion_order(&self) -> VertexInsertionOrder {
        self.vertex_insertion_order
    }

    /// The configured policy for intersecting constraint edges.
    #[must_use]
    pub fn intersecting_edges(&self) -> IntersectingConstraintEdges {
        self.intersecting_edges
    }

    /// The configured geometric tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether an erase operation has finalized this triangulation.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Inserts a batch of vertices.
    ///
    /// The first batch also creates the bounding super-triangle around the
    /// batch's bounding box. Under a positive tolerance, a point coinciding
    /// with an existing vertex merges with it; the caller index still
    /// resolves to the surviving vertex in later edge references.
    ///
    /// # Errors
    ///
    /// - [`TriangulationError::Finalized`] after an erase operation.
    /// - [`TriangulationError::DegenerateInput`] for non-finite coordinates,
    ///   or exact duplicates under zero tolerance; both are detected before
    ///   any mutation.
    pub fn insert_vertices(&mut self, points: &[Point2]) -> Result<(), TriangulationError> {
        if self.finalized {
            return Err(TriangulationError::Finalized);
        }
        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(TriangulationError::DegenerateInput {
                    message: format!("non-finite coordinates ({}, {})", p.x, p.y),
                });
            }
        }
        if self.tolerance == 0.0 {
            self.reject_exact_duplicates(points)?;
        }
        if points.is_empty() {
            return Ok(());
        }
        if self.tds.vertices().is_empty() {
            self.add_super_triangle(points);
        }

        for &p in points {
            let seed = self.tds.last_triangle();
            match insert_point(&mut self.tds, self.tolerance, p, seed)? {
                PointInsertion::Inserted(v) => self.caller_map.push(v),
                PointInsertion::Duplicate(v) => {
                    if self.tolerance == 0.0 {
                        return Err(TriangulationError::DegenerateInput {
                            message: format!("duplicate point ({}, {})", p.x, p.y),
                        });
                    }
                    debug!(vertex = v, x = p.x, y = p.y, "merged coincident point");
                    self.caller_map.push(v);
                }
            }
        }
        Ok(())
    }

    /// Inserts constraint edges (caller vertex indexing), recovering each by
    /// edge flips.
    ///
    /// Under [`IntersectingConstraintEdges::Ignore`], a request that truly
    /// crosses an already-fixed edge is abandoned at the crossing and
    /// reported in the returned [`EdgeInsertionReport`]; sub-segments fixed
    /// before the crossing remain fixed. Under
    /// [`IntersectingConstraintEdges::Resolve`], a Steiner vertex is inserted
    /// at each such crossing instead.
    ///
    /// # Errors
    ///
    /// - [`TriangulationError::Finalized`] after an erase operation.
    /// - [`TriangulationError::InvalidEdge`] for out-of-range or self-loop
    ///   indices; the whole batch is validated before any mutation.
    /// - [`TriangulationError::DegenerateInput`] for an edge whose endpoints
    ///   merged into one vertex.
    pub fn insert_edges(
        &mut self,
        edges: &[Edge],
    ) -> Result<EdgeInsertionReport, TriangulationError> {
        let internal = self.validate_edges(edges)?;
        let mut report = EdgeInsertionReport::default();
        for (&caller, &edge) in edges.iter().zip(&internal) {
            match insert_edge(
                &mut self.tds,
                self.tolerance,
                edge,
                edge,
                self.intersecting_edges,
            )? {
                None => report.inserted += 1,
                Some(obstructing) => report.conflicts.push(IntersectionConflict {
                    edge: caller,
                    obstructing,
                }),
            }
        }
        Ok(report)
    }

    /// Inserts constraint edges (caller vertex indexing) by conforming
    /// subdivision: crossings are resolved with Steiner vertices and no edge
    /// is ever flipped to make room, so no conflict can arise.
    ///
    /// # Errors
    ///
    /// Same validation as [`Triangulation::insert_edges`].
    pub fn conform_to_edges(
        &mut self,
        edges: &[Edge],
    ) -> Result<EdgeInsertionReport, TriangulationError> {
        let internal = self.validate_edges(edges)?;
        for &edge in &internal {
            conform_to_edge(&mut self.tds, self.tolerance, edge, edge)?;
        }
        Ok(EdgeInsertionReport {
            inserted: edges.len(),
            conflicts: Vec::new(),
        })
    }

    /// Removes the super-triangle vertices and every triangle touching them,
    /// finalizing the triangulation with the caller's contiguous numbering.
    ///
    /// # Errors
    ///
    /// [`TriangulationError::Finalized`] if already erased.
    pub fn erase_super_triangle(&mut self) -> Result<(), TriangulationError> {
        self.finalize(erase_super_triangle)
    }

    /// Removes the super-triangle vertices plus all triangles outside the
    /// outermost fixed-edge boundary and inside holes, finalizing the
    /// triangulation.
    ///
    /// # Errors
    ///
    /// [`TriangulationError::Finalized`] if already erased.
    pub fn erase_outer_triangles_and_holes(&mut self) -> Result<(), TriangulationError> {
        self.finalize(erase_outer_triangles_and_holes)
    }

    // -------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------

    /// Runs the full structural audit, reporting the first violated
    /// invariant.
    ///
    /// # Errors
    ///
    /// [`TriangulationError::InconsistentTopology`] naming the violation.
    pub fn check_topology(&self) -> Result<(), TriangulationError> {
        topology::check_topology(&self.tds, self.tolerance)
    }

    /// Whether every structural invariant holds.
    #[must_use]
    pub fn verify_topology(&self) -> bool {
        topology::verify_topology(&self.tds, self.tolerance)
    }

    // -------------------------------------------------------------------
    // Read views
    // -------------------------------------------------------------------

    /// All vertices, ordered by index.
    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        self.tds.vertices()
    }

    /// Restartable iterator over the vertices.
    pub fn vertices_iter(&self) -> impl Iterator<Item = Point2> + '_ {
        self.tds.vertices().iter().copied()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertices_count(&self) -> usize {
        self.tds.vertices().len()
    }

    /// All triangles, ordered by index.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        self.tds.triangles()
    }

    /// Restartable iterator over the triangles.
    pub fn triangles_iter(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.tds.triangles().iter().copied()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangles_count(&self) -> usize {
        self.tds.triangles().len()
    }

    /// The duplicate-free set of fixed edges.
    #[must_use]
    pub fn fixed_edges(&self) -> &FastHashSet<Edge> {
        self.tds.fixed_edges()
    }

    /// Restartable iterator over the fixed edges.
    pub fn fixed_edges_iter(&self) -> impl Iterator<Item = Edge> + '_ {
        self.tds.fixed_edges().iter().copied()
    }

    /// Number of fixed edges.
    #[must_use]
    pub fn fixed_edges_count(&self) -> usize {
        self.tds.fixed_edges().len()
    }

    /// Incident-triangle lists, ordered by vertex index.
    #[must_use]
    pub fn vertices_triangles(&self) -> &[VertexTriangles] {
        self.tds.vertices_triangles()
    }

    /// Restartable iterator over the incident-triangle lists.
    pub fn vertices_triangles_iter(&self) -> impl Iterator<Item = &VertexTriangles> + '_ {
        self.tds.vertices_triangles().iter()
    }

    /// Number of incident-triangle lists (equals the vertex count).
    #[must_use]
    pub fn vertices_triangles_count(&self) -> usize {
        self.tds.vertices_triangles().len()
    }

    /// How many requested edges collapsed onto each fixed edge.
    #[must_use]
    pub fn overlap_count(&self) -> &FastHashMap<Edge, u32> {
        self.tds.overlap_count()
    }

    /// Restartable iterator over the overlap counts.
    pub fn overlap_count_iter(&self) -> impl Iterator<Item = (Edge, u32)> + '_ {
        self.tds.overlap_count().iter().map(|(&e, &c)| (e, c))
    }

    /// Number of overlap-count entries.
    #[must_use]
    pub fn overlap_count_count(&self) -> usize {
        self.tds.overlap_count().len()
    }

    /// Provenance of split fixed-edge pieces.
    #[must_use]
    pub fn piece_to_originals(&self) -> &FastHashMap<Edge, OriginalEdges> {
        self.tds.piece_to_originals()
    }

    /// Restartable iterator over the piece provenance entries.
    pub fn piece_to_originals_iter(&self) -> impl Iterator<Item = (Edge, &OriginalEdges)> + '_ {
        self.tds.piece_to_originals().iter().map(|(&e, o)| (e, o))
    }

    /// Number of piece provenance entries.
    #[must_use]
    pub fn piece_to_originals_count(&self) -> usize {
        self.tds.piece_to_originals().len()
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn finalize(
        &mut self,
        erase: fn(&mut Tds) -> Result<CompactionRemap, TriangulationError>,
    ) -> Result<(), TriangulationError> {
        if self.finalized {
            return Err(TriangulationError::Finalized);
        }
        if !self.tds.vertices().is_empty() {
            let remap = erase(&mut self.tds)?;
            for v in &mut self.caller_map {
                *v = remap.vertex_map[*v as usize];
            }
        }
        self.finalized = true;
        Ok(())
    }

    /// Pre-validates a caller edge batch and maps it to internal indexing.
    fn validate_edges(&mut self, edges: &[Edge]) -> Result<Vec<Edge>, TriangulationError> {
        if self.finalized {
            return Err(TriangulationError::Finalized);
        }
        let vertex_count = self.caller_map.len() as u32;
        let mut internal = Vec::with_capacity(edges.len());
        for &e in edges {
            let (a, b) = e.endpoints();
            if a == b || b >= vertex_count {
                return Err(TriangulationError::InvalidEdge {
                    edge: e,
                    vertex_count,
                });
            }
            let ia = self.caller_map[a as usize];
            let ib = self.caller_map[b as usize];
            if ia == ib {
                return Err(TriangulationError::DegenerateInput {
                    message: format!(
                        "edge ({a}, {b}) is zero-length: its endpoints merged into one vertex"
                    ),
                });
            }
            internal.push(Edge::new(ia, ib));
        }
        Ok(internal)
    }

    fn reject_exact_duplicates(&self, points: &[Point2]) -> Result<(), TriangulationError> {
        // Normalize -0.0 so it collides with 0.0.
        let key = |p: Point2| {
            let n = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
            (n(p.x), n(p.y))
        };
        let mut seen: FastHashSet<(u64, u64)> = self
            .tds
            .vertices()
            .iter()
            .skip(if self.tds.vertices().is_empty() {
                0
            } else {
                SUPER_VERTEX_COUNT as usize
            })
            .map(|&p| key(p))
            .collect();
        for &p in points {
            if !seen.insert(key(p)) {
                return Err(TriangulationError::DegenerateInput {
                    message: format!("duplicate point ({}, {})", p.x, p.y),
                });
            }
        }
        Ok(())
    }

    fn add_super_triangle(&mut self, points: &[Point2]) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        let extent = (max_x - min_x).max(max_y - min_y).max(1.0);
        let r = extent * SUPER_GEOMETRY_SCALE;
        let sqrt3 = 3.0f64.sqrt();

        debug!(cx, cy, r, "creating super triangle");
        // Equilateral, counter-clockwise: apex up, base below the box.
        self.tds.add_vertex(Point2::new(cx, cy + 2.0 * r));
        self.tds.add_vertex(Point2::new(cx - sqrt3 * r, cy - r));
        self.tds.add_vertex(Point2::new(cx + sqrt3 * r, cy - r));
        self.tds.add_triangle(Triangle::new(
            [0, 1, 2],
            [
                crate::core::triangle::NO_NEIGHBOR,
                crate::core::triangle::NO_NEIGHBOR,
                crate::core::triangle::NO_NEIGHBOR,
            ],
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> [Point2; 4] {
        [
            Point2::new(-1.0, 0.0),
            Point2::new(0.0, 0.5),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, -0.5),
        ]
    }

    #[test]
    fn empty_state_reports_zero_everywhere() {
        let cdt = Triangulation::default();
        assert_eq!(cdt.vertices_count(), 0);
        assert_eq!(cdt.triangles_count(), 0);
        assert_eq!(cdt.fixed_edges_count(), 0);
        assert_eq!(cdt.vertices_triangles_count(), 0);
        assert_eq!(cdt.overlap_count_count(), 0);
        assert_eq!(cdt.piece_to_originals_count(), 0);
        assert!(!cdt.is_finalized());
        assert!(cdt.verify_topology());
    }

    #[test]
    fn diamond_counts_with_super_triangle() {
        let mut cdt = Triangulation::default();
        cdt.insert_vertices(&diamond()).unwrap();
        assert_eq!(cdt.vertices_count(), 7);
        assert_eq!(cdt.triangles_count(), 9);
        assert!(cdt.verify_topology());
    }

    #[test]
    fn caller_indices_shift_past_super_vertices() {
        let mut cdt = Triangulation::default();
        cdt.insert_vertices(&diamond()).unwrap();
        cdt.insert_edges(&[Edge::new(0, 2)]).unwrap();
        // Caller edge (0, 2) is internal edge (3, 5) while the super
        // triangle is alive.
        assert!(cdt.fixed_edges().contains(&Edge::new(3, 5)));
        cdt.erase_super_triangle().unwrap();
        assert_eq!(cdt.vertices_count(), 4);
        assert_eq!(cdt.triangles_count(), 2);
        assert!(cdt.fixed_edges().contains(&Edge::new(0, 2)));
        assert!(cdt.verify_topology());
    }

    #[test]
    fn mutation_after_erase_is_rejected() {
        let mut cdt = Triangulation::default();
        cdt.insert_vertices(&diamond()).unwrap();
        cdt.erase_super_triangle().unwrap();
        assert!(cdt.is_finalized());
        assert_eq!(
            cdt.insert_vertices(&[Point2::new(5.0, 5.0)]),
            Err(TriangulationError::Finalized)
        );
        assert!(matches!(
            cdt.insert_edges(&[Edge::new(0, 1)]),
            Err(TriangulationError::Finalized)
        ));
        assert_eq!(cdt.erase_super_triangle(), Err(TriangulationError::Finalized));
    }

    #[test]
    fn exact_duplicate_is_rejected_before_mutation() {
        let mut cdt = Triangulation::default();
        cdt.insert_vertices(&diamond()).unwrap();
        let before = cdt.vertices_count();
        let result = cdt.insert_vertices(&[Point2::new(2.0, 2.0), Point2::new(-1.0, 0.0)]);
        assert!(matches!(
            result,
            Err(TriangulationError::DegenerateInput { .. })
        ));
        // The batch was rejected wholesale.
        assert_eq!(cdt.vertices_count(), before);
    }

    #[test]
    fn near_duplicates_merge_under_tolerance() {
        let mut cdt = Triangulation::new(
            VertexInsertionOrder::AsProvided,
            IntersectingConstraintEdges::Ignore,
            1e-6,
        );
        cdt.insert_vertices(&diamond()).unwrap();
        cdt.insert_vertices(&[Point2::new(-1.0 + 1e-9, 0.0)]).unwrap();
        // Caller vertex 4 aliases caller vertex 0.
        assert_eq!(cdt.vertices_count(), 7);
        let err = cdt.insert_edges(&[Edge::new(0, 4)]).unwrap_err();
        assert!(matches!(err, TriangulationError::DegenerateInput { .. }));
        // An edge from the alias resolves to the canonical vertex.
        cdt.insert_edges(&[Edge::new(4, 2)]).unwrap();
        assert!(cdt.fixed_edges().contains(&Edge::new(3, 5)));
    }

    #[test]
    fn invalid_edges_reject_whole_batch() {
        let mut cdt = Triangulation::default();
        cdt.insert_vertices(&diamond()).unwrap();
        let err = cdt
            .insert_edges(&[Edge::new(0, 1), Edge::new(2, 9)])
            .unwrap_err();
        assert!(matches!(err, TriangulationError::InvalidEdge { .. }));
        assert_eq!(cdt.fixed_edges_count(), 0);

        let err = cdt.insert_edges(&[Edge::new(1, 1)]).unwrap_err();
        assert!(matches!(err, TriangulationError::InvalidEdge { .. }));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let mut cdt = Triangulation::default();
        let result = cdt.insert_vertices(&[Point2::new(f64::NAN, 0.0)]);
        assert!(matches!(
            result,
            Err(TriangulationError::DegenerateInput { .. })
        ));
        assert_eq!(cdt.vertices_count(), 0);
    }

    #[test]
    fn erase_on_empty_instance_just_finalizes() {
        let mut cdt = Triangulation::default();
        cdt.erase_super_triangle().unwrap();
        assert!(cdt.is_finalized());
        assert_eq!(cdt.vertices_count(), 0);
    }

    #[test]
    fn lazy_views_match_materialized_views() {
        let mut cdt = Triangulation::default();
        cdt.insert_vertices(&diamond()).unwrap();
        cdt.insert_edges(&[Edge::new(0, 2)]).unwrap();

        let eager: Vec<Point2> = cdt.vertices().to_vec();
        let lazy: Vec<Point2> = cdt.vertices_iter().collect();
        assert_eq!(eager, lazy);
        // Restartable: a second pass yields the same sequence.
        assert_eq!(cdt.vertices_iter().count(), cdt.vertices_count());

        let eager: Vec<Triangle> = cdt.triangles().to_vec();
        let lazy: Vec<Triangle> = cdt.triangles_iter().collect();
        assert_eq!(eager, lazy);

        let lazy: FastHashSet<Edge> = cdt.fixed_edges_iter().collect();
        assert_eq!(&lazy, cdt.fixed_edges());
        assert_eq!(cdt.overlap_count_iter().count(), cdt.overlap_count_count());
        assert_eq!(
            cdt.vertices_triangles_iter().count(),
            cdt.vertices_triangles_count()
        );
    }
}
