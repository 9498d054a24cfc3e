//! Index-addressed mesh store for the constrained triangulation.
//!
//! The [`Tds`] owns every collection that makes up the mesh: the append-only
//! vertex and triangle arenas, the per-vertex incident-triangle lists, the
//! fixed-edge set and its overlap/provenance bookkeeping. Insertion and
//! constraint algorithms mutate the mesh exclusively through the primitives
//! here, and the single compacting [`Tds::remove_triangles`] pass is the only
//! operation that ever deletes or renumbers anything.
//!
//! Indices are plain `u32` positions into the arenas; `u32::MAX` is the shared
//! sentinel for "no neighbor" / "no vertex". Invalidated triangles are never
//! left as in-place gaps: removal always compacts and rewrites every dependent
//! collection under one old-to-new remap.

use tracing::debug;

use crate::core::collections::{FastHashMap, FastHashSet, OriginalEdges, SmallBuffer, VertexTriangles};
use crate::core::edge::Edge;
use crate::core::error::TriangulationError;
use crate::core::triangle::{ccw, cw, TriInd, Triangle, VertInd, NO_NEIGHBOR, NO_VERTEX};
use crate::geometry::point::Point2;

/// Outcome of a compacting removal: old-to-new index maps for surviving
/// vertices and triangles.
///
/// Entries for removed elements hold the sentinel (`NO_VERTEX` /
/// `NO_NEIGHBOR`).
#[derive(Debug, Clone)]
pub struct CompactionRemap {
    /// `vertex_map[old] == new`, or `NO_VERTEX` if removed.
    pub vertex_map: Vec<VertInd>,
    /// `triangle_map[old] == new`, or `NO_NEIGHBOR` if removed.
    pub triangle_map: Vec<TriInd>,
}

/// The mesh store: vertices, triangles, adjacency, and constraint bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct Tds {
    vertices: Vec<Point2>,
    triangles: Vec<Triangle>,
    vertices_triangles: Vec<VertexTriangles>,
    fixed_edges: FastHashSet<Edge>,
    overlap_count: FastHashMap<Edge, u32>,
    piece_to_originals: FastHashMap<Edge, OriginalEdges>,
}

impl Tds {
    /// Creates an empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------

    /// All vertices, ordered by index.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    /// All triangles, ordered by index.
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Incident-triangle lists, ordered by vertex index.
    #[inline]
    #[must_use]
    pub fn vertices_triangles(&self) -> &[VertexTriangles] {
        &self.vertices_triangles
    }

    /// The duplicate-free set of fixed (constraint) edges.
    #[inline]
    #[must_use]
    pub fn fixed_edges(&self) -> &FastHashSet<Edge> {
        &self.fixed_edges
    }

    /// Number of originally-requested edges collapsed onto each fixed edge.
    #[inline]
    #[must_use]
    pub fn overlap_count(&self) -> &FastHashMap<Edge, u32> {
        &self.overlap_count
    }

    /// Provenance of split fixed-edge pieces: piece edge to the original
    /// requested edges it derives from.
    #[inline]
    #[must_use]
    pub fn piece_to_originals(&self) -> &FastHashMap<Edge, OriginalEdges> {
        &self.piece_to_originals
    }

    /// Coordinates of vertex `v`.
    #[inline]
    #[must_use]
    pub fn vertex(&self, v: VertInd) -> Point2 {
        self.vertices[v as usize]
    }

    /// Triangle record `t`.
    #[inline]
    #[must_use]
    pub fn triangle(&self, t: TriInd) -> &Triangle {
        &self.triangles[t as usize]
    }

    /// Mutable triangle record `t`.
    #[inline]
    pub fn triangle_mut(&mut self, t: TriInd) -> &mut Triangle {
        &mut self.triangles[t as usize]
    }

    /// Index of the most recently created triangle, used to seed point
    /// location walks.
    #[inline]
    #[must_use]
    pub fn last_triangle(&self) -> TriInd {
        debug_assert!(!self.triangles.is_empty());
        (self.triangles.len() - 1) as TriInd
    }

    /// Whether `(a, b)` is currently realized as a mesh edge.
    #[must_use]
    pub fn edge_exists(&self, a: VertInd, b: VertInd) -> bool {
        self.vertices_triangles[a as usize]
            .iter()
            .any(|&t| self.triangle(t).contains_vertex(b))
    }

    /// The one or two triangles sharing the mesh edge `(a, b)`.
    #[must_use]
    pub fn triangles_of_edge(&self, a: VertInd, b: VertInd) -> SmallBuffer<TriInd, 2> {
        self.vertices_triangles[a as usize]
            .iter()
            .copied()
            .filter(|&t| self.triangle(t).contains_vertex(b))
            .collect()
    }

    /// The vertex of triangle `t` opposed to its neighbor `neighbor`, if the
    /// two are adjacent.
    #[must_use]
    pub fn opposed_vertex(&self, t: TriInd, neighbor: TriInd) -> Option<VertInd> {
        let tri = self.triangle(t);
        tri.neighbor_index(neighbor).map(|i| tri.vertices[i])
    }

    // -------------------------------------------------------------------
    // Append and rewiring primitives
    // -------------------------------------------------------------------

    /// Appends a vertex with an empty incidence list; returns its index.
    pub fn add_vertex(&mut self, p: Point2) -> VertInd {
        let ind = self.vertices.len() as VertInd;
        self.vertices.push(p);
        self.vertices_triangles.push(VertexTriangles::new());
        ind
    }

    /// Appends a triangle and registers it with its three vertices; returns
    /// its index. Neighbor back-pointers are the caller's responsibility.
    pub fn add_triangle(&mut self, tri: Triangle) -> TriInd {
        let ind = self.triangles.len() as TriInd;
        for &v in &tri.vertices {
            self.vertices_triangles[v as usize].push(ind);
        }
        self.triangles.push(tri);
        ind
    }

    /// Overwrites triangle `t`, keeping the incidence lists of all affected
    /// vertices in sync.
    pub fn replace_triangle(&mut self, t: TriInd, tri: Triangle) {
        let old = self.triangles[t as usize];
        for &v in &old.vertices {
            if !tri.contains_vertex(v) {
                self.remove_incident(v, t);
            }
        }
        for &v in &tri.vertices {
            if !old.contains_vertex(v) {
                self.vertices_triangles[v as usize].push(t);
            }
        }
        self.triangles[t as usize] = tri;
    }

    /// In triangle `t` (ignored if the sentinel), replaces neighbor `old`
    /// with `new`.
    pub fn change_neighbor(&mut self, t: TriInd, old: TriInd, new: TriInd) {
        if t != NO_NEIGHBOR {
            self.triangles[t as usize].change_neighbor(old, new);
        }
    }

    fn remove_incident(&mut self, v: VertInd, t: TriInd) {
        let list = &mut self.vertices_triangles[v as usize];
        if let Some(pos) = list.iter().position(|&x| x == t) {
            list.swap_remove(pos);
        }
    }

    // -------------------------------------------------------------------
    // Edge flip
    // -------------------------------------------------------------------

    /// Flips the edge shared by triangles `t1` and `t2`, replacing it with
    /// the opposite diagonal of their quadrilateral.
    ///
    /// Returns the endpoints of the new diagonal. Neighbor pointers of all
    /// four surrounding triangles and the incidence lists of all four corner
    /// vertices are rewired.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::InconsistentTopology`] if `t1` and `t2`
    /// are not mutually adjacent.
    pub fn flip_edge(
        &mut self,
        t1: TriInd,
        t2: TriInd,
    ) -> Result<(VertInd, VertInd), TriangulationError> {
        let i1 = self.triangle(t1).neighbor_index(t2).ok_or_else(|| {
            TriangulationError::InconsistentTopology {
                message: format!("flip: triangles {t1} and {t2} are not adjacent"),
            }
        })?;
        let i2 = self.triangle(t2).neighbor_index(t1).ok_or_else(|| {
            TriangulationError::InconsistentTopology {
                message: format!("flip: neighbor pointer {t2} -> {t1} missing"),
            }
        })?;

        let tri1 = *self.triangle(t1);
        let tri2 = *self.triangle(t2);
        // Shared edge (a, b), with c opposed in t1 and d opposed in t2.
        let c = tri1.vertices[i1];
        let a = tri1.vertices[ccw(i1)];
        let b = tri1.vertices[cw(i1)];
        let d = tri2.vertices[i2];
        if tri2.vertices[ccw(i2)] != b || tri2.vertices[cw(i2)] != a {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("flip: triangles {t1} and {t2} disagree on their shared edge"),
            });
        }

        let n_bc = tri1.neighbors[ccw(i1)];
        let n_ca = tri1.neighbors[cw(i1)];
        let n_ad = tri2.neighbors[ccw(i2)];
        let n_db = tri2.neighbors[cw(i2)];

        self.replace_triangle(t1, Triangle::new([c, a, d], [n_ad, t2, n_ca]));
        self.replace_triangle(t2, Triangle::new([d, b, c], [n_bc, t1, n_db]));
        self.change_neighbor(n_ad, t2, t1);
        self.change_neighbor(n_bc, t1, t2);

        Ok((c, d))
    }

    // -------------------------------------------------------------------
    // Fixed-edge bookkeeping
    // -------------------------------------------------------------------

    /// Whether `edge` is a fixed (constraint) edge.
    #[inline]
    #[must_use]
    pub fn is_fixed(&self, edge: Edge) -> bool {
        self.fixed_edges.contains(&edge)
    }

    /// Marks `edge` as fixed on behalf of the requested edge `original`.
    ///
    /// A newly fixed edge starts with overlap count 1; fixing an edge that is
    /// already fixed increments its count instead (exact duplicates and
    /// overlapping requests collapse onto one entry). When `edge` is a proper
    /// piece of `original`, the provenance map records the derivation.
    pub fn fix_edge(&mut self, edge: Edge, original: Edge) {
        if self.fixed_edges.insert(edge) {
            self.overlap_count.insert(edge, 1);
        } else {
            *self.overlap_count.entry(edge).or_insert(0) += 1;
        }
        if edge != original {
            let originals = self.piece_to_originals.entry(edge).or_default();
            if !originals.contains(&original) {
                originals.push(original);
            }
        }
    }

    /// Splits the fixed edge `edge` at vertex `mid`, replacing it with two
    /// fixed halves that inherit its overlap count and provenance.
    ///
    /// No-op if `edge` is not fixed.
    pub fn split_fixed_edge(&mut self, edge: Edge, mid: VertInd) {
        if !self.fixed_edges.remove(&edge) {
            return;
        }
        let count = self.overlap_count.remove(&edge).unwrap_or(1);
        let originals = self
            .piece_to_originals
            .remove(&edge)
            .unwrap_or_else(|| OriginalEdges::from_elem(edge, 1));

        for half in [Edge::new(edge.v1(), mid), Edge::new(mid, edge.v2())] {
            self.fixed_edges.insert(half);
            self.overlap_count.insert(half, count);
            let entry = self.piece_to_originals.entry(half).or_default();
            for &orig in &originals {
                if !entry.contains(&orig) {
                    entry.push(orig);
                }
            }
        }
        debug!(?edge, mid, "split fixed edge");
    }

    // -------------------------------------------------------------------
    // Compacting removal
    // -------------------------------------------------------------------

    /// Removes the given triangles and vertices in a single compacting pass.
    ///
    /// Survivors receive a new contiguous numbering; triangle neighbor
    /// pointers, vertex incidence lists, fixed edges, overlap counts and
    /// piece provenance are all rewritten under the same old-to-new remap.
    /// Fixed-edge entries referencing a removed vertex are dropped.
    ///
    /// Returns the remap so callers can rewrite their own derived indices.
    pub fn remove_triangles(
        &mut self,
        removed_triangles: &FastHashSet<TriInd>,
        removed_vertices: &FastHashSet<VertInd>,
    ) -> CompactionRemap {
        let mut triangle_map = vec![NO_NEIGHBOR; self.triangles.len()];
        let mut next = 0 as TriInd;
        for (old, slot) in triangle_map.iter_mut().enumerate() {
            if !removed_triangles.contains(&(old as TriInd)) {
                *slot = next;
                next += 1;
            }
        }

        let mut vertex_map = vec![NO_VERTEX; self.vertices.len()];
        let mut next_v = 0 as VertInd;
        for (old, slot) in vertex_map.iter_mut().enumerate() {
            if !removed_vertices.contains(&(old as VertInd)) {
                *slot = next_v;
                next_v += 1;
            }
        }

        debug!(
            removed_triangles = removed_triangles.len(),
            removed_vertices = removed_vertices.len(),
            surviving_triangles = next,
            surviving_vertices = next_v,
            "compacting removal"
        );

        // Triangles: filter, renumber vertices and neighbors.
        let mut new_triangles = Vec::with_capacity(next as usize);
        for (old, tri) in self.triangles.iter().enumerate() {
            if triangle_map[old] == NO_NEIGHBOR {
                continue;
            }
            let vertices = tri.vertices.map(|v| vertex_map[v as usize]);
            let neighbors = tri.neighbors.map(|n| {
                if n == NO_NEIGHBOR {
                    NO_NEIGHBOR
                } else {
                    triangle_map[n as usize]
                }
            });
            new_triangles.push(Triangle::new(vertices, neighbors));
        }
        self.triangles = new_triangles;

        // Vertices and their incidence lists.
        let mut new_vertices = Vec::with_capacity(next_v as usize);
        let mut new_incidence = Vec::with_capacity(next_v as usize);
        for (old, (&p, list)) in self
            .vertices
            .iter()
            .zip(self.vertices_triangles.iter())
            .enumerate()
        {
            if vertex_map[old] == NO_VERTEX {
                continue;
            }
            new_vertices.push(p);
            new_incidence.push(
                list.iter()
                    .map(|&t| triangle_map[t as usize])
                    .filter(|&t| t != NO_NEIGHBOR)
                    .collect::<VertexTriangles>(),
            );
        }
        self.vertices = new_vertices;
        self.vertices_triangles = new_incidence;

        // Constraint bookkeeping under the same remap.
        let remap_edge = |e: Edge| -> Option<Edge> {
            let survives =
                vertex_map[e.v1() as usize] != NO_VERTEX && vertex_map[e.v2() as usize] != NO_VERTEX;
            survives.then(|| e.map_vertices(|v| vertex_map[v as usize]))
        };
        self.fixed_edges = std::mem::take(&mut self.fixed_edges)
            .into_iter()
            .filter_map(|e| remap_edge(e))
            .collect();
        self.overlap_count = std::mem::take(&mut self.overlap_count)
            .into_iter()
            .filter_map(|(e, c)| remap_edge(e).map(|e| (e, c)))
            .collect();
        self.piece_to_originals = std::mem::take(&mut self.piece_to_originals)
            .into_iter()
            .filter_map(|(piece, originals)| {
                let piece = remap_edge(piece)?;
                let originals = originals
                    .into_iter()
                    .filter_map(|e| remap_edge(e))
                    .collect::<OriginalEdges>();
                Some((piece, originals))
            })
            .collect();

        CompactionRemap {
            vertex_map,
            triangle_map,
        }
    }
}
