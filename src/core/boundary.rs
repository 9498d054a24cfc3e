//! Erasure of the bounding super-triangle, outer triangles, and holes.
//!
//! Both erasers classify triangles for removal and then delete them in one
//! compacting [`Tds::remove_triangles`] pass, so surviving indices are
//! renumbered exactly once.
//!
//! Hole detection works on crossing depth: a breadth-first traversal of the
//! triangle adjacency graph, seeded at the triangles incident to the
//! super-triangle vertices, where stepping across a fixed edge increases the
//! depth by one and any other step is free. Triangles at even depth are
//! outside the triangulated domain (outside the outermost boundary, or inside
//! a hole nested an even number of boundaries deep) and are erased together
//! with the super-triangle vertices.

use std::collections::VecDeque;

use tracing::debug;

use crate::core::collections::{FastHashSet, FastHashMap};
use crate::core::edge::Edge;
use crate::core::error::TriangulationError;
use crate::core::triangle::{TriInd, VertInd, NO_NEIGHBOR};
use crate::core::triangulation_data_structure::{CompactionRemap, Tds};

/// Number of synthetic super-triangle vertices, always indices `0..3`.
pub const SUPER_VERTEX_COUNT: u32 = 3;

/// Removes the three super-triangle vertices and every triangle incident to
/// them, keeping all triangles spanned by actual input vertices.
///
/// # Errors
///
/// Returns [`TriangulationError::InconsistentTopology`] if the mesh has no
/// super-triangle vertices to erase.
pub fn erase_super_triangle(tds: &mut Tds) -> Result<CompactionRemap, TriangulationError> {
    let removed_triangles = super_incident_triangles(tds)?;
    let removed_vertices: FastHashSet<VertInd> = (0..SUPER_VERTEX_COUNT).collect();
    debug!(
        triangles = removed_triangles.len(),
        "erasing super triangle"
    );
    Ok(tds.remove_triangles(&removed_triangles, &removed_vertices))
}

/// Removes the super-triangle vertices plus every triangle at even crossing
/// depth: the region outside the outermost fixed-edge boundary and the
/// interiors of holes.
///
/// # Errors
///
/// Returns [`TriangulationError::InconsistentTopology`] if the mesh is empty
/// or its adjacency graph is not connected.
pub fn erase_outer_triangles_and_holes(
    tds: &mut Tds,
) -> Result<CompactionRemap, TriangulationError> {
    let depths = crossing_depths(tds)?;
    let removed_triangles: FastHashSet<TriInd> = depths
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d % 2 == 0)
        .map(|(t, _)| t as TriInd)
        .collect();
    let removed_vertices: FastHashSet<VertInd> = (0..SUPER_VERTEX_COUNT).collect();
    debug!(
        triangles = removed_triangles.len(),
        max_depth = depths.iter().max().copied().unwrap_or(0),
        "erasing outer triangles and holes"
    );
    Ok(tds.remove_triangles(&removed_triangles, &removed_vertices))
}

fn super_incident_triangles(tds: &Tds) -> Result<FastHashSet<TriInd>, TriangulationError> {
    if (tds.vertices().len() as u32) < SUPER_VERTEX_COUNT {
        return Err(TriangulationError::InconsistentTopology {
            message: "no super triangle to erase".to_string(),
        });
    }
    let mut removed = FastHashSet::default();
    for v in 0..SUPER_VERTEX_COUNT {
        removed.extend(tds.vertices_triangles()[v as usize].iter().copied());
    }
    Ok(removed)
}

/// Minimal number of fixed-edge crossings from the mesh exterior to each
/// triangle, via 0-1 breadth-first search.
fn crossing_depths(tds: &Tds) -> Result<Vec<u32>, TriangulationError> {
    let n = tds.triangles().len();
    let seeds = super_incident_triangles(tds)?;
    let mut depth: FastHashMap<TriInd, u32> = FastHashMap::default();
    let mut deque: VecDeque<TriInd> = VecDeque::new();
    for &t in &seeds {
        depth.insert(t, 0);
        deque.push_back(t);
    }

    while let Some(t) = deque.pop_front() {
        let d = depth[&t];
        let tri = *tds.triangle(t);
        for (i, &neighbor) in tri.neighbors.iter().enumerate() {
            if neighbor == NO_NEIGHBOR {
                continue;
            }
            let (a, b) = tri.edge_opposite(i);
            let cost = u32::from(tds.is_fixed(Edge::new(a, b)));
            let candidate = d + cost;
            if depth.get(&neighbor).map_or(true, |&existing| candidate < existing) {
                depth.insert(neighbor, candidate);
                if cost == 0 {
                    deque.push_front(neighbor);
                } else {
                    deque.push_back(neighbor);
                }
            }
        }
    }

    (0..n as TriInd)
        .map(|t| {
            depth
                .get(&t)
                .copied()
                .ok_or_else(|| TriangulationError::InconsistentTopology {
                    message: format!("triangle {t} is unreachable from the mesh boundary"),
                })
        })
        .collect()
}
