//! Structural verification of the triangulation.
//!
//! [`check_topology`] is a read-only audit of every invariant the mesh relies
//! on: positive-area CCW triangles, reciprocal neighbor pointers, exact
//! vertex incidence lists, realized fixed edges, and pairwise disjoint
//! triangle interiors. It reports the first violation found; the boolean
//! wrapper [`verify_topology`] is the cheap yes/no form.

use tracing::debug;

use crate::core::collections::FastHashSet;
use crate::core::edge::Edge;
use crate::core::error::TriangulationError;
use crate::core::triangle::{TriInd, VertInd, NO_NEIGHBOR};
use crate::core::triangulation_data_structure::Tds;
use crate::geometry::point::Point2;
use crate::geometry::predicates::{orientation, segments_cross, Orientation};

/// Verifies every structural invariant of the mesh.
///
/// # Errors
///
/// Returns [`TriangulationError::InconsistentTopology`] describing the first
/// violated invariant. The mesh is never modified.
pub fn check_topology(tds: &Tds, eps: f64) -> Result<(), TriangulationError> {
    check_windings(tds, eps)?;
    check_neighbors(tds)?;
    check_incidence(tds)?;
    check_fixed_edges(tds)?;
    check_overlaps(tds, eps)?;
    debug!(
        triangles = tds.triangles().len(),
        vertices = tds.vertices().len(),
        "topology verified"
    );
    Ok(())
}

/// Boolean form of [`check_topology`].
#[must_use]
pub fn verify_topology(tds: &Tds, eps: f64) -> bool {
    check_topology(tds, eps).is_ok()
}

fn check_windings(tds: &Tds, eps: f64) -> Result<(), TriangulationError> {
    for (t, tri) in tds.triangles().iter().enumerate() {
        for &v in &tri.vertices {
            if v as usize >= tds.vertices().len() {
                return Err(TriangulationError::InconsistentTopology {
                    message: format!("triangle {t} references missing vertex {v}"),
                });
            }
        }
        let [p1, p2, p3] = tri.vertices.map(|v| tds.vertex(v));
        if orientation(p1, p2, p3, eps) != Orientation::CounterClockwise {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("triangle {t} is degenerate or wound clockwise"),
            });
        }
    }
    Ok(())
}

fn check_neighbors(tds: &Tds) -> Result<(), TriangulationError> {
    let n = tds.triangles().len() as TriInd;
    for (t, tri) in tds.triangles().iter().enumerate() {
        let t = t as TriInd;
        for (i, &neighbor) in tri.neighbors.iter().enumerate() {
            if neighbor == NO_NEIGHBOR {
                continue;
            }
            if neighbor >= n {
                return Err(TriangulationError::InconsistentTopology {
                    message: format!("triangle {t} references missing neighbor {neighbor}"),
                });
            }
            let back = tds.triangle(neighbor).neighbor_index(t).ok_or_else(|| {
                TriangulationError::InconsistentTopology {
                    message: format!("neighbor pointer {t} -> {neighbor} is not reciprocal"),
                }
            })?;
            // The shared edge must be traversed in opposite directions by
            // the two CCW triangles.
            let (a, b) = tri.edge_opposite(i);
            let (na, nb) = tds.triangle(neighbor).edge_opposite(back);
            if (a, b) != (nb, na) {
                return Err(TriangulationError::InconsistentTopology {
                    message: format!(
                        "triangles {t} and {neighbor} disagree on their shared edge"
                    ),
                });
            }
        }
    }
    Ok(())
}

fn check_incidence(tds: &Tds) -> Result<(), TriangulationError> {
    if tds.vertices_triangles().len() != tds.vertices().len() {
        return Err(TriangulationError::InconsistentTopology {
            message: "incidence table length does not match vertex count".to_string(),
        });
    }
    for (v, list) in tds.vertices_triangles().iter().enumerate() {
        let actual: FastHashSet<TriInd> = list.iter().copied().collect();
        if actual.len() != list.len() {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("incidence list of vertex {v} contains duplicates"),
            });
        }
        let expected: FastHashSet<TriInd> = (0..tds.triangles().len() as TriInd)
            .filter(|&t| tds.triangle(t).contains_vertex(v as VertInd))
            .collect();
        if actual != expected {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("incidence list of vertex {v} is stale"),
            });
        }
    }
    Ok(())
}

fn check_fixed_edges(tds: &Tds) -> Result<(), TriangulationError> {
    for e in tds.fixed_edges() {
        let (a, b) = e.endpoints();
        if a as usize >= tds.vertices().len() || b as usize >= tds.vertices().len() {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("fixed edge ({a}, {b}) references a missing vertex"),
            });
        }
        if !tds.edge_exists(a, b) {
            return Err(TriangulationError::InconsistentTopology {
                message: format!("fixed edge ({a}, {b}) is not realized as a mesh edge"),
            });
        }
    }
    Ok(())
}

/// Pairwise interior-overlap test with a bounding-box prefilter.
fn check_overlaps(tds: &Tds, eps: f64) -> Result<(), TriangulationError> {
    let boxes: Vec<(Point2, Point2)> = tds
        .triangles()
        .iter()
        .map(|tri| {
            let [p1, p2, p3] = tri.vertices.map(|v| tds.vertex(v));
            (
                Point2::new(p1.x.min(p2.x).min(p3.x), p1.y.min(p2.y).min(p3.y)),
                Point2::new(p1.x.max(p2.x).max(p3.x), p1.y.max(p2.y).max(p3.y)),
            )
        })
        .collect();

    for t1 in 0..tds.triangles().len() {
        for t2 in (t1 + 1)..tds.triangles().len() {
            let (min1, max1) = boxes[t1];
            let (min2, max2) = boxes[t2];
            if max1.x < min2.x || max2.x < min1.x || max1.y < min2.y || max2.y < min1.y {
                continue;
            }
            if triangles_overlap(tds, t1 as TriInd, t2 as TriInd, eps) {
                return Err(TriangulationError::InconsistentTopology {
                    message: format!("triangles {t1} and {t2} overlap"),
                });
            }
        }
    }
    Ok(())
}

/// Whether two triangles share interior area.
///
/// Adjacent triangles share an edge and distinct triangles may share
/// vertices; neither counts. Detected are proper edge crossings, a corner of
/// one strictly inside the other, and identical vertex sets.
fn triangles_overlap(tds: &Tds, t1: TriInd, t2: TriInd, eps: f64) -> bool {
    let v1 = tds.triangle(t1).vertices;
    let v2 = tds.triangle(t2).vertices;
    if v2.iter().all(|v| v1.contains(v)) {
        return true;
    }

    let p1 = v1.map(|v| tds.vertex(v));
    let p2 = v2.map(|v| tds.vertex(v));
    for i in 0..3 {
        for j in 0..3 {
            // Skip segment pairs that share a vertex index; they meet at
            // that vertex legitimately.
            let (a1, b1) = (v1[i], v1[(i + 1) % 3]);
            let (a2, b2) = (v2[j], v2[(j + 1) % 3]);
            if a1 == a2 || a1 == b2 || b1 == a2 || b1 == b2 {
                continue;
            }
            if segments_cross(
                p1[i],
                p1[(i + 1) % 3],
                p2[j],
                p2[(j + 1) % 3],
                eps,
            ) {
                return true;
            }
        }
    }

    for (corners, host) in [(p1, p2), (p2, p1)] {
        for &c in &corners {
            if strictly_inside(host, c, eps) {
                return true;
            }
        }
    }
    // Centroids catch containment whose corners all lie on the host's
    // boundary.
    strictly_inside(p2, centroid(p1), eps) || strictly_inside(p1, centroid(p2), eps)
}

fn centroid([a, b, c]: [Point2; 3]) -> Point2 {
    Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
}

fn strictly_inside([a, b, c]: [Point2; 3], p: Point2, eps: f64) -> bool {
    orientation(a, b, p, eps) == Orientation::CounterClockwise
        && orientation(b, c, p, eps) == Orientation::CounterClockwise
        && orientation(c, a, p, eps) == Orientation::CounterClockwise
}
