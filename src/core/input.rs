//! Adaptation of packed caller input into core types.
//!
//! Callers frequently hold geometry as flat interleaved buffers
//! (`[x0, y0, x1, y1, ..]`) or pair arrays. These helpers normalize such
//! buffers into [`Point2`] and [`Edge`] values, validating shape and
//! finiteness at the boundary so the core only ever sees well-formed input.

use crate::core::edge::Edge;
use crate::core::error::TriangulationError;
use crate::core::triangle::VertInd;
use crate::geometry::point::Point2;

/// Converts a flat interleaved coordinate buffer `[x0, y0, x1, y1, ..]` into
/// points.
///
/// # Errors
///
/// [`TriangulationError::DegenerateInput`] for an odd-length buffer or
/// non-finite coordinates.
pub fn points_from_flat(coords: &[f64]) -> Result<Vec<Point2>, TriangulationError> {
    if coords.len() % 2 != 0 {
        return Err(TriangulationError::DegenerateInput {
            message: format!(
                "interleaved coordinate buffer has odd length {}",
                coords.len()
            ),
        });
    }
    coords
        .chunks_exact(2)
        .map(|xy| {
            Point2::try_new(xy[0], xy[1]).ok_or_else(|| TriangulationError::DegenerateInput {
                message: format!("non-finite coordinates ({}, {})", xy[0], xy[1]),
            })
        })
        .collect()
}

/// Converts an array of `[x, y]` pairs into points.
///
/// # Errors
///
/// [`TriangulationError::DegenerateInput`] for non-finite coordinates.
pub fn points_from_pairs(pairs: &[[f64; 2]]) -> Result<Vec<Point2>, TriangulationError> {
    pairs
        .iter()
        .map(|&[x, y]| {
            Point2::try_new(x, y).ok_or_else(|| TriangulationError::DegenerateInput {
                message: format!("non-finite coordinates ({x}, {y})"),
            })
        })
        .collect()
}

/// Converts a flat index buffer `[a0, b0, a1, b1, ..]` into canonical edges.
///
/// # Errors
///
/// [`TriangulationError::DegenerateInput`] for an odd-length buffer.
pub fn edges_from_flat(indices: &[VertInd]) -> Result<Vec<Edge>, TriangulationError> {
    if indices.len() % 2 != 0 {
        return Err(TriangulationError::DegenerateInput {
            message: format!("edge index buffer has odd length {}", indices.len()),
        });
    }
    Ok(indices
        .chunks_exact(2)
        .map(|ab| Edge::new(ab[0], ab[1]))
        .collect())
}

/// Converts an array of `[a, b]` index pairs into canonical edges.
#[must_use]
pub fn edges_from_pairs(pairs: &[[VertInd; 2]]) -> Vec<Edge> {
    pairs.iter().map(|&[a, b]| Edge::new(a, b)).collect()
}
