//! Collection aliases tuned for triangulation workloads.
//!
//! Internal maps and sets are keyed by trusted, internally generated indices,
//! so the non-cryptographic `FxHasher` is used throughout. Small per-vertex
//! and per-operation buffers use `SmallVec` to keep the common case off the
//! heap.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::core::edge::Edge;
use crate::core::triangle::TriInd;

/// Fast `HashMap` for internal index-keyed mappings.
///
/// Not DoS-resistant; keys are internal indices, never attacker-controlled.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast `HashSet` counterpart of [`FastHashMap`].
pub type FastHashSet<T> = FxHashSet<T>;

/// Inline buffer for short index lists (legalization stacks, crossed-edge
/// lists, split fan-outs).
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Incident-triangle list of a single vertex.
///
/// Interior vertices of a Delaunay mesh average six incident triangles, so
/// eight inline slots cover the common case.
pub type VertexTriangles = SmallVec<[TriInd; 8]>;

/// Ordered list of original constraint edges a fixed-edge piece derives from.
pub type OriginalEdges = SmallVec<[Edge; 1]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffers_start_inline() {
        let mut buf: SmallBuffer<u32, 4> = SmallBuffer::new();
        buf.extend([1, 2, 3]);
        assert!(!buf.spilled());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn fast_map_basic_usage() {
        let mut map: FastHashMap<u32, u32> = FastHashMap::default();
        map.insert(7, 42);
        assert_eq!(map.get(&7), Some(&42));
    }
}
