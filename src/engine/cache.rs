//! Memoization state for [`MeshQueryEngine`](super::MeshQueryEngine).
//!
//! Each derived quantity lives in its own [`CacheSlot`]. Slots are filled on
//! first access and emptied together by [`QueryCache::clear`]. Hit/miss
//! counters survive a clear so callers can observe recomputation.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use serde::Serialize;

use crate::error::MeshResult;
use crate::geom::{Point3, SparseMatrix, UvPoint, UvTriangulation, Vec3};
use crate::provider::{FaceTriangles, Space};

/// A lazily computed value.
#[derive(Debug, Clone)]
pub struct CacheSlot<T>(Option<T>);

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> CacheSlot<T> {
    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.0.is_some()
    }

    /// Stores `value`, replacing whatever was cached.
    pub fn set(&mut self, value: T) {
        self.0 = Some(value);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Returns the cached value, running `init` first if the slot is empty.
    /// A failed `init` leaves the slot empty.
    pub fn get_or_try_init(
        &mut self,
        counter: &mut EntryCounter,
        init: impl FnOnce() -> MeshResult<T>,
    ) -> MeshResult<&T> {
        let value = match self.0.take() {
            Some(value) => {
                counter.hits += 1;
                value
            }
            None => {
                counter.misses += 1;
                init()?
            }
        };
        Ok(self.0.insert(value))
    }
}

/// Keyed variant of [`CacheSlot::get_or_try_init`] for per-UV-set data.
pub(crate) fn keyed_get_or_try_init<'a, K, T>(
    map: &'a mut HashMap<K, T>,
    key: K,
    counter: &mut EntryCounter,
    init: impl FnOnce() -> MeshResult<T>,
) -> MeshResult<&'a T>
where
    K: std::hash::Hash + Eq,
{
    match map.entry(key) {
        Entry::Occupied(entry) => {
            counter.hits += 1;
            Ok(entry.into_mut())
        }
        Entry::Vacant(entry) => {
            counter.misses += 1;
            Ok(entry.insert(init()?))
        }
    }
}

/// Names of the memoized quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEntry {
    Points,
    Triangles,
    TriangleVerts,
    TrianglePoints,
    TriangleCenters,
    TriangleEdgeVectors,
    TriangleNormals,
    TriangleEdgeNormals,
    EdgeVertList,
    VertConnectivity,
    EdgeConnectivity,
    EdgeAdjacency,
    VertUvs,
    UvTriangulation,
}

impl CacheEntry {
    pub const ALL: [Self; 14] = [
        Self::Points,
        Self::Triangles,
        Self::TriangleVerts,
        Self::TrianglePoints,
        Self::TriangleCenters,
        Self::TriangleEdgeVectors,
        Self::TriangleNormals,
        Self::TriangleEdgeNormals,
        Self::EdgeVertList,
        Self::VertConnectivity,
        Self::EdgeConnectivity,
        Self::EdgeAdjacency,
        Self::VertUvs,
        Self::UvTriangulation,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Triangles => "triangles",
            Self::TriangleVerts => "triangle_verts",
            Self::TrianglePoints => "triangle_points",
            Self::TriangleCenters => "triangle_centers",
            Self::TriangleEdgeVectors => "triangle_edge_vectors",
            Self::TriangleNormals => "triangle_normals",
            Self::TriangleEdgeNormals => "triangle_edge_normals",
            Self::EdgeVertList => "edge_vert_list",
            Self::VertConnectivity => "vert_connectivity_matrix",
            Self::EdgeConnectivity => "edge_connectivity_matrix",
            Self::EdgeAdjacency => "edge_adjacency_matrix",
            Self::VertUvs => "vert_uvs",
            Self::UvTriangulation => "uv_triangulation",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntryCounter {
    pub hits: usize,
    pub misses: usize,
}

/// One counter per [`CacheEntry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct CacheCounters([EntryCounter; CacheEntry::ALL.len()]);

impl CacheCounters {
    pub fn entry(&mut self, entry: CacheEntry) -> &mut EntryCounter {
        &mut self.0[entry.index()]
    }
}

/// Snapshot of cache occupancy and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCacheStats {
    /// Number of slots (plus keyed entries) currently holding a value.
    pub computed_entries: usize,
    counters: CacheCounters,
}

impl QueryCacheStats {
    #[must_use]
    pub const fn hits(&self, entry: CacheEntry) -> usize {
        self.counters.0[entry.index()].hits
    }

    /// How many times `entry` was computed.
    #[must_use]
    pub const fn misses(&self, entry: CacheEntry) -> usize {
        self.counters.0[entry.index()].misses
    }

    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.counters.0.iter().map(|c| c.hits).sum()
    }

    #[must_use]
    pub fn total_misses(&self) -> usize {
        self.counters.0.iter().map(|c| c.misses).sum()
    }

    /// Returns 0.0 if nothing has been accessed yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_hits() + self.total_misses();
        if total == 0 {
            0.0
        } else {
            self.total_hits() as f64 / total as f64
        }
    }
}

/// Key for per-UV-set entries; `None` is the provider's current set.
pub(crate) type UvSetKey = Option<String>;

#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    pub points: CacheSlot<(Space, Vec<Point3>)>,
    pub triangles: CacheSlot<FaceTriangles>,
    pub triangle_verts: CacheSlot<Vec<[usize; 3]>>,
    pub triangle_points: CacheSlot<Vec<[Point3; 3]>>,
    pub triangle_centers: CacheSlot<Vec<Point3>>,
    pub triangle_edge_vectors: CacheSlot<Vec<[Vec3; 3]>>,
    pub triangle_normals: CacheSlot<Vec<Vec3>>,
    pub triangle_edge_normals: CacheSlot<Vec<[Vec3; 3]>>,
    pub edge_vert_list: CacheSlot<Vec<[usize; 2]>>,
    pub vert_connectivity: CacheSlot<SparseMatrix>,
    pub edge_connectivity: CacheSlot<SparseMatrix>,
    pub edge_adjacency: CacheSlot<SparseMatrix>,
    pub vert_uvs: HashMap<UvSetKey, Vec<UvPoint>>,
    pub uv_triangulations: HashMap<UvSetKey, UvTriangulation>,
    pub counters: CacheCounters,
}

impl QueryCache {
    /// Drops every cached value. Counters are kept.
    pub fn clear(&mut self) {
        self.points.clear();
        self.triangles.clear();
        self.triangle_verts.clear();
        self.clear_position_derived();
        self.edge_vert_list.clear();
        self.vert_connectivity.clear();
        self.edge_connectivity.clear();
        self.edge_adjacency.clear();
        self.vert_uvs.clear();
        self.uv_triangulations.clear();
    }

    /// Drops the values computed from cached positions.
    pub fn clear_position_derived(&mut self) {
        self.triangle_points.clear();
        self.triangle_centers.clear();
        self.triangle_edge_vectors.clear();
        self.triangle_normals.clear();
        self.triangle_edge_normals.clear();
    }

    pub fn reset_counters(&mut self) {
        self.counters = CacheCounters::default();
    }

    pub fn stats(&self) -> QueryCacheStats {
        let slots = [
            self.points.is_computed(),
            self.triangles.is_computed(),
            self.triangle_verts.is_computed(),
            self.triangle_points.is_computed(),
            self.triangle_centers.is_computed(),
            self.triangle_edge_vectors.is_computed(),
            self.triangle_normals.is_computed(),
            self.triangle_edge_normals.is_computed(),
            self.edge_vert_list.is_computed(),
            self.vert_connectivity.is_computed(),
            self.edge_connectivity.is_computed(),
            self.edge_adjacency.is_computed(),
        ];
        let computed_entries = slots.iter().filter(|&&computed| computed).count()
            + self.vert_uvs.len()
            + self.uv_triangulations.len();
        QueryCacheStats {
            computed_entries,
            counters: self.counters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshQueryError;

    #[test]
    fn slot_computes_once_and_counts() {
        let mut slot = CacheSlot::default();
        let mut counter = EntryCounter::default();
        let mut runs = 0;

        for _ in 0..3 {
            let value = slot
                .get_or_try_init(&mut counter, || {
                    runs += 1;
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(runs, 1);
        assert_eq!(counter, EntryCounter { hits: 2, misses: 1 });

        slot.clear();
        assert!(slot.get().is_none());
    }

    #[test]
    fn failed_init_leaves_slot_empty() {
        let mut slot: CacheSlot<u8> = CacheSlot::default();
        let mut counter = EntryCounter::default();
        assert_eq!(
            slot.get_or_try_init(&mut counter, || Err(MeshQueryError::EmptyMesh)),
            Err(MeshQueryError::EmptyMesh)
        );
        assert!(!slot.is_computed());
    }

    #[test]
    fn clear_keeps_counters() {
        let mut cache = QueryCache::default();
        cache.counters.entry(CacheEntry::Triangles).misses += 1;
        cache.triangles.set(FaceTriangles::default());
        assert_eq!(cache.stats().computed_entries, 1);

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.computed_entries, 0);
        assert_eq!(stats.misses(CacheEntry::Triangles), 1);

        cache.reset_counters();
        assert_eq!(cache.stats().total_misses(), 0);
    }

    #[test]
    fn keyed_entries_are_independent() {
        let mut map = HashMap::new();
        let mut counter = EntryCounter::default();
        keyed_get_or_try_init(&mut map, Some("a".to_owned()), &mut counter, || Ok(1)).unwrap();
        keyed_get_or_try_init(&mut map, None, &mut counter, || Ok(2)).unwrap();
        let again =
            keyed_get_or_try_init(&mut map, Some("a".to_owned()), &mut counter, || Ok(3)).unwrap();
        assert_eq!(*again, 1);
        assert_eq!(counter, EntryCounter { hits: 1, misses: 2 });
    }
}
