//! Cached, read-only queries over one mesh provider.
//!
//! [`MeshQueryEngine`] owns a [`MeshProvider`] and memoizes everything it
//! derives from it: triangle geometry, connectivity matrices, per-UV-set
//! triangulations. Queries are split across submodules by concern:
//!
//! - `triangles`: per-triangle points, centers, edges and normals
//! - `connectivity`: edge lists, sparse adjacency, one-ring neighbours
//! - `uv_index`: UV bounds, UDIM tiles, UV-space point location
//! - `closest`: nearest point on surface with interpolated UVs
//! - `march`: breadth-first rings from seed vertices
//! - `diagnostics`: topology and degeneracy report
//!
//! Call [`MeshQueryEngine::clear_cache`] whenever the underlying geometry
//! changes.

mod cache;
mod closest;
mod connectivity;
mod diagnostics;
mod march;
mod triangles;
mod uv_index;

#[cfg(test)]
mod tests;

pub use cache::{CacheEntry, CacheSlot, EntryCounter, QueryCacheStats};
pub use closest::PointOnMesh;
pub use diagnostics::MeshDiagnostics;
pub use triangles::NormalWeighting;
pub use uv_index::{UdimTile, UvBounds, UvQueryResult};

use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{
    BBox, Bvh, JoggleOptions, Point3, QueryMetrics, QueryTimingReport, TimingBucket, Tolerance,
};
use crate::provider::{MeshProvider, Space};
use crate::selection::{ComponentKind, SelectMode, SelectionError, SelectionSink, component_paths};

use cache::QueryCache;

/// Numeric knobs for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// Slack for barycentric containment and UDIM tile boundaries.
    pub tolerance: Tolerance,
    /// Perturbation used when a UV set triangulates to nothing.
    pub joggle: JoggleOptions,
    pub bvh_leaf_size: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
            joggle: JoggleOptions::default(),
            bvh_leaf_size: Bvh::DEFAULT_LEAF_SIZE,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_joggle(mut self, joggle: JoggleOptions) -> Self {
        self.joggle = joggle;
        self
    }

    #[must_use]
    pub fn with_bvh_leaf_size(mut self, leaf_size: usize) -> Self {
        self.bvh_leaf_size = leaf_size.max(1);
        self
    }
}

pub struct MeshQueryEngine<P: MeshProvider> {
    provider: P,
    options: QueryOptions,
    cache: QueryCache,
    metrics: QueryMetrics,
}

impl<P: MeshProvider> MeshQueryEngine<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, QueryOptions::default())
    }

    pub fn with_options(provider: P, options: QueryOptions) -> Self {
        Self {
            provider,
            options,
            cache: QueryCache::default(),
            metrics: QueryMetrics::default(),
        }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the provider. Clears the cache, since anything
    /// derived from the old geometry may now be stale.
    pub fn provider_mut(&mut self) -> &mut P {
        self.clear_cache();
        &mut self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    pub const fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Drops every derived value; the next access recomputes.
    pub fn clear_cache(&mut self) {
        log::debug!("clearing query cache for `{}`", self.provider.name());
        self.cache.clear();
    }

    #[must_use]
    pub fn cache_stats(&self) -> QueryCacheStats {
        self.cache.stats()
    }

    pub fn reset_cache_stats(&mut self) {
        self.cache.reset_counters();
    }

    /// Accumulated timings, or `None` without the `query_metrics` feature.
    #[must_use]
    pub fn timing_report(&self) -> Option<QueryTimingReport> {
        self.metrics.report()
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Fetches positions from the provider and caches them, replacing any
    /// previously cached positions and everything derived from them.
    pub fn points(&mut self, space: Space) -> MeshResult<&[Point3]> {
        let provider = &self.provider;
        let points = self
            .metrics
            .time(TimingBucket::TriangleCache, || provider.points(space))?;
        if points.len() != provider.num_vertices() {
            return Err(MeshQueryError::InvalidTopology(format!(
                "provider returned {} positions for {} vertices",
                points.len(),
                provider.num_vertices()
            )));
        }

        self.cache.counters.entry(CacheEntry::Points).misses += 1;
        self.cache.clear_position_derived();
        self.cache.points.set((space, points));
        log::debug!("cached {space} positions for `{}`", provider.name());
        Ok(self.positions().unwrap_or_default())
    }

    /// Positions cached by the last [`points`](Self::points) call.
    #[must_use]
    pub fn positions(&self) -> Option<&[Point3]> {
        self.cache.points.get().map(|(_, points)| points.as_slice())
    }

    /// Space of the cached positions.
    #[must_use]
    pub fn positions_space(&self) -> Option<Space> {
        self.cache.points.get().map(|(space, _)| *space)
    }

    /// Bounds of the provider's positions in `space`; `None` for an empty mesh.
    pub fn bounding_box(&self, space: Space) -> MeshResult<Option<BBox>> {
        let points = self.provider.points(space)?;
        Ok(BBox::from_points(&points))
    }

    #[must_use]
    pub fn num_verts(&self) -> usize {
        self.provider.num_vertices()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.provider.num_edges()
    }

    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.provider.num_faces()
    }

    /// Total triangle count across faces.
    pub fn num_triangles(&mut self) -> MeshResult<usize> {
        Ok(self.triangles()?.total())
    }

    pub fn select_verts<S: SelectionSink + ?Sized>(
        &self,
        ids: &[usize],
        sink: &mut S,
        mode: SelectMode,
    ) -> Result<(), SelectionError> {
        self.select_components(ComponentKind::Vertex, ids, sink, mode)
    }

    pub fn select_edges<S: SelectionSink + ?Sized>(
        &self,
        ids: &[usize],
        sink: &mut S,
        mode: SelectMode,
    ) -> Result<(), SelectionError> {
        self.select_components(ComponentKind::Edge, ids, sink, mode)
    }

    pub fn select_faces<S: SelectionSink + ?Sized>(
        &self,
        ids: &[usize],
        sink: &mut S,
        mode: SelectMode,
    ) -> Result<(), SelectionError> {
        self.select_components(ComponentKind::Face, ids, sink, mode)
    }

    fn select_components<S: SelectionSink + ?Sized>(
        &self,
        kind: ComponentKind,
        ids: &[usize],
        sink: &mut S,
        mode: SelectMode,
    ) -> Result<(), SelectionError> {
        let count = match kind {
            ComponentKind::Vertex => self.provider.num_vertices(),
            ComponentKind::Edge => self.provider.num_edges(),
            ComponentKind::Face => self.provider.num_faces(),
        };
        if let Some(&id) = ids.iter().find(|&&id| id >= count) {
            return Err(SelectionError::OutOfRange { kind, id, count });
        }
        let paths = component_paths(self.provider.name(), kind, ids);
        sink.select(&paths, mode)
    }
}

fn missing(accessor: &'static str, requires: &'static str) -> MeshQueryError {
    MeshQueryError::MissingPrerequisiteState { accessor, requires }
}
