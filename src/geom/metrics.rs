//! Opt-in timing hooks for the query engine.
//!
//! Timing is only collected when the `query_metrics` feature is enabled and the
//! target is not WASM. Otherwise every call compiles down to invoking the
//! closure.
//!
//! ```ignore
//! let mut metrics = QueryMetrics::default();
//! let normals = metrics.time(TimingBucket::TriangleCache, || compute_normals(&edges));
//! if let Some(report) = metrics.report() {
//!     println!("triangle cache: {} ns", report.triangle_cache_ns);
//! }
//! ```

use serde::Serialize;

/// Categories of engine work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Triangle lists, points, edge vectors, normals.
    TriangleCache,
    /// Edge lists and sparse connectivity matrices.
    Connectivity,
    /// Delaunay triangulation of UV sets.
    UvTriangulation,
    /// Simplex location and interpolation in UV space.
    UvLookup,
    /// Accelerator builds and nearest-point lookups.
    ClosestPoint,
    /// Breadth-first vertex marching.
    Marching,
    /// Topology and degeneracy reports.
    Diagnostics,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTimingReport {
    pub triangle_cache_ns: u64,
    pub connectivity_ns: u64,
    pub uv_triangulation_ns: u64,
    pub uv_lookup_ns: u64,
    pub closest_point_ns: u64,
    pub marching_ns: u64,
    pub diagnostics_ns: u64,
}

impl QueryTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.triangle_cache_ns
            .saturating_add(self.connectivity_ns)
            .saturating_add(self.uv_triangulation_ns)
            .saturating_add(self.uv_lookup_ns)
            .saturating_add(self.closest_point_ns)
            .saturating_add(self.marching_ns)
            .saturating_add(self.diagnostics_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[allow(dead_code)]
    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::TriangleCache => &mut self.triangle_cache_ns,
            TimingBucket::Connectivity => &mut self.connectivity_ns,
            TimingBucket::UvTriangulation => &mut self.uv_triangulation_ns,
            TimingBucket::UvLookup => &mut self.uv_lookup_ns,
            TimingBucket::ClosestPoint => &mut self.closest_point_ns,
            TimingBucket::Marching => &mut self.marching_ns,
            TimingBucket::Diagnostics => &mut self.diagnostics_ns,
        }
    }
}

/// Accumulates timings across engine calls until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct QueryMetrics {
    #[cfg(all(feature = "query_metrics", not(target_arch = "wasm32")))]
    report: QueryTimingReport,
}

impl QueryMetrics {
    pub fn reset(&mut self) {
        #[cfg(all(feature = "query_metrics", not(target_arch = "wasm32")))]
        {
            self.report = QueryTimingReport::default();
        }
    }

    /// The accumulated report, or `None` if metrics are compiled out.
    #[must_use]
    pub fn report(&self) -> Option<QueryTimingReport> {
        #[cfg(all(feature = "query_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "query_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, charging its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "query_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "query_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_total_sums_buckets() {
        let report = QueryTimingReport {
            triangle_cache_ns: 1000,
            uv_triangulation_ns: 2000,
            marching_ns: 3000,
            ..QueryTimingReport::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn time_returns_closure_result() {
        let mut metrics = QueryMetrics::default();
        metrics.reset();
        assert_eq!(metrics.time(TimingBucket::Marching, || 42), 42);
        #[cfg(not(feature = "query_metrics"))]
        assert!(metrics.report().is_none());
    }
}
