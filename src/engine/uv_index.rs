//! UV-space lookups: per-set UV caching, bounds, UDIM tiles and locating a
//! `(u, v)` inside a Delaunay triangulation of the vertex UVs.

use serde::Serialize;

use super::cache::keyed_get_or_try_init;
use super::{CacheEntry, MeshQueryEngine};
use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{Point3, TimingBucket, UvPoint, UvTriangulation};
use crate::provider::{MeshProvider, Space};

/// A 3D point recovered from a UV location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvQueryResult {
    /// World-space position interpolated from the containing triangle.
    pub point: Point3,
    /// Vertex ids of the containing triangle.
    pub triangle: [usize; 3],
    /// Weights of `triangle`'s vertices; they sum to one.
    pub barycentric: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvBounds {
    pub min_u: f64,
    pub max_u: f64,
    pub min_v: f64,
    pub max_v: f64,
}

/// An integer-aligned unit tile of UV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UdimTile {
    pub u: i64,
    pub v: i64,
}

impl UdimTile {
    /// Conventional UDIM number, `1001 + u + 10 * v`.
    #[must_use]
    pub const fn number(self) -> i64 {
        1001 + self.u + 10 * self.v
    }
}

impl<P: MeshProvider> MeshQueryEngine<P> {
    /// Per-vertex UVs of `uv_set` (`None` = the current set), cached per set.
    pub fn get_vert_uvs(&mut self, uv_set: Option<&str>) -> MeshResult<&[UvPoint]> {
        let provider = &self.provider;
        keyed_get_or_try_init(
            &mut self.cache.vert_uvs,
            uv_set.map(str::to_owned),
            self.cache.counters.entry(CacheEntry::VertUvs),
            || {
                let uvs = provider.vertex_uvs(uv_set)?;
                if uvs.len() != provider.num_vertices() {
                    return Err(MeshQueryError::InvalidTopology(format!(
                        "uv set has {} coordinates for {} vertices",
                        uvs.len(),
                        provider.num_vertices()
                    )));
                }
                Ok(uvs)
            },
        )
        .map(Vec::as_slice)
    }

    pub fn uv_bounds(&mut self, uv_set: Option<&str>) -> MeshResult<UvBounds> {
        let uvs = self.get_vert_uvs(uv_set)?;
        let first = uvs.first().ok_or(MeshQueryError::EmptyMesh)?;
        Ok(uvs.iter().skip(1).fold(
            UvBounds {
                min_u: first.u,
                max_u: first.u,
                min_v: first.v,
                max_v: first.v,
            },
            |b, uv| UvBounds {
                min_u: b.min_u.min(uv.u),
                max_u: b.max_u.max(uv.u),
                min_v: b.min_v.min(uv.v),
                max_v: b.max_v.max(uv.v),
            },
        ))
    }

    pub fn min_u(&mut self, uv_set: Option<&str>) -> MeshResult<f64> {
        Ok(self.uv_bounds(uv_set)?.min_u)
    }

    pub fn max_u(&mut self, uv_set: Option<&str>) -> MeshResult<f64> {
        Ok(self.uv_bounds(uv_set)?.max_u)
    }

    pub fn min_v(&mut self, uv_set: Option<&str>) -> MeshResult<f64> {
        Ok(self.uv_bounds(uv_set)?.min_v)
    }

    pub fn max_v(&mut self, uv_set: Option<&str>) -> MeshResult<f64> {
        Ok(self.uv_bounds(uv_set)?.max_v)
    }

    /// Delaunay triangulation of the vertex UVs, cached per set.
    ///
    /// Collinear or coincident UVs are joggled with a seeded jitter before
    /// giving up; see [`QueryOptions::joggle`](super::QueryOptions::joggle).
    pub fn uv_triangulation(&mut self, uv_set: Option<&str>) -> MeshResult<&UvTriangulation> {
        let key = uv_set.map(str::to_owned);
        if !self.cache.uv_triangulations.contains_key(&key) {
            self.get_vert_uvs(uv_set)?;
        }
        let uvs = &self.cache.vert_uvs;
        let options = self.options;
        let metrics = &mut self.metrics;
        keyed_get_or_try_init(
            &mut self.cache.uv_triangulations,
            key.clone(),
            self.cache.counters.entry(CacheEntry::UvTriangulation),
            || {
                let uvs = uvs
                    .get(&key)
                    .ok_or_else(|| super::missing("uv_triangulation", "vert_uvs"))?;
                let triangulation = metrics.time(TimingBucket::UvTriangulation, || {
                    UvTriangulation::build(
                        uvs,
                        options.joggle,
                        options.tolerance,
                        options.bvh_leaf_size,
                    )
                })?;
                Ok(triangulation)
            },
        )
    }

    /// Finds the UV triangle containing `(u, v)` and interpolates the
    /// world-space positions of its vertices.
    ///
    /// Returns `Ok(None)` when `(u, v)` lies outside the triangulated region.
    pub fn get_closest_at_uv(
        &mut self,
        u: f64,
        v: f64,
        uv_set: Option<&str>,
    ) -> MeshResult<Option<UvQueryResult>> {
        let query = UvPoint::new(u, v);
        self.uv_triangulation(uv_set)?;
        let Some(triangulation) = self.cache.uv_triangulations.get(&uv_set.map(str::to_owned))
        else {
            return Err(super::missing("get_closest_at_uv", "uv_triangulation"));
        };
        let Some(hit) = self
            .metrics
            .time(TimingBucket::UvLookup, || triangulation.locate(query))
        else {
            log::debug!("uv ({u}, {v}) lies outside the triangulation");
            return Ok(None);
        };

        let world = self.provider.points(Space::World)?;
        let corner = |vertex: usize| {
            world
                .get(vertex)
                .copied()
                .ok_or(MeshQueryError::VertexOutOfRange {
                    vertex,
                    count: world.len(),
                })
        };
        let [a, b, c] = hit.vertices;
        let point = Point3::barycentric([corner(a)?, corner(b)?, corner(c)?], hit.barycentric);

        Ok(Some(UvQueryResult {
            point,
            triangle: hit.vertices,
            barycentric: hit.barycentric,
        }))
    }

    /// The single UDIM tile holding every UV of the set, or `None` if the UVs
    /// span several tiles. A UV on a tile's upper edge belongs to that tile.
    pub fn get_uv_udim(&mut self, uv_set: Option<&str>) -> MeshResult<Option<UdimTile>> {
        let eps = self.options.tolerance.eps;
        let bounds = self.uv_bounds(uv_set)?;
        let tile_range = |min: f64, max: f64| {
            let low = min.floor();
            let high = (max - eps).floor().max(low);
            (low as i64, high as i64)
        };
        let (u_low, u_high) = tile_range(bounds.min_u, bounds.max_u);
        let (v_low, v_high) = tile_range(bounds.min_v, bounds.max_v);
        if u_low == u_high && v_low == v_high {
            Ok(Some(UdimTile { u: u_low, v: v_low }))
        } else {
            Ok(None)
        }
    }
}
