//! Per-triangle geometry.
//!
//! Edge `i` of a triangle runs from corner `i + 1` to corner `i`
//! (`edge[i] = p[i] - p[(i + 1) % 3]`). Normals, edge normals and edge
//! lengths all use that ordering. Degenerate triangles are not filtered:
//! their normals come out as NaN.

use super::{CacheEntry, MeshQueryEngine, missing};
use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{Point3, TimingBucket, Vec3};
use crate::provider::{FaceTriangles, MeshProvider};

/// How triangle normals are weighted when averaged onto vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalWeighting {
    /// By triangle area.
    #[default]
    Area,
    /// By the corner angle at the vertex.
    Angle,
}

impl<P: MeshProvider> MeshQueryEngine<P> {
    /// Per-face triangle counts and flattened triangle vertex ids.
    pub fn triangles(&mut self) -> MeshResult<&FaceTriangles> {
        let provider = &self.provider;
        let metrics = &mut self.metrics;
        self.cache
            .triangles
            .get_or_try_init(self.cache.counters.entry(CacheEntry::Triangles), || {
                let tris = metrics.time(TimingBucket::TriangleCache, || provider.triangles())?;
                let total = tris.total();
                if tris.vertices.len() != total * 3 {
                    return Err(MeshQueryError::InvalidTopology(format!(
                        "face counts sum to {total} triangles but {} vertex ids were given",
                        tris.vertices.len()
                    )));
                }
                log::debug!("triangulated `{}`: {total} triangles", provider.name());
                Ok(tris)
            })
    }

    /// Triangle vertex ids as an N×3 table.
    pub fn triangle_verts(&mut self) -> MeshResult<&[[usize; 3]]> {
        if !self.cache.triangle_verts.is_computed() {
            self.triangles()?;
        }
        let triangles = &self.cache.triangles;
        self.cache
            .triangle_verts
            .get_or_try_init(self.cache.counters.entry(CacheEntry::TriangleVerts), || {
                let tris = triangles
                    .get()
                    .ok_or_else(|| missing("triangle_verts", "triangles"))?;
                Ok(tris.iter().collect())
            })
            .map(Vec::as_slice)
    }

    /// Corner positions of every triangle.
    ///
    /// Fails with [`MeshQueryError::MissingPrerequisiteState`] until
    /// [`points`](Self::points) has been called.
    pub fn triangle_points(&mut self) -> MeshResult<&[[Point3; 3]]> {
        if !self.cache.triangle_points.is_computed() {
            if !self.cache.points.is_computed() {
                return Err(missing("triangle_points", "points"));
            }
            self.triangle_verts()?;
        }
        let verts = &self.cache.triangle_verts;
        let points = &self.cache.points;
        let metrics = &mut self.metrics;
        self.cache
            .triangle_points
            .get_or_try_init(self.cache.counters.entry(CacheEntry::TrianglePoints), || {
                let verts = verts
                    .get()
                    .ok_or_else(|| missing("triangle_points", "triangle_verts"))?;
                let (_, points) = points
                    .get()
                    .ok_or_else(|| missing("triangle_points", "points"))?;
                metrics.time(TimingBucket::TriangleCache, || gather_corners(verts, points))
            })
            .map(Vec::as_slice)
    }

    /// Mean of each triangle's corners.
    pub fn triangle_centers(&mut self) -> MeshResult<&[Point3]> {
        if !self.cache.triangle_centers.is_computed() {
            self.triangle_points()?;
        }
        let corners = &self.cache.triangle_points;
        self.cache
            .triangle_centers
            .get_or_try_init(self.cache.counters.entry(CacheEntry::TriangleCenters), || {
                let corners = corners
                    .get()
                    .ok_or_else(|| missing("triangle_centers", "triangle_points"))?;
                Ok(corners.iter().map(|&tri| Point3::centroid(tri)).collect())
            })
            .map(Vec::as_slice)
    }

    pub fn triangle_edge_vectors(&mut self) -> MeshResult<&[[Vec3; 3]]> {
        if !self.cache.triangle_edge_vectors.is_computed() {
            self.triangle_points()?;
        }
        let corners = &self.cache.triangle_points;
        self.cache
            .triangle_edge_vectors
            .get_or_try_init(
                self.cache.counters.entry(CacheEntry::TriangleEdgeVectors),
                || {
                    let corners = corners
                        .get()
                        .ok_or_else(|| missing("triangle_edge_vectors", "triangle_points"))?;
                    Ok(corners.iter().map(|&tri| edge_vectors(tri)).collect())
                },
            )
            .map(Vec::as_slice)
    }

    /// Length of each edge vector. Not cached.
    pub fn triangle_edge_lengths(&mut self) -> MeshResult<Vec<[f64; 3]>> {
        let edges = self.triangle_edge_vectors()?;
        Ok(edges
            .iter()
            .map(|e| [e[0].length(), e[1].length(), e[2].length()])
            .collect())
    }

    /// Unit normal of each triangle: `edge[0] × edge[1]`, normalized.
    pub fn triangle_normals(&mut self) -> MeshResult<&[Vec3]> {
        if !self.cache.triangle_normals.is_computed() {
            self.triangle_edge_vectors()?;
        }
        let edges = &self.cache.triangle_edge_vectors;
        let metrics = &mut self.metrics;
        self.cache
            .triangle_normals
            .get_or_try_init(self.cache.counters.entry(CacheEntry::TriangleNormals), || {
                let edges = edges
                    .get()
                    .ok_or_else(|| missing("triangle_normals", "triangle_edge_vectors"))?;
                Ok(metrics.time(TimingBucket::TriangleCache, || {
                    edges.iter().map(|e| e[0].cross(e[1]).unitized()).collect()
                }))
            })
            .map(Vec::as_slice)
    }

    /// In-plane normal of each edge: `normal × edge[i]`, normalized.
    pub fn triangle_edge_normals(&mut self) -> MeshResult<&[[Vec3; 3]]> {
        if !self.cache.triangle_edge_normals.is_computed() {
            self.triangle_normals()?;
        }
        let edges = &self.cache.triangle_edge_vectors;
        let normals = &self.cache.triangle_normals;
        self.cache
            .triangle_edge_normals
            .get_or_try_init(
                self.cache.counters.entry(CacheEntry::TriangleEdgeNormals),
                || {
                    let edges = edges
                        .get()
                        .ok_or_else(|| missing("triangle_edge_normals", "triangle_edge_vectors"))?;
                    let normals = normals
                        .get()
                        .ok_or_else(|| missing("triangle_edge_normals", "triangle_normals"))?;
                    Ok(edges
                        .iter()
                        .zip(normals)
                        .map(|(e, &n)| {
                            [
                                n.cross(e[0]).unitized(),
                                n.cross(e[1]).unitized(),
                                n.cross(e[2]).unitized(),
                            ]
                        })
                        .collect())
                },
            )
            .map(Vec::as_slice)
    }

    /// Per-vertex normals averaged from the triangles around each vertex.
    ///
    /// Vertices that touch no triangle (or only degenerate ones) get a zero
    /// vector. Requires cached positions, like
    /// [`triangle_points`](Self::triangle_points).
    pub fn vertex_normals(&mut self, weighting: NormalWeighting) -> MeshResult<Vec<Vec3>> {
        let vertex_count = self.provider.num_vertices();
        self.triangle_points()?;
        let verts = self
            .cache
            .triangle_verts
            .get()
            .ok_or_else(|| missing("vertex_normals", "triangle_verts"))?;
        let corners = self
            .cache
            .triangle_points
            .get()
            .ok_or_else(|| missing("vertex_normals", "triangle_points"))?;

        let mut sums = vec![Vec3::ZERO; vertex_count];
        for (ids, &[a, b, c]) in verts.iter().zip(corners) {
            // |cross| is twice the area, so the raw cross product is already area weighted.
            let face_normal = (b - a).cross(c - a);
            let Some(unit) = face_normal.normalized() else {
                continue;
            };
            for (corner, &vertex) in ids.iter().enumerate() {
                let weighted = match weighting {
                    NormalWeighting::Area => face_normal,
                    NormalWeighting::Angle => unit * corner_angle([a, b, c], corner),
                };
                if let Some(sum) = sums.get_mut(vertex) {
                    *sum += weighted;
                }
            }
        }

        Ok(sums
            .into_iter()
            .map(|n| n.normalized().unwrap_or(Vec3::ZERO))
            .collect())
    }
}

fn gather_corners(verts: &[[usize; 3]], points: &[Point3]) -> MeshResult<Vec<[Point3; 3]>> {
    let lookup = |vertex: usize| {
        points
            .get(vertex)
            .copied()
            .ok_or(MeshQueryError::VertexOutOfRange {
                vertex,
                count: points.len(),
            })
    };
    verts
        .iter()
        .map(|&[a, b, c]| Ok([lookup(a)?, lookup(b)?, lookup(c)?]))
        .collect()
}

fn edge_vectors([p0, p1, p2]: [Point3; 3]) -> [Vec3; 3] {
    [p0 - p1, p1 - p2, p2 - p0]
}

fn corner_angle(corners: [Point3; 3], corner: usize) -> f64 {
    let p = corners[corner];
    let a = corners[(corner + 1) % 3] - p;
    let b = corners[(corner + 2) % 3] - p;
    match (a.normalized(), b.normalized()) {
        (Some(a), Some(b)) => a.dot(b).clamp(-1.0, 1.0).acos(),
        _ => 0.0,
    }
}
