//! The capability interface the engine consumes.
//!
//! A provider stands for one mesh in some host representation. It answers raw
//! lookups (positions, triangulation, UVs, edges, one-rings) and can build a
//! nearest-point accelerator. The engine never mutates a provider.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{Bvh, MeshIntersector, Point3, SurfacePoint, UvPoint};

/// Reference frame for positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    /// Untransformed mesh coordinates.
    #[default]
    Object,
    /// Coordinates after the mesh's world transform.
    World,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::World => f.write_str("world"),
        }
    }
}

impl FromStr for Space {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "object" | "local" => Ok(Self::Object),
            "world" => Ok(Self::World),
            other => Err(format!("unknown space `{other}` (expected object or world)")),
        }
    }
}

/// Per-face triangulation: how many triangles each face splits into, and the
/// flattened vertex ids of all triangles in face order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FaceTriangles {
    pub counts: Vec<usize>,
    pub vertices: Vec<usize>,
}

impl FaceTriangles {
    /// Sum of the per-face counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Vertex ids of each triangle.
    pub fn iter(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }
}

/// Nearest-point-on-surface lookups.
pub trait ClosestPointAccelerator: Sync {
    fn closest_point(&self, point: Point3) -> Option<SurfacePoint>;
}

impl ClosestPointAccelerator for MeshIntersector {
    fn closest_point(&self, point: Point3) -> Option<SurfacePoint> {
        MeshIntersector::closest_point(self, point)
    }
}

pub trait MeshProvider {
    /// Name used when addressing components of this mesh.
    fn name(&self) -> &str;

    fn num_vertices(&self) -> usize;

    fn num_edges(&self) -> usize;

    fn num_faces(&self) -> usize;

    /// Vertex positions indexed by vertex id.
    fn points(&self, space: Space) -> MeshResult<Vec<Point3>>;

    fn triangles(&self) -> MeshResult<FaceTriangles>;

    /// UV of one vertex in `uv_set` (`None` selects the current set).
    fn vertex_uv(&self, vertex: usize, uv_set: Option<&str>) -> MeshResult<UvPoint>;

    /// UVs of every vertex, indexed by vertex id.
    fn vertex_uvs(&self, uv_set: Option<&str>) -> MeshResult<Vec<UvPoint>> {
        (0..self.num_vertices())
            .map(|vertex| self.vertex_uv(vertex, uv_set))
            .collect()
    }

    /// The two vertex ids of every edge, in a stable order.
    fn edge_vertices(&self) -> MeshResult<Vec<[usize; 2]>>;

    /// Vertices sharing an edge with `vertex`.
    fn connected_vertices(&self, vertex: usize) -> MeshResult<Vec<usize>>;

    /// Vertex ids of triangle `triangle` of face `face`, in the same order the
    /// accelerator reports barycentric weights.
    fn face_triangle(&self, face: usize, triangle: usize) -> MeshResult<[usize; 3]> {
        let tris = self.triangles()?;
        let count = tris.counts.get(face).copied().unwrap_or(0);
        if triangle >= count {
            return Err(MeshQueryError::FaceOutOfRange { face, triangle });
        }
        let index = tris.counts[..face].iter().sum::<usize>() + triangle;
        tris.iter()
            .nth(index)
            .ok_or(MeshQueryError::FaceOutOfRange { face, triangle })
    }

    /// Builds a fresh object-space nearest-point accelerator.
    fn closest_point_accelerator(&self) -> MeshResult<Box<dyn ClosestPointAccelerator>> {
        let points = self.points(Space::Object)?;
        let tris = self.triangles()?;
        let intersector =
            MeshIntersector::build(&points, &tris.counts, &tris.vertices, Bvh::DEFAULT_LEAF_SIZE)?;
        Ok(Box::new(intersector))
    }
}

macro_rules! forward_mesh_provider {
    ($($ptr:ty),*) => {$(
        impl<T: MeshProvider + ?Sized> MeshProvider for $ptr {
            fn name(&self) -> &str {
                (**self).name()
            }
            fn num_vertices(&self) -> usize {
                (**self).num_vertices()
            }
            fn num_edges(&self) -> usize {
                (**self).num_edges()
            }
            fn num_faces(&self) -> usize {
                (**self).num_faces()
            }
            fn points(&self, space: Space) -> MeshResult<Vec<Point3>> {
                (**self).points(space)
            }
            fn triangles(&self) -> MeshResult<FaceTriangles> {
                (**self).triangles()
            }
            fn vertex_uv(&self, vertex: usize, uv_set: Option<&str>) -> MeshResult<UvPoint> {
                (**self).vertex_uv(vertex, uv_set)
            }
            fn vertex_uvs(&self, uv_set: Option<&str>) -> MeshResult<Vec<UvPoint>> {
                (**self).vertex_uvs(uv_set)
            }
            fn edge_vertices(&self) -> MeshResult<Vec<[usize; 2]>> {
                (**self).edge_vertices()
            }
            fn connected_vertices(&self, vertex: usize) -> MeshResult<Vec<usize>> {
                (**self).connected_vertices(vertex)
            }
            fn face_triangle(&self, face: usize, triangle: usize) -> MeshResult<[usize; 3]> {
                (**self).face_triangle(face, triangle)
            }
            fn closest_point_accelerator(&self) -> MeshResult<Box<dyn ClosestPointAccelerator>> {
                (**self).closest_point_accelerator()
            }
        }
    )*};
}

forward_mesh_provider!(&T, &mut T, Box<T>);
