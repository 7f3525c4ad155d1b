//! An in-memory, immutable mesh that implements [`MeshProvider`].
//!
//! Faces are arbitrary polygons; each is fan-triangulated from its first
//! vertex. Edges are numbered in the order they first appear while walking
//! faces, and that order is stable for the life of the snapshot.

use std::collections::HashMap;

use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{Point3, Transform, UvPoint};
use crate::provider::{FaceTriangles, MeshProvider, Space};

#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    name: String,
    positions: Vec<Point3>,
    faces: Vec<Vec<usize>>,
    edges: Vec<[usize; 2]>,
    neighbours: Vec<Vec<usize>>,
    triangles: FaceTriangles,
    uv_sets: Vec<(String, Vec<UvPoint>)>,
    current_uv_set: Option<usize>,
    world: Transform,
}

impl MeshSnapshot {
    /// Validates the topology and derives edges, one-rings and triangles.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Point3>,
        faces: Vec<Vec<usize>>,
    ) -> MeshResult<Self> {
        let count = positions.len();
        for (index, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(MeshQueryError::InvalidTopology(format!(
                    "face {index} has {} vertices; at least 3 are required",
                    face.len()
                )));
            }
            if let Some(&vertex) = face.iter().find(|&&v| v >= count) {
                return Err(MeshQueryError::VertexOutOfRange { vertex, count });
            }
        }

        let mut edges = Vec::new();
        let mut edge_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        let mut neighbours = vec![Vec::new(); count];
        for face in &faces {
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                if edge_lookup.contains_key(&key) {
                    continue;
                }
                edge_lookup.insert(key, edges.len());
                edges.push([a, b]);
                neighbours[a].push(b);
                neighbours[b].push(a);
            }
        }
        for ring in &mut neighbours {
            ring.sort_unstable();
        }

        let mut triangles = FaceTriangles::default();
        for face in &faces {
            triangles.counts.push(face.len() - 2);
            for i in 1..face.len() - 1 {
                triangles
                    .vertices
                    .extend_from_slice(&[face[0], face[i], face[i + 1]]);
            }
        }

        Ok(Self {
            name: name.into(),
            positions,
            faces,
            edges,
            neighbours,
            triangles,
            uv_sets: Vec::new(),
            current_uv_set: None,
            world: Transform::identity(),
        })
    }

    /// Adds (or replaces) a per-vertex UV set. The first set added becomes
    /// current.
    pub fn with_uv_set(mut self, name: impl Into<String>, uvs: Vec<UvPoint>) -> MeshResult<Self> {
        let name = name.into();
        if uvs.len() != self.positions.len() {
            return Err(MeshQueryError::InvalidTopology(format!(
                "uv set `{name}` has {} coordinates for {} vertices",
                uvs.len(),
                self.positions.len()
            )));
        }
        match self.uv_sets.iter().position(|(n, _)| *n == name) {
            Some(index) => self.uv_sets[index].1 = uvs,
            None => self.uv_sets.push((name, uvs)),
        }
        if self.current_uv_set.is_none() {
            self.current_uv_set = Some(0);
        }
        Ok(self)
    }

    pub fn set_current_uv_set(&mut self, name: &str) -> MeshResult<()> {
        let index = self.uv_set_index(name)?;
        self.current_uv_set = Some(index);
        Ok(())
    }

    #[must_use]
    pub fn with_world_transform(mut self, world: Transform) -> Self {
        self.world = world;
        self
    }

    /// Replaces vertex positions, keeping topology.
    pub fn set_positions(&mut self, positions: Vec<Point3>) -> MeshResult<()> {
        if positions.len() != self.positions.len() {
            return Err(MeshQueryError::InvalidTopology(format!(
                "expected {} positions, got {}",
                self.positions.len(),
                positions.len()
            )));
        }
        self.positions = positions;
        Ok(())
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn uv_set_names(&self) -> impl Iterator<Item = &str> {
        self.uv_sets.iter().map(|(name, _)| name.as_str())
    }

    pub fn current_uv_set(&self) -> Option<&str> {
        self.current_uv_set
            .map(|index| self.uv_sets[index].0.as_str())
    }

    pub const fn world_transform(&self) -> Transform {
        self.world
    }

    fn uv_set_index(&self, name: &str) -> MeshResult<usize> {
        self.uv_sets
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| MeshQueryError::UvSetNotFound(name.to_owned()))
    }

    fn resolve_uv_set(&self, uv_set: Option<&str>) -> MeshResult<&[UvPoint]> {
        let index = match uv_set {
            Some(name) => self.uv_set_index(name)?,
            None => self
                .current_uv_set
                .ok_or_else(|| MeshQueryError::UvSetNotFound("<current>".to_owned()))?,
        };
        Ok(&self.uv_sets[index].1)
    }

    fn check_vertex(&self, vertex: usize) -> MeshResult<()> {
        if vertex < self.positions.len() {
            Ok(())
        } else {
            Err(MeshQueryError::VertexOutOfRange {
                vertex,
                count: self.positions.len(),
            })
        }
    }
}

impl MeshProvider for MeshSnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn num_faces(&self) -> usize {
        self.faces.len()
    }

    fn points(&self, space: Space) -> MeshResult<Vec<Point3>> {
        Ok(match space {
            Space::Object => self.positions.clone(),
            Space::World => self
                .positions
                .iter()
                .map(|&p| self.world.apply_point(p))
                .collect(),
        })
    }

    fn triangles(&self) -> MeshResult<FaceTriangles> {
        Ok(self.triangles.clone())
    }

    fn vertex_uv(&self, vertex: usize, uv_set: Option<&str>) -> MeshResult<UvPoint> {
        self.check_vertex(vertex)?;
        Ok(self.resolve_uv_set(uv_set)?[vertex])
    }

    fn vertex_uvs(&self, uv_set: Option<&str>) -> MeshResult<Vec<UvPoint>> {
        self.resolve_uv_set(uv_set).map(<[UvPoint]>::to_vec)
    }

    fn edge_vertices(&self) -> MeshResult<Vec<[usize; 2]>> {
        Ok(self.edges.clone())
    }

    fn connected_vertices(&self, vertex: usize) -> MeshResult<Vec<usize>> {
        self.check_vertex(vertex)?;
        Ok(self.neighbours[vertex].clone())
    }

    fn face_triangle(&self, face: usize, triangle: usize) -> MeshResult<[usize; 3]> {
        let polygon = self
            .faces
            .get(face)
            .filter(|polygon| triangle + 2 < polygon.len())
            .ok_or(MeshQueryError::FaceOutOfRange { face, triangle })?;
        Ok([polygon[0], polygon[triangle + 1], polygon[triangle + 2]])
    }
}
