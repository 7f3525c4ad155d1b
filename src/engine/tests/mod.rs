mod test_connectivity;
mod test_diagnostics;
mod test_uv_index;

use std::cell::Cell;

use crate::error::MeshResult;
use crate::geom::{Point3, UvPoint};
use crate::provider::{FaceTriangles, MeshProvider, Space};
use crate::snapshot::MeshSnapshot;

/// Planar unit square in z = 0 split into two triangles, with UVs equal to XY
/// in `map1`.
pub(super) fn unit_square() -> MeshSnapshot {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let uvs = positions.iter().map(|p| UvPoint::new(p.x, p.y)).collect();
    MeshSnapshot::new("plane", positions, vec![vec![0, 1, 2, 3]])
        .and_then(|mesh| mesh.with_uv_set("map1", uvs))
        .unwrap()
}

pub(super) fn single_triangle() -> MeshSnapshot {
    MeshSnapshot::new(
        "tri",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2]],
    )
    .unwrap()
}

/// Closed tetrahedron with outward winding.
pub(super) fn tetrahedron() -> MeshSnapshot {
    MeshSnapshot::new(
        "tet",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
    )
    .unwrap()
}

/// 3×3 vertex grid of four quads, vertex `i` at `(i % 3, i / 3)`.
pub(super) fn grid() -> MeshSnapshot {
    let positions = (0..9)
        .map(|i| Point3::new(f64::from(i % 3), f64::from(i / 3), 0.0))
        .collect();
    MeshSnapshot::new(
        "grid",
        positions,
        vec![
            vec![0, 1, 4, 3],
            vec![1, 2, 5, 4],
            vec![3, 4, 7, 6],
            vec![4, 5, 8, 7],
        ],
    )
    .unwrap()
}

/// Two triangles sharing no vertices.
pub(super) fn two_islands() -> MeshSnapshot {
    MeshSnapshot::new(
        "islands",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2], vec![3, 4, 5]],
    )
    .unwrap()
}

/// Forwards to a snapshot while counting the expensive provider calls.
pub(super) struct CountingProvider<P> {
    pub inner: P,
    pub point_calls: Cell<usize>,
    pub triangle_calls: Cell<usize>,
    pub edge_calls: Cell<usize>,
    pub uv_calls: Cell<usize>,
}

impl<P> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            point_calls: Cell::new(0),
            triangle_calls: Cell::new(0),
            edge_calls: Cell::new(0),
            uv_calls: Cell::new(0),
        }
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl<P: MeshProvider> MeshProvider for CountingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn num_vertices(&self) -> usize {
        self.inner.num_vertices()
    }

    fn num_edges(&self) -> usize {
        self.inner.num_edges()
    }

    fn num_faces(&self) -> usize {
        self.inner.num_faces()
    }

    fn points(&self, space: Space) -> MeshResult<Vec<Point3>> {
        bump(&self.point_calls);
        self.inner.points(space)
    }

    fn triangles(&self) -> MeshResult<FaceTriangles> {
        bump(&self.triangle_calls);
        self.inner.triangles()
    }

    fn vertex_uv(&self, vertex: usize, uv_set: Option<&str>) -> MeshResult<UvPoint> {
        self.inner.vertex_uv(vertex, uv_set)
    }

    fn vertex_uvs(&self, uv_set: Option<&str>) -> MeshResult<Vec<UvPoint>> {
        bump(&self.uv_calls);
        self.inner.vertex_uvs(uv_set)
    }

    fn edge_vertices(&self) -> MeshResult<Vec<[usize; 2]>> {
        bump(&self.edge_calls);
        self.inner.edge_vertices()
    }

    fn connected_vertices(&self, vertex: usize) -> MeshResult<Vec<usize>> {
        self.inner.connected_vertices(vertex)
    }
}
