//! Closest-point-on-surface queries over a triangulated polygon mesh.
//!
//! Triangles keep their `(face, triangle-in-face)` address so answers can be
//! related back to the polygon they came from, which is what UV interpolation
//! needs.

use serde::Serialize;

use super::bvh::Bvh;
use super::{BBox, Point3, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntersectorError {
    #[error("triangle list references vertex {vertex} but only {count} positions exist")]
    VertexOutOfRange { vertex: usize, count: usize },
    #[error("per-face triangle counts sum to {expected} but {actual} triangles were supplied")]
    CountMismatch { expected: usize, actual: usize },
    #[error("mesh has no triangles")]
    Empty,
}

/// A location on the surface nearest to some query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfacePoint {
    pub point: Point3,
    /// Unit normal of the containing triangle (zero for collapsed triangles).
    pub normal: Vec3,
    pub face: usize,
    /// Triangle index within `face`.
    pub triangle: usize,
    /// Weights `(u, v)` of the triangle's first two vertices; the third
    /// vertex carries `1 - u - v`.
    pub barycentric: [f64; 2],
    pub distance: f64,
}

impl SurfacePoint {
    /// All three weights, in triangle-vertex order.
    #[must_use]
    pub fn weights(&self) -> [f64; 3] {
        let [u, v] = self.barycentric;
        [u, v, 1.0 - (u + v)]
    }
}

#[derive(Debug, Clone, Copy)]
struct TriangleRecord {
    corners: [Point3; 3],
    face: usize,
    triangle: usize,
}

#[derive(Debug, Clone)]
pub struct MeshIntersector {
    triangles: Vec<TriangleRecord>,
    bvh: Bvh,
}

impl MeshIntersector {
    /// Builds the accelerator from positions plus per-face triangulation data.
    ///
    /// `triangle_vertices` holds three vertex ids per triangle, grouped by face
    /// according to `triangle_counts`.
    pub fn build(
        points: &[Point3],
        triangle_counts: &[usize],
        triangle_vertices: &[usize],
        leaf_size: usize,
    ) -> Result<Self, IntersectorError> {
        let expected: usize = triangle_counts.iter().sum();
        let actual = triangle_vertices.len() / 3;
        if expected != actual || triangle_vertices.len() % 3 != 0 {
            return Err(IntersectorError::CountMismatch { expected, actual });
        }
        if let Some(&vertex) = triangle_vertices.iter().find(|&&v| v >= points.len()) {
            return Err(IntersectorError::VertexOutOfRange {
                vertex,
                count: points.len(),
            });
        }

        let mut triangles = Vec::with_capacity(actual);
        let mut chunks = triangle_vertices.chunks_exact(3);
        for (face, &count) in triangle_counts.iter().enumerate() {
            for triangle in 0..count {
                let Some(ids) = chunks.next() else {
                    break;
                };
                triangles.push(TriangleRecord {
                    corners: [points[ids[0]], points[ids[1]], points[ids[2]]],
                    face,
                    triangle,
                });
            }
        }

        let bounds: Vec<BBox> = triangles
            .iter()
            .map(|t| {
                BBox::new(t.corners[0], t.corners[0])
                    .expand_point(t.corners[1])
                    .expand_point(t.corners[2])
            })
            .collect();
        let bvh = Bvh::build_with_leaf_size(&bounds, leaf_size).ok_or(IntersectorError::Empty)?;

        log::debug!("mesh intersector built over {} triangles", triangles.len());
        Ok(Self { triangles, bvh })
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Nearest surface location to `query`; `None` only for non-finite input.
    #[must_use]
    pub fn closest_point(&self, query: Point3) -> Option<SurfacePoint> {
        let (index, dist2) = self.bvh.nearest(query, |i| {
            let [a, b, c] = self.triangles[i].corners;
            let (p, _) = closest_point_on_triangle(query, a, b, c);
            Some(p.distance_squared_to(query))
        })?;

        let record = self.triangles[index];
        let [a, b, c] = record.corners;
        let (point, weights) = closest_point_on_triangle(query, a, b, c);
        let normal = (b - a).cross(c - a).normalized().unwrap_or(Vec3::ZERO);

        Some(SurfacePoint {
            point,
            normal,
            face: record.face,
            triangle: record.triangle,
            barycentric: [weights[0], weights[1]],
            distance: dist2.sqrt(),
        })
    }
}

/// Closest point on triangle `abc` to `p`, with its barycentric weights.
///
/// Region classification after Ericson, "Real-Time Collision Detection" §5.1.5.
#[must_use]
pub fn closest_point_on_triangle(p: Point3, a: Point3, b: Point3, c: Point3) -> (Point3, [f64; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Point3>, Vec<usize>, Vec<usize>) {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (points, vec![2], vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn projects_onto_the_plane() {
        let (points, counts, tris) = quad();
        let isect = MeshIntersector::build(&points, &counts, &tris, 4).unwrap();
        let hit = isect.closest_point(Point3::new(0.2, 0.7, 3.0)).unwrap();

        assert!((hit.point.x - 0.2).abs() < 1e-12);
        assert!((hit.point.y - 0.7).abs() < 1e-12);
        assert!(hit.point.z.abs() < 1e-12);
        assert!((hit.distance - 3.0).abs() < 1e-12);
        assert_eq!(hit.face, 0);
        assert_eq!(hit.triangle, 1);
        assert!((hit.normal.z.abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weights_reproduce_the_surface_point() {
        let (points, counts, tris) = quad();
        let isect = MeshIntersector::build(&points, &counts, &tris, 4).unwrap();
        let hit = isect.closest_point(Point3::new(0.9, 0.1, -1.0)).unwrap();
        let base = hit.triangle * 3;
        let corners = [points[tris[base]], points[tris[base + 1]], points[tris[base + 2]]];
        let rebuilt = Point3::barycentric(corners, hit.weights());
        assert!(rebuilt.distance_squared_to(hit.point) < 1e-20);
    }

    #[test]
    fn clamps_to_edges_and_vertices() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let (p, w) = closest_point_on_triangle(Point3::new(-1.0, -1.0, 0.0), a, b, c);
        assert_eq!(p, a);
        assert_eq!(w, [1.0, 0.0, 0.0]);

        let (p, w) = closest_point_on_triangle(Point3::new(0.5, -2.0, 0.0), a, b, c);
        assert_eq!(p, Point3::new(0.5, 0.0, 0.0));
        assert!((w[1] - 0.5).abs() < 1e-12);

        let (p, _) = closest_point_on_triangle(Point3::new(1.0, 1.0, 0.0), a, b, c);
        assert!((p.x - 0.5).abs() < 1e-12 && (p.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_inconsistent_input() {
        let (points, _, tris) = quad();
        assert_eq!(
            MeshIntersector::build(&points, &[1], &tris, 4).unwrap_err(),
            IntersectorError::CountMismatch {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(
            MeshIntersector::build(&points[..2], &[2], &tris, 4).unwrap_err(),
            IntersectorError::VertexOutOfRange { vertex: 2, count: 2 }
        );
        assert_eq!(
            MeshIntersector::build(&points, &[], &[], 4).unwrap_err(),
            IntersectorError::Empty
        );
    }
}
