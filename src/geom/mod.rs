mod bvh;
mod core;
mod intersector;
mod metrics;
mod sparse;
mod triangulation;

pub(crate) use bvh::Bvh;
pub use core::{BBox, Point3, Tolerance, Transform, UvPoint, Vec3};
pub use intersector::{IntersectorError, MeshIntersector, SurfacePoint, closest_point_on_triangle};
pub use metrics::{QueryMetrics, QueryTimingReport, TimingBucket};
pub use sparse::{SparseError, SparseMatrix};
pub use triangulation::{
    JoggleOptions, SimplexHit, TriangulationError, UvTriangulation, barycentric_2d,
};
