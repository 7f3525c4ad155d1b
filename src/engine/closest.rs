//! Nearest point on the surface, with UVs interpolated at the hit.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use super::MeshQueryEngine;
use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{Point3, SurfacePoint, TimingBucket, UvPoint};
use crate::provider::{ClosestPointAccelerator, MeshProvider};

/// One answer of [`MeshQueryEngine::point_on_mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointOnMesh {
    pub surface: SurfacePoint,
    pub u: f64,
    pub v: f64,
}

impl PointOnMesh {
    #[must_use]
    pub const fn uv(&self) -> UvPoint {
        UvPoint::new(self.u, self.v)
    }
}

impl<P: MeshProvider> MeshQueryEngine<P> {
    /// Projects each point onto the surface and interpolates `uv_set` there.
    ///
    /// Results follow input order. The provider's accelerator is rebuilt on
    /// every call, so batch points into one call where possible.
    pub fn point_on_mesh(
        &mut self,
        points: impl IntoIterator<Item = Point3>,
        uv_set: Option<&str>,
    ) -> MeshResult<Vec<PointOnMesh>> {
        let points: Vec<Point3> = points.into_iter().collect();
        if let Some(index) = points.iter().position(|p| !p.to_vec3().is_finite()) {
            return Err(MeshQueryError::NonFinitePoint { index });
        }
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let provider = &self.provider;
        let hits = self.metrics.time(TimingBucket::ClosestPoint, || {
            let accelerator = provider.closest_point_accelerator()?;
            log::debug!(
                "closest point: {} queries against `{}`",
                points.len(),
                provider.name()
            );
            Ok::<_, MeshQueryError>(nearest_points(accelerator.as_ref(), &points))
        })?;

        hits.into_iter()
            .enumerate()
            .map(|(index, hit)| {
                let surface = hit.ok_or(MeshQueryError::NoSurfacePoint { index })?;
                let (u, v) = interpolate_uv(provider, &surface, uv_set)?;
                Ok(PointOnMesh { surface, u, v })
            })
            .collect()
    }
}

#[cfg(feature = "parallel")]
fn nearest_points(
    accelerator: &dyn ClosestPointAccelerator,
    points: &[Point3],
) -> Vec<Option<SurfacePoint>> {
    points
        .par_iter()
        .map(|&p| accelerator.closest_point(p))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn nearest_points(
    accelerator: &dyn ClosestPointAccelerator,
    points: &[Point3],
) -> Vec<Option<SurfacePoint>> {
    points
        .iter()
        .map(|&p| accelerator.closest_point(p))
        .collect()
}

fn interpolate_uv<P: MeshProvider + ?Sized>(
    provider: &P,
    surface: &SurfacePoint,
    uv_set: Option<&str>,
) -> MeshResult<(f64, f64)> {
    let ids = provider.face_triangle(surface.face, surface.triangle)?;
    let corners = [
        provider.vertex_uv(ids[0], uv_set)?,
        provider.vertex_uv(ids[1], uv_set)?,
        provider.vertex_uv(ids[2], uv_set)?,
    ];
    let uv = UvPoint::barycentric(corners, surface.weights());
    Ok((uv.u, uv.v))
}
