//! Delaunay triangulation of per-vertex UV coordinates with point location.
//!
//! The triangulation itself comes from `delaunator`. Inputs that produce no
//! triangles (all points collinear, or collapsed onto a line within rounding)
//! are retried with a seeded random jitter ("joggle") whose amplitude grows by
//! a factor of ten per attempt. Location never looks at triangulation
//! internals: candidates come from a BVH over simplex bounds and containment is
//! decided by a direct barycentric solve.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::bvh::Bvh;
use super::{BBox, Tolerance, UvPoint};

/// Controls the jitter applied to degenerate triangulation input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoggleOptions {
    /// Seed for the jitter generator; identical seeds give identical output.
    pub seed: u64,
    /// First-attempt amplitude, relative to the larger UV span.
    pub scale: f64,
    /// Number of jittered retries before giving up.
    pub max_attempts: usize,
}

impl Default for JoggleOptions {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            scale: 1e-10,
            max_attempts: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationError {
    #[error("triangulation requires at least 3 points, got {count}")]
    NotEnoughPoints { count: usize },
    #[error("uv coordinate {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("uv points stayed degenerate after {attempts} joggle attempts")]
    Degenerate { attempts: usize },
}

/// The simplex that contains a query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimplexHit {
    pub simplex: usize,
    pub vertices: [usize; 3],
    pub barycentric: [f64; 3],
}

#[derive(Debug, Clone)]
pub struct UvTriangulation {
    points: Vec<UvPoint>,
    /// Coordinates the triangulation was built from; differs from `points`
    /// only when joggling was needed.
    sites: Vec<UvPoint>,
    simplices: Vec<[usize; 3]>,
    joggle_attempts: usize,
    tolerance: Tolerance,
    bvh: Option<Bvh>,
}

impl UvTriangulation {
    pub fn build(
        points: &[UvPoint],
        joggle: JoggleOptions,
        tolerance: Tolerance,
        leaf_size: usize,
    ) -> Result<Self, TriangulationError> {
        if points.len() < 3 {
            return Err(TriangulationError::NotEnoughPoints {
                count: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(TriangulationError::NonFinitePoint { index });
        }

        let mut sites = points.to_vec();
        let mut simplices = delaunay_simplices(&sites);
        let mut joggle_attempts = 0;

        if simplices.is_empty() {
            let extent = uv_extent(points).max(f64::MIN_POSITIVE);
            let mut rng = StdRng::seed_from_u64(joggle.seed);
            let mut amplitude = joggle.scale * extent;

            while simplices.is_empty() && joggle_attempts < joggle.max_attempts {
                joggle_attempts += 1;
                log::debug!(
                    "uv triangulation degenerate, joggle attempt {joggle_attempts} (amplitude {amplitude:e})"
                );
                sites = points
                    .iter()
                    .map(|p| {
                        UvPoint::new(
                            p.u + rng.random_range(-amplitude..=amplitude),
                            p.v + rng.random_range(-amplitude..=amplitude),
                        )
                    })
                    .collect();
                simplices = delaunay_simplices(&sites);
                amplitude *= 10.0;
            }

            if simplices.is_empty() {
                log::warn!(
                    "uv triangulation of {} points failed after {joggle_attempts} joggle attempts",
                    points.len()
                );
                return Err(TriangulationError::Degenerate {
                    attempts: joggle_attempts,
                });
            }
        }

        let bounds: Vec<BBox> = simplices
            .iter()
            .map(|tri| simplex_bbox(&sites, *tri))
            .collect();
        let bvh = Bvh::build_with_leaf_size(&bounds, leaf_size);

        log::debug!(
            "uv triangulation built: {} points, {} simplices",
            points.len(),
            simplices.len()
        );

        Ok(Self {
            points: points.to_vec(),
            sites,
            simplices,
            joggle_attempts,
            tolerance,
            bvh,
        })
    }

    /// The input UV points, indexed by vertex id.
    #[must_use]
    pub fn points(&self) -> &[UvPoint] {
        &self.points
    }

    /// Triangles as vertex-id triples.
    #[must_use]
    pub fn simplices(&self) -> &[[usize; 3]] {
        &self.simplices
    }

    /// Number of jittered retries that were needed (0 for well-posed input).
    #[must_use]
    pub const fn joggle_attempts(&self) -> usize {
        self.joggle_attempts
    }

    #[must_use]
    pub const fn is_joggled(&self) -> bool {
        self.joggle_attempts > 0
    }

    /// Index of the simplex containing `uv`, or `None` outside the hull.
    #[must_use]
    pub fn find_simplex(&self, uv: UvPoint) -> Option<usize> {
        self.locate(uv).map(|hit| hit.simplex)
    }

    /// Locates `uv` and returns the containing simplex with barycentric weights.
    ///
    /// On a shared edge the simplex with the largest minimum weight wins;
    /// exact ties go to the lower simplex index.
    #[must_use]
    pub fn locate(&self, uv: UvPoint) -> Option<SimplexHit> {
        if !uv.is_finite() {
            return None;
        }
        let bvh = self.bvh.as_ref()?;
        let eps = self.tolerance.eps;
        let probe = BBox::new(uv.to_point3(), uv.to_point3()).expand_by(eps);

        let mut best: Option<(f64, SimplexHit)> = None;
        bvh.query_bbox(probe, |simplex| {
            let vertices = self.simplices[simplex];
            let corners = vertices.map(|v| self.sites[v]);
            let Some(weights) = barycentric_2d(uv, corners) else {
                return true;
            };
            let min_weight = weights.iter().copied().fold(f64::INFINITY, f64::min);
            if min_weight < -eps {
                return true;
            }
            let better = match best {
                None => true,
                Some((score, hit)) => {
                    min_weight > score || (min_weight == score && simplex < hit.simplex)
                }
            };
            if better {
                best = Some((
                    min_weight,
                    SimplexHit {
                        simplex,
                        vertices,
                        barycentric: weights,
                    },
                ));
            }
            true
        });

        best.map(|(_, hit)| hit)
    }
}

/// Barycentric weights of `p` with respect to triangle `[a, b, c]`.
///
/// Solves `p - a = s·(b - a) + t·(c - a)` and returns `[1 - s - t, s, t]`.
/// `None` when the triangle has no area.
#[must_use]
pub fn barycentric_2d(p: UvPoint, [a, b, c]: [UvPoint; 3]) -> Option<[f64; 3]> {
    let (e0u, e0v) = (b.u - a.u, b.v - a.v);
    let (e1u, e1v) = (c.u - a.u, c.v - a.v);
    let (du, dv) = (p.u - a.u, p.v - a.v);

    let det = e0u * e1v - e1u * e0v;
    if det == 0.0 || !det.is_finite() {
        return None;
    }

    let s = (du * e1v - e1u * dv) / det;
    let t = (e0u * dv - du * e0v) / det;
    Some([1.0 - s - t, s, t])
}

fn delaunay_simplices(sites: &[UvPoint]) -> Vec<[usize; 3]> {
    let input: Vec<delaunator::Point> = sites
        .iter()
        .map(|p| delaunator::Point { x: p.u, y: p.v })
        .collect();
    delaunator::triangulate(&input)
        .triangles
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .collect()
}

fn simplex_bbox(sites: &[UvPoint], [a, b, c]: [usize; 3]) -> BBox {
    BBox::new(sites[a].to_point3(), sites[a].to_point3())
        .expand_point(sites[b].to_point3())
        .expand_point(sites[c].to_point3())
}

fn uv_extent(points: &[UvPoint]) -> f64 {
    let mut min = UvPoint::new(f64::INFINITY, f64::INFINITY);
    let mut max = UvPoint::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min = UvPoint::new(min.u.min(p.u), min.v.min(p.v));
        max = UvPoint::new(max.u.max(p.u), max.v.max(p.v));
    }
    (max.u - min.u).max(max.v - min.v)
}
