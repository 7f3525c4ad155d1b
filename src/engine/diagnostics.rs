//! Topology and quality report for the mesh behind an engine.
//!
//! The query methods never reject bad input: degenerate triangles turn into
//! NaN normals and open or non-manifold edges are simply walked. This report
//! makes those conditions visible after the fact.
//!
//! ```ignore
//! let report = engine.diagnostics()?;
//! if !report.is_watertight() {
//!     eprintln!("{} open edges", report.open_edge_count);
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::{MeshQueryEngine, missing};
use crate::error::MeshResult;
use crate::geom::TimingBucket;
use crate::provider::{MeshProvider, Space};

/// Counts of topology and quality issues.
///
/// # Topology
///
/// - `open_edge_count`: triangle edges used by exactly one triangle
/// - `non_manifold_edge_count`: triangle edges used by more than two
///
/// # Quality
///
/// - `degenerate_triangle_count`: triangles whose area is within tolerance of zero
/// - `isolated_vertex_count`: vertices no triangle references
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MeshDiagnostics {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
    pub triangle_count: usize,
    pub open_edge_count: usize,
    pub non_manifold_edge_count: usize,
    pub degenerate_triangle_count: usize,
    pub isolated_vertex_count: usize,
    /// Human-readable notes, e.g. "mesh has open edges".
    pub warnings: Vec<String>,
}

impl MeshDiagnostics {
    /// No open edges.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    /// At most two triangles per edge.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Watertight, manifold, free of degenerate triangles and isolated
    /// vertices, with no warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.is_watertight()
            && self.is_manifold()
            && self.degenerate_triangle_count == 0
            && self.isolated_vertex_count == 0
            && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// One-line form: `"V:{vertices} E:{edges} F:{faces} T:{triangles} [issues...]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "V:{} E:{} F:{} T:{}",
            self.vertex_count, self.edge_count, self.face_count, self.triangle_count
        )];
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.isolated_vertex_count > 0 {
            parts.push(format!("isolated:{}", self.isolated_vertex_count));
        }
        parts.join(" ")
    }
}

impl fmt::Display for MeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if self.open_edge_count > 0 || self.non_manifold_edge_count > 0 {
            writeln!(f, "  Topology issues:")?;
            if self.open_edge_count > 0 {
                writeln!(f, "    - Open edges: {}", self.open_edge_count)?;
            }
            if self.non_manifold_edge_count > 0 {
                writeln!(f, "    - Non-manifold edges: {}", self.non_manifold_edge_count)?;
            }
        }

        if self.degenerate_triangle_count > 0 || self.isolated_vertex_count > 0 {
            writeln!(f, "  Quality issues:")?;
            if self.degenerate_triangle_count > 0 {
                writeln!(f, "    - Degenerate triangles: {}", self.degenerate_triangle_count)?;
            }
            if self.isolated_vertex_count > 0 {
                writeln!(f, "    - Isolated vertices: {}", self.isolated_vertex_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        let status = if self.is_clean() {
            "CLEAN"
        } else if self.is_watertight() && self.is_manifold() {
            "VALID (with quality issues)"
        } else {
            "ISSUES DETECTED"
        };
        writeln!(f, "  Status: {status}")
    }
}

impl<P: MeshProvider> MeshQueryEngine<P> {
    /// Scans the triangulation for open, non-manifold and degenerate
    /// elements. Fetches object-space positions first if none are cached.
    pub fn diagnostics(&mut self) -> MeshResult<MeshDiagnostics> {
        if self.positions().is_none() {
            self.points(Space::Object)?;
        }
        self.triangle_points()?;

        let tolerance = self.options.tolerance;
        let vertex_count = self.provider.num_vertices();
        let mut report = MeshDiagnostics {
            vertex_count,
            edge_count: self.provider.num_edges(),
            face_count: self.provider.num_faces(),
            ..MeshDiagnostics::default()
        };

        let verts = self
            .cache
            .triangle_verts
            .get()
            .ok_or_else(|| missing("diagnostics", "triangle_verts"))?;
        let corners = self
            .cache
            .triangle_points
            .get()
            .ok_or_else(|| missing("diagnostics", "triangle_points"))?;

        self.metrics.time(TimingBucket::Diagnostics, || {
            report.triangle_count = verts.len();

            let mut edge_uses: HashMap<(usize, usize), usize> = HashMap::new();
            let mut referenced = vec![false; vertex_count];
            for ids in verts {
                for i in 0..3 {
                    let (a, b) = (ids[i], ids[(i + 1) % 3]);
                    *edge_uses.entry((a.min(b), a.max(b))).or_default() += 1;
                    if let Some(flag) = referenced.get_mut(ids[i]) {
                        *flag = true;
                    }
                }
            }
            report.open_edge_count = edge_uses.values().filter(|&&n| n == 1).count();
            report.non_manifold_edge_count = edge_uses.values().filter(|&&n| n > 2).count();
            report.isolated_vertex_count = referenced.iter().filter(|&&used| !used).count();
            report.degenerate_triangle_count = corners
                .iter()
                .filter(|&&[a, b, c]| {
                    let area = 0.5 * (b - a).cross(c - a).length();
                    !area.is_finite() || tolerance.approx_zero_f64(area)
                })
                .count();
        });

        if report.open_edge_count > 0 {
            report.add_warning("mesh has open edges");
        }
        if report.non_manifold_edge_count > 0 {
            report.add_warning("mesh has non-manifold edges");
        }
        if report.degenerate_triangle_count > 0 {
            report.add_warning("degenerate triangles produce NaN normals");
        }
        log::debug!("diagnostics for `{}`: {}", self.provider.name(), report.summary());
        Ok(report)
    }
}
