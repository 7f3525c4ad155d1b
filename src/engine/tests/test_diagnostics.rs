use super::{tetrahedron, two_islands, unit_square};
use crate::engine::{MeshQueryEngine, QueryOptions};
use crate::geom::{Point3, Tolerance};
use crate::provider::Space;
use crate::snapshot::MeshSnapshot;

#[test]
fn tetrahedron_is_clean() {
    let mut engine = MeshQueryEngine::new(tetrahedron());
    let report = engine.diagnostics().unwrap();
    assert_eq!(report.vertex_count, 4);
    assert_eq!(report.edge_count, 6);
    assert_eq!(report.face_count, 4);
    assert_eq!(report.triangle_count, 4);
    assert!(report.is_watertight());
    assert!(report.is_manifold());
    assert!(report.is_clean(), "{report}");
    assert_eq!(engine.positions_space(), Some(Space::Object));
}

#[test]
fn open_square_reports_boundary_edges() {
    let mut engine = MeshQueryEngine::new(unit_square());
    let report = engine.diagnostics().unwrap();
    // The fan diagonal is shared by both triangles; the four sides are open.
    assert_eq!(report.open_edge_count, 4);
    assert!(!report.is_watertight());
    assert!(report.is_manifold());
    assert_eq!(report.warnings, vec!["mesh has open edges".to_owned()]);
}

#[test]
fn keeps_positions_already_fetched() {
    let mut engine = MeshQueryEngine::new(two_islands());
    engine.points(Space::World).unwrap();
    engine.diagnostics().unwrap();
    assert_eq!(engine.positions_space(), Some(Space::World));
}

#[test]
fn counts_degenerate_and_isolated_elements() {
    let mesh = MeshSnapshot::new(
        "messy",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(9.0, 9.0, 9.0),
        ],
        vec![vec![0, 1, 2], vec![0, 1, 3]],
    )
    .unwrap();
    let mut engine = MeshQueryEngine::new(mesh);
    let report = engine.diagnostics().unwrap();
    assert_eq!(report.degenerate_triangle_count, 1);
    assert_eq!(report.isolated_vertex_count, 1);
    assert!(!report.is_clean());
    assert!(report.summary().contains("degenerate:1"));
    assert!(report.summary().contains("isolated:1"));
}

#[test]
fn non_manifold_fin_is_detected() {
    let mesh = MeshSnapshot::new(
        "fin",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]],
    )
    .unwrap();
    let mut engine = MeshQueryEngine::new(mesh);
    let report = engine.diagnostics().unwrap();
    assert_eq!(report.non_manifold_edge_count, 1);
    assert!(!report.is_manifold());
    assert!(report.to_string().contains("Non-manifold edges: 1"));
}

#[test]
fn degenerate_threshold_follows_the_tolerance() {
    // Sliver with area 5e-7.
    let sliver = || {
        MeshSnapshot::new(
            "sliver",
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1e-6, 0.0),
            ],
            vec![vec![0, 1, 2]],
        )
        .unwrap()
    };

    let mut strict = MeshQueryEngine::new(sliver());
    assert_eq!(strict.diagnostics().unwrap().degenerate_triangle_count, 0);

    let options = QueryOptions::default().with_tolerance(Tolerance::new(1e-6));
    let mut loose = MeshQueryEngine::with_options(sliver(), options);
    assert_eq!(loose.diagnostics().unwrap().degenerate_triangle_count, 1);
}
