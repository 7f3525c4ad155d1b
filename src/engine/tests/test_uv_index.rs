use super::{CountingProvider, unit_square};
use crate::engine::{CacheEntry, MeshQueryEngine, QueryOptions, UdimTile};
use crate::error::MeshQueryError;
use crate::geom::{Point3, Transform, UvPoint, Vec3};
use crate::snapshot::MeshSnapshot;

fn shifted_square(du: f64, dv: f64) -> MeshSnapshot {
    let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
        .into_iter()
        .map(|(u, v)| UvPoint::new(u + du, v + dv))
        .collect();
    unit_square().with_uv_set("shifted", uvs).unwrap()
}

#[test]
fn center_of_square_maps_to_center_point() {
    let mut engine = MeshQueryEngine::new(unit_square());
    let hit = engine.get_closest_at_uv(0.5, 0.5, None).unwrap().unwrap();
    assert!((hit.point.x - 0.5).abs() < 1e-6);
    assert!((hit.point.y - 0.5).abs() < 1e-6);
    assert!(hit.point.z.abs() < 1e-12);
    assert!((hit.barycentric.iter().sum::<f64>() - 1.0).abs() < 1e-6);
}

#[test]
fn barycentric_weights_sum_to_one_across_the_domain() {
    let mut engine = MeshQueryEngine::new(unit_square());
    for i in 0..=10 {
        for j in 0..=10 {
            let (u, v) = (f64::from(i) / 10.0, f64::from(j) / 10.0);
            let hit = engine
                .get_closest_at_uv(u, v, Some("map1"))
                .unwrap()
                .unwrap_or_else(|| panic!("({u}, {v}) should be inside the square"));
            assert!((hit.barycentric.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            assert!((hit.point.x - u).abs() < 1e-9 && (hit.point.y - v).abs() < 1e-9);
        }
    }
}

#[test]
fn outside_the_hull_is_an_empty_result() {
    let mut engine = MeshQueryEngine::new(unit_square());
    assert_eq!(engine.get_closest_at_uv(-1.0, -1.0, None).unwrap(), None);
    assert_eq!(engine.get_closest_at_uv(1.5, 0.5, None).unwrap(), None);
    assert_eq!(engine.get_closest_at_uv(f64::NAN, 0.5, None).unwrap(), None);
}

#[test]
fn interpolates_world_positions() {
    let mesh = unit_square().with_world_transform(Transform::translate(Vec3::new(0.0, 0.0, 2.0)));
    let mut engine = MeshQueryEngine::new(mesh);
    let hit = engine.get_closest_at_uv(0.25, 0.75, None).unwrap().unwrap();
    assert!((hit.point.z - 2.0).abs() < 1e-12);
    assert!(engine.positions().is_none());
}

#[test]
fn unknown_uv_set_is_reported() {
    let mut engine = MeshQueryEngine::new(unit_square());
    assert_eq!(
        engine.get_closest_at_uv(0.5, 0.5, Some("nope")).unwrap_err(),
        MeshQueryError::UvSetNotFound("nope".into())
    );
}

#[test]
fn uvs_and_triangulations_are_cached_per_set() {
    let mut engine = MeshQueryEngine::new(CountingProvider::new(shifted_square(3.0, 0.0)));
    engine.get_closest_at_uv(0.5, 0.5, Some("map1")).unwrap();
    engine.get_closest_at_uv(0.2, 0.5, Some("map1")).unwrap();
    let shifted = engine.get_closest_at_uv(3.5, 0.5, Some("shifted")).unwrap().unwrap();
    assert!((shifted.point.x - 0.5).abs() < 1e-9);

    assert_eq!(engine.provider().uv_calls.get(), 2);
    let stats = engine.cache_stats();
    assert_eq!(stats.misses(CacheEntry::VertUvs), 2);
    assert_eq!(stats.misses(CacheEntry::UvTriangulation), 2);
    assert_eq!(stats.hits(CacheEntry::UvTriangulation), 1);

    engine.clear_cache();
    engine.get_vert_uvs(Some("map1")).unwrap();
    assert_eq!(engine.provider().uv_calls.get(), 3);
}

#[test]
fn uv_bounds_cover_all_vertices() {
    let mut engine = MeshQueryEngine::new(shifted_square(2.0, -1.0));
    let bounds = engine.uv_bounds(Some("shifted")).unwrap();
    assert_eq!(bounds.min_u, 2.0);
    assert_eq!(bounds.max_u, 3.0);
    assert_eq!(engine.min_v(Some("shifted")).unwrap(), -1.0);
    assert_eq!(engine.max_v(Some("shifted")).unwrap(), 0.0);
    assert_eq!(engine.min_u(None).unwrap(), 0.0);
    assert_eq!(engine.max_u(None).unwrap(), 1.0);
}

#[test]
fn udim_tile_includes_its_upper_boundary() {
    let mut engine = MeshQueryEngine::new(shifted_square(1.0, 0.0));
    let first = engine.get_uv_udim(None).unwrap().unwrap();
    assert_eq!(first, UdimTile { u: 0, v: 0 });
    assert_eq!(first.number(), 1001);

    let second = engine.get_uv_udim(Some("shifted")).unwrap().unwrap();
    assert_eq!(second, UdimTile { u: 1, v: 0 });
    assert_eq!(second.number(), 1002);
}

#[test]
fn udim_spanning_tiles_is_none() {
    let mut engine = MeshQueryEngine::new(shifted_square(0.5, 0.0));
    assert_eq!(engine.get_uv_udim(Some("shifted")).unwrap(), None);

    let mut engine = MeshQueryEngine::new(shifted_square(0.0, 0.5));
    assert_eq!(engine.get_uv_udim(Some("shifted")).unwrap(), None);
}

#[test]
fn collinear_uvs_are_joggled() {
    let mesh = MeshSnapshot::new(
        "strip",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2]],
    )
    .and_then(|mesh| {
        mesh.with_uv_set(
            "line",
            vec![
                UvPoint::new(0.0, 0.0),
                UvPoint::new(0.5, 0.0),
                UvPoint::new(1.0, 0.0),
            ],
        )
    })
    .unwrap();
    let mut engine = MeshQueryEngine::new(mesh);
    let triangulation = engine.uv_triangulation(None).unwrap();
    assert!(triangulation.is_joggled());
    assert_eq!(triangulation.simplices().len(), 1);
    assert_eq!(triangulation.points()[1], UvPoint::new(0.5, 0.0));
}

#[test]
fn exhausted_joggle_surfaces_as_triangulation_error() {
    let mesh = MeshSnapshot::new("dot", vec![Point3::ORIGIN; 3], vec![vec![0, 1, 2]])
        .and_then(|mesh| mesh.with_uv_set("map1", vec![UvPoint::new(0.5, 0.5); 3]))
        .unwrap();
    let mut options = QueryOptions::default();
    options.joggle.max_attempts = 0;
    let mut engine = MeshQueryEngine::with_options(mesh, options);
    assert!(matches!(
        engine.get_closest_at_uv(0.5, 0.5, None),
        Err(MeshQueryError::Triangulation(_))
    ));
}
