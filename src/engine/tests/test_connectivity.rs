use super::{CountingProvider, grid, single_triangle, tetrahedron};
use crate::engine::{CacheEntry, MeshQueryEngine};
use crate::error::MeshQueryError;
use crate::geom::{Point3, SparseError};
use crate::snapshot::MeshSnapshot;

#[test]
fn tetrahedron_adjacency_is_symmetric() {
    let mut engine = MeshQueryEngine::new(tetrahedron());
    let matrix = engine.vert_connectivity_matrix().unwrap();
    assert_eq!(matrix.shape(), (4, 4));
    assert!(matrix.is_symmetric());
    for i in 0..4 {
        for j in 0..4 {
            let expected = i32::from(i != j);
            assert_eq!(matrix.get(i, j), expected, "entry ({i}, {j})");
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
        }
    }
    assert_eq!(matrix.nnz(), 12);
}

#[test]
fn edge_list_matches_provider_order() {
    let mut engine = MeshQueryEngine::new(CountingProvider::new(single_triangle()));
    assert_eq!(engine.edge_vert_list().unwrap(), &[[0, 1], [1, 2], [2, 0]]);
    engine.edge_vert_list().unwrap();
    engine.edge_connectivity_matrix().unwrap();
    assert_eq!(engine.provider().edge_calls.get(), 1);
    assert_eq!(engine.cache_stats().misses(CacheEntry::EdgeVertList), 1);
}

#[test]
fn edge_connectivity_keeps_signed_entries() {
    // row = [0, 1, 1, 2, 2, 0], col = row reversed, data = [1, 1, 1, -1, -1, -1].
    // (0, 0) cancels; (1, 2) and (2, 1) each collect two entries.
    let mut engine = MeshQueryEngine::new(single_triangle());
    let matrix = engine.edge_connectivity_matrix().unwrap();
    assert_eq!(matrix.shape(), (3, 3));
    assert_eq!(matrix.get(1, 2), 2);
    assert_eq!(matrix.get(2, 1), -2);
    assert_eq!(matrix.get(0, 0), 0);
    assert_eq!(matrix.nnz(), 2);
    assert!(!matrix.is_symmetric());
}

#[test]
fn edge_connectivity_rejects_vertex_ids_past_edge_count() {
    let mesh = MeshSnapshot::new(
        "offset",
        vec![Point3::ORIGIN; 5],
        vec![vec![2, 3, 4]],
    )
    .unwrap();
    let mut engine = MeshQueryEngine::new(mesh);
    let err = engine.edge_connectivity_matrix().unwrap_err();
    assert!(matches!(
        err,
        MeshQueryError::Sparse(SparseError::IndexOutOfBounds { rows: 3, cols: 3, .. })
    ));
    assert!(engine.edge_adjacency_matrix().is_ok());
}

#[test]
fn edge_adjacency_links_edges_sharing_a_vertex() {
    let mut engine = MeshQueryEngine::new(tetrahedron());
    let edges = engine.edge_vert_list().unwrap().to_vec();
    let matrix = engine.edge_adjacency_matrix().unwrap();
    assert_eq!(matrix.shape(), (6, 6));
    assert!(matrix.is_symmetric());
    for (i, a) in edges.iter().enumerate() {
        for (j, b) in edges.iter().enumerate() {
            let shares = i != j && a.iter().any(|v| b.contains(v));
            assert_eq!(matrix.get(i, j), i32::from(shares));
        }
    }
    // Each tetrahedron edge touches four others; only the opposite edge is apart.
    assert_eq!(matrix.nnz(), 6 * 4);
}

#[test]
fn neighbours_exclude_the_input_set() {
    let mut engine = MeshQueryEngine::new(grid());
    assert_eq!(engine.get_neighbour_verts(&[4]).unwrap(), vec![1, 3, 5, 7]);
    assert_eq!(engine.get_neighbour_verts(&[0, 1]).unwrap(), vec![2, 3, 4]);
    assert_eq!(engine.get_neighbour_verts(&[]).unwrap(), Vec::<usize>::new());
    assert_eq!(
        engine.get_neighbour_verts(&[9]).unwrap_err(),
        MeshQueryError::VertexOutOfRange { vertex: 9, count: 9 }
    );
}
