//! Edge lists, sparse connectivity matrices and one-ring neighbourhoods.

use std::collections::{BTreeSet, HashSet};

use super::{CacheEntry, MeshQueryEngine, missing};
use crate::error::{MeshQueryError, MeshResult};
use crate::geom::{SparseMatrix, TimingBucket};
use crate::provider::MeshProvider;

impl<P: MeshProvider> MeshQueryEngine<P> {
    /// The two vertex ids of every edge, in provider order.
    pub fn edge_vert_list(&mut self) -> MeshResult<&[[usize; 2]]> {
        let provider = &self.provider;
        let metrics = &mut self.metrics;
        self.cache
            .edge_vert_list
            .get_or_try_init(self.cache.counters.entry(CacheEntry::EdgeVertList), || {
                let edges =
                    metrics.time(TimingBucket::Connectivity, || provider.edge_vertices())?;
                log::debug!("fetched {} edges of `{}`", edges.len(), provider.name());
                Ok(edges)
            })
            .map(Vec::as_slice)
    }

    /// Signed `numEdges × numEdges` matrix over the flattened edge-vertex list.
    ///
    /// Row indices are the flattened `[a0, b0, a1, b1, ...]` vertex ids, column
    /// indices the same list reversed, and the data is `+1` for the first
    /// `numEdges` triplets and `-1` for the rest. Coinciding triplets are
    /// summed. Vertex ids are used directly as edge indices, so a mesh with a
    /// vertex id `>= numEdges` fails with [`MeshQueryError::Sparse`].
    ///
    /// See [`edge_adjacency_matrix`](Self::edge_adjacency_matrix) for plain
    /// edge-to-edge adjacency.
    pub fn edge_connectivity_matrix(&mut self) -> MeshResult<&SparseMatrix> {
        if !self.cache.edge_connectivity.is_computed() {
            self.edge_vert_list()?;
        }
        let edges = &self.cache.edge_vert_list;
        let metrics = &mut self.metrics;
        self.cache.edge_connectivity.get_or_try_init(
            self.cache.counters.entry(CacheEntry::EdgeConnectivity),
            || {
                let edges = edges
                    .get()
                    .ok_or_else(|| missing("edge_connectivity_matrix", "edge_vert_list"))?;
                metrics.time(TimingBucket::Connectivity, || signed_edge_matrix(edges))
            },
        )
    }

    /// Symmetric edge adjacency: `(i, j) = 1` when edges `i != j` share a vertex.
    pub fn edge_adjacency_matrix(&mut self) -> MeshResult<&SparseMatrix> {
        if !self.cache.edge_adjacency.is_computed() {
            self.edge_vert_list()?;
        }
        let edges = &self.cache.edge_vert_list;
        let vertex_count = self.provider.num_vertices();
        let metrics = &mut self.metrics;
        self.cache.edge_adjacency.get_or_try_init(
            self.cache.counters.entry(CacheEntry::EdgeAdjacency),
            || {
                let edges = edges
                    .get()
                    .ok_or_else(|| missing("edge_adjacency_matrix", "edge_vert_list"))?;
                metrics.time(TimingBucket::Connectivity, || {
                    edge_adjacency(edges, vertex_count)
                })
            },
        )
    }

    /// `numVerts × numVerts` matrix with a 1 for every pair of vertices joined
    /// by an edge.
    pub fn vert_connectivity_matrix(&mut self) -> MeshResult<&SparseMatrix> {
        let provider = &self.provider;
        let metrics = &mut self.metrics;
        self.cache.vert_connectivity.get_or_try_init(
            self.cache.counters.entry(CacheEntry::VertConnectivity),
            || {
                metrics.time(TimingBucket::Connectivity, || {
                    let count = provider.num_vertices();
                    let mut triplets = Vec::new();
                    for vertex in 0..count {
                        let ring: BTreeSet<usize> =
                            provider.connected_vertices(vertex)?.into_iter().collect();
                        triplets.extend(ring.into_iter().map(|other| (vertex, other, 1)));
                    }
                    Ok(SparseMatrix::from_triplets((count, count), triplets)?)
                })
            },
        )
    }

    /// Vertices one edge away from any of `vertex_ids`, excluding the inputs
    /// themselves. Sorted ascending.
    pub fn get_neighbour_verts(&mut self, vertex_ids: &[usize]) -> MeshResult<Vec<usize>> {
        let provider = &self.provider;
        self.metrics.time(TimingBucket::Connectivity, || {
            neighbour_verts(provider, vertex_ids)
        })
    }
}

pub(super) fn neighbour_verts<P: MeshProvider + ?Sized>(
    provider: &P,
    vertex_ids: &[usize],
) -> MeshResult<Vec<usize>> {
    let count = provider.num_vertices();
    if let Some(&vertex) = vertex_ids.iter().find(|&&v| v >= count) {
        return Err(MeshQueryError::VertexOutOfRange { vertex, count });
    }
    let inputs: HashSet<usize> = vertex_ids.iter().copied().collect();
    let mut neighbours = BTreeSet::new();
    for &vertex in &inputs {
        neighbours.extend(
            provider
                .connected_vertices(vertex)?
                .into_iter()
                .filter(|n| !inputs.contains(n)),
        );
    }
    Ok(neighbours.into_iter().collect())
}

fn signed_edge_matrix(edges: &[[usize; 2]]) -> MeshResult<SparseMatrix> {
    let edge_count = edges.len();
    let row: Vec<usize> = edges.iter().flatten().copied().collect();
    let col: Vec<usize> = row.iter().rev().copied().collect();
    let data: Vec<i32> = std::iter::repeat_n(1, edge_count)
        .chain(std::iter::repeat_n(-1, edge_count))
        .collect();
    Ok(SparseMatrix::from_coo(
        (edge_count, edge_count),
        &row,
        &col,
        &data,
    )?)
}

fn edge_adjacency(edges: &[[usize; 2]], vertex_count: usize) -> MeshResult<SparseMatrix> {
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    for (edge, &[a, b]) in edges.iter().enumerate() {
        for vertex in [a, b] {
            incident
                .get_mut(vertex)
                .ok_or(MeshQueryError::VertexOutOfRange {
                    vertex,
                    count: vertex_count,
                })?
                .push(edge);
        }
    }

    let mut pairs = BTreeSet::new();
    for around in &incident {
        for &i in around {
            for &j in around {
                if i != j {
                    pairs.insert((i, j));
                }
            }
        }
    }
    let triplets = pairs.into_iter().map(|(i, j)| (i, j, 1)).collect();
    Ok(SparseMatrix::from_triplets(
        (edges.len(), edges.len()),
        triplets,
    )?)
}
