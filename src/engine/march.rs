//! Breadth-first vertex rings.

use super::MeshQueryEngine;
use super::connectivity::neighbour_verts;
use crate::error::{MeshQueryError, MeshResult};
use crate::geom::TimingBucket;
use crate::provider::MeshProvider;

impl<P: MeshProvider> MeshQueryEngine<P> {
    /// Marches outward from `seeds` one edge ring at a time.
    ///
    /// Ring 0 is the seed list with duplicates removed (first occurrence
    /// kept). Every later ring is the sorted set of unvisited neighbours of
    /// the ring before it. Stops once every vertex is visited or the frontier
    /// runs dry, so a disconnected mesh yields partial coverage. Empty seeds
    /// give no rings.
    pub fn march_vert_array(&mut self, seeds: &[usize]) -> MeshResult<Vec<Vec<usize>>> {
        let provider = &self.provider;
        self.metrics
            .time(TimingBucket::Marching, || march(provider, seeds))
    }

    /// Ring index at which the march from `seeds` reached each vertex, or
    /// `None` for vertices it never reached.
    pub fn vertex_ring_indices(&mut self, seeds: &[usize]) -> MeshResult<Vec<Option<usize>>> {
        let rings = self.march_vert_array(seeds)?;
        let mut indices = vec![None; self.provider.num_vertices()];
        for (ring_index, ring) in rings.iter().enumerate() {
            for &vertex in ring {
                indices[vertex] = Some(ring_index);
            }
        }
        Ok(indices)
    }
}

fn march<P: MeshProvider + ?Sized>(provider: &P, seeds: &[usize]) -> MeshResult<Vec<Vec<usize>>> {
    let total = provider.num_vertices();
    let mut visited = vec![false; total];
    let mut first_ring = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        let slot = visited
            .get_mut(seed)
            .ok_or(MeshQueryError::VertexOutOfRange {
                vertex: seed,
                count: total,
            })?;
        if !*slot {
            *slot = true;
            first_ring.push(seed);
        }
    }
    if first_ring.is_empty() {
        return Ok(Vec::new());
    }

    let mut visited_count = first_ring.len();
    let mut rings = vec![first_ring];
    while visited_count < total {
        let Some(frontier) = rings.last() else {
            break;
        };
        let next: Vec<usize> = neighbour_verts(provider, frontier)?
            .into_iter()
            .filter(|&v| visited.get(v) == Some(&false))
            .collect();
        if next.is_empty() {
            log::debug!(
                "march stopped after {} rings with {visited_count}/{total} vertices reached",
                rings.len()
            );
            break;
        }
        for &v in &next {
            visited[v] = true;
        }
        visited_count += next.len();
        rings.push(next);
    }
    Ok(rings)
}
