//! Median-split bounding-volume hierarchy over primitive bounds.
//!
//! Used for two lookups: locating the UV simplex under a query point (box
//! query with a degenerate box) and finding the surface triangle nearest to a
//! 3D point (best-first descent).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{BBox, Point3};

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: BBox,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl BvhNode {
    const fn leaf(bbox: BBox, start: u32, count: u32) -> Self {
        Self {
            bbox,
            left: u32::MAX,
            right: u32::MAX,
            start,
            count,
        }
    }

    const fn inner(bbox: BBox, left: u32, right: u32) -> Self {
        Self {
            bbox,
            left,
            right,
            start: 0,
            count: 0,
        }
    }

    const fn is_leaf(self) -> bool {
        self.count != 0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<u32>,
}

impl Bvh {
    pub(crate) const DEFAULT_LEAF_SIZE: usize = 8;

    /// Builds the hierarchy; `None` when there are no primitives.
    #[must_use]
    pub(crate) fn build_with_leaf_size(bboxes: &[BBox], leaf_size: usize) -> Option<Self> {
        if bboxes.is_empty() {
            return None;
        }

        let leaf_size = leaf_size.clamp(1, 256);
        let prim_indices: Vec<u32> = (0..bboxes.len() as u32).collect();
        let nodes = Vec::with_capacity(bboxes.len().saturating_mul(2));

        let mut bvh = Self { nodes, prim_indices };
        bvh.build_node(bboxes, 0, bboxes.len(), leaf_size);
        Some(bvh)
    }

    fn build_node(&mut self, bboxes: &[BBox], start: usize, end: usize, leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let bbox = self.range_bbox(bboxes, start, end);
        self.nodes.push(BvhNode::leaf(bbox, start as u32, (end - start) as u32));

        let count = end - start;
        if count <= leaf_size {
            return node_index;
        }

        let axis = self.choose_split_axis(bboxes, start, end);
        let mid = start + count / 2;
        self.prim_indices[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = centroid_component(bboxes[*a as usize], axis);
            let cb = centroid_component(bboxes[*b as usize], axis);
            ca.total_cmp(&cb)
        });

        let left = self.build_node(bboxes, start, mid, leaf_size);
        let right = self.build_node(bboxes, mid, end, leaf_size);
        self.nodes[node_index as usize] = BvhNode::inner(bbox, left, right);
        node_index
    }

    fn range_bbox(&self, bboxes: &[BBox], start: usize, end: usize) -> BBox {
        self.prim_indices[start + 1..end]
            .iter()
            .fold(bboxes[self.prim_indices[start] as usize], |acc, &idx| {
                acc.union(bboxes[idx as usize])
            })
    }

    fn choose_split_axis(&self, bboxes: &[BBox], start: usize, end: usize) -> u8 {
        let first = bboxes[self.prim_indices[start] as usize].center();
        let spread = self.prim_indices[start + 1..end]
            .iter()
            .fold(BBox::new(first, first), |acc, &idx| {
                acc.expand_point(bboxes[idx as usize].center())
            })
            .size();

        if spread.x >= spread.y && spread.x >= spread.z {
            0
        } else if spread.y >= spread.z {
            1
        } else {
            2
        }
    }

    /// Visits every primitive whose leaf box overlaps `query`.
    ///
    /// The visitor returns `false` to stop the traversal early.
    pub(crate) fn query_bbox<F>(&self, query: BBox, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        let mut stack = vec![0u32];

        while let Some(node_idx) = stack.pop() {
            let node = self.nodes[node_idx as usize];
            if !node.bbox.intersects(query) {
                continue;
            }

            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    if !visit(prim as usize) {
                        return;
                    }
                }
                continue;
            }

            stack.push(node.left);
            stack.push(node.right);
        }
    }

    /// Best-first search for the primitive minimising `distance_to_prim`.
    ///
    /// `distance_to_prim` must return a squared distance that is never smaller
    /// than the squared distance from `point` to the primitive's box.
    pub(crate) fn nearest<F>(&self, point: Point3, mut distance_to_prim: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut best_dist2 = f64::INFINITY;
        let mut best_prim: Option<usize> = None;

        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist2: self.nodes[0].bbox.distance_squared_to_point(point),
            node: 0u32,
        });

        while let Some(entry) = heap.pop() {
            if entry.dist2 > best_dist2 {
                break;
            }

            let node = self.nodes[entry.node as usize];
            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    let prim_idx = prim as usize;
                    let Some(d2) = distance_to_prim(prim_idx) else {
                        continue;
                    };
                    // Ties keep the lowest primitive index so results do not
                    // depend on traversal order.
                    let better = d2 < best_dist2
                        || (d2 == best_dist2 && best_prim.is_some_and(|b| prim_idx < b));
                    if d2.is_finite() && better {
                        best_dist2 = d2;
                        best_prim = Some(prim_idx);
                    }
                }
                continue;
            }

            for child in [node.left, node.right] {
                let dist2 = self.nodes[child as usize]
                    .bbox
                    .distance_squared_to_point(point);
                if dist2 <= best_dist2 {
                    heap.push(HeapEntry { dist2, node: child });
                }
            }
        }

        best_prim.map(|idx| (idx, best_dist2))
    }
}

fn centroid_component(bbox: BBox, axis: u8) -> f64 {
    let c = bbox.center();
    match axis {
        0 => c.x,
        1 => c.y,
        _ => c.z,
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist2: f64,
    node: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the closest node first.
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| other.node.cmp(&self.node))
    }
}
