//! SAH-based BVH builder.
//!
//! Constructs a flat BVH array from a list of primitives using binned
//! Surface Area Heuristic splits.

use super::bvh::{Aabb, BvhNode, Primitive};

/// Number of SAH bins for split evaluation.
const NUM_BINS: usize = 12;

/// Cost ratio: traversal vs intersection.
const TRAVERSAL_COST: f32 = 1.0;
const INTERSECT_COST: f32 = 1.0;

/// Maximum primitives per leaf before forcing a split.
const MAX_LEAF_SIZE: usize = 4;

/// Built BVH result.
pub struct Bvh {
    /// Flat node array (index 0 = root).
    pub nodes: Vec<BvhNode>,
    /// Reordered primitive indices (leaves reference into this).
    pub prim_indices: Vec<usize>,
}

/// SAH bin for evaluating split candidates.
#[derive(Clone, Copy)]
struct Bin {
    bounds: Aabb,
    count: usize,
}

impl Bin {
    const EMPTY: Self = Self {
        bounds: Aabb::EMPTY,
        count: 0,
    };
}

struct Task {
    node_idx: usize,
    start: usize,
    end: usize, // exclusive
}

/// Build BVH from primitives using SAH.
///
/// Primitives are not modified; leaf ranges index into `prim_indices`,
/// which maps back into the original slice.
#[tracing::instrument(skip_all, fields(prim_count = prims.len()))]
pub fn build_bvh(prims: &[Primitive]) -> Bvh {
    let n = prims.len();
    if n == 0 {
        return Bvh {
            nodes: vec![BvhNode::EMPTY],
            prim_indices: vec![],
        };
    }

    let centroids: Vec<_> = prims.iter().map(Primitive::centroid).collect();
    let aabbs: Vec<_> = prims.iter().map(Primitive::aabb).collect();

    let mut indices: Vec<usize> = (0..n).collect();

    // Worst case: 2n - 1 nodes for a full binary tree
    let mut nodes: Vec<BvhNode> = Vec::with_capacity(2 * n);
    nodes.push(BvhNode::EMPTY);

    // Explicit stack, large scenes would overflow recursion
    let mut stack = vec![Task { node_idx: 0, start: 0, end: n }];

    while let Some(task) = stack.pop() {
        let Task { node_idx, start, end } = task;
        let count = end - start;

        let mut node_aabb = Aabb::EMPTY;
        for &idx in &indices[start..end] {
            node_aabb.grow(&aabbs[idx]);
        }

        let leaf = BvhNode {
            bounds: node_aabb,
            left_or_first: start as u32,
            count: count as u32,
        };

        if count <= MAX_LEAF_SIZE {
            nodes[node_idx] = leaf;
            continue;
        }

        let mut centroid_bounds = Aabb::EMPTY;
        for &idx in &indices[start..end] {
            centroid_bounds.grow_point(centroids[idx]);
        }

        let split = find_best_split(&indices[start..end], &aabbs, &centroids, &centroid_bounds);
        let leaf_cost = count as f32 * INTERSECT_COST * node_aabb.area();

        let Some((axis, split_pos, cost)) = split else {
            nodes[node_idx] = leaf;
            continue;
        };
        if cost >= leaf_cost {
            nodes[node_idx] = leaf;
            continue;
        }

        let mid = partition(&mut indices[start..end], |&idx| centroids[idx][axis] < split_pos) + start;

        // Degenerate partition: split in the middle
        let mid = if mid == start || mid == end { (start + end) / 2 } else { mid };

        let left_idx = nodes.len();
        let right_idx = left_idx + 1;
        nodes.push(BvhNode::EMPTY);
        nodes.push(BvhNode::EMPTY);

        nodes[node_idx] = BvhNode {
            bounds: node_aabb,
            left_or_first: left_idx as u32,
            count: 0,
        };

        // Right first so left is processed first
        stack.push(Task { node_idx: right_idx, start: mid, end });
        stack.push(Task { node_idx: left_idx, start, end: mid });
    }

    tracing::debug!(nodes = nodes.len(), prims = n, "BVH built");

    Bvh {
        nodes,
        prim_indices: indices,
    }
}

/// SAH binned split search across all 3 axes.
/// Returns `(axis, split_position, cost)`, or `None` if every axis is degenerate.
fn find_best_split(
    indices: &[usize],
    aabbs: &[Aabb],
    centroids: &[crate::util::Vec3],
    centroid_bounds: &Aabb,
) -> Option<(usize, f32, f32)> {
    let mut best: Option<(usize, f32, f32)> = None;

    for axis in 0..3 {
        let min = centroid_bounds.min[axis];
        let extent = centroid_bounds.max[axis] - min;
        if extent < 1e-8 {
            continue;
        }

        let mut bins = [Bin::EMPTY; NUM_BINS];
        let inv_extent = NUM_BINS as f32 / extent;

        for &idx in indices {
            let bin_id = (((centroids[idx][axis] - min) * inv_extent) as usize).min(NUM_BINS - 1);
            bins[bin_id].bounds.grow(&aabbs[idx]);
            bins[bin_id].count += 1;
        }

        // Prefix areas and counts from the left
        let mut left_area = [0.0f32; NUM_BINS - 1];
        let mut left_count = [0usize; NUM_BINS - 1];
        let mut sweep = Aabb::EMPTY;
        let mut sweep_count = 0;
        for i in 0..NUM_BINS - 1 {
            sweep.grow(&bins[i].bounds);
            sweep_count += bins[i].count;
            left_area[i] = sweep.area();
            left_count[i] = sweep_count;
        }

        // Sweep from the right and evaluate SAH cost
        sweep = Aabb::EMPTY;
        sweep_count = 0;
        for i in (1..NUM_BINS).rev() {
            sweep.grow(&bins[i].bounds);
            sweep_count += bins[i].count;
            let cost = TRAVERSAL_COST
                + INTERSECT_COST
                    * (left_count[i - 1] as f32 * left_area[i - 1] + sweep_count as f32 * sweep.area());

            if best.map_or(true, |(_, _, best_cost)| cost < best_cost) {
                best = Some((axis, min + (i as f32 / NUM_BINS as f32) * extent, cost));
            }
        }
    }

    best
}

/// Partition slice in-place. Returns count of elements where predicate is true.
fn partition<T, F>(slice: &mut [T], pred: F) -> usize
where
    F: Fn(&T) -> bool,
{
    let mut left = 0;
    let mut right = slice.len();
    while left < right {
        if pred(&slice[left]) {
            left += 1;
        } else {
            right -= 1;
            slice.swap(left, right);
        }
    }
    left
}
