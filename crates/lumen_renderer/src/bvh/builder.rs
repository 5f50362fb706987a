//! Top-down BVH construction with binned SAH splits.
//!
//! Builds an owned intermediate tree (`BuildNode`), then serializes it
//! depth-first into the flat node array. The intermediate tree is dropped
//! as soon as flattening is done.

use std::time::Instant;

use lumen_core::Triangle;
use lumen_math::{Aabb, Vec3};

use super::{Bvh, BvhNode};
use crate::{RenderError, RenderResult};

/// Number of equal-width buckets along the split axis.
const BUCKET_COUNT: usize = 12;

/// Ranges at most this large may become a leaf when splitting doesn't pay off.
const MAX_TRIANGLES_IN_LEAF: usize = 4;

/// Past this depth ranges are split at the median. Median splits add at most
/// log2(N) <= 32 levels, keeping every leaf within the traversal stack.
const MAX_SAH_DEPTH: usize = 32;

/// Per-triangle data the builder sorts instead of the triangles themselves.
#[derive(Debug, Clone, Copy)]
struct TriangleInfo {
    index: usize,
    bounds: Aabb,
    centroid: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: usize,
    bounds: Aabb,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Aabb::EMPTY,
        }
    }
}

/// Intermediate tree node; children are owned and freed with the root.
enum BuildNode {
    Leaf {
        bounds: Aabb,
        first: u32,
        count: u32,
    },
    Interior {
        bounds: Aabb,
        axis: usize,
        children: Box<[BuildNode; 2]>,
    },
}

impl BuildNode {
    fn bounds(&self) -> &Aabb {
        match self {
            BuildNode::Leaf { bounds, .. } => bounds,
            BuildNode::Interior { bounds, .. } => bounds,
        }
    }
}

struct BvhBuilder<'a> {
    triangles: &'a [Triangle],
    info: Vec<TriangleInfo>,
    ordered: Vec<Triangle>,
    node_count: usize,
}

impl Bvh {
    /// Build a BVH over `triangles`.
    ///
    /// The input order is not preserved: `Bvh::triangles` returns them
    /// reordered so that every leaf covers a contiguous range.
    pub fn build(triangles: &[Triangle]) -> RenderResult<Bvh> {
        if triangles.is_empty() {
            return Err(RenderError::EmptyScene);
        }
        if u32::try_from(triangles.len()).is_err() {
            return Err(RenderError::TooManyTriangles(triangles.len()));
        }

        let start = Instant::now();
        let mut builder = BvhBuilder::new(triangles);
        let root = builder.subdivide(0, triangles.len(), 0);

        let mut nodes = Vec::with_capacity(builder.node_count);
        flatten(&root, &mut nodes);
        drop(root);

        let bvh = Bvh {
            nodes,
            triangles: builder.ordered,
        };

        let stats = bvh.stats();
        log::info!(
            "Built BVH over {} triangles: {} nodes, {} leaves, depth {}, largest leaf {} ({:.2?})",
            triangles.len(),
            stats.node_count,
            stats.leaf_count,
            stats.max_depth,
            stats.max_leaf_size,
            start.elapsed()
        );

        Ok(bvh)
    }
}

impl<'a> BvhBuilder<'a> {
    fn new(triangles: &'a [Triangle]) -> Self {
        let info = triangles
            .iter()
            .enumerate()
            .map(|(index, triangle)| {
                let bounds = triangle.bounds();
                TriangleInfo {
                    index,
                    bounds,
                    centroid: bounds.centroid(),
                }
            })
            .collect();

        Self {
            triangles,
            info,
            ordered: Vec::with_capacity(triangles.len()),
            node_count: 0,
        }
    }

    /// Recursively build the subtree for `info[start..end]`.
    fn subdivide(&mut self, start: usize, end: usize, depth: usize) -> BuildNode {
        self.node_count += 1;

        let range = &self.info[start..end];
        let bounds = range.iter().fold(Aabb::EMPTY, |acc, t| acc.union(&t.bounds));
        let count = end - start;

        if count == 1 {
            return self.make_leaf(start, end, bounds);
        }

        let centroid_bounds = range
            .iter()
            .fold(Aabb::EMPTY, |acc, t| acc.grow_point(t.centroid));
        let axis = centroid_bounds.maximum_extent_axis();

        // All centroids coincide: no split can separate them
        if centroid_bounds.min[axis] == centroid_bounds.max[axis] {
            return self.make_leaf(start, end, bounds);
        }

        let mid = if count <= 2 || depth >= MAX_SAH_DEPTH {
            self.split_median(start, end, axis)
        } else {
            match self.split_sah(start, end, axis, &bounds, &centroid_bounds) {
                Some(mid) => mid,
                None => return self.make_leaf(start, end, bounds),
            }
        };

        let left = self.subdivide(start, mid, depth + 1);
        let right = self.subdivide(mid, end, depth + 1);

        BuildNode::Interior {
            bounds: left.bounds().union(right.bounds()),
            axis,
            children: Box::new([left, right]),
        }
    }

    /// Partition around the median centroid along `axis`.
    fn split_median(&mut self, start: usize, end: usize, axis: usize) -> usize {
        let mid = (start + end) / 2;
        self.info[start..end].select_nth_unstable_by(mid - start, |a, b| {
            a.centroid[axis].total_cmp(&b.centroid[axis])
        });
        mid
    }

    /// Binned SAH split. Returns `None` when a leaf is cheaper.
    fn split_sah(
        &mut self,
        start: usize,
        end: usize,
        axis: usize,
        bounds: &Aabb,
        centroid_bounds: &Aabb,
    ) -> Option<usize> {
        let count = end - start;
        let parent_area = bounds.surface_area();
        if parent_area <= 0.0 {
            return Some(self.split_median(start, end, axis));
        }

        let mut buckets = [Bucket::default(); BUCKET_COUNT];
        for t in &self.info[start..end] {
            let b = &mut buckets[bucket_index(centroid_bounds, t.centroid, axis)];
            b.count += 1;
            b.bounds.grow(&t.bounds);
        }

        // Cost of splitting after each bucket but the last
        let mut min_cost = f32::INFINITY;
        let mut min_cost_bucket = 0;
        for split in 0..BUCKET_COUNT - 1 {
            let (left, right) = buckets.split_at(split + 1);
            let (left_count, left_bounds) = sum_buckets(left);
            let (right_count, right_bounds) = sum_buckets(right);

            let cost = 1.0
                + (left_count as f32 * left_bounds.surface_area()
                    + right_count as f32 * right_bounds.surface_area())
                    / parent_area;

            if cost < min_cost {
                min_cost = cost;
                min_cost_bucket = split;
            }
        }

        let leaf_cost = count as f32;
        if count <= MAX_TRIANGLES_IN_LEAF && min_cost >= leaf_cost {
            return None;
        }

        let mid = start
            + partition(&mut self.info[start..end], |t| {
                bucket_index(centroid_bounds, t.centroid, axis) <= min_cost_bucket
            });

        // Float rounding can leave one side empty; never emit an empty child
        if mid == start || mid == end {
            return Some(self.split_median(start, end, axis));
        }

        Some(mid)
    }

    fn make_leaf(&mut self, start: usize, end: usize, bounds: Aabb) -> BuildNode {
        let first = self.ordered.len() as u32;
        for t in &self.info[start..end] {
            self.ordered.push(self.triangles[t.index]);
        }

        BuildNode::Leaf {
            bounds,
            first,
            count: (end - start) as u32,
        }
    }
}

/// Bucket of a centroid: `clamp(floor(12 * offset), 0, 11)`.
#[inline]
fn bucket_index(centroid_bounds: &Aabb, centroid: Vec3, axis: usize) -> usize {
    let b = (BUCKET_COUNT as f32 * centroid_bounds.offset(centroid)[axis]) as usize;
    b.min(BUCKET_COUNT - 1)
}

fn sum_buckets(buckets: &[Bucket]) -> (usize, Aabb) {
    buckets.iter().fold((0, Aabb::EMPTY), |(count, bounds), b| {
        (count + b.count, bounds.union(&b.bounds))
    })
}

/// Move elements matching `pred` to the front; returns how many matched.
fn partition<T>(items: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut first_false = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(first_false, i);
            first_false += 1;
        }
    }
    first_false
}

/// Serialize `node` depth-first into `nodes`; returns its index.
fn flatten(node: &BuildNode, nodes: &mut Vec<BvhNode>) -> u32 {
    let index = nodes.len();
    nodes.push(BvhNode {
        bounds: (*node.bounds()).into(),
        ..Default::default()
    });

    match node {
        BuildNode::Leaf { first, count, .. } => {
            nodes[index].first_triangle_offset = *first;
            nodes[index].triangle_count = *count;
        }
        BuildNode::Interior { axis, children, .. } => {
            flatten(&children[0], nodes);
            let right = flatten(&children[1], nodes);
            nodes[index].first_triangle_offset = right;
            nodes[index].split_axis = *axis as u32;
        }
    }

    index as u32
}
