//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Built once per scene with a binned SAH split strategy, then flattened into
//! a depth-first array of fixed-size nodes. Children are addressed by index,
//! never by pointer, so the node and triangle arrays can be copied verbatim
//! into compute buffers.

mod builder;
mod traversal;

pub use traversal::TRAVERSAL_STACK_SIZE;

use bytemuck::{Pod, Zeroable};
use lumen_core::Triangle;
use lumen_math::PackedBounds;

/// A node of the flattened BVH.
///
/// - Leaf: `triangle_count >= 1`, triangles are
///   `first_triangle_offset .. first_triangle_offset + triangle_count` in the
///   ordered triangle array.
/// - Internal: `triangle_count == 0`, the left child is the next node in the
///   array and `first_triangle_offset` holds the right child's index.
///   `split_axis` is the axis the children were partitioned along.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub bounds: PackedBounds,
    pub first_triangle_offset: u32,
    pub triangle_count: u32,
    pub split_axis: u32,
    pub padding: u32,
}

impl BvhNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.triangle_count > 0
    }

    /// Index of the right child of an internal node.
    #[inline]
    pub fn right_child(&self) -> u32 {
        self.first_triangle_offset
    }
}

/// Shape summary of a built BVH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    /// Depth of the deepest leaf, the root being depth 0
    pub max_depth: usize,
    pub max_leaf_size: usize,
}

/// Flattened BVH plus the triangles reordered so each leaf is contiguous.
///
/// Immutable once built; rebuilding means calling `Bvh::build` again.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
}

impl Bvh {
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Triangles in BVH order. Hit triangle indices refer to this array.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Node buffer as raw bytes, ready for upload.
    pub fn nodes_as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Ordered triangle buffer as raw bytes, ready for upload.
    pub fn triangles_as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            ..Default::default()
        };

        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = &self.nodes[index];
            if node.is_leaf() {
                stats.leaf_count += 1;
                stats.max_depth = stats.max_depth.max(depth);
                stats.max_leaf_size = stats.max_leaf_size.max(node.triangle_count as usize);
            } else {
                stack.push((index + 1, depth + 1));
                stack.push((node.right_child() as usize, depth + 1));
            }
        }

        stats
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_node_layout() {
        assert_eq!(size_of::<BvhNode>(), 48);

        let node = BvhNode {
            first_triangle_offset: 5,
            triangle_count: 2,
            split_axis: 1,
            ..Default::default()
        };
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&node));
        assert_eq!(&words[8..], &[5, 2, 1, 0]);
    }

    #[test]
    fn test_byte_buffers() {
        let triangles = test_scenes::random_triangles(20, 1);
        let bvh = Bvh::build(&triangles).unwrap();

        assert_eq!(bvh.nodes_as_bytes().len(), bvh.nodes().len() * 48);
        assert_eq!(bvh.triangles_as_bytes().len(), 20 * 112);
    }
}
