//! Nearest-hit and shadow queries over the flattened BVH.

use lumen_math::{Aabb, Ray};

use super::Bvh;
use crate::hit::Hit;
use crate::intersect::intersect_triangle;

/// Capacity of the fixed traversal stack.
///
/// The builder keeps every leaf within this depth.
pub const TRAVERSAL_STACK_SIZE: usize = 64;

impl Bvh {
    /// Nearest triangle hit along `ray`.
    pub fn intersect(&self, ray: &Ray) -> Hit {
        self.intersect_bounded(ray, f32::INFINITY)
    }

    /// Nearest triangle hit along `ray` with `t <= t_max`.
    ///
    /// Iterative depth-first walk with a fixed-size stack. At each internal
    /// node the child on the near side of the split axis is visited first.
    pub fn intersect_bounded(&self, ray: &Ray, t_max: f32) -> Hit {
        let mut hit = Hit::bounded(t_max);
        let inv_direction = ray.inverse_direction();
        let direction_negative = [
            inv_direction.x < 0.0,
            inv_direction.y < 0.0,
            inv_direction.z < 0.0,
        ];

        let mut stack = [0u32; TRAVERSAL_STACK_SIZE];
        let mut stack_len = 0;
        let mut current = 0u32;

        loop {
            let node = &self.nodes[current as usize];

            if Aabb::from(node.bounds).hit(ray, inv_direction, hit.t_nearest) {
                if node.is_leaf() {
                    let first = node.first_triangle_offset;
                    for index in first..first + node.triangle_count {
                        if let Some(tri_hit) =
                            intersect_triangle(ray, &self.triangles[index as usize], hit.t_nearest)
                        {
                            hit.record(index, tri_hit);
                        }
                    }
                } else {
                    // Visit the near child first, defer the far one
                    let (near, far) = if direction_negative[node.split_axis as usize] {
                        (node.right_child(), current + 1)
                    } else {
                        (current + 1, node.right_child())
                    };
                    debug_assert!(stack_len < TRAVERSAL_STACK_SIZE);
                    stack[stack_len] = far;
                    stack_len += 1;
                    current = near;
                    continue;
                }
            }

            if stack_len == 0 {
                break;
            }
            stack_len -= 1;
            current = stack[stack_len];
        }

        hit
    }

    /// Nearest hit found by testing every triangle. Reference for `intersect`.
    pub fn intersect_brute_force(&self, ray: &Ray) -> Hit {
        let mut hit = Hit::miss();
        for (index, triangle) in self.triangles.iter().enumerate() {
            if let Some(tri_hit) = intersect_triangle(ray, triangle, hit.t_nearest) {
                hit.record(index as u32, tri_hit);
            }
        }
        hit
    }

    /// True when any triangle blocks `ray` strictly before `max_distance`.
    pub fn occluded(&self, ray: &Ray, max_distance: f32) -> bool {
        let hit = self.intersect_bounded(ray, max_distance);
        hit.is_hit && hit.t_nearest < max_distance
    }
}
