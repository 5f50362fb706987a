//! Fixed-layout types for buffers shared with a compute backend.
//!
//! Compute kernels see a `float3` as 16 bytes, so every vector that crosses
//! the boundary carries an explicit fourth padding lane.

use bytemuck::{Pod, Zeroable};

use crate::{Aabb, Vec3};

/// A 3-component float vector padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Float3 {
    pub const ZERO: Float3 = Float3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 0.0 }
    }
}

impl From<Vec3> for Float3 {
    #[inline]
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Float3> for Vec3 {
    #[inline]
    fn from(v: Float3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Bounding box as stored in a flattened BVH node.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PackedBounds {
    pub minimum: Float3,
    pub maximum: Float3,
}

impl From<Aabb> for PackedBounds {
    fn from(aabb: Aabb) -> Self {
        Self {
            minimum: aabb.min.into(),
            maximum: aabb.max.into(),
        }
    }
}

impl From<PackedBounds> for Aabb {
    #[inline]
    fn from(bounds: PackedBounds) -> Self {
        Aabb::new(bounds.minimum.into(), bounds.maximum.into())
    }
}
