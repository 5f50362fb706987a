//! Scene primitives in the exact byte layout consumed by compute kernels.
//!
//! Field order, sizes and padding words are part of the host/compute
//! contract. Each type is `Pod`, so a slice of them can be uploaded with
//! `bytemuck::cast_slice` without any conversion.

use bytemuck::{Pod, Zeroable};
use lumen_math::{Aabb, Float3, Vec3};

/// A mesh vertex: position and shading normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Float3,
    pub normal: Float3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
        }
    }
}

/// A triangle with per-vertex normals and an index into the material list.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Triangle {
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
    pub material_index: u32,
    pub padding: [u32; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, material_index: u32) -> Self {
        Self {
            v0,
            v1,
            v2,
            material_index,
            padding: [0; 3],
        }
    }

    /// Build a flat-shaded triangle whose vertex normals all equal the
    /// geometric normal `(v1 - v0) x (v2 - v0)`.
    pub fn flat(p0: Vec3, p1: Vec3, p2: Vec3, material_index: u32) -> Self {
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        Self::new(
            Vertex::new(p0, normal),
            Vertex::new(p1, normal),
            Vertex::new(p2, normal),
            material_index,
        )
    }

    #[inline]
    pub fn positions(&self) -> [Vec3; 3] {
        [
            self.v0.position.into(),
            self.v1.position.into(),
            self.v2.position.into(),
        ]
    }

    /// Tight bounds over the three vertex positions.
    pub fn bounds(&self) -> Aabb {
        let [p0, p1, p2] = self.positions();
        Aabb::new(p0.min(p1).min(p2), p0.max(p1).max(p2))
    }

    /// Center of the triangle's bounding box (what BVH construction bins on).
    pub fn centroid(&self) -> Vec3 {
        self.bounds().centroid()
    }

    /// Barycentric interpolation of the vertex normals, `(1-u-v)*n0 + u*n1 + v*n2`.
    pub fn interpolate_normal(&self, u: f32, v: f32) -> Vec3 {
        let n0: Vec3 = self.v0.normal.into();
        let n1: Vec3 = self.v1.normal.into();
        let n2: Vec3 = self.v2.normal.into();
        ((1.0 - u - v) * n0 + u * n1 + v * n2).normalize_or_zero()
    }

    /// Unnormalized geometric normal following the vertex winding.
    pub fn geometric_normal(&self) -> Vec3 {
        let [p0, p1, p2] = self.positions();
        (p1 - p0).cross(p2 - p0)
    }
}

/// A Lambertian material with optional emission.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Material {
    pub diffuse: Float3,
    pub emissive: Float3,
    pub padding: [u32; 4],
}

impl Material {
    pub fn new(diffuse: Vec3, emissive: Vec3) -> Self {
        Self {
            diffuse: diffuse.into(),
            emissive: emissive.into(),
            padding: [0; 4],
        }
    }

    /// Non-emissive diffuse material.
    pub fn diffuse(color: Vec3) -> Self {
        Self::new(color, Vec3::ZERO)
    }

    pub fn diffuse_color(&self) -> Vec3 {
        self.diffuse.into()
    }

    pub fn emission(&self) -> Vec3 {
        self.emissive.into()
    }

    pub fn is_emissive(&self) -> bool {
        self.emission().max_element() > 0.0
    }
}

/// A one-sided rectangular area light.
///
/// The rectangle spans `position + s*u + t*v` for `s, t` in `[0, 1]` and
/// emits towards `u x v`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub position: Float3,
    pub emission: Float3,
    pub u: Float3,
    pub v: Float3,
    pub area: f32,
    pub padding: [u32; 3],
}

impl Light {
    /// Create a rectangle light from its corner and edge vectors.
    ///
    /// The area is precomputed as `|u x v|`. Validation of degenerate
    /// rectangles happens when the light is added to a `Scene`.
    pub fn rectangle(position: Vec3, u: Vec3, v: Vec3, emission: Vec3) -> Self {
        Self {
            position: position.into(),
            emission: emission.into(),
            u: u.into(),
            v: v.into(),
            area: u.cross(v).length(),
            padding: [0; 3],
        }
    }

    /// Axis-aligned square light centered on `center`, facing down (-Y).
    pub fn ceiling(center: Vec3, width: f32, depth: f32, emission: Vec3) -> Self {
        let u = Vec3::new(width, 0.0, 0.0);
        let v = Vec3::new(0.0, 0.0, depth);
        Self::rectangle(center - 0.5 * (u + v), u, v, emission)
    }

    #[inline]
    pub fn corner(&self) -> Vec3 {
        self.position.into()
    }

    #[inline]
    pub fn edge_u(&self) -> Vec3 {
        self.u.into()
    }

    #[inline]
    pub fn edge_v(&self) -> Vec3 {
        self.v.into()
    }

    #[inline]
    pub fn radiance(&self) -> Vec3 {
        self.emission.into()
    }

    /// Unit normal of the emitting side.
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.edge_u().cross(self.edge_v()).normalize_or_zero()
    }

    pub fn center(&self) -> Vec3 {
        self.corner() + 0.5 * (self.edge_u() + self.edge_v())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(size_of::<Vertex>(), 32);
        assert_eq!(size_of::<Triangle>(), 112);
        assert_eq!(size_of::<Material>(), 48);
        assert_eq!(size_of::<Light>(), 80);
    }

    #[test]
    fn test_triangle_material_index_offset() {
        let tri = Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::Y, 7);
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&tri));

        // Three vertices of eight words each, then the material index
        assert_eq!(words[24], 7);
        assert_eq!(&words[25..], &[0, 0, 0]);
    }

    #[test]
    fn test_triangle_bounds_and_centroid() {
        let tri = Triangle::flat(
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, 1.0, 2.0),
            Vec3::new(0.0, 4.0, 2.0),
            0,
        );
        let bounds = tri.bounds();

        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 2.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(tri.centroid(), Vec3::new(1.0, 2.0, 2.0));
    }

    #[test]
    fn test_flat_triangle_normal_follows_winding() {
        let tri = Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::Y, 0);
        assert_eq!(tri.interpolate_normal(0.2, 0.3), Vec3::Z);
    }

    #[test]
    fn test_light_area_and_normal() {
        let light = Light::ceiling(Vec3::new(0.0, 2.0, 0.0), 0.5, 0.5, Vec3::splat(10.0));

        assert!((light.area - 0.25).abs() < 1e-6);
        assert_eq!(light.normal(), Vec3::NEG_Y);
        assert_eq!(light.center(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_material_is_emissive() {
        assert!(!Material::diffuse(Vec3::splat(0.8)).is_emissive());
        assert!(Material::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)).is_emissive());
    }
}
