//! Ray intersection routines for triangles, planes and rectangle lights.
//!
//! Each routine is a pure function that takes the current nearest distance
//! and returns `Some` only for a strictly usable closer hit. Callers apply the
//! update themselves (see `Hit::record`). Box tests live on `Aabb::hit`.

use lumen_core::{Light, Triangle};
use lumen_math::{Ray, Vec3};

/// Minimum determinant / distance accepted by the intersection tests.
pub const EPSILON: f32 = f32::EPSILON;

/// Distance and barycentric coordinates of a ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

/// Möller-Trumbore ray-triangle intersection.
///
/// Only front faces (counter-clockwise as seen by the ray) are hit: a
/// determinant below `EPSILON` rejects back faces and grazing rays alike.
/// Accepts `0 < t <= t_nearest`. Every accept test is written so that a NaN
/// from overflowing products fails it.
#[inline]
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle, t_nearest: f32) -> Option<TriangleHit> {
    let [v0, v1, v2] = triangle.positions();
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let p = ray.direction.cross(edge2);
    let determinant = p.dot(edge1);
    if determinant < EPSILON {
        return None;
    }

    let inv_det = 1.0 / determinant;
    let s = ray.origin - v0;
    let u = inv_det * p.dot(s);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * q.dot(ray.direction);
    if !(v >= 0.0 && u + v <= 1.0) {
        return None;
    }

    let t = inv_det * q.dot(edge2);
    if !(t > 0.0 && t <= t_nearest) {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// A bounded plane patch used for quad tests.
///
/// `u` and `v` are the patch edges divided by their squared length, so that
/// `dot(u, p - position)` maps the patch onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub position: Vec3,
    pub normal: Vec3,
    pub u: Vec3,
    pub v: Vec3,
}

impl Plane {
    /// Plane patch covering a rectangle light.
    pub fn from_light(light: &Light) -> Self {
        let u = light.edge_u();
        let v = light.edge_v();
        Self {
            position: light.corner(),
            normal: light.normal(),
            u: u / u.length_squared(),
            v: v / v.length_squared(),
        }
    }
}

/// Intersect a ray with a bounded plane patch.
///
/// Parallel rays miss. Hits must satisfy `EPSILON < t < t_nearest` and land
/// inside the patch.
pub fn intersect_plane(ray: &Ray, plane: &Plane, t_nearest: f32) -> Option<f32> {
    let denominator = ray.direction.dot(plane.normal);
    if denominator.abs() < EPSILON {
        return None;
    }

    let t = (plane.normal.dot(plane.position) - plane.normal.dot(ray.origin)) / denominator;
    if !(t > EPSILON && t < t_nearest) {
        return None;
    }

    let local = ray.at(t) - plane.position;
    let a1 = plane.u.dot(local);
    let a2 = plane.v.dot(local);
    if (0.0..=1.0).contains(&a1) && (0.0..=1.0).contains(&a2) {
        Some(t)
    } else {
        None
    }
}

/// Intersect a ray with the emitting side of a rectangle light.
///
/// Rays travelling along the light normal come from behind and miss.
pub fn intersect_light(ray: &Ray, light: &Light, t_nearest: f32) -> Option<f32> {
    let plane = Plane::from_light(light);
    if plane.normal.dot(ray.direction) > 0.0 {
        return None;
    }

    intersect_plane(ray, &plane, t_nearest).filter(|t| *t > 0.0)
}
