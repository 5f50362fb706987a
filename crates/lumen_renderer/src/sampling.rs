//! Monte Carlo sampling routines.
//!
//! All samplers take their uniform random numbers as a `Vec2` in `[0, 1)^2`
//! rather than a generator, so they are pure functions of their inputs.

use std::f32::consts::{FRAC_1_PI, TAU};

use lumen_core::Light;
use lumen_math::{Vec2, Vec3};

/// Below this `|cos|` a light is seen edge-on and its PDF is unbounded.
const MIN_LIGHT_COSINE: f32 = 1e-6;

/// Below this distance the shading point sits on the light itself.
const MIN_LIGHT_DISTANCE: f32 = 1e-6;

/// Orthonormal tangent and bitangent for `normal`.
///
/// The helper axis is the world axis along the normal's smallest component,
/// so the cross product never degenerates for any unit normal.
pub fn tangent_frame(normal: Vec3) -> (Vec3, Vec3) {
    let a = normal.abs();
    let reference = if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    };

    let tangent = normal.cross(reference).normalize();
    let bitangent = normal.cross(tangent);
    (tangent, bitangent)
}

/// Map a direction given in the local frame (z along `normal`) to world space.
pub fn to_world(local: Vec3, normal: Vec3) -> Vec3 {
    let (tangent, bitangent) = tangent_frame(normal);
    (tangent * local.x + bitangent * local.y + normal * local.z).normalize()
}

/// Uniformly distributed direction on the hemisphere around `normal`.
pub fn uniform_sample_hemisphere(normal: Vec3, random: Vec2) -> Vec3 {
    let phi = TAU * random.y;
    let z = random.x;
    let r = (1.0 - z * z).max(0.0).sqrt();

    to_world(Vec3::new(phi.cos() * r, phi.sin() * r, z), normal)
}

pub fn uniform_hemisphere_pdf() -> f32 {
    1.0 / TAU
}

/// Cosine-weighted direction on the hemisphere around `normal`.
///
/// Samples the unit disk in polar form (`r = sqrt(u1)`, `phi = 2*pi*u2`) and
/// projects up onto the hemisphere.
pub fn cosine_sample_hemisphere(normal: Vec3, random: Vec2) -> Vec3 {
    let phi = TAU * random.y;
    let r = random.x.max(0.0).sqrt();
    let z = (1.0 - random.x).max(0.0).sqrt();

    to_world(Vec3::new(phi.cos() * r, phi.sin() * r, z), normal)
}

/// Solid-angle PDF of `cosine_sample_hemisphere`: `cos(theta) / pi`.
#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: f32) -> f32 {
    cos_theta.max(0.0) * FRAC_1_PI
}

/// A point sampled on a rectangle light, seen from a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit normal of the light's emitting side
    pub normal: Vec3,
    pub emission: Vec3,
    /// Unit direction from the shading point towards the sampled point
    pub direction: Vec3,
    pub distance: f32,
    /// Solid-angle PDF of `direction`
    pub pdf: f32,
}

impl LightSample {
    /// True when the shading point is on the emitting side of the light.
    pub fn faces_point(&self) -> bool {
        self.normal.dot(self.direction) < 0.0
    }
}

/// Sample a uniform point on a rectangle light.
///
/// Returns `None` when the PDF would be unbounded: the point lies on the
/// light, or sees the sampled point exactly edge-on.
pub fn sample_rectangle_light(light: &Light, point: Vec3, random: Vec2) -> Option<LightSample> {
    let target = light.corner() + light.edge_u() * random.x + light.edge_v() * random.y;
    let offset = target - point;
    let distance = offset.length();
    if distance < MIN_LIGHT_DISTANCE {
        return None;
    }

    let direction = offset / distance;
    let pdf = rectangle_light_pdf(light, direction, distance)?;

    Some(LightSample {
        normal: light.normal(),
        emission: light.radiance(),
        direction,
        distance,
        pdf,
    })
}

/// Solid-angle PDF of reaching a light point at `distance` along `direction`
/// when sampling the light uniformly by area: `d^2 / (area * |cos theta_light|)`.
pub fn rectangle_light_pdf(light: &Light, direction: Vec3, distance: f32) -> Option<f32> {
    let cos_light = light.normal().dot(direction).abs();
    if cos_light < MIN_LIGHT_COSINE || light.area <= 0.0 {
        return None;
    }

    Some(distance * distance / (light.area * cos_light))
}
