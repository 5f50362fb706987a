//! Surface response. Only the Lambertian diffuse lobe is supported.

use std::f32::consts::FRAC_1_PI;

use lumen_core::Material;
use lumen_math::{Vec2, Vec3};

use crate::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// BRDF value and sampling density for one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrdfSample {
    /// Direction leaving the surface (unit length)
    pub direction: Vec3,
    /// BRDF value f(wi, wo)
    pub value: Color,
    /// `dot(direction, normal)`, negative below the surface
    pub cos_theta: f32,
    /// Solid-angle PDF of sampling `direction`
    pub pdf: f32,
}

impl BrdfSample {
    /// Throughput factor `f * cos / pdf` of this sample, zero when unusable.
    pub fn weight(&self) -> Color {
        if self.pdf > 0.0 && self.cos_theta > 0.0 {
            self.value * self.cos_theta / self.pdf
        } else {
            Color::ZERO
        }
    }
}

/// Trait for surface reflectance models.
pub trait Brdf: Send + Sync {
    /// Evaluate the BRDF and its sampling PDF for a given direction.
    fn evaluate(&self, normal: Vec3, direction: Vec3) -> BrdfSample;

    /// Importance-sample a direction and evaluate it.
    fn sample(&self, normal: Vec3, random: Vec2) -> BrdfSample;
}

/// Lambertian (diffuse) reflectance: `diffuse / pi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lambertian {
    diffuse: Color,
}

impl Lambertian {
    /// Create a new Lambertian BRDF with the given albedo color.
    pub fn new(diffuse: Color) -> Self {
        Self { diffuse }
    }

    #[inline]
    fn value(&self) -> Color {
        self.diffuse * FRAC_1_PI
    }
}

impl From<&Material> for Lambertian {
    fn from(material: &Material) -> Self {
        Self::new(material.diffuse_color())
    }
}

impl Brdf for Lambertian {
    fn evaluate(&self, normal: Vec3, direction: Vec3) -> BrdfSample {
        let cos_theta = direction.dot(normal);
        BrdfSample {
            direction,
            value: self.value(),
            cos_theta,
            pdf: cosine_hemisphere_pdf(cos_theta),
        }
    }

    fn sample(&self, normal: Vec3, random: Vec2) -> BrdfSample {
        let direction = cosine_sample_hemisphere(normal, random);
        self.evaluate(normal, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::Prng;
    use rand::SeedableRng;

    #[test]
    fn test_lambert_value() {
        let brdf = Lambertian::new(Color::new(0.5, 0.25, 1.0));
        let sample = brdf.evaluate(Vec3::Y, Vec3::Y);

        assert!((sample.value - Color::new(0.5, 0.25, 1.0) * FRAC_1_PI).length() < 1e-6);
        assert!((sample.cos_theta - 1.0).abs() < 1e-6);
        assert!((sample.pdf - FRAC_1_PI).abs() < 1e-6);
    }

    #[test]
    fn test_below_surface_has_zero_pdf() {
        let brdf = Lambertian::new(Color::ONE);
        let sample = brdf.evaluate(Vec3::Y, Vec3::NEG_Y);

        assert_eq!(sample.pdf, 0.0);
        assert_eq!(sample.weight(), Color::ZERO);
    }

    #[test]
    fn test_sample_and_evaluate_agree() {
        let brdf = Lambertian::new(Color::splat(0.8));
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let mut rng = Prng::seed_from_u64(9);

        for _ in 0..256 {
            let sampled = brdf.sample(normal, rng.next_vec2());
            let evaluated = brdf.evaluate(normal, sampled.direction);

            assert_eq!(sampled, evaluated);
        }
    }

    #[test]
    fn test_importance_sampled_weight_is_albedo() {
        // f * cos / pdf = (albedo / pi) * cos / (cos / pi) = albedo
        let albedo = Color::new(0.2, 0.4, 0.6);
        let brdf = Lambertian::new(albedo);
        let mut rng = Prng::seed_from_u64(1);

        for _ in 0..64 {
            let sample = brdf.sample(Vec3::Z, rng.next_vec2());
            if sample.cos_theta > 1e-3 {
                assert!((sample.weight() - albedo).length() < 1e-4);
            }
        }
    }

    #[test]
    fn test_from_material() {
        let material = Material::diffuse(Color::new(0.1, 0.2, 0.3));
        let brdf = Lambertian::from(&material);
        assert_eq!(brdf, Lambertian::new(Color::new(0.1, 0.2, 0.3)));
    }
}
