//! Path-space radiance estimator.
//!
//! Every scattering vertex takes one light sample and one BRDF sample and
//! weighs them with the balance heuristic. Emission reached any other way
//! (camera rays, emissive triangles, the background) is added unweighted,
//! since no other strategy can produce it.

use lumen_core::{Light, Material};
use lumen_math::{Ray, Vec3};

use crate::brdf::{Brdf, Color, Lambertian};
use crate::bvh::Bvh;
use crate::intersect::intersect_light;
use crate::random::Prng;
use crate::sampling::{rectangle_light_pdf, sample_rectangle_light};

/// Offset applied along the surface normal to spawn secondary rays.
pub const RAY_EPSILON: f32 = 1e-4;

/// Balance heuristic weight of strategy `a` against strategy `b`.
#[inline]
fn balance_heuristic(pdf_a: f32, pdf_b: f32) -> f32 {
    pdf_a / (pdf_a + pdf_b)
}

/// Read-only view of everything a path needs. Shared by all pixels of a frame.
#[derive(Debug, Clone, Copy)]
pub struct PathIntegrator<'a> {
    bvh: &'a Bvh,
    materials: &'a [Material],
    lights: &'a [Light],
    max_bounces: u32,
    background: Color,
}

impl<'a> PathIntegrator<'a> {
    pub fn new(
        bvh: &'a Bvh,
        materials: &'a [Material],
        lights: &'a [Light],
        max_bounces: u32,
        background: Color,
    ) -> Self {
        Self {
            bvh,
            materials,
            lights,
            max_bounces,
            background,
        }
    }

    /// One-sample estimate of the radiance arriving along `ray`.
    ///
    /// `max_bounces` counts scattering events: 0 only shows directly visible
    /// emission, 1 adds direct lighting, and so on.
    pub fn trace_path(&self, mut ray: Ray, rng: &mut Prng) -> Color {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        // Solid-angle PDF of the BRDF sample that produced `ray`; None for camera rays
        let mut brdf_pdf: Option<f32> = None;

        for depth in 0..=self.max_bounces {
            let hit = self.bvh.intersect(&ray);

            if let Some((light, t)) = self.nearest_light(&ray, hit.t_nearest) {
                let weight = match brdf_pdf {
                    None => 1.0,
                    Some(pdf) => rectangle_light_pdf(light, ray.direction, t)
                        .map_or(1.0, |light_pdf| {
                            balance_heuristic(pdf, light_pdf * self.light_selection_pdf())
                        }),
                };
                radiance += throughput * light.radiance() * weight;
                break;
            }

            if !hit.is_hit {
                radiance += throughput * self.background;
                break;
            }

            let triangle = &self.bvh.triangles()[hit.triangle_index as usize];
            let Some(material) = self.materials.get(triangle.material_index as usize) else {
                break;
            };

            radiance += throughput * material.emission();

            if depth == self.max_bounces {
                break;
            }

            let mut normal = triangle.interpolate_normal(hit.u, hit.v);
            if normal == Vec3::ZERO {
                normal = triangle.geometric_normal().normalize_or_zero();
            }
            if normal.dot(ray.direction) > 0.0 {
                normal = -normal;
            }

            let origin = ray.at(hit.t_nearest) + normal * RAY_EPSILON;
            let brdf = Lambertian::from(material);

            radiance += throughput * self.sample_direct(&brdf, origin, normal, rng);

            let sample = brdf.sample(normal, rng.next_vec2());
            let weight = sample.weight();
            if weight == Color::ZERO {
                break;
            }

            throughput *= weight;
            brdf_pdf = Some(sample.pdf);
            ray = Ray::new(origin, sample.direction);
        }

        radiance
    }

    #[inline]
    fn light_selection_pdf(&self) -> f32 {
        1.0 / self.lights.len() as f32
    }

    /// Closest light whose emitting side `ray` hits before `t_nearest`.
    fn nearest_light(&self, ray: &Ray, t_nearest: f32) -> Option<(&'a Light, f32)> {
        let mut nearest = None;
        let mut t_max = t_nearest;

        for light in self.lights {
            if let Some(t) = intersect_light(ray, light, t_max) {
                t_max = t;
                nearest = Some((light, t));
            }
        }

        nearest
    }

    /// Light-sampling half of the MIS estimator at a shading point.
    fn sample_direct(&self, brdf: &Lambertian, origin: Vec3, normal: Vec3, rng: &mut Prng) -> Color {
        if self.lights.is_empty() {
            return Color::ZERO;
        }

        let selection = rng.next_f32() * self.lights.len() as f32;
        let light_index = (selection as usize).min(self.lights.len() - 1);
        let light = &self.lights[light_index];

        let Some(sample) = sample_rectangle_light(light, origin, rng.next_vec2()) else {
            return Color::ZERO;
        };
        if !sample.faces_point() {
            return Color::ZERO;
        }

        let evaluated = brdf.evaluate(normal, sample.direction);
        if evaluated.cos_theta <= 0.0 {
            return Color::ZERO;
        }

        let shadow_distance = sample.distance - RAY_EPSILON;
        let shadow_ray = Ray::new(origin, sample.direction);
        if self.bvh.occluded(&shadow_ray, shadow_distance)
            || self.light_blocks(&shadow_ray, shadow_distance, light_index)
        {
            return Color::ZERO;
        }

        let light_pdf = sample.pdf * self.light_selection_pdf();
        let weight = balance_heuristic(light_pdf, evaluated.pdf);

        evaluated.value * sample.emission * evaluated.cos_theta * weight / light_pdf
    }

    /// True when another light's emitting side sits in front of the sampled one.
    ///
    /// Keeps shadow rays consistent with `nearest_light`, which lets a BRDF
    /// ray stop at whichever light it reaches first.
    fn light_blocks(&self, ray: &Ray, max_distance: f32, sampled: usize) -> bool {
        self.lights
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != sampled)
            .any(|(_, light)| intersect_light(ray, light, max_distance).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Mesh, Scene};
    use std::f32::consts::FRAC_1_PI;

    const ALBEDO: f32 = 0.5;
    const EMISSION: f32 = 4.0;

    /// Upward-facing floor at y = 0 under a small downward light at y = 1.
    fn floor_scene(light_size: f32) -> (Bvh, Scene) {
        let mut scene = Scene::new();
        let floor = scene.add_material(Material::diffuse(Vec3::splat(ALBEDO)));
        scene
            .add_mesh(
                &Mesh::quad(Vec3::new(-5.0, 0.0, -4.3), Vec3::Z * 10.0, Vec3::X * 10.0),
                floor,
            )
            .unwrap();
        scene
            .add_rectangle_light(Light::ceiling(
                Vec3::new(0.0, 1.0, 0.0),
                light_size,
                light_size,
                Vec3::splat(EMISSION),
            ))
            .unwrap();

        let bvh = Bvh::build(scene.triangles()).unwrap();
        (bvh, scene)
    }

    fn integrator<'a>(bvh: &'a Bvh, scene: &'a Scene, max_bounces: u32) -> PathIntegrator<'a> {
        PathIntegrator::new(bvh, scene.materials(), scene.lights(), max_bounces, Color::ZERO)
    }

    /// Ray from above that lands on the floor at the origin, below the light plane.
    fn ray_to_origin() -> Ray {
        let from = Vec3::new(0.5, 0.5, 0.0);
        Ray::new(from, (Vec3::ZERO - from).normalize())
    }

    fn mean_radiance(integrator: &PathIntegrator, ray: Ray, samples: u32) -> Color {
        let sum: Color = (0..samples)
            .map(|i| integrator.trace_path(ray, &mut Prng::for_pixel(0, i)))
            .sum();
        sum / samples as f32
    }

    #[test]
    fn test_camera_ray_sees_light_unweighted() {
        let (bvh, scene) = floor_scene(0.5);
        let integrator = integrator(&bvh, &scene, 3);

        let ray = Ray::new(Vec3::new(0.0, 0.2, 0.0), Vec3::Y);
        let radiance = integrator.trace_path(ray, &mut Prng::for_pixel(0, 0));
        assert_eq!(radiance, Vec3::splat(EMISSION));
    }

    #[test]
    fn test_light_is_transparent_from_behind() {
        let (bvh, scene) = floor_scene(0.5);
        let integrator = integrator(&bvh, &scene, 0);

        // Passes through the back of the light and lands on the unlit floor
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y);
        let radiance = integrator.trace_path(ray, &mut Prng::for_pixel(0, 0));
        assert_eq!(radiance, Color::ZERO);
    }

    #[test]
    fn test_background_on_miss() {
        let (bvh, scene) = floor_scene(0.5);
        let sky = Color::new(0.1, 0.2, 0.3);
        let integrator = PathIntegrator::new(&bvh, scene.materials(), scene.lights(), 3, sky);

        let ray = Ray::new(Vec3::new(3.0, 0.5, 0.0), Vec3::X);
        assert_eq!(integrator.trace_path(ray, &mut Prng::for_pixel(0, 0)), sky);
    }

    #[test]
    fn test_zero_bounces_shows_only_emission() {
        let (bvh, scene) = floor_scene(0.5);
        let integrator = integrator(&bvh, &scene, 0);

        let radiance = integrator.trace_path(ray_to_origin(), &mut Prng::for_pixel(0, 0));
        assert_eq!(radiance, Color::ZERO);
    }

    #[test]
    fn test_emissive_triangle_is_visible() {
        let mut scene = Scene::new();
        let glow = scene.add_material(Material::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)));
        scene
            .add_mesh(&Mesh::quad(Vec3::new(-1.0, -1.0, 0.0), Vec3::X * 2.0, Vec3::Y * 2.0), glow)
            .unwrap();
        let bvh = Bvh::build(scene.triangles()).unwrap();
        let integrator = integrator(&bvh, &scene, 2);

        let ray = Ray::new(Vec3::new(0.3, -0.5, 1.0), Vec3::NEG_Z);
        let radiance = integrator.trace_path(ray, &mut Prng::for_pixel(0, 0));
        assert_eq!(radiance, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_direct_lighting_matches_irradiance() {
        let light_size = 0.2;
        let (bvh, scene) = floor_scene(light_size);
        let integrator = integrator(&bvh, &scene, 1);

        // Reference: midpoint-rule integral of cos * cos / d^2 over the light
        let n = 200;
        let cell = light_size / n as f32;
        let mut geometry = 0.0_f64;
        for i in 0..n {
            for j in 0..n {
                let x = -0.5 * light_size + (i as f32 + 0.5) * cell;
                let z = -0.5 * light_size + (j as f32 + 0.5) * cell;
                let d2 = x * x + 1.0 + z * z;
                // Both cosines equal 1 / d
                geometry += (cell * cell / (d2 * d2)) as f64;
            }
        }
        let expected = ALBEDO * FRAC_1_PI * EMISSION * geometry as f32;

        let estimate = mean_radiance(&integrator, ray_to_origin(), 20_000);
        for channel in estimate.to_array() {
            assert!(
                (channel - expected).abs() < 0.03 * expected,
                "estimate {channel}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_large_light_combines_both_strategies() {
        // A light covering a big solid angle makes BRDF hits common, so both
        // halves of the MIS estimator contribute.
        let light_size = 3.0;
        let (bvh, scene) = floor_scene(light_size);
        let integrator = integrator(&bvh, &scene, 1);

        let n = 300;
        let cell = light_size / n as f32;
        let mut geometry = 0.0_f64;
        for i in 0..n {
            for j in 0..n {
                let x = -0.5 * light_size + (i as f32 + 0.5) * cell;
                let z = -0.5 * light_size + (j as f32 + 0.5) * cell;
                let d2 = x * x + 1.0 + z * z;
                geometry += (cell * cell / (d2 * d2)) as f64;
            }
        }
        let expected = ALBEDO * FRAC_1_PI * EMISSION * geometry as f32;

        let estimate = mean_radiance(&integrator, ray_to_origin(), 40_000);
        assert!(
            (estimate.x - expected).abs() < 0.03 * expected,
            "estimate {}, expected {expected}",
            estimate.x
        );
    }

    #[test]
    fn test_occluded_light_gives_no_direct_light() {
        let (_, mut scene) = floor_scene(0.2);
        let blocker = scene.add_material(Material::diffuse(Vec3::ZERO));
        // Black slab between floor and light, facing down towards the floor
        scene
            .add_mesh(
                &Mesh::quad(Vec3::new(-2.0, 0.6, -2.0), Vec3::X * 4.0, Vec3::Z * 4.0),
                blocker,
            )
            .unwrap();
        let bvh = Bvh::build(scene.triangles()).unwrap();
        let integrator = integrator(&bvh, &scene, 3);

        let estimate = mean_radiance(&integrator, ray_to_origin(), 500);
        assert_eq!(estimate, Color::ZERO);
    }
}
