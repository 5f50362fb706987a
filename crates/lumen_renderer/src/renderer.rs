//! Progressive renderer.
//!
//! `PathTracer` owns the BVH, a copy of the scene's materials and lights,
//! and a per-pixel radiance accumulator. Each call to `advance` traces one
//! more path per pixel and adds it to the accumulator; `radiance` returns
//! the running mean.

use std::time::Instant;

use lumen_core::{Light, Material, Scene};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::brdf::Color;
use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::integrator::PathIntegrator;
use crate::random::Prng;
use crate::{RenderError, RenderResult};

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Maximum number of scattering events per path
    pub max_bounces: u32,
    /// Radiance of rays that escape the scene
    pub background: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            max_bounces: 3,
            background: Color::ZERO,
        }
    }
}

impl RenderConfig {
    /// Set output resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the bounce limit.
    pub fn with_max_bounces(mut self, max_bounces: u32) -> Self {
        self.max_bounces = max_bounces;
        self
    }

    /// Set background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 || u32::try_from(self.pixel_count()).is_err() {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Progressive path tracer with a persistent radiance accumulator.
#[derive(Debug, Clone)]
pub struct PathTracer {
    bvh: Bvh,
    materials: Vec<Material>,
    lights: Vec<Light>,
    camera: Camera,
    config: RenderConfig,
    accumulator: Vec<Color>,
    sample_count: u32,
}

impl PathTracer {
    /// Validate the inputs and build the BVH.
    pub fn new(scene: &Scene, camera: Camera, config: RenderConfig) -> RenderResult<Self> {
        scene.validate()?;
        camera.validate()?;
        config.validate()?;

        let bvh = Bvh::build(scene.triangles())?;

        log::info!(
            "Path tracer ready: {}x{}, {} triangles, {} materials, {} lights, {} bounces",
            config.width,
            config.height,
            scene.triangle_count(),
            scene.materials().len(),
            scene.lights().len(),
            config.max_bounces
        );

        Ok(Self {
            bvh,
            materials: scene.materials().to_vec(),
            lights: scene.lights().to_vec(),
            camera,
            config,
            accumulator: vec![Color::ZERO; config.pixel_count()],
            sample_count: 0,
        })
    }

    /// Discard every accumulated sample.
    pub fn reset(&mut self) {
        self.accumulator.fill(Color::ZERO);
        self.sample_count = 0;
        log::info!("Accumulator reset");
    }

    /// Trace one path per pixel and add it to the accumulator.
    pub fn advance(&mut self) {
        let start = Instant::now();
        let width = self.config.width;
        let height = self.config.height;
        let sample_index = self.sample_count;
        let camera = self.camera;
        let integrator = PathIntegrator::new(
            &self.bvh,
            &self.materials,
            &self.lights,
            self.config.max_bounces,
            self.config.background,
        );

        self.accumulator
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as u32;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let x = x as u32;
                    let mut rng = Prng::for_pixel(y * width + x, sample_index);
                    let ray = camera.generate_ray(x, y, width, height, &mut rng);
                    *pixel += integrator.trace_path(ray, &mut rng);
                }
            });

        self.sample_count += 1;
        log::debug!(
            "Frame {} traced in {:.2?}",
            self.sample_count,
            start.elapsed()
        );
    }

    /// Replace the camera. Accumulated samples are discarded when it moved.
    pub fn set_camera(&mut self, camera: Camera) -> RenderResult<()> {
        camera.validate()?;
        if camera != self.camera {
            self.camera = camera;
            self.reset();
        }
        Ok(())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Running mean of the accumulated samples, row-major from the top-left.
    ///
    /// All zero before the first `advance`.
    pub fn radiance(&self) -> Vec<Color> {
        if self.sample_count == 0 {
            return vec![Color::ZERO; self.accumulator.len()];
        }

        let scale = 1.0 / self.sample_count as f32;
        self.accumulator.iter().map(|sum| *sum * scale).collect()
    }

    /// Running mean as 8-bit RGBA, clamped and gamma corrected for display.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.radiance()
            .into_iter()
            .flat_map(color_to_rgba)
            .collect()
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}
