//! Pinhole camera for primary ray generation.

use lumen_math::{Ray, Vec3};
use serde::{Deserialize, Serialize};

use crate::random::Prng;
use crate::{RenderError, RenderResult};

/// Vectors shorter than this count as zero.
const MIN_BASIS_LENGTH: f32 = 1e-6;

/// Largest `|cos|` between two basis vectors still considered independent.
const MAX_BASIS_COSINE: f32 = 0.999;

/// Camera basis plus projection parameters.
///
/// `forward`, `right` and `up` are supplied as-is by whoever drives the
/// camera; `validate` checks they form a usable frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Width over height
    pub aspect_ratio: f32,
}

impl Camera {
    pub fn new(
        position: Vec3,
        forward: Vec3,
        right: Vec3,
        up: Vec3,
        fov_degrees: f32,
        aspect_ratio: f32,
    ) -> Self {
        Self {
            position,
            forward,
            right,
            up,
            fov_degrees,
            aspect_ratio,
        }
    }

    /// Camera at `from` looking towards `at`, with an orthonormal basis.
    pub fn look_at(from: Vec3, at: Vec3, up: Vec3, fov_degrees: f32, aspect_ratio: f32) -> Self {
        let forward = (at - from).normalize_or_zero();
        let right = forward.cross(up).normalize_or_zero();
        let up = right.cross(forward);

        Self::new(from, forward, right, up, fov_degrees, aspect_ratio)
    }

    /// Set the aspect ratio from an image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
        self
    }

    /// Set the vertical field of view.
    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    /// Reject a basis or projection that cannot generate rays.
    pub fn validate(&self) -> RenderResult<()> {
        if !self.position.is_finite() {
            return Err(RenderError::DegenerateCamera("position is not finite"));
        }

        for (axis, reason) in [
            (self.forward, "forward vector is zero or not finite"),
            (self.right, "right vector is zero or not finite"),
            (self.up, "up vector is zero or not finite"),
        ] {
            if !axis.is_finite() || axis.length() < MIN_BASIS_LENGTH {
                return Err(RenderError::DegenerateCamera(reason));
            }
        }

        let (f, r, u) = (
            self.forward.normalize(),
            self.right.normalize(),
            self.up.normalize(),
        );
        if f.dot(r).abs() > MAX_BASIS_COSINE
            || f.dot(u).abs() > MAX_BASIS_COSINE
            || r.dot(u).abs() > MAX_BASIS_COSINE
        {
            return Err(RenderError::DegenerateCamera("basis vectors are collinear"));
        }

        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(RenderError::InvalidFieldOfView(self.fov_degrees));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(RenderError::InvalidAspectRatio(self.aspect_ratio));
        }

        Ok(())
    }

    /// Primary ray through pixel `(x, y)` of a `width` x `height` image.
    ///
    /// The sample position inside the pixel is jittered with `rng`. Pixel
    /// rows run top to bottom.
    pub fn generate_ray(&self, x: u32, y: u32, width: u32, height: u32, rng: &mut Prng) -> Ray {
        let jitter = rng.next_vec2();
        let scale = (self.fov_degrees.to_radians() * 0.5).tan();

        let ndc_x = 2.0 * (x as f32 + jitter.x) / width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * (y as f32 + jitter.y) / height as f32;

        let direction = self.forward
            + self.right * (ndc_x * self.aspect_ratio * scale)
            + self.up * (ndc_y * scale);

        Ray::new(self.position, direction.normalize())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 1.0, 3.5), Vec3::new(0.0, 1.0, 0.0), Vec3::Y, 45.0, 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_basis() {
        let camera = Camera::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y, 90.0, 1.0);

        assert!((camera.forward - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.right - Vec3::X).length() < 1e-6);
        assert!((camera.up - Vec3::Y).length() < 1e-6);
        assert!(camera.validate().is_ok());
    }

    #[test]
    fn test_center_ray_points_forward() {
        let camera = Camera::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y, 60.0, 1.0);
        let mut rng = Prng::for_pixel(0, 0);

        // Any jitter inside the center pixel of a 101x101 image stays close to -Z
        let ray = camera.generate_ray(50, 50, 101, 101, &mut rng);
        assert_eq!(ray.origin, Vec3::ZERO);
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!(ray.direction.dot(Vec3::NEG_Z) > 0.999);
    }

    #[test]
    fn test_corner_rays_span_field_of_view() {
        let camera = Camera::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y, 90.0, 2.0);
        let mut rng = Prng::for_pixel(3, 0);

        // Top-left pixel of a large image: x near -aspect, y near +1 at tan(45) = 1
        let ray = camera.generate_ray(0, 0, 2000, 1000, &mut rng);
        let d = ray.direction / -ray.direction.z;
        assert!((d.x + 2.0).abs() < 0.01);
        assert!((d.y - 1.0).abs() < 0.01);

        let ray = camera.generate_ray(1999, 999, 2000, 1000, &mut rng);
        let d = ray.direction / -ray.direction.z;
        assert!((d.x - 2.0).abs() < 0.01);
        assert!((d.y + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_rejects_degenerate_basis() {
        let good = Camera::default();
        assert!(good.validate().is_ok());

        let zero_forward = Camera { forward: Vec3::ZERO, ..good };
        assert!(matches!(zero_forward.validate(), Err(RenderError::DegenerateCamera(_))));

        let collinear = Camera { right: good.forward, ..good };
        assert!(matches!(collinear.validate(), Err(RenderError::DegenerateCamera(_))));

        let nan = Camera { position: Vec3::splat(f32::NAN), ..good };
        assert!(matches!(nan.validate(), Err(RenderError::DegenerateCamera(_))));

        // look_at with up parallel to the view direction has no right vector
        let straight_up = Camera::look_at(Vec3::ZERO, Vec3::Y, Vec3::Y, 45.0, 1.0);
        assert!(straight_up.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_projection() {
        let good = Camera::default();

        assert_eq!(
            good.with_fov(0.0).validate(),
            Err(RenderError::InvalidFieldOfView(0.0))
        );
        assert_eq!(
            good.with_fov(180.0).validate(),
            Err(RenderError::InvalidFieldOfView(180.0))
        );
        assert_eq!(
            Camera { aspect_ratio: -1.0, ..good }.validate(),
            Err(RenderError::InvalidAspectRatio(-1.0))
        );
    }

    #[test]
    fn test_with_resolution_sets_aspect() {
        let camera = Camera::default().with_resolution(800, 400);
        assert_eq!(camera.aspect_ratio, 2.0);
    }
}
