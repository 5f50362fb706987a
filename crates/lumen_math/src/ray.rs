use crate::Vec3;

/// A ray in 3D space with origin and direction.
///
/// Sampling code assumes `direction` is unit length so that PDFs measured in
/// solid angle stay correct; intersection code does not require it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Component-wise `1 / direction`.
    ///
    /// Zero components become signed infinities, which the slab test relies on.
    #[inline]
    pub fn inverse_direction(&self) -> Vec3 {
        self.direction.recip()
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}
