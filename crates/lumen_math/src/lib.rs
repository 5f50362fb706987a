// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod packed;
mod ray;

pub use aabb::Aabb;
pub use packed::{Float3, PackedBounds};
pub use ray::Ray;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.cross(b), Vec3::new(-3.0, 6.0, -3.0));
    }
}
