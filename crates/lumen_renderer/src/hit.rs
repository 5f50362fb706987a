//! Nearest-hit record produced by BVH traversal.

use crate::intersect::TriangleHit;

/// Result of a nearest-hit query.
///
/// `t_nearest` starts at +infinity (or at a caller-supplied bound) and only
/// ever decreases as closer intersections are recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the ray to the closest intersection found so far
    pub t_nearest: f32,
    /// Barycentric coordinates of the hit point
    pub u: f32,
    pub v: f32,
    /// Index into the BVH-ordered triangle array
    pub triangle_index: u32,
    /// Whether any triangle was hit
    pub is_hit: bool,
}

impl Hit {
    /// A query with no hit yet and no distance bound.
    pub fn miss() -> Self {
        Self::bounded(f32::INFINITY)
    }

    /// A query that only accepts hits at or before `t_max`.
    pub fn bounded(t_max: f32) -> Self {
        Self {
            t_nearest: t_max,
            u: 0.0,
            v: 0.0,
            triangle_index: 0,
            is_hit: false,
        }
    }

    /// Record a closer intersection with triangle `index`.
    ///
    /// The intersection routines only return hits within `t_nearest`, so
    /// this keeps the nearest-hit invariant.
    #[inline]
    pub fn record(&mut self, index: u32, hit: TriangleHit) {
        debug_assert!(hit.t <= self.t_nearest);
        self.t_nearest = hit.t;
        self.u = hit.u;
        self.v = hit.v;
        self.triangle_index = index;
        self.is_hit = true;
    }
}

impl Default for Hit {
    fn default() -> Self {
        Self::miss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_starts_at_infinity() {
        let hit = Hit::default();
        assert!(!hit.is_hit);
        assert_eq!(hit.t_nearest, f32::INFINITY);
    }

    #[test]
    fn test_record_updates_nearest() {
        let mut hit = Hit::bounded(10.0);
        hit.record(3, TriangleHit { t: 4.0, u: 0.1, v: 0.2 });

        assert!(hit.is_hit);
        assert_eq!(hit.t_nearest, 4.0);
        assert_eq!(hit.triangle_index, 3);
        assert_eq!((hit.u, hit.v), (0.1, 0.2));
    }
}
