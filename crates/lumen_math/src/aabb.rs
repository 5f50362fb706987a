use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by its minimum and maximum corners. The empty box has
/// `min = +inf` and `max = -inf`, so growing it by anything yields that thing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box that contains nothing.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create an AABB directly from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create the smallest AABB containing every point.
    pub fn from_point_cloud(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Aabb::EMPTY, |acc, p| acc.grow_point(*p))
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow this box in place to also contain `other`.
    pub fn grow(&mut self, other: &Aabb) {
        *self = self.union(other);
    }

    /// Return this box grown to contain `point`.
    pub fn grow_point(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// True when min > max on any axis.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Size of the box along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area of the box, zero for an empty box.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn maximum_extent_axis(&self) -> usize {
        let d = self.extent();

        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Position of `point` relative to this box, 0 at `min` and 1 at `max`.
    ///
    /// Axes with zero extent report 0 instead of dividing by zero.
    pub fn offset(&self, point: Vec3) -> Vec3 {
        let mut o = point - self.min;
        let d = self.extent();
        for axis in 0..3 {
            o[axis] = if d[axis] > 0.0 { o[axis] / d[axis] } else { 0.0 };
        }
        o
    }

    /// Slab test against a ray.
    ///
    /// `inv_direction` is `1 / ray.direction`, precomputed once per ray. Zero
    /// direction components turn into signed infinities and the comparisons
    /// below still hold.
    ///
    /// A ray parallel to an axis whose origin lies exactly on one of that
    /// axis' slab planes yields a `0 * inf` NaN. Such a NaN counts as `-inf`
    /// for the entry distance and `+inf` for the exit distance, so the axis
    /// never rejects a ray running along a face of the box.
    ///
    /// Intersects iff `t_max >= t_min`, `t_min < t_nearest` and `t_max > 0`.
    #[inline]
    pub fn hit(&self, ray: &Ray, inv_direction: Vec3, t_nearest: f32) -> bool {
        let t0 = (self.min - ray.origin) * inv_direction;
        let t1 = (self.max - ray.origin) * inv_direction;

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let (near, far) = slab_interval(t0[axis], t1[axis]);
            t_min = t_min.max(near);
            t_max = t_max.min(far);
        }

        t_max >= t_min && t_min < t_nearest && t_max > 0.0
    }
}

/// Entry and exit distances of one slab, with NaN widened to the full line.
#[inline]
fn slab_interval(t0: f32, t1: f32) -> (f32, f32) {
    let entry = |t: f32| if t.is_nan() { f32::NEG_INFINITY } else { t };
    let exit = |t: f32| if t.is_nan() { f32::INFINITY } else { t };

    (entry(t0).min(entry(t1)), exit(t0).max(exit(t1)))
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}
