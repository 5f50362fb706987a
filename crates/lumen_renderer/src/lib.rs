//! Lumen renderer - progressive BVH path tracing
//!
//! A Monte Carlo path tracer over triangle scenes with rectangle area lights.
//! Scenes are accelerated with a binned-SAH BVH flattened into fixed-size
//! nodes, and every frame adds one more sample per pixel to a running mean.
//!
//! ```no_run
//! use lumen_core::Scene;
//! use lumen_renderer::{Camera, PathTracer, RenderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scene = Scene::cornell_box()?;
//! let config = RenderConfig::default().with_resolution(320, 240);
//! let camera = Camera::default().with_resolution(config.width, config.height);
//!
//! let mut tracer = PathTracer::new(&scene, camera, config)?;
//! for _ in 0..16 {
//!     tracer.advance();
//! }
//! let image = tracer.radiance();
//! # Ok(())
//! # }
//! ```

mod brdf;
mod bvh;
mod camera;
mod error;
mod hit;
mod integrator;
mod intersect;
mod random;
mod renderer;
mod sampling;

pub use brdf::{Brdf, BrdfSample, Color, Lambertian};
pub use bvh::{Bvh, BvhNode, BvhStats, TRAVERSAL_STACK_SIZE};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use hit::Hit;
pub use integrator::{PathIntegrator, RAY_EPSILON};
pub use intersect::{intersect_light, intersect_plane, intersect_triangle, Plane, TriangleHit, EPSILON};
pub use random::Prng;
pub use renderer::{color_to_rgba, linear_to_gamma, PathTracer, RenderConfig};
pub use sampling::{
    cosine_hemisphere_pdf, cosine_sample_hemisphere, rectangle_light_pdf, sample_rectangle_light,
    tangent_frame, uniform_hemisphere_pdf, uniform_sample_hemisphere, LightSample,
};

/// Re-export common math types from lumen_math
pub use lumen_math::{Aabb, Ray, Vec3};
