//! Lumen Core - scene data for the progressive path tracer.
//!
//! This crate provides:
//!
//! - **Packed primitives**: `Vertex`, `Triangle`, `Material`, `Light` in the
//!   byte layout shared with compute kernels
//! - **Meshes**: indexed triangle meshes handed over by asset loaders
//! - **Scene assembly**: `Scene` with validated lights and material indices
//!
//! # Example
//!
//! ```
//! use lumen_core::{Material, Mesh, Scene};
//! use lumen_math::Vec3;
//!
//! let mut scene = Scene::new();
//! let grey = scene.add_material(Material::diffuse(Vec3::splat(0.5)));
//! scene.add_mesh(&Mesh::quad(Vec3::ZERO, Vec3::X, Vec3::Y), grey).unwrap();
//! assert_eq!(scene.triangle_count(), 2);
//! ```

pub mod layout;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use layout::{Light, Material, Triangle, Vertex};
pub use mesh::Mesh;
pub use scene::{Scene, SceneError, SceneResult};
