//! Errors raised at the renderer's API boundary.
//!
//! Everything here is a precondition violation: the call is rejected before
//! the BVH builder or the integrator runs. Numerical edge cases inside a
//! frame never surface as errors.

use lumen_core::SceneError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Cannot build a BVH over an empty triangle list")]
    EmptyScene,

    #[error("Too many triangles for 32-bit BVH offsets: {0}")]
    TooManyTriangles(usize),

    #[error("Degenerate camera basis: {0}")]
    DegenerateCamera(&'static str),

    #[error("Invalid field of view: {0} degrees")]
    InvalidFieldOfView(f32),

    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(f32),

    #[error("Invalid resolution: {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

pub type RenderResult<T> = Result<T, RenderError>;
