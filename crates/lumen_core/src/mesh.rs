//! Indexed triangle mesh, the hand-off format from asset loaders.
//!
//! Loaders (OBJ, USD, procedural generators) fill a `Mesh`; `Scene::add_mesh`
//! expands it into the flat `Triangle` list the renderer consumes.

use lumen_math::{Aabb, Vec3};

use crate::layout::{Triangle, Vertex};
use crate::scene::{SceneError, SceneResult};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - computed by `ensure_normals` if missing)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Aabb::from_point_cloud(&positions);
        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Two-triangle quad spanning `corner`, `corner + u`, `corner + u + v`, `corner + v`.
    ///
    /// The front face points along `u x v`.
    pub fn quad(corner: Vec3, u: Vec3, v: Vec3) -> Self {
        let positions = vec![corner, corner + u, corner + u + v, corner + v];
        Self::new(positions, vec![0, 1, 2, 0, 2, 3], None)
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Faces are counter-clockwise: the normal of `(p0, p1, p2)` is
    /// `(p1 - p0) x (p2 - p0)`. Faces are area-weighted.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (face[0] as usize, face[1] as usize, face[2] as usize);
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            let len = normal.length();
            if len > 0.0 {
                *normal /= len;
            } else {
                *normal = Vec3::Y; // Default up normal for degenerate cases
            }
        }

        self.normals = Some(normals);
    }

    /// Ensure the mesh has one normal per vertex, computing them if necessary.
    pub fn ensure_normals(&mut self) {
        let should_compute = match &self.normals {
            None => true,
            Some(normals) => normals.len() != self.positions.len(),
        };

        if should_compute {
            if let Some(normals) = &self.normals {
                log::warn!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Expand the indexed mesh into standalone triangles.
    ///
    /// Missing normals are computed first. Out-of-range indices or an index
    /// count that is not a multiple of three are rejected.
    pub fn to_triangles(&self, material_index: u32) -> SceneResult<Vec<Triangle>> {
        if self.indices.len() % 3 != 0 {
            return Err(SceneError::IncompleteFace(self.indices.len()));
        }

        let mut mesh = self.clone();
        mesh.ensure_normals();
        let normals = mesh.normals.as_deref().unwrap_or_default();

        let vertex = |index: u32| -> SceneResult<Vertex> {
            let i = index as usize;
            match (mesh.positions.get(i), normals.get(i)) {
                (Some(p), Some(n)) => Ok(Vertex::new(*p, *n)),
                _ => Err(SceneError::IndexOutOfRange {
                    index,
                    vertex_count: mesh.positions.len(),
                }),
            }
        };

        mesh.indices
            .chunks_exact(3)
            .map(|face| -> SceneResult<Triangle> {
                Ok(Triangle::new(
                    vertex(face[0])?,
                    vertex(face[1])?,
                    vertex(face[2])?,
                    material_index,
                ))
            })
            .collect()
    }
}
