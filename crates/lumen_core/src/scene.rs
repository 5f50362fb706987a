//! Scene assembly: triangles, materials and rectangle lights.
//!
//! A `Scene` is filled once at load time and treated as read-only by the
//! renderer afterwards. Materials are append-only so indices stay stable.

use lumen_math::{Aabb, Vec3};
use thiserror::Error;

use crate::layout::{Light, Material, Triangle};
use crate::mesh::Mesh;

/// Lights smaller than this are rejected as degenerate.
const MIN_LIGHT_AREA: f32 = 1e-8;

/// Errors raised while assembling a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Light has zero area ({0})")]
    ZeroAreaLight(f32),

    #[error("Light geometry or emission is not finite")]
    NonFiniteLight,

    #[error("Index count {0} is not a multiple of 3")]
    IncompleteFace(usize),

    #[error("Vertex index {index} out of range (vertex count: {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Material index {index} out of range (material count: {material_count})")]
    MaterialOutOfRange { index: u32, material_count: usize },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Renderer-agnostic scene description.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a material and return its index.
    pub fn add_material(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    /// Append a single triangle. Its material must already exist.
    pub fn add_triangle(&mut self, triangle: Triangle) -> SceneResult<()> {
        self.check_material(triangle.material_index)?;
        self.triangles.push(triangle);
        Ok(())
    }

    /// Expand a mesh into triangles using `material_index`.
    ///
    /// Returns the number of triangles added.
    pub fn add_mesh(&mut self, mesh: &Mesh, material_index: u32) -> SceneResult<usize> {
        self.check_material(material_index)?;
        let triangles = mesh.to_triangles(material_index)?;
        let count = triangles.len();
        self.triangles.extend(triangles);

        log::debug!(
            "Added mesh: {} triangles, {} vertices, material {}",
            count,
            mesh.vertex_count(),
            material_index
        );
        Ok(count)
    }

    /// Add an axis-aligned box with outward-facing, flat-shaded faces.
    pub fn add_cuboid(&mut self, min: Vec3, max: Vec3, material_index: u32) -> SceneResult<usize> {
        let d = max - min;
        let (dx, dy, dz) = (Vec3::X * d.x, Vec3::Y * d.y, Vec3::Z * d.z);

        let faces = [
            Mesh::quad(min, dz, dy),
            Mesh::quad(Vec3::new(max.x, min.y, min.z), dy, dz),
            Mesh::quad(min, dx, dz),
            Mesh::quad(Vec3::new(min.x, max.y, min.z), dz, dx),
            Mesh::quad(min, dy, dx),
            Mesh::quad(Vec3::new(min.x, min.y, max.z), dx, dy),
        ];

        let mut added = 0;
        for face in &faces {
            added += self.add_mesh(face, material_index)?;
        }
        Ok(added)
    }

    /// Add a rectangle light, rejecting degenerate or non-finite ones.
    pub fn add_rectangle_light(&mut self, light: Light) -> SceneResult<()> {
        let finite = [light.corner(), light.edge_u(), light.edge_v(), light.radiance()]
            .iter()
            .all(|v| v.is_finite());
        if !finite || !light.area.is_finite() {
            return Err(SceneError::NonFiniteLight);
        }
        if light.area < MIN_LIGHT_AREA {
            return Err(SceneError::ZeroAreaLight(light.area));
        }

        self.lights.push(light);
        Ok(())
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Bounds of all triangles (lights are not included).
    pub fn bounds(&self) -> Aabb {
        self.triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, tri| acc.union(&tri.bounds()))
    }

    /// Check every triangle references an existing material.
    pub fn validate(&self) -> SceneResult<()> {
        self.triangles
            .iter()
            .try_for_each(|tri| self.check_material(tri.material_index))
    }

    fn check_material(&self, index: u32) -> SceneResult<()> {
        if (index as usize) < self.materials.len() {
            Ok(())
        } else {
            Err(SceneError::MaterialOutOfRange {
                index,
                material_count: self.materials.len(),
            })
        }
    }

    /// The classic Cornell box: a 2x2x2 room (x, z in [-1, 1], y in [0, 2])
    /// open towards +Z, with two blocks and a warm square light under the
    /// ceiling.
    pub fn cornell_box() -> SceneResult<Scene> {
        let mut scene = Scene::new();

        let white = scene.add_material(Material::diffuse(Vec3::splat(0.73)));
        let red = scene.add_material(Material::diffuse(Vec3::new(0.65, 0.05, 0.05)));
        let green = scene.add_material(Material::diffuse(Vec3::new(0.12, 0.45, 0.15)));

        let (two_x, two_y, two_z) = (Vec3::X * 2.0, Vec3::Y * 2.0, Vec3::Z * 2.0);

        // Walls face inwards
        scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, 0.0, -1.0), two_z, two_x), white)?;
        scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, 2.0, -1.0), two_x, two_z), white)?;
        scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, 0.0, -1.0), two_x, two_y), white)?;
        scene.add_mesh(&Mesh::quad(Vec3::new(-1.0, 0.0, -1.0), two_y, two_z), red)?;
        scene.add_mesh(&Mesh::quad(Vec3::new(1.0, 0.0, -1.0), two_z, two_y), green)?;

        scene.add_cuboid(Vec3::new(-0.7, 0.0, -0.7), Vec3::new(-0.1, 1.2, -0.1), white)?;
        scene.add_cuboid(Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.7, 0.6, 0.6), white)?;

        scene.add_rectangle_light(Light::ceiling(
            Vec3::new(0.0, 1.985, 0.0),
            0.5,
            0.5,
            Vec3::new(17.0, 12.0, 4.0),
        ))?;

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Vertex;

    #[test]
    fn test_material_indices_are_stable() {
        let mut scene = Scene::new();
        assert_eq!(scene.add_material(Material::diffuse(Vec3::ONE)), 0);
        assert_eq!(scene.add_material(Material::diffuse(Vec3::ZERO)), 1);
        assert_eq!(scene.materials().len(), 2);
    }

    #[test]
    fn test_add_mesh_requires_material() {
        let mut scene = Scene::new();
        let quad = Mesh::quad(Vec3::ZERO, Vec3::X, Vec3::Y);

        assert!(matches!(
            scene.add_mesh(&quad, 0),
            Err(SceneError::MaterialOutOfRange { index: 0, material_count: 0 })
        ));

        let m = scene.add_material(Material::default());
        assert_eq!(scene.add_mesh(&quad, m), Ok(2));
        assert_eq!(scene.triangle_count(), 2);
    }

    #[test]
    fn test_add_triangle_checks_material() {
        let mut scene = Scene::new();
        let v = Vertex::new(Vec3::ZERO, Vec3::Z);
        let tri = Triangle::new(v, v, v, 4);

        assert!(scene.add_triangle(tri).is_err());
    }

    #[test]
    fn test_rejects_zero_area_light() {
        let mut scene = Scene::new();
        let light = Light::rectangle(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::ONE);

        assert!(matches!(
            scene.add_rectangle_light(light),
            Err(SceneError::ZeroAreaLight(_))
        ));
        assert!(scene.lights().is_empty());
    }

    #[test]
    fn test_rejects_non_finite_light() {
        let mut scene = Scene::new();
        let light = Light::rectangle(Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::splat(f32::NAN));

        assert_eq!(scene.add_rectangle_light(light), Err(SceneError::NonFiniteLight));
    }

    #[test]
    fn test_cuboid_faces_point_outwards() {
        let mut scene = Scene::new();
        let m = scene.add_material(Material::default());
        let center = Vec3::splat(0.5);
        assert_eq!(scene.add_cuboid(Vec3::ZERO, Vec3::ONE, m), Ok(12));

        for tri in scene.triangles() {
            let outward = tri.centroid() - center;
            assert!(tri.geometric_normal().dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_cornell_box() {
        let scene = Scene::cornell_box().unwrap();

        assert_eq!(scene.triangle_count(), 10 + 24);
        assert_eq!(scene.lights().len(), 1);
        assert!(scene.validate().is_ok());

        let bounds = scene.bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 1.0));

        // Every wall faces the room center
        let center = Vec3::new(0.0, 1.0, 0.0);
        for tri in &scene.triangles()[..10] {
            assert!(tri.geometric_normal().dot(center - tri.centroid()) > 0.0);
        }
    }
}
