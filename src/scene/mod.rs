//! In-memory scene consumed by the baker.
//!
//! The scene is built by the host (from whatever archive format it reads)
//! and stays immutable for the duration of a bake.
//!
//! - [`Mesh`] / [`Vertex`] / [`Triangle`] - geometry and alpha semantics
//! - [`Material`] - shading parameters and textures
//! - [`Bitmap`] - textures with point and bilinear sampling
//! - [`Light`] - directional and point lights

mod bitmap;
mod light;
mod material;
mod mesh;

use std::sync::Arc;

pub use bitmap::Bitmap;
pub use light::{Light, LightType};
pub use material::{Material, MaterialKind, MaterialTextures, MIN_ROUGHNESS};
pub use mesh::{Mesh, MeshType, SurfaceAttributes, Triangle, Vertex, PUNCH_CUTOFF};

/// Scene geometry, materials, textures and lights.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub bitmaps: Vec<Arc<Bitmap>>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub lights: Vec<Light>,
}

impl Scene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh and return its geometry id.
    pub fn add_mesh(&mut self, mesh: Mesh) -> u32 {
        self.meshes.push(mesh);
        (self.meshes.len() - 1) as u32
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Mesh by geometry id.
    #[inline]
    pub fn mesh(&self, geom_id: u32) -> &Mesh {
        &self.meshes[geom_id as usize]
    }

    /// Material of a mesh, if any.
    #[inline]
    pub fn mesh_material(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material.and_then(|index| self.materials.get(index))
    }

    /// The first directional light, used as the sun.
    pub fn sun_light(&self) -> Option<&Light> {
        self.lights
            .iter()
            .find(|light| light.light_type == LightType::Directional)
    }

    /// Total triangle count over all meshes.
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }
}
