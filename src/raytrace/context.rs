//! CPU ray tracing context over a shared scene.

use std::sync::Arc;

use smallvec::SmallVec;

use super::build::{build_bvh, Bvh};
use super::bvh::Primitive;
use super::{Hit, RaytracingContext};
use crate::scene::Scene;
use crate::util::{Error, Result, Vec2, Vec3};

/// BVH over every triangle of a scene.
///
/// Immutable after construction; queries take `&self` and are safe to run
/// from any number of threads.
pub struct BvhContext {
    scene: Arc<Scene>,
    prims: Vec<Primitive>,
    bvh: Bvh,
}

impl BvhContext {
    /// Validate the scene and build the acceleration structure.
    #[tracing::instrument(skip_all, fields(meshes = scene.meshes.len()))]
    pub fn new(scene: Arc<Scene>) -> Result<Self> {
        let mut prims = Vec::with_capacity(scene.triangle_count());

        for (geom_id, mesh) in scene.meshes.iter().enumerate() {
            if let Some(material) = mesh.material {
                if material >= scene.materials.len() {
                    return Err(Error::scene(format!(
                        "mesh {geom_id} ({}) references material {material}, scene has {}",
                        mesh.name,
                        scene.materials.len()
                    )));
                }
            }

            for (prim_id, tri) in mesh.triangles.iter().enumerate() {
                for index in [tri.a, tri.b, tri.c] {
                    if index as usize >= mesh.vertices.len() {
                        return Err(Error::VertexOutOfBounds {
                            mesh: geom_id,
                            index,
                            count: mesh.vertices.len(),
                        });
                    }
                }

                prims.push(Primitive {
                    v0: mesh.vertices[tri.a as usize].position,
                    v1: mesh.vertices[tri.b as usize].position,
                    v2: mesh.vertices[tri.c as usize].position,
                    geom_id: geom_id as u32,
                    prim_id: prim_id as u32,
                });
            }
        }

        let bvh = build_bvh(&prims);
        tracing::debug!(prims = prims.len(), nodes = bvh.nodes.len(), "ray tracing context ready");

        Ok(Self { scene, prims, bvh })
    }

    /// Shared handle to the scene.
    pub fn scene_arc(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Number of primitives in the BVH.
    pub fn primitive_count(&self) -> usize {
        self.prims.len()
    }
}

impl RaytracingContext for BvhContext {
    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn nearest_hit(&self, origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Option<Hit> {
        if self.prims.is_empty() {
            return None;
        }

        let inv_dir = direction.recip();
        let mut closest = t_max;
        let mut best: Option<(usize, f32, f32)> = None;

        let mut stack: SmallVec<[u32; 64]> = SmallVec::new();
        stack.push(0);

        while let Some(node_idx) = stack.pop() {
            let node = &self.bvh.nodes[node_idx as usize];
            if node.bounds.intersect(origin, inv_dir, t_min, closest).is_none() {
                continue;
            }

            if node.is_leaf() {
                let first = node.left_or_first as usize;
                for &prim_idx in &self.bvh.prim_indices[first..first + node.count as usize] {
                    if let Some((t, u, v)) = self.prims[prim_idx].intersect(origin, direction, t_min, closest) {
                        closest = t;
                        best = Some((prim_idx, u, v));
                    }
                }
                continue;
            }

            // Visit the nearer child first
            let left = node.left_or_first;
            let right = left + 1;
            let t_left = self.bvh.nodes[left as usize].bounds.intersect(origin, inv_dir, t_min, closest);
            let t_right = self.bvh.nodes[right as usize].bounds.intersect(origin, inv_dir, t_min, closest);
            match (t_left, t_right) {
                (Some(l), Some(r)) if l <= r => {
                    stack.push(right);
                    stack.push(left);
                }
                (Some(_), Some(_)) => {
                    stack.push(left);
                    stack.push(right);
                }
                (Some(_), None) => stack.push(left),
                (None, Some(_)) => stack.push(right),
                (None, None) => {}
            }
        }

        best.map(|(prim_idx, u, v)| {
            let prim = &self.prims[prim_idx];
            Hit {
                geom_id: prim.geom_id,
                prim_id: prim.prim_id,
                bary: Vec2::new(u, v),
                normal: prim.normal(),
                distance: closest,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Mesh, Triangle};

    fn floor_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_mesh(Mesh::quad("floor", Vec3::ZERO, Vec3::X, Vec3::Y));
        scene.add_mesh(Mesh::quad("ceiling", Vec3::new(0.0, 0.0, 2.0), Vec3::X, Vec3::Y));
        scene
    }

    #[test]
    fn test_empty_scene_misses() {
        let context = BvhContext::new(Arc::new(Scene::new())).unwrap();
        assert!(context.nearest_hit(Vec3::ZERO, Vec3::Z, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_nearest_of_two_layers() {
        let context = BvhContext::new(Arc::new(floor_scene())).unwrap();

        let hit = context.nearest_hit(Vec3::new(0.2, 0.3, 5.0), Vec3::NEG_Z, 0.0, f32::INFINITY).unwrap();
        assert_eq!(hit.geom_id, 1);
        assert!((hit.distance - 3.0).abs() < 1e-5);
        assert!(hit.normal.dot(Vec3::Z) > 0.0);

        let hit = context.nearest_hit(Vec3::new(0.2, 0.3, 1.0), Vec3::NEG_Z, 0.0, f32::INFINITY).unwrap();
        assert_eq!(hit.geom_id, 0);

        let position = context.scene().mesh(hit.geom_id).position_at(hit.prim_id, hit.bary);
        assert!((position - Vec3::new(0.2, 0.3, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_t_min_skips_origin_surface() {
        let context = BvhContext::new(Arc::new(floor_scene())).unwrap();
        let hit = context.nearest_hit(Vec3::new(0.1, 0.1, 0.0), Vec3::Z, 0.001, f32::INFINITY).unwrap();
        assert_eq!(hit.geom_id, 1);
        assert!(context.nearest_hit(Vec3::new(0.1, 0.1, 0.0), Vec3::Z, 0.001, 1.0).is_none());
    }

    #[test]
    fn test_matches_brute_force() {
        let mut scene = Scene::new();
        for i in 0..40 {
            let z = i as f32 * 0.5;
            let x = (i % 7) as f32 - 3.0;
            scene.add_mesh(Mesh::quad(format!("q{i}"), Vec3::new(x, 0.0, z), Vec3::X * 0.6, Vec3::Y * 0.6));
        }
        let context = BvhContext::new(Arc::new(scene)).unwrap();

        for i in 0..50 {
            let origin = Vec3::new(i as f32 * 0.13 - 3.0, 0.05, -1.0);
            let direction = Vec3::new(0.05, 0.0, 1.0).normalize();
            let brute = context
                .prims
                .iter()
                .filter_map(|p| p.intersect(origin, direction, 0.0, f32::INFINITY).map(|(t, _, _)| t))
                .fold(f32::INFINITY, f32::min);
            let hit = context.nearest_hit(origin, direction, 0.0, f32::INFINITY);
            match hit {
                Some(hit) => assert!((hit.distance - brute).abs() < 1e-4),
                None => assert!(brute.is_infinite()),
            }
        }
    }

    #[test]
    fn test_rejects_bad_indices() {
        let mut scene = Scene::new();
        let mut mesh = Mesh::quad("q", Vec3::ZERO, Vec3::X, Vec3::Y);
        mesh.triangles.push(Triangle::new(0, 1, 9));
        scene.add_mesh(mesh);
        assert!(matches!(
            BvhContext::new(Arc::new(scene)),
            Err(Error::VertexOutOfBounds { index: 9, .. })
        ));

        let mut scene = Scene::new();
        scene.add_mesh(Mesh::quad("q", Vec3::ZERO, Vec3::X, Vec3::Y).with_material(3));
        assert!(matches!(BvhContext::new(Arc::new(scene)), Err(Error::InvalidScene(_))));
    }
}
