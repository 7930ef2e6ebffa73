//! Ray queries against the scene.
//!
//! The baker only talks to geometry through [`RaytracingContext`]. Any
//! acceleration structure that answers nearest-hit queries can drive a
//! bake; [`BvhContext`] is the CPU implementation shipped with the crate.
//!
//! ## Architecture
//! ```text
//! Scene meshes → primitive list → BVH build (SAH) → BvhContext::nearest_hit
//! ```

mod build;
mod bvh;
mod context;

pub use build::{build_bvh, Bvh};
pub use bvh::{Aabb, BvhNode, Primitive};
pub use context::BvhContext;

use crate::scene::Scene;
use crate::util::{Vec2, Vec3};

/// Nearest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Mesh index in [`Scene::meshes`].
    pub geom_id: u32,
    /// Triangle index within the mesh.
    pub prim_id: u32,
    /// Barycentric weights of the triangle's second and third vertex.
    pub bary: Vec2,
    /// Unnormalized geometric normal `(b - a) × (c - a)`.
    pub normal: Vec3,
    /// Ray parameter of the hit.
    pub distance: f32,
}

/// Read-only scene plus nearest-hit queries.
///
/// Implementations must be safe to query from many threads at once; the
/// baker issues queries from every worker without synchronization.
pub trait RaytracingContext: Sync {
    /// Scene the acceleration structure was built from.
    fn scene(&self) -> &Scene;

    /// Nearest hit with `t_min <= distance <= t_max`, no face culling.
    fn nearest_hit(&self, origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Option<Hit>;
}
