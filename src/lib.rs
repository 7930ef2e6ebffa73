//! # Lightbake
//!
//! Static global illumination baker. Path-traces light transport through
//! game-level geometry and stores indirect light, ambient occlusion and
//! soft sun shadows in bake points: lightmap texels or light field probes.
//!
//! ## Modules
//!
//! - [`util`] - Math types, errors, logging setup
//! - [`sampling`] - Direction and disk samplers
//! - [`random`] - Thread-independent uniform random streams
//! - [`scene`] - Meshes, materials, bitmaps, lights
//! - [`params`] - Bake configuration
//! - [`raytrace`] - Ray query contract and the CPU BVH implementation
//! - [`bake`] - Bake points, path tracer, orchestrator, preview renderer
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lightbake::prelude::*;
//!
//! let context = BvhContext::new(Arc::new(scene))?;
//! let mut points = LightMapPoint::rasterize(&scene.meshes[0], 256);
//! let stats = bake(&context, &mut points, &BakeParams::default());
//!
//! for point in valid_points(&points) {
//!     println!("{} {} {:?}", point.x, point.y, point.colors()[0]);
//! }
//! ```

pub mod util;
pub mod sampling;
pub mod random;
pub mod scene;
pub mod params;
pub mod raytrace;
pub mod bake;

// Re-export commonly used types
pub use util::{Error, Result};
pub use params::{BakeParams, TargetEngine};
pub use bake::{bake, path_trace};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Color3, Color4, Error, Result, Vec2, Vec3};
    pub use crate::params::{BakeParams, TargetEngine};
    pub use crate::scene::*;
    pub use crate::raytrace::{BvhContext, Hit, RaytracingContext};
    pub use crate::bake::{
        bake, path_trace, valid_points, BakePoint, BakePointFlags, BakeSection, BakeStats, LightFieldPoint,
        LightMapPoint, PointState, ShLightFieldPoint,
    };
}
