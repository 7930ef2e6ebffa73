//! Monte Carlo baking engine.
//!
//! - [`point`] - the [`BakePoint`] abstraction and capability flags
//! - [`points`] - lightmap texels and light field probes
//! - [`integrator`] - [`path_trace`], the path tracer shared with previews
//! - [`orchestrator`] - [`bake`], the parallel per-point driver
//! - [`preview`] - progressive camera renders
//! - [`section`] - caller-held exclusive section around whole bake jobs

pub mod integrator;
pub mod orchestrator;
pub mod point;
pub mod points;
pub mod preview;
pub mod section;

pub use integrator::{path_trace, sample_sky, Surface, TraceResult, RAY_EPSILON};
pub use orchestrator::{
    apply_ambient_occlusion, bake, estimate_shadow, march_shadow_ray, BakeStats, Sun,
};
pub use point::{valid_points, BakePoint, BakePointFlags, PointState};
pub use points::{LightFieldPoint, LightMapPoint, ShLightFieldPoint, AXIS_DIRECTIONS};
pub use preview::{PreviewCamera, PreviewFrame};
pub use section::BakeSection;
