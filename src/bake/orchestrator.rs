//! Parallel bake driver.
//!
//! [`bake`] runs, for every valid point and independently of all others:
//! indirect light through [`path_trace`], the ambient occlusion pass and
//! the sun shadow pass. Which passes run is decided by the point type's
//! [`BakePoint::FLAGS`].

use rayon::prelude::*;

use super::integrator::{path_trace, RAY_EPSILON};
use super::point::{BakePoint, BakePointFlags};
use crate::params::BakeParams;
use crate::random;
use crate::raytrace::RaytracingContext;
use crate::sampling::sample_vogel_disk;
use crate::scene::{Light, MeshType, Scene, PUNCH_CUTOFF};
use crate::util::{saturate, Mat3, Vec3, PI};

/// Points with a face factor below this fraction are discarded.
const FACE_FACTOR_THRESHOLD: f32 = 0.5;

/// Per-bake counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BakeStats {
    /// Points that went through every pass.
    pub baked: usize,
    /// Points that were already invalid.
    pub skipped: usize,
    /// Points discarded for facing mostly backfaces.
    pub discarded: usize,
}

impl BakeStats {
    fn merge(self, other: Self) -> Self {
        Self {
            baked: self.baked + other.baked,
            skipped: self.skipped + other.skipped,
            discarded: self.discarded + other.discarded,
        }
    }
}

enum Outcome {
    Baked,
    Skipped,
    Discarded,
}

impl From<Outcome> for BakeStats {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Baked => Self { baked: 1, ..Default::default() },
            Outcome::Skipped => Self { skipped: 1, ..Default::default() },
            Outcome::Discarded => Self { discarded: 1, ..Default::default() },
        }
    }
}

/// Sun light and its frame, resolved once per bake.
#[derive(Debug, Clone, Copy)]
pub struct Sun<'a> {
    pub light: &'a Light,
    /// Frame whose Z axis is the light's travel direction.
    pub tangent_to_world: Mat3,
}

impl<'a> Sun<'a> {
    /// The scene's first directional light.
    pub fn find(scene: &'a Scene) -> Option<Self> {
        scene.sun_light().map(|light| Self {
            light,
            tangent_to_world: light.tangent_to_world(),
        })
    }
}

/// Bake every point in `points` in parallel.
///
/// Each point is mutated exactly once; invalid points are left untouched
/// and points that mostly see backfaces are discarded when their type
/// asks for it.
#[tracing::instrument(skip_all, fields(points = points.len(), basis = P::BASIS_COUNT))]
pub fn bake<C, P>(context: &C, points: &mut [P], params: &BakeParams) -> BakeStats
where
    C: RaytracingContext + ?Sized,
    P: BakePoint,
{
    if let Err(err) = params.validate() {
        tracing::warn!(%err, "baking with invalid parameters");
    }

    let sun = Sun::find(context.scene());
    if P::FLAGS.contains(BakePointFlags::SHADOW) && sun.is_none() {
        tracing::warn!("no directional light in scene, shadows will be fully lit");
    }

    let stats = points
        .par_iter_mut()
        .map(|point| BakeStats::from(bake_point(context, point, sun, params)))
        .reduce(BakeStats::default, BakeStats::merge);

    tracing::info!(
        baked = stats.baked,
        skipped = stats.skipped,
        discarded = stats.discarded,
        "bake finished"
    );
    stats
}

fn bake_point<C, P>(context: &C, point: &mut P, sun: Option<Sun<'_>>, params: &BakeParams) -> Outcome
where
    C: RaytracingContext + ?Sized,
    P: BakePoint,
{
    if !point.valid() {
        return Outcome::Skipped;
    }

    point.begin();

    let sample_count = indirect_sample_count::<P>(params);
    let face_factor = gather_indirect(context, point, sample_count, params);

    // Most rays hitting backfaces means the texel sits inside geometry;
    // keeping it would leak shadow once the lightmap is dilated.
    if P::FLAGS.contains(BakePointFlags::DISCARD_BACKFACE)
        && face_factor / (sample_count.max(1) as f32) < FACE_FACTOR_THRESHOLD
    {
        point.discard();
        return Outcome::Discarded;
    }

    point.end(sample_count);

    if P::FLAGS.contains(BakePointFlags::AO) {
        apply_ambient_occlusion(context, point, params);
    }

    let shadow = if P::FLAGS.contains(BakePointFlags::SHADOW) {
        sun.map_or(1.0, |sun| estimate_shadow(context, point, sun, params))
    } else {
        1.0
    };
    point.set_shadow(shadow);

    Outcome::Baked
}

/// Indirect paths traced per point: `light_sample_count` per basis.
fn indirect_sample_count<P: BakePoint>(params: &BakeParams) -> u32 {
    params.light_sample_count.saturating_mul(P::BASIS_COUNT as u32)
}

/// Trace `sample_count` paths from the point and feed them to
/// [`BakePoint::add_sample`]. Returns the face factor, starting at 1.
fn gather_indirect<C, P>(context: &C, point: &mut P, sample_count: u32, params: &BakeParams) -> f32
where
    C: RaytracingContext + ?Sized,
    P: BakePoint,
{
    let position = point.position();
    let frame = point.tangent_to_world();
    let mut face_factor = 1.0;

    for i in 0..sample_count {
        let tangent_dir = P::sample_direction(i, sample_count, random::next(), random::next()).normalize_or_zero();
        let world_dir = (frame * tangent_dir).normalize_or_zero();
        let result = path_trace(context, position, world_dir, params, false);

        face_factor += result.hit_flag();
        point.add_sample(result.radiance, tangent_dir, world_dir);
    }

    face_factor
}

/// Multiply every basis color by the point's ambient occlusion.
///
/// Does nothing when `ao_strength` or `ao_sample_count` is zero.
pub fn apply_ambient_occlusion<C, P>(context: &C, point: &mut P, params: &BakeParams)
where
    C: RaytracingContext + ?Sized,
    P: BakePoint,
{
    if params.ao_strength <= 0.0 || params.ao_sample_count == 0 {
        return;
    }

    let scene = context.scene();
    let position = point.position();
    let frame = point.tangent_to_world();
    let count = params.ao_sample_count;
    let mut occlusion = 0.0;

    for i in 0..count {
        let tangent_dir = P::sample_direction(i, count, random::next(), random::next()).normalize_or_zero();
        let world_dir = (frame * tangent_dir).normalize_or_zero();

        let Some(hit) = context.nearest_hit(position, world_dir, RAY_EPSILON, f32::INFINITY) else {
            continue;
        };

        let mesh = scene.mesh(hit.geom_id);
        if mesh.mesh_type == MeshType::Opaque && hit.normal.dot(world_dir) >= 0.0 {
            continue;
        }

        let alpha = occluder_alpha(scene, hit.geom_id, hit.prim_id, hit.bary);
        if mesh.mesh_type == MeshType::Punch && alpha < PUNCH_CUTOFF {
            continue;
        }

        // Fully transparent hits add nothing, even with a zero fade
        if alpha <= 0.0 {
            continue;
        }

        let d = hit.distance;
        let fade = params.ao_fade_constant + params.ao_fade_linear * d + params.ao_fade_quadratic * d * d;
        occlusion += alpha / fade;
    }

    let factor = saturate(1.0 - occlusion / count as f32 * params.ao_strength);
    for color in point.colors_mut() {
        *color *= factor;
    }
}

/// Alpha of an occluder: the diffuse texture alpha for non-opaque meshes,
/// 1 otherwise.
fn occluder_alpha(scene: &Scene, geom_id: u32, prim_id: u32, bary: crate::util::Vec2) -> f32 {
    let mesh = scene.mesh(geom_id);
    if mesh.mesh_type == MeshType::Opaque {
        return 1.0;
    }
    scene
        .mesh_material(mesh)
        .map_or(1.0, |material| material.sample_alpha(mesh.uv_at(prim_id, bary)))
}

/// Sun visibility of a point in [0, 1], 1 being fully lit.
pub fn estimate_shadow<C, P>(context: &C, point: &P, sun: Sun<'_>, params: &BakeParams) -> f32
where
    C: RaytracingContext + ?Sized,
    P: BakePoint,
{
    let soft = P::FLAGS.contains(BakePointFlags::SOFT_SHADOW);
    let sample_count = if soft { params.shadow_sample_count.max(1) } else { 1 };

    // One rotation of the disk pattern per point
    let phi = 2.0 * PI * random::next();

    let mut occlusion = 0.0;
    for i in 0..sample_count {
        let direction = if soft {
            let disk = sample_vogel_disk(i, sample_count, phi) * params.shadow_search_radius;
            (sun.tangent_to_world * disk.extend(1.0)).normalize_or_zero()
        } else {
            sun.light.position_or_direction
        };

        let (sample, _) = march_shadow_ray(context, point.smooth_position(), -direction, params);
        occlusion += sample;
    }

    saturate(1.0 - occlusion / sample_count as f32)
}

/// Follow a shadow ray through stacked translucent layers.
///
/// Each hit adds its opacity to the remaining transmittance (binary for
/// punch-through, full for opaque, texture alpha for the rest) and
/// the ray restarts from the hit. Stops at full occlusion, a miss, or
/// after `shadow_march_limit` hits. Returns `(occlusion, hits)`.
pub fn march_shadow_ray<C>(context: &C, origin: Vec3, to_light: Vec3, params: &BakeParams) -> (f32, u32)
where
    C: RaytracingContext + ?Sized,
{
    let scene = context.scene();
    let mut origin = origin;
    let mut occlusion = 0.0f32;
    let mut hits = 0;

    while occlusion < 1.0 && hits < params.shadow_march_limit {
        let Some(hit) = context.nearest_hit(origin, to_light, params.shadow_bias, f32::INFINITY) else {
            break;
        };
        hits += 1;

        let mesh = scene.mesh(hit.geom_id);
        let alpha = occluder_alpha(scene, hit.geom_id, hit.prim_id, hit.bary);
        let opacity = match mesh.mesh_type {
            MeshType::Punch => {
                if alpha > PUNCH_CUTOFF {
                    1.0
                } else {
                    0.0
                }
            }
            MeshType::Transparent | MeshType::Special => alpha,
            MeshType::Opaque => 1.0,
        };
        occlusion += (1.0 - occlusion) * opacity;

        origin = mesh.position_at(hit.prim_id, hit.bary);
    }

    (saturate(occlusion), hits)
}
