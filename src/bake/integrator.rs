//! Unidirectional path tracer.
//!
//! [`path_trace`] estimates the radiance arriving at a point along one
//! ray. The baker calls it for every indirect sample; the preview renderer
//! calls it once per pixel with `from_eye` set.

use crate::params::{BakeParams, TargetEngine};
use crate::random;
use crate::raytrace::RaytracingContext;
use crate::sampling::{
    fresnel_schlick, ggx_pdf, ndf_ggx, sample_cosine_weighted_hemisphere, sample_ggx_microfacet, vis_schlick,
};
use crate::scene::{Light, MaterialKind, MeshType, Scene, PUNCH_CUTOFF};
use crate::util::{
    frame_from_normal, hsv_to_rgb, is_valid_radiance, luminance, rgb_to_hsv, saturate, Color3, Color4, Vec3,
    Vec4Swizzles, PI,
};

/// Minimum ray distance for rays leaving a surface.
pub const RAY_EPSILON: f32 = 0.001;

/// What the first segment of a path hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Miss,
    Front,
    Back,
}

/// Result of [`path_trace`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    pub radiance: Color3,
    pub surface: Surface,
}

impl TraceResult {
    const BLACK_MISS: Self = Self {
        radiance: Color3::ZERO,
        surface: Surface::Miss,
    };

    /// 1.0 unless the first hit was a culled backface. Summed by the
    /// orchestrator into the face factor.
    #[inline]
    pub fn hit_flag(&self) -> f32 {
        match self.surface {
            Surface::Back => 0.0,
            Surface::Miss | Surface::Front => 1.0,
        }
    }
}

/// Environment radiance arriving from `direction`.
pub fn sample_sky(direction: Vec3, params: &BakeParams) -> Color3 {
    match params.target_engine {
        TargetEngine::He1 => params.environment_color * params.environment_color_intensity,
        TargetEngine::He2 => {
            let elevation = saturate(direction.normalize_or_zero().y * 0.5 + 0.5);
            params
                .secondary_environment_color
                .lerp(params.environment_color, elevation)
                * params.sky_intensity
        }
    }
}

/// Scale saturation and brightness of a diffuse color.
fn adjust_albedo(color: Color3, params: &BakeParams) -> Color3 {
    let mut hsv = rgb_to_hsv(color.max(Color3::ZERO));
    hsv.y = saturate(hsv.y * params.diffuse_saturation);
    hsv_to_rgb(hsv) * params.diffuse_strength
}

/// Whether the sun is visible from `origin` along `to_light`.
///
/// Sky geometry never occludes. Punch and transparent hits are followed
/// through, up to `shadow_march_limit` layers.
fn sun_visible<C: RaytracingContext + ?Sized>(context: &C, origin: Vec3, to_light: Vec3, params: &BakeParams) -> bool {
    let scene = context.scene();
    let mut origin = origin;

    for _ in 0..params.shadow_march_limit {
        let Some(hit) = context.nearest_hit(origin, to_light, RAY_EPSILON, f32::INFINITY) else {
            return true;
        };

        let mesh = scene.mesh(hit.geom_id);
        let material = scene.mesh_material(mesh);
        if material.is_some_and(|m| m.kind == MaterialKind::Sky) {
            return true;
        }

        let alpha = match (mesh.mesh_type, material) {
            (MeshType::Punch | MeshType::Transparent, Some(m)) => m.sample_alpha(mesh.uv_at(hit.prim_id, hit.bary)),
            _ => 1.0,
        };
        let blocks = match mesh.mesh_type {
            MeshType::Punch => alpha >= PUNCH_CUTOFF,
            MeshType::Transparent => random::next() < alpha,
            MeshType::Opaque | MeshType::Special => true,
        };
        if blocks {
            return false;
        }

        origin = mesh.position_at(hit.prim_id, hit.bary);
    }

    false
}

fn sun_direction(scene: &Scene) -> Option<(&Light, Vec3)> {
    let sun = scene.sun_light()?;
    let to_light = -sun.position_or_direction.normalize_or_zero();
    (to_light != Vec3::ZERO).then_some((sun, to_light))
}

/// Estimate incoming radiance along `direction` from `origin`.
///
/// The result is non-negative and finite for any finite ray. When
/// `from_eye` is false (baking) a culled backface ends the path with no
/// contribution and reports [`Surface::Back`] on the first segment; from
/// the eye backfaces are shaded with flipped normals.
pub fn path_trace<C: RaytracingContext + ?Sized>(
    context: &C,
    origin: Vec3,
    direction: Vec3,
    params: &BakeParams,
    from_eye: bool,
) -> TraceResult {
    let mut direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO || !origin.is_finite() {
        return TraceResult::BLACK_MISS;
    }

    let scene = context.scene();
    let sun = sun_direction(scene);

    let mut origin = origin;
    let mut radiance = Color3::ZERO;
    let mut throughput = Color3::ONE;
    let mut surface = Surface::Miss;
    let mut first = true;
    let mut depth = 0;
    let mut bounces = 0;
    // Alpha layers crossed on the current segment
    let mut layers = 0;

    while bounces < params.light_bounce_count {
        let Some(hit) = context.nearest_hit(origin, direction, RAY_EPSILON, f32::INFINITY) else {
            radiance += throughput * sample_sky(direction, params);
            break;
        };

        let mesh = scene.mesh(hit.geom_id);
        let material = scene.mesh_material(mesh);
        let attrs = mesh.interpolate(hit.prim_id, hit.bary);

        let diffuse = material.map_or(Color4::ONE, |m| m.sample_diffuse(attrs.uv, attrs.color.w));

        // Alpha: let the ray continue through cut-out and translucent texels.
        // Crossing a layer is not a bounce; past the march limit the layer
        // is shaded like any other surface.
        let passes = layers < params.shadow_march_limit
            && match mesh.mesh_type {
                MeshType::Punch => diffuse.w < PUNCH_CUTOFF,
                MeshType::Transparent => random::next() >= diffuse.w,
                MeshType::Opaque | MeshType::Special => false,
            };
        if passes {
            origin = attrs.position;
            layers += 1;
            continue;
        }
        layers = 0;
        bounces += 1;

        let ng = hit.normal.normalize_or_zero();
        let backfacing = ng.dot(direction) >= 0.0;
        let culled = backfacing
            && mesh.mesh_type == MeshType::Opaque
            && !material.is_some_and(|m| m.double_sided);

        if first {
            surface = if culled { Surface::Back } else { Surface::Front };
            first = false;
        }
        if culled && !from_eye {
            break;
        }

        let mut normal = if attrs.normal == Vec3::ZERO { ng } else { attrs.normal };
        if backfacing {
            normal = -normal;
        }
        if normal == Vec3::ZERO {
            break;
        }

        let (albedo, specular, roughness) = match material {
            // Untextured geometry shades as plain white diffuse
            None => (adjust_albedo(Color3::ONE, params), Color3::ZERO, 1.0),
            Some(material) => {
                match material.kind {
                    MaterialKind::Sky => {
                        let sky = match &material.textures.diffuse {
                            Some(_) => diffuse.xyz() * params.sky_intensity,
                            None => sample_sky(direction, params),
                        };
                        radiance += throughput * sky;
                        break;
                    }
                    MaterialKind::IgnoreLight => {
                        radiance += throughput * material.sample_emission(attrs.uv) * params.emission_strength;
                        break;
                    }
                    MaterialKind::Common | MaterialKind::Blend => {}
                }

                radiance += throughput * material.sample_emission(attrs.uv) * params.emission_strength;
                (
                    adjust_albedo(diffuse.xyz(), params),
                    material.sample_specular(attrs.uv),
                    material.sample_roughness(attrs.uv),
                )
            }
        };

        let bounce = Bounce { position: attrs.position, normal, albedo, specular, roughness };
        if !shade_bounce(context, &mut origin, &mut direction, &mut radiance, &mut throughput, bounce, sun, params) {
            break;
        }
        if !russian_roulette(&mut throughput, &mut depth, params) {
            break;
        }
    }

    if !is_valid_radiance(radiance) {
        radiance = Color3::ZERO;
    }

    TraceResult { radiance, surface }
}

/// Shading inputs at a path vertex.
struct Bounce {
    position: Vec3,
    normal: Vec3,
    albedo: Color3,
    specular: Color3,
    roughness: f32,
}

/// Add direct sun light at the vertex, then sample the next direction.
///
/// Returns false when the path should end.
#[allow(clippy::too_many_arguments)]
fn shade_bounce<C: RaytracingContext + ?Sized>(
    context: &C,
    origin: &mut Vec3,
    direction: &mut Vec3,
    radiance: &mut Color3,
    throughput: &mut Color3,
    bounce: Bounce,
    sun: Option<(&Light, Vec3)>,
    params: &BakeParams,
) -> bool {
    let Bounce { position, normal, albedo, specular, roughness } = bounce;
    let view = -*direction;
    let alpha = roughness * roughness;

    if let Some((sun, to_light)) = sun {
        let n_dot_l = normal.dot(to_light);
        if n_dot_l > 0.0 && sun_visible(context, position, to_light, params) {
            let mut brdf = albedo;
            if specular != Color3::ZERO {
                let half = (view + to_light).normalize_or_zero();
                let n_dot_v = normal.dot(view).max(1e-4);
                let f = fresnel_schlick(specular, saturate(half.dot(view)));
                brdf += f * ndf_ggx(saturate(normal.dot(half)), roughness) * vis_schlick(roughness, n_dot_v, n_dot_l) * PI;
            }
            *radiance += *throughput * brdf * sun.color * saturate(n_dot_l) * params.light_strength;
        }
    }

    let diffuse_weight = luminance(albedo).max(0.0);
    let specular_weight = luminance(specular).max(0.0);
    let total = diffuse_weight + specular_weight;
    if total <= 0.0 || !total.is_finite() {
        return false;
    }

    let frame = frame_from_normal(normal);
    let (next, weight) = if random::next() * total < specular_weight {
        let half = frame * sample_ggx_microfacet(alpha, random::next(), random::next());
        let next = (2.0 * view.dot(half) * half - view).normalize_or_zero();
        let n_dot_l = normal.dot(next);
        let n_dot_v = normal.dot(view);
        if n_dot_l <= 0.0 || n_dot_v <= 0.0 {
            return false;
        }

        let pdf = ggx_pdf(normal, half, view, alpha) * (specular_weight / total);
        if pdf <= 0.0 {
            return false;
        }
        let f = fresnel_schlick(specular, saturate(half.dot(view)))
            * ndf_ggx(saturate(normal.dot(half)), roughness)
            * vis_schlick(roughness, n_dot_v, n_dot_l);
        (next, f * n_dot_l / pdf)
    } else {
        let next = frame * sample_cosine_weighted_hemisphere(random::next(), random::next());
        (next.normalize_or_zero(), albedo * (total / diffuse_weight))
    };

    if next == Vec3::ZERO || !is_valid_radiance(weight) {
        return false;
    }

    *throughput *= weight;
    if throughput.max_element() <= 0.0 {
        return false;
    }

    *origin = position;
    *direction = next;
    true
}

/// Stochastic termination past `russian_roulette_max_depth`.
///
/// Survivors are divided by the continuation probability.
fn russian_roulette(throughput: &mut Color3, depth: &mut u32, params: &BakeParams) -> bool {
    *depth += 1;
    if *depth <= params.russian_roulette_max_depth {
        return true;
    }

    let probability = throughput.max_element().min(1.0);
    if probability <= 0.0 || random::next() >= probability {
        return false;
    }
    *throughput /= probability;
    true
}
