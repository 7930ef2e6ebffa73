//! Concrete bake point types.
//!
//! - [`LightMapPoint`] - one lightmap texel, single basis, hemisphere sampling
//! - [`LightFieldPoint`] - ambient-cube probe, six cosine lobes
//! - [`ShLightFieldPoint`] - six-direction probe with exponential lobes

use super::point::{forward_point_state, BakePoint, BakePointFlags, PointState};
use crate::sampling::{sample_cosine_weighted_hemisphere, sample_direction_sphere};
use crate::scene::Mesh;
use crate::util::{
    barycentric_coords, barycentric_lerp, orthonormal_frame, smooth_position, Color3, Mat3, Mat4, UVec3, Vec2, Vec3,
    PI,
};

/// Axis directions of the six-lobe probe bases, in +X -X +Y -Y +Z -Z order.
pub const AXIS_DIRECTIONS: [Vec3; 6] = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

/// Texel centres this close outside a triangle edge still count as covered.
const EDGE_EPSILON: f32 = 1e-5;

/// One texel of a lightmap.
#[derive(Debug, Clone, PartialEq)]
pub struct LightMapPoint {
    pub state: PointState<1>,
    pub x: u16,
    pub y: u16,
}

impl LightMapPoint {
    pub fn new(state: PointState<1>, x: u16, y: u16) -> Self {
        Self { state, x, y }
    }

    /// Generate one point per lightmap texel covered by `mesh`.
    ///
    /// Texel centres are tested against each triangle in lightmap UV space;
    /// the first triangle covering a texel wins. Frames come from the
    /// interpolated vertex tangent basis.
    pub fn rasterize(mesh: &Mesh, resolution: u16) -> Vec<Self> {
        let res = resolution.max(1) as usize;
        let mut covered = vec![false; res * res];
        let mut points = Vec::new();

        for (prim, tri) in mesh.triangles.iter().enumerate() {
            let indices = [tri.a as usize, tri.b as usize, tri.c as usize];
            if indices.iter().any(|&i| i >= mesh.vertices.len()) {
                continue;
            }
            let [a, b, c] = mesh.triangle_vertices(prim as u32);

            let uv = [a.lightmap_uv, b.lightmap_uv, c.lightmap_uv].map(|uv| uv * res as f32);
            let min = uv[0].min(uv[1]).min(uv[2]).floor().max(Vec2::ZERO);
            let max = uv[0].max(uv[1]).max(uv[2]).ceil().min(Vec2::splat(res as f32));
            if !min.is_finite() || !max.is_finite() {
                continue;
            }

            for y in min.y as usize..max.y as usize {
                for x in min.x as usize..max.x as usize {
                    if covered[y * res + x] {
                        continue;
                    }

                    let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let Some(bary) = barycentric_coords(centre, uv[0], uv[1], uv[2]) else {
                        continue;
                    };
                    if bary.x < -EDGE_EPSILON || bary.y < -EDGE_EPSILON || bary.x + bary.y > 1.0 + EDGE_EPSILON {
                        continue;
                    }

                    let tangent = barycentric_lerp(a.tangent, b.tangent, c.tangent, bary);
                    let binormal = barycentric_lerp(a.binormal, b.binormal, c.binormal, bary);
                    let normal = barycentric_lerp(a.normal, b.normal, c.normal, bary);

                    let mut state = PointState::new(
                        barycentric_lerp(a.position, b.position, c.position, bary),
                        orthonormal_frame(tangent, binormal, normal),
                    );
                    state.smooth_position =
                        smooth_position([a.position, b.position, c.position], [a.normal, b.normal, c.normal], bary);

                    covered[y * res + x] = true;
                    points.push(Self::new(state, x as u16, y as u16));
                }
            }
        }

        points
    }
}

impl BakePoint for LightMapPoint {
    const BASIS_COUNT: usize = 1;
    const FLAGS: BakePointFlags = BakePointFlags::ALL;

    #[inline]
    fn sample_direction(_index: u32, _sample_count: u32, u1: f32, u2: f32) -> Vec3 {
        sample_cosine_weighted_hemisphere(u1, u2)
    }

    forward_point_state!();

    #[inline]
    fn add_sample(&mut self, color: Color3, _tangent_dir: Vec3, _world_dir: Vec3) {
        self.state.colors[0] += color;
    }

    fn end(&mut self, sample_count: u32) {
        self.state.colors[0] /= sample_count.max(1) as f32;
    }
}

/// Ambient-cube light field probe.
#[derive(Debug, Clone, PartialEq)]
pub struct LightFieldPoint {
    pub state: PointState<6>,
}

impl LightFieldPoint {
    /// Probe at `position` with a world-aligned frame.
    pub fn new(position: Vec3) -> Self {
        Self { state: PointState::new(position, Mat3::IDENTITY) }
    }
}

impl BakePoint for LightFieldPoint {
    const BASIS_COUNT: usize = 6;
    const FLAGS: BakePointFlags = BakePointFlags::SHADOW;

    #[inline]
    fn sample_direction(_index: u32, _sample_count: u32, u1: f32, u2: f32) -> Vec3 {
        sample_direction_sphere(u1, u2)
    }

    forward_point_state!();

    fn add_sample(&mut self, color: Color3, _tangent_dir: Vec3, world_dir: Vec3) {
        for (axis, basis) in AXIS_DIRECTIONS.iter().zip(self.state.colors.iter_mut()) {
            let cos_theta = world_dir.dot(*axis);
            if cos_theta > 0.0 {
                *basis += color * cos_theta;
            }
        }
    }

    fn end(&mut self, sample_count: u32) {
        let scale = 4.0 / sample_count.max(1) as f32;
        for color in &mut self.state.colors {
            *color *= scale;
        }
    }
}

/// Six-direction light field probe with exponential lobes.
#[derive(Debug, Clone, PartialEq)]
pub struct ShLightFieldPoint {
    pub state: PointState<6>,
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

impl ShLightFieldPoint {
    /// Cell-centred probes of a volume. `matrix` maps the unit cube
    /// centred on the origin to world space.
    pub fn grid(resolution: UVec3, matrix: Mat4) -> Vec<Self> {
        let res = resolution.max(UVec3::ONE);
        let mut points = Vec::with_capacity((res.x * res.y * res.z) as usize);

        for z in 0..res.z {
            for y in 0..res.y {
                for x in 0..res.x {
                    let cell = (UVec3::new(x, y, z).as_vec3() + 0.5) / res.as_vec3() - 0.5;
                    let position = matrix.transform_point3(cell);
                    points.push(Self {
                        state: PointState::new(position, Mat3::IDENTITY),
                        x: x as u16,
                        y: y as u16,
                        z: z as u16,
                    });
                }
            }
        }

        points
    }
}

impl BakePoint for ShLightFieldPoint {
    const BASIS_COUNT: usize = 6;
    const FLAGS: BakePointFlags = BakePointFlags::NONE;

    #[inline]
    fn sample_direction(_index: u32, _sample_count: u32, u1: f32, u2: f32) -> Vec3 {
        sample_direction_sphere(u1, u2)
    }

    forward_point_state!();

    fn add_sample(&mut self, color: Color3, _tangent_dir: Vec3, world_dir: Vec3) {
        // Probe data is stored with Z pointing the other way
        let direction = Vec3::new(world_dir.x, world_dir.y, -world_dir.z);
        for (axis, basis) in AXIS_DIRECTIONS.iter().zip(self.state.colors.iter_mut()) {
            let cos_theta = direction.dot(*axis);
            if cos_theta > 0.0 {
                *basis += color * ((cos_theta - 1.0) * 3.0).exp();
            }
        }
    }

    fn end(&mut self, sample_count: u32) {
        let scale = 2.0 * PI / sample_count.max(1) as f32;
        for color in &mut self.state.colors {
            *color *= scale;
        }
    }
}
