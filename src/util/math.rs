//! Math type re-exports and baking-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the small
//! helpers shared by the samplers, the integrator and the point types.

// Re-export glam types
pub use glam::{Mat3, Mat4, Quat, UVec3, Vec2, Vec3, Vec4, Vec4Swizzles};

/// Linear HDR RGB color.
pub type Color3 = Vec3;

/// Linear HDR RGBA color.
pub type Color4 = Vec4;

pub const PI: f32 = std::f32::consts::PI;

/// Golden angle in radians, `π(3 − √5)`.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Clamp to [0, 1].
#[inline]
pub fn saturate(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Interpolate triangle attributes with barycentrics weighting `b` and `c`.
#[inline]
pub fn barycentric_lerp<T>(a: T, b: T, c: T, bary: Vec2) -> T
where
    T: Copy + std::ops::Add<Output = T> + std::ops::Sub<Output = T> + std::ops::Mul<f32, Output = T>,
{
    a + (b - a) * bary.x + (c - a) * bary.y
}

/// Barycentric coordinates of `p` inside the 2D triangle `abc`.
///
/// Returns `None` for degenerate triangles.
pub fn barycentric_coords(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<Vec2> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-12 {
        return None;
    }

    let inv = 1.0 / denom;
    Some(Vec2::new((d11 * d20 - d01 * d21) * inv, (d00 * d21 - d01 * d20) * inv))
}

/// Build an orthonormal tangent-to-world frame whose Z axis is `normal`.
#[inline]
pub fn frame_from_normal(normal: Vec3) -> Mat3 {
    let (tangent, binormal) = normal.any_orthonormal_pair();
    Mat3::from_cols(tangent, binormal, normal)
}

/// Orthonormalize an interpolated tangent frame (Gram-Schmidt on the normal).
///
/// Falls back to an arbitrary frame when the tangent is degenerate.
pub fn orthonormal_frame(tangent: Vec3, binormal: Vec3, normal: Vec3) -> Mat3 {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return Mat3::IDENTITY;
    }

    let t = (tangent - n * n.dot(tangent)).normalize_or_zero();
    if t == Vec3::ZERO {
        return frame_from_normal(n);
    }

    let mut b = n.cross(t);
    if b.dot(binormal) < 0.0 {
        b = -b;
    }
    Mat3::from_cols(t, b, n)
}

/// Position offset along the vertex normals (Hanika's shadow terminator fix).
///
/// Projects the flat position onto the tangent planes of the three
/// vertices and interpolates the result. Used as a shadow-ray origin so
/// coarse tessellation does not shadow itself.
pub fn smooth_position(
    positions: [Vec3; 3],
    normals: [Vec3; 3],
    bary: Vec2,
) -> Vec3 {
    let [pa, pb, pc] = positions;
    let [na, nb, nc] = normals;

    let position = barycentric_lerp(pa, pb, pc, bary);
    let normal = barycentric_lerp(na, nb, nc, bary);

    let proj_a = position - (position - pa).dot(na) * na;
    let proj_b = position - (position - pb).dot(nb) * nb;
    let proj_c = position - (position - pc).dot(nc) * nc;

    let smooth = barycentric_lerp(proj_a, proj_b, proj_c, bary);
    if (smooth - position).dot(normal) > 0.0 {
        smooth
    } else {
        position
    }
}

/// Rec. 709 luminance.
#[inline]
pub fn luminance(color: Color3) -> f32 {
    color.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

/// RGB to HSV, hue in degrees [0, 360).
pub fn rgb_to_hsv(rgb: Color3) -> Vec3 {
    let max = rgb.max_element();
    let min = rgb.min_element();
    let delta = max - min;

    if max <= 0.0 || delta <= 0.0 {
        return Vec3::new(0.0, 0.0, max);
    }

    let mut h = if max == rgb.x {
        60.0 * ((rgb.y - rgb.z) / delta)
    } else if max == rgb.y {
        60.0 * ((rgb.z - rgb.x) / delta) + 120.0
    } else {
        60.0 * ((rgb.x - rgb.y) / delta) + 240.0
    };
    if h < 0.0 {
        h += 360.0;
    }

    Vec3::new(h, delta / max, max)
}

/// HSV (hue in degrees) to RGB.
pub fn hsv_to_rgb(hsv: Vec3) -> Color3 {
    let (h, s, v) = (hsv.x.rem_euclid(360.0), hsv.y, hsv.z);

    let sector = h / 60.0;
    let hi = sector.floor();
    let f = sector - hi;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match hi as u32 % 6 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}

/// True when every component is finite and non-negative.
#[inline]
pub fn is_valid_radiance(color: Color3) -> bool {
    color.is_finite() && color.min_element() >= 0.0
}
