//! Direction and disk samplers.
//!
//! Every function maps uniforms in [0, 1) to a sample in a local frame with
//! +Z as the surface normal. All of them are pure: the same inputs always
//! produce the same sample, and callers pass fresh uniforms per call.

use crate::util::{saturate, Color3, Vec2, Vec3, GOLDEN_ANGLE, PI};

/// Shirley-Chiu concentric mapping from the unit square to the unit disk.
pub fn square_to_concentric_disk(u1: f32, u2: f32) -> Vec2 {
    let a = 2.0 * u1 - 1.0;
    let b = 2.0 * u2 - 1.0;

    let (r, phi) = if a > -b {
        if a > b {
            (a, (PI / 4.0) * (b / a))
        } else {
            (b, (PI / 4.0) * (2.0 - a / b))
        }
    } else if a < b {
        (-a, (PI / 4.0) * (4.0 + b / a))
    } else if b != 0.0 {
        (-b, (PI / 4.0) * (6.0 - a / b))
    } else {
        (-b, 0.0)
    };

    Vec2::new(r * phi.cos(), r * phi.sin())
}

/// Cosine-weighted hemisphere direction, pdf `cos θ / π`.
pub fn sample_cosine_weighted_hemisphere(u1: f32, u2: f32) -> Vec3 {
    let uv = square_to_concentric_disk(u1, u2);
    let r = uv.length_squared();
    Vec3::new(uv.x, uv.y, (1.0 - r).max(0.0).sqrt())
}

/// Cosine-weighted hemisphere direction jittered inside cell `index` of a
/// `sqrt_count` × `sqrt_count` grid.
pub fn sample_stratified_cosine_weighted_hemisphere(
    index: u32,
    sqrt_count: u32,
    u1: f32,
    u2: f32,
) -> Vec3 {
    let sqrt_count = sqrt_count.max(1);
    let sx = (index % sqrt_count) as f32;
    let sy = ((index / sqrt_count) % sqrt_count) as f32;
    sample_cosine_weighted_hemisphere((sx + u1) / sqrt_count as f32, (sy + u2) / sqrt_count as f32)
}

/// Uniform hemisphere direction, pdf `1 / 2π`.
pub fn sample_direction_hemisphere(u1: f32, u2: f32) -> Vec3 {
    let z = u1;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform sphere direction, pdf `1 / 4π`.
pub fn sample_direction_sphere(u1: f32, u2: f32) -> Vec3 {
    let z = u1 * 2.0 - 1.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// GGX microfacet half-vector around +Z.
///
/// `roughness` is the GGX alpha. Pair with [`ggx_pdf`] for the pdf of the
/// resulting reflected direction.
pub fn sample_ggx_microfacet(roughness: f32, u1: f32, u2: f32) -> Vec3 {
    let theta = (roughness * u1.sqrt()).atan2((1.0 - u1).max(0.0).sqrt());
    let phi = 2.0 * PI * u2;
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Pdf of a direction reflected about a GGX-sampled half-vector `h`.
pub fn ggx_pdf(n: Vec3, h: Vec3, v: Vec3, roughness: f32) -> f32 {
    let n_dot_h = saturate(n.dot(h));
    let h_dot_v = saturate(h.dot(v));
    if h_dot_v <= 0.0 {
        return 0.0;
    }

    let m2 = roughness * roughness;
    let denom = n_dot_h * n_dot_h * (m2 - 1.0) + 1.0;
    let d = m2 / (PI * denom * denom);
    d * n_dot_h / (4.0 * h_dot_v)
}

/// Golden-angle spiral over the sphere: `count` evenly spread directions.
pub fn sample_sphere(index: u32, count: u32) -> Vec3 {
    let y = if count > 1 {
        1.0 - (index as f32 / (count - 1) as f32) * 2.0
    } else {
        0.0
    };
    let radius = (1.0 - y * y).max(0.0).sqrt();
    let theta = GOLDEN_ANGLE * index as f32;
    Vec3::new(theta.cos() * radius, y, theta.sin() * radius)
}

/// Vogel disk sample `index` of `count`, rotated by the shared phase `phi`.
pub fn sample_vogel_disk(index: u32, count: u32, phi: f32) -> Vec2 {
    let radius = ((index as f32 + 0.5) / count.max(1) as f32).sqrt().min(1.0);
    let theta = index as f32 * GOLDEN_ANGLE + phi;
    Vec2::new(radius * theta.cos(), radius * theta.sin())
}

/// Schlick Fresnel with the spherical-gaussian exponent approximation.
#[inline]
pub fn fresnel_schlick(f0: Color3, cos_theta: f32) -> Color3 {
    let p = (-5.55473 * cos_theta - 6.98316) * cos_theta;
    f0 + (Color3::ONE - f0) * p.exp2()
}

/// GGX normal distribution with `alpha = roughness²`.
#[inline]
pub fn ndf_ggx(cos_lh: f32, roughness: f32) -> f32 {
    let alpha = roughness * roughness;
    let alpha_sq = alpha * alpha;
    let denom = (cos_lh * alpha_sq - cos_lh) * cos_lh + 1.0;
    alpha_sq / (PI * denom * denom)
}

/// Schlick-GGX visibility term, including the `1 / (4 cosLo cosLi)` factor.
#[inline]
pub fn vis_schlick(roughness: f32, cos_lo: f32, cos_li: f32) -> f32 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    let schlick_v = cos_lo * (1.0 - k) + k;
    let schlick_l = cos_li * (1.0 - k) + k;
    0.25 / (schlick_v * schlick_l)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: u32) -> impl Iterator<Item = (f32, f32)> {
        (0..n).flat_map(move |i| {
            (0..n).map(move |j| ((i as f32 + 0.5) / n as f32, (j as f32 + 0.5) / n as f32))
        })
    }

    #[test]
    fn test_cosine_hemisphere_unit_and_upper() {
        let corners = [(0.0, 0.0), (0.0, 0.999_999), (0.999_999, 0.0), (0.5, 0.5), (0.999_999, 0.999_999)];
        for (u1, u2) in grid(64).chain(corners) {
            let d = sample_cosine_weighted_hemisphere(u1, u2);
            assert!((0.0..=1.0).contains(&d.z), "z out of range: {d:?}");
            assert!((d.length() - 1.0).abs() <= 1e-4, "not unit: {d:?}");
        }
    }

    #[test]
    fn test_stratified_cells_cover_disk() {
        for i in 0..16 {
            let d = sample_stratified_cosine_weighted_hemisphere(i, 4, 0.5, 0.5);
            assert!(d.z >= 0.0);
            assert!((d.length() - 1.0).abs() <= 1e-4);
        }
    }

    #[test]
    fn test_sphere_and_hemisphere_unit() {
        for (u1, u2) in grid(32) {
            let s = sample_direction_sphere(u1, u2);
            assert!((s.length() - 1.0).abs() <= 1e-4);
            let h = sample_direction_hemisphere(u1, u2);
            assert!((h.length() - 1.0).abs() <= 1e-4);
            assert!(h.z >= 0.0);
        }
    }

    #[test]
    fn test_sphere_covers_both_poles() {
        let zs: Vec<f32> = grid(16).map(|(u1, u2)| sample_direction_sphere(u1, u2).z).collect();
        assert!(zs.iter().any(|&z| z > 0.9));
        assert!(zs.iter().any(|&z| z < -0.9));
    }

    #[test]
    fn test_ggx_sharpens_with_low_roughness() {
        let smooth = sample_ggx_microfacet(0.05, 0.7, 0.3);
        let rough = sample_ggx_microfacet(0.9, 0.7, 0.3);
        assert!((smooth.length() - 1.0).abs() <= 1e-4);
        assert!((rough.length() - 1.0).abs() <= 1e-4);
        assert!(smooth.z > rough.z);
    }

    #[test]
    fn test_ggx_pdf_positive_around_normal() {
        let n = Vec3::Z;
        let v = Vec3::new(0.3, 0.0, 1.0).normalize();
        let h = sample_ggx_microfacet(0.4, 0.2, 0.6);
        let pdf = ggx_pdf(n, h, v, 0.4);
        assert!(pdf > 0.0 && pdf.is_finite());

        // Half-vector facing away from the viewer carries no probability
        assert_eq!(ggx_pdf(n, Vec3::Z, Vec3::NEG_Z, 0.4), 0.0);
    }

    #[test]
    fn test_golden_sphere_unit_and_single_sample() {
        for i in 0..32 {
            let d = sample_sphere(i, 32);
            assert!((d.length() - 1.0).abs() <= 1e-4);
        }
        let single = sample_sphere(0, 1);
        assert!(single.is_finite());
        assert!((single.length() - 1.0).abs() <= 1e-4);
    }

    #[test]
    fn test_vogel_disk_within_unit_radius() {
        for count in [1, 2, 7, 64, 1000] {
            for index in 0..count {
                let phi = index as f32 * 0.37;
                let s = sample_vogel_disk(index, count, phi);
                assert!(s.length() <= 1.0 + 1e-4, "index {index}/{count}: {s:?}");
            }
        }
    }

    #[test]
    fn test_fresnel_limits() {
        let f0 = Color3::splat(0.04);
        assert!((fresnel_schlick(f0, 1.0) - f0).length() < 1e-3);
        assert!(fresnel_schlick(f0, 0.0).x > 0.9);
    }

    #[test]
    fn test_ndf_and_visibility_finite() {
        for cos in [0.0, 0.3, 1.0] {
            assert!(ndf_ggx(cos, 0.5).is_finite());
            assert!(vis_schlick(0.5, cos, cos).is_finite());
        }
    }
}
