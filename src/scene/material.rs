//! Surface materials as seen by the baker.

use std::sync::Arc;

use super::Bitmap;
use crate::util::{Color3, Color4, Vec2};

/// Shading category of a material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterialKind {
    /// Regular lit surface.
    #[default]
    Common,
    /// Sky dome; hits count as environment.
    Sky,
    /// Unlit surface, contributes emission only.
    IgnoreLight,
    /// Two diffuse layers mixed by vertex alpha.
    Blend,
}

/// Optional texture set.
#[derive(Clone, Debug, Default)]
pub struct MaterialTextures {
    pub diffuse: Option<Arc<Bitmap>>,
    pub diffuse_blend: Option<Arc<Bitmap>>,
    pub specular: Option<Arc<Bitmap>>,
    pub gloss: Option<Arc<Bitmap>>,
    pub emission: Option<Arc<Bitmap>>,
}

/// Material parameters.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    /// Diffuse color factor; alpha is opacity.
    pub diffuse: Color4,
    /// Specular reflectance at normal incidence.
    pub specular: Color3,
    /// Glossiness in [0, 1]; roughness is `1 - gloss`.
    pub gloss: f32,
    /// Emitted radiance factor.
    pub emissive: Color3,
    pub double_sided: bool,
    pub textures: MaterialTextures,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: MaterialKind::Common,
            diffuse: Color4::ONE,
            specular: Color3::ZERO,
            gloss: 0.0,
            emissive: Color3::ZERO,
            double_sided: false,
            textures: MaterialTextures::default(),
        }
    }
}

/// Minimum GGX roughness; lower values make the pdf spike to infinity.
pub const MIN_ROUGHNESS: f32 = 0.02;

impl Material {
    /// A plain diffuse material.
    pub fn diffuse(name: impl Into<String>, color: Color3) -> Self {
        Self {
            name: name.into(),
            diffuse: color.extend(1.0),
            ..Default::default()
        }
    }

    /// Diffuse color at `uv`, with the blend layer mixed by `blend_factor`.
    pub fn sample_diffuse(&self, uv: Vec2, blend_factor: f32) -> Color4 {
        let mut color = self.diffuse;

        if let Some(texture) = &self.textures.diffuse {
            let mut texel = texture.pick_color_bilinear(uv);
            if self.kind == MaterialKind::Blend {
                if let Some(blend) = &self.textures.diffuse_blend {
                    texel = texel.lerp(blend.pick_color_bilinear(uv), blend_factor.clamp(0.0, 1.0));
                }
            }
            color *= texel;
        }

        color
    }

    /// Specular reflectance at `uv`.
    pub fn sample_specular(&self, uv: Vec2) -> Color3 {
        match &self.textures.specular {
            Some(texture) => self.specular * texture.pick_color_bilinear(uv).truncate(),
            None => self.specular,
        }
    }

    /// GGX roughness at `uv`, clamped to [`MIN_ROUGHNESS`, 1].
    pub fn sample_roughness(&self, uv: Vec2) -> f32 {
        let gloss = match &self.textures.gloss {
            Some(texture) => self.gloss * texture.pick_color_bilinear(uv).x,
            None => self.gloss,
        };
        (1.0 - gloss).clamp(MIN_ROUGHNESS, 1.0)
    }

    /// Emitted radiance at `uv`.
    pub fn sample_emission(&self, uv: Vec2) -> Color3 {
        match &self.textures.emission {
            Some(texture) => self.emissive * texture.pick_color_bilinear(uv).truncate(),
            None => self.emissive,
        }
    }

    /// Alpha used by occlusion queries: the diffuse texture's point-sampled alpha.
    pub fn sample_alpha(&self, uv: Vec2) -> f32 {
        self.textures
            .diffuse
            .as_ref()
            .map_or(1.0, |texture| texture.pick_alpha(uv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untextured_defaults() {
        let m = Material::diffuse("grey", Color3::splat(0.5));
        assert_eq!(m.sample_diffuse(Vec2::ZERO, 0.0), Color4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(m.sample_alpha(Vec2::ZERO), 1.0);
        assert_eq!(m.sample_roughness(Vec2::ZERO), 1.0);
    }

    #[test]
    fn test_blend_layers_mix() {
        let base = Arc::new(Bitmap::new("base", 1, 1, Color4::ZERO));
        let over = Arc::new(Bitmap::new("over", 1, 1, Color4::ONE));
        let m = Material {
            kind: MaterialKind::Blend,
            textures: MaterialTextures {
                diffuse: Some(base),
                diffuse_blend: Some(over),
                ..Default::default()
            },
            ..Default::default()
        };
        let c = m.sample_diffuse(Vec2::splat(0.5), 0.25);
        assert!((c.x - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_roughness_clamped() {
        let m = Material { gloss: 1.0, ..Default::default() };
        assert_eq!(m.sample_roughness(Vec2::ZERO), MIN_ROUGHNESS);
    }

    #[test]
    fn test_alpha_from_diffuse_texture() {
        let tex = Arc::new(Bitmap::new("cutout", 1, 1, Color4::new(1.0, 1.0, 1.0, 0.25)));
        let m = Material {
            textures: MaterialTextures { diffuse: Some(tex), ..Default::default() },
            ..Default::default()
        };
        assert_eq!(m.sample_alpha(Vec2::ZERO), 0.25);
    }
}
