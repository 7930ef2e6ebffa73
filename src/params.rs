//! Bake configuration.
//!
//! [`BakeParams`] is read-only during a bake. It serializes to JSON with
//! every field optional on load; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::{Color3, Error, Result};

/// Engine the baked data is produced for. Selects the sky model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetEngine {
    /// Flat environment color.
    #[default]
    He1,
    /// Procedural ground-to-zenith gradient.
    He2,
}

/// Parameters of a bake job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeParams {
    pub target_engine: TargetEngine,

    // Environment
    pub environment_color: Color3,
    pub environment_color_intensity: f32,
    pub secondary_environment_color: Color3,
    pub sky_intensity: f32,

    // Light transport
    pub light_bounce_count: u32,
    pub light_sample_count: u32,
    pub russian_roulette_max_depth: u32,

    // Shadows
    pub shadow_sample_count: u32,
    pub shadow_search_radius: f32,
    pub shadow_bias: f32,
    /// Maximum hits followed by one shadow ray through stacked
    /// translucent layers. Guards against self-intersecting geometry.
    pub shadow_march_limit: u32,

    // Ambient occlusion
    pub ao_sample_count: u32,
    pub ao_fade_constant: f32,
    pub ao_fade_linear: f32,
    pub ao_fade_quadratic: f32,
    pub ao_strength: f32,

    // Material response
    pub diffuse_strength: f32,
    pub diffuse_saturation: f32,
    pub light_strength: f32,
    pub emission_strength: f32,
}

impl Default for BakeParams {
    fn default() -> Self {
        let environment = Color3::new(106.0 / 255.0, 113.0 / 255.0, 179.0 / 255.0);
        Self {
            target_engine: TargetEngine::He1,
            environment_color: environment,
            environment_color_intensity: 1.0,
            secondary_environment_color: environment,
            sky_intensity: 1.0,
            light_bounce_count: 10,
            light_sample_count: 32,
            russian_roulette_max_depth: 4,
            shadow_sample_count: 64,
            shadow_search_radius: 0.01,
            shadow_bias: 0.001,
            shadow_march_limit: 8,
            ao_sample_count: 64,
            ao_fade_constant: 1.0,
            ao_fade_linear: 0.01,
            ao_fade_quadratic: 0.01,
            ao_strength: 0.0,
            diffuse_strength: 1.0,
            diffuse_saturation: 1.0,
            light_strength: 1.0,
            emission_strength: 1.0,
        }
    }
}

impl BakeParams {
    /// Defaults for `target_engine`.
    pub fn new(target_engine: TargetEngine) -> Self {
        Self { target_engine, ..Default::default() }
    }

    /// Parse from JSON and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load from a JSON file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check ranges the integrator relies on.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("light_bounce_count", self.light_bounce_count),
            ("light_sample_count", self.light_sample_count),
            ("shadow_sample_count", self.shadow_sample_count),
            ("shadow_march_limit", self.shadow_march_limit),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(Error::params(format!("{name} must be > 0")));
            }
        }

        let scalars = [
            ("environment_color_intensity", self.environment_color_intensity),
            ("sky_intensity", self.sky_intensity),
            ("shadow_search_radius", self.shadow_search_radius),
            ("shadow_bias", self.shadow_bias),
            ("ao_fade_constant", self.ao_fade_constant),
            ("ao_fade_linear", self.ao_fade_linear),
            ("ao_fade_quadratic", self.ao_fade_quadratic),
            ("ao_strength", self.ao_strength),
            ("diffuse_strength", self.diffuse_strength),
            ("diffuse_saturation", self.diffuse_saturation),
            ("light_strength", self.light_strength),
            ("emission_strength", self.emission_strength),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::params(format!("{name} must be finite and >= 0, got {value}")));
            }
        }

        if self.ao_fade_constant + self.ao_fade_linear + self.ao_fade_quadratic <= 0.0 {
            return Err(Error::params("AO fade coefficients are all zero"));
        }

        for (name, color) in [
            ("environment_color", self.environment_color),
            ("secondary_environment_color", self.secondary_environment_color),
        ] {
            if !color.is_finite() || color.min_element() < 0.0 {
                return Err(Error::params(format!("{name} must be finite and >= 0")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = BakeParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.shadow_march_limit, 8);
        assert_eq!(params.light_sample_count, 32);
        assert_eq!(BakeParams::new(TargetEngine::He2).target_engine, TargetEngine::He2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params = BakeParams::from_json_str(r#"{ "light_sample_count": 8, "target_engine": "He2" }"#).unwrap();
        assert_eq!(params.light_sample_count, 8);
        assert_eq!(params.target_engine, TargetEngine::He2);
        assert_eq!(params.shadow_sample_count, 64);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let params = BakeParams { light_sample_count: 0, ..Default::default() };
        assert!(matches!(params.validate(), Err(Error::InvalidParams(_))));

        let params = BakeParams { ao_strength: f32::NAN, ..Default::default() };
        assert!(params.validate().is_err());

        let params = BakeParams {
            ao_fade_constant: 0.0,
            ao_fade_linear: 0.0,
            ao_fade_quadratic: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(BakeParams::from_json_str("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_save_load_file() {
        let temp = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let params = BakeParams {
            ao_strength: 0.5,
            shadow_march_limit: 4,
            ..BakeParams::new(TargetEngine::He2)
        };
        params.save(temp.path()).unwrap();
        let loaded = BakeParams::load(temp.path()).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_load_missing_file() {
        let err = BakeParams::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
