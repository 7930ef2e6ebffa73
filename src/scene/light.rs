//! Scene lights.

use crate::util::{frame_from_normal, Color3, Mat3, Vec3};

/// Light category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightType {
    /// Infinitely distant light (the sun).
    #[default]
    Directional,
    /// Local light with a range; ignored by the baker core.
    Point,
}

/// A light source.
///
/// For directional lights `position_or_direction` is the direction the
/// light travels, so the direction *toward* the light is its negation.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub position_or_direction: Vec3,
    pub color: Color3,
    pub inner_range: f32,
    pub outer_range: f32,
}

impl Light {
    /// Directional light travelling along `direction`.
    pub fn directional(direction: Vec3, color: Color3) -> Self {
        Self {
            light_type: LightType::Directional,
            position_or_direction: direction.normalize_or_zero(),
            color,
            inner_range: 0.0,
            outer_range: 0.0,
        }
    }

    /// Point light at `position`.
    pub fn point(position: Vec3, color: Color3, inner_range: f32, outer_range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position_or_direction: position,
            color,
            inner_range,
            outer_range,
        }
    }

    /// Frame whose Z axis is the light's travel direction.
    pub fn tangent_to_world(&self) -> Mat3 {
        let z = self.position_or_direction.normalize_or_zero();
        if z == Vec3::ZERO {
            return Mat3::IDENTITY;
        }
        frame_from_normal(z)
    }
}
