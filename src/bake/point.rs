//! Bake point abstraction.
//!
//! A bake point is one sample location (lightmap texel, light-field probe)
//! that accumulates lighting. The orchestrator is generic over
//! [`BakePoint`]; the point type decides how directions are sampled, how
//! samples are projected onto its basis and how the sum is normalized.

use std::ops::BitOr;

use crate::util::{Color3, Mat3, Vec3};

/// Capability set of a bake point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BakePointFlags(u8);

impl BakePointFlags {
    pub const NONE: Self = Self(0);
    /// Apply ambient occlusion to the colors.
    pub const AO: Self = Self(1 << 0);
    /// Estimate sun visibility into `shadow`.
    pub const SHADOW: Self = Self(1 << 1);
    /// Jitter shadow rays over the sun disk.
    pub const SOFT_SHADOW: Self = Self(1 << 2);
    /// Discard points whose samples mostly hit backfaces.
    pub const DISCARD_BACKFACE: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for BakePointFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// State shared by every point type: placement, frame and accumulators.
#[derive(Debug, Clone, PartialEq)]
pub struct PointState<const N: usize> {
    pub position: Vec3,
    /// Shadow-ray origin, pushed off coarse tessellation.
    pub smooth_position: Vec3,
    pub tangent_to_world: Mat3,
    pub colors: [Color3; N],
    pub shadow: f32,
    pub valid: bool,
}

impl<const N: usize> Default for PointState<N> {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            smooth_position: Vec3::ZERO,
            tangent_to_world: Mat3::IDENTITY,
            colors: [Color3::ZERO; N],
            shadow: 0.0,
            valid: true,
        }
    }
}

impl<const N: usize> PointState<N> {
    /// State at `position` with the given frame; smooth position defaults
    /// to the position.
    pub fn new(position: Vec3, tangent_to_world: Mat3) -> Self {
        Self {
            position,
            smooth_position: position,
            tangent_to_world,
            ..Default::default()
        }
    }

    /// Zero the accumulators.
    pub fn reset(&mut self) {
        self.colors = [Color3::ZERO; N];
        self.shadow = 0.0;
    }
}

/// A mutable accumulation target for the baker.
///
/// Capabilities are associated constants, so branches on them resolve at
/// monomorphization.
pub trait BakePoint: Send {
    /// Number of color accumulators.
    const BASIS_COUNT: usize;
    /// Passes the orchestrator runs for this type.
    const FLAGS: BakePointFlags;

    /// Tangent-space direction for sample `index` of `sample_count`.
    fn sample_direction(index: u32, sample_count: u32, u1: f32, u2: f32) -> Vec3;

    fn position(&self) -> Vec3;
    fn smooth_position(&self) -> Vec3;
    fn tangent_to_world(&self) -> Mat3;
    fn colors(&self) -> &[Color3];
    fn colors_mut(&mut self) -> &mut [Color3];
    fn shadow(&self) -> f32;
    fn set_shadow(&mut self, shadow: f32);

    /// Whether the point takes part in the bake and the output.
    fn valid(&self) -> bool;

    /// Reset transient per-bake state.
    fn begin(&mut self);

    /// Accumulate one radiance sample arriving from `world_dir`.
    fn add_sample(&mut self, color: Color3, tangent_dir: Vec3, world_dir: Vec3);

    /// Normalize the accumulators after `sample_count` samples.
    fn end(&mut self, sample_count: u32);

    /// Exclude the point from the output.
    fn discard(&mut self);
}

/// Implements the state accessors of [`BakePoint`] by forwarding to a
/// `state: PointState<N>` field.
macro_rules! forward_point_state {
    () => {
        #[inline]
        fn position(&self) -> $crate::util::Vec3 {
            self.state.position
        }

        #[inline]
        fn smooth_position(&self) -> $crate::util::Vec3 {
            self.state.smooth_position
        }

        #[inline]
        fn tangent_to_world(&self) -> $crate::util::Mat3 {
            self.state.tangent_to_world
        }

        #[inline]
        fn colors(&self) -> &[$crate::util::Color3] {
            &self.state.colors
        }

        #[inline]
        fn colors_mut(&mut self) -> &mut [$crate::util::Color3] {
            &mut self.state.colors
        }

        #[inline]
        fn shadow(&self) -> f32 {
            self.state.shadow
        }

        #[inline]
        fn set_shadow(&mut self, shadow: f32) {
            self.state.shadow = shadow;
        }

        #[inline]
        fn valid(&self) -> bool {
            self.state.valid
        }

        #[inline]
        fn begin(&mut self) {
            self.state.reset();
        }

        #[inline]
        fn discard(&mut self) {
            self.state.valid = false;
        }
    };
}

pub(crate) use forward_point_state;

/// Iterate the points that survived the bake.
pub fn valid_points<P: BakePoint>(points: &[P]) -> impl Iterator<Item = &P> {
    points.iter().filter(|point| point.valid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_contains() {
        let flags = BakePointFlags::AO | BakePointFlags::SHADOW;
        assert!(flags.contains(BakePointFlags::AO));
        assert!(flags.contains(BakePointFlags::SHADOW));
        assert!(!flags.contains(BakePointFlags::SOFT_SHADOW));
        assert!(flags.contains(BakePointFlags::NONE));
        assert!(BakePointFlags::ALL.contains(flags | BakePointFlags::DISCARD_BACKFACE));
    }

    #[test]
    fn test_state_reset() {
        let mut state = PointState::<2>::new(Vec3::ONE, Mat3::IDENTITY);
        assert_eq!(state.smooth_position, Vec3::ONE);
        assert!(state.valid);

        state.colors[1] = Color3::ONE;
        state.shadow = 0.5;
        state.reset();
        assert_eq!(state.colors, [Color3::ZERO; 2]);
        assert_eq!(state.shadow, 0.0);
    }
}
