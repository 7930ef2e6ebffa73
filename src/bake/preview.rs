//! Progressive preview renderer.
//!
//! Renders the scene from a camera by calling [`path_trace`] once per
//! pixel per pass, averaging passes as they accumulate.

use rayon::prelude::*;

use super::integrator::path_trace;
use crate::params::BakeParams;
use crate::random;
use crate::raytrace::RaytracingContext;
use crate::util::{Color3, Quat, Vec3};

/// Pinhole camera looking down its local -Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewCamera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
}

impl PreviewCamera {
    /// Camera at `position` looking at `target` with +Y up.
    pub fn look_at(position: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        let forward = (target - position).normalize_or_zero();
        let rotation = if forward == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let right = if right == Vec3::ZERO { Vec3::X } else { right };
            let up = right.cross(forward);
            Quat::from_mat3(&crate::util::Mat3::from_cols(right, up, -forward))
        };
        Self { position, rotation, fov_y, aspect }
    }

    /// World-space direction through normalized device coordinates in [-1, 1].
    pub fn ray_direction(&self, ndc_x: f32, ndc_y: f32) -> Vec3 {
        let tan_half = (self.fov_y * 0.5).tan();
        let local = Vec3::new(ndc_x * tan_half * self.aspect, ndc_y * tan_half, -1.0);
        (self.rotation * local).normalize()
    }
}

/// Accumulated preview image, row-major from the top.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color3>,
    /// Passes accumulated so far.
    pub progress: u32,
}

impl PreviewFrame {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![Color3::ZERO; width * height],
            progress: 0,
        }
    }

    /// Drop accumulated passes, e.g. after the camera moved.
    pub fn reset(&mut self) {
        self.pixels.fill(Color3::ZERO);
        self.progress = 0;
    }

    /// Trace one jittered sample per pixel and fold it into the running mean.
    #[tracing::instrument(skip_all, fields(width = self.width, height = self.height, progress = self.progress))]
    pub fn accumulate<C>(&mut self, context: &C, camera: &PreviewCamera, params: &BakeParams)
    where
        C: RaytracingContext + ?Sized,
    {
        let (width, height) = (self.width, self.height);
        let weight = 1.0 / (self.progress + 1) as f32;

        self.pixels.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                let ndc_x = ((x as f32 + random::next()) / width as f32) * 2.0 - 1.0;
                let ndc_y = 1.0 - ((y as f32 + random::next()) / height as f32) * 2.0;
                let direction = camera.ray_direction(ndc_x, ndc_y);

                let sample = path_trace(context, camera.position, direction, params, true).radiance;
                *pixel += (sample - *pixel) * weight;
            }
        });

        self.progress += 1;
    }
}
