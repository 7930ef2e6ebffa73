//! Texture storage with point and bilinear sampling.

use crate::util::{Color4, Vec2};

/// 2D RGBA float texture.
///
/// Texels are stored row-major, linear color. UV addressing wraps.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<Color4>,
}

impl Bitmap {
    /// Create a bitmap filled with `fill`.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fill: Color4) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            name: name.into(),
            width,
            height,
            data: vec![fill; (width * height) as usize],
        }
    }

    /// Create a bitmap from row-major texels.
    ///
    /// Returns `None` when `data` does not hold `width * height` texels.
    pub fn from_data(name: impl Into<String>, width: u32, height: u32, data: Vec<Color4>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != (width * height) as usize {
            return None;
        }
        Some(Self { name: name.into(), width, height, data })
    }

    #[inline]
    fn texel(&self, x: i64, y: i64) -> Color4 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.data[y * self.width as usize + x]
    }

    /// Write texel `(x, y)`; out-of-range coordinates are ignored.
    pub fn put_color(&mut self, x: u32, y: u32, color: Color4) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = color;
        }
    }

    /// Nearest-texel lookup.
    pub fn pick_color(&self, uv: Vec2) -> Color4 {
        let x = (uv.x * self.width as f32).floor();
        let y = (uv.y * self.height as f32).floor();
        if !x.is_finite() || !y.is_finite() {
            return self.data[0];
        }
        self.texel(x as i64, y as i64)
    }

    /// Nearest-texel alpha.
    #[inline]
    pub fn pick_alpha(&self, uv: Vec2) -> f32 {
        self.pick_color(uv).w
    }

    /// Bilinear lookup between the four nearest texel centres.
    pub fn pick_color_bilinear(&self, uv: Vec2) -> Color4 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        if !x.is_finite() || !y.is_finite() {
            return self.data[0];
        }

        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}
