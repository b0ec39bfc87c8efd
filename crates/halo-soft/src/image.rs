//! Linear RGBA float images with texture-style sampling.

use glam::{UVec2, Vec2, Vec4};
use halo_bloom::{FilterMode, PixelFormat, TargetDesc};

/// How out-of-range texel coordinates are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
    Clamp,
    Repeat,
}

/// A render target's contents.
///
/// Pixels are stored as `f32` RGBA. Writes through [`Image::store`] are
/// quantized to what the image's [`PixelFormat`] can hold.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    filter: FilterMode,
    pixels: Vec<Vec4>,
}

impl Image {
    /// Black image laid out per `desc`.
    pub fn new(desc: &TargetDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            filter: desc.filter,
            pixels: vec![Vec4::ZERO; desc.texel_count()],
        }
    }

    pub fn filled(width: u32, height: u32, format: PixelFormat, color: Vec4) -> Self {
        Self::from_fn(width, height, format, |_, _| color)
    }

    pub fn from_fn(
        width: u32,
        height: u32,
        format: PixelFormat,
        mut f: impl FnMut(u32, u32) -> Vec4,
    ) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(quantize(format, f(x, y)));
            }
        }
        Self {
            width,
            height,
            format,
            filter: FilterMode::Bilinear,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[self.index(x, y)]
    }

    /// Write `color`, quantized to the image format.
    pub fn store(&mut self, x: u32, y: u32, color: Vec4) {
        let i = self.index(x, y);
        self.pixels[i] = quantize(self.format, color);
    }

    /// Texture-space coordinate of the center of pixel `(x, y)`.
    pub fn uv(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    /// Sample at normalized `uv` using the image's filter mode.
    pub fn sample(&self, uv: Vec2, address: AddressMode) -> Vec4 {
        let p = uv * self.size().as_vec2();
        match self.filter {
            FilterMode::Point => self.fetch(p.x.floor() as i64, p.y.floor() as i64, address),
            FilterMode::Bilinear => {
                let p = p - Vec2::splat(0.5);
                let base = p.floor();
                let f = p - base;
                let (x0, y0) = (base.x as i64, base.y as i64);
                let top = self
                    .fetch(x0, y0, address)
                    .lerp(self.fetch(x0 + 1, y0, address), f.x);
                let bottom = self
                    .fetch(x0, y0 + 1, address)
                    .lerp(self.fetch(x0 + 1, y0 + 1, address), f.x);
                top.lerp(bottom, f.y)
            }
        }
    }

    /// Copy pixels from `other`, which must have the same size.
    pub(crate) fn copy_from(&mut self, other: &Image) {
        debug_assert_eq!(self.size(), other.size());
        for (dst, src) in self.pixels.iter_mut().zip(&other.pixels) {
            *dst = quantize(self.format, *src);
        }
    }

    fn fetch(&self, x: i64, y: i64, address: AddressMode) -> Vec4 {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match address {
            AddressMode::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
            AddressMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
        };
        self.pixels[(y * w + x) as usize]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Round `color` to what `format` can represent.
pub fn quantize(format: PixelFormat, color: Vec4) -> Vec4 {
    if format.is_hdr() {
        color
    } else {
        (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round() / 255.0
    }
}
