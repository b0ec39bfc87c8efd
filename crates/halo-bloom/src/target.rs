//! Render-target identifiers and descriptors.
//!
//! The core never looks inside a target. It only routes [`RenderTarget`]
//! handles through allocation, copy, and blit instructions, and compares
//! [`TargetDesc`] values to decide when a persistent allocation is stale.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Opaque handle naming a render target known to the recorder.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RenderTarget {
    /// The camera's color buffer, owned by the surrounding renderer.
    CameraColor,
    /// A target that survives across frames until its descriptor changes.
    Persistent(u32),
    /// A short-lived target allocated and released within one frame.
    Transient(u32),
    /// A texture imported from outside the frame graph (e.g. dither noise).
    Imported(u32),
}

impl RenderTarget {
    /// Whether the handle refers to a transient scratch target.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The bloom output target.
pub const BLOOM_TARGET: RenderTarget = RenderTarget::Persistent(0);

/// Working copy of the camera color buffer.
pub const CAMERA_SCRATCH: RenderTarget = RenderTarget::Persistent(1);

/// Pixel storage format of a render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    /// Half-precision RGBA. Default for bloom targets.
    #[default]
    Rgba16Float,
    Rgba32Float,
}

impl PixelFormat {
    /// Whether the format can hold values above 1.0.
    pub fn is_hdr(self) -> bool {
        matches!(self, Self::Rgba16Float | Self::Rgba32Float)
    }

    /// Bytes per texel.
    pub fn texel_size_bytes(self) -> u32 {
        match self {
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb | Self::Bgra8Unorm | Self::Bgra8UnormSrgb => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

/// Sampling filter used when a target is read.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
}

/// Allocation descriptor for a render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TargetDesc {
    pub width: u32,
    pub height: u32,
    pub depth_bits: u32,
    /// Number of mip levels; 0 means the target has no mip chain of its own.
    pub mip_count: u32,
    pub filter: FilterMode,
    pub format: PixelFormat,
}

impl TargetDesc {
    /// Color-only, single-level, bilinear descriptor.
    pub fn color(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            depth_bits: 0,
            mip_count: 0,
            filter: FilterMode::Bilinear,
            format,
        }
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Whether an allocation made for `self` can be reused for `other`
    /// without reallocating. Filter mode is a sampling property and never
    /// forces a reallocation.
    pub fn is_compatible(&self, other: &TargetDesc) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.format == other.format
            && self.depth_bits == other.depth_bits
            && self.mip_count == other.mip_count
    }

    /// Number of texels covered by the base level.
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Size of one texel in normalized coordinates for a `size.x` by `size.y` target.
pub fn texel_size(size: UVec2) -> Vec2 {
    Vec2::new(1.0 / size.x as f32, 1.0 / size.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texel_size_is_reciprocal() {
        let t = texel_size(UVec2::new(960, 540));
        assert_eq!(t, Vec2::new(1.0 / 960.0, 1.0 / 540.0));
        assert_eq!(texel_size(UVec2::new(960, 540)), t);
    }

    #[test]
    fn test_filter_mode_does_not_break_compatibility() {
        let a = TargetDesc::color(640, 360, PixelFormat::Rgba16Float);
        let b = TargetDesc {
            filter: FilterMode::Point,
            ..a
        };
        assert!(a.is_compatible(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_size_or_format_change_is_incompatible() {
        let a = TargetDesc::color(640, 360, PixelFormat::Rgba16Float);
        assert!(!a.is_compatible(&TargetDesc::color(641, 360, PixelFormat::Rgba16Float)));
        assert!(!a.is_compatible(&TargetDesc::color(640, 360, PixelFormat::Rgba8Unorm)));
    }

    #[test]
    fn test_well_known_targets_are_distinct() {
        assert_ne!(BLOOM_TARGET, CAMERA_SCRATCH);
        assert!(!BLOOM_TARGET.is_transient());
        assert!(RenderTarget::Transient(0).is_transient());
    }

    #[test]
    fn test_hdr_formats() {
        assert!(PixelFormat::Rgba16Float.is_hdr());
        assert!(!PixelFormat::Bgra8UnormSrgb.is_hdr());
        assert_eq!(PixelFormat::default(), PixelFormat::Rgba16Float);
        assert_eq!(PixelFormat::Rgba32Float.texel_size_bytes(), 16);
    }
}
