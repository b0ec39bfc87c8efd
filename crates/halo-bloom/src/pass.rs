//! Pass selection and the explicit per-pass parameter block.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::params::ThresholdCurve;
use crate::target::RenderTarget;

/// The five kernels of the bloom program set, in pass-index order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BloomPass {
    Prefilter = 0,
    Downsample = 1,
    Upsample = 2,
    Final = 3,
    Combine = 4,
}

impl BloomPass {
    pub const COUNT: usize = 5;

    pub const ALL: [BloomPass; Self::COUNT] = [
        Self::Prefilter,
        Self::Downsample,
        Self::Upsample,
        Self::Final,
        Self::Combine,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Prefilter => "bloom-prefilter",
            Self::Downsample => "bloom-downsample",
            Self::Upsample => "bloom-upsample",
            Self::Final => "bloom-final",
            Self::Combine => "bloom-combine",
        }
    }
}

/// An imported dither-noise texture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseTexture {
    pub target: RenderTarget,
    pub width: u32,
    pub height: u32,
}

impl NoiseTexture {
    /// Scale that tiles the noise once per noise texel across `viewport`.
    pub fn screen_scale(&self, viewport: UVec2) -> Vec2 {
        Vec2::new(
            viewport.x as f32 / self.width.max(1) as f32,
            viewport.y as f32 / self.height.max(1) as f32,
        )
    }
}

/// Noise texture plus the scale it is sampled with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseBinding {
    pub texture: RenderTarget,
    pub scale: Vec2,
}

/// Inputs of a single blit. Every value a kernel reads travels here, so no
/// pass depends on state left behind by an earlier one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassParams {
    Prefilter {
        curve: ThresholdCurve,
    },
    Downsample {
        /// Texel size of the blit source.
        texel_size: Vec2,
    },
    Upsample {
        texel_size: Vec2,
    },
    Final {
        intensity: f32,
        texel_size: Vec2,
    },
    Combine {
        /// Unmodified scene color the bloom is added onto.
        source: RenderTarget,
        noise: Option<NoiseBinding>,
    },
}

impl PassParams {
    pub fn pass(&self) -> BloomPass {
        match self {
            Self::Prefilter { .. } => BloomPass::Prefilter,
            Self::Downsample { .. } => BloomPass::Downsample,
            Self::Upsample { .. } => BloomPass::Upsample,
            Self::Final { .. } => BloomPass::Final,
            Self::Combine { .. } => BloomPass::Combine,
        }
    }

    /// Source texel size for passes that filter their input.
    pub fn texel_size(&self) -> Option<Vec2> {
        match *self {
            Self::Downsample { texel_size }
            | Self::Upsample { texel_size }
            | Self::Final { texel_size, .. } => Some(texel_size),
            Self::Prefilter { .. } | Self::Combine { .. } => None,
        }
    }
}
