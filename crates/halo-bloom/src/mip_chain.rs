//! Mip-chain sizing and the fixed-capacity arena of transient mip buffers.
//!
//! Level `i` of the chain is `resolution >> (i + 1)`. The chain stops at the
//! configured iteration count or as soon as either dimension would fall
//! below two texels, whichever comes first.

use glam::{UVec2, Vec2};

use crate::target::{PixelFormat, RenderTarget, TargetDesc, texel_size};

/// Deepest chain the arena can hold.
pub const MAX_MIP_LEVELS: usize = 16;

const fn mip_targets() -> [RenderTarget; MAX_MIP_LEVELS] {
    let mut targets = [RenderTarget::Transient(0); MAX_MIP_LEVELS];
    let mut i = 0;
    while i < MAX_MIP_LEVELS {
        targets[i] = RenderTarget::Transient(i as u32);
        i += 1;
    }
    targets
}

/// Handle of the transient target backing each mip level.
pub const MIP_TARGETS: [RenderTarget; MAX_MIP_LEVELS] = mip_targets();

/// Number of levels a chain for `resolution` can have with `iterations` requested.
pub fn chain_length(resolution: UVec2, iterations: u32) -> usize {
    let requested = (iterations as usize).min(MAX_MIP_LEVELS);
    (0..requested)
        .take_while(|&level| {
            let shift = level as u32 + 1;
            resolution.x >> shift >= 2 && resolution.y >> shift >= 2
        })
        .count()
}

/// One transient target of the chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MipBuffer {
    pub target: RenderTarget,
    pub size: UVec2,
    pub format: PixelFormat,
}

impl MipBuffer {
    pub fn texel_size(&self) -> Vec2 {
        texel_size(self.size)
    }

    pub fn desc(&self) -> TargetDesc {
        TargetDesc::color(self.size.x, self.size.y, self.format)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ChainKey {
    resolution: UVec2,
    iterations: u32,
    format: PixelFormat,
}

/// Arena of mip buffers indexed by level.
///
/// Layout (sizes and handles) is recomputed only when the resolution,
/// iteration count, or format changes. `live` counts the prefix of levels
/// whose targets are currently allocated on the recorder.
#[derive(Debug)]
pub struct MipChain {
    slots: [Option<MipBuffer>; MAX_MIP_LEVELS],
    len: usize,
    live: usize,
    key: Option<ChainKey>,
}

impl Default for MipChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MipChain {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_MIP_LEVELS],
            len: 0,
            live: 0,
            key: None,
        }
    }

    /// Lay out the chain for `resolution`. Returns `true` if the layout changed.
    pub fn rebuild(&mut self, resolution: UVec2, iterations: u32, format: PixelFormat) -> bool {
        let key = ChainKey {
            resolution,
            iterations,
            format,
        };
        if self.key == Some(key) {
            return false;
        }

        let len = chain_length(resolution, iterations);
        for (level, slot) in self.slots.iter_mut().enumerate() {
            *slot = (level < len).then(|| MipBuffer {
                target: MIP_TARGETS[level],
                size: resolution >> (level as u32 + 1),
                format,
            });
        }
        self.len = len;
        self.key = Some(key);

        log::debug!(
            "Bloom mip chain rebuilt: {}x{} -> {len} levels",
            resolution.x,
            resolution.y
        );
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, level: usize) -> Option<&MipBuffer> {
        self.slots.get(level)?.as_ref()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MipBuffer> {
        self.slots[..self.len].iter().flatten()
    }

    /// Number of levels allocated on the recorder right now.
    pub fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn mark_allocated(&mut self, level: usize) {
        debug_assert_eq!(level, self.live, "mip levels are allocated in order");
        self.live = level + 1;
    }

    /// Targets allocated since the last [`clear_live`](Self::clear_live).
    pub fn live_targets(&self) -> impl Iterator<Item = RenderTarget> + '_ {
        self.slots[..self.live].iter().flatten().map(|b| b.target)
    }

    pub(crate) fn clear_live(&mut self) {
        self.live = 0;
    }
}
