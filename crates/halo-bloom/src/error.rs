//! Error types for bloom recording and pipeline setup.

use crate::target::{PixelFormat, RenderTarget};

/// Errors reported by a [`CommandRecorder`](crate::CommandRecorder) or by the
/// device that executes its instructions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecorderError {
    /// The backend could not find memory for a new render target.
    #[error("out of memory allocating {target:?} ({width}x{height})")]
    OutOfMemory {
        target: RenderTarget,
        width: u32,
        height: u32,
    },

    /// An instruction referenced a target that is not currently allocated.
    #[error("render target {0:?} is not allocated")]
    MissingTarget(RenderTarget),

    /// Width or height is zero.
    #[error("render target {target:?} must have non-zero size, got {width}x{height}")]
    InvalidSize {
        target: RenderTarget,
        width: u32,
        height: u32,
    },

    /// A copy was requested between targets with different layouts.
    #[error("cannot copy {src:?} ({src_format:?}) into {dst:?} ({dst_format:?})")]
    FormatMismatch {
        src: RenderTarget,
        src_format: PixelFormat,
        dst: RenderTarget,
        dst_format: PixelFormat,
    },

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by [`BloomEngine`](crate::BloomEngine) and
/// [`FramePassOrchestrator`](crate::FramePassOrchestrator).
#[derive(Debug, thiserror::Error)]
pub enum BloomError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    /// The program set was present but could not be turned into pipeline state.
    #[error("bloom program set failed to compile: {message}")]
    Compile { message: String },

    /// `combine` was called before the engine acquired its pipeline state.
    #[error("bloom engine is not initialized")]
    NotInitialized,
}
