//! Multi-pass bloom post-processing: threshold prefilter, mip-chain blur,
//! and combine, recorded onto a backend-agnostic command recorder.

pub mod engine;
pub mod error;
pub mod frame;
pub mod mip_chain;
pub mod params;
pub mod pass;
pub mod recorder;
pub mod target;

pub use engine::{BloomEngine, PipelineToken};
pub use error::{BloomError, RecorderError};
pub use frame::{
    Allocation, BloomSettings, CameraKind, CameraView, ConfigureOutcome, FrameOutcome,
    FramePassOrchestrator, FrameResources, ResolutionScale,
};
pub use mip_chain::{MAX_MIP_LEVELS, MIP_TARGETS, MipBuffer, MipChain, chain_length};
pub use params::{BloomParameters, MIN_KNEE, ThresholdCurve};
pub use pass::{BloomPass, NoiseBinding, NoiseTexture, PassParams};
pub use recorder::{CommandRecorder, FrameContext, ShaderProgramSet};
pub use target::{
    BLOOM_TARGET, CAMERA_SCRATCH, FilterMode, PixelFormat, RenderTarget, TargetDesc, texel_size,
};
