//! Seams to the surrounding graphics layer.

use crate::error::{BloomError, RecorderError};
use crate::pass::PassParams;
use crate::target::{FilterMode, RenderTarget, TargetDesc};

/// Ordered instruction sink for one frame.
///
/// Implementations may execute instructions eagerly or defer them until
/// [`FrameContext::submit`]; callers only rely on the recorded order.
pub trait CommandRecorder {
    /// Compiled pipeline state the recorder's blits run with.
    type Pipeline;

    /// Allocate `target` with the given descriptor. Allocating a target that
    /// is already live replaces it.
    fn allocate(&mut self, target: RenderTarget, desc: &TargetDesc) -> Result<(), RecorderError>;

    /// Release `target`. Releasing a target that is not live is a no-op.
    fn release(&mut self, target: RenderTarget);

    /// Change how `target` is sampled without reallocating it.
    fn set_filter_mode(&mut self, target: RenderTarget, filter: FilterMode);

    /// Plain copy of `src` into `dst`, no program involved.
    fn copy(&mut self, src: RenderTarget, dst: RenderTarget) -> Result<(), RecorderError>;

    /// Run the pass selected by `params` reading `src` and writing `dst`.
    fn blit(
        &mut self,
        src: RenderTarget,
        dst: RenderTarget,
        pipeline: &Self::Pipeline,
        params: &PassParams,
    ) -> Result<(), RecorderError>;

    /// Drop all recorded instructions.
    fn clear(&mut self);
}

/// A set of bloom kernels that can be compiled into pipeline state once.
pub trait ShaderProgramSet {
    type Pipeline;

    fn compile(self) -> Result<Self::Pipeline, BloomError>;
}

/// Render-target provider and recorder pool of the surrounding renderer.
pub trait FrameContext {
    type Recorder: CommandRecorder;

    /// Take an empty recorder from the pool.
    fn acquire_recorder(&mut self) -> Self::Recorder;

    /// Hand the recorded instructions to the graphics layer.
    fn submit(&mut self, recorder: &mut Self::Recorder) -> Result<(), RecorderError>;

    /// Return a cleared recorder to the pool.
    fn release_recorder(&mut self, recorder: Self::Recorder);
}
