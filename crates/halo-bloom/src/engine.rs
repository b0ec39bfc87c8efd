//! The bloom pass sequence: prefilter, downsample chain, upsample chain,
//! final, and combine.
//!
//! ```text
//! source ──prefilter──▶ destination ──down──▶ mip0 ──down──▶ mip1 ─ … ─▶ mipN
//!                                             mip0 ◀──up──── mip1 ◀ … ◀──┘
//! mip0 ──final──▶ destination          destination ──combine──▶ camera
//! ```

use glam::UVec2;

use crate::error::BloomError;
use crate::mip_chain::{MAX_MIP_LEVELS, MipChain};
use crate::params::BloomParameters;
use crate::pass::{NoiseBinding, NoiseTexture, PassParams};
use crate::recorder::{CommandRecorder, ShaderProgramSet};
use crate::target::{PixelFormat, RenderTarget, texel_size};

/// Compiled pipeline state, acquired at most once per engine lifetime.
///
/// Holding a token is what makes an engine able to record passes.
#[derive(Debug)]
pub struct PipelineToken<P> {
    state: P,
}

impl<P> PipelineToken<P> {
    /// Compile `programs` into a token.
    pub fn acquire<S>(programs: S) -> Result<Self, BloomError>
    where
        S: ShaderProgramSet<Pipeline = P>,
    {
        Ok(Self {
            state: programs.compile()?,
        })
    }

    pub fn state(&self) -> &P {
        &self.state
    }
}

/// Records the bloom pass sequence onto a [`CommandRecorder`].
#[derive(Debug)]
pub struct BloomEngine<P> {
    params: BloomParameters,
    pipeline: Option<PipelineToken<P>>,
    chain: MipChain,
}

impl<P> Default for BloomEngine<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> BloomEngine<P> {
    pub fn new() -> Self {
        Self {
            params: BloomParameters::default(),
            pipeline: None,
            chain: MipChain::new(),
        }
    }

    /// Acquire pipeline state from `programs` if not already done.
    ///
    /// `None` leaves the engine disabled: every later [`apply`](Self::apply)
    /// records nothing. Once ready, further calls drop their argument
    /// without compiling it.
    pub fn initialize<S>(&mut self, programs: Option<S>) -> Result<(), BloomError>
    where
        S: ShaderProgramSet<Pipeline = P>,
    {
        if self.pipeline.is_some() {
            return Ok(());
        }
        let Some(programs) = programs else {
            log::debug!("Bloom has no program set; effect disabled");
            return Ok(());
        };
        self.pipeline = Some(PipelineToken::acquire(programs)?);
        log::debug!("Bloom pipeline state acquired");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn pipeline(&self) -> Option<&PipelineToken<P>> {
        self.pipeline.as_ref()
    }

    /// Drop the pipeline state. Safe to call at any time.
    pub fn dispose(&mut self) {
        if self.pipeline.take().is_some() {
            log::debug!("Bloom pipeline state released");
        }
    }

    /// Replace the per-frame parameters. Iterations past [`MAX_MIP_LEVELS`]
    /// are kept but the chain stops at the limit.
    pub fn set_parameters(&mut self, params: BloomParameters) {
        if params.iterations as usize > MAX_MIP_LEVELS {
            log::warn!(
                "Bloom iterations {} exceed the supported maximum of {MAX_MIP_LEVELS}",
                params.iterations
            );
        }
        self.params = params;
    }

    pub fn parameters(&self) -> &BloomParameters {
        &self.params
    }

    pub fn mip_chain(&self) -> &MipChain {
        &self.chain
    }

    /// Record prefilter, downsample, upsample, and final passes that leave
    /// the intensity-scaled bloom in `destination`.
    ///
    /// Mip buffers stay allocated until [`release_buffers`](Self::release_buffers).
    /// If an allocation fails, buffers allocated so far remain tracked and
    /// the error is returned.
    pub fn apply<R>(
        &mut self,
        recorder: &mut R,
        source: RenderTarget,
        destination: RenderTarget,
        resolution: UVec2,
        format: PixelFormat,
    ) -> Result<(), BloomError>
    where
        R: CommandRecorder<Pipeline = P>,
    {
        let Some(token) = self.pipeline.as_ref() else {
            return Ok(());
        };
        let pipeline = token.state();

        if self.chain.live() > 0 {
            log::warn!(
                "Bloom apply called with {} mip buffers still live; releasing them",
                self.chain.live()
            );
            for target in self.chain.live_targets() {
                recorder.release(target);
            }
            self.chain.clear_live();
        }

        self.chain.rebuild(resolution, self.params.iterations, format);

        for level in 0..self.chain.len() {
            let Some(buffer) = self.chain.get(level).copied() else {
                break;
            };
            recorder.allocate(buffer.target, &buffer.desc())?;
            self.chain.mark_allocated(level);
        }

        recorder.blit(
            source,
            destination,
            pipeline,
            &PassParams::Prefilter {
                curve: self.params.curve(),
            },
        )?;

        let mut last = destination;
        let mut last_texel = texel_size(resolution);
        for buffer in self.chain.iter() {
            recorder.blit(
                last,
                buffer.target,
                pipeline,
                &PassParams::Downsample {
                    texel_size: last_texel,
                },
            )?;
            last = buffer.target;
            last_texel = buffer.texel_size();
        }

        for buffer in self.chain.iter().rev().skip(1) {
            recorder.blit(
                last,
                buffer.target,
                pipeline,
                &PassParams::Upsample {
                    texel_size: last_texel,
                },
            )?;
            last = buffer.target;
            last_texel = buffer.texel_size();
        }

        recorder.blit(
            last,
            destination,
            pipeline,
            &PassParams::Final {
                intensity: self.params.intensity,
                texel_size: last_texel,
            },
        )?;

        log::trace!(
            "Bloom recorded {} levels at {}x{}",
            self.chain.len(),
            resolution.x,
            resolution.y
        );
        Ok(())
    }

    /// Release every mip buffer allocated by the most recent [`apply`](Self::apply).
    pub fn release_buffers<R>(&mut self, recorder: &mut R)
    where
        R: CommandRecorder<Pipeline = P>,
    {
        for target in self.chain.live_targets() {
            recorder.release(target);
        }
        self.chain.clear_live();
    }

    /// Add `bloom_target` onto `source`, dither, and write `destination`.
    pub fn combine<R>(
        &self,
        recorder: &mut R,
        source: RenderTarget,
        destination: RenderTarget,
        bloom_target: RenderTarget,
        noise: Option<&NoiseTexture>,
        viewport: UVec2,
    ) -> Result<(), BloomError>
    where
        R: CommandRecorder<Pipeline = P>,
    {
        let token = self.pipeline.as_ref().ok_or(BloomError::NotInitialized)?;
        let noise = noise.map(|n| NoiseBinding {
            texture: n.target,
            scale: n.screen_scale(viewport),
        });
        recorder.blit(
            bloom_target,
            destination,
            token.state(),
            &PassParams::Combine { source, noise },
        )?;
        Ok(())
    }
}
