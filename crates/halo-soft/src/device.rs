use std::borrow::Cow;

use halo_bloom::{
    CommandRecorder, FrameContext, NoiseTexture, PassParams, RecorderError, RenderTarget,
};
use rustc_hash::FxHashMap;

use crate::image::Image;
use crate::kernels::PassInputs;
use crate::noise::white_noise;
use crate::program::SoftPipeline;
use crate::recorder::{Command, SoftRecorder};

/// In-memory render target store that executes [`SoftRecorder`] instruction
/// lists.
///
/// Allocated targets count against an optional texel budget; imported
/// targets (the camera color, noise) do not.
#[derive(Debug, Default)]
pub struct SoftDevice {
    targets: FxHashMap<RenderTarget, Image>,
    texel_budget: Option<usize>,
    pool: Vec<SoftRecorder>,
    recorders_created: usize,
    submissions: usize,
}

impl SoftDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texel_budget(mut self, texels: usize) -> Self {
        self.texel_budget = Some(texels);
        self
    }

    /// Limit the texels allocatable by recorded instructions. `None` lifts the limit.
    pub fn set_texel_budget(&mut self, texels: Option<usize>) {
        self.texel_budget = texels;
    }

    /// Place caller-owned contents at `target`, replacing anything there.
    pub fn import(&mut self, target: RenderTarget, image: Image) {
        self.targets.insert(target, image);
    }

    /// Import a seeded white-noise texture for dithering.
    pub fn import_noise(
        &mut self,
        target: RenderTarget,
        width: u32,
        height: u32,
        seed: u64,
    ) -> NoiseTexture {
        self.import(target, white_noise(width, height, seed));
        NoiseTexture {
            target,
            width,
            height,
        }
    }

    pub fn target(&self, target: RenderTarget) -> Option<&Image> {
        self.targets.get(&target)
    }

    pub fn take(&mut self, target: RenderTarget) -> Option<Image> {
        self.targets.remove(&target)
    }

    pub fn is_allocated(&self, target: RenderTarget) -> bool {
        self.targets.contains_key(&target)
    }

    /// Texels held by allocated (non-imported) targets.
    pub fn texels_in_use(&self) -> usize {
        self.targets
            .iter()
            .filter(|(target, _)| counts_against_budget(**target))
            .map(|(_, image)| image.pixels().len())
            .sum()
    }

    pub fn transient_count(&self) -> usize {
        self.targets.keys().filter(|t| t.is_transient()).count()
    }

    pub fn recorders_created(&self) -> usize {
        self.recorders_created
    }

    pub fn submissions(&self) -> usize {
        self.submissions
    }

    fn execute(&mut self, command: Command) -> Result<(), RecorderError> {
        match command {
            Command::Allocate(target, desc) => {
                let over_budget = counts_against_budget(target)
                    && self.texel_budget.is_some_and(|budget| {
                        let replaced = self.targets.get(&target).map_or(0, |i| i.pixels().len());
                        self.texels_in_use() - replaced + desc.texel_count() > budget
                    });
                if over_budget {
                    return Err(RecorderError::OutOfMemory {
                        target,
                        width: desc.width,
                        height: desc.height,
                    });
                }
                self.targets.insert(target, Image::new(&desc));
                Ok(())
            }
            Command::Release(target) => {
                self.targets.remove(&target);
                Ok(())
            }
            Command::SetFilter(target, filter) => {
                let image = self
                    .targets
                    .get_mut(&target)
                    .ok_or(RecorderError::MissingTarget(target))?;
                image.set_filter(filter);
                Ok(())
            }
            Command::Copy { src, dst } => self.copy(src, dst),
            Command::Blit {
                src,
                dst,
                pipeline,
                params,
            } => {
                let mut image = self
                    .targets
                    .remove(&dst)
                    .ok_or(RecorderError::MissingTarget(dst))?;
                let result = self.run_blit(src, dst, &mut image, &pipeline, &params);
                self.targets.insert(dst, image);
                result
            }
        }
    }

    fn copy(&mut self, src: RenderTarget, dst: RenderTarget) -> Result<(), RecorderError> {
        if src == dst {
            return Ok(());
        }
        let mut out = self
            .targets
            .remove(&dst)
            .ok_or(RecorderError::MissingTarget(dst))?;
        let result = match self.targets.get(&src) {
            None => Err(RecorderError::MissingTarget(src)),
            Some(image) if image.size() != out.size() || image.format() != out.format() => {
                Err(RecorderError::FormatMismatch {
                    src,
                    src_format: image.format(),
                    dst,
                    dst_format: out.format(),
                })
            }
            Some(image) => {
                out.copy_from(image);
                Ok(())
            }
        };
        self.targets.insert(dst, out);
        result
    }

    fn run_blit(
        &self,
        src: RenderTarget,
        dst: RenderTarget,
        out: &mut Image,
        pipeline: &SoftPipeline,
        params: &PassParams,
    ) -> Result<(), RecorderError> {
        let input = self.resolve(src, dst, out)?;
        let (scene, noise) = match *params {
            PassParams::Combine { source, noise } => (
                Some(self.resolve(source, dst, out)?),
                noise
                    .map(|n| self.resolve(n.texture, dst, out))
                    .transpose()?,
            ),
            _ => (None, None),
        };
        let inputs = PassInputs {
            src: &input,
            params,
            scene: scene.as_deref(),
            noise: noise.as_deref(),
        };
        pipeline.kernel(params.pass())(&inputs, out);
        Ok(())
    }

    /// Contents of `target` for reading while `dst` is being written.
    fn resolve<'a>(
        &'a self,
        target: RenderTarget,
        dst: RenderTarget,
        out: &Image,
    ) -> Result<Cow<'a, Image>, RecorderError> {
        if target == dst {
            return Ok(Cow::Owned(out.clone()));
        }
        self.targets
            .get(&target)
            .map(Cow::Borrowed)
            .ok_or(RecorderError::MissingTarget(target))
    }
}

fn counts_against_budget(target: RenderTarget) -> bool {
    matches!(
        target,
        RenderTarget::Persistent(_) | RenderTarget::Transient(_)
    )
}

impl FrameContext for SoftDevice {
    type Recorder = SoftRecorder;

    fn acquire_recorder(&mut self) -> SoftRecorder {
        self.pool.pop().unwrap_or_else(|| {
            self.recorders_created += 1;
            SoftRecorder::new()
        })
    }

    /// Execute the recorded instructions in order.
    ///
    /// The first failing instruction stops execution of everything after it
    /// except releases, so targets allocated earlier in the list are freed.
    fn submit(&mut self, recorder: &mut SoftRecorder) -> Result<(), RecorderError> {
        let mut failure = None;
        for command in recorder.take_commands() {
            if failure.is_some() {
                if let Command::Release(target) = command {
                    self.targets.remove(&target);
                }
                continue;
            }
            if let Err(err) = self.execute(command) {
                log::warn!("Soft device command failed: {err}");
                failure = Some(err);
            }
        }
        self.submissions += 1;
        failure.map_or(Ok(()), Err)
    }

    fn release_recorder(&mut self, mut recorder: SoftRecorder) {
        recorder.clear();
        self.pool.push(recorder);
    }
}
