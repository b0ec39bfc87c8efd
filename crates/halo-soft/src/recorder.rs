use halo_bloom::{CommandRecorder, FilterMode, PassParams, RecorderError, RenderTarget, TargetDesc};

use crate::program::SoftPipeline;

/// One recorded instruction.
#[derive(Clone, Debug)]
pub enum Command {
    Allocate(RenderTarget, TargetDesc),
    Release(RenderTarget),
    SetFilter(RenderTarget, FilterMode),
    Copy {
        src: RenderTarget,
        dst: RenderTarget,
    },
    Blit {
        src: RenderTarget,
        dst: RenderTarget,
        pipeline: SoftPipeline,
        params: PassParams,
    },
}

/// Deferred instruction list, executed by [`SoftDevice::submit`](crate::SoftDevice).
#[derive(Debug, Default)]
pub struct SoftRecorder {
    commands: Vec<Command>,
}

impl SoftRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl CommandRecorder for SoftRecorder {
    type Pipeline = SoftPipeline;

    fn allocate(&mut self, target: RenderTarget, desc: &TargetDesc) -> Result<(), RecorderError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RecorderError::InvalidSize {
                target,
                width: desc.width,
                height: desc.height,
            });
        }
        self.commands.push(Command::Allocate(target, *desc));
        Ok(())
    }

    fn release(&mut self, target: RenderTarget) {
        self.commands.push(Command::Release(target));
    }

    fn set_filter_mode(&mut self, target: RenderTarget, filter: FilterMode) {
        self.commands.push(Command::SetFilter(target, filter));
    }

    fn copy(&mut self, src: RenderTarget, dst: RenderTarget) -> Result<(), RecorderError> {
        self.commands.push(Command::Copy { src, dst });
        Ok(())
    }

    fn blit(
        &mut self,
        src: RenderTarget,
        dst: RenderTarget,
        pipeline: &SoftPipeline,
        params: &PassParams,
    ) -> Result<(), RecorderError> {
        self.commands.push(Command::Blit {
            src,
            dst,
            pipeline: *pipeline,
            params: *params,
        });
        Ok(())
    }

    fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo_bloom::PixelFormat;

    #[test]
    fn test_zero_sized_allocation_is_rejected_at_record_time() {
        let mut rec = SoftRecorder::new();
        let err = rec
            .allocate(
                RenderTarget::Transient(0),
                &TargetDesc::color(0, 16, PixelFormat::Rgba16Float),
            )
            .unwrap_err();
        assert!(matches!(err, RecorderError::InvalidSize { width: 0, .. }));
        assert!(rec.is_empty());
    }

    #[test]
    fn test_clear_drops_commands() {
        let mut rec = SoftRecorder::new();
        rec.release(RenderTarget::Transient(1));
        rec.copy(RenderTarget::CameraColor, RenderTarget::Persistent(1))
            .unwrap();
        assert_eq!(rec.commands().len(), 2);
        rec.clear();
        assert!(rec.is_empty());
    }
}
