//! Device, queue, and the pooled recorder.

use halo_bloom::{CommandRecorder, FrameContext, RecorderError, RenderTarget};

use crate::recorder::GpuRecorder;

/// Error type for headless GPU setup.
#[derive(Debug, thiserror::Error)]
pub enum GpuContextError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// [`FrameContext`] backed by a wgpu queue.
///
/// Render targets live in the recorder, so the context keeps exactly one
/// recorder and hands the same one out every frame.
#[derive(Debug)]
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    recorder: Option<GpuRecorder>,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let recorder = GpuRecorder::new(device.clone());
        Self {
            device,
            queue,
            recorder: Some(recorder),
        }
    }

    /// Create a context on the default adapter without a surface.
    pub async fn headless() -> Result<Self, GpuContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuContextError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Bloom GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("halo-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        Ok(Self::new(device, queue))
    }

    /// Blocking version of [`GpuContext::headless`] using `pollster`.
    pub fn headless_blocking() -> Result<Self, GpuContextError> {
        pollster::block_on(Self::headless())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The pooled recorder, `None` while it is checked out.
    pub fn recorder(&self) -> Option<&GpuRecorder> {
        self.recorder.as_ref()
    }

    /// Bind a caller-owned texture to `target` for later frames.
    pub fn import(
        &mut self,
        target: RenderTarget,
        texture: wgpu::Texture,
    ) -> Result<(), RecorderError> {
        self.recorder
            .as_mut()
            .ok_or_else(|| RecorderError::Backend("recorder is checked out".into()))?
            .import(target, texture)
    }

    pub fn texture(&self, target: RenderTarget) -> Option<&wgpu::Texture> {
        self.recorder.as_ref()?.texture(target)
    }
}

impl FrameContext for GpuContext {
    type Recorder = GpuRecorder;

    fn acquire_recorder(&mut self) -> GpuRecorder {
        self.recorder.take().unwrap_or_else(|| {
            log::warn!("Bloom recorder already checked out; new recorder starts without targets");
            GpuRecorder::new(self.device.clone())
        })
    }

    fn submit(&mut self, recorder: &mut GpuRecorder) -> Result<(), RecorderError> {
        if let Some(commands) = recorder.finish() {
            self.queue.submit([commands]);
        }
        Ok(())
    }

    fn release_recorder(&mut self, mut recorder: GpuRecorder) {
        recorder.clear();
        if self.recorder.is_none() {
            self.recorder = Some(recorder);
        }
    }
}

#[cfg(test)]
mod tests {
    use halo_bloom::{
        BLOOM_TARGET, BloomSettings, CameraView, FrameOutcome, FramePassOrchestrator,
        PixelFormat, TargetDesc,
    };

    use super::*;
    use crate::format::texture_descriptor;
    use crate::pipeline::{GpuPipeline, WgslPrograms};

    fn camera_texture(ctx: &GpuContext, width: u32, height: u32) -> wgpu::Texture {
        let desc = TargetDesc::color(width, height, PixelFormat::Rgba16Float);
        ctx.device()
            .create_texture(&texture_descriptor("camera-color", &desc))
    }

    #[test]
    fn test_frame_renders_and_reuses_textures() {
        let Ok(mut ctx) = GpuContext::headless_blocking() else {
            return;
        };
        let texture = camera_texture(&ctx, 128, 64);
        ctx.import(RenderTarget::CameraColor, texture).unwrap();

        let mut orchestrator = FramePassOrchestrator::<GpuPipeline>::new();
        orchestrator
            .setup(
                &BloomSettings::default(),
                Some(WgslPrograms::builtin(ctx.device())),
            )
            .unwrap();
        let camera = CameraView::game(glam::UVec2::new(128, 64), PixelFormat::Rgba16Float);

        let outcome = orchestrator.render_frame(&mut ctx, &camera).unwrap();
        assert_eq!(outcome, FrameOutcome::Applied);
        let created = ctx.recorder().unwrap().textures_created();
        assert!(ctx.texture(BLOOM_TARGET).is_some());
        // Mip levels went back to the pool.
        assert!(ctx.recorder().unwrap().pooled_textures() > 0);

        orchestrator.render_frame(&mut ctx, &camera).unwrap();
        assert_eq!(ctx.recorder().unwrap().textures_created(), created);

        let token = orchestrator.engine().unwrap().pipeline().unwrap();
        assert!(token.state().cached_pipelines() >= 4);
    }

    #[test]
    fn test_missing_entry_point_fails_compile() {
        let Ok(ctx) = GpuContext::headless_blocking() else {
            return;
        };
        let programs = WgslPrograms::new(
            ctx.device(),
            crate::shader::BLOOM_SHADER_SOURCE,
            "vs_fullscreen",
            ["fs_prefilter", "fs_downsample", "fs_upsample", "fs_final", "fs_missing"],
        );
        let mut orchestrator = FramePassOrchestrator::<GpuPipeline>::new();
        assert!(orchestrator.setup(&BloomSettings::default(), Some(programs)).is_err());
        assert!(!orchestrator.engine().unwrap().is_initialized());
    }

    #[test]
    fn test_checked_out_recorder_blocks_import() {
        let Ok(mut ctx) = GpuContext::headless_blocking() else {
            return;
        };
        let recorder = ctx.acquire_recorder();
        let texture = camera_texture(&ctx, 4, 4);
        assert!(ctx.import(RenderTarget::CameraColor, texture).is_err());
        ctx.release_recorder(recorder);
        assert!(ctx.recorder().is_some());
    }
}
