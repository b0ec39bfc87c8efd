//! Per-frame integration of [`BloomEngine`] into a render graph.
//!
//! The orchestrator owns two allocations that live across frames, the bloom
//! target and a scratch copy of the camera color, and reallocates them only
//! when their descriptors change. Mip-chain buffers are per frame and are
//! released on every exit path of [`FramePassOrchestrator::execute`].

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::engine::BloomEngine;
use crate::error::{BloomError, RecorderError};
use crate::params::BloomParameters;
use crate::pass::NoiseTexture;
use crate::recorder::{CommandRecorder, FrameContext, ShaderProgramSet};
use crate::target::{BLOOM_TARGET, CAMERA_SCRATCH, PixelFormat, RenderTarget, TargetDesc};

/// Bloom resolution relative to the camera viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ResolutionScale {
    Full,
    #[default]
    Half,
    Quarter,
    Eighth,
    /// Arbitrary factor, clamped to `(0, 1]`.
    Custom(f32),
}

impl ResolutionScale {
    pub fn factor(self) -> f32 {
        match self {
            Self::Full => 1.0,
            Self::Half => 0.5,
            Self::Quarter => 0.25,
            Self::Eighth => 0.125,
            Self::Custom(f) if f.is_finite() && f > 0.0 => f.min(1.0),
            Self::Custom(_) => 1.0,
        }
    }

    /// Scaled size of `viewport`, never smaller than one texel per axis.
    pub fn apply(self, viewport: UVec2) -> UVec2 {
        let f = self.factor();
        UVec2::new(
            ((viewport.x as f32 * f).round() as u32).max(1),
            ((viewport.y as f32 * f).round() as u32).max(1),
        )
    }
}

/// Settings surface consumed read-only by the orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub threshold: f32,
    pub soft_knee: f32,
    pub intensity: f32,
    pub iterations: u32,
    pub resolution: ResolutionScale,
    /// Format of the bloom target.
    pub pixel_format: PixelFormat,
    pub noise: Option<NoiseTexture>,
}

impl Default for BloomSettings {
    fn default() -> Self {
        let p = BloomParameters::default();
        Self {
            threshold: p.threshold,
            soft_knee: p.soft_knee,
            intensity: p.intensity,
            iterations: p.iterations,
            resolution: ResolutionScale::default(),
            pixel_format: PixelFormat::Rgba16Float,
            noise: None,
        }
    }
}

impl BloomSettings {
    pub fn parameters(&self) -> BloomParameters {
        BloomParameters {
            threshold: self.threshold,
            soft_knee: self.soft_knee,
            intensity: self.intensity,
            iterations: self.iterations,
        }
    }
}

/// What kind of view a camera renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraKind {
    Game,
    SceneView,
    Preview,
    Reflection,
}

/// The camera being rendered this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub kind: CameraKind,
    pub viewport: UVec2,
    /// Descriptor of the camera color target.
    pub color: TargetDesc,
}

impl CameraView {
    /// A game camera whose color target matches its viewport.
    pub fn game(viewport: UVec2, format: PixelFormat) -> Self {
        Self {
            kind: CameraKind::Game,
            viewport,
            color: TargetDesc::color(viewport.x, viewport.y, format),
        }
    }
}

/// What happened to one persistent target during [`FramePassOrchestrator::configure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Allocation {
    Allocated,
    Reused,
    FilterUpdated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigureOutcome {
    pub bloom_target: Allocation,
    pub scratch: Allocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Bloom was recorded and submitted.
    Applied,
    /// The camera kind does not receive bloom.
    Skipped,
    /// No pipeline state; the frame passes through unmodified.
    Disabled,
}

/// Persistent allocations owned by the orchestrator.
#[derive(Debug, Default)]
pub struct FrameResources {
    bloom_target: Option<TargetDesc>,
    scratch: Option<TargetDesc>,
    stale: bool,
}

impl FrameResources {
    pub fn bloom_target(&self) -> Option<&TargetDesc> {
        self.bloom_target.as_ref()
    }

    pub fn scratch(&self) -> Option<&TargetDesc> {
        self.scratch.as_ref()
    }

    /// Force the next configure step to reallocate both targets.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

/// Make sure `target` is allocated with a layout compatible with `desc`.
fn ensure_target<R: CommandRecorder>(
    recorder: &mut R,
    target: RenderTarget,
    current: &mut Option<TargetDesc>,
    desc: TargetDesc,
    force: bool,
) -> Result<Allocation, RecorderError> {
    if let Some(existing) = current.as_mut() {
        if !force && existing.is_compatible(&desc) {
            if existing.filter == desc.filter {
                return Ok(Allocation::Reused);
            }
            recorder.set_filter_mode(target, desc.filter);
            existing.filter = desc.filter;
            return Ok(Allocation::FilterUpdated);
        }
        recorder.release(target);
        *current = None;
    }

    recorder.allocate(target, &desc)?;
    *current = Some(desc);
    log::debug!(
        "Allocated {target:?} at {}x{} {:?}",
        desc.width,
        desc.height,
        desc.format
    );
    Ok(Allocation::Allocated)
}

/// Glue between [`BloomEngine`] and the renderer's frame loop.
#[derive(Debug)]
pub struct FramePassOrchestrator<P> {
    engine: Option<BloomEngine<P>>,
    settings: BloomSettings,
    resources: FrameResources,
    bloom_desc: Option<TargetDesc>,
}

impl<P> Default for FramePassOrchestrator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> FramePassOrchestrator<P> {
    pub fn new() -> Self {
        Self {
            engine: None,
            settings: BloomSettings::default(),
            resources: FrameResources::default(),
            bloom_desc: None,
        }
    }

    pub fn engine(&self) -> Option<&BloomEngine<P>> {
        self.engine.as_ref()
    }

    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    pub fn resources(&self) -> &FrameResources {
        &self.resources
    }

    /// Propagate `settings` and make sure an engine exists and has tried to
    /// initialize with `programs`.
    pub fn setup<S>(
        &mut self,
        settings: &BloomSettings,
        programs: Option<S>,
    ) -> Result<(), BloomError>
    where
        S: ShaderProgramSet<Pipeline = P>,
    {
        self.settings = settings.clone();
        let engine = self.engine.get_or_insert_with(BloomEngine::new);
        engine.set_parameters(settings.parameters());
        engine.initialize(programs)
    }

    /// Compute the bloom target descriptor for `camera`.
    pub fn setup_camera(&mut self, camera: &CameraView) -> TargetDesc {
        let size = self.settings.resolution.apply(camera.viewport);
        let desc = TargetDesc::color(size.x, size.y, self.settings.pixel_format);
        self.bloom_desc = Some(desc);
        desc
    }

    /// Bring the bloom target and the camera scratch copy in line with the
    /// current descriptors.
    pub fn configure<R>(
        &mut self,
        recorder: &mut R,
        camera: &CameraView,
    ) -> Result<ConfigureOutcome, BloomError>
    where
        R: CommandRecorder,
    {
        let bloom_desc = match self.bloom_desc {
            Some(desc) => desc,
            None => self.setup_camera(camera),
        };
        let scratch_desc = TargetDesc {
            depth_bits: 0,
            mip_count: 0,
            ..camera.color
        };
        let force = self.resources.stale;

        let bloom_target = ensure_target(
            recorder,
            BLOOM_TARGET,
            &mut self.resources.bloom_target,
            bloom_desc,
            force,
        )?;
        let scratch = ensure_target(
            recorder,
            CAMERA_SCRATCH,
            &mut self.resources.scratch,
            scratch_desc,
            force,
        )?;
        self.resources.stale = false;

        Ok(ConfigureOutcome {
            bloom_target,
            scratch,
        })
    }

    /// Record and submit bloom for `camera`.
    ///
    /// Mip buffers are released whether or not recording succeeded. A frame
    /// that fails is not submitted, and the persistent targets are marked
    /// stale so the next frame starts from fresh allocations.
    pub fn execute<C>(
        &mut self,
        context: &mut C,
        camera: &CameraView,
    ) -> Result<FrameOutcome, BloomError>
    where
        C: FrameContext,
        C::Recorder: CommandRecorder<Pipeline = P>,
    {
        if let Some(outcome) = self.pass_through(camera) {
            return Ok(outcome);
        }
        let Some(engine) = self.engine.as_mut() else {
            return Ok(FrameOutcome::Disabled);
        };
        let Some(bloom_desc) = self.resources.bloom_target else {
            return Err(RecorderError::MissingTarget(BLOOM_TARGET).into());
        };

        let mut recorder = context.acquire_recorder();
        let recorded = record_bloom(
            engine,
            &mut recorder,
            camera,
            bloom_desc.size(),
            &self.settings,
        );
        engine.release_buffers(&mut recorder);
        let result =
            recorded.and_then(|()| context.submit(&mut recorder).map_err(BloomError::from));
        recorder.clear();
        context.release_recorder(recorder);

        match result {
            Ok(()) => Ok(FrameOutcome::Applied),
            Err(err) => {
                log::warn!("Bloom frame dropped: {err}");
                self.resources.mark_stale();
                Err(err)
            }
        }
    }

    /// Camera setup, resource configuration, and execution in one call.
    ///
    /// Cameras that get no bloom leave the persistent targets untouched.
    pub fn render_frame<C>(
        &mut self,
        context: &mut C,
        camera: &CameraView,
    ) -> Result<FrameOutcome, BloomError>
    where
        C: FrameContext,
        C::Recorder: CommandRecorder<Pipeline = P>,
    {
        if let Some(outcome) = self.pass_through(camera) {
            return Ok(outcome);
        }
        self.setup_camera(camera);

        let mut recorder = context.acquire_recorder();
        let configured = self
            .configure(&mut recorder, camera)
            .and_then(|_| context.submit(&mut recorder).map_err(BloomError::from));
        recorder.clear();
        context.release_recorder(recorder);
        if let Err(err) = configured {
            self.resources.mark_stale();
            return Err(err);
        }

        self.execute(context, camera)
    }

    /// Outcome for frames that record nothing: non-game cameras and a
    /// disabled engine.
    fn pass_through(&self, camera: &CameraView) -> Option<FrameOutcome> {
        if camera.kind != CameraKind::Game {
            return Some(FrameOutcome::Skipped);
        }
        if !self.engine.as_ref().is_some_and(BloomEngine::is_initialized) {
            return Some(FrameOutcome::Disabled);
        }
        None
    }

    /// Release the persistent targets and the engine's pipeline state.
    pub fn dispose<R>(&mut self, recorder: &mut R)
    where
        R: CommandRecorder,
    {
        if self.resources.bloom_target.take().is_some() {
            recorder.release(BLOOM_TARGET);
        }
        if self.resources.scratch.take().is_some() {
            recorder.release(CAMERA_SCRATCH);
        }
        self.bloom_desc = None;
        if let Some(mut engine) = self.engine.take() {
            engine.dispose();
        }
    }
}

fn record_bloom<P, R>(
    engine: &mut BloomEngine<P>,
    recorder: &mut R,
    camera: &CameraView,
    resolution: UVec2,
    settings: &BloomSettings,
) -> Result<(), BloomError>
where
    R: CommandRecorder<Pipeline = P>,
{
    recorder.copy(RenderTarget::CameraColor, CAMERA_SCRATCH)?;
    engine.apply(recorder, CAMERA_SCRATCH, BLOOM_TARGET, resolution, camera.color.format)?;
    engine.combine(
        recorder,
        CAMERA_SCRATCH,
        RenderTarget::CameraColor,
        BLOOM_TARGET,
        settings.noise.as_ref(),
        camera.viewport,
    )
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::tests::{LogRecorder, Op, TestPipeline, TestPrograms};
    use crate::pass::{BloomPass, PassParams};
    use crate::target::FilterMode;

    #[derive(Default)]
    struct TestContext {
        submitted: Vec<Vec<Op>>,
        acquired: usize,
        returned: usize,
        fail_allocation_at: Option<usize>,
        fail_submit: bool,
    }

    impl FrameContext for TestContext {
        type Recorder = LogRecorder;

        fn acquire_recorder(&mut self) -> LogRecorder {
            self.acquired += 1;
            LogRecorder {
                fail_allocation_at: self.fail_allocation_at,
                ..Default::default()
            }
        }

        fn submit(&mut self, recorder: &mut LogRecorder) -> Result<(), RecorderError> {
            if self.fail_submit {
                return Err(RecorderError::Backend("device lost".into()));
            }
            self.submitted.push(recorder.ops.clone());
            Ok(())
        }

        fn release_recorder(&mut self, recorder: LogRecorder) {
            assert!(recorder.ops.is_empty(), "recorder returned uncleared");
            self.returned += 1;
        }
    }

    fn ready() -> FramePassOrchestrator<TestPipeline> {
        let compiles = Rc::new(Cell::new(0));
        let mut orchestrator = FramePassOrchestrator::new();
        orchestrator
            .setup(&BloomSettings::default(), Some(TestPrograms::new(&compiles)))
            .unwrap();
        orchestrator
    }

    fn camera(w: u32, h: u32) -> CameraView {
        CameraView::game(UVec2::new(w, h), PixelFormat::Rgba16Float)
    }

    #[test]
    fn test_resolution_scale() {
        let vp = UVec2::new(1920, 1080);
        assert_eq!(ResolutionScale::Full.apply(vp), vp);
        assert_eq!(ResolutionScale::Half.apply(vp), UVec2::new(960, 540));
        assert_eq!(ResolutionScale::Eighth.apply(vp), UVec2::new(240, 135));
        assert_eq!(ResolutionScale::Custom(0.001).apply(vp), UVec2::new(2, 1));
        assert_eq!(ResolutionScale::Custom(f32::NAN).apply(vp), vp);
        assert_eq!(ResolutionScale::Custom(4.0).apply(vp), vp);
    }

    #[test]
    fn test_settings_propagate_to_engine() {
        let mut orchestrator = FramePassOrchestrator::<TestPipeline>::new();
        let settings = BloomSettings {
            threshold: 1.2,
            intensity: 0.3,
            iterations: 5,
            ..Default::default()
        };
        orchestrator.setup::<TestPrograms>(&settings, None).unwrap();
        let engine = orchestrator.engine().unwrap();
        assert_eq!(engine.parameters().threshold, 1.2);
        assert_eq!(engine.parameters().iterations, 5);
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_setup_camera_uses_half_rgba() {
        let mut orchestrator = ready();
        let desc = orchestrator.setup_camera(&camera(1280, 720));
        assert_eq!(desc.size(), UVec2::new(640, 360));
        assert_eq!(desc.format, PixelFormat::Rgba16Float);
        assert_eq!(desc.depth_bits, 0);
    }

    #[test]
    fn test_configure_reuses_unchanged_targets() {
        let mut orchestrator = ready();
        let cam = camera(1280, 720);
        orchestrator.setup_camera(&cam);

        let mut rec = LogRecorder::default();
        let first = orchestrator.configure(&mut rec, &cam).unwrap();
        assert_eq!(first.bloom_target, Allocation::Allocated);
        assert_eq!(first.scratch, Allocation::Allocated);
        assert_eq!(rec.allocated(), vec![BLOOM_TARGET, CAMERA_SCRATCH]);

        let mut rec = LogRecorder::default();
        orchestrator.setup_camera(&cam);
        let second = orchestrator.configure(&mut rec, &cam).unwrap();
        assert_eq!(second.bloom_target, Allocation::Reused);
        assert_eq!(second.scratch, Allocation::Reused);
        assert!(rec.ops.is_empty());
    }

    #[test]
    fn test_configure_reallocates_on_resize() {
        let mut orchestrator = ready();
        let mut rec = LogRecorder::default();
        let cam = camera(1280, 720);
        orchestrator.setup_camera(&cam);
        orchestrator.configure(&mut rec, &cam).unwrap();

        let mut rec = LogRecorder::default();
        let cam = camera(1920, 1080);
        orchestrator.setup_camera(&cam);
        orchestrator.configure(&mut rec, &cam).unwrap();
        assert_eq!(
            rec.ops[..2],
            [
                Op::Release(BLOOM_TARGET),
                Op::Allocate(
                    BLOOM_TARGET,
                    TargetDesc::color(960, 540, PixelFormat::Rgba16Float)
                )
            ]
        );
        assert_eq!(rec.released(), vec![BLOOM_TARGET, CAMERA_SCRATCH]);
    }

    #[test]
    fn test_scratch_reallocates_on_format_change() {
        let mut orchestrator = ready();
        let mut rec = LogRecorder::default();
        let cam = camera(640, 480);
        orchestrator.setup_camera(&cam);
        orchestrator.configure(&mut rec, &cam).unwrap();

        let mut rec = LogRecorder::default();
        let cam = CameraView::game(UVec2::new(640, 480), PixelFormat::Bgra8UnormSrgb);
        let outcome = orchestrator.configure(&mut rec, &cam).unwrap();
        assert_eq!(outcome.bloom_target, Allocation::Reused);
        assert_eq!(outcome.scratch, Allocation::Allocated);
    }

    #[test]
    fn test_scratch_drops_depth_and_mips() {
        let mut orchestrator = ready();
        let mut rec = LogRecorder::default();
        let mut cam = camera(640, 480);
        cam.color.depth_bits = 24;
        cam.color.mip_count = 10;
        orchestrator.configure(&mut rec, &cam).unwrap();
        let scratch = orchestrator.resources().scratch().unwrap();
        assert_eq!(scratch.depth_bits, 0);
        assert_eq!(scratch.mip_count, 0);

        // Depth on the camera descriptor never forces a scratch reallocation.
        let mut rec = LogRecorder::default();
        cam.color.depth_bits = 32;
        let outcome = orchestrator.configure(&mut rec, &cam).unwrap();
        assert_eq!(outcome.scratch, Allocation::Reused);
    }

    #[test]
    fn test_filter_change_updates_in_place() {
        let mut rec = LogRecorder::default();
        let mut current = None;
        let desc = TargetDesc::color(64, 64, PixelFormat::Rgba16Float);
        ensure_target(&mut rec, BLOOM_TARGET, &mut current, desc, false).unwrap();

        let point = TargetDesc {
            filter: FilterMode::Point,
            ..desc
        };
        let outcome = ensure_target(&mut rec, BLOOM_TARGET, &mut current, point, false).unwrap();
        assert_eq!(outcome, Allocation::FilterUpdated);
        assert_eq!(rec.allocated().len(), 1);
        assert_eq!(rec.ops.last(), Some(&Op::Filter(BLOOM_TARGET, FilterMode::Point)));
        assert_eq!(current.unwrap().filter, FilterMode::Point);
    }

    #[test]
    fn test_execute_skips_non_game_cameras() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let mut cam = camera(640, 480);
        cam.kind = CameraKind::SceneView;
        let outcome = orchestrator.render_frame(&mut ctx, &cam).unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(ctx.acquired, 0);
        assert!(ctx.submitted.is_empty());
        assert!(orchestrator.resources().bloom_target().is_none());
    }

    #[test]
    fn test_scene_view_between_game_frames_keeps_targets() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let game = camera(64, 64);
        let mut scene = camera(32, 32);
        scene.kind = CameraKind::SceneView;

        orchestrator.render_frame(&mut ctx, &game).unwrap();
        let bloom = orchestrator.resources().bloom_target().copied();
        let outcome = orchestrator.render_frame(&mut ctx, &scene).unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(orchestrator.resources().bloom_target().copied(), bloom);

        let submissions = ctx.submitted.len();
        orchestrator.render_frame(&mut ctx, &game).unwrap();
        // Third frame's configure allocates nothing.
        assert!(ctx.submitted[submissions].is_empty());

        let mut rec = LogRecorder::default();
        let outcome = orchestrator.configure(&mut rec, &game).unwrap();
        assert_eq!(outcome.bloom_target, Allocation::Reused);
        assert_eq!(outcome.scratch, Allocation::Reused);
        assert!(rec.ops.is_empty());
    }

    #[test]
    fn test_render_frame_disabled_allocates_nothing() {
        let mut orchestrator = FramePassOrchestrator::<TestPipeline>::new();
        orchestrator
            .setup::<TestPrograms>(&BloomSettings::default(), None)
            .unwrap();
        let mut ctx = TestContext::default();
        let outcome = orchestrator.render_frame(&mut ctx, &camera(64, 64)).unwrap();
        assert_eq!(outcome, FrameOutcome::Disabled);
        assert_eq!(ctx.acquired, 0);
        assert!(orchestrator.resources().bloom_target().is_none());
        assert!(orchestrator.resources().scratch().is_none());
    }

    #[test]
    fn test_execute_disabled_without_programs() {
        let mut orchestrator = FramePassOrchestrator::<TestPipeline>::new();
        orchestrator
            .setup::<TestPrograms>(&BloomSettings::default(), None)
            .unwrap();
        let mut ctx = TestContext::default();
        let outcome = orchestrator.execute(&mut ctx, &camera(640, 480)).unwrap();
        assert_eq!(outcome, FrameOutcome::Disabled);
        assert_eq!(ctx.acquired, 0);
        assert!(ctx.submitted.is_empty());
    }

    #[test]
    fn test_execute_without_configure_reports_missing_target() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let err = orchestrator.execute(&mut ctx, &camera(640, 480)).unwrap_err();
        assert!(matches!(
            err,
            BloomError::Recorder(RecorderError::MissingTarget(BLOOM_TARGET))
        ));
    }

    #[test]
    fn test_frame_sequence() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let outcome = orchestrator.render_frame(&mut ctx, &camera(64, 64)).unwrap();
        assert_eq!(outcome, FrameOutcome::Applied);
        assert_eq!(ctx.acquired, 2);
        assert_eq!(ctx.returned, 2);

        let ops = &ctx.submitted[1];
        assert_eq!(ops[0], Op::Copy(RenderTarget::CameraColor, CAMERA_SCRATCH));

        // 32x32 bloom target -> 16, 8, 4, 2 = four levels.
        let chain = orchestrator.engine().unwrap().mip_chain().len();
        assert_eq!(chain, 4);

        let mut rec = LogRecorder::default();
        rec.ops = ops.clone();
        let blits = rec.blits();
        assert_eq!(blits.len(), 1 + chain + (chain - 1) + 1 + 1);
        let (src, dst, params) = blits.last().copied().unwrap();
        assert_eq!((src, dst), (BLOOM_TARGET, RenderTarget::CameraColor));
        assert_eq!(params.pass(), BloomPass::Combine);
        assert!(matches!(
            params,
            PassParams::Combine { source, .. } if source == CAMERA_SCRATCH
        ));

        // Releases come after the combine blit.
        let combine_at = ops
            .iter()
            .position(|op| matches!(op, Op::Blit(_, _, PassParams::Combine { .. })))
            .unwrap();
        let releases: Vec<_> = ops[combine_at + 1..].to_vec();
        assert_eq!(releases.len(), chain);
        assert!(releases.iter().all(|op| matches!(op, Op::Release(t) if t.is_transient())));
    }

    #[test]
    fn test_second_frame_does_not_reallocate_persistent_targets() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let cam = camera(128, 128);
        orchestrator.render_frame(&mut ctx, &cam).unwrap();
        orchestrator.render_frame(&mut ctx, &cam).unwrap();
        // Frame two's configure submission is empty.
        assert!(ctx.submitted[2].is_empty());
    }

    #[test]
    fn test_failed_frame_releases_buffers_and_recovers() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let cam = camera(64, 64);
        orchestrator.setup_camera(&cam);
        let mut rec = LogRecorder::default();
        orchestrator.configure(&mut rec, &cam).unwrap();

        ctx.fail_allocation_at = Some(1);
        let err = orchestrator.execute(&mut ctx, &cam).unwrap_err();
        assert!(matches!(err, BloomError::Recorder(RecorderError::OutOfMemory { .. })));
        assert!(ctx.submitted.is_empty());
        assert_eq!(ctx.returned, 1);
        assert_eq!(orchestrator.engine().unwrap().mip_chain().live(), 0);
        assert!(orchestrator.resources().is_stale());

        ctx.fail_allocation_at = None;
        let mut rec = LogRecorder::default();
        let outcome = orchestrator.configure(&mut rec, &cam).unwrap();
        assert_eq!(outcome.bloom_target, Allocation::Allocated);
        assert_eq!(rec.released(), vec![BLOOM_TARGET, CAMERA_SCRATCH]);
        assert_eq!(orchestrator.execute(&mut ctx, &cam).unwrap(), FrameOutcome::Applied);
    }

    #[test]
    fn test_submit_failure_drops_frame() {
        let mut orchestrator = ready();
        let mut ctx = TestContext::default();
        let cam = camera(64, 64);
        let mut rec = LogRecorder::default();
        orchestrator.configure(&mut rec, &cam).unwrap();
        ctx.fail_submit = true;
        assert!(orchestrator.execute(&mut ctx, &cam).is_err());
        assert_eq!(ctx.returned, 1);
        assert!(orchestrator.resources().is_stale());
    }

    #[test]
    fn test_dispose_releases_once() {
        let mut orchestrator = ready();
        let mut rec = LogRecorder::default();
        let cam = camera(64, 64);
        orchestrator.configure(&mut rec, &cam).unwrap();

        let mut rec = LogRecorder::default();
        orchestrator.dispose(&mut rec);
        orchestrator.dispose(&mut rec);
        assert_eq!(rec.released(), vec![BLOOM_TARGET, CAMERA_SCRATCH]);
        assert!(orchestrator.engine().is_none());
    }
}
