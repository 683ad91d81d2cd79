//! Lifecycle Controller.
//!
//! [`Pipeline::launch`] loads shaders, builds targets and scenes, bakes the
//! noise target and starts the scheduler. [`Pipeline::frame`] runs one tick
//! through a [`PassExecutor`]. [`Pipeline::shutdown`] stops everything and
//! frees every target; it can be called any number of times.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use horizon_engine::coords::Viewport;
use thiserror::Error;

use crate::assets::{load_shader_sources, AssetSource};
use crate::camera::CameraRig;
use crate::config::PipelineConfig;
use crate::frame::{Frame, OrderingViolation};
use crate::noise::NoiseBake;
use crate::params::ParameterStore;
use crate::resize::ResizeCoordinator;
use crate::scene::SceneAssembly;
use crate::scheduler::{FrameScheduler, SchedulerState, TickContext};
use crate::shader::ShaderSet;
use crate::targets::{
    AllocationError, PipelineTargets, RenderTargetRegistry, TargetAllocator, TargetKind,
};

/// Shared "keep going" flag checked before starting and before every tick.
#[derive(Debug, Clone)]
pub struct LivenessFlag(Arc<AtomicBool>);

impl LivenessFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for LivenessFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// What a pass executor may read while submitting a frame.
pub struct FrameResources<'a, A: TargetAllocator> {
    pub targets: &'a RenderTargetRegistry<A>,
    pub assembly: &'a SceneAssembly,
}

/// Turns a [`Frame`] into GPU work.
pub trait PassExecutor<A: TargetAllocator> {
    fn execute(&mut self, frame: &Frame, resources: &FrameResources<'_, A>) -> anyhow::Result<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    Rendered { index: u64 },
    /// No tick was pending.
    Skipped,
    /// The pipeline is shut down; nothing was submitted.
    Stopped,
}

#[derive(Debug, Error)]
pub enum TickError {
    /// Fatal: a target could not be resized.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("pass order violated: {0}")]
    Ordering(#[from] OrderingViolation),

    #[error("frame {index} failed: {reason}")]
    Submission { index: u64, reason: String },
}

impl TickError {
    /// Whether the loop must stop. Any other error only costs the current frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Allocation(_))
    }
}

/// The running visualization.
pub struct Pipeline<A: TargetAllocator> {
    config: PipelineConfig,
    params: ParameterStore,
    registry: RenderTargetRegistry<A>,
    targets: PipelineTargets,
    assembly: SceneAssembly,
    rig: CameraRig,
    scheduler: FrameScheduler,
    resize: ResizeCoordinator,
    noise: NoiseBake,
    liveness: LivenessFlag,
    torn_down: bool,
}

impl<A: TargetAllocator> Pipeline<A> {
    /// Loads assets and brings the pipeline up.
    ///
    /// Returns `Ok(None)` when `liveness` was cleared while assets were
    /// loading; nothing is allocated in that case. Asset and allocation
    /// failures abort start-up.
    pub async fn launch<S, E>(
        config: PipelineConfig,
        params: ParameterStore,
        source: &S,
        allocator: A,
        viewport: Viewport,
        liveness: LivenessFlag,
        executor: &mut E,
    ) -> anyhow::Result<Option<Self>>
    where
        S: AssetSource + ?Sized,
        E: PassExecutor<A>,
    {
        let sources = match load_shader_sources(source).await {
            Ok(s) => s,
            Err(e) => {
                log::error!("shader loading failed, visualization will not start: {e}");
                return Err(e).context("failed to load shader sources");
            }
        };

        if !liveness.is_alive() {
            log::info!("shut down while loading assets; not starting");
            return Ok(None);
        }

        let shaders = ShaderSet::from_sources(sources);

        let resize = ResizeCoordinator::new(viewport, config.max_pixel_ratio);
        let (width, height) = resize.device_size();
        let mut registry = RenderTargetRegistry::new(allocator);
        let mut allocate = |kind: TargetKind, w: u32, h: u32| {
            registry
                .allocate(kind, w, h)
                .with_context(|| format!("failed to allocate the {} target", kind.label()))
        };
        let targets = PipelineTargets {
            pre_distortion: allocate(TargetKind::PreDistortion, width, height)?,
            distortion_mask: allocate(TargetKind::DistortionMask, width, height)?,
            composed: allocate(TargetKind::Composed, width, height)?,
            noise: allocate(TargetKind::NoiseBake, config.noise_size, config.noise_size)?,
        };

        let assembly =
            SceneAssembly::build(&shaders, targets, &config).context("failed to build scenes")?;

        let aspect = if viewport.is_valid() {
            viewport.aspect()
        } else {
            1.0
        };
        let rig = CameraRig::new(&config, aspect);

        let mut noise = NoiseBake::new(targets.noise, config.noise_size);
        if let Some(frame) = noise.frame(&assembly) {
            let resources = FrameResources {
                targets: &registry,
                assembly: &assembly,
            };
            executor
                .execute(&frame, &resources)
                .context("noise bake failed")?;
        }

        let mut scheduler = FrameScheduler::new();
        scheduler.start()?;
        log::info!("pipeline running at {width}x{height} device px");

        Ok(Some(Self {
            resize,
            config,
            params,
            registry,
            targets,
            assembly,
            rig,
            scheduler,
            noise,
            liveness,
            torn_down: false,
        }))
    }

    /// Runs one tick at `elapsed` seconds.
    ///
    /// A pending viewport is applied first. If its targets cannot be
    /// allocated the pipeline shuts down and the error is fatal. Submission
    /// failures are returned after the scheduler has already requested the
    /// next tick, so the caller can log them and keep going; see
    /// [`TickError::is_fatal`].
    pub fn frame<E: PassExecutor<A>>(
        &mut self,
        elapsed: f32,
        executor: &mut E,
    ) -> Result<TickOutcome, TickError> {
        if self.torn_down {
            return Ok(TickOutcome::Stopped);
        }
        if !self.liveness.is_alive() {
            self.shutdown();
            return Ok(TickOutcome::Stopped);
        }
        if !self.scheduler.begin_tick() {
            return Ok(match self.scheduler.state() {
                SchedulerState::Stopped => TickOutcome::Stopped,
                _ => TickOutcome::Skipped,
            });
        }

        if let Err(e) = self
            .resize
            .apply(&mut self.registry, &self.targets, &mut self.rig)
        {
            self.scheduler.finish_tick();
            log::error!("resize failed, stopping the pipeline: {e}");
            self.shutdown();
            return Err(e.into());
        }

        let frame = self.scheduler.tick(TickContext {
            elapsed,
            rig: &mut self.rig,
            assembly: &mut self.assembly,
            params: self.params.snapshot(),
            targets: self.targets,
            device_size: self.resize.device_size(),
            pixel_ratio: self.resize.pixel_ratio(),
            clear_color: self.config.clear_color,
        });

        let result = frame.check_ordering().map_err(TickError::from).and_then(|()| {
            let resources = FrameResources {
                targets: &self.registry,
                assembly: &self.assembly,
            };
            executor
                .execute(&frame, &resources)
                .map_err(|e| TickError::Submission {
                    index: frame.index,
                    reason: format!("{e:#}"),
                })
        });

        self.scheduler.finish_tick();

        match result {
            Ok(()) => Ok(TickOutcome::Rendered { index: frame.index }),
            Err(e) => {
                log::warn!("{e}");
                Err(e)
            }
        }
    }

    /// Records a viewport change for the next tick.
    pub fn notify_resize(&mut self, viewport: Viewport) {
        self.resize.notify(viewport);
    }

    /// Whether the host should deliver another tick.
    pub fn wants_redraw(&self) -> bool {
        !self.torn_down && self.scheduler.is_pending()
    }

    /// Stops the scheduler and frees every target. Idempotent.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.liveness.clear();
        self.scheduler.stop();
        self.registry.release_all();
        log::info!(
            "pipeline shut down after {} frames",
            self.scheduler.frames_produced()
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.torn_down
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn registry(&self) -> &RenderTargetRegistry<A> {
        &self.registry
    }

    pub fn targets(&self) -> PipelineTargets {
        self.targets
    }

    pub fn assembly(&self) -> &SceneAssembly {
        &self.assembly
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Mutable rig access for user orbit and zoom input.
    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn noise_bake_runs(&self) -> u32 {
        self.noise.runs()
    }

    /// Current size of the viewport-sized targets in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        self.resize.device_size()
    }
}

impl<A: TargetAllocator> Drop for Pipeline<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
