use std::path::PathBuf;

use anyhow::{Context, Result};

use horizon_engine::coords::Viewport;
use horizon_engine::core::{App, AppControl, FrameCtx, StartCtx};
use horizon_engine::input::Key;
use horizon_pipeline::assets::{EmbeddedAssets, FsAssetSource};
use horizon_pipeline::gpu::{GpuPassExecutor, GpuRenderer, GpuTargetAllocator};
use horizon_pipeline::{LivenessFlag, ParameterStore, Pipeline, PipelineConfig};

use crate::controls::ParameterControls;

const TITLE: &str = "horizon";

/// Viewer application: owns the pipeline and its GPU executor.
pub struct HorizonApp {
    config: PipelineConfig,
    shader_dir: Option<PathBuf>,
    params: ParameterStore,
    liveness: LivenessFlag,
    controls: ParameterControls,

    // Field order is drop order: pipeline targets go before the renderer.
    pipeline: Option<Pipeline<GpuTargetAllocator>>,
    renderer: Option<GpuRenderer>,
}

impl HorizonApp {
    pub fn new(config: PipelineConfig, shader_dir: Option<PathBuf>) -> Self {
        let params = ParameterStore::new(config.parameters);
        Self {
            config,
            shader_dir,
            params,
            liveness: LivenessFlag::new(),
            controls: ParameterControls::new(),
            pipeline: None,
            renderer: None,
        }
    }

    fn refresh_title(&self, ctx: &FrameCtx<'_, '_>) {
        ctx.window.set_title(&self.controls.title(TITLE, &self.params));
    }
}

impl App for HorizonApp {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> Result<()> {
        let device = ctx.gpu.device().clone();
        let queue = ctx.gpu.queue().clone();
        let mut renderer = GpuRenderer::new(device.clone(), queue.clone(), ctx.gpu.surface_format());
        let allocator = GpuTargetAllocator::new(device.clone());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("horizon start-up encoder"),
        });
        let mut executor = GpuPassExecutor {
            renderer: &mut renderer,
            encoder: &mut encoder,
            surface: None,
        };

        let viewport = ctx.window.viewport();
        let config = self.config.clone();
        let params = self.params.clone();
        let liveness = self.liveness.clone();
        let launched = match &self.shader_dir {
            Some(dir) => {
                log::info!("loading shaders from {}", dir.display());
                pollster::block_on(Pipeline::launch(
                    config,
                    params,
                    &FsAssetSource::new(dir.clone()),
                    allocator,
                    viewport,
                    liveness,
                    &mut executor,
                ))
            }
            None => pollster::block_on(Pipeline::launch(
                config,
                params,
                &EmbeddedAssets,
                allocator,
                viewport,
                liveness,
                &mut executor,
            )),
        }
        .context("failed to start the visualization")?;

        queue.submit(std::iter::once(encoder.finish()));

        self.pipeline = launched;
        self.renderer = Some(renderer);
        ctx.window.set_title(&self.controls.title(TITLE, &self.params));
        Ok(())
    }

    fn on_resize(&mut self, viewport: Viewport) {
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.notify_resize(viewport);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }
        let (Some(pipeline), Some(renderer)) = (self.pipeline.as_mut(), self.renderer.as_mut())
        else {
            return AppControl::Continue;
        };

        let (dx, dy) = ctx.input_frame.drag_delta;
        let height = ctx.window.viewport().height;
        let orbit = &mut pipeline.rig_mut().controls;
        if dx != 0.0 || dy != 0.0 {
            orbit.drag(dx, dy, height);
        }
        if ctx.input_frame.wheel_lines != 0.0 {
            orbit.zoom(ctx.input_frame.wheel_lines);
        }

        let readout_changed = self.controls.apply(ctx.input_frame, &self.params);

        let mut fatal = None;
        let control = ctx.render(|rctx, target| {
            let mut executor = GpuPassExecutor {
                renderer: &mut *renderer,
                encoder: &mut *target.encoder,
                surface: Some(target.color_view),
            };
            match pipeline.frame(rctx.time.elapsed, &mut executor) {
                Ok(_) => Ok(()),
                Err(e) if e.is_fatal() => {
                    let (w, h) = rctx.surface_size;
                    fatal = Some(
                        anyhow::Error::from(e)
                            .context(format!("frame {} on a {w}x{h} surface", rctx.time.frame_index)),
                    );
                    Err(anyhow::anyhow!("pipeline stopped"))
                }
                Err(e) => Err(e.into()),
            }
        });

        if let Some(err) = fatal {
            ctx.runtime.fail(err);
            return AppControl::Exit;
        }
        if pipeline.wants_redraw() {
            ctx.request_redraw();
        }
        if readout_changed {
            self.refresh_title(ctx);
        }
        control
    }

    fn on_shutdown(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.shutdown();
        }
        self.liveness.clear();
        self.renderer = None;
    }
}
