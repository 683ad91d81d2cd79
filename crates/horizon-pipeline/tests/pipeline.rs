use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use horizon_engine::coords::Viewport;
use horizon_pipeline::assets::{EmbeddedAssets, MemoryAssets};
use horizon_pipeline::frame::{Frame, PassId};
use horizon_pipeline::lifecycle::FrameResources;
use horizon_pipeline::targets::NullAllocator;
use horizon_pipeline::{
    LivenessFlag, ParameterStore, PassExecutor, Pipeline, PipelineConfig, TickError, TickOutcome,
};

/// Records every frame handed to it.
#[derive(Default)]
struct RecordingExecutor {
    frames: Vec<Frame>,
    fail_next: bool,
}

impl RecordingExecutor {
    fn count(&self, id: PassId) -> usize {
        self.frames
            .iter()
            .flat_map(|f| f.passes.iter())
            .filter(|p| p.id == id)
            .count()
    }
}

impl PassExecutor<NullAllocator> for RecordingExecutor {
    fn execute(
        &mut self,
        frame: &Frame,
        _resources: &FrameResources<'_, NullAllocator>,
    ) -> anyhow::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            anyhow::bail!("device lost");
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

fn still_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.star_count = 64;
    config.jitter.amplitude = 0.0;
    config.roll_per_tick = 0.0;
    config.orbit.enable_damping = false;
    config
}

fn launch(
    config: PipelineConfig,
    viewport: Viewport,
    executor: &mut RecordingExecutor,
) -> Pipeline<NullAllocator> {
    let params = ParameterStore::new(config.parameters);
    pollster::block_on(Pipeline::launch(
        config,
        params,
        &EmbeddedAssets,
        NullAllocator::default(),
        viewport,
        LivenessFlag::new(),
        executor,
    ))
    .expect("launch")
    .expect("pipeline should start")
}

fn size_of(pipeline: &Pipeline<NullAllocator>) -> [Option<(u32, u32)>; 3] {
    pipeline
        .targets()
        .viewport_sized()
        .map(|h| pipeline.registry().size(h))
}

#[test]
fn first_tick_renders_all_passes_in_order() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);

    let outcome = pipeline.frame(0.0, &mut exec).expect("tick");
    assert_eq!(outcome, TickOutcome::Rendered { index: 0 });

    assert_eq!(size_of(&pipeline), [Some((800, 600)); 3]);
    assert!((pipeline.rig().aspect() - 4.0 / 3.0).abs() < 1e-6);

    let frame = exec.frames.last().expect("frame submitted");
    let order: Vec<PassId> = frame.passes.iter().map(|p| p.id).collect();
    assert_eq!(
        order,
        vec![
            PassId::World,
            PassId::Distortion,
            PassId::Composition,
            PassId::Dither
        ]
    );
    assert!(frame.check_ordering().is_ok());
    assert!(pipeline.wants_redraw());
}

#[test]
fn noise_bake_runs_once() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(640.0, 480.0, 1.0), &mut exec);
    assert_eq!(exec.count(PassId::NoiseBake), 1);

    for (i, width) in [320.0, 1024.0, 500.0].into_iter().enumerate() {
        pipeline.notify_resize(Viewport::new(width, 400.0, 1.0));
        pipeline.frame(i as f32 * 0.016, &mut exec).expect("tick");
    }
    pipeline.frame(1.0, &mut exec).expect("tick");

    assert_eq!(exec.count(PassId::NoiseBake), 1);
    assert_eq!(pipeline.noise_bake_runs(), 1);
    assert_eq!(exec.count(PassId::Dither), 4);
    // The noise target keeps its fixed size.
    let noise = pipeline.targets().noise;
    assert_eq!(pipeline.registry().size(noise), Some((256, 256)));
}

#[test]
fn latest_resize_wins_and_ratio_is_capped() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);

    pipeline.notify_resize(Viewport::new(1000.0, 1000.0, 1.0));
    pipeline.notify_resize(Viewport::new(400.0, 300.0, 3.0));
    pipeline.frame(0.0, &mut exec).expect("tick");

    assert_eq!(size_of(&pipeline), [Some((800, 600)); 3]);
    assert_eq!(pipeline.device_size(), (800, 600));
    assert_eq!(pipeline.assembly().materials.stars.uniforms.pixel_ratio, 2.0);
    assert_eq!(
        pipeline.assembly().materials.dither.uniforms.resolution,
        [800.0, 600.0]
    );
}

#[test]
fn minimized_window_keeps_previous_targets() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);

    pipeline.notify_resize(Viewport::new(0.0, 0.0, 1.0));
    pipeline.frame(0.0, &mut exec).expect("tick");
    assert_eq!(size_of(&pipeline), [Some((800, 600)); 3]);
}

#[test]
fn oversized_resize_is_fatal_and_keeps_state_consistent() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);
    pipeline.frame(0.0, &mut exec).expect("tick");

    pipeline.notify_resize(Viewport::new(9000.0, 100.0, 1.0));
    let err = pipeline.frame(0.016, &mut exec).unwrap_err();
    assert!(matches!(err, TickError::Allocation(_)));
    assert!(err.is_fatal());

    // Neither the camera nor the reported size moved to the rejected viewport.
    assert!((pipeline.rig().aspect() - 4.0 / 3.0).abs() < 1e-6);
    assert_eq!(pipeline.device_size(), (800, 600));

    assert!(pipeline.is_shut_down());
    assert!(!pipeline.wants_redraw());
    assert_eq!(pipeline.frame(0.032, &mut exec).expect("tick"), TickOutcome::Stopped);
    assert_eq!(exec.count(PassId::Dither), 1);
}

#[test]
fn zero_sized_launch_still_starts() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(0.0, 0.0, 1.0), &mut exec);
    assert_eq!(size_of(&pipeline), [Some((1, 1)); 3]);
    assert_eq!(pipeline.device_size(), (1, 1));

    pipeline.notify_resize(Viewport::new(640.0, 480.0, 1.0));
    assert_eq!(
        pipeline.frame(0.0, &mut exec).expect("tick"),
        TickOutcome::Rendered { index: 0 }
    );
    assert_eq!(size_of(&pipeline), [Some((640, 480)); 3]);
    assert!((pipeline.rig().aspect() - 4.0 / 3.0).abs() < 1e-6);
}

#[test]
fn parameter_writes_reach_the_next_tick() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);
    pipeline.frame(0.0, &mut exec).expect("tick");

    let params = pipeline.params().clone();
    let writer = std::thread::spawn(move || {
        params.set_grid_size(5.0);
        params.set_background([0.2, 0.4, 0.6]);
    });
    writer.join().expect("writer thread");

    pipeline.frame(0.016, &mut exec).expect("tick");
    let dither = pipeline.assembly().materials.dither.uniforms;
    assert_eq!(dither.grid_size, 5.0);
    assert_eq!(dither.background, [0.2, 0.4, 0.6]);
    assert_eq!(dither.intensity, 0.7);
}

#[test]
fn convergence_follows_an_orbit() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);

    // Orbit an off-center target so the origin lands away from the middle.
    let target = Vec3::new(2.0, 0.0, 0.0);
    let rig = pipeline.rig_mut();
    rig.controls.target = target;
    rig.controls.rotate_left(FRAC_PI_2);
    pipeline.frame(0.0, &mut exec).expect("tick");

    // (0, 3, 10) around (2, 0, 0) by -90 degrees about +Y.
    let eye = Vec3::new(-8.0, 3.0, -2.0);
    assert!((pipeline.rig().camera.position - eye).length() < 1e-4);

    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    let p = view.transform_point3(Vec3::ZERO);
    let f = 1.0 / (35f32.to_radians() * 0.5).tan();
    let expected_x = 0.5 + 0.5 * (f / (4.0 / 3.0)) * p.x / -p.z;
    let expected_y = 0.5 + 0.5 * f * p.y / -p.z;

    let frame = exec.frames.last().expect("frame");
    let c = frame.convergence.0;
    assert!((c.x - expected_x).abs() < 1e-4, "{} vs {}", c.x, expected_x);
    assert!((c.y - expected_y).abs() < 1e-4, "{} vs {}", c.y, expected_y);
    assert!((c.x - 0.5).abs() > 0.01);
    assert_eq!(
        pipeline.assembly().materials.composition.uniforms.convergence,
        c.to_array()
    );
}

#[test]
fn submission_failure_is_not_fatal() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);

    exec.fail_next = true;
    let err = pipeline.frame(0.0, &mut exec).expect_err("submission fails");
    assert!(matches!(err, TickError::Submission { .. }));
    assert!(!err.is_fatal());
    assert!(pipeline.wants_redraw());

    assert!(matches!(
        pipeline.frame(0.016, &mut exec),
        Ok(TickOutcome::Rendered { .. })
    ));
}

#[test]
fn shutdown_is_idempotent_and_stops_submission() {
    let mut exec = RecordingExecutor::default();
    let mut pipeline = launch(still_config(), Viewport::new(800.0, 600.0, 1.0), &mut exec);
    pipeline.frame(0.0, &mut exec).expect("tick");
    let submitted = exec.frames.len();

    pipeline.shutdown();
    pipeline.shutdown();
    assert!(pipeline.is_shut_down());
    assert_eq!(pipeline.registry().live_count(), 0);
    assert!(!pipeline.wants_redraw());

    assert_eq!(
        pipeline.frame(0.016, &mut exec).expect("stopped tick"),
        TickOutcome::Stopped
    );
    assert_eq!(exec.frames.len(), submitted);
    let composed = pipeline.targets().composed;
    assert!(pipeline.registry().storage(composed).is_none());
}

#[test]
fn cleared_liveness_stops_the_next_tick() {
    let mut exec = RecordingExecutor::default();
    let liveness = LivenessFlag::new();
    let config = still_config();
    let mut pipeline = pollster::block_on(Pipeline::launch(
        config.clone(),
        ParameterStore::new(config.parameters),
        &EmbeddedAssets,
        NullAllocator::default(),
        Viewport::new(800.0, 600.0, 1.0),
        liveness.clone(),
        &mut exec,
    ))
    .expect("launch")
    .expect("running");

    liveness.clear();
    assert_eq!(
        pipeline.frame(0.0, &mut exec).expect("tick"),
        TickOutcome::Stopped
    );
    assert!(pipeline.is_shut_down());
}

#[test]
fn launch_fails_on_missing_shader() {
    let mut exec = RecordingExecutor::default();
    let config = still_config();
    let result = pollster::block_on(Pipeline::launch(
        config.clone(),
        ParameterStore::new(config.parameters),
        &MemoryAssets::new(),
        NullAllocator::default(),
        Viewport::new(800.0, 600.0, 1.0),
        LivenessFlag::new(),
        &mut exec,
    ));
    assert!(result.is_err());
    assert!(exec.frames.is_empty());
}

#[test]
fn launch_after_teardown_does_not_start() {
    let mut exec = RecordingExecutor::default();
    let liveness = LivenessFlag::new();
    liveness.clear();
    let config = still_config();
    let result = pollster::block_on(Pipeline::launch(
        config.clone(),
        ParameterStore::new(config.parameters),
        &EmbeddedAssets,
        NullAllocator::new(64),
        Viewport::new(800.0, 600.0, 1.0),
        liveness,
        &mut exec,
    ))
    .expect("no error");
    assert!(result.is_none());
    assert!(exec.frames.is_empty());
}
