//! Resize Coordinator.
//!
//! Viewport notifications are only recorded; the render thread applies the
//! latest one at the top of the next tick, so a target is never reallocated
//! while a pass uses it and a burst of notifications costs one reallocation.

use horizon_engine::coords::Viewport;

use crate::camera::CameraRig;
use crate::targets::{AllocationError, PipelineTargets, RenderTargetRegistry, TargetAllocator};

/// Device pixel ratio after applying `cap`.
pub fn effective_pixel_ratio(scale_factor: f32, cap: f32) -> f32 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor.min(cap)
    } else {
        1.0
    }
}

/// Logical viewport size times the capped pixel ratio, rounded to whole pixels.
pub fn device_size(viewport: Viewport, cap: f32) -> (u32, u32) {
    let ratio = effective_pixel_ratio(viewport.scale_factor, cap);
    (
        (viewport.width * ratio).round().max(0.0) as u32,
        (viewport.height * ratio).round().max(0.0) as u32,
    )
}

#[derive(Debug)]
pub struct ResizeCoordinator {
    max_pixel_ratio: f32,
    pending: Option<Viewport>,
    device_size: (u32, u32),
    pixel_ratio: f32,
}

impl ResizeCoordinator {
    /// `initial` is the viewport the targets are first allocated for. A
    /// zero-sized one yields 1x1 device pixels.
    pub fn new(initial: Viewport, max_pixel_ratio: f32) -> Self {
        let (width, height) = device_size(initial, max_pixel_ratio);
        Self {
            max_pixel_ratio,
            pending: None,
            device_size: (width.max(1), height.max(1)),
            pixel_ratio: effective_pixel_ratio(initial.scale_factor, max_pixel_ratio),
        }
    }

    /// Records a viewport change. The most recent notification wins.
    pub fn notify(&mut self, viewport: Viewport) {
        self.pending = Some(viewport);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Size of the viewport-sized targets in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        self.device_size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Applies the pending viewport: the three viewport-sized targets first,
    /// then camera aspect, device size and pixel ratio. Returns `Ok(true)` if
    /// anything was applied.
    ///
    /// A zero-sized viewport (minimized window) is dropped and the previous
    /// sizes are kept. If any target cannot be resized, the targets already
    /// resized are put back to the previous size and nothing is committed.
    pub fn apply<A: TargetAllocator>(
        &mut self,
        registry: &mut RenderTargetRegistry<A>,
        targets: &PipelineTargets,
        rig: &mut CameraRig,
    ) -> Result<bool, AllocationError> {
        let Some(viewport) = self.pending.take() else {
            return Ok(false);
        };
        if !viewport.is_valid() {
            log::debug!("ignoring degenerate viewport {viewport:?}");
            return Ok(false);
        }

        let (width, height) = device_size(viewport, self.max_pixel_ratio);
        if width == 0 || height == 0 {
            return Ok(false);
        }

        let handles = targets.viewport_sized();
        for (i, &handle) in handles.iter().enumerate() {
            if let Err(e) = registry.resize(handle, width, height) {
                let (old_w, old_h) = self.device_size;
                for &done in &handles[..i] {
                    if let Err(undo) = registry.resize(done, old_w, old_h) {
                        log::error!("could not restore target to {old_w}x{old_h}: {undo}");
                    }
                }
                return Err(e);
            }
        }

        rig.set_aspect(viewport.aspect());
        self.device_size = (width, height);
        self.pixel_ratio = effective_pixel_ratio(viewport.scale_factor, self.max_pixel_ratio);
        log::debug!("viewport applied: {width}x{height} device px");
        Ok(true)
    }
}
