//! Render Target Registry.
//!
//! Owns every off-screen buffer the passes draw into. Callers hold a stable
//! [`RenderTargetHandle`]; resizing swaps the backing storage behind it and
//! bumps the slot's generation so anything caching GPU bindings for the old
//! storage can tell it went stale.
//!
//! Storage creation is delegated to a [`TargetAllocator`], which keeps the
//! registry testable without a device.

use thiserror::Error;

/// Pixel layout of a target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TargetFormat {
    /// Four 8-bit channels.
    Rgba8,
    /// Single 8-bit channel.
    R8,
    /// Four half-float channels.
    Rgba16Float,
}

/// Sampler addressing for reads of a target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WrapMode {
    Clamp,
    Repeat,
}

/// The named targets of the pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TargetKind {
    PreDistortion,
    DistortionMask,
    Composed,
    NoiseBake,
}

impl TargetKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreDistortion => "pre-distortion color",
            Self::DistortionMask => "distortion mask",
            Self::Composed => "composed color",
            Self::NoiseBake => "noise bake",
        }
    }

    /// Format, mip and wrap settings for this kind.
    pub const fn desc(self) -> TargetDesc {
        let (format, wrap) = match self {
            Self::PreDistortion | Self::Composed => (TargetFormat::Rgba8, WrapMode::Clamp),
            Self::DistortionMask => (TargetFormat::R8, WrapMode::Clamp),
            Self::NoiseBake => (TargetFormat::Rgba16Float, WrapMode::Repeat),
        };
        TargetDesc {
            kind: self,
            format,
            mipmaps: false,
            wrap,
        }
    }

    /// Whether the target follows the viewport size.
    pub const fn tracks_viewport(self) -> bool {
        !matches!(self, Self::NoiseBake)
    }
}

/// Immutable description of a target, preserved across resizes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TargetDesc {
    pub kind: TargetKind,
    pub format: TargetFormat,
    /// Generate mipmaps after each write.
    pub mipmaps: bool,
    pub wrap: WrapMode,
}

/// Stable identity of a render target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderTargetHandle(u32);

impl RenderTargetHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The four targets of the pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PipelineTargets {
    pub pre_distortion: RenderTargetHandle,
    pub distortion_mask: RenderTargetHandle,
    pub composed: RenderTargetHandle,
    pub noise: RenderTargetHandle,
}

impl PipelineTargets {
    /// Targets sized from the viewport.
    pub fn viewport_sized(&self) -> [RenderTargetHandle; 3] {
        [self.pre_distortion, self.distortion_mask, self.composed]
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("render target size must be non-zero (got {width}x{height})")]
    ZeroSize { width: u32, height: u32 },

    #[error("render target {width}x{height} exceeds the device limit of {max}")]
    ExceedsLimit { width: u32, height: u32, max: u32 },

    #[error("render target handle {0:?} is not allocated")]
    UnknownHandle(RenderTargetHandle),
}

/// Creates backing storage for targets.
///
/// Sizes are in device pixels. Implementations reject sizes the device cannot
/// hold; zero sizes never reach them.
pub trait TargetAllocator {
    type Storage;

    fn create(
        &mut self,
        desc: &TargetDesc,
        width: u32,
        height: u32,
    ) -> Result<Self::Storage, AllocationError>;

    /// Frees storage. Dropping it must be enough; this hook exists for
    /// allocators that track what they hand out.
    fn destroy(&mut self, storage: Self::Storage) {
        drop(storage);
    }
}

#[derive(Debug)]
struct Slot<S> {
    desc: TargetDesc,
    width: u32,
    height: u32,
    generation: u64,
    storage: Option<S>,
}

/// Registry of render targets backed by allocator `A`.
pub struct RenderTargetRegistry<A: TargetAllocator> {
    allocator: A,
    slots: Vec<Slot<A::Storage>>,
}

impl<A: TargetAllocator> RenderTargetRegistry<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            slots: Vec::new(),
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Creates a target of `kind` at `width`x`height` device pixels.
    pub fn allocate(
        &mut self,
        kind: TargetKind,
        width: u32,
        height: u32,
    ) -> Result<RenderTargetHandle, AllocationError> {
        check_size(width, height)?;
        let desc = kind.desc();
        let storage = self.allocator.create(&desc, width, height)?;

        let handle = RenderTargetHandle(self.slots.len() as u32);
        self.slots.push(Slot {
            desc,
            width,
            height,
            generation: 0,
            storage: Some(storage),
        });
        log::debug!("allocated {} target {width}x{height}", kind.label());
        Ok(handle)
    }

    /// Replaces the backing storage of `handle` with one of the new size.
    ///
    /// The new storage is created before the old one is freed; on failure the
    /// target keeps its previous storage and size. Returns `true` when the
    /// storage was actually replaced.
    pub fn resize(
        &mut self,
        handle: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> Result<bool, AllocationError> {
        let slot = self
            .slots
            .get(handle.index())
            .filter(|s| s.storage.is_some())
            .ok_or(AllocationError::UnknownHandle(handle))?;
        if slot.width == width && slot.height == height {
            return Ok(false);
        }
        check_size(width, height)?;

        let desc = slot.desc;
        let storage = match self.allocator.create(&desc, width, height) {
            Ok(s) => s,
            Err(e) => {
                log::error!(
                    "failed to resize {} target to {width}x{height}: {e}",
                    desc.kind.label()
                );
                return Err(e);
            }
        };

        let slot = &mut self.slots[handle.index()];
        if let Some(old) = slot.storage.replace(storage) {
            self.allocator.destroy(old);
        }
        slot.width = width;
        slot.height = height;
        slot.generation += 1;
        log::debug!(
            "resized {} target to {width}x{height} (generation {})",
            desc.kind.label(),
            slot.generation
        );
        Ok(true)
    }

    /// Frees the storage of `handle`. Releasing twice is a no-op.
    pub fn release(&mut self, handle: RenderTargetHandle) {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return;
        };
        if let Some(storage) = slot.storage.take() {
            self.allocator.destroy(storage);
            log::debug!("released {} target", slot.desc.kind.label());
        }
    }

    /// Frees every target still holding storage.
    pub fn release_all(&mut self) {
        for index in 0..self.slots.len() {
            self.release(RenderTargetHandle(index as u32));
        }
    }

    pub fn is_live(&self, handle: RenderTargetHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|s| s.storage.is_some())
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.storage.is_some()).count()
    }

    pub fn desc(&self, handle: RenderTargetHandle) -> Option<TargetDesc> {
        self.slots.get(handle.index()).map(|s| s.desc)
    }

    /// Size in device pixels of a live target.
    pub fn size(&self, handle: RenderTargetHandle) -> Option<(u32, u32)> {
        self.live_slot(handle).map(|s| (s.width, s.height))
    }

    pub fn generation(&self, handle: RenderTargetHandle) -> Option<u64> {
        self.live_slot(handle).map(|s| s.generation)
    }

    pub fn storage(&self, handle: RenderTargetHandle) -> Option<&A::Storage> {
        self.slots.get(handle.index())?.storage.as_ref()
    }

    fn live_slot(&self, handle: RenderTargetHandle) -> Option<&Slot<A::Storage>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.storage.is_some())
    }
}

fn check_size(width: u32, height: u32) -> Result<(), AllocationError> {
    if width == 0 || height == 0 {
        return Err(AllocationError::ZeroSize { width, height });
    }
    Ok(())
}

/// Allocator that only records sizes. Used by tests and headless runs.
#[derive(Debug, Clone)]
pub struct NullAllocator {
    /// Largest accepted width or height.
    pub max_dimension: u32,
    pub created: usize,
    pub destroyed: usize,
}

impl NullAllocator {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension,
            created: 0,
            destroyed: 0,
        }
    }
}

impl Default for NullAllocator {
    fn default() -> Self {
        Self::new(8192)
    }
}

/// Storage handed out by [`NullAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullStorage {
    pub width: u32,
    pub height: u32,
}

impl TargetAllocator for NullAllocator {
    type Storage = NullStorage;

    fn create(
        &mut self,
        _desc: &TargetDesc,
        width: u32,
        height: u32,
    ) -> Result<NullStorage, AllocationError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(AllocationError::ExceedsLimit {
                width,
                height,
                max: self.max_dimension,
            });
        }
        self.created += 1;
        Ok(NullStorage { width, height })
    }

    fn destroy(&mut self, _storage: NullStorage) {
        self.destroyed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RenderTargetRegistry<NullAllocator> {
        RenderTargetRegistry::new(NullAllocator::new(4096))
    }

    #[test]
    fn kinds_carry_expected_formats() {
        assert_eq!(TargetKind::DistortionMask.desc().format, TargetFormat::R8);
        assert_eq!(TargetKind::NoiseBake.desc().wrap, WrapMode::Repeat);
        assert!(!TargetKind::NoiseBake.tracks_viewport());
        assert!(TargetKind::Composed.tracks_viewport());
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut reg = registry();
        let err = reg.allocate(TargetKind::Composed, 0, 600).unwrap_err();
        assert_eq!(err, AllocationError::ZeroSize { width: 0, height: 600 });
        assert_eq!(reg.live_count(), 0);
    }

    #[test]
    fn resize_keeps_identity_and_bumps_generation() {
        let mut reg = registry();
        let h = reg.allocate(TargetKind::PreDistortion, 800, 600).unwrap();
        assert_eq!(reg.generation(h), Some(0));

        assert!(reg.resize(h, 1024, 768).unwrap());
        assert_eq!(reg.size(h), Some((1024, 768)));
        assert_eq!(reg.generation(h), Some(1));
        assert_eq!(reg.desc(h).unwrap().kind, TargetKind::PreDistortion);
        assert_eq!(reg.storage(h), Some(&NullStorage { width: 1024, height: 768 }));
        assert_eq!(reg.allocator().destroyed, 1);
    }

    #[test]
    fn resize_to_same_size_is_noop() {
        let mut reg = registry();
        let h = reg.allocate(TargetKind::Composed, 320, 200).unwrap();
        assert!(!reg.resize(h, 320, 200).unwrap());
        assert_eq!(reg.generation(h), Some(0));
        assert_eq!(reg.allocator().created, 1);
    }

    #[test]
    fn failed_resize_keeps_old_storage() {
        let mut reg = registry();
        let h = reg.allocate(TargetKind::Composed, 800, 600).unwrap();

        let err = reg.resize(h, 10_000, 600).unwrap_err();
        assert_eq!(
            err,
            AllocationError::ExceedsLimit { width: 10_000, height: 600, max: 4096 }
        );
        assert_eq!(reg.size(h), Some((800, 600)));
        assert_eq!(reg.generation(h), Some(0));
        assert!(reg.is_live(h));
    }

    #[test]
    fn release_is_idempotent() {
        let mut reg = registry();
        let h = reg.allocate(TargetKind::DistortionMask, 64, 64).unwrap();

        reg.release(h);
        reg.release(h);
        assert!(!reg.is_live(h));
        assert_eq!(reg.allocator().destroyed, 1);
        assert_eq!(reg.resize(h, 32, 32), Err(AllocationError::UnknownHandle(h)));
    }

    #[test]
    fn release_all_frees_everything_once() {
        let mut reg = registry();
        for kind in [TargetKind::PreDistortion, TargetKind::DistortionMask, TargetKind::Composed] {
            reg.allocate(kind, 100, 100).unwrap();
        }
        reg.release_all();
        reg.release_all();
        assert_eq!(reg.live_count(), 0);
        assert_eq!(reg.allocator().destroyed, 3);
    }
}
