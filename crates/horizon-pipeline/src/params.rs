//! Parameter Store.
//!
//! User-tunable dither parameters shared between the UI side (any thread) and
//! the render thread. Each field is an independent atomic: writes become
//! visible to the next tick's [`ParameterStore::snapshot`], but a background
//! color written channel by channel may be observed half-updated for one tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Initial values of every store entry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParameterDefaults {
    pub grid_size: f32,
    pub intensity: f32,
    pub contrast: f32,
    pub background: [f32; 3],
}

impl Default for ParameterDefaults {
    fn default() -> Self {
        Self {
            grid_size: 3.0,
            intensity: 0.7,
            contrast: 1.2,
            background: [0.0, 0.0, 0.0],
        }
    }
}

/// Values read by one tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub grid_size: f32,
    pub intensity: f32,
    pub contrast: f32,
    pub background: [f32; 3],
}

/// `f32` stored as its bit pattern.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Release);
    }
}

#[derive(Debug)]
struct Fields {
    grid_size: AtomicF32,
    intensity: AtomicF32,
    contrast: AtomicF32,
    background: [AtomicF32; 3],
}

/// Cloneable handle to the shared parameters.
///
/// Single writer per field is assumed; no range validation happens here.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    fields: Arc<Fields>,
}

impl ParameterStore {
    pub fn new(defaults: ParameterDefaults) -> Self {
        let [r, g, b] = defaults.background;
        Self {
            fields: Arc::new(Fields {
                grid_size: AtomicF32::new(defaults.grid_size),
                intensity: AtomicF32::new(defaults.intensity),
                contrast: AtomicF32::new(defaults.contrast),
                background: [AtomicF32::new(r), AtomicF32::new(g), AtomicF32::new(b)],
            }),
        }
    }

    pub fn grid_size(&self) -> f32 {
        self.fields.grid_size.load()
    }

    pub fn set_grid_size(&self, v: f32) {
        self.fields.grid_size.store(v);
    }

    pub fn intensity(&self) -> f32 {
        self.fields.intensity.load()
    }

    pub fn set_intensity(&self, v: f32) {
        self.fields.intensity.store(v);
    }

    pub fn contrast(&self) -> f32 {
        self.fields.contrast.load()
    }

    pub fn set_contrast(&self, v: f32) {
        self.fields.contrast.store(v);
    }

    pub fn background(&self) -> [f32; 3] {
        let [r, g, b] = &self.fields.background;
        [r.load(), g.load(), b.load()]
    }

    /// Writes the three channels one after another.
    pub fn set_background(&self, rgb: [f32; 3]) {
        for (field, v) in self.fields.background.iter().zip(rgb) {
            field.store(v);
        }
    }

    /// Reads every field once for the current tick.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            grid_size: self.grid_size(),
            intensity: self.intensity(),
            contrast: self.contrast(),
            background: self.background(),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(ParameterDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_visible_in_snapshot() {
        let store = ParameterStore::default();
        let snap = store.snapshot();
        assert_eq!(snap.grid_size, 3.0);
        assert_eq!(snap.intensity, 0.7);
        assert_eq!(snap.contrast, 1.2);
        assert_eq!(snap.background, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn clones_share_storage() {
        let ui = ParameterStore::default();
        let render = ui.clone();

        ui.set_grid_size(5.0);
        ui.set_background([0.2, 0.1, 0.2]);

        let snap = render.snapshot();
        assert_eq!(snap.grid_size, 5.0);
        assert_eq!(snap.background, [0.2, 0.1, 0.2]);
    }

    #[test]
    fn writes_from_another_thread_are_observed() {
        let store = ParameterStore::default();
        let writer = store.clone();
        std::thread::spawn(move || writer.set_contrast(2.5))
            .join()
            .unwrap();
        assert_eq!(store.contrast(), 2.5);
    }
}
