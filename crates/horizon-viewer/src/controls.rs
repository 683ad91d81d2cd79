//! Keyboard bindings for the dither parameters.
//!
//! | keys    | parameter  | range     | step |
//! |---------|------------|-----------|------|
//! | `[` `]` | grid size  | 1 - 8     | 0.5  |
//! | `-` `=` | intensity  | 0 - 1     | 0.1  |
//! | `,` `.` | contrast   | 0.5 - 3   | 0.1  |
//! | `1`-`3` | background | presets   |      |
//! | `H`     | show or hide the readout in the title |

use horizon_engine::input::{InputFrame, Key};
use horizon_pipeline::ParameterStore;

#[derive(Debug, Copy, Clone, PartialEq)]
struct Range {
    min: f32,
    max: f32,
    step: f32,
}

impl Range {
    fn nudge(self, value: f32, steps: f32) -> f32 {
        let next = value + steps * self.step;
        // Snap to the step grid so repeated nudges do not drift.
        let snapped = (next / self.step).round() * self.step;
        snapped.clamp(self.min, self.max)
    }
}

const GRID_SIZE: Range = Range { min: 1.0, max: 8.0, step: 0.5 };
const INTENSITY: Range = Range { min: 0.0, max: 1.0, step: 0.1 };
const CONTRAST: Range = Range { min: 0.5, max: 3.0, step: 0.1 };

pub const BACKGROUNDS: [(&str, [f32; 3]); 3] = [
    ("black", [0.0, 0.0, 0.0]),
    ("dark blue", [0.1, 0.1, 0.2]),
    ("dark purple", [0.2, 0.1, 0.2]),
];

fn background_name(rgb: [f32; 3]) -> &'static str {
    BACKGROUNDS
        .iter()
        .find(|(_, c)| *c == rgb)
        .map_or("custom", |(name, _)| name)
}

fn axis(frame: &InputFrame, down: Key, up: Key) -> f32 {
    let mut steps = 0.0;
    if frame.key_pressed(down) {
        steps -= 1.0;
    }
    if frame.key_pressed(up) {
        steps += 1.0;
    }
    steps
}

#[derive(Debug)]
pub struct ParameterControls {
    visible: bool,
}

impl ParameterControls {
    pub fn new() -> Self {
        Self { visible: true }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Applies this frame's key presses. Returns true if the readout changed.
    pub fn apply(&mut self, frame: &InputFrame, params: &ParameterStore) -> bool {
        let mut changed = false;

        if frame.key_pressed(Key::H) {
            self.visible = !self.visible;
            changed = true;
        }

        let grid = axis(frame, Key::BracketLeft, Key::BracketRight);
        if grid != 0.0 {
            params.set_grid_size(GRID_SIZE.nudge(params.grid_size(), grid));
            changed = true;
        }
        let intensity = axis(frame, Key::Minus, Key::Equal);
        if intensity != 0.0 {
            params.set_intensity(INTENSITY.nudge(params.intensity(), intensity));
            changed = true;
        }
        let contrast = axis(frame, Key::Comma, Key::Period);
        if contrast != 0.0 {
            params.set_contrast(CONTRAST.nudge(params.contrast(), contrast));
            changed = true;
        }

        for (key, (_, rgb)) in [Key::Digit1, Key::Digit2, Key::Digit3]
            .into_iter()
            .zip(BACKGROUNDS)
        {
            if frame.key_pressed(key) {
                params.set_background(rgb);
                changed = true;
            }
        }

        changed
    }

    /// Window title for the current parameters.
    pub fn title(&self, base: &str, params: &ParameterStore) -> String {
        if !self.visible {
            return base.to_string();
        }
        let p = params.snapshot();
        format!(
            "{base}  |  grid {:.1}  intensity {:.1}  contrast {:.1}  bg {}",
            p.grid_size,
            p.intensity,
            p.contrast,
            background_name(p.background),
        )
    }
}

impl Default for ParameterControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_pipeline::ParameterDefaults;

    fn press(keys: &[Key]) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.keys_pressed.extend(keys.iter().copied());
        frame
    }

    #[test]
    fn grid_size_steps_and_clamps() {
        let params = ParameterStore::new(ParameterDefaults::default());
        let mut controls = ParameterControls::new();

        assert!(controls.apply(&press(&[Key::BracketRight]), &params));
        assert_eq!(params.grid_size(), 3.5);

        for _ in 0..20 {
            controls.apply(&press(&[Key::BracketRight]), &params);
        }
        assert_eq!(params.grid_size(), 8.0);

        for _ in 0..20 {
            controls.apply(&press(&[Key::BracketLeft]), &params);
        }
        assert_eq!(params.grid_size(), 1.0);
    }

    #[test]
    fn intensity_stays_in_unit_range() {
        let params = ParameterStore::new(ParameterDefaults::default());
        let mut controls = ParameterControls::new();
        for _ in 0..5 {
            controls.apply(&press(&[Key::Equal]), &params);
        }
        assert!((params.intensity() - 1.0).abs() < 1e-6);
        controls.apply(&press(&[Key::Minus]), &params);
        assert!((params.intensity() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn presets_and_readout() {
        let params = ParameterStore::new(ParameterDefaults::default());
        let mut controls = ParameterControls::new();

        controls.apply(&press(&[Key::Digit3]), &params);
        assert_eq!(params.background(), [0.2, 0.1, 0.2]);
        assert!(controls.title("horizon", &params).ends_with("bg dark purple"));

        controls.apply(&press(&[Key::H]), &params);
        assert!(!controls.visible());
        assert_eq!(controls.title("horizon", &params), "horizon");
    }

    #[test]
    fn idle_frame_changes_nothing() {
        let params = ParameterStore::new(ParameterDefaults::default());
        let mut controls = ParameterControls::new();
        assert!(!controls.apply(&InputFrame::default(), &params));
        assert_eq!(params.snapshot().grid_size, 3.0);
    }
}
