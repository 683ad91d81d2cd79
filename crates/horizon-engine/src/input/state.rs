use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState};

/// Current input state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes
    /// deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Release everything so a drag cannot get stuck across focus loss.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                if let Some((px, py)) = self.pointer_pos {
                    if self.buttons_down.contains(&MouseButton::Left) {
                        frame.drag_delta.0 += x - px;
                        frame.drag_delta.1 += y - py;
                    }
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key {
                key,
                state,
                repeat,
            } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(*key) && !*repeat {
                        frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    self.keys_down.remove(key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    if self.buttons_down.insert(*button) {
                        frame.buttons_pressed.insert(*button);
                    }
                }
                MouseButtonState::Released => {
                    if self.buttons_down.remove(button) {
                        frame.buttons_released.insert(*button);
                    }
                }
            },

            InputEvent::MouseWheel(delta) => frame.wheel_lines += delta.lines_y(),
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseWheelDelta;

    fn press(button: MouseButton) -> InputEvent {
        InputEvent::PointerButton {
            button,
            state: MouseButtonState::Pressed,
        }
    }

    #[test]
    fn drag_accumulates_only_while_left_is_held() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 20.0, y: 10.0 });
        assert_eq!(frame.drag_delta, (0.0, 0.0));

        state.apply_event(&mut frame, press(MouseButton::Left));
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 25.0, y: 4.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 30.0, y: 0.0 });
        assert_eq!(frame.drag_delta, (10.0, -10.0));
    }

    #[test]
    fn key_repeat_is_not_a_fresh_press() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        let key = |repeat| InputEvent::Key {
            key: Key::H,
            state: KeyState::Pressed,
            repeat,
        };

        state.apply_event(&mut frame, key(false));
        assert!(frame.key_pressed(Key::H));

        frame.clear();
        state.apply_event(&mut frame, key(true));
        assert!(!frame.key_pressed(Key::H));
        assert!(state.key_down(Key::H));
    }

    #[test]
    fn focus_loss_releases_buttons() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, press(MouseButton::Left));
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.button_down(MouseButton::Left));
    }

    #[test]
    fn wheel_pixels_are_converted_to_lines() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::MouseWheel(MouseWheelDelta::Line { x: 0.0, y: 1.0 }));
        state.apply_event(&mut frame, InputEvent::MouseWheel(MouseWheelDelta::Pixel { x: 0.0, y: 80.0 }));
        assert!((frame.wheel_lines - 3.0).abs() < 1e-6);

        frame.clear();
        assert_eq!(frame.wheel_lines, 0.0);
        assert!(frame.is_idle());
    }
}
