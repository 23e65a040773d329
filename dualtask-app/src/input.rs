use dualtask_core::FrameInput;
use winit::keyboard::KeyCode;

/// Keyboard state between frames: the arrows are level-triggered, ENTER and
/// SPACE only count on the frame they went down.
#[derive(Debug, Default)]
pub struct KeyboardState {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    start_pressed: bool,
    space_pressed: bool,
}

impl KeyboardState {
    /// Feeds one key event. Auto-repeat presses are ignored.
    pub fn handle(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        match key {
            KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::ArrowRight => self.right = pressed,
            KeyCode::ArrowUp => self.up = pressed,
            KeyCode::ArrowDown => self.down = pressed,
            KeyCode::Enter | KeyCode::NumpadEnter if pressed && !repeat => {
                self.start_pressed = true
            }
            KeyCode::Space if pressed && !repeat => self.space_pressed = true,
            _ => {}
        }
    }

    /// Snapshot for this frame; clears the one-frame presses.
    pub fn take_frame(&mut self) -> FrameInput {
        let input = FrameInput {
            start: self.start_pressed,
            space: self.space_pressed,
            left: self.left,
            right: self.right,
            up: self.up,
            down: self.down,
        };
        self.start_pressed = false;
        self.space_pressed = false;
        input
    }

    /// Drops held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presses_last_one_frame_and_arrows_stay_held() {
        let mut kb = KeyboardState::default();
        kb.handle(KeyCode::Space, true, false);
        kb.handle(KeyCode::ArrowUp, true, false);

        let first = kb.take_frame();
        assert!(first.space && first.up);

        kb.handle(KeyCode::Space, true, true);
        let second = kb.take_frame();
        assert!(!second.space);
        assert!(second.up);

        kb.handle(KeyCode::ArrowUp, false, false);
        kb.handle(KeyCode::Enter, true, false);
        let third = kb.take_frame();
        assert!(third.start && !third.up);
    }
}
