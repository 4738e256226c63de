//! Frame loop state.
//!
//! [`FrameLoop`] owns everything that changes in response to input (motion
//! mode, render toggles, spotlight sweep, camera) and turns one input sample
//! into an immutable [`FrameContext`] that the rest of the frame reads.

use log::info;
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, CameraMovement, CameraView};
use crate::input::{InputSnapshot, KeyCode, KeyTransitions};
use crate::lights::{SpotSweep, ACTIVE_POINT_LIGHTS};
use crate::motion::MotionMode;

/// Shading switches read by the lit program every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderToggles {
    pub use_blinn: bool,
    pub use_toon: bool,
    pub use_gamma: bool,
}

impl Default for RenderToggles {
    fn default() -> Self {
        Self {
            use_blinn: true,
            use_toon: false,
            use_gamma: true,
        }
    }
}

/// Everything one frame needs, sampled once at the start of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since start-up.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    pub mode: MotionMode,
    pub toggles: RenderToggles,
    pub sweep: SpotSweep,
    pub camera: CameraView,
    pub point_lights: usize,
}

const KEY_ORBIT: KeyCode = KeyCode::Digit(1);
const KEY_PENDULUM: KeyCode = KeyCode::Digit(2);
const KEY_SPIRAL: KeyCode = KeyCode::Digit(3);
const KEY_SWARM: KeyCode = KeyCode::Digit(4);
const KEY_BLINN: KeyCode = KeyCode::Character('B');
const KEY_PHONG: KeyCode = KeyCode::Character('P');
const KEY_TOON_ON: KeyCode = KeyCode::Character('T');
const KEY_TOON_OFF: KeyCode = KeyCode::Character('Y');
const KEY_GAMMA: KeyCode = KeyCode::Character('G');
const KEY_SWEEP_LEFT: KeyCode = KeyCode::Character('Q');
const KEY_SWEEP_RIGHT: KeyCode = KeyCode::Character('E');

const MOVEMENT_KEYS: [(KeyCode, CameraMovement); 4] = [
    (KeyCode::Character('W'), CameraMovement::Forward),
    (KeyCode::Character('S'), CameraMovement::Backward),
    (KeyCode::Character('A'), CameraMovement::Left),
    (KeyCode::Character('D'), CameraMovement::Right),
];

#[derive(Debug, Clone)]
pub struct FrameLoop {
    last_time: f32,
    mode: MotionMode,
    toggles: RenderToggles,
    sweep: SpotSweep,
    camera: Camera,
    transitions: KeyTransitions,
    point_lights: usize,
    exit_requested: bool,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(MotionMode::default(), ACTIVE_POINT_LIGHTS)
    }
}

impl FrameLoop {
    pub fn new(mode: MotionMode, point_lights: usize) -> Self {
        Self {
            last_time: 0.0,
            mode,
            toggles: RenderToggles::default(),
            sweep: SpotSweep::default(),
            camera: Camera::default(),
            transitions: KeyTransitions::new(),
            point_lights,
            exit_requested: false,
        }
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn toggles(&self) -> RenderToggles {
        self.toggles
    }

    pub fn sweep(&self) -> SpotSweep {
        self.sweep
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Applies one input sample taken at `time` and returns the context the
    /// rest of the frame runs with.
    pub fn advance(&mut self, time: f32, input: &InputSnapshot) -> FrameContext {
        let delta = time - self.last_time;
        self.last_time = time;

        if input.is_down(KeyCode::Escape) {
            self.exit_requested = true;
        }

        for (key, movement) in MOVEMENT_KEYS {
            if input.is_down(key) {
                self.camera.process_keyboard(movement, delta);
            }
        }
        if input.mouse_delta.x != 0.0 || input.mouse_delta.y != 0.0 {
            self.camera
                .process_mouse_movement(input.mouse_delta.x, -input.mouse_delta.y);
        }
        if input.scroll != 0.0 {
            self.camera.process_mouse_scroll(input.scroll);
        }

        self.apply_mode_keys(input);
        self.apply_toggle_keys(input);
        self.sweep.update(
            input.is_down(KEY_SWEEP_LEFT),
            input.is_down(KEY_SWEEP_RIGHT),
            delta,
        );

        FrameContext {
            time,
            delta,
            mode: self.mode,
            toggles: self.toggles,
            sweep: self.sweep,
            camera: self.camera.view(),
            point_lights: self.point_lights,
        }
    }

    fn apply_mode_keys(&mut self, input: &InputSnapshot) {
        let selected = [
            (KEY_ORBIT, MotionMode::Orbit),
            (KEY_PENDULUM, MotionMode::Pendulum),
            (KEY_SPIRAL, MotionMode::Spiral),
            (KEY_SWARM, MotionMode::Swarm),
        ]
        .into_iter()
        .filter(|(key, _)| input.is_down(*key))
        .map(|(_, mode)| mode)
        .last();
        if let Some(mode) = selected {
            if mode != self.mode {
                info!("motion mode: {mode}");
                self.mode = mode;
            }
        }
    }

    fn apply_toggle_keys(&mut self, input: &InputSnapshot) {
        let before = self.toggles;
        if input.is_down(KEY_BLINN) {
            self.toggles.use_blinn = true;
        }
        if input.is_down(KEY_PHONG) {
            self.toggles.use_blinn = false;
        }
        if input.is_down(KEY_TOON_ON) {
            self.toggles.use_toon = true;
        }
        if input.is_down(KEY_TOON_OFF) {
            self.toggles.use_toon = false;
        }
        let pressed = self.transitions.advance(&input.keys);
        if pressed.contains(&KEY_GAMMA) {
            self.toggles.use_gamma = !self.toggles.use_gamma;
        }
        if before != self.toggles {
            info!(
                "toggles: blinn={} toon={} gamma={}",
                self.toggles.use_blinn, self.toggles.use_toon, self.toggles.use_gamma
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f32 = 1.0 / 60.0;

    fn run(frame_loop: &mut FrameLoop, frames: &[InputSnapshot]) -> Vec<FrameContext> {
        frames
            .iter()
            .enumerate()
            .map(|(index, input)| frame_loop.advance(index as f32 * STEP, input))
            .collect()
    }

    #[test]
    fn gamma_toggles_once_per_press() {
        let held = InputSnapshot::holding([KEY_GAMMA]);
        let released = InputSnapshot::default();
        let mut frame_loop = FrameLoop::default();
        let contexts = run(
            &mut frame_loop,
            &[
                held.clone(),
                held.clone(),
                held.clone(),
                released,
                held.clone(),
                held,
            ],
        );
        let gamma: Vec<bool> = contexts.iter().map(|c| c.toggles.use_gamma).collect();
        assert_eq!(gamma, [false, false, false, false, true, true]);
    }

    #[test]
    fn level_keys_set_toggles() {
        let mut frame_loop = FrameLoop::default();
        let ctx = frame_loop.advance(0.0, &InputSnapshot::holding([KEY_PHONG, KEY_TOON_ON]));
        assert!(!ctx.toggles.use_blinn);
        assert!(ctx.toggles.use_toon);
        let ctx = frame_loop.advance(0.1, &InputSnapshot::holding([KEY_BLINN, KEY_TOON_OFF]));
        assert!(ctx.toggles.use_blinn);
        assert!(!ctx.toggles.use_toon);
    }

    #[test]
    fn digits_select_mode() {
        let mut frame_loop = FrameLoop::default();
        assert_eq!(frame_loop.mode(), MotionMode::Orbit);
        let ctx = frame_loop.advance(0.1, &InputSnapshot::holding([KEY_SPIRAL]));
        assert_eq!(ctx.mode, MotionMode::Spiral);
        let ctx = frame_loop.advance(0.2, &InputSnapshot::default());
        assert_eq!(ctx.mode, MotionMode::Spiral);
        let ctx = frame_loop.advance(0.3, &InputSnapshot::holding([KEY_SWARM]));
        assert_eq!(ctx.mode, MotionMode::Swarm);
    }

    #[test]
    fn sweep_follows_held_keys() {
        let mut frame_loop = FrameLoop::default();
        let right = InputSnapshot::holding([KEY_SWEEP_RIGHT]);
        let left = InputSnapshot::holding([KEY_SWEEP_LEFT]);
        let mut previous = frame_loop.sweep().angle();
        for frame in 0..30 {
            let ctx = frame_loop.advance(frame as f32 * STEP, &right);
            assert!(ctx.sweep.angle() >= previous);
            previous = ctx.sweep.angle();
        }
        assert!(previous > 0.0);
        for frame in 30..60 {
            let ctx = frame_loop.advance(frame as f32 * STEP, &left);
            assert!(ctx.sweep.angle() <= previous);
            previous = ctx.sweep.angle();
        }
        let ctx = frame_loop.advance(1.5, &InputSnapshot::default());
        assert_eq!(ctx.sweep.angle(), previous);
    }

    #[test]
    fn delta_is_time_since_previous_frame() {
        let mut frame_loop = FrameLoop::default();
        let first = frame_loop.advance(0.5, &InputSnapshot::default());
        let second = frame_loop.advance(0.75, &InputSnapshot::default());
        assert_eq!(first.delta, 0.5);
        assert_eq!(second.delta, 0.25);
    }

    #[test]
    fn escape_requests_exit() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.advance(0.0, &InputSnapshot::holding([KeyCode::Escape]));
        assert!(frame_loop.exit_requested());
    }
}
