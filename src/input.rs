use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Escape,
    Character(char),
    Digit(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("escape") || name.eq_ignore_ascii_case("esc") {
            return Some(Self::Escape);
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ch.is_ascii_alphabetic() {
            return Some(Self::Character(ch.to_ascii_uppercase()));
        }
        ch.to_digit(10).map(|digit| Self::Digit(digit as u8))
    }
}

/// Accumulates window events between two frames.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    mouse_delta: Vec2,
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Adds raw mouse motion in pixels, `y` growing downwards.
    pub fn add_mouse_motion(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Drops all held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.clear();
    }

    /// Samples the input for one frame and resets the motion accumulators.
    pub fn snapshot(&mut self) -> InputSnapshot {
        InputSnapshot {
            keys: self.keys.clone(),
            mouse_delta: std::mem::take(&mut self.mouse_delta),
            scroll: std::mem::take(&mut self.scroll),
        }
    }
}

/// Input as seen by one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub keys: HashSet<KeyCode>,
    pub mouse_delta: Vec2,
    pub scroll: f32,
}

impl InputSnapshot {
    pub fn holding(keys: impl IntoIterator<Item = KeyCode>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}

/// `true` when `key` is held now but was not held in the previous frame.
pub fn just_pressed(previous: &HashSet<KeyCode>, current: &HashSet<KeyCode>, key: KeyCode) -> bool {
    current.contains(&key) && !previous.contains(&key)
}

/// Remembers the previous frame's keys so presses can be edge-triggered
/// regardless of key repeat.
#[derive(Debug, Clone, Default)]
pub struct KeyTransitions {
    previous: HashSet<KeyCode>,
}

impl KeyTransitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keys pressed since the last call and remembers `current`.
    pub fn advance(&mut self, current: &HashSet<KeyCode>) -> HashSet<KeyCode> {
        let pressed = current
            .iter()
            .copied()
            .filter(|key| just_pressed(&self.previous, current, *key))
            .collect();
        self.previous.clone_from(current);
        pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: KeyCode = KeyCode::Character('G');

    #[test]
    fn parses_key_names() {
        assert_eq!(KeyCode::from_name("q"), Some(KeyCode::Character('Q')));
        assert_eq!(KeyCode::from_name("3"), Some(KeyCode::Digit(3)));
        assert_eq!(KeyCode::from_name("Esc"), Some(KeyCode::Escape));
        assert_eq!(KeyCode::from_name("F12"), None);
        assert_eq!(KeyCode::from_name(""), None);
    }

    #[test]
    fn input_state_tracks_keys() {
        let mut state = InputState::new();
        state.set_key_down(G);
        assert!(state.is_key_down(G));
        state.set_key_up(G);
        assert!(!state.is_key_down(G));
    }

    #[test]
    fn snapshot_drains_motion() {
        let mut state = InputState::new();
        state.add_mouse_motion(Vec2::new(3.0, -2.0));
        state.add_mouse_motion(Vec2::new(1.0, 1.0));
        state.add_scroll(1.5);
        let first = state.snapshot();
        assert_eq!(first.mouse_delta, Vec2::new(4.0, -1.0));
        assert_eq!(first.scroll, 1.5);
        let second = state.snapshot();
        assert_eq!(second.mouse_delta, Vec2::ZERO);
        assert_eq!(second.scroll, 0.0);
    }

    #[test]
    fn held_key_fires_once() {
        let mut transitions = KeyTransitions::new();
        let held: HashSet<_> = [G].into_iter().collect();
        let released = HashSet::new();
        let presses: usize = [&held, &held, &held, &released, &held, &held]
            .into_iter()
            .map(|keys| transitions.advance(keys).len())
            .sum();
        assert_eq!(presses, 2);
    }

    #[test]
    fn just_pressed_is_pure() {
        let previous = HashSet::new();
        let current: HashSet<_> = [G].into_iter().collect();
        assert!(just_pressed(&previous, &current, G));
        assert!(!just_pressed(&current, &current, G));
        assert!(!just_pressed(&current, &previous, G));
    }
}
