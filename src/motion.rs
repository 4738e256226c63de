//! Trajectories for the animated point lights.
//!
//! Every mode is a pure function of the light slot and the elapsed time.
//! Orbit, Pendulum and Swarm produce an offset that is added to the slot's
//! anchor; Spiral produces an absolute world position and ignores the anchor.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Selects which displacement function drives the point lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionMode {
    #[default]
    Orbit,
    Pendulum,
    Spiral,
    Swarm,
}

impl MotionMode {
    pub const ALL: [MotionMode; 4] = [
        MotionMode::Orbit,
        MotionMode::Pendulum,
        MotionMode::Spiral,
        MotionMode::Swarm,
    ];

    /// Maps the number keys 1-4 to a mode.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Self::Orbit),
            2 => Some(Self::Pendulum),
            3 => Some(Self::Spiral),
            4 => Some(Self::Swarm),
            _ => None,
        }
    }

    /// Accepts either the mode name (case-insensitive) or its digit.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Ok(digit) = name.parse::<u8>() {
            return Self::from_digit(digit);
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Orbit => "orbit",
            Self::Pendulum => "pendulum",
            Self::Spiral => "spiral",
            Self::Swarm => "swarm",
        }
    }
}

impl fmt::Display for MotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of evaluating a motion mode for one light slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Displacement {
    /// Added to the anchor position.
    Offset(Vec3),
    /// Replaces the anchor position.
    Absolute(Vec3),
}

impl Displacement {
    /// Resolves the final light position for the given anchor.
    pub fn apply(self, anchor: Vec3) -> Vec3 {
        match self {
            Self::Offset(offset) => anchor + offset,
            Self::Absolute(position) => position,
        }
    }

    pub fn vector(self) -> Vec3 {
        match self {
            Self::Offset(v) | Self::Absolute(v) => v,
        }
    }
}

/// World offset that recentres the spiral column over the cube ring.
pub const SPIRAL_CENTER: Vec3 = Vec3::new(0.0, 0.0, -2.0);

/// Evaluates `mode` for light slot `index` at `time` seconds.
pub fn displacement(index: usize, time: f32, mode: MotionMode) -> Displacement {
    let i = index as f32;
    match mode {
        MotionMode::Orbit => {
            let radius = 0.6 + 0.2 * i;
            Displacement::Offset(Vec3::new(
                radius * (time * 0.9 + i).sin(),
                0.2 * (time * 1.3 + i * 0.7).sin(),
                radius * (time * 1.1 + 0.5 * i).cos(),
            ))
        }
        MotionMode::Pendulum => {
            let angle = (time * 1.2 + i).sin() * 0.6;
            let swing = angle.sin();
            Displacement::Offset(Vec3::new(
                swing * (1.0 + 0.2 * i),
                0.6 - 0.2 * swing.abs(),
                0.0,
            ))
        }
        MotionMode::Spiral => {
            let radius = 0.8 + 0.25 * i;
            let phase = time + i;
            Displacement::Absolute(
                Vec3::new(
                    radius * phase.cos(),
                    1.0 + spiral_height(index, time),
                    radius * phase.sin(),
                ) + SPIRAL_CENTER,
            )
        }
        MotionMode::Swarm => Displacement::Offset(Vec3::new(
            0.4 * (time * 1.7 + i * 1.1).sin(),
            0.3 * (time * 2.3 + i * 0.9).sin(),
            0.4 * (time * 1.5 + i * 1.3).cos(),
        )),
    }
}

/// Height of a spiral light relative to the column centre, in `[-1.5, 1.5)`.
pub fn spiral_height(index: usize, time: f32) -> f32 {
    (time * 0.4 + 0.2 * index as f32).rem_euclid(3.0) - 1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn sample_times() -> impl Iterator<Item = f32> {
        (0..2000).map(|step| step as f32 * 0.037)
    }

    #[test]
    fn orbit_at_origin_points_along_z() {
        let d = displacement(0, 0.0, MotionMode::Orbit);
        assert_eq!(d, Displacement::Offset(Vec3::new(0.0, 0.0, 0.6)));
    }

    #[test]
    fn pendulum_at_origin_lifts_only() {
        let d = displacement(0, 0.0, MotionMode::Pendulum);
        assert_eq!(d, Displacement::Offset(Vec3::new(0.0, 0.6, 0.0)));
    }

    #[test]
    fn orbit_stays_within_radius() {
        for index in 0..6 {
            let radius = 0.6 + 0.2 * index as f32;
            for t in sample_times() {
                let v = displacement(index, t, MotionMode::Orbit).vector();
                assert!(v.y.abs() <= 0.2 + EPS, "bob out of range: {}", v.y);
                assert!(v.x.abs() <= radius + EPS);
                assert!(v.z.abs() <= radius + EPS);
            }
        }
    }

    #[test]
    fn pendulum_never_moves_along_z() {
        for index in 0..8 {
            for t in sample_times() {
                let v = displacement(index, t, MotionMode::Pendulum).vector();
                assert_eq!(v.z, 0.0);
                assert!(v.y <= 0.6 + EPS && v.y >= 0.4 - EPS);
            }
        }
    }

    #[test]
    fn spiral_height_cycles_with_fixed_period() {
        for index in 0..6 {
            for t in sample_times().take(300) {
                let h = spiral_height(index, t);
                assert!((-1.5..1.5).contains(&h), "height {h} escaped the cycle");
                let later = spiral_height(index, t + 7.5);
                assert!((h - later).abs() < 1e-3 || (h - later).abs() > 2.99);
            }
        }
    }

    #[test]
    fn spiral_ignores_anchor() {
        let d = displacement(2, 1.25, MotionMode::Spiral);
        assert!(matches!(d, Displacement::Absolute(_)));
        assert_eq!(d.apply(Vec3::new(9.0, 9.0, 9.0)), d.apply(Vec3::ZERO));
    }

    #[test]
    fn offset_modes_add_the_anchor() {
        let anchor = Vec3::new(1.0, 2.0, 3.0);
        for mode in [MotionMode::Orbit, MotionMode::Pendulum, MotionMode::Swarm] {
            let d = displacement(3, 4.2, mode);
            assert_eq!(d.apply(anchor), anchor + d.vector());
        }
    }

    #[test]
    fn swarm_amplitudes_are_bounded() {
        for index in 0..6 {
            for t in sample_times() {
                let v = displacement(index, t, MotionMode::Swarm).vector();
                assert!(v.x.abs() <= 0.4 + EPS);
                assert!(v.y.abs() <= 0.3 + EPS);
                assert!(v.z.abs() <= 0.4 + EPS);
            }
        }
    }

    #[test]
    fn parses_mode_names_and_digits() {
        assert_eq!(MotionMode::from_name("Spiral"), Some(MotionMode::Spiral));
        assert_eq!(MotionMode::from_name("2"), Some(MotionMode::Pendulum));
        assert_eq!(MotionMode::from_name("5"), None);
        assert_eq!(MotionMode::from_name("wobble"), None);
    }
}
