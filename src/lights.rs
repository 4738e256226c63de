//! Per-frame light descriptors.
//!
//! A fresh [`LightSet`] is assembled every frame from the frame context; none
//! of it is kept between frames except the spotlight sweep angle, which lives
//! in [`SpotSweep`] and is owned by the frame loop.

use glam::{Mat4, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::camera::CameraView;
use crate::motion::{displacement, MotionMode};

/// Number of anchor slots the shading stage has room for.
pub const MAX_POINT_LIGHTS: usize = 8;

/// Number of point lights the demo animates by default.
pub const ACTIVE_POINT_LIGHTS: usize = 6;

/// Base positions the point-light trajectories are computed around.
pub const ANCHORS: [Vec3; MAX_POINT_LIGHTS] = [
    Vec3::new(0.0, 1.2, 2.5),
    Vec3::new(2.5, 1.0, -2.0),
    Vec3::new(-2.5, 1.4, -4.0),
    Vec3::new(0.0, 2.0, -3.0),
    Vec3::new(1.8, 2.2, -1.0),
    Vec3::new(-3.5, 1.6, -2.0),
    Vec3::new(3.0, 1.8, -3.5),
    Vec3::new(-1.8, 2.2, 1.0),
];

/// Tint of each anchor slot.
pub const ANCHOR_COLORS: [Vec3; MAX_POINT_LIGHTS] = [
    Vec3::new(1.0, 0.6, 0.6),
    Vec3::new(0.6, 1.0, 0.6),
    Vec3::new(0.6, 0.6, 1.0),
    Vec3::new(1.0, 1.0, 0.6),
    Vec3::new(1.0, 0.6, 1.0),
    Vec3::new(0.6, 1.0, 1.0),
    Vec3::new(1.0, 0.8, 0.5),
    Vec3::new(0.7, 0.9, 0.7),
];

/// Spotlight sweep rate while Q or E is held, in radians per second.
pub const SWEEP_RATE: f32 = 0.8;

/// Ambient, diffuse and specular terms of a light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightColors {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// Distance falloff `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const STANDARD: Self = Self {
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub colors: LightColors,
}

impl DirectionalLight {
    pub const MOONLIGHT: Self = Self {
        direction: Vec3::new(-0.2, -1.0, -0.3),
        colors: LightColors {
            ambient: Vec3::new(0.02, 0.02, 0.03),
            diffuse: Vec3::new(0.3, 0.3, 0.35),
            specular: Vec3::new(0.4, 0.4, 0.45),
        },
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
    pub attenuation: Attenuation,
    pub colors: LightColors,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub attenuation: Attenuation,
    pub colors: LightColors,
}

/// Shared terms for every animated point light.
pub const POINT_LIGHT_COLORS: LightColors = LightColors {
    ambient: Vec3::splat(0.03),
    diffuse: Vec3::splat(0.9),
    specular: Vec3::splat(1.0),
};

/// All light descriptors for one frame. Point lights are contiguous and
/// indexed from zero; their count is what the shading stage is told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSet {
    pub directional: DirectionalLight,
    pub spot: SpotLight,
    pub points: Vec<PointLight>,
}

impl LightSet {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn point_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|light| light.position)
    }
}

/// Accumulated rotation of the spotlight around the world up axis.
///
/// Unbounded: the angle only ever feeds trigonometric functions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpotSweep {
    angle: f32,
}

impl SpotSweep {
    pub fn new(angle: f32) -> Self {
        Self { angle }
    }

    pub fn angle(self) -> f32 {
        self.angle
    }

    /// Advances the sweep for one frame. Holding both keys cancels out.
    pub fn update(&mut self, counter_clockwise: bool, clockwise: bool, delta: f32) {
        if counter_clockwise {
            self.angle -= SWEEP_RATE * delta;
        }
        if clockwise {
            self.angle += SWEEP_RATE * delta;
        }
    }
}

/// Builds the camera-mounted spotlight, rotated by the sweep angle.
pub fn spot_light(camera: &CameraView, sweep: SpotSweep) -> SpotLight {
    let rotation = Mat4::from_rotation_y(sweep.angle());
    let direction = rotation.transform_vector3(camera.front).normalize_or_zero();
    SpotLight {
        position: camera.position,
        direction,
        cut_off: 12.5_f32.to_radians().cos(),
        outer_cut_off: 17.0_f32.to_radians().cos(),
        attenuation: Attenuation::STANDARD,
        colors: LightColors {
            ambient: Vec3::ZERO,
            diffuse: Vec3::new(1.0, 1.0, 0.95),
            specular: Vec3::ONE,
        },
    }
}

/// Resolves the animated position of point light `index`.
pub fn point_light(index: usize, time: f32, mode: MotionMode) -> PointLight {
    let position = displacement(index, time, mode).apply(ANCHORS[index]);
    PointLight {
        position,
        color: ANCHOR_COLORS[index],
        attenuation: Attenuation::STANDARD,
        colors: POINT_LIGHT_COLORS,
    }
}

/// Clamps a requested light count to the number of defined anchors.
pub fn clamp_light_count(requested: usize) -> usize {
    if requested > MAX_POINT_LIGHTS {
        warn!("requested {requested} point lights; only {MAX_POINT_LIGHTS} anchors exist");
        MAX_POINT_LIGHTS
    } else {
        requested
    }
}

/// Assembles the directional, spot and point lights for one frame.
pub fn build_lights(
    time: f32,
    mode: MotionMode,
    camera: &CameraView,
    sweep: SpotSweep,
    point_count: usize,
) -> LightSet {
    let count = clamp_light_count(point_count);
    LightSet {
        directional: DirectionalLight::MOONLIGHT,
        spot: spot_light(camera, sweep),
        points: (0..count).map(|index| point_light(index, time, mode)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraView {
        CameraView {
            position: Vec3::new(0.0, 1.0, 6.5),
            front: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            zoom: 45.0,
        }
    }

    #[test]
    fn builds_requested_number_of_points_in_order() {
        let lights = build_lights(1.5, MotionMode::Swarm, &camera(), SpotSweep::default(), 6);
        assert_eq!(lights.point_count(), 6);
        for (index, light) in lights.points.iter().enumerate() {
            assert_eq!(*light, point_light(index, 1.5, MotionMode::Swarm));
            assert_eq!(light.color, ANCHOR_COLORS[index]);
        }
    }

    #[test]
    fn light_count_is_clamped_to_anchor_table() {
        let lights = build_lights(0.0, MotionMode::Orbit, &camera(), SpotSweep::default(), 12);
        assert_eq!(lights.point_count(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn orbit_light_zero_starts_in_front_of_anchor() {
        let light = point_light(0, 0.0, MotionMode::Orbit);
        assert!((light.position - Vec3::new(0.0, 1.2, 3.1)).length() < 1e-6);
    }

    #[test]
    fn directional_light_is_time_invariant() {
        let a = build_lights(0.0, MotionMode::Orbit, &camera(), SpotSweep::default(), 6);
        let b = build_lights(42.0, MotionMode::Spiral, &camera(), SpotSweep::default(), 6);
        assert_eq!(a.directional, b.directional);
    }

    #[test]
    fn spot_follows_camera_and_sweep() {
        let view = camera();
        let straight = spot_light(&view, SpotSweep::default());
        assert_eq!(straight.position, view.position);
        assert!((straight.direction - view.front).length() < 1e-6);

        let quarter = spot_light(&view, SpotSweep::new(std::f32::consts::FRAC_PI_2));
        assert!((quarter.direction - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert!(straight.cut_off > straight.outer_cut_off);
    }

    #[test]
    fn sweep_is_monotonic_per_key() {
        let mut sweep = SpotSweep::default();
        let mut previous = sweep.angle();
        for step in 0..120 {
            sweep.update(false, true, 0.001 * step as f32);
            assert!(sweep.angle() >= previous);
            previous = sweep.angle();
        }
        for step in 0..120 {
            sweep.update(true, false, 0.002 * step as f32);
            assert!(sweep.angle() <= previous);
            previous = sweep.angle();
        }
        for _ in 0..10 {
            sweep.update(false, false, 0.016);
            assert_eq!(sweep.angle(), previous);
        }
    }

    #[test]
    fn sweep_rate_matches_hold_duration() {
        let mut sweep = SpotSweep::default();
        for _ in 0..100 {
            sweep.update(false, true, 0.01);
        }
        assert!((sweep.angle() - 0.8).abs() < 1e-4);
    }
}
