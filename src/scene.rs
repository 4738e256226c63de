use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

use crate::binding::{bind_frame, bind_model, bind_shininess, bind_view};
use crate::frame::FrameContext;
use crate::lights::{build_lights, LightSet};
use crate::render::{FrameTarget, MeshKind, ProgramKind};

/// Number of cubes on the kinetic ring.
pub const RING_CUBES: usize = 12;
pub const RING_RADIUS: f32 = 3.0;
/// Rigid rotation rate of the whole ring, radians per second.
pub const RING_SPIN: f32 = 0.4;
/// Centre of the ring in world space.
pub const RING_CENTER: Vec3 = Vec3::new(0.0, 0.0, -2.0);
/// Uniform scale of the lamp marker cubes.
pub const LAMP_SCALE: f32 = 0.15;

/// Model matrix of ring cube `index` at `time`.
pub fn ring_transform(index: usize, time: f32) -> Mat4 {
    let i = index as f32;
    let angle = ring_angle(index, time);
    let position = RING_CENTER
        + Vec3::new(
            RING_RADIUS * angle.cos(),
            0.8 + 0.2 * (time * 0.8 + i).sin(),
            RING_RADIUS * angle.sin(),
        );
    let axis = Vec3::new(1.0, 0.3, 0.5).normalize();
    Mat4::from_translation(position) * Mat4::from_axis_angle(axis, angle * 2.0)
}

/// Orbital angle of ring cube `index` at `time`.
pub fn ring_angle(index: usize, time: f32) -> f32 {
    index as f32 * (TAU / RING_CUBES as f32) + time * RING_SPIN
}

/// Material shininess of ring cube `index` at `time`, within `[16, 48]`.
pub fn ring_shininess(index: usize, time: f32) -> f32 {
    32.0 + 16.0 * (time + index as f32).sin()
}

pub fn lamp_transform(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(LAMP_SCALE))
}

/// Issues the fixed draw sequence: ground, cube ring, lamp markers.
///
/// The lit program must be active with its frame parameters bound.
pub fn draw_scene<T: FrameTarget + ?Sized>(
    target: &mut T,
    time: f32,
    lights: &LightSet,
    projection: Mat4,
    view: Mat4,
) {
    bind_model(target, Mat4::IDENTITY);
    target.draw(MeshKind::Ground);

    for index in 0..RING_CUBES {
        bind_model(target, ring_transform(index, time));
        bind_shininess(target, ring_shininess(index, time));
        target.draw(MeshKind::Cube);
    }

    target.use_program(ProgramKind::Lamp);
    bind_view(target, projection, view);
    for position in lights.point_positions() {
        bind_model(target, lamp_transform(position));
        target.draw(MeshKind::Cube);
    }
}

/// Runs the lighting and drawing part of one frame against `target` and
/// returns the lights it used.
pub fn render_frame<T: FrameTarget + ?Sized>(
    target: &mut T,
    ctx: &FrameContext,
    aspect: f32,
) -> LightSet {
    let lights = build_lights(ctx.time, ctx.mode, &ctx.camera, ctx.sweep, ctx.point_lights);
    let projection = ctx.camera.projection_matrix(aspect);
    let view = ctx.camera.view_matrix();

    target.use_program(ProgramKind::Lit);
    bind_frame(
        target,
        &lights,
        ctx.toggles,
        ctx.camera.position,
        projection,
        view,
    );
    draw_scene(target, ctx.time, &lights, projection, view);
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLoop;
    use crate::input::InputSnapshot;
    use crate::render::recorder::{FrameRecorder, UniformValue};

    fn recorded_frame(time: f32) -> (FrameRecorder, LightSet) {
        let mut frame_loop = FrameLoop::default();
        let ctx = frame_loop.advance(time, &InputSnapshot::default());
        let mut recorder = FrameRecorder::new();
        recorder.begin_frame();
        let lights = render_frame(&mut recorder, &ctx, 16.0 / 9.0);
        (recorder, lights)
    }

    #[test]
    fn draw_order_is_ground_ring_lamps() {
        let (recorder, _) = recorded_frame(1.0);
        let draws = recorder.draws();
        assert_eq!(draws.len(), 1 + RING_CUBES + 6);
        assert_eq!(draws[0].mesh, MeshKind::Ground);
        assert_eq!(draws[0].model, Mat4::IDENTITY);
        assert!(draws[1..=RING_CUBES]
            .iter()
            .all(|d| d.program == ProgramKind::Lit && d.mesh == MeshKind::Cube));
        assert!(draws[RING_CUBES + 1..]
            .iter()
            .all(|d| d.program == ProgramKind::Lamp && d.shininess.is_none()));
    }

    #[test]
    fn lamps_sit_on_resolved_light_positions() {
        let (recorder, lights) = recorded_frame(2.5);
        let lamps: Vec<_> = recorder
            .draws()
            .iter()
            .filter(|d| d.program == ProgramKind::Lamp)
            .collect();
        assert_eq!(lamps.len(), lights.point_count());
        for (lamp, position) in lamps.iter().zip(lights.point_positions()) {
            assert!((lamp.model.w_axis.truncate() - position).length() < 1e-5);
            assert!((lamp.model.x_axis.length() - LAMP_SCALE).abs() < 1e-6);
        }
    }

    #[test]
    fn lamp_program_gets_projection_and_view() {
        let (recorder, _) = recorded_frame(0.0);
        assert!(matches!(
            recorder.value(ProgramKind::Lamp, "projection"),
            Some(UniformValue::Mat4(_))
        ));
        assert!(matches!(
            recorder.value(ProgramKind::Lamp, "view"),
            Some(UniformValue::Mat4(_))
        ));
        assert!(recorder.value(ProgramKind::Lamp, "numPointLights").is_none());
    }

    #[test]
    fn ring_cubes_are_evenly_spaced() {
        for index in 0..RING_CUBES {
            let position = ring_transform(index, 0.0).w_axis.truncate();
            let offset = position - RING_CENTER;
            let planar = Vec3::new(offset.x, 0.0, offset.z);
            assert!((planar.length() - RING_RADIUS).abs() < 1e-4);
            let expected = index as f32 * TAU / 12.0;
            assert!((ring_angle(index, 0.0) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn ring_bob_and_shininess_stay_in_range() {
        for step in 0..500 {
            let time = step as f32 * 0.05;
            for index in 0..RING_CUBES {
                let y = ring_transform(index, time).w_axis.y;
                assert!((0.6 - 1e-5..=1.0 + 1e-5).contains(&y));
                let shininess = ring_shininess(index, time);
                assert!((16.0 - 1e-4..=48.0 + 1e-4).contains(&shininess));
            }
        }
    }

    #[test]
    fn ring_rotates_rigidly() {
        let delta = ring_angle(5, 3.0) - ring_angle(5, 1.0);
        assert!((delta - 0.8).abs() < 1e-5);
    }
}
