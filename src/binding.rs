//! Writes the per-frame light, camera and toggle parameters into the active
//! shading program. Every function here is fire-and-forget: see
//! [`crate::shading`] for why a missing slot is not reported.

use glam::{Mat4, Vec3};

use crate::frame::RenderToggles;
use crate::lights::{Attenuation, LightColors, LightSet, PointLight};
use crate::shading::{names, ShadingProgram, UniformPath};

/// Exponent used by the gamma-correction toggle.
pub const GAMMA: f32 = 2.2;

/// Texture units the material maps are bound to.
pub const DIFFUSE_UNIT: i32 = 0;
pub const SPECULAR_UNIT: i32 = 1;

/// Points the material samplers at their texture units. Done once after the
/// lit program is created.
pub fn bind_material_units<P: ShadingProgram + ?Sized>(program: &mut P) {
    program.set_int(names::MATERIAL_DIFFUSE, DIFFUSE_UNIT);
    program.set_int(names::MATERIAL_SPECULAR, SPECULAR_UNIT);
}

/// Binds everything the lit program needs that is constant across the draw
/// calls of one frame.
pub fn bind_frame<P: ShadingProgram + ?Sized>(
    program: &mut P,
    lights: &LightSet,
    toggles: RenderToggles,
    camera_position: Vec3,
    projection: Mat4,
    view: Mat4,
) {
    program.set_bool(names::USE_BLINN, toggles.use_blinn);
    program.set_bool(names::USE_TOON, toggles.use_toon);
    program.set_bool(names::USE_GAMMA, toggles.use_gamma);
    program.set_float(names::GAMMA_VALUE, GAMMA);
    program.set_vec3(names::VIEW_POS, camera_position);

    let dir = UniformPath::new(names::DIR_LIGHT);
    program.set_vec3(&dir.field(names::DIRECTION), lights.directional.direction);
    bind_colors(program, &dir, &lights.directional.colors);

    let spot = UniformPath::new(names::SPOT_LIGHT);
    program.set_vec3(&spot.field(names::POSITION), lights.spot.position);
    program.set_vec3(&spot.field(names::DIRECTION), lights.spot.direction);
    program.set_float(&spot.field(names::CUT_OFF), lights.spot.cut_off);
    program.set_float(&spot.field(names::OUTER_CUT_OFF), lights.spot.outer_cut_off);
    bind_attenuation(program, &spot, &lights.spot.attenuation);
    bind_colors(program, &spot, &lights.spot.colors);

    bind_point_lights(program, &lights.points);

    bind_view(program, projection, view);
}

/// Binds the point-light count followed by one block per light. The count
/// always equals the number of blocks written.
pub fn bind_point_lights<P: ShadingProgram + ?Sized>(program: &mut P, points: &[PointLight]) {
    program.set_int(names::NUM_POINT_LIGHTS, points.len() as i32);
    for (index, light) in points.iter().enumerate() {
        let path = UniformPath::new(names::POINT_LIGHTS).index(index);
        program.set_vec3(&path.field(names::POSITION), light.position);
        program.set_vec3(&path.field(names::COLOR), light.color);
        bind_attenuation(program, &path, &light.attenuation);
        bind_colors(program, &path, &light.colors);
    }
}

pub fn bind_view<P: ShadingProgram + ?Sized>(program: &mut P, projection: Mat4, view: Mat4) {
    program.set_mat4(names::PROJECTION, projection);
    program.set_mat4(names::VIEW, view);
}

pub fn bind_model<P: ShadingProgram + ?Sized>(program: &mut P, model: Mat4) {
    program.set_mat4(names::MODEL, model);
}

pub fn bind_shininess<P: ShadingProgram + ?Sized>(program: &mut P, shininess: f32) {
    program.set_float(names::MATERIAL_SHININESS, shininess);
}

fn bind_colors<P: ShadingProgram + ?Sized>(program: &mut P, path: &UniformPath, colors: &LightColors) {
    program.set_vec3(&path.field(names::AMBIENT), colors.ambient);
    program.set_vec3(&path.field(names::DIFFUSE), colors.diffuse);
    program.set_vec3(&path.field(names::SPECULAR), colors.specular);
}

fn bind_attenuation<P: ShadingProgram + ?Sized>(
    program: &mut P,
    path: &UniformPath,
    attenuation: &Attenuation,
) {
    program.set_float(&path.field(names::CONSTANT), attenuation.constant);
    program.set_float(&path.field(names::LINEAR), attenuation.linear);
    program.set_float(&path.field(names::QUADRATIC), attenuation.quadratic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::lights::{build_lights, SpotSweep};
    use crate::motion::MotionMode;
    use crate::render::recorder::{FrameRecorder, UniformValue};
    use crate::render::ProgramKind;

    fn bound_frame(count: usize) -> FrameRecorder {
        let camera = Camera::default().view();
        let lights = build_lights(2.0, MotionMode::Orbit, &camera, SpotSweep::default(), count);
        let mut recorder = FrameRecorder::new();
        recorder.begin_frame();
        bind_frame(
            &mut recorder,
            &lights,
            RenderToggles::default(),
            camera.position,
            Mat4::IDENTITY,
            camera.view_matrix(),
        );
        recorder
    }

    #[test]
    fn binds_every_point_light_field() {
        let recorder = bound_frame(6);
        for index in 0..6 {
            for field in [
                "position",
                "color",
                "constant",
                "linear",
                "quadratic",
                "ambient",
                "diffuse",
                "specular",
            ] {
                let name = format!("pointLights[{index}].{field}");
                assert!(
                    recorder.value(ProgramKind::Lit, &name).is_some(),
                    "{name} not bound"
                );
            }
        }
        assert_eq!(recorder.point_light_blocks_written(), 6);
        assert_eq!(
            recorder.value(ProgramKind::Lit, "numPointLights"),
            Some(&UniformValue::Int(6))
        );
    }

    #[test]
    fn smaller_count_does_not_leak_previous_blocks() {
        let camera = Camera::default().view();
        let mut recorder = FrameRecorder::new();
        for count in [8, 6] {
            let lights =
                build_lights(0.5, MotionMode::Swarm, &camera, SpotSweep::default(), count);
            recorder.begin_frame();
            bind_frame(
                &mut recorder,
                &lights,
                RenderToggles::default(),
                camera.position,
                Mat4::IDENTITY,
                Mat4::IDENTITY,
            );
        }
        assert_eq!(recorder.point_light_blocks_written(), 6);
        assert!(recorder.value(ProgramKind::Lit, "pointLights[6].position").is_none());
        assert!(recorder.value(ProgramKind::Lit, "pointLights[7].color").is_none());
    }

    #[test]
    fn binds_toggles_gamma_and_spot() {
        let recorder = bound_frame(6);
        assert_eq!(
            recorder.value(ProgramKind::Lit, "useBlinn"),
            Some(&UniformValue::Bool(true))
        );
        assert_eq!(
            recorder.value(ProgramKind::Lit, "useToon"),
            Some(&UniformValue::Bool(false))
        );
        assert_eq!(
            recorder.value(ProgramKind::Lit, "gammaValue"),
            Some(&UniformValue::Float(2.2))
        );
        for name in [
            "spotLight.position",
            "spotLight.direction",
            "spotLight.cutOff",
            "spotLight.outerCutOff",
            "spotLight.constant",
            "spotLight.linear",
            "spotLight.quadratic",
            "spotLight.ambient",
            "spotLight.diffuse",
            "spotLight.specular",
            "dirLight.direction",
            "dirLight.ambient",
            "dirLight.diffuse",
            "dirLight.specular",
            "viewPos",
            "projection",
            "view",
        ] {
            assert!(recorder.value(ProgramKind::Lit, name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn material_units_match_texture_slots() {
        let mut recorder = FrameRecorder::new();
        bind_material_units(&mut recorder);
        assert_eq!(
            recorder.value(ProgramKind::Lit, "material.diffuse"),
            Some(&UniformValue::Int(0))
        );
        assert_eq!(
            recorder.value(ProgramKind::Lit, "material.specular"),
            Some(&UniformValue::Int(1))
        );
    }
}
