//! GPU-side parameter layout and the name-to-slot mapping that fills it.
//!
//! The WGSL structs in [`super::shaders`] mirror these types field for field.
//! Scalars are packed into `vec4` lanes so every member is 16-byte aligned.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::{trace, warn};

use super::{FrameTarget, MeshKind, ProgramKind};
use crate::binding::{DIFFUSE_UNIT, SPECULAR_UNIT};
use crate::lights::MAX_POINT_LIGHTS;
use crate::shading::{names, ParsedName, ShadingProgram};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic, unused
    pub attenuation: [f32; 4],
    /// cos(inner), cos(outer), unused, unused
    pub cutoff: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic, unused
    pub attenuation: [f32; 4],
}

/// Frame-level block of the lit program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LitFrameUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    /// use_blinn, use_toon, use_gamma, num_point_lights
    pub flags: [u32; 4],
    /// gamma exponent, unused, unused, unused
    pub gamma: [f32; 4],
    pub dir_light: DirLightUniform,
    pub spot_light: SpotLightUniform,
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
}

/// Frame-level block of the lamp program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LampFrameUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

/// Per-draw block shared by both programs.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model's upper 3x3, columns padded to vec4.
    pub normal: [[f32; 4]; 3],
    /// shininess, unused, unused, unused
    pub material: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, shininess: f32) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                normal.x_axis.extend(0.0).into(),
                normal.y_axis.extend(0.0).into(),
                normal.z_axis.extend(0.0).into(),
            ],
            material: [shininess, 0.0, 0.0, 0.0],
        }
    }
}

/// Draw call with its per-draw parameters resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedDraw {
    pub program: ProgramKind,
    pub mesh: MeshKind,
    pub object: ObjectUniform,
}

#[derive(Debug, Clone, Copy)]
struct ObjectState {
    model: Mat4,
    shininess: f32,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            shininess: 32.0,
        }
    }
}

/// CPU copy of both programs' parameters plus the frame's draw list.
#[derive(Debug, Clone)]
pub struct UniformStaging {
    active: ProgramKind,
    lit: LitFrameUniform,
    lamp: LampFrameUniform,
    lit_object: ObjectState,
    lamp_object: ObjectState,
    draws: Vec<StagedDraw>,
}

impl Default for UniformStaging {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformStaging {
    pub fn new() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        let mut lit = LitFrameUniform::zeroed();
        lit.projection = identity;
        lit.view = identity;
        Self {
            active: ProgramKind::Lit,
            lit,
            lamp: LampFrameUniform {
                projection: identity,
                view: identity,
            },
            lit_object: ObjectState::default(),
            lamp_object: ObjectState::default(),
            draws: Vec::new(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.draws.clear();
    }

    pub fn lit(&self) -> &LitFrameUniform {
        &self.lit
    }

    pub fn lamp(&self) -> &LampFrameUniform {
        &self.lamp
    }

    pub fn draws(&self) -> &[StagedDraw] {
        &self.draws
    }

    pub fn active_program(&self) -> ProgramKind {
        self.active
    }

    fn ignore(&self, name: &str) {
        trace!("{} program has no parameter {name}; ignored", self.active);
    }

    fn set_point_light_count(&mut self, count: i32) {
        let count = count.clamp(0, MAX_POINT_LIGHTS as i32) as usize;
        self.lit.flags[3] = count as u32;
        for slot in &mut self.lit.point_lights[count..] {
            *slot = PointLightUniform::zeroed();
        }
    }
}

fn attenuation_lane(field: &str) -> Option<usize> {
    match field {
        names::CONSTANT => Some(0),
        names::LINEAR => Some(1),
        names::QUADRATIC => Some(2),
        _ => None,
    }
}

fn lit_vec3_slot<'a>(lit: &'a mut LitFrameUniform, name: &str) -> Option<&'a mut [f32; 4]> {
    match ParsedName::parse(name)? {
        ParsedName::Plain(names::VIEW_POS) => Some(&mut lit.view_pos),
        ParsedName::Field {
            root: names::DIR_LIGHT,
            field,
        } => {
            let light = &mut lit.dir_light;
            match field {
                names::DIRECTION => Some(&mut light.direction),
                names::AMBIENT => Some(&mut light.ambient),
                names::DIFFUSE => Some(&mut light.diffuse),
                names::SPECULAR => Some(&mut light.specular),
                _ => None,
            }
        }
        ParsedName::Field {
            root: names::SPOT_LIGHT,
            field,
        } => {
            let light = &mut lit.spot_light;
            match field {
                names::POSITION => Some(&mut light.position),
                names::DIRECTION => Some(&mut light.direction),
                names::AMBIENT => Some(&mut light.ambient),
                names::DIFFUSE => Some(&mut light.diffuse),
                names::SPECULAR => Some(&mut light.specular),
                _ => None,
            }
        }
        ParsedName::Element {
            root: names::POINT_LIGHTS,
            index,
            field,
        } => {
            let light = lit.point_lights.get_mut(index)?;
            match field {
                names::POSITION => Some(&mut light.position),
                names::COLOR => Some(&mut light.color),
                names::AMBIENT => Some(&mut light.ambient),
                names::DIFFUSE => Some(&mut light.diffuse),
                names::SPECULAR => Some(&mut light.specular),
                _ => None,
            }
        }
        _ => None,
    }
}

fn lit_float_slot<'a>(lit: &'a mut LitFrameUniform, name: &str) -> Option<&'a mut f32> {
    match ParsedName::parse(name)? {
        ParsedName::Plain(names::GAMMA_VALUE) => Some(&mut lit.gamma[0]),
        ParsedName::Field {
            root: names::SPOT_LIGHT,
            field,
        } => {
            let light = &mut lit.spot_light;
            match field {
                names::CUT_OFF => Some(&mut light.cutoff[0]),
                names::OUTER_CUT_OFF => Some(&mut light.cutoff[1]),
                _ => attenuation_lane(field).map(|lane| &mut light.attenuation[lane]),
            }
        }
        ParsedName::Element {
            root: names::POINT_LIGHTS,
            index,
            field,
        } => {
            let light = lit.point_lights.get_mut(index)?;
            attenuation_lane(field).map(|lane| &mut light.attenuation[lane])
        }
        _ => None,
    }
}

impl ShadingProgram for UniformStaging {
    fn set_bool(&mut self, name: &str, value: bool) {
        let lane = match (self.active, name) {
            (ProgramKind::Lit, names::USE_BLINN) => 0,
            (ProgramKind::Lit, names::USE_TOON) => 1,
            (ProgramKind::Lit, names::USE_GAMMA) => 2,
            _ => return self.ignore(name),
        };
        self.lit.flags[lane] = u32::from(value);
    }

    fn set_int(&mut self, name: &str, value: i32) {
        match (self.active, name) {
            (ProgramKind::Lit, names::NUM_POINT_LIGHTS) => self.set_point_light_count(value),
            (ProgramKind::Lit, names::MATERIAL_DIFFUSE) if value != DIFFUSE_UNIT => {
                warn!("diffuse map is fixed to texture unit {DIFFUSE_UNIT}; got {value}")
            }
            (ProgramKind::Lit, names::MATERIAL_SPECULAR) if value != SPECULAR_UNIT => {
                warn!("specular map is fixed to texture unit {SPECULAR_UNIT}; got {value}")
            }
            (ProgramKind::Lit, names::MATERIAL_DIFFUSE | names::MATERIAL_SPECULAR) => {}
            _ => self.ignore(name),
        }
    }

    fn set_float(&mut self, name: &str, value: f32) {
        if self.active == ProgramKind::Lit {
            if name == names::MATERIAL_SHININESS {
                self.lit_object.shininess = value;
                return;
            }
            if let Some(slot) = lit_float_slot(&mut self.lit, name) {
                *slot = value;
                return;
            }
        }
        self.ignore(name);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        if self.active == ProgramKind::Lit {
            if let Some(slot) = lit_vec3_slot(&mut self.lit, name) {
                *slot = value.extend(0.0).into();
                return;
            }
        }
        self.ignore(name);
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        let columns = value.to_cols_array_2d();
        match (self.active, name) {
            (ProgramKind::Lit, names::PROJECTION) => self.lit.projection = columns,
            (ProgramKind::Lit, names::VIEW) => self.lit.view = columns,
            (ProgramKind::Lit, names::MODEL) => self.lit_object.model = value,
            (ProgramKind::Lamp, names::PROJECTION) => self.lamp.projection = columns,
            (ProgramKind::Lamp, names::VIEW) => self.lamp.view = columns,
            (ProgramKind::Lamp, names::MODEL) => self.lamp_object.model = value,
            _ => self.ignore(name),
        }
    }
}

impl FrameTarget for UniformStaging {
    fn use_program(&mut self, program: ProgramKind) {
        self.active = program;
    }

    fn draw(&mut self, mesh: MeshKind) {
        let state = match self.active {
            ProgramKind::Lit => self.lit_object,
            ProgramKind::Lamp => self.lamp_object,
        };
        self.draws.push(StagedDraw {
            program: self.active,
            mesh,
            object: ObjectUniform::new(state.model, state.shininess),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 96);
        assert_eq!(std::mem::size_of::<SpotLightUniform>(), 112);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 128);
        assert_eq!(std::mem::size_of::<LitFrameUniform>() % 16, 0);
    }

    #[test]
    fn point_light_names_land_in_their_slot() {
        let mut staging = UniformStaging::new();
        staging.set_vec3("pointLights[2].position", Vec3::new(1.0, 2.0, 3.0));
        staging.set_float("pointLights[2].quadratic", 0.032);
        assert_eq!(staging.lit().point_lights[2].position, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(staging.lit().point_lights[2].attenuation[2], 0.032);
        assert_eq!(staging.lit().point_lights[1], PointLightUniform::zeroed());
    }

    #[test]
    fn unknown_and_out_of_range_names_are_ignored() {
        let mut staging = UniformStaging::new();
        let before = *staging.lit();
        staging.set_vec3("pointLights[8].position", Vec3::ONE);
        staging.set_vec3("pointLight[0].position", Vec3::ONE);
        staging.set_float("spotLight.cutoff", 0.5);
        staging.set_bool("useBloom", true);
        assert_eq!(*staging.lit(), before);
    }

    #[test]
    fn point_light_count_clears_stale_slots() {
        let mut staging = UniformStaging::new();
        for index in 0..MAX_POINT_LIGHTS {
            staging.set_vec3(&format!("pointLights[{index}].color"), Vec3::ONE);
        }
        staging.set_int("numPointLights", 6);
        assert_eq!(staging.lit().flags[3], 6);
        assert_eq!(staging.lit().point_lights[5].color, [1.0, 1.0, 1.0, 0.0]);
        assert_eq!(staging.lit().point_lights[6], PointLightUniform::zeroed());
        assert_eq!(staging.lit().point_lights[7], PointLightUniform::zeroed());

        staging.set_int("numPointLights", 99);
        assert_eq!(staging.lit().flags[3], MAX_POINT_LIGHTS as u32);
    }

    #[test]
    fn lamp_program_only_accepts_matrices() {
        let mut staging = UniformStaging::new();
        staging.use_program(ProgramKind::Lamp);
        staging.set_bool("useBlinn", true);
        staging.set_vec3("viewPos", Vec3::ONE);
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 200.0);
        staging.set_mat4("projection", projection);
        assert_eq!(staging.lit().flags[0], 0);
        assert_eq!(staging.lit().view_pos, [0.0; 4]);
        assert_eq!(staging.lamp().projection, projection.to_cols_array_2d());
    }

    #[test]
    fn draws_capture_per_draw_state() {
        let mut staging = UniformStaging::new();
        staging.set_mat4("model", Mat4::from_translation(Vec3::X));
        staging.set_float("material.shininess", 40.0);
        staging.draw(MeshKind::Cube);
        staging.use_program(ProgramKind::Lamp);
        staging.set_mat4("model", Mat4::from_scale(Vec3::splat(0.15)));
        staging.draw(MeshKind::Cube);

        let draws = staging.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].object.model[3], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(draws[0].object.material[0], 40.0);
        assert_eq!(draws[1].program, ProgramKind::Lamp);
        assert_eq!(draws[1].object.model[0][0], 0.15);

        staging.begin_frame();
        assert!(staging.draws().is_empty());
    }
}
