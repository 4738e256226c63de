//! Frame target that keeps every parameter write in memory instead of
//! talking to a GPU. Used by the headless runner and by tests.

use std::collections::{BTreeSet, HashMap};

use glam::{Mat4, Vec3};

use super::{FrameTarget, MeshKind, ProgramKind};
use crate::lights::MAX_POINT_LIGHTS;
use crate::shading::{names, ParsedName, ShadingProgram};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramKind,
    pub mesh: MeshKind,
    pub model: Mat4,
    /// Material shininess in effect, for the lit program.
    pub shininess: Option<f32>,
}

/// Records parameter state per program, mirroring how a GPU program keeps
/// its uniforms between frames.
#[derive(Debug)]
pub struct FrameRecorder {
    active: ProgramKind,
    state: HashMap<ProgramKind, HashMap<String, UniformValue>>,
    written_this_frame: Vec<(ProgramKind, String)>,
    draws: Vec<DrawRecord>,
    frames: u64,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            active: ProgramKind::Lit,
            state: HashMap::new(),
            written_this_frame: Vec::new(),
            draws: Vec::new(),
            frames: 0,
        }
    }

    /// Starts a new frame: forgets the previous frame's write log and draw
    /// list but keeps program state.
    pub fn begin_frame(&mut self) {
        self.written_this_frame.clear();
        self.draws.clear();
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn active_program(&self) -> ProgramKind {
        self.active
    }

    /// Current value of a parameter of `program`.
    pub fn value(&self, program: ProgramKind, name: &str) -> Option<&UniformValue> {
        self.state.get(&program)?.get(name)
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn draw_count(&self, program: ProgramKind) -> usize {
        self.draws.iter().filter(|draw| draw.program == program).count()
    }

    /// Number of parameter writes issued since [`FrameRecorder::begin_frame`].
    pub fn writes_this_frame(&self) -> usize {
        self.written_this_frame.len()
    }

    /// Number of distinct `pointLights[i]` blocks written this frame.
    pub fn point_light_blocks_written(&self) -> usize {
        self.written_this_frame
            .iter()
            .filter_map(|(_, name)| match ParsedName::parse(name) {
                Some(ParsedName::Element { root, index, .. }) if root == names::POINT_LIGHTS => {
                    Some(index)
                }
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn store(&mut self, name: &str, value: UniformValue) {
        if let (ProgramKind::Lit, UniformValue::Int(count)) = (self.active, value) {
            if name == names::NUM_POINT_LIGHTS {
                self.clear_point_lights_from(count.clamp(0, MAX_POINT_LIGHTS as i32) as usize);
            }
        }
        self.state
            .entry(self.active)
            .or_default()
            .insert(name.to_string(), value);
        self.written_this_frame.push((self.active, name.to_string()));
    }

    fn clear_point_lights_from(&mut self, count: usize) {
        if let Some(values) = self.state.get_mut(&ProgramKind::Lit) {
            values.retain(|name, _| match ParsedName::parse(name) {
                Some(ParsedName::Element { root, index, .. }) => {
                    root != names::POINT_LIGHTS || index < count
                }
                _ => true,
            });
        }
    }

    fn current_mat4(&self, name: &str) -> Option<Mat4> {
        match self.value(self.active, name) {
            Some(UniformValue::Mat4(matrix)) => Some(*matrix),
            _ => None,
        }
    }

    fn current_float(&self, name: &str) -> Option<f32> {
        match self.value(self.active, name) {
            Some(UniformValue::Float(value)) => Some(*value),
            _ => None,
        }
    }
}

impl ShadingProgram for FrameRecorder {
    fn set_bool(&mut self, name: &str, value: bool) {
        self.store(name, UniformValue::Bool(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.store(name, UniformValue::Int(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.store(name, UniformValue::Float(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.store(name, UniformValue::Vec3(value));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.store(name, UniformValue::Mat4(value));
    }
}

impl FrameTarget for FrameRecorder {
    fn use_program(&mut self, program: ProgramKind) {
        self.active = program;
    }

    fn draw(&mut self, mesh: MeshKind) {
        let shininess = match self.active {
            ProgramKind::Lit => self.current_float(names::MATERIAL_SHININESS),
            ProgramKind::Lamp => None,
        };
        let model = self.current_mat4(names::MODEL).unwrap_or(Mat4::IDENTITY);
        self.draws.push(DrawRecord {
            program: self.active,
            mesh,
            model,
            shininess,
        });
    }
}
