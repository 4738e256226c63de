use std::fmt;

use crate::shading::ShadingProgram;

pub mod geometry;
pub mod native;
pub mod recorder;
pub mod shaders;
pub mod texture;
pub mod uniforms;

pub use native::Renderer;
pub use recorder::FrameRecorder;

/// The two shading programs the scene uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Textured, lit by the directional, spot and point lights.
    Lit,
    /// Flat white, used for the lamp markers. Accepts projection, view and
    /// model only.
    Lamp,
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lit => "lit",
            Self::Lamp => "lamp",
        })
    }
}

/// Static vertex buffers available to draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Ground,
    Cube,
}

/// Something the scene can be drawn into. Parameter writes go to the program
/// selected by the last [`FrameTarget::use_program`] call; a draw call
/// captures the per-draw parameters (model matrix, shininess) as they are at
/// that moment.
pub trait FrameTarget: ShadingProgram {
    fn use_program(&mut self, program: ProgramKind);
    fn draw(&mut self, mesh: MeshKind);
}
