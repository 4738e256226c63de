//! Kinetic light sculpture.
//!
//! A ring of cubes lit by a moonlight directional light, a camera-mounted
//! spotlight and up to eight animated point lights. The lighting and draw
//! sequencing are written against the [`render::FrameTarget`] trait so that
//! the same frame can be recorded headlessly or submitted through wgpu.

pub mod app;
pub mod binding;
pub mod camera;
pub mod config;
pub mod frame;
pub mod input;
pub mod lights;
pub mod motion;
pub mod render;
pub mod scene;
pub mod shading;

pub use camera::{Camera, CameraView};
pub use config::{CliOptions, ConfigError};
pub use frame::{FrameContext, FrameLoop, RenderToggles};
pub use input::{InputSnapshot, InputState, KeyCode};
pub use lights::{build_lights, LightSet, SpotSweep};
pub use motion::{displacement, Displacement, MotionMode};
pub use render::{FrameRecorder, FrameTarget, MeshKind, ProgramKind, Renderer};
pub use scene::{draw_scene, render_frame};
pub use shading::{ShadingProgram, UniformPath};
