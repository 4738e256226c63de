//! Interactive and headless drivers for the frame loop.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use log::{error, info, warn};
use pollster::block_on;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::binding::bind_material_units;
use crate::config::CliOptions;
use crate::frame::{FrameLoop, RenderToggles};
use crate::input::{InputSnapshot, InputState, KeyCode};
use crate::lights::clamp_light_count;
use crate::motion::MotionMode;
use crate::render::recorder::UniformValue;
use crate::render::{FrameRecorder, ProgramKind, Renderer};
use crate::scene::render_frame;
use crate::shading::{names, UniformPath};

/// Fixed time step of headless runs, in seconds.
pub const HEADLESS_STEP: f32 = 1.0 / 60.0;

/// Runs the sculpture with the given options, falling back to a headless
/// run when no window can be opened.
pub fn run(options: CliOptions) -> Result<()> {
    if options.headless {
        print!("{}", run_headless(&options));
        return Ok(());
    }
    match run_interactive(&options) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!("{err}. Falling back to --headless mode (set DISPLAY to enable rendering).");
            print!("{}", run_headless(&options));
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// State captured at the end of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub frames: u32,
    pub mode: MotionMode,
    pub point_lights: i32,
    pub positions: Vec<Vec3>,
    pub lit_draws: usize,
    pub lamp_draws: usize,
    pub sweep: f32,
    pub toggles: RenderToggles,
}

impl fmt::Display for HeadlessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rendered {} frame(s) in {} mode", self.frames, self.mode)?;
        writeln!(f, "numPointLights={}", self.point_lights)?;
        writeln!(
            f,
            "draw calls: {} (lit {}, lamp {})",
            self.lit_draws + self.lamp_draws,
            self.lit_draws,
            self.lamp_draws
        )?;
        for (index, position) in self.positions.iter().enumerate() {
            writeln!(
                f,
                " - pointLights[{index}] pos=({:.2}, {:.2}, {:.2})",
                unsigned_zero(position.x),
                unsigned_zero(position.y),
                unsigned_zero(position.z)
            )?;
        }
        writeln!(f, "spot sweep={:.3}", self.sweep)?;
        writeln!(
            f,
            "toggles: blinn={} toon={} gamma={}",
            self.toggles.use_blinn, self.toggles.use_toon, self.toggles.use_gamma
        )
    }
}

fn unsigned_zero(value: f32) -> f32 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Drives the frame loop against a [`FrameRecorder`] on a fixed time step,
/// holding `options.hold` down for every frame.
pub fn run_headless(options: &CliOptions) -> HeadlessReport {
    let aspect = options.width as f32 / options.height as f32;
    let held = InputSnapshot::holding(options.hold.iter().copied());
    let mut frame_loop = FrameLoop::new(options.mode, clamp_light_count(options.lights));
    let mut recorder = FrameRecorder::new();
    bind_material_units(&mut recorder);

    let mut rendered = 0;
    for frame in 0..options.frames {
        let time = frame as f32 * HEADLESS_STEP;
        let ctx = frame_loop.advance(time, &held);
        recorder.begin_frame();
        render_frame(&mut recorder, &ctx, aspect);
        rendered += 1;
        if frame_loop.exit_requested() {
            info!("exit requested after {rendered} frame(s)");
            break;
        }
    }

    let point_lights = match recorder.value(ProgramKind::Lit, names::NUM_POINT_LIGHTS) {
        Some(UniformValue::Int(count)) => *count,
        _ => 0,
    };
    let positions = (0..point_lights.max(0) as usize)
        .filter_map(|index| {
            let name = UniformPath::new(names::POINT_LIGHTS)
                .index(index)
                .field(names::POSITION);
            match recorder.value(ProgramKind::Lit, &name) {
                Some(UniformValue::Vec3(position)) => Some(*position),
                _ => None,
            }
        })
        .collect();

    HeadlessReport {
        frames: rendered,
        mode: frame_loop.mode(),
        point_lights,
        positions,
        lit_draws: recorder.draw_count(ProgramKind::Lit),
        lamp_draws: recorder.draw_count(ProgramKind::Lamp),
        sweep: frame_loop.sweep().angle(),
        toggles: frame_loop.toggles(),
    }
}

fn run_interactive(options: &CliOptions) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SculptureApp::new(options.clone());
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {message}")]
pub struct WindowInitError {
    stage: &'static str,
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &'static str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            stage,
            message: panic_message(panic),
        }
    }

    fn from_error(stage: &'static str, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct SculptureApp {
    options: CliOptions,
    frame_loop: FrameLoop,
    input: InputState,
    renderer: Option<Renderer>,
    start: Instant,
    last_error: Option<anyhow::Error>,
}

impl SculptureApp {
    fn new(options: CliOptions) -> Self {
        let frame_loop = FrameLoop::new(options.mode, clamp_light_count(options.lights));
        Self {
            options,
            frame_loop,
            input: InputState::new(),
            renderer: None,
            start: Instant::now(),
            last_error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn create_renderer(&self, event_loop: &ActiveEventLoop) -> Result<Renderer> {
        let attributes = Window::default_attributes()
            .with_title("Kinetic Sculpture")
            .with_inner_size(LogicalSize::new(self.options.width, self.options.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        let renderer = block_on(Renderer::new(Arc::clone(&window), &self.options.texture_dir))?;
        grab_cursor(&window);
        Ok(renderer)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let time = self.start.elapsed().as_secs_f32();
        let snapshot = self.input.snapshot();
        let ctx = self.frame_loop.advance(time, &snapshot);

        let aspect = renderer.aspect();
        renderer.begin_frame();
        render_frame(&mut *renderer, &ctx, aspect);
        if let Err(err) = renderer.finish_frame() {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = renderer.window().inner_size();
                    renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    error!("GPU is out of memory");
                    self.last_error = Some(anyhow!("GPU is out of memory"));
                    event_loop.exit();
                }
                other => warn!("skipping frame: {other}"),
            }
        }
        if self.frame_loop.exit_requested() {
            event_loop.exit();
        }
    }

    fn handle_keyboard(&mut self, key: WinitKeyCode, state: ElementState) {
        let Some(key) = map_keycode(key) else {
            return;
        };
        match state {
            ElementState::Pressed => self.input.set_key_down(key),
            ElementState::Released => self.input.set_key_up(key),
        }
    }
}

impl ApplicationHandler for SculptureApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                info!(
                    "window ready: {} point light(s), {} mode",
                    clamp_light_count(self.options.lights),
                    self.options.mode
                );
                self.renderer = Some(renderer);
                self.start = Instant::now();
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.renderer.as_ref().map(Renderer::window_id) != Some(id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                self.frame_loop.request_exit();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.handle_keyboard(key, state),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                self.input.add_mouse_motion(Vec2::new(dx as f32, dy as f32));
            }
            DeviceEvent::MouseWheel { delta } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / 100.0) as f32,
                };
                self.input.add_scroll(lines);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }
}

fn grab_cursor(window: &Window) {
    if let Err(err) = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
    {
        warn!("cursor grab unavailable: {err}");
    }
    window.set_cursor_visible(false);
}

fn map_keycode(code: WinitKeyCode) -> Option<KeyCode> {
    use WinitKeyCode as Key;
    Some(match code {
        Key::Escape => KeyCode::Escape,
        Key::Digit0 => KeyCode::Digit(0),
        Key::Digit1 => KeyCode::Digit(1),
        Key::Digit2 => KeyCode::Digit(2),
        Key::Digit3 => KeyCode::Digit(3),
        Key::Digit4 => KeyCode::Digit(4),
        Key::Digit5 => KeyCode::Digit(5),
        Key::Digit6 => KeyCode::Digit(6),
        Key::Digit7 => KeyCode::Digit(7),
        Key::Digit8 => KeyCode::Digit(8),
        Key::Digit9 => KeyCode::Digit(9),
        Key::KeyA => KeyCode::Character('A'),
        Key::KeyB => KeyCode::Character('B'),
        Key::KeyC => KeyCode::Character('C'),
        Key::KeyD => KeyCode::Character('D'),
        Key::KeyE => KeyCode::Character('E'),
        Key::KeyF => KeyCode::Character('F'),
        Key::KeyG => KeyCode::Character('G'),
        Key::KeyH => KeyCode::Character('H'),
        Key::KeyI => KeyCode::Character('I'),
        Key::KeyJ => KeyCode::Character('J'),
        Key::KeyK => KeyCode::Character('K'),
        Key::KeyL => KeyCode::Character('L'),
        Key::KeyM => KeyCode::Character('M'),
        Key::KeyN => KeyCode::Character('N'),
        Key::KeyO => KeyCode::Character('O'),
        Key::KeyP => KeyCode::Character('P'),
        Key::KeyQ => KeyCode::Character('Q'),
        Key::KeyR => KeyCode::Character('R'),
        Key::KeyS => KeyCode::Character('S'),
        Key::KeyT => KeyCode::Character('T'),
        Key::KeyU => KeyCode::Character('U'),
        Key::KeyV => KeyCode::Character('V'),
        Key::KeyW => KeyCode::Character('W'),
        Key::KeyX => KeyCode::Character('X'),
        Key::KeyY => KeyCode::Character('Y'),
        Key::KeyZ => KeyCode::Character('Z'),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless(args: &[&str]) -> HeadlessReport {
        let mut all = vec!["--headless"];
        all.extend_from_slice(args);
        let options = CliOptions::parse_from(all).unwrap();
        run_headless(&options)
    }

    #[test]
    fn single_frame_reports_default_scene() {
        let report = headless(&[]);
        assert_eq!(report.frames, 1);
        assert_eq!(report.mode, MotionMode::Orbit);
        assert_eq!(report.point_lights, 6);
        assert_eq!(report.positions.len(), 6);
        assert_eq!(report.lit_draws, 13);
        assert_eq!(report.lamp_draws, 6);
        assert_eq!(report.toggles, RenderToggles::default());
    }

    #[test]
    fn escape_stops_the_run_early() {
        let report = headless(&["--frames", "10", "--hold", "escape"]);
        assert_eq!(report.frames, 1);
    }

    #[test]
    fn held_keys_drive_the_loop() {
        let report = headless(&["--frames", "3", "--hold", "3,p,t"]);
        assert_eq!(report.mode, MotionMode::Spiral);
        assert!(!report.toggles.use_blinn);
        assert!(report.toggles.use_toon);
    }

    #[test]
    fn light_count_follows_option() {
        let report = headless(&["--lights", "0"]);
        assert_eq!(report.point_lights, 0);
        assert!(report.positions.is_empty());
        assert_eq!(report.lamp_draws, 0);
    }

    #[test]
    fn report_formats_positions_without_negative_zero() {
        let report = HeadlessReport {
            frames: 1,
            mode: MotionMode::Pendulum,
            point_lights: 1,
            positions: vec![Vec3::new(-0.0, 1.8, 2.5)],
            lit_draws: 13,
            lamp_draws: 1,
            sweep: 0.0,
            toggles: RenderToggles::default(),
        };
        let text = report.to_string();
        assert!(text.contains(" - pointLights[0] pos=(0.00, 1.80, 2.50)"));
        assert!(text.contains("draw calls: 14 (lit 13, lamp 1)"));
    }
}
