//! Command-line configuration.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::input::KeyCode;
use crate::lights::{ACTIVE_POINT_LIGHTS, MAX_POINT_LIGHTS};
use crate::motion::MotionMode;

pub const USAGE: &str = "Usage: kinetic-sculpture [--headless] [--frames N] \
[--mode orbit|pendulum|spiral|swarm|1-4] [--lights N] [--size WxH] [--textures DIR] \
[--hold KEY[,KEY...]]";

pub const DEFAULT_TEXTURE_DIR: &str = "resources/textures";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("{0} expects a value")]
    MissingValue(&'static str),
    #[error("invalid value {value:?} for {option}: {reason}")]
    InvalidValue {
        option: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub headless: bool,
    pub frames: u32,
    pub mode: MotionMode,
    pub lights: usize,
    pub width: u32,
    pub height: u32,
    pub texture_dir: PathBuf,
    pub hold: Vec<KeyCode>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            headless: false,
            frames: 1,
            mode: MotionMode::default(),
            lights: ACTIVE_POINT_LIGHTS,
            width: 1280,
            height: 720,
            texture_dir: PathBuf::from(DEFAULT_TEXTURE_DIR),
            hold: Vec::new(),
        }
    }
}

impl CliOptions {
    /// Parses the process arguments.
    pub fn parse() -> Result<Self, ConfigError> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parses `args`, which must not include the program name.
    pub fn parse_from<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let mut value = |option: &'static str| -> Result<String, ConfigError> {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or(ConfigError::MissingValue(option))
            };
            match flag.as_str() {
                "--headless" => options.headless = true,
                "--frames" => options.frames = parse_frames(value("--frames")?)?,
                "--mode" => options.mode = parse_mode(value("--mode")?)?,
                "--lights" => options.lights = parse_lights(value("--lights")?)?,
                "--size" => {
                    let (width, height) = parse_size(value("--size")?)?;
                    options.width = width;
                    options.height = height;
                }
                "--textures" => options.texture_dir = PathBuf::from(value("--textures")?),
                "--hold" => options.hold.extend(parse_keys(value("--hold")?)?),
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }
        Ok(options)
    }
}

fn invalid(option: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        option,
        value,
        reason,
    }
}

fn parse_frames(value: String) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(frames) if frames > 0 => Ok(frames),
        _ => Err(invalid("--frames", value, "expected a positive integer")),
    }
}

fn parse_mode(value: String) -> Result<MotionMode, ConfigError> {
    MotionMode::from_name(&value)
        .ok_or_else(|| invalid("--mode", value, "expected orbit, pendulum, spiral, swarm or 1-4"))
}

fn parse_lights(value: String) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(count) if count <= MAX_POINT_LIGHTS => Ok(count),
        _ => Err(invalid("--lights", value, "expected an integer from 0 to 8")),
    }
}

fn parse_size(value: String) -> Result<(u32, u32), ConfigError> {
    let parsed = value
        .split_once(['x', 'X'])
        .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((width, height)) if width > 0 && height > 0 => Ok((width, height)),
        _ => Err(invalid("--size", value, "expected WIDTHxHEIGHT")),
    }
}

fn parse_keys(value: String) -> Result<Vec<KeyCode>, ConfigError> {
    let keys: Option<Vec<KeyCode>> = value
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .map(KeyCode::from_name)
        .collect();
    match keys {
        Some(keys) if !keys.is_empty() => Ok(keys),
        _ => Err(invalid("--hold", value, "expected comma-separated key names")),
    }
}
