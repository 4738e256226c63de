//! Contract between the frame code and a shading program.
//!
//! Parameters are addressed by name. The names used in this crate are the
//! wire format shared with the shader sources: renaming one on either side
//! does not fail, the write simply stops having an effect. Implementations of
//! [`ShadingProgram`] must treat an unknown name as a no-op rather than an
//! error, so a backend that misses a slot degrades to wrong-looking output
//! instead of a crash. Anyone adding a backend should check every name in
//! this module against its shader sources by hand.

use std::fmt;

use glam::{Mat4, Vec3};

/// Sink for named shading parameters.
pub trait ShadingProgram {
    fn set_bool(&mut self, name: &str, value: bool);
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_mat4(&mut self, name: &str, value: Mat4);
}

pub mod names {
    pub const VIEW_POS: &str = "viewPos";
    pub const USE_BLINN: &str = "useBlinn";
    pub const USE_TOON: &str = "useToon";
    pub const USE_GAMMA: &str = "useGamma";
    pub const GAMMA_VALUE: &str = "gammaValue";

    pub const PROJECTION: &str = "projection";
    pub const VIEW: &str = "view";
    pub const MODEL: &str = "model";

    pub const MATERIAL_DIFFUSE: &str = "material.diffuse";
    pub const MATERIAL_SPECULAR: &str = "material.specular";
    pub const MATERIAL_SHININESS: &str = "material.shininess";

    pub const DIR_LIGHT: &str = "dirLight";
    pub const SPOT_LIGHT: &str = "spotLight";
    pub const POINT_LIGHTS: &str = "pointLights";
    pub const NUM_POINT_LIGHTS: &str = "numPointLights";

    pub const POSITION: &str = "position";
    pub const DIRECTION: &str = "direction";
    pub const COLOR: &str = "color";
    pub const AMBIENT: &str = "ambient";
    pub const DIFFUSE: &str = "diffuse";
    pub const SPECULAR: &str = "specular";
    pub const CONSTANT: &str = "constant";
    pub const LINEAR: &str = "linear";
    pub const QUADRATIC: &str = "quadratic";
    pub const CUT_OFF: &str = "cutOff";
    pub const OUTER_CUT_OFF: &str = "outerCutOff";
}

/// Builder for struct and array-of-struct parameter names such as
/// `dirLight.ambient` or `pointLights[3].position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformPath {
    base: String,
}

impl UniformPath {
    pub fn new(root: &str) -> Self {
        Self {
            base: root.to_string(),
        }
    }

    /// Addresses element `index` of an array parameter.
    pub fn index(mut self, index: usize) -> Self {
        use std::fmt::Write;
        let _ = write!(self.base, "[{index}]");
        self
    }

    pub fn field(&self, field: &str) -> String {
        format!("{}.{field}", self.base)
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for UniformPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Parameter name split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedName<'a> {
    /// `viewPos`
    Plain(&'a str),
    /// `dirLight.ambient`
    Field { root: &'a str, field: &'a str },
    /// `pointLights[2].color`
    Element {
        root: &'a str,
        index: usize,
        field: &'a str,
    },
}

impl<'a> ParsedName<'a> {
    /// Splits a name built by [`UniformPath`]. Returns `None` for malformed
    /// array syntax.
    pub fn parse(name: &'a str) -> Option<Self> {
        if let Some(open) = name.find('[') {
            let close = open + name[open..].find(']')?;
            let index = name[open + 1..close].parse().ok()?;
            let field = name[close + 1..].strip_prefix('.')?;
            return Some(Self::Element {
                root: &name[..open],
                index,
                field,
            });
        }
        Some(match name.split_once('.') {
            Some((root, field)) => Self::Field { root, field },
            None => Self::Plain(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_indexed_names() {
        let path = UniformPath::new(names::POINT_LIGHTS).index(3);
        assert_eq!(path.field(names::POSITION), "pointLights[3].position");
        assert_eq!(
            UniformPath::new(names::SPOT_LIGHT).field(names::OUTER_CUT_OFF),
            "spotLight.outerCutOff"
        );
    }

    #[test]
    fn parses_names_back() {
        assert_eq!(ParsedName::parse("viewPos"), Some(ParsedName::Plain("viewPos")));
        assert_eq!(
            ParsedName::parse("material.shininess"),
            Some(ParsedName::Field {
                root: "material",
                field: "shininess"
            })
        );
        assert_eq!(
            ParsedName::parse("pointLights[7].quadratic"),
            Some(ParsedName::Element {
                root: "pointLights",
                index: 7,
                field: "quadratic"
            })
        );
    }

    #[test]
    fn rejects_malformed_array_names() {
        assert_eq!(ParsedName::parse("pointLights[x].color"), None);
        assert_eq!(ParsedName::parse("pointLights[1]color"), None);
        assert_eq!(ParsedName::parse("pointLights[2"), None);
    }
}
