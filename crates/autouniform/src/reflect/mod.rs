pub mod glsl;
pub mod naga_reflector;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ReflectError;

pub use naga_reflector::NagaReflector;

/// Pipeline stage a piece of shader code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Compute,
}

/// Type category of a reflected declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniformKind {
    Bool,
    Int,
    Float,
    Vector,
    Matrix,
    Struct,
    /// Anything the variable system has no counterpart for (arrays, atomics, ...).
    Other,
}

/// A named uniform declaration produced by reflection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedUniform {
    pub name: String,
    pub kind: UniformKind,
    /// Scalar kind of a vector or matrix.
    #[serde(default = "default_base_kind")]
    pub base_kind: UniformKind,
    /// Vector length, or matrix column count.
    #[serde(default = "default_components")]
    pub components: u8,
    /// Key into [`Reflection::user_types`] for struct declarations.
    #[serde(default)]
    pub type_name: Option<String>,
}

fn default_base_kind() -> UniformKind {
    UniformKind::Other
}

fn default_components() -> u8 {
    1
}

impl ReflectedUniform {
    pub fn scalar(name: impl Into<String>, kind: UniformKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base_kind: kind,
            components: 1,
            type_name: None,
        }
    }

    pub fn vector(name: impl Into<String>, base_kind: UniformKind, components: u8) -> Self {
        Self {
            name: name.into(),
            kind: UniformKind::Vector,
            base_kind,
            components,
            type_name: None,
        }
    }

    pub fn matrix(name: impl Into<String>, base_kind: UniformKind, components: u8) -> Self {
        Self {
            name: name.into(),
            kind: UniformKind::Matrix,
            base_kind,
            components,
            type_name: None,
        }
    }

    pub fn structure(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: UniformKind::Struct,
            base_kind: UniformKind::Other,
            components: 1,
            type_name: Some(type_name.into()),
        }
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: UniformKind::Other,
            base_kind: UniformKind::Other,
            components: 1,
            type_name: None,
        }
    }

    pub fn is_struct(&self) -> bool {
        self.kind == UniformKind::Struct
    }
}

/// Result of reflecting one stage: top-level uniforms in declaration order plus
/// the member layout of every struct type they may reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reflection {
    pub uniforms: Vec<ReflectedUniform>,
    #[serde(default)]
    pub user_types: FxHashMap<String, Vec<ReflectedUniform>>,
}

impl Reflection {
    pub fn members_of(&self, type_name: &str) -> Option<&[ReflectedUniform]> {
        self.user_types.get(type_name).map(Vec::as_slice)
    }
}

/// Compiled (or parseable) code for one stage.
#[derive(Debug, Clone)]
pub enum StageCode {
    Spirv(Vec<u32>),
    Wgsl(String),
    Glsl(String),
}

impl StageCode {
    pub fn is_empty(&self) -> bool {
        match self {
            StageCode::Spirv(words) => words.is_empty(),
            StageCode::Wgsl(src) | StageCode::Glsl(src) => src.trim().is_empty(),
        }
    }
}

/// Enumerates the uniforms a stage declares.
pub trait ShaderReflector {
    fn reflect(&self, stage: ShaderStage, code: &StageCode) -> Result<Reflection, ReflectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kinds() {
        let v = ReflectedUniform::vector("uColor", UniformKind::Float, 3);
        assert_eq!(v.kind, UniformKind::Vector);
        assert_eq!(v.base_kind, UniformKind::Float);
        assert_eq!(v.components, 3);

        let s = ReflectedUniform::structure("light", "Light");
        assert!(s.is_struct());
        assert_eq!(s.type_name.as_deref(), Some("Light"));
    }

    #[test]
    fn members_of_missing_type() {
        let r = Reflection::default();
        assert!(r.members_of("Light").is_none());
    }

    #[test]
    fn reflection_from_json_uses_defaults() {
        let json = r#"{
            "uniforms": [
                { "name": "iTime", "kind": "Float" },
                { "name": "light", "kind": "Struct", "type_name": "Light" }
            ],
            "user_types": {
                "Light": [
                    { "name": "color", "kind": "Vector", "base_kind": "Float", "components": 3 }
                ]
            }
        }"#;
        let r: Reflection = serde_json::from_str(json).unwrap();
        assert_eq!(r.uniforms.len(), 2);
        assert_eq!(r.uniforms[0].components, 1);
        assert_eq!(r.members_of("Light").unwrap()[0].components, 3);
    }

    #[test]
    fn empty_stage_code() {
        assert!(StageCode::Spirv(Vec::new()).is_empty());
        assert!(StageCode::Wgsl("  \n".into()).is_empty());
        assert!(!StageCode::Glsl("void main() {}".into()).is_empty());
    }
}
