//! Typed errors for the library surface.
//!
//! The reconciler itself never fails; these cover the collaborators around it
//! (variable storage, shader reflection, project files).

use std::path::PathBuf;

use thiserror::Error;

use crate::reflect::ShaderStage;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("variable '{0}' already exists")]
    DuplicateName(String),
}

#[derive(Debug, Error)]
pub enum ReflectError {
    /// SPIR-V words could not be parsed into a module.
    #[error("SPIR-V parse error: {0}")]
    SpirvParse(String),

    #[error("WGSL parse error:\n{0}")]
    WgslParse(String),

    #[error("GLSL parse error:\n{0}")]
    GlslParse(String),

    /// The front-end has no entry point kind for this stage.
    #[error("{stage:?} stage cannot be reflected from {language} source")]
    UnsupportedStage {
        stage: ShaderStage,
        language: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
}
