//! Automatic shader-uniform management for a shader editor.
//!
//! Reflected uniform declarations are reconciled against each pass's variable
//! container: new uniforms get variables (optionally pinned or bound to engine
//! semantics) and variables whose uniform disappeared from every stage are retired.

pub mod error;
pub mod pinned;
pub mod pipeline;
pub mod project;
pub mod reconcile;
pub mod reflect;
pub mod semantic;
pub mod settings;
pub mod variable;
pub mod watcher;

pub use error::{ContainerError, ProjectError, ReflectError};
pub use pinned::PinnedList;
pub use pipeline::{ItemReport, Pipeline, PipelineItem, PipelineItemKind, ShaderLanguage};
pub use reconcile::{ReconcilePolicy, UniformReconciler};
pub use reflect::{NagaReflector, ReflectedUniform, Reflection, ShaderReflector, ShaderStage, UniformKind};
pub use semantic::{NameSemanticResolver, SemanticResolver};
pub use variable::{ShaderVariable, SystemSemantic, ValueType, VariableContainer};
