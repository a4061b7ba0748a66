pub mod container;
pub mod types;

pub use container::VariableContainer;
pub use types::{ShaderVariable, SystemSemantic, ValueType, VariableValue};
