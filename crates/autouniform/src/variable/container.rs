use crate::error::ContainerError;

use super::types::{ShaderVariable, VariableValue};

/// Ordered, unique-by-name variables of one shader stage of one pass.
#[derive(Debug, Clone, Default)]
pub struct VariableContainer {
    vars: Vec<ShaderVariable>,
}

impl VariableContainer {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Build a container from a list, dropping later entries that reuse a name.
    /// A value whose shape does not match its declared type is reset to the default.
    pub fn from_vars(vars: impl IntoIterator<Item = ShaderVariable>) -> Self {
        let mut container = Self::new();
        for mut var in vars {
            if !var.value.fits(var.value_type) {
                log::warn!(
                    "Value of '{}' does not fit {}; resetting it",
                    var.name,
                    var.value_type.display_name()
                );
                var.value = VariableValue::default_for(var.value_type);
            }
            if let Err(e) = container.add_copy(var) {
                log::warn!("{e}; keeping the first definition");
            }
        }
        container
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderVariable> {
        self.vars.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.vars.iter().map(|v| v.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ShaderVariable> {
        self.vars.iter().find(|v| v.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ShaderVariable> {
        self.vars.iter_mut().find(|v| v.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Append a variable and return the stored copy.
    pub fn add_copy(&mut self, var: ShaderVariable) -> Result<&ShaderVariable, ContainerError> {
        if self.contains(&var.name) {
            return Err(ContainerError::DuplicateName(var.name));
        }
        let idx = self.vars.len();
        self.vars.push(var);
        Ok(&self.vars[idx])
    }

    pub fn remove(&mut self, name: &str) -> Option<ShaderVariable> {
        let idx = self.vars.iter().position(|v| v.name == name)?;
        Some(self.vars.remove(idx))
    }
}
