//! Keeps a stage's variable container in step with the uniforms its shaders declare.
//!
//! [`UniformReconciler::add_discovered`] runs once per reflected stage and only
//! ever adds variables. [`UniformReconciler::prune_unused`] runs once per pass,
//! after every stage has been through `add_discovered`, and retires variables
//! whose uniform no longer exists in any stage.
//!
//! Declarations the variable system cannot represent are skipped, never errors.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::pinned::PinnedList;
use crate::reflect::{ReflectedUniform, Reflection, UniformKind};
use crate::semantic::{NameSemanticResolver, SemanticResolver};
use crate::variable::{ShaderVariable, ValueType, VariableContainer};

/// Switches controlling automatic uniform handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// Create variables for newly reflected uniforms.
    #[serde(default = "default_true")]
    pub auto_uniforms: bool,
    /// Pin newly created manual variables.
    #[serde(default = "default_true")]
    pub auto_pin: bool,
    /// Bind new top-level variables to engine semantics by name.
    #[serde(default = "default_true")]
    pub detect_semantics: bool,
    /// Remove variables whose uniform disappeared from every stage.
    #[serde(default = "default_true")]
    pub delete_unused: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            auto_uniforms: true,
            auto_pin: true,
            detect_semantics: true,
            delete_unused: true,
        }
    }
}

/// Scalar value type for a bool/int/float kind.
pub fn value_type_of(kind: UniformKind) -> Option<ValueType> {
    match kind {
        UniformKind::Bool => Some(ValueType::Boolean1),
        UniformKind::Int => Some(ValueType::Integer1),
        UniformKind::Float => Some(ValueType::Float1),
        _ => None,
    }
}

/// N-component vector of the given scalar type, N in 2..=4.
pub fn vector_type(scalar: Option<ValueType>, components: u8) -> Option<ValueType> {
    let ty = match (scalar?, components) {
        (ValueType::Boolean1, 2) => ValueType::Boolean2,
        (ValueType::Boolean1, 3) => ValueType::Boolean3,
        (ValueType::Boolean1, 4) => ValueType::Boolean4,
        (ValueType::Integer1, 2) => ValueType::Integer2,
        (ValueType::Integer1, 3) => ValueType::Integer3,
        (ValueType::Integer1, 4) => ValueType::Integer4,
        (ValueType::Float1, 2) => ValueType::Float2,
        (ValueType::Float1, 3) => ValueType::Float3,
        (ValueType::Float1, 4) => ValueType::Float4,
        _ => return None,
    };
    Some(ty)
}

/// Square float matrix of size N x N, N in 2..=4.
pub fn matrix_type(scalar: Option<ValueType>, components: u8) -> Option<ValueType> {
    if scalar? != ValueType::Float1 {
        return None;
    }
    match components {
        2 => Some(ValueType::Float2x2),
        3 => Some(ValueType::Float3x3),
        4 => Some(ValueType::Float4x4),
        _ => None,
    }
}

/// Value type of a non-struct declaration, if the variable system can hold it.
pub fn resolve_value_type(uniform: &ReflectedUniform) -> Option<ValueType> {
    match uniform.kind {
        UniformKind::Bool | UniformKind::Int | UniformKind::Float => value_type_of(uniform.kind),
        UniformKind::Vector => vector_type(value_type_of(uniform.base_kind), uniform.components),
        UniformKind::Matrix => matrix_type(value_type_of(uniform.base_kind), uniform.components),
        UniformKind::Struct | UniformKind::Other => None,
    }
}

pub struct UniformReconciler {
    pub policy: ReconcilePolicy,
    resolver: Box<dyn SemanticResolver>,
}

impl UniformReconciler {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self::with_resolver(policy, Box::new(NameSemanticResolver::new()))
    }

    pub fn with_resolver(policy: ReconcilePolicy, resolver: Box<dyn SemanticResolver>) -> Self {
        Self { policy, resolver }
    }

    /// Add a variable for every reflected uniform the container does not have yet.
    ///
    /// Every uniform name encountered, including `parent.member` names produced
    /// by struct expansion, is appended to `seen` in encounter order. Returns the
    /// names of the variables created.
    pub fn add_discovered(
        &self,
        vars: &mut VariableContainer,
        pinned: &mut PinnedList,
        reflection: &Reflection,
        seen: &mut Vec<String>,
    ) -> Vec<String> {
        let mut created = Vec::new();

        for uniform in &reflection.uniforms {
            seen.push(uniform.name.clone());
            if vars.contains(&uniform.name) {
                continue;
            }

            match resolve_value_type(uniform) {
                Some(value_type) => {
                    let system = if self.policy.detect_semantics {
                        self.resolver.resolve(&uniform.name, value_type)
                    } else {
                        None
                    };
                    let var = ShaderVariable::new(value_type, uniform.name.as_str(), system);
                    if self.insert(vars, pinned, var) {
                        created.push(uniform.name.clone());
                    }
                }
                None if uniform.is_struct() => {
                    self.expand_struct(vars, pinned, reflection, uniform, seen, &mut created);
                }
                None => {
                    log::debug!(
                        "Skipping uniform '{}': {:?} has no variable type",
                        uniform.name,
                        uniform.kind
                    );
                }
            }
        }

        created
    }

    /// Breadth-first walk over a struct uniform, creating one variable per leaf member.
    fn expand_struct(
        &self,
        vars: &mut VariableContainer,
        pinned: &mut PinnedList,
        reflection: &Reflection,
        root: &ReflectedUniform,
        seen: &mut Vec<String>,
        created: &mut Vec<String>,
    ) {
        let mut queue: VecDeque<(String, &ReflectedUniform)> = VecDeque::new();
        queue.push_back((root.name.clone(), root));

        while let Some((name, decl)) = queue.pop_front() {
            if decl.is_struct() {
                let members = decl
                    .type_name
                    .as_deref()
                    .and_then(|type_name| reflection.members_of(type_name));
                match members {
                    Some(members) => {
                        for member in members {
                            queue.push_back((format!("{name}.{}", member.name), member));
                        }
                    }
                    None => log::debug!(
                        "No layout for struct type {:?} of '{name}'",
                        decl.type_name
                    ),
                }
                continue;
            }

            seen.push(name.clone());
            if vars.contains(&name) {
                continue;
            }
            let Some(value_type) = resolve_value_type(decl) else {
                log::debug!("Skipping member '{name}': {:?} has no variable type", decl.kind);
                continue;
            };
            // Members are always manual; semantics only bind to top-level names.
            if self.insert(vars, pinned, ShaderVariable::new(value_type, name.as_str(), None)) {
                created.push(name);
            }
        }
    }

    fn insert(&self, vars: &mut VariableContainer, pinned: &mut PinnedList, var: ShaderVariable) -> bool {
        match vars.add_copy(var) {
            Ok(stored) => {
                log::debug!(
                    "Added variable '{}' ({}{})",
                    stored.name,
                    stored.value_type.display_name(),
                    stored
                        .system
                        .map(|s| format!(", bound to {}", s.display_name()))
                        .unwrap_or_default()
                );
                if self.policy.auto_pin && stored.is_manual() {
                    pinned.add(&stored.name);
                }
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Remove every variable whose name is not in `referenced`, unpinning it too.
    ///
    /// `referenced` must cover every compiled stage of the pass. Returns the
    /// names of the removed variables.
    pub fn prune_unused(
        &self,
        vars: &mut VariableContainer,
        pinned: &mut PinnedList,
        referenced: &[String],
    ) -> Vec<String> {
        let referenced: FxHashSet<&str> = referenced.iter().map(String::as_str).collect();
        let stale: Vec<String> = vars
            .iter()
            .filter(|v| !referenced.contains(v.name.as_str()))
            .map(|v| v.name.clone())
            .collect();

        for name in &stale {
            pinned.remove(name);
            vars.remove(name);
            log::debug!("Removed unused variable '{name}'");
        }
        stale
    }
}
