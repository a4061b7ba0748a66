use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::pipeline::ShaderLanguage;
use crate::reconcile::{ReconcilePolicy, UniformReconciler};
use crate::semantic::NameSemanticResolver;
use crate::variable::SystemSemantic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    pub version: u32,
    #[serde(default)]
    pub policy: ReconcilePolicy,
    /// Extra names bound to engine semantics, on top of the built-in table.
    #[serde(default)]
    pub semantic_aliases: FxHashMap<String, SystemSemantic>,
    #[serde(default = "default_hlsl_extensions")]
    pub hlsl_extensions: Vec<String>,
    #[serde(default = "default_wgsl_extensions")]
    pub wgsl_extensions: Vec<String>,
    #[serde(default = "default_spirv_extensions")]
    pub spirv_extensions: Vec<String>,
}

fn default_hlsl_extensions() -> Vec<String> {
    vec!["hlsl".into()]
}

fn default_wgsl_extensions() -> Vec<String> {
    vec!["wgsl".into()]
}

fn default_spirv_extensions() -> Vec<String> {
    vec!["spv".into()]
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            policy: ReconcilePolicy::default(),
            semantic_aliases: FxHashMap::default(),
            hlsl_extensions: default_hlsl_extensions(),
            wgsl_extensions: default_wgsl_extensions(),
            spirv_extensions: default_spirv_extensions(),
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("autouniform").join("settings.json"))
}

impl SettingsConfig {
    pub fn load() -> Self {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid settings {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        if let Some(path) = settings_path() {
            self.save_to(&path);
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(json) = serde_json::to_string_pretty(self) {
            if let Err(e) = std::fs::write(path, json) {
                log::warn!("Failed to save settings {}: {e}", path.display());
            }
        }
    }

    fn has_extension(list: &[String], path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| list.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Whether the file holds compiled SPIR-V rather than source text.
    pub fn is_spirv(&self, path: &Path) -> bool {
        Self::has_extension(&self.spirv_extensions, path)
    }

    /// Source language guessed from the file extension; GLSL unless listed otherwise.
    pub fn language_for(&self, path: &Path) -> ShaderLanguage {
        if Self::has_extension(&self.hlsl_extensions, path) {
            ShaderLanguage::Hlsl
        } else if Self::has_extension(&self.wgsl_extensions, path) {
            ShaderLanguage::Wgsl
        } else {
            ShaderLanguage::Glsl
        }
    }

    pub fn reconciler(&self) -> UniformReconciler {
        let resolver = NameSemanticResolver::new().with_aliases(&self.semantic_aliases);
        UniformReconciler::with_resolver(self.policy, Box::new(resolver))
    }
}
