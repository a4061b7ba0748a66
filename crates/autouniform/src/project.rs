//! JSON project files: passes, their shader files and their variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::pinned::PinnedList;
use crate::pipeline::{
    CompiledStage, ComputePass, Pipeline, PipelineItem, PipelineItemKind, ShaderLanguage, ShaderPass,
};
use crate::reflect::StageCode;
use crate::settings::SettingsConfig;
use crate::variable::{ShaderVariable, VariableContainer};

/// One shader file of a pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDef {
    /// Relative to the project file.
    pub path: PathBuf,
    /// Overrides the language guessed from the extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<ShaderLanguage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PassDef {
    Shader {
        name: String,
        vertex: StageDef,
        pixel: StageDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        geometry: Option<StageDef>,
        #[serde(default)]
        variables: Vec<ShaderVariable>,
    },
    Compute {
        name: String,
        compute: StageDef,
        #[serde(default)]
        variables: Vec<ShaderVariable>,
    },
}

impl PassDef {
    pub fn name(&self) -> &str {
        match self {
            PassDef::Shader { name, .. } => name,
            PassDef::Compute { name, .. } => name,
        }
    }

    pub fn stages(&self) -> Vec<&StageDef> {
        match self {
            PassDef::Shader {
                vertex,
                pixel,
                geometry,
                ..
            } => {
                let mut stages = vec![vertex, pixel];
                stages.extend(geometry.as_ref());
                stages
            }
            PassDef::Compute { compute, .. } => vec![compute],
        }
    }

    fn variables_mut(&mut self) -> &mut Vec<ShaderVariable> {
        match self {
            PassDef::Shader { variables, .. } => variables,
            PassDef::Compute { variables, .. } => variables,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub passes: Vec<PassDef>,
    #[serde(default)]
    pub pinned: Vec<String>,
}

impl ProjectFile {
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?).map_err(|source| ProjectError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every shader file referenced by the project, resolved against `base_dir`.
    pub fn stage_paths(&self, base_dir: &Path) -> Vec<(String, PathBuf)> {
        self.passes
            .iter()
            .flat_map(|pass| {
                pass.stages()
                    .into_iter()
                    .map(move |stage| (pass.name().to_string(), base_dir.join(&stage.path)))
            })
            .collect()
    }

    /// Load every pass and its shader code into a pipeline.
    pub fn to_pipeline(&self, base_dir: &Path, settings: &SettingsConfig) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.pinned = self.pinned.iter().cloned().collect::<PinnedList>();
        for pass in &self.passes {
            let kind = match pass {
                PassDef::Shader {
                    vertex,
                    pixel,
                    geometry,
                    variables,
                    ..
                } => PipelineItemKind::ShaderPass(ShaderPass {
                    vertex: load_stage(base_dir, vertex, settings),
                    pixel: load_stage(base_dir, pixel, settings),
                    geometry: geometry
                        .as_ref()
                        .and_then(|g| load_stage(base_dir, g, settings)),
                    geometry_used: geometry.is_some(),
                    variables: VariableContainer::from_vars(variables.iter().cloned()),
                }),
                PassDef::Compute {
                    compute, variables, ..
                } => PipelineItemKind::ComputePass(ComputePass {
                    compute: load_stage(base_dir, compute, settings),
                    variables: VariableContainer::from_vars(variables.iter().cloned()),
                }),
            };
            pipeline.items.push(PipelineItem {
                name: pass.name().to_string(),
                kind,
            });
        }
        pipeline
    }

    /// Re-read the shader files of one pass into an existing pipeline item.
    pub fn reload_pass(
        &self,
        pipeline: &mut Pipeline,
        name: &str,
        base_dir: &Path,
        settings: &SettingsConfig,
    ) -> bool {
        let Some(def) = self.passes.iter().find(|p| p.name() == name) else {
            return false;
        };
        let Some(item) = pipeline.get_mut(name) else {
            return false;
        };
        match (def, &mut item.kind) {
            (
                PassDef::Shader {
                    vertex,
                    pixel,
                    geometry,
                    ..
                },
                PipelineItemKind::ShaderPass(pass),
            ) => {
                pass.vertex = load_stage(base_dir, vertex, settings);
                pass.pixel = load_stage(base_dir, pixel, settings);
                pass.geometry = geometry
                    .as_ref()
                    .and_then(|g| load_stage(base_dir, g, settings));
            }
            (PassDef::Compute { compute, .. }, PipelineItemKind::ComputePass(pass)) => {
                pass.compute = load_stage(base_dir, compute, settings);
            }
            _ => return false,
        }
        true
    }

    /// Copy reconciled variables and pins back into the file representation.
    pub fn update_from_pipeline(&mut self, pipeline: &Pipeline) {
        for pass in &mut self.passes {
            if let Some(item) = pipeline.get(pass.name()) {
                *pass.variables_mut() = item.variables().iter().cloned().collect();
            }
        }
        self.pinned = pipeline.pinned.iter().map(String::from).collect();
    }
}

fn spirv_words(bytes: &[u8]) -> Option<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

/// Read one stage from disk. Unreadable or unreflectable stages count as not compiled.
fn load_stage(base_dir: &Path, def: &StageDef, settings: &SettingsConfig) -> Option<CompiledStage> {
    let path = base_dir.join(&def.path);
    let language = def
        .language
        .clone()
        .unwrap_or_else(|| settings.language_for(&path));

    let code = if settings.is_spirv(&path) {
        let bytes = std::fs::read(&path)
            .map_err(|e| log::warn!("Failed to read {}: {e}", path.display()))
            .ok()?;
        let Some(words) = spirv_words(&bytes) else {
            log::warn!("{} is not a whole number of SPIR-V words", path.display());
            return None;
        };
        StageCode::Spirv(words)
    } else {
        let source = std::fs::read_to_string(&path)
            .map_err(|e| log::warn!("Failed to read {}: {e}", path.display()))
            .ok()?;
        match &language {
            ShaderLanguage::Glsl => StageCode::Glsl(source),
            ShaderLanguage::Wgsl => StageCode::Wgsl(source),
            ShaderLanguage::Hlsl | ShaderLanguage::Custom { .. } => {
                log::warn!(
                    "{} must be compiled to SPIR-V before its uniforms can be reflected",
                    path.display()
                );
                return None;
            }
        }
    };
    Some(CompiledStage::new(language, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::ValueType;

    const PROJECT: &str = r#"{
        "passes": [
            {
                "type": "Shader",
                "name": "Simple",
                "vertex": { "path": "simple.vert.wgsl" },
                "pixel": { "path": "simple.frag.wgsl" },
                "variables": [
                    { "name": "uOld", "value_type": "Float1", "value": { "type": "Float", "value": [0.5] } }
                ]
            },
            {
                "type": "Compute",
                "name": "Blur",
                "compute": { "path": "blur.hlsl" }
            }
        ],
        "pinned": ["uOld"]
    }"#;

    fn write_project(dir: &Path) -> PathBuf {
        let path = dir.join("project.json");
        std::fs::write(&path, PROJECT).unwrap();
        std::fs::write(dir.join("simple.vert.wgsl"), "// vertex").unwrap();
        std::fs::write(dir.join("simple.frag.wgsl"), "// pixel").unwrap();
        std::fs::write(dir.join("blur.hlsl"), "float4 main() : SV_Target { return 0; }").unwrap();
        path
    }

    #[test]
    fn load_parses_passes() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectFile::load(&write_project(dir.path())).unwrap();
        assert_eq!(project.passes.len(), 2);
        assert_eq!(project.passes[0].name(), "Simple");
        assert_eq!(project.passes[0].stages().len(), 2);
        assert_eq!(project.pinned, vec!["uOld"]);
    }

    #[test]
    fn load_reports_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ProjectFile::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(missing, ProjectError::Read { .. }));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert!(matches!(ProjectFile::load(&bad).unwrap_err(), ProjectError::Parse { .. }));
    }

    #[test]
    fn to_pipeline_loads_stages_and_variables() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectFile::load(&write_project(dir.path())).unwrap();
        let pipeline = project.to_pipeline(dir.path(), &SettingsConfig::default());

        let simple = pipeline.get("Simple").unwrap();
        match &simple.kind {
            PipelineItemKind::ShaderPass(pass) => {
                assert!(matches!(pass.vertex.as_ref().unwrap().code, StageCode::Wgsl(_)));
                assert_eq!(pass.pixel.as_ref().unwrap().language, ShaderLanguage::Wgsl);
                assert!(pass.geometry.is_none());
                assert!(!pass.geometry_used);
            }
            other => panic!("expected shader pass, got {other:?}"),
        }
        assert_eq!(simple.variables().get("uOld").unwrap().value_type, ValueType::Float1);
        assert!(pipeline.pinned.contains("uOld"));

        // HLSL source cannot be reflected without a SPIR-V compile
        match &pipeline.get("Blur").unwrap().kind {
            PipelineItemKind::ComputePass(pass) => assert!(pass.compute.is_none()),
            other => panic!("expected compute pass, got {other:?}"),
        }
    }

    #[test]
    fn spirv_stage_is_read_as_words() {
        let dir = tempfile::tempdir().unwrap();
        let words: [u32; 2] = [0x0723_0203, 0x0001_0000];
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        std::fs::write(dir.path().join("k.spv"), &bytes).unwrap();
        std::fs::write(dir.path().join("odd.spv"), [1u8, 2, 3]).unwrap();

        let settings = SettingsConfig::default();
        let def = StageDef {
            path: "k.spv".into(),
            language: None,
        };
        let stage = load_stage(dir.path(), &def, &settings).unwrap();
        match stage.code {
            StageCode::Spirv(w) => assert_eq!(w, words.to_vec()),
            other => panic!("expected SPIR-V, got {other:?}"),
        }

        let odd = StageDef {
            path: "odd.spv".into(),
            language: None,
        };
        assert!(load_stage(dir.path(), &odd, &settings).is_none());
    }

    #[test]
    fn missing_shader_file_is_not_compiled() {
        let dir = tempfile::tempdir().unwrap();
        let def = StageDef {
            path: "gone.frag".into(),
            language: None,
        };
        assert!(load_stage(dir.path(), &def, &SettingsConfig::default()).is_none());
    }

    #[test]
    fn update_from_pipeline_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_project(dir.path());
        let mut project = ProjectFile::load(&path).unwrap();
        let mut pipeline = project.to_pipeline(dir.path(), &SettingsConfig::default());

        if let Some(PipelineItem {
            kind: PipelineItemKind::ShaderPass(pass),
            ..
        }) = pipeline.get_mut("Simple")
        {
            pass.variables.remove("uOld");
            pass.variables
                .add_copy(ShaderVariable::new(ValueType::Float3, "uColor", None))
                .unwrap();
        }
        pipeline.pinned.remove("uOld");
        pipeline.pinned.add("uColor");

        project.update_from_pipeline(&pipeline);
        project.save(&path).unwrap();

        let reloaded = ProjectFile::load(&path).unwrap();
        let vars = VariableContainer::from_vars(match &reloaded.passes[0] {
            PassDef::Shader { variables, .. } => variables.clone(),
            PassDef::Compute { .. } => Vec::new(),
        });
        assert_eq!(vars.names(), vec!["uColor"]);
        assert_eq!(reloaded.pinned, vec!["uColor"]);
    }

    #[test]
    fn stage_paths_resolve_against_base() {
        let project: ProjectFile = serde_json::from_str(PROJECT).unwrap();
        let paths = project.stage_paths(Path::new("/proj"));
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], ("Simple".to_string(), PathBuf::from("/proj/simple.vert.wgsl")));
        assert_eq!(paths[2], ("Blur".to_string(), PathBuf::from("/proj/blur.hlsl")));
    }

    #[test]
    fn reload_pass_picks_up_new_source() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectFile::load(&write_project(dir.path())).unwrap();
        let settings = SettingsConfig::default();
        let mut pipeline = project.to_pipeline(dir.path(), &settings);

        std::fs::write(dir.path().join("simple.frag.wgsl"), "// edited").unwrap();
        assert!(project.reload_pass(&mut pipeline, "Simple", dir.path(), &settings));
        assert!(!project.reload_pass(&mut pipeline, "Nope", dir.path(), &settings));

        match &pipeline.get("Simple").unwrap().kind {
            PipelineItemKind::ShaderPass(pass) => match &pass.pixel.as_ref().unwrap().code {
                StageCode::Wgsl(src) => assert_eq!(src, "// edited"),
                other => panic!("expected WGSL, got {other:?}"),
            },
            other => panic!("expected shader pass, got {other:?}"),
        }
    }
}
