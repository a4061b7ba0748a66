//! Pipeline items and the queue of items waiting to be re-reflected.
//!
//! After a recompile the editor marks a pass dirty; the queue is drained once per
//! frame on the UI thread, one item at a time.

use serde::{Deserialize, Serialize};

use crate::pinned::PinnedList;
use crate::reconcile::UniformReconciler;
use crate::reflect::{ShaderReflector, ShaderStage, StageCode};
use crate::variable::VariableContainer;

/// Source language a stage was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderLanguage {
    Glsl,
    Hlsl,
    Wgsl,
    /// Language provided by a plugin, which may not support automatic uniforms.
    Custom { name: String, auto_uniforms: bool },
}

impl ShaderLanguage {
    pub fn supports_auto_uniforms(&self) -> bool {
        match self {
            ShaderLanguage::Custom { auto_uniforms, .. } => *auto_uniforms,
            _ => true,
        }
    }
}

/// A successfully compiled stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub language: ShaderLanguage,
    pub code: StageCode,
}

impl CompiledStage {
    pub fn new(language: ShaderLanguage, code: StageCode) -> Self {
        Self { language, code }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShaderPass {
    pub vertex: Option<CompiledStage>,
    pub pixel: Option<CompiledStage>,
    pub geometry: Option<CompiledStage>,
    pub geometry_used: bool,
    pub variables: VariableContainer,
}

#[derive(Debug, Clone, Default)]
pub struct ComputePass {
    pub compute: Option<CompiledStage>,
    pub variables: VariableContainer,
}

#[derive(Debug, Clone)]
pub enum PipelineItemKind {
    ShaderPass(ShaderPass),
    ComputePass(ComputePass),
}

#[derive(Debug, Clone)]
pub struct PipelineItem {
    pub name: String,
    pub kind: PipelineItemKind,
}

impl PipelineItem {
    pub fn variables(&self) -> &VariableContainer {
        match &self.kind {
            PipelineItemKind::ShaderPass(pass) => &pass.variables,
            PipelineItemKind::ComputePass(pass) => &pass.variables,
        }
    }
}

/// What happened to one item while draining the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemReport {
    pub item: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Whether the prune step ran for this item.
    pub pruned: bool,
}

#[derive(Debug, Default)]
pub struct Pipeline {
    pub items: Vec<PipelineItem>,
    pub pinned: PinnedList,
    queue: Vec<String>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PipelineItem> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PipelineItem> {
        self.items.iter_mut().find(|i| i.name == name)
    }

    /// Queue an item for re-reflection.
    pub fn mark_dirty(&mut self, name: &str) {
        self.queue.push(name.to_string());
    }

    pub fn pending(&self) -> &[String] {
        &self.queue
    }

    /// Re-reflect and reconcile every queued item, then clear the queue.
    ///
    /// An item queued several times is processed once, at its last position.
    pub fn process_reflection_queue(
        &mut self,
        reflector: &dyn ShaderReflector,
        reconciler: &UniformReconciler,
    ) -> Vec<ItemReport> {
        let queue = std::mem::take(&mut self.queue);
        let mut reports = Vec::new();

        for (i, name) in queue.iter().enumerate() {
            if queue[i + 1..].contains(name) {
                continue;
            }
            let Some(item) = self.items.iter_mut().find(|it| &it.name == name) else {
                log::warn!("Queued pipeline item '{name}' no longer exists");
                continue;
            };
            let report = match &mut item.kind {
                PipelineItemKind::ShaderPass(pass) => {
                    reconcile_shader_pass(name, pass, &mut self.pinned, reflector, reconciler)
                }
                PipelineItemKind::ComputePass(pass) => {
                    reconcile_compute_pass(name, pass, &mut self.pinned, reflector, reconciler)
                }
            };
            log::info!(
                "Reconciled '{}': {} added, {} removed",
                report.item,
                report.added.len(),
                report.removed.len()
            );
            reports.push(report);
        }
        reports
    }
}

/// Outcome of reflecting one stage and feeding it to the reconciler.
struct StageResult {
    reflected: bool,
    supported: bool,
}

fn reconcile_stage(
    item: &str,
    stage: ShaderStage,
    compiled: Option<&CompiledStage>,
    vars: &mut VariableContainer,
    pinned: &mut PinnedList,
    reflector: &dyn ShaderReflector,
    reconciler: &UniformReconciler,
    seen: &mut Vec<String>,
    added: &mut Vec<String>,
) -> StageResult {
    let Some(compiled) = compiled.filter(|c| !c.code.is_empty()) else {
        return StageResult {
            reflected: false,
            supported: true,
        };
    };
    let supported = compiled.language.supports_auto_uniforms();

    let reflection = match reflector.reflect(stage, &compiled.code) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("Failed to reflect {stage:?} stage of '{item}': {e}");
            return StageResult {
                reflected: false,
                supported,
            };
        }
    };

    if reconciler.policy.auto_uniforms && supported {
        added.extend(reconciler.add_discovered(vars, pinned, &reflection, seen));
    }
    StageResult {
        reflected: true,
        supported,
    }
}

fn reconcile_shader_pass(
    name: &str,
    pass: &mut ShaderPass,
    pinned: &mut PinnedList,
    reflector: &dyn ShaderReflector,
    reconciler: &UniformReconciler,
) -> ItemReport {
    let mut report = ItemReport {
        item: name.to_string(),
        ..Default::default()
    };
    let mut seen = Vec::new();

    let stages = [
        (ShaderStage::Pixel, pass.pixel.as_ref()),
        (ShaderStage::Vertex, pass.vertex.as_ref()),
        (ShaderStage::Geometry, pass.geometry.as_ref()),
    ];
    let mut results = Vec::with_capacity(stages.len());
    for (stage, compiled) in stages {
        results.push(reconcile_stage(
            name,
            stage,
            compiled,
            &mut pass.variables,
            pinned,
            reflector,
            reconciler,
            &mut seen,
            &mut report.added,
        ));
    }
    let [pixel, vertex, geometry] = [&results[0], &results[1], &results[2]];

    let all_supported = results.iter().all(|r| r.supported);
    let all_stages = vertex.reflected && pixel.reflected && (!pass.geometry_used || geometry.reflected);
    let policy = reconciler.policy;

    if policy.auto_uniforms && policy.delete_unused && all_supported && all_stages {
        report.removed = reconciler.prune_unused(&mut pass.variables, pinned, &seen);
        report.pruned = true;
    }
    report
}

fn reconcile_compute_pass(
    name: &str,
    pass: &mut ComputePass,
    pinned: &mut PinnedList,
    reflector: &dyn ShaderReflector,
    reconciler: &UniformReconciler,
) -> ItemReport {
    let mut report = ItemReport {
        item: name.to_string(),
        ..Default::default()
    };
    let mut seen = Vec::new();

    let result = reconcile_stage(
        name,
        ShaderStage::Compute,
        pass.compute.as_ref(),
        &mut pass.variables,
        pinned,
        reflector,
        reconciler,
        &mut seen,
        &mut report.added,
    );

    let policy = reconciler.policy;
    if policy.auto_uniforms && policy.delete_unused && result.supported && result.reflected {
        report.removed = reconciler.prune_unused(&mut pass.variables, pinned, &seen);
        report.pruned = true;
    }
    report
}
