use naga::{AddressSpace, Handle, Module, ScalarKind, Type, TypeInner};
use rustc_hash::FxHashMap;

use crate::error::ReflectError;

use super::glsl::prepare_glsl;
use super::{ReflectedUniform, Reflection, ShaderReflector, ShaderStage, StageCode, UniformKind};

/// Reflects uniforms by parsing stage code with naga's front-ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct NagaReflector;

impl NagaReflector {
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, stage: ShaderStage, code: &StageCode) -> Result<Module, ReflectError> {
        match code {
            StageCode::Spirv(words) => {
                let options = naga::front::spv::Options::default();
                naga::front::spv::parse_u8_slice(bytemuck::cast_slice(words.as_slice()), &options)
                    .map_err(|e| ReflectError::SpirvParse(e.to_string()))
            }
            StageCode::Wgsl(source) => naga::front::wgsl::parse_str(source)
                .map_err(|e| ReflectError::WgslParse(e.emit_to_string(source))),
            StageCode::Glsl(source) => {
                let naga_stage = match stage {
                    ShaderStage::Vertex => naga::ShaderStage::Vertex,
                    ShaderStage::Pixel => naga::ShaderStage::Fragment,
                    ShaderStage::Compute => naga::ShaderStage::Compute,
                    ShaderStage::Geometry => {
                        return Err(ReflectError::UnsupportedStage {
                            stage,
                            language: "GLSL",
                        });
                    }
                };
                let prepared = prepare_glsl(source);
                log::trace!("Prepared GLSL for reflection:\n{prepared}");
                let mut frontend = naga::front::glsl::Frontend::default();
                let options = naga::front::glsl::Options::from(naga_stage);
                frontend.parse(&options, &prepared).map_err(|errors| {
                    let messages: Vec<String> = errors
                        .errors
                        .iter()
                        .map(|e| format!("  {:?}", e.kind))
                        .collect();
                    ReflectError::GlslParse(messages.join("\n"))
                })
            }
        }
    }
}

impl ShaderReflector for NagaReflector {
    fn reflect(&self, stage: ShaderStage, code: &StageCode) -> Result<Reflection, ReflectError> {
        let module = self.parse(stage, code)?;
        Ok(reflect_module(&module))
    }
}

/// Collect the uniform-space globals of a parsed module.
///
/// OpenGL-target SPIR-V declares loose uniforms as `UniformConstant`, which naga
/// maps to the handle space, so non-opaque handle globals are collected too.
pub fn reflect_module(module: &Module) -> Reflection {
    let mut user_types: FxHashMap<String, Vec<ReflectedUniform>> = FxHashMap::default();
    for (handle, ty) in module.types.iter() {
        if let TypeInner::Struct { members, .. } = &ty.inner {
            let reflected = members
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let name = m.name.clone().unwrap_or_else(|| format!("member{i}"));
                    uniform_from_type(name, module, m.ty)
                })
                .collect();
            user_types.insert(struct_type_name(handle, ty), reflected);
        }
    }

    let mut uniforms = Vec::new();
    for (_, global) in module.global_variables.iter() {
        let reflectable = match global.space {
            AddressSpace::Uniform => true,
            AddressSpace::Handle => is_value_type(&module.types[global.ty].inner),
            _ => false,
        };
        if !reflectable {
            continue;
        }
        match global.name.as_deref() {
            Some(name) if !name.is_empty() => {
                uniforms.push(uniform_from_type(name.to_string(), module, global.ty));
            }
            // Anonymous blocks expose their members directly.
            _ => {
                let ty = &module.types[global.ty];
                match user_types.get(&struct_type_name(global.ty, ty)) {
                    Some(members) => uniforms.extend(members.iter().cloned()),
                    None => log::debug!("Skipping unnamed non-block uniform"),
                }
            }
        }
    }

    Reflection {
        uniforms,
        user_types,
    }
}

fn struct_type_name(handle: Handle<Type>, ty: &Type) -> String {
    ty.name
        .clone()
        .unwrap_or_else(|| format!("struct#{}", handle.index()))
}

/// Plain data, as opposed to images, samplers and other opaque handles.
fn is_value_type(inner: &TypeInner) -> bool {
    matches!(
        inner,
        TypeInner::Scalar(_)
            | TypeInner::Vector { .. }
            | TypeInner::Matrix { .. }
            | TypeInner::Struct { .. }
            | TypeInner::Array { .. }
    )
}

fn scalar_kind(kind: ScalarKind) -> UniformKind {
    match kind {
        ScalarKind::Bool => UniformKind::Bool,
        ScalarKind::Sint | ScalarKind::Uint | ScalarKind::AbstractInt => UniformKind::Int,
        ScalarKind::Float | ScalarKind::AbstractFloat => UniformKind::Float,
    }
}

fn uniform_from_type(name: String, module: &Module, ty: Handle<Type>) -> ReflectedUniform {
    let ty_def = &module.types[ty];
    match &ty_def.inner {
        TypeInner::Scalar(scalar) => ReflectedUniform::scalar(name, scalar_kind(scalar.kind)),
        TypeInner::Vector { size, scalar } => {
            ReflectedUniform::vector(name, scalar_kind(scalar.kind), *size as u8)
        }
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } if columns == rows => ReflectedUniform::matrix(name, scalar_kind(scalar.kind), *columns as u8),
        TypeInner::Struct { .. } => ReflectedUniform::structure(name, struct_type_name(ty, ty_def)),
        _ => ReflectedUniform::other(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS_WGSL: &str = r#"
struct Light {
    color: vec3<f32>,
    intensity: f32,
}

struct Params {
    time: f32,
    resolution: vec2<f32>,
    light: Light,
    view: mat4x4<f32>,
    tiles: vec2<i32>,
    skew: mat2x3<f32>,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<uniform> iTime: f32;
@group(0) @binding(2) var<uniform> uColor: vec3<f32>;

@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(uColor * params.time * iTime, 1.0);
}
"#;

    fn reflect_params() -> Reflection {
        NagaReflector::new()
            .reflect(ShaderStage::Pixel, &StageCode::Wgsl(PARAMS_WGSL.into()))
            .unwrap()
    }

    #[test]
    fn top_level_uniforms_in_declaration_order() {
        let r = reflect_params();
        let names: Vec<&str> = r.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["params", "iTime", "uColor"]);
        assert_eq!(r.uniforms[0].kind, UniformKind::Struct);
        assert_eq!(r.uniforms[0].type_name.as_deref(), Some("Params"));
        assert_eq!(r.uniforms[1].kind, UniformKind::Float);
        assert_eq!(r.uniforms[2], ReflectedUniform::vector("uColor", UniformKind::Float, 3));
    }

    #[test]
    fn struct_members_recorded_in_side_table() {
        let r = reflect_params();
        let params = r.members_of("Params").unwrap();
        assert_eq!(params.len(), 6);
        assert_eq!(params[1], ReflectedUniform::vector("resolution", UniformKind::Float, 2));
        assert_eq!(params[2], ReflectedUniform::structure("light", "Light"));
        assert_eq!(params[3], ReflectedUniform::matrix("view", UniformKind::Float, 4));
        assert_eq!(params[4], ReflectedUniform::vector("tiles", UniformKind::Int, 2));

        let light = r.members_of("Light").unwrap();
        assert_eq!(light[0], ReflectedUniform::vector("color", UniformKind::Float, 3));
        assert_eq!(light[1], ReflectedUniform::scalar("intensity", UniformKind::Float));
    }

    #[test]
    fn non_square_matrix_is_other() {
        let r = reflect_params();
        let params = r.members_of("Params").unwrap();
        assert_eq!(params[5].kind, UniformKind::Other);
    }

    #[test]
    fn non_uniform_globals_are_ignored() {
        let src = r#"
@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;
var<private> scratch: f32;

@fragment
fn main() -> @location(0) vec4<f32> {
    return textureSample(tex, samp, vec2<f32>(scratch));
}
"#;
        let r = NagaReflector::new()
            .reflect(ShaderStage::Pixel, &StageCode::Wgsl(src.into()))
            .unwrap();
        assert!(r.uniforms.is_empty());
    }

    #[test]
    fn wgsl_syntax_error_is_reported() {
        let err = NagaReflector::new()
            .reflect(ShaderStage::Pixel, &StageCode::Wgsl("fn broken( {".into()))
            .unwrap_err();
        assert!(matches!(err, ReflectError::WgslParse(_)));
    }

    #[test]
    fn glsl_geometry_stage_is_unsupported() {
        let err = NagaReflector::new()
            .reflect(ShaderStage::Geometry, &StageCode::Glsl("void main() {}".into()))
            .unwrap_err();
        assert!(matches!(err, ReflectError::UnsupportedStage { .. }));
    }

    #[test]
    fn glsl_loose_uniforms_under_old_version() {
        let src = r#"#version 330 core
uniform float iTime;
uniform vec3 uColor, uTint;
uniform mat4 uView;
uniform int uSteps = 4;
out vec4 fragColor;

void main() {
    fragColor = uView * vec4(uColor * uTint * iTime, float(uSteps));
}
"#;
        let r = NagaReflector::new()
            .reflect(ShaderStage::Pixel, &StageCode::Glsl(src.into()))
            .unwrap();
        assert_eq!(
            r.uniforms,
            vec![
                ReflectedUniform::scalar("iTime", UniformKind::Float),
                ReflectedUniform::vector("uColor", UniformKind::Float, 3),
                ReflectedUniform::vector("uTint", UniformKind::Float, 3),
                ReflectedUniform::matrix("uView", UniformKind::Float, 4),
                ReflectedUniform::scalar("uSteps", UniformKind::Int),
            ]
        );
    }

    const BLOCKS_GLSL: &str = r#"#version 450
struct Light {
    vec3 color;
    float intensity;
};

layout(std140) uniform Globals {
    float iTime;
    vec2 iResolution;
};

layout(std140, binding = 3) uniform LightBlock {
    Light key;
    float ambient;
} lights;

uniform Light uFill;

layout(location = 0) out vec4 fragColor;

void main() {
    vec3 c = lights.key.color * lights.key.intensity * iTime + uFill.color;
    fragColor = vec4(c / iResolution.x, lights.ambient);
}
"#;

    fn reflect_blocks() -> Reflection {
        NagaReflector::new()
            .reflect(ShaderStage::Pixel, &StageCode::Glsl(BLOCKS_GLSL.into()))
            .unwrap()
    }

    #[test]
    fn glsl_anonymous_block_members_are_top_level() {
        let r = reflect_blocks();
        let names: Vec<&str> = r.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["iTime", "iResolution", "lights", "uFill"]);
        assert_eq!(r.uniforms[0], ReflectedUniform::scalar("iTime", UniformKind::Float));
        assert_eq!(
            r.uniforms[1],
            ReflectedUniform::vector("iResolution", UniformKind::Float, 2)
        );
    }

    #[test]
    fn glsl_named_block_is_a_struct() {
        let r = reflect_blocks();
        let lights = &r.uniforms[2];
        assert!(lights.is_struct());
        assert_eq!(lights.type_name.as_deref(), Some("LightBlock"));

        let members = r.members_of("LightBlock").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "key");
        assert!(members[0].is_struct());
        assert_eq!(members[1], ReflectedUniform::scalar("ambient", UniformKind::Float));

        let fill = &r.uniforms[3];
        let light = r.members_of(fill.type_name.as_deref().unwrap()).unwrap();
        assert_eq!(light[0], ReflectedUniform::vector("color", UniformKind::Float, 3));
        assert_eq!(light[1], ReflectedUniform::scalar("intensity", UniformKind::Float));
    }

    #[test]
    fn spirv_round_trip() {
        let src = r#"
struct Params {
    time: f32,
    color: vec3<f32>,
    view: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> params: Params;

@fragment
fn main() -> @location(0) vec4<f32> {
    return params.view * vec4<f32>(params.color * params.time, 1.0);
}
"#;
        let module = naga::front::wgsl::parse_str(src).unwrap();
        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap();
        let mut options = naga::back::spv::Options::default();
        options.flags |= naga::back::spv::WriterFlags::DEBUG;
        let words = naga::back::spv::write_vec(&module, &info, &options, None).unwrap();

        let r = NagaReflector::new()
            .reflect(ShaderStage::Pixel, &StageCode::Spirv(words))
            .unwrap();
        let params = r.uniforms.iter().find(|u| u.name == "params").unwrap();
        assert!(params.is_struct());
        let members = r.members_of(params.type_name.as_deref().unwrap()).unwrap();
        assert_eq!(
            members,
            [
                ReflectedUniform::scalar("time", UniformKind::Float),
                ReflectedUniform::vector("color", UniformKind::Float, 3),
                ReflectedUniform::matrix("view", UniformKind::Float, 4),
            ]
        );
    }

    #[test]
    fn handle_space_values_are_reflected() {
        let src = r#"
@group(0) @binding(0) var<uniform> iTime: f32;
@group(0) @binding(1) var tex: texture_2d<f32>;

@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(f32(textureDimensions(tex).x) * iTime);
}
"#;
        let mut module = naga::front::wgsl::parse_str(src).unwrap();
        // Same shape the SPIR-V front-end produces for UniformConstant values.
        let handles: Vec<_> = module
            .global_variables
            .iter()
            .filter(|(_, g)| g.space == AddressSpace::Uniform)
            .map(|(h, _)| h)
            .collect();
        for h in handles {
            module.global_variables[h].space = AddressSpace::Handle;
        }

        let r = reflect_module(&module);
        assert_eq!(r.uniforms, vec![ReflectedUniform::scalar("iTime", UniformKind::Float)]);
    }

    #[test]
    fn garbage_spirv_is_reported() {
        let err = NagaReflector::new()
            .reflect(ShaderStage::Compute, &StageCode::Spirv(vec![0xdead_beef, 1, 2, 3, 4]))
            .unwrap_err();
        assert!(matches!(err, ReflectError::SpirvParse(_)));
    }
}
