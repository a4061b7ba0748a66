use serde::{Deserialize, Serialize};

/// Value type of a bindable shader variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean1,
    Boolean2,
    Boolean3,
    Boolean4,
    Integer1,
    Integer2,
    Integer3,
    Integer4,
    Float1,
    Float2,
    Float3,
    Float4,
    Float2x2,
    Float3x3,
    Float4x4,
}

impl ValueType {
    pub const ALL: &[ValueType] = &[
        ValueType::Boolean1,
        ValueType::Boolean2,
        ValueType::Boolean3,
        ValueType::Boolean4,
        ValueType::Integer1,
        ValueType::Integer2,
        ValueType::Integer3,
        ValueType::Integer4,
        ValueType::Float1,
        ValueType::Float2,
        ValueType::Float3,
        ValueType::Float4,
        ValueType::Float2x2,
        ValueType::Float3x3,
        ValueType::Float4x4,
    ];

    /// Number of scalar components, matrices counted as rows * columns.
    pub fn component_count(&self) -> usize {
        match self {
            ValueType::Boolean1 | ValueType::Integer1 | ValueType::Float1 => 1,
            ValueType::Boolean2 | ValueType::Integer2 | ValueType::Float2 => 2,
            ValueType::Boolean3 | ValueType::Integer3 | ValueType::Float3 => 3,
            ValueType::Boolean4 | ValueType::Integer4 | ValueType::Float4 => 4,
            ValueType::Float2x2 => 4,
            ValueType::Float3x3 => 9,
            ValueType::Float4x4 => 16,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ValueType::Boolean1 => "bool",
            ValueType::Boolean2 => "bool2",
            ValueType::Boolean3 => "bool3",
            ValueType::Boolean4 => "bool4",
            ValueType::Integer1 => "int",
            ValueType::Integer2 => "int2",
            ValueType::Integer3 => "int3",
            ValueType::Integer4 => "int4",
            ValueType::Float1 => "float",
            ValueType::Float2 => "float2",
            ValueType::Float3 => "float3",
            ValueType::Float4 => "float4",
            ValueType::Float2x2 => "float2x2",
            ValueType::Float3x3 => "float3x3",
            ValueType::Float4x4 => "float4x4",
        }
    }
}

/// Engine-provided value source a variable can be bound to instead of a manual value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemSemantic {
    Time,
    TimeDelta,
    FrameIndex,
    ViewportSize,
    MousePosition,
    Mouse,
    View,
    Projection,
    ViewProjection,
    Orthographic,
    ViewOrthographic,
    GeometryTransform,
    IsPicked,
    CameraPosition,
    CameraPosition3,
    CameraDirection3,
    KeysWasd,
    PickPosition,
    IsSavingToFile,
}

impl SystemSemantic {
    pub const ALL: &[SystemSemantic] = &[
        SystemSemantic::Time,
        SystemSemantic::TimeDelta,
        SystemSemantic::FrameIndex,
        SystemSemantic::ViewportSize,
        SystemSemantic::MousePosition,
        SystemSemantic::Mouse,
        SystemSemantic::View,
        SystemSemantic::Projection,
        SystemSemantic::ViewProjection,
        SystemSemantic::Orthographic,
        SystemSemantic::ViewOrthographic,
        SystemSemantic::GeometryTransform,
        SystemSemantic::IsPicked,
        SystemSemantic::CameraPosition,
        SystemSemantic::CameraPosition3,
        SystemSemantic::CameraDirection3,
        SystemSemantic::KeysWasd,
        SystemSemantic::PickPosition,
        SystemSemantic::IsSavingToFile,
    ];

    /// The value type the engine writes for this semantic.
    pub fn value_type(&self) -> ValueType {
        match self {
            SystemSemantic::Time | SystemSemantic::TimeDelta => ValueType::Float1,
            SystemSemantic::FrameIndex => ValueType::Integer1,
            SystemSemantic::ViewportSize | SystemSemantic::MousePosition => ValueType::Float2,
            SystemSemantic::Mouse | SystemSemantic::CameraPosition => ValueType::Float4,
            SystemSemantic::View
            | SystemSemantic::Projection
            | SystemSemantic::ViewProjection
            | SystemSemantic::Orthographic
            | SystemSemantic::ViewOrthographic
            | SystemSemantic::GeometryTransform => ValueType::Float4x4,
            SystemSemantic::IsPicked | SystemSemantic::IsSavingToFile => ValueType::Boolean1,
            SystemSemantic::CameraPosition3
            | SystemSemantic::CameraDirection3
            | SystemSemantic::PickPosition => ValueType::Float3,
            SystemSemantic::KeysWasd => ValueType::Integer4,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SystemSemantic::Time => "Time",
            SystemSemantic::TimeDelta => "Time Delta",
            SystemSemantic::FrameIndex => "Frame Index",
            SystemSemantic::ViewportSize => "Viewport Size",
            SystemSemantic::MousePosition => "Mouse Position",
            SystemSemantic::Mouse => "Mouse",
            SystemSemantic::View => "View",
            SystemSemantic::Projection => "Projection",
            SystemSemantic::ViewProjection => "View Projection",
            SystemSemantic::Orthographic => "Orthographic",
            SystemSemantic::ViewOrthographic => "View Orthographic",
            SystemSemantic::GeometryTransform => "Geometry Transform",
            SystemSemantic::IsPicked => "Is Picked",
            SystemSemantic::CameraPosition => "Camera Position",
            SystemSemantic::CameraPosition3 => "Camera Position (3)",
            SystemSemantic::CameraDirection3 => "Camera Direction (3)",
            SystemSemantic::KeysWasd => "Keys WASD",
            SystemSemantic::PickPosition => "Pick Position",
            SystemSemantic::IsSavingToFile => "Is Saving To File",
        }
    }
}

/// Stored value of a variable. Matrices are column-major floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum VariableValue {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl VariableValue {
    /// Zeroed value for scalars and vectors, identity for matrices.
    pub fn default_for(ty: ValueType) -> Self {
        let n = ty.component_count();
        match ty {
            ValueType::Boolean1 | ValueType::Boolean2 | ValueType::Boolean3 | ValueType::Boolean4 => {
                VariableValue::Bool(vec![false; n])
            }
            ValueType::Integer1 | ValueType::Integer2 | ValueType::Integer3 | ValueType::Integer4 => {
                VariableValue::Int(vec![0; n])
            }
            ValueType::Float1 | ValueType::Float2 | ValueType::Float3 | ValueType::Float4 => {
                VariableValue::Float(vec![0.0; n])
            }
            ValueType::Float2x2 => VariableValue::Float(glam::Mat2::IDENTITY.to_cols_array().to_vec()),
            ValueType::Float3x3 => VariableValue::Float(glam::Mat3::IDENTITY.to_cols_array().to_vec()),
            ValueType::Float4x4 => VariableValue::Float(glam::Mat4::IDENTITY.to_cols_array().to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VariableValue::Bool(v) => v.len(),
            VariableValue::Int(v) => v.len(),
            VariableValue::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this value has the shape `ty` expects.
    pub fn fits(&self, ty: ValueType) -> bool {
        let kind_ok = match self {
            VariableValue::Bool(_) => matches!(
                ty,
                ValueType::Boolean1 | ValueType::Boolean2 | ValueType::Boolean3 | ValueType::Boolean4
            ),
            VariableValue::Int(_) => matches!(
                ty,
                ValueType::Integer1 | ValueType::Integer2 | ValueType::Integer3 | ValueType::Integer4
            ),
            VariableValue::Float(_) => !matches!(
                ty,
                ValueType::Boolean1
                    | ValueType::Boolean2
                    | ValueType::Boolean3
                    | ValueType::Boolean4
                    | ValueType::Integer1
                    | ValueType::Integer2
                    | ValueType::Integer3
                    | ValueType::Integer4
            ),
        };
        kind_ok && self.len() == ty.component_count()
    }
}

/// A user-facing named variable bound to one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderVariable {
    pub name: String,
    pub value_type: ValueType,
    /// `None` means the value is assigned manually.
    #[serde(default)]
    pub system: Option<SystemSemantic>,
    pub value: VariableValue,
}

impl ShaderVariable {
    pub fn new(value_type: ValueType, name: impl Into<String>, system: Option<SystemSemantic>) -> Self {
        Self {
            name: name.into(),
            value_type,
            system,
            value: VariableValue::default_for(value_type),
        }
    }

    pub fn is_manual(&self) -> bool {
        self.system.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_all_count() {
        assert_eq!(ValueType::ALL.len(), 15);
    }

    #[test]
    fn default_value_matches_component_count() {
        for ty in ValueType::ALL {
            let value = VariableValue::default_for(*ty);
            assert_eq!(value.len(), ty.component_count(), "{}", ty.display_name());
            assert!(value.fits(*ty));
        }
    }

    #[test]
    fn matrix_default_is_identity() {
        match VariableValue::default_for(ValueType::Float3x3) {
            VariableValue::Float(v) => {
                assert_eq!(v, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
            }
            other => panic!("expected Float, got {other:?}"),
        }
    }

    #[test]
    fn value_does_not_fit_other_kind() {
        let v = VariableValue::default_for(ValueType::Integer2);
        assert!(!v.fits(ValueType::Float2));
        assert!(!v.fits(ValueType::Integer3));
        assert!(v.fits(ValueType::Integer2));
    }

    #[test]
    fn semantic_value_types() {
        assert_eq!(SystemSemantic::Time.value_type(), ValueType::Float1);
        assert_eq!(SystemSemantic::View.value_type(), ValueType::Float4x4);
        assert_eq!(SystemSemantic::KeysWasd.value_type(), ValueType::Integer4);
        assert_eq!(SystemSemantic::CameraPosition3.value_type(), ValueType::Float3);
    }

    #[test]
    fn semantic_display_names_non_empty() {
        for s in SystemSemantic::ALL {
            assert!(!s.display_name().is_empty());
        }
    }

    #[test]
    fn new_variable_is_manual_with_default_value() {
        let v = ShaderVariable::new(ValueType::Float3, "uColor", None);
        assert!(v.is_manual());
        assert_eq!(v.value, VariableValue::Float(vec![0.0; 3]));
    }

    #[test]
    fn shader_variable_serde_roundtrip() {
        let v = ShaderVariable::new(ValueType::Float1, "iTime", Some(SystemSemantic::Time));
        let json = serde_json::to_string(&v).unwrap();
        let v2: ShaderVariable = serde_json::from_str(&json).unwrap();
        assert_eq!(v, v2);
    }
}
