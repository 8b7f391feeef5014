use glam::{Vec2, Vec3, Vec4};

use super::MaterialId;
use crate::error::SceneError;

/// Number of vec4 parameter slots a shader material or post-process can carry
pub const MAX_PARAMS: usize = 4;

/// WGSL source for a custom pass. The engine prepends its shared prelude
/// (globals, object block, vertex layout) before compiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderSource {
    pub label: &'static str,
    pub wgsl: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    /// Pack into one vec4 slot, unused lanes zeroed
    pub fn to_slot(self) -> [f32; 4] {
        match self {
            UniformValue::Float(x) => [x, 0.0, 0.0, 0.0],
            UniformValue::Vec2(v) => [v.x, v.y, 0.0, 0.0],
            UniformValue::Vec3(v) => [v.x, v.y, v.z, 0.0],
            UniformValue::Vec4(v) => v.to_array(),
        }
    }
}

/// Named parameters bound, in declaration order, to the `params` slots of a shader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderParams {
    entries: Vec<(String, UniformValue)>,
}

impl ShaderParams {
    pub fn declare(&mut self, owner: &str, name: &str, value: UniformValue) -> Result<(), SceneError> {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
            return Ok(());
        }
        if self.entries.len() == MAX_PARAMS {
            return Err(SceneError::TooManyParams(owner.to_string(), MAX_PARAMS));
        }
        self.entries.push((name.to_string(), value));
        Ok(())
    }

    pub fn set(&mut self, owner: &str, name: &str, value: UniformValue) -> Result<(), SceneError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| SceneError::UnknownParam {
                material: owner.to_string(),
                param: name.to_string(),
            })?;
        slot.1 = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut UniformValue)> {
        self.entries.iter_mut().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slots(&self) -> [[f32; 4]; MAX_PARAMS] {
        let mut slots = [[0.0; 4]; MAX_PARAMS];
        for (slot, (_, value)) in slots.iter_mut().zip(&self.entries) {
            *slot = value.to_slot();
        }
        slots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Straight alpha, `src * a + dst * (1 - a)`
    AlphaCombine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,
    pub alpha: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            emissive: Vec3::ZERO,
            alpha: 1.0,
        }
    }
}

impl StandardMaterial {
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            diffuse: color,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub shader: ShaderSource,
    pub params: ShaderParams,
    pub blend: BlendMode,
    pub back_face_culling: bool,
    /// Pulls the surface toward the camera in depth testing, like a z offset
    pub depth_bias: i32,
}

impl ShaderMaterial {
    pub fn new(shader: ShaderSource) -> Self {
        Self {
            shader,
            params: ShaderParams::default(),
            blend: BlendMode::Opaque,
            back_face_culling: true,
            depth_bias: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    Standard(StandardMaterial),
    Shader(ShaderMaterial),
}

#[derive(Debug, Clone)]
pub struct Material {
    pub(crate) id: MaterialId,
    pub name: String,
    pub kind: MaterialKind,
}

impl Material {
    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn is_shader(&self) -> bool {
        matches!(self.kind, MaterialKind::Shader(_))
    }

    pub fn blend(&self) -> BlendMode {
        match &self.kind {
            MaterialKind::Standard(standard) if standard.alpha < 1.0 => BlendMode::AlphaCombine,
            MaterialKind::Standard(_) => BlendMode::Opaque,
            MaterialKind::Shader(shader) => shader.blend,
        }
    }

    /// Declare a new parameter, or overwrite an existing one
    pub fn declare_param(&mut self, name: &str, value: UniformValue) -> Result<(), SceneError> {
        match &mut self.kind {
            MaterialKind::Shader(shader) => shader.params.declare(&self.name, name, value),
            MaterialKind::Standard(_) => Err(SceneError::NotAShaderMaterial(self.name.clone())),
        }
    }

    pub fn set_param(&mut self, name: &str, value: UniformValue) -> Result<(), SceneError> {
        match &mut self.kind {
            MaterialKind::Shader(shader) => shader.params.set(&self.name, name, value),
            MaterialKind::Standard(_) => Err(SceneError::NotAShaderMaterial(self.name.clone())),
        }
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<(), SceneError> {
        self.set_param(name, UniformValue::Float(value))
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<(), SceneError> {
        self.set_param(name, UniformValue::Vec3(value))
    }

    pub fn param(&self, name: &str) -> Option<UniformValue> {
        match &self.kind {
            MaterialKind::Shader(shader) => shader.params.get(name),
            MaterialKind::Standard(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SHADER: ShaderSource = ShaderSource {
        label: "test",
        wgsl: "",
    };

    fn shader_material() -> Material {
        Material {
            id: MaterialId(0),
            name: "glow".to_string(),
            kind: MaterialKind::Shader(ShaderMaterial::new(TEST_SHADER)),
        }
    }

    #[test]
    fn params_pack_in_declaration_order() {
        let mut material = shader_material();
        material.declare_param("color", UniformValue::Vec3(Vec3::new(0.2, 0.6, 1.0))).unwrap();
        material.declare_param("intensity", UniformValue::Float(1.2)).unwrap();

        let MaterialKind::Shader(shader) = &material.kind else {
            panic!("expected shader material");
        };
        let slots = shader.params.slots();
        assert_eq!(slots[0], [0.2, 0.6, 1.0, 0.0]);
        assert_eq!(slots[1], [1.2, 0.0, 0.0, 0.0]);
        assert_eq!(slots[2], [0.0; 4]);
    }

    #[test]
    fn setting_unknown_param_fails() {
        let mut material = shader_material();
        let err = material.set_float("missing", 1.0).unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownParam {
                material: "glow".into(),
                param: "missing".into()
            }
        );
    }

    #[test]
    fn slot_limit_is_enforced() {
        let mut material = shader_material();
        for i in 0..MAX_PARAMS {
            material.declare_param(&format!("p{i}"), UniformValue::Float(i as f32)).unwrap();
        }
        assert!(matches!(
            material.declare_param("overflow", UniformValue::Float(0.0)),
            Err(SceneError::TooManyParams(_, MAX_PARAMS))
        ));
    }

    #[test]
    fn standard_materials_reject_params() {
        let mut material = Material {
            id: MaterialId(1),
            name: "plain".to_string(),
            kind: MaterialKind::Standard(StandardMaterial::default()),
        };
        assert!(matches!(
            material.set_float("x", 1.0),
            Err(SceneError::NotAShaderMaterial(_))
        ));
        assert_eq!(material.blend(), BlendMode::Opaque);
    }
}
