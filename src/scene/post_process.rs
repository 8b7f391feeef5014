use super::material::{BlendMode, ShaderParams, ShaderSource, UniformValue};
use super::PostProcessId;
use crate::error::SceneError;

/// Full-viewport pass drawn after the scene.
///
/// The engine feeds it the same globals as materials (time, resolution,
/// pointer, camera) every frame; `params` carry anything scene-specific.
#[derive(Debug, Clone)]
pub struct PostProcess {
    pub(crate) id: PostProcessId,
    pub name: String,
    pub shader: ShaderSource,
    pub params: ShaderParams,
    pub blend: BlendMode,
    pub enabled: bool,
}

impl PostProcess {
    pub(crate) fn new(id: PostProcessId, name: impl Into<String>, shader: ShaderSource) -> Self {
        Self {
            id,
            name: name.into(),
            shader,
            params: ShaderParams::default(),
            blend: BlendMode::Opaque,
            enabled: true,
        }
    }

    pub fn id(&self) -> PostProcessId {
        self.id
    }

    pub fn declare_param(&mut self, name: &str, value: UniformValue) -> Result<(), SceneError> {
        self.params.declare(&self.name, name, value)
    }

    pub fn set_param(&mut self, name: &str, value: UniformValue) -> Result<(), SceneError> {
        self.params.set(&self.name, name, value)
    }
}
