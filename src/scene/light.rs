use glam::Vec3;

use super::LightId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Sky/ground gradient lighting; `direction` points at the sky
    Hemispheric { direction: Vec3, ground_color: Vec3 },
    Point { position: Vec3 },
    /// `direction` is the direction the light travels
    Directional { direction: Vec3 },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub(crate) id: LightId,
    pub name: String,
    pub kind: LightKind,
    pub diffuse: Vec3,
    pub intensity: f32,
    /// Environment lights survive scene swaps and are only dropped on unmount
    pub persistent: bool,
}

impl Light {
    pub(crate) fn new(id: LightId, name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            diffuse: Vec3::ONE,
            intensity: 1.0,
            persistent: false,
        }
    }

    pub fn id(&self) -> LightId {
        self.id
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            LightKind::Hemispheric { .. } => "hemispheric",
            LightKind::Point { .. } => "point",
            LightKind::Directional { .. } => "directional",
        }
    }
}
