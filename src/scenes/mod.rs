//! Scene catalogue: descriptors plus the factory that builds each scene.

mod complex;
mod default;
mod night_drive;
mod shield;
mod sphere;

use std::fmt;
use std::rc::Rc;

use crate::error::{RegistryError, SceneError};
use crate::scene::Scene;

pub use complex::create_complex_scene;
pub use default::create_default_scene;
pub use night_drive::create_night_drive_scene;
pub use shield::{create_shield_scene, ShieldSettings, SHIELD_COLOR, SHIELD_HEALTH, SHIELD_INTENSITY};
pub use sphere::create_sphere_scene;

/// Scene used when a requested id is unknown
pub const DEFAULT_SCENE_ID: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneCategory {
    Basic,
    ShaderMaterial,
    PostProcess,
}

impl SceneCategory {
    pub const ALL: [SceneCategory; 3] = [
        SceneCategory::Basic,
        SceneCategory::ShaderMaterial,
        SceneCategory::PostProcess,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SceneCategory::Basic => "Basic",
            SceneCategory::ShaderMaterial => "Shader Material",
            SceneCategory::PostProcess => "Post Process",
        }
    }
}

impl fmt::Display for SceneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub category: SceneCategory,
}

impl SceneDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        category: SceneCategory,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: description.into(),
            category,
        }
    }
}

/// Populates a freshly cleared scene.
///
/// Factories only touch the scene they are handed. Anything that must keep
/// running (animations, uniform updates) is registered on that scene with
/// `on_before_render` and is dropped when the scene is cleared.
pub trait SceneFactory {
    fn populate(&self, scene: &mut Scene) -> Result<(), SceneError>;
}

impl<F> SceneFactory for F
where
    F: Fn(&mut Scene) -> Result<(), SceneError>,
{
    fn populate(&self, scene: &mut Scene) -> Result<(), SceneError> {
        self(scene)
    }
}

struct Entry {
    descriptor: SceneDescriptor,
    factory: Rc<dyn SceneFactory>,
}

/// Read-only, insertion-ordered catalogue. Built once at start-up and shared
/// as `Rc<SceneRegistry>`.
pub struct SceneRegistry {
    entries: Vec<Entry>,
    default_index: usize,
}

impl SceneRegistry {
    pub fn builder(default_id: impl Into<String>) -> SceneRegistryBuilder {
        SceneRegistryBuilder {
            default_id: default_id.into(),
            entries: Vec::new(),
        }
    }

    /// The five bundled demo scenes
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::builder(DEFAULT_SCENE_ID)
            .scene(
                SceneDescriptor::new(
                    DEFAULT_SCENE_ID,
                    "Default Scene",
                    "A simple rotating box on a flat surface.",
                    SceneCategory::Basic,
                ),
                create_default_scene,
            )
            .scene(
                SceneDescriptor::new(
                    "sphere",
                    "Sphere Scene",
                    "A rotating sphere wearing an animated neon grid shader.",
                    SceneCategory::ShaderMaterial,
                ),
                create_sphere_scene,
            )
            .scene(
                SceneDescriptor::new(
                    "complex",
                    "Complex Scene",
                    "Multiple animated cubes, ground, and a moving point light.",
                    SceneCategory::Basic,
                ),
                create_complex_scene,
            )
            .scene(
                SceneDescriptor::new(
                    "shield",
                    "Energy Shield",
                    "A translucent energy shield with fresnel rim, hex grid and damage effects.",
                    SceneCategory::ShaderMaterial,
                ),
                create_shield_scene,
            )
            .scene(
                SceneDescriptor::new(
                    "night-drive",
                    "Night Drive",
                    "Raymarched neon waves drawn as a full-screen post-process. Follows the pointer.",
                    SceneCategory::PostProcess,
                ),
                create_night_drive_scene,
            )
            .build()
    }

    pub fn list(&self) -> impl ExactSizeIterator<Item = &SceneDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never empty; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_id(&self) -> &str {
        &self.entries[self.default_index].descriptor.id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.descriptor.id == id)
    }

    pub fn descriptor(&self, id: &str) -> Option<&SceneDescriptor> {
        self.entries.iter().find(|e| e.descriptor.id == id).map(|e| &e.descriptor)
    }

    /// Descriptor for `id`, or the default one when `id` is unknown
    pub fn resolve(&self, id: &str) -> &SceneDescriptor {
        &self.entry_or_default(id).descriptor
    }

    /// Factory for `id`, or the default scene's factory when `id` is unknown
    pub fn factory_for(&self, id: &str) -> Rc<dyn SceneFactory> {
        Rc::clone(&self.entry_or_default(id).factory)
    }

    fn entry_or_default(&self, id: &str) -> &Entry {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .unwrap_or(&self.entries[self.default_index])
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("scenes", &self.list().map(|d| d.id.as_str()).collect::<Vec<_>>())
            .field("default", &self.default_id())
            .finish()
    }
}

pub struct SceneRegistryBuilder {
    default_id: String,
    entries: Vec<Entry>,
}

impl SceneRegistryBuilder {
    pub fn scene<F>(mut self, descriptor: SceneDescriptor, factory: F) -> Self
    where
        F: SceneFactory + 'static,
    {
        self.entries.push(Entry {
            descriptor,
            factory: Rc::new(factory),
        });
        self
    }

    pub fn build(self) -> Result<SceneRegistry, RegistryError> {
        if self.entries.is_empty() {
            return Err(RegistryError::Empty);
        }

        for (i, entry) in self.entries.iter().enumerate() {
            let id = &entry.descriptor.id;
            if self.entries[..i].iter().any(|e| &e.descriptor.id == id) {
                return Err(RegistryError::DuplicateId(id.clone()));
            }
        }

        let default_index = self
            .entries
            .iter()
            .position(|e| e.descriptor.id == self.default_id)
            .ok_or_else(|| RegistryError::MissingDefault(self.default_id.clone()))?;

        log::debug!(
            "scene registry built with {} scene(s), default '{}'",
            self.entries.len(),
            self.default_id
        );

        Ok(SceneRegistry {
            entries: self.entries,
            default_index,
        })
    }
}
