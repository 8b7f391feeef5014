//! Render-scene handle populated by scene factories and drawn by engines.
//!
//! Objects live in creation-ordered lists keyed by typed ids. Ids come from
//! one per-scene counter and are never reused, so an id held across a swap
//! can never alias a newer object.

pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod post_process;

use std::fmt;

use glam::Vec2;

use crate::error::SceneError;
use crate::frame::FrameInfo;

use camera::{Camera, CameraKind};
use light::{Light, LightKind};
use material::{Material, MaterialKind, ShaderMaterial, StandardMaterial};
use mesh::{Geometry, Mesh};
use post_process::PostProcess;

macro_rules! define_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) u64);

            impl $name {
                pub fn raw(self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

define_id!(MeshId, MaterialId, LightId, CameraId, PostProcessId, ObserverId);

/// Per-frame callback registered by a factory, typically an animation
pub type Observer = Box<dyn FnMut(&mut Scene, &FrameInfo)>;

/// egui window a factory registers for the scene's own controls
pub type ControlPanel = Box<dyn FnMut(&egui::Context, &mut Scene)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Scene swap: persistent lights and cameras stay
    KeepEnvironment,
    /// Unmount: nothing stays
    Everything,
}

/// One entry of the disposal log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposed {
    Observer(ObserverId),
    PostProcess(PostProcessId),
    Mesh(MeshId),
    Material(MaterialId),
    Light(LightId),
    Camera(CameraId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneCounts {
    pub meshes: usize,
    pub materials: usize,
    pub lights: usize,
    pub cameras: usize,
    pub post_processes: usize,
    pub observers: usize,
}

pub struct Scene {
    next_id: u64,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,
    post_processes: Vec<PostProcess>,
    observers: Vec<(ObserverId, Observer)>,
    controls: Option<ControlPanel>,
    active_camera: Option<CameraId>,
    disposed: Vec<Disposed>,
    resolution: Vec2,
    pointer: Vec2,
    time: f32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            meshes: Vec::new(),
            materials: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            post_processes: Vec::new(),
            observers: Vec::new(),
            controls: None,
            active_camera: None,
            disposed: Vec::new(),
            resolution: Vec2::ONE,
            pointer: Vec2::splat(-1.0),
            time: 0.0,
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ======================================================================
    // Meshes
    // ======================================================================

    pub fn add_mesh(&mut self, name: impl Into<String>, geometry: Geometry) -> &mut Mesh {
        let id = MeshId(self.allocate());
        let index = self.meshes.len();
        self.meshes.push(Mesh::new(id, name, geometry));
        log::trace!("created mesh {:?} '{}'", id, self.meshes[index].name);
        &mut self.meshes[index]
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.id == id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.id == id)
    }

    pub fn mesh_by_name(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter()
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = &mut Mesh> {
        self.meshes.iter_mut()
    }

    /// Bind a material that must already exist in this scene
    pub fn assign_material(&mut self, mesh: MeshId, material: MaterialId) -> Result<(), SceneError> {
        if self.material(material).is_none() {
            return Err(SceneError::MissingMaterial(material));
        }
        let mesh = self
            .mesh_mut(mesh)
            .ok_or_else(|| SceneError::Invalid(format!("mesh {:?} does not exist in this scene", mesh)))?;
        mesh.material = Some(material);
        Ok(())
    }

    // ======================================================================
    // Materials
    // ======================================================================

    pub fn add_standard_material(&mut self, name: impl Into<String>, standard: StandardMaterial) -> &mut Material {
        self.push_material(name.into(), MaterialKind::Standard(standard))
    }

    pub fn add_shader_material(&mut self, name: impl Into<String>, shader: ShaderMaterial) -> &mut Material {
        self.push_material(name.into(), MaterialKind::Shader(shader))
    }

    fn push_material(&mut self, name: String, kind: MaterialKind) -> &mut Material {
        let id = MaterialId(self.allocate());
        log::trace!("created material {:?} '{}'", id, name);
        let index = self.materials.len();
        self.materials.push(Material { id, name, kind });
        &mut self.materials[index]
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.iter_mut().find(|m| m.id == id)
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }

    // ======================================================================
    // Lights and cameras
    // ======================================================================

    pub fn add_light(&mut self, name: impl Into<String>, kind: LightKind) -> &mut Light {
        let id = LightId(self.allocate());
        let index = self.lights.len();
        self.lights.push(Light::new(id, name, kind));
        &mut self.lights[index]
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| l.id == id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    pub fn lights_mut(&mut self) -> impl Iterator<Item = &mut Light> {
        self.lights.iter_mut()
    }

    /// The first camera added becomes active
    pub fn add_camera(&mut self, name: impl Into<String>, kind: CameraKind) -> &mut Camera {
        let id = CameraId(self.allocate());
        if self.active_camera.is_none() {
            self.active_camera = Some(id);
        }
        let index = self.cameras.len();
        self.cameras.push(Camera::new(id, name, kind));
        &mut self.cameras[index]
    }

    pub fn set_active_camera(&mut self, id: CameraId) -> Result<(), SceneError> {
        if !self.cameras.iter().any(|c| c.id == id) {
            return Err(SceneError::Invalid(format!("camera {:?} does not exist in this scene", id)));
        }
        self.active_camera = Some(id);
        Ok(())
    }

    /// The selected camera, else the first persistent one, else the first one
    pub fn active_camera(&self) -> Option<&Camera> {
        let id = self.active_camera_id()?;
        self.cameras.iter().find(|c| c.id == id)
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        let id = self.active_camera_id()?;
        self.cameras.iter_mut().find(|c| c.id == id)
    }

    fn active_camera_id(&self) -> Option<CameraId> {
        self.active_camera
            .filter(|id| self.cameras.iter().any(|c| c.id == *id))
            .or_else(|| self.cameras.iter().find(|c| c.persistent).map(|c| c.id))
            .or_else(|| self.cameras.first().map(|c| c.id))
    }

    pub fn cameras(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.iter()
    }

    // ======================================================================
    // Post-processes and observers
    // ======================================================================

    pub fn add_post_process(&mut self, name: impl Into<String>, shader: material::ShaderSource) -> &mut PostProcess {
        let id = PostProcessId(self.allocate());
        let index = self.post_processes.len();
        self.post_processes.push(PostProcess::new(id, name, shader));
        &mut self.post_processes[index]
    }

    pub fn post_processes(&self) -> impl Iterator<Item = &PostProcess> {
        self.post_processes.iter()
    }

    pub fn post_processes_mut(&mut self) -> impl Iterator<Item = &mut PostProcess> {
        self.post_processes.iter_mut()
    }

    /// Run `observer` before every rendered frame until the scene is cleared
    pub fn on_before_render<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&mut Scene, &FrameInfo) + 'static,
    {
        let id = ObserverId(self.allocate());
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Show `panel` over the canvas until the scene is cleared. Replaces any
    /// earlier panel.
    pub fn set_controls<F>(&mut self, panel: F)
    where
        F: FnMut(&egui::Context, &mut Scene) + 'static,
    {
        self.controls = Some(Box::new(panel));
    }

    pub fn has_controls(&self) -> bool {
        self.controls.is_some()
    }

    pub fn show_controls(&mut self, ctx: &egui::Context) {
        let Some(mut panel) = self.controls.take() else {
            return;
        };
        panel(ctx, self);
        if self.controls.is_none() {
            self.controls = Some(panel);
        }
    }

    /// Advance the scene clock and run observers in registration order
    pub fn advance(&mut self, frame: &FrameInfo) {
        self.time = frame.time;

        let mut observers = std::mem::take(&mut self.observers);
        for (_, observer) in observers.iter_mut() {
            observer(self, frame);
        }
        // Keep anything registered while the observers ran
        observers.append(&mut self.observers);
        self.observers = observers;
    }

    // ======================================================================
    // Globals read by shaders
    // ======================================================================

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    /// Normalised to 0..1 across the canvas; (-1, -1) when the pointer is outside
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer.unwrap_or(Vec2::splat(-1.0));
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    // ======================================================================
    // Disposal
    // ======================================================================

    /// Dispose scene content in a fixed order: observers, post-processes,
    /// meshes, materials, lights, cameras. Each category is drained in
    /// creation order before the next one starts.
    pub fn clear(&mut self, mode: ClearMode) {
        let keep = |persistent: bool| mode == ClearMode::KeepEnvironment && persistent;

        for (id, _) in self.observers.drain(..) {
            self.disposed.push(Disposed::Observer(id));
        }
        if self.controls.take().is_some() {
            log::debug!("disposing scene controls");
        }
        for post in self.post_processes.drain(..) {
            log::debug!("disposing post-process '{}'", post.name);
            self.disposed.push(Disposed::PostProcess(post.id));
        }
        for mesh in self.meshes.drain(..) {
            log::debug!("disposing mesh '{}'", mesh.name);
            self.disposed.push(Disposed::Mesh(mesh.id));
        }
        for material in self.materials.drain(..) {
            log::debug!("disposing material '{}'", material.name);
            self.disposed.push(Disposed::Material(material.id));
        }

        let (kept, dropped): (Vec<Light>, Vec<Light>) =
            self.lights.drain(..).partition(|l| keep(l.persistent));
        self.lights = kept;
        for light in dropped {
            log::debug!("disposing light '{}'", light.name);
            self.disposed.push(Disposed::Light(light.id));
        }

        let (kept, dropped): (Vec<Camera>, Vec<Camera>) =
            self.cameras.drain(..).partition(|c| keep(c.persistent));
        self.cameras = kept;
        for camera in dropped {
            log::debug!("disposing camera '{}'", camera.name);
            if self.active_camera == Some(camera.id) {
                self.active_camera = None;
            }
            self.disposed.push(Disposed::Camera(camera.id));
        }
    }

    /// Take everything disposed since the last call, in disposal order
    pub fn drain_disposed(&mut self) -> Vec<Disposed> {
        std::mem::take(&mut self.disposed)
    }

    pub fn counts(&self) -> SceneCounts {
        SceneCounts {
            meshes: self.meshes.len(),
            materials: self.materials.len(),
            lights: self.lights.len(),
            cameras: self.cameras.len(),
            post_processes: self.post_processes.len(),
            observers: self.observers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.materials.is_empty() && self.post_processes.is_empty()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("counts", &self.counts())
            .field("active_camera", &self.active_camera)
            .field("time", &self.time)
            .finish()
    }
}
