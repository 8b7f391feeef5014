//! Debug inspector overlay, loaded on first use.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use glam::{Vec2, Vec3, Vec4};

use crate::error::OverlayError;
use crate::scene::camera::CameraKind;
use crate::scene::material::{MaterialKind, ShaderParams, UniformValue};
use crate::scene::Scene;

pub const INSPECTOR_WIDTH: f32 = 300.0;

/// An overlay that shows (and edits) the active scene
pub trait Inspector {
    fn attach(&mut self, scene: &Scene);
    fn detach(&mut self);
    fn is_attached(&self) -> bool;
    /// Draw into the current egui pass. Only called while attached.
    fn ui(&mut self, ctx: &egui::Context, scene: &mut Scene);
}

/// Produces an inspector; the returned future is the one suspension point
/// in the host
pub trait InspectorLoader {
    fn load(&self) -> LocalBoxFuture<'static, Result<Box<dyn Inspector>, OverlayError>>;
}

/// Load-once cache around an [`InspectorLoader`].
///
/// A successful load is kept for the life of the cache. A failed load is
/// not remembered, so the next request tries again.
pub struct LazyInspector {
    loader: Box<dyn InspectorLoader>,
    loaded: Option<Box<dyn Inspector>>,
    attempts: usize,
}

impl LazyInspector {
    pub fn new(loader: impl InspectorLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            loaded: None,
            attempts: 0,
        }
    }

    pub async fn ensure_loaded(&mut self) -> Result<(), OverlayError> {
        if self.loaded.is_some() {
            return Ok(());
        }

        self.attempts += 1;
        log::info!("loading inspector overlay (attempt {})", self.attempts);
        let inspector = self.loader.load().await.inspect_err(|e| {
            log::warn!("inspector overlay failed to load: {}", e);
        })?;
        self.loaded = Some(inspector);
        Ok(())
    }

    pub fn get_mut(&mut self) -> Option<&mut (dyn Inspector + 'static)> {
        self.loaded.as_deref_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Number of times the loader has been invoked
    pub fn load_attempts(&self) -> usize {
        self.attempts
    }
}

/// Loader for the built-in [`SceneInspector`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneInspectorLoader;

impl InspectorLoader for SceneInspectorLoader {
    fn load(&self) -> LocalBoxFuture<'static, Result<Box<dyn Inspector>, OverlayError>> {
        futures::future::ready(Ok(Box::new(SceneInspector::default()) as Box<dyn Inspector>)).boxed_local()
    }
}

/// Right-hand egui panel listing every object in the scene
#[derive(Debug, Default)]
pub struct SceneInspector {
    attached: bool,
}

impl Inspector for SceneInspector {
    fn attach(&mut self, scene: &Scene) {
        self.attached = true;
        log::debug!("inspector attached: {:?}", scene.counts());
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn ui(&mut self, ctx: &egui::Context, scene: &mut Scene) {
        egui::SidePanel::right("scene_inspector")
            .default_width(INSPECTOR_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Inspector");
                let counts = scene.counts();
                ui.label(format!("Time: {:.2}s", scene.time()));
                ui.label(format!(
                    "Resolution: {:.0} x {:.0}",
                    scene.resolution().x,
                    scene.resolution().y
                ));
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    meshes_section(ui, scene, counts.meshes);
                    materials_section(ui, scene, counts.materials);
                    lights_section(ui, scene, counts.lights);
                    cameras_section(ui, scene, counts.cameras);
                    post_process_section(ui, scene, counts.post_processes);
                });
            });
    }
}

fn meshes_section(ui: &mut egui::Ui, scene: &mut Scene, count: usize) {
    egui::CollapsingHeader::new(format!("Meshes ({count})"))
        .default_open(true)
        .show(ui, |ui| {
            for mesh in scene.meshes_mut() {
                ui.push_id(mesh.id().raw(), |ui| {
                    ui.horizontal(|ui| {
                        ui.checkbox(&mut mesh.visible, "");
                        ui.label(&mesh.name);
                        ui.weak(format!("{} tris", mesh.geometry().triangle_count()));
                    });
                    ui.horizontal(|ui| {
                        ui.label("pos");
                        let position = &mut mesh.transform.position;
                        ui.add(egui::DragValue::new(&mut position.x).speed(0.05));
                        ui.add(egui::DragValue::new(&mut position.y).speed(0.05));
                        ui.add(egui::DragValue::new(&mut position.z).speed(0.05));
                    });
                });
            }
        });
}

fn materials_section(ui: &mut egui::Ui, scene: &mut Scene, count: usize) {
    egui::CollapsingHeader::new(format!("Materials ({count})")).show(ui, |ui| {
        for material in scene.materials_mut() {
            ui.push_id(material.id().raw(), |ui| {
                ui.label(egui::RichText::new(&material.name).strong());
                match &mut material.kind {
                    MaterialKind::Standard(standard) => {
                        let mut diffuse = standard.diffuse.to_array();
                        ui.horizontal(|ui| {
                            ui.label("diffuse");
                            if ui.color_edit_button_rgb(&mut diffuse).changed() {
                                standard.diffuse = Vec3::from(diffuse);
                            }
                        });
                        ui.add(egui::Slider::new(&mut standard.alpha, 0.0..=1.0).text("alpha"));
                    }
                    MaterialKind::Shader(shader) => {
                        ui.weak(format!("shader: {}", shader.shader.label));
                        params_editor(ui, &mut shader.params);
                    }
                }
            });
        }
    });
}

fn lights_section(ui: &mut egui::Ui, scene: &mut Scene, count: usize) {
    egui::CollapsingHeader::new(format!("Lights ({count})")).show(ui, |ui| {
        for light in scene.lights_mut() {
            ui.push_id(light.id().raw(), |ui| {
                ui.horizontal(|ui| {
                    ui.label(&light.name);
                    ui.weak(light.kind_label());
                    if light.persistent {
                        ui.weak("(environment)");
                    }
                });
                ui.add(egui::Slider::new(&mut light.intensity, 0.0..=3.0).text("intensity"));
            });
        }
    });
}

fn cameras_section(ui: &mut egui::Ui, scene: &mut Scene, count: usize) {
    let active = scene.active_camera().map(|c| c.id());
    egui::CollapsingHeader::new(format!("Cameras ({count})")).show(ui, |ui| {
        for camera in scene.cameras() {
            let marker = if Some(camera.id()) == active { "●" } else { "○" };
            ui.label(format!("{marker} {}", camera.name));
            if let CameraKind::ArcRotate(arc) = &camera.kind {
                ui.weak(format!(
                    "alpha {:.2}  beta {:.2}  radius {:.1}",
                    arc.alpha, arc.beta, arc.radius
                ));
            }
        }
    });
}

fn post_process_section(ui: &mut egui::Ui, scene: &mut Scene, count: usize) {
    if count == 0 {
        return;
    }
    egui::CollapsingHeader::new(format!("Post-processes ({count})")).show(ui, |ui| {
        for post in scene.post_processes_mut() {
            ui.push_id(post.id().raw(), |ui| {
                ui.checkbox(&mut post.enabled, post.name.as_str());
                params_editor(ui, &mut post.params);
            });
        }
    });
}

fn params_editor(ui: &mut egui::Ui, params: &mut ShaderParams) {
    for (name, value) in params.iter_mut() {
        ui.horizontal(|ui| {
            ui.label(name);
            match value {
                UniformValue::Float(x) => {
                    ui.add(egui::Slider::new(x, 0.0..=2.0));
                }
                UniformValue::Vec2(v) => {
                    let mut xy = v.to_array();
                    let mut changed = false;
                    for c in &mut xy {
                        changed |= ui.add(egui::DragValue::new(c).speed(0.01)).changed();
                    }
                    if changed {
                        *v = Vec2::from(xy);
                    }
                }
                UniformValue::Vec3(v) => {
                    let mut rgb = v.to_array();
                    if ui.color_edit_button_rgb(&mut rgb).changed() {
                        *v = Vec3::from(rgb);
                    }
                }
                UniformValue::Vec4(v) => {
                    let mut rgba = v.to_array();
                    if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
                        *v = Vec4::from(rgba);
                    }
                }
            }
        });
    }
}
