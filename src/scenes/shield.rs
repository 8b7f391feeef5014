use glam::Vec3;

use crate::error::SceneError;
use crate::scene::material::{BlendMode, ShaderMaterial, ShaderSource, StandardMaterial, UniformValue};
use crate::scene::mesh::Geometry;
use crate::scene::{MaterialId, Scene};

pub const ENERGY_SHIELD_SHADER: ShaderSource = ShaderSource {
    label: "energy_shield",
    wgsl: include_str!("shaders/energy_shield.wgsl"),
};

pub const SHIELD_COLOR: &str = "shield_color";
pub const SHIELD_INTENSITY: &str = "intensity";
pub const SHIELD_HEALTH: &str = "shield_health";

/// The shield's tunable parameters as one value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldSettings {
    pub color: Vec3,
    pub intensity: f32,
    pub health: f32,
}

impl ShieldSettings {
    pub fn read(scene: &Scene, material: MaterialId) -> Option<Self> {
        let material = scene.material(material)?;
        match (
            material.param(SHIELD_COLOR)?,
            material.param(SHIELD_INTENSITY)?,
            material.param(SHIELD_HEALTH)?,
        ) {
            (UniformValue::Vec3(color), UniformValue::Float(intensity), UniformValue::Float(health)) => Some(Self {
                color,
                intensity,
                health,
            }),
            _ => None,
        }
    }

    pub fn apply(&self, scene: &mut Scene, material: MaterialId) -> Result<(), SceneError> {
        let material = scene
            .material_mut(material)
            .ok_or(SceneError::MissingMaterial(material))?;
        material.set_vec3(SHIELD_COLOR, self.color)?;
        material.set_float(SHIELD_INTENSITY, self.intensity)?;
        material.set_float(SHIELD_HEALTH, self.health.clamp(0.0, 1.0))
    }
}

fn shield_controls(ctx: &egui::Context, scene: &mut Scene, material: MaterialId) {
    let Some(mut settings) = ShieldSettings::read(scene, material) else {
        return;
    };
    let mut changed = false;

    egui::Window::new("Energy shield")
        .resizable(false)
        .default_width(220.0)
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Colour");
                let mut rgb = settings.color.to_array();
                if ui.color_edit_button_rgb(&mut rgb).changed() {
                    settings.color = Vec3::from(rgb);
                    changed = true;
                }
            });
            changed |= ui
                .add(egui::Slider::new(&mut settings.intensity, 0.0..=3.0).text("Intensity"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut settings.health, 0.0..=1.0).text("Health"))
                .changed();
        });

    if changed {
        if let Err(e) = settings.apply(scene, material) {
            log::warn!("shield controls: {}", e);
        }
    }
}

/// Shield sphere around a box. Colour, intensity and health are material
/// parameters, edited live from the scene's own control window.
pub fn create_shield_scene(scene: &mut Scene) -> Result<(), SceneError> {
    let mut shader = ShaderMaterial::new(ENERGY_SHIELD_SHADER);
    shader.blend = BlendMode::AlphaCombine;
    shader.back_face_culling = false;
    shader.depth_bias = -1;

    let material = scene.add_shader_material("energy_shield", shader);
    material.declare_param(SHIELD_COLOR, UniformValue::Vec3(Vec3::new(0.2, 0.6, 1.0)))?;
    material.declare_param(SHIELD_INTENSITY, UniformValue::Float(1.2))?;
    material.declare_param(SHIELD_HEALTH, UniformValue::Float(1.0))?;
    let material = material.id();

    let core_material = scene
        .add_standard_material("core", StandardMaterial::diffuse(Vec3::new(0.8, 0.8, 0.85)))
        .id();
    let core = scene.add_mesh("box", Geometry::cube(2.0)).id();
    scene.assign_material(core, core_material)?;

    // Added after the box so the translucent pass draws over it
    let shield = scene.add_mesh("shield", Geometry::sphere(5.0, 64)).id();
    scene.assign_material(shield, material)?;

    scene.set_controls(move |ctx, scene| shield_controls(ctx, scene, material));

    Ok(())
}
