use glam::Vec3;

use crate::error::SceneError;
use crate::scene::material::{ShaderSource, StandardMaterial, UniformValue};
use crate::scene::mesh::Geometry;
use crate::scene::Scene;

/// Fragment stage only; the engine supplies the full-screen vertex stage
pub const NIGHT_DRIVE_SHADER: ShaderSource = ShaderSource {
    label: "night_drive",
    wgsl: include_str!("shaders/night_drive.wgsl"),
};

pub fn create_night_drive_scene(scene: &mut Scene) -> Result<(), SceneError> {
    let material = scene
        .add_standard_material("sphere", StandardMaterial::diffuse(Vec3::new(0.2, 0.4, 1.0)))
        .id();
    let sphere = scene.add_mesh("sphere", Geometry::sphere(2.0, 32)).id();
    scene.assign_material(sphere, material)?;

    let post = scene.add_post_process("wave", NIGHT_DRIVE_SHADER);
    post.declare_param("line_thickness", UniformValue::Float(0.1))?;
    post.declare_param("point_thickness", UniformValue::Float(0.3))?;

    Ok(())
}
