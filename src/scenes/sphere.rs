use glam::Vec3;

use crate::error::SceneError;
use crate::scene::material::{ShaderMaterial, ShaderSource, UniformValue};
use crate::scene::mesh::Geometry;
use crate::scene::Scene;

pub const NEON_GRID_SHADER: ShaderSource = ShaderSource {
    label: "neon_grid",
    wgsl: include_str!("shaders/neon_grid.wgsl"),
};

pub fn create_sphere_scene(scene: &mut Scene) -> Result<(), SceneError> {
    let material = scene.add_shader_material("neon_grid", ShaderMaterial::new(NEON_GRID_SHADER));
    material.declare_param("glow", UniformValue::Float(1.0))?;
    let material = material.id();

    let sphere = scene.add_mesh("sphere", Geometry::sphere(2.0, 32));
    sphere.transform.position = Vec3::new(0.0, 1.0, 0.0);
    let sphere = sphere.id();
    scene.assign_material(sphere, material)?;

    scene.on_before_render(move |scene, frame| {
        if let Some(mesh) = scene.mesh_mut(sphere) {
            mesh.transform.rotation.y += 0.4 * frame.delta;
        }
    });

    Ok(())
}
