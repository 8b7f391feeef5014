use egui::ecolor::Hsva;
use glam::Vec3;

use crate::error::SceneError;
use crate::scene::light::LightKind;
use crate::scene::material::StandardMaterial;
use crate::scene::mesh::Geometry;
use crate::scene::{MeshId, Scene};

const GRID: usize = 3;
const SPACING: f32 = 2.0;
const LIGHT_ORBIT_RADIUS: f32 = 4.0;

fn cube_color(index: usize) -> Vec3 {
    let hue = index as f32 / (GRID * GRID) as f32;
    Vec3::from(Hsva::new(hue, 0.7, 0.9, 1.0).to_rgb())
}

pub fn create_complex_scene(scene: &mut Scene) -> Result<(), SceneError> {
    let ground_material = scene
        .add_standard_material("ground", StandardMaterial::diffuse(Vec3::splat(0.3)))
        .id();
    let ground = scene.add_mesh("ground", Geometry::ground(10.0, 10.0)).id();
    scene.assign_material(ground, ground_material)?;

    let offset = (GRID as f32 - 1.0) * SPACING * 0.5;
    let mut cubes: Vec<(MeshId, f32)> = Vec::with_capacity(GRID * GRID);

    for row in 0..GRID {
        for col in 0..GRID {
            let index = row * GRID + col;
            let material = scene
                .add_standard_material(format!("cube_{index}"), StandardMaterial::diffuse(cube_color(index)))
                .id();

            let cube = scene.add_mesh(format!("cube_{index}"), Geometry::cube(0.8));
            cube.transform.position = Vec3::new(col as f32 * SPACING - offset, 1.0, row as f32 * SPACING - offset);
            let cube = cube.id();
            scene.assign_material(cube, material)?;

            // Phase offset so the cluster ripples instead of bobbing in unison
            cubes.push((cube, index as f32 * 0.7));
        }
    }

    let light = scene.add_light("orbit_light", LightKind::Point { position: Vec3::new(0.0, 4.0, 0.0) });
    light.diffuse = Vec3::new(1.0, 0.9, 0.7);
    light.intensity = 1.5;
    let light = light.id();

    scene.on_before_render(move |scene, frame| {
        for &(id, phase) in &cubes {
            if let Some(mesh) = scene.mesh_mut(id) {
                mesh.transform.position.y = 1.0 + (frame.time * 2.0 + phase).sin() * 0.5;
                mesh.transform.rotation.x += frame.delta;
                mesh.transform.rotation.y += frame.delta * 0.5;
            }
        }
        if let Some(light) = scene.light_mut(light) {
            let angle = frame.time * 0.8;
            light.kind = LightKind::Point {
                position: Vec3::new(angle.cos() * LIGHT_ORBIT_RADIUS, 4.0, angle.sin() * LIGHT_ORBIT_RADIUS),
            };
        }
    });

    Ok(())
}
