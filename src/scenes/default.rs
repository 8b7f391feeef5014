use glam::Vec3;

use crate::error::SceneError;
use crate::scene::material::StandardMaterial;
use crate::scene::mesh::Geometry;
use crate::scene::Scene;

/// Radians per second
const SPIN_SPEED: f32 = 0.6;

pub fn create_default_scene(scene: &mut Scene) -> Result<(), SceneError> {
    let ground_material = scene
        .add_standard_material("ground", StandardMaterial::diffuse(Vec3::new(0.35, 0.4, 0.45)))
        .id();
    let ground = scene.add_mesh("ground", Geometry::ground(6.0, 6.0)).id();
    scene.assign_material(ground, ground_material)?;

    let box_mesh = scene.add_mesh("box", Geometry::cube(2.0));
    box_mesh.transform.position = Vec3::new(0.0, 1.0, 0.0);
    let box_id = box_mesh.id();

    scene.on_before_render(move |scene, frame| {
        if let Some(mesh) = scene.mesh_mut(box_id) {
            mesh.transform.rotation.y += SPIN_SPEED * frame.delta;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameInfo;

    #[test]
    fn box_spins_with_frame_delta() {
        let mut scene = Scene::new();
        create_default_scene(&mut scene).unwrap();

        scene.advance(&FrameInfo::new(1, 1.0, 1.0));

        let spun = scene.mesh_by_name("box").unwrap();
        assert!((spun.transform.rotation.y - SPIN_SPEED).abs() < 1e-6);
        assert_eq!(spun.transform.position, Vec3::new(0.0, 1.0, 0.0));
    }
}
