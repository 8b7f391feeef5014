//! GPU-side uniform blocks. Layouts mirror `shaders/prelude.wgsl`.

use glam::{Mat4, Vec3};

use crate::host::surface::Viewport;
use crate::scene::light::{Light, LightKind};
use crate::scene::material::{Material, MaterialKind, StandardMaterial, MAX_PARAMS};
use crate::scene::mesh::Mesh;
use crate::scene::Scene;

pub const MAX_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub vector: [f32; 4],
    pub color: [f32; 4],
    pub ground: [f32; 4],
}

impl LightUniform {
    pub fn from_light(light: &Light) -> Self {
        let color = (light.diffuse * light.intensity).extend(1.0).to_array();
        match light.kind {
            LightKind::Hemispheric { direction, ground_color } => Self {
                vector: direction.extend(0.0).to_array(),
                color,
                ground: (ground_color * light.intensity).extend(1.0).to_array(),
            },
            LightKind::Point { position } => Self {
                vector: position.extend(1.0).to_array(),
                color,
                ground: [0.0; 4],
            },
            LightKind::Directional { direction } => Self {
                vector: direction.extend(2.0).to_array(),
                color,
                ground: [0.0; 4],
            },
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalsUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
    pub light_count: u32,
    pub _padding: [f32; 2],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl GlobalsUniform {
    /// Snapshot the per-frame globals. Lights past `MAX_LIGHTS` are skipped.
    pub fn from_scene(scene: &Scene, viewport: Viewport) -> Self {
        let (view_proj, camera_position) = match scene.active_camera() {
            Some(camera) => (camera.view_projection(viewport.aspect()), camera.position()),
            None => (Mat4::IDENTITY, Vec3::ZERO),
        };

        let mut lights = [LightUniform::default(); MAX_LIGHTS];
        let mut light_count = 0;
        for (slot, light) in lights.iter_mut().zip(scene.lights()) {
            *slot = LightUniform::from_light(light);
            light_count += 1;
        }

        let resolution = scene.resolution();
        let pointer = scene.pointer();

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            resolution: resolution.to_array(),
            pointer: pointer.to_array(),
            time: scene.time(),
            light_count,
            _padding: [0.0; 2],
            lights,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub world: [[f32; 4]; 4],
    pub params: [[f32; 4]; MAX_PARAMS],
    pub base_color: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
}

impl ObjectUniform {
    /// Per-mesh block; meshes without a material use a white standard one
    pub fn for_mesh(mesh: &Mesh, material: Option<&Material>) -> Self {
        let world = mesh.transform.matrix().to_cols_array_2d();
        match material.map(|m| &m.kind) {
            Some(MaterialKind::Shader(shader)) => Self {
                world,
                params: shader.params.slots(),
                base_color: [1.0; 4],
                specular: [1.0; 4],
                emissive: [0.0; 4],
            },
            Some(MaterialKind::Standard(standard)) => Self::standard(world, standard),
            None => Self::standard(world, &StandardMaterial::default()),
        }
    }

    /// Block for a post-process pass, which has no transform
    pub fn for_params(params: [[f32; 4]; MAX_PARAMS]) -> Self {
        Self {
            world: Mat4::IDENTITY.to_cols_array_2d(),
            params,
            base_color: [1.0; 4],
            specular: [0.0; 4],
            emissive: [0.0; 4],
        }
    }

    fn standard(world: [[f32; 4]; 4], standard: &StandardMaterial) -> Self {
        Self {
            world,
            params: [[0.0; 4]; MAX_PARAMS],
            base_color: standard.diffuse.extend(standard.alpha).to_array(),
            specular: standard.specular.extend(1.0).to_array(),
            emissive: standard.emissive.extend(1.0).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::Geometry;
    use glam::Vec2;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        assert_eq!(std::mem::size_of::<GlobalsUniform>(), 112 + 48 * MAX_LIGHTS);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
    }

    #[test]
    fn globals_carry_resolution_pointer_and_time() {
        let mut scene = Scene::new();
        scene.set_resolution(800, 600);
        scene.set_pointer(Some(Vec2::new(0.25, 0.5)));
        scene.advance(&crate::frame::FrameInfo::new(3, 2.5, 0.1));

        let globals = GlobalsUniform::from_scene(&scene, Viewport::full(800, 600));
        assert_eq!(globals.resolution, [800.0, 600.0]);
        assert_eq!(globals.pointer, [0.25, 0.5]);
        assert_eq!(globals.time, 2.5);
        assert_eq!(globals.light_count, 0);
    }

    #[test]
    fn lights_beyond_capacity_are_dropped() {
        let mut scene = Scene::new();
        for i in 0..6 {
            scene.add_light(format!("l{i}"), LightKind::Point { position: Vec3::ZERO });
        }
        let globals = GlobalsUniform::from_scene(&scene, Viewport::full(1, 1));
        assert_eq!(globals.light_count as usize, MAX_LIGHTS);
        assert_eq!(globals.lights[0].vector[3], 1.0);
    }

    #[test]
    fn meshes_without_material_draw_white() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh("m", Geometry::cube(1.0)).id();
        let object = ObjectUniform::for_mesh(scene.mesh(mesh).unwrap(), None);
        assert_eq!(object.base_color, [1.0; 4]);
        assert_eq!(object.world, Mat4::IDENTITY.to_cols_array_2d());
    }
}
