use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use super::{MaterialId, MeshId};

/// Vertex layout shared by every mesh pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle list, counter-clockwise front faces
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

// (normal, u, v) with u x v == normal, so quads wind counter-clockwise
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
];

impl Geometry {
    /// Axis-aligned box centred on the origin
    pub fn cuboid(size: Vec3) -> Self {
        let half = size * 0.5;
        let mut geometry = Self::empty();
        for (normal, u, v) in CUBE_FACES {
            geometry.push_quad(normal * half, u * half, v * half, normal);
        }
        geometry
    }

    pub fn cube(size: f32) -> Self {
        Self::cuboid(Vec3::splat(size))
    }

    /// UV sphere with `segments` latitude bands and twice as many longitude slices
    pub fn sphere(diameter: f32, segments: u32) -> Self {
        let rings = segments.max(3);
        let slices = rings * 2;
        let radius = diameter * 0.5;

        let vertices = (0..=rings)
            .flat_map(|i| {
                let theta = i as f32 * std::f32::consts::PI / rings as f32;
                (0..=slices).map(move |j| {
                    let phi = j as f32 * std::f32::consts::TAU / slices as f32;
                    let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                    Vertex {
                        position: (normal * radius).to_array(),
                        normal: normal.to_array(),
                        uv: [j as f32 / slices as f32, i as f32 / rings as f32],
                    }
                })
            })
            .collect();

        let stride = slices + 1;
        let indices = (0..rings)
            .flat_map(|i| {
                (0..slices).flat_map(move |j| {
                    let a = i * stride + j;
                    let b = a + stride;
                    [a, a + 1, b, a + 1, b + 1, b]
                })
            })
            .collect();

        Self { vertices, indices }
    }

    /// Square in the XY plane facing -Z
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let mut geometry = Self::empty();
        geometry.push_quad(Vec3::ZERO, Vec3::NEG_X * half, Vec3::Y * half, Vec3::NEG_Z);
        geometry
    }

    /// Rectangle in the XZ plane facing +Y
    pub fn ground(width: f32, depth: f32) -> Self {
        let mut geometry = Self::empty();
        geometry.push_quad(
            Vec3::ZERO,
            Vec3::X * (width * 0.5),
            Vec3::NEG_Z * (depth * 0.5),
            Vec3::Y,
        );
        geometry
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn push_quad(&mut self, center: Vec3, u: Vec3, v: Vec3, normal: Vec3) {
        let base = self.vertices.len() as u32;
        let corners = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];

        self.vertices.extend(corners.iter().map(|c| Vertex {
            position: (center + u * c.x + v * c.y).to_array(),
            normal: normal.to_array(),
            uv: [(c.x + 1.0) * 0.5, (1.0 - c.y) * 0.5],
        }));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Position, Euler rotation (radians, applied Y then X then Z) and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scaling: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scaling: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scaling, rotation, self.position)
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) id: MeshId,
    pub name: String,
    geometry: Geometry,
    pub transform: Transform,
    /// `None` draws with the engine's default material
    pub material: Option<MaterialId>,
    pub visible: bool,
}

impl Mesh {
    pub(crate) fn new(id: MeshId, name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id,
            name: name.into(),
            geometry,
            transform: Transform::default(),
            material: None,
            visible: true,
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_four_vertices_per_face() {
        let cube = Geometry::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.abs() == 1.0)));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = Geometry::cube(1.0);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(cube.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let stored = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(stored) > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = Geometry::sphere(5.0, 16);
        assert_eq!(sphere.vertices.len(), 17 * 33);
        assert_eq!(sphere.triangle_count(), 16 * 32 * 2);
        for v in &sphere.vertices {
            assert!((Vec3::from(v.position).length() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn ground_faces_up() {
        let ground = Geometry::ground(6.0, 4.0);
        let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(ground.vertices[i].position));
        assert!((b - a).cross(c - a).normalize().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn transform_applies_translation_last() {
        let transform = Transform {
            position: Vec3::new(0.0, 1.0, 0.0),
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scaling: Vec3::splat(2.0),
        };
        let moved = transform.matrix().transform_point3(Vec3::X);
        assert!(moved.abs_diff_eq(Vec3::new(0.0, 1.0, -2.0), 1e-5));
    }
}
