use glam::{Mat4, Vec3};

use super::CameraId;

pub const ORBIT_SENSITIVITY: f32 = 0.005;
pub const ZOOM_SPEED: f32 = 0.5;
pub const MIN_RADIUS: f32 = 1.0;
pub const MAX_RADIUS: f32 = 100.0;

/// Camera orbiting a target; angles in radians.
/// `alpha` is the longitude around Y, `beta` the colatitude from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcRotate {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
}

impl ArcRotate {
    pub fn position(&self) -> Vec3 {
        self.target
            + self.radius
                * Vec3::new(
                    self.alpha.cos() * self.beta.sin(),
                    self.beta.cos(),
                    self.alpha.sin() * self.beta.sin(),
                )
    }

    /// Drag in pixels
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.alpha -= dx * ORBIT_SENSITIVITY;
        self.beta = (self.beta - dy * ORBIT_SENSITIVITY).clamp(0.01, std::f32::consts::PI - 0.01);
    }

    /// Positive steps move closer
    pub fn zoom(&mut self, steps: f32) {
        self.radius = (self.radius - steps * ZOOM_SPEED).clamp(MIN_RADIUS, MAX_RADIUS);
    }
}

/// Fixed camera looking along yaw/pitch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Free {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Free {
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let dir = (target - position).try_normalize().unwrap_or(Vec3::Z);
        Self {
            position,
            yaw: dir.x.atan2(dir.z),
            pitch: dir.y.asin(),
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
        .normalize()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraKind {
    ArcRotate(ArcRotate),
    Free(Free),
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub(crate) id: CameraId,
    pub name: String,
    pub kind: CameraKind,
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub persistent: bool,
}

impl Camera {
    pub(crate) fn new(id: CameraId, name: impl Into<String>, kind: CameraKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            fov: 0.8,
            near: 0.1,
            far: 1000.0,
            persistent: false,
        }
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        match &self.kind {
            CameraKind::ArcRotate(arc) => arc.position(),
            CameraKind::Free(free) => free.position,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        match &self.kind {
            CameraKind::ArcRotate(arc) => Mat4::look_at_rh(arc.position(), arc.target, Vec3::Y),
            CameraKind::Free(free) => Mat4::look_to_rh(free.position, free.forward(), Vec3::Y),
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far) * self.view_matrix()
    }

    pub fn arc_rotate_mut(&mut self) -> Option<&mut ArcRotate> {
        match &mut self.kind {
            CameraKind::ArcRotate(arc) => Some(arc),
            CameraKind::Free(_) => None,
        }
    }
}
