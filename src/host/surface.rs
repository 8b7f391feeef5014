use glam::Vec2;

/// Pixel rectangle of a surface that the scene may draw into.
/// Physical pixels, origin at the top-left of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a whole `width` x `height` target
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && px < (self.x + self.width) as f32
            && py < (self.y + self.height) as f32
    }

    /// Map a window position to 0..1 across the viewport with y pointing up.
    /// `None` when the position is outside.
    pub fn normalize(&self, px: f32, py: f32) -> Option<Vec2> {
        if self.is_empty() || !self.contains(px, py) {
            return None;
        }
        Some(Vec2::new(
            (px - self.x as f32) / self.width as f32,
            1.0 - (py - self.y as f32) / self.height as f32,
        ))
    }

    /// Clip to a `width` x `height` target
    pub fn clamp_to(&self, width: u32, height: u32) -> Viewport {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Viewport::new(x, y, self.width.min(width - x), self.height.min(height - y))
    }
}

/// A drawable target handed to the host by the embedding shell
pub trait RenderSurface {
    /// Current drawable region, `None` when the target is gone or not laid out
    fn drawable_region(&self) -> Option<Viewport>;
}
