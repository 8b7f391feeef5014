//! Rendering backends driven by the scene host.

pub mod gpu;
pub mod gpu_context;
pub mod headless;
pub mod types;

use crate::error::{EngineError, MountError};
use crate::host::surface::{RenderSurface, Viewport};
use crate::scene::{Disposed, Scene};

pub use gpu::{CanvasSurface, EguiPaint, GpuEngine};
pub use gpu_context::GpuContext;
pub use headless::{HeadlessEngine, HeadlessStats, HeadlessSurface};

/// Binding between one drawable surface and a rendering backend.
///
/// An engine outlives the scenes it draws: the host creates it once per
/// mount and reports every disposed scene object through `release` so the
/// backend can drop what it uploaded.
pub trait Engine: Sized {
    type Surface: RenderSurface;
    /// Extra layer composited over the scene, e.g. the UI shell
    type Chrome;

    fn create(surface: Self::Surface) -> Result<Self, MountError>;

    fn surface(&self) -> &Self::Surface;

    /// Match the backing buffers to the drawable region; redundant calls are fine
    fn resize(&mut self, viewport: Viewport);

    fn render(&mut self, scene: &Scene, chrome: Option<&Self::Chrome>) -> Result<(), EngineError>;

    fn release(&mut self, disposed: &[Disposed]);

    /// Drop every backend resource. Rendering afterwards fails with `EngineError::Disposed`.
    fn dispose(&mut self);
}
