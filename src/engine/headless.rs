use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use super::types::GlobalsUniform;
use super::Engine;
use crate::error::{EngineError, MountError};
use crate::host::surface::{RenderSurface, Viewport};
use crate::scene::{Disposed, MeshId, PostProcessId, Scene};

/// What a headless engine has done so far. Shared with the surface so it
/// stays readable after the host drops the engine.
#[derive(Debug, Default, Clone)]
pub struct HeadlessStats {
    pub engines_created: usize,
    pub resizes: Vec<Viewport>,
    pub frames: u64,
    /// Meshes drawn at least once and not yet released
    pub live_meshes: HashSet<MeshId>,
    pub live_post_processes: HashSet<PostProcessId>,
    pub released: Vec<Disposed>,
    pub last_globals: Option<GlobalsUniform>,
    pub disposed: bool,
}

/// In-memory surface whose region the caller controls
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    region: Rc<Cell<Option<Viewport>>>,
    stats: Rc<RefCell<HeadlessStats>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_region(Some(Viewport::full(width, height)))
    }

    /// `None` models a target that was never laid out
    pub fn with_region(region: Option<Viewport>) -> Self {
        Self {
            region: Rc::new(Cell::new(region)),
            stats: Rc::new(RefCell::new(HeadlessStats::default())),
        }
    }

    pub fn set_region(&self, region: Option<Viewport>) {
        self.region.set(region);
    }

    pub fn stats(&self) -> HeadlessStats {
        self.stats.borrow().clone()
    }
}

impl RenderSurface for HeadlessSurface {
    fn drawable_region(&self) -> Option<Viewport> {
        self.region.get()
    }
}

/// Engine that draws nothing but keeps the bookkeeping a GPU backend would
pub struct HeadlessEngine {
    surface: HeadlessSurface,
    viewport: Viewport,
    alive: bool,
}

impl HeadlessEngine {
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn stats(&self) -> HeadlessStats {
        self.surface.stats()
    }
}

impl Engine for HeadlessEngine {
    type Surface = HeadlessSurface;
    type Chrome = ();

    fn create(surface: HeadlessSurface) -> Result<Self, MountError> {
        let viewport = surface
            .drawable_region()
            .filter(|region| !region.is_empty())
            .ok_or(MountError::InvalidSurface)?;

        surface.stats.borrow_mut().engines_created += 1;
        log::debug!("headless engine created for {}x{}", viewport.width, viewport.height);

        Ok(Self {
            surface,
            viewport,
            alive: true,
        })
    }

    fn surface(&self) -> &HeadlessSurface {
        &self.surface
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.surface.stats.borrow_mut().resizes.push(viewport);
    }

    fn render(&mut self, scene: &Scene, _chrome: Option<&()>) -> Result<(), EngineError> {
        if !self.alive {
            return Err(EngineError::Disposed);
        }

        let mut stats = self.surface.stats.borrow_mut();
        stats.frames += 1;
        stats.live_meshes.extend(scene.meshes().filter(|m| m.visible).map(|m| m.id()));
        stats
            .live_post_processes
            .extend(scene.post_processes().filter(|p| p.enabled).map(|p| p.id()));
        stats.last_globals = Some(GlobalsUniform::from_scene(scene, self.viewport));
        Ok(())
    }

    fn release(&mut self, disposed: &[Disposed]) {
        let mut stats = self.surface.stats.borrow_mut();
        for item in disposed {
            match item {
                Disposed::Mesh(id) => {
                    stats.live_meshes.remove(id);
                }
                Disposed::PostProcess(id) => {
                    stats.live_post_processes.remove(id);
                }
                _ => {}
            }
        }
        stats.released.extend_from_slice(disposed);
    }

    fn dispose(&mut self) {
        self.alive = false;
        let mut stats = self.surface.stats.borrow_mut();
        stats.live_meshes.clear();
        stats.live_post_processes.clear();
        stats.disposed = true;
        log::debug!("headless engine disposed after {} frame(s)", stats.frames);
    }
}
