//! Scene host: owns the engine and the active scene for one surface.
//!
//! Lifecycle: `Unmounted -> Mounted(no scene) -> Mounted(scene active)`.
//! The engine is created once per mount and outlives every scene swap; the
//! scene handle is reused and cleared between swaps. Only the host touches
//! either of them; other components talk to it through the event bus.

pub mod inspector;
pub mod surface;

use std::cell::RefCell;
use std::f32::consts::{FRAC_PI_2, PI};
use std::rc::Rc;

use glam::Vec3;

use crate::engine::Engine;
use crate::error::HostError;
use crate::events::{EventBus, EventKind, SceneEvent, Subscription};
use crate::frame::FrameInfo;
use crate::scene::camera::{ArcRotate, CameraKind};
use crate::scene::light::LightKind;
use crate::scene::{ClearMode, Scene};
use crate::scenes::SceneRegistry;

use inspector::{InspectorLoader, LazyInspector};
use surface::RenderSurface;

pub const DEFAULT_CAMERA_NAME: &str = "camera";
pub const DEFAULT_LIGHT_NAME: &str = "light";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostState {
    Unmounted,
    /// `scene` is `None` before the first swap and after a failed one
    Mounted { scene: Option<String> },
}

/// Pointer activity over the window, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Moved { x: f32, y: f32 },
    Left,
    /// Drag delta while the primary button is held over the canvas
    Drag { dx: f32, dy: f32 },
    /// Positive values zoom in
    Wheel { steps: f32 },
}

struct Session<E> {
    engine: E,
    scene: Scene,
    active_scene: Option<String>,
}

pub struct SceneHost<E: Engine> {
    registry: Rc<SceneRegistry>,
    inspector: LazyInspector,
    inspector_visible: bool,
    layout_pending: bool,
    session: Option<Session<E>>,
}

/// Persistent camera and light installed on mount. Both survive scene
/// swaps and are disposed on unmount.
fn install_default_environment(scene: &mut Scene) {
    let camera = scene.add_camera(
        DEFAULT_CAMERA_NAME,
        CameraKind::ArcRotate(ArcRotate {
            alpha: -FRAC_PI_2,
            beta: PI / 2.5,
            radius: 10.0,
            target: Vec3::ZERO,
        }),
    );
    camera.persistent = true;

    let light = scene.add_light(
        DEFAULT_LIGHT_NAME,
        LightKind::Hemispheric {
            direction: Vec3::Y,
            ground_color: Vec3::splat(0.1),
        },
    );
    light.persistent = true;
}

impl<E: Engine> SceneHost<E> {
    pub fn new(registry: Rc<SceneRegistry>, loader: impl InspectorLoader + 'static) -> Self {
        Self {
            registry,
            inspector: LazyInspector::new(loader),
            inspector_visible: false,
            layout_pending: false,
            session: None,
        }
    }

    pub fn state(&self) -> HostState {
        match &self.session {
            None => HostState::Unmounted,
            Some(session) => HostState::Mounted {
                scene: session.active_scene.clone(),
            },
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    /// Bind an engine to `surface` and install the default environment.
    /// No scene is loaded until the first `swap_scene`.
    pub fn mount(&mut self, surface: E::Surface) -> Result<(), HostError> {
        if self.session.is_some() {
            return Err(HostError::AlreadyMounted);
        }

        let engine = E::create(surface).inspect_err(|e| log::error!("mount failed: {}", e))?;
        let mut scene = Scene::new();
        install_default_environment(&mut scene);

        if self.inspector_visible {
            if let Some(inspector) = self.inspector.get_mut() {
                inspector.attach(&scene);
            }
        }

        self.session = Some(Session {
            engine,
            scene,
            active_scene: None,
        });
        self.layout_pending = false;
        self.resize();

        log::info!("scene host mounted");
        Ok(())
    }

    /// Replace the active scene with the one registered under `id`.
    ///
    /// Always clears and rebuilds, even when `id` is already active. Unknown
    /// ids load the default scene. If the factory fails the scene is left
    /// empty (environment only) and the error is returned.
    pub fn swap_scene(&mut self, id: &str) -> Result<(), HostError> {
        let session = self.session.as_mut().ok_or(HostError::NotMounted)?;

        session.active_scene = None;
        session.scene.clear(ClearMode::KeepEnvironment);
        session.engine.release(&session.scene.drain_disposed());

        let descriptor = self.registry.resolve(id);
        if descriptor.id != id {
            log::debug!("unknown scene '{}', using '{}'", id, descriptor.id);
        }

        let factory = self.registry.factory_for(&descriptor.id);
        if let Err(source) = factory.populate(&mut session.scene) {
            log::error!("scene '{}' failed to build: {}", descriptor.id, source);
            session.scene.clear(ClearMode::KeepEnvironment);
            session.engine.release(&session.scene.drain_disposed());
            return Err(HostError::Factory {
                scene: descriptor.id.clone(),
                source,
            });
        }

        session.active_scene = Some(descriptor.id.clone());
        log::info!("loaded scene '{}': {:?}", descriptor.id, session.scene.counts());

        if self.inspector_visible {
            if let Some(inspector) = self.inspector.get_mut() {
                inspector.attach(&session.scene);
            }
        }
        Ok(())
    }

    /// Show or hide the inspector overlay.
    ///
    /// The overlay is loaded on the first show; the flag only flips once a
    /// load has succeeded. Any actual change of visibility schedules one
    /// layout recomputation, run by the next `frame` after it has drawn.
    pub async fn set_inspector_visible(&mut self, visible: bool) -> Result<(), HostError> {
        if visible {
            self.inspector.ensure_loaded().await?;
            if let (Some(inspector), Some(session)) = (self.inspector.get_mut(), &self.session) {
                inspector.attach(&session.scene);
            }
        } else if let Some(inspector) = self.inspector.get_mut() {
            inspector.detach();
        }

        if self.inspector_visible != visible {
            self.inspector_visible = visible;
            self.layout_pending = true;
            log::debug!("inspector {}", if visible { "shown" } else { "hidden" });
        }
        Ok(())
    }

    pub async fn toggle_inspector(&mut self) -> Result<(), HostError> {
        let visible = !self.inspector_visible;
        self.set_inspector_visible(visible).await
    }

    pub fn inspector_visible(&self) -> bool {
        self.inspector_visible
    }

    pub fn inspector_load_attempts(&self) -> usize {
        self.inspector.load_attempts()
    }

    pub fn layout_pending(&self) -> bool {
        self.layout_pending
    }

    /// Re-measure the surface and pass the result to the engine and the
    /// scene. Safe to call redundantly; no-op while unmounted.
    pub fn resize(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.engine.surface().drawable_region() {
            Some(viewport) if !viewport.is_empty() => {
                session.engine.resize(viewport);
                session.scene.set_resolution(viewport.width, viewport.height);
            }
            _ => log::debug!("resize skipped: surface has no drawable region"),
        }
    }

    /// Body of the render loop: advance, draw, then run a pending layout
    /// recomputation. No-op while unmounted.
    pub fn frame(&mut self, info: &FrameInfo, chrome: Option<&E::Chrome>) -> Result<(), HostError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        session.scene.advance(info);
        let rendered = session.engine.render(&session.scene, chrome);

        if self.layout_pending {
            self.layout_pending = false;
            self.resize();
        }

        rendered.map_err(HostError::from)
    }

    pub fn pointer_input(&mut self, input: PointerInput) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match input {
            PointerInput::Moved { x, y } => {
                let pointer = session
                    .engine
                    .surface()
                    .drawable_region()
                    .and_then(|region| region.normalize(x, y));
                session.scene.set_pointer(pointer);
            }
            PointerInput::Left => session.scene.set_pointer(None),
            PointerInput::Drag { dx, dy } => {
                if let Some(arc) = session.scene.active_camera_mut().and_then(|c| c.arc_rotate_mut()) {
                    arc.orbit(dx, dy);
                }
            }
            PointerInput::Wheel { steps } => {
                if let Some(arc) = session.scene.active_camera_mut().and_then(|c| c.arc_rotate_mut()) {
                    arc.zoom(steps);
                }
            }
        }
    }

    /// Draw the scene's own controls, then the inspector when it is shown
    pub fn show_overlays(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.scene.show_controls(ctx);

        if !self.inspector_visible {
            return;
        }
        if let Some(inspector) = self.inspector.get_mut() {
            if inspector.is_attached() {
                inspector.ui(ctx, &mut session.scene);
            }
        }
    }

    /// Dispose everything, including the environment, then the engine.
    /// No-op when not mounted.
    pub fn unmount(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Some(inspector) = self.inspector.get_mut() {
            inspector.detach();
        }
        session.scene.clear(ClearMode::Everything);
        session.engine.release(&session.scene.drain_disposed());
        session.engine.dispose();
        self.layout_pending = false;

        log::info!("scene host unmounted");
    }

    pub fn active_scene_id(&self) -> Option<&str> {
        self.session.as_ref()?.active_scene.as_deref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.session.as_ref().map(|s| &s.scene)
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.session.as_mut().map(|s| &mut s.scene)
    }

    pub fn engine(&self) -> Option<&E> {
        self.session.as_ref().map(|s| &s.engine)
    }
}

impl<E: Engine> Drop for SceneHost<E> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Subscribes a shared host to the bus. Dropping the binding unsubscribes.
pub struct HostBinding {
    _subscriptions: [Subscription; 2],
}

impl HostBinding {
    pub fn connect<E: Engine + 'static>(host: &Rc<RefCell<SceneHost<E>>>, bus: &Rc<EventBus>) -> Self {
        let weak = Rc::downgrade(host);
        let scene_changed = bus.subscribe_scoped(EventKind::SceneChanged, move |event| {
            let (SceneEvent::SceneChanged(id), Some(host)) = (event, weak.upgrade()) else {
                return Ok(());
            };
            let mut host = host
                .try_borrow_mut()
                .map_err(|_| anyhow::anyhow!("scene host is busy"))?;
            host.swap_scene(id)?;
            Ok(())
        });

        let weak = Rc::downgrade(host);
        let inspector_toggle = bus.subscribe_scoped(EventKind::InspectorToggle, move |_| {
            let Some(host) = weak.upgrade() else {
                return Ok(());
            };
            let mut host = host
                .try_borrow_mut()
                .map_err(|_| anyhow::anyhow!("scene host is busy"))?;
            pollster::block_on(host.toggle_inspector())?;
            Ok(())
        });

        Self {
            _subscriptions: [scene_changed, inspector_toggle],
        }
    }
}
