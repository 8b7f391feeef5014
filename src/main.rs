use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use scene_gallery::cli::Cli;
use scene_gallery::engine::{CanvasSurface, EguiPaint, GpuEngine, HeadlessEngine, HeadlessSurface};
use scene_gallery::frame::{FixedStep, FrameClock};
use scene_gallery::host::inspector::SceneInspectorLoader;
use scene_gallery::host::surface::Viewport;
use scene_gallery::host::{HostBinding, PointerInput, SceneHost};
use scene_gallery::preferences::{PreferenceStore, Theme};
use scene_gallery::ui::SceneSidebar;
use scene_gallery::{EventBus, SceneRegistry};

// === Constants ===

const FPS_UPDATE_INTERVAL: f32 = 1.0;
const PIXELS_PER_WHEEL_STEP: f32 = 40.0;

// === Windowed gallery ===

/// Everything that lives as long as the window
struct Gallery {
    window: Arc<Window>,
    canvas: CanvasSurface,
    host: Rc<RefCell<SceneHost<GpuEngine>>>,
    sidebar: SceneSidebar,
    _binding: HostBinding,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    clock: FrameClock,
    canvas_region: Option<Viewport>,
    cursor: Option<PhysicalPosition<f64>>,
    dragging: bool,
    fps: f32,
    fps_frames: u32,
    fps_timer: f32,
}

impl Gallery {
    fn redraw(&mut self, show_sidebar: bool) -> anyhow::Result<()> {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let fps = self.fps;
        let mut canvas_rect = None;

        // The host is only borrowed after the sidebar has published its events
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if show_sidebar {
                self.sidebar.ui(ctx);
            }
            self.host.borrow_mut().show_overlays(ctx);

            let rect = ctx.available_rect();
            canvas_rect = Some(rect);
            egui::Area::new(egui::Id::new("fps"))
                .fixed_pos(rect.left_top() + egui::vec2(10.0, 10.0))
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{:.0} FPS", fps))
                            .color(egui::Color32::from_rgb(74, 158, 255)),
                    );
                });
        });

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let paint = EguiPaint {
            primitives: self.egui_ctx.tessellate(full_output.shapes, pixels_per_point),
            textures_delta: full_output.textures_delta,
            pixels_per_point,
        };

        let region = canvas_rect.map(|rect| {
            Viewport::new(
                (rect.min.x * pixels_per_point).round() as u32,
                (rect.min.y * pixels_per_point).round() as u32,
                (rect.width() * pixels_per_point).round() as u32,
                (rect.height() * pixels_per_point).round() as u32,
            )
        });
        let region_changed = region.is_some() && region != self.canvas_region;
        if let (true, Some(region)) = (region_changed, region) {
            self.canvas.set_region(region);
            self.canvas_region = Some(region);
        }

        let Some(info) = self.clock.next() else {
            return Ok(());
        };
        self.update_fps(info.delta);

        let mut host = self.host.borrow_mut();
        host.frame(&info, Some(&paint))?;
        if region_changed {
            host.resize();
        }
        Ok(())
    }

    fn update_fps(&mut self, delta: f32) {
        self.fps_frames += 1;
        self.fps_timer += delta;

        if self.fps_timer >= FPS_UPDATE_INTERVAL {
            self.fps = self.fps_frames as f32 / self.fps_timer;
            log::trace!("FPS: {:.1}", self.fps);
            self.fps_frames = 0;
            self.fps_timer = 0.0;
        }
    }

    fn pointer(&self, input: PointerInput) {
        self.host.borrow_mut().pointer_input(input);
    }

    fn handle_pointer_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    self.pointer(PointerInput::Drag {
                        dx: (position.x - last.x) as f32,
                        dy: (position.y - last.y) as f32,
                    });
                }
                self.cursor = Some(*position);
                self.pointer(PointerInput::Moved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.dragging = false;
                self.pointer(PointerInput::Left);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed && !self.egui_ctx.wants_pointer_input();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.egui_ctx.wants_pointer_input() {
                    return;
                }
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_WHEEL_STEP,
                };
                self.pointer(PointerInput::Wheel { steps });
            }
            _ => {}
        }
    }

    fn shutdown(&mut self) {
        self.host.borrow_mut().unmount();
    }
}

// === Application ===

struct App {
    cli: Cli,
    registry: Rc<SceneRegistry>,
    bus: Rc<EventBus>,
    store: Rc<dyn PreferenceStore>,
    gallery: Option<Gallery>,
}

impl App {
    fn new(cli: Cli, registry: Rc<SceneRegistry>, store: Rc<dyn PreferenceStore>) -> Self {
        Self {
            cli,
            registry,
            bus: Rc::new(EventBus::new()),
            store,
            gallery: None,
        }
    }

    fn open(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Gallery> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("Scene Gallery")
                    .with_inner_size(winit::dpi::LogicalSize::new(self.cli.width, self.cli.height)),
            )?,
        );

        let theme = Theme::resolve(&*self.store, window.theme().map(Theme::from));
        log::info!("using {} theme", theme);

        let canvas = CanvasSurface::new(Arc::clone(&window));
        let host: Rc<RefCell<SceneHost<GpuEngine>>> = Rc::new(RefCell::new(SceneHost::new(
            Rc::clone(&self.registry),
            SceneInspectorLoader,
        )));
        host.borrow_mut().mount(canvas.clone())?;
        let binding = HostBinding::connect(&host, &self.bus);

        let mut sidebar = SceneSidebar::new(
            Rc::clone(&self.registry),
            Rc::clone(&self.bus),
            Rc::clone(&self.store),
            theme,
        );
        if let Err(e) = sidebar.select(&self.cli.scene) {
            log::error!("initial scene failed: {}", e);
        }
        if self.cli.inspector {
            if let Err(e) = sidebar.toggle_inspector() {
                log::error!("inspector failed to open: {}", e);
            }
        }

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Ok(Gallery {
            window,
            canvas,
            host,
            sidebar,
            _binding: binding,
            egui_ctx,
            egui_state,
            clock: FrameClock::new(),
            canvas_region: None,
            cursor: None,
            dragging: false,
            fps: 0.0,
            fps_frames: 0,
            fps_timer: 0.0,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gallery.is_some() {
            return;
        }
        match self.open(event_loop) {
            Ok(gallery) => self.gallery = Some(gallery),
            Err(e) => {
                log::error!("failed to start gallery: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let show_sidebar = !self.cli.no_ui;
        let Some(gallery) = self.gallery.as_mut() else {
            return;
        };

        let consumed = gallery.egui_state.on_window_event(&gallery.window, &event).consumed;

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                gallery.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                gallery.host.borrow_mut().resize();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = gallery.redraw(show_sidebar) {
                    log::error!("frame failed: {:#}", e);
                }
            }
            ref pointer_event if !consumed => gallery.handle_pointer_event(pointer_event),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gallery) = &self.gallery {
            gallery.window.request_redraw();
        }
    }
}

// === Headless ===

fn run_headless(cli: &Cli, registry: Rc<SceneRegistry>) -> anyhow::Result<()> {
    let surface = HeadlessSurface::new(cli.width, cli.height);
    let mut host: SceneHost<HeadlessEngine> = SceneHost::new(registry, SceneInspectorLoader);

    host.mount(surface.clone())?;
    host.swap_scene(&cli.scene)?;
    if cli.inspector {
        pollster::block_on(host.set_inspector_visible(true))?;
    }

    for info in FixedStep::display_rate().take(cli.frames as usize) {
        host.frame(&info, None)?;
    }

    let scene_id = host.active_scene_id().unwrap_or_default().to_string();
    let counts = host.scene().map(|scene| scene.counts());
    host.unmount();

    let stats = surface.stats();
    log::info!(
        "headless run of '{}' finished: {} frame(s), {} object(s) released",
        scene_id,
        stats.frames,
        stats.released.len()
    );
    if !cli.no_ui {
        println!("scene: {}", scene_id);
        println!("frames: {}", stats.frames);
        if let Some(counts) = counts {
            println!("objects: {:?}", counts);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let registry = Rc::new(SceneRegistry::builtin()?);

    if cli.headless {
        return run_headless(&cli, registry);
    }

    let prefs = cli.preference_store();
    log::info!("preferences at {}", prefs.path().display());
    let store: Rc<dyn PreferenceStore> = Rc::new(prefs);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli, registry, store);
    event_loop.run_app(&mut app)?;

    Ok(())
}
