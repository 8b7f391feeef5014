use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use glam::Vec2;

use scene_gallery::engine::{HeadlessEngine, HeadlessSurface};
use scene_gallery::error::{HostError, MountError, OverlayError, SceneError};
use scene_gallery::events::{EventBus, SceneEvent};
use scene_gallery::frame::{FixedStep, FrameInfo};
use scene_gallery::host::inspector::{Inspector, InspectorLoader, SceneInspector, SceneInspectorLoader};
use scene_gallery::host::surface::Viewport;
use scene_gallery::host::{HostBinding, HostState, PointerInput, SceneHost};
use scene_gallery::scene::mesh::Geometry;
use scene_gallery::scene::{Disposed, Scene, SceneCounts};
use scene_gallery::scenes::{create_default_scene, SceneCategory, SceneDescriptor, SceneRegistry};

// ============================================================================
// Helpers
// ============================================================================

type Host = SceneHost<HeadlessEngine>;

fn builtin() -> Rc<SceneRegistry> {
    Rc::new(SceneRegistry::builtin().unwrap())
}

fn mounted_with(registry: Rc<SceneRegistry>) -> (Host, HeadlessSurface) {
    let surface = HeadlessSurface::new(640, 480);
    let mut host = Host::new(registry, SceneInspectorLoader);
    host.mount(surface.clone()).unwrap();
    (host, surface)
}

fn mounted() -> (Host, HeadlessSurface) {
    mounted_with(builtin())
}

fn counts(host: &Host) -> SceneCounts {
    host.scene().map(Scene::counts).unwrap()
}

fn frame(n: u64) -> FrameInfo {
    FrameInfo::new(n, n as f32 / 60.0, 1.0 / 60.0)
}

/// Counts load calls and fails the first `failures` of them
struct CountingLoader {
    calls: Rc<Cell<usize>>,
    failures: usize,
}

impl InspectorLoader for CountingLoader {
    fn load(&self) -> LocalBoxFuture<'static, Result<Box<dyn Inspector>, OverlayError>> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        let fail = call < self.failures;
        async move {
            if fail {
                Err(OverlayError::Load("network unavailable".into()))
            } else {
                Ok(Box::new(SceneInspector::default()) as Box<dyn Inspector>)
            }
        }
        .boxed_local()
    }
}

fn host_with_loader(failures: usize) -> (Host, Rc<Cell<usize>>, HeadlessSurface) {
    let calls = Rc::new(Cell::new(0));
    let loader = CountingLoader {
        calls: Rc::clone(&calls),
        failures,
    };
    let surface = HeadlessSurface::new(640, 480);
    let mut host = Host::new(builtin(), loader);
    host.mount(surface.clone()).unwrap();
    (host, calls, surface)
}

// ============================================================================
// Mount / unmount
// ============================================================================

#[test]
fn test_mount_installs_environment_only() {
    let (host, surface) = mounted();

    assert_eq!(host.state(), HostState::Mounted { scene: None });
    assert_eq!(surface.stats().engines_created, 1);

    let c = counts(&host);
    assert_eq!((c.meshes, c.materials, c.lights, c.cameras), (0, 0, 1, 1));
    assert!(host.scene().unwrap().active_camera().is_some());
    assert_eq!(host.scene().unwrap().resolution(), Vec2::new(640.0, 480.0));
}

#[test]
fn test_mount_twice_is_rejected() {
    let (mut host, surface) = mounted();
    let err = host.mount(surface.clone()).unwrap_err();

    assert!(matches!(err, HostError::AlreadyMounted));
    assert_eq!(surface.stats().engines_created, 1);
}

#[test]
fn test_mount_invalid_surface_fails() {
    let mut host = Host::new(builtin(), SceneInspectorLoader);
    let err = host.mount(HeadlessSurface::with_region(None)).unwrap_err();

    assert!(matches!(err, HostError::Mount(MountError::InvalidSurface)));
    assert_eq!(host.state(), HostState::Unmounted);
    assert!(matches!(host.swap_scene("default"), Err(HostError::NotMounted)));
}

#[test]
fn test_mount_unmount_unmount() {
    let (mut host, surface) = mounted();
    host.swap_scene("complex").unwrap();

    host.unmount();
    host.unmount();

    assert_eq!(host.state(), HostState::Unmounted);
    let stats = surface.stats();
    assert!(stats.disposed);
    assert!(stats.live_meshes.is_empty());
    assert_eq!(
        stats.released.iter().filter(|d| matches!(d, Disposed::Camera(_))).count(),
        1,
        "the environment camera goes on unmount"
    );
}

#[test]
fn test_unmount_without_mount_is_noop() {
    let mut host = Host::new(builtin(), SceneInspectorLoader);
    host.unmount();
    assert!(!host.is_mounted());
}

#[test]
fn test_dropping_host_unmounts() {
    let (host, surface) = mounted();
    drop(host);
    assert!(surface.stats().disposed);
}

#[test]
fn test_frame_before_mount_is_noop() {
    let mut host = Host::new(builtin(), SceneInspectorLoader);
    assert!(host.frame(&frame(0), None).is_ok());
}

// ============================================================================
// Scene swapping
// ============================================================================

#[test]
fn test_swap_matches_fresh_factory_for_every_scene() {
    let registry = builtin();
    let (mut host, _) = mounted_with(Rc::clone(&registry));

    for descriptor in registry.list() {
        let mut fresh = Scene::new();
        registry.factory_for(&descriptor.id).populate(&mut fresh).unwrap();
        let expected = fresh.counts();

        host.swap_scene(&descriptor.id).unwrap();
        let actual = counts(&host);

        assert_eq!(actual.meshes, expected.meshes, "{}", descriptor.id);
        assert_eq!(actual.materials, expected.materials, "{}", descriptor.id);
        assert_eq!(actual.post_processes, expected.post_processes, "{}", descriptor.id);
        assert_eq!(actual.observers, expected.observers, "{}", descriptor.id);
        assert_eq!(actual.lights, expected.lights + 1, "{} plus environment light", descriptor.id);
        assert_eq!(host.active_scene_id(), Some(descriptor.id.as_str()));
    }
}

#[test]
fn test_unknown_id_behaves_like_default() {
    let (mut host, _) = mounted();

    host.swap_scene("default").unwrap();
    let expected = counts(&host);

    host.swap_scene("sphere").unwrap();
    host.swap_scene("bogus").unwrap();

    assert_eq!(counts(&host), expected);
    assert_eq!(host.active_scene_id(), Some("default"));
    let names: Vec<&str> = host.scene().unwrap().meshes().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["ground", "box"]);
}

#[test]
fn test_scene_is_empty_when_factory_runs() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let registry = SceneRegistry::builder("default")
        .scene(
            SceneDescriptor::new("default", "Default", "", SceneCategory::Basic),
            create_default_scene,
        )
        .scene(
            SceneDescriptor::new("counting", "Counting", "", SceneCategory::Basic),
            move |scene: &mut Scene| -> Result<(), SceneError> {
                sink.borrow_mut().push(scene.counts());
                scene.add_mesh("marker", Geometry::cube(1.0));
                Ok(())
            },
        )
        .build()
        .unwrap();
    let (mut host, _) = mounted_with(Rc::new(registry));

    host.swap_scene("default").unwrap();
    host.swap_scene("counting").unwrap();
    host.swap_scene("counting").unwrap();

    for before in seen.borrow().iter() {
        assert_eq!(before.meshes, 0);
        assert_eq!(before.materials, 0);
        assert_eq!(before.observers, 0);
        assert_eq!(before.lights, 1, "only the persistent light remains");
    }
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_same_id_always_rebuilds() {
    let (mut host, surface) = mounted();
    host.swap_scene("sphere").unwrap();
    let first: Vec<_> = host.scene().unwrap().meshes().map(|m| m.id()).collect();

    host.swap_scene("sphere").unwrap();
    let second: Vec<_> = host.scene().unwrap().meshes().map(|m| m.id()).collect();

    assert_eq!(first.len(), second.len());
    assert!(first.iter().all(|id| !second.contains(id)), "fresh ids after rebuild");
    for id in &first {
        assert!(surface.stats().released.contains(&Disposed::Mesh(*id)));
    }
}

#[test]
fn test_swap_releases_gpu_side_meshes() {
    let (mut host, surface) = mounted();
    host.swap_scene("complex").unwrap();
    host.frame(&frame(0), None).unwrap();
    assert_eq!(surface.stats().live_meshes.len(), 10);

    host.swap_scene("default").unwrap();
    assert!(surface.stats().live_meshes.is_empty());

    host.frame(&frame(1), None).unwrap();
    assert_eq!(surface.stats().live_meshes.len(), 2);
}

#[test]
fn test_post_process_released_on_swap() {
    let (mut host, surface) = mounted();
    host.swap_scene("night-drive").unwrap();
    host.frame(&frame(0), None).unwrap();
    assert_eq!(surface.stats().live_post_processes.len(), 1);

    host.swap_scene("default").unwrap();
    assert!(surface.stats().live_post_processes.is_empty());
}

#[test]
fn test_factory_failure_leaves_empty_scene() {
    let registry = SceneRegistry::builder("default")
        .scene(
            SceneDescriptor::new("default", "Default", "", SceneCategory::Basic),
            create_default_scene,
        )
        .scene(
            SceneDescriptor::new("broken", "Broken", "", SceneCategory::Basic),
            |scene: &mut Scene| -> Result<(), SceneError> {
                scene.add_mesh("half-built", Geometry::cube(1.0));
                Err(SceneError::Invalid("shader failed to compile".into()))
            },
        )
        .build()
        .unwrap();
    let (mut host, _) = mounted_with(Rc::new(registry));
    host.swap_scene("default").unwrap();

    let err = host.swap_scene("broken").unwrap_err();
    match err {
        HostError::Factory { scene, .. } => assert_eq!(scene, "broken"),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(host.state(), HostState::Mounted { scene: None });
    let c = counts(&host);
    assert_eq!((c.meshes, c.materials, c.lights), (0, 0, 1));

    // Recovers on the next swap
    host.swap_scene("default").unwrap();
    assert_eq!(counts(&host).meshes, 2);
}

// ============================================================================
// Inspector
// ============================================================================

#[test]
fn test_inspector_loads_once() {
    let (mut host, calls, _) = host_with_loader(0);

    block_on(host.set_inspector_visible(true)).unwrap();
    block_on(host.set_inspector_visible(true)).unwrap();
    block_on(host.set_inspector_visible(false)).unwrap();
    block_on(host.set_inspector_visible(true)).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(host.inspector_load_attempts(), 1);
    assert!(host.inspector_visible());
}

#[test]
fn test_failed_load_does_not_show_and_is_retried() {
    let (mut host, calls, _) = host_with_loader(1);

    let err = block_on(host.set_inspector_visible(true)).unwrap_err();
    assert!(matches!(err, HostError::Overlay(_)));
    assert!(!host.inspector_visible());
    assert!(!host.layout_pending());

    block_on(host.set_inspector_visible(true)).unwrap();
    assert!(host.inspector_visible());
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_hide_schedules_one_layout_after_frame() {
    let (mut host, _, surface) = host_with_loader(0);
    host.swap_scene("default").unwrap();
    block_on(host.set_inspector_visible(true)).unwrap();
    host.frame(&frame(0), None).unwrap();
    let resizes_before = surface.stats().resizes.len();

    block_on(host.set_inspector_visible(false)).unwrap();
    assert!(host.layout_pending());
    assert_eq!(surface.stats().resizes.len(), resizes_before, "nothing measured during the hide");

    let frames_before = surface.stats().frames;
    host.frame(&frame(1), None).unwrap();
    let stats = surface.stats();
    assert_eq!(stats.frames, frames_before + 1);
    assert_eq!(stats.resizes.len(), resizes_before + 1);
    assert!(!host.layout_pending());

    host.frame(&frame(2), None).unwrap();
    assert_eq!(surface.stats().resizes.len(), resizes_before + 1, "exactly one");
}

#[test]
fn test_redundant_hide_schedules_nothing() {
    let (mut host, _, _) = host_with_loader(0);
    block_on(host.set_inspector_visible(false)).unwrap();
    assert!(!host.layout_pending());
    assert_eq!(host.inspector_load_attempts(), 0);
}

#[test]
fn test_toggle_flips_visibility() {
    let (mut host, _, _) = host_with_loader(0);
    block_on(host.toggle_inspector()).unwrap();
    assert!(host.inspector_visible());
    block_on(host.toggle_inspector()).unwrap();
    assert!(!host.inspector_visible());
}

#[test]
fn test_scene_controls_show_without_inspector() {
    let (mut host, _) = mounted();
    host.swap_scene("shield").unwrap();
    assert!(!host.inspector_visible());
    assert!(host.scene().unwrap().has_controls());

    // the first pass only sizes new windows
    let ctx = egui::Context::default();
    let _ = ctx.run(egui::RawInput::default(), |ctx| host.show_overlays(ctx));
    let output = ctx.run(egui::RawInput::default(), |ctx| host.show_overlays(ctx));
    assert!(!output.shapes.is_empty(), "shield window is drawn");

    host.swap_scene("default").unwrap();
    assert!(!host.scene().unwrap().has_controls());
}

// ============================================================================
// Resize and pointer
// ============================================================================

#[test]
fn test_resize_follows_surface() {
    let (mut host, surface) = mounted();
    surface.set_region(Some(Viewport::new(288, 0, 512, 256)));
    host.resize();
    host.resize();

    assert_eq!(host.engine().unwrap().viewport(), Viewport::new(288, 0, 512, 256));
    assert_eq!(host.scene().unwrap().resolution(), Vec2::new(512.0, 256.0));

    surface.set_region(None);
    host.resize();
    assert_eq!(host.engine().unwrap().viewport().width, 512, "lost region is ignored");
}

#[test]
fn test_pointer_is_canvas_relative() {
    let (mut host, surface) = mounted();
    surface.set_region(Some(Viewport::new(100, 0, 200, 100)));

    host.pointer_input(PointerInput::Moved { x: 150.0, y: 25.0 });
    assert_eq!(host.scene().unwrap().pointer(), Vec2::new(0.25, 0.75));

    host.pointer_input(PointerInput::Moved { x: 50.0, y: 25.0 });
    assert_eq!(host.scene().unwrap().pointer(), Vec2::splat(-1.0));

    host.pointer_input(PointerInput::Moved { x: 200.0, y: 50.0 });
    host.pointer_input(PointerInput::Left);
    assert_eq!(host.scene().unwrap().pointer(), Vec2::splat(-1.0));
}

#[test]
fn test_drag_orbits_default_camera() {
    let (mut host, _) = mounted();
    let before = host.scene().unwrap().active_camera().unwrap().position();

    host.pointer_input(PointerInput::Drag { dx: 40.0, dy: 0.0 });
    let after = host.scene().unwrap().active_camera().unwrap().position();
    assert_ne!(before, after);
}

#[test]
fn test_globals_track_scene_clock() {
    let (mut host, surface) = mounted();
    host.swap_scene("shield").unwrap();

    for info in FixedStep::display_rate().take(31) {
        host.frame(&info, None).unwrap();
    }
    let globals = surface.stats().last_globals.unwrap();
    assert!((globals.time - 0.5).abs() < 1e-4);
    assert_eq!(globals.light_count, 1);
}

// ============================================================================
// Bus binding
// ============================================================================

#[test]
fn test_binding_routes_events_to_host() {
    let bus = Rc::new(EventBus::new());
    let (host, surface) = mounted();
    let host = Rc::new(RefCell::new(host));
    let binding = HostBinding::connect(&host, &bus);

    bus.publish(&SceneEvent::SceneChanged("shield".into())).unwrap();
    assert_eq!(host.borrow().active_scene_id(), Some("shield"));

    bus.publish(&SceneEvent::InspectorToggle).unwrap();
    assert!(host.borrow().inspector_visible());

    drop(binding);
    bus.publish(&SceneEvent::SceneChanged("default".into())).unwrap();
    assert_eq!(host.borrow().active_scene_id(), Some("shield"));
    assert_eq!(surface.stats().engines_created, 1);
}

#[test]
fn test_binding_reports_factory_failure() {
    let registry = SceneRegistry::builder("default")
        .scene(
            SceneDescriptor::new("default", "Default", "", SceneCategory::Basic),
            |_: &mut Scene| -> Result<(), SceneError> { Err(SceneError::Invalid("no".into())) },
        )
        .build()
        .unwrap();
    let bus = Rc::new(EventBus::new());
    let (host, _) = mounted_with(Rc::new(registry));
    let host = Rc::new(RefCell::new(host));
    let _binding = HostBinding::connect(&host, &bus);

    assert!(bus.publish(&SceneEvent::SceneChanged("default".into())).is_err());
    assert_eq!(host.borrow().active_scene_id(), None);
}
