use std::rc::Rc;

use crate::events::{BusError, EventBus, SceneEvent};
use crate::preferences::{PreferenceStore, Theme, DARK_MODE_KEY};
use crate::scenes::{SceneCategory, SceneDescriptor, SceneRegistry};

pub const SIDEBAR_WIDTH: f32 = 288.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    Selector,
    #[default]
    Cards,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(SceneCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: SceneCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(only) => *only == category,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(category) => category.label(),
        }
    }
}

/// What the sidebar believes is on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub active_scene_id: String,
    pub inspector_visible: bool,
    pub theme: Theme,
}

enum Action {
    Select(String),
    ToggleInspector,
    ToggleTheme,
    View(ViewMode),
    Filter(CategoryFilter),
}

/// Left panel listing the registry. Talks to the scene host only through
/// the bus.
pub struct SceneSidebar {
    registry: Rc<SceneRegistry>,
    bus: Rc<EventBus>,
    store: Rc<dyn PreferenceStore>,
    state: SelectionState,
    view_mode: ViewMode,
    filter: CategoryFilter,
}

impl SceneSidebar {
    pub fn new(
        registry: Rc<SceneRegistry>,
        bus: Rc<EventBus>,
        store: Rc<dyn PreferenceStore>,
        theme: Theme,
    ) -> Self {
        let state = SelectionState {
            active_scene_id: registry.default_id().to_string(),
            inspector_visible: false,
            theme,
        };
        Self {
            registry,
            bus,
            store,
            state,
            view_mode: ViewMode::default(),
            filter: CategoryFilter::default(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    /// Publish a scene change. Once every handler accepts it, the highlighted
    /// entry follows the registry's resolution of `id`, so unknown ids
    /// highlight the default scene.
    pub fn select(&mut self, id: &str) -> Result<(), BusError> {
        self.bus.publish(&SceneEvent::SceneChanged(id.to_string()))?;
        self.state.active_scene_id = self.registry.resolve(id).id.clone();
        Ok(())
    }

    /// Ask for the inspector to flip. The local flag follows only if every
    /// handler accepted the toggle.
    pub fn toggle_inspector(&mut self) -> Result<(), BusError> {
        self.bus.publish(&SceneEvent::InspectorToggle)?;
        self.state.inspector_visible = !self.state.inspector_visible;
        Ok(())
    }

    /// Flip the theme and persist it. A failed write is logged; the theme
    /// still changes for this session.
    pub fn toggle_theme(&mut self) -> Theme {
        self.state.theme = self.state.theme.toggled();
        if let Err(e) = self.store.set_bool(DARK_MODE_KEY, self.state.theme.is_dark()) {
            log::warn!("failed to save theme preference: {:#}", e);
        }
        self.state.theme
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    /// Registry entries that pass the current filter, in registry order
    pub fn visible_scenes(&self) -> Vec<&SceneDescriptor> {
        self.registry
            .list()
            .filter(|d| self.filter.matches(d.category))
            .collect()
    }

    pub fn ui(&mut self, ctx: &egui::Context) {
        ctx.set_visuals(self.state.theme.visuals());

        let mut actions = Vec::new();
        egui::SidePanel::left("scene_sidebar")
            .exact_width(SIDEBAR_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Scene Gallery");
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    let theme_label = if self.state.theme.is_dark() { "Light mode" } else { "Dark mode" };
                    if ui.button(theme_label).clicked() {
                        actions.push(Action::ToggleTheme);
                    }
                    let inspector_label = if self.state.inspector_visible {
                        "Hide Inspector"
                    } else {
                        "Show Inspector"
                    };
                    if ui.button(inspector_label).clicked() {
                        actions.push(Action::ToggleInspector);
                    }
                });
                ui.separator();

                ui.horizontal(|ui| {
                    for (mode, label) in [(ViewMode::Selector, "Selector View"), (ViewMode::Cards, "Card View")] {
                        if ui.selectable_label(self.view_mode == mode, label).clicked() {
                            actions.push(Action::View(mode));
                        }
                    }
                });

                egui::ComboBox::from_label("Category")
                    .selected_text(self.filter.label())
                    .show_ui(ui, |ui| {
                        let options = std::iter::once(CategoryFilter::All)
                            .chain(SceneCategory::ALL.into_iter().map(CategoryFilter::Only));
                        for option in options {
                            if ui.selectable_label(self.filter == option, option.label()).clicked() {
                                actions.push(Action::Filter(option));
                            }
                        }
                    });
                ui.separator();

                let scenes = self.visible_scenes();
                match self.view_mode {
                    ViewMode::Selector => self.selector_ui(ui, &scenes, &mut actions),
                    ViewMode::Cards => self.cards_ui(ui, &scenes, &mut actions),
                }
            });

        for action in actions {
            self.apply(action);
        }
    }

    fn selector_ui(&self, ui: &mut egui::Ui, scenes: &[&SceneDescriptor], actions: &mut Vec<Action>) {
        let active = self.registry.resolve(&self.state.active_scene_id);
        egui::ComboBox::from_id_salt("scene_selector")
            .selected_text(active.display_name.as_str())
            .width(SIDEBAR_WIDTH - 24.0)
            .show_ui(ui, |ui| {
                for scene in scenes {
                    if ui
                        .selectable_label(scene.id == active.id, scene.display_name.as_str())
                        .clicked()
                    {
                        actions.push(Action::Select(scene.id.clone()));
                    }
                }
            });
        ui.add_space(6.0);
        ui.label(active.description.as_str());
    }

    fn cards_ui(&self, ui: &mut egui::Ui, scenes: &[&SceneDescriptor], actions: &mut Vec<Action>) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for scene in scenes {
                let active = scene.id == self.state.active_scene_id;
                let visuals = ui.visuals();
                let frame = if active {
                    egui::Frame::group(ui.style())
                        .fill(visuals.selection.bg_fill)
                        .stroke(visuals.selection.stroke)
                } else {
                    egui::Frame::group(ui.style())
                };

                let response = frame
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.strong(scene.display_name.as_str());
                        ui.label(scene.description.as_str());
                        ui.weak(format!("ID: {}", scene.id));
                    })
                    .response
                    .interact(egui::Sense::click());

                if response.clicked() {
                    actions.push(Action::Select(scene.id.clone()));
                }
                ui.add_space(4.0);
            }
        });
    }

    fn apply(&mut self, action: Action) {
        // Handler failures are already logged by the bus
        match action {
            Action::Select(id) => {
                let _ = self.select(&id);
            }
            Action::ToggleInspector => {
                let _ = self.toggle_inspector();
            }
            Action::ToggleTheme => {
                self.toggle_theme();
            }
            Action::View(mode) => self.set_view_mode(mode),
            Action::Filter(filter) => self.set_filter(filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::preferences::MemoryStore;
    use std::cell::RefCell;

    fn sidebar() -> (SceneSidebar, Rc<EventBus>, Rc<MemoryStore>) {
        let registry = Rc::new(SceneRegistry::builtin().unwrap());
        let bus = Rc::new(EventBus::new());
        let store = Rc::new(MemoryStore::new());
        let sidebar = SceneSidebar::new(registry, Rc::clone(&bus), store.clone(), Theme::Light);
        (sidebar, bus, store)
    }

    #[test]
    fn defaults_to_cards_and_default_scene() {
        let (sidebar, _, _) = sidebar();
        assert_eq!(sidebar.view_mode(), ViewMode::Cards);
        assert_eq!(sidebar.state().active_scene_id, "default");
        assert_eq!(sidebar.visible_scenes().len(), 5);
    }

    #[test]
    fn select_publishes_raw_id() {
        let (mut sidebar, bus, _) = sidebar();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(EventKind::SceneChanged, move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

        sidebar.select("nope").unwrap();
        assert_eq!(*seen.borrow(), vec![SceneEvent::SceneChanged("nope".into())]);
        assert_eq!(sidebar.state().active_scene_id, "default");
    }

    #[test]
    fn rejected_select_keeps_highlight() {
        let (mut sidebar, bus, _) = sidebar();
        sidebar.select("sphere").unwrap();

        let _failing = bus.subscribe_scoped(EventKind::SceneChanged, |_| anyhow::bail!("scene failed to build"));
        assert!(sidebar.select("shield").is_err());
        assert_eq!(sidebar.state().active_scene_id, "sphere");
    }

    #[test]
    fn filter_keeps_registry_order() {
        let (mut sidebar, _, _) = sidebar();
        sidebar.set_filter(CategoryFilter::Only(SceneCategory::ShaderMaterial));
        let ids: Vec<_> = sidebar.visible_scenes().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["sphere", "shield"]);
    }

    #[test]
    fn theme_toggle_is_persisted() {
        let (mut sidebar, _, store) = sidebar();
        assert_eq!(sidebar.toggle_theme(), Theme::Dark);
        assert_eq!(store.get_bool(DARK_MODE_KEY), Some(true));
    }
}
