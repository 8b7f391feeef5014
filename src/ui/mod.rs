//! egui chrome around the canvas

pub mod sidebar;

pub use sidebar::{CategoryFilter, SceneSidebar, SelectionState, ViewMode, SIDEBAR_WIDTH};
