pub mod cli;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod host;
pub mod preferences;
pub mod scene;
pub mod scenes;
pub mod ui;

pub use error::{EngineError, HostError, MountError, OverlayError, RegistryError, SceneError};
pub use events::{EventBus, EventKind, SceneEvent};
pub use host::{HostBinding, SceneHost};
pub use scenes::SceneRegistry;
