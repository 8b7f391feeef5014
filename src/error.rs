//! Error taxonomy for the gallery.
//!
//! Unknown scene ids are deliberately absent: they resolve to the default
//! scene and never surface as errors.

/// Raised when a surface cannot host an engine. Fatal: the surface stays
/// blank until it is mounted again with a valid target.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("surface has no drawable region")]
    InvalidSurface,
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(String),
    #[error("failed to find an appropriate adapter: {0}")]
    Adapter(String),
    #[error("failed to create device: {0}")]
    Device(String),
}

/// Raised by a scene factory or by scene edits
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("material {0:?} does not exist in this scene")]
    MissingMaterial(crate::scene::MaterialId),
    #[error("material '{material}' has no parameter '{param}'")]
    UnknownParam { material: String, param: String },
    #[error("material '{0}' already declares {1} parameters")]
    TooManyParams(String, usize),
    #[error("material '{0}' is not a shader material")]
    NotAShaderMaterial(String),
    #[error("{0}")]
    Invalid(String),
}

/// Raised while loading the inspector overlay
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OverlayError {
    #[error("inspector failed to load: {0}")]
    Load(String),
}

/// Raised by an engine while drawing a frame
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("engine has been disposed")]
    Disposed,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("cannot mount: {0}")]
    Mount(#[from] MountError),
    #[error("host is already mounted")]
    AlreadyMounted,
    #[error("host is not mounted")]
    NotMounted,
    #[error("scene '{scene}' failed to build: {source}")]
    Factory {
        scene: String,
        #[source]
        source: SceneError,
    },
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error("render failed: {0}")]
    Render(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("registry has no scenes")]
    Empty,
    #[error("scene id '{0}' is registered twice")]
    DuplicateId(String),
    #[error("default scene '{0}' is not registered")]
    MissingDefault(String),
}
