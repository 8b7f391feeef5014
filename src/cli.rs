// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::preferences::{default_prefs_path, JsonFileStore};

#[derive(Parser, Debug, Clone)]
#[command(name = "scene-gallery")]
#[command(about = "Gallery of small 3D demo scenes", long_about = None)]
pub struct Cli {
    /// Scene to load at start-up (unknown ids fall back to the default scene)
    #[arg(long, default_value = crate::scenes::DEFAULT_SCENE_ID)]
    pub scene: String,

    /// Open the inspector overlay at start-up
    #[arg(long, default_value = "false")]
    pub inspector: bool,

    /// Hide the sidebar and draw only the canvas
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,

    /// Preference file; defaults to scene-gallery/preferences.json in the user config dir
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Run without a window using the headless engine
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = 120)]
    pub frames: u64,
}

impl Cli {
    pub fn prefs_path(&self) -> PathBuf {
        self.prefs.clone().unwrap_or_else(default_prefs_path)
    }

    /// File-backed store for windowed runs
    pub fn preference_store(&self) -> JsonFileStore {
        JsonFileStore::open(self.prefs_path())
    }
}
