//! Persisted user preferences. There is exactly one: the theme.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};

/// Key under which the dark-mode flag is stored
pub const DARK_MODE_KEY: &str = "dark_mode";

const APP_DIR: &str = "scene-gallery";
const PREFS_FILE: &str = "preferences.json";

/// Per-user preference file used when `--prefs` is not given
pub fn default_prefs_path() -> PathBuf {
    prefs_path_from(|key| std::env::var_os(key))
}

/// `$XDG_CONFIG_HOME`, then `%APPDATA%`, then `$HOME/.config`, then the
/// working directory
fn prefs_path_from(var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    let present = |key: &str| var(key).filter(|v| !v.is_empty()).map(PathBuf::from);
    let config_dir = present("XDG_CONFIG_HOME")
        .or_else(|| present("APPDATA"))
        .or_else(|| present("HOME").map(|home| home.join(".config")))
        .unwrap_or_default();
    config_dir.join(APP_DIR).join(PREFS_FILE)
}

/// Boolean key-value store
pub trait PreferenceStore {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn set_bool(&self, key: &str, value: bool) -> anyhow::Result<()>;
}

/// Preferences kept as a JSON object in a single file.
///
/// A missing file reads as empty. A malformed file is logged and also read
/// as empty; it is overwritten on the next `set_bool`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: RefCell<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("ignoring preferences in {}: {:#}", path.display(), e);
                Map::new()
            }
        };
        Self {
            path,
            values: RefCell::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> anyhow::Result<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        match serde_json::from_str(&text).context("parsing preferences")? {
            Value::Object(values) => Ok(values),
            other => anyhow::bail!("expected a JSON object, found {}", other),
        }
    }

    fn write(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&*self.values.borrow())?;
        fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.borrow().get(key).and_then(Value::as_bool)
    }

    fn set_bool(&self, key: &str, value: bool) -> anyhow::Result<()> {
        self.values.borrow_mut().insert(key.to_string(), Value::Bool(value));
        self.write()
    }
}

/// Non-persistent store, used by tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.borrow().get(key).copied()
    }

    fn set_bool(&self, key: &str, value: bool) -> anyhow::Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Stored flag first, then the window system's preference, then light
    pub fn resolve(store: &dyn PreferenceStore, ambient: Option<Theme>) -> Theme {
        match store.get_bool(DARK_MODE_KEY) {
            Some(dark) => Theme::from_dark(dark),
            None => ambient.unwrap_or_default(),
        }
    }

    pub fn from_dark(dark: bool) -> Theme {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Theme {
        Theme::from_dark(!self.is_dark())
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        }
    }
}

impl From<winit::window::Theme> for Theme {
    fn from(theme: winit::window::Theme) -> Self {
        match theme {
            winit::window::Theme::Light => Theme::Light,
            winit::window::Theme::Dark => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_value_wins_over_ambient() {
        let store = MemoryStore::new();
        store.set_bool(DARK_MODE_KEY, false).unwrap();
        assert_eq!(Theme::resolve(&store, Some(Theme::Dark)), Theme::Light);
    }

    #[test]
    fn ambient_used_when_nothing_stored() {
        let store = MemoryStore::new();
        assert_eq!(Theme::resolve(&store, Some(Theme::Dark)), Theme::Dark);
        assert_eq!(Theme::resolve(&store, None), Theme::Light);
    }

    #[test]
    fn json_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        JsonFileStore::open(&path).set_bool(DARK_MODE_KEY, true).unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get_bool(DARK_MODE_KEY), Some(true));
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json"));
        assert_eq!(store.get_bool(DARK_MODE_KEY), None);
    }

    #[test]
    fn malformed_file_reads_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get_bool(DARK_MODE_KEY), None);

        store.set_bool(DARK_MODE_KEY, false).unwrap();
        assert_eq!(JsonFileStore::open(&path).get_bool(DARK_MODE_KEY), Some(false));
    }

    #[test]
    fn non_object_json_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[true]").unwrap();
        assert_eq!(JsonFileStore::open(&path).get_bool(DARK_MODE_KEY), None);
    }

    #[test]
    fn default_path_prefers_xdg_config() {
        let path = prefs_path_from(|key| match key {
            "XDG_CONFIG_HOME" => Some("/xdg".into()),
            "HOME" => Some("/home/me".into()),
            _ => None,
        });
        assert_eq!(path, Path::new("/xdg/scene-gallery/preferences.json"));
    }

    #[test]
    fn default_path_falls_back_to_home_config() {
        let path = prefs_path_from(|key| match key {
            "XDG_CONFIG_HOME" => Some("".into()),
            "HOME" => Some("/home/me".into()),
            _ => None,
        });
        assert_eq!(path, Path::new("/home/me/.config/scene-gallery/preferences.json"));
    }

    #[test]
    fn default_path_without_environment_is_relative() {
        let path = prefs_path_from(|_| None);
        assert_eq!(path, Path::new("scene-gallery/preferences.json"));
    }

    #[test]
    fn toggled_flips() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert!(!Theme::Dark.toggled().is_dark());
    }
}
