//! Settings store.
//!
//! A single `Settings` record, loaded once at startup and replaced wholesale
//! on every successful update. Readers get an `Arc` snapshot, so a handler
//! never observes a half-applied update. Every accepted update is written to
//! `settings.json` before `update` returns; a failed write is logged and the
//! next update writes the whole record again.

use crate::accelerator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SETTINGS_FILE: &str = "settings.json";

/// Logical (device independent) window rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationClickAction {
    #[default]
    OpenFile,
    OpenFolder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub quick_window_hotkey: String,
    pub new_chat_hotkey: String,
    pub run_on_startup: bool,
    pub quick_window_always_on_top: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_window_bounds: Option<WindowBounds>,
    pub start_minimized: bool,
    /// Minutes a hosted window may stay hidden before it is reloaded on show.
    pub auto_reset_timer: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_location: Option<PathBuf>,
    pub ask_everytime: bool,
    pub notification_click_action: NotificationClickAction,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quick_window_hotkey: "Alt+G".to_string(),
            new_chat_hotkey: "Ctrl+N".to_string(),
            run_on_startup: true,
            quick_window_always_on_top: true,
            quick_window_bounds: None,
            start_minimized: true,
            auto_reset_timer: 5.0,
            save_location: None,
            ask_everytime: true,
            notification_click_action: NotificationClickAction::OpenFile,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Validation(String),
    #[error("Could not persist settings to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Settings {
    /// Checks field constraints and returns the normalized record.
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        self.quick_window_hotkey = accelerator::normalize(&self.quick_window_hotkey)
            .map_err(|e| SettingsError::Validation(format!("quickWindowHotkey: {e}")))?;
        self.new_chat_hotkey = accelerator::normalize(&self.new_chat_hotkey)
            .map_err(|e| SettingsError::Validation(format!("newChatHotkey: {e}")))?;

        if !self.auto_reset_timer.is_finite() || self.auto_reset_timer < 0.0 {
            return Err(SettingsError::Validation(
                "autoResetTimer must be a non-negative number of minutes".to_string(),
            ));
        }

        if let Some(bounds) = &self.quick_window_bounds {
            let finite = [bounds.x, bounds.y, bounds.width, bounds.height]
                .iter()
                .all(|v| v.is_finite());
            if !finite || bounds.width <= 0.0 || bounds.height <= 0.0 {
                return Err(SettingsError::Validation(
                    "quickWindowBounds must have a positive size".to_string(),
                ));
            }
        }

        self.save_location = self
            .save_location
            .filter(|path| !path.to_string_lossy().trim().is_empty());
        if !self.ask_everytime && self.save_location.is_none() {
            return Err(SettingsError::Validation(
                "saveLocation is required when askEverytime is off".to_string(),
            ));
        }

        Ok(self)
    }

    pub fn auto_reset_after(&self) -> Duration {
        Duration::try_from_secs_f64(self.auto_reset_timer * 60.0).unwrap_or(Duration::MAX)
    }
}

/// Per-user data directory for the shell.
pub fn app_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::data_local_dir();

    base.unwrap_or_else(|| PathBuf::from(".")).join("gemini-desktop")
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<Settings>>,
    // serializes read-merge-replace so concurrent updates never lose fields
    update_lock: Mutex<()>,
}

impl SettingsStore {
    /// Loads `path`, falling back to defaults when it is missing or invalid.
    pub fn open(path: PathBuf) -> Self {
        let settings = load(&path);
        Self {
            path: Some(path),
            current: RwLock::new(Arc::new(settings)),
            update_lock: Mutex::new(()),
        }
    }

    pub fn open_default() -> Self {
        Self::open(app_data_dir().join(SETTINGS_FILE))
    }

    /// Store that never touches the disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(settings)),
            update_lock: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Arc<Settings> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merges `patch` (a partial camelCase settings object) over the current
    /// record, validates the result and makes it current.
    pub fn update(&self, patch: &Value) -> Result<Arc<Settings>, SettingsError> {
        let Some(fields) = patch.as_object() else {
            return Err(SettingsError::Validation(
                "settings patch must be an object".to_string(),
            ));
        };

        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.get();

        let mut merged = serde_json::to_value(&*current)
            .map_err(|e| SettingsError::Validation(e.to_string()))?;
        if let Some(document) = merged.as_object_mut() {
            for (key, value) in fields {
                document.insert(key.clone(), value.clone());
            }
        }

        let next: Settings = serde_json::from_value(merged)
            .map_err(|e| SettingsError::Validation(e.to_string()))?;
        let next = Arc::new(next.validated()?);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next.clone();

        if let Some(path) = &self.path {
            match save(path, &next) {
                Ok(()) => debug!(path = %path.display(), "settings saved"),
                Err(e) => warn!("{e}"),
            }
        }

        Ok(next)
    }
}

fn load(path: &Path) -> Settings {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no settings file yet, using defaults");
            return Settings::default();
        }
        Err(e) => {
            warn!(path = %path.display(), "error loading settings, using defaults: {e}");
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&content)
        .map_err(|e| SettingsError::Validation(e.to_string()))
        .and_then(Settings::validated)
    {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), "invalid settings file, using defaults: {e}");
            Settings::default()
        }
    }
}

fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let persistence = |source: std::io::Error| SettingsError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(persistence)?;
    }
    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| persistence(std::io::Error::other(e)))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).map_err(persistence)?;
    std::fs::rename(&tmp, path).map_err(persistence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::open(dir.path().join(SETTINGS_FILE))
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(*store.get(), Settings::default());
    }

    #[test]
    fn test_invalid_documents_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(*SettingsStore::open(path.clone()).get(), Settings::default());

        std::fs::write(&path, r#"{"autoResetTimer": -3}"#).unwrap();
        assert_eq!(*SettingsStore::open(path.clone()).get(), Settings::default());

        std::fs::write(&path, r#"{"runOnStartup": "yes"}"#).unwrap();
        assert_eq!(*SettingsStore::open(path).get(), Settings::default());
    }

    #[test]
    fn test_missing_keys_default_and_unknown_keys_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"autoResetTimer": 10, "someFutureKey": [1, 2]}"#).unwrap();

        let settings = SettingsStore::open(path).get();
        assert_eq!(settings.auto_reset_timer, 10.0);
        assert_eq!(settings.quick_window_hotkey, "Alt+G");
        assert!(settings.ask_everytime);
    }

    #[test]
    fn test_update_normalizes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let updated = store
            .update(&json!({ "quickWindowHotkey": "ctrl+shift+space", "autoResetTimer": 0 }))
            .unwrap();
        assert_eq!(updated.quick_window_hotkey, "Ctrl+Shift+Space");
        assert_eq!(updated.auto_reset_timer, 0.0);

        let reopened = store_in(&dir).get();
        assert_eq!(*reopened, *updated);
    }

    #[test]
    fn test_save_location_required_without_ask_everytime() {
        let store = SettingsStore::in_memory(Settings::default());

        let err = store.update(&json!({ "askEverytime": false })).unwrap_err();
        assert!(matches!(err, SettingsError::Validation(_)));
        assert!(store.get().ask_everytime);

        let err = store
            .update(&json!({ "askEverytime": false, "saveLocation": "  " }))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Validation(_)));

        let updated = store
            .update(&json!({ "askEverytime": false, "saveLocation": "/tmp/downloads" }))
            .unwrap();
        assert!(!updated.ask_everytime);
        assert_eq!(updated.save_location, Some(PathBuf::from("/tmp/downloads")));
    }

    #[test]
    fn test_rejected_updates_leave_state_unchanged() {
        let store = SettingsStore::in_memory(Settings::default());
        let before = store.get();

        assert!(store.update(&json!({ "autoResetTimer": -1 })).is_err());
        assert!(store.update(&json!({ "quickWindowHotkey": "Alt+" })).is_err());
        assert!(store.update(&json!({ "runOnStartup": 3 })).is_err());
        assert!(store
            .update(&json!({ "quickWindowBounds": { "x": 0, "y": 0, "width": 0, "height": 10 } }))
            .is_err());
        assert!(store.update(&json!(["not", "an", "object"])).is_err());

        assert_eq!(*store.get(), *before);
    }

    #[test]
    fn test_snapshots_are_not_mutated_by_updates() {
        let store = SettingsStore::in_memory(Settings::default());
        let snapshot = store.get();

        store.update(&json!({ "startMinimized": false })).unwrap();

        assert!(snapshot.start_minimized);
        assert!(!store.get().start_minimized);
    }

    #[test]
    fn test_null_clears_optional_fields() {
        let store = SettingsStore::in_memory(Settings::default());
        store
            .update(&json!({ "quickWindowBounds": { "x": 10, "y": 20, "width": 500, "height": 600 } }))
            .unwrap();
        assert!(store.get().quick_window_bounds.is_some());

        store.update(&json!({ "quickWindowBounds": null })).unwrap();
        assert!(store.get().quick_window_bounds.is_none());
    }

    #[test]
    fn test_write_failure_keeps_update_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = SettingsStore::open(blocker.join(SETTINGS_FILE));
        let updated = store.update(&json!({ "newChatHotkey": "Alt+N" })).unwrap();

        assert_eq!(updated.new_chat_hotkey, "Alt+N");
        assert_eq!(store.get().new_chat_hotkey, "Alt+N");
    }

    #[test]
    fn test_auto_reset_after_minutes() {
        let settings = Settings {
            auto_reset_timer: 1.5,
            ..Settings::default()
        };
        assert_eq!(settings.auto_reset_after(), Duration::from_secs(90));
    }
}
