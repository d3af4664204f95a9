//! Download destination, completion notice and "Open Last Download".

use crate::settings::{NotificationClickAction, Settings, SettingsStore};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tauri::{AppHandle, Url};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_opener::OpenerExt;
use tracing::{info, warn};

const FALLBACK_FILE_NAME: &str = "download";

/// Where a download should land, or `None` to keep the platform default.
pub fn destination_for(settings: &Settings, file_name: &str) -> Option<PathBuf> {
    if settings.ask_everytime {
        return None;
    }
    settings
        .save_location
        .as_ref()
        .map(|dir| dir.join(file_name))
}

/// Best guess at the file name: the default destination's, then the URL's last segment.
fn file_name_for(url: &Url, default_destination: &Path) -> String {
    default_destination
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    File(PathBuf),
    Folder(PathBuf),
}

impl OpenTarget {
    pub fn new(path: PathBuf, action: NotificationClickAction) -> Self {
        match action {
            NotificationClickAction::OpenFile => Self::File(path),
            NotificationClickAction::OpenFolder => Self::Folder(path),
        }
    }
}

pub struct Downloads {
    settings: Arc<SettingsStore>,
    last: Mutex<Option<PathBuf>>,
}

impl Downloads {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self {
            settings,
            last: Mutex::new(None),
        }
    }

    /// Rewrites `destination` in place when a fixed save location is configured.
    pub fn on_requested(&self, url: &Url, destination: &mut PathBuf) {
        let file_name = file_name_for(url, destination);
        if let Some(target) = destination_for(&self.settings.get(), &file_name) {
            info!(path = %target.display(), "saving download to configured location");
            *destination = target;
        }
    }

    /// Records a finished download. Returns the path when it succeeded.
    pub fn on_finished(&self, url: &Url, path: Option<PathBuf>, success: bool) -> Option<PathBuf> {
        if !success {
            warn!(%url, "download failed");
            return None;
        }
        let path = path?;
        info!(path = %path.display(), "download complete");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.clone());
        Some(path)
    }

    pub fn last(&self) -> Option<PathBuf> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// What "Open Last Download" should do right now.
    pub fn open_target(&self) -> Option<OpenTarget> {
        let action = self.settings.get().notification_click_action;
        self.last().map(|path| OpenTarget::new(path, action))
    }
}

pub fn notify_complete(app: &AppHandle, path: &Path) {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    if let Err(e) = app
        .notification()
        .builder()
        .title("Download Complete")
        .body(name)
        .show()
    {
        warn!("failed to show download notification: {e}");
    }
}

pub fn open_last(app: &AppHandle, downloads: &Downloads) {
    let result = match downloads.open_target() {
        Some(OpenTarget::File(path)) => app
            .opener()
            .open_path(path.to_string_lossy(), None::<&str>),
        Some(OpenTarget::Folder(path)) => app.opener().reveal_item_in_dir(&path),
        None => {
            info!("no download to open yet");
            return;
        }
    };
    if let Err(e) = result {
        warn!("failed to open last download: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_location(dir: &str) -> Settings {
        Settings {
            ask_everytime: false,
            save_location: Some(PathBuf::from(dir)),
            ..Settings::default()
        }
    }

    #[test]
    fn test_destination_follows_save_location() {
        assert_eq!(destination_for(&Settings::default(), "a.pdf"), None);
        assert_eq!(
            destination_for(&fixed_location("/home/u/Gemini"), "a.pdf"),
            Some(PathBuf::from("/home/u/Gemini/a.pdf"))
        );

        let asking = Settings {
            save_location: Some(PathBuf::from("/home/u/Gemini")),
            ..Settings::default()
        };
        assert_eq!(destination_for(&asking, "a.pdf"), None);
    }

    #[test]
    fn test_requested_download_is_redirected() {
        let store = Arc::new(SettingsStore::in_memory(fixed_location("/data/out")));
        let downloads = Downloads::new(store.clone());
        let url = Url::parse("https://example.com/files/report.csv").unwrap();

        let mut dest = PathBuf::from("/home/u/Downloads/report (1).csv");
        downloads.on_requested(&url, &mut dest);
        assert_eq!(dest, PathBuf::from("/data/out/report (1).csv"));

        let mut dest = PathBuf::new();
        downloads.on_requested(&url, &mut dest);
        assert_eq!(dest, PathBuf::from("/data/out/report.csv"));

        store.update(&json!({ "askEverytime": true })).unwrap();
        let mut dest = PathBuf::from("/home/u/Downloads/report.csv");
        downloads.on_requested(&url, &mut dest);
        assert_eq!(dest, PathBuf::from("/home/u/Downloads/report.csv"));
    }

    #[test]
    fn test_file_name_fallbacks() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(file_name_for(&url, Path::new("")), FALLBACK_FILE_NAME);
    }

    #[test]
    fn test_last_download_and_open_target() {
        let store = Arc::new(SettingsStore::in_memory(Settings::default()));
        let downloads = Downloads::new(store.clone());
        let url = Url::parse("https://example.com/a.png").unwrap();
        assert_eq!(downloads.open_target(), None);

        let path = PathBuf::from("/tmp/a.png");
        assert_eq!(downloads.on_finished(&url, Some(path.clone()), true), Some(path.clone()));
        assert_eq!(downloads.on_finished(&url, Some(PathBuf::from("/tmp/b.png")), false), None);
        assert_eq!(downloads.open_target(), Some(OpenTarget::File(path.clone())));

        store
            .update(&json!({ "notificationClickAction": "openFolder" }))
            .unwrap();
        assert_eq!(downloads.open_target(), Some(OpenTarget::Folder(path)));
    }
}
