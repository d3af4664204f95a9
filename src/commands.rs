//! IPC commands used by the settings page.

use crate::settings::Settings;
use crate::windows::{WindowRole, SETTINGS_WIDTH};
use crate::AppState;
use serde_json::Value;
use tauri::{AppHandle, LogicalSize, State, Url, WebviewWindow};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_opener::OpenerExt;
use tracing::{info, warn};

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Settings {
    (*state.settings.get()).clone()
}

/// Merges `patch` into the current settings and applies the result.
#[tauri::command]
pub fn update_settings(
    app: AppHandle,
    state: State<'_, AppState>,
    patch: Value,
) -> Result<Settings, String> {
    let updated = state.settings.update(&patch).map_err(|e| {
        warn!("settings update rejected: {e}");
        e.to_string()
    })?;
    state.apply_settings(&app, &updated);
    Ok((*updated).clone())
}

/// Suspends the global hotkey while the page records a new combination.
#[tauri::command]
pub fn set_shortcuts_enabled(
    app: AppHandle,
    state: State<'_, AppState>,
    enabled: bool,
) -> Result<(), String> {
    state.hotkeys.set_enabled(enabled).map_err(|e| {
        crate::report_hotkey_error(&app, &e);
        e.to_string()
    })
}

#[tauri::command]
pub fn resize_window(state: State<'_, AppState>, height: f64) -> Result<(), String> {
    if !height.is_finite() || height <= 0.0 {
        return Err(format!("invalid window height: {height}"));
    }
    let Some(window) = state.windows.get(WindowRole::Settings) else {
        return Ok(());
    };
    window
        .set_size(LogicalSize::new(SETTINGS_WIDTH, height))
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn minimize_window(window: WebviewWindow) -> Result<(), String> {
    window.minimize().map_err(|e| e.to_string())
}

/// Goes through the normal close path, so hosted windows only hide.
#[tauri::command]
pub fn close_window(window: WebviewWindow) -> Result<(), String> {
    window.close().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_directory(app: AppHandle) -> Result<Option<String>, String> {
    let Some(folder) = app.dialog().file().blocking_pick_folder() else {
        return Ok(None);
    };
    let path = folder.into_path().map_err(|e| e.to_string())?;
    info!(path = %path.display(), "save location picked");
    Ok(Some(path.to_string_lossy().into_owned()))
}

#[tauri::command]
pub fn open_external(app: AppHandle, url: String) -> Result<(), String> {
    let parsed = Url::parse(&url).map_err(|e| format!("invalid url {url}: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https" | "mailto") {
        return Err(format!("refusing to open {} url", parsed.scheme()));
    }
    app.opener()
        .open_url(parsed.as_str(), None::<&str>)
        .map_err(|e| e.to_string())
}
