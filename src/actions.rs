//! User-facing actions shared by the menu, tray, hotkey and second-instance handlers.

use crate::downloads;
use crate::injection;
use crate::windows::WindowRole;
use crate::AppState;
use tauri::{AppHandle, Manager, State};
use tracing::{info, warn};

fn state(app: &AppHandle) -> Option<State<'_, AppState>> {
    let state = app.try_state::<AppState>();
    if state.is_none() {
        warn!("action ignored, app state not ready");
    }
    state
}

fn show(app: &AppHandle, role: WindowRole) {
    if let Some(state) = state(app) {
        if let Err(e) = state.windows.show(role) {
            warn!(role = role.label(), "failed to show window: {e:#}");
        }
    }
}

pub fn open_main(app: &AppHandle) {
    show(app, WindowRole::Main);
}

pub fn open_settings(app: &AppHandle) {
    show(app, WindowRole::Settings);
}

pub fn toggle_quick(app: &AppHandle) {
    if let Some(state) = state(app) {
        if let Err(e) = state.windows.toggle(WindowRole::Quick) {
            warn!("failed to toggle quick window: {e:#}");
        }
    }
}

/// Starts a new conversation in the focused Quick Window, else in the Main Window.
pub fn new_chat(app: &AppHandle) {
    let Some(state) = state(app) else {
        return;
    };
    let role = match state.windows.focused_hosted() {
        Some(WindowRole::Quick) => WindowRole::Quick,
        _ => {
            if let Err(e) = state.windows.show(WindowRole::Main) {
                warn!("failed to show main window for new chat: {e:#}");
                return;
            }
            WindowRole::Main
        }
    };
    if let Some(window) = state.windows.get(role) {
        injection::inject_new_chat(&window);
    }
}

pub fn reload_focused(app: &AppHandle) {
    let Some(state) = state(app) else {
        return;
    };
    if let Some(role) = state.windows.focused_hosted() {
        info!(role = role.label(), "reloading");
        if let Err(e) = state.windows.reload(role) {
            warn!(role = role.label(), "reload failed: {e:#}");
        }
    }
}

pub fn open_last_download(app: &AppHandle) {
    if let Some(state) = state(app) {
        downloads::open_last(app, &state.downloads);
    }
}

pub fn quit(app: &AppHandle) {
    if let Some(state) = state(app) {
        state.process.begin_quit();
    }
    app.exit(0);
}
