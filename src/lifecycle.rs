//! Process-level lifecycle: quit flag, launch mode and login item.

use crate::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use tauri::AppHandle;
use tauri_plugin_autostart::ManagerExt;
use tracing::{info, warn};

/// Passed when the user (or the login item) wants the app in the tray only.
pub const HIDDEN_FLAG: &str = "--hidden";
/// Passed by the OS login item registered through the autostart plugin.
pub const AUTOSTART_FLAG: &str = "--autostart";

/// `is_quitting` is false for the whole life of the process until "Quit".
#[derive(Debug, Default)]
pub struct ProcessState {
    quitting: AtomicBool,
}

impl ProcessState {
    pub fn begin_quit(&self) {
        if !self.quitting.swap(true, Ordering::SeqCst) {
            info!("quit requested");
        }
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Show the main window right away.
    Visible,
    /// Stay in the tray until the user asks for a window.
    Tray,
}

impl LaunchMode {
    pub fn from_args<S: AsRef<str>>(args: &[S], settings: &Settings) -> Self {
        let has = |flag: &str| args.iter().any(|arg| arg.as_ref() == flag);
        if has(HIDDEN_FLAG) || (has(AUTOSTART_FLAG) && settings.start_minimized) {
            Self::Tray
        } else {
            Self::Visible
        }
    }
}

/// Makes the OS login item match `runOnStartup`. Only release builds touch it.
pub fn sync_login_item(app: &AppHandle, settings: &Settings) {
    if cfg!(debug_assertions) {
        return;
    }

    let autolaunch = app.autolaunch();
    let enabled = autolaunch.is_enabled().unwrap_or(false);
    let result = match (settings.run_on_startup, enabled) {
        (true, false) => autolaunch.enable(),
        (false, true) => autolaunch.disable(),
        _ => Ok(()),
    };

    match result {
        Ok(()) => info!(run_on_startup = settings.run_on_startup, "login item synced"),
        Err(e) => warn!("failed to update login item: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_flag() {
        let process = ProcessState::default();
        assert!(!process.is_quitting());
        process.begin_quit();
        process.begin_quit();
        assert!(process.is_quitting());
    }

    #[test]
    fn test_launch_mode() {
        let minimized = Settings::default();
        let normal = Settings {
            start_minimized: false,
            ..Settings::default()
        };

        assert_eq!(LaunchMode::from_args(&["app"], &minimized), LaunchMode::Visible);
        assert_eq!(
            LaunchMode::from_args(&["app", "--hidden"], &normal),
            LaunchMode::Tray
        );
        assert_eq!(
            LaunchMode::from_args(&["app", "--autostart"], &minimized),
            LaunchMode::Tray
        );
        assert_eq!(
            LaunchMode::from_args(&["app", "--autostart"], &normal),
            LaunchMode::Visible
        );
    }
}
