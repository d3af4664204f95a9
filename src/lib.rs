//! Gemini Desktop: a tray-resident shell around the hosted Gemini web app.

pub mod accelerator;
mod actions;
mod commands;
pub mod downloads;
pub mod hotkeys;
mod injection;
pub mod lifecycle;
mod menu;
pub mod navigation;
pub mod settings;
mod tray;
pub mod windows;

use anyhow::Context;
use hotkeys::{HotkeyError, HotkeyRouter, TauriHotkeys};
use lifecycle::{LaunchMode, ProcessState};
use navigation::{NavigationGuard, TauriOpener, ALLOWED_ORIGINS};
use settings::{Settings, SettingsStore};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, RunEvent, Url, WindowEvent};
use tauri_plugin_autostart::MacosLauncher;
use tauri_plugin_global_shortcut::ShortcutState;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use windows::native::{self, TauriWindows};
use windows::{CloseAction, WindowRegistry, WindowRole, HOSTED_URL};

/// Emitted to the settings page when the quick window hotkey cannot be bound.
pub const HOTKEY_UNAVAILABLE_EVENT: &str = "hotkey-unavailable";

pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub process: Arc<ProcessState>,
    pub windows: Arc<WindowRegistry<TauriWindows>>,
    pub hotkeys: Arc<HotkeyRouter<TauriHotkeys>>,
    pub downloads: Arc<downloads::Downloads>,
}

impl AppState {
    /// Side effects of an accepted settings update.
    pub fn apply_settings(&self, app: &AppHandle, settings: &Settings) {
        if let Err(e) = self.hotkeys.register(settings) {
            report_hotkey_error(app, &e);
        }
        if let Err(e) = menu::install(app, settings) {
            warn!("failed to rebuild application menu: {e}");
        }
        lifecycle::sync_login_item(app, settings);
        self.windows.apply_settings(settings);
    }
}

pub(crate) fn report_hotkey_error(app: &AppHandle, error: &HotkeyError) {
    if let Err(e) = app.emit(HOTKEY_UNAVAILABLE_EVENT, error.to_string()) {
        warn!("failed to emit hotkey warning: {e}");
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn setup(app: &AppHandle) -> anyhow::Result<()> {
    let settings = Arc::new(SettingsStore::open_default());
    let process = Arc::new(ProcessState::default());
    let downloads = Arc::new(downloads::Downloads::new(settings.clone()));
    let guard = Arc::new(NavigationGuard::new(
        ALLOWED_ORIGINS,
        Arc::new(TauriOpener(app.clone())),
    ));
    let hosted_url = Url::parse(HOSTED_URL).context("hosted url")?;
    let runtime = tauri::async_runtime::handle().inner().clone();

    let windows = Arc::new(WindowRegistry::new(
        TauriWindows::new(app.clone(), guard, downloads.clone()),
        settings.clone(),
        process.clone(),
        hosted_url,
        runtime,
    ));
    let hotkeys = Arc::new(HotkeyRouter::new(TauriHotkeys(app.clone()), settings.clone()));

    app.manage(AppState {
        settings: settings.clone(),
        process,
        windows: windows.clone(),
        hotkeys: hotkeys.clone(),
        downloads,
    });

    let current = settings.get();
    menu::install(app, &current).context("install application menu")?;
    tray::build(app).context("build tray icon")?;

    windows.get_or_create(WindowRole::Main)?;
    let args: Vec<String> = std::env::args().collect();
    match LaunchMode::from_args(&args, &current) {
        LaunchMode::Visible => windows.show(WindowRole::Main)?,
        LaunchMode::Tray => info!("started in tray"),
    }

    if let Err(e) = hotkeys.register(&current) {
        report_hotkey_error(app, &e);
    }
    lifecycle::sync_login_item(app, &current);
    Ok(())
}

fn on_window_event(window: &tauri::Window, event: &WindowEvent) {
    let Some(role) = WindowRole::from_label(window.label()) else {
        return;
    };
    let Some(state) = window.try_state::<AppState>() else {
        return;
    };

    match event {
        WindowEvent::CloseRequested { api, .. } => {
            if state.windows.on_close_requested(role) == CloseAction::Hide {
                api.prevent_close();
            }
        }
        WindowEvent::Moved(_) | WindowEvent::Resized(_) if role == WindowRole::Quick => {
            if window.is_minimized().unwrap_or(false) {
                return;
            }
            if let Some(bounds) = native::window_bounds(window) {
                state.windows.on_bounds_changed(role, bounds);
            }
        }
        WindowEvent::Destroyed => {
            state.windows.on_destroyed(role);
            // the page re-enables hotkeys on blur, which a torn-down webview may never send
            if role == WindowRole::Settings {
                if let Err(e) = state.hotkeys.resume() {
                    report_hotkey_error(window.app_handle(), &e);
                }
            }
        }
        _ => {}
    }
}

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "starting Gemini Desktop");

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            info!("second instance launched, focusing main window");
            actions::open_main(app);
        }))
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, _shortcut, event| {
                    // the toggle is the only global binding
                    if event.state == ShortcutState::Pressed {
                        actions::toggle_quick(app);
                    }
                })
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            Some(vec![lifecycle::AUTOSTART_FLAG]),
        ))
        .setup(|app| {
            setup(app.handle())?;
            Ok(())
        })
        .on_menu_event(menu::on_menu_event)
        .on_window_event(on_window_event)
        .invoke_handler(tauri::generate_handler![
            commands::get_settings,
            commands::update_settings,
            commands::set_shortcuts_enabled,
            commands::resize_window,
            commands::minimize_window,
            commands::close_window,
            commands::select_directory,
            commands::open_external,
        ])
        .build(tauri::generate_context!())
        .context("error while building tauri application")?;

    app.run(|app, event| {
        if let RunEvent::ExitRequested { code, api, .. } = event {
            let quitting = app
                .try_state::<AppState>()
                .is_some_and(|state| state.process.is_quitting());
            // every window closed without "Quit": keep running in the tray
            if code.is_none() && !quitting {
                api.prevent_exit();
            }
        }
    });
    Ok(())
}
