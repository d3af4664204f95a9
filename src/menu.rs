//! Application menu and the single menu event dispatcher (tray items included).

use crate::actions;
use crate::settings::Settings;
use tauri::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem, Submenu};
use tauri::{AppHandle, Wry};
use tracing::{debug, info};

pub const NEW_CHAT: &str = "new-chat";
pub const RELOAD: &str = "reload";
pub const SETTINGS: &str = "settings";
pub const QUIT: &str = "quit";
pub const OPEN_MAIN: &str = "open-main";
pub const TOGGLE_QUICK: &str = "toggle-quick";
pub const OPEN_LAST_DOWNLOAD: &str = "open-last-download";

const RELOAD_ACCELERATOR: &str = "CmdOrCtrl+R";

pub fn build(app: &AppHandle, settings: &Settings) -> tauri::Result<Menu<Wry>> {
    let app_menu = Submenu::with_items(
        app,
        "Gemini Desktop",
        true,
        &[
            &MenuItem::with_id(app, SETTINGS, "Settings…", true, Some("CmdOrCtrl+,"))?,
            &PredefinedMenuItem::separator(app)?,
            &PredefinedMenuItem::hide(app, None)?,
            &MenuItem::with_id(app, QUIT, "Quit", true, Some("CmdOrCtrl+Q"))?,
        ],
    )?;

    // the hosted page needs these for clipboard shortcuts on macOS
    let edit_menu = Submenu::with_items(
        app,
        "Edit",
        true,
        &[
            &PredefinedMenuItem::undo(app, None)?,
            &PredefinedMenuItem::redo(app, None)?,
            &PredefinedMenuItem::separator(app)?,
            &PredefinedMenuItem::cut(app, None)?,
            &PredefinedMenuItem::copy(app, None)?,
            &PredefinedMenuItem::paste(app, None)?,
            &PredefinedMenuItem::select_all(app, None)?,
        ],
    )?;

    let chat_menu = Submenu::with_items(
        app,
        "Chat",
        true,
        &[
            &MenuItem::with_id(
                app,
                NEW_CHAT,
                "New Chat",
                true,
                Some(settings.new_chat_hotkey.as_str()),
            )?,
            &MenuItem::with_id(app, RELOAD, "Reload", true, Some(RELOAD_ACCELERATOR))?,
        ],
    )?;

    Menu::with_items(app, &[&app_menu, &edit_menu, &chat_menu])
}

/// (Re)builds the menu so the New Chat accelerator follows `newChatHotkey`.
pub fn install(app: &AppHandle, settings: &Settings) -> tauri::Result<()> {
    app.set_menu(build(app, settings)?)?;
    info!(new_chat = %settings.new_chat_hotkey, "application menu installed");
    Ok(())
}

pub fn on_menu_event(app: &AppHandle, event: MenuEvent) {
    match event.id().as_ref() {
        NEW_CHAT => actions::new_chat(app),
        RELOAD => actions::reload_focused(app),
        SETTINGS => actions::open_settings(app),
        OPEN_MAIN => actions::open_main(app),
        TOGGLE_QUICK => actions::toggle_quick(app),
        OPEN_LAST_DOWNLOAD => actions::open_last_download(app),
        QUIT => actions::quit(app),
        other => debug!(id = other, "unhandled menu event"),
    }
}
