use crate::{actions, menu};
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::AppHandle;

const TOOLTIP: &str = "Gemini Desktop";

/// Tray icon with the app's entry points. Menu clicks are dispatched by
/// [`menu::on_menu_event`]; a left click on the icon opens the Main Window.
pub fn build(app: &AppHandle) -> tauri::Result<()> {
    let open = MenuItem::with_id(app, menu::OPEN_MAIN, "Open Gemini", true, None::<&str>)?;
    let quick = MenuItem::with_id(app, menu::TOGGLE_QUICK, "Quick Gemini", true, None::<&str>)?;
    let settings = MenuItem::with_id(app, menu::SETTINGS, "Settings", true, None::<&str>)?;
    let last_download = MenuItem::with_id(
        app,
        menu::OPEN_LAST_DOWNLOAD,
        "Open Last Download",
        true,
        None::<&str>,
    )?;
    let quit = MenuItem::with_id(app, menu::QUIT, "Quit", true, None::<&str>)?;
    let tray_menu = Menu::with_items(
        app,
        &[
            &open,
            &quick,
            &settings,
            &PredefinedMenuItem::separator(app)?,
            &last_download,
            &PredefinedMenuItem::separator(app)?,
            &quit,
        ],
    )?;

    let mut builder = TrayIconBuilder::new()
        .tooltip(TOOLTIP)
        .menu(&tray_menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                actions::open_main(tray.app_handle());
            }
        });
    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }
    builder.build(app)?;
    Ok(())
}
