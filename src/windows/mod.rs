//! Window registry: one Main, one Quick and one Settings window at most.
//!
//! Windows are created lazily by role and live until the process quits. A
//! user close on a hosted window becomes a hide, which keeps the web session
//! and page state around for the next show. Native window operations go
//! through [`NativeWindow`] so the lifecycle rules do not depend on a live
//! webview.

pub mod bounds;
pub mod native;
pub mod session;

use crate::lifecycle::ProcessState;
use crate::settings::{Settings, SettingsStore, WindowBounds};
use bounds::{BoundsDebouncer, BOUNDS_DEBOUNCE};
use session::{SessionState, ShowOutcome};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tauri::Url;
use tracing::{debug, info, warn};

pub const HOSTED_URL: &str = "https://gemini.google.com/app";
pub const HOSTED_TITLE: &str = "Google Gemini";

const QUICK_WIDTH: f64 = 500.0;
const QUICK_HEIGHT: f64 = 600.0;
const QUICK_RIGHT_MARGIN: f64 = 520.0;
const QUICK_TOP: f64 = 50.0;
pub const SETTINGS_WIDTH: f64 = 700.0;
const SETTINGS_HEIGHT: f64 = 520.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowRole {
    Main,
    Quick,
    Settings,
}

impl WindowRole {
    pub const ALL: [WindowRole; 3] = [Self::Main, Self::Quick, Self::Settings];

    pub fn label(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Quick => "quick",
            Self::Settings => "settings",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.label() == label)
    }

    /// Whether the window shows the hosted web application.
    pub fn is_hosted(self) -> bool {
        matches!(self, Self::Main | Self::Quick)
    }

    fn index(self) -> usize {
        match self {
            Self::Main => 0,
            Self::Quick => 1,
            Self::Settings => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowContent {
    Hosted(Url),
    /// Page bundled with the app (path under the frontend dist).
    Local(&'static str),
}

/// Everything needed to build a window for a role.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub role: WindowRole,
    pub title: &'static str,
    pub content: WindowContent,
    pub width: f64,
    pub height: f64,
    pub position: Option<(f64, f64)>,
    pub visible: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub resizable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
}

impl WindowSpec {
    pub fn for_role(
        role: WindowRole,
        settings: &Settings,
        hosted_url: &Url,
        work_area_right: Option<f64>,
    ) -> Self {
        match role {
            WindowRole::Main => Self {
                role,
                title: HOSTED_TITLE,
                content: WindowContent::Hosted(hosted_url.clone()),
                width: 1200.0,
                height: 800.0,
                position: None,
                visible: false,
                always_on_top: false,
                skip_taskbar: false,
                resizable: true,
                minimizable: true,
                maximizable: true,
            },
            WindowRole::Quick => {
                let (position, width, height) = match settings.quick_window_bounds {
                    Some(saved) => (Some((saved.x, saved.y)), saved.width, saved.height),
                    None => (
                        work_area_right.map(|right| (right - QUICK_RIGHT_MARGIN, QUICK_TOP)),
                        QUICK_WIDTH,
                        QUICK_HEIGHT,
                    ),
                };
                Self {
                    role,
                    title: HOSTED_TITLE,
                    content: WindowContent::Hosted(hosted_url.clone()),
                    width,
                    height,
                    position,
                    visible: false,
                    always_on_top: settings.quick_window_always_on_top,
                    skip_taskbar: true,
                    resizable: true,
                    minimizable: true,
                    maximizable: true,
                }
            }
            WindowRole::Settings => Self {
                role,
                title: "Settings",
                content: WindowContent::Local("index.html"),
                width: SETTINGS_WIDTH,
                height: SETTINGS_HEIGHT,
                position: None,
                visible: true,
                always_on_top: false,
                skip_taskbar: false,
                resizable: false,
                minimizable: false,
                maximizable: false,
            },
        }
    }
}

/// Native operations the registry needs from a window.
pub trait NativeWindow: Clone + Send + Sync + 'static {
    fn show(&self) -> anyhow::Result<()>;
    fn hide(&self) -> anyhow::Result<()>;
    fn focus(&self) -> anyhow::Result<()>;
    fn unminimize(&self) -> anyhow::Result<()>;
    fn is_visible(&self) -> bool;
    fn is_focused(&self) -> bool;
    fn load(&self, url: &Url) -> anyhow::Result<()>;
    fn reload(&self) -> anyhow::Result<()>;
    /// Real close; the window is destroyed.
    fn close(&self) -> anyhow::Result<()>;
    fn set_always_on_top(&self, on_top: bool) -> anyhow::Result<()>;
}

pub trait WindowFactory: Send + Sync + 'static {
    type Window: NativeWindow;

    fn build(
        &self,
        spec: &WindowSpec,
        parent: Option<&Self::Window>,
    ) -> anyhow::Result<Self::Window>;

    /// Logical x of the right edge of the primary display's work area, if known.
    fn work_area_right(&self) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Veto the close; the window was hidden instead.
    Hide,
    /// Let the native close go ahead.
    Close,
}

struct ManagedWindow<W> {
    window: W,
    session: SessionState,
}

pub struct WindowRegistry<F: WindowFactory> {
    factory: F,
    settings: Arc<SettingsStore>,
    process: Arc<ProcessState>,
    hosted_url: Url,
    bounds: BoundsDebouncer,
    slots: Mutex<[Option<ManagedWindow<F::Window>>; 3]>,
    // held across `build` so two callers can never create the same role twice
    create_lock: Mutex<()>,
}

impl<F: WindowFactory> WindowRegistry<F> {
    pub fn new(
        factory: F,
        settings: Arc<SettingsStore>,
        process: Arc<ProcessState>,
        hosted_url: Url,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let bounds = BoundsDebouncer::new(runtime, BOUNDS_DEBOUNCE, settings.clone());
        Self {
            factory,
            settings,
            process,
            hosted_url,
            bounds,
            slots: Mutex::new([None, None, None]),
            create_lock: Mutex::new(()),
        }
    }

    pub fn hosted_url(&self) -> &Url {
        &self.hosted_url
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, [Option<ManagedWindow<F::Window>>; 3]> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, role: WindowRole) -> Option<F::Window> {
        self.slots()[role.index()]
            .as_ref()
            .map(|managed| managed.window.clone())
    }

    pub fn get_or_create(&self, role: WindowRole) -> anyhow::Result<F::Window> {
        if let Some(window) = self.get(role) {
            return Ok(window);
        }

        let _creating = self.create_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(window) = self.get(role) {
            return Ok(window);
        }

        let settings = self.settings.get();
        let spec = WindowSpec::for_role(
            role,
            &settings,
            &self.hosted_url,
            self.factory.work_area_right(),
        );
        // keep the settings window above the popup when the popup is up
        let parent = match role {
            WindowRole::Settings => self
                .get(WindowRole::Quick)
                .filter(|quick| quick.is_visible()),
            _ => None,
        };

        let window = self.factory.build(&spec, parent.as_ref())?;
        info!(role = role.label(), parented = parent.is_some(), "window created");

        self.slots()[role.index()] = Some(ManagedWindow {
            window: window.clone(),
            session: SessionState::Active,
        });
        Ok(window)
    }

    pub fn show(&self, role: WindowRole) -> anyhow::Result<()> {
        let window = self.get_or_create(role)?;
        let reset_after = self.settings.get().auto_reset_after();

        let (previous, outcome) = match self.slots()[role.index()].as_mut() {
            Some(managed) => {
                let previous = managed.session;
                (
                    Some(previous),
                    managed.session.on_shown(Instant::now(), reset_after),
                )
            }
            None => (None, ShowOutcome::Resume),
        };

        if outcome == ShowOutcome::Reset && role.is_hosted() {
            info!(role = role.label(), "idle limit reached, resetting session");
            if let Err(e) = window.load(&self.hosted_url) {
                // the page is still stale; the next show must reset again
                if let (Some(previous), Some(managed)) =
                    (previous, self.slots()[role.index()].as_mut())
                {
                    managed.session = previous;
                }
                return Err(e);
            }
        }

        window.unminimize()?;
        window.show()?;
        window.focus()
    }

    pub fn hide(&self, role: WindowRole) -> anyhow::Result<()> {
        let Some(window) = self.get(role) else {
            return Ok(());
        };
        if !window.is_visible() {
            return Ok(());
        }

        if let Some(managed) = self.slots()[role.index()].as_mut() {
            managed.session.on_hidden(Instant::now());
        }
        debug!(role = role.label(), "hiding window");
        window.hide()
    }

    pub fn toggle(&self, role: WindowRole) -> anyhow::Result<()> {
        let window = self.get_or_create(role)?;
        if window.is_visible() {
            self.hide(role)
        } else {
            self.show(role)
        }
    }

    /// Decides what a user close on `role` turns into.
    pub fn on_close_requested(&self, role: WindowRole) -> CloseAction {
        if role == WindowRole::Settings {
            return CloseAction::Close;
        }

        if let Some(settings_window) = self.get(WindowRole::Settings) {
            if let Err(e) = settings_window.close() {
                warn!("failed to close settings window: {e:#}");
            }
        }

        if self.process.is_quitting() {
            return CloseAction::Close;
        }

        if let Err(e) = self.hide(role) {
            warn!(role = role.label(), "failed to hide window: {e:#}");
        }
        CloseAction::Hide
    }

    /// Releases the handle once the native window is gone.
    pub fn on_destroyed(&self, role: WindowRole) {
        if role == WindowRole::Quick {
            self.bounds.cancel();
        }
        if self.slots()[role.index()].take().is_some() {
            info!(role = role.label(), "window released");
        }
    }

    pub fn on_bounds_changed(&self, role: WindowRole, bounds: WindowBounds) {
        if role == WindowRole::Quick {
            self.bounds.on_bounds_changed(bounds);
        }
    }

    /// Pushes settings that affect live windows.
    pub fn apply_settings(&self, settings: &Settings) {
        if let Some(quick) = self.get(WindowRole::Quick) {
            if let Err(e) = quick.set_always_on_top(settings.quick_window_always_on_top) {
                warn!("failed to update quick window always-on-top: {e:#}");
            }
        }
    }

    pub fn reload(&self, role: WindowRole) -> anyhow::Result<()> {
        match self.get(role) {
            Some(window) => window.reload(),
            None => Ok(()),
        }
    }

    /// The hosted window that currently has focus.
    pub fn focused_hosted(&self) -> Option<WindowRole> {
        [WindowRole::Quick, WindowRole::Main]
            .into_iter()
            .find(|role| self.get(*role).is_some_and(|window| window.is_focused()))
    }
}
