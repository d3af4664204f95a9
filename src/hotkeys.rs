//! Global hotkey that toggles the Quick Window.
//!
//! Exactly one global combination is ever bound: `quickWindowHotkey`. The
//! router re-binds it after every settings change and can be suspended while
//! the settings page captures a new combination, so the keystrokes reach the
//! page instead of toggling the popup.

use crate::settings::{Settings, SettingsStore};
use std::sync::{Arc, Mutex, PoisonError};
use tauri::AppHandle;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("`{0}` is not a valid shortcut: {1}")]
    InvalidAccelerator(String, String),
    #[error("`{0}` could not be registered (is another app using it?): {1}")]
    Unavailable(String, String),
    #[error("global shortcut error: {0}")]
    Backend(String),
}

pub trait HotkeyBackend: Send + Sync + 'static {
    fn register(&self, accelerator: &str) -> Result<(), HotkeyError>;
    fn unregister_all(&self) -> Result<(), HotkeyError>;
}

pub struct TauriHotkeys(pub AppHandle);

impl HotkeyBackend for TauriHotkeys {
    fn register(&self, accelerator: &str) -> Result<(), HotkeyError> {
        let shortcut: Shortcut = accelerator
            .parse()
            .map_err(|e| HotkeyError::InvalidAccelerator(accelerator.to_string(), format!("{e}")))?;
        self.0
            .global_shortcut()
            .register(shortcut)
            .map_err(|e| HotkeyError::Unavailable(accelerator.to_string(), e.to_string()))
    }

    fn unregister_all(&self) -> Result<(), HotkeyError> {
        self.0
            .global_shortcut()
            .unregister_all()
            .map_err(|e| HotkeyError::Backend(e.to_string()))
    }
}

#[derive(Debug)]
struct RouterState {
    enabled: bool,
    bound: Option<String>,
}

pub struct HotkeyRouter<B: HotkeyBackend> {
    backend: B,
    settings: Arc<SettingsStore>,
    state: Mutex<RouterState>,
}

impl<B: HotkeyBackend> HotkeyRouter<B> {
    pub fn new(backend: B, settings: Arc<SettingsStore>) -> Self {
        Self {
            backend,
            settings,
            state: Mutex::new(RouterState {
                enabled: true,
                bound: None,
            }),
        }
    }

    /// Drops every binding, then binds `settings.quick_window_hotkey`.
    ///
    /// A failed binding leaves the hotkey inert; the error is returned so the
    /// caller can surface it, but the app keeps running.
    pub fn register(&self, settings: &Settings) -> Result<(), HotkeyError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.unbind(&mut state);

        if !state.enabled {
            debug!("hotkeys suspended, binding deferred");
            return Ok(());
        }

        let accelerator = &settings.quick_window_hotkey;
        match self.backend.register(accelerator) {
            Ok(()) => {
                info!(accelerator = %accelerator, "quick window hotkey registered");
                state.bound = Some(accelerator.clone());
                Ok(())
            }
            Err(e) => {
                warn!("failed to register quick window hotkey: {e}");
                Err(e)
            }
        }
    }

    /// Suspends (`false`) or restores (`true`) the global binding.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), HotkeyError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.enabled = enabled;
            if !enabled {
                self.unbind(&mut state);
                debug!("hotkeys suspended");
                return Ok(());
            }
        }
        let settings = self.settings.get();
        self.register(&settings)
    }

    /// Lifts a suspension left behind by a settings page that went away
    /// without restoring the binding. Returns whether anything changed.
    pub fn resume(&self) -> Result<bool, HotkeyError> {
        if self.is_enabled() {
            return Ok(false);
        }
        info!("restoring suspended hotkeys");
        self.set_enabled(true).map(|()| true)
    }

    pub fn is_enabled(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled
    }

    /// The combination currently toggling the Quick Window.
    #[cfg(test)]
    pub fn bound(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .bound
            .clone()
    }

    fn unbind(&self, state: &mut RouterState) {
        if let Err(e) = self.backend.unregister_all() {
            warn!("failed to unregister hotkeys: {e}");
        }
        state.bound = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct FakeHotkeys {
        bound: Mutex<Vec<String>>,
        taken: Vec<String>,
    }

    impl FakeHotkeys {
        fn toggles(&self, accelerator: &str) -> bool {
            self.bound.lock().unwrap().iter().any(|a| a == accelerator)
        }
    }

    impl HotkeyBackend for FakeHotkeys {
        fn register(&self, accelerator: &str) -> Result<(), HotkeyError> {
            if self.taken.iter().any(|a| a == accelerator) {
                return Err(HotkeyError::Unavailable(
                    accelerator.to_string(),
                    "already registered".to_string(),
                ));
            }
            self.bound.lock().unwrap().push(accelerator.to_string());
            Ok(())
        }

        fn unregister_all(&self) -> Result<(), HotkeyError> {
            self.bound.lock().unwrap().clear();
            Ok(())
        }
    }

    fn router(backend: FakeHotkeys) -> (HotkeyRouter<FakeHotkeys>, Arc<SettingsStore>) {
        let store = Arc::new(SettingsStore::in_memory(Settings::default()));
        (HotkeyRouter::new(backend, store.clone()), store)
    }

    #[test]
    fn test_register_binds_quick_hotkey() {
        let (router, store) = router(FakeHotkeys::default());
        router.register(&store.get()).unwrap();

        assert_eq!(router.bound().as_deref(), Some("Alt+G"));
        assert!(router.backend.toggles("Alt+G"));
    }

    #[test]
    fn test_disable_then_enable_restores_binding() {
        let (router, store) = router(FakeHotkeys::default());
        router.register(&store.get()).unwrap();

        router.set_enabled(false).unwrap();
        assert!(!router.is_enabled());
        assert_eq!(router.bound(), None);
        assert!(!router.backend.toggles("Alt+G"));

        router.set_enabled(true).unwrap();
        assert_eq!(router.bound().as_deref(), Some("Alt+G"));
        assert_eq!(*router.backend.bound.lock().unwrap(), vec!["Alt+G".to_string()]);
    }

    #[test]
    fn test_changed_hotkey_rebinds() {
        let (router, store) = router(FakeHotkeys::default());
        router.register(&store.get()).unwrap();

        let updated = store.update(&json!({ "quickWindowHotkey": "ctrl+space" })).unwrap();
        router.register(&updated).unwrap();

        assert!(router.backend.toggles("Ctrl+Space"));
        assert!(!router.backend.toggles("Alt+G"));
        assert_eq!(router.bound().as_deref(), Some("Ctrl+Space"));
    }

    #[test]
    fn test_unavailable_hotkey_is_not_fatal() {
        let (router, store) = router(FakeHotkeys {
            taken: vec!["Alt+G".to_string()],
            ..FakeHotkeys::default()
        });

        let err = router.register(&store.get()).unwrap_err();
        assert!(matches!(err, HotkeyError::Unavailable(..)));
        assert_eq!(router.bound(), None);

        let updated = store.update(&json!({ "quickWindowHotkey": "Alt+Q" })).unwrap();
        router.register(&updated).unwrap();
        assert_eq!(router.bound().as_deref(), Some("Alt+Q"));
    }

    #[test]
    fn test_settings_teardown_restores_suspended_binding() {
        let (router, store) = router(FakeHotkeys::default());
        router.register(&store.get()).unwrap();
        assert!(!router.resume().unwrap());

        // hotkey field focused, then the window is destroyed before blur
        router.set_enabled(false).unwrap();
        assert!(router.resume().unwrap());

        assert!(router.is_enabled());
        assert_eq!(router.bound().as_deref(), Some("Alt+G"));
        assert_eq!(*router.backend.bound.lock().unwrap(), vec!["Alt+G".to_string()]);
        assert!(!router.resume().unwrap());
    }

    #[test]
    fn test_register_while_suspended_is_deferred() {
        let (router, store) = router(FakeHotkeys::default());
        router.set_enabled(false).unwrap();

        let updated = store.update(&json!({ "quickWindowHotkey": "Alt+K" })).unwrap();
        router.register(&updated).unwrap();
        assert_eq!(router.bound(), None);
        assert!(router.backend.bound.lock().unwrap().is_empty());

        router.set_enabled(true).unwrap();
        assert_eq!(router.bound().as_deref(), Some("Alt+K"));
    }
}
