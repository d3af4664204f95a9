//! Keeps hosted windows on the hosted app and its sign-in pages.
//!
//! Anything else the page tries to open, in place or as a new window, goes
//! to the user's default browser instead of replacing the app surface.

use std::sync::Arc;
use tauri::{AppHandle, Url};
use tauri_plugin_opener::OpenerExt;
use tracing::{debug, info, warn};

pub const ALLOWED_ORIGINS: &[&str] = &["https://gemini.google.com", "https://accounts.google.com"];

// never handed to the OS: they would run page-controlled content outside the sandbox
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "blob", "file"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Load inside the app window.
    Allow,
    /// Cancel in-app and hand to the OS default handler.
    OpenExternally,
    /// Cancel in-app and drop.
    Block,
}

pub trait ExternalOpener: Send + Sync + 'static {
    fn open_external(&self, url: &Url);
}

pub struct TauriOpener(pub AppHandle);

impl ExternalOpener for TauriOpener {
    fn open_external(&self, url: &Url) {
        if let Err(e) = self.0.opener().open_url(url.as_str(), None::<&str>) {
            warn!(%url, "failed to open in default browser: {e}");
        }
    }
}

pub struct NavigationGuard {
    allowed: Vec<Url>,
    opener: Arc<dyn ExternalOpener>,
}

impl NavigationGuard {
    pub fn new(allowed: &[&str], opener: Arc<dyn ExternalOpener>) -> Self {
        let allowed = allowed
            .iter()
            .filter_map(|origin| match Url::parse(origin) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(origin, "ignoring malformed allowed origin: {e}");
                    None
                }
            })
            .collect();
        Self { allowed, opener }
    }

    pub fn classify(&self, url: &Url) -> Verdict {
        match url.scheme() {
            "http" | "https" => {
                let origin = url.origin();
                if self.allowed.iter().any(|allowed| allowed.origin() == origin) {
                    Verdict::Allow
                } else {
                    Verdict::OpenExternally
                }
            }
            "about" => Verdict::Allow,
            scheme if BLOCKED_SCHEMES.contains(&scheme) => Verdict::Block,
            _ => Verdict::OpenExternally,
        }
    }

    /// Same-window navigation. Returns whether it may continue in place.
    pub fn on_navigation(&self, url: &Url) -> bool {
        self.route(url, "navigation")
    }

    /// `window.open` and target=_blank links. Returns whether the webview may
    /// open the new window itself.
    pub fn on_new_window(&self, url: &Url) -> bool {
        self.route(url, "new window")
    }

    fn route(&self, url: &Url, kind: &str) -> bool {
        match self.classify(url) {
            Verdict::Allow => {
                debug!(%url, kind, "allowed in app");
                true
            }
            Verdict::OpenExternally => {
                info!(%url, kind, "opening in default browser");
                self.opener.open_external(url);
                false
            }
            Verdict::Block => {
                warn!(%url, kind, "blocked navigation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl ExternalOpener for RecordingOpener {
        fn open_external(&self, url: &Url) {
            self.opened.lock().unwrap().push(url.to_string());
        }
    }

    fn guard() -> (NavigationGuard, Arc<RecordingOpener>) {
        let opener = Arc::new(RecordingOpener::default());
        (NavigationGuard::new(ALLOWED_ORIGINS, opener.clone()), opener)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_allowed_origins_stay_in_app() {
        let (guard, opener) = guard();

        assert!(guard.on_navigation(&url("https://gemini.google.com/app/abc123")));
        assert!(guard.on_navigation(&url("https://accounts.google.com/signin?continue=x")));
        assert!(guard.on_new_window(&url("https://accounts.google.com/o/oauth2/auth")));

        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_other_origins_are_delegated() {
        let (guard, opener) = guard();

        assert!(!guard.on_navigation(&url("https://support.google.com/gemini")));
        assert!(!guard.on_new_window(&url("https://example.com/shared?id=1")));

        assert_eq!(
            *opener.opened.lock().unwrap(),
            vec![
                "https://support.google.com/gemini".to_string(),
                "https://example.com/shared?id=1".to_string(),
            ]
        );
    }

    #[test]
    fn test_origin_match_is_exact() {
        let (guard, _) = guard();

        for lookalike in [
            "https://gemini.google.com.evil.example/app",
            "http://gemini.google.com/app",
            "https://gemini.google.com:8443/app",
            "https://evil.example/https://gemini.google.com",
        ] {
            assert_eq!(guard.classify(&url(lookalike)), Verdict::OpenExternally, "{lookalike}");
        }
    }

    #[test]
    fn test_non_web_schemes() {
        let (guard, opener) = guard();

        assert_eq!(guard.classify(&url("about:blank")), Verdict::Allow);
        assert_eq!(
            guard.classify(&url("mailto:someone@example.com")),
            Verdict::OpenExternally
        );
        assert_eq!(guard.classify(&url("javascript:alert(1)")), Verdict::Block);
        assert_eq!(guard.classify(&url("file:///etc/passwd")), Verdict::Block);

        assert!(!guard.on_new_window(&url("data:text/html,hi")));
        assert!(opener.opened.lock().unwrap().is_empty());
    }
}
