use crate::windows::HOSTED_URL;
use std::sync::LazyLock;
use tauri::WebviewWindow;
use tracing::{debug, warn};

/// Clicks the page's own "New chat" control, or reloads the app root when
/// the control is not found (layout changes, collapsed sidebar).
static NEW_CHAT_SCRIPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"(function () {{
  try {{
    var wanted = "new chat";
    var candidates = document.querySelectorAll("button, a, [role='button']");
    for (var i = 0; i < candidates.length; i++) {{
      var el = candidates[i];
      var label = ((el.getAttribute("aria-label") || "") + " " + (el.textContent || "")).toLowerCase();
      if (label.indexOf(wanted) !== -1) {{
        el.click();
        return;
      }}
    }}
    window.location.href = "{HOSTED_URL}";
  }} catch (e) {{
    console.error("new chat failed", e);
  }}
}})();"#
    )
});

pub fn new_chat_script() -> &'static str {
    &NEW_CHAT_SCRIPT
}

pub fn inject_new_chat(window: &WebviewWindow) {
    match window.eval(new_chat_script()) {
        Ok(()) => debug!(window = window.label(), "new chat script injected"),
        Err(e) => warn!(window = window.label(), "failed to inject new chat script: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_targets_new_chat_and_falls_back_to_app_root() {
        let script = new_chat_script();
        assert!(script.contains("aria-label"));
        assert!(script.contains("\"new chat\""));
        assert!(script.contains(&format!("window.location.href = \"{HOSTED_URL}\"")));
        assert!(script.starts_with("(function () {"));
        assert!(script.ends_with("})();"));
    }
}
