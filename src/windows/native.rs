//! Tauri webview windows behind [`WindowFactory`] and [`NativeWindow`].

use super::{NativeWindow, WindowContent, WindowFactory, WindowSpec};
use crate::downloads::{self, Downloads};
use crate::navigation::NavigationGuard;
use crate::settings::WindowBounds;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tauri::webview::{DownloadEvent, NewWindowResponse};
use tauri::{AppHandle, Manager, Url, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

pub struct TauriWindows {
    app: AppHandle,
    guard: Arc<NavigationGuard>,
    downloads: Arc<Downloads>,
}

impl TauriWindows {
    pub fn new(app: AppHandle, guard: Arc<NavigationGuard>, downloads: Arc<Downloads>) -> Self {
        Self {
            app,
            guard,
            downloads,
        }
    }
}

impl WindowFactory for TauriWindows {
    type Window = WebviewWindow;

    fn build(
        &self,
        spec: &WindowSpec,
        parent: Option<&WebviewWindow>,
    ) -> anyhow::Result<WebviewWindow> {
        let url = match &spec.content {
            WindowContent::Hosted(url) => WebviewUrl::External(url.clone()),
            WindowContent::Local(path) => WebviewUrl::App(PathBuf::from(path)),
        };

        let mut builder = WebviewWindowBuilder::new(&self.app, spec.role.label(), url)
            .title(spec.title)
            .inner_size(spec.width, spec.height)
            .visible(spec.visible)
            .always_on_top(spec.always_on_top)
            .skip_taskbar(spec.skip_taskbar)
            .resizable(spec.resizable)
            .minimizable(spec.minimizable)
            .maximizable(spec.maximizable);

        builder = match spec.position {
            Some((x, y)) => builder.position(x, y),
            None => builder.center(),
        };

        if let Some(parent) = parent {
            builder = builder
                .parent(parent)
                .context("failed to attach settings window to quick window")?;
        }

        if matches!(spec.content, WindowContent::Hosted(_)) {
            let guard = Arc::clone(&self.guard);
            let popup_guard = Arc::clone(&self.guard);
            let downloads = Arc::clone(&self.downloads);
            builder = builder
                .on_navigation(move |url| guard.on_navigation(url))
                .on_new_window(move |url, _features| {
                    if popup_guard.on_new_window(&url) {
                        NewWindowResponse::Allow
                    } else {
                        NewWindowResponse::Deny
                    }
                })
                .on_download(move |webview, event| {
                    match event {
                        DownloadEvent::Requested { url, destination } => {
                            downloads.on_requested(&url, destination);
                        }
                        DownloadEvent::Finished { url, path, success } => {
                            if let Some(path) = downloads.on_finished(&url, path, success) {
                                downloads::notify_complete(webview.app_handle(), &path);
                            }
                        }
                        _ => {}
                    }
                    true
                });
        }

        builder
            .build()
            .with_context(|| format!("failed to create {} window", spec.role.label()))
    }

    fn work_area_right(&self) -> Option<f64> {
        let monitor = self.app.primary_monitor().ok().flatten()?;
        let scale = monitor.scale_factor();
        // excludes the taskbar and dock
        let area = monitor.work_area();
        let left = area.position.to_logical::<f64>(scale).x;
        let width = area.size.to_logical::<f64>(scale).width;
        Some(left + width)
    }
}

impl NativeWindow for WebviewWindow {
    fn show(&self) -> anyhow::Result<()> {
        WebviewWindow::show(self).context("show")
    }

    fn hide(&self) -> anyhow::Result<()> {
        WebviewWindow::hide(self).context("hide")
    }

    fn focus(&self) -> anyhow::Result<()> {
        self.set_focus().context("focus")
    }

    fn unminimize(&self) -> anyhow::Result<()> {
        WebviewWindow::unminimize(self).context("unminimize")
    }

    fn is_visible(&self) -> bool {
        WebviewWindow::is_visible(self).unwrap_or(false)
    }

    fn is_focused(&self) -> bool {
        WebviewWindow::is_focused(self).unwrap_or(false)
    }

    fn load(&self, url: &Url) -> anyhow::Result<()> {
        self.navigate(url.clone())
            .with_context(|| format!("navigate to {url}"))
    }

    fn reload(&self) -> anyhow::Result<()> {
        self.eval("window.location.reload()").context("reload")
    }

    fn close(&self) -> anyhow::Result<()> {
        WebviewWindow::close(self).context("close")
    }

    fn set_always_on_top(&self, on_top: bool) -> anyhow::Result<()> {
        WebviewWindow::set_always_on_top(self, on_top).context("set always on top")
    }
}

/// Logical outer position and inner size, matching what [`WindowSpec`] builds from.
pub fn window_bounds(window: &tauri::Window) -> Option<WindowBounds> {
    let scale = window.scale_factor().ok()?;
    let position = window.outer_position().ok()?.to_logical::<f64>(scale);
    let size = window.inner_size().ok()?.to_logical::<f64>(scale);
    Some(WindowBounds {
        x: position.x,
        y: position.y,
        width: size.width,
        height: size.height,
    })
}
