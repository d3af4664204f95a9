//! Debounced persistence of the Quick Window rectangle.
//!
//! Move/resize events arrive in bursts. Each one replaces the single pending
//! write and restarts its timer; only the rectangle that survives a quiet
//! period is handed to the sink.

use crate::settings::{SettingsStore, WindowBounds};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const BOUNDS_DEBOUNCE: Duration = Duration::from_millis(500);

/// Where settled bounds end up.
pub trait BoundsSink: Send + Sync + 'static {
    fn persist(&self, bounds: WindowBounds);
}

impl BoundsSink for SettingsStore {
    fn persist(&self, bounds: WindowBounds) {
        match self.update(&serde_json::json!({ "quickWindowBounds": bounds })) {
            Ok(_) => debug!(?bounds, "quick window bounds saved"),
            Err(e) => warn!("failed to save quick window bounds: {e}"),
        }
    }
}

struct PendingBoundsWrite {
    bounds: WindowBounds,
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    pending: Option<PendingBoundsWrite>,
}

pub struct BoundsDebouncer {
    runtime: Handle,
    delay: Duration,
    sink: Arc<dyn BoundsSink>,
    slot: Arc<Mutex<Slot>>,
}

impl BoundsDebouncer {
    pub fn new(runtime: Handle, delay: Duration, sink: Arc<dyn BoundsSink>) -> Self {
        Self {
            runtime,
            delay,
            sink,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn on_bounds_changed(&self, bounds: WindowBounds) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        let generation = slot.generation;
        if let Some(previous) = slot.pending.take() {
            previous.task.abort();
        }

        let shared = Arc::clone(&self.slot);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let settled = {
                let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
                match &slot.pending {
                    Some(pending) if pending.generation == generation => {
                        slot.pending.take().map(|pending| pending.bounds)
                    }
                    _ => None,
                }
            };
            if let Some(bounds) = settled {
                sink.persist(bounds);
            }
        });

        slot.pending = Some(PendingBoundsWrite {
            bounds,
            generation,
            task,
        });
    }

    /// Drops the pending write, if any. Called when the window goes away.
    pub fn cancel(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = slot.pending.take() {
            pending.task.abort();
            debug!("discarded pending quick window bounds write");
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<WindowBounds> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .as_ref()
            .map(|pending| pending.bounds)
    }
}

impl Drop for BoundsDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
