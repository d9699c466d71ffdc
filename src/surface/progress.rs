//! Progress surface manager
//!
//! Owns the process-wide progress surface slot. At most one surface is live
//! at a time; a second `show` focuses the live one. Payloads sent before the
//! surface signals readiness are not lost: the latest one is held and
//! flushed once on the ready signal. Intermediate payloads are replaced,
//! since the surface only renders the current state.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

use super::{OwnerWindow, SurfaceFactory, SurfaceHandle};
use crate::config::SurfaceOptions;
use crate::core::error::{ChannelError, Result};

const COMPONENT: &str = "ProgressSurface";

/// Channel the progress view listens on
pub const PROGRESS_CHANNEL: &str = "progressBarDataCommunication";

/// Progress bar rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    Indeterminate,
    Determinate,
}

/// Message rendered by the progress view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    #[serde(rename = "progressTitle")]
    pub title: String,
    #[serde(rename = "progressBodyText")]
    pub body: String,
    /// Percentage, 0-100
    pub value: f64,
    #[serde(rename = "variant")]
    pub mode: ProgressMode,
}

impl ProgressPayload {
    /// Spinner-style payload with no meaningful value
    pub fn indeterminate(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            value: 0.0,
            mode: ProgressMode::Indeterminate,
        }
    }

    /// Percentage payload; `value` is clamped to 0-100
    pub fn determinate(title: impl Into<String>, body: impl Into<String>, value: f64) -> Self {
        let value = if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 };
        Self {
            title: title.into(),
            body: body.into(),
            value,
            mode: ProgressMode::Determinate,
        }
    }
}

/// Readiness of the progress surface slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceReadiness {
    /// No surface live
    Absent,
    /// Surface created, ready signal not received yet
    Pending,
    /// Surface accepts messages
    Ready,
}

impl SurfaceReadiness {
    /// `None` when absent, otherwise whether the surface is ready
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SurfaceReadiness::Absent => None,
            SurfaceReadiness::Pending => Some(false),
            SurfaceReadiness::Ready => Some(true),
        }
    }
}

/// Result of a `show` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// A new surface was created
    Created,
    /// A surface was already live and got focus
    Focused,
}

#[derive(Default)]
struct SurfaceSlot {
    /// Bumped per created surface so stale callbacks can't touch a newer one
    generation: u64,
    handle: Option<Arc<dyn SurfaceHandle>>,
    ready: bool,
    pending: Option<ProgressPayload>,
}

/// Manager for the single progress surface.
///
/// Cloning shares the same slot; create one per process and hand clones to
/// whoever needs it.
#[derive(Clone)]
pub struct ProgressSurfaceManager {
    factory: Arc<dyn SurfaceFactory>,
    options: SurfaceOptions,
    route: String,
    slot: Arc<Mutex<SurfaceSlot>>,
}

impl ProgressSurfaceManager {
    pub fn new(
        factory: Arc<dyn SurfaceFactory>,
        options: SurfaceOptions,
        route: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            options,
            route: route.into(),
            slot: Arc::new(Mutex::new(SurfaceSlot::default())),
        }
    }

    /// Whether a progress surface is live
    pub fn is_live(&self) -> bool {
        self.slot.lock().handle.is_some()
    }

    /// Current readiness of the slot
    pub fn readiness(&self) -> SurfaceReadiness {
        let slot = self.slot.lock();
        match (&slot.handle, slot.ready) {
            (None, _) => SurfaceReadiness::Absent,
            (Some(_), false) => SurfaceReadiness::Pending,
            (Some(_), true) => SurfaceReadiness::Ready,
        }
    }

    /// Show the progress surface, focusing the live one if there is one
    pub fn show(&self, owner: &Arc<dyn OwnerWindow>) -> Result<ShowOutcome> {
        let (handle, generation) = {
            let mut slot = self.slot.lock();
            if let Some(existing) = slot.handle.clone() {
                drop(slot);
                existing.focus();
                tracing::debug!(component = COMPONENT, "Progress surface already live, focusing it");
                return Ok(ShowOutcome::Focused);
            }

            let handle = self.factory.create(&self.options, owner)?;
            slot.generation += 1;
            slot.handle = Some(Arc::clone(&handle));
            slot.ready = false;
            slot.pending = None;
            (handle, slot.generation)
        };

        let weak = Arc::downgrade(&self.slot);
        handle.on_closed(Box::new(move || Self::handle_closed(&weak, generation)));

        let weak = Arc::downgrade(&self.slot);
        handle.once_ready(Box::new(move || Self::handle_ready(&weak, generation)));

        if let Err(e) = handle.load_view(&self.route) {
            tracing::error!(component = COMPONENT, route = %self.route, error = %e, "Failed to load progress view");
            self.release(generation);
            handle.close();
            return Err(e.into());
        }

        tracing::debug!(component = COMPONENT, generation, "Progress surface created");
        Ok(ShowOutcome::Created)
    }

    /// Send a payload, holding it until the surface is ready.
    ///
    /// With no live surface the payload is dropped.
    pub fn send(&self, payload: ProgressPayload) -> Result<()> {
        let handle = {
            let mut slot = self.slot.lock();
            let Some(handle) = slot.handle.clone() else {
                tracing::trace!(component = COMPONENT, "No progress surface live, dropping payload");
                return Ok(());
            };
            if !slot.ready {
                slot.pending = Some(payload);
                return Ok(());
            }
            handle
        };

        Self::deliver(handle.as_ref(), &payload)
    }

    /// Focus the live surface, if any
    pub fn focus(&self) {
        let handle = self.slot.lock().handle.clone();
        if let Some(handle) = handle {
            handle.focus();
        }
    }

    /// Close the live surface, if any. The close handler clears the slot.
    pub fn close(&self) {
        let handle = self.slot.lock().handle.clone();
        if let Some(handle) = handle {
            handle.close();
        }
    }

    fn deliver(handle: &dyn SurfaceHandle, payload: &ProgressPayload) -> Result<()> {
        let value = serde_json::to_value(payload).map_err(|e| ChannelError::Malformed {
            channel: PROGRESS_CHANNEL.to_string(),
            reason: e.to_string(),
        })?;
        handle.send(PROGRESS_CHANNEL, value)?;
        Ok(())
    }

    fn release(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.generation == generation {
            slot.handle = None;
            slot.ready = false;
            slot.pending = None;
        }
    }

    fn handle_closed(slot: &Weak<Mutex<SurfaceSlot>>, generation: u64) {
        let Some(slot) = slot.upgrade() else {
            return;
        };
        let mut slot = slot.lock();
        if slot.generation != generation {
            return;
        }
        slot.handle = None;
        slot.ready = false;
        slot.pending = None;
        tracing::debug!(component = COMPONENT, generation, "Progress surface closed");
    }

    fn handle_ready(slot: &Weak<Mutex<SurfaceSlot>>, generation: u64) {
        let Some(slot) = slot.upgrade() else {
            return;
        };
        let (handle, pending) = {
            let mut slot = slot.lock();
            if slot.generation != generation {
                return;
            }
            let Some(handle) = slot.handle.clone() else {
                return;
            };
            slot.ready = true;
            (handle, slot.pending.take())
        };

        if let Some(payload) = pending {
            if let Err(e) = Self::deliver(handle.as_ref(), &payload) {
                tracing::warn!(component = COMPONENT, error = %e, "Failed to flush buffered progress payload");
            }
        }
    }
}
