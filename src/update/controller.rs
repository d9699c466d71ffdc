//! Update session controller
//!
//! State machine over the engine's lifecycle events. Event handlers do their
//! synchronous work (taskbar, surface teardown, state) in emission order and
//! hand anything that waits on the user or the network to a tracked task:
//!
//! ```text
//! Idle -> Checking -> AwaitingConfirmation -> Downloading -> ReadyToInstall -> Installing
//!            |                 |
//!            +-> Idle          +-> Idle (declined)
//! any error -> Idle
//! ```
//!
//! Passive checks skip `Checking`; forced checks also wire the
//! `checking-for-update` / `update-not-available` listeners.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::task::TaskTracker;

use super::engine::{DownloadProgress, EventHandler, UpdateEngine, UpdateEvent, UpdateEventKind};
use super::prompts::{self, ProgressFlow};
use super::state::{UpdateSession, UpdateState};
use crate::config::UpdaterConfig;
use crate::connectivity::ConnectivityProbe;
use crate::core::error::EngineError;
use crate::notice::{DialogResponse, NoticePresenter};
use crate::surface::{OwnerWindow, ProgressPayload, ProgressSurfaceManager};
use crate::transfer::{TaskbarProgress, TransferActivityRegistry};

const COMPONENT: &str = "UpdateSession";

/// Listeners wired by `init`
const CORE_EVENTS: [UpdateEventKind; 4] = [
    UpdateEventKind::Error,
    UpdateEventKind::UpdateAvailable,
    UpdateEventKind::DownloadProgress,
    UpdateEventKind::UpdateDownloaded,
];

/// Listeners wired lazily by `force_check`
const FORCE_CHECK_EVENTS: [UpdateEventKind; 2] = [
    UpdateEventKind::CheckingForUpdate,
    UpdateEventKind::UpdateNotAvailable,
];

/// Everything the controller drives.
///
/// `surfaces` and `activity` are process-wide; pass clones of the single
/// instances the host owns.
pub struct SessionCollaborators {
    pub engine: Arc<dyn UpdateEngine>,
    pub owner: Arc<dyn OwnerWindow>,
    pub surfaces: ProgressSurfaceManager,
    pub activity: TransferActivityRegistry,
    pub connectivity: Arc<dyn ConnectivityProbe>,
    pub notices: Arc<dyn NoticePresenter>,
}

#[derive(Default)]
struct SessionFlags {
    initialized: bool,
    force_check_wired: bool,
    wired: HashSet<UpdateEventKind>,
    state: UpdateState,
}

struct Inner {
    engine: Arc<dyn UpdateEngine>,
    owner: Arc<dyn OwnerWindow>,
    surfaces: ProgressSurfaceManager,
    activity: TransferActivityRegistry,
    connectivity: Arc<dyn ConnectivityProbe>,
    notices: Arc<dyn NoticePresenter>,
    flags: Mutex<SessionFlags>,
    /// Held across check, subscribe and mark so listeners attach once
    wiring: Mutex<()>,
    tasks: TaskTracker,
    /// One `wait_idle` at a time; it closes and reopens `tasks`
    idle: AsyncMutex<()>,
    runtime: Option<Handle>,
}

/// Controller for the update session. One per process; clones share it.
#[derive(Clone)]
pub struct UpdateSessionController {
    inner: Arc<Inner>,
}

impl UpdateSessionController {
    /// Create the controller and push engine settings from `config`
    pub fn new(config: &UpdaterConfig, collaborators: SessionCollaborators) -> Self {
        let SessionCollaborators {
            engine,
            owner,
            surfaces,
            activity,
            connectivity,
            notices,
        } = collaborators;

        engine.set_auto_download(config.auto_download);
        if let Some(path) = config.engine_config_override() {
            tracing::debug!(component = COMPONENT, path = %path.display(), "Using engine config override");
            engine.set_config_path(path);
        }

        Self {
            inner: Arc::new(Inner {
                engine,
                owner,
                surfaces,
                activity,
                connectivity,
                notices,
                flags: Mutex::new(SessionFlags::default()),
                wiring: Mutex::new(()),
                tasks: TaskTracker::new(),
                idle: AsyncMutex::new(()),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// Snapshot of the session flags
    pub fn session(&self) -> UpdateSession {
        let surface_ready = self.inner.surfaces.readiness().as_flag();
        let flags = self.inner.flags.lock();
        UpdateSession {
            initialized: flags.initialized,
            force_check_wired: flags.force_check_wired,
            surface_ready,
            state: flags.state,
        }
    }

    /// Current position in the update cycle
    pub fn state(&self) -> UpdateState {
        self.inner.state()
    }

    /// Wire the core engine listeners. Safe to call repeatedly.
    pub fn init(&self) {
        let _wiring = self.inner.wiring.lock();
        if self.inner.flags.lock().initialized {
            return;
        }

        match self.wire(&CORE_EVENTS) {
            Ok(()) => {
                self.inner.flags.lock().initialized = true;
                tracing::info!(component = COMPONENT, "Update listeners wired");
            }
            Err(e) => {
                tracing::error!(component = COMPONENT, operation = "init", error = %e, "Failed to wire update listeners");
            }
        }
    }

    /// Passive check: outcome only surfaces if an update is found
    pub async fn check_for_updates(&self) {
        if let Err(e) = self.inner.engine.check_for_updates().await {
            tracing::error!(component = COMPONENT, operation = "check_for_updates", error = %e, "Update check failed");
        }
    }

    /// Interactive check: shows checking progress and reports "up to date"
    pub async fn force_check(&self) {
        self.wire_force_check();
        self.check_for_updates().await;
    }

    /// Wait for every pending continuation (prompts, probes) to finish.
    ///
    /// Overlapping callers are served one after another.
    pub async fn wait_idle(&self) {
        let _idle = self.inner.idle.lock().await;
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    fn wire_force_check(&self) {
        let _wiring = self.inner.wiring.lock();
        if self.inner.flags.lock().force_check_wired {
            return;
        }

        match self.wire(&FORCE_CHECK_EVENTS) {
            Ok(()) => self.inner.flags.lock().force_check_wired = true,
            Err(e) => {
                tracing::error!(component = COMPONENT, operation = "force_check", error = %e, "Failed to wire check listeners");
            }
        }
    }

    /// Subscribe every kind not wired yet. Callers hold `wiring`.
    fn wire(&self, kinds: &[UpdateEventKind]) -> Result<(), EngineError> {
        for &kind in kinds {
            if self.inner.flags.lock().wired.contains(&kind) {
                continue;
            }

            let weak = Arc::downgrade(&self.inner);
            let handler: EventHandler = Arc::new(move |event: &UpdateEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.dispatch(event);
                }
            });

            self.inner.engine.subscribe(kind, handler)?;
            self.inner.flags.lock().wired.insert(kind);
            tracing::debug!(component = COMPONENT, event = %kind, "Listener wired");
        }
        Ok(())
    }
}

impl Inner {
    fn state(&self) -> UpdateState {
        self.flags.lock().state
    }

    fn set_state(&self, next: UpdateState) {
        let mut flags = self.flags.lock();
        if flags.state != next {
            tracing::debug!(component = COMPONENT, from = ?flags.state, to = ?next, "State transition");
            flags.state = next;
        }
    }

    fn dispatch(self: &Arc<Self>, event: &UpdateEvent) {
        match event {
            UpdateEvent::Error { message } => self.on_error(message.as_deref()),
            UpdateEvent::UpdateAvailable => self.on_update_available(),
            UpdateEvent::DownloadProgress(progress) => self.on_download_progress(progress),
            UpdateEvent::UpdateDownloaded => self.on_update_downloaded(),
            UpdateEvent::CheckingForUpdate => self.on_checking_for_update(),
            UpdateEvent::UpdateNotAvailable => self.on_update_not_available(),
        }
    }

    fn on_error(&self, message: Option<&str>) {
        self.reset_progress(UpdateState::Idle);

        let text = prompts::error_text(message);
        self.notices.show_error(prompts::ERROR_TITLE, &text);
        tracing::error!(component = COMPONENT, error = %text, "Update engine reported an error");
    }

    fn on_update_available(self: &Arc<Self>) {
        self.reset_progress(UpdateState::AwaitingConfirmation);

        let inner = Arc::clone(self);
        self.spawn(async move {
            match inner.notices.show_message(prompts::update_available()).await {
                DialogResponse::Button(0) => {
                    tracing::info!(component = COMPONENT, "Update accepted, downloading");
                    inner.set_state(UpdateState::Downloading);
                    inner.start_progress_flow(ProgressFlow::Downloading).await;
                    if let Err(e) = inner.engine.download_update().await {
                        tracing::error!(component = COMPONENT, operation = "download_update", error = %e, "Update download failed");
                    }
                }
                response => {
                    tracing::info!(component = COMPONENT, ?response, "Update declined");
                    inner.set_state(UpdateState::Idle);
                }
            }
        });
    }

    fn on_download_progress(&self, progress: &DownloadProgress) {
        if !self.surfaces.is_live() {
            return;
        }
        self.set_download_progress(progress.percent.unwrap_or(0.0));
    }

    fn on_update_downloaded(self: &Arc<Self>) {
        self.reset_progress(UpdateState::ReadyToInstall);

        let inner = Arc::clone(self);
        self.spawn(async move {
            // Every answer installs; the prompt only has the one button
            let response = inner.notices.show_message(prompts::update_downloaded()).await;
            tracing::info!(component = COMPONENT, ?response, "Installing update and relaunching");
            inner.set_state(UpdateState::Installing);
            inner.engine.quit_and_install();
        });
    }

    fn on_checking_for_update(self: &Arc<Self>) {
        self.set_state(UpdateState::Checking);

        let inner = Arc::clone(self);
        self.spawn(async move {
            inner.start_progress_flow(ProgressFlow::Checking).await;
        });
    }

    fn on_update_not_available(self: &Arc<Self>) {
        self.reset_progress(UpdateState::Idle);

        let inner = Arc::clone(self);
        self.spawn(async move {
            inner.notices.show_message(prompts::up_to_date()).await;
        });
    }

    /// Open the progress surface for `flow` once connectivity is confirmed
    async fn start_progress_flow(&self, flow: ProgressFlow) {
        let expected = match flow {
            ProgressFlow::Checking => UpdateState::Checking,
            ProgressFlow::Downloading => UpdateState::Downloading,
        };

        if !self.connectivity.is_connected().await {
            tracing::warn!(component = COMPONENT, ?flow, "Offline, progress flow aborted");
            if self.state() == expected {
                self.set_state(UpdateState::Idle);
            }
            self.notices.show_message(flow.offline_notice()).await;
            return;
        }

        // An event may have moved the session on while the probe ran
        if self.state() != expected {
            tracing::debug!(component = COMPONENT, ?flow, state = ?self.state(), "Progress flow superseded");
            return;
        }

        self.open_surface();
        match flow {
            ProgressFlow::Checking => {
                self.set_taskbar(TaskbarProgress::Indeterminate);
                self.send_progress(flow.payload(0.0));
            }
            ProgressFlow::Downloading => self.set_download_progress(0.0),
        }
    }

    fn set_download_progress(&self, percent: f64) {
        let payload = ProgressFlow::Downloading.payload(percent);
        self.set_taskbar(TaskbarProgress::Fraction(payload.value / 100.0));
        self.send_progress(payload);
    }

    fn open_surface(&self) {
        if !self.surfaces.is_live() {
            if let Err(e) = self.activity.request_status(&self.owner) {
                tracing::warn!(component = COMPONENT, error = %e, "Transfer activity request failed");
            }
        }

        if let Err(e) = self.surfaces.show(&self.owner) {
            tracing::error!(component = COMPONENT, error = %e, "Failed to show progress surface");
        }
    }

    fn reset_progress(&self, next: UpdateState) {
        self.set_taskbar(TaskbarProgress::Hidden);
        self.surfaces.close();
        self.set_state(next);
    }

    fn set_taskbar(&self, progress: TaskbarProgress) {
        self.activity.set_taskbar_progress(&self.owner, progress);
    }

    fn send_progress(&self, payload: ProgressPayload) {
        if let Err(e) = self.surfaces.send(payload) {
            tracing::warn!(component = COMPONENT, error = %e, "Failed to send progress payload");
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current().ok().or_else(|| self.runtime.clone()) {
            Some(handle) => {
                self.tasks.spawn_on(task, &handle);
            }
            None => {
                tracing::error!(component = COMPONENT, "No async runtime, update continuation dropped");
            }
        }
    }
}
