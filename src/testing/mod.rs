//! In-memory collaborators for tests
//!
//! Each fake records what the core asked of it so tests can assert on the
//! exact calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SurfaceOptions, UpdaterConfig};
use crate::connectivity::ConnectivityProbe;
use crate::core::error::{ChannelError, EngineError, SurfaceError};
use crate::notice::{DialogResponse, Notice, NoticePresenter};
use crate::surface::{
    LifecycleCallback, MessageHandler, OwnerWindow, ProgressPayload, ProgressSurfaceManager,
    SurfaceFactory, SurfaceHandle, PROGRESS_CHANNEL,
};
use crate::transfer::TransferActivityRegistry;
use crate::update::{
    EventBus, EventHandler, SessionCollaborators, UpdateEngine, UpdateEvent, UpdateEventKind,
    UpdateSessionController,
};

// ============================================================================
// Engine
// ============================================================================

#[derive(Default)]
pub struct FakeEngine {
    bus: EventBus,
    pub checks: AtomicUsize,
    pub downloads: AtomicUsize,
    pub installs: AtomicUsize,
    pub auto_download: Mutex<Option<bool>>,
    pub config_path: Mutex<Option<PathBuf>>,
    subscribe_delay: Mutex<Option<Duration>>,
    failing_kinds: Mutex<HashSet<UpdateEventKind>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn emit(&self, event: UpdateEvent) {
        self.bus.emit(&event);
    }

    pub fn handler_count(&self, kind: UpdateEventKind) -> usize {
        self.bus.handler_count(kind)
    }

    /// Make `subscribe` fail for `kind` until cleared
    pub fn fail_subscribe(&self, kind: UpdateEventKind) {
        self.failing_kinds.lock().insert(kind);
    }

    /// Stall every `subscribe` call for `delay`
    pub fn slow_subscribe(&self, delay: Duration) {
        *self.subscribe_delay.lock() = Some(delay);
    }

    pub fn clear_failures(&self) {
        self.failing_kinds.lock().clear();
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateEngine for FakeEngine {
    fn subscribe(&self, kind: UpdateEventKind, handler: EventHandler) -> Result<(), EngineError> {
        let delay = *self.subscribe_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if self.failing_kinds.lock().contains(&kind) {
            return Err(EngineError::SubscribeFailed {
                event: kind.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.bus.subscribe(kind, handler);
        Ok(())
    }

    async fn check_for_updates(&self) -> Result<(), EngineError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download_update(&self) -> Result<(), EngineError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn quit_and_install(&self) {
        self.installs.fetch_add(1, Ordering::SeqCst);
    }

    fn set_auto_download(&self, enabled: bool) {
        *self.auto_download.lock() = Some(enabled);
    }

    fn set_config_path(&self, path: &Path) {
        *self.config_path.lock() = Some(path.to_path_buf());
    }
}

// ============================================================================
// Owner window
// ============================================================================

#[derive(Default)]
pub struct FakeOwnerWindow {
    pub progress: Mutex<Vec<f64>>,
    pub sent: Mutex<Vec<(String, serde_json::Value)>>,
    listeners: Mutex<HashMap<String, Vec<MessageHandler>>>,
    auto_reply: Mutex<Option<bool>>,
    listen_delay: Mutex<Option<Duration>>,
}

impl FakeOwnerWindow {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every seek request with `{"isActive": active}`
    pub fn reply_to_seeks_with(&self, active: bool) {
        *self.auto_reply.lock() = Some(active);
    }

    /// Stall every `on_message` registration for `delay`
    pub fn slow_listen(&self, delay: Duration) {
        *self.listen_delay.lock() = Some(delay);
    }

    /// Simulate the window's content posting a message back
    pub fn deliver(&self, channel: &str, payload: serde_json::Value) {
        let handlers = self
            .listeners
            .lock()
            .get(channel)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(payload.clone());
        }
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.lock().get(channel).map_or(0, Vec::len)
    }

    pub fn progress_values(&self) -> Vec<f64> {
        self.progress.lock().clone()
    }

    pub fn sent_on(&self, channel: &str) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl OwnerWindow for FakeOwnerWindow {
    fn set_progress_bar(&self, value: f64) {
        self.progress.lock().push(value);
    }

    fn send(&self, channel: &str, payload: serde_json::Value) -> Result<(), ChannelError> {
        self.sent.lock().push((channel.to_string(), payload));

        let auto_reply = *self.auto_reply.lock();
        if channel == crate::transfer::SEEK_CHANNEL {
            if let Some(active) = auto_reply {
                self.deliver(
                    crate::transfer::REPLY_CHANNEL,
                    serde_json::json!({ "isActive": active }),
                );
            }
        }
        Ok(())
    }

    fn on_message(&self, channel: &str, handler: MessageHandler) -> Result<(), ChannelError> {
        let delay = *self.listen_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.listeners
            .lock()
            .entry(channel.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }
}

// ============================================================================
// Surfaces
// ============================================================================

#[derive(Default)]
pub struct FakeSurface {
    pub route: Mutex<Option<String>>,
    pub sent: Mutex<Vec<(String, serde_json::Value)>>,
    pub focus_count: AtomicUsize,
    pub closed: AtomicBool,
    closed_callbacks: Mutex<Vec<LifecycleCallback>>,
    ready_callbacks: Mutex<Vec<LifecycleCallback>>,
    ready: AtomicBool,
    fail_load: AtomicBool,
}

impl FakeSurface {
    /// Fire the one-time ready signal
    pub fn fire_ready(&self) {
        if self.ready.swap(true, Ordering::SeqCst) {
            return;
        }
        let callbacks: Vec<_> = self.ready_callbacks.lock().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Payloads received on the progress channel
    pub fn payloads(&self) -> Vec<ProgressPayload> {
        self.sent
            .lock()
            .iter()
            .filter(|(c, _)| c == PROGRESS_CHANNEL)
            .map(|(_, v)| serde_json::from_value(v.clone()).unwrap())
            .collect()
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SurfaceHandle for FakeSurface {
    fn load_view(&self, route: &str) -> Result<(), SurfaceError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(SurfaceError::LoadFailed {
                route: route.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        *self.route.lock() = Some(route.to_string());
        Ok(())
    }

    fn on_closed(&self, callback: LifecycleCallback) {
        self.closed_callbacks.lock().push(callback);
    }

    fn once_ready(&self, callback: LifecycleCallback) {
        if self.ready.load(Ordering::SeqCst) {
            return;
        }
        self.ready_callbacks.lock().push(callback);
    }

    fn send(&self, channel: &str, payload: serde_json::Value) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::send_failed(channel, "surface closed"));
        }
        self.sent.lock().push((channel.to_string(), payload));
        Ok(())
    }

    fn focus(&self) {
        self.focus_count.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let callbacks: Vec<_> = self.closed_callbacks.lock().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }
}

#[derive(Default)]
pub struct FakeSurfaceFactory {
    pub created: Mutex<Vec<Arc<FakeSurface>>>,
    pub options: Mutex<Vec<SurfaceOptions>>,
    ready_on_load: AtomicBool,
    fail_create: AtomicBool,
    fail_load: AtomicBool,
}

impl FakeSurfaceFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Surfaces created from now on signal readiness as soon as they load
    pub fn ready_on_load(&self) {
        self.ready_on_load.store(true, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn last(&self) -> Option<Arc<FakeSurface>> {
        self.created.lock().last().cloned()
    }
}

/// Surface that fires ready right after its view loads
struct AutoReadySurface(Arc<FakeSurface>);

impl SurfaceHandle for AutoReadySurface {
    fn load_view(&self, route: &str) -> Result<(), SurfaceError> {
        self.0.load_view(route)?;
        self.0.fire_ready();
        Ok(())
    }

    fn on_closed(&self, callback: LifecycleCallback) {
        self.0.on_closed(callback)
    }

    fn once_ready(&self, callback: LifecycleCallback) {
        self.0.once_ready(callback)
    }

    fn send(&self, channel: &str, payload: serde_json::Value) -> Result<(), ChannelError> {
        self.0.send(channel, payload)
    }

    fn focus(&self) {
        self.0.focus()
    }

    fn close(&self) {
        self.0.close()
    }
}

impl SurfaceFactory for FakeSurfaceFactory {
    fn create(
        &self,
        options: &SurfaceOptions,
        _owner: &Arc<dyn OwnerWindow>,
    ) -> Result<Arc<dyn SurfaceHandle>, SurfaceError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(SurfaceError::CreateFailed {
                reason: "injected failure".to_string(),
            });
        }

        let surface = Arc::new(FakeSurface::default());
        surface
            .fail_load
            .store(self.fail_load.load(Ordering::SeqCst), Ordering::SeqCst);
        self.created.lock().push(Arc::clone(&surface));
        self.options.lock().push(options.clone());

        if self.ready_on_load.load(Ordering::SeqCst) {
            Ok(Arc::new(AutoReadySurface(surface)))
        } else {
            Ok(surface)
        }
    }
}

// ============================================================================
// Connectivity and notices
// ============================================================================

pub struct StaticConnectivity {
    online: AtomicBool,
    pub probes: AtomicUsize,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(online),
            probes: AtomicUsize::new(0),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for StaticConnectivity {
    async fn is_connected(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.online.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeNotices {
    pub errors: Mutex<Vec<(String, String)>>,
    pub messages: Mutex<Vec<Notice>>,
    responses: Mutex<VecDeque<DialogResponse>>,
}

impl FakeNotices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the answer to the next message box; unqueued boxes answer button 0
    pub fn respond_with(&self, response: DialogResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().clone()
    }

    pub fn messages(&self) -> Vec<Notice> {
        self.messages.lock().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.messages.lock().iter().map(|n| n.title.clone()).collect()
    }
}

#[async_trait]
impl NoticePresenter for FakeNotices {
    fn show_error(&self, title: &str, body: &str) {
        self.errors.lock().push((title.to_string(), body.to_string()));
    }

    async fn show_message(&self, notice: Notice) -> DialogResponse {
        self.messages.lock().push(notice);
        let response = self.responses.lock().pop_front();
        tokio::task::yield_now().await;
        response.unwrap_or(DialogResponse::Button(0))
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Controller wired to fresh fakes
pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub owner: Arc<FakeOwnerWindow>,
    pub factory: Arc<FakeSurfaceFactory>,
    pub surfaces: ProgressSurfaceManager,
    pub activity: TransferActivityRegistry,
    pub connectivity: Arc<StaticConnectivity>,
    pub notices: Arc<FakeNotices>,
    pub controller: UpdateSessionController,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(UpdaterConfig::default())
    }

    pub fn with_config(config: UpdaterConfig) -> Self {
        let engine = FakeEngine::new();
        let owner = FakeOwnerWindow::new();
        let factory = FakeSurfaceFactory::new();
        let connectivity = StaticConnectivity::new(true);
        let notices = FakeNotices::new();

        let surfaces = ProgressSurfaceManager::new(
            factory.clone(),
            config.surface.clone(),
            config.progress_view_route.clone(),
        );
        let activity = TransferActivityRegistry::new(config.activity_reply_timeout());

        let controller = UpdateSessionController::new(
            &config,
            SessionCollaborators {
                engine: engine.clone(),
                owner: owner.clone(),
                surfaces: surfaces.clone(),
                activity: activity.clone(),
                connectivity: connectivity.clone(),
                notices: notices.clone(),
            },
        );

        Self {
            engine,
            owner,
            factory,
            surfaces,
            activity,
            connectivity,
            notices,
            controller,
        }
    }
}
