//! Integration tests for the switch coordinator.
//!
//! The coordinator runs against an in-memory backend and a paused Tokio
//! clock, so the confirmation and grace timers can be checked at exact
//! instants.
//!
//! ```bash
//! cargo test -p browserbar --test switcher_integration
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use browserbar_lib::browsers::{BrowserHandle, BrowserRegistry, IconRef};
use browserbar_lib::config::SwitchTimings;
use browserbar_lib::handler::{DefaultHandlerService, STATUS_PERMISSION_DENIED};
use browserbar_lib::platform::PlatformError;
use browserbar_lib::store::{PreferenceStore, VisibilityStore};
use browserbar_lib::switcher::{
    IconState, STATUS_BACKEND_PANIC, SwitchActor, SwitchActorHandle, SwitchError, SwitchPhase,
    SwitchServices,
};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::time::{Instant, sleep_until};

// ============================================================================
// Fake backend
// ============================================================================

#[derive(Default)]
struct FakeSystem {
    candidates: Mutex<Vec<BrowserHandle>>,
    current: Mutex<Option<String>>,
    /// Status returned per scheme; missing schemes succeed.
    statuses: Mutex<HashMap<&'static str, i32>>,
    /// Whether accepted registrations change `current` right away.
    auto_apply: Mutex<bool>,
    /// Registering this bundle id panics.
    panic_on_register: Mutex<Option<String>>,
    /// Reading the current default panics.
    panic_on_read: AtomicBool,
    default_reads: AtomicUsize,
    detections: AtomicUsize,
}

impl FakeSystem {
    fn with_browsers(ids: &[(&str, &str)]) -> Arc<Self> {
        let system = Self::default();
        *system.candidates.lock() =
            ids.iter().map(|(id, name)| BrowserHandle::new(*id, *name, IconRef::none())).collect();
        Arc::new(system)
    }

    fn set_current(&self, id: &str) { *self.current.lock() = Some(id.to_string()); }

    fn deny_all(&self) {
        let mut statuses = self.statuses.lock();
        statuses.insert("http", STATUS_PERMISSION_DENIED);
        statuses.insert("https", STATUS_PERMISSION_DENIED);
    }

    fn set_status(&self, scheme: &'static str, status: i32) {
        self.statuses.lock().insert(scheme, status);
    }

    fn default_reads(&self) -> usize { self.default_reads.load(Ordering::SeqCst) }

    fn detections(&self) -> usize { self.detections.load(Ordering::SeqCst) }
}

impl BrowserRegistry for FakeSystem {
    fn query_applications(&self) -> Result<Vec<BrowserHandle>, PlatformError> {
        self.detections.fetch_add(1, Ordering::SeqCst);
        Ok(self.candidates.lock().clone())
    }
}

impl DefaultHandlerService for FakeSystem {
    fn current_default(&self) -> Option<String> {
        self.default_reads.fetch_add(1, Ordering::SeqCst);
        assert!(!self.panic_on_read.load(Ordering::SeqCst), "handler read exploded");
        self.current.lock().clone()
    }

    fn register_scheme(&self, scheme: &'static str, bundle_id: &str) -> i32 {
        let explode = self.panic_on_register.lock().as_deref() == Some(bundle_id);
        assert!(!explode, "registration of {bundle_id} exploded");
        let status = self.statuses.lock().get(scheme).copied().unwrap_or(0);
        if status == 0 && *self.auto_apply.lock() {
            self.set_current(bundle_id);
        }
        status
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    system: Arc<FakeSystem>,
    handle: SwitchActorHandle,
    _dir: TempDir,
}

fn timings() -> SwitchTimings {
    SwitchTimings {
        poll_interval: Duration::from_millis(400),
        confirm_timeout: Duration::from_secs(15),
        success_grace: Duration::from_secs(2),
    }
}

fn start(system: Arc<FakeSystem>) -> Harness { start_with(system, timings()) }

fn start_with(system: Arc<FakeSystem>, timings: SwitchTimings) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path().join("preferences.json"));
    let visibility = Arc::new(VisibilityStore::new(store));
    let handle = SwitchActor::spawn(SwitchServices::new(system.clone(), visibility), timings);
    Harness { system, handle, _dir: dir }
}

fn browsers() -> Arc<FakeSystem> {
    FakeSystem::with_browsers(&[("com.a", "Alpha"), ("com.b", "Beta"), ("com.c", "Gamma")])
}

async fn at(origin: Instant, secs: f64) { sleep_until(origin + Duration::from_secs_f64(secs)).await; }

/// Records every icon state the subscriber sees.
fn record_icon_states(handle: &SwitchActorHandle) -> Arc<Mutex<Vec<IconState>>> {
    let seen = Arc::new(Mutex::new(vec![handle.icon_state()]));
    let mut subscriber = handle.subscribe_icon_state();
    let sink = seen.clone();
    tokio::spawn(async move {
        while let Some(state) = subscriber.next().await {
            sink.lock().push(state);
        }
    });
    seen
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_initial_detection_publishes_visible_candidates() {
    let harness = start(browsers());

    let visible = harness.handle.refresh_candidates_and_wait().await.unwrap();
    let names: Vec<&str> = visible.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
    assert_eq!(harness.handle.visible_candidates(), visible);
}

#[tokio::test(start_paused = true)]
async fn test_poll_confirms_and_grace_returns_to_idle() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    let generation = harness.handle.request_switch("com.b").await.unwrap();
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.b".into()));

    // Polls run at 0.4s, 0.8s and 1.2s; the change lands just before the third.
    at(origin, 1.1).await;
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.b".into()));
    harness.system.set_current("com.b");

    at(origin, 1.25).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));
    assert_eq!(harness.handle.current_default().as_deref(), Some("com.b"));
    assert_eq!(
        harness.handle.phase().await.unwrap(),
        SwitchPhase::Success { target: "com.b".into(), generation }
    );

    at(origin, 3.15).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));

    at(origin, 3.25).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_default_timings_close_success_two_seconds_after_confirming_poll() {
    let harness = start_with(browsers(), SwitchTimings::default());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();

    // Polls run every 0.5s; the change lands before the one at 1.0s.
    at(origin, 0.9).await;
    harness.system.set_current("com.b");
    at(origin, 0.95).await;
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.b".into()));

    at(origin, 1.05).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));

    at(origin, 2.95).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));

    at(origin, 3.05).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_menu_open_confirms_between_polls() {
    let harness = start(browsers());
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();

    at(origin, 1.0).await;
    harness.system.set_current("com.b");
    harness.handle.menu_opened().unwrap();

    at(origin, 1.05).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));

    at(origin, 2.95).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));

    at(origin, 3.1).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_switch_times_out() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let seen = record_icon_states(&harness.handle);
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();

    at(origin, 14.9).await;
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.b".into()));

    at(origin, 15.1).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
    assert!(!seen.lock().iter().any(|s| matches!(s, IconState::Success(_))));

    // Polling stops with the timeout.
    let reads = harness.system.default_reads();
    at(origin, 20.0).await;
    assert_eq!(harness.system.default_reads(), reads);
}

#[tokio::test(start_paused = true)]
async fn test_newer_request_supersedes_pending_one() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    let first = harness.handle.request_switch("com.b").await.unwrap();

    at(origin, 1.0).await;
    let second = harness.handle.request_switch("com.c").await.unwrap();
    assert!(second > first);
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.c".into()));

    // The first request's deadline passes without effect.
    at(origin, 15.5).await;
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.c".into()));

    at(origin, 16.1).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_old_target_landing_does_not_confirm_new_request() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();
    at(origin, 0.5).await;
    harness.handle.request_switch("com.c").await.unwrap();

    // The first target arrives late; the live request is still unconfirmed.
    harness.system.set_current("com.b");
    at(origin, 2.0).await;
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.c".into()));
    assert_eq!(harness.handle.current_default().as_deref(), Some("com.b"));
}

#[tokio::test(start_paused = true)]
async fn test_request_interrupts_success_grace() {
    let harness = start(browsers());
    harness.system.set_current("com.b");
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();
    at(origin, 0.45).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));

    at(origin, 1.0).await;
    harness.handle.request_switch("com.c").await.unwrap();
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.c".into()));

    // The old grace window would have ended at 2.4s.
    at(origin, 2.6).await;
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.c".into()));
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_stays_idle_without_polling() {
    let system = browsers();
    system.deny_all();
    let harness = start(system);
    let origin = Instant::now();

    // Let the startup read finish before counting.
    at(origin, 0.1).await;
    let reads = harness.system.default_reads();

    let err = harness.handle.request_switch("com.b").await.unwrap_err();
    assert_eq!(err, SwitchError::PermissionDenied { status: STATUS_PERMISSION_DENIED });
    assert_eq!(harness.handle.icon_state(), IconState::Idle);

    at(origin, 20.0).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
    assert_eq!(harness.system.default_reads(), reads);
}

#[tokio::test(start_paused = true)]
async fn test_partial_registration_supersedes_pending_switch() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.b".into()));

    at(origin, 1.0).await;
    harness.system.set_status("https", STATUS_PERMISSION_DENIED);
    let err = harness.handle.request_switch("com.c").await.unwrap_err();
    assert_eq!(
        err,
        SwitchError::PartiallyApplied {
            applied: "http",
            failed: "https",
            status: STATUS_PERMISSION_DENIED
        }
    );
    assert_eq!(harness.handle.icon_state(), IconState::Idle);

    // Neither request's timers revive the indicator.
    let reads = harness.system.default_reads();
    at(origin, 20.0).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
    assert_eq!(harness.system.default_reads(), reads);
}

#[tokio::test(start_paused = true)]
async fn test_refused_registration_supersedes_pending_switch() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();

    at(origin, 1.0).await;
    harness.system.deny_all();
    let err = harness.handle.request_switch("com.c").await.unwrap_err();
    assert_eq!(err, SwitchError::PermissionDenied { status: STATUS_PERMISSION_DENIED });
    assert_eq!(harness.handle.icon_state(), IconState::Idle);

    at(origin, 16.5).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_registration_returns_to_idle() {
    let system = browsers();
    system.set_current("com.a");
    *system.panic_on_register.lock() = Some("com.c".into());
    let harness = start(system);
    let origin = Instant::now();

    harness.handle.request_switch("com.b").await.unwrap();

    at(origin, 1.0).await;
    let err = harness.handle.request_switch("com.c").await.unwrap_err();
    assert_eq!(err, SwitchError::Failed { status: STATUS_BACKEND_PANIC });
    assert_eq!(harness.handle.icon_state(), IconState::Idle);

    at(origin, 60.0).await;
    assert_eq!(harness.handle.icon_state(), IconState::Idle);
    assert_eq!(harness.handle.phase().await.unwrap(), SwitchPhase::Idle);
    assert!(harness.handle.is_alive());
}

#[tokio::test(start_paused = true)]
async fn test_panicking_read_does_not_stall_polling() {
    let harness = start(browsers());
    harness.system.set_current("com.a");
    let origin = Instant::now();

    at(origin, 0.1).await;
    harness.system.panic_on_read.store(true, Ordering::SeqCst);
    harness.handle.request_switch("com.b").await.unwrap();

    // Polls run at 0.5s and 0.9s; the first one panics inside the backend.
    let reads = harness.system.default_reads();
    at(origin, 0.6).await;
    assert_eq!(harness.system.default_reads(), reads + 1);
    assert_eq!(harness.handle.icon_state(), IconState::Switching("com.b".into()));

    harness.system.panic_on_read.store(false, Ordering::SeqCst);
    harness.system.set_current("com.b");

    at(origin, 0.95).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.b".into()));
}

#[tokio::test(start_paused = true)]
async fn test_immediate_registration_confirms_on_first_poll() {
    let system = browsers();
    *system.auto_apply.lock() = true;
    let harness = start(system);
    let origin = Instant::now();

    harness.handle.request_switch("com.c").await.unwrap();
    at(origin, 0.45).await;
    assert_eq!(harness.handle.icon_state(), IconState::Success("com.c".into()));
    assert_eq!(harness.handle.current_default().as_deref(), Some("com.c"));
}

#[tokio::test(start_paused = true)]
async fn test_set_hidden_refilters_without_detection() {
    let harness = start(browsers());
    harness.handle.refresh_candidates_and_wait().await.unwrap();
    let detections = harness.system.detections();

    let visible = harness.handle.set_hidden("com.b", true).await.unwrap();
    assert!(!visible.iter().any(|c| c.id == "com.b"));
    assert_eq!(harness.handle.visible_candidates(), visible);
    assert_eq!(harness.system.detections(), detections);

    let hidden = harness.handle.hidden_browsers().await.unwrap();
    assert!(hidden.contains("com.b"));
    assert_eq!(harness.handle.all_candidates().await.unwrap().len(), 3);

    let visible = harness.handle.set_hidden("com.b", false).await.unwrap();
    assert_eq!(visible.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_default_returns_fresh_value() {
    let harness = start(browsers());
    assert_eq!(harness.handle.refresh_default().await.unwrap(), None);

    harness.system.set_current("com.a");
    assert_eq!(harness.handle.refresh_default().await.unwrap().as_deref(), Some("com.a"));
    assert_eq!(harness.handle.current_default().as_deref(), Some("com.a"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_actor() {
    let harness = start(browsers());
    assert!(harness.handle.is_alive());

    harness.handle.shutdown().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(!harness.handle.is_alive());
    assert!(harness.handle.request_switch("com.a").await.is_err());
}
