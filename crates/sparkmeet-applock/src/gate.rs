//! The app-lock gate: foreground counting and the debounced lock decision.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;

use crate::ports::{ChallengePresenter, LockPreference, SessionOracle};
use crate::timer::{DelayScheduler, TimerHandle};

/// Default debounce between foreground entry and the challenge, in
/// milliseconds. Long enough to let the UI settle and to skip the lock
/// screen entirely during rapid navigation churn.
pub const DEFAULT_AUTH_DELAY_MS: u64 = 500;

/// Gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppLockConfig {
    /// Debounce before presenting the challenge, in milliseconds.
    #[serde(default = "default_auth_delay_ms")]
    pub auth_delay_ms: u64,
}

fn default_auth_delay_ms() -> u64 {
    DEFAULT_AUTH_DELAY_MS
}

impl Default for AppLockConfig {
    fn default() -> Self {
        Self {
            auth_delay_ms: DEFAULT_AUTH_DELAY_MS,
        }
    }
}

impl AppLockConfig {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn auth_delay(&self) -> Duration {
        Duration::from_millis(self.auth_delay_ms)
    }
}

/// Observable gate state, for host diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No UI surface is visible.
    Background,
    /// App is in the foreground with a debounced lock decision pending.
    ForegroundPendingDecision,
    /// App is in the foreground with no decision pending (either the
    /// challenge already fired or none was required).
    Foreground,
}

#[derive(Default)]
struct GateInner {
    foreground_count: u32,
    pending: Option<TimerHandle>,
    disposed: bool,
}

/// Decides on every app-wide foreground transition whether the user must
/// re-authenticate, after a short debounce.
///
/// The host wires [`AppLockGate::on_foreground_enter`] /
/// [`AppLockGate::on_foreground_exit`] into every top-level UI surface (or
/// holds a [`VisibleSurface`] guard per surface), so the internal counter
/// reflects whole-application visibility, not one screen. The 0→1 edge
/// schedules the challenge when the lock is armed; the 1→0 edge cancels a
/// not-yet-fired challenge.
///
/// Clones share the same gate; they exist so the timer callback and any
/// number of surfaces can refer to one underlying state.
#[derive(Clone)]
pub struct AppLockGate {
    inner: Arc<Mutex<GateInner>>,
    prefs: LockPreference,
    session: Arc<dyn SessionOracle>,
    presenter: Arc<dyn ChallengePresenter>,
    scheduler: Arc<dyn DelayScheduler>,
    auth_delay: Duration,
}

impl AppLockGate {
    /// Build a gate in the `Background` state with a zero counter.
    #[must_use]
    pub fn new(
        config: &AppLockConfig,
        prefs: LockPreference,
        session: Arc<dyn SessionOracle>,
        presenter: Arc<dyn ChallengePresenter>,
        scheduler: Arc<dyn DelayScheduler>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(GateInner::default())),
            prefs,
            session,
            presenter,
            scheduler,
            auth_delay: config.auth_delay(),
        }
    }

    fn inner(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A top-level UI surface became visible.
    pub fn on_foreground_enter(&self) {
        let mut inner = self.inner();
        if inner.disposed {
            return;
        }
        inner.foreground_count += 1;
        if inner.foreground_count > 1 {
            return;
        }

        // 0→1 edge: the app as a whole entered the foreground.
        tracing::debug!("app entered foreground");
        if !self.should_lock() {
            return;
        }
        if let Some(stale) = inner.pending.take() {
            stale.cancel();
        }
        let state = Arc::clone(&self.inner);
        let presenter = Arc::clone(&self.presenter);
        let handle = self.scheduler.schedule(
            self.auth_delay,
            Box::new(move || {
                let fire = {
                    let mut inner = state.lock().unwrap_or_else(PoisonError::into_inner);
                    inner.pending = None;
                    !inner.disposed && inner.foreground_count > 0
                };
                if fire {
                    tracing::info!("presenting app lock challenge");
                    presenter.present_challenge();
                }
            }),
        );
        inner.pending = Some(handle);
        tracing::debug!(delay = ?self.auth_delay, "lock challenge scheduled");
    }

    /// A top-level UI surface became invisible.
    pub fn on_foreground_exit(&self) {
        let mut inner = self.inner();
        if inner.disposed {
            return;
        }
        if inner.foreground_count == 0 {
            tracing::warn!("foreground exit without matching enter; ignoring");
            return;
        }
        inner.foreground_count -= 1;
        if inner.foreground_count == 0 {
            // 1→0 edge: the app as a whole left the foreground.
            tracing::debug!("app entered background");
            if let Some(pending) = inner.pending.take() {
                pending.cancel();
            }
        }
    }

    /// Register a visible surface and get a guard that reports its exit on
    /// drop.
    #[must_use]
    pub fn surface_visible(&self) -> VisibleSurface {
        self.on_foreground_enter();
        VisibleSurface { gate: self.clone() }
    }

    /// The lock decision: lock iff the persisted flag is set and a session
    /// is active.
    ///
    /// Self-healing side effect: a set flag with no active session is stale
    /// (the user signed out while the lock was armed), so it is rewritten to
    /// `false` before answering. Repeat calls are idempotent.
    pub fn should_lock(&self) -> bool {
        let enabled = self.prefs.is_enabled();
        let active = self.session.is_session_active();
        if enabled && !active {
            tracing::info!("clearing stale biometric lock flag for signed-out user");
            self.prefs.set_enabled(false);
            return false;
        }
        enabled && active
    }

    /// Current observable state.
    #[must_use]
    pub fn state(&self) -> GateState {
        let inner = self.inner();
        if inner.foreground_count == 0 {
            GateState::Background
        } else if inner.pending.is_some() {
            GateState::ForegroundPendingDecision
        } else {
            GateState::Foreground
        }
    }

    /// Current foreground counter (enters minus exits).
    #[must_use]
    pub fn foreground_count(&self) -> u32 {
        self.inner().foreground_count
    }

    /// Tear the gate down: cancel any pending challenge and turn all further
    /// notifications into no-ops.
    ///
    /// Idempotent; safe with no timer pending. The host invokes this once
    /// when the owning context is destroyed and drops its wiring.
    pub fn dispose(&self) {
        let mut inner = self.inner();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        if let Some(pending) = inner.pending.take() {
            pending.cancel();
        }
        tracing::debug!("app lock gate disposed");
    }
}

impl std::fmt::Debug for AppLockGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppLockGate")
            .field("state", &self.state())
            .field("auth_delay", &self.auth_delay)
            .finish_non_exhaustive()
    }
}

/// RAII registration of one visible UI surface.
///
/// Created by [`AppLockGate::surface_visible`]; reports the surface exit
/// when dropped.
#[derive(Debug)]
pub struct VisibleSurface {
    gate: AppLockGate,
}

impl Drop for VisibleSurface {
    fn drop(&mut self) {
        self.gate.on_foreground_exit();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use sparkmeet_prefs::{MemoryPreferences, Preferences};

    use super::*;
    use crate::ports::BIOMETRIC_ENABLED_KEY;
    use crate::timer::ManualScheduler;

    struct FakeSession(AtomicBool);

    impl SessionOracle for FakeSession {
        fn is_session_active(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingPresenter(AtomicUsize);

    impl RecordingPresenter {
        fn presented(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl ChallengePresenter for RecordingPresenter {
        fn present_challenge(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        gate: AppLockGate,
        prefs: Arc<MemoryPreferences>,
        session: Arc<FakeSession>,
        presenter: Arc<RecordingPresenter>,
        scheduler: ManualScheduler,
    }

    fn harness(enabled: bool, session_active: bool) -> Harness {
        let prefs = Arc::new(MemoryPreferences::new());
        prefs.set_bool(BIOMETRIC_ENABLED_KEY, enabled).unwrap();
        let session = Arc::new(FakeSession(AtomicBool::new(session_active)));
        let presenter = Arc::new(RecordingPresenter::default());
        let scheduler = ManualScheduler::new();
        let gate = AppLockGate::new(
            &AppLockConfig::default(),
            LockPreference::new(prefs.clone()),
            session.clone(),
            presenter.clone(),
            Arc::new(scheduler.clone()),
        );
        Harness {
            gate,
            prefs,
            session,
            presenter,
            scheduler,
        }
    }

    #[test]
    fn test_counter_tracks_enters_minus_exits() {
        let h = harness(false, false);
        assert_eq!(h.gate.foreground_count(), 0);
        assert_eq!(h.gate.state(), GateState::Background);

        h.gate.on_foreground_enter();
        h.gate.on_foreground_enter();
        assert_eq!(h.gate.foreground_count(), 2);
        assert_eq!(h.gate.state(), GateState::Foreground);

        h.gate.on_foreground_exit();
        assert_eq!(h.gate.foreground_count(), 1);
        h.gate.on_foreground_exit();
        assert_eq!(h.gate.foreground_count(), 0);
        assert_eq!(h.gate.state(), GateState::Background);
    }

    #[test]
    fn test_counter_never_goes_negative() {
        let h = harness(false, false);
        h.gate.on_foreground_exit();
        h.gate.on_foreground_exit();
        assert_eq!(h.gate.foreground_count(), 0);

        h.gate.on_foreground_enter();
        assert_eq!(h.gate.foreground_count(), 1);
    }

    #[test]
    fn test_challenge_fires_after_delay_when_armed() {
        let h = harness(true, true);
        h.gate.on_foreground_enter();
        assert_eq!(h.gate.state(), GateState::ForegroundPendingDecision);

        h.scheduler.advance(Duration::from_millis(499));
        assert_eq!(h.presenter.presented(), 0);

        h.scheduler.advance(Duration::from_millis(1));
        assert_eq!(h.presenter.presented(), 1);
        assert_eq!(h.gate.state(), GateState::Foreground);

        // No re-trigger without a new 0→1 edge.
        h.scheduler.advance(Duration::from_millis(5000));
        assert_eq!(h.presenter.presented(), 1);
    }

    #[test]
    fn test_no_challenge_when_disabled() {
        let h = harness(false, true);
        h.gate.on_foreground_enter();
        assert_eq!(h.gate.state(), GateState::Foreground);
        h.scheduler.advance(Duration::from_millis(1000));
        assert_eq!(h.presenter.presented(), 0);
    }

    #[test]
    fn test_inner_surface_transitions_do_not_rearm() {
        let h = harness(true, true);
        h.gate.on_foreground_enter();
        h.scheduler.advance(Duration::from_millis(500));
        assert_eq!(h.presenter.presented(), 1);

        // Navigation between screens keeps the counter above zero.
        h.gate.on_foreground_enter();
        h.gate.on_foreground_exit();
        h.scheduler.advance(Duration::from_millis(1000));
        assert_eq!(h.presenter.presented(), 1);
    }

    #[test]
    fn test_exit_before_delay_cancels_challenge() {
        let h = harness(true, true);
        h.gate.on_foreground_enter();
        h.scheduler.advance(Duration::from_millis(200));
        h.gate.on_foreground_exit();
        assert_eq!(h.gate.state(), GateState::Background);

        h.scheduler.advance(Duration::from_millis(2000));
        assert_eq!(h.presenter.presented(), 0);
    }

    #[test]
    fn test_reentry_reschedules_single_challenge() {
        // Enter at t=0, exit at t=200, re-enter at t=250; with a 500ms delay
        // exactly one challenge fires, at t=750.
        let h = harness(true, true);
        h.gate.on_foreground_enter();
        h.scheduler.advance(Duration::from_millis(200));
        h.gate.on_foreground_exit();
        h.scheduler.advance(Duration::from_millis(50));
        h.gate.on_foreground_enter();

        h.scheduler.advance(Duration::from_millis(499));
        assert_eq!(h.presenter.presented(), 0);
        h.scheduler.advance(Duration::from_millis(1));
        assert_eq!(h.presenter.presented(), 1);
    }

    #[test]
    fn test_every_foreground_episode_reprompts() {
        let h = harness(true, true);
        for _ in 0..3 {
            h.gate.on_foreground_enter();
            h.scheduler.advance(Duration::from_millis(500));
            h.gate.on_foreground_exit();
        }
        assert_eq!(h.presenter.presented(), 3);
    }

    #[test]
    fn test_should_lock_self_heals_stale_flag() {
        let h = harness(true, false);
        assert!(!h.gate.should_lock());
        assert!(matches!(
            h.prefs.get_bool(BIOMETRIC_ENABLED_KEY),
            Ok(Some(false))
        ));

        // Second call: flag already false, no further side effects.
        assert!(!h.gate.should_lock());
        assert!(matches!(
            h.prefs.get_bool(BIOMETRIC_ENABLED_KEY),
            Ok(Some(false))
        ));
    }

    #[test]
    fn test_signed_out_foreground_never_schedules() {
        let h = harness(true, false);
        h.gate.on_foreground_enter();
        assert_eq!(h.gate.state(), GateState::Foreground);
        h.scheduler.advance(Duration::from_millis(1000));
        assert_eq!(h.presenter.presented(), 0);

        // Sign back in: the healed flag stays off until re-enabled.
        h.session.0.store(true, Ordering::SeqCst);
        h.gate.on_foreground_exit();
        h.gate.on_foreground_enter();
        h.scheduler.advance(Duration::from_millis(1000));
        assert_eq!(h.presenter.presented(), 0);
    }

    #[test]
    fn test_dispose_cancels_pending_and_is_idempotent() {
        let h = harness(true, true);
        h.gate.on_foreground_enter();
        assert_eq!(h.scheduler.pending(), 1);

        h.gate.dispose();
        h.gate.dispose();
        h.scheduler.advance(Duration::from_millis(1000));
        assert_eq!(h.presenter.presented(), 0);

        // Disposed gates ignore lifecycle notifications.
        h.gate.on_foreground_enter();
        assert_eq!(h.gate.foreground_count(), 0);
    }

    #[test]
    fn test_dispose_without_pending_is_safe() {
        let h = harness(false, false);
        h.gate.dispose();
        h.gate.dispose();
    }

    #[test]
    fn test_visible_surface_guard_wires_both_edges() {
        let h = harness(true, true);
        {
            let _outer = h.gate.surface_visible();
            assert_eq!(h.gate.state(), GateState::ForegroundPendingDecision);
            {
                let _inner = h.gate.surface_visible();
                assert_eq!(h.gate.foreground_count(), 2);
            }
            assert_eq!(h.gate.foreground_count(), 1);
        }
        assert_eq!(h.gate.state(), GateState::Background);
        h.scheduler.advance(Duration::from_millis(1000));
        assert_eq!(h.presenter.presented(), 0);
    }

    #[test]
    fn test_config_default_delay() {
        let config = AppLockConfig::default();
        assert_eq!(config.auth_delay(), Duration::from_millis(500));
    }
}
