//! sparkmeet-applock - Debounced biometric app lock for the SparkMeet client.
//!
//! Decides on every application-wide foreground transition whether the user
//! must re-authenticate, based on a persisted preference and current sign-in
//! status, with a short debounce so rapid navigation churn never flashes the
//! lock screen.
//!
//! # Architecture
//!
//! ```text
//! UI surfaces ── enter/exit ──▶ AppLockGate ── debounce ──▶ DelayScheduler
//!                                   │                            │
//!                     should_lock() │                   timer elapses
//!                                   ▼                            ▼
//!                  LockPreference + SessionOracle      ChallengePresenter
//! ```
//!
//! The gate counts visible surfaces; the 0→1 edge arms a one-shot timer when
//! `should_lock()` holds, the 1→0 edge cancels it. Everything the gate talks
//! to (preference store, session oracle, lock-screen presenter, timer) is an
//! injected seam, so the whole state machine runs deterministically in tests
//! against [`timer::ManualScheduler`] and
//! [`sparkmeet_prefs::MemoryPreferences`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sparkmeet_applock::{
//!     AppLockConfig, AppLockGate, ChallengePresenter, LockPreference, SessionOracle,
//!     timer::ManualScheduler,
//! };
//! use sparkmeet_prefs::MemoryPreferences;
//!
//! struct NoSession;
//! impl SessionOracle for NoSession {
//!     fn is_session_active(&self) -> bool {
//!         false
//!     }
//! }
//!
//! struct NoopPresenter;
//! impl ChallengePresenter for NoopPresenter {
//!     fn present_challenge(&self) {}
//! }
//!
//! let gate = AppLockGate::new(
//!     &AppLockConfig::default(),
//!     LockPreference::new(Arc::new(MemoryPreferences::new())),
//!     Arc::new(NoSession),
//!     Arc::new(NoopPresenter),
//!     Arc::new(ManualScheduler::new()),
//! );
//! let surface = gate.surface_visible();
//! drop(surface);
//! gate.dispose();
//! ```

mod capability;
mod gate;
mod ports;
mod settings;
pub mod timer;

pub use capability::{BiometricCapability, CapabilityProbe};
pub use gate::{
    AppLockConfig, AppLockGate, DEFAULT_AUTH_DELAY_MS, GateState, VisibleSurface,
};
pub use ports::{
    BIOMETRIC_ENABLED_KEY, ChallengePresenter, LockPreference, PREFS_NAMESPACE, SessionOracle,
};
pub use settings::{LockSettings, SettingsError};
