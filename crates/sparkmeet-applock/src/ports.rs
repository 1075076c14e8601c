//! Host-provided collaborators of the lock gate.
//!
//! The gate itself owns no platform state: sign-in status, the lock-screen
//! UI, and the persisted flag all live behind the seams defined here so the
//! gate can be exercised with in-memory fakes.

use std::sync::Arc;

use sparkmeet_prefs::Preferences;

/// Preference namespace holding the app-lock flags.
pub const PREFS_NAMESPACE: &str = "sparkmeet_biometric";

/// Key of the persisted "biometric lock enabled" flag.
pub const BIOMETRIC_ENABLED_KEY: &str = "biometric_enabled";

/// Answers whether a user is currently authenticated.
///
/// Implementations must be total: if the underlying auth backend cannot be
/// reached, answer `false` rather than fail.
pub trait SessionOracle: Send + Sync {
    /// True iff a user session is currently active.
    fn is_session_active(&self) -> bool;
}

/// Presents the full-screen authentication challenge.
///
/// Fire-and-forget from the gate's point of view: the gate never awaits the
/// outcome, the host dismisses the challenge surface on its own.
pub trait ChallengePresenter: Send + Sync {
    /// Bring up the lock screen.
    fn present_challenge(&self);
}

/// The persisted "biometric lock enabled" flag, bound to its fixed
/// namespace key.
///
/// Read and write failures never reach callers: a failed read counts as
/// "disabled" and a failed write is logged and dropped, since failing to
/// lock the app must never take the host process down.
#[derive(Clone)]
pub struct LockPreference {
    store: Arc<dyn Preferences>,
}

impl LockPreference {
    /// Bind the flag to a preference store (which should be opened on
    /// [`PREFS_NAMESPACE`] when file backed).
    #[must_use]
    pub fn new(store: Arc<dyn Preferences>) -> Self {
        Self { store }
    }

    /// Current flag value; absent or unreadable reads as `false`.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self.store.get_bool(BIOMETRIC_ENABLED_KEY) {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                tracing::warn!(%err, "biometric preference read failed; treating as disabled");
                false
            }
        }
    }

    /// Best-effort flag write.
    pub fn set_enabled(&self, enabled: bool) {
        if let Err(err) = self.store.set_bool(BIOMETRIC_ENABLED_KEY, enabled) {
            tracing::warn!(%err, enabled, "biometric preference write failed");
        }
    }
}

impl std::fmt::Debug for LockPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockPreference").finish_non_exhaustive()
    }
}
