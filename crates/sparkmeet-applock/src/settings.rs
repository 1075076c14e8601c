//! Settings-side control of the lock flag.
//!
//! The settings screen itself is host UI; this is the decision logic behind
//! its toggle. Enabling requires an enrolled device and a signed-in user,
//! mirroring the gate's own arming condition. Disabling is unconditional.

use std::sync::Arc;

use thiserror::Error;

use crate::capability::{BiometricCapability, CapabilityProbe};
use crate::ports::{LockPreference, SessionOracle};

/// Why the lock could not be enabled.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Device cannot authenticate biometrically right now.
    #[error("biometric lock unavailable: {0}")]
    NotSupported(BiometricCapability),

    /// No signed-in user; an armed lock would immediately self-heal to off.
    #[error("no active session")]
    NoActiveSession,
}

/// Toggle logic for the biometric app lock.
pub struct LockSettings {
    prefs: LockPreference,
    session: Arc<dyn SessionOracle>,
    probe: Arc<dyn CapabilityProbe>,
}

impl LockSettings {
    /// Wire the toggle against the shared flag, session oracle, and device
    /// probe.
    #[must_use]
    pub fn new(
        prefs: LockPreference,
        session: Arc<dyn SessionOracle>,
        probe: Arc<dyn CapabilityProbe>,
    ) -> Self {
        Self {
            prefs,
            session,
            probe,
        }
    }

    /// Current flag value.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.prefs.is_enabled()
    }

    /// Arm the lock.
    ///
    /// # Errors
    ///
    /// [`SettingsError::NotSupported`] when the device has no usable
    /// biometrics; [`SettingsError::NoActiveSession`] when nobody is signed
    /// in.
    pub fn enable(&self) -> Result<(), SettingsError> {
        let capability = self.probe.capability();
        if !capability.is_supported() {
            return Err(SettingsError::NotSupported(capability));
        }
        if !self.session.is_session_active() {
            return Err(SettingsError::NoActiveSession);
        }
        self.prefs.set_enabled(true);
        tracing::info!("biometric app lock enabled");
        Ok(())
    }

    /// Disarm the lock. Always succeeds.
    pub fn disable(&self) {
        self.prefs.set_enabled(false);
        tracing::info!("biometric app lock disabled");
    }
}

impl std::fmt::Debug for LockSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSettings")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
