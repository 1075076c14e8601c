//! Biometric enrollment capability reporting.

/// What the device can offer for biometric authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricCapability {
    /// Strong biometrics enrolled and ready.
    Available,
    /// Hardware present but no credentials enrolled.
    NotEnrolled,
    /// Device has no biometric hardware.
    NoHardware,
    /// Hardware exists but is currently unusable (busy, disabled by
    /// policy, pending security update).
    Unavailable,
}

impl BiometricCapability {
    /// Whether the lock feature can be offered at all.
    #[must_use]
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Available)
    }

    /// User-facing summary of the capability.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Available => "Use fingerprint or face recognition to secure your app",
            Self::NotEnrolled => "No biometric credentials enrolled on this device",
            Self::NoHardware => "This device doesn't support biometric authentication",
            Self::Unavailable => "Biometric authentication is currently unavailable",
        }
    }
}

impl std::fmt::Display for BiometricCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Host-provided probe of the platform biometric subsystem.
pub trait CapabilityProbe: Send + Sync {
    /// Current device capability.
    fn capability(&self) -> BiometricCapability;
}
