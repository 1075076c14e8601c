//! sparkmeet-prefs - Persisted, namespaced key-value preference flags.
//!
//! The mobile client keeps small per-feature flags (such as whether the
//! biometric app lock is enabled) in namespaced preference files. This crate
//! provides that store behind a trait so feature code can be tested against
//! an in-memory fake:
//!
//! - [`Preferences`] - the store contract (boolean flags for now)
//! - [`FilePreferences`] - JSON file per namespace, atomic rewrites
//! - [`MemoryPreferences`] - non-persisted map for tests
//!
//! Writes are best-effort from the caller's point of view: feature code is
//! expected to log and carry on when a write fails, and to treat a failed
//! read as "flag absent".

mod error;
mod file;
mod memory;

pub use error::PrefsError;
pub use file::FilePreferences;
pub use memory::MemoryPreferences;

/// Contract for a namespaced flag store.
///
/// Implementations must be safe to share across threads; all methods take
/// `&self` and synchronize internally.
pub trait Preferences: Send + Sync {
    /// Read a boolean flag. `Ok(None)` means the key was never written.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PrefsError>;

    /// Write a boolean flag, creating the namespace on first write.
    fn set_bool(&self, key: &str, value: bool) -> Result<(), PrefsError>;

    /// Remove a key. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<(), PrefsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_get_set_roundtrip() {
        let prefs = MemoryPreferences::new();
        assert!(matches!(prefs.get_bool("biometric_enabled"), Ok(None)));

        prefs.set_bool("biometric_enabled", true).unwrap();
        assert!(matches!(prefs.get_bool("biometric_enabled"), Ok(Some(true))));

        prefs.set_bool("biometric_enabled", false).unwrap();
        assert!(matches!(prefs.get_bool("biometric_enabled"), Ok(Some(false))));
    }

    #[test]
    fn test_memory_remove_is_idempotent() {
        let prefs = MemoryPreferences::new();
        prefs.set_bool("flag", true).unwrap();
        prefs.remove("flag").unwrap();
        prefs.remove("flag").unwrap();
        assert!(matches!(prefs.get_bool("flag"), Ok(None)));
    }
}
