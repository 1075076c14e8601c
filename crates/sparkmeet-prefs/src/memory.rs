//! In-memory preference store for tests and storage-less hosts.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::{Preferences, PrefsError};

/// Non-persisted preference store backed by a plain map.
///
/// Drop-in substitute for [`crate::FilePreferences`] in unit tests and on
/// hosts that have no writable storage directory.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryPreferences {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Preferences for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PrefsError> {
        match self.values().get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(PrefsError::Format(key.to_string())),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PrefsError> {
        self.values().insert(key.to_string(), Value::Bool(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PrefsError> {
        self.values().remove(key);
        Ok(())
    }
}
