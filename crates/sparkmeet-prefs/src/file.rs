//! JSON file backed preference store, one file per namespace.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::{Preferences, PrefsError};

/// Persisted preference store.
///
/// Each namespace maps to `<dir>/<namespace>.json` holding a single flat JSON
/// object. The whole object is kept in memory and rewritten atomically
/// (temp file in the same directory, fsync, rename) on every mutation.
///
/// A missing, unreadable, or corrupt file reads as an empty namespace; the
/// store never refuses to start over bad on-disk state.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<HashMap<String, Value>>,
}

impl FilePreferences {
    /// Open the store for `namespace` under `dir`, loading any existing file.
    #[must_use]
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Self {
        let path = dir.as_ref().join(format!("{namespace}.json"));
        let values = load_namespace(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, values: &HashMap<String, Value>) -> Result<(), PrefsError> {
        let content = serde_json::to_string_pretty(&values)
            .map_err(|_| PrefsError::Format(self.path.display().to_string()))?;
        atomic_write_text(&self.path, &content)?;
        Ok(())
    }
}

fn load_namespace(path: &Path) -> HashMap<String, Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "preference file unreadable; starting empty");
            return HashMap::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "preference file corrupt; starting empty");
            HashMap::new()
        }
    }
}

/// Write text atomically: temp file in the same directory, fsync, rename.
fn atomic_write_text(path: &Path, content: &str) -> Result<(), std::io::Error> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

impl Preferences for FilePreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PrefsError> {
        match self.values().get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(PrefsError::Format(key.to_string())),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PrefsError> {
        let mut values = self.values();
        values.insert(key.to_string(), Value::Bool(value));
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), PrefsError> {
        let mut values = self.values();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}
