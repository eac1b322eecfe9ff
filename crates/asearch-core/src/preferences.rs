//! Durable storage for the last region the user picked.
//!
//! The file layout mirrors browser local storage: one JSON object whose keys
//! are preference names. The region lives under [`PREFERENCE_KEY`]:
//!
//! ```json
//! { "ctry": { "label": "🇨🇦 Canada", "value": "CA" } }
//! ```
//!
//! Unknown keys are preserved on write.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::PreferenceError;
use crate::types::Region;

/// Key under which the selected region is stored.
pub const PREFERENCE_KEY: &str = "ctry";

/// A single durable cell holding the selected region.
pub trait PreferenceStore {
    /// The stored region, or the store's default when nothing is stored.
    fn get(&self) -> Region;

    /// Stores `region`. Implementations persist before returning.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the region could not be persisted.
    fn set(&mut self, region: Region) -> Result<(), PreferenceError>;
}

/// File-backed preference store.
///
/// The file is read once in [`JsonFilePreferences::open`]; every
/// [`set`](PreferenceStore::set) rewrites it atomically (temp file + rename).
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    default: Region,
    entries: Map<String, Value>,
    current: Option<Region>,
}

impl JsonFilePreferences {
    /// Opens the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object, or
    /// whose region entry does not decode, is logged and treated as empty so
    /// start-up never fails on a bad preference file.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, default: Region) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        let current = entries.get(PREFERENCE_KEY).and_then(|value| {
            serde_json::from_value::<Region>(value.clone())
                .map_err(|e| {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "ignoring unreadable region preference"
                    );
                })
                .ok()
        });

        tracing::debug!(
            path = %path.display(),
            stored = current.is_some(),
            "opened preference store"
        );

        Self {
            path,
            default,
            entries,
            current,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `entries` to a temp file next to the target, then renames it
    /// over the target. The temp file is removed if either step fails.
    fn persist(&self, entries: &Map<String, Value>) -> Result<(), PreferenceError> {
        let io_err = |source| PreferenceError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        let written = std::fs::write(&tmp_path, body)
            .and_then(|()| std::fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            std::fs::remove_file(&tmp_path).ok();
            return Err(io_err(e));
        }
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self) -> Region {
        self.current.clone().unwrap_or_else(|| self.default.clone())
    }

    /// On error nothing changes: neither the file nor what [`get`](Self::get)
    /// returns.
    fn set(&mut self, region: Region) -> Result<(), PreferenceError> {
        let mut entries = self.entries.clone();
        entries.insert(PREFERENCE_KEY.to_owned(), serde_json::to_value(&region)?);
        self.persist(&entries)?;
        tracing::info!(region = %region.value, "saved region preference");
        self.entries = entries;
        self.current = Some(region);
        Ok(())
    }
}

fn read_entries(path: &Path) -> Map<String, Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read preference file");
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(entries)) => entries,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "preference file is not a JSON object");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "preference file is not valid JSON");
            Map::new()
        }
    }
}

/// In-process store; forgets everything when dropped.
#[derive(Debug, Clone)]
pub struct MemoryPreferences {
    default: Region,
    current: Option<Region>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new(default: Region) -> Self {
        Self {
            default,
            current: None,
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self) -> Region {
        self.current.clone().unwrap_or_else(|| self.default.clone())
    }

    fn set(&mut self, region: Region) -> Result<(), PreferenceError> {
        self.current = Some(region);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canada() -> Region {
        Region::new("\u{1f1e8}\u{1f1e6} Canada", "CA")
    }

    fn united_states() -> Region {
        Region::new("\u{1f1fa}\u{1f1f8} United States", "US")
    }

    #[test]
    fn missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePreferences::open(dir.path().join("prefs.json"), canada());
        assert_eq!(store.get(), canada());
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFilePreferences::open(dir.path().join("prefs.json"), canada());
        store.set(united_states()).unwrap();
        assert_eq!(store.get(), united_states());
    }

    #[test]
    fn value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        {
            let mut store = JsonFilePreferences::open(&path, canada());
            store.set(united_states()).unwrap();
        }

        let reopened = JsonFilePreferences::open(&path, canada());
        assert_eq!(reopened.get(), united_states());
    }

    #[test]
    fn file_uses_local_storage_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = JsonFilePreferences::open(&path, canada());
        store.set(united_states()).unwrap();

        let stored: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            stored,
            serde_json::json!({
                "ctry": { "label": "\u{1f1fa}\u{1f1f8} United States", "value": "US" }
            })
        );
    }

    #[test]
    fn unrelated_keys_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let mut store = JsonFilePreferences::open(&path, canada());
        store.set(united_states()).unwrap();

        let stored: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored["theme"], "dark");
        assert_eq!(stored["ctry"]["value"], "US");
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFilePreferences::open(&path, canada());
        assert_eq!(store.get(), canada());
    }

    #[test]
    fn malformed_region_entry_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"ctry": "US"}"#).unwrap();

        let store = JsonFilePreferences::open(&path, canada());
        assert_eq!(store.get(), canada());
    }

    #[test]
    fn unknown_region_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let custom = Region::new("Somewhere New", "zz-1");

        JsonFilePreferences::open(&path, canada())
            .set(custom.clone())
            .unwrap();
        assert_eq!(JsonFilePreferences::open(&path, canada()).get(), custom);
    }

    #[test]
    fn failed_write_changes_nothing_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = JsonFilePreferences::open(&path, canada());

        // A non-empty directory at the target path makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "").unwrap();

        let err = store.set(united_states()).unwrap_err();

        assert!(matches!(err, PreferenceError::Io { .. }), "got: {err:?}");
        assert_eq!(store.get(), canada());
        assert!(!dir.path().join("prefs.json.tmp").exists());
    }

    #[test]
    fn failed_write_keeps_previously_saved_region() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "not a directory").unwrap();
        let mut store = JsonFilePreferences::open(blocked.join("prefs.json"), canada());
        store.current = Some(united_states());

        assert!(store.set(Region::new("Mexico", "MX")).is_err());
        assert_eq!(store.get(), united_states());
        assert!(!store.entries.contains_key(PREFERENCE_KEY));
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryPreferences::new(canada());
        assert_eq!(store.get(), canada());
        store.set(united_states()).unwrap();
        assert_eq!(store.get(), united_states());
    }
}
