// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key-value storage contract and the records kept in it.
//!
//! Two stores are in play: a durable one for the volume preference
//! ([`PreferenceStore`]) and a session-scoped one for timestamp navigation
//! intents ([`IntentStore`]). Both wrap any [`KeyValueStore`] and never
//! surface [`StoreError`] to their callers: a failed read is "no stored
//! value", a failed write is dropped. Failures are reported through the
//! [`Tracer`] instead.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trace::Tracer;

/// Durable key holding the volume as a decimal string in `[0, 1]`.
pub const VOLUME_KEY: &str = "rcVolume";

/// Durable key holding the mute flag as `"0"` or `"1"`.
pub const MUTED_KEY: &str = "rcMuted";

/// Durable key enabling console diagnostics when set to `"1"`.
pub const DEBUG_KEY: &str = "rcDebug";

/// Prefix of session keys holding timestamp intents, followed by the path.
pub const INTENT_PREFIX: &str = "rcTimestamp:";

/// Why a storage operation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage area is disabled or inaccessible.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Reading a key failed.
    #[error("failed to read `{key}`: {reason}")]
    Read {
        /// The key being read.
        key: String,
        /// Platform message.
        reason: String,
    },
    /// Writing or removing a key failed (quota, privacy mode).
    #[error("failed to write `{key}`: {reason}")]
    Write {
        /// The key being written.
        key: String,
        /// Platform message.
        reason: String,
    },
    /// A stored value did not parse.
    #[error("corrupt value under `{key}`")]
    Corrupt {
        /// The offending key.
        key: String,
    },
}

/// A string key-value store.
pub trait KeyValueStore {
    /// Reads `key`. `Ok(None)` means the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A [`KeyValueStore`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// The persisted audio preference. Either half may be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StoredPreference {
    /// Last user-chosen volume in `[0, 1]`.
    pub volume: Option<f64>,
    /// Last user-chosen mute state.
    pub muted: Option<bool>,
}

impl StoredPreference {
    /// Returns `true` if the preference asks for audible playback.
    #[must_use]
    pub fn wants_unmuted(&self) -> bool {
        self.muted == Some(false) && self.volume.is_none_or(|v| v > 0.0)
    }
}

/// Reads and writes [`StoredPreference`] in a durable store.
#[derive(Debug)]
pub struct PreferenceStore<S> {
    store: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Loads the preference. Unreadable or malformed halves are `None`.
    pub fn load(&self, tracer: &mut Tracer<'_>) -> StoredPreference {
        let volume = read(&self.store, VOLUME_KEY, tracer).and_then(|raw| {
            let value = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            if value.is_none() {
                tracer.storage_failure(&StoreError::Corrupt {
                    key: VOLUME_KEY.to_owned(),
                });
            }
            value.map(|v| v.clamp(0.0, 1.0))
        });
        let muted = read(&self.store, MUTED_KEY, tracer).and_then(|raw| match raw.trim() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        });
        StoredPreference { volume, muted }
    }

    /// Persists `volume` (clamped to `[0, 1]`) and `muted`.
    pub fn save(&self, volume: f64, muted: bool, tracer: &mut Tracer<'_>) {
        if volume.is_finite() {
            let volume = volume.clamp(0.0, 1.0);
            write(&self.store, VOLUME_KEY, &volume.to_string(), tracer);
        }
        write(&self.store, MUTED_KEY, if muted { "1" } else { "0" }, tracer);
    }

    /// Persists only the volume, leaving the mute flag untouched.
    pub fn save_volume(&self, volume: f64, tracer: &mut Tracer<'_>) {
        if volume.is_finite() {
            let volume = volume.clamp(0.0, 1.0);
            write(&self.store, VOLUME_KEY, &volume.to_string(), tracer);
        }
    }

    /// Returns `true` if diagnostics are switched on.
    pub fn debug_enabled(&self) -> bool {
        matches!(self.store.get(DEBUG_KEY), Ok(Some(v)) if v == "1")
    }
}

/// Serialized form of a timestamp navigation intent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct IntentRecord {
    value: u32,
    #[serde(rename = "storedAt")]
    stored_at: f64,
}

/// A timestamp the viewer is navigating toward.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationIntent {
    /// Target playback position in whole seconds.
    pub seconds: u32,
    /// Destination path the intent is keyed by.
    pub path: String,
    /// Wall-clock time the intent was stored, in epoch milliseconds.
    pub stored_at_ms: f64,
}

/// Short-lived per-path timestamp intents in a session store.
#[derive(Debug)]
pub struct IntentStore<S> {
    store: S,
    ttl_ms: f64,
}

impl<S: KeyValueStore> IntentStore<S> {
    /// Wraps `store`; entries older than `ttl_ms` are treated as absent.
    pub fn new(store: S, ttl_ms: f64) -> Self {
        Self { store, ttl_ms }
    }

    /// Stores an intent for `path`.
    pub fn put(&self, path: &str, seconds: u32, now_ms: f64, tracer: &mut Tracer<'_>) {
        let record = IntentRecord {
            value: seconds,
            stored_at: now_ms,
        };
        match serde_json::to_string(&record) {
            Ok(json) => write(&self.store, &intent_key(path), &json, tracer),
            Err(_) => tracer.storage_failure(&StoreError::Corrupt {
                key: intent_key(path),
            }),
        }
    }

    /// Returns the fresh intent for `path`, removing it if stale or corrupt.
    pub fn fresh(&self, path: &str, now_ms: f64, tracer: &mut Tracer<'_>) -> Option<NavigationIntent> {
        let key = intent_key(path);
        let raw = read(&self.store, &key, tracer)?;
        let Ok(record) = serde_json::from_str::<IntentRecord>(&raw) else {
            tracer.storage_failure(&StoreError::Corrupt { key: key.clone() });
            remove(&self.store, &key, tracer);
            return None;
        };
        let age = now_ms - record.stored_at;
        if !(0.0..=self.ttl_ms).contains(&age) {
            remove(&self.store, &key, tracer);
            return None;
        }
        Some(NavigationIntent {
            seconds: record.value,
            path: path.to_owned(),
            stored_at_ms: record.stored_at,
        })
    }

    /// Removes the intent for `path`.
    pub fn clear(&self, path: &str, tracer: &mut Tracer<'_>) {
        remove(&self.store, &intent_key(path), tracer);
    }
}

/// Session key for the intent of `path`.
#[must_use]
pub fn intent_key(path: &str) -> String {
    format!("{INTENT_PREFIX}{path}")
}

fn read<S: KeyValueStore>(store: &S, key: &str, tracer: &mut Tracer<'_>) -> Option<String> {
    store.get(key).unwrap_or_else(|err| {
        tracer.storage_failure(&err);
        None
    })
}

fn write<S: KeyValueStore>(store: &S, key: &str, value: &str, tracer: &mut Tracer<'_>) {
    if let Err(err) = store.set(key, value) {
        tracer.storage_failure(&err);
    }
}

fn remove<S: KeyValueStore>(store: &S, key: &str, tracer: &mut Tracer<'_>) {
    if let Err(err) = store.remove(key) {
        tracer.storage_failure(&err);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A store whose every operation fails, like storage in privacy mode.
    #[derive(Debug, Default)]
    pub(crate) struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.into(),
                reason: "quota".into(),
            })
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.into(),
                reason: "quota".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FailingStore;
    use super::*;
    use crate::trace::test_support::CountingSink;

    #[test]
    fn preference_round_trips() {
        let prefs = PreferenceStore::new(MemoryStore::new());
        let mut tracer = Tracer::none();
        prefs.save(0.8, false, &mut tracer);
        let loaded = prefs.load(&mut tracer);
        assert_eq!(loaded.volume, Some(0.8));
        assert_eq!(loaded.muted, Some(false));
        assert!(loaded.wants_unmuted());
    }

    #[test]
    fn malformed_volume_is_ignored_and_out_of_range_clamped() {
        let store = MemoryStore::new();
        store.set(VOLUME_KEY, "loud").unwrap();
        store.set(MUTED_KEY, "maybe").unwrap();
        let prefs = PreferenceStore::new(store);
        let loaded = prefs.load(&mut Tracer::none());
        assert_eq!(loaded, StoredPreference::default());

        prefs.inner().set(VOLUME_KEY, "3.5").unwrap();
        assert_eq!(prefs.load(&mut Tracer::none()).volume, Some(1.0));
    }

    #[test]
    fn failing_store_degrades_to_no_preference() {
        let prefs = PreferenceStore::new(FailingStore);
        let mut sink = CountingSink::default();
        let mut tracer = Tracer::new(&mut sink);
        prefs.save(0.5, true, &mut tracer);
        let loaded = prefs.load(&mut tracer);
        assert_eq!(loaded, StoredPreference::default());
        assert_eq!(sink.storage_failures, 4);
    }

    #[test]
    fn intents_expire_after_ttl() {
        let intents = IntentStore::new(MemoryStore::new(), 120_000.0);
        let mut tracer = Tracer::none();
        intents.put("/reel/abc/", 42, 1_000.0, &mut tracer);

        let fresh = intents.fresh("/reel/abc/", 60_000.0, &mut tracer);
        assert_eq!(fresh.map(|i| i.seconds), Some(42));
        assert!(intents.fresh("/other/", 60_000.0, &mut tracer).is_none());

        assert!(intents.fresh("/reel/abc/", 200_000.0, &mut tracer).is_none());
        // The stale entry was removed, not just skipped.
        assert_eq!(intents.store.get(&intent_key("/reel/abc/")), Ok(None));
    }

    #[test]
    fn intent_uses_wire_field_names() {
        let store = MemoryStore::new();
        store
            .set(&intent_key("/p/x/"), r#"{"value":7,"storedAt":10}"#)
            .unwrap();
        let intents = IntentStore::new(store, 120_000.0);
        let intent = intents.fresh("/p/x/", 20.0, &mut Tracer::none()).unwrap();
        assert_eq!(intent.seconds, 7);
        assert_eq!(intent.stored_at_ms, 10.0);
    }
}
