// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `localStorage` / `sessionStorage` as a [`KeyValueStore`].

use reel_controls_core::storage::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Which Web Storage area a [`BrowserStore`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageArea {
    /// `localStorage`: survives reloads.
    Local,
    /// `sessionStorage`: scoped to the tab.
    Session,
}

impl StorageArea {
    /// The DOM property name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

/// A Web Storage area. Accessing it can throw (privacy modes, sandboxed
/// frames); that surfaces as [`StoreError::Unavailable`] on every call.
#[derive(Debug)]
pub struct BrowserStore {
    area: StorageArea,
    storage: Option<Storage>,
}

impl BrowserStore {
    /// Opens `area` of the current window.
    #[must_use]
    pub fn open(area: StorageArea) -> Self {
        let storage = web_sys::window().and_then(|window| {
            let storage = match area {
                StorageArea::Local => window.local_storage(),
                StorageArea::Session => window.session_storage(),
            };
            storage.ok().flatten()
        });
        Self { area, storage }
    }

    /// Opens `localStorage`.
    #[must_use]
    pub fn local() -> Self {
        Self::open(StorageArea::Local)
    }

    /// Opens `sessionStorage`.
    #[must_use]
    pub fn session() -> Self {
        Self::open(StorageArea::Session)
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable(self.area.as_str().to_owned()))
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?.get_item(key).map_err(|err| StoreError::Read {
            key: key.to_owned(),
            reason: describe(&err),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| StoreError::Write {
                key: key.to_owned(),
                reason: describe(&err),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|err| StoreError::Write {
                key: key.to_owned(),
                reason: describe(&err),
            })
    }
}

/// Best-effort message of a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| String::from("unknown error"))
}
