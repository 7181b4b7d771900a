//! Local key-value persistence.
//!
//! [`KeyValueStorage`] is the raw capability (fallible). [`LocalStorage`]
//! wraps it with JSON encoding and never lets a failure escape: every error
//! is logged and turned into "nothing saved" or "no data".

mod file_store;
mod memory_store;

pub use file_store::{FileStorage, STORAGE_DIR_ENV_VAR, storage_dir};
pub use memory_store::MemoryStorage;

use crate::error::AppError;
use log::{debug, error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove_item(&mut self, key: &str) -> Result<(), AppError>;

    fn clear(&mut self) -> Result<(), AppError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), AppError> {
        (**self).remove_item(key)
    }

    fn clear(&mut self) -> Result<(), AppError> {
        (**self).clear()
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage<S> {
    backend: S,
}

impl<S: KeyValueStorage> LocalStorage<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Encodes `data` as JSON and writes it under `key`.
    ///
    /// Returns `false` when nothing was written.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, data: &T) -> bool {
        let encoded = match serde_json::to_string(data) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!("event=storage_save module=storage status=error key={key} code=invalid_data error={err}");
                return false;
            }
        };

        match self.backend.set_item(key, &encoded) {
            Ok(()) => {
                debug!(
                    "event=storage_save module=storage status=ok key={key} bytes={}",
                    encoded.len()
                );
                true
            }
            Err(err) => {
                error!(
                    "event=storage_save module=storage status=error key={key} code={} error={}",
                    err.code(),
                    err.message()
                );
                false
            }
        }
    }

    /// Reads and decodes `key`. Missing, empty, or undecodable values are `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!(
                    "event=storage_load module=storage status=error key={key} code={} error={}",
                    err.code(),
                    err.message()
                );
                return None;
            }
        };

        if raw.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("event=storage_load module=storage status=error key={key} code=invalid_data error={err}");
                None
            }
        }
    }

    /// Copies the raw value under `key` to `backup_key` without decoding it.
    ///
    /// Returns `false` when there was nothing to copy or the write failed.
    pub fn copy_raw(&mut self, key: &str, backup_key: &str) -> bool {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(err) => {
                error!(
                    "event=storage_copy module=storage status=error key={key} code={} error={}",
                    err.code(),
                    err.message()
                );
                return false;
            }
        };

        match self.backend.set_item(backup_key, &raw) {
            Ok(()) => {
                warn!("event=storage_copy module=storage status=ok key={key} backup_key={backup_key}");
                true
            }
            Err(err) => {
                error!(
                    "event=storage_copy module=storage status=error key={backup_key} code={} error={}",
                    err.code(),
                    err.message()
                );
                false
            }
        }
    }

    pub fn remove(&mut self, key: &str) {
        if let Err(err) = self.backend.remove_item(key) {
            error!(
                "event=storage_remove module=storage status=error key={key} code={} error={}",
                err.code(),
                err.message()
            );
        }
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.backend.clear() {
            error!(
                "event=storage_clear module=storage status=error code={} error={}",
                err.code(),
                err.message()
            );
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_inner(self) -> S {
        self.backend
    }
}
