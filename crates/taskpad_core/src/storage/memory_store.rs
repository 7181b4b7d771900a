use crate::error::AppError;
use crate::storage::KeyValueStorage;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// In-process storage. Clones share the same map, so a test can hand one
/// clone to a store and inspect or reload through another.
///
/// An optional byte quota (keys plus values) makes writes fail the way a full
/// browser storage does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        let storage = Self::default();
        storage.set_quota(Some(quota_bytes));
        storage
    }

    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        self.inner.borrow_mut().quota_bytes = quota_bytes;
    }

    /// Seeds a value directly, bypassing the quota and the write counter.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .items
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Number of successful `set_item` calls.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.raw(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(quota) = inner.quota_bytes {
            let others: usize = inner
                .items
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(AppError::quota_exceeded(format!(
                    "writing '{key}' needs {needed} bytes, quota is {quota}"
                )));
            }
        }

        inner.items.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), AppError> {
        self.inner.borrow_mut().items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), AppError> {
        self.inner.borrow_mut().items.clear();
        Ok(())
    }
}
