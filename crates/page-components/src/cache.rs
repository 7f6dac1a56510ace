// Handle cache
//
// Per-context store mapping a handle's composite description to the native reference(s) it last
// resolved to. Lookups probe before returning, so a caller never receives a stale reference.
//
// Single entries and list entries live in separate maps: an `Element` and an `Elements` with the
// same description do not evict each other. List entries are all-or-nothing: one stale member
// discards the whole list.

use crate::driver::{ElementRef, NativeDriver, ext};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Cache of resolved element references for one execution context.
///
/// The locks only guard map access and are never held across an `.await`; probing happens on a
/// cloned reference after the lock is released.
#[derive(Debug, Default)]
pub struct HandleCache {
    single: Mutex<HashMap<String, ElementRef>>,
    lists: Mutex<HashMap<String, Vec<ElementRef>>>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached reference for `key` if it is still attached.
    ///
    /// A stale entry is evicted and `None` is returned.
    pub async fn get(&self, driver: &dyn NativeDriver, key: &str) -> Option<ElementRef> {
        let cached = self.single.lock().get(key).cloned()?;

        if ext::is_stale(driver, &cached).await {
            tracing::debug!("Evicting stale cache entry: {}", key);
            let mut single = self.single.lock();
            // Only evict if nobody replaced the entry while we were probing
            if single.get(key) == Some(&cached) {
                single.remove(key);
            }
            return None;
        }

        Some(cached)
    }

    pub fn put(&self, key: impl Into<String>, element: ElementRef) {
        self.single.lock().insert(key.into(), element);
    }

    /// Returns the cached list for `key` only if every member is still attached.
    pub async fn get_all(&self, driver: &dyn NativeDriver, key: &str) -> Option<Vec<ElementRef>> {
        let cached = self.lists.lock().get(key).cloned()?;

        for element in &cached {
            if ext::is_stale(driver, element).await {
                tracing::debug!(
                    "Evicting list cache entry {} ({} members): {} is stale",
                    key,
                    cached.len(),
                    element
                );
                let mut lists = self.lists.lock();
                if lists.get(key) == Some(&cached) {
                    lists.remove(key);
                }
                return None;
            }
        }

        Some(cached)
    }

    pub fn put_all(&self, key: impl Into<String>, elements: Vec<ElementRef>) {
        self.lists.lock().insert(key.into(), elements);
    }

    /// Removes the single entry for `key`
    pub fn evict(&self, key: &str) -> Option<ElementRef> {
        self.single.lock().remove(key)
    }

    /// Removes the list entry for `key`
    pub fn evict_all(&self, key: &str) -> Option<Vec<ElementRef>> {
        self.lists.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.single.lock().contains_key(key)
    }

    pub fn contains_list(&self, key: &str) -> bool {
        self.lists.lock().contains_key(key)
    }

    /// Number of single and list entries
    pub fn len(&self) -> usize {
        self.single.lock().len() + self.lists.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.single.lock().clear();
        self.lists.lock().clear();
    }
}
