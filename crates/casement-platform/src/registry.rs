use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use winit::window::WindowId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowEntry<K> {
    pub id: K,
    pub title: String,
}

#[derive(Debug)]
struct Inner<K> {
    // registration order
    windows: Vec<WindowEntry<K>>,
    active: Option<K>,
}

/// The open windows of one runner and which of them is active.
///
/// Cloning gives another handle to the same registry. The runner
/// registers windows as it opens them and unregisters them as they
/// close; when the last one goes the registry is empty again.
#[derive(Debug)]
pub struct WindowRegistry<K = WindowId> {
    inner: Arc<Mutex<Inner<K>>>,
}

impl<K> Clone for WindowRegistry<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> Default for WindowRegistry<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                windows: Vec::new(),
                active: None,
            })),
        }
    }
}

impl<K: Copy + Eq + Hash> WindowRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window. Re-registering an id only updates its title.
    pub fn register(&self, id: K, title: impl Into<String>) {
        let title = title.into();
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.windows.iter_mut().find(|e| e.id == id) {
            entry.title = title;
            return;
        }
        inner.windows.push(WindowEntry { id, title });
        if inner.active.is_none() {
            inner.active = Some(id);
        }
    }

    /// Removes a window. Returns `true` when it was the last one; the
    /// registry is then cleared.
    pub fn unregister(&self, id: K) -> bool {
        let mut inner = self.inner.lock();
        inner.windows.retain(|e| e.id != id);
        if inner.active == Some(id) {
            inner.active = inner.windows.last().map(|e| e.id);
        }
        if inner.windows.is_empty() {
            inner.active = None;
            return true;
        }
        false
    }

    /// Marks `id` active. Unknown ids are ignored.
    pub fn set_active(&self, id: K) -> bool {
        let mut inner = self.inner.lock();
        if inner.windows.iter().any(|e| e.id == id) {
            inner.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<K> {
        self.inner.lock().active
    }

    pub fn contains(&self, id: K) -> bool {
        self.inner.lock().windows.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().windows.is_empty()
    }

    pub fn windows(&self) -> Vec<WindowEntry<K>> {
        self.inner.lock().windows.clone()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.windows.clear();
        inner.active = None;
    }
}
