use std::any::TypeId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set of types that already went through a one-shot registration.
///
/// Clones share the same set, so builders on several bootstrap threads can
/// hand out one marker set and still run each registration once.
#[derive(Debug, Clone, Default)]
pub struct RegistrationMarkers {
    marked: Arc<Mutex<HashSet<TypeId>>>,
}

impl RegistrationMarkers {
    /// Create an empty marker set
    pub fn new() -> Self {
        Self::default()
    }

    // Insert-only set: a poisoned lock cannot hold a half-applied update.
    fn lock(&self) -> MutexGuard<'_, HashSet<TypeId>> {
        self.marked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `T`. Returns `false` if `T` was already marked.
    pub fn mark<T: ?Sized + 'static>(&self) -> bool {
        self.lock().insert(TypeId::of::<T>())
    }

    /// Check if `T` is marked
    pub fn is_marked<T: ?Sized + 'static>(&self) -> bool {
        self.lock().contains(&TypeId::of::<T>())
    }

    /// Number of marked types
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is marked
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
