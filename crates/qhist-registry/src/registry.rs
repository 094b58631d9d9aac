use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{HistoryError, HistoryResult};
use crate::traits::QueryHistorySourceFactory;

/// Name-keyed registry of history source factories.
///
/// Registration may happen from many threads at once, before or after
/// sources are loaded. Check-and-insert happens under a single write lock,
/// so two registrations of the same name can never both succeed. Entries
/// are never removed.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: RwLock<HashMap<String, Arc<dyn QueryHistorySourceFactory>>>,
}

impl FactoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its own name.
    ///
    /// Fails with [`HistoryError::DuplicateFactory`] if the name is taken;
    /// the existing registration is kept.
    pub fn register(&self, factory: Arc<dyn QueryHistorySourceFactory>) -> HistoryResult<()> {
        let name = factory.name().to_string();
        match self.write().entry(name) {
            Entry::Occupied(entry) => Err(HistoryError::DuplicateFactory(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(factory = %entry.key(), "registered query history source factory");
                entry.insert(factory);
                Ok(())
            }
        }
    }

    /// Look up a factory by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn QueryHistorySourceFactory>> {
        self.read().get(name).cloned()
    }

    /// Returns `true` if a factory with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Sorted list of registered factory names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // The map is only ever mutated by a single `insert`, so a poisoned lock
    // still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn QueryHistorySourceFactory>>> {
        self.factories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn QueryHistorySourceFactory>>> {
        self.factories.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("factories", &self.names())
            .finish()
    }
}
