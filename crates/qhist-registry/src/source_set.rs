use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use qhist_types::{QueryId, QueryRecord};

use crate::error::SourceResult;
use crate::traits::QueryHistorySource;

/// A loaded history source together with the instance that declared it.
pub struct ConfiguredSource {
    instance: String,
    factory: String,
    source: Box<dyn QueryHistorySource>,
}

impl ConfiguredSource {
    pub fn new(
        instance: impl Into<String>,
        factory: impl Into<String>,
        source: Box<dyn QueryHistorySource>,
    ) -> Self {
        Self {
            instance: instance.into(),
            factory: factory.into(),
            source,
        }
    }

    /// Instance name from the root configuration.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Name of the factory that created the source.
    pub fn factory(&self) -> &str {
        &self.factory
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn get_query_by_id(&self, id: &QueryId) -> SourceResult<Option<QueryRecord>> {
        self.source.get_query_by_id(id)
    }
}

impl fmt::Debug for ConfiguredSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredSource")
            .field("instance", &self.instance)
            .field("factory", &self.factory)
            .finish()
    }
}

/// Ordered collection of loaded history sources.
///
/// Sources are appended during loading and never removed; iteration order
/// is insertion order, which is configuration order. Changing the set of
/// sources means building a new manager and loading again.
#[derive(Default)]
pub struct SourceSet {
    sources: RwLock<Vec<Arc<ConfiguredSource>>>,
}

impl SourceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one source.
    pub fn push(&self, source: ConfiguredSource) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(source));
    }

    /// Append sources, preserving their order.
    pub fn extend(&self, sources: impl IntoIterator<Item = ConfiguredSource>) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(sources.into_iter().map(Arc::new));
    }

    /// Snapshot of all sources in insertion order.
    ///
    /// The lock is released before the caller touches any source, so slow
    /// sources never block other readers or a concurrent append.
    pub fn all(&self) -> Vec<Arc<ConfiguredSource>> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of loaded sources.
    pub fn len(&self) -> usize {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no source is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.all().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticSource;

    fn configured(instance: &str, ids: &[&str]) -> ConfiguredSource {
        ConfiguredSource::new(instance, "static", Box::new(StaticSource::with_ids(ids)))
    }

    #[test]
    fn empty_set() {
        let set = SourceSet::new();
        assert!(set.is_empty());
        assert!(set.all().is_empty());
    }

    #[test]
    fn insertion_order_is_kept() {
        let set = SourceSet::new();
        set.push(configured("c", &[]));
        set.extend([configured("a", &[]), configured("b", &[])]);

        let order: Vec<String> = set.all().iter().map(|s| s.instance().to_string()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn snapshot_is_independent_of_later_appends() {
        let set = SourceSet::new();
        set.push(configured("a", &[]));
        let snapshot = set.all();
        set.push(configured("b", &[]));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn configured_source_delegates() {
        let source = configured("primary", &["Q1"]);
        assert_eq!(source.instance(), "primary");
        assert_eq!(source.factory(), "static");
        let id = QueryId::new("Q1").unwrap();
        assert!(source.get_query_by_id(&id).unwrap().is_some());
        let missing = QueryId::new("Q2").unwrap();
        assert!(source.get_query_by_id(&missing).unwrap().is_none());
        assert!(format!("{source:?}").contains("primary"));
    }
}
