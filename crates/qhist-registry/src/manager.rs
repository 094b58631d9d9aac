use std::sync::Arc;

use qhist_config::{HistoryConfig, LookupFailurePolicy};
use qhist_types::{QueryId, QueryRecord};
use tracing::{debug, warn};

use crate::error::{HistoryError, HistoryResult};
use crate::loader::SourceLoader;
use crate::registry::FactoryRegistry;
use crate::source_set::{ConfiguredSource, SourceSet};
use crate::traits::QueryHistorySourceFactory;

/// Entry point for historical query lookup.
///
/// The manager owns the factory registry and the loaded sources. It is an
/// ordinary value: construct one per process (or per test) and share it by
/// reference or `Arc`.
///
/// Lifecycle:
/// 1. [`add_factory`](Self::add_factory) -- any time, from any thread.
/// 2. [`load_configured_sources`](Self::load_configured_sources) -- once, at
///    startup. Not guarded against concurrent calls; calling it twice loads
///    every source twice.
/// 3. [`get_query_by_id`](Self::get_query_by_id) -- concurrently, after loading.
#[derive(Debug)]
pub struct HistoryQueryManager {
    config: HistoryConfig,
    factories: FactoryRegistry,
    sources: SourceSet,
}

impl HistoryQueryManager {
    /// Create a manager with no factories and no sources.
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            factories: FactoryRegistry::new(),
            sources: SourceSet::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Register a source factory.
    ///
    /// Fails with [`HistoryError::DuplicateFactory`] if the name is taken.
    pub fn add_factory(&self, factory: Arc<dyn QueryHistorySourceFactory>) -> HistoryResult<()> {
        self.factories.register(factory)
    }

    /// Load the sources declared by the configured root and instance files.
    ///
    /// Returns the number of sources loaded by this call. A missing root
    /// configuration loads nothing and succeeds.
    pub fn load_configured_sources(&self) -> HistoryResult<usize> {
        let loaded = SourceLoader::new(&self.factories)
            .load(&self.config.root_config, &self.config.instance_config_dir)?;
        let count = loaded.len();
        self.sources.extend(loaded);
        Ok(count)
    }

    /// Find a historical query by id.
    ///
    /// Sources are asked in configuration order; the first record found is
    /// returned, with `source_name` set to the serving instance if the
    /// source left it empty. Returns `Ok(None)` if no source has the query
    /// or no source is loaded.
    ///
    /// A source error either aborts the lookup or is skipped, depending on
    /// [`LookupFailurePolicy`].
    pub fn get_query_by_id(&self, id: &QueryId) -> HistoryResult<Option<QueryRecord>> {
        for source in self.sources.all() {
            match source.get_query_by_id(id) {
                Ok(Some(mut record)) => {
                    debug!(query_id = %id, instance = source.instance(), "query found");
                    record
                        .source_name
                        .get_or_insert_with(|| source.instance().to_string());
                    return Ok(Some(record));
                }
                Ok(None) => {}
                Err(err) => match self.config.on_source_error {
                    LookupFailurePolicy::Propagate => {
                        return Err(HistoryError::Source {
                            instance: source.instance().to_string(),
                            source: err,
                        });
                    }
                    LookupFailurePolicy::Isolate => {
                        warn!(
                            query_id = %id,
                            instance = source.instance(),
                            error = %err,
                            "query history source failed; trying next source"
                        );
                    }
                },
            }
        }
        debug!(query_id = %id, "query not found in any history source");
        Ok(None)
    }

    /// Loaded sources in lookup order.
    pub fn sources(&self) -> Vec<Arc<ConfiguredSource>> {
        self.sources.all()
    }

    /// Number of loaded sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Sorted names of registered factories.
    pub fn factory_names(&self) -> Vec<String> {
        self.factories.names()
    }
}

impl Default for HistoryQueryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}
