use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use qhist_config::Properties;
use qhist_registry::{QueryHistorySource, QueryHistorySourceFactory, SourceError, SourceResult};
use qhist_types::{QueryId, QueryRecord};
use tracing::debug;

/// Instance key: JSON file holding an array of records to preload.
pub const RECORDS_FILE_KEY: &str = "memory.records-file";

/// In-memory, HashMap-based history source.
///
/// Intended for tests, demos and embedding. Records are held behind a
/// `RwLock` and cloned on read. When the same id is inserted twice the
/// later record replaces the earlier one.
pub struct InMemoryHistorySource {
    records: RwLock<HashMap<QueryId, QueryRecord>>,
}

impl InMemoryHistorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Create a source holding `records`.
    pub fn from_records(records: impl IntoIterator<Item = QueryRecord>) -> Self {
        let source = Self::new();
        for record in records {
            source.insert(record);
        }
        source
    }

    /// Read a JSON array of records from `path`.
    pub fn from_json_file(path: &Path) -> SourceResult<Self> {
        let text = fs::read_to_string(path)?;
        let records: Vec<QueryRecord> = serde_json::from_str(&text).map_err(|e| {
            SourceError::invalid_config(RECORDS_FILE_KEY, format!("{}: {e}", path.display()))
        })?;
        debug!(path = ?path, records = records.len(), "preloaded in-memory history records");
        Ok(Self::from_records(records))
    }

    /// Insert or replace a record. Returns the replaced record, if any.
    pub fn insert(&self, record: QueryRecord) -> Option<QueryRecord> {
        self.write().insert(record.query_id.clone(), record)
    }

    /// Remove a record by id.
    pub fn remove(&self, id: &QueryId) -> Option<QueryRecord> {
        self.write().remove(id)
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove all records.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Sorted list of all held ids.
    pub fn all_ids(&self) -> Vec<QueryId> {
        let mut ids: Vec<QueryId> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<QueryId, QueryRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<QueryId, QueryRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryHistorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryHistorySource for InMemoryHistorySource {
    fn get_query_by_id(&self, id: &QueryId) -> SourceResult<Option<QueryRecord>> {
        Ok(self.read().get(id).cloned())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} records)", self.len())
    }
}

impl std::fmt::Debug for InMemoryHistorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHistorySource")
            .field("record_count", &self.len())
            .finish()
    }
}

/// Factory `memory`: creates an [`InMemoryHistorySource`].
///
/// With [`RECORDS_FILE_KEY`] set, the source is preloaded from that file;
/// otherwise it starts empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemorySourceFactory;

impl MemorySourceFactory {
    pub const NAME: &'static str = "memory";
}

impl QueryHistorySourceFactory for MemorySourceFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create(&self, config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>> {
        let source = match config.get_non_blank(RECORDS_FILE_KEY) {
            Some(path) => InMemoryHistorySource::from_json_file(Path::new(path))?,
            None => InMemoryHistorySource::new(),
        };
        Ok(Box::new(source))
    }
}
