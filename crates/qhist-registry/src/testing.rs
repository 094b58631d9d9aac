//! Test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use qhist_config::Properties;
use qhist_types::{QueryId, QueryRecord, QueryState};

use crate::error::{SourceError, SourceResult};
use crate::traits::{QueryHistorySource, QueryHistorySourceFactory};

pub(crate) fn record(id: &str, query: &str) -> QueryRecord {
    QueryRecord::new(QueryId::new(id).unwrap(), QueryState::Finished, query)
}

/// A source answering from a fixed map.
pub(crate) struct StaticSource {
    records: HashMap<QueryId, QueryRecord>,
}

impl StaticSource {
    pub(crate) fn new(records: Vec<QueryRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.query_id.clone(), r))
                .collect(),
        }
    }

    pub(crate) fn with_ids(ids: &[&str]) -> Self {
        Self::new(ids.iter().map(|id| record(id, "SELECT 1")).collect())
    }
}

impl QueryHistorySource for StaticSource {
    fn get_query_by_id(&self, id: &QueryId) -> SourceResult<Option<QueryRecord>> {
        Ok(self.records.get(id).cloned())
    }
}

/// A source whose every lookup fails.
pub(crate) struct FailingSource;

impl QueryHistorySource for FailingSource {
    fn get_query_by_id(&self, _id: &QueryId) -> SourceResult<Option<QueryRecord>> {
        Err(SourceError::Unavailable("downstream store unreachable".into()))
    }
}

/// A factory creating [`StaticSource`]s from a fixed record list and
/// remembering every configuration it was handed.
pub(crate) struct RecordingFactory {
    name: String,
    records: Vec<QueryRecord>,
    pub(crate) seen: Mutex<Vec<Properties>>,
}

impl RecordingFactory {
    pub(crate) fn new(name: &str, records: Vec<QueryRecord>) -> Self {
        Self {
            name: name.to_string(),
            records,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl QueryHistorySourceFactory for RecordingFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>> {
        self.seen.lock().unwrap().push(config.clone());
        Ok(Box::new(StaticSource::new(self.records.clone())))
    }
}

/// A factory that always fails to create.
pub(crate) struct BrokenFactory;

impl QueryHistorySourceFactory for BrokenFactory {
    fn name(&self) -> &str {
        "broken"
    }

    fn create(&self, _config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>> {
        Err(SourceError::invalid_config("broken.url", "not set"))
    }
}

/// A factory creating [`FailingSource`]s.
pub(crate) struct FailingFactory;

impl QueryHistorySourceFactory for FailingFactory {
    fn name(&self) -> &str {
        "failing"
    }

    fn create(&self, _config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>> {
        Ok(Box::new(FailingSource))
    }
}
