//! History source reading one JSON record per file from a directory tree.
//!
//! Layout: every `*.json` file below the root holds one [`QueryRecord`]
//! and is named after its query id (`<query_id>.json`). Subdirectories are
//! allowed, e.g. one per day. The tree is indexed once when the source is
//! created; files added to the root directory later are still found by
//! direct name lookup.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use qhist_config::Properties;
use qhist_registry::{QueryHistorySource, QueryHistorySourceFactory, SourceError, SourceResult};
use qhist_types::{QueryId, QueryRecord};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Instance key: root directory of the record tree.
pub const PATH_KEY: &str = "json-dir.path";

const RECORD_EXTENSION: &str = "json";

/// A read-only history source backed by a directory of JSON files.
#[derive(Debug)]
pub struct JsonDirHistorySource {
    root: PathBuf,
    index: HashMap<QueryId, PathBuf>,
}

impl JsonDirHistorySource {
    /// Open a record tree rooted at `root`.
    ///
    /// Fails if `root` is not a directory. Files whose stem is not a valid
    /// query id are ignored; if two files share a stem, the first one
    /// walked wins.
    pub fn open(root: &Path) -> SourceResult<Self> {
        if !root.is_dir() {
            return Err(SourceError::invalid_config(
                PATH_KEY,
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut index = HashMap::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = ?root, error = %e, "skipping unreadable entry in record tree");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension() != Some(OsStr::new(RECORD_EXTENSION)) {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(OsStr::to_str)
                .and_then(|stem| QueryId::new(stem).ok())
            else {
                continue;
            };
            index.entry(id).or_insert_with(|| path.to_path_buf());
        }

        debug!(root = ?root, records = index.len(), "indexed JSON history directory");
        Ok(Self {
            root: root.to_path_buf(),
            index,
        })
    }

    /// Root directory of the record tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of records found when the source was opened.
    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    fn locate(&self, id: &QueryId) -> Option<PathBuf> {
        if let Some(path) = self.index.get(id) {
            return Some(path.clone());
        }
        if !id.is_path_safe() {
            return None;
        }
        let direct = self
            .root
            .join(format!("{}.{RECORD_EXTENSION}", id.as_str()));
        direct.is_file().then_some(direct)
    }
}

impl QueryHistorySource for JsonDirHistorySource {
    fn get_query_by_id(&self, id: &QueryId) -> SourceResult<Option<QueryRecord>> {
        let Some(path) = self.locate(id) else {
            return Ok(None);
        };

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            // Removed since indexing.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = QueryRecord::from_json(&text).map_err(|e| SourceError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        if &record.query_id != id {
            return Err(SourceError::Corrupt {
                id: id.clone(),
                reason: format!(
                    "{} holds query {}",
                    path.display(),
                    record.query_id
                ),
            });
        }
        Ok(Some(record))
    }

    fn describe(&self) -> String {
        format!("json-dir {} ({} indexed)", self.root.display(), self.index.len())
    }
}

/// Factory `json-dir`: creates a [`JsonDirHistorySource`] rooted at
/// [`PATH_KEY`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDirSourceFactory;

impl JsonDirSourceFactory {
    pub const NAME: &'static str = "json-dir";
}

impl QueryHistorySourceFactory for JsonDirSourceFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create(&self, config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>> {
        let root = config
            .get_non_blank(PATH_KEY)
            .ok_or_else(|| SourceError::invalid_config(PATH_KEY, "required key is not set"))?;
        Ok(Box::new(JsonDirHistorySource::open(Path::new(root))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use qhist_types::QueryState;

    fn id(raw: &str) -> QueryId {
        QueryId::new(raw).unwrap()
    }

    fn write_record(dir: &Path, id_str: &str, state: QueryState) {
        let mut record = QueryRecord::new(id(id_str), state, format!("SELECT '{id_str}'"));
        record.created_at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(format!("{id_str}.json")),
            record.to_json_pretty().unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn finds_records_in_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "Q1", QueryState::Finished);
        write_record(&dir.path().join("2024-03-01"), "Q2", QueryState::Failed);
        fs::write(dir.path().join("README.txt"), "not a record").unwrap();

        let source = JsonDirHistorySource::open(dir.path()).unwrap();
        assert_eq!(source.indexed_len(), 2);

        let q2 = source.get_query_by_id(&id("Q2")).unwrap().unwrap();
        assert_eq!(q2.state, QueryState::Failed);
        assert_eq!(q2.query, "SELECT 'Q2'");
        assert!(source.get_query_by_id(&id("Q3")).unwrap().is_none());
    }

    #[test]
    fn finds_records_added_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDirHistorySource::open(dir.path()).unwrap();
        assert_eq!(source.indexed_len(), 0);

        write_record(dir.path(), "late", QueryState::Running);
        let found = source.get_query_by_id(&id("late")).unwrap().unwrap();
        assert_eq!(found.state, QueryState::Running);
    }

    #[test]
    fn removed_file_reads_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "Q1", QueryState::Finished);
        let source = JsonDirHistorySource::open(dir.path()).unwrap();
        fs::remove_file(dir.path().join("Q1.json")).unwrap();
        assert!(source.get_query_by_id(&id("Q1")).unwrap().is_none());
    }

    #[test]
    fn unparsable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Q1.json"), "{ truncated").unwrap();
        let source = JsonDirHistorySource::open(dir.path()).unwrap();

        let err = source.get_query_by_id(&id("Q1")).unwrap_err();
        assert!(matches!(err, SourceError::Corrupt { .. }));
    }

    #[test]
    fn mismatched_id_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "Q1", QueryState::Finished);
        fs::rename(dir.path().join("Q1.json"), dir.path().join("Q9.json")).unwrap();
        let source = JsonDirHistorySource::open(dir.path()).unwrap();

        let err = source.get_query_by_id(&id("Q9")).unwrap_err();
        assert!(err.to_string().contains("holds query Q1"));
    }

    #[test]
    fn path_traversal_ids_are_not_found() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("records");
        fs::create_dir_all(&root).unwrap();
        write_record(outer.path(), "secret", QueryState::Finished);

        let source = JsonDirHistorySource::open(&root).unwrap();
        assert!(source.get_query_by_id(&id("../secret")).unwrap().is_none());
    }

    #[test]
    fn open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonDirHistorySource::open(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, SourceError::InvalidConfig { .. }));
    }

    #[test]
    fn factory_requires_path_key() {
        let err = JsonDirSourceFactory.create(&Properties::new()).err().unwrap();
        assert!(matches!(err, SourceError::InvalidConfig { ref key, .. } if key == PATH_KEY));
    }

    #[test]
    fn factory_opens_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "Q1", QueryState::Canceled);

        let mut config = Properties::new();
        config.insert(PATH_KEY, dir.path().to_string_lossy());
        let source = JsonDirSourceFactory.create(&config).unwrap();
        assert!(source.describe().starts_with("json-dir "));
        assert_eq!(
            source.get_query_by_id(&id("Q1")).unwrap().unwrap().state,
            QueryState::Canceled
        );
    }
}
