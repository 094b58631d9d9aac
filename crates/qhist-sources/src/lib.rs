//! Built-in query history sources.
//!
//! | Factory    | Source                     | Configuration keys                  |
//! |------------|----------------------------|-------------------------------------|
//! | `memory`   | [`InMemoryHistorySource`]  | `memory.records-file` (optional)    |
//! | `json-dir` | [`JsonDirHistorySource`]   | `json-dir.path` (required)          |
//!
//! Both factories are plain [`QueryHistorySourceFactory`] implementations;
//! register them with [`register_builtin_factories`] or individually.

pub mod json_dir;
pub mod memory;

use std::sync::Arc;

use qhist_registry::{HistoryQueryManager, HistoryResult, QueryHistorySourceFactory};

pub use json_dir::{JsonDirHistorySource, JsonDirSourceFactory};
pub use memory::{InMemoryHistorySource, MemorySourceFactory};

/// All built-in factories.
pub fn builtin_factories() -> Vec<Arc<dyn QueryHistorySourceFactory>> {
    vec![
        Arc::new(MemorySourceFactory),
        Arc::new(JsonDirSourceFactory),
    ]
}

/// Register every built-in factory with `manager`.
pub fn register_builtin_factories(manager: &HistoryQueryManager) -> HistoryResult<()> {
    for factory in builtin_factories() {
        manager.add_factory(factory)?;
    }
    Ok(())
}
