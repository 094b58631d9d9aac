//! Pluggable query history registry.
//!
//! Plugins register named [`QueryHistorySourceFactory`]s. At startup the
//! [`SourceLoader`] reads the root history configuration, resolves each
//! listed instance to a factory, and creates one [`QueryHistorySource`] per
//! instance. Lookups fan out over the loaded sources in configuration
//! order and return the first record found.
//!
//! # Components
//!
//! - [`FactoryRegistry`] -- name to factory map with atomic check-and-insert
//! - [`SourceLoader`] -- one-shot, configuration-driven source instantiation
//! - [`SourceSet`] -- ordered, append-only collection of loaded sources
//! - [`HistoryQueryManager`] -- facade tying the three together
//!
//! # Failure Model
//!
//! 1. A missing root configuration disables history lookup; it is not an error.
//! 2. A root configuration without instance names fails the load.
//! 3. Instances without a configuration file, or naming an unregistered
//!    factory, are skipped with a log line.
//! 4. A failing source aborts a lookup unless the manager is configured to
//!    isolate source failures.

pub mod error;
pub mod loader;
pub mod manager;
pub mod registry;
pub mod source_set;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{HistoryError, HistoryResult, SourceError, SourceResult};
pub use loader::{parse_instance_names, SourceLoader, FACTORY_NAME_KEY, INSTANCE_NAMES_KEY};
pub use manager::HistoryQueryManager;
pub use registry::FactoryRegistry;
pub use source_set::{ConfiguredSource, SourceSet};
pub use traits::{FnFactory, QueryHistorySource, QueryHistorySourceFactory};

// Re-export the types that cross the plugin boundary.
pub use qhist_config::{HistoryConfig, LookupFailurePolicy, Properties};
pub use qhist_types::{QueryId, QueryRecord, QueryState};
