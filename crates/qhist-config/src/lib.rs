//! Configuration for query history lookup.
//!
//! Two kinds of configuration live here:
//!
//! - [`Properties`] -- the `key=value` files operators write to declare
//!   history source instances (`etc/history.properties` and one
//!   `etc/history/<instance>.properties` per instance).
//! - [`HistoryConfig`] -- where those files live and how lookups treat a
//!   failing source. Loadable from TOML; every field has a default.

pub mod error;
pub mod manager;
pub mod properties;

pub use error::{ConfigError, ConfigResult};
pub use manager::{HistoryConfig, LookupFailurePolicy};
pub use properties::Properties;
