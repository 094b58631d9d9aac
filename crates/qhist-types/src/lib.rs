//! Foundation types for query history lookup.
//!
//! Every other qhist crate depends on `qhist-types`. History sources hand
//! back [`QueryRecord`]s keyed by [`QueryId`]; the registry never looks
//! inside a record beyond its identifier.
//!
//! # Key Types
//!
//! - [`QueryId`] -- Non-empty, trimmed query identifier
//! - [`QueryRecord`] -- A historical query as reported by a history source
//! - [`QueryState`] -- Terminal or in-flight lifecycle state of a query

pub mod error;
pub mod query;
pub mod record;

pub use error::TypeError;
pub use query::QueryId;
pub use record::{QueryRecord, QueryState};
