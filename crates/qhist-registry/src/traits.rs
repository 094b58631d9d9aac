//! The plugin boundary: history sources and the factories that create them.

use std::fmt;

use qhist_config::Properties;
use qhist_types::{QueryId, QueryRecord};

use crate::error::SourceResult;

/// A backend that can answer "do you have a record for this query?".
///
/// Implementations must be thread-safe; lookups may run concurrently from
/// many callers once loading is complete. The registry never mutates a
/// source after creation.
pub trait QueryHistorySource: Send + Sync {
    /// Look up a historical query by id.
    ///
    /// Returns `Ok(None)` if this source has no record for `id`.
    /// Returns `Err` if the source itself failed (unreachable store,
    /// corrupt data).
    fn get_query_by_id(&self, id: &QueryId) -> SourceResult<Option<QueryRecord>>;

    /// Short human-readable description used in logs and listings.
    fn describe(&self) -> String {
        "history source".to_string()
    }
}

/// A named constructor for [`QueryHistorySource`]s.
///
/// The factory receives the complete instance configuration, including the
/// factory-name key that selected it.
pub trait QueryHistorySourceFactory: Send + Sync {
    /// Unique name instance configurations refer to.
    fn name(&self) -> &str;

    /// Create a source from an instance configuration.
    fn create(&self, config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>>;
}

/// A factory backed by a closure.
///
/// Handy for embedding and tests where a dedicated factory type is overkill.
pub struct FnFactory<F> {
    name: String,
    create: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&Properties) -> SourceResult<Box<dyn QueryHistorySource>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, create: F) -> Self {
        Self {
            name: name.into(),
            create,
        }
    }
}

impl<F> QueryHistorySourceFactory for FnFactory<F>
where
    F: Fn(&Properties) -> SourceResult<Box<dyn QueryHistorySource>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, config: &Properties) -> SourceResult<Box<dyn QueryHistorySource>> {
        (self.create)(config)
    }
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticSource;
    use qhist_types::QueryState;

    #[test]
    fn fn_factory_passes_config_through() {
        let factory = FnFactory::new("closure", |config: &Properties| {
            let id = config.get("seed.id").unwrap_or("none").to_string();
            let source = StaticSource::with_ids(&[id.as_str()]);
            Ok(Box::new(source) as Box<dyn QueryHistorySource>)
        });
        assert_eq!(factory.name(), "closure");

        let config: Properties = [("seed.id", "Q42")].into_iter().collect();
        let source = factory.create(&config).unwrap();
        let rec = source
            .get_query_by_id(&QueryId::new("Q42").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(rec.state, QueryState::Finished);
        assert!(format!("{factory:?}").contains("closure"));
    }

    #[test]
    fn default_description() {
        let source = StaticSource::with_ids(&[]);
        assert_eq!(source.describe(), "history source");
    }
}
