use std::path::{Path, PathBuf};

use qhist_config::Properties;
use tracing::{debug, info, warn};

use crate::error::{HistoryError, HistoryResult};
use crate::registry::FactoryRegistry;
use crate::source_set::ConfiguredSource;

/// Root configuration key listing the configured instances, comma separated.
pub const INSTANCE_NAMES_KEY: &str = "history-manager.instance.names";

/// Instance configuration key naming the factory to use.
pub const FACTORY_NAME_KEY: &str = "history-manager.factory.name";

const INSTANCE_CONFIG_EXTENSION: &str = "properties";

/// Split an instance name list.
///
/// Tokens are trimmed and empty tokens dropped. Duplicates are kept, in
/// order: a name listed twice is instantiated twice.
///
/// # Examples
///
/// ```
/// use qhist_registry::parse_instance_names;
///
/// assert_eq!(parse_instance_names("a, ,b"), vec!["a", "b"]);
/// assert_eq!(parse_instance_names(" a,a "), vec!["a", "a"]);
/// ```
pub fn parse_instance_names(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// One-shot, configuration-driven instantiation of history sources.
///
/// Factories are resolved against the registry at the moment of loading.
/// An instance whose factory registers later stays unloaded until the next
/// load.
pub struct SourceLoader<'a> {
    factories: &'a FactoryRegistry,
}

impl<'a> SourceLoader<'a> {
    pub fn new(factories: &'a FactoryRegistry) -> Self {
        Self { factories }
    }

    /// Load every configured instance, in configuration order.
    ///
    /// - Missing `root_config`: returns no sources and logs a warning.
    /// - Root configuration without instance names: [`HistoryError::Configuration`].
    /// - Unreadable or malformed properties file: [`HistoryError::Configuration`].
    /// - Instance without a file in `instance_dir`, without a factory name,
    ///   or naming an unregistered factory: skipped.
    /// - Factory failing to create its source: [`HistoryError::SourceCreation`].
    pub fn load(
        &self,
        root_config: &Path,
        instance_dir: &Path,
    ) -> HistoryResult<Vec<ConfiguredSource>> {
        if !root_config.exists() {
            warn!(
                path = ?root_config,
                "query history configuration not found; historical lookup disabled"
            );
            return Ok(Vec::new());
        }

        let mut root = load_properties(root_config)?;
        let raw_names = root.remove(INSTANCE_NAMES_KEY).unwrap_or_default();
        let instances = parse_instance_names(&raw_names);
        if instances.is_empty() {
            return Err(HistoryError::configuration(
                root_config,
                format!("does not contain {INSTANCE_NAMES_KEY}"),
            ));
        }

        let mut loaded = Vec::with_capacity(instances.len());
        for instance in &instances {
            if let Some(source) = self.load_instance(instance, instance_dir)? {
                loaded.push(source);
            }
        }

        info!(
            configured = instances.len(),
            loaded = loaded.len(),
            "query history sources loaded"
        );
        Ok(loaded)
    }

    fn load_instance(
        &self,
        instance: &str,
        instance_dir: &Path,
    ) -> HistoryResult<Option<ConfiguredSource>> {
        let path = instance_config_path(instance_dir, instance);
        if !path.exists() {
            debug!(instance, path = ?path, "no configuration for instance; skipping");
            return Ok(None);
        }

        let config = load_properties(&path)?;
        let Some(factory_name) = config.get_non_blank(FACTORY_NAME_KEY) else {
            warn!(instance, path = ?path, "instance configuration has no {FACTORY_NAME_KEY}; skipping");
            return Ok(None);
        };
        let Some(factory) = self.factories.lookup(factory_name) else {
            warn!(
                instance,
                factory = factory_name,
                "query history source factory not registered; skipping instance"
            );
            return Ok(None);
        };

        let source = factory
            .create(&config)
            .map_err(|source| HistoryError::SourceCreation {
                instance: instance.to_string(),
                factory: factory_name.to_string(),
                source,
            })?;
        info!(instance, factory = factory_name, source = %source.describe(), "created query history source");
        Ok(Some(ConfiguredSource::new(instance, factory_name, source)))
    }
}

/// `<instance_dir>/<instance>.properties`
pub(crate) fn instance_config_path(instance_dir: &Path, instance: &str) -> PathBuf {
    instance_dir.join(format!("{instance}.{INSTANCE_CONFIG_EXTENSION}"))
}

fn load_properties(path: &Path) -> HistoryResult<Properties> {
    Properties::load(path).map_err(|e| HistoryError::configuration(path, e.to_string()))
}
