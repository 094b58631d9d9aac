use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default location of the root history configuration.
pub const DEFAULT_ROOT_CONFIG: &str = "etc/history.properties";

/// Default directory holding one `<instance>.properties` per history source.
pub const DEFAULT_INSTANCE_CONFIG_DIR: &str = "etc/history";

/// What a lookup does when one history source returns an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// The error aborts the whole lookup and is returned to the caller.
    #[default]
    Propagate,
    /// The error is logged and the lookup moves on to the next source.
    Isolate,
}

impl fmt::Display for LookupFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagate"),
            Self::Isolate => write!(f, "isolate"),
        }
    }
}

/// Settings for the history query manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Root properties file listing the configured instances.
    pub root_config: PathBuf,
    /// Directory containing per-instance properties files.
    pub instance_config_dir: PathBuf,
    /// Behaviour when a source fails during lookup.
    pub on_source_error: LookupFailurePolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            root_config: PathBuf::from(DEFAULT_ROOT_CONFIG),
            instance_config_dir: PathBuf::from(DEFAULT_INSTANCE_CONFIG_DIR),
            on_source_error: LookupFailurePolicy::default(),
        }
    }
}

impl HistoryConfig {
    /// Configuration rooted at an arbitrary base directory.
    ///
    /// Uses the same relative layout as the defaults:
    /// `<base>/etc/history.properties` and `<base>/etc/history/`.
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            root_config: base.join(DEFAULT_ROOT_CONFIG),
            instance_config_dir: base.join(DEFAULT_INSTANCE_CONFIG_DIR),
            ..Default::default()
        }
    }

    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builder-style setter for the failure policy.
    pub fn with_failure_policy(mut self, policy: LookupFailurePolicy) -> Self {
        self.on_source_error = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = HistoryConfig::default();
        assert_eq!(c.root_config, PathBuf::from("etc/history.properties"));
        assert_eq!(c.instance_config_dir, PathBuf::from("etc/history"));
        assert_eq!(c.on_source_error, LookupFailurePolicy::Propagate);
    }

    #[test]
    fn rooted_layout() {
        let c = HistoryConfig::rooted_at(Path::new("/opt/engine"));
        assert_eq!(c.root_config, PathBuf::from("/opt/engine/etc/history.properties"));
        assert_eq!(c.instance_config_dir, PathBuf::from("/opt/engine/etc/history"));
    }

    #[test]
    fn toml_partial_override() {
        let c = HistoryConfig::from_toml_str("on_source_error = \"isolate\"\n").unwrap();
        assert_eq!(c.on_source_error, LookupFailurePolicy::Isolate);
        assert_eq!(c.root_config, PathBuf::from(DEFAULT_ROOT_CONFIG));

        let c = HistoryConfig::from_toml_str(
            "root_config = \"/srv/h.properties\"\ninstance_config_dir = \"/srv/h\"\n",
        )
        .unwrap();
        assert_eq!(c.root_config, PathBuf::from("/srv/h.properties"));
        assert_eq!(c.instance_config_dir, PathBuf::from("/srv/h"));
    }

    #[test]
    fn toml_rejects_unknown_policy() {
        let err = HistoryConfig::from_toml_str("on_source_error = \"retry\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qhist.toml");
        fs::write(&path, "on_source_error = \"isolate\"\n").unwrap();
        let c = HistoryConfig::load(&path).unwrap();
        assert_eq!(c.on_source_error, LookupFailurePolicy::Isolate);

        let err = HistoryConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn policy_display() {
        assert_eq!(LookupFailurePolicy::Propagate.to_string(), "propagate");
        assert_eq!(LookupFailurePolicy::Isolate.to_string(), "isolate");
    }
}
