//! TOML configuration for the registry tool.
//!
//! Values are layered: built-in defaults, then the TOML file, then
//! `SORTINGHAT_*` environment variables. Command-line flags are applied on
//! top by the binary.

use crate::logging::normalize_level;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DATABASE: &str = "SORTINGHAT_DATABASE";
pub const ENV_LOG_LEVEL: &str = "SORTINGHAT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SORTINGHAT_LOG_DIR";

const DEFAULT_DATABASE_FILE: &str = "sortinghat.db";
const DEFAULT_LOG_LEVEL: &str = "warn";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config file `{}`: {source}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config file: {message}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(_) | Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingHatConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Registry store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; created on first use.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rotating log files. Logs go to stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            dir: None,
        }
    }
}

impl SortingHatConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("event=config_load module=config status=start path={}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overrides values with `SORTINGHAT_*` process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overrides values using `lookup` as the environment source.
    ///
    /// Blank values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = value_of(ENV_DATABASE) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(level) = value_of(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(dir) = value_of(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database.path cannot be empty".to_string(),
            ));
        }
        normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SortingHatConfig, ENV_DATABASE, ENV_LOG_LEVEL};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn defaults_apply_when_sections_are_missing() {
        let config = SortingHatConfig::from_toml_str("").unwrap();
        assert_eq!(config, SortingHatConfig::default());
        assert_eq!(config.database.path, PathBuf::from("sortinghat.db"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_file_reads_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\npath = \"/var/lib/sortinghat/registry.db\"\n\n[logging]\nlevel = \"info\"\ndir = \"/var/log/sortinghat\""
        )
        .unwrap();

        let config = SortingHatConfig::load_from_file(file.path()).unwrap();
        assert_eq!(
            config.database.path,
            PathBuf::from("/var/lib/sortinghat/registry.db")
        );
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/sortinghat")));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SortingHatConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = SortingHatConfig::from_toml_str("[database\npath = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_file_values_and_ignores_blanks() {
        let mut config = SortingHatConfig::default();
        config.apply_env_from(|key| match key {
            ENV_DATABASE => Some("/tmp/registry.db".to_string()),
            ENV_LOG_LEVEL => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.database.path, PathBuf::from("/tmp/registry.db"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn validate_rejects_bad_level_and_relative_log_dir() {
        let mut config = SortingHatConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SortingHatConfig::default();
        config.logging.dir = Some(PathBuf::from("logs"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }
}
