//! Settings file
//!
//! Read from `--config` or `<config dir>/logpilot/config.toml` when present.
//! Every field has a default, so a partial file is fine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use logpilot_server::ServerConfig;
use logpilot_worker::WorkerConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub worker: WorkerConfig,
}

impl Settings {
    /// Load `explicit` if given, else the default file if it exists, else
    /// defaults. A missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn default_path() -> Option<PathBuf> {
        let config_dir = dirs::config_dir()?;
        Some(config_dir.join("logpilot").join("config.toml"))
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"
            [server]
            port = 8080
            max_frame_lines = 50

            [worker]
            batch_size = 500
            "#,
            Path::new("config.toml"),
        )
        .unwrap();

        assert_eq!(settings.server.port, Some(8080));
        assert_eq!(settings.server.max_frame_lines, 50);
        assert_eq!(settings.server.host, "localhost");
        assert_eq!(settings.worker.batch_size, 500);
        assert_eq!(settings.worker.flush_interval_ms, 50);
    }

    #[test]
    fn test_empty_file_is_default() {
        let settings = Settings::parse("", Path::new("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_bad_toml_names_the_file() {
        let err = Settings::parse("[server\nport = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.to_string(), "invalid settings in bad.toml");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/logpilot.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
