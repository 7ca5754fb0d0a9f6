use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for a newsdesk instance.
///
/// This struct holds the locations of the document and blob stores and the
/// settings of the ambient services (logging, notifications).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Root directory of the document store.
    ///
    /// Every collection is a subdirectory holding one JSON file per document.
    pub data_dir: PathBuf,

    /// Root directory of the blob store.
    pub blob_dir: PathBuf,

    /// Base of the public URLs handed out for stored images.
    ///
    /// An image stored at `images/articles/abc` is served from
    /// `{blob_base_url}/images/articles/abc`.
    pub blob_base_url: String,

    /// Default log filter, used when `RUST_LOG` is not set.
    pub log_level: String,

    /// How long a notification stays visible before closing itself.
    notification_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            blob_dir: default_blob_dir(),
            blob_base_url: default_blob_base_url(),
            log_level: default_log_level(),
            notification_timeout_ms: default_notification_timeout_ms(),
        }
    }
}

/// Error returned when loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    /// The file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),
    /// The file is not valid TOML for this configuration.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Resolves relative store directories against `base`.
    ///
    /// Used when the configuration was loaded from a file, so relative paths
    /// are taken relative to that file rather than the working directory.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.data_dir.is_relative() {
            self.data_dir = base.join(&self.data_dir);
        }
        if self.blob_dir.is_relative() {
            self.blob_dir = base.join(&self.blob_dir);
        }
        self
    }

    /// Returns how long notifications stay visible, in milliseconds.
    #[must_use]
    pub const fn notification_timeout_ms(&self) -> u64 {
        self.notification_timeout_ms
    }

    /// Sets how long notifications stay visible.
    ///
    /// A timeout of zero disables auto-closing.
    pub const fn set_notification_timeout_ms(&mut self, value: u64) {
        self.notification_timeout_ms = value;
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("blobs")
}

fn default_blob_base_url() -> String {
    "file://blobs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_notification_timeout_ms() -> u64 {
    3500
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,

        #[serde(default = "default_blob_dir")]
        blob_dir: PathBuf,

        #[serde(default = "default_blob_base_url")]
        blob_base_url: String,

        #[serde(default = "default_log_level")]
        log_level: String,

        /// Auto-close delay of notifications, `0` keeps them open.
        #[serde(default = "default_notification_timeout_ms")]
        notification_timeout_ms: u64,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data_dir,
                blob_dir,
                blob_base_url,
                log_level,
                notification_timeout_ms,
            } => Self {
                data_dir,
                blob_dir,
                blob_base_url,
                log_level,
                notification_timeout_ms,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            data_dir: config.data_dir,
            blob_dir: config.blob_dir,
            blob_base_url: config.blob_base_url,
            log_level: config.log_level,
            notification_timeout_ms: config.notification_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ndata_dir = \"/srv/newsdesk/data\"\nblob_dir = \"/srv/newsdesk/blobs\"\nblob_base_url = \"https://cdn.example\"\nlog_level = \"debug\"\nnotification_timeout_ms = 5000\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/newsdesk/data"));
        assert_eq!(config.blob_dir, PathBuf::from("/srv/newsdesk/blobs"));
        assert_eq!(config.blob_base_url, "https://cdn.example");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.notification_timeout_ms(), 5000);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nnotification_timeout_ms = \"soon\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("newsdesk.toml");

        let mut config = Config::default();
        config.blob_base_url = "https://cdn.example".to_string();
        config.set_notification_timeout_ms(0);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn relative_dirs_resolve_against_base() {
        let config = Config {
            blob_dir: PathBuf::from("/abs/blobs"),
            ..Config::default()
        }
        .relative_to(Path::new("/etc/newsdesk"));

        assert_eq!(config.data_dir, PathBuf::from("/etc/newsdesk/data"));
        assert_eq!(config.blob_dir, PathBuf::from("/abs/blobs"));
    }
}
