// Application settings
// Loaded from ~/.config/treesync/config.toml

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use treesync_core::CoordinateOrder;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TREESYNC_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("source '{0}' is not configured")]
    UnknownSource(String),
}

/// How one source tag is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Loading strategy key (`magdeburg`, `google-sheet`, `spreadsheet`, `test`).
    pub strategy: String,

    #[serde(default)]
    pub options: Vec<String>,

    /// Providers that ship latitude/longitude transposed set `swapped`.
    #[serde(default)]
    pub coordinate_order: CoordinateOrder,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite database file.
    pub database: Option<PathBuf>,

    /// Source tag → loading settings.
    pub sources: BTreeMap<String, SourceConfig>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Settings {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("treesync")
            .join("config.toml")
    }

    /// Load settings. `explicit` (the `--config` flag) wins over
    /// `TREESYNC_CONFIG`, which wins over the default location. An explicitly
    /// named file must exist; a missing default file yields empty settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from(&path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.base_dir = path.parent().map(Path::to_path_buf);
        settings.validate()?;
        debug!(path = %path.display(), sources = settings.sources.len(), "loaded config");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (tag, source) in &self.sources {
            if tag.trim().is_empty() || tag.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!("source tag '{tag}' must be a non-empty word")));
            }
            if source.strategy.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("source '{tag}' has no strategy")));
            }
        }
        Ok(())
    }

    pub fn source(&self, tag: &str) -> Result<&SourceConfig, ConfigError> {
        self.sources
            .get(tag)
            .ok_or_else(|| ConfigError::UnknownSource(tag.to_string()))
    }

    /// Directory of the loaded config file, if any.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Resolve `path` against the config directory when it is relative.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Database path: `override_path` (flag or `TREESYNC_DATABASE`), then the
    /// config value, then `<data_dir>/treesync/trees.db`.
    pub fn database_path(&self, override_path: Option<&Path>) -> PathBuf {
        if let Some(path) = override_path {
            return path.to_path_buf();
        }
        match &self.database {
            Some(path) => self.resolve(path),
            None => dirs::data_dir()
                .map(|d| d.join("treesync").join("trees.db"))
                .unwrap_or_else(|| PathBuf::from("trees.db")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
database = "data/trees.db"

[sources.ls]
strategy = "magdeburg"
options = ["2023", "data/2023_Liegenschaftsservice.csv"]

[sources.sfm]
strategy = "google-sheet"
options = ["https://docs.example.org/pub?output=csv"]
coordinate_order = "swapped"
"#;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn parses_sources_and_coordinate_order() {
        let (_dir, path) = write_config(SAMPLE);
        let settings = Settings::load_from(&path).unwrap();

        let ls = settings.source("ls").unwrap();
        assert_eq!(ls.strategy, "magdeburg");
        assert_eq!(ls.options, vec!["2023", "data/2023_Liegenschaftsservice.csv"]);
        assert_eq!(ls.coordinate_order, CoordinateOrder::LatLng);
        assert_eq!(settings.source("sfm").unwrap().coordinate_order, CoordinateOrder::Swapped);
        assert!(matches!(settings.source("osm"), Err(ConfigError::UnknownSource(_))));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let (dir, path) = write_config(SAMPLE);
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.database_path(None), dir.path().join("data/trees.db"));
        assert_eq!(
            settings.database_path(Some(Path::new("/tmp/other.db"))),
            PathBuf::from("/tmp/other.db")
        );
        assert_eq!(settings.resolve(Path::new("/abs/file.csv")), PathBuf::from("/abs/file.csv"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/treesync.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn rejects_bad_values() {
        let (_dir, path) = write_config("[sources.ls]\nstrategy = \"\"\n");
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Invalid(_))));

        let (_dir, path) = write_config("[sources.ls]\nstrategy = \"test\"\ncoordinate_order = \"lng_lat\"\n");
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));

        let (_dir, path) = write_config("databse = \"x.db\"\n");
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn empty_file_is_default() {
        let (_dir, path) = write_config("");
        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.sources.is_empty());
        assert!(settings.database.is_none());
    }
}
