//! Strategy routing: a strategy key plus string options → a concrete loader.

use std::fmt;
use std::path::{Path, PathBuf};

use treesync_core::TreeRecord;

use crate::error::LoadError;
use crate::fixture;
use crate::magdeburg::{self, Edition};
use crate::sheet::{self, FeedLocation};

/// Strategy keys accepted by [`LoadingStrategy::from_parts`].
pub const STRATEGY_KEYS: &[&str] = &["magdeburg", "google-sheet", "spreadsheet", "test"];

#[derive(Debug, Clone, PartialEq)]
pub enum LoadingStrategy {
    Magdeburg { edition: Edition, path: PathBuf },
    SpreadsheetFeed(FeedLocation),
    Fixture,
}

impl LoadingStrategy {
    /// Resolve a strategy. Fails before any I/O on an unknown key, an unknown
    /// edition or a missing option.
    pub fn from_parts(key: &str, options: &[String]) -> Result<Self, LoadError> {
        let option = |idx: usize, strategy: &'static str, name: &'static str| {
            options
                .get(idx)
                .map(String::as_str)
                .filter(|o| !o.trim().is_empty())
                .ok_or(LoadError::MissingOption {
                    strategy,
                    option: name,
                })
        };

        match key {
            "magdeburg" => {
                let edition = option(0, "magdeburg", "edition")?.parse()?;
                let path = PathBuf::from(option(1, "magdeburg", "path")?);
                Ok(Self::Magdeburg { edition, path })
            }
            "google-sheet" | "spreadsheet" => {
                let location = option(0, "spreadsheet", "location")?;
                let sheet = options.get(1).map(String::as_str);
                Ok(Self::SpreadsheetFeed(FeedLocation::parse(location, sheet)))
            }
            "test" => Ok(Self::Fixture),
            other => Err(LoadError::UnknownSource {
                kind: "strategy",
                name: other.to_string(),
            }),
        }
    }

    /// Resolve relative file locations against `base`. URLs are untouched.
    pub fn with_base_dir(self, base: &Path) -> Self {
        let join = |p: &str| -> String {
            if Path::new(p).is_relative() {
                base.join(p).to_string_lossy().into_owned()
            } else {
                p.to_string()
            }
        };
        match self {
            Self::Magdeburg { edition, path } if path.is_relative() => Self::Magdeburg {
                edition,
                path: base.join(path),
            },
            Self::SpreadsheetFeed(FeedLocation::Csv(path)) => {
                Self::SpreadsheetFeed(FeedLocation::Csv(join(&path)))
            }
            Self::SpreadsheetFeed(FeedLocation::Workbook { path, sheet }) => {
                Self::SpreadsheetFeed(FeedLocation::Workbook {
                    path: join(&path),
                    sheet,
                })
            }
            other => other,
        }
    }

    pub fn load(&self) -> Result<Vec<TreeRecord>, LoadError> {
        match self {
            Self::Magdeburg { edition, path } => magdeburg::load(*edition, path),
            Self::SpreadsheetFeed(location) => sheet::load(location),
            Self::Fixture => Ok(fixture::load()),
        }
    }
}

impl fmt::Display for LoadingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Magdeburg { edition, path } => write!(f, "magdeburg {edition} ({})", path.display()),
            Self::SpreadsheetFeed(FeedLocation::Url(url)) => write!(f, "spreadsheet {url}"),
            Self::SpreadsheetFeed(FeedLocation::Csv(path)) => write!(f, "spreadsheet {path}"),
            Self::SpreadsheetFeed(FeedLocation::Workbook { path, sheet }) => match sheet {
                Some(sheet) => write!(f, "spreadsheet {path} [{sheet}]"),
                None => write!(f, "spreadsheet {path}"),
            },
            Self::Fixture => f.write_str("test fixture"),
        }
    }
}
