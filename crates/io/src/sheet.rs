//! Spreadsheet feed: a published CSV URL, a local CSV, or a local workbook.
//!
//! Every location carries the same header row:
//! `Id, Adresse, Latitude, Longitude, Gattung, Art, AllgemeinerName,
//! Baumhoehe, Kronendurchmesser, Stammumfang, Pflanzjahr`.

use std::f64::consts::PI;
use std::path::Path;
use std::time::Duration;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, warn};
use treesync_core::{TreeId, TreeRecord};

use crate::csv::{parse_decimal, parse_integer, parse_table, read_table, Table};
use crate::error::LoadError;

const USER_AGENT: &str = concat!("treesync/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Where the feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocation {
    Url(String),
    Csv(String),
    Workbook { path: String, sheet: Option<String> },
}

impl FeedLocation {
    pub fn parse(location: &str, sheet: Option<&str>) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::Url(location.to_string());
        }
        let ext = Path::new(location)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext {
            Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) => Self::Workbook {
                path: location.to_string(),
                sheet: sheet.map(str::to_string),
            },
            _ => Self::Csv(location.to_string()),
        }
    }
}

pub fn load(location: &FeedLocation) -> Result<Vec<TreeRecord>, LoadError> {
    let table = match location {
        FeedLocation::Url(url) => parse_table(&fetch(url)?)?,
        FeedLocation::Csv(path) => read_table(Path::new(path))?,
        FeedLocation::Workbook { path, sheet } => read_workbook(Path::new(path), sheet.as_deref())?,
    };
    let trees = load_table(&table)?;
    debug!(?location, rows = table.rows.len(), trees = trees.len(), "loaded spreadsheet feed");
    Ok(trees)
}

fn fetch(url: &str) -> Result<String, LoadError> {
    let http_err = |e: reqwest::Error| LoadError::Http {
        url: url.to_string(),
        message: e.to_string(),
    };
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(http_err)?;

    let response = http.get(url).send().map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Http {
            url: url.to_string(),
            message: format!("HTTP {status}"),
        });
    }
    response.text().map_err(http_err)
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::Spreadsheet(format!("failed to open {}: {e}", path.display())))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Spreadsheet(format!("{} contains no sheets", path.display())))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Spreadsheet(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(Table::from_rows(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        // Integers without decimals
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => format!("{n}"),
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
    }
}

pub fn load_table(table: &Table) -> Result<Vec<TreeRecord>, LoadError> {
    let col = |name: &str| table.column(name);
    let id = col("Id")?;
    let address = col("Adresse")?;
    let lat = col("Latitude")?;
    let lon = col("Longitude")?;
    let genus = col("Gattung")?;
    let species = col("Art")?;
    let common = col("AllgemeinerName")?;
    let height = col("Baumhoehe")?;
    let crown = col("Kronendurchmesser")?;
    let girth = col("Stammumfang")?;
    let planted = col("Pflanzjahr")?;

    let mut trees = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let field = |idx| Table::field(row, idx).trim();
        let text = |idx| Some(field(idx).to_string()).filter(|s| !s.is_empty());

        let reference = field(id);
        if reference.is_empty() {
            warn!("spreadsheet row without Id, skipping");
            continue;
        }
        let (Some(lat_text), Some(lon_text)) = (coordinate(field(lat)), coordinate(field(lon))) else {
            warn!(tree = reference, "missing or invalid coordinates, skipping");
            continue;
        };

        trees.push(TreeRecord {
            internal_ref: TreeId::generate(),
            reference: reference.to_string(),
            location: None,
            address: text(address),
            lat: lat_text,
            lon: lon_text,
            genus: text(genus),
            species: text(species),
            common: text(common),
            height: parse_decimal(field(height)),
            crown: parse_decimal(field(crown)),
            dbh: parse_decimal(field(girth)).map(|g| (g / PI).round()),
            planted: parse_integer(field(planted)).and_then(|y| i32::try_from(y).ok()),
        });
    }
    Ok(trees)
}

/// Decimal-comma coordinate → numeric text.
fn coordinate(text: &str) -> Option<String> {
    parse_decimal(text).map(|v| format!("{v}"))
}
