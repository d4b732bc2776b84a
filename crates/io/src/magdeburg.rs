//! Magdeburg municipal tree register exports (2022 and 2023 editions).
//!
//! Pipeline: read → filter invalid rows → fix known data issues → build
//! records. The two editions differ in the trunk column (diameter in 2022,
//! girth in 2023) and in their genus correction tables.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};
use treesync_core::{TreeId, TreeRecord};

use crate::classify::classify;
use crate::csv::{parse_decimal, parse_integer, parse_leading_decimal, read_table, Table};
use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Y2022,
    Y2023,
}

impl FromStr for Edition {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2022" => Ok(Self::Y2022),
            "2023" => Ok(Self::Y2023),
            other => Err(LoadError::UnknownSource {
                kind: "magdeburg edition",
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Y2022 => f.write_str("2022"),
            Self::Y2023 => f.write_str("2023"),
        }
    }
}

impl Edition {
    fn trunk_column(self) -> &'static str {
        match self {
            Self::Y2022 => "Stammdurchm",
            Self::Y2023 => "Stammumfang",
        }
    }

    /// Known-bad `Gattung` values → corrected text (`None` = no genus).
    fn genus_corrections(self) -> &'static [(&'static str, Option<&'static str>)] {
        match self {
            Self::Y2022 => &[
                (
                    "Tilia europaea \"Pallida\"; Kaiser-Linde",
                    Some("Tilia europaea \"Pallida\", Kaiser-Linde"),
                ),
                (
                    "Ostrya carpinifolia - Hopfenbuche",
                    Some("Ostrya carpinifolia, Hopfenbuche"),
                ),
                ("unbekannt", None),
                ("waldartiger Bestand", None),
            ],
            Self::Y2023 => &[
                (
                    "Ostrya carpinifolia - Hopfenbuche",
                    Some("Ostrya carpinifolia, Hopfenbuche"),
                ),
                ("unbekannt", None),
                ("Unbekannt", None),
                ("waldartiger Bestand", None),
                ("Leerstelle", None),
                ("Baumgruppe", None),
            ],
        }
    }

    fn dbh(self, trunk: &str) -> Option<f64> {
        let value = parse_integer(trunk)? as f64;
        match self {
            Self::Y2022 => Some(value),
            Self::Y2023 => Some(value / PI),
        }
    }
}

const IGNORED_ADDRESS_WORDS: &[&str] = &[
    "Bäume - Liegenschaftsservice",
    "/KGA",
    "/LSG",
    "/PPL",
    "/SBG",
    "/SF",
    "/SP",
];

const TEST_AREA: &str = "Testgebiet";
const EMPTY_SLOT: &str = "Leerstelle";
const MIN_PLANTING_YEAR: i64 = 1600;

/// One export row, fields still as text.
#[derive(Debug, Clone)]
struct RawTree {
    number: String,
    height: String,
    genus: String,
    area: String,
    crown: String,
    planted: String,
    street: String,
    trunk: String,
    lon: String,
    lat: String,
}

struct Columns {
    number: usize,
    height: usize,
    genus: usize,
    area: usize,
    crown: usize,
    planted: usize,
    street: usize,
    trunk: usize,
    lon: usize,
    lat: usize,
}

impl Columns {
    fn resolve(table: &Table, edition: Edition) -> Result<Self, LoadError> {
        Ok(Self {
            number: table.column("Baumnummer")?,
            height: table.column("Hoehe")?,
            genus: table.column("Gattung")?,
            area: table.column("gebiet")?,
            crown: table.column("Kronendurchm")?,
            planted: table.column("pflanzjahr")?,
            street: table.column("strasse")?,
            trunk: table.column(edition.trunk_column())?,
            lon: table.column("longitude")?,
            lat: table.column("latitude")?,
        })
    }

    fn read(&self, row: &[String]) -> RawTree {
        let f = |idx| Table::field(row, idx).to_string();
        RawTree {
            number: f(self.number),
            height: f(self.height),
            genus: f(self.genus),
            area: f(self.area),
            crown: f(self.crown),
            planted: f(self.planted),
            street: f(self.street),
            trunk: f(self.trunk),
            lon: f(self.lon),
            lat: f(self.lat),
        }
    }
}

pub fn load(edition: Edition, path: &Path) -> Result<Vec<TreeRecord>, LoadError> {
    let table = read_table(path)?;
    let trees = load_table(edition, &table)?;
    debug!(%edition, path = %path.display(), rows = table.rows.len(), trees = trees.len(), "loaded magdeburg export");
    Ok(trees)
}

pub fn load_table(edition: Edition, table: &Table) -> Result<Vec<TreeRecord>, LoadError> {
    let columns = Columns::resolve(table, edition)?;
    let raw: Vec<RawTree> = table.rows.iter().map(|row| columns.read(row)).collect();

    let valid = filter_invalid(edition, raw);
    Ok(valid
        .into_iter()
        .map(|tree| fix(edition, tree))
        .filter_map(transform)
        .collect())
}

fn identity(tree: &RawTree) -> String {
    format!("{}{}", tree.area, tree.number)
}

fn filter_invalid(edition: Edition, trees: Vec<RawTree>) -> Vec<RawTree> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tree in &trees {
        *counts.entry(identity(tree)).or_default() += 1;
    }
    for (id, count) in counts.iter().filter(|(_, c)| **c > 1) {
        warn!(tree = %id, count, "dropping trees with ambiguous number");
    }

    trees
        .into_iter()
        .filter(|tree| {
            tree.number.chars().count() >= 3
                && tree.street != TEST_AREA
                && !(edition == Edition::Y2023 && tree.genus == EMPTY_SLOT)
                && counts.get(&identity(tree)) == Some(&1)
        })
        .collect()
}

struct FixedTree {
    raw: RawTree,
    genus: Option<String>,
    dbh: Option<f64>,
    planted: Option<i32>,
}

fn fix(edition: Edition, mut tree: RawTree) -> FixedTree {
    tree.street = fix_street(&tree.street);
    let genus = fix_genus(edition, &tree.genus);
    let planted = parse_integer(&tree.planted)
        .filter(|year| *year >= MIN_PLANTING_YEAR)
        .and_then(|year| i32::try_from(year).ok());
    let dbh = edition.dbh(&tree.trunk);
    FixedTree {
        raw: tree,
        genus,
        dbh,
        planted,
    }
}

fn fix_street(street: &str) -> String {
    IGNORED_ADDRESS_WORDS
        .iter()
        .fold(street.to_string(), |acc, word| acc.replacen(word, "", 1).trim().to_string())
}

fn fix_genus(edition: Edition, genus: &str) -> Option<String> {
    match edition
        .genus_corrections()
        .iter()
        .find(|(from, _)| *from == genus)
    {
        Some((_, to)) => to.map(str::to_string),
        None if genus.trim().is_empty() => None,
        None => Some(genus.to_string()),
    }
}

fn area_prefix(area: &str) -> Option<char> {
    match area {
        "Öffentliches Grün" => Some('G'),
        "AMT 66" => Some('S'),
        "Spielplatz" => Some('K'),
        "Liegenschaftsservice" => Some('L'),
        _ => None,
    }
}

/// Coordinate text with a decimal point, `None` when not a number.
fn coordinate(text: &str) -> Option<String> {
    let text = text.trim().replacen(',', ".", 1);
    text.parse::<f64>().ok().filter(|v| v.is_finite()).map(|_| text)
}

fn transform(tree: FixedTree) -> Option<TreeRecord> {
    let FixedTree {
        raw,
        genus,
        dbh,
        planted,
    } = tree;

    let Some(prefix) = area_prefix(&raw.area) else {
        warn!(number = %raw.number, area = %raw.area, "cannot build tree reference, skipping");
        return None;
    };
    let reference = format!("{prefix}{}", raw.number);

    let (Some(lat), Some(lon)) = (coordinate(&raw.lat), coordinate(&raw.lon)) else {
        warn!(tree = %reference, "missing or invalid coordinates, skipping");
        return None;
    };

    let class = classify(genus.as_deref());
    let address = Some(raw.street).filter(|s| !s.is_empty());

    Some(TreeRecord {
        internal_ref: TreeId::generate(),
        reference,
        location: Some(raw.area),
        address,
        lat,
        lon,
        genus: class.genus,
        species: class.scientific,
        common: class.common,
        height: parse_decimal(&raw.height),
        // Crown width keeps only its leading number, no comma conversion: "4,5" → 4.
        crown: parse_leading_decimal(&raw.crown),
        dbh,
        planted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_table;
    use std::fs;
    use tempfile::tempdir;

    const HEADER_2023: &str =
        "fid;Baumnummer;Hoehe;Gattung;gebiet;Kronendurchm;pflanzjahr;strasse;Stammumfang;longitude;latitude";

    fn export_2023(rows: &[&str]) -> Table {
        let mut text = String::from(HEADER_2023);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        parse_table(&text).unwrap()
    }

    #[test]
    fn builds_reference_and_measurements() {
        let table = export_2023(&[
            "1;1001;12,5;\"Tilia cordata, Winter-Linde\";Öffentliches Grün;8;1985;Breiter Weg/SP;157;11.6276;52.1205",
        ]);
        let trees = load_table(Edition::Y2023, &table).unwrap();
        assert_eq!(trees.len(), 1);
        let t = &trees[0];
        assert_eq!(t.reference, "G1001");
        assert_eq!(t.location.as_deref(), Some("Öffentliches Grün"));
        assert_eq!(t.address.as_deref(), Some("Breiter Weg"));
        assert_eq!(t.lat, "52.1205");
        assert_eq!(t.lon, "11.6276");
        assert_eq!(t.genus.as_deref(), Some("Tilia"));
        assert_eq!(t.species.as_deref(), Some("Tilia cordata"));
        assert_eq!(t.common.as_deref(), Some("Winter-Linde"));
        assert_eq!(t.height, Some(12.5));
        assert_eq!(t.crown, Some(8.0));
        assert!((t.dbh.unwrap() - 157.0 / PI).abs() < 1e-9);
        assert_eq!(t.planted, Some(1985));
    }

    #[test]
    fn crown_takes_leading_number_only() {
        let table = export_2023(&[
            "1;1001;12,5;Acer;AMT 66;4,5;1985;A;157;11.6;52.1",
            "2;1002;12,5;Acer;AMT 66;4.5;1985;A;157;11.6;52.1",
        ]);
        let crowns: Vec<Option<f64>> = load_table(Edition::Y2023, &table)
            .unwrap()
            .iter()
            .map(|t| t.crown)
            .collect();
        assert_eq!(crowns, vec![Some(4.0), Some(4.5)]);
    }

    #[test]
    fn area_prefixes() {
        let table = export_2023(&[
            "1;101;1;Acer;AMT 66;1;2000;A;1;11.1;52.1",
            "2;102;1;Acer;Spielplatz;1;2000;A;1;11.1;52.1",
            "3;103;1;Acer;Liegenschaftsservice;1;2000;A;1;11.1;52.1",
            "4;104;1;Acer;Friedhof;1;2000;A;1;11.1;52.1",
        ]);
        let refs: Vec<String> = load_table(Edition::Y2023, &table)
            .unwrap()
            .into_iter()
            .map(|t| t.reference)
            .collect();
        assert_eq!(refs, vec!["S101", "K102", "L103"]);
    }

    #[test]
    fn invalid_rows_are_filtered() {
        let table = export_2023(&[
            "1;12;1;Acer;AMT 66;1;2000;A;1;11.1;52.1",
            "2;200;1;Acer;AMT 66;1;2000;Testgebiet;1;11.1;52.1",
            "3;201;1;Leerstelle;AMT 66;1;2000;A;1;11.1;52.1",
            "4;202;1;Acer;AMT 66;1;2000;A;1;11.1;52.1",
            "5;202;1;Acer;AMT 66;1;2000;B;1;11.1;52.1",
            "6;202;1;Acer;Spielplatz;1;2000;B;1;11.1;52.1",
        ]);
        let refs: Vec<String> = load_table(Edition::Y2023, &table)
            .unwrap()
            .into_iter()
            .map(|t| t.reference)
            .collect();
        // Both S202 rows are dropped, K202 is a different identity.
        assert_eq!(refs, vec!["K202"]);
    }

    #[test]
    fn fixes_genus_street_and_year() {
        let table = export_2023(&[
            "1;301;1;Ostrya carpinifolia - Hopfenbuche;AMT 66;1;1500;Bäume - Liegenschaftsservice Hauptstraße;1;11.1;52.1",
            "2;302;1;unbekannt;AMT 66;1;;Am Park/KGA;1;11.1;52.1",
        ]);
        let trees = load_table(Edition::Y2023, &table).unwrap();
        assert_eq!(trees[0].genus.as_deref(), Some("Ostrya"));
        assert_eq!(trees[0].common.as_deref(), Some("Hopfenbuche"));
        assert_eq!(trees[0].address.as_deref(), Some("Hauptstraße"));
        assert_eq!(trees[0].planted, None);
        assert_eq!(trees[1].genus, None);
        assert_eq!(trees[1].species, None);
        assert_eq!(trees[1].address.as_deref(), Some("Am Park"));
        assert_eq!(trees[1].planted, None);
    }

    #[test]
    fn edition_2022_reads_diameter() {
        let text = "Baumnummer,Hoehe,Gattung,gebiet,Kronendurchm,pflanzjahr,strasse,Stammdurchm,longitude,latitude\n\
                    501,9,\"Tilia europaea \"\"Pallida\"\"; Kaiser-Linde\",Spielplatz,6,1960,Ring,40,11.6,52.1\n";
        let trees = load_table(Edition::Y2022, &parse_table(text).unwrap()).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].dbh, Some(40.0));
        assert_eq!(trees[0].genus.as_deref(), Some("Tilia"));
        assert_eq!(trees[0].species.as_deref(), Some("Tilia europaea \"Pallida\""));
        assert_eq!(trees[0].common.as_deref(), Some("Kaiser-Linde"));
    }

    #[test]
    fn missing_trunk_column_is_an_error() {
        let table = export_2023(&[]);
        let err = load_table(Edition::Y2022, &table).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "Stammdurchm"));
    }

    #[test]
    fn unknown_edition() {
        let err = "2024".parse::<Edition>().unwrap_err();
        assert_eq!(err.to_string(), "unknown magdeburg edition '2024'");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2023.csv");
        fs::write(
            &path,
            format!("{HEADER_2023}\n\n1;1001;10;Acer;AMT 66;5;2001;Weg;100;11.6;52.1\n\n"),
        )
        .unwrap();
        let trees = load(Edition::Y2023, &path).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].reference, "S1001");
    }
}
