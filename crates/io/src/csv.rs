// CSV reading shared by the loaders

use std::io::Read;
use std::path::Path;

use crate::error::LoadError;

/// A header row plus data rows, all as text.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build from raw rows, first row is the header. Rows whose fields are
    /// all empty are dropped.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let headers = rows.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
        rows.retain(|row| row.iter().any(|field| !field.trim().is_empty()));
        Self { headers, rows }
    }

    /// Index of a required column.
    pub fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    }

    /// Field of `row` at `idx`, empty when the row is short.
    pub fn field<'a>(row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }
}

pub fn read_table(path: &Path) -> Result<Table, LoadError> {
    let content = read_file_as_utf8(path)?;
    parse_table(&content)
}

/// Parse CSV text with a sniffed delimiter.
pub fn parse_table(content: &str) -> Result<Table, LoadError> {
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(Table::from_rows(rows))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (municipal exports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.trim_start_matches('\u{feff}').to_string()),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Parse a decimal that may use a comma as separator. Empty → `None`.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.replacen(',', ".", 1).parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Leading decimal number of a field, dot separator only: `"4,5"` → 4,
/// `"12 m"` → 12. Nothing numeric at the start → `None`.
pub fn parse_leading_decimal(value: &str) -> Option<f64> {
    let value = value.trim_start();
    let bytes = value.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    value[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer part of a decimal field. Empty or unparseable → `None`.
pub fn parse_integer(value: &str) -> Option<i64> {
    parse_decimal(value).map(|v| v.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn leading_decimal_stops_at_first_non_numeric() {
        assert_eq!(parse_leading_decimal("4.5"), Some(4.5));
        assert_eq!(parse_leading_decimal("4,5"), Some(4.0));
        assert_eq!(parse_leading_decimal(" 12 m"), Some(12.0));
        assert_eq!(parse_leading_decimal("-3."), Some(-3.0));
        assert_eq!(parse_leading_decimal(".5"), Some(0.5));
        assert_eq!(parse_leading_decimal(""), None);
        assert_eq!(parse_leading_decimal("ca. 4"), None);
        assert_eq!(parse_leading_decimal("."), None);
    }

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Baumnummer;Hoehe;Gattung\n1001;\"12,5\";\"Tilia cordata, Winter-Linde\"\n1002;8;\"Acer campestre, Feld-Ahorn\"\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_table_skips_empty_lines() {
        let table = parse_table("a,b\n1,2\n,\n3,4\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column("b").unwrap(), 1);
        assert!(matches!(table.column("c"), Err(LoadError::MissingColumn(c)) if c == "c"));
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let table = parse_table("a,b,c\n1,2\n").unwrap();
        assert_eq!(Table::field(&table.rows[0], 2), "");
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cp1252.csv");
        // "Straße" with ß encoded as 0xDF
        fs::write(&path, b"strasse\nStra\xdfe\n").unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0][0], "Straße");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_table(Path::new("/nonexistent/trees.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal(" 7.25 "), Some(7.25));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
        assert_eq!(parse_integer("63,7"), Some(63));
    }
}
