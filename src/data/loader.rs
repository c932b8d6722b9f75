//! CSV input loading
//!
//! Reads the raw match table, normalizes header names and resolves columns.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::{Result, RugbyError};

/// Header aliases accepted from older exports: (alias, canonical name)
const COLUMN_ALIASES: &[(&str, &str)] = &[("competition", "tournament")];

/// A raw CSV table with normalized headers
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<StringRecord>,
    /// Records the CSV reader could not decode (e.g. invalid UTF-8)
    unreadable: usize,
}

impl RawTable {
    /// Read a table from any reader. Rows with a field count that does not match
    /// the header are kept; missing trailing fields read as empty. Records that
    /// cannot be decoded are skipped and counted; I/O errors still fail the read.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        let mut records = Vec::new();
        let mut unreadable = 0;
        for result in csv_reader.records() {
            match result {
                Ok(record) => records.push(record),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    log::debug!("Skipping unreadable record: {}", e);
                    unreadable += 1;
                }
            }
        }

        let mut table = Self::new(headers, records);
        table.unreadable = unreadable;
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            RugbyError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;
        let table = Self::from_reader(file)?;
        log::info!(
            "Loaded {} rows with {} columns from {}",
            table.len(),
            table.headers().len(),
            path.display()
        );
        Ok(table)
    }

    fn new(headers: Vec<String>, records: Vec<StringRecord>) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }

        for (alias, canonical) in COLUMN_ALIASES {
            if !index.contains_key(*canonical) {
                if let Some(&i) = index.get(*alias) {
                    log::debug!("Using column '{}' as '{}'", alias, canonical);
                    index.insert(canonical.to_string(), i);
                }
            }
        }

        RawTable {
            headers,
            index,
            records,
            unreadable: 0,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column positions for `required`, or a schema error naming every
    /// missing column
    pub fn require(&self, required: &[&str]) -> Result<ColumnMap> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(RugbyError::Schema { missing });
        }

        let positions = required
            .iter()
            .filter_map(|name| self.index.get(*name).map(|&i| (name.to_string(), i)))
            .collect();
        Ok(ColumnMap { positions })
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    /// Number of decoded records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn unreadable(&self) -> usize {
        self.unreadable
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolved positions of the columns a normalizer needs
#[derive(Debug, Clone)]
pub struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    /// Field value for a column; empty when the row is short
    pub fn get<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }
}

fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_normalized() {
        let csv = " Date ,TEAM,Opponent\n2019-09-20,Japan,Russia\n";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.headers(), &["date", "team", "opponent"]);
        assert!(table.has_column("team"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_competition_alias() {
        let csv = "date,competition\n2019-09-20,World Cup\n";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();
        let columns = table.require(&["date", "tournament"]).unwrap();
        assert_eq!(columns.get(&table.records()[0], "tournament"), "World Cup");
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let csv = "date,team\n2019-09-20,Japan\n";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();
        match table.require(&["date", "team", "opponent", "team_score"]) {
            Err(RugbyError::Schema { missing }) => {
                assert_eq!(missing, vec!["opponent", "team_score"]);
            }
            other => panic!("expected schema error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_undecodable_record_is_skipped() {
        let mut bytes = b"date,team,opponent\n2019-09-20,Japan,Russia\n".to_vec();
        bytes.extend_from_slice(b"2019-09-28,\xff\xfe,Ireland\n");
        bytes.extend_from_slice(b"2019-10-05,Japan,Samoa\n");

        let table = RawTable::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.unreadable(), 1);
        let columns = table.require(&["opponent"]).unwrap();
        assert_eq!(columns.get(&table.records()[1], "opponent"), "Samoa");
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let csv = "date,team,opponent\n2019-09-20,Japan\n";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();
        let columns = table.require(&["date", "team", "opponent"]).unwrap();
        assert_eq!(columns.get(&table.records()[0], "opponent"), "");
    }
}
