//! CSV-backed row store.
//!
//! One worksheet maps to one `<root>/<sheet>.csv` file. Rows are 1-based with
//! row 1 as the header, matching the upstream sheet layout, so a record at
//! "row 7" in the log is row 7 in the file. Files are rewritten whole on
//! `write_row`; appends stream onto the end.

use janseva_core::{Error, Result, RowStore};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn store_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Store(format!("{}: {e}", path.display()))
}

pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.root.join(format!("{sheet}.csv"))
    }

    fn load(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let path = self.sheet_path(sheet);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| store_err(&path, e))?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| store_err(&path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn save(&self, sheet: &str, rows: &[Vec<String>]) -> Result<()> {
        let path = self.sheet_path(sheet);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| store_err(&path, e))?;
        }
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| store_err(&path, e))?;
        for row in rows {
            writer.write_record(row).map_err(|e| store_err(&path, e))?;
        }
        writer.flush().map_err(|e| store_err(&path, e))
    }
}

impl RowStore for CsvStore {
    fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>> {
        Ok(self
            .load(sheet)?
            .into_iter()
            .map(|row| row.get(column).cloned().unwrap_or_default())
            .collect())
    }

    fn write_row(&mut self, sheet: &str, row: usize, fields: &[String]) -> Result<()> {
        if row == 0 {
            return Err(Error::Store(format!("rows are 1-based, got 0 for {sheet}")));
        }
        let mut rows = self.load(sheet)?;
        // Grow with same-width rows of empty cells; a zero-field row would
        // serialize as a blank line, which csv readers silently drop.
        while rows.len() < row {
            rows.push(vec![String::new(); fields.len()]);
        }
        rows[row - 1] = fields.to_vec();
        self.save(sheet, &rows)
    }

    fn append_row(&mut self, sheet: &str, fields: &[String]) -> Result<()> {
        let mut rows = self.load(sheet)?;
        rows.push(fields.to_vec());
        self.save(sheet, &rows)
    }

    fn read_existing(&self, sheet: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .load(sheet)?
            .into_iter()
            .skip(1) // header
            .filter_map(|row| row.into_iter().next())
            .filter(|id| !id.trim().is_empty())
            .collect())
    }
}

/// In-memory store for tests that exercise batch plumbing.
#[cfg(test)]
pub struct MemStore {
    pub sheets: std::collections::BTreeMap<String, Vec<Vec<String>>>,
}

#[cfg(test)]
impl MemStore {
    pub fn new() -> Self {
        Self {
            sheets: std::collections::BTreeMap::new(),
        }
    }
}

#[cfg(test)]
impl RowStore for MemStore {
    fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>> {
        Ok(self
            .sheets
            .get(sheet)
            .map(|rows| {
                rows.iter()
                    .map(|row| row.get(column).cloned().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn write_row(&mut self, sheet: &str, row: usize, fields: &[String]) -> Result<()> {
        let rows = self.sheets.entry(sheet.to_string()).or_default();
        while rows.len() < row {
            rows.push(Vec::new());
        }
        rows[row - 1] = fields.to_vec();
        Ok(())
    }

    fn append_row(&mut self, sheet: &str, fields: &[String]) -> Result<()> {
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .push(fields.to_vec());
        Ok(())
    }

    fn read_existing(&self, sheet: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .sheets
            .get(sheet)
            .map(|rows| {
                rows.iter()
                    .skip(1)
                    .filter_map(|row| row.first().cloned())
                    .filter(|id| !id.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn append_then_read_column_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());

        store.append_row("cards", &strings(&["Id", "Status"])).unwrap();
        store.append_row("cards", &strings(&["RC-1", "Printed"])).unwrap();
        store.append_row("cards", &strings(&["RC-2", "N/A"])).unwrap();

        assert_eq!(
            store.read_column("cards", 0).unwrap(),
            vec!["Id", "RC-1", "RC-2"]
        );
        assert_eq!(
            store.read_column("cards", 1).unwrap(),
            vec!["Status", "Printed", "N/A"]
        );
    }

    #[test]
    fn write_row_grows_the_sheet_and_is_1_based() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());

        store.write_row("cards", 1, &strings(&["Id", "Status"])).unwrap();
        store.write_row("cards", 4, &strings(&["RC-9", "Printed"])).unwrap();

        let col = store.read_column("cards", 0).unwrap();
        assert_eq!(col, vec!["Id", "", "", "RC-9"]);
        assert!(matches!(
            store.write_row("cards", 0, &strings(&["x"])),
            Err(Error::Store(_))
        ));
    }

    #[test]
    fn read_existing_skips_the_header_and_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());

        store.append_row("cards", &strings(&["Id", "Status"])).unwrap();
        store.append_row("cards", &strings(&["RC-1", "Printed"])).unwrap();
        store.append_row("cards", &strings(&["", "stray"])).unwrap();
        store.append_row("cards", &strings(&["RC-2", "N/A"])).unwrap();

        let existing = store.read_existing("cards").unwrap();
        assert_eq!(
            existing.into_iter().collect::<Vec<_>>(),
            vec!["RC-1", "RC-2"]
        );
    }

    #[test]
    fn missing_sheet_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        assert!(store.read_column("nope", 0).unwrap().is_empty());
        assert!(store.read_existing("nope").unwrap().is_empty());
    }

    #[test]
    fn fields_with_commas_and_devanagari_survive_the_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());

        store
            .append_row("cards", &strings(&["RC-1", "कार्यालय, जयपुर"]))
            .unwrap();
        assert_eq!(
            store.read_column("cards", 1).unwrap(),
            vec!["कार्यालय, जयपुर"]
        );
    }
}
