//! Row-aligned parameter tables.
//!
//! Columns are keyed by flattened keys and hold one optional value per
//! document. Columns may appear at any row; a new column is backfilled with
//! `None` for the rows before it, and every column is padded to the row count
//! when a row is finished.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::TableError;
use crate::key::scalar_text;
use crate::path::Field;

/// Default location of the assembled dataset, relative to the working directory.
pub const DEFAULT_TABLE_PATH: &str = "Physiology/params_initial_values.csv";

#[derive(Clone, Debug, PartialEq)]
struct Column {
    key: String,
    cells: Vec<Option<Value>>,
}

/// A columnar table of parameter values, one row per document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamTable {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

/// Values gathered for one document before they are appended to a table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Option<Value>)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cell. Recording the same key twice keeps the last value.
    pub fn record(&mut self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(cell) => {
                log::debug!("Key '{key}' recorded twice for one row, keeping the last value");
                cell.1 = value;
            }
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Option<Value>> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table whose columns are declared up front, in order.
    pub fn with_columns<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for key in keys {
            table.ensure_column(key.into());
        }
        table
    }

    /// Column position for `key`, adding a backfilled column if needed.
    pub fn ensure_column(&mut self, key: String) -> usize {
        if let Some(&position) = self.index.get(&key) {
            return position;
        }
        let position = self.columns.len();
        self.index.insert(key.clone(), position);
        self.columns.push(Column {
            key,
            cells: vec![None; self.rows],
        });
        position
    }

    /// Append one row and realign every column to the new row count.
    pub fn push_row(&mut self, row: Row) {
        for (key, value) in row.cells {
            let position = self.ensure_column(key);
            self.columns[position].cells.push(value);
        }
        self.rows += 1;
        self.backfill();
    }

    /// Pad every column that is shorter than the row count with `None`.
    fn backfill(&mut self) {
        let rows = self.rows;
        for column in &mut self.columns {
            if column.cells.len() < rows {
                column.cells.resize(rows, None);
            }
        }
    }

    /// Drop columns holding no value at all, and the empty-named column.
    pub fn finish(mut self) -> Self {
        self.columns
            .retain(|c| !c.key.is_empty() && c.cells.iter().any(Option::is_some));
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn column(&self, key: &str) -> Option<&[Option<Value>]> {
        self.index
            .get(key)
            .map(|&position| self.columns[position].cells.as_slice())
    }

    pub fn get(&self, key: &str, row: usize) -> Option<&Value> {
        self.column(key)?.get(row)?.as_ref()
    }

    /// Write the table as CSV with a leading unnamed row-number column.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        let header = std::iter::once("").chain(self.keys());
        writer.write_record(header)?;

        for row in 0..self.rows {
            let mut record = vec![row.to_string()];
            for column in &self.columns {
                record.push(render_cell(column.cells[row].as_ref())?);
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a table written by [`ParamTable::write_csv`].
    ///
    /// Numbers and booleans come back typed, every other cell is kept as
    /// text; empty cells are `None`.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())?;
        let headers = reader.headers()?.clone();
        let skip_index = headers.get(0).is_some_and(str::is_empty);
        let keys: Vec<&str> = headers.iter().skip(usize::from(skip_index)).collect();

        let mut table = ParamTable::with_columns(keys.iter().copied());
        for record in reader.records() {
            let record = record?;
            let mut row = Row::new();
            for (key, cell) in keys.iter().zip(record.iter().skip(usize::from(skip_index))) {
                row.record(*key, parse_cell(cell));
            }
            table.push_row(row);
        }
        Ok(table)
    }

    /// Write the retained column keys, one per line.
    ///
    /// The output doubles as a path list for later extractions.
    pub fn write_column_list(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let mut contents = String::new();
        for key in self.keys() {
            contents.push_str(key);
            contents.push('\n');
        }
        fs::write(path, contents)?;
        Ok(())
    }
}

/// First-row value of each requested column, in request order.
pub fn gather_initial_values(
    values_csv: impl AsRef<Path>,
    fields: &[Field],
) -> Result<Vec<Value>, TableError> {
    let values_csv = values_csv.as_ref();
    let table = ParamTable::read_csv(values_csv)?;
    if table.is_empty() {
        return Err(TableError::EmptyTable(values_csv.to_path_buf()));
    }

    fields
        .iter()
        .map(|field| {
            let column = table
                .column(field.key())
                .ok_or_else(|| TableError::MissingColumn(field.key().to_string()))?;
            Ok(column[0].clone().unwrap_or(Value::Null))
        })
        .collect()
}

fn render_cell(value: Option<&Value>) -> Result<String, TableError> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(v @ (Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_))) => {
            serde_json::to_string(v)?
        }
        Some(scalar) => scalar_text(scalar),
    })
}

fn parse_cell(cell: &str) -> Option<Value> {
    if cell.is_empty() {
        return None;
    }
    match serde_yaml::from_str::<Value>(cell) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => Some(value),
        _ => Some(Value::String(cell.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(cells: &[(&str, Option<Value>)]) -> Row {
        let mut row = Row::new();
        for (k, v) in cells {
            row.record(*k, v.clone());
        }
        row
    }

    #[test]
    fn late_column_is_backfilled() {
        let mut table = ParamTable::with_columns(["k1"]);
        table.push_row(row(&[("k1", Some(Value::from(1)))]));
        table.push_row(row(&[
            ("k1", Some(Value::from(2))),
            ("k2", Some(Value::from(3))),
        ]));

        assert_eq!(table.rows(), 2);
        assert_eq!(table.column("k1").unwrap().len(), 2);
        assert_eq!(table.column("k2").unwrap(), &[None, Some(Value::from(3))]);
    }

    #[test]
    fn missing_cells_are_padded_each_row() {
        let mut table = ParamTable::with_columns(["a", "b"]);
        table.push_row(row(&[("a", Some(Value::from(1)))]));
        table.push_row(row(&[("b", Some(Value::from(2)))]));
        table.push_row(Row::new());

        for key in ["a", "b"] {
            assert_eq!(table.column(key).unwrap().len(), 3);
        }
        assert_eq!(table.get("a", 0), Some(&Value::from(1)));
        assert_eq!(table.get("a", 1), None);
    }

    #[test]
    fn finish_drops_empty_and_unnamed_columns() {
        let mut table = ParamTable::with_columns(["kept", "never", ""]);
        table.push_row(row(&[
            ("kept", Some(Value::from(1))),
            ("", Some(Value::from(2))),
        ]));
        let table = table.finish();

        assert_eq!(table.keys().collect::<Vec<_>>(), ["kept"]);
        assert!(table.column("never").is_none());
        assert_eq!(table.get("kept", 0), Some(&Value::from(1)));
    }

    #[test]
    fn duplicate_key_in_row_keeps_last_value() {
        let mut table = ParamTable::new();
        table.push_row(row(&[
            ("a", Some(Value::from(1))),
            ("a", Some(Value::from(2))),
        ]));
        assert_eq!(table.column("a").unwrap(), &[Some(Value::from(2))]);
    }

    #[test]
    fn csv_round_trip_keeps_types_and_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("params.csv");

        let mut table = ParamTable::with_columns(["ID", "config/a/b"]);
        table.push_row(row(&[
            ("ID", Some(Value::from("sample_1"))),
            ("config/a/b", Some(Value::from(1.5e-18))),
        ]));
        table.push_row(row(&[
            ("ID", Some(Value::from("sample_2"))),
            ("flag", Some(Value::from(true))),
        ]));
        table.write_csv(&path).unwrap();

        let read = ParamTable::read_csv(&path).unwrap();
        assert_eq!(read.keys().collect::<Vec<_>>(), ["ID", "config/a/b", "flag"]);
        assert_eq!(read.rows(), 2);
        assert_eq!(read.get("ID", 1), Some(&Value::from("sample_2")));
        assert_eq!(read.get("config/a/b", 0), Some(&Value::from(1.5e-18)));
        assert_eq!(read.get("config/a/b", 1), None);
        assert_eq!(read.get("flag", 1), Some(&Value::from(true)));
    }

    #[test]
    fn yaml_like_strings_stay_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.csv");
        let cells = [
            ("label", "mode: fast"),
            ("list", "- item"),
            ("flow", "[1, 2]"),
            ("word", "null"),
            ("ion", "K_env"),
        ];

        let mut record = Row::new();
        for (key, text) in cells {
            record.record(key, Some(Value::from(text)));
        }
        let mut table = ParamTable::new();
        table.push_row(record);
        table.write_csv(&path).unwrap();

        let read = ParamTable::read_csv(&path).unwrap();
        for (key, text) in cells {
            assert_eq!(read.get(key, 0), Some(&Value::from(text)), "column {key}");
        }
    }

    #[test]
    fn initial_values_follow_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.csv");
        fs::write(&path, ",config/a,grn/z\n0,0.5,-1\n1,0.7,2\n").unwrap();

        let fields = [
            Field::from_str("grn/z").unwrap(),
            Field::from_str("config/a").unwrap(),
        ];
        let values = gather_initial_values(&path, &fields).unwrap();
        assert_eq!(values, vec![Value::from(-1), Value::from(0.5)]);
    }

    #[test]
    fn initial_values_report_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.csv");
        fs::write(&path, ",config/a\n0,0.5\n").unwrap();

        let fields = [Field::from_str("config/b").unwrap()];
        let err = gather_initial_values(&path, &fields).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(ref k) if k == "config/b"));
    }

    #[test]
    fn column_list_lists_retained_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        let mut table = ParamTable::with_columns(["a", "b"]);
        table.push_row(row(&[("b", Some(Value::from(1)))]));
        table.finish().write_column_list(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b\n");
    }
}
