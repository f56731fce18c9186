//! Building a parameter table from a directory of sample configurations.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::document::ConfigDocument;
use crate::error::ParamError;
use crate::extract::extract_path;
use crate::path::Field;
use crate::table::{ParamTable, Row};

/// Directory name whose subtrees hold auxiliary documents, not samples.
pub const EXTRA_CONFIGS: &str = "extra_configs";
/// Extension of the documents considered during a walk.
pub const DOCUMENT_EXTENSION: &str = "yaml";

/// Settings for a directory walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Subtrees with a path component equal to this are skipped.
    #[serde(rename = "extra_configs")]
    pub extra_configs_marker: String,
    /// Only files with this extension are read.
    pub extension: String,
    /// Extract documents on the rayon pool; rows are merged in walk order either way.
    pub parallel: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            extra_configs_marker: EXTRA_CONFIGS.to_string(),
            extension: DOCUMENT_EXTENSION.to_string(),
            parallel: true,
        }
    }
}

impl AssemblerConfig {
    pub fn with_extra_configs_marker(mut self, marker: impl Into<String>) -> Self {
        self.extra_configs_marker = marker.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Walks a corpus of sample directories and tabulates the requested fields.
pub struct DatasetAssembler {
    config: AssemblerConfig,
}

impl Default for DatasetAssembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

impl DatasetAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Candidate documents under `root`, depth first, in file-name order.
    pub fn documents(&self, root: &Path) -> Vec<PathBuf> {
        let marker = self.config.extra_configs_marker.as_str();
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir() && entry.file_name() == marker)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == self.config.extension.as_str())
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Extract `fields` from every document under `root` into a table.
    ///
    /// Documents that cannot be read or traversed are skipped with a
    /// warning. Columns that never received a value are dropped.
    pub fn assemble(&self, root: impl AsRef<Path>, fields: &[Field]) -> ParamTable {
        let root = root.as_ref();
        let documents = self.documents(root);
        log::info!(
            "Extracting {} fields from {} documents under {}",
            fields.len(),
            documents.len(),
            root.display()
        );

        let rows: Vec<Result<Row, ParamError>> = if self.config.parallel {
            documents
                .par_iter()
                .map(|path| extract_row(path, fields))
                .collect()
        } else {
            documents
                .iter()
                .map(|path| extract_row(path, fields))
                .collect()
        };

        let mut table = ParamTable::with_columns(fields.iter().map(Field::key));
        for (path, row) in documents.iter().zip(rows) {
            match row {
                Ok(row) => table.push_row(row),
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }

        let table = table.finish();
        log::info!(
            "Assembled {} rows with {} columns",
            table.rows(),
            table.keys().count()
        );
        table
    }
}

/// Load one document and gather its row.
pub fn extract_row(path: &Path, fields: &[Field]) -> Result<Row, ParamError> {
    let document = ConfigDocument::load(path)?;
    document_row(&document, fields)
}

/// Gather the row for an already loaded document.
pub fn document_row(document: &ConfigDocument, fields: &[Field]) -> Result<Row, ParamError> {
    let mut row = Row::new();
    for field in fields {
        match field {
            Field::SampleId => {
                row.record(field.key(), document.sample_id().map(Into::into));
            }
            Field::Path(path) => match extract_path(document, path)? {
                Some(extracted) => {
                    for (key, value) in extracted {
                        row.record(key.flatten(), Some(value));
                    }
                }
                None => row.record(field.key(), None),
            },
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path_list;
    use serde_yaml::Value;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sequential() -> DatasetAssembler {
        DatasetAssembler::new(AssemblerConfig::default().with_parallel(false))
    }

    #[test]
    fn later_keys_are_backfilled() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("s1/sim.yaml"), "items: [{v: 1}]\n");
        write(&dir.path().join("s2/sim.yaml"), "items: [{v: 2}, {v: 3}]\n");

        let fields = parse_path_list("config/items/v\n").unwrap();
        let table = sequential().assemble(dir.path(), &fields);

        assert_eq!(table.rows(), 2);
        assert_eq!(
            table.keys().collect::<Vec<_>>(),
            ["config/items/v_0", "config/items/v_1"]
        );
        assert_eq!(
            table.column("config/items/v_1").unwrap(),
            &[None, Some(Value::from(3))]
        );
    }

    #[test]
    fn sample_id_and_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cell_a/sim.yaml"),
            "gene regulatory network settings:\n  gene regulatory network config: extra_configs/grn.yaml\nvariable settings: {gap junctions: {gj minimum: 0.04}}\n",
        );
        write(
            &dir.path().join("cell_a/extra_configs/grn.yaml"),
            "biomolecules: [{name: Na, z: 1}, {name: K, z: 1}]\n",
        );
        write(
            &dir.path().join("cell_b/sim.yaml"),
            "variable settings: {gap junctions: {gj minimum: 0.2}}\n",
        );

        let fields = parse_path_list(
            "ID\nconfig/variable settings/gap junctions/gj minimum\ngrn/biomolecules/z\n",
        )
        .unwrap();
        let table = sequential().assemble(dir.path(), &fields);

        assert_eq!(table.rows(), 2);
        assert_eq!(table.get("ID", 0), Some(&Value::from("cell_a")));
        assert_eq!(table.get("ID", 1), Some(&Value::from("cell_b")));
        assert_eq!(
            table.get("config/variable settings/gap junctions/gj minimum", 1),
            Some(&Value::from(0.2))
        );
        assert_eq!(table.get("grn/biomolecules/z_Na", 0), Some(&Value::from(1)));
        assert_eq!(table.get("grn/biomolecules/z_Na", 1), None);
        assert!(table.column("grn/biomolecules/z").is_none());
    }

    #[test]
    fn extra_configs_and_other_extensions_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("s1/sim.yaml"), "a: 1\n");
        write(&dir.path().join("s1/extra_configs/grn.yaml"), "a: 2\n");
        write(&dir.path().join("s1/notes.txt"), "a: 3\n");
        write(&dir.path().join("s1/sim.yml"), "a: 4\n");

        let documents = sequential().documents(dir.path());
        assert_eq!(documents, vec![dir.path().join("s1/sim.yaml")]);
    }

    #[test]
    fn broken_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("s1/sim.yaml"), "a: 1\n");
        write(&dir.path().join("s2/sim.yaml"), "a: [1,\n");
        write(&dir.path().join("s3/sim.yaml"), "a: 3\n");

        let fields = parse_path_list("config/a").unwrap();
        let table = sequential().assemble(dir.path(), &fields);
        assert_eq!(
            table.column("config/a").unwrap(),
            &[Some(Value::from(1)), Some(Value::from(3))]
        );
    }

    #[test]
    fn every_column_has_one_cell_per_document() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("s1/sim.yaml"), "a: 1\nlist: [{name: p, v: 1}]\n");
        write(&dir.path().join("s2/sim.yaml"), "b: 2\n");
        write(
            &dir.path().join("s3/sim.yaml"),
            "a: 3\nlist: [{name: q, w: {v: 1}}, {name: r, w: {v: 2}}]\n",
        );

        let fields = parse_path_list("config/a\nconfig/b\nconfig/list/w/v\nconfig/missing").unwrap();
        let table = sequential().assemble(dir.path(), &fields);

        assert_eq!(table.rows(), 3);
        for key in table.keys() {
            let column = table.column(key).unwrap();
            assert_eq!(column.len(), 3, "column {key}");
            assert!(column.iter().any(Option::is_some), "column {key}");
        }
        assert!(table.column("config/missing").is_none());
        assert_eq!(table.get("config/list/w/v_r", 2), Some(&Value::from(2)));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..12 {
            let items = vec!["{v: 1}"; i % 3 + 1].join(", ");
            write(
                &dir.path().join(format!("s{i:02}/sim.yaml")),
                &format!("a: {i}\nitems: [{items}]\n"),
            );
        }
        let fields = parse_path_list("ID\nconfig/a\nconfig/items/v").unwrap();
        let parallel = DatasetAssembler::default().assemble(dir.path(), &fields);
        let sequential = sequential().assemble(dir.path(), &fields);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.rows(), 12);
    }
}
