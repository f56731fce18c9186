use std::fs;
use std::io::Write;
use std::path::Path;

use serde_yaml::Value;
use tempfile::NamedTempFile;

use crate::error::{ParamError, invalid_data};

/// A parsed configuration document: mappings, sequences and scalars.
pub type ConfigTree = Value;

/// Short name of a node's type, used in error messages.
pub fn node_kind(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// Read and parse a YAML document. An empty file yields an empty mapping.
pub fn read_tree(path: &Path) -> Result<ConfigTree, ParamError> {
    let contents = fs::read_to_string(path).map_err(|e| ParamError::load(path, e))?;
    let tree: Value =
        serde_yaml::from_str(&contents).map_err(|e| ParamError::load(path, invalid_data(e)))?;
    Ok(match tree {
        Value::Null => Value::Mapping(Default::default()),
        tree => tree,
    })
}

/// Serialize a tree and write it atomically, creating parent directories.
pub fn write_tree(path: &Path, tree: &ConfigTree) -> Result<(), ParamError> {
    let contents = serialize_tree(path, tree)?;
    write_document(path, &contents)
}

/// YAML text of `tree`; `path` only names the destination in errors.
pub fn serialize_tree(path: &Path, tree: &ConfigTree) -> Result<String, ParamError> {
    serde_yaml::to_string(tree).map_err(|e| ParamError::persist(path, invalid_data(e)))
}

/// Replace `path` with `contents` through a temporary file in the same
/// directory, so readers see either the old or the new document.
pub fn write_document(path: &Path, contents: &str) -> Result<(), ParamError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| ParamError::persist(path, e))?;

    let mut file = NamedTempFile::new_in(parent).map_err(|e| ParamError::persist(path, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| ParamError::persist(path, e))?;
    file.persist(path)
        .map(|_| ())
        .map_err(|e| ParamError::persist(path, e.error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_reads_as_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        fs::write(&path, "").unwrap();
        assert!(read_tree(&path).unwrap().is_mapping());
    }

    #[test]
    fn invalid_yaml_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "a: [1, 2\nb: }").unwrap();
        assert!(matches!(
            read_tree(&path),
            Err(ParamError::DocumentLoad { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_tree(&dir.path().join("absent.yaml")),
            Err(ParamError::DocumentLoad { .. })
        ));
    }

    #[test]
    fn write_then_read_keeps_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.yaml");
        let tree: Value = serde_yaml::from_str("a: {b: 5}\nlist: [1, two]").unwrap();
        write_tree(&path, &tree).unwrap();
        assert_eq!(read_tree(&path).unwrap(), tree);
    }
}
