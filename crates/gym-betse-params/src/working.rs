//! Per-episode working copies of a configuration template.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tempfile::{Builder, TempPath};

use crate::document::{GRN_CONFIG_KEY, GRN_SETTINGS_KEY, grn_reference, resolve_reference};
use crate::error::ParamError;
use crate::mutate::update_document;
use crate::tree::{read_tree, write_tree};

const WORKING_PREFIX: &str = "episode-";
const WORKING_SUFFIX: &str = ".yaml";

/// A temporary copy of a template that one episode may freely mutate.
///
/// The copy lives beside the template so relative references inside it keep
/// resolving. A referenced GRN document is copied too, so mutations never
/// reach files shared with other episodes. Both files are deleted on drop.
#[derive(Debug)]
pub struct WorkingDocument {
    template: PathBuf,
    path: TempPath,
    grn: Option<TempPath>,
}

impl WorkingDocument {
    pub fn acquire(template: impl AsRef<Path>) -> Result<Self, ParamError> {
        let template = template.as_ref();
        let mut tree = read_tree(template)?;

        let grn = match grn_reference(&tree) {
            Some(reference) => {
                let source = resolve_reference(template, &reference);
                match read_tree(&source) {
                    Ok(grn_tree) => {
                        let copy = temp_beside(&source)?;
                        write_tree(&copy, &grn_tree)?;
                        let absolute = std::path::absolute(&copy)
                            .map_err(|e| ParamError::persist(copy.to_path_buf(), e))?;
                        set_grn_reference(&mut tree, &absolute);
                        Some(copy)
                    }
                    Err(e) => {
                        log::warn!("Working copy of {} has no GRN document: {e}", template.display());
                        None
                    }
                }
            }
            None => None,
        };

        let path = temp_beside(template)?;
        write_tree(&path, &tree)?;
        log::debug!(
            "Acquired working copy {} of {}",
            path.display(),
            template.display()
        );

        Ok(Self {
            template: template.to_path_buf(),
            path,
            grn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Write `values` at `keys` in the working copy.
    pub fn apply<K: AsRef<str>>(&self, keys: &[K], values: &[Value]) -> Result<(), ParamError> {
        update_document(&self.path, keys, values, None).map(|_| ())
    }

    /// Delete the working files now, reporting failures.
    pub fn release(self) -> Result<(), ParamError> {
        let path = self.path.to_path_buf();
        self.path.close().map_err(|e| ParamError::persist(path, e))?;
        if let Some(grn) = self.grn {
            let path = grn.to_path_buf();
            grn.close().map_err(|e| ParamError::persist(path, e))?;
        }
        Ok(())
    }
}

fn temp_beside(file: &Path) -> Result<TempPath, ParamError> {
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Builder::new()
        .prefix(WORKING_PREFIX)
        .suffix(WORKING_SUFFIX)
        .tempfile_in(dir)
        .map(|file| file.into_temp_path())
        .map_err(|e| ParamError::persist(dir, e))
}

fn set_grn_reference(tree: &mut Value, reference: &Path) {
    if let Some(settings) = tree
        .get_mut(GRN_SETTINGS_KEY)
        .and_then(Value::as_mapping_mut)
    {
        settings.insert(
            Value::from(GRN_CONFIG_KEY),
            Value::from(reference.to_string_lossy().into_owned()),
        );
    }
}
