//! A primary configuration plus the gene regulatory network document it
//! may reference.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::ParamError;
use crate::path::RootSelector;
use crate::tree::{ConfigTree, read_tree, serialize_tree, write_document};

/// Mapping key in the primary document holding the GRN settings.
pub const GRN_SETTINGS_KEY: &str = "gene regulatory network settings";
/// Key under [`GRN_SETTINGS_KEY`] holding the GRN config (a path or inline tree).
pub const GRN_CONFIG_KEY: &str = "gene regulatory network config";

/// The secondary document loaded through the primary's GRN reference.
#[derive(Clone, Debug)]
pub struct SecondaryDocument {
    reference: String,
    path: PathBuf,
    tree: ConfigTree,
    dirty: bool,
}

impl SecondaryDocument {
    /// The reference text as written in the primary document.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }
}

/// A loaded configuration document.
#[derive(Clone, Debug)]
pub struct ConfigDocument {
    path: PathBuf,
    primary: ConfigTree,
    secondary: Option<SecondaryDocument>,
}

impl ConfigDocument {
    /// Load the primary document and, if it references one, the GRN document.
    ///
    /// Failing to read the primary is an error. Failing to read the GRN
    /// document only makes it unavailable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamError> {
        let path = path.as_ref().to_path_buf();
        let primary = read_tree(&path)?;
        let secondary = grn_reference(&primary).and_then(|reference| {
            let grn_path = resolve_reference(&path, &reference);
            match read_tree(&grn_path) {
                Ok(tree) => Some(SecondaryDocument {
                    reference,
                    path: grn_path,
                    tree,
                    dirty: false,
                }),
                Err(e) => {
                    log::warn!("Error reading GRN config {}: {e}", grn_path.display());
                    None
                }
            }
        });

        Ok(ConfigDocument {
            path,
            primary,
            secondary,
        })
    }

    /// Wrap an in-memory tree, e.g. for tests or freshly generated configs.
    pub fn from_tree(path: impl Into<PathBuf>, primary: ConfigTree) -> Self {
        ConfigDocument {
            path: path.into(),
            primary,
            secondary: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the directory holding the document, which identifies the sample.
    pub fn sample_id(&self) -> Option<String> {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn primary(&self) -> &ConfigTree {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&SecondaryDocument> {
        self.secondary.as_ref()
    }

    /// The tree a root selector addresses, if available.
    pub fn tree(&self, root: RootSelector) -> Option<&ConfigTree> {
        match root {
            RootSelector::Config => Some(&self.primary),
            RootSelector::Grn => self.secondary.as_ref().map(|s| &s.tree),
        }
    }

    /// Mutable access to the tree a root selector addresses.
    ///
    /// Borrowing the GRN tree marks it for writing back on persist.
    pub fn tree_mut(&mut self, root: RootSelector) -> Option<&mut ConfigTree> {
        match root {
            RootSelector::Config => Some(&mut self.primary),
            RootSelector::Grn => self.secondary_tree_mut(),
        }
    }

    /// Mutable access to the loaded GRN tree; marks it for writing back.
    fn secondary_tree_mut(&mut self) -> Option<&mut ConfigTree> {
        self.secondary.as_mut().map(|s| {
            s.dirty = true;
            &mut s.tree
        })
    }

    pub(crate) fn replace_trees(&mut self, primary: ConfigTree, secondary: Option<ConfigTree>) {
        self.primary = primary;
        if let (Some(doc), Some(tree)) = (self.secondary.as_mut(), secondary) {
            doc.dirty = doc.dirty || doc.tree != tree;
            doc.tree = tree;
        }
    }

    /// Write the document back to where it was loaded from.
    pub fn persist(&self) -> Result<(), ParamError> {
        self.persist_to(&self.path)
    }

    /// Write the document to `target`.
    ///
    /// A modified GRN document is written too: in place when `target` is the
    /// source, otherwise beside `target` under the same reference so the
    /// written primary still resolves it. Both trees are serialized before
    /// anything is written, and the GRN document goes first, so a failure
    /// never leaves a new primary pointing at a stale GRN document.
    pub fn persist_to(&self, target: impl AsRef<Path>) -> Result<(), ParamError> {
        let target = target.as_ref();
        let primary = serialize_tree(target, &self.primary)?;

        let grn = match self.secondary.as_ref().filter(|s| s.dirty) {
            Some(secondary) => {
                let grn_target = if target == self.path {
                    secondary.path.clone()
                } else {
                    resolve_reference(target, &secondary.reference)
                };
                let contents = serialize_tree(&grn_target, &secondary.tree)?;
                Some((grn_target, contents))
            }
            None => None,
        };

        if let Some((grn_target, contents)) = &grn {
            write_document(grn_target, contents)?;
        }
        write_document(target, &primary)
    }
}

/// The GRN reference string inside a primary tree, if it holds one.
pub fn grn_reference(primary: &ConfigTree) -> Option<String> {
    match primary.get(GRN_SETTINGS_KEY)?.get(GRN_CONFIG_KEY)? {
        Value::String(reference) if !reference.trim().is_empty() => Some(reference.clone()),
        _ => None,
    }
}

pub(crate) fn resolve_reference(primary_path: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference);
    if reference.is_absolute() {
        return reference.to_path_buf();
    }
    primary_path
        .parent()
        .map(|dir| dir.join(reference))
        .unwrap_or_else(|| reference.to_path_buf())
}
