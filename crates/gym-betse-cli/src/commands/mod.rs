use std::fs;
use std::path::Path;

use anyhow::Context;
use gym_betse_params::{Field, parse_path_list};

pub mod assemble;
pub mod extract;
pub mod initial_values;
pub mod perturb;
pub mod update;

/// Read a newline separated path-list file.
pub(crate) fn read_fields(path: &Path) -> anyhow::Result<Vec<Field>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read path list {}", path.display()))?;
    let fields = parse_path_list(&text)
        .with_context(|| format!("Invalid path list {}", path.display()))?;
    if fields.is_empty() {
        anyhow::bail!("Path list {} is empty", path.display());
    }
    Ok(fields)
}
