use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueHint};
use gym_betse_params::{Perturber, gather_initial_values, update_document};
use serde_yaml::Value;

use crate::config::Config;
use crate::print_success;

/// Parse `key=value`, reading the value as YAML and falling back to a string.
pub(crate) fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid key=value format: {s}"))?;
    let value =
        serde_yaml::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Configuration document to update.
    #[clap(value_hint = ValueHint::FilePath)]
    pub document: PathBuf,
    /// Assignments, e.g. `--set "config/variable settings/temperature=310"`.
    #[clap(long = "set", value_parser = parse_key_value)]
    pub overrides: Vec<(String, Value)>,
    /// Take keys from a path-list file and values from the dataset's first row.
    #[clap(short = 'p', long = "paths", value_hint = ValueHint::FilePath)]
    pub paths: Option<PathBuf>,
    /// Dataset CSV used with `--paths` (defaults to the configured table path).
    #[clap(short = 't', long = "table", requires = "paths")]
    pub table: Option<PathBuf>,
    /// Perturb the dataset values before writing them.
    #[clap(long = "perturb", requires = "paths")]
    pub perturb: bool,
    /// Write here instead of over the source document.
    #[clap(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub(crate) fn handle_command(args: UpdateArgs, config: &Config) -> anyhow::Result<()> {
    let mut keys = Vec::new();
    let mut values = Vec::new();

    if let Some(paths) = &args.paths {
        let fields = super::read_fields(paths)?;
        let table = args.table.clone().unwrap_or_else(|| config.table_path.clone());
        let mut initial = gather_initial_values(&table, &fields)
            .with_context(|| format!("Failed to read values from {}", table.display()))?;
        if args.perturb {
            let mut perturber = match config.seed {
                Some(seed) => Perturber::seeded(seed),
                None => Perturber::from_entropy(),
            };
            initial = perturber.perturb_values(&initial);
        }
        keys.extend(fields.iter().map(|field| field.key().to_string()));
        values.extend(initial);
    }
    for (key, value) in args.overrides {
        keys.push(key);
        values.push(value);
    }
    if keys.is_empty() {
        anyhow::bail!("Nothing to update: pass --set or --paths");
    }

    let target = args.output.as_deref().unwrap_or(&args.document);
    update_document(&args.document, keys.as_slice(), &values, Some(target))
        .with_context(|| format!("Failed to update {}", args.document.display()))?;

    print_success!("Updated {} parameters in {}", keys.len(), target.display());
    Ok(())
}
