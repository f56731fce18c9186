use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueHint};
use gym_betse_params::gather_initial_values;

use crate::config::Config;
use crate::print_info;

#[derive(Args, Debug)]
pub struct InitialValuesArgs {
    /// File listing the columns to read, one per line.
    #[clap(short = 'p', long = "paths", value_hint = ValueHint::FilePath)]
    pub paths: PathBuf,
    /// Dataset CSV (defaults to the configured table path).
    #[clap(short = 't', long = "table")]
    pub table: Option<PathBuf>,
}

pub(crate) fn handle_command(args: InitialValuesArgs, config: &Config) -> anyhow::Result<()> {
    let fields = super::read_fields(&args.paths)?;
    let table = args.table.unwrap_or_else(|| config.table_path.clone());
    let values = gather_initial_values(&table, &fields)
        .with_context(|| format!("Failed to read initial values from {}", table.display()))?;

    for (field, value) in fields.iter().zip(&values) {
        print_info!("{field} = {}", serde_json::to_string(value)?);
    }
    Ok(())
}
