use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueHint};
use gym_betse_params::{Perturber, gather_initial_values};

use crate::config::Config;
use crate::print_info;

#[derive(Args, Debug)]
pub struct PerturbArgs {
    /// File listing the columns to perturb, one per line.
    #[clap(short = 'p', long = "paths", value_hint = ValueHint::FilePath)]
    pub paths: PathBuf,
    /// Dataset CSV holding the base values (defaults to the configured table path).
    #[clap(short = 't', long = "table")]
    pub table: Option<PathBuf>,
    /// Number of variants to print.
    #[clap(short = 'n', long = "count", default_value_t = 1)]
    pub count: usize,
    /// Seed overriding the configured one.
    #[clap(long = "seed")]
    pub seed: Option<u64>,
}

pub(crate) fn handle_command(args: PerturbArgs, config: &Config) -> anyhow::Result<()> {
    let fields = super::read_fields(&args.paths)?;
    let table = args.table.unwrap_or_else(|| config.table_path.clone());
    let base = gather_initial_values(&table, &fields)
        .with_context(|| format!("Failed to read base values from {}", table.display()))?;

    let mut perturber = match args.seed.or(config.seed) {
        Some(seed) => Perturber::seeded(seed),
        None => Perturber::from_entropy(),
    };
    for _ in 0..args.count {
        let variant = perturber.perturb_values(&base);
        print_info!("{}", serde_json::to_string(&variant)?);
    }
    Ok(())
}
