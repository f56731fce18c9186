use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueHint};
use gym_betse_params::DatasetAssembler;

use crate::config::Config;
use crate::{print_info, print_success, print_warn};

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Directory holding one subdirectory per sample.
    #[clap(value_hint = ValueHint::DirPath)]
    pub root: PathBuf,
    /// File listing the paths to extract, one per line.
    #[clap(short = 'p', long = "paths", value_hint = ValueHint::FilePath)]
    pub paths: PathBuf,
    /// Output CSV (defaults to the configured table path).
    #[clap(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Also write the retained column keys to this file.
    #[clap(long = "keys-out")]
    pub keys_out: Option<PathBuf>,
    /// Extract documents one at a time.
    #[clap(long = "sequential")]
    pub sequential: bool,
}

pub(crate) fn handle_command(args: AssembleArgs, config: &Config) -> anyhow::Result<()> {
    let fields = super::read_fields(&args.paths)?;
    let settings = config
        .assembler
        .clone()
        .with_parallel(config.assembler.parallel && !args.sequential);

    print_info!(
        "Assembling {} paths from {}",
        fields.len(),
        args.root.display()
    );
    let table = DatasetAssembler::new(settings).assemble(&args.root, &fields);
    if table.is_empty() {
        print_warn!("No documents found under {}", args.root.display());
    }

    let output = args.output.unwrap_or_else(|| config.table_path.clone());
    table
        .write_csv(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    if let Some(keys_out) = &args.keys_out {
        table
            .write_column_list(keys_out)
            .with_context(|| format!("Failed to write {}", keys_out.display()))?;
    }

    print_success!(
        "Wrote {} rows and {} columns to {}",
        table.rows(),
        table.keys().count(),
        output.display()
    );
    Ok(())
}
