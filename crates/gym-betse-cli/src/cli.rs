use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::Config;
use crate::logging::init_logger;
use crate::{print_err, print_info};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Settings file (defaults to ./gym-betse.toml when present).
    #[clap(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Log resolution details.
    #[clap(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract parameters from every sample under a directory into a CSV dataset.
    Assemble(commands::assemble::AssembleArgs),
    /// Print the first-row value of each listed column of a dataset.
    InitialValues(commands::initial_values::InitialValuesArgs),
    /// Write parameter values into a configuration document.
    Update(commands::update::UpdateArgs),
    /// Print randomized variants of a dataset's first-row values.
    Perturb(commands::perturb::PerturbArgs),
    /// Print the values a path expression resolves to in one document.
    Extract(commands::extract::ExtractArgs),
}

pub fn cli_main() -> ExitCode {
    let args = CliArgs::parse();
    init_logger(args.verbose);
    let time_begin = Instant::now();

    let result = Config::discover(args.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|config| handle_command(args.command, &config));

    log::debug!("Finished in {:.2?}", time_begin.elapsed());
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_err!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

pub fn handle_command(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Assemble(args) => commands::assemble::handle_command(args, config),
        Commands::InitialValues(args) => commands::initial_values::handle_command(args, config),
        Commands::Update(args) => commands::update::handle_command(args, config),
        Commands::Perturb(args) => {
            print_info!("Perturbing values by up to 50%");
            commands::perturb::handle_command(args, config)
        }
        Commands::Extract(args) => commands::extract::handle_command(args),
    }
}
