use std::process::ExitCode;

fn main() -> ExitCode {
    gym_betse_cli::cli::cli_main()
}
