use colored::{ColoredString, Colorize, CustomColor};

pub const BETSE_TEAL: CustomColor = CustomColor {
    r: 0,
    g: 150,
    b: 136,
};

const TAG: &str = "gym-betse";

/// Severity of a user-facing line. Errors go to stderr, the rest to stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Info,
    Success,
}

impl Level {
    fn label(self) -> ColoredString {
        match self {
            Level::Error => "error".red().bold(),
            Level::Warning => "warning".yellow().bold(),
            Level::Info => "info".cyan().bold(),
            Level::Success => "success".green().bold(),
        }
    }
}

/// Install the `log` backend. `RUST_LOG` wins over the verbosity flag.
pub fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let result =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .format_timestamp(None)
            .try_init();
    if let Err(e) = result {
        print(Level::Warning, &format!("Logger already initialized: {e}"));
    }
}

pub fn line(level: Level, message: &str) -> String {
    format!("[{}] {}: {}", TAG.custom_color(BETSE_TEAL), level.label(), message)
}

pub fn print(level: Level, message: &str) {
    match level {
        Level::Error => eprintln!("{}", line(level, message)),
        _ => println!("{}", line(level, message)),
    }
}

#[macro_export]
macro_rules! print_err {
    ($($arg:tt)*) => {
        $crate::logging::print($crate::logging::Level::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        $crate::logging::print($crate::logging::Level::Warning, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        $crate::logging::print($crate::logging::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_success {
    ($($arg:tt)*) => {
        $crate::logging::print($crate::logging::Level::Success, &format!($($arg)*))
    };
}
