use std::path::{Path, PathBuf};
use std::{fs, io};

use gym_betse_params::AssemblerConfig;
use gym_betse_params::table::DEFAULT_TABLE_PATH;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gym-betse.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where `assemble` writes and `initial-values` reads the dataset.
    pub table_path: PathBuf,
    #[serde(flatten)]
    pub assembler: AssemblerConfig,
    /// Seed for `perturb`; fresh entropy when unset.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            assembler: AssemblerConfig::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// The explicit file if given, else `gym-betse.toml` if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
