pub mod cli;
pub mod config;

mod commands;
mod logging;
