//! Estimates steel plant production and CO2 emissions, aggregates them to company level and
//! projects company emissions into the future.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod aggregation;
pub mod cli;
pub mod emissions;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod plant;
pub mod production;
pub mod projection;
pub mod settings;
pub mod status;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config dir for the program
pub fn get_config_dir() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_default();
    dir.push("steel-emissions");
    dir
}
