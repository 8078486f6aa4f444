//! Techno-economic simulation of renewable-powered electrolysis and power-to-X plants.
//!
//! A scenario describes a plant (power plant, electrolyser, optional battery and downstream
//! synthesis unit) at a location with hourly solar and wind traces. The plant's operation is
//! simulated hour by hour over the life of the project and the results are used to estimate
//! capital, operating and levelised costs.
#![warn(missing_docs)]
use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod battery;
pub mod cli;
pub mod costs;
pub mod degradation;
pub mod electrolyser;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod parameters;
pub mod production;
pub mod settings;
pub mod simulation;
pub mod summary;
pub mod trace;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the folder in which the program's configuration files are stored
pub fn get_elysim_config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Could not determine the configuration folder")?;
    path.push("elysim");

    Ok(path)
}
