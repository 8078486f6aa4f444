//! Common routines for handling input data.
use crate::parameters::SimulationParameters;
use crate::trace::Traces;
use anyhow::{Context, Result};
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

pub mod trace;
use trace::read_trace_table;

/// The file name for solar capacity factor traces
const SOLAR_TRACES_FILE_NAME: &str = "solar_traces.csv";

/// The file name for wind capacity factor traces
const WIND_TRACES_FILE_NAME: &str = "wind_traces.csv";

/// Read a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a percentage (0-100) and convert it to a fraction between 0 and 1
pub fn deserialise_percentage<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=100.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 100"))?;
    }

    Ok(value / 100.0)
}

/// Read a non-negative, finite f64
pub fn deserialise_non_negative<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(value.is_finite() && value >= 0.0) {
        Err(serde::de::Error::custom(
            "Value must be a finite number greater than or equal to zero",
        ))?;
    }

    Ok(value)
}

/// Load a scenario from the specified directory.
///
/// # Arguments
///
/// * `scenario_dir` - Folder containing the scenario parameters and trace files
///
/// # Returns
///
/// The validated simulation parameters and the generation traces.
pub fn load_scenario<P: AsRef<Path>>(scenario_dir: P) -> Result<(SimulationParameters, Traces)> {
    let scenario_dir = scenario_dir.as_ref();
    let parameters = SimulationParameters::from_path(scenario_dir)?;
    let traces = Traces {
        solar: read_trace_table(&scenario_dir.join(SOLAR_TRACES_FILE_NAME))?,
        wind: read_trace_table(&scenario_dir.join(WIND_TRACES_FILE_NAME))?,
    };

    Ok((parameters, traces))
}
