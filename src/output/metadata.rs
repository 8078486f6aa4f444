//! Writes a record of how and where a simulation was run alongside its results.
use crate::parameters::SimulationParameters;
use anyhow::{Context, Result};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// The short git hash of the build, with a suffix if the working tree was modified
fn git_commit_hash() -> String {
    match (built_info::GIT_COMMIT_HASH_SHORT, built_info::GIT_DIRTY) {
        (Some(hash), Some(true)) => format!("{hash}-dirty"),
        (Some(hash), _) => hash.into(),
        (None, _) => "unknown".into(),
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    scenario: ScenarioMetadata<'a>,
    program: ProgramMetadata,
    platform: PlatformMetadata,
}

/// When and on what the simulation was run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the scenario folder
    scenario_path: &'a Path,
    /// The date and time at which the run started
    datetime: String,
}

/// The headline choices made by the scenario
#[derive(Serialize)]
struct ScenarioMetadata<'a> {
    location: &'a str,
    product: String,
    power_plant: String,
    project_timeline: u32,
}

impl<'a> ScenarioMetadata<'a> {
    fn new(parameters: &'a SimulationParameters) -> Self {
        Self {
            location: &parameters.location,
            product: format!("{:?}", parameters.product),
            power_plant: format!(
                "{:?} ({:?})",
                parameters.power_plant_technology, parameters.power_plant_configuration
            ),
            project_timeline: parameters.project_timeline,
        }
    }
}

/// The build of the program which produced the results
#[derive(Serialize)]
struct ProgramMetadata {
    name: &'static str,
    version: &'static str,
    /// Target triple (e.g. x86_64-unknown-linux-gnu)
    target: &'static str,
    is_debug: bool,
    rustc_version: &'static str,
    build_time_utc: &'static str,
    git_commit_hash: String,
}

impl ProgramMetadata {
    fn new() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: git_commit_hash(),
        }
    }
}

/// The operating system the program ran on, as reported by [`PlatformInfo`]
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info = PlatformInfo::new()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .context("Unable to determine platform info")?;

        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata for a run to `metadata.toml` in the output folder
pub fn write_metadata(
    output_path: &Path,
    scenario_path: &Path,
    parameters: &SimulationParameters,
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata {
            scenario_path,
            datetime: Local::now().to_rfc2822(),
        },
        scenario: ScenarioMetadata::new(parameters),
        program: ProgramMetadata::new(),
        platform: PlatformMetadata::new()?,
    };
    fs::write(
        output_path.join(METADATA_FILE_NAME),
        toml::to_string(&metadata)?,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::parameters;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_write_metadata(parameters: SimulationParameters) {
        let dir = tempdir().unwrap();
        write_metadata(dir.path(), Path::new("scenarios/simple"), &parameters).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        let value: toml::Table = toml::from_str(&contents).unwrap();
        assert_eq!(value["program"]["name"].as_str(), Some("elysim"));
        assert_eq!(value["scenario"]["location"].as_str(), Some("north"));
        assert_eq!(
            value["run"]["scenario_path"].as_str(),
            Some("scenarios/simple")
        );
    }
}
