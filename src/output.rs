//! The module responsible for writing output data to disk.
use crate::costs::CostBreakdown;
use crate::simulation::{HourlyOperation, ProjectResult};
use crate::summary::AnnualRecord;
use crate::units::{Money, MoneyPerMass};
use anyhow::{Context, Result, ensure};
use itertools::izip;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "elysim_results";

/// The output file name for annual summaries
const ANNUAL_SUMMARY_FILE_NAME: &str = "annual_summary.csv";

/// The output file name for the first year's hourly operation
const HOURLY_OPERATION_FILE_NAME: &str = "hourly_operation.csv";

/// The output file name for capital costs
const CAPITAL_COSTS_FILE_NAME: &str = "capital_costs.csv";

/// The output file name for operating costs
const OPERATING_COSTS_FILE_NAME: &str = "operating_costs.csv";

/// The output file name for levelised costs
const LEVELISED_COSTS_FILE_NAME: &str = "levelised_costs.csv";

/// Get the default output folder for the scenario at `scenario_dir`
pub fn get_output_dir(scenario_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let scenario_dir = scenario_dir
        .canonicalize()
        .context("Could not resolve path to scenario")?;

    let scenario_name = scenario_dir
        .file_name()
        .context("Scenario cannot be in root folder")?
        .to_str()
        .context("Invalid chars in scenario dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, scenario_name].iter().collect())
}

/// Create the output folder.
///
/// An existing, non-empty folder is only replaced if `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing folder was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut contents) = fs::read_dir(output_dir) {
        if contents.next().is_none() {
            // Empty folder: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use the --overwrite option or set \
            overwrite = true in settings.toml to replace it."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// A row of the hourly operation CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct HourlyOperationRow {
    hour: usize,
    generator_capacity_factor: f64,
    electrolyser_capacity_factor: f64,
    battery_net_charge: f64,
    battery_state_of_charge: f64,
    hydrogen: f64,
    product: f64,
    hydrogen_storage: f64,
    hydrogen_vented: f64,
}

/// A row of the capital costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapitalCostRow {
    component: String,
    capex: Money,
    epc: Money,
    land: Money,
}

/// A row of the operating costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct OperatingCostRow {
    year: u32,
    component: String,
    cost: Money,
}

/// A row of the levelised costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct LevelisedCostRow {
    component: String,
    cost_per_kg: MoneyPerMass,
}

/// Write the annual summaries to a CSV file
fn write_annual_summary(output_path: &Path, annual: &[AnnualRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(ANNUAL_SUMMARY_FILE_NAME))?;
    for record in annual {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the hourly operation to a CSV file
fn write_hourly_operation(output_path: &Path, operation: &HourlyOperation) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(HOURLY_OPERATION_FILE_NAME))?;
    let rows = izip!(
        &operation.generator_cf,
        &operation.electrolyser_cf,
        &operation.battery_net_charge,
        &operation.battery_state_of_charge,
        &operation.hydrogen,
        &operation.product,
        &operation.hydrogen_storage,
        &operation.hydrogen_vented,
    );
    for (hour, (generator, electrolyser, net_charge, soc, hydrogen, product, storage, vented)) in
        rows.enumerate()
    {
        writer.serialize(HourlyOperationRow {
            hour,
            generator_capacity_factor: *generator,
            electrolyser_capacity_factor: *electrolyser,
            battery_net_charge: *net_charge,
            battery_state_of_charge: *soc,
            hydrogen: *hydrogen,
            product: *product,
            hydrogen_storage: *storage,
            hydrogen_vented: *vented,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the capital, operating and levelised costs to CSV files
fn write_costs(output_path: &Path, costs: &CostBreakdown) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(CAPITAL_COSTS_FILE_NAME))?;
    for (component, capex) in &costs.capital {
        let indirect = costs.indirect.get(component).copied().unwrap_or_default();
        writer.serialize(CapitalCostRow {
            component: component.to_string(),
            capex: *capex,
            epc: indirect.epc,
            land: indirect.land,
        })?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(output_path.join(OPERATING_COSTS_FILE_NAME))?;
    for (component, annual_costs) in &costs.operating {
        for (year, cost) in (1..).zip(annual_costs) {
            writer.serialize(OperatingCostRow {
                year,
                component: component.to_string(),
                cost: *cost,
            })?;
        }
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(output_path.join(LEVELISED_COSTS_FILE_NAME))?;
    for (component, cost) in &costs.levelised {
        writer.serialize(LevelisedCostRow {
            component: component.to_string(),
            cost_per_kg: *cost,
        })?;
    }
    writer.serialize(LevelisedCostRow {
        component: "Total".into(),
        cost_per_kg: costs.total_levelised_cost(),
    })?;
    writer.flush()?;

    Ok(())
}

/// Write all simulation results to the output folder
pub fn write_results(output_path: &Path, result: &ProjectResult, costs: &CostBreakdown) -> Result<()> {
    write_annual_summary(output_path, &result.annual)
        .context("Failed to write annual summary")?;
    write_hourly_operation(output_path, &result.first_year)
        .context("Failed to write hourly operation")?;
    write_costs(output_path, costs).context("Failed to write costs")?;

    Ok(())
}
