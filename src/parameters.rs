//! Defines the `SimulationParameters` struct, which represents the contents of `scenario.toml`.
//!
//! Percentages are given as values between 0 and 100 in the file and are converted to fractions
//! when read, so every percentage field of [`SimulationParameters`] holds a value in [0, 1].
use crate::input::{deserialise_non_negative, deserialise_percentage, input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// The battery storage durations (in hours) which are supported
pub const VALID_BATTERY_STORAGE_DURATIONS: [u32; 4] = [1, 2, 4, 8];

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

// NB: Defaults for percentage fields are fractions, as they bypass `deserialise_percentage`
define_param_default!(default_electrolyser_maximum_load, f64, 1.0);
define_param_default!(default_electrolyser_minimum_load, f64, 0.1);
define_param_default!(default_sec_at_nominal_load, f64, 50.0);
define_param_default!(default_water_requirement, f64, 15.0);
define_param_default!(default_stack_lifetime, f64, 80_000.0);
define_param_default!(default_maximum_degradation_before_replacement, f64, 0.1);
define_param_default!(default_battery_efficiency, f64, 0.85);
define_param_default!(default_battery_lifetime, u32, 10);
define_param_default!(default_downstream_minimum_turndown, f64, 0.5);
define_param_default!(default_electrolyser_reference_capacity, f64, 10_000.0);
define_param_default!(default_electrolyser_reference_cost, f64, 1_500.0);
define_param_default!(default_solar_reference_capacity, f64, 1_000.0);
define_param_default!(default_solar_reference_cost, f64, 1_200.0);
define_param_default!(default_solar_cost_reduction_with_scale, f64, 0.2);
define_param_default!(default_wind_reference_capacity, f64, 1_000.0);
define_param_default!(default_wind_reference_cost, f64, 1_950.0);
define_param_default!(default_downstream_reference_capacity, f64, 50.0);
define_param_default!(default_downstream_reference_cost, f64, 600_000.0);
define_param_default!(default_cost_reduction_with_scale, f64, 0.1);
define_param_default!(default_reference_fold_increase, f64, 10.0);
define_param_default!(default_battery_cost, f64, 542.0);
define_param_default!(default_hydrogen_storage_cost, f64, 516.0);
define_param_default!(default_epc, f64, 0.3);
define_param_default!(default_land, f64, 0.06);
define_param_default!(default_electrolyser_om, f64, 0.025);
define_param_default!(default_stack_replacement_cost, f64, 0.4);
define_param_default!(default_solar_opex, f64, 17_000.0);
define_param_default!(default_wind_opex, f64, 25_000.0);
define_param_default!(default_battery_om, f64, 9_290.0);
define_param_default!(default_battery_replacement_cost, f64, 1.0);
define_param_default!(default_downstream_om, f64, 0.02);
define_param_default!(default_water_supply_cost, f64, 5.0);
define_param_default!(default_discount_rate, f64, 0.07);
define_param_default!(default_inflation_rate, f64, 0.025);
define_param_default!(default_project_timeline, u32, 20);

/// The technology of the power plant supplying the electrolyser
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy)]
pub enum PowerPlantTechnology {
    /// Solar PV only
    #[string = "solar"]
    Solar,
    /// Wind only
    #[string = "wind"]
    Wind,
    /// Both solar PV and wind
    #[string = "hybrid"]
    Hybrid,
}

/// Whether the plant is connected to the grid
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum PowerPlantConfiguration {
    /// Off-grid plant
    #[default]
    #[string = "standalone"]
    Standalone,
    /// Grid-connected plant, which pays for a grid connection and can sell surplus electricity
    #[string = "grid_connected"]
    GridConnected,
}

/// How the renewable electricity is procured
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum PowerSupplyOption {
    /// The project builds and operates its own power plant
    #[default]
    #[string = "self_build"]
    SelfBuild,
    /// Electricity is bought from a third-party plant under a power purchase agreement
    #[string = "ppa"]
    PowerPurchaseAgreement,
}

/// The final product of the plant
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum Product {
    /// Hydrogen straight from the electrolyser
    #[default]
    #[string = "hydrogen"]
    Hydrogen,
    /// Ammonia from a Haber-Bosch unit
    #[string = "ammonia"]
    Ammonia,
    /// Methanol from CO2 hydrogenation
    #[string = "methanol"]
    Methanol,
    /// Synthetic methane from a Sabatier unit
    #[string = "methane"]
    Methane,
}

/// The rule used to decide when the electrolyser stack is replaced
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum StackReplacementType {
    /// Replace once the stack has operated for its lifetime in hours
    #[default]
    #[string = "cumulative_hours"]
    CumulativeHours,
    /// Replace once degradation exceeds a maximum level
    #[string = "maximum_degradation_level"]
    MaximumDegradationLevel,
}

/// Represents the contents of the entire scenario file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SimulationParameters {
    // Plant
    /// Name of the trace column to use for this plant
    pub location: String,
    /// The power plant technology
    pub power_plant_technology: PowerPlantTechnology,
    /// Whether the plant is grid connected
    #[serde(default)]
    pub power_plant_configuration: PowerPlantConfiguration,
    /// How electricity is procured
    #[serde(default)]
    pub power_supply_option: PowerSupplyOption,
    /// The plant's final product
    #[serde(default)]
    pub product: Product,
    /// Electrolyser nameplate capacity (MW)
    pub electrolyser_nominal_capacity: f64,
    /// Solar nameplate capacity (MW)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub solar_nominal_capacity: f64,
    /// Wind nameplate capacity (MW)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub wind_nominal_capacity: f64,
    /// Fraction of solar output lost each year
    #[serde(default, deserialize_with = "deserialise_percentage")]
    pub solar_degradation: f64,
    /// Fraction of wind output lost each year
    #[serde(default, deserialize_with = "deserialise_percentage")]
    pub wind_degradation: f64,

    // Electrolyser
    /// Maximum load as a fraction of nameplate capacity
    #[serde(
        default = "default_electrolyser_maximum_load",
        deserialize_with = "deserialise_percentage"
    )]
    pub electrolyser_maximum_load: f64,
    /// Minimum load (turndown) as a fraction of nameplate capacity
    #[serde(
        default = "default_electrolyser_minimum_load",
        deserialize_with = "deserialise_percentage"
    )]
    pub electrolyser_minimum_load: f64,
    /// Load allowed while overloading, as a fraction of nameplate capacity (0 disables it)
    #[serde(default, deserialize_with = "deserialise_overload")]
    pub maximum_load_when_overloading: f64,
    /// Hours which must pass after an overload before the next one
    #[serde(default)]
    pub time_between_overloading: u32,
    /// Specific energy consumption at nominal load (kWh/kg)
    #[serde(default = "default_sec_at_nominal_load")]
    pub sec_at_nominal_load: f64,
    /// Water consumed by the electrolyser (L/kg of hydrogen)
    #[serde(
        default = "default_water_requirement",
        deserialize_with = "deserialise_non_negative"
    )]
    pub water_requirement: f64,

    // Stack
    /// The stack replacement policy
    #[serde(default)]
    pub stack_replacement_type: StackReplacementType,
    /// Stack lifetime in operating hours
    #[serde(default = "default_stack_lifetime")]
    pub stack_lifetime: f64,
    /// Fraction of stack output lost per year of operation
    #[serde(default, deserialize_with = "deserialise_percentage")]
    pub stack_degradation: f64,
    /// Degradation level at which the stack is replaced
    #[serde(
        default = "default_maximum_degradation_before_replacement",
        deserialize_with = "deserialise_percentage"
    )]
    pub maximum_degradation_before_replacement: f64,

    // Battery
    /// Battery rated power (MW). Zero means there is no battery.
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub battery_rated_power: f64,
    /// Battery storage duration in hours
    #[serde(default)]
    pub battery_storage_duration: u32,
    /// Battery round-trip efficiency
    #[serde(
        default = "default_battery_efficiency",
        deserialize_with = "deserialise_percentage"
    )]
    pub battery_efficiency: f64,
    /// Minimum state of charge
    #[serde(default, deserialize_with = "deserialise_percentage")]
    pub battery_min_charge: f64,
    /// Battery lifetime in years
    #[serde(default = "default_battery_lifetime")]
    pub battery_lifetime: u32,

    // Downstream unit
    /// Capacity of the synthesis unit (tonnes of product per day)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub downstream_capacity: f64,
    /// Minimum load of the synthesis unit as a fraction of capacity
    #[serde(
        default = "default_downstream_minimum_turndown",
        deserialize_with = "deserialise_percentage"
    )]
    pub downstream_minimum_turndown: f64,
    /// Capacity of the hydrogen buffer between electrolyser and synthesis unit (tonnes)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub hydrogen_storage_capacity: f64,

    // Capital costs
    /// Electrolyser reference capacity (kW)
    #[serde(default = "default_electrolyser_reference_capacity")]
    pub electrolyser_reference_capacity: f64,
    /// Electrolyser cost at reference capacity ($/kW)
    #[serde(default = "default_electrolyser_reference_cost")]
    pub electrolyser_reference_cost: f64,
    /// Electrolyser cost reduction per fold increase in capacity
    #[serde(
        default = "default_cost_reduction_with_scale",
        deserialize_with = "deserialise_percentage"
    )]
    pub electrolyser_cost_reduction_with_scale: f64,
    /// Electrolyser reference fold increase in capacity
    #[serde(default = "default_reference_fold_increase")]
    pub electrolyser_reference_fold_increase: f64,
    /// Solar reference capacity (kW)
    #[serde(default = "default_solar_reference_capacity")]
    pub solar_reference_capacity: f64,
    /// Solar cost at reference capacity ($/kW)
    #[serde(default = "default_solar_reference_cost")]
    pub solar_reference_cost: f64,
    /// Solar cost reduction per fold increase in capacity
    #[serde(
        default = "default_solar_cost_reduction_with_scale",
        deserialize_with = "deserialise_percentage"
    )]
    pub solar_cost_reduction_with_scale: f64,
    /// Solar reference fold increase in capacity
    #[serde(default = "default_reference_fold_increase")]
    pub solar_reference_fold_increase: f64,
    /// Wind reference capacity (kW)
    #[serde(default = "default_wind_reference_capacity")]
    pub wind_reference_capacity: f64,
    /// Wind cost at reference capacity ($/kW)
    #[serde(default = "default_wind_reference_cost")]
    pub wind_reference_cost: f64,
    /// Wind cost reduction per fold increase in capacity
    #[serde(
        default = "default_cost_reduction_with_scale",
        deserialize_with = "deserialise_percentage"
    )]
    pub wind_cost_reduction_with_scale: f64,
    /// Wind reference fold increase in capacity
    #[serde(default = "default_reference_fold_increase")]
    pub wind_reference_fold_increase: f64,
    /// Synthesis unit reference capacity (t/day)
    #[serde(default = "default_downstream_reference_capacity")]
    pub downstream_reference_capacity: f64,
    /// Synthesis unit cost at reference capacity ($ per t/day)
    #[serde(default = "default_downstream_reference_cost")]
    pub downstream_reference_cost: f64,
    /// Synthesis unit cost reduction per fold increase in capacity
    #[serde(
        default = "default_cost_reduction_with_scale",
        deserialize_with = "deserialise_percentage"
    )]
    pub downstream_cost_reduction_with_scale: f64,
    /// Synthesis unit reference fold increase in capacity
    #[serde(default = "default_reference_fold_increase")]
    pub downstream_reference_fold_increase: f64,
    /// Battery cost ($/kWh of storage)
    #[serde(
        default = "default_battery_cost",
        deserialize_with = "deserialise_non_negative"
    )]
    pub battery_cost: f64,
    /// Hydrogen storage cost ($/kg of storage)
    #[serde(
        default = "default_hydrogen_storage_cost",
        deserialize_with = "deserialise_non_negative"
    )]
    pub hydrogen_storage_cost: f64,

    // Indirect costs
    /// Electrolyser EPC cost as a fraction of CAPEX
    #[serde(default = "default_epc", deserialize_with = "deserialise_percentage")]
    pub electrolyser_epc: f64,
    /// Electrolyser land cost as a fraction of CAPEX
    #[serde(default = "default_land", deserialize_with = "deserialise_percentage")]
    pub electrolyser_land: f64,
    /// Solar EPC cost as a fraction of CAPEX
    #[serde(default = "default_epc", deserialize_with = "deserialise_percentage")]
    pub solar_epc: f64,
    /// Solar land cost as a fraction of CAPEX
    #[serde(default = "default_land", deserialize_with = "deserialise_percentage")]
    pub solar_land: f64,
    /// Wind EPC cost as a fraction of CAPEX
    #[serde(default = "default_epc", deserialize_with = "deserialise_percentage")]
    pub wind_epc: f64,
    /// Wind land cost as a fraction of CAPEX
    #[serde(default = "default_land", deserialize_with = "deserialise_percentage")]
    pub wind_land: f64,
    /// Battery EPC cost as a fraction of CAPEX
    #[serde(default, deserialize_with = "deserialise_percentage")]
    pub battery_epc: f64,
    /// Battery land cost as a fraction of CAPEX
    #[serde(default, deserialize_with = "deserialise_percentage")]
    pub battery_land: f64,
    /// Synthesis unit EPC cost as a fraction of CAPEX
    #[serde(default = "default_epc", deserialize_with = "deserialise_percentage")]
    pub downstream_epc: f64,
    /// Synthesis unit land cost as a fraction of CAPEX
    #[serde(default = "default_land", deserialize_with = "deserialise_percentage")]
    pub downstream_land: f64,

    // Operating costs
    /// Electrolyser O&M cost per year as a fraction of CAPEX
    #[serde(
        default = "default_electrolyser_om",
        deserialize_with = "deserialise_percentage"
    )]
    pub electrolyser_om: f64,
    /// Stack replacement cost as a fraction of electrolyser CAPEX
    #[serde(
        default = "default_stack_replacement_cost",
        deserialize_with = "deserialise_percentage"
    )]
    pub stack_replacement_cost: f64,
    /// Solar OPEX ($/MW/year)
    #[serde(
        default = "default_solar_opex",
        deserialize_with = "deserialise_non_negative"
    )]
    pub solar_opex: f64,
    /// Wind OPEX ($/MW/year)
    #[serde(
        default = "default_wind_opex",
        deserialize_with = "deserialise_non_negative"
    )]
    pub wind_opex: f64,
    /// Battery O&M ($/MW/year)
    #[serde(
        default = "default_battery_om",
        deserialize_with = "deserialise_non_negative"
    )]
    pub battery_om: f64,
    /// Battery replacement cost as a fraction of battery CAPEX
    #[serde(
        default = "default_battery_replacement_cost",
        deserialize_with = "deserialise_percentage"
    )]
    pub battery_replacement_cost: f64,
    /// Synthesis unit O&M cost per year as a fraction of CAPEX
    #[serde(
        default = "default_downstream_om",
        deserialize_with = "deserialise_percentage"
    )]
    pub downstream_om: f64,
    /// Water supply cost ($/kL)
    #[serde(
        default = "default_water_supply_cost",
        deserialize_with = "deserialise_non_negative"
    )]
    pub water_supply_cost: f64,
    /// PPA electricity price ($/MWh)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub ppa_cost: f64,
    /// Grid connection cost ($)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub grid_connection_cost: f64,
    /// Price received for surplus electricity sold to the grid ($/MWh)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub surplus_retail_price: f64,
    /// Additional upfront costs ($)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub additional_upfront_costs: f64,
    /// Additional annual costs ($/year)
    #[serde(default, deserialize_with = "deserialise_non_negative")]
    pub additional_annual_costs: f64,

    // Financial
    /// Discount rate
    #[serde(
        default = "default_discount_rate",
        deserialize_with = "deserialise_percentage"
    )]
    pub discount_rate: f64,
    /// Inflation rate
    #[serde(
        default = "default_inflation_rate",
        deserialize_with = "deserialise_percentage"
    )]
    pub inflation_rate: f64,
    /// Project life in years
    #[serde(default = "default_project_timeline")]
    pub project_timeline: u32,
}

/// Read the overload load, which may exceed 100%
fn deserialise_overload<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=200.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 200"))?;
    }

    Ok(value / 100.0)
}

/// Check that the electrolyser load limits are valid
fn check_load_limits(minimum: f64, maximum: f64, overload: f64) -> Result<()> {
    ensure!(
        minimum > 0.0 && minimum <= maximum,
        "electrolyser_minimum_load must be greater than zero and no more than \
        electrolyser_maximum_load"
    );
    ensure!(
        overload == 0.0 || overload >= maximum,
        "maximum_load_when_overloading must be zero or at least electrolyser_maximum_load"
    );

    Ok(())
}

/// Check that the battery storage duration is valid
pub fn check_battery_storage_duration(rated_power: f64, duration: u32) -> Result<()> {
    if rated_power > 0.0 {
        ensure!(
            VALID_BATTERY_STORAGE_DURATIONS.contains(&duration),
            "Invalid battery storage duration {duration} hours: must be one of {:?}",
            VALID_BATTERY_STORAGE_DURATIONS
        );
    }

    Ok(())
}

/// Check that an experience curve reference is valid
fn check_experience_curve(name: &str, reference_capacity: f64, fold_increase: f64) -> Result<()> {
    ensure!(
        reference_capacity.is_finite() && reference_capacity > 0.0,
        "{name}_reference_capacity must be a finite number greater than zero"
    );
    ensure!(
        fold_increase.is_finite() && fold_increase > 1.0,
        "{name}_reference_fold_increase must be a finite number greater than one"
    );

    Ok(())
}

impl SimulationParameters {
    /// Read a scenario file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `scenario_dir` - Folder containing scenario configuration files
    ///
    /// # Returns
    ///
    /// The scenario file contents as a [`SimulationParameters`] struct or an error if the file is
    /// invalid
    pub fn from_path<P: AsRef<Path>>(scenario_dir: P) -> Result<SimulationParameters> {
        let file_path = scenario_dir.as_ref().join(SCENARIO_FILE_NAME);
        let parameters: SimulationParameters = read_toml(&file_path)?;

        parameters
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(parameters)
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.electrolyser_nominal_capacity.is_finite()
                && self.electrolyser_nominal_capacity > 0.0,
            "electrolyser_nominal_capacity must be a finite number greater than zero"
        );
        ensure!(
            self.power_plant_capacity() > 0.0,
            "The power plant must have a nameplate capacity greater than zero"
        );
        check_load_limits(
            self.electrolyser_minimum_load,
            self.electrolyser_maximum_load,
            self.maximum_load_when_overloading,
        )?;
        if self.overload_enabled() {
            ensure!(
                self.time_between_overloading > 0,
                "time_between_overloading must be greater than zero when overloading is enabled"
            );
        }
        ensure!(
            self.sec_at_nominal_load.is_finite() && self.sec_at_nominal_load > 0.0,
            "sec_at_nominal_load must be a finite number greater than zero"
        );
        ensure!(
            self.stack_lifetime.is_finite() && self.stack_lifetime > 0.0,
            "stack_lifetime must be a finite number greater than zero"
        );
        check_battery_storage_duration(self.battery_rated_power, self.battery_storage_duration)?;
        if self.product != Product::Hydrogen {
            ensure!(
                self.downstream_capacity > 0.0,
                "downstream_capacity must be greater than zero when the product is not hydrogen"
            );
            check_experience_curve(
                "downstream",
                self.downstream_reference_capacity,
                self.downstream_reference_fold_increase,
            )?;
        } else if self.downstream_capacity > 0.0 || self.hydrogen_storage_capacity > 0.0 {
            warn!(
                "downstream_capacity and hydrogen_storage_capacity are ignored when the product \
                is hydrogen"
            );
        }
        check_experience_curve(
            "electrolyser",
            self.electrolyser_reference_capacity,
            self.electrolyser_reference_fold_increase,
        )?;
        check_experience_curve(
            "solar",
            self.solar_reference_capacity,
            self.solar_reference_fold_increase,
        )?;
        check_experience_curve(
            "wind",
            self.wind_reference_capacity,
            self.wind_reference_fold_increase,
        )?;
        ensure!(
            self.project_timeline > 0,
            "project_timeline must be greater than zero"
        );

        Ok(())
    }

    /// Nameplate capacity of the solar part of the power plant (MW)
    pub fn active_solar_capacity(&self) -> f64 {
        match self.power_plant_technology {
            PowerPlantTechnology::Solar | PowerPlantTechnology::Hybrid => {
                self.solar_nominal_capacity
            }
            PowerPlantTechnology::Wind => 0.0,
        }
    }

    /// Nameplate capacity of the wind part of the power plant (MW)
    pub fn active_wind_capacity(&self) -> f64 {
        match self.power_plant_technology {
            PowerPlantTechnology::Wind | PowerPlantTechnology::Hybrid => self.wind_nominal_capacity,
            PowerPlantTechnology::Solar => 0.0,
        }
    }

    /// Total nameplate capacity of the power plant (MW)
    pub fn power_plant_capacity(&self) -> f64 {
        self.active_solar_capacity() + self.active_wind_capacity()
    }

    /// Ratio of power plant nameplate capacity to electrolyser nameplate capacity
    pub fn oversize_ratio(&self) -> f64 {
        self.power_plant_capacity() / self.electrolyser_nominal_capacity
    }

    /// Whether the plant includes a battery
    pub fn has_battery(&self) -> bool {
        self.battery_rated_power > 0.0
    }

    /// Battery energy capacity (MWh)
    pub fn battery_energy(&self) -> f64 {
        if self.has_battery() {
            self.battery_rated_power * f64::from(self.battery_storage_duration)
        } else {
            0.0
        }
    }

    /// Whether the electrolyser may be overloaded
    pub fn overload_enabled(&self) -> bool {
        self.maximum_load_when_overloading > self.electrolyser_maximum_load
    }

    /// Whether the power plant is owned by the project (rather than supplied through a PPA)
    pub fn is_self_build(&self) -> bool {
        self.power_supply_option == PowerSupplyOption::SelfBuild
    }

    /// Whether any year-on-year degradation is modelled, so that every project year must be
    /// simulated
    pub fn uses_degradation(&self) -> bool {
        self.stack_degradation > 0.0 || self.solar_degradation > 0.0 || self.wind_degradation > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, parameters};
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SCENARIO_FILE_NAME)).unwrap();
            writeln!(
                file,
                "location = \"north\"\n\
                power_plant_technology = \"solar\"\n\
                electrolyser_nominal_capacity = 10.0\n\
                solar_nominal_capacity = 15.0\n\
                electrolyser_minimum_load = 20\n\
                discount_rate = 5"
            )
            .unwrap();
        }

        let parameters = SimulationParameters::from_path(dir.path()).unwrap();
        assert_eq!(parameters.location, "north");
        assert_eq!(parameters.electrolyser_minimum_load, 0.2);
        assert_eq!(parameters.electrolyser_maximum_load, 1.0);
        assert_eq!(parameters.discount_rate, 0.05);
        assert_eq!(parameters.oversize_ratio(), 1.5);
        assert_eq!(parameters.product, Product::Hydrogen);
    }

    #[test]
    fn test_unknown_enum_label() {
        let result: Result<SimulationParameters, _> = toml::from_str(
            "location = \"north\"\n\
            power_plant_technology = \"nuclear\"\n\
            electrolyser_nominal_capacity = 10.0",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_percentage_out_of_range() {
        let result: Result<SimulationParameters, _> = toml::from_str(
            "location = \"north\"\n\
            power_plant_technology = \"solar\"\n\
            electrolyser_nominal_capacity = 10.0\n\
            battery_efficiency = 120",
        );
        assert!(result.is_err());
    }

    #[rstest]
    #[case(0.1, 1.0, 0.0, true)]
    #[case(0.1, 1.0, 1.2, true)]
    #[case(1.0, 1.0, 0.0, true)]
    #[case(0.0, 1.0, 0.0, false)] // minimum load of zero
    #[case(0.5, 0.4, 0.0, false)] // minimum above maximum
    #[case(0.1, 1.0, 0.9, false)] // overload below maximum
    fn test_check_load_limits(
        #[case] minimum: f64,
        #[case] maximum: f64,
        #[case] overload: f64,
        #[case] valid: bool,
    ) {
        assert_eq!(check_load_limits(minimum, maximum, overload).is_ok(), valid);
    }

    #[rstest]
    #[case(10.0, 1, true)]
    #[case(10.0, 2, true)]
    #[case(10.0, 4, true)]
    #[case(10.0, 8, true)]
    #[case(10.0, 3, false)]
    #[case(10.0, 0, false)]
    #[case(0.0, 0, true)] // no battery
    fn test_check_battery_storage_duration(
        #[case] rated_power: f64,
        #[case] duration: u32,
        #[case] valid: bool,
    ) {
        assert_eq!(
            check_battery_storage_duration(rated_power, duration).is_ok(),
            valid
        );
    }

    #[rstest]
    fn test_validate_invalid_battery(mut parameters: SimulationParameters) {
        parameters.battery_rated_power = 5.0;
        parameters.battery_storage_duration = 3;
        assert_error!(
            parameters.validate(),
            "Invalid battery storage duration 3 hours: must be one of [1, 2, 4, 8]"
        );
    }

    #[rstest]
    fn test_validate_synthesis_needs_capacity(mut parameters: SimulationParameters) {
        parameters.product = Product::Ammonia;
        parameters.downstream_capacity = 0.0;
        assert_error!(
            parameters.validate(),
            "downstream_capacity must be greater than zero when the product is not hydrogen"
        );
    }

    #[rstest]
    fn test_validate_fold_increase(mut parameters: SimulationParameters) {
        parameters.electrolyser_reference_fold_increase = 1.0;
        assert_error!(
            parameters.validate(),
            "electrolyser_reference_fold_increase must be a finite number greater than one"
        );
    }

    #[rstest]
    fn test_validate_overload_without_cooldown(mut parameters: SimulationParameters) {
        parameters.maximum_load_when_overloading = 1.2;
        parameters.time_between_overloading = 0;
        assert_error!(
            parameters.validate(),
            "time_between_overloading must be greater than zero when overloading is enabled"
        );
    }

    #[rstest]
    fn test_derived_values(mut parameters: SimulationParameters) {
        parameters.power_plant_technology = PowerPlantTechnology::Hybrid;
        parameters.solar_nominal_capacity = 10.0;
        parameters.wind_nominal_capacity = 5.0;
        parameters.electrolyser_nominal_capacity = 10.0;
        parameters.battery_rated_power = 2.0;
        parameters.battery_storage_duration = 4;

        assert_eq!(parameters.power_plant_capacity(), 15.0);
        assert_eq!(parameters.oversize_ratio(), 1.5);
        assert_eq!(parameters.battery_energy(), 8.0);
        assert!(parameters.has_battery());

        parameters.power_plant_technology = PowerPlantTechnology::Wind;
        assert_eq!(parameters.power_plant_capacity(), 5.0);
    }
}
