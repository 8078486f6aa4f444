//! Functionality for running a project simulation.
use crate::battery::{Battery, BatteryDispatch, Dispatcher};
use crate::degradation::{DegradationTracker, battery_replacement_years};
use crate::electrolyser::LoadModel;
use crate::parameters::SimulationParameters;
use crate::production::{PowerToXUnit, hydrogen_production, power_to_x_unit};
use crate::summary::{AnnualRecord, AnnualSummaryAggregator};
use crate::trace::{TraceSampler, Traces};
use anyhow::{Context, Result};
use log::{debug, info};

/// The hourly operation of the plant over one simulated year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyOperation {
    /// Power plant capacity factor
    pub generator_cf: Vec<f64>,
    /// Electrolyser capacity factor, including overloading and battery discharge
    pub electrolyser_cf: Vec<f64>,
    /// Net flow into the battery (MW)
    pub battery_net_charge: Vec<f64>,
    /// Battery state of charge at the end of each hour
    pub battery_state_of_charge: Vec<f64>,
    /// Hydrogen produced (t)
    pub hydrogen: Vec<f64>,
    /// Final product made (t)
    pub product: Vec<f64>,
    /// Hydrogen held in storage (t)
    pub hydrogen_storage: Vec<f64>,
    /// Hydrogen vented (t)
    pub hydrogen_vented: Vec<f64>,
}

/// The outcome of simulating every year of a project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectResult {
    /// Summary statistics for each project year
    pub annual: Vec<AnnualRecord>,
    /// Hourly operation in the first project year
    pub first_year: HourlyOperation,
    /// Years at the end of which the electrolyser stack is replaced
    pub stack_replacement_years: Vec<u32>,
    /// Years at the end of which the battery is replaced
    pub battery_replacement_years: Vec<u32>,
}

/// The plant models needed to simulate a single year
struct Plant<'a> {
    sampler: TraceSampler<'a>,
    load_model: LoadModel,
    dispatcher: Option<Dispatcher>,
    unit: Box<dyn PowerToXUnit>,
    aggregator: AnnualSummaryAggregator,
    electrolyser_capacity: f64,
    sec: f64,
}

impl<'a> Plant<'a> {
    fn new(parameters: &SimulationParameters, traces: &'a Traces) -> Result<Self> {
        let load_model = LoadModel::from_parameters(parameters);
        let dispatcher = Battery::from_parameters(parameters)?.map(|battery| {
            Dispatcher::new(
                battery,
                parameters.electrolyser_nominal_capacity,
                parameters.electrolyser_minimum_load,
                parameters.electrolyser_maximum_load,
            )
        });
        let unit = power_to_x_unit(parameters);
        let aggregator = AnnualSummaryAggregator::new(parameters, unit.clamps_negative_surplus());

        Ok(Self {
            sampler: TraceSampler::new(parameters, traces)?,
            load_model,
            dispatcher,
            unit,
            aggregator,
            electrolyser_capacity: parameters.electrolyser_nominal_capacity,
            sec: parameters.sec_at_nominal_load,
        })
    }

    /// Simulate the plant's hourly operation for one project year
    fn simulate_year(&self, year: u32, stack_degradation: f64) -> Result<HourlyOperation> {
        let generator_cf = self.sampler.sample(year);
        let electrolyser_cf = self.load_model.capacity_factors(&generator_cf);
        let dispatch = match &self.dispatcher {
            Some(dispatcher) => dispatcher
                .dispatch(
                    &generator_cf,
                    &electrolyser_cf,
                    self.load_model.oversize_ratio,
                )
                .with_context(|| format!("Battery dispatch failed in year {year}"))?,
            None => BatteryDispatch::without_battery(electrolyser_cf),
        };

        // Convert from kg/h per MW to tonnes for the whole electrolyser
        let hydrogen: Vec<f64> =
            hydrogen_production(&dispatch.electrolyser_cf, stack_degradation, self.sec)
                .into_iter()
                .map(|kg| kg * self.electrolyser_capacity / 1000.0)
                .collect();
        let output = self.unit.produce(&hydrogen);

        Ok(HourlyOperation {
            generator_cf,
            electrolyser_cf: dispatch.electrolyser_cf,
            battery_net_charge: dispatch.net_charge,
            battery_state_of_charge: dispatch.state_of_charge,
            hydrogen,
            product: output.product,
            hydrogen_storage: output.storage_level,
            hydrogen_vented: output.hydrogen_vented,
        })
    }
}

/// Run a simulation for the whole life of a project.
///
/// If no degradation is modelled, a single year is simulated and its summary is repeated for every
/// project year. Otherwise every year is simulated in turn.
///
/// # Arguments:
///
/// * `parameters` - The plant and financial parameters
/// * `traces` - The solar and wind generation traces
pub fn run_project(parameters: &SimulationParameters, traces: &Traces) -> Result<ProjectResult> {
    let plant = Plant::new(parameters, traces)?;
    let tracker = DegradationTracker::from_parameters(parameters);
    let timeline = parameters.project_timeline;
    info!(
        "Simulating {} hours per year over {timeline} years",
        plant.sampler.hours()
    );

    let (annual, first_year, stack_replacement_years) = if parameters.uses_degradation() {
        info!("Degradation is modelled: simulating every project year");
        let mut state = tracker.initial_state();
        let mut annual = Vec::with_capacity(timeline as usize);
        let mut first_year = None;
        for year in 1..=timeline {
            let stack_degradation = tracker.start_year(&mut state, year);
            debug!("Year {year}: stack degradation {stack_degradation}");
            let operation = plant.simulate_year(year, stack_degradation)?;
            let record = plant
                .aggregator
                .summarise(year, &operation, stack_degradation);
            tracker.end_year(&mut state, year, record.operating_hours);
            annual.push(record);
            first_year.get_or_insert(operation);
        }

        (
            annual,
            first_year.unwrap_or_default(),
            state.into_replacement_years(),
        )
    } else {
        let operation = plant.simulate_year(1, 0.0)?;
        let record = plant.aggregator.summarise(1, &operation, 0.0);
        let replacement_years =
            tracker.replacement_years_for_constant_operation(record.operating_hours);
        let annual = (1..=timeline)
            .map(|year| AnnualRecord {
                year,
                ..record.clone()
            })
            .collect();

        (annual, operation, replacement_years)
    };

    let battery_replacement_years = if parameters.has_battery() {
        battery_replacement_years(parameters.battery_lifetime, timeline)
    } else {
        Vec::new()
    };
    debug!("Stack replacement years: {stack_replacement_years:?}");

    Ok(ProjectResult {
        annual,
        first_year,
        stack_replacement_years,
        battery_replacement_years,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, parameters};
    use crate::parameters::{Product, StackReplacementType};
    use crate::trace::TraceTable;
    use crate::units::{Energy, Mass};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    fn constant_traces(value: f64) -> Traces {
        Traces {
            solar: TraceTable::new(indexmap! {"north".into() => vec![value; 8760]}).unwrap(),
            wind: TraceTable::default(),
        }
    }

    #[rstest]
    fn test_run_project_constant_half_load(mut parameters: SimulationParameters) {
        parameters.electrolyser_minimum_load = 0.0;
        parameters.inflation_rate = 0.0;
        let result = run_project(&parameters, &constant_traces(0.5)).unwrap();
        assert_eq!(result.annual.len(), 20);

        let record = &result.annual[0];
        assert_eq!(record.generator_capacity_factor, 0.5);
        assert_eq!(record.electrolyser_capacity_factor, 0.5);
        assert_eq!(record.time_operating, 1.0);
        assert_eq!(record.time_at_rated_capacity, 0.0);
        assert_approx_eq!(Energy, record.energy_consumed, Energy(8760.0 * 5.0));
        // 0.5 * 1000 / 50 = 10 kg/h per MW, for 10 MW over 8760 hours
        assert_approx_eq!(Mass, record.hydrogen_output, Mass(876.0), epsilon = 1e-6);
        assert_eq!(record.hydrogen_output, record.product_output);

        // Every year of the fast path has the same figures
        for (year, annual) in (1..).zip(&result.annual) {
            assert_eq!(annual.year, year);
            assert_eq!(annual.hydrogen_output, record.hydrogen_output);
        }

        // 8760 hours a year against an 80000 hour stack lifetime
        assert_eq!(result.stack_replacement_years, [10, 19]);
        assert!(result.battery_replacement_years.is_empty());
        assert_eq!(result.first_year.hydrogen.len(), 8760);
    }

    #[rstest]
    fn test_run_project_with_degradation(mut parameters: SimulationParameters) {
        parameters.stack_degradation = 0.01;
        parameters.stack_replacement_type = StackReplacementType::MaximumDegradationLevel;
        parameters.maximum_degradation_before_replacement = 0.025;
        parameters.project_timeline = 6;
        let result = run_project(&parameters, &constant_traces(0.5)).unwrap();

        // Degradation exceeds 2.5% when the stack is three years old
        assert_eq!(result.stack_replacement_years, [3]);
        let outputs: Vec<f64> = result
            .annual
            .iter()
            .map(|record| record.hydrogen_output.value())
            .collect();
        assert_approx_eq!(f64, outputs[0], 876.0, epsilon = 1e-6);
        assert!(outputs[1] < outputs[0]);
        assert!(outputs[2] < outputs[1]);
        assert_eq!(outputs[3], outputs[0]);
    }

    #[rstest]
    fn test_run_project_with_battery(mut parameters: SimulationParameters) {
        parameters.battery_rated_power = 2.0;
        parameters.battery_storage_duration = 2;
        parameters.battery_lifetime = 8;
        let result = run_project(&parameters, &constant_traces(0.5)).unwrap();

        // No excess generation, so the battery never charges
        assert!(result.first_year.battery_net_charge.iter().all(|x| *x == 0.0));
        assert_eq!(result.battery_replacement_years, [8, 16]);
    }

    #[rstest]
    #[case(3)]
    #[case(0)]
    fn test_run_project_invalid_battery_duration(
        mut parameters: SimulationParameters,
        #[case] duration: u32,
    ) {
        parameters.battery_rated_power = 2.0;
        parameters.battery_storage_duration = duration;
        assert_error!(
            run_project(&parameters, &constant_traces(0.5)),
            format!("Invalid battery storage duration {duration} hours: must be one of [1, 2, 4, 8]")
        );
    }

    #[rstest]
    fn test_run_project_ammonia(mut parameters: SimulationParameters) {
        parameters.product = Product::Ammonia;
        // Exactly enough hydrogen (0.1 t/h) to run at full capacity
        parameters.downstream_capacity = 2.4 / 0.18;
        let result = run_project(&parameters, &constant_traces(0.5)).unwrap();
        let record = &result.annual[0];
        assert_approx_eq!(Mass, record.product_output, Mass(876.0 / 0.18), epsilon = 1e-6);
        assert_approx_eq!(Mass, record.hydrogen_vented, Mass(0.0), epsilon = 1e-9);
    }

    #[rstest]
    fn test_run_project_unknown_location(mut parameters: SimulationParameters) {
        parameters.location = "east".into();
        assert!(run_project(&parameters, &constant_traces(0.5)).is_err());
    }
}
