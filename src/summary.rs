//! Rolls one simulated year of hourly operation up into an [`AnnualRecord`].
use crate::battery::battery_loss_factor;
use crate::parameters::SimulationParameters;
use crate::simulation::HourlyOperation;
use crate::units::{Energy, Mass};
use serde::Serialize;

/// Summary statistics for one project year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualRecord {
    /// The project year (1-based)
    pub year: u32,
    /// Mean power plant capacity factor
    pub generator_capacity_factor: f64,
    /// Fraction of hours in which the electrolyser ran at its maximum load
    pub time_at_rated_capacity: f64,
    /// Fraction of hours in which the electrolyser ran at all
    pub time_operating: f64,
    /// Mean electrolyser capacity factor
    pub electrolyser_capacity_factor: f64,
    /// Electricity used by the electrolyser
    pub energy_consumed: Energy,
    /// Generation not used by the electrolyser
    pub surplus_energy: Energy,
    /// Generation not used by the electrolyser, counting only hours with a positive surplus
    pub exported_energy: Energy,
    /// Energy delivered by the battery
    pub battery_output: Energy,
    /// Hydrogen produced by the electrolyser
    pub hydrogen_output: Mass,
    /// Final product made
    pub product_output: Mass,
    /// Hydrogen vented by the synthesis unit
    pub hydrogen_vented: Mass,
    /// Hours in which the electrolyser ran
    pub operating_hours: f64,
    /// Fraction of stack output lost to degradation
    pub stack_degradation: f64,
}

/// Mean of a series, or zero for an empty series
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Fraction of a series satisfying `predicate`, or zero for an empty series
fn fraction_where<F: Fn(f64) -> bool>(values: &[f64], predicate: F) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().filter(|value| predicate(**value)).count() as f64 / values.len() as f64
    }
}

/// Builds [`AnnualRecord`]s for a plant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualSummaryAggregator {
    oversize_ratio: f64,
    /// Electrolyser nameplate capacity (MW)
    electrolyser_capacity: f64,
    maximum_load: f64,
    battery_loss_factor: f64,
    clamps_negative_surplus: bool,
}

impl AnnualSummaryAggregator {
    /// Create an aggregator for the plant described in `parameters`.
    ///
    /// `clamps_negative_surplus` determines whether hours where the electrolyser uses more than
    /// the power plant generates (because of battery discharge) count as zero surplus.
    pub fn new(parameters: &SimulationParameters, clamps_negative_surplus: bool) -> Self {
        Self {
            oversize_ratio: parameters.oversize_ratio(),
            electrolyser_capacity: parameters.electrolyser_nominal_capacity,
            maximum_load: parameters.electrolyser_maximum_load,
            battery_loss_factor: battery_loss_factor(parameters.battery_efficiency),
            clamps_negative_surplus,
        }
    }

    /// Summarise one year of operation
    pub fn summarise(
        &self,
        year: u32,
        operation: &HourlyOperation,
        stack_degradation: f64,
    ) -> AnnualRecord {
        let electrolyser_cf = &operation.electrolyser_cf;
        let capacity = self.electrolyser_capacity;

        let hourly_surplus: Vec<f64> = operation
            .generator_cf
            .iter()
            .zip(electrolyser_cf)
            .map(|(g, e)| (g * self.oversize_ratio - e) * capacity)
            .collect();
        let exported_energy: f64 = hourly_surplus.iter().map(|surplus| surplus.max(0.0)).sum();
        let surplus_energy: f64 = if self.clamps_negative_surplus {
            exported_energy
        } else {
            hourly_surplus.iter().sum()
        };
        let battery_output = operation
            .battery_net_charge
            .iter()
            .filter(|net| **net < 0.0)
            .map(|net| -net * self.battery_loss_factor)
            .sum();

        AnnualRecord {
            year,
            generator_capacity_factor: mean(&operation.generator_cf),
            time_at_rated_capacity: fraction_where(electrolyser_cf, |cf| cf == self.maximum_load),
            time_operating: fraction_where(electrolyser_cf, |cf| cf > 0.0),
            electrolyser_capacity_factor: mean(electrolyser_cf),
            energy_consumed: Energy(electrolyser_cf.iter().sum::<f64>() * capacity),
            surplus_energy: Energy(surplus_energy),
            exported_energy: Energy(exported_energy),
            battery_output: Energy(battery_output),
            hydrogen_output: Mass(operation.hydrogen.iter().sum()),
            product_output: Mass(operation.product.iter().sum()),
            hydrogen_vented: Mass(operation.hydrogen_vented.iter().sum()),
            operating_hours: electrolyser_cf.iter().filter(|cf| **cf > 0.0).count() as f64,
            stack_degradation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::parameters;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn operation() -> HourlyOperation {
        HourlyOperation {
            generator_cf: vec![0.0, 0.5, 1.0, 0.1],
            electrolyser_cf: vec![0.0, 0.5, 1.0, 0.3],
            battery_net_charge: vec![0.0, 0.0, 1.0, -2.0],
            battery_state_of_charge: vec![0.0; 4],
            hydrogen: vec![0.0, 0.1, 0.2, 0.06],
            product: vec![0.0, 0.1, 0.2, 0.06],
            hydrogen_storage: vec![0.0; 4],
            hydrogen_vented: vec![0.0; 4],
        }
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(fraction_where(&[], |_| true), 0.0);
    }

    #[rstest]
    fn test_summarise(parameters: SimulationParameters) {
        let aggregator = AnnualSummaryAggregator::new(&parameters, false);
        let record = aggregator.summarise(3, &operation(), 0.05);

        assert_eq!(record.year, 3);
        assert_approx_eq!(f64, record.generator_capacity_factor, 0.4);
        assert_eq!(record.time_at_rated_capacity, 0.25);
        assert_eq!(record.time_operating, 0.75);
        assert_approx_eq!(f64, record.electrolyser_capacity_factor, 0.45);
        assert_approx_eq!(Energy, record.energy_consumed, Energy(18.0));
        // The last hour draws 2 MWh more than the power plant generates
        assert_approx_eq!(Energy, record.surplus_energy, Energy(-2.0));
        assert_approx_eq!(Energy, record.exported_energy, Energy(0.0));
        assert_approx_eq!(Energy, record.battery_output, Energy(2.0 * 0.925));
        assert_approx_eq!(Mass, record.hydrogen_output, Mass(0.36));
        assert_eq!(record.operating_hours, 3.0);
        assert_eq!(record.stack_degradation, 0.05);
    }

    #[rstest]
    fn test_summarise_clamped_surplus(parameters: SimulationParameters) {
        let aggregator = AnnualSummaryAggregator::new(&parameters, true);
        let record = aggregator.summarise(1, &operation(), 0.0);
        assert_approx_eq!(Energy, record.surplus_energy, Energy(0.0));
    }

    #[rstest]
    fn test_exported_energy_ignores_battery_hours(parameters: SimulationParameters) {
        // 2 MWh spare in the first hour; the battery covers a 2 MWh shortfall in the second
        let operation = HourlyOperation {
            generator_cf: vec![1.0, 0.1],
            electrolyser_cf: vec![0.8, 0.3],
            battery_net_charge: vec![1.0, -2.0],
            ..Default::default()
        };
        let aggregator = AnnualSummaryAggregator::new(&parameters, false);
        let record = aggregator.summarise(1, &operation, 0.0);
        assert_approx_eq!(Energy, record.surplus_energy, Energy(0.0), epsilon = 1e-9);
        assert_approx_eq!(Energy, record.exported_energy, Energy(2.0), epsilon = 1e-9);
    }

    #[rstest]
    fn test_summarise_empty(parameters: SimulationParameters) {
        let aggregator = AnnualSummaryAggregator::new(&parameters, false);
        let record = aggregator.summarise(1, &HourlyOperation::default(), 0.0);
        assert_eq!(record.generator_capacity_factor, 0.0);
        assert_eq!(record.electrolyser_capacity_factor, 0.0);
        assert_eq!(record.hydrogen_output, Mass(0.0));
    }
}
