//! Hour-by-hour battery dispatch.
//!
//! The battery charges from generation which the electrolyser cannot use and discharges to keep
//! the electrolyser running or to raise its load. Each hour's decision is taken from an ordered
//! list of [`DispatchRule`]s, where the first rule whose guard holds decides the net flow.
use crate::parameters::{SimulationParameters, check_battery_storage_duration};
use anyhow::{Result, bail};
use log::trace;

/// The physical characteristics of the battery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    /// Rated charge/discharge power (MW)
    pub rated_power: f64,
    /// Energy capacity (MWh)
    pub energy: f64,
    /// Round-trip efficiency
    pub efficiency: f64,
    /// Minimum state of charge
    pub min_charge: f64,
}

impl Battery {
    /// Create a [`Battery`] from the simulation parameters, if the plant has one.
    ///
    /// Returns an error if the storage duration is not one of the supported values.
    pub fn from_parameters(parameters: &SimulationParameters) -> Result<Option<Self>> {
        check_battery_storage_duration(
            parameters.battery_rated_power,
            parameters.battery_storage_duration,
        )?;

        Ok(parameters.has_battery().then(|| Self {
            rated_power: parameters.battery_rated_power,
            energy: parameters.battery_energy(),
            efficiency: parameters.battery_efficiency,
            min_charge: parameters.battery_min_charge,
        }))
    }

    /// The loss factor applied to both charging and discharging
    pub fn loss_factor(&self) -> f64 {
        battery_loss_factor(self.efficiency)
    }
}

/// The loss factor applied to each of charging and discharging for a round-trip efficiency
pub fn battery_loss_factor(efficiency: f64) -> f64 {
    1.0 - (1.0 - efficiency) / 2.0
}

/// The result of dispatching the battery over one simulated year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatteryDispatch {
    /// Electrolyser capacity factor including battery discharge
    pub electrolyser_cf: Vec<f64>,
    /// Net flow into the battery in each hour (MW; negative when discharging)
    pub net_charge: Vec<f64>,
    /// State of charge at the end of each hour
    pub state_of_charge: Vec<f64>,
}

impl BatteryDispatch {
    /// The result when there is no battery: the electrolyser is unchanged and nothing flows
    pub fn without_battery(electrolyser_cf: Vec<f64>) -> Self {
        let hours = electrolyser_cf.len();
        Self {
            electrolyser_cf,
            net_charge: vec![0.0; hours],
            state_of_charge: vec![0.0; hours],
        }
    }
}

/// The battery and electrolyser data shared by every hour of a dispatch
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    battery: Battery,
    /// Electrolyser nameplate capacity (MW)
    electrolyser_capacity: f64,
    minimum_load: f64,
    maximum_load: f64,
    loss_factor: f64,
}

/// The state seen by the dispatch rules in one hour
#[derive(Debug, Clone, Copy)]
pub struct Hour {
    /// Generation the electrolyser cannot use (MWh)
    excess: f64,
    /// Electrolyser capacity factor before dispatch
    electrolyser_cf: f64,
    /// State of charge at the end of the previous hour
    previous_soc: f64,
    /// Energy which may be drawn before reaching the minimum charge (MWh)
    available: f64,
}

/// One guarded rule of the dispatch decision list
pub struct DispatchRule {
    /// Short description, used in trace logging and tests
    pub name: &'static str,
    applies: fn(&Dispatcher, &Hour) -> bool,
    net_charge: fn(&Dispatcher, &Hour) -> f64,
}

/// The dispatch rules in priority order
static DISPATCH_RULES: [DispatchRule; 7] = [
    DispatchRule {
        name: "discharge to start electrolyser",
        applies: can_start_with_battery,
        net_charge: discharge_to_minimum_load,
    },
    DispatchRule {
        name: "charge to full",
        applies: excess_would_overfill,
        net_charge: charge_to_full,
    },
    DispatchRule {
        name: "charge from excess",
        applies: has_excess,
        net_charge: charge_from_excess,
    },
    DispatchRule {
        name: "idle",
        applies: cannot_run_or_empty,
        net_charge: no_flow,
    },
    DispatchRule {
        name: "discharge all available",
        applies: headroom_exceeds_storage,
        net_charge: discharge_available,
    },
    DispatchRule {
        name: "discharge to maximum load",
        applies: can_reach_maximum_load,
        net_charge: discharge_to_maximum_load,
    },
    DispatchRule {
        name: "no excess",
        applies: no_excess,
        net_charge: no_flow,
    },
];

fn can_start_with_battery(d: &Dispatcher, h: &Hour) -> bool {
    h.electrolyser_cf == 0.0
        && h.excess + d.battery.rated_power.min(h.available) * d.loss_factor
            >= d.minimum_load * d.electrolyser_capacity
}

fn discharge_to_minimum_load(d: &Dispatcher, h: &Hour) -> f64 {
    let shortfall = d.minimum_load * d.electrolyser_capacity - h.excess;
    -d.battery.rated_power.min(shortfall / d.loss_factor)
}

fn excess_would_overfill(d: &Dispatcher, h: &Hour) -> bool {
    h.excess > 0.0
        && h.previous_soc + d.battery.rated_power.min(h.excess * d.loss_factor) / d.battery.energy
            > 1.0
}

fn charge_to_full(d: &Dispatcher, h: &Hour) -> f64 {
    (1.0 - h.previous_soc) * d.battery.energy
}

fn has_excess(_: &Dispatcher, h: &Hour) -> bool {
    h.excess > 0.0
}

fn charge_from_excess(d: &Dispatcher, h: &Hour) -> f64 {
    d.battery.rated_power.min(h.excess * d.loss_factor)
}

fn cannot_run_or_empty(d: &Dispatcher, h: &Hour) -> bool {
    h.electrolyser_cf == 0.0 || (h.excess <= 0.0 && h.previous_soc <= d.battery.min_charge)
}

fn below_maximum_without_excess(d: &Dispatcher, h: &Hour) -> bool {
    h.excess <= 0.0 && h.electrolyser_cf > 0.0 && h.electrolyser_cf < d.maximum_load
}

/// Energy needed to bring the electrolyser up to maximum load (MWh)
fn headroom(d: &Dispatcher, h: &Hour) -> f64 {
    (d.maximum_load - h.electrolyser_cf) * d.electrolyser_capacity
}

fn headroom_exceeds_storage(d: &Dispatcher, h: &Hour) -> bool {
    below_maximum_without_excess(d, h) && headroom(d, h) > h.available * d.loss_factor
}

fn discharge_available(d: &Dispatcher, h: &Hour) -> f64 {
    -d.battery.rated_power.min(h.available)
}

fn can_reach_maximum_load(d: &Dispatcher, h: &Hour) -> bool {
    below_maximum_without_excess(d, h)
}

fn discharge_to_maximum_load(d: &Dispatcher, h: &Hour) -> f64 {
    -d.battery.rated_power.min(headroom(d, h) / d.loss_factor)
}

fn no_excess(_: &Dispatcher, h: &Hour) -> bool {
    h.excess <= 0.0
}

fn no_flow(_: &Dispatcher, _: &Hour) -> f64 {
    0.0
}

impl Dispatcher {
    /// Create a new [`Dispatcher`]
    pub fn new(
        battery: Battery,
        electrolyser_capacity: f64,
        minimum_load: f64,
        maximum_load: f64,
    ) -> Self {
        Self {
            battery,
            electrolyser_capacity,
            minimum_load,
            maximum_load,
            loss_factor: battery.loss_factor(),
        }
    }

    /// Build the state seen by the rules for an hour
    fn hour(&self, excess: f64, electrolyser_cf: f64, previous_soc: f64) -> Hour {
        Hour {
            excess,
            electrolyser_cf,
            previous_soc,
            available: (previous_soc - self.battery.min_charge).max(0.0) * self.battery.energy,
        }
    }

    /// Find the first rule which applies to the hour
    fn select_rule(&self, hour: &Hour) -> Option<&'static DispatchRule> {
        DISPATCH_RULES.iter().find(|rule| (rule.applies)(self, hour))
    }

    /// The electrolyser capacity factor after the battery's contribution
    fn electrolyser_cf_with_battery(&self, excess: f64, electrolyser_cf: f64, net: f64) -> f64 {
        if net < 0.0 {
            let delivered = excess.max(0.0) + -net * self.loss_factor;
            (electrolyser_cf + delivered / self.electrolyser_capacity).min(self.maximum_load)
        } else {
            electrolyser_cf
        }
    }

    /// Dispatch the battery over one simulated year.
    ///
    /// # Arguments
    ///
    /// * `generator_cf` - Hourly power plant capacity factors
    /// * `electrolyser_cf` - Hourly electrolyser capacity factors before dispatch
    /// * `oversize_ratio` - Power plant capacity divided by electrolyser capacity
    ///
    /// # Returns
    ///
    /// The dispatch result, or an error if no rule covers an hour's state.
    pub fn dispatch(
        &self,
        generator_cf: &[f64],
        electrolyser_cf: &[f64],
        oversize_ratio: f64,
    ) -> Result<BatteryDispatch> {
        let excess = excess_generation(
            generator_cf,
            electrolyser_cf,
            oversize_ratio,
            self.electrolyser_capacity,
        );
        let hours = excess.len();
        let mut result = BatteryDispatch {
            electrolyser_cf: Vec::with_capacity(hours),
            net_charge: Vec::with_capacity(hours),
            state_of_charge: Vec::with_capacity(hours),
        };
        if hours == 0 {
            return Ok(result);
        }

        // The battery starts empty and takes what it can from the first hour
        let first = self
            .battery
            .rated_power
            .min(excess[0].max(0.0) * self.loss_factor);
        result.net_charge.push(first);
        result.state_of_charge.push(first / self.battery.energy);
        result.electrolyser_cf.push(electrolyser_cf[0]);

        let mut soc = first / self.battery.energy;
        for hour in 1..hours {
            let state = self.hour(excess[hour], electrolyser_cf[hour], soc);
            let Some(rule) = self.select_rule(&state) else {
                bail!(
                    "No battery dispatch rule applies in hour {hour} (excess generation: {}, \
                    electrolyser capacity factor: {}, state of charge: {soc})",
                    excess[hour],
                    electrolyser_cf[hour]
                );
            };
            let net = (rule.net_charge)(self, &state);
            trace!("Hour {hour}: {} ({net} MW)", rule.name);

            soc += net / self.battery.energy;
            result.net_charge.push(net);
            result.state_of_charge.push(soc);
            result.electrolyser_cf.push(self.electrolyser_cf_with_battery(
                excess[hour],
                electrolyser_cf[hour],
                net,
            ));
        }

        Ok(result)
    }
}

/// Generation which the electrolyser does not consume in each hour (MWh).
///
/// # Arguments
///
/// * `generator_cf` - Hourly power plant capacity factors
/// * `electrolyser_cf` - Hourly electrolyser capacity factors
/// * `oversize_ratio` - Power plant capacity divided by electrolyser capacity
/// * `electrolyser_capacity` - Electrolyser nameplate capacity (MW)
pub fn excess_generation(
    generator_cf: &[f64],
    electrolyser_cf: &[f64],
    oversize_ratio: f64,
    electrolyser_capacity: f64,
) -> Vec<f64> {
    generator_cf
        .iter()
        .zip(electrolyser_cf)
        .map(|(g, e)| (g * oversize_ratio - e) * electrolyser_capacity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::electrolyser::{Overload, apply_overload, electrolyser_capacity_factors};
    use crate::fixture::{assert_error, parameters};
    use crate::simulation::HourlyOperation;
    use crate::summary::AnnualSummaryAggregator;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn dispatcher() -> Dispatcher {
        let battery = Battery {
            rated_power: 2.0,
            energy: 4.0,
            efficiency: 0.8,
            min_charge: 0.1,
        };
        Dispatcher::new(battery, 10.0, 0.2, 1.0)
    }

    #[test]
    fn test_battery_loss_factor() {
        assert_approx_eq!(f64, battery_loss_factor(0.8), 0.9);
        assert_approx_eq!(f64, battery_loss_factor(1.0), 1.0);
    }

    #[rstest]
    #[case(1.0, 0.0, 0.5, "discharge to start electrolyser", -1.0 / 0.9)]
    #[case(3.0, 1.0, 0.9, "charge to full", 0.4)]
    #[case(3.0, 1.0, 0.2, "charge from excess", 2.0)]
    #[case(1.0, 1.0, 0.2, "charge from excess", 0.9)]
    #[case(0.0, 0.0, 0.3, "idle", 0.0)] // battery alone cannot reach minimum load
    #[case(0.0, 0.5, 0.1, "idle", 0.0)] // battery at minimum charge
    #[case(0.0, 0.5, 0.5, "discharge all available", -1.6)]
    #[case(0.0, 0.95, 0.5, "discharge to maximum load", -0.5 / 0.9)]
    #[case(0.0, 1.0, 0.5, "no excess", 0.0)] // already at maximum load
    fn test_dispatch_rules(
        dispatcher: Dispatcher,
        #[case] excess: f64,
        #[case] electrolyser_cf: f64,
        #[case] previous_soc: f64,
        #[case] expected_rule: &str,
        #[case] expected_net: f64,
    ) {
        let hour = dispatcher.hour(excess, electrolyser_cf, previous_soc);
        let rule = dispatcher.select_rule(&hour).unwrap();
        assert_eq!(rule.name, expected_rule);
        assert_approx_eq!(f64, (rule.net_charge)(&dispatcher, &hour), expected_net);
    }

    #[rstest]
    fn test_battery_from_parameters(mut parameters: SimulationParameters) {
        assert_eq!(Battery::from_parameters(&parameters).unwrap(), None);

        parameters.battery_rated_power = 2.0;
        parameters.battery_storage_duration = 4;
        let battery = Battery::from_parameters(&parameters).unwrap().unwrap();
        assert_eq!(battery.energy, 8.0);

        parameters.battery_storage_duration = 0;
        assert_error!(
            Battery::from_parameters(&parameters),
            "Invalid battery storage duration 0 hours: must be one of [1, 2, 4, 8]"
        );
    }

    #[rstest]
    fn test_dispatch_with_overload(dispatcher: Dispatcher, parameters: SimulationParameters) {
        let generator_cf = [1.5, 1.0, 1.0, 1.1];
        let electrolyser_cf = apply_overload(
            &generator_cf,
            &electrolyser_capacity_factors(&generator_cf, 1.0, 0.2, 1.0),
            1.0,
            1.0,
            Overload {
                load: 1.2,
                cooldown_hours: 2,
            },
        );
        assert_eq!(electrolyser_cf, [1.2, 1.0, 1.0, 1.1]);

        // The last hour is overloaded on generation alone, so the battery leaves it alone
        let hour = dispatcher.hour(0.0, 1.1, 0.5);
        assert_eq!(dispatcher.select_rule(&hour).unwrap().name, "no excess");

        let result = dispatcher
            .dispatch(&generator_cf, &electrolyser_cf, 1.0)
            .unwrap();
        assert_eq!(result.net_charge, [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(result.electrolyser_cf, electrolyser_cf);
        assert_eq!(result.state_of_charge, [0.5; 4]);

        // Overloaded hours are not counted as running at rated capacity
        let operation = HourlyOperation {
            generator_cf: generator_cf.to_vec(),
            electrolyser_cf: result.electrolyser_cf,
            battery_net_charge: result.net_charge,
            battery_state_of_charge: result.state_of_charge,
            ..Default::default()
        };
        let record = AnnualSummaryAggregator::new(&parameters, false).summarise(1, &operation, 0.0);
        assert_eq!(record.time_at_rated_capacity, 0.5);
        assert_eq!(record.time_operating, 1.0);
    }

    #[rstest]
    fn test_electrolyser_cf_with_battery(dispatcher: Dispatcher) {
        // Battery tops up sub-minimum generation to exactly the minimum load
        assert_approx_eq!(
            f64,
            dispatcher.electrolyser_cf_with_battery(1.0, 0.0, -1.0 / 0.9),
            0.2
        );

        // Discharge is capped at the maximum load
        assert_approx_eq!(
            f64,
            dispatcher.electrolyser_cf_with_battery(0.0, 0.95, -2.0),
            1.0
        );

        // Charging leaves the electrolyser unchanged
        assert_eq!(dispatcher.electrolyser_cf_with_battery(3.0, 1.0, 2.0), 1.0);
    }

    #[rstest]
    fn test_dispatch_non_finite_input(dispatcher: Dispatcher) {
        let generator_cf = [0.5, f64::NAN];
        let electrolyser_cf = [0.5, f64::NAN];
        assert_error!(
            dispatcher.dispatch(&generator_cf, &electrolyser_cf, 1.0),
            "No battery dispatch rule applies in hour 1 (excess generation: NaN, electrolyser \
            capacity factor: NaN, state of charge: 0)"
        );
    }

    #[rstest]
    fn test_dispatch_empty(dispatcher: Dispatcher) {
        let result = dispatcher.dispatch(&[], &[], 1.0).unwrap();
        assert!(result.net_charge.is_empty());
    }

    #[rstest]
    fn test_dispatch_first_hour(dispatcher: Dispatcher) {
        // 15 MW of generation, 10 MW used, so 5 MW is available but charging is capped at 2 MW
        let generator_cf = [1.5, 0.1];
        let electrolyser_cf = electrolyser_capacity_factors(&generator_cf, 1.0, 0.2, 1.0);
        let result = dispatcher
            .dispatch(&generator_cf, &electrolyser_cf, 1.0)
            .unwrap();
        assert_eq!(result.net_charge[0], 2.0);
        assert_eq!(result.state_of_charge[0], 0.5);

        // Second hour: too little generation to run, but the battery makes up the difference
        assert!(result.net_charge[1] < 0.0);
        assert_approx_eq!(f64, result.electrolyser_cf[1], 0.2);
    }

    /// A deterministic, varied generation profile for a full year
    fn varied_generation() -> Vec<f64> {
        (0..8760)
            .map(|hour| {
                let hour = f64::from(hour);
                let daily = (hour * std::f64::consts::TAU / 24.0).sin().max(0.0);
                let weather = 0.5 + 0.5 * (hour * 0.013).sin();
                daily * weather
            })
            .collect()
    }

    #[rstest]
    fn test_dispatch_energy_conservation(dispatcher: Dispatcher) {
        let oversize_ratio = 1.8;
        let generator_cf = varied_generation();
        let electrolyser_cf = electrolyser_capacity_factors(&generator_cf, oversize_ratio, 0.2, 1.0);
        let result = dispatcher
            .dispatch(&generator_cf, &electrolyser_cf, oversize_ratio)
            .unwrap();

        let spilled: f64 = excess_generation(&generator_cf, &electrolyser_cf, oversize_ratio, 10.0)
            .iter()
            .map(|x| x.max(0.0))
            .sum();
        let charged: f64 = result.net_charge.iter().filter(|x| **x > 0.0).sum();
        let discharged: f64 = -result
            .net_charge
            .iter()
            .filter(|x| **x < 0.0)
            .sum::<f64>();
        let loss_factor = dispatcher.loss_factor;

        assert!(charged > 0.0 && discharged > 0.0);
        assert!(charged <= spilled * loss_factor + 1e-9);
        assert!((charged - discharged) * loss_factor <= spilled + 1e-9);
        assert!(discharged <= charged + 1e-9);

        for (soc, cf) in result.state_of_charge.iter().zip(&result.electrolyser_cf) {
            assert!((-1e-9..=1.0 + 1e-9).contains(soc));
            assert!((0.0..=1.0).contains(cf));
        }
    }
}
