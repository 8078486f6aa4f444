//! Maps the power plant's capacity factor onto the electrolyser's capacity factor, including
//! short-term overloading.
use crate::parameters::SimulationParameters;

/// Overloading settings for the electrolyser
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overload {
    /// Load while overloading, as a fraction of nameplate capacity
    pub load: f64,
    /// Number of hours after an overload during which the electrolyser may not overload again
    pub cooldown_hours: usize,
}

/// How the electrolyser responds to the power available from the power plant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadModel {
    /// Power plant capacity divided by electrolyser capacity
    pub oversize_ratio: f64,
    /// Minimum load; below this the electrolyser is switched off
    pub minimum_load: f64,
    /// Maximum load in normal operation
    pub maximum_load: f64,
    /// Overloading settings, if overloading is allowed
    pub overload: Option<Overload>,
}

impl LoadModel {
    /// Create a [`LoadModel`] from the simulation parameters
    pub fn from_parameters(parameters: &SimulationParameters) -> Self {
        let overload = (parameters.overload_enabled() && parameters.time_between_overloading > 0)
            .then(|| Overload {
                load: parameters.maximum_load_when_overloading,
                cooldown_hours: parameters.time_between_overloading as usize,
            });

        Self {
            oversize_ratio: parameters.oversize_ratio(),
            minimum_load: parameters.electrolyser_minimum_load,
            maximum_load: parameters.electrolyser_maximum_load,
            overload,
        }
    }

    /// Calculate the electrolyser's hourly capacity factors, including any overloading
    pub fn capacity_factors(&self, generator_cf: &[f64]) -> Vec<f64> {
        let electrolyser_cf = electrolyser_capacity_factors(
            generator_cf,
            self.oversize_ratio,
            self.minimum_load,
            self.maximum_load,
        );

        match self.overload {
            Some(overload) => apply_overload(
                generator_cf,
                &electrolyser_cf,
                self.oversize_ratio,
                self.maximum_load,
                overload,
            ),
            None => electrolyser_cf,
        }
    }
}

/// Clip the available load to the electrolyser's operating range.
///
/// Loads above the maximum are capped at the maximum, but loads below the minimum switch the
/// electrolyser off rather than being raised to the minimum.
pub fn clip_load(available: f64, minimum_load: f64, maximum_load: f64) -> f64 {
    if available > maximum_load {
        maximum_load
    } else if available < minimum_load {
        0.0
    } else {
        available
    }
}

/// Calculate the electrolyser's hourly capacity factors without overloading.
///
/// # Arguments
///
/// * `generator_cf` - Hourly power plant capacity factors
/// * `oversize_ratio` - Power plant capacity divided by electrolyser capacity
/// * `minimum_load` - Minimum electrolyser load
/// * `maximum_load` - Maximum electrolyser load
pub fn electrolyser_capacity_factors(
    generator_cf: &[f64],
    oversize_ratio: f64,
    minimum_load: f64,
    maximum_load: f64,
) -> Vec<f64> {
    generator_cf
        .iter()
        .map(|cf| clip_load(cf * oversize_ratio, minimum_load, maximum_load))
        .collect()
}

/// Apply overloading to the electrolyser capacity factors.
///
/// An hour may be overloaded if there is enough generation to exceed the maximum load and no
/// overload happened in the preceding `cooldown_hours` hours. Other hours keep the value from
/// `electrolyser_cf`.
pub fn apply_overload(
    generator_cf: &[f64],
    electrolyser_cf: &[f64],
    oversize_ratio: f64,
    maximum_load: f64,
    overload: Overload,
) -> Vec<f64> {
    let mut last_overload: Option<usize> = None;
    generator_cf
        .iter()
        .zip(electrolyser_cf)
        .enumerate()
        .map(|(hour, (generator, electrolyser))| {
            let available = generator * oversize_ratio;
            let cooling_down =
                last_overload.is_some_and(|last| hour - last <= overload.cooldown_hours);
            if available > maximum_load && !cooling_down {
                last_overload = Some(hour);
                overload.load.min(available)
            } else {
                *electrolyser
            }
        })
        .collect()
}
