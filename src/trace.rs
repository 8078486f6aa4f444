//! Hourly renewable generation traces and the sampling of a location's power-plant capacity
//! factors for a given project year.
use crate::id::LocationID;
use crate::parameters::{PowerPlantTechnology, SimulationParameters};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;

/// A table of hourly capacity factors with one column per named location
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceTable {
    columns: IndexMap<LocationID, Vec<f64>>,
    hours: usize,
}

impl TraceTable {
    /// Create a new [`TraceTable`] from named columns.
    ///
    /// All columns must have the same length.
    pub fn new(columns: IndexMap<LocationID, Vec<f64>>) -> Result<Self> {
        let hours = columns.values().next().map_or(0, Vec::len);
        for (location, column) in &columns {
            ensure!(
                column.len() == hours,
                "Trace for location {location} has {} hours, expected {hours}",
                column.len()
            );
        }

        Ok(Self { columns, hours })
    }

    /// The number of hours in each column
    pub fn hours(&self) -> usize {
        self.hours
    }

    /// Iterate over the location names in the table
    pub fn iter_locations(&self) -> impl Iterator<Item = &LocationID> {
        self.columns.keys()
    }

    /// Get the hourly capacity factors for the given location
    pub fn get(&self, location: &str) -> Result<&[f64]> {
        self.columns
            .get(location)
            .map(Vec::as_slice)
            .with_context(|| {
                format!(
                    "Unknown location {location} (available: {})",
                    self.iter_locations().join(", ")
                )
            })
    }
}

/// The solar and wind trace tables supplied to a simulation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Traces {
    /// Solar capacity factors
    pub solar: TraceTable,
    /// Wind capacity factors
    pub wind: TraceTable,
}

/// A solar or wind trace for one location with its annual linear degradation rate
#[derive(Debug, Clone, Copy)]
struct DegradingTrace<'a> {
    capacity_factors: &'a [f64],
    /// Fraction of output lost per year
    degradation: f64,
    /// Nameplate capacity in MW, used for weighting hybrid plants
    capacity: f64,
}

impl DegradingTrace<'_> {
    /// The multiplier applied to the trace in the given project year (1-based)
    fn degradation_factor(&self, year: u32) -> f64 {
        (1.0 - self.degradation * f64::from(year.saturating_sub(1))).max(0.0)
    }
}

/// Extracts the power plant's hourly capacity factors for each project year
#[derive(Debug, Clone)]
pub struct TraceSampler<'a> {
    solar: Option<DegradingTrace<'a>>,
    wind: Option<DegradingTrace<'a>>,
    hours: usize,
}

impl<'a> TraceSampler<'a> {
    /// Create a sampler for the location and technology given in `parameters`
    pub fn new(parameters: &SimulationParameters, traces: &'a Traces) -> Result<Self> {
        let location = parameters.location.as_str();
        let solar_trace = || -> Result<DegradingTrace<'a>> {
            Ok(DegradingTrace {
                capacity_factors: traces.solar.get(location).context("Invalid solar traces")?,
                degradation: parameters.solar_degradation,
                capacity: parameters.solar_nominal_capacity,
            })
        };
        let wind_trace = || -> Result<DegradingTrace<'a>> {
            Ok(DegradingTrace {
                capacity_factors: traces.wind.get(location).context("Invalid wind traces")?,
                degradation: parameters.wind_degradation,
                capacity: parameters.wind_nominal_capacity,
            })
        };

        let (solar, wind) = match parameters.power_plant_technology {
            PowerPlantTechnology::Solar => (Some(solar_trace()?), None),
            PowerPlantTechnology::Wind => (None, Some(wind_trace()?)),
            PowerPlantTechnology::Hybrid => {
                let solar = solar_trace()?;
                let wind = wind_trace()?;
                ensure!(
                    solar.capacity_factors.len() == wind.capacity_factors.len(),
                    "Solar and wind traces for location {location} have different lengths \
                    ({} vs {})",
                    solar.capacity_factors.len(),
                    wind.capacity_factors.len()
                );
                (Some(solar), Some(wind))
            }
        };

        let hours = solar
            .or(wind)
            .map_or(0, |trace| trace.capacity_factors.len());

        Ok(Self { solar, wind, hours })
    }

    /// The number of hours in a simulated year
    pub fn hours(&self) -> usize {
        self.hours
    }

    /// Get the power plant's hourly capacity factors for the given project year (1-based).
    ///
    /// Hybrid plants are weighted by the nameplate capacity of each technology.
    pub fn sample(&self, year: u32) -> Vec<f64> {
        match (self.solar, self.wind) {
            (Some(trace), None) | (None, Some(trace)) => {
                let factor = trace.degradation_factor(year);
                trace.capacity_factors.iter().map(|cf| cf * factor).collect()
            }
            (Some(solar), Some(wind)) => {
                let total = solar.capacity + wind.capacity;
                if total <= 0.0 {
                    return vec![0.0; self.hours];
                }
                let solar_weight = solar.capacity * solar.degradation_factor(year) / total;
                let wind_weight = wind.capacity * wind.degradation_factor(year) / total;
                solar
                    .capacity_factors
                    .iter()
                    .zip(wind.capacity_factors)
                    .map(|(s, w)| s * solar_weight + w * wind_weight)
                    .collect()
            }
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, parameters};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    fn traces() -> Traces {
        Traces {
            solar: TraceTable::new(indexmap! {
                "north".into() => vec![0.0, 0.5, 1.0],
                "south".into() => vec![0.2, 0.2, 0.2],
            })
            .unwrap(),
            wind: TraceTable::new(indexmap! {
                "north".into() => vec![1.0, 0.5, 0.0],
            })
            .unwrap(),
        }
    }

    #[test]
    fn test_trace_table_new_mismatched_lengths() {
        let columns = indexmap! {
            "a".into() => vec![0.0, 1.0],
            "b".into() => vec![0.0],
        };
        assert_error!(
            TraceTable::new(columns),
            "Trace for location b has 1 hours, expected 2"
        );
    }

    #[test]
    fn test_trace_table_unknown_location() {
        assert_error!(
            traces().solar.get("east"),
            "Unknown location east (available: north, south)"
        );
    }

    #[rstest]
    fn test_sample_solar_with_degradation(mut parameters: SimulationParameters) {
        parameters.location = "north".into();
        parameters.power_plant_technology = PowerPlantTechnology::Solar;
        parameters.solar_degradation = 0.1;
        let traces = traces();
        let sampler = TraceSampler::new(&parameters, &traces).unwrap();

        assert_eq!(sampler.hours(), 3);
        assert_eq!(sampler.sample(1), vec![0.0, 0.5, 1.0]);
        let year3 = sampler.sample(3);
        assert_approx_eq!(f64, year3[1], 0.4);
        assert_approx_eq!(f64, year3[2], 0.8);

        // Degradation never drives the trace below zero
        assert!(sampler.sample(20).iter().all(|cf| *cf == 0.0));
    }

    #[rstest]
    fn test_sample_hybrid(mut parameters: SimulationParameters) {
        parameters.location = "north".into();
        parameters.power_plant_technology = PowerPlantTechnology::Hybrid;
        parameters.solar_nominal_capacity = 30.0;
        parameters.wind_nominal_capacity = 10.0;
        let traces = traces();
        let sampler = TraceSampler::new(&parameters, &traces).unwrap();

        let cf = sampler.sample(1);
        assert_approx_eq!(f64, cf[0], 0.25);
        assert_approx_eq!(f64, cf[1], 0.5);
        assert_approx_eq!(f64, cf[2], 0.75);
    }

    #[rstest]
    fn test_sampler_missing_wind_location(mut parameters: SimulationParameters) {
        parameters.location = "south".into();
        parameters.power_plant_technology = PowerPlantTechnology::Wind;
        let traces = traces();
        assert_error!(
            TraceSampler::new(&parameters, &traces),
            "Invalid wind traces"
        );
    }

    #[rstest]
    fn test_sampler_empty_traces(mut parameters: SimulationParameters) {
        parameters.location = "north".into();
        let traces = Traces {
            solar: TraceTable::new(indexmap! {"north".into() => vec![]}).unwrap(),
            wind: TraceTable::default(),
        };
        let sampler = TraceSampler::new(&parameters, &traces).unwrap();
        assert_eq!(sampler.hours(), 0);
        assert!(sampler.sample(1).is_empty());
    }
}
