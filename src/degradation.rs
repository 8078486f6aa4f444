//! Year-on-year stack degradation and equipment replacement bookkeeping.
use crate::parameters::{SimulationParameters, StackReplacementType};

/// The degradation multiplier for a stack which has been running for `age` years.
///
/// This is the fraction of output lost, so zero means no degradation.
pub fn degradation_after(rate: f64, age: u32) -> f64 {
    if rate == 0.0 {
        0.0
    } else {
        1.0 - (1.0 + rate).powf(-f64::from(age))
    }
}

/// The stack degradation multiplier for a project year (1-based).
///
/// # Arguments
///
/// * `rate` - Annual stack degradation rate
/// * `year` - The project year
/// * `last_replacement_year` - The last year in which the stack was replaced (0 if never)
pub fn stack_degradation(rate: f64, year: u32, last_replacement_year: u32) -> f64 {
    degradation_after(rate, year.saturating_sub(1 + last_replacement_year))
}

/// Stack replacement years under the cumulative-hours policy.
///
/// Operating hours are accumulated year by year and the stack is replaced whenever the total
/// reaches the stack lifetime, at which point the lifetime is subtracted from the total. The
/// final year is never a replacement year.
///
/// # Arguments
///
/// * `operating_hours` - Operating hours in each project year
/// * `stack_lifetime` - Stack lifetime in operating hours
pub fn cumulative_hours_replacement_years(operating_hours: &[f64], stack_lifetime: f64) -> Vec<u32> {
    let final_year = operating_hours.len();
    let mut cumulative = 0.0;
    let mut years = Vec::new();
    for (year, hours) in (1..).zip(operating_hours) {
        cumulative += hours;
        if cumulative >= stack_lifetime {
            cumulative -= stack_lifetime;
            if (year as usize) < final_year {
                years.push(year);
            }
        }
    }

    years
}

/// Stack replacement years under the maximum-degradation-level policy.
///
/// The stack is replaced in any year where its degradation would exceed `threshold`.
pub fn maximum_degradation_replacement_years(
    rate: f64,
    threshold: f64,
    project_timeline: u32,
) -> Vec<u32> {
    let mut age = 1;
    let mut years = Vec::new();
    for year in 1..project_timeline {
        if degradation_after(rate, age) > threshold {
            years.push(year);
            age = 1;
        } else {
            age += 1;
        }
    }

    years
}

/// Battery replacement years: every whole battery lifetime before the end of the project
pub fn battery_replacement_years(battery_lifetime: u32, project_timeline: u32) -> Vec<u32> {
    if battery_lifetime == 0 {
        return Vec::new();
    }

    (1..)
        .map(|n| n * battery_lifetime)
        .take_while(|year| *year < project_timeline)
        .collect()
}

/// The mutable degradation counters for a single project run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DegradationState {
    cumulative_hours: f64,
    last_replacement_year: u32,
    replacement_years: Vec<u32>,
}

impl DegradationState {
    /// The stack replacement years recorded so far
    pub fn replacement_years(&self) -> &[u32] {
        &self.replacement_years
    }

    /// Consume the state, returning the stack replacement years
    pub fn into_replacement_years(self) -> Vec<u32> {
        self.replacement_years
    }
}

/// How the stack replacement years are determined
#[derive(Debug, Clone, PartialEq)]
enum ReplacementPolicy {
    CumulativeHours { stack_lifetime: f64 },
    MaximumDegradationLevel { threshold: f64 },
}

/// Tracks stack degradation across the years of a project
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationTracker {
    policy: ReplacementPolicy,
    rate: f64,
    project_timeline: u32,
}

impl DegradationTracker {
    /// Create a [`DegradationTracker`] from the simulation parameters
    pub fn from_parameters(parameters: &SimulationParameters) -> Self {
        let policy = match parameters.stack_replacement_type {
            StackReplacementType::CumulativeHours => ReplacementPolicy::CumulativeHours {
                stack_lifetime: parameters.stack_lifetime,
            },
            StackReplacementType::MaximumDegradationLevel => {
                ReplacementPolicy::MaximumDegradationLevel {
                    threshold: parameters.maximum_degradation_before_replacement,
                }
            }
        };

        Self {
            policy,
            rate: parameters.stack_degradation,
            project_timeline: parameters.project_timeline,
        }
    }

    /// Create the state for a new project run.
    ///
    /// Under the maximum-degradation-level policy the replacement years are known up front.
    pub fn initial_state(&self) -> DegradationState {
        let replacement_years = match self.policy {
            ReplacementPolicy::CumulativeHours { .. } => Vec::new(),
            ReplacementPolicy::MaximumDegradationLevel { threshold } => {
                maximum_degradation_replacement_years(self.rate, threshold, self.project_timeline)
            }
        };

        DegradationState {
            replacement_years,
            ..Default::default()
        }
    }

    /// Begin a project year (1-based), returning the stack degradation multiplier for the year
    pub fn start_year(&self, state: &mut DegradationState, year: u32) -> f64 {
        if year > 1 && state.replacement_years.contains(&(year - 1)) {
            state.last_replacement_year = year - 1;
        }

        stack_degradation(self.rate, year, state.last_replacement_year)
    }

    /// Finish a project year, recording the stack's operating hours
    pub fn end_year(&self, state: &mut DegradationState, year: u32, operating_hours: f64) {
        let ReplacementPolicy::CumulativeHours { stack_lifetime } = self.policy else {
            return;
        };

        state.cumulative_hours += operating_hours;
        if state.cumulative_hours >= stack_lifetime {
            state.cumulative_hours -= stack_lifetime;
            if year < self.project_timeline {
                state.replacement_years.push(year);
            }
        }
    }

    /// Stack replacement years when every project year has the same operating hours
    pub fn replacement_years_for_constant_operation(&self, operating_hours: f64) -> Vec<u32> {
        match self.policy {
            ReplacementPolicy::CumulativeHours { stack_lifetime } => {
                let hours = vec![operating_hours; self.project_timeline as usize];
                cumulative_hours_replacement_years(&hours, stack_lifetime)
            }
            ReplacementPolicy::MaximumDegradationLevel { threshold } => {
                maximum_degradation_replacement_years(self.rate, threshold, self.project_timeline)
            }
        }
    }
}
