//! General functions related to finance.
use crate::units::{Dimensionless, Mass, Money, MoneyPerMass};

/// Round a value to the nearest thousand
pub fn round_to_nearest_thousand(value: Money) -> Money {
    Money((value.0 / 1000.0).round() * 1000.0)
}

/// Round a value to two decimal places
pub fn round_to_cents(value: Money) -> Money {
    Money((value.0 * 100.0).round() / 100.0)
}

/// A reference point for an experience (learning) curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperienceCurve {
    /// Capacity at which `reference_cost` applies
    pub reference_capacity: f64,
    /// Cost per unit of capacity at the reference capacity
    pub reference_cost: f64,
    /// Fractional cost reduction for each `fold_increase` in capacity
    pub cost_reduction: Dimensionless,
    /// The increase in capacity to which `cost_reduction` applies
    pub fold_increase: f64,
}

impl ExperienceCurve {
    /// Calculates the capital cost of a unit of the given capacity, rounded to the nearest
    /// thousand.
    ///
    /// The capacity must be in the same units as the reference capacity. A capacity of zero costs
    /// nothing.
    pub fn capex(&self, capacity: f64) -> Money {
        if capacity <= 0.0 {
            return Money(0.0);
        }

        let folds = (capacity / self.reference_capacity).ln() / self.fold_increase.ln();
        let reduction = Dimensionless(1.0) - (Dimensionless(1.0) - self.cost_reduction).powf(folds);
        let unit_cost = self.reference_cost * (1.0 - reduction.value());
        round_to_nearest_thousand(Money(capacity * unit_cost))
    }
}

/// The inflation multiplier for a project year (1-based)
fn inflation_factor(inflation_rate: Dimensionless, year: u32) -> Dimensionless {
    (Dimensionless(1.0) + inflation_rate).powf(f64::from(year))
}

/// A cost which is the same every year (before inflation), for years `1..=years`
pub fn opex_per_year_inflation_constant(
    cost: Money,
    inflation_rate: Dimensionless,
    years: u32,
) -> Vec<Money> {
    (1..=years)
        .map(|year| round_to_cents(cost * inflation_factor(inflation_rate, year)))
        .collect()
}

/// A constant annual cost plus an additional cost in particular years (e.g. replacements)
pub fn opex_per_year_with_additional_cost(
    cost: Money,
    additional_cost: Money,
    additional_years: &[u32],
    inflation_rate: Dimensionless,
    years: u32,
) -> Vec<Money> {
    (1..=years)
        .map(|year| {
            let mut total = cost;
            if additional_years.contains(&year) {
                total += additional_cost;
            }
            round_to_cents(total * inflation_factor(inflation_rate, year))
        })
        .collect()
}

/// A cost which varies from year to year. `costs[0]` is the cost in year 1.
pub fn opex_per_year_variable(costs: &[Money], inflation_rate: Dimensionless) -> Vec<Money> {
    (1..)
        .zip(costs)
        .map(|(year, cost)| round_to_cents(*cost * inflation_factor(inflation_rate, year)))
        .collect()
}

/// The discount multiplier for a project year (1-based)
pub fn discount_factor(discount_rate: Dimensionless, year: u32) -> Dimensionless {
    Dimensionless(1.0) / (Dimensionless(1.0) + discount_rate).powf(f64::from(year))
}

/// Sum of a series of annual values discounted to the start of the project.
///
/// `values[0]` belongs to year 1.
pub fn discounted_sum(values: &[f64], discount_rate: Dimensionless) -> f64 {
    (1..)
        .zip(values)
        .map(|(year, value)| value * discount_factor(discount_rate, year).value())
        .sum()
}

/// Calculates the levelised cost of a product per kg.
///
/// # Arguments
///
/// * `capex` - Upfront cost
/// * `opex` - Operating cost in each project year
/// * `output` - Product output in each project year
/// * `discount_rate` - Discount rate
///
/// # Returns
///
/// The levelised cost, or zero if there is no output.
pub fn levelised_cost(
    capex: Money,
    opex: &[Money],
    output: &[Mass],
    discount_rate: Dimensionless,
) -> MoneyPerMass {
    let output: Vec<f64> = output.iter().map(|mass| mass.value()).collect();
    let discounted_output = Mass(discounted_sum(&output, discount_rate));
    if discounted_output.value() <= 0.0 {
        return MoneyPerMass(0.0);
    }

    let opex: Vec<f64> = opex.iter().map(|cost| cost.value()).collect();
    let discounted_cost = Money(discounted_sum(&opex, discount_rate)) + capex;

    // Output is in tonnes
    discounted_cost / discounted_output / Dimensionless(1000.0)
}
