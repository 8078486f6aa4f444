//! Hydrogen production and its conversion into the plant's final product.
use crate::parameters::{Product, SimulationParameters};

/// Tonnes of hydrogen needed per tonne of ammonia
pub const AMMONIA_HYDROGEN_DEMAND: f64 = 0.18;

/// Tonnes of hydrogen needed per tonne of methanol
pub const METHANOL_HYDROGEN_DEMAND: f64 = 0.192;

/// Tonnes of hydrogen needed per tonne of synthetic methane
pub const METHANE_HYDROGEN_DEMAND: f64 = 0.503;

/// Hourly hydrogen production in kg/h per MW of electrolyser capacity.
///
/// # Arguments
///
/// * `electrolyser_cf` - Hourly electrolyser capacity factors
/// * `degradation` - Stack degradation multiplier for the year
/// * `sec` - Specific energy consumption at nominal load (kWh/kg)
pub fn hydrogen_production(electrolyser_cf: &[f64], degradation: f64, sec: f64) -> Vec<f64> {
    electrolyser_cf
        .iter()
        .map(|cf| cf * 1000.0 * (1.0 - degradation) / sec)
        .collect()
}

/// Hourly output of the final product over one simulated year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductOutput {
    /// Product made in each hour (t)
    pub product: Vec<f64>,
    /// Hydrogen held in storage at the end of each hour (t)
    pub storage_level: Vec<f64>,
    /// Hydrogen vented in each hour (t)
    pub hydrogen_vented: Vec<f64>,
}

/// A unit which turns the electrolyser's hydrogen into the plant's final product
pub trait PowerToXUnit {
    /// The product made by this unit
    fn product(&self) -> Product;

    /// Convert hourly hydrogen production (t/h) into the final product
    fn produce(&self, hydrogen: &[f64]) -> ProductOutput;

    /// Whether negative hourly surplus energy is counted as zero in annual summaries
    fn clamps_negative_surplus(&self) -> bool;
}

/// The plant sells hydrogen directly
#[derive(Debug, Clone, Copy, Default)]
pub struct HydrogenOnly;

impl PowerToXUnit for HydrogenOnly {
    fn product(&self) -> Product {
        Product::Hydrogen
    }

    fn produce(&self, hydrogen: &[f64]) -> ProductOutput {
        ProductOutput {
            product: hydrogen.to_vec(),
            storage_level: vec![0.0; hydrogen.len()],
            hydrogen_vented: vec![0.0; hydrogen.len()],
        }
    }

    fn clamps_negative_surplus(&self) -> bool {
        false
    }
}

/// A synthesis unit (e.g. Haber-Bosch) fed through a hydrogen buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisUnit {
    product: Product,
    /// Tonnes of hydrogen per tonne of product
    hydrogen_demand: f64,
    /// Hydrogen demand at full capacity (t/h)
    maximum_demand: f64,
    /// Hydrogen demand at minimum turndown (t/h)
    minimum_demand: f64,
    /// Hydrogen storage capacity (t)
    storage_capacity: f64,
}

/// The hydrogen balance seen by the routing rules in one hour
#[derive(Debug, Clone, Copy)]
struct RoutingHour {
    /// Hydrogen produced (t)
    hydrogen: f64,
    /// Hydrogen in storage at the start of the hour (t)
    stored: f64,
}

/// Where an hour's hydrogen goes
#[derive(Debug, Clone, Copy, PartialEq)]
struct Routing {
    /// Hydrogen fed to the synthesis unit (t)
    consumed: f64,
    /// Change in stored hydrogen (t)
    stored: f64,
    /// Hydrogen released unused (t)
    vented: f64,
}

/// One guarded rule for routing hydrogen between the unit, storage and the vent
struct RoutingRule {
    applies: fn(&SynthesisUnit, &RoutingHour) -> bool,
    route: fn(&SynthesisUnit, &RoutingHour) -> Routing,
}

/// Routing rules in priority order. If none applies the unit is idle.
static ROUTING_RULES: [RoutingRule; 3] = [
    RoutingRule {
        applies: |unit, hour| hour.hydrogen >= unit.maximum_demand,
        route: run_at_capacity,
    },
    RoutingRule {
        applies: |unit, hour| hour.hydrogen >= unit.minimum_demand,
        route: run_on_production,
    },
    RoutingRule {
        applies: |unit, hour| hour.hydrogen + hour.stored >= unit.minimum_demand,
        route: run_from_storage,
    },
];

/// Store as much of `hydrogen` as fits and vent the remainder
fn store_or_vent(unit: &SynthesisUnit, hour: &RoutingHour, consumed: f64, hydrogen: f64) -> Routing {
    let stored = hydrogen.min(unit.storage_capacity - hour.stored).max(0.0);
    Routing {
        consumed,
        stored,
        vented: hydrogen - stored,
    }
}

fn run_at_capacity(unit: &SynthesisUnit, hour: &RoutingHour) -> Routing {
    store_or_vent(
        unit,
        hour,
        unit.maximum_demand,
        hour.hydrogen - unit.maximum_demand,
    )
}

fn run_on_production(_: &SynthesisUnit, hour: &RoutingHour) -> Routing {
    Routing {
        consumed: hour.hydrogen,
        stored: 0.0,
        vented: 0.0,
    }
}

fn run_from_storage(unit: &SynthesisUnit, hour: &RoutingHour) -> Routing {
    Routing {
        consumed: unit.minimum_demand,
        stored: hour.hydrogen - unit.minimum_demand,
        vented: 0.0,
    }
}

fn idle(unit: &SynthesisUnit, hour: &RoutingHour) -> Routing {
    store_or_vent(unit, hour, 0.0, hour.hydrogen)
}

impl SynthesisUnit {
    /// Create a new [`SynthesisUnit`].
    ///
    /// # Arguments
    ///
    /// * `product` - The product made
    /// * `capacity` - Capacity of the unit (t of product per day)
    /// * `minimum_turndown` - Minimum load as a fraction of capacity
    /// * `storage_capacity` - Hydrogen storage capacity (t)
    pub fn new(product: Product, capacity: f64, minimum_turndown: f64, storage_capacity: f64) -> Self {
        let hydrogen_demand = match product {
            Product::Ammonia => AMMONIA_HYDROGEN_DEMAND,
            Product::Methanol => METHANOL_HYDROGEN_DEMAND,
            Product::Methane => METHANE_HYDROGEN_DEMAND,
            Product::Hydrogen => 1.0,
        };
        let maximum_demand = capacity / 24.0 * hydrogen_demand;

        Self {
            product,
            hydrogen_demand,
            maximum_demand,
            minimum_demand: maximum_demand * minimum_turndown,
            storage_capacity,
        }
    }

    fn route(&self, hour: &RoutingHour) -> Routing {
        ROUTING_RULES
            .iter()
            .find(|rule| (rule.applies)(self, hour))
            .map_or_else(|| idle(self, hour), |rule| (rule.route)(self, hour))
    }
}

impl PowerToXUnit for SynthesisUnit {
    fn product(&self) -> Product {
        self.product
    }

    fn produce(&self, hydrogen: &[f64]) -> ProductOutput {
        let mut output = ProductOutput {
            product: Vec::with_capacity(hydrogen.len()),
            storage_level: Vec::with_capacity(hydrogen.len()),
            hydrogen_vented: Vec::with_capacity(hydrogen.len()),
        };

        let mut stored = 0.0;
        for &hydrogen in hydrogen {
            let routing = self.route(&RoutingHour { hydrogen, stored });
            stored += routing.stored;
            output.product.push(routing.consumed / self.hydrogen_demand);
            output.storage_level.push(stored);
            output.hydrogen_vented.push(routing.vented);
        }

        output
    }

    fn clamps_negative_surplus(&self) -> bool {
        matches!(self.product, Product::Ammonia | Product::Methanol)
    }
}

/// Create the unit which makes the product given in the parameters
pub fn power_to_x_unit(parameters: &SimulationParameters) -> Box<dyn PowerToXUnit> {
    match parameters.product {
        Product::Hydrogen => Box::new(HydrogenOnly),
        product => Box::new(SynthesisUnit::new(
            product,
            parameters.downstream_capacity,
            parameters.downstream_minimum_turndown,
            parameters.hydrogen_storage_capacity,
        )),
    }
}
