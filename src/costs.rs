//! The capital, operating and levelised cost breakdown of a project.
use crate::finance::{
    ExperienceCurve, levelised_cost, opex_per_year_inflation_constant,
    opex_per_year_variable, opex_per_year_with_additional_cost, round_to_nearest_thousand,
};
use crate::parameters::{PowerPlantConfiguration, Product, SimulationParameters};
use crate::simulation::ProjectResult;
use crate::units::{
    Dimensionless, Mass, Money, MoneyPerEnergy, MoneyPerMass, MoneyPerPower, Power,
};
use indexmap::IndexMap;
use log::debug;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Items of upfront (capital) expenditure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum CapitalComponent {
    #[strum(to_string = "Electrolyser")]
    Electrolyser,
    #[strum(to_string = "Solar")]
    Solar,
    #[strum(to_string = "Wind")]
    Wind,
    #[strum(to_string = "Battery")]
    Battery,
    #[strum(to_string = "Downstream unit")]
    DownstreamUnit,
    #[strum(to_string = "Hydrogen storage")]
    HydrogenStorage,
    #[strum(to_string = "Grid connection")]
    GridConnection,
    #[strum(to_string = "Additional upfront costs")]
    AdditionalUpfront,
}

/// Items of annual operating expenditure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum OperatingComponent {
    #[strum(to_string = "Electrolyser O&M")]
    ElectrolyserOM,
    #[strum(to_string = "Stack replacement")]
    StackReplacement,
    #[strum(to_string = "Power plant OPEX")]
    PowerPlant,
    #[strum(to_string = "Battery O&M")]
    BatteryOM,
    #[strum(to_string = "Battery replacement")]
    BatteryReplacement,
    #[strum(to_string = "Water costs")]
    Water,
    #[strum(to_string = "Electricity purchase")]
    ElectricityPurchase,
    #[strum(to_string = "Electricity sales")]
    ElectricitySales,
    #[strum(to_string = "Downstream O&M")]
    DownstreamOM,
    #[strum(to_string = "Additional annual costs")]
    AdditionalAnnual,
}

/// The parts into which the levelised cost of the product is split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum LevelisedComponent {
    #[strum(to_string = "Power plant CAPEX")]
    PowerPlantCapex,
    #[strum(to_string = "Electrolyser CAPEX")]
    ElectrolyserCapex,
    #[strum(to_string = "Indirect costs")]
    IndirectCosts,
    #[strum(to_string = "Power plant OPEX")]
    PowerPlantOpex,
    #[strum(to_string = "Electrolyser O&M")]
    ElectrolyserOM,
    #[strum(to_string = "Electricity purchase")]
    ElectricityPurchase,
    #[strum(to_string = "Electricity sales")]
    ElectricitySales,
    #[strum(to_string = "Stack replacement")]
    StackReplacement,
    #[strum(to_string = "Water costs")]
    Water,
    #[strum(to_string = "Battery costs")]
    Battery,
    #[strum(to_string = "Grid connection")]
    GridConnection,
    #[strum(to_string = "Downstream unit")]
    DownstreamUnit,
    #[strum(to_string = "Hydrogen storage")]
    HydrogenStorage,
    #[strum(to_string = "Additional costs")]
    Additional,
}

/// Engineering, procurement and construction (EPC) and land costs of a component
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndirectCosts {
    /// EPC cost
    pub epc: Money,
    /// Land cost
    pub land: Money,
}

impl IndirectCosts {
    fn new(capex: Money, epc: f64, land: f64) -> Self {
        Self {
            epc: capex * Dimensionless(epc),
            land: capex * Dimensionless(land),
        }
    }

    /// EPC and land costs combined
    pub fn total(&self) -> Money {
        self.epc + self.land
    }
}

/// The full cost breakdown of a project
#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    /// Capital cost of each component
    pub capital: IndexMap<CapitalComponent, Money>,
    /// Indirect costs of the components which have them
    pub indirect: IndexMap<CapitalComponent, IndirectCosts>,
    /// Operating cost of each component in each project year
    pub operating: IndexMap<OperatingComponent, Vec<Money>>,
    /// Levelised cost of the product (per kg) attributed to each component
    pub levelised: IndexMap<LevelisedComponent, MoneyPerMass>,
}

impl CostBreakdown {
    /// Total capital cost, excluding indirect costs
    pub fn total_capex(&self) -> Money {
        self.capital.values().sum()
    }

    /// Total indirect costs for the project. The battery's indirect costs are counted with the
    /// battery instead.
    pub fn total_indirect_costs(&self) -> Money {
        self.indirect
            .iter()
            .filter(|(component, _)| **component != CapitalComponent::Battery)
            .map(|(_, costs)| costs.total())
            .sum()
    }

    /// Total operating cost in each project year
    pub fn total_opex(&self) -> Vec<Money> {
        let years = self.operating.values().map(Vec::len).max().unwrap_or(0);
        (0..years)
            .map(|year| {
                self.operating
                    .values()
                    .filter_map(|costs| costs.get(year))
                    .sum()
            })
            .collect()
    }

    /// Total levelised cost of the product per kg
    pub fn total_levelised_cost(&self) -> MoneyPerMass {
        self.levelised.values().sum()
    }

    fn capex(&self, component: CapitalComponent) -> Money {
        self.capital.get(&component).copied().unwrap_or_default()
    }

    fn indirect(&self, component: CapitalComponent) -> Money {
        self.indirect
            .get(&component)
            .map(IndirectCosts::total)
            .unwrap_or_default()
    }

    fn opex(&self, component: OperatingComponent) -> &[Money] {
        self.operating
            .get(&component)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Calculate the capital cost of each component
fn capital_costs(parameters: &SimulationParameters) -> IndexMap<CapitalComponent, Money> {
    let self_build = parameters.is_self_build();
    let synthesis = parameters.product != Product::Hydrogen;

    CapitalComponent::iter()
        .map(|component| {
            let capex = match component {
                CapitalComponent::Electrolyser => ExperienceCurve {
                    reference_capacity: parameters.electrolyser_reference_capacity,
                    reference_cost: parameters.electrolyser_reference_cost,
                    cost_reduction: Dimensionless(parameters.electrolyser_cost_reduction_with_scale),
                    fold_increase: parameters.electrolyser_reference_fold_increase,
                }
                .capex(parameters.electrolyser_nominal_capacity * 1000.0),
                CapitalComponent::Solar if self_build => ExperienceCurve {
                    reference_capacity: parameters.solar_reference_capacity,
                    reference_cost: parameters.solar_reference_cost,
                    cost_reduction: Dimensionless(parameters.solar_cost_reduction_with_scale),
                    fold_increase: parameters.solar_reference_fold_increase,
                }
                .capex(parameters.active_solar_capacity() * 1000.0),
                CapitalComponent::Wind if self_build => ExperienceCurve {
                    reference_capacity: parameters.wind_reference_capacity,
                    reference_cost: parameters.wind_reference_cost,
                    cost_reduction: Dimensionless(parameters.wind_cost_reduction_with_scale),
                    fold_increase: parameters.wind_reference_fold_increase,
                }
                .capex(parameters.active_wind_capacity() * 1000.0),
                CapitalComponent::Battery => round_to_nearest_thousand(Money(
                    parameters.battery_energy() * 1000.0 * parameters.battery_cost,
                )),
                CapitalComponent::DownstreamUnit if synthesis => ExperienceCurve {
                    reference_capacity: parameters.downstream_reference_capacity,
                    reference_cost: parameters.downstream_reference_cost,
                    cost_reduction: Dimensionless(parameters.downstream_cost_reduction_with_scale),
                    fold_increase: parameters.downstream_reference_fold_increase,
                }
                .capex(parameters.downstream_capacity),
                CapitalComponent::HydrogenStorage if synthesis => Money(
                    parameters.hydrogen_storage_capacity * 1000.0 * parameters.hydrogen_storage_cost,
                ),
                CapitalComponent::GridConnection
                    if parameters.power_plant_configuration
                        == PowerPlantConfiguration::GridConnected =>
                {
                    Money(parameters.grid_connection_cost)
                }
                CapitalComponent::AdditionalUpfront => Money(parameters.additional_upfront_costs),
                _ => Money(0.0),
            };
            (component, capex)
        })
        .collect()
}

/// Calculate the indirect costs of the components which have them
fn indirect_costs(
    parameters: &SimulationParameters,
    capital: &IndexMap<CapitalComponent, Money>,
) -> IndexMap<CapitalComponent, IndirectCosts> {
    [
        (
            CapitalComponent::Electrolyser,
            parameters.electrolyser_epc,
            parameters.electrolyser_land,
        ),
        (
            CapitalComponent::Solar,
            parameters.solar_epc,
            parameters.solar_land,
        ),
        (CapitalComponent::Wind, parameters.wind_epc, parameters.wind_land),
        (
            CapitalComponent::Battery,
            parameters.battery_epc,
            parameters.battery_land,
        ),
        (
            CapitalComponent::DownstreamUnit,
            parameters.downstream_epc,
            parameters.downstream_land,
        ),
    ]
    .into_iter()
    .map(|(component, epc, land)| {
        let capex = capital.get(&component).copied().unwrap_or_default();
        (component, IndirectCosts::new(capex, epc, land))
    })
    .collect()
}

/// Calculate the operating costs of each component for every project year
fn operating_costs(
    parameters: &SimulationParameters,
    result: &ProjectResult,
    capital: &IndexMap<CapitalComponent, Money>,
) -> IndexMap<OperatingComponent, Vec<Money>> {
    let years = parameters.project_timeline;
    let inflation = Dimensionless(parameters.inflation_rate);
    let capex = |component: CapitalComponent| capital.get(&component).copied().unwrap_or_default();
    let constant = |cost: Money| opex_per_year_inflation_constant(cost, inflation, years);
    let variable = |costs: Vec<Money>| opex_per_year_variable(&costs, inflation);

    let self_build = parameters.is_self_build();
    let sells_electricity = self_build
        && parameters.power_plant_configuration == PowerPlantConfiguration::GridConnected;

    OperatingComponent::iter()
        .map(|component| {
            let costs = match component {
                OperatingComponent::ElectrolyserOM => constant(
                    capex(CapitalComponent::Electrolyser) * Dimensionless(parameters.electrolyser_om),
                ),
                OperatingComponent::StackReplacement => opex_per_year_with_additional_cost(
                    Money(0.0),
                    capex(CapitalComponent::Electrolyser)
                        * Dimensionless(parameters.stack_replacement_cost),
                    &result.stack_replacement_years,
                    inflation,
                    years,
                ),
                OperatingComponent::PowerPlant if self_build => constant(
                    MoneyPerPower(parameters.solar_opex) * Power(parameters.active_solar_capacity())
                        + MoneyPerPower(parameters.wind_opex)
                            * Power(parameters.active_wind_capacity()),
                ),
                OperatingComponent::BatteryOM if parameters.has_battery() => constant(
                    MoneyPerPower(parameters.battery_om) * Power(parameters.battery_rated_power),
                ),
                OperatingComponent::BatteryReplacement => opex_per_year_with_additional_cost(
                    Money(0.0),
                    capex(CapitalComponent::Battery)
                        * Dimensionless(parameters.battery_replacement_cost),
                    &result.battery_replacement_years,
                    inflation,
                    years,
                ),
                // t of hydrogen * L/kg gives kL
                OperatingComponent::Water => variable(
                    result
                        .annual
                        .iter()
                        .map(|record| {
                            Money(
                                record.hydrogen_output.value()
                                    * parameters.water_requirement
                                    * parameters.water_supply_cost,
                            )
                        })
                        .collect(),
                ),
                OperatingComponent::ElectricityPurchase if !self_build => variable(
                    result
                        .annual
                        .iter()
                        .map(|record| MoneyPerEnergy(parameters.ppa_cost) * record.energy_consumed)
                        .collect(),
                ),
                OperatingComponent::ElectricitySales if sells_electricity => variable(
                    result
                        .annual
                        .iter()
                        .map(|record| {
                            -(MoneyPerEnergy(parameters.surplus_retail_price)
                                * record.exported_energy)
                        })
                        .collect(),
                ),
                OperatingComponent::DownstreamOM => constant(
                    capex(CapitalComponent::DownstreamUnit)
                        * Dimensionless(parameters.downstream_om),
                ),
                OperatingComponent::AdditionalAnnual => {
                    constant(Money(parameters.additional_annual_costs))
                }
                _ => vec![Money(0.0); years as usize],
            };
            (component, costs)
        })
        .collect()
}

/// Combine the per-year costs of several operating components
fn sum_opex(breakdown: &CostBreakdown, components: &[OperatingComponent]) -> Vec<Money> {
    let years = breakdown.total_opex().len();
    (0..years)
        .map(|year| {
            components
                .iter()
                .filter_map(|component| breakdown.opex(*component).get(year))
                .sum()
        })
        .collect()
}

/// Calculate the levelised cost attributed to each component
fn levelised_costs(
    breakdown: &CostBreakdown,
    output: &[Mass],
    discount_rate: Dimensionless,
) -> IndexMap<LevelisedComponent, MoneyPerMass> {
    use CapitalComponent as Capex;
    use OperatingComponent as Opex;

    let no_opex = vec![Money(0.0); output.len()];
    LevelisedComponent::iter()
        .map(|component| {
            let (capex, opex) = match component {
                LevelisedComponent::PowerPlantCapex => (
                    breakdown.capex(Capex::Solar) + breakdown.capex(Capex::Wind),
                    no_opex.clone(),
                ),
                LevelisedComponent::ElectrolyserCapex => {
                    (breakdown.capex(Capex::Electrolyser), no_opex.clone())
                }
                LevelisedComponent::IndirectCosts => {
                    (breakdown.total_indirect_costs(), no_opex.clone())
                }
                LevelisedComponent::PowerPlantOpex => {
                    (Money(0.0), breakdown.opex(Opex::PowerPlant).to_vec())
                }
                LevelisedComponent::ElectrolyserOM => {
                    (Money(0.0), breakdown.opex(Opex::ElectrolyserOM).to_vec())
                }
                LevelisedComponent::ElectricityPurchase => (
                    Money(0.0),
                    breakdown.opex(Opex::ElectricityPurchase).to_vec(),
                ),
                LevelisedComponent::ElectricitySales => {
                    (Money(0.0), breakdown.opex(Opex::ElectricitySales).to_vec())
                }
                LevelisedComponent::StackReplacement => {
                    (Money(0.0), breakdown.opex(Opex::StackReplacement).to_vec())
                }
                LevelisedComponent::Water => (Money(0.0), breakdown.opex(Opex::Water).to_vec()),
                LevelisedComponent::Battery => (
                    breakdown.capex(Capex::Battery) + breakdown.indirect(Capex::Battery),
                    sum_opex(breakdown, &[Opex::BatteryOM, Opex::BatteryReplacement]),
                ),
                LevelisedComponent::GridConnection => {
                    (breakdown.capex(Capex::GridConnection), no_opex.clone())
                }
                LevelisedComponent::DownstreamUnit => (
                    breakdown.capex(Capex::DownstreamUnit),
                    breakdown.opex(Opex::DownstreamOM).to_vec(),
                ),
                LevelisedComponent::HydrogenStorage => {
                    (breakdown.capex(Capex::HydrogenStorage), no_opex.clone())
                }
                LevelisedComponent::Additional => (
                    breakdown.capex(Capex::AdditionalUpfront),
                    breakdown.opex(Opex::AdditionalAnnual).to_vec(),
                ),
            };
            let cost = levelised_cost(capex, &opex, output, discount_rate);
            (component, cost)
        })
        .collect()
}

/// Calculate the cost breakdown for a simulated project.
///
/// # Arguments
///
/// * `parameters` - The plant and financial parameters
/// * `result` - The output of the project simulation
pub fn calculate_costs(parameters: &SimulationParameters, result: &ProjectResult) -> CostBreakdown {
    let capital = capital_costs(parameters);
    let indirect = indirect_costs(parameters, &capital);
    let operating = operating_costs(parameters, result, &capital);
    let mut breakdown = CostBreakdown {
        capital,
        indirect,
        operating,
        levelised: IndexMap::new(),
    };

    let output: Vec<Mass> = result
        .annual
        .iter()
        .map(|record| record.product_output)
        .collect();
    breakdown.levelised = levelised_costs(
        &breakdown,
        &output,
        Dimensionless(parameters.discount_rate),
    );
    debug!(
        "Total CAPEX: {}; total levelised cost: {}/kg",
        breakdown.total_capex(),
        breakdown.total_levelised_cost()
    );

    breakdown
}
