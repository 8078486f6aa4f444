//! Fixtures for tests
use crate::parameters::SimulationParameters;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A 10 MW solar-powered electrolyser at location "north", with default values for everything else
#[fixture]
pub fn parameters() -> SimulationParameters {
    toml::from_str(
        r#"
        location = "north"
        power_plant_technology = "solar"
        electrolyser_nominal_capacity = 10.0
        solar_nominal_capacity = 10.0
        "#,
    )
    .unwrap()
}
