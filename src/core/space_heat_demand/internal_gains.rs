use crate::core::units::HOURS_PER_DAY;
use crate::external_conditions::WeatherSeries;
use crate::input::ThermalParameters;
use anyhow::bail;

/// Normalised hourly occupancy (or consumption) shape, repeated every day.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyProfile([f64; HOURS_PER_DAY]);

impl OccupancyProfile {
    pub fn new(values: Vec<f64>) -> anyhow::Result<Self> {
        let Ok(values) = <[f64; HOURS_PER_DAY]>::try_from(values.as_slice()) else {
            bail!(
                "Occupancy profile needs {HOURS_PER_DAY} hourly values, got {}",
                values.len()
            );
        };
        if let Some(hour) = values.iter().position(|v| !(0. ..=1.).contains(v)) {
            bail!(
                "Occupancy profile value {} at hour {hour} is outside [0, 1]",
                values[hour]
            );
        }
        Ok(Self(values))
    }

    pub fn at_hour(&self, hour_of_day: usize) -> f64 {
        self.0[hour_of_day % HOURS_PER_DAY]
    }
}

/// Heat gains (kW) for every hour of the weather series: occupancy-scaled internal gains plus
/// irradiance collected over the entity's solar aperture.
pub fn hourly_gains(
    params: &ThermalParameters,
    weather: &WeatherSeries,
    occupancy: &OccupancyProfile,
) -> Vec<f64> {
    weather
        .simulation_time()
        .iter()
        .map(|t_it| {
            occupancy.at_hour(t_it.hour_of_day()) * params.internal_gains
                + weather.irradiance()[t_it.index] * params.solar_aperture
        })
        .collect()
}
