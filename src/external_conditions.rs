use crate::core::units::{convert_profile_to_daily, HOURS_PER_DAY};
use crate::simulation_time::SimulationTime;
use anyhow::bail;

/// Hourly exterior conditions over a whole number of days.
///
/// Irradiance is expected already converted to an averaged power (kW/m²).
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSeries {
    air_temperatures: Vec<f64>,
    irradiance: Vec<f64>,
}

impl WeatherSeries {
    /// Arguments
    /// * `air_temperatures` - hourly exterior air temperature, in °C
    /// * `irradiance` - hourly global irradiance, in kW/m²
    pub fn new(air_temperatures: Vec<f64>, irradiance: Vec<f64>) -> anyhow::Result<Self> {
        if air_temperatures.len() != irradiance.len() {
            bail!(
                "Weather series have mismatched lengths: {} temperatures, {} irradiance values",
                air_temperatures.len(),
                irradiance.len()
            );
        }
        if air_temperatures.is_empty() || air_temperatures.len() % HOURS_PER_DAY != 0 {
            bail!(
                "Weather series must cover a whole number of days, got {} hours",
                air_temperatures.len()
            );
        }
        if let Some(idx) = air_temperatures
            .iter()
            .chain(irradiance.iter())
            .position(|value| !value.is_finite())
        {
            bail!("Weather series contains a non-finite value at position {idx}");
        }

        Ok(Self {
            air_temperatures,
            irradiance,
        })
    }

    pub fn air_temperatures(&self) -> &[f64] {
        &self.air_temperatures
    }

    pub fn irradiance(&self) -> &[f64] {
        &self.irradiance
    }

    pub fn days(&self) -> usize {
        self.air_temperatures.len() / HOURS_PER_DAY
    }

    pub fn simulation_time(&self) -> SimulationTime {
        SimulationTime::new(self.days())
    }

    pub fn daily_air_temperatures(&self) -> Vec<Vec<f64>> {
        convert_profile_to_daily(&self.air_temperatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    fn should_accept_whole_days() {
        let weather = WeatherSeries::new(vec![5.; 48], vec![0.1; 48]).unwrap();
        assert_eq!(weather.days(), 2);
        assert_eq!(weather.daily_air_temperatures().len(), 2);
        assert_eq!(weather.simulation_time().total_steps(), 48);
    }

    #[rstest]
    #[case(vec![5.; 48], vec![0.1; 47])]
    #[case(vec![5.; 30], vec![0.1; 30])]
    #[case(vec![], vec![])]
    fn should_reject_malformed_series(#[case] temperatures: Vec<f64>, #[case] irradiance: Vec<f64>) {
        assert!(WeatherSeries::new(temperatures, irradiance).is_err());
    }

    #[rstest]
    fn should_reject_non_finite_values() {
        let mut temperatures = vec![5.; 24];
        temperatures[7] = f64::NAN;
        assert!(WeatherSeries::new(temperatures, vec![0.; 24]).is_err());
    }
}
