use crate::compare_floats::{max_of_slice, min_of_slice};
use crate::core::units::convert_profile_to_daily;
use crate::external_conditions::WeatherSeries;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NormaliseError {
    #[error("Cannot normalise an empty series")]
    Empty,
    #[error("Cannot normalise a constant series (every value is {value}), the feature should not be clustered on")]
    DegenerateRange { value: f64 },
}

/// Rescale `values` onto [0, 1] using their own minimum and maximum.
pub fn normalise(values: &[f64]) -> Result<Vec<f64>, NormaliseError> {
    let (Some(min), Some(max)) = (min_of_slice(values), max_of_slice(values)) else {
        return Err(NormaliseError::Empty);
    };
    let range = max - min;
    if range == 0. {
        return Err(NormaliseError::DegenerateRange { value: min });
    }

    Ok(values.iter().map(|value| (value - min) / range).collect())
}

/// Build one 48-value feature vector per day: the day's normalised temperatures followed by
/// its normalised irradiance.
///
/// Both quantities are normalised over the full series so that days stay comparable.
pub fn day_features(weather: &WeatherSeries) -> Result<Vec<Vec<f64>>, NormaliseError> {
    let temperatures = convert_profile_to_daily(&normalise(weather.air_temperatures())?);
    let irradiance = convert_profile_to_daily(&normalise(weather.irradiance())?);

    Ok(temperatures
        .into_iter()
        .zip(irradiance)
        .map(|(mut day, irradiance)| {
            day.extend(irradiance);
            day
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn should_map_extremes_to_unit_interval() {
        let values = [4., -2., 10., 1.];
        let normalised = normalise(&values).unwrap();
        assert_relative_eq!(normalised[1], 0.);
        assert_relative_eq!(normalised[2], 1.);
        assert_relative_eq!(normalised[0], 0.5);
        assert!(normalised.iter().all(|v| (0. ..=1.).contains(v)));
    }

    #[rstest]
    fn should_reject_constant_series() {
        assert_eq!(
            normalise(&[3.5; 10]),
            Err(NormaliseError::DegenerateRange { value: 3.5 })
        );
    }

    #[rstest]
    fn should_reject_empty_series() {
        assert_eq!(normalise(&[]), Err(NormaliseError::Empty));
    }

    #[rstest]
    fn should_build_48_features_per_day() {
        let temperatures: Vec<f64> = (0..72).map(|h| (h % 24) as f64).collect();
        let irradiance: Vec<f64> = (0..72).map(|h| (h / 24) as f64).collect();
        let weather = WeatherSeries::new(temperatures, irradiance).unwrap();

        let features = day_features(&weather).unwrap();

        assert_eq!(features.len(), 3);
        assert!(features.iter().all(|day| day.len() == 48));
        assert_relative_eq!(features[0][23], 1.);
        assert_relative_eq!(features[0][24], 0.);
        assert_relative_eq!(features[2][47], 1.);
    }

    #[rstest]
    fn should_surface_constant_irradiance() {
        let weather = WeatherSeries::new((0..24).map(f64::from).collect(), vec![0.; 24]).unwrap();
        assert!(matches!(
            day_features(&weather),
            Err(NormaliseError::DegenerateRange { .. })
        ));
    }
}
