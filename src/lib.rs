#![allow(clippy::too_many_arguments)]

mod compare_floats;
pub mod core;
pub mod errors;
pub mod external_conditions;
pub mod input;
pub mod read_weather_file;
pub mod simulation_time;
mod statistics;

#[cfg(test)]
mod tests;

use crate::core::clustering::day_clusterer::DayClusterer;
use crate::core::clustering::kmeans::KMeans;
use crate::core::clustering::normalise::day_features;
use crate::core::reduction::{ClusterReducer, OrderedClusterSequence};
use crate::core::space_heat_demand::calibration::{
    CalibratedProfile, EntityKind, HeatLoadCalibrator,
};
use crate::core::units::DAYS_PER_YEAR;
pub use crate::core::space_heat_demand::internal_gains::OccupancyProfile;
pub use crate::errors::TypicalDaysError;
pub use crate::external_conditions::WeatherSeries;
use crate::input::{
    ingest_config, CalibrationSettings, ClusteringSettings, PipelineConfig, ThermalParameters,
};
use crate::read_weather_file::weather_data_to_series;
use std::io::Read;
use tracing::info;

/// Everything the downstream dispatch optimisation needs from one scenario.
#[derive(Clone, Debug)]
pub struct PrecalculatedProfiles {
    pub typical_days: OrderedClusterSequence,
    pub building: CalibratedProfile,
    pub digester: CalibratedProfile,
}

/// Parse a configuration document and an hourly weather CSV, then run the whole pipeline.
pub fn run_project(
    config: impl Read,
    weather: impl Read,
    occupancy: Vec<f64>,
) -> Result<PrecalculatedProfiles, TypicalDaysError> {
    let config = ingest_config(config)?;
    let weather = weather_data_to_series(weather)?;
    let occupancy = OccupancyProfile::new(occupancy)?;

    run_pipeline(&config, &weather, &occupancy)
}

pub fn run_pipeline(
    config: &PipelineConfig,
    weather: &WeatherSeries,
    occupancy: &OccupancyProfile,
) -> Result<PrecalculatedProfiles, TypicalDaysError> {
    let typical_days = reduce(weather, &config.clustering)?;

    let building = calibrate(
        EntityKind::Building,
        &config.building,
        &config.calibration,
        weather,
        occupancy,
        &typical_days,
        config.measured_annual_heat.building,
    )?;
    let digester = calibrate(
        EntityKind::Digester,
        &config.digester,
        &config.calibration,
        weather,
        occupancy,
        &typical_days,
        config.measured_annual_heat.digester,
    )?;

    Ok(PrecalculatedProfiles {
        typical_days,
        building,
        digester,
    })
}

/// Select `settings.cluster_count` typical days from a year of hourly weather, with the number
/// of calendar days each one stands in for.
pub fn reduce(
    weather: &WeatherSeries,
    settings: &ClusteringSettings,
) -> Result<OrderedClusterSequence, TypicalDaysError> {
    let features = year_features(weather)?;

    let clustering =
        DayClusterer::new(KMeans::from(settings)).cluster(&features, settings.cluster_count)?;
    let reduced = ClusterReducer::new(&clustering.assignment).reduce(&clustering.labels)?;

    info!(
        "selected typical days {:?} with frequencies {:?}",
        reduced.representative_days(),
        reduced.frequencies()
    );
    Ok(reduced)
}

/// Reconstruction error of the typical-day approximation for each candidate cluster count,
/// sorted by cluster count.
pub fn reconstruction_error_sweep(
    weather: &WeatherSeries,
    settings: &ClusteringSettings,
    cluster_counts: impl IntoIterator<Item = usize>,
) -> Result<Vec<(usize, f64)>, TypicalDaysError> {
    let features = year_features(weather)?;

    Ok(DayClusterer::new(KMeans::from(settings))
        .reconstruction_error_sweep(&features, cluster_counts)?)
}

pub fn calibrate(
    entity: EntityKind,
    params: &ThermalParameters,
    settings: &CalibrationSettings,
    weather: &WeatherSeries,
    occupancy: &OccupancyProfile,
    typical_days: &OrderedClusterSequence,
    measured_annual_heat: f64,
) -> Result<CalibratedProfile, TypicalDaysError> {
    Ok(HeatLoadCalibrator::new(settings).calibrate(
        entity,
        params,
        weather,
        occupancy,
        &typical_days.representative_days(),
        &typical_days.frequencies(),
        measured_annual_heat,
    )?)
}

fn year_features(weather: &WeatherSeries) -> Result<Vec<Vec<f64>>, TypicalDaysError> {
    if weather.days() != DAYS_PER_YEAR {
        return Err(TypicalDaysError::IncompleteYear {
            days: weather.days(),
            expected: DAYS_PER_YEAR,
        });
    }

    Ok(day_features(weather)?)
}
