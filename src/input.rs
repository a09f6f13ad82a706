use anyhow::{anyhow, bail};
use serde::Deserialize;
use serde_valid::Validate;
use std::io::Read;
use std::time::Duration;

/// Parse and validate a pipeline configuration document.
pub fn ingest_config(json: impl Read) -> anyhow::Result<PipelineConfig> {
    let config: PipelineConfig = serde_json::from_reader(json)?;
    config
        .validate()
        .map_err(|e| anyhow!("Configuration failed validation: {e}"))?;

    for (name, params) in [("building", &config.building), ("digester", &config.digester)] {
        if params.max_temperature < params.min_temperature {
            bail!(
                "{name}: max_temperature ({}) is below min_temperature ({})",
                params.max_temperature,
                params.min_temperature
            );
        }
    }

    Ok(config)
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[validate]
    pub clustering: ClusteringSettings,
    #[validate]
    #[serde(default)]
    pub calibration: CalibrationSettings,
    #[validate]
    pub building: ThermalParameters,
    #[validate]
    pub digester: ThermalParameters,
    #[validate]
    pub measured_annual_heat: MeasuredAnnualHeat,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClusteringSettings {
    /// Number of typical days to select
    #[validate(minimum = 2)]
    pub cluster_count: usize,
    #[serde(default = "default_restarts")]
    #[validate(minimum = 1)]
    pub restarts: usize,
    #[serde(default = "default_max_iterations")]
    #[validate(minimum = 1)]
    pub max_iterations: usize,
    /// Squared centroid movement below which Lloyd iterations stop
    #[serde(default = "default_tolerance")]
    #[validate(minimum = 0.)]
    pub tolerance: f64,
    #[serde(default)]
    pub seed: u64,
}

fn default_restarts() -> usize {
    50
}

fn default_max_iterations() -> usize {
    300
}

fn default_tolerance() -> f64 {
    1e-6
}

impl ClusteringSettings {
    pub fn new(cluster_count: usize) -> Self {
        Self {
            cluster_count,
            restarts: default_restarts(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CalibrationSettings {
    /// Days whose unconstrained interior temperature never drops to this value (°C)
    /// may open windows, boosting their conductance
    #[serde(default = "default_open_window_temperature")]
    pub open_window_temperature: f64,
    #[serde(default = "default_initial_relaxation_factor")]
    #[validate(minimum = 1.)]
    pub initial_relaxation_factor: f64,
    #[serde(default = "default_relaxation_step")]
    #[validate(exclusive_minimum = 0.)]
    pub relaxation_step: f64,
    #[serde(default = "default_max_relaxation_attempts")]
    #[validate(minimum = 1)]
    pub max_relaxation_attempts: usize,
    /// Minimum part load as a fraction of the unconstrained peak
    #[serde(default = "default_part_load_fraction")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub part_load_fraction: f64,
    /// Stand-in for "no ceiling" during the unconstrained pass (°C)
    #[serde(default = "default_unconstrained_max_temperature")]
    pub unconstrained_max_temperature: f64,
    /// Applied to the single highest hour of the calibrated building profile
    #[serde(default = "default_safety_factor")]
    #[validate(minimum = 1.)]
    pub safety_factor: f64,
    #[serde(default = "default_solver_time_limit_seconds")]
    #[validate(exclusive_minimum = 0.)]
    pub solver_time_limit_seconds: f64,
}

fn default_open_window_temperature() -> f64 {
    18.
}

fn default_initial_relaxation_factor() -> f64 {
    1.5
}

fn default_relaxation_step() -> f64 {
    0.5
}

fn default_max_relaxation_attempts() -> usize {
    20
}

fn default_part_load_fraction() -> f64 {
    0.2
}

fn default_unconstrained_max_temperature() -> f64 {
    100.
}

fn default_safety_factor() -> f64 {
    1.
}

fn default_solver_time_limit_seconds() -> f64 {
    60.
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            open_window_temperature: default_open_window_temperature(),
            initial_relaxation_factor: default_initial_relaxation_factor(),
            relaxation_step: default_relaxation_step(),
            max_relaxation_attempts: default_max_relaxation_attempts(),
            part_load_fraction: default_part_load_fraction(),
            unconstrained_max_temperature: default_unconstrained_max_temperature(),
            safety_factor: default_safety_factor(),
            solver_time_limit_seconds: default_solver_time_limit_seconds(),
        }
    }
}

impl CalibrationSettings {
    pub fn solver_time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.solver_time_limit_seconds)
    }

    pub fn relaxation_factor(&self, attempt: usize) -> f64 {
        self.initial_relaxation_factor + self.relaxation_step * attempt as f64
    }
}

/// Lumped-capacitance parameters for one heated entity.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ThermalParameters {
    /// Exterior heat-loss conductance, in kW/°C
    #[validate(minimum = 0.)]
    pub u_value: f64,
    /// Thermal capacitance, in kWh/°C
    #[validate(exclusive_minimum = 0.)]
    pub capacitance: f64,
    /// in °C
    pub min_temperature: f64,
    /// in °C
    pub max_temperature: f64,
    /// Heated floor/ground area, in m²
    #[validate(exclusive_minimum = 0.)]
    pub area: f64,
    /// Peak internal gains at full occupancy, in kW
    #[serde(default)]
    #[validate(minimum = 0.)]
    pub internal_gains: f64,
    /// Effective solar collecting area, in m²
    #[serde(default)]
    #[validate(minimum = 0.)]
    pub solar_aperture: f64,
}

/// Metered annual heat consumption, in kWh.
#[derive(Clone, Copy, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MeasuredAnnualHeat {
    #[validate(minimum = 0.)]
    pub building: f64,
    #[validate(minimum = 0.)]
    pub digester: f64,
}
