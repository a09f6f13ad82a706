use crate::compare_floats::{argmax, max_of_slice};
use crate::core::solvers::LinearProgramSolver;
use crate::core::space_heat_demand::heat_load_model::{
    HeatLoadModel, HeatLoadModelError, HeatLoadProblem, HeatLoadSolution,
};
use crate::core::space_heat_demand::internal_gains::{hourly_gains, OccupancyProfile};
use crate::core::units::{daily_totals, HOURS_PER_DAY};
use crate::external_conditions::WeatherSeries;
use crate::input::{CalibrationSettings, ThermalParameters};
use crate::simulation_time::RingClosure;
use strum::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Building,
    Digester,
}

impl EntityKind {
    fn ring(&self, stage: Stage) -> RingClosure {
        match (self, stage) {
            (_, Stage::Unconstrained) | (Self::Building, Stage::Constrained) => {
                RingClosure::Closed
            }
            (Self::Digester, Stage::Constrained) => RingClosure::Open,
        }
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Unconstrained,
    Constrained,
}

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("{entity}: {stage} heat load model is infeasible")]
    Infeasible { entity: EntityKind, stage: Stage },
    #[error("{entity}: no feasible schedule after {attempts} relaxation attempts (last factor {last_factor})")]
    RelaxationSearchExhausted {
        entity: EntityKind,
        attempts: usize,
        last_factor: f64,
    },
    #[error("{entity}: {stage} heat load model failed: {source}")]
    Model {
        entity: EntityKind,
        stage: Stage,
        source: HeatLoadModelError,
    },
    #[error("{entity}: modelled heat load on the representative days sums to zero, cannot match measured {measured} kWh")]
    ZeroModelledLoad { entity: EntityKind, measured: f64 },
    #[error("{entity}: {days} representative days with {frequencies} frequencies summing to {total}, expected {expected}")]
    FrequencyMismatch {
        entity: EntityKind,
        days: usize,
        frequencies: usize,
        total: usize,
        expected: usize,
    },
    #[error("{entity}: representative day {day} is outside the {days}-day weather series")]
    UnknownDay {
        entity: EntityKind,
        day: usize,
        days: usize,
    },
}

/// Heat load and interior temperature for each representative day, scaled so the
/// frequency-weighted total matches the measured annual heat.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibratedProfile {
    pub entity: EntityKind,
    pub representative_days: Vec<usize>,
    /// kW, one row of 24 hours per representative day
    pub heat_load: Vec<Vec<f64>>,
    /// °C, one row of 24 hours per representative day
    pub temperature: Vec<Vec<f64>>,
    pub correction_factor: f64,
    /// Conductance multiplier on passively cooled days, for buildings only
    pub relaxation_factor: Option<f64>,
    /// Minimum heat input, in kW/m²
    pub part_load: f64,
    /// Peak of the constrained solve before calibration, in kW
    pub peak_load: f64,
}

impl CalibratedProfile {
    /// Sum of `frequency * daily heat` across representative days, in kWh.
    pub fn weighted_total(&self, frequencies: &[usize]) -> f64 {
        self.heat_load
            .iter()
            .zip(frequencies)
            .map(|(day, &frequency)| frequency as f64 * day.iter().sum::<f64>())
            .sum()
    }
}

pub struct HeatLoadCalibrator<'a> {
    settings: &'a CalibrationSettings,
    solver: LinearProgramSolver,
}

impl<'a> HeatLoadCalibrator<'a> {
    pub fn new(settings: &'a CalibrationSettings) -> Self {
        Self {
            settings,
            solver: LinearProgramSolver::new(settings.solver_time_limit()),
        }
    }

    /// Arguments
    /// * `entity` - buildings get conductance relaxation and the safety margin
    /// * `representative_days` - calendar days standing in for the series
    /// * `frequencies` - how many days each representative covers; must sum to the series length
    /// * `measured_annual_heat` - in kWh
    pub fn calibrate(
        &self,
        entity: EntityKind,
        params: &ThermalParameters,
        weather: &WeatherSeries,
        occupancy: &OccupancyProfile,
        representative_days: &[usize],
        frequencies: &[usize],
        measured_annual_heat: f64,
    ) -> Result<CalibratedProfile, CalibrationError> {
        let days = weather.days();
        let total: usize = frequencies.iter().sum();
        if representative_days.len() != frequencies.len() || total != days {
            return Err(CalibrationError::FrequencyMismatch {
                entity,
                days: representative_days.len(),
                frequencies: frequencies.len(),
                total,
                expected: days,
            });
        }
        if let Some(&day) = representative_days.iter().find(|&&day| day >= days) {
            return Err(CalibrationError::UnknownDay { entity, day, days });
        }

        let gains = hourly_gains(params, weather, occupancy);
        let base_conductance = vec![params.u_value; weather.air_temperatures().len()];
        let model = HeatLoadModel::new(&self.solver);

        // Unconstrained pass: no ceiling and no part load, to find the natural peak
        let unconstrained = model
            .solve(&self.problem(
                entity,
                Stage::Unconstrained,
                params,
                weather,
                &gains,
                &base_conductance,
                0.,
            ))
            .map_err(|e| model_error(entity, Stage::Unconstrained, e))?;
        let natural_peak = unconstrained.peak_load();
        let part_load = self.settings.part_load_fraction * natural_peak / params.area;
        let min_heat_input = part_load * params.area;
        debug!("{entity}: natural peak {natural_peak:.3} kW, part load {part_load:.5} kW/m²");

        let (constrained, relaxation_factor) = match entity {
            EntityKind::Building => {
                let (solution, factor) = self.relaxation_search(
                    &model,
                    params,
                    weather,
                    &gains,
                    &unconstrained,
                    min_heat_input,
                )?;
                (solution, Some(factor))
            }
            EntityKind::Digester => {
                let solution = model
                    .solve(&self.problem(
                        entity,
                        Stage::Constrained,
                        params,
                        weather,
                        &gains,
                        &base_conductance,
                        min_heat_input,
                    ))
                    .map_err(|e| model_error(entity, Stage::Constrained, e))?;
                (solution, None)
            }
        };

        let restricted: Vec<&[f64]> = representative_days
            .iter()
            .map(|&day| constrained.day_heat_input(day))
            .collect();
        let temperature: Vec<Vec<f64>> = representative_days
            .iter()
            .map(|&day| constrained.day_temperature(day).to_vec())
            .collect();

        let day_totals = daily_totals(constrained.heat_input());
        let modelled_total: f64 = representative_days
            .iter()
            .zip(frequencies)
            .map(|(&day, &frequency)| frequency as f64 * day_totals[day])
            .sum();
        if modelled_total <= 0. || !modelled_total.is_finite() {
            return Err(CalibrationError::ZeroModelledLoad {
                entity,
                measured: measured_annual_heat,
            });
        }
        let correction_factor = measured_annual_heat / modelled_total;
        let restricted_peak = max_of_slice(&restricted.concat()).unwrap_or_default();
        let calibrated_peak = restricted_peak * correction_factor;

        let mut heat_load: Vec<Vec<f64>> = restricted
            .iter()
            .map(|day| {
                day.iter()
                    .map(|q| q / restricted_peak * calibrated_peak)
                    .collect()
            })
            .collect();

        if entity == EntityKind::Building {
            apply_safety_margin(&mut heat_load, self.settings.safety_factor);
        }

        info!(
            "{entity}: calibrated {} representative days, correction factor {correction_factor:.4}",
            representative_days.len()
        );

        Ok(CalibratedProfile {
            entity,
            representative_days: representative_days.to_vec(),
            heat_load,
            temperature,
            correction_factor,
            relaxation_factor,
            part_load,
            peak_load: constrained.peak_load(),
        })
    }

    /// Retry the constrained building solve with ever larger conductance on days warm enough to
    /// open windows, until one is feasible.
    fn relaxation_search(
        &self,
        model: &HeatLoadModel,
        params: &ThermalParameters,
        weather: &WeatherSeries,
        gains: &[f64],
        unconstrained: &HeatLoadSolution,
        min_heat_input: f64,
    ) -> Result<(HeatLoadSolution, f64), CalibrationError> {
        let entity = EntityKind::Building;
        let can_cool: Vec<bool> = unconstrained
            .daily_min_temperature()
            .into_iter()
            .map(|t| t > self.settings.open_window_temperature)
            .collect();
        debug!(
            "{entity}: {} of {} days can cool passively",
            can_cool.iter().filter(|&&c| c).count(),
            can_cool.len()
        );

        let mut last_factor = self.settings.initial_relaxation_factor;
        for attempt in 0..self.settings.max_relaxation_attempts {
            last_factor = self.settings.relaxation_factor(attempt);
            let conductance: Vec<f64> = weather
                .simulation_time()
                .iter()
                .map(|t_it| {
                    if can_cool[t_it.current_day()] {
                        params.u_value * last_factor
                    } else {
                        params.u_value
                    }
                })
                .collect();

            match model.solve(&self.problem(
                entity,
                Stage::Constrained,
                params,
                weather,
                gains,
                &conductance,
                min_heat_input,
            )) {
                Ok(solution) => {
                    info!("{entity}: feasible with relaxation factor {last_factor}");
                    return Ok((solution, last_factor));
                }
                Err(HeatLoadModelError::Infeasible) => {
                    warn!(
                        "{entity}: infeasible with relaxation factor {last_factor} (attempt {})",
                        attempt + 1
                    );
                }
                Err(e) => return Err(model_error(entity, Stage::Constrained, e)),
            }
        }

        Err(CalibrationError::RelaxationSearchExhausted {
            entity,
            attempts: self.settings.max_relaxation_attempts,
            last_factor,
        })
    }

    fn problem<'p>(
        &self,
        entity: EntityKind,
        stage: Stage,
        params: &ThermalParameters,
        weather: &'p WeatherSeries,
        gains: &'p [f64],
        conductance: &'p [f64],
        min_heat_input: f64,
    ) -> HeatLoadProblem<'p> {
        let max_temperature = match stage {
            Stage::Unconstrained => self.settings.unconstrained_max_temperature,
            Stage::Constrained => params.max_temperature,
        };
        let initial_temperature = match entity {
            EntityKind::Building => None,
            EntityKind::Digester => Some(params.min_temperature),
        };

        HeatLoadProblem {
            exterior_temperature: weather.air_temperatures(),
            gains,
            conductance,
            capacitance: params.capacitance,
            min_temperature: params.min_temperature,
            max_temperature,
            min_heat_input,
            ring: entity.ring(stage),
            initial_temperature,
        }
    }
}

fn model_error(entity: EntityKind, stage: Stage, error: HeatLoadModelError) -> CalibrationError {
    match error {
        HeatLoadModelError::Infeasible => CalibrationError::Infeasible { entity, stage },
        source => CalibrationError::Model {
            entity,
            stage,
            source,
        },
    }
}

/// Scale the single highest hour across all days; the first one wins a tie.
fn apply_safety_margin(heat_load: &mut [Vec<f64>], safety_factor: f64) {
    let flat: Vec<f64> = heat_load.concat();
    if let Some(index) = argmax(flat.iter().copied()) {
        heat_load[index / HOURS_PER_DAY][index % HOURS_PER_DAY] *= safety_factor;
    }
}
