//! Lumped-capacitance heat balance solved as a linear program.
//!
//! For each hourly period p, with successor n:
//!
//! `C * (T[n] - T[p]) = U[p] * (T_ext[p] - T[p]) + gains[p] + Q[p]`
//!
//! with `T_min <= T <= T_max`, `Q_lb <= Q[p] <= Q_max`, minimising `Q_max * periods + sum(Q)`.
//! The weighted sum stands in for "peak first, then total": it is not a strict lexicographic
//! solve, but peak reduction dominates whenever the period count exceeds the achievable
//! spread of the total.

use crate::core::solvers::{LinearProgramSolver, SolveError};
use crate::core::units::HOURS_PER_DAY;
use crate::simulation_time::{RingClosure, SimulationTime};
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum HeatLoadModelError {
    #[error("no heat schedule satisfies the temperature bounds and minimum part load")]
    Infeasible,
    #[error("heat load inputs cover {temperatures} temperatures, {gains} gains and {conductances} conductances; expected whole days of equal length")]
    ShapeMismatch {
        temperatures: usize,
        gains: usize,
        conductances: usize,
    },
    #[error(transparent)]
    Solver(SolveError),
}

impl From<SolveError> for HeatLoadModelError {
    fn from(error: SolveError) -> Self {
        match error {
            SolveError::Infeasible => Self::Infeasible,
            other => Self::Solver(other),
        }
    }
}

/// One heat load solve over a horizon of whole days.
#[derive(Clone, Debug)]
pub struct HeatLoadProblem<'a> {
    /// Exterior temperature per period, in °C
    pub exterior_temperature: &'a [f64],
    /// Heat gains per period, in kW
    pub gains: &'a [f64],
    /// Conductance to the exterior per period, in kW/°C
    pub conductance: &'a [f64],
    /// in kWh/°C
    pub capacitance: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Lower bound on the heat input in every period, in kW
    pub min_heat_input: f64,
    pub ring: RingClosure,
    /// Pins the temperature of the first period
    pub initial_temperature: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatLoadSolution {
    temperature: Vec<f64>,
    heat_input: Vec<f64>,
    peak_load: f64,
}

impl HeatLoadSolution {
    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn heat_input(&self) -> &[f64] {
        &self.heat_input
    }

    pub fn peak_load(&self) -> f64 {
        self.peak_load
    }

    pub fn days(&self) -> usize {
        self.temperature.len() / HOURS_PER_DAY
    }

    pub fn day_temperature(&self, day: usize) -> &[f64] {
        &self.temperature[day * HOURS_PER_DAY..(day + 1) * HOURS_PER_DAY]
    }

    pub fn day_heat_input(&self, day: usize) -> &[f64] {
        &self.heat_input[day * HOURS_PER_DAY..(day + 1) * HOURS_PER_DAY]
    }

    /// Lowest temperature reached in each day.
    pub fn daily_min_temperature(&self) -> Vec<f64> {
        self.temperature
            .chunks_exact(HOURS_PER_DAY)
            .map(|day| day.iter().copied().fold(f64::INFINITY, f64::min))
            .collect()
    }
}

pub struct HeatLoadModel<'s> {
    solver: &'s LinearProgramSolver,
}

impl<'s> HeatLoadModel<'s> {
    pub fn new(solver: &'s LinearProgramSolver) -> Self {
        Self { solver }
    }

    pub fn solve(&self, problem: &HeatLoadProblem) -> Result<HeatLoadSolution, HeatLoadModelError> {
        let periods = problem.exterior_temperature.len();
        if periods == 0
            || periods % HOURS_PER_DAY != 0
            || problem.gains.len() != periods
            || problem.conductance.len() != periods
        {
            return Err(HeatLoadModelError::ShapeMismatch {
                temperatures: periods,
                gains: problem.gains.len(),
                conductances: problem.conductance.len(),
            });
        }

        let lower_temperature = problem.min_temperature.max(0.);
        if lower_temperature > problem.max_temperature {
            return Err(HeatLoadModelError::Infeasible);
        }

        let simtime = SimulationTime::new(periods / HOURS_PER_DAY);
        let mut vars = ProblemVariables::new();
        let temperature: Vec<Variable> = (0..periods)
            .map(|_| {
                vars.add(
                    variable()
                        .min(lower_temperature)
                        .max(problem.max_temperature),
                )
            })
            .collect();
        let heat_input: Vec<Variable> = (0..periods)
            .map(|_| vars.add(variable().min(problem.min_heat_input)))
            .collect();
        let peak = vars.add(variable().min(0.));

        let mut objective: Expression = peak * periods as f64;
        for &q in &heat_input {
            objective += q;
        }

        let mut constraints: Vec<Constraint> = Vec::with_capacity(2 * periods + 1);
        for t_it in simtime.iter() {
            let p = t_it.index;
            if let Some(next) = simtime.next_index(p, problem.ring) {
                let u = problem.conductance[p];
                let c = problem.capacitance;
                let balance: Expression =
                    temperature[next] * c + temperature[p] * (u - c) - heat_input[p];
                let driving = u * problem.exterior_temperature[p] + problem.gains[p];
                constraints.push(constraint!(balance == driving));
            }
            constraints.push(constraint!(heat_input[p] <= peak));
        }
        if let Some(initial) = problem.initial_temperature {
            constraints.push(constraint!(temperature[0] == initial));
        }

        let wanted: Vec<Variable> = temperature
            .iter()
            .chain(heat_input.iter())
            .copied()
            .chain(std::iter::once(peak))
            .collect();
        let values = self.solver.minimise(vars, objective, constraints, &wanted)?;

        Ok(HeatLoadSolution {
            temperature: values[..periods].to_vec(),
            heat_input: values[periods..2 * periods].to_vec(),
            peak_load: values[2 * periods],
        })
    }
}
