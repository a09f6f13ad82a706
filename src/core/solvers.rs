use good_lp::{
    clarabel, Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("linear program is infeasible")]
    Infeasible,
    #[error("linear program is unbounded")]
    Unbounded,
    #[error("linear program took {elapsed:?}, beyond the {limit:?} time limit")]
    TimeLimitExceeded { elapsed: Duration, limit: Duration },
    #[error("linear program solver failed: {0}")]
    Other(String),
}

impl From<ResolutionError> for SolveError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::Infeasible => Self::Infeasible,
            ResolutionError::Unbounded => Self::Unbounded,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Blocking LP solve with a wall-clock budget.
///
/// The underlying interior point solver cannot be interrupted, so a solve that overruns its
/// budget is rejected once it returns rather than cut short.
#[derive(Clone, Debug)]
pub struct LinearProgramSolver {
    time_limit: Duration,
}

impl LinearProgramSolver {
    pub fn new(time_limit: Duration) -> Self {
        Self { time_limit }
    }

    /// Minimise `objective` subject to `constraints`, returning the optimal value of each
    /// variable in `wanted`, in order.
    pub fn minimise(
        &self,
        variables: ProblemVariables,
        objective: Expression,
        constraints: Vec<Constraint>,
        wanted: &[Variable],
    ) -> Result<Vec<f64>, SolveError> {
        let started = Instant::now();

        let mut model = variables.minimise(objective).using(clarabel);
        for constraint in constraints {
            model = model.with(constraint);
        }
        let solution = model.solve()?;

        let elapsed = started.elapsed();
        debug!("linear program solved in {elapsed:?}");
        if elapsed > self.time_limit {
            return Err(SolveError::TimeLimitExceeded {
                elapsed,
                limit: self.time_limit,
            });
        }

        Ok(wanted.iter().map(|&var| solution.value(var)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use good_lp::{constraint, variable};
    use rstest::*;

    #[fixture]
    fn solver() -> LinearProgramSolver {
        LinearProgramSolver::new(Duration::from_secs(30))
    }

    #[rstest]
    fn should_minimise_small_program(solver: LinearProgramSolver) {
        let mut vars = ProblemVariables::new();
        let x = vars.add(variable().min(0.));
        let y = vars.add(variable().min(0.));
        let objective = x * 2. + y * 3.;

        let values = solver
            .minimise(vars, objective, vec![constraint!(x + y >= 4.)], &[x, y])
            .unwrap();

        assert_relative_eq!(values[0], 4., epsilon = 1e-5);
        assert_relative_eq!(values[1], 0., epsilon = 1e-5);
    }

    #[rstest]
    fn should_report_infeasibility(solver: LinearProgramSolver) {
        let mut vars = ProblemVariables::new();
        let x = vars.add(variable().min(0.).max(1.));

        let result = solver.minimise(vars, x * 1., vec![constraint!(x >= 2.)], &[x]);

        assert_eq!(result, Err(SolveError::Infeasible));
    }
}
