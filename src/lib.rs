//! Dense-tableau simplex and branch-and-cut for linear and mixed-integer
//! programs.
//!
//! ```
//! use mipcut::{solve, BoundKind, Model, SolverConfig};
//!
//! let mut model = Model::maximize();
//! let x = model.add_integer_variable("x", 1.0);
//! let y = model.add_integer_variable("y", 1.0);
//! model.add_constraint(BoundKind::Upper, 3.0, &[(2.0, x), (2.0, y)]);
//!
//! let solution = solve(&model, &SolverConfig::default()).unwrap();
//! assert!(solution.feasible);
//! assert_eq!(solution.evaluation, 1.0);
//! ```

pub mod branch_and_cut;
pub mod config;
pub mod error;
pub mod model;
pub mod tableau;

use log::debug;

pub use branch_and_cut::{BranchAndCut, SearchReport};
pub use config::{BranchingRule, NodeSelection, SolverConfig};
pub use error::{Error, Result};
pub use model::{BoundKind, Constraint, Model, Term, Variable};
pub use tableau::{IntermediateSolution, Solution, SolveStatus, Tableau};

/// Anything that turns a model into a solution.
pub trait MilpSolver {
    fn solve(&self, model: &Model) -> Result<Solution>;
}

/// A [`MilpSolver`] holding its configuration.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    pub config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl MilpSolver for Solver {
    fn solve(&self, model: &Model) -> Result<Solution> {
        solve(model, &self.config)
    }
}

/// Solves `model`: branch-and-cut when it has integer variables, plain
/// two-phase simplex otherwise.
pub fn solve(model: &Model, config: &SolverConfig) -> Result<Solution> {
    config.validate()?;
    let mut tableau = Tableau::from_model(model, config.precision)?;
    tableau.set_trace(config.trace);

    let report = if model.has_integer_variables() {
        BranchAndCut::new(model, config).run(&mut tableau)?
    } else {
        tableau.simplex();
        SearchReport::default()
    };
    debug!(
        "solved {} variables, {} constraints: feasible={} bounded={} after {} nodes",
        model.variables.len(),
        model.constraints.len(),
        tableau.is_feasible(),
        tableau.is_bounded(),
        report.iterations
    );

    let mut solution = tableau.get_solution();
    solution.interrupted = report.interrupted;
    solution.solutions = report.solutions;
    Ok(solution)
}

/// Solves independent models on the rayon thread pool.
#[cfg(feature = "parallel")]
pub fn solve_all(models: &[Model], config: &SolverConfig) -> Vec<Result<Solution>> {
    use rayon::prelude::*;

    models.par_iter().map(|model| solve(model, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_trait_matches_free_function() {
        let mut model = Model::minimize();
        let x1 = model.add_variable("x1", 3.0);
        let x2 = model.add_variable("x2", 2.0);
        model.add_constraint(BoundKind::Lower, 3.0, &[(1.0, x1), (1.0, x2)]);
        model.add_constraint(BoundKind::Lower, 4.0, &[(2.0, x1), (1.0, x2)]);

        let solver = Solver::default();
        let solution = solver.solve(&model).unwrap();
        assert_eq!(solution, solve(&model, &SolverConfig::default()).unwrap());
        assert_eq!(solution.status(), SolveStatus::Optimal);
        assert_eq!(solution.iterations, 0);
        assert!((solution.evaluation - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let model = Model::minimize();
        let config = SolverConfig::default().with_precision(0.0);
        assert!(matches!(solve(&model, &config), Err(Error::InvalidConfig(_))));
    }
}
