//! Reading a solution off the tableau.

use std::collections::BTreeMap;

use super::{round_to_precision, Tableau, RHS_COLUMN};

/// Overall outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped on the deadline or the tolerance gap; the result is the best
    /// incumbent found, not a proven optimum.
    Interrupted,
}

/// An incumbent recorded during branch-and-cut.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateSolution {
    pub evaluation: f64,
    /// Branch-and-cut iteration that produced it.
    pub iteration: usize,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub feasible: bool,
    pub bounded: bool,
    pub is_integral: bool,
    pub interrupted: bool,
    /// Objective value in the model's own sense.
    pub evaluation: f64,
    /// Branch-and-cut iterations; 0 for a pure LP.
    pub iterations: usize,
    /// Basic structural variables by name.
    pub values: BTreeMap<String, f64>,
    pub unbounded_variable: Option<usize>,
    pub messages: Vec<String>,
    pub solutions: Vec<IntermediateSolution>,
}

impl Solution {
    pub fn status(&self) -> SolveStatus {
        if !self.feasible {
            SolveStatus::Infeasible
        } else if !self.bounded {
            SolveStatus::Unbounded
        } else if self.interrupted {
            SolveStatus::Interrupted
        } else {
            SolveStatus::Optimal
        }
    }

    /// Value of a variable. Variables not in the basis are at zero.
    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }
}

impl Tableau {
    /// Rounded values of every basic structural variable, keyed by name.
    pub fn solution_set(&self) -> BTreeMap<String, f64> {
        (1..self.height)
            .filter_map(|row| {
                let index = self.basis.var_at_row(row)?;
                let variable = self.variables.get(index)?;
                let value = round_to_precision(self.matrix[row * self.width + RHS_COLUMN], self.precision);
                // Also turns -0.0 into 0.0.
                let value = if value.abs() <= self.precision { 0.0 } else { value };
                Some((variable.name.clone(), value))
            })
            .collect()
    }

    pub fn get_solution(&self) -> Solution {
        Solution {
            feasible: self.feasible,
            bounded: self.bounded,
            is_integral: self.is_integral(),
            interrupted: false,
            evaluation: self.reported_evaluation(),
            iterations: self.branch_and_cut_iterations,
            values: self.solution_set(),
            unbounded_variable: self.unbounded_var_index,
            messages: self.messages.clone(),
            solutions: Vec::new(),
        }
    }
}
