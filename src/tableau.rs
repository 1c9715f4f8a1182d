//! Dense simplex tableau.
//!
//! Row 0 is the primary cost row and column 0 the right-hand side. Every other
//! row belongs to exactly one basic variable and every other column to exactly
//! one non-basic variable. Rows are appended as branching and MIR cuts are
//! added; columns never change during a solve.
//!
//! The cost row is kept in minimization form: for a maximization model the
//! costs are stored as given and the engine drives `matrix[0][0]` down, which
//! is the negated objective. [`Tableau::reported_evaluation`] restores the
//! caller's sign.

pub mod backup;
pub mod basis;
pub mod cuts;
pub mod mip;
pub mod modification;
pub mod simplex;
pub mod solution;
pub mod variables;

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::model::Model;

pub use backup::Checkpoint;
pub use basis::Basis;
pub use cuts::{BranchCut, CutKind};
pub use mip::VariableData;
pub use solution::{IntermediateSolution, Solution, SolveStatus};
pub use variables::{VariableInfo, VariableTable};

pub(crate) const COST_ROW: usize = 0;
pub(crate) const RHS_COLUMN: usize = 0;

/// Reduced costs of a lexicographically secondary objective.
///
/// Parallel to the matrix columns and pivoted exactly like the cost row.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalObjective {
    pub priority: u32,
    pub reduced_costs: Vec<f64>,
}

impl OptionalObjective {
    pub fn new(priority: u32, n_columns: usize) -> Self {
        Self {
            priority,
            reduced_costs: vec![0.0; n_columns],
        }
    }
}

/// Rounds to the grid implied by `precision`.
pub(crate) fn round_to_precision(value: f64, precision: f64) -> f64 {
    let coefficient = (1.0 / precision).round();
    ((f64::EPSILON + value) * coefficient).round() / coefficient
}

/// Mutable state of the current LP relaxation.
#[derive(Debug)]
pub struct Tableau {
    pub(crate) precision: f64,
    /// Row-major, `width` entries per row. May hold spare rows past `height`.
    pub(crate) matrix: Vec<f64>,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) basis: Basis,
    pub(crate) variables: Rc<VariableTable>,
    /// Sorted by ascending priority.
    pub(crate) optional_objectives: Vec<OptionalObjective>,
    pub(crate) available_indexes: Vec<usize>,
    pub(crate) last_element_index: usize,
    pub(crate) n_vars: usize,
    pub(crate) is_minimization: bool,
    pub(crate) check_cycles: bool,
    pub(crate) feasible: bool,
    pub(crate) bounded: bool,
    pub(crate) evaluation: f64,
    pub(crate) best_possible_eval: f64,
    pub(crate) simplex_iters: usize,
    pub(crate) unbounded_var_index: Option<usize>,
    pub(crate) branch_and_cut_iterations: usize,
    pub(crate) messages: Vec<String>,
    pub(crate) saved_state: Option<Box<Checkpoint>>,
    pub(crate) trace: bool,
    pivot_scratch: Vec<(usize, f64)>,
}

impl Tableau {
    /// An empty tableau comparing against `precision` everywhere.
    pub fn new(precision: f64) -> Self {
        Self {
            precision,
            matrix: Vec::new(),
            width: 0,
            height: 0,
            basis: Basis::default(),
            variables: Rc::new(VariableTable::default()),
            optional_objectives: Vec::new(),
            available_indexes: Vec::new(),
            last_element_index: 0,
            n_vars: 0,
            is_minimization: true,
            check_cycles: false,
            feasible: true,
            bounded: true,
            evaluation: 0.0,
            best_possible_eval: 0.0,
            simplex_iters: 0,
            unbounded_var_index: None,
            branch_and_cut_iterations: 0,
            messages: Vec::new(),
            saved_state: None,
            trace: false,
            pivot_scratch: Vec::new(),
        }
    }

    pub fn from_model(model: &Model, precision: f64) -> Result<Self> {
        let mut tableau = Self::new(precision);
        tableau.set_model(model)?;
        Ok(tableau)
    }

    /// Loads a model: one column per variable, one row per constraint.
    ///
    /// Variable `i` starts non-basic in column `i + 1`; constraint `i` starts
    /// in row `i + 1` with its slack basic.
    pub fn set_model(&mut self, model: &Model) -> Result<&mut Self> {
        let width = model.variables.len() + 1;
        let height = model.constraints.len() + 1;
        self.is_minimization = model.is_minimization;
        self.check_cycles = model.check_cycles;
        self.initialize(width, height, Rc::new(VariableTable::from_model(model)));
        self.reset_matrix(model)?;
        Ok(self)
    }

    pub(crate) fn initialize(&mut self, width: usize, height: usize, variables: Rc<VariableTable>) {
        self.variables = variables;
        self.width = width;
        self.height = height;
        self.matrix = vec![0.0; width * height];
        self.n_vars = width + height - 2;
        self.basis = Basis::new(width, height, self.n_vars);
        self.last_element_index = self.n_vars;
        self.available_indexes.clear();
        self.optional_objectives.clear();
        self.saved_state = None;
        self.feasible = true;
        self.bounded = true;
        self.evaluation = 0.0;
        self.simplex_iters = 0;
        self.unbounded_var_index = None;
        self.messages.clear();
    }

    fn reset_matrix(&mut self, model: &Model) -> Result<()> {
        let n_elements = self.n_vars;
        let mut seen = vec![false; n_elements];
        let mut claim = |index: usize| -> Result<()> {
            match seen.get_mut(index) {
                None => Err(Error::UnknownElement(index)),
                Some(true) => Err(Error::DuplicateIndex(index)),
                Some(slot) => {
                    *slot = true;
                    Ok(())
                }
            }
        };

        let coefficient = if model.is_minimization { -1.0 } else { 1.0 };
        for (v, variable) in model.variables.iter().enumerate() {
            claim(variable.index)?;
            let column = v + 1;
            let cost = coefficient * variable.cost;
            if variable.priority == 0 {
                self.matrix[column] = cost;
            } else {
                self.set_optional_objective(variable.priority, column, cost);
            }
            self.basis.set_non_basic(variable.index, column);
        }

        for (c, constraint) in model.constraints.iter().enumerate() {
            claim(constraint.index)?;
            let row = c + 1;
            self.basis.set_basic(constraint.index, row);
            let sign = constraint.sign();
            let start = row * self.width;
            for term in &constraint.terms {
                let column = self
                    .basis
                    .col_of(term.variable)
                    .filter(|_| !self.variables.is_slack(term.variable))
                    .ok_or(Error::UnknownElement(term.variable))?;
                self.matrix[start + column] = sign * term.coefficient;
            }
            self.matrix[start + RHS_COLUMN] = sign * constraint.rhs;
        }
        Ok(())
    }

    /// Sets the reduced cost of `column` on the objective of `priority`,
    /// creating that objective if needed.
    pub fn set_optional_objective(&mut self, priority: u32, column: usize, cost: f64) {
        let objective = self.optional_objective_mut(priority);
        if column >= objective.reduced_costs.len() {
            objective.reduced_costs.resize(column + 1, 0.0);
        }
        objective.reduced_costs[column] = cost;
    }

    /// The objective of `priority`, inserted in priority order if missing.
    pub(crate) fn optional_objective_mut(&mut self, priority: u32) -> &mut OptionalObjective {
        let position = match self
            .optional_objectives
            .binary_search_by_key(&priority, |o| o.priority)
        {
            Ok(position) => position,
            Err(position) => {
                self.optional_objectives
                    .insert(position, OptionalObjective::new(priority, self.width));
                position
            }
        };
        &mut self.optional_objectives[position]
    }

    /// Allocates an index for a synthetic variable, reusing freed indices first.
    pub fn get_new_element_index(&mut self) -> usize {
        if let Some(index) = self.available_indexes.pop() {
            return index;
        }
        let index = self.last_element_index;
        self.last_element_index += 1;
        index
    }

    /// Share of non-zero entries in the live part of the matrix.
    pub fn density(&self) -> f64 {
        let live = &self.matrix[..self.width * self.height];
        if live.is_empty() {
            return 0.0;
        }
        live.iter().filter(|&&v| v != 0.0).count() as f64 / live.len() as f64
    }

    /// Records the rounded cost-row value as the current evaluation. The
    /// first evaluation of a solve also becomes the best possible bound.
    /// A tableau without a loaded model evaluates to zero.
    pub fn set_evaluation(&mut self) {
        let value = self.matrix.get(RHS_COLUMN).copied().unwrap_or(0.0);
        let evaluation = round_to_precision(value, self.precision);
        self.evaluation = evaluation;
        if self.simplex_iters == 0 {
            self.best_possible_eval = evaluation;
        }
    }

    /// Appends a zeroed row, growing storage when no spare row is left.
    pub(crate) fn append_row(&mut self) -> usize {
        let row = self.height;
        let end = (row + 1) * self.width;
        if self.matrix.len() < end {
            self.matrix.resize(end, 0.0);
        } else {
            self.matrix[row * self.width..end].fill(0.0);
        }
        self.height += 1;
        row
    }

    /// Gives `row` a fresh slack variable as its basic variable.
    pub(crate) fn install_slack(&mut self, row: usize) -> usize {
        let slack = self.get_new_element_index();
        self.basis.set_basic(slack, row);
        self.n_vars += 1;
        slack
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.matrix[row * self.width..(row + 1) * self.width]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.matrix[row * self.width..(row + 1) * self.width]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.matrix[row * self.width + RHS_COLUMN]
    }

    /// Current value of an element: its RHS when basic, zero otherwise.
    pub fn variable_value(&self, index: usize) -> f64 {
        self.basis.row_of(index).map_or(0.0, |row| self.rhs(row))
    }

    /// Checks the basis invariant over every live element index.
    pub fn basis_is_consistent(&self) -> bool {
        self.basis
            .is_consistent(self.last_element_index, &self.available_indexes)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn variables(&self) -> &Rc<VariableTable> {
        &self.variables
    }

    pub fn optional_objectives(&self) -> &[OptionalObjective] {
        &self.optional_objectives
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    /// Internal (minimization-form) objective value.
    pub fn evaluation(&self) -> f64 {
        self.evaluation
    }

    pub fn best_possible_eval(&self) -> f64 {
        self.best_possible_eval
    }

    pub fn unbounded_variable(&self) -> Option<usize> {
        self.unbounded_var_index
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// The evaluation in the caller's sense.
    pub fn reported_evaluation(&self) -> f64 {
        if self.is_minimization {
            self.evaluation
        } else {
            -self.evaluation
        }
    }
}
