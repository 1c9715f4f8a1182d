//! In-place edits of a solved tableau.
//!
//! Each edit rewrites the current basis representation so that it describes
//! the edited model. Call [`Tableau::simplex`] afterwards to re-optimize from
//! the current basis.

use super::{Tableau, COST_ROW, RHS_COLUMN};
use crate::error::{Error, Result};
use crate::model::Constraint;

impl Tableau {
    /// Applies `row[target] -= factor * row[source]` across the full width.
    fn subtract_row(&mut self, target: usize, source: usize, factor: f64) {
        let width = self.width;
        for c in 0..width {
            let value = self.matrix[source * width + c];
            self.matrix[target * width + c] -= factor * value;
        }
    }

    /// Shifts the right-hand side of `constraint` by `difference`.
    pub fn update_right_hand_side(&mut self, constraint: &Constraint, difference: f64) -> Result<()> {
        let delta = constraint.sign() * difference;
        if let Some(row) = self.basis.row_of(constraint.index) {
            self.matrix[row * self.width + RHS_COLUMN] += delta;
            return Ok(());
        }
        let column = self
            .basis
            .col_of(constraint.index)
            .ok_or(Error::UnknownElement(constraint.index))?;
        for r in 0..self.height {
            let row = self.row_mut(r);
            let k = row[column];
            row[RHS_COLUMN] += delta * k;
        }
        for objective in &mut self.optional_objectives {
            let costs = &mut objective.reduced_costs;
            let k = costs[column];
            costs[RHS_COLUMN] += delta * k;
        }
        Ok(())
    }

    /// Shifts the coefficient of `variable` in `constraint` by `difference`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is the constraint's own slack index.
    pub fn update_constraint_coefficient(
        &mut self,
        constraint: &Constraint,
        variable: usize,
        difference: f64,
    ) -> Result<()> {
        assert_ne!(
            constraint.index, variable,
            "constraint {} cannot be its own term",
            constraint.index
        );
        let delta = constraint.sign() * difference;
        let width = self.width;
        let slack = (self.basis.row_of(constraint.index), self.basis.col_of(constraint.index));
        let target = (self.basis.row_of(variable), self.basis.col_of(variable));

        match (slack, target) {
            ((Some(row), _), (_, Some(column))) => {
                self.matrix[row * width + column] += delta;
            }
            ((Some(row), _), (Some(variable_row), _)) => {
                self.subtract_row(row, variable_row, delta);
            }
            ((None, Some(slack_column)), (_, Some(column))) => {
                for r in 0..self.height {
                    let row = self.row_mut(r);
                    let k = row[slack_column];
                    row[column] += k * delta;
                }
                for objective in &mut self.optional_objectives {
                    let costs = &mut objective.reduced_costs;
                    let k = costs[slack_column];
                    costs[column] += k * delta;
                }
            }
            ((None, Some(slack_column)), (Some(variable_row), _)) => {
                let scale = 1.0 + self.matrix[variable_row * width + slack_column] * delta;
                if scale.abs() <= self.precision {
                    return Err(Error::SingularUpdate(variable));
                }
                for value in self.row_mut(variable_row) {
                    *value /= scale;
                }
                let source = self.row(variable_row).to_vec();
                for r in 0..self.height {
                    if r == variable_row {
                        continue;
                    }
                    let row = self.row_mut(r);
                    let k = row[slack_column];
                    if k != 0.0 {
                        for (value, &s) in row.iter_mut().zip(&source) {
                            *value -= k * delta * s;
                        }
                    }
                }
                for objective in &mut self.optional_objectives {
                    let costs = &mut objective.reduced_costs;
                    let k = costs[slack_column];
                    if k != 0.0 {
                        for (cost, &s) in costs.iter_mut().zip(&source) {
                            *cost -= k * delta * s;
                        }
                    }
                }
            }
            ((None, None), _) => return Err(Error::UnknownElement(constraint.index)),
            (_, (None, None)) => return Err(Error::UnknownElement(variable)),
        }
        Ok(())
    }

    /// Shifts the objective coefficient of `variable` by `difference` on the
    /// objective of the variable's own priority.
    pub fn update_cost(&mut self, variable: usize, difference: f64) -> Result<()> {
        let priority = self
            .variables
            .get(variable)
            .map(|v| v.priority)
            .ok_or(Error::UnknownElement(variable))?;
        let delta = if self.is_minimization {
            -difference
        } else {
            difference
        };
        let width = self.width;

        if priority == 0 {
            match (self.basis.row_of(variable), self.basis.col_of(variable)) {
                (_, Some(column)) => self.matrix[COST_ROW * width + column] += delta,
                (Some(row), _) => self.subtract_row(COST_ROW, row, delta),
                (None, None) => return Err(Error::UnknownElement(variable)),
            }
            return Ok(());
        }

        match (self.basis.row_of(variable), self.basis.col_of(variable)) {
            (_, Some(column)) => {
                self.optional_objective_mut(priority).reduced_costs[column] += delta;
            }
            (Some(row), _) => {
                let source = self.row(row).to_vec();
                let objective = self.optional_objective_mut(priority);
                for (cost, value) in objective.reduced_costs.iter_mut().zip(&source) {
                    *cost -= delta * value;
                }
            }
            (None, None) => return Err(Error::UnknownElement(variable)),
        }
        Ok(())
    }

    /// Deletes the row of `constraint` and frees its slack index.
    ///
    /// A non-basic slack is first pivoted into the basis on the row with the
    /// largest entry in its column.
    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        let index = constraint.index;
        let row = match (self.basis.row_of(index), self.basis.col_of(index)) {
            (Some(row), _) => row,
            (None, Some(column)) => {
                let mut pivot_row = 0;
                let mut largest = self.precision;
                for r in 1..self.height {
                    let value = self.matrix[r * self.width + column].abs();
                    if value > largest {
                        largest = value;
                        pivot_row = r;
                    }
                }
                if pivot_row == 0 {
                    return Err(Error::SingularUpdate(index));
                }
                self.pivot(pivot_row, column);
                pivot_row
            }
            (None, None) => return Err(Error::UnknownElement(index)),
        };

        let last = self.height - 1;
        self.basis.release(index);
        if row != last {
            let width = self.width;
            self.matrix
                .copy_within(last * width..(last + 1) * width, row * width);
            self.basis.move_row(last, row);
        }
        self.basis.truncate_rows(last);
        self.height = last;
        self.available_indexes.push(index);
        self.n_vars -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundKind, Model};
    use approx::assert_abs_diff_eq;

    struct Lp {
        model: Model,
        x1: usize,
        x2: usize,
        c1: usize,
        c2: usize,
    }

    /// min 3x1 + 2x2  s.t.  x1 + x2 >= 3,  2x1 + x2 >= 4
    fn lp() -> Lp {
        let mut model = Model::minimize();
        let x1 = model.add_variable("x1", 3.0);
        let x2 = model.add_variable("x2", 2.0);
        let c1 = model.add_constraint(BoundKind::Lower, 3.0, &[(1.0, x1), (1.0, x2)]);
        let c2 = model.add_constraint(BoundKind::Lower, 4.0, &[(2.0, x1), (1.0, x2)]);
        Lp {
            model,
            x1,
            x2,
            c1,
            c2,
        }
    }

    fn solve(model: &Model) -> Tableau {
        let mut tableau = Tableau::from_model(model, 1e-9).unwrap();
        tableau.simplex();
        tableau
    }

    fn assert_same_optimum(edited: &mut Tableau, fresh: &Model, expected: f64) {
        edited.simplex();
        let reference = solve(fresh);
        assert!(edited.is_feasible());
        assert!(edited.basis_is_consistent());
        assert_abs_diff_eq!(edited.evaluation(), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(reference.evaluation(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_update_rhs_of_tight_constraint() {
        let mut lp = lp();
        let mut tableau = solve(&lp.model);
        let constraint = lp.model.constraint(lp.c1).unwrap().clone();
        tableau.update_right_hand_side(&constraint, 1.0).unwrap();

        lp.model.constraints[0].rhs = 4.0;
        assert_same_optimum(&mut tableau, &lp.model, 8.0);
    }

    #[test]
    fn test_update_rhs_of_slack_constraint() {
        let mut lp = lp();
        let c3 = lp.model.add_constraint(BoundKind::Upper, 10.0, &[(1.0, lp.x1)]);
        let mut tableau = solve(&lp.model);
        let constraint = lp.model.constraint(c3).unwrap().clone();
        tableau.update_right_hand_side(&constraint, -9.5).unwrap();

        lp.model.constraints[2].rhs = 0.5;
        assert_same_optimum(&mut tableau, &lp.model, 7.5);
    }

    #[test]
    fn test_update_coefficient_of_basic_variable_in_tight_constraint() {
        let mut lp = lp();
        let mut tableau = solve(&lp.model);
        let constraint = lp.model.constraint(lp.c2).unwrap().clone();
        tableau
            .update_constraint_coefficient(&constraint, lp.x1, 1.0)
            .unwrap();

        lp.model.constraints[1].terms[0].coefficient = 3.0;
        assert_same_optimum(&mut tableau, &lp.model, 6.5);
    }

    #[test]
    fn test_update_coefficient_in_loose_constraint() {
        let mut lp = lp();
        let c3 = lp.model.add_constraint(BoundKind::Upper, 10.0, &[(1.0, lp.x1), (1.0, lp.x2)]);
        let mut tableau = solve(&lp.model);
        let constraint = lp.model.constraint(c3).unwrap().clone();
        tableau
            .update_constraint_coefficient(&constraint, lp.x2, 4.0)
            .unwrap();

        lp.model.constraints[2].terms[1].coefficient = 5.0;
        assert_same_optimum(&mut tableau, &lp.model, 7.25);
    }

    #[test]
    #[should_panic]
    fn test_update_coefficient_with_own_index_panics() {
        let lp = lp();
        let mut tableau = solve(&lp.model);
        let constraint = lp.model.constraint(lp.c1).unwrap().clone();
        let _ = tableau.update_constraint_coefficient(&constraint, lp.c1, 1.0);
    }

    #[test]
    fn test_update_cost_of_basic_variable() {
        let mut lp = lp();
        let mut tableau = solve(&lp.model);
        tableau.update_cost(lp.x1, -2.0).unwrap();

        lp.model.variables[0].cost = 1.0;
        assert_same_optimum(&mut tableau, &lp.model, 3.0);
        assert_abs_diff_eq!(tableau.variable_value(lp.x1), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_update_cost_of_unknown_variable() {
        let lp = lp();
        let mut tableau = solve(&lp.model);
        assert_eq!(tableau.update_cost(lp.c1, 1.0), Err(Error::UnknownElement(lp.c1)));
    }

    #[test]
    fn test_remove_tight_constraint() {
        let lp = lp();
        let mut tableau = solve(&lp.model);
        let constraint = lp.model.constraint(lp.c2).unwrap().clone();
        tableau.remove_constraint(&constraint).unwrap();
        assert_eq!(tableau.height(), 2);
        assert!(tableau.basis_is_consistent());

        let mut fresh = Model::minimize();
        let x1 = fresh.add_variable("x1", 3.0);
        let x2 = fresh.add_variable("x2", 2.0);
        fresh.add_constraint(BoundKind::Lower, 3.0, &[(1.0, x1), (1.0, x2)]);
        assert_same_optimum(&mut tableau, &fresh, 6.0);
        assert_abs_diff_eq!(tableau.variable_value(lp.x2), 3.0, epsilon = 1e-9);

        assert_eq!(tableau.get_new_element_index(), lp.c2);
    }

    #[test]
    fn test_remove_unknown_constraint() {
        let lp = lp();
        let mut tableau = solve(&lp.model);
        let mut ghost = lp.model.constraint(lp.c1).unwrap().clone();
        ghost.index = 99;
        assert_eq!(tableau.remove_constraint(&ghost), Err(Error::UnknownElement(99)));
    }
}
