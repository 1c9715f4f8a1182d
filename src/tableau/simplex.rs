//! Two-phase primal simplex on the compact tableau.

use log::{trace, warn};

use super::{Tableau, COST_ROW, RHS_COLUMN};

/// Entries this close to zero are treated as exact zeros during a pivot.
const PIVOT_ZERO: f64 = 1e-16;

impl Tableau {
    /// Restores feasibility, then optimality. Outcome is left in the
    /// `feasible`, `bounded` and `evaluation` fields.
    pub fn simplex(&mut self) -> &mut Self {
        self.bounded = true;
        self.phase1();
        if self.feasible {
            self.phase2();
        }
        self
    }

    /// Drives every negative right-hand side to zero or above. Rows whose
    /// basic variable is unrestricted may stay negative.
    ///
    /// Returns the number of pivots performed.
    pub fn phase1(&mut self) -> usize {
        let precision = self.precision;
        let mut history = Vec::new();
        let mut iterations = 0;

        loop {
            let mut leaving_row = 0;
            let mut most_negative = -precision;
            for r in 1..self.height {
                let value = self.rhs(r);
                let unrestricted = self
                    .basis
                    .var_at_row(r)
                    .is_some_and(|v| self.variables.is_unrestricted(v));
                if !unrestricted && value < most_negative {
                    most_negative = value;
                    leaving_row = r;
                }
            }
            if leaving_row == 0 {
                self.feasible = true;
                return iterations;
            }

            let mut entering_column = 0;
            let mut max_quotient = f64::NEG_INFINITY;
            let leaving = self.row(leaving_row);
            let cost = self.row(COST_ROW);
            for c in 1..self.width {
                let coefficient = leaving[c];
                let unrestricted = self
                    .basis
                    .var_at_col(c)
                    .is_some_and(|v| self.variables.is_unrestricted(v));
                let eligible = if unrestricted {
                    coefficient.abs() > precision
                } else {
                    coefficient < -precision
                };
                if eligible {
                    let quotient = -cost[c] / coefficient;
                    if quotient > max_quotient {
                        max_quotient = quotient;
                        entering_column = c;
                    }
                }
            }
            if entering_column == 0 {
                self.feasible = false;
                return iterations;
            }

            if self.check_cycles && self.cycle_guard(&mut history, 1, leaving_row, entering_column) {
                return iterations;
            }

            self.pivot(leaving_row, entering_column);
            iterations += 1;
        }
    }

    /// Improves the objective until no reduced cost can, or until a column
    /// is found to be unbounded.
    ///
    /// Returns the number of pivots performed.
    pub fn phase2(&mut self) -> usize {
        let precision = self.precision;
        let mut history = Vec::new();
        let mut iterations = 0;

        loop {
            let (entering_column, negative) = self.select_entering_column();

            if entering_column == 0 {
                self.set_evaluation();
                self.simplex_iters += 1;
                return iterations;
            }

            let mut leaving_row = 0;
            let mut min_quotient = f64::INFINITY;
            for r in 1..self.height {
                let row = self.row(r);
                let rhs = row[RHS_COLUMN];
                let column_value = row[entering_column];
                if column_value.abs() < precision {
                    continue;
                }
                if column_value > 0.0 && rhs.abs() < precision {
                    min_quotient = 0.0;
                    leaving_row = r;
                    break;
                }
                let quotient = if negative {
                    -rhs / column_value
                } else {
                    rhs / column_value
                };
                if quotient > precision && quotient < min_quotient {
                    min_quotient = quotient;
                    leaving_row = r;
                }
            }

            if min_quotient == f64::INFINITY {
                self.evaluation = f64::NEG_INFINITY;
                self.bounded = false;
                self.unbounded_var_index = self.basis.var_at_col(entering_column);
                return iterations;
            }

            if self.check_cycles && self.cycle_guard(&mut history, 2, leaving_row, entering_column) {
                return iterations;
            }

            self.pivot(leaving_row, entering_column);
            iterations += 1;
        }
    }

    /// Dantzig pricing over the cost row, falling through to the optional
    /// objectives for columns whose reduced cost is tied at zero.
    ///
    /// Returns `(column, negative)`; column 0 means no improving column.
    fn select_entering_column(&self) -> (usize, bool) {
        let precision = self.precision;
        let has_optional = !self.optional_objectives.is_empty();
        let mut tied = Vec::new();

        let mut entering = 0;
        let mut best = precision;
        let mut negative = false;
        let cost = self.row(COST_ROW);
        for c in 1..self.width {
            let reduced_cost = cost[c];
            if has_optional && reduced_cost.abs() < precision {
                tied.push(c);
                continue;
            }
            self.price_column(c, reduced_cost, &mut best, &mut entering, &mut negative);
        }

        for objective in &self.optional_objectives {
            if entering != 0 || tied.is_empty() {
                break;
            }
            best = precision;
            let mut still_tied = Vec::new();
            for &c in &tied {
                let reduced_cost = objective.reduced_costs[c];
                if reduced_cost.abs() < precision {
                    still_tied.push(c);
                    continue;
                }
                self.price_column(c, reduced_cost, &mut best, &mut entering, &mut negative);
            }
            tied = still_tied;
        }

        (entering, negative)
    }

    fn price_column(
        &self,
        column: usize,
        reduced_cost: f64,
        best: &mut f64,
        entering: &mut usize,
        negative: &mut bool,
    ) {
        let unrestricted = self
            .basis
            .var_at_col(column)
            .is_some_and(|v| self.variables.is_unrestricted(v));
        if unrestricted && reduced_cost < 0.0 {
            if -reduced_cost > *best {
                *best = -reduced_cost;
                *entering = column;
                *negative = true;
            }
        } else if reduced_cost > *best {
            *best = reduced_cost;
            *entering = column;
            *negative = false;
        }
    }

    /// Exchanges the basic variable of `pivot_row` with the non-basic
    /// variable of `pivot_column`.
    pub fn pivot(&mut self, pivot_row: usize, pivot_column: usize) {
        let width = self.width;
        let quotient = self.matrix[pivot_row * width + pivot_column];
        let (leaving, entering) = self.basis.swap(pivot_row, pivot_column);
        if self.trace {
            trace!(
                "pivot row {} col {}: {:?} leaves, {:?} enters (pivot {:.6})",
                pivot_row,
                pivot_column,
                leaving,
                entering,
                quotient
            );
        }

        let mut non_zero = std::mem::take(&mut self.pivot_scratch);
        non_zero.clear();
        {
            let row = self.row_mut(pivot_row);
            for (c, value) in row.iter_mut().enumerate() {
                if value.abs() <= PIVOT_ZERO {
                    *value = 0.0;
                } else {
                    *value /= quotient;
                    if c != pivot_column {
                        non_zero.push((c, *value));
                    }
                }
            }
            row[pivot_column] = 1.0 / quotient;
        }

        for r in 0..self.height {
            if r == pivot_row {
                continue;
            }
            let row = self.row_mut(r);
            let coefficient = row[pivot_column];
            if coefficient.abs() <= PIVOT_ZERO {
                row[pivot_column] = 0.0;
                continue;
            }
            for &(c, v0) in &non_zero {
                row[c] -= coefficient * v0;
            }
            row[pivot_column] = -coefficient / quotient;
        }

        for objective in &mut self.optional_objectives {
            let costs = &mut objective.reduced_costs;
            let coefficient = costs[pivot_column];
            if coefficient != 0.0 {
                for &(c, v0) in &non_zero {
                    costs[c] -= coefficient * v0;
                }
                costs[pivot_column] = -coefficient / quotient;
            }
        }

        self.pivot_scratch = non_zero;
    }

    /// Records the pivot and stops the phase when the pivot history repeats.
    fn cycle_guard(
        &mut self,
        history: &mut Vec<(Option<usize>, Option<usize>)>,
        phase: u8,
        leaving_row: usize,
        entering_column: usize,
    ) -> bool {
        history.push((
            self.basis.var_at_row(leaving_row),
            self.basis.var_at_col(entering_column),
        ));
        match check_for_cycles(history) {
            Some((start, length)) => {
                warn!("cycle in phase {} starting at pivot {} (length {})", phase, start, length);
                self.messages.push(format!("Cycle in phase {}", phase));
                self.messages.push(format!("Start : {}", start));
                self.messages.push(format!("Length : {}", length));
                self.feasible = false;
                true
            }
            None => false,
        }
    }
}

/// Looks for a repeated run of pivot pairs.
///
/// Returns `(start, length)` of the first run found: the pair at `start`
/// recurs at `start + length` and the pairs following both occurrences
/// agree for the whole run.
pub fn check_for_cycles<T: PartialEq>(pairs: &[T]) -> Option<(usize, usize)> {
    let len = pairs.len();
    for e1 in 0..len.saturating_sub(1) {
        for e2 in e1 + 1..len {
            if pairs[e1] != pairs[e2] {
                continue;
            }
            let length = e2 - e1;
            if length > len - e2 {
                break;
            }
            if (1..length).all(|i| pairs[e1 + i] == pairs[e2 + i]) {
                return Some((e1, length));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundKind, Model};
    use crate::tableau::{BranchCut, CutKind};
    use approx::assert_abs_diff_eq;

    fn solved(model: &Model) -> Tableau {
        let mut tableau = Tableau::from_model(model, 1e-9).unwrap();
        tableau.simplex();
        tableau
    }

    #[test]
    fn test_two_variable_lp() {
        let mut model = Model::minimize();
        let x1 = model.add_variable("x1", 3.0);
        let x2 = model.add_variable("x2", 2.0);
        model.add_constraint(BoundKind::Lower, 3.0, &[(1.0, x1), (1.0, x2)]);
        model.add_constraint(BoundKind::Lower, 4.0, &[(2.0, x1), (1.0, x2)]);

        let tableau = solved(&model);
        assert!(tableau.is_feasible());
        assert!(tableau.is_bounded());
        assert_abs_diff_eq!(tableau.evaluation(), 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(x1), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(x2), 2.0, epsilon = 1e-9);
        assert!(tableau.basis_is_consistent());
    }

    #[test]
    fn test_maximization_reports_positive_objective() {
        // max 3x + 5y  s.t.  x <= 4,  2y <= 12,  3x + 2y <= 18
        let mut model = Model::maximize();
        let x = model.add_variable("x", 3.0);
        let y = model.add_variable("y", 5.0);
        model.add_constraint(BoundKind::Upper, 4.0, &[(1.0, x)]);
        model.add_constraint(BoundKind::Upper, 12.0, &[(2.0, y)]);
        model.add_constraint(BoundKind::Upper, 18.0, &[(3.0, x), (2.0, y)]);

        let tableau = solved(&model);
        assert_abs_diff_eq!(tableau.reported_evaluation(), 36.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(x), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(y), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unbounded_column_is_reported() {
        let mut model = Model::maximize();
        let x = model.add_variable("x", 1.0);
        let y = model.add_variable("y", 0.0);
        model.add_constraint(BoundKind::Upper, 5.0, &[(1.0, y)]);

        let tableau = solved(&model);
        assert!(!tableau.is_bounded());
        assert_eq!(tableau.unbounded_variable(), Some(x));
        assert_eq!(tableau.evaluation(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_phase1_detects_infeasibility() {
        let mut model = Model::minimize();
        let x = model.add_variable("x", 1.0);
        model.add_constraint(BoundKind::Upper, 1.0, &[(1.0, x)]);
        model.add_constraint(BoundKind::Lower, 2.0, &[(1.0, x)]);

        let tableau = solved(&model);
        assert!(!tableau.is_feasible());
    }

    #[test]
    fn test_unrestricted_variable_goes_negative() {
        // min x  s.t.  x >= -3, x unrestricted
        let mut model = Model::minimize();
        let x = model.add_variable("x", 1.0);
        model.add_constraint(BoundKind::Lower, -3.0, &[(1.0, x)]);
        model.set_unrestricted(x);

        let tableau = solved(&model);
        assert!(tableau.is_feasible() && tableau.is_bounded());
        assert_abs_diff_eq!(tableau.evaluation(), -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(x), -3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_phase1_after_cut_leaves_unrestricted_row_negative() {
        // min x + y  s.t.  x >= -3, x unrestricted; then y >= 1
        let mut model = Model::minimize();
        let x = model.add_variable("x", 1.0);
        let y = model.add_variable("y", 1.0);
        model.add_constraint(BoundKind::Lower, -3.0, &[(1.0, x)]);
        model.set_unrestricted(x);
        let mut tableau = solved(&model);
        assert_eq!(tableau.basis().row_of(x), Some(1));

        tableau
            .add_cut_constraints(&[BranchCut::new(CutKind::Min, y, 1.0)])
            .unwrap();
        assert_eq!(tableau.rhs(2), -1.0);

        assert_eq!(tableau.phase1(), 1);
        assert!(tableau.is_feasible());
        assert_eq!(tableau.basis().row_of(x), Some(1));
        assert_abs_diff_eq!(tableau.rhs(1), -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(y), 1.0, epsilon = 1e-9);

        tableau.phase2();
        assert_abs_diff_eq!(tableau.evaluation(), -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optional_objective_breaks_ties() {
        // max y  s.t.  x + y <= 4,  y <= 3,  x <= 5;  secondary: max x
        let mut model = Model::maximize();
        let x = model.add_variable("x", 0.0);
        let y = model.add_variable("y", 1.0);
        model.add_constraint(BoundKind::Upper, 4.0, &[(1.0, x), (1.0, y)]);
        model.add_constraint(BoundKind::Upper, 3.0, &[(1.0, y)]);
        model.add_constraint(BoundKind::Upper, 5.0, &[(1.0, x)]);
        let mut tableau = Tableau::from_model(&model, 1e-9).unwrap();
        tableau.set_optional_objective(1, 1, 1.0);
        tableau.simplex();

        assert_abs_diff_eq!(tableau.reported_evaluation(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(y), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(x), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pivot_keeps_basis_maps_paired() {
        let mut model = Model::minimize();
        let x = model.add_variable("x", 1.0);
        let c = model.add_constraint(BoundKind::Lower, 2.0, &[(2.0, x)]);
        let mut tableau = Tableau::from_model(&model, 1e-9).unwrap();

        tableau.pivot(1, 1);
        assert_eq!(tableau.basis().row_of(x), Some(1));
        assert_eq!(tableau.basis().col_of(c), Some(1));
        assert_abs_diff_eq!(tableau.rhs(1), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tableau.row(1)[1], -0.5, epsilon = 1e-12);
        assert!(tableau.basis_is_consistent());
    }

    #[test]
    fn test_cycle_guard_stops_on_repeated_pivots() {
        let mut model = Model::maximize();
        let x = model.add_variable("x", 1.0);
        let y = model.add_variable("y", 1.0);
        model.add_constraint(BoundKind::Upper, 1.0, &[(1.0, x), (1.0, y)]);
        let mut tableau = Tableau::from_model(&model, 1e-9).unwrap();
        let mut history = Vec::new();

        assert!(!tableau.cycle_guard(&mut history, 1, 1, 1));
        assert!(!tableau.cycle_guard(&mut history, 1, 1, 2));
        assert!(!tableau.cycle_guard(&mut history, 1, 1, 1));
        assert!(tableau.is_feasible());
        assert!(tableau.messages().is_empty());

        assert!(tableau.cycle_guard(&mut history, 1, 1, 2));
        assert!(!tableau.is_feasible());
        assert_eq!(tableau.messages(), ["Cycle in phase 1", "Start : 0", "Length : 2"]);
    }

    #[test]
    fn test_cycle_finder() {
        assert_eq!(check_for_cycles(&[1, 2, 3, 1, 2, 3]), Some((0, 3)));
        assert_eq!(check_for_cycles(&[9, 1, 2, 1, 2]), Some((1, 2)));
        assert_eq!(check_for_cycles(&[1, 2, 3, 1, 2]), None);
        assert_eq!(check_for_cycles(&[1, 2, 3, 4]), None);
        assert_eq!(check_for_cycles::<u8>(&[]), None);
    }
}
