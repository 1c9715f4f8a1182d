//! Branching cuts and mixed-integer-rounding cuts.
//!
//! Every cut becomes one new row whose basic variable is a fresh slack:
//! `slack = rhs - sum(row[c] * x_col(c)) >= 0`.

use super::{Tableau, COST_ROW, RHS_COLUMN};
use crate::error::{Error, Result};

/// Direction of a branching cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutKind {
    /// `variable >= value`
    Min,
    /// `variable <= value`
    Max,
}

impl CutKind {
    fn sign(self) -> f64 {
        match self {
            CutKind::Min => -1.0,
            CutKind::Max => 1.0,
        }
    }
}

/// A bound imposed on a variable along a search-tree path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchCut {
    pub kind: CutKind,
    pub var_index: usize,
    pub value: f64,
}

impl BranchCut {
    pub fn new(kind: CutKind, var_index: usize, value: f64) -> Self {
        Self {
            kind,
            var_index,
            value,
        }
    }
}

impl Tableau {
    /// Appends one bound row per cut.
    ///
    /// A cut on a basic variable is expressed through that variable's row;
    /// a cut on a non-basic variable is a plain bound on its column. Fails
    /// without touching the tableau if any cut names an unknown element.
    pub fn add_cut_constraints(&mut self, cuts: &[BranchCut]) -> Result<()> {
        if let Some(cut) = cuts.iter().find(|cut| {
            self.basis.row_of(cut.var_index).is_none() && self.basis.col_of(cut.var_index).is_none()
        }) {
            return Err(Error::UnknownElement(cut.var_index));
        }

        let width = self.width;
        for cut in cuts {
            let sign = cut.kind.sign();
            let r = self.append_row();
            match self.basis.row_of(cut.var_index) {
                Some(var_row) => {
                    let (head, tail) = self.matrix.split_at_mut(r * width);
                    let source = &head[var_row * width..(var_row + 1) * width];
                    let target = &mut tail[..width];
                    target[RHS_COLUMN] = sign * (cut.value - source[RHS_COLUMN]);
                    for c in 1..width {
                        target[c] = -sign * source[c];
                    }
                }
                None => {
                    let row = self.row_mut(r);
                    row[RHS_COLUMN] = sign * cut.value;
                    if let Some(col) = self.basis.col_of(cut.var_index) {
                        self.matrix[r * width + col] = sign;
                    }
                }
            }
            self.install_slack(r);
        }
        Ok(())
    }

    /// Fractional part of the RHS of `row` if its basic variable is an
    /// integer variable that can be cut on.
    fn mir_source(&self, row: usize) -> Option<(f64, f64)> {
        if row == COST_ROW || row >= self.height {
            return None;
        }
        let basic = self.basis.var_at_row(row)?;
        if !self.variables.is_integer(basic) {
            return None;
        }
        let d = self.rhs(row);
        let f = d - d.floor();
        if f < self.precision || f > 1.0 - self.precision {
            return None;
        }
        Some((d, f))
    }

    fn is_integer_column(&self, column: usize) -> bool {
        self.basis
            .var_at_col(column)
            .is_some_and(|v| self.variables.is_integer(v))
    }

    /// Adds the mixed-integer-rounding cut of `row`:
    ///
    /// `x_B + sum(F(a_j) * x_j) <= floor(d)` with `F(a) = floor(a) + max(0, frac(a) - f) / (1 - f)`
    /// on integer columns and `min(0, a / (1 - f))` on continuous ones,
    /// rewritten over the non-basic columns by subtracting the source row.
    ///
    /// Returns false when the row is not a fractional integer row.
    pub fn add_lower_bound_mir_cut(&mut self, row: usize) -> bool {
        let Some((d, f)) = self.mir_source(row) else {
            return false;
        };
        let coefficients: Vec<f64> = (1..self.width)
            .map(|c| {
                let a = self.matrix[row * self.width + c];
                let term = if self.is_integer_column(c) {
                    a.floor() + (a - a.floor() - f).max(0.0) / (1.0 - f)
                } else {
                    (a / (1.0 - f)).min(0.0)
                };
                term - a
            })
            .collect();

        let r = self.append_row();
        let target = self.row_mut(r);
        target[RHS_COLUMN] = d.floor() - d;
        target[1..].copy_from_slice(&coefficients);
        self.install_slack(r);
        true
    }

    /// Adds the Gomory mixed-integer cut of `row` in `<=` row form:
    /// RHS `-f`, integer columns `-f_j` or `-(1 - f_j) * f / (1 - f)`,
    /// continuous columns `-a` or `a * f / (1 - f)`.
    ///
    /// Both column kinds use the standard Gomory mixed-integer `(1 - f)`
    /// denominator.
    ///
    /// Returns false when the row is not a fractional integer row.
    pub fn add_upper_bound_mir_cut(&mut self, row: usize) -> bool {
        let Some((_, f)) = self.mir_source(row) else {
            return false;
        };
        let coefficients: Vec<f64> = (1..self.width)
            .map(|c| {
                let a = self.matrix[row * self.width + c];
                if self.is_integer_column(c) {
                    let fj = a - a.floor();
                    if fj <= f {
                        -fj
                    } else {
                        -(1.0 - fj) * f / (1.0 - f)
                    }
                } else if a >= 0.0 {
                    -a
                } else {
                    a * f / (1.0 - f)
                }
            })
            .collect();

        let r = self.append_row();
        let target = self.row_mut(r);
        target[RHS_COLUMN] = -f;
        target[1..].copy_from_slice(&coefficients);
        self.install_slack(r);
        true
    }

    /// Tries a lower-bound MIR cut on every current row and stops once
    /// `max_cuts` have been added. Returns the number added.
    pub fn apply_mir_cuts(&mut self, max_cuts: usize) -> usize {
        let rows = self.height;
        let mut added = 0;
        for row in 1..rows {
            if added >= max_cuts {
                break;
            }
            if self.add_lower_bound_mir_cut(row) {
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundKind, Model};
    use approx::assert_abs_diff_eq;

    /// max x + y  s.t.  2x + 2y <= 3, x and y integer. LP optimum x = 1.5.
    fn fractional() -> (Tableau, usize, usize) {
        let mut model = Model::maximize();
        let x = model.add_integer_variable("x", 1.0);
        let y = model.add_integer_variable("y", 1.0);
        model.add_constraint(BoundKind::Upper, 3.0, &[(2.0, x), (2.0, y)]);
        let mut tableau = Tableau::from_model(&model, 1e-9).unwrap();
        tableau.simplex();
        (tableau, x, y)
    }

    #[test]
    fn test_bound_cut_on_basic_variable() {
        let (mut tableau, x, _) = fractional();
        assert_abs_diff_eq!(tableau.variable_value(x), 1.5, epsilon = 1e-9);

        tableau
            .add_cut_constraints(&[BranchCut::new(CutKind::Max, x, 1.0)])
            .unwrap();
        assert_eq!(tableau.height(), 3);
        assert_abs_diff_eq!(tableau.rhs(2), -0.5, epsilon = 1e-9);
        assert!(tableau.basis_is_consistent());

        tableau.simplex();
        assert!(tableau.is_feasible());
        assert_abs_diff_eq!(tableau.reported_evaluation(), 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.variable_value(x), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bound_cut_on_non_basic_variable() {
        let (mut tableau, _, y) = fractional();
        assert!(tableau.basis().col_of(y).is_some());

        tableau
            .add_cut_constraints(&[BranchCut::new(CutKind::Min, y, 1.0)])
            .unwrap();
        let column = tableau.basis().col_of(y).unwrap();
        assert_eq!(tableau.rhs(2), -1.0);
        assert_eq!(tableau.row(2)[column], -1.0);

        tableau.simplex();
        assert!(tableau.is_feasible());
        assert_abs_diff_eq!(tableau.variable_value(y), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cut_on_unknown_element_is_rejected() {
        let (mut tableau, _, _) = fractional();
        let before = tableau.height();
        let result = tableau.add_cut_constraints(&[BranchCut::new(CutKind::Max, 40, 1.0)]);
        assert_eq!(result, Err(Error::UnknownElement(40)));
        assert_eq!(tableau.height(), before);
    }

    #[test]
    fn test_lower_bound_mir_cut() {
        let (mut tableau, _, _) = fractional();
        assert!(tableau.add_lower_bound_mir_cut(1));
        // x = 1.5 - y - 0.5 s: frac 0.5, integer y column a = 1, slack column a = 0.5.
        let cut = tableau.row(2);
        assert_abs_diff_eq!(cut[0], -0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.rhs(1).floor(), tableau.rhs(1) + cut[0], epsilon = 1e-9);

        tableau.simplex();
        assert!(tableau.is_feasible());
        assert!(tableau.reported_evaluation() <= 1.5 + 1e-9);
        assert!(tableau.basis_is_consistent());
    }

    #[test]
    fn test_upper_bound_mir_cut() {
        let (mut tableau, _, _) = fractional();
        assert!(tableau.add_upper_bound_mir_cut(1));
        assert_abs_diff_eq!(tableau.rhs(2), -0.5, epsilon = 1e-9);

        tableau.simplex();
        assert!(tableau.is_feasible());
        assert_abs_diff_eq!(tableau.reported_evaluation(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_upper_bound_mir_cut_coefficients() {
        // max x  s.t.  8x + 7y <= 10: x = 1.25 - 0.875 y - 0.125 s, f = 0.25
        let mut model = Model::maximize();
        let x = model.add_integer_variable("x", 1.0);
        let y = model.add_integer_variable("y", 0.0);
        model.add_constraint(BoundKind::Upper, 10.0, &[(8.0, x), (7.0, y)]);
        let mut tableau = Tableau::from_model(&model, 1e-9).unwrap();
        tableau.simplex();
        assert_eq!(tableau.basis().row_of(x), Some(1));
        let y_column = tableau.basis().col_of(y).unwrap();
        let slack_column = 3 - y_column;

        assert!(tableau.add_upper_bound_mir_cut(1));
        let cut = tableau.row(2);
        assert_abs_diff_eq!(cut[RHS_COLUMN], -0.25, epsilon = 1e-12);
        // Integer column with f_j = 0.875 > f: -(1 - f_j) * f / (1 - f).
        assert_abs_diff_eq!(cut[y_column], -0.125 * 0.25 / 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(cut[slack_column], -0.125, epsilon = 1e-12);

        tableau.simplex();
        assert!(tableau.is_feasible());
        assert!(tableau.reported_evaluation() <= 1.25 + 1e-9);
    }

    #[test]
    fn test_mir_skips_unsuitable_rows() {
        let (mut tableau, _, _) = fractional();
        assert!(!tableau.add_lower_bound_mir_cut(0));
        assert!(!tableau.add_upper_bound_mir_cut(0));
        assert!(!tableau.add_lower_bound_mir_cut(7));

        let mut model = Model::maximize();
        let x = model.add_integer_variable("x", 1.0);
        model.add_constraint(BoundKind::Upper, 3.0, &[(1.0, x)]);
        let mut integral = Tableau::from_model(&model, 1e-9).unwrap();
        integral.simplex();
        assert_eq!(integral.apply_mir_cuts(10), 0);
        assert_eq!(integral.height(), 2);
    }

    #[test]
    fn test_apply_mir_cuts_respects_cap() {
        let (mut tableau, _, _) = fractional();
        assert_eq!(tableau.apply_mir_cuts(0), 0);
        assert_eq!(tableau.apply_mir_cuts(10), 1);
        assert_eq!(tableau.height(), 3);
    }
}
