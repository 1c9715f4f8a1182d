//! Row/column assignment of basic and non-basic variables.

/// Bidirectional basis maps.
///
/// Every live element index is either basic (owns a row) or non-basic (owns
/// a column), never both and never neither. The four arrays are only ever
/// changed together through the methods below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Basis {
    var_by_row: Vec<Option<usize>>,
    var_by_col: Vec<Option<usize>>,
    row_by_var: Vec<Option<usize>>,
    col_by_var: Vec<Option<usize>>,
}

impl Basis {
    pub fn new(width: usize, height: usize, n_vars: usize) -> Self {
        Self {
            var_by_row: vec![None; height],
            var_by_col: vec![None; width],
            row_by_var: vec![None; n_vars],
            col_by_var: vec![None; n_vars],
        }
    }

    fn ensure_var(&mut self, var: usize) {
        if var >= self.row_by_var.len() {
            self.row_by_var.resize(var + 1, None);
            self.col_by_var.resize(var + 1, None);
        }
    }

    /// Makes `var` the basic variable of `row`.
    pub fn set_basic(&mut self, var: usize, row: usize) {
        self.ensure_var(var);
        if row >= self.var_by_row.len() {
            self.var_by_row.resize(row + 1, None);
        }
        self.row_by_var[var] = Some(row);
        self.col_by_var[var] = None;
        self.var_by_row[row] = Some(var);
    }

    /// Makes `var` the non-basic variable of `col`.
    pub fn set_non_basic(&mut self, var: usize, col: usize) {
        self.ensure_var(var);
        if col >= self.var_by_col.len() {
            self.var_by_col.resize(col + 1, None);
        }
        self.col_by_var[var] = Some(col);
        self.row_by_var[var] = None;
        self.var_by_col[col] = Some(var);
    }

    /// Exchanges the variable of `row` with the variable of `col`.
    ///
    /// Returns `(leaving, entering)`.
    pub fn swap(&mut self, row: usize, col: usize) -> (Option<usize>, Option<usize>) {
        let leaving = self.var_by_row[row];
        let entering = self.var_by_col[col];
        self.var_by_row[row] = entering;
        self.var_by_col[col] = leaving;
        if let Some(entering) = entering {
            self.row_by_var[entering] = Some(row);
            self.col_by_var[entering] = None;
        }
        if let Some(leaving) = leaving {
            self.row_by_var[leaving] = None;
            self.col_by_var[leaving] = Some(col);
        }
        (leaving, entering)
    }

    /// Moves the basic variable of row `from` onto row `to`, leaving `from` empty.
    pub fn move_row(&mut self, from: usize, to: usize) {
        let var = self.var_by_row[from].take();
        self.var_by_row[to] = var;
        if let Some(var) = var {
            self.row_by_var[var] = Some(to);
        }
    }

    /// Drops the element from the basis entirely. The index must not be
    /// referenced again until it is reassigned.
    pub fn release(&mut self, var: usize) {
        if let Some(row) = self.row_of(var) {
            self.var_by_row[row] = None;
        }
        if let Some(col) = self.col_of(var) {
            self.var_by_col[col] = None;
        }
        if var < self.row_by_var.len() {
            self.row_by_var[var] = None;
            self.col_by_var[var] = None;
        }
    }

    pub fn truncate_rows(&mut self, height: usize) {
        self.var_by_row.truncate(height);
    }

    pub fn row_of(&self, var: usize) -> Option<usize> {
        self.row_by_var.get(var).copied().flatten()
    }

    pub fn col_of(&self, var: usize) -> Option<usize> {
        self.col_by_var.get(var).copied().flatten()
    }

    pub fn var_at_row(&self, row: usize) -> Option<usize> {
        self.var_by_row.get(row).copied().flatten()
    }

    pub fn var_at_col(&self, col: usize) -> Option<usize> {
        self.var_by_col.get(col).copied().flatten()
    }

    /// Overwrites this basis with `other`, reusing the existing allocations.
    pub fn copy_from(&mut self, other: &Basis) {
        self.var_by_row.clone_from(&other.var_by_row);
        self.var_by_col.clone_from(&other.var_by_col);
        self.row_by_var.clone_from(&other.row_by_var);
        self.col_by_var.clone_from(&other.col_by_var);
    }

    /// Checks the exactly-one-of invariant and the agreement of both
    /// directions for every index in `0..n_indexes` not listed in `free`.
    pub fn is_consistent(&self, n_indexes: usize, free: &[usize]) -> bool {
        (0..n_indexes)
            .filter(|var| !free.contains(var))
            .all(|var| match (self.row_of(var), self.col_of(var)) {
                (Some(row), None) => self.var_at_row(row) == Some(var),
                (None, Some(col)) => self.var_at_col(col) == Some(var),
                _ => false,
            })
    }
}
