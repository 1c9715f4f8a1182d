//! Normalized model handed to the engine.
//!
//! This is deliberately thin: it does no parsing and little validation. It
//! only allocates indices from the shared variable/constraint index space and
//! keeps the flags the search reads.

use std::collections::HashSet;
use std::time::Duration;

/// A decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub index: usize,
    pub cost: f64,
    /// 0 is the primary objective; higher values are lexicographically secondary.
    pub priority: u32,
    pub is_integer: bool,
}

/// One `coefficient * variable` term of a constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub coefficient: f64,
    pub variable: usize,
}

/// Whether a constraint bounds its left-hand side from above or below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// `terms <= rhs`
    Upper,
    /// `terms >= rhs`
    Lower,
}

/// A linear constraint. Its slack variable shares the constraint's index.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub index: usize,
    pub rhs: f64,
    pub kind: BoundKind,
    pub terms: Vec<Term>,
}

impl Constraint {
    /// `+1` for upper-bound rows and `-1` for lower-bound rows, which are
    /// stored negated so every tableau row is in `<=` form.
    pub fn sign(&self) -> f64 {
        match self.kind {
            BoundKind::Upper => 1.0,
            BoundKind::Lower => -1.0,
        }
    }
}

/// A linear or mixed-integer program in matrix-ready form.
#[derive(Debug, Clone)]
pub struct Model {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub is_minimization: bool,
    /// Variables allowed to take negative values.
    pub unrestricted: HashSet<usize>,
    /// Relative gap at which branch-and-cut may stop early. 0 disables it.
    pub tolerance: f64,
    pub timeout: Option<Duration>,
    /// Record every improving incumbent found during the search.
    pub keep_solutions: bool,
    pub check_cycles: bool,
    pub use_mir_cuts: bool,
    next_index: usize,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
            is_minimization: true,
            unrestricted: HashSet::new(),
            tolerance: 0.0,
            timeout: None,
            keep_solutions: false,
            check_cycles: false,
            use_mir_cuts: false,
            next_index: 0,
        }
    }
}

impl Model {
    /// An empty minimization model.
    pub fn minimize() -> Self {
        Self::default()
    }

    /// An empty maximization model.
    pub fn maximize() -> Self {
        Self {
            is_minimization: false,
            ..Self::default()
        }
    }

    fn next_element_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Adds a continuous variable and returns its index.
    pub fn add_variable(&mut self, name: impl Into<String>, cost: f64) -> usize {
        self.add_variable_with_priority(name, cost, 0, false)
    }

    /// Adds an integer variable and returns its index.
    pub fn add_integer_variable(&mut self, name: impl Into<String>, cost: f64) -> usize {
        self.add_variable_with_priority(name, cost, 0, true)
    }

    pub fn add_variable_with_priority(
        &mut self,
        name: impl Into<String>,
        cost: f64,
        priority: u32,
        is_integer: bool,
    ) -> usize {
        let index = self.next_element_index();
        self.variables.push(Variable {
            name: name.into(),
            index,
            cost,
            priority,
            is_integer,
        });
        index
    }

    /// Adds `sum(coefficient * variable) (<=|>=) rhs` and returns the
    /// constraint's index.
    pub fn add_constraint(&mut self, kind: BoundKind, rhs: f64, terms: &[(f64, usize)]) -> usize {
        let index = self.next_element_index();
        self.constraints.push(Constraint {
            index,
            rhs,
            kind,
            terms: terms
                .iter()
                .map(|&(coefficient, variable)| Term {
                    coefficient,
                    variable,
                })
                .collect(),
        });
        index
    }

    /// Adds an equality as an upper and a lower constraint. Returns both indices.
    pub fn add_equality(&mut self, rhs: f64, terms: &[(f64, usize)]) -> (usize, usize) {
        let upper = self.add_constraint(BoundKind::Upper, rhs, terms);
        let lower = self.add_constraint(BoundKind::Lower, rhs, terms);
        (upper, lower)
    }

    /// Lets a variable take negative values.
    pub fn set_unrestricted(&mut self, variable: usize) {
        self.unrestricted.insert(variable);
    }

    /// Softens a constraint with a penalized relaxation variable.
    ///
    /// The relaxation variable is charged `weight` per unit of violation on the
    /// objective of the given priority. Returns the relaxation variable's index,
    /// or `None` when the constraint does not exist.
    pub fn relax_constraint(&mut self, constraint: usize, weight: f64, priority: u32) -> Option<usize> {
        let position = self.constraints.iter().position(|c| c.index == constraint)?;
        let cost = if self.is_minimization { weight } else { -weight };
        let relaxation = self.add_variable_with_priority(format!("r{}", constraint), cost, priority, false);
        let row = &mut self.constraints[position];
        let coefficient = match row.kind {
            BoundKind::Upper => -1.0,
            BoundKind::Lower => 1.0,
        };
        row.terms.push(Term {
            coefficient,
            variable: relaxation,
        });
        Some(relaxation)
    }

    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.iter().find(|v| v.index == index)
    }

    pub fn constraint(&self, index: usize) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.index == index)
    }

    /// Integer-restricted variables, in declaration order.
    pub fn integer_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.is_integer)
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(|v| v.is_integer)
    }

    /// Size of the shared index space (variables plus constraints).
    pub fn element_count(&self) -> usize {
        self.variables.len() + self.constraints.len()
    }
}
