//! Snapshots of the mutable tableau state.

use std::rc::Rc;

use super::{Basis, OptionalObjective, Tableau};

/// Everything a pivot or a cut can change.
///
/// The variable table is not part of a checkpoint: it never changes during
/// a solve and is shared by reference.
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    matrix: Vec<f64>,
    width: usize,
    height: usize,
    basis: Basis,
    optional_objectives: Vec<OptionalObjective>,
    available_indexes: Vec<usize>,
    last_element_index: usize,
    n_vars: usize,
    evaluation: f64,
    feasible: bool,
    bounded: bool,
}

impl Checkpoint {
    pub fn height(&self) -> usize {
        self.height
    }

    /// Approximate heap footprint of the stored matrix, in entries.
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

impl Tableau {
    /// An independent tableau with the same state. The variable table is
    /// shared; every structure a solve mutates is duplicated. The single
    /// save slot is not carried over.
    pub fn copy(&self) -> Tableau {
        let mut copy = Tableau::new(self.precision);
        copy.matrix = self.matrix[..self.width * self.height].to_vec();
        copy.width = self.width;
        copy.height = self.height;
        copy.basis = self.basis.clone();
        copy.variables = Rc::clone(&self.variables);
        copy.optional_objectives = self.optional_objectives.clone();
        copy.available_indexes = self.available_indexes.clone();
        copy.last_element_index = self.last_element_index;
        copy.n_vars = self.n_vars;
        copy.is_minimization = self.is_minimization;
        copy.check_cycles = self.check_cycles;
        copy.feasible = self.feasible;
        copy.bounded = self.bounded;
        copy.evaluation = self.evaluation;
        copy.best_possible_eval = self.best_possible_eval;
        copy.simplex_iters = self.simplex_iters;
        copy.unbounded_var_index = self.unbounded_var_index;
        copy.branch_and_cut_iterations = self.branch_and_cut_iterations;
        copy.trace = self.trace;
        copy
    }

    pub fn checkpoint(&self) -> Checkpoint {
        let mut checkpoint = Checkpoint::default();
        self.checkpoint_into(&mut checkpoint);
        checkpoint
    }

    /// Overwrites `checkpoint` with the current state, reusing its buffers.
    pub fn checkpoint_into(&self, checkpoint: &mut Checkpoint) {
        let live = self.width * self.height;
        checkpoint.matrix.clear();
        checkpoint.matrix.extend_from_slice(&self.matrix[..live]);
        checkpoint.width = self.width;
        checkpoint.height = self.height;
        checkpoint.basis.copy_from(&self.basis);
        checkpoint
            .optional_objectives
            .clone_from(&self.optional_objectives);
        checkpoint
            .available_indexes
            .clone_from(&self.available_indexes);
        checkpoint.last_element_index = self.last_element_index;
        checkpoint.n_vars = self.n_vars;
        checkpoint.evaluation = self.evaluation;
        checkpoint.feasible = self.feasible;
        checkpoint.bounded = self.bounded;
    }

    /// Bulk-copies a checkpoint back into the live buffers. Spare rows past
    /// the restored height are kept for reuse.
    pub fn restore_checkpoint(&mut self, checkpoint: &Checkpoint) {
        let live = checkpoint.matrix.len();
        if self.matrix.len() < live {
            self.matrix.resize(live, 0.0);
        }
        self.matrix[..live].copy_from_slice(&checkpoint.matrix);
        self.width = checkpoint.width;
        self.height = checkpoint.height;
        self.basis.copy_from(&checkpoint.basis);
        self.optional_objectives
            .clone_from(&checkpoint.optional_objectives);
        self.available_indexes
            .clone_from(&checkpoint.available_indexes);
        self.last_element_index = checkpoint.last_element_index;
        self.n_vars = checkpoint.n_vars;
        self.evaluation = checkpoint.evaluation;
        self.feasible = checkpoint.feasible;
        self.bounded = checkpoint.bounded;
    }

    /// Fills the single save slot with the current state.
    pub fn save(&mut self) {
        let mut slot = self.saved_state.take().unwrap_or_default();
        self.checkpoint_into(&mut slot);
        self.saved_state = Some(slot);
    }

    /// Returns to the state of the last [`Tableau::save`]. Does nothing if
    /// nothing was saved.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved_state.take() {
            self.restore_checkpoint(&state);
            self.saved_state = Some(state);
        }
    }

    pub fn has_saved_state(&self) -> bool {
        self.saved_state.is_some()
    }
}
