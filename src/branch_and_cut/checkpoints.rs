//! Solved parent states kept for incremental child restores.

use std::collections::HashMap;

use super::node::NodeId;
use crate::tableau::{Checkpoint, Tableau};

struct Stored {
    checkpoint: Checkpoint,
    /// Children that have not been processed yet.
    pending: usize,
}

/// Parent checkpoints keyed by node, bounded by a fixed budget.
///
/// A checkpoint lives until both children of its node have been processed.
/// Freed checkpoints keep their buffers for the next parent.
pub struct CheckpointStore {
    entries: HashMap<NodeId, Stored>,
    spare: Vec<Checkpoint>,
    capacity: usize,
}

impl CheckpointStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            spare: Vec::new(),
            capacity,
        }
    }

    /// Snapshots `tableau` as the state of `node`, to be consumed by its two
    /// children. Returns false when the budget is exhausted.
    pub fn store(&mut self, node: NodeId, tableau: &Tableau) -> bool {
        if !self.has_room() {
            return false;
        }
        let checkpoint = self.stage(tableau);
        self.commit(node, checkpoint)
    }

    pub fn has_room(&self) -> bool {
        self.entries.len() < self.capacity
    }

    /// Snapshots `tableau` into a recycled buffer without registering it.
    pub fn stage(&mut self, tableau: &Tableau) -> Checkpoint {
        let mut checkpoint = self.spare.pop().unwrap_or_default();
        tableau.checkpoint_into(&mut checkpoint);
        checkpoint
    }

    /// Registers a checkpoint taken earlier with [`stage`](Self::stage) as
    /// the state of `node`. Returns false when the budget is exhausted.
    pub fn commit(&mut self, node: NodeId, checkpoint: Checkpoint) -> bool {
        if !self.has_room() {
            self.spare.push(checkpoint);
            return false;
        }
        self.entries.insert(
            node,
            Stored {
                checkpoint,
                pending: 2,
            },
        );
        true
    }

    pub fn get(&self, node: NodeId) -> Option<&Checkpoint> {
        self.entries.get(&node).map(|stored| &stored.checkpoint)
    }

    /// Marks one child of `node` as processed.
    pub fn release(&mut self, node: NodeId) {
        let Some(stored) = self.entries.get_mut(&node) else {
            return;
        };
        stored.pending = stored.pending.saturating_sub(1);
        if stored.pending == 0 {
            if let Some(stored) = self.entries.remove(&node) {
                self.spare.push(stored.checkpoint);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundKind, Model};

    fn tableau() -> Tableau {
        let mut model = Model::maximize();
        let x = model.add_integer_variable("x", 1.0);
        model.add_constraint(BoundKind::Upper, 2.5, &[(1.0, x)]);
        let mut tableau = Tableau::from_model(&model, 1e-9).unwrap();
        tableau.simplex();
        tableau
    }

    #[test]
    fn test_checkpoint_lives_until_both_children_ran() {
        let tableau = tableau();
        let mut store = CheckpointStore::new(4);
        assert!(store.store(1, &tableau));
        assert_eq!(store.get(1).map(Checkpoint::height), Some(2));

        store.release(1);
        assert!(store.get(1).is_some());
        store.release(1);
        assert!(store.get(1).is_none());
        assert!(store.is_empty());

        store.release(42);
        assert!(store.is_empty());
    }

    #[test]
    fn test_budget_is_enforced() {
        let tableau = tableau();
        let mut store = CheckpointStore::new(1);
        assert!(store.store(1, &tableau));
        assert!(!store.store(2, &tableau));
        assert_eq!(store.len(), 1);

        let mut disabled = CheckpointStore::new(0);
        assert!(!disabled.store(1, &tableau));
        assert_eq!(disabled.capacity(), 0);
    }

    #[test]
    fn test_staged_checkpoint_keeps_the_earlier_state() {
        let mut tableau = tableau();
        let mut store = CheckpointStore::new(1);
        assert!(store.has_room());
        let staged = store.stage(&tableau);
        assert!(store.is_empty());

        tableau.apply_mir_cuts(10);
        assert!(store.commit(3, staged));
        assert_eq!(store.get(3).map(Checkpoint::height), Some(2));
        assert!(!store.has_room());

        let extra = store.stage(&tableau);
        assert!(!store.commit(4, extra));
        assert!(store.get(4).is_none());
    }
}
