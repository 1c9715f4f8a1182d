//! Search-tree nodes.

use crate::tableau::{BranchCut, CutKind, VariableData};

pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchDirection {
    /// `x >= ceil(v)`
    Up,
    /// `x <= floor(v)`
    Down,
}

/// The branching decision that created a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchOrigin {
    pub parent: NodeId,
    pub var_index: usize,
    /// Value of the branching variable in the parent's relaxation.
    pub value: f64,
    pub direction: BranchDirection,
    pub parent_evaluation: f64,
}

impl BranchOrigin {
    /// Distance from the parent value down to its floor.
    pub fn fraction(&self) -> f64 {
        self.value - self.value.floor()
    }
}

/// A pending node: the cuts leading to it from the root and the relaxed
/// evaluation of its parent, used for pruning before it is solved.
#[derive(Debug, Clone)]
pub struct Branch {
    pub id: NodeId,
    pub relaxed_evaluation: f64,
    pub cuts: Vec<BranchCut>,
    pub origin: Option<BranchOrigin>,
    pub depth: usize,
}

impl Branch {
    pub fn root() -> Self {
        Self {
            id: 0,
            relaxed_evaluation: f64::NEG_INFINITY,
            cuts: Vec::new(),
            origin: None,
            depth: 0,
        }
    }

    /// The cut that distinguishes this node from its parent.
    pub fn last_cut(&self) -> Option<&BranchCut> {
        self.cuts.last()
    }

    /// Splits on a fractional variable. Returns `(high, low)`.
    ///
    /// Earlier cuts on the same variable go to the child they do not
    /// conflict with; all other cuts are inherited by both children.
    pub fn split(&self, variable: VariableData, evaluation: f64, ids: (NodeId, NodeId)) -> (Branch, Branch) {
        let mut high_cuts = Vec::with_capacity(self.cuts.len() + 1);
        let mut low_cuts = Vec::with_capacity(self.cuts.len() + 1);
        for cut in &self.cuts {
            if cut.var_index == variable.index {
                match cut.kind {
                    CutKind::Min => low_cuts.push(*cut),
                    CutKind::Max => high_cuts.push(*cut),
                }
            } else {
                high_cuts.push(*cut);
                low_cuts.push(*cut);
            }
        }
        high_cuts.push(BranchCut::new(CutKind::Min, variable.index, variable.value.ceil()));
        low_cuts.push(BranchCut::new(CutKind::Max, variable.index, variable.value.floor()));

        let child = |id: NodeId, cuts: Vec<BranchCut>, direction: BranchDirection| Branch {
            id,
            relaxed_evaluation: evaluation,
            cuts,
            origin: Some(BranchOrigin {
                parent: self.id,
                var_index: variable.index,
                value: variable.value,
                direction,
                parent_evaluation: evaluation,
            }),
            depth: self.depth + 1,
        };
        (
            child(ids.0, high_cuts, BranchDirection::Up),
            child(ids.1, low_cuts, BranchDirection::Down),
        )
    }
}
