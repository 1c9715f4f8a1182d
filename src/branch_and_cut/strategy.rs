//! Node ordering and branching dispatch for one search.

use log::debug;

use super::branching::BranchingSelector;
use super::heap::NodeHeap;
use super::node::Branch;
use crate::config::{NodeSelection, SolverConfig};
use crate::tableau::{Tableau, VariableData};

/// Which structure currently holds the pending nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrder {
    BestFirst,
    DepthFirst,
    /// Depth-first until `switched`, best-first afterwards.
    Hybrid { switched: bool },
}

impl From<NodeSelection> for NodeOrder {
    fn from(selection: NodeSelection) -> Self {
        match selection {
            NodeSelection::BestFirst => NodeOrder::BestFirst,
            NodeSelection::DepthFirst => NodeOrder::DepthFirst,
            NodeSelection::Hybrid => NodeOrder::Hybrid { switched: false },
        }
    }
}

/// The node-ordering and branching-variable policies of a search, fixed
/// when the search starts.
pub struct SearchStrategy {
    order: NodeOrder,
    stack: Vec<Branch>,
    heap: NodeHeap<Branch>,
    branching: BranchingSelector,
}

impl SearchStrategy {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            order: config.node_selection.into(),
            stack: Vec::new(),
            heap: NodeHeap::new(),
            branching: BranchingSelector::new(config.branching_rule),
        }
    }

    pub fn order(&self) -> NodeOrder {
        self.order
    }

    fn is_depth_first(&self) -> bool {
        matches!(
            self.order,
            NodeOrder::DepthFirst | NodeOrder::Hybrid { switched: false }
        )
    }

    /// Whether nodes are currently expanded along one path, which is when
    /// parent checkpoints pay off.
    pub fn creates_checkpoints(&self) -> bool {
        self.is_depth_first()
    }

    pub fn push(&mut self, branch: Branch) {
        if self.is_depth_first() {
            self.stack.push(branch);
        } else {
            self.heap.push(branch.relaxed_evaluation, branch);
        }
    }

    pub fn select_node(&mut self) -> Option<Branch> {
        if self.is_depth_first() {
            self.stack.pop()
        } else {
            self.heap.pop().map(|(_, branch)| branch)
        }
    }

    pub fn select_branch_variable(&self, tableau: &Tableau) -> Option<VariableData> {
        self.branching.select(tableau)
    }

    /// Feeds the solved relaxation of a child back into the pseudocosts.
    pub fn record_outcome(&mut self, branch: &Branch, evaluation: f64) {
        if let Some(origin) = &branch.origin {
            self.branching.record(origin, evaluation);
        }
    }

    /// Called for every new incumbent. A hybrid search switches to
    /// best-first on the first one.
    pub fn incumbent_found(&mut self) {
        if self.order == (NodeOrder::Hybrid { switched: false }) {
            debug!("first incumbent found, moving {} nodes to best-first", self.stack.len());
            self.order = NodeOrder::Hybrid { switched: true };
            for branch in self.stack.drain(..) {
                self.heap.push(branch.relaxed_evaluation, branch);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len() + self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
