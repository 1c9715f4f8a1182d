//! Solver configuration.

use crate::error::{Error, Result};

/// Order in which pending search-tree nodes are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Always expand the node with the most promising relaxed bound.
    #[default]
    BestFirst,
    /// Expand the newest node first. Enables incremental checkpoints.
    DepthFirst,
    /// Depth-first until the first incumbent, then best-first.
    Hybrid,
}

/// Rule used to pick the variable to split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Largest distance to the nearest integer.
    #[default]
    MostFractional,
    /// Smallest objective coefficient among fractional variables.
    LowestCost,
    /// Product of historical up/down degradation estimates.
    Pseudocost,
    /// Pseudocost over the most fractional `candidates`, falling back to
    /// `f * (1 - f)` until the candidates have enough history.
    Strong { candidates: usize },
}

/// Tuning knobs shared by the simplex engine and the branch-and-cut search.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Tolerance for every zero, feasibility and integrality comparison.
    pub precision: f64,
    pub node_selection: NodeSelection,
    pub branching_rule: BranchingRule,
    /// Maximum number of live parent checkpoints. 0 disables incremental restore.
    pub max_checkpoints: usize,
    /// MIR tightening rounds per node.
    pub max_mir_rounds: usize,
    /// MIR cuts added per round.
    pub max_mir_cuts: usize,
    /// A MIR round must shrink the fractional volume below this ratio to continue.
    pub mir_improvement_ratio: f64,
    /// Emit per-node and per-pivot trace logs.
    pub trace: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            precision: 1e-9,
            node_selection: NodeSelection::default(),
            branching_rule: BranchingRule::default(),
            max_checkpoints: 64,
            max_mir_rounds: 3,
            max_mir_cuts: 10,
            mir_improvement_ratio: 0.9,
            trace: false,
        }
    }
}

impl SolverConfig {
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_node_selection(mut self, node_selection: NodeSelection) -> Self {
        self.node_selection = node_selection;
        self
    }

    pub fn with_branching_rule(mut self, branching_rule: BranchingRule) -> Self {
        self.branching_rule = branching_rule;
        self
    }

    pub fn with_max_checkpoints(mut self, max_checkpoints: usize) -> Self {
        self.max_checkpoints = max_checkpoints;
        self
    }

    /// Create settings with trace output enabled.
    pub fn traced() -> Self {
        Self {
            trace: true,
            ..Self::default()
        }
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "precision must be positive and finite, got {}",
                self.precision
            )));
        }
        if let BranchingRule::Strong { candidates: 0 } = self.branching_rule {
            return Err(Error::InvalidConfig(
                "strong branching needs at least one candidate".to_string(),
            ));
        }
        if !(self.mir_improvement_ratio > 0.0 && self.mir_improvement_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "MIR improvement ratio must lie in (0, 1], got {}",
                self.mir_improvement_ratio
            )));
        }
        Ok(())
    }
}
