//! Branch-and-cut search over a [`Tableau`].
//!
//! Each node is described by the list of bound cuts leading to it from the
//! root. A node is solved either by restoring the saved root relaxation and
//! replaying all of its cuts, or, when its parent's solved state is still
//! checkpointed, by restoring that state and adding only the last cut.

pub mod branching;
pub mod checkpoints;
pub mod heap;
pub mod node;
pub mod strategy;


use std::time::Instant;

use log::{debug, trace};

use crate::config::SolverConfig;
use crate::error::Result;
use crate::model::Model;
use crate::tableau::{BranchCut, Checkpoint, IntermediateSolution, OptionalObjective, Tableau, RHS_COLUMN};

pub use branching::{BranchingSelector, Pseudocost};
pub use checkpoints::CheckpointStore;
pub use heap::NodeHeap;
pub use node::{Branch, BranchDirection, BranchOrigin, NodeId};
pub use strategy::{NodeOrder, SearchStrategy};

/// MIR tightening applied after every node relaxation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutPolicy {
    pub use_mir_cuts: bool,
    pub max_rounds: usize,
    pub max_cuts: usize,
    /// A round must bring the fractional volume below this share of its
    /// previous value for another round to run.
    pub improvement_ratio: f64,
}

impl CutPolicy {
    pub fn new(model: &Model, config: &SolverConfig) -> Self {
        Self {
            use_mir_cuts: model.use_mir_cuts,
            max_rounds: config.max_mir_rounds,
            max_cuts: config.max_mir_cuts,
            improvement_ratio: config.mir_improvement_ratio,
        }
    }

    pub fn disabled() -> Self {
        Self {
            use_mir_cuts: false,
            max_rounds: 0,
            max_cuts: 0,
            improvement_ratio: 1.0,
        }
    }
}

/// Outcome of a search beyond what the tableau itself records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchReport {
    pub iterations: usize,
    /// Stopped on the deadline or the tolerance gap.
    pub interrupted: bool,
    pub solutions: Vec<IntermediateSolution>,
}

/// Restores the saved root relaxation, adds `cuts` and re-solves.
pub fn replay_cuts(tableau: &mut Tableau, cuts: &[BranchCut]) -> Result<()> {
    tableau.restore();
    tableau.add_cut_constraints(cuts)?;
    tableau.simplex();
    Ok(())
}

/// Replays `cuts` from the root and tightens the result with MIR rounds.
pub fn apply_cuts(tableau: &mut Tableau, cuts: &[BranchCut], policy: &CutPolicy) -> Result<()> {
    replay_cuts(tableau, cuts)?;
    tighten_with_mir(tableau, policy);
    Ok(())
}

/// Adds one cut on top of the current (parent) state and re-solves.
///
/// The parent state must not carry MIR rows, otherwise the result differs
/// from [`replay_cuts`] with the full cut list.
pub fn apply_incremental_cut(tableau: &mut Tableau, cut: &BranchCut) -> Result<()> {
    tableau.add_cut_constraints(std::slice::from_ref(cut))?;
    tableau.simplex();
    Ok(())
}

/// Runs MIR rounds until one adds nothing, stops paying off, or the
/// relaxation is no longer feasible and bounded. Returns the cuts added.
pub fn tighten_with_mir(tableau: &mut Tableau, policy: &CutPolicy) -> usize {
    if !policy.use_mir_cuts {
        return 0;
    }
    let mut total = 0;
    for _ in 0..policy.max_rounds {
        if !tableau.is_feasible() || !tableau.is_bounded() {
            break;
        }
        let before = tableau.compute_fractional_volume(true);
        let added = tableau.apply_mir_cuts(policy.max_cuts);
        if added == 0 {
            break;
        }
        total += added;
        tableau.simplex();
        let after = tableau.compute_fractional_volume(true);
        if after >= policy.improvement_ratio * before {
            break;
        }
    }
    total
}

/// True when the current optional objectives beat `best` lexicographically.
fn improves_lexicographically(objectives: &[OptionalObjective], best: &[f64]) -> bool {
    for (objective, &best) in objectives.iter().zip(best) {
        let value = objective.reduced_costs[RHS_COLUMN];
        if value > best {
            return false;
        }
        if value < best {
            return true;
        }
    }
    false
}

/// How the incumbent can be brought back once the search ends.
enum Incumbent {
    /// Replaying the cuts from the root reproduces it.
    Replay(Vec<BranchCut>),
    /// It was reached from a parent checkpoint, so its exact state is kept.
    Snapshot(Box<Checkpoint>),
}

/// One branch-and-cut run with its limits fixed from the model and config.
pub struct BranchAndCut<'a> {
    config: &'a SolverConfig,
    policy: CutPolicy,
    tolerance: f64,
    deadline: Option<Instant>,
    keep_solutions: bool,
}

impl<'a> BranchAndCut<'a> {
    pub fn new(model: &Model, config: &'a SolverConfig) -> Self {
        Self {
            config,
            policy: CutPolicy::new(model, config),
            tolerance: model.tolerance,
            deadline: model.timeout.map(|timeout| Instant::now() + timeout),
            keep_solutions: model.keep_solutions,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn gap_closed(&self, tableau: &Tableau, best_evaluation: f64) -> bool {
        if self.tolerance <= 0.0 {
            return false;
        }
        let threshold = if tableau.is_minimization {
            tableau.best_possible_eval * (1.0 + self.tolerance)
        } else {
            tableau.best_possible_eval * (1.0 - self.tolerance)
        };
        best_evaluation < threshold
    }

    /// Brings the tableau to the solved relaxation of `branch`, before any
    /// MIR tightening. Returns true when a parent checkpoint was used.
    fn restore_node(&self, tableau: &mut Tableau, store: &CheckpointStore, branch: &Branch) -> Result<bool> {
        if let (Some(origin), Some(cut)) = (&branch.origin, branch.last_cut()) {
            if let Some(checkpoint) = store.get(origin.parent) {
                tableau.restore_checkpoint(checkpoint);
                apply_incremental_cut(tableau, cut)?;
                return Ok(true);
            }
        }
        replay_cuts(tableau, &branch.cuts)?;
        Ok(false)
    }

    fn record_solution(&self, tableau: &Tableau, iteration: usize, report: &mut SearchReport) {
        if self.keep_solutions {
            report.solutions.push(IntermediateSolution {
                evaluation: tableau.reported_evaluation(),
                iteration,
                values: tableau.solution_set(),
            });
        }
    }

    /// Searches for the best integral solution and leaves the tableau in
    /// its solved state. Without any incumbent the tableau is marked
    /// infeasible.
    pub fn run(&self, tableau: &mut Tableau) -> Result<SearchReport> {
        let trace_enabled = self.config.trace;
        let mut strategy = SearchStrategy::new(self.config);
        let mut store = CheckpointStore::new(self.config.max_checkpoints);
        let mut report = SearchReport::default();

        let mut best_evaluation = f64::INFINITY;
        let mut best_optional = vec![f64::INFINITY; tableau.optional_objectives.len()];
        let mut incumbent: Option<Incumbent> = None;
        let mut unbounded = false;
        let mut iterations = 0;
        let mut next_id: NodeId = 1;

        strategy.push(Branch::root());
        loop {
            if self.deadline_passed() {
                debug!("branch-and-cut deadline reached after {} iterations", iterations);
                report.interrupted = true;
                break;
            }
            if self.gap_closed(tableau, best_evaluation) {
                debug!(
                    "incumbent {} within tolerance of bound {}",
                    best_evaluation, tableau.best_possible_eval
                );
                report.interrupted = true;
                break;
            }
            let Some(branch) = strategy.select_node() else {
                break;
            };
            let parent = branch.origin.map(|origin| origin.parent);

            if branch.relaxed_evaluation > best_evaluation {
                if let Some(parent) = parent {
                    store.release(parent);
                }
                continue;
            }

            let incremental = self.restore_node(tableau, &store, &branch)?;
            if let Some(parent) = parent {
                store.release(parent);
            }
            iterations += 1;

            // Children replay only branch cuts, so a parent checkpoint must be
            // taken before MIR rows are added. The root is exempt: its
            // tightened state is what `restore` brings back.
            let staged = (self.policy.use_mir_cuts
                && branch.origin.is_some()
                && strategy.creates_checkpoints()
                && store.has_room())
            .then(|| store.stage(tableau));
            tighten_with_mir(tableau, &self.policy);

            if !tableau.bounded {
                debug!("relaxation of node {} is unbounded", branch.id);
                unbounded = true;
                break;
            }
            if !tableau.feasible {
                if trace_enabled {
                    trace!("node {} infeasible", branch.id);
                }
                continue;
            }

            let evaluation = tableau.evaluation;
            strategy.record_outcome(&branch, evaluation);
            if trace_enabled {
                trace!(
                    "node {} depth {} cuts {} evaluation {} ({} pending)",
                    branch.id,
                    branch.depth,
                    branch.cuts.len(),
                    evaluation,
                    strategy.len()
                );
            }

            if evaluation > best_evaluation {
                continue;
            }
            if evaluation == best_evaluation
                && !improves_lexicographically(&tableau.optional_objectives, &best_optional)
            {
                continue;
            }

            if tableau.is_integral() {
                if iterations == 1 {
                    self.record_solution(tableau, iterations, &mut report);
                    tableau.branch_and_cut_iterations = iterations;
                    report.iterations = iterations;
                    return Ok(report);
                }
                debug!("new incumbent {} at iteration {}", evaluation, iterations);
                best_evaluation = evaluation;
                for (best, objective) in best_optional.iter_mut().zip(&tableau.optional_objectives) {
                    *best = objective.reduced_costs[RHS_COLUMN];
                }
                incumbent = Some(if incremental {
                    Incumbent::Snapshot(Box::new(tableau.checkpoint()))
                } else {
                    Incumbent::Replay(branch.cuts.clone())
                });
                self.record_solution(tableau, iterations, &mut report);
                strategy.incumbent_found();
            } else {
                if iterations == 1 {
                    tableau.save();
                }
                let Some(variable) = strategy.select_branch_variable(tableau) else {
                    continue;
                };
                if trace_enabled {
                    trace!("branching on {} = {}", variable.index, variable.value);
                }
                let (high, low) = branch.split(variable, evaluation, (next_id, next_id + 1));
                next_id += 2;
                let checkpointed = match staged {
                    Some(checkpoint) => store.commit(branch.id, checkpoint),
                    None => strategy.creates_checkpoints() && store.store(branch.id, tableau),
                };
                if checkpointed && trace_enabled {
                    trace!("checkpointed node {} ({} live)", branch.id, store.len());
                }
                strategy.push(high);
                strategy.push(low);
            }
        }

        if !unbounded {
            match incumbent {
                Some(Incumbent::Snapshot(state)) => tableau.restore_checkpoint(&state),
                Some(Incumbent::Replay(cuts)) => apply_cuts(tableau, &cuts, &self.policy)?,
                None => tableau.feasible = false,
            }
        }
        tableau.branch_and_cut_iterations = iterations;
        report.iterations = iterations;
        Ok(report)
    }
}
