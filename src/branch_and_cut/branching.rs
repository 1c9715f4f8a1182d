//! Branching-variable selection.

use std::collections::HashMap;

use super::node::{BranchDirection, BranchOrigin};
use crate::config::BranchingRule;
use crate::tableau::{Tableau, VariableData};

/// Floor applied to each factor of the pseudocost product.
const SCORE_EPSILON: f64 = 1e-6;

/// Observations needed in each direction before strong branching trusts
/// the pseudocosts of a candidate.
const RELIABLE_OBSERVATIONS: u32 = 2;

/// Running per-unit objective degradation of one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pseudocost {
    up_sum: f64,
    up_count: u32,
    down_sum: f64,
    down_count: u32,
}

impl Pseudocost {
    /// Mean up-branch degradation; 1 before any observation.
    pub fn up_mean(&self) -> f64 {
        if self.up_count == 0 {
            1.0
        } else {
            self.up_sum / f64::from(self.up_count)
        }
    }

    /// Mean down-branch degradation; 1 before any observation.
    pub fn down_mean(&self) -> f64 {
        if self.down_count == 0 {
            1.0
        } else {
            self.down_sum / f64::from(self.down_count)
        }
    }

    pub fn is_reliable(&self, min_count: u32) -> bool {
        self.up_count >= min_count && self.down_count >= min_count
    }
}

/// Picks the variable to split on according to a [`BranchingRule`].
#[derive(Debug, Clone)]
pub struct BranchingSelector {
    rule: BranchingRule,
    pseudocosts: HashMap<usize, Pseudocost>,
}

impl BranchingSelector {
    pub fn new(rule: BranchingRule) -> Self {
        Self {
            rule,
            pseudocosts: HashMap::new(),
        }
    }

    pub fn rule(&self) -> BranchingRule {
        self.rule
    }

    pub fn pseudocost(&self, var_index: usize) -> Pseudocost {
        self.pseudocosts
            .get(&var_index)
            .copied()
            .unwrap_or_default()
    }

    /// Records how much the objective degraded when a child was solved.
    ///
    /// The degradation is normalized by the distance the branch moved the
    /// variable: `1 - f` for up branches and `f` for down branches.
    pub fn record(&mut self, origin: &BranchOrigin, evaluation: f64) {
        let f = origin.fraction();
        let improvement = (evaluation - origin.parent_evaluation).max(0.0);
        if !improvement.is_finite() {
            return;
        }
        let entry = self.pseudocosts.entry(origin.var_index).or_default();
        match origin.direction {
            BranchDirection::Up if f < 1.0 => {
                entry.up_sum += improvement / (1.0 - f);
                entry.up_count += 1;
            }
            BranchDirection::Down if f > 0.0 => {
                entry.down_sum += improvement / f;
                entry.down_count += 1;
            }
            _ => {}
        }
    }

    /// Product-rule pseudocost score of branching on `variable`.
    pub fn score(&self, variable: &VariableData) -> f64 {
        let f = variable.value - variable.value.floor();
        let pseudocost = self.pseudocost(variable.index);
        (pseudocost.up_mean() * (1.0 - f)).max(SCORE_EPSILON)
            * (pseudocost.down_mean() * f).max(SCORE_EPSILON)
    }

    pub fn select(&self, tableau: &Tableau) -> Option<VariableData> {
        match self.rule {
            BranchingRule::MostFractional => tableau.most_fractional_var(),
            BranchingRule::LowestCost => tableau.fractional_var_with_lowest_cost(),
            BranchingRule::Pseudocost => {
                let candidates = tableau.fractional_variables();
                best_by(&candidates, |v| self.score(v))
            }
            BranchingRule::Strong { candidates } => {
                let mut fractional = tableau.fractional_variables();
                fractional.sort_by(|a, b| fractionality(b).total_cmp(&fractionality(a)));
                fractional.truncate(candidates);
                let reliable = fractional
                    .iter()
                    .all(|v| self.pseudocost(v.index).is_reliable(RELIABLE_OBSERVATIONS));
                if reliable {
                    best_by(&fractional, |v| self.score(v))
                } else {
                    best_by(&fractional, |v| {
                        let f = v.value - v.value.floor();
                        f * (1.0 - f)
                    })
                }
            }
        }
    }
}

fn fractionality(variable: &VariableData) -> f64 {
    (variable.value - variable.value.round()).abs()
}

/// Highest-scoring candidate; the earliest one wins ties.
fn best_by(candidates: &[VariableData], score: impl Fn(&VariableData) -> f64) -> Option<VariableData> {
    let mut best: Option<(f64, VariableData)> = None;
    for candidate in candidates {
        let value = score(candidate);
        if best.map_or(true, |(top, _)| value > top) {
            best = Some((value, *candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(var_index: usize, value: f64, direction: BranchDirection, parent_evaluation: f64) -> BranchOrigin {
        BranchOrigin {
            parent: 0,
            var_index,
            value,
            direction,
            parent_evaluation,
        }
    }

    #[test]
    fn test_cold_start_means_default_to_one() {
        let selector = BranchingSelector::new(BranchingRule::Pseudocost);
        let pseudocost = selector.pseudocost(3);
        assert_eq!((pseudocost.up_mean(), pseudocost.down_mean()), (1.0, 1.0));

        let v = VariableData {
            index: 3,
            value: 2.25,
        };
        assert!((selector.score(&v) - 0.75 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_record_normalizes_by_distance() {
        let mut selector = BranchingSelector::new(BranchingRule::Pseudocost);
        selector.record(&origin(1, 2.25, BranchDirection::Up, 10.0), 11.5);
        selector.record(&origin(1, 2.25, BranchDirection::Down, 10.0), 10.5);
        selector.record(&origin(1, 2.25, BranchDirection::Down, 10.0), 9.0);

        let pseudocost = selector.pseudocost(1);
        assert!((pseudocost.up_mean() - 2.0).abs() < 1e-12);
        assert!((pseudocost.down_mean() - 1.0).abs() < 1e-12);
        assert!(!pseudocost.is_reliable(2));
    }

    #[test]
    fn test_infinite_parent_bound_is_ignored() {
        let mut selector = BranchingSelector::new(BranchingRule::Pseudocost);
        selector.record(&origin(1, 0.5, BranchDirection::Up, f64::NEG_INFINITY), 3.0);
        assert_eq!(selector.pseudocost(1), Pseudocost::default());
    }

    #[test]
    fn test_best_by_keeps_first_on_ties() {
        let candidates = [
            VariableData { index: 4, value: 0.5 },
            VariableData { index: 2, value: 1.5 },
        ];
        let picked = best_by(&candidates, |_| 1.0).unwrap();
        assert_eq!(picked.index, 4);
        assert!(best_by(&[], |_| 1.0).is_none());
    }
}
