//! Read-only variable metadata shared by a tableau and all of its copies.

use std::collections::HashSet;

use crate::model::Model;

/// What the engine needs to know about a structural variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub cost: f64,
    pub priority: u32,
    pub is_integer: bool,
}

/// Lookup from element index to variable metadata.
///
/// Indices without an entry (constraint slacks and cut slacks) are synthetic
/// slack variables and never appear in a reported solution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    by_index: Vec<Option<VariableInfo>>,
    integer: Vec<usize>,
    unrestricted: HashSet<usize>,
}

impl VariableTable {
    pub fn from_model(model: &Model) -> Self {
        let mut by_index = vec![None; model.element_count()];
        for variable in &model.variables {
            if variable.index >= by_index.len() {
                by_index.resize(variable.index + 1, None);
            }
            by_index[variable.index] = Some(VariableInfo {
                name: variable.name.clone(),
                cost: variable.cost,
                priority: variable.priority,
                is_integer: variable.is_integer,
            });
        }
        Self {
            by_index,
            integer: model.integer_variables().map(|v| v.index).collect(),
            unrestricted: model.unrestricted.clone(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&VariableInfo> {
        self.by_index.get(index).and_then(Option::as_ref)
    }

    pub fn is_slack(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    pub fn is_integer(&self, index: usize) -> bool {
        self.get(index).is_some_and(|v| v.is_integer)
    }

    pub fn is_unrestricted(&self, index: usize) -> bool {
        self.unrestricted.contains(&index)
    }

    /// Integer variable indices in declaration order.
    pub fn integer_indices(&self) -> &[usize] {
        &self.integer
    }
}
