//! Integrality queries over the current basic solution.

use super::Tableau;

/// A variable picked for branching together with its current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableData {
    pub index: usize,
    pub value: f64,
}

impl Tableau {
    fn fraction(value: f64) -> f64 {
        (value - value.round()).abs()
    }

    /// Basic integer variables with their current values.
    fn basic_integer_values(&self) -> impl Iterator<Item = VariableData> + '_ {
        self.variables
            .integer_indices()
            .iter()
            .filter_map(move |&index| {
                self.basis.row_of(index).map(|row| VariableData {
                    index,
                    value: self.rhs(row),
                })
            })
    }

    /// True when every basic integer variable is within `precision` of an
    /// integer. Non-basic variables sit at zero and count as integral.
    pub fn is_integral(&self) -> bool {
        self.basic_integer_values()
            .all(|v| Self::fraction(v.value) <= self.precision)
    }

    /// Number of rows whose basic integer variable currently holds an integer.
    pub fn count_integer_values(&self) -> usize {
        (1..self.height)
            .filter(|&row| {
                self.basis
                    .var_at_row(row)
                    .is_some_and(|v| self.variables.is_integer(v))
            })
            .filter(|&row| {
                let value = self.rhs(row);
                value - value.floor() < self.precision
            })
            .count()
    }

    /// Product of the magnitudes of the fractional basic integer variables.
    ///
    /// Returns 0 when nothing is fractional, or as soon as an integral one is
    /// met unless `ignore_integer_values` is set.
    pub fn compute_fractional_volume(&self, ignore_integer_values: bool) -> f64 {
        let mut volume: Option<f64> = None;
        for data in self.basic_integer_values() {
            let magnitude = data.value.abs();
            if magnitude - magnitude.floor() < self.precision {
                if !ignore_integer_values {
                    return 0.0;
                }
                continue;
            }
            volume = Some(volume.map_or(magnitude, |v| v * magnitude));
        }
        volume.unwrap_or(0.0)
    }

    /// The basic integer variable farthest from an integer.
    pub fn most_fractional_var(&self) -> Option<VariableData> {
        let mut best: Option<VariableData> = None;
        let mut biggest = 0.0;
        for data in self.basic_integer_values() {
            let fraction = Self::fraction(data.value);
            if fraction > biggest {
                biggest = fraction;
                best = Some(data);
            }
        }
        best
    }

    /// The fractional basic integer variable with the smallest objective cost.
    pub fn fractional_var_with_lowest_cost(&self) -> Option<VariableData> {
        let mut best: Option<VariableData> = None;
        let mut lowest = f64::INFINITY;
        for data in self.fractional_variables() {
            let cost = self.variables.get(data.index).map_or(0.0, |v| v.cost);
            if cost < lowest {
                lowest = cost;
                best = Some(data);
            }
        }
        best
    }

    /// Basic integer variables whose value is fractional beyond `precision`.
    pub fn fractional_variables(&self) -> Vec<VariableData> {
        self.basic_integer_values()
            .filter(|v| Self::fraction(v.value) > self.precision)
            .collect()
    }
}
