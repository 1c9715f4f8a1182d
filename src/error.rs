//! Error types for the tableau engine.
//!
//! Infeasibility, unboundedness, cycling and timeouts are *outcomes*, not
//! errors: they are reported on [`crate::Solution`]. The variants here cover
//! malformed input and operations that cannot be carried out at all.

use thiserror::Error;

/// Errors raised while building or editing a tableau.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A term, cut or update refers to an element index the tableau does not know.
    #[error("element index {0} is not part of the tableau")]
    UnknownElement(usize),

    /// Two model elements were given the same index.
    #[error("element index {0} is used by more than one variable or constraint")]
    DuplicateIndex(usize),

    /// Solver configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A modification would require pivoting on a zero column.
    #[error("update of element {0} would make the basis singular")]
    SingularUpdate(usize),
}

/// Result type for tableau operations.
pub type Result<T> = std::result::Result<T, Error>;
