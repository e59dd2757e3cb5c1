//! Grid construction errors (setup-time, always fatal).

use std::error::Error;
use std::fmt;

use strata_exec::BlockRange;

/// Errors from level decomposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// The domain has a zero extent on some axis.
    EmptyDomain {
        /// The offending domain box.
        domain: BlockRange,
    },
    /// A division count is zero or exceeds the axis extent.
    InvalidDivisions {
        /// Axis index (0 = x, 1 = y, 2 = z).
        axis: usize,
        /// Cells along the axis.
        extent: i32,
        /// Requested patch count along the axis.
        divisions: u32,
    },
    /// Extra-cell or ghost widths must be non-negative.
    NegativeWidth {
        /// The parameter name (`extra_cells` or `max_ghost`).
        what: &'static str,
        /// The rejected value.
        value: i32,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomain { domain } => {
                write!(f, "domain {domain} has a zero extent")
            }
            Self::InvalidDivisions {
                axis,
                extent,
                divisions,
            } => write!(
                f,
                "axis {axis}: cannot split {extent} cells into {divisions} patches"
            ),
            Self::NegativeWidth { what, value } => {
                write!(f, "{what} must be non-negative, got {value}")
            }
        }
    }
}

impl Error for GridError {}
