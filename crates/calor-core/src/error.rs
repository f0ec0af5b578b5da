//! Error types for run input validation.

use std::error::Error;
use std::fmt;

/// Errors detected while validating a run's input grid.
///
/// All of these are detected before any backend work starts; a run whose
/// input fails validation never touches device memory.
#[derive(Clone, Debug, PartialEq)]
pub enum InputError {
    /// A per-cell array does not have exactly `n * n` elements.
    LengthMismatch {
        /// Which array was malformed (`"properties"`, `"state"`, ...).
        what: &'static str,
        /// Required length (`n * n`).
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// A property word carries bits outside `FIXED | INSULATOR`.
    InvalidProperty {
        /// Flat index of the offending cell.
        index: usize,
        /// The raw property value.
        value: u32,
    },
    /// The diffusion rate is NaN or infinite.
    NonFiniteAlpha {
        /// The rejected value.
        value: f32,
    },
    /// `n * n * 4` bytes does not fit in memory addressing, or `n`
    /// exceeds `u32::MAX`.
    GridTooLarge {
        /// The requested grid dimension.
        n: usize,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has {actual} elements, expected {expected}"),
            Self::InvalidProperty { index, value } => {
                write!(f, "cell {index} has invalid property flags {value:#x}")
            }
            Self::NonFiniteAlpha { value } => {
                write!(f, "alpha must be finite, got {value}")
            }
            Self::GridTooLarge { n } => write!(f, "grid dimension {n} is too large"),
        }
    }
}

impl Error for InputError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_array() {
        let err = InputError::LengthMismatch {
            what: "state",
            expected: 9,
            actual: 8,
        };
        assert_eq!(err.to_string(), "state has 8 elements, expected 9");
    }

    #[test]
    fn display_formats_flags_as_hex() {
        let err = InputError::InvalidProperty {
            index: 4,
            value: 0x10,
        };
        assert_eq!(err.to_string(), "cell 4 has invalid property flags 0x10");
    }
}
