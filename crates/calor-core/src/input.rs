//! Run input and output records.

use crate::cell::CellFlags;
use crate::error::InputError;
use crate::grid;
use crate::stencil::Coefficients;

/// Everything one simulation run needs: the grid, its materials and its
/// initial temperatures.
///
/// `properties` and `state` are row-major, index `y * n + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatWorldInput {
    /// Grid dimension; the grid is `n` × `n`.
    pub n: usize,
    /// Diffusion rate.
    pub alpha: f32,
    /// Per-cell material flags.
    pub properties: Vec<CellFlags>,
    /// Initial temperature of every cell.
    pub state: Vec<f32>,
}

/// The final temperature field of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeatWorldOutput {
    /// Temperature of every cell after the last step.
    pub state: Vec<f32>,
}

impl HeatWorldInput {
    /// Build an input from raw property words, rejecting unknown bits.
    ///
    /// ```
    /// use calor_core::{CellFlags, HeatWorldInput};
    ///
    /// let input = HeatWorldInput::from_raw(2, 0.1, &[0, 1, 2, 3], vec![0.0; 4]).unwrap();
    /// assert_eq!(input.properties[1], CellFlags::FIXED);
    /// assert!(HeatWorldInput::from_raw(2, 0.1, &[0, 0, 0, 8], vec![0.0; 4]).is_err());
    /// ```
    pub fn from_raw(
        n: usize,
        alpha: f32,
        properties: &[u32],
        state: Vec<f32>,
    ) -> Result<Self, InputError> {
        let properties = properties
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                CellFlags::from_bits(value).ok_or(InputError::InvalidProperty { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let input = Self {
            n,
            alpha,
            properties,
            state,
        };
        input.validate()?;
        Ok(input)
    }

    /// Check array lengths, grid size and the diffusion rate.
    ///
    /// Alpha outside `[0, 4]` is accepted; callers that care about
    /// stability check [`Coefficients::is_stable`].
    pub fn validate(&self) -> Result<(), InputError> {
        let expected = grid::cell_count(self.n)?;
        if self.properties.len() != expected {
            return Err(InputError::LengthMismatch {
                what: "properties",
                expected,
                actual: self.properties.len(),
            });
        }
        if self.state.len() != expected {
            return Err(InputError::LengthMismatch {
                what: "state",
                expected,
                actual: self.state.len(),
            });
        }
        if !self.alpha.is_finite() {
            return Err(InputError::NonFiniteAlpha { value: self.alpha });
        }
        Ok(())
    }

    /// Number of cells, `n * n`.
    pub fn cell_count(&self) -> usize {
        self.n * self.n
    }

    /// Stencil weights for this input's diffusion rate.
    pub fn coefficients(&self) -> Coefficients {
        Coefficients::new(self.alpha)
    }

    /// Raw property words, as uploaded to a device.
    pub fn property_words(&self) -> Vec<u32> {
        self.properties.iter().map(|p| p.bits()).collect()
    }
}
