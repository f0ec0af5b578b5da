//! Core types and the numerical kernel for the Calor heat simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! cell model, the grid geometry, the [`descriptor`] encoder that folds
//! neighbour insulation into a per-cell bitmask, and the [`stencil`]
//! update applied to every cell at every step.
//!
//! Nothing here knows about compute backends: the same [`stencil`] rows
//! run inside the CPU backend's workers and inside the serial
//! [`reference`] simulator, which keeps the two bit-identical.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod descriptor;
pub mod error;
pub mod grid;
pub mod input;
pub mod reference;
pub mod stencil;

pub use cell::CellFlags;
pub use descriptor::{encode, Descriptor};
pub use error::InputError;
pub use grid::{Direction, EdgePolicy};
pub use input::{HeatWorldInput, HeatWorldOutput};
pub use stencil::Coefficients;
