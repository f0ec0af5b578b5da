//! Packed per-cell descriptors and the boundary encoder.
//!
//! The stencil needs to know, for every free cell, which of its four
//! neighbours is an insulator. Looking that up per step would cost four
//! neighbour-property reads per cell in the hot loop. Instead
//! [`encode`] runs once per run and stores the answer as direction bits
//! next to the cell's own flags:
//!
//! ```text
//! bit  5      4      3     2      1          0
//!      above  below  left  right  INSULATOR  FIXED
//! ```
//!
//! The descriptor table is immutable for the whole run.

use crate::cell::CellFlags;
use crate::error::InputError;
use crate::grid::{self, Direction, EdgePolicy};

/// Packed per-cell descriptor: own flags plus four "neighbour in this
/// direction is insulating" bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Descriptor(u32);

impl Descriptor {
    /// Mask of the four direction bits.
    pub const DIRECTION_MASK: u32 = 0b11_1100;

    /// Build a descriptor carrying only the cell's own flags.
    pub fn from_flags(flags: CellFlags) -> Self {
        Self(flags.bits())
    }

    /// Reinterpret a raw descriptor word (e.g. read back from a device).
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw descriptor word.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Descriptor bit for a direction.
    pub fn direction_bit(dir: Direction) -> u32 {
        match dir {
            Direction::Right => 1 << 2,
            Direction::Left => 1 << 3,
            Direction::Below => 1 << 4,
            Direction::Above => 1 << 5,
        }
    }

    /// The cell's own flags.
    pub fn flags(self) -> CellFlags {
        CellFlags::from_bits(self.0 & CellFlags::MASK).unwrap_or_default()
    }

    /// Whether the cell itself is fixed or insulating.
    pub fn is_frozen(self) -> bool {
        self.0 & CellFlags::MASK != 0
    }

    /// Whether the neighbour in `dir` is flagged insulating.
    pub fn is_insulated(self, dir: Direction) -> bool {
        self.0 & Self::direction_bit(dir) != 0
    }

    /// Whether any direction bit is set.
    pub fn has_direction_bits(self) -> bool {
        self.0 & Self::DIRECTION_MASK != 0
    }

    /// Return a copy with the direction bit for `dir` set.
    pub fn with_insulated(self, dir: Direction) -> Self {
        Self(self.0 | Self::direction_bit(dir))
    }
}

/// Encode raw properties into the descriptor table.
///
/// Frozen cells keep only their own flags. Free cells additionally get a
/// direction bit for every neighbour that carries the `INSULATOR` flag.
/// Only neighbours inside the grid are probed; what happens at the grid
/// edge is decided by `edge` (see [`EdgePolicy`]).
///
/// ```
/// use calor_core::{encode, CellFlags, Direction, EdgePolicy};
///
/// let f = CellFlags::FREE;
/// let i = CellFlags::INSULATOR;
/// // 2x2 grid: top-right cell is an insulator.
/// let props = [f, i, f, f];
/// let table = encode(&props, 2, EdgePolicy::Clamp).unwrap();
/// assert!(table[0].is_insulated(Direction::Right));
/// assert!(table[3].is_insulated(Direction::Above));
/// assert!(!table[2].has_direction_bits());
/// assert!(!table[1].has_direction_bits()); // frozen cells carry no bits
/// ```
pub fn encode(
    properties: &[CellFlags],
    n: usize,
    edge: EdgePolicy,
) -> Result<Vec<Descriptor>, InputError> {
    let expected = grid::cell_count(n)?;
    if properties.len() != expected {
        return Err(InputError::LengthMismatch {
            what: "properties",
            expected,
            actual: properties.len(),
        });
    }

    let mut table = Vec::with_capacity(expected);
    for y in 0..n {
        for x in 0..n {
            let flags = properties[y * n + x];
            let mut desc = Descriptor::from_flags(flags);
            if flags.is_free() {
                for dir in Direction::ALL {
                    match grid::neighbour_index(x, y, dir, n, edge) {
                        Some(ni) if properties[ni].is_insulator() => {
                            desc = desc.with_insulated(dir);
                        }
                        None if edge == EdgePolicy::Insulated => {
                            desc = desc.with_insulated(dir);
                        }
                        _ => {}
                    }
                }
            }
            table.push(desc);
        }
    }
    Ok(table)
}

/// Raw words of a descriptor table, ready for upload.
pub fn to_words(table: &[Descriptor]) -> Vec<u32> {
    table.iter().map(|d| d.bits()).collect()
}
