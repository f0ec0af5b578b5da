//! Per-cell material flags.

use std::fmt;

/// Material flags for one grid cell.
///
/// A cell with no flags is *free* and takes part in diffusion. Both
/// `FIXED` and `INSULATOR` cells are *frozen*: their temperature never
/// changes. An insulator additionally blocks heat flow into neighbouring
/// free cells from its side. The two flags may be combined; such a cell is
/// frozen and insulating.
///
/// The raw `u32` layout is part of the wire format: it is what callers
/// supply in `HeatWorldInput::properties` and what occupies the low bits
/// of every [`Descriptor`](crate::Descriptor).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellFlags(u32);

impl CellFlags {
    /// A free, conductive cell.
    pub const FREE: Self = Self(0);
    /// A fixed-temperature cell (source or sink).
    pub const FIXED: Self = Self(0x1);
    /// An insulating cell.
    pub const INSULATOR: Self = Self(0x2);

    /// Mask of every bit a property word may carry.
    pub const MASK: u32 = Self::FIXED.0 | Self::INSULATOR.0;

    /// Parse a raw property word, rejecting unknown bits.
    ///
    /// ```
    /// use calor_core::CellFlags;
    ///
    /// assert_eq!(CellFlags::from_bits(2), Some(CellFlags::INSULATOR));
    /// assert!(CellFlags::from_bits(3).unwrap().is_frozen());
    /// assert_eq!(CellFlags::from_bits(4), None);
    /// ```
    pub fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::MASK == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// The raw property word.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether the `FIXED` flag is set.
    pub fn is_fixed(self) -> bool {
        self.0 & Self::FIXED.0 != 0
    }

    /// Whether the `INSULATOR` flag is set.
    pub fn is_insulator(self) -> bool {
        self.0 & Self::INSULATOR.0 != 0
    }

    /// Whether the cell keeps its temperature forever.
    pub fn is_frozen(self) -> bool {
        self.0 & Self::MASK != 0
    }

    /// Whether the cell is free (no flags).
    pub fn is_free(self) -> bool {
        !self.is_frozen()
    }
}

impl std::ops::BitOr for CellFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Single-digit rendering used by the verbose property dump.
impl fmt::Display for CellFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
