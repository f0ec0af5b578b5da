//! Square-grid geometry: cardinal directions, edge policy and
//! neighbour lookup for the row-major n×n layout.

use crate::error::InputError;

/// One of the four stencil directions.
///
/// The declaration order is the order in which neighbour contributions
/// are summed by the stencil, and matches the descriptor bit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `+x`.
    Right,
    /// `-x`.
    Left,
    /// `+y` (next row).
    Below,
    /// `-y` (previous row).
    Above,
}

impl Direction {
    /// All four directions in summation order.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Below,
        Direction::Above,
    ];

    /// `(dx, dy)` offset of the neighbour in this direction.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Below => (0, 1),
            Direction::Above => (0, -1),
        }
    }
}

/// How the encoder and the kernel treat neighbours beyond the grid edge.
///
/// The domain edge is not a cell, so some choice has to be made for the
/// missing neighbour of every boundary cell:
///
/// - **Clamp**: the missing neighbour resolves to the cell itself. No
///   descriptor bit is set; the cell's own value is read back, which is a
///   zero-flux edge. Out-of-grid memory is never addressed.
/// - **Insulated**: the encoder flags the missing direction as insulated.
///   Temperatures are identical to `Clamp`; only descriptors differ.
/// - **Wrap**: periodic (torus) topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgePolicy {
    /// Missing neighbours resolve to the cell itself.
    #[default]
    Clamp,
    /// Missing neighbours are flagged insulating in the descriptor.
    Insulated,
    /// Missing neighbours wrap to the opposite side.
    Wrap,
}

impl EdgePolicy {
    /// Numeric code passed to kernels as a `uint` argument.
    pub fn code(self) -> u32 {
        match self {
            EdgePolicy::Clamp => 0,
            EdgePolicy::Insulated => 1,
            EdgePolicy::Wrap => 2,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(EdgePolicy::Clamp),
            1 => Some(EdgePolicy::Insulated),
            2 => Some(EdgePolicy::Wrap),
            _ => None,
        }
    }

    /// Lower-case name, as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            EdgePolicy::Clamp => "clamp",
            EdgePolicy::Insulated => "insulated",
            EdgePolicy::Wrap => "wrap",
        }
    }
}

impl std::str::FromStr for EdgePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clamp" => Ok(EdgePolicy::Clamp),
            "insulated" => Ok(EdgePolicy::Insulated),
            "wrap" => Ok(EdgePolicy::Wrap),
            other => Err(format!(
                "unknown edge policy '{other}' (expected clamp, insulated or wrap)"
            )),
        }
    }
}

/// Number of cells in an n×n grid, checked so that the 4-byte-per-cell
/// device buffers remain addressable.
pub fn cell_count(n: usize) -> Result<usize, InputError> {
    if n > u32::MAX as usize {
        return Err(InputError::GridTooLarge { n });
    }
    n.checked_mul(n)
        .filter(|cells| cells.checked_mul(4).is_some())
        .ok_or(InputError::GridTooLarge { n })
}

/// Resolve a single axis coordinate under the given edge policy.
/// Returns `None` for an out-of-grid coordinate unless the policy wraps.
pub fn resolve_axis(val: i64, len: usize, edge: EdgePolicy) -> Option<usize> {
    let n = len as i64;
    if val >= 0 && val < n {
        return Some(val as usize);
    }
    match edge {
        EdgePolicy::Wrap if n > 0 => Some((((val % n) + n) % n) as usize),
        _ => None,
    }
}

/// Flat index of the neighbour of `(x, y)` in direction `dir`, or `None`
/// when that neighbour lies outside the grid.
pub fn neighbour_index(
    x: usize,
    y: usize,
    dir: Direction,
    n: usize,
    edge: EdgePolicy,
) -> Option<usize> {
    let (dx, dy) = dir.offset();
    let nx = resolve_axis(x as i64 + dx, n, edge)?;
    let ny = resolve_axis(y as i64 + dy, n, edge)?;
    Some(ny * n + nx)
}
