//! Standard input grids.
//!
//! - [`uniform`]: every cell free at one temperature.
//! - [`hot_centre`]: one fixed hot cell in the middle of a cold grid.
//! - [`insulator_wall`]: a vertical insulating column splitting the grid.
//! - [`arb_input`]: proptest strategy over small random grids.

use calor_core::{CellFlags, HeatWorldInput};
use proptest::prelude::*;

pub fn uniform(n: usize, value: f32, alpha: f32) -> HeatWorldInput {
    HeatWorldInput {
        n,
        alpha,
        properties: vec![CellFlags::FREE; n * n],
        state: vec![value; n * n],
    }
}

/// The centre cell (`n / 2`, `n / 2`) is fixed at `temp`; all others are
/// free at zero.
pub fn hot_centre(n: usize, temp: f32, alpha: f32) -> HeatWorldInput {
    let mut input = uniform(n, 0.0, alpha);
    if n > 0 {
        let c = (n / 2) * n + n / 2;
        input.properties[c] = CellFlags::FIXED;
        input.state[c] = temp;
    }
    input
}

/// Column `n / 2` is insulating. Cells left of it start at `left`, cells
/// right of it at `right`.
pub fn insulator_wall(n: usize, left: f32, right: f32, alpha: f32) -> HeatWorldInput {
    let mut input = uniform(n, 0.0, alpha);
    let wall = n / 2;
    for y in 0..n {
        for x in 0..n {
            let i = y * n + x;
            if x == wall {
                input.properties[i] = CellFlags::INSULATOR;
            } else {
                input.state[i] = if x < wall { left } else { right };
            }
        }
    }
    input
}

pub fn arb_flags() -> impl Strategy<Value = CellFlags> {
    prop_oneof![
        6 => Just(CellFlags::FREE),
        1 => Just(CellFlags::FIXED),
        1 => Just(CellFlags::INSULATOR),
    ]
}

/// Grids with `n` in `1..=max_n`, mixed materials, temperatures in
/// `[0, 100]` and a stable alpha.
pub fn arb_input(max_n: usize) -> impl Strategy<Value = HeatWorldInput> {
    (1..=max_n).prop_flat_map(|n| {
        (
            prop::collection::vec(arb_flags(), n * n),
            prop::collection::vec(0.0f32..=100.0, n * n),
            0.01f32..=4.0,
        )
            .prop_map(move |(properties, state, alpha)| HeatWorldInput {
                n,
                alpha,
                properties,
                state,
            })
    })
}
