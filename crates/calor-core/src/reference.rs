//! Serial host reference simulator.
//!
//! Two host buffers swapped after every step. No backend, no threads.
//! Every backend run must match this bit for bit.

use crate::descriptor::{self, Descriptor};
use crate::error::InputError;
use crate::grid::EdgePolicy;
use crate::input::{HeatWorldInput, HeatWorldOutput};
use crate::stencil;

/// Run `steps` diffusion steps over `input` on the calling thread.
///
/// ```
/// use calor_core::{reference, CellFlags, EdgePolicy, HeatWorldInput};
///
/// let input = HeatWorldInput {
///     n: 2,
///     alpha: 1.0,
///     properties: vec![CellFlags::FIXED, CellFlags::FREE, CellFlags::FREE, CellFlags::FREE],
///     state: vec![1.0, 0.0, 0.0, 0.0],
/// };
/// let out = reference::simulate(&input, 0, EdgePolicy::Clamp).unwrap();
/// assert_eq!(out.state, input.state);
/// ```
pub fn simulate(
    input: &HeatWorldInput,
    steps: usize,
    edge: EdgePolicy,
) -> Result<HeatWorldOutput, InputError> {
    input.validate()?;
    let table = descriptor::encode(&input.properties, input.n, edge)?;
    Ok(simulate_encoded(input, &table, steps, edge))
}

/// Like [`simulate`], with an already-encoded descriptor table.
pub fn simulate_encoded(
    input: &HeatWorldInput,
    table: &[Descriptor],
    steps: usize,
    edge: EdgePolicy,
) -> HeatWorldOutput {
    let n = input.n;
    let words = descriptor::to_words(table);
    let c = input.coefficients();
    let mut state = input.state.clone();
    if n == 0 {
        return HeatWorldOutput { state };
    }
    let mut next = vec![0.0f32; state.len()];
    for _ in 0..steps {
        stencil::step(&state, &words, n, edge, c, &mut next);
        std::mem::swap(&mut state, &mut next);
    }
    HeatWorldOutput { state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellFlags;

    fn hot_centre(n: usize, alpha: f32) -> HeatWorldInput {
        let mut properties = vec![CellFlags::FREE; n * n];
        let mut state = vec![0.0; n * n];
        let c = (n / 2) * n + n / 2;
        properties[c] = CellFlags::FIXED;
        state[c] = 100.0;
        HeatWorldInput {
            n,
            alpha,
            properties,
            state,
        }
    }

    #[test]
    fn zero_steps_is_identity() {
        let input = hot_centre(5, 1.0);
        let out = simulate(&input, 0, EdgePolicy::Clamp).unwrap();
        assert_eq!(out.state, input.state);
    }

    #[test]
    fn empty_grid_yields_empty_output() {
        let input = HeatWorldInput {
            n: 0,
            alpha: 0.3,
            properties: Vec::new(),
            state: Vec::new(),
        };
        let out = simulate(&input, 10, EdgePolicy::Clamp).unwrap();
        assert!(out.state.is_empty());
    }

    #[test]
    fn heat_reaches_the_corners_in_n_steps() {
        let input = hot_centre(7, 1.0);
        let out = simulate(&input, 7, EdgePolicy::Clamp).unwrap();
        assert_eq!(out.state[3 * 7 + 3], 100.0);
        assert!(out.state.iter().all(|&v| v.is_finite() && v >= 0.0));
        assert!(out.state[0] > 0.0);
    }

    #[test]
    fn long_run_at_zero_rate_is_unchanged() {
        let mut input = hot_centre(7, 0.0);
        input.state[0] = 42.0;
        let out = simulate(&input, 200, EdgePolicy::Wrap).unwrap();
        assert_eq!(out.state, input.state);
    }

    #[test]
    fn clamp_and_insulated_edges_agree() {
        let input = hot_centre(6, 0.8);
        let a = simulate(&input, 12, EdgePolicy::Clamp).unwrap();
        let b = simulate(&input, 12, EdgePolicy::Insulated).unwrap();
        let bits = |s: &[f32]| s.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.state), bits(&b.state));
    }

    #[test]
    fn insulator_wall_blocks_heat() {
        // Column x = 2 is an insulator wall; the centre source sits on the left.
        let n = 5;
        let mut properties = vec![CellFlags::FREE; n * n];
        let mut state = vec![0.0; n * n];
        for y in 0..n {
            properties[y * n + 2] = CellFlags::INSULATOR;
        }
        properties[2 * n] = CellFlags::FIXED;
        state[2 * n] = 1.0;
        let input = HeatWorldInput {
            n,
            alpha: 1.0,
            properties,
            state,
        };
        let out = simulate(&input, 50, EdgePolicy::Clamp).unwrap();
        for y in 0..n {
            for x in 3..n {
                assert_eq!(out.state[y * n + x], 0.0);
            }
        }
        assert!(out.state[2 * n + 1] > 0.0);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut input = hot_centre(3, 1.0);
        input.state.truncate(2);
        assert!(simulate(&input, 1, EdgePolicy::Clamp).is_err());
    }
}
