//! The explicit 5-point diffusion stencil.
//!
//! Each step computes, for every free cell:
//! ```text
//! next = inner * own + quarter * (v_right + v_left + v_below + v_above)
//! ```
//! where `quarter = outer / 4` is the weight of each neighbour,
//! `inner = 1 - quarter` is the weight of the cell itself, and each `v_dir` is
//! the neighbour's previous temperature, or the cell's own previous
//! temperature when the descriptor marks that neighbour as insulating.
//! Reflecting the cell's own value realises a zero-flux wall instead of
//! reading through the insulator. Frozen cells copy their value.
//!
//! The weights of a free cell total `inner + outer = 1 + 3 * outer / 4`,
//! so for `outer > 0` the update amplifies as well as spreads. Only
//! `outer = 0` leaves a field unchanged.
//!
//! All arithmetic is `f32` with no clamping. The summation order is fixed
//! so that every executor of this module produces bit-identical output.

use crate::descriptor::Descriptor;
use crate::grid::{Direction, EdgePolicy};

/// Run-constant diffusion weights derived from the configured rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    /// Diffusion rate (`alpha`).
    pub outer: f32,
    /// Per-neighbour weight, `outer / 4`.
    pub quarter: f32,
    /// Self weight, `1 - outer / 4`.
    pub inner: f32,
}

impl Coefficients {
    /// Derive the stencil weights from the diffusion rate.
    ///
    /// ```
    /// use calor_core::Coefficients;
    ///
    /// let c = Coefficients::new(1.0);
    /// assert_eq!(c.quarter, 0.25);
    /// assert_eq!(c.inner, 0.75);
    /// assert_eq!(c.inner + 4.0 * c.quarter, 1.75);
    /// ```
    pub fn new(alpha: f32) -> Self {
        let quarter = alpha / 4.0;
        Self {
            outer: alpha,
            quarter,
            inner: 1.0 - quarter,
        }
    }

    /// Whether all weights are non-negative, i.e. `outer` in `[0, 4]`.
    /// Outside that range a non-negative field can turn negative.
    pub fn is_stable(&self) -> bool {
        self.outer >= 0.0 && self.outer <= 4.0
    }
}

/// Update a single cell.
///
/// `neighbours` are the previous-step temperatures in
/// [`Direction::ALL`] order (right, left, below, above).
#[inline]
pub fn update_cell(own: f32, desc: Descriptor, neighbours: [f32; 4], c: Coefficients) -> f32 {
    if desc.is_frozen() {
        return own;
    }
    let [right, left, below, above] = neighbours;
    let pick = |dir: Direction, v: f32| if desc.is_insulated(dir) { own } else { v };
    let v_right = pick(Direction::Right, right);
    let v_left = pick(Direction::Left, left);
    let v_below = pick(Direction::Below, below);
    let v_above = pick(Direction::Above, above);
    c.inner * own + c.quarter * (v_right + v_left + v_below + v_above)
}

/// Compute row `y` of the next state into `out` (length `n`).
///
/// `prev` and `descriptors` hold the full previous grid (`n * n` each).
/// Neighbours beyond the grid edge resolve to the cell itself unless
/// `edge` wraps; no index outside `0..n*n` is ever formed.
pub fn step_row(
    prev: &[f32],
    descriptors: &[u32],
    n: usize,
    y: usize,
    edge: EdgePolicy,
    c: Coefficients,
    out: &mut [f32],
) {
    debug_assert_eq!(prev.len(), n * n);
    debug_assert_eq!(descriptors.len(), n * n);
    debug_assert_eq!(out.len(), n);
    let wrap = edge == EdgePolicy::Wrap;
    let row = y * n;
    for (x, slot) in out.iter_mut().enumerate() {
        let i = row + x;
        let right = if x + 1 < n {
            i + 1
        } else if wrap {
            row
        } else {
            i
        };
        let left = if x > 0 {
            i - 1
        } else if wrap {
            row + n - 1
        } else {
            i
        };
        let below = if y + 1 < n {
            i + n
        } else if wrap {
            x
        } else {
            i
        };
        let above = if y > 0 {
            i - n
        } else if wrap {
            (n - 1) * n + x
        } else {
            i
        };
        *slot = update_cell(
            prev[i],
            Descriptor::from_bits(descriptors[i]),
            [prev[right], prev[left], prev[below], prev[above]],
            c,
        );
    }
}

/// Compute a whole step: `next[i] = update(prev, i)` for every cell.
pub fn step(
    prev: &[f32],
    descriptors: &[u32],
    n: usize,
    edge: EdgePolicy,
    c: Coefficients,
    next: &mut [f32],
) {
    if n == 0 {
        return;
    }
    for (y, out) in next.chunks_mut(n).enumerate() {
        step_row(prev, descriptors, n, y, edge, c, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellFlags;
    use crate::descriptor::{encode, to_words};
    use proptest::prelude::*;

    fn free() -> Descriptor {
        Descriptor::default()
    }

    #[test]
    fn frozen_cells_return_own_value_exactly() {
        let c = Coefficients::new(1.0);
        let own = 0.123_456_79_f32;
        for flags in [
            CellFlags::FIXED,
            CellFlags::INSULATOR,
            CellFlags::FIXED | CellFlags::INSULATOR,
        ] {
            let out = update_cell(own, Descriptor::from_flags(flags), [9.0; 4], c);
            assert_eq!(out.to_bits(), own.to_bits());
        }
    }

    #[test]
    fn stray_direction_bits_on_frozen_cell_are_ignored() {
        let c = Coefficients::new(1.0);
        let desc = Descriptor::from_flags(CellFlags::FIXED).with_insulated(Direction::Left);
        assert_eq!(update_cell(5.0, desc, [1.0; 4], c), 5.0);
    }

    #[test]
    fn unobstructed_cell_weights_each_neighbour_by_quarter() {
        let c = Coefficients::new(1.0);
        let out = update_cell(4.0, free(), [8.0, 0.0, 0.0, 0.0], c);
        assert_eq!(out, 0.75 * 4.0 + 0.25 * 8.0);
    }

    #[test]
    fn insulated_neighbour_reflects_own_value() {
        // inner 0.9 * 2 + quarter 0.1 * (2 + 10 + 10 + 10)
        let c = Coefficients::new(0.4);
        let a = 10.0f32;
        let b = 2.0f32;
        let desc = free().with_insulated(Direction::Right);
        let out = update_cell(b, desc, [1000.0, a, a, a], c);
        assert_eq!(out, c.inner * b + c.quarter * (b + a + a + a));
        assert!((out - 5.0).abs() < 1e-5, "{out}");
    }

    #[test]
    fn fully_insulated_free_cell_sees_only_itself() {
        let c = Coefficients::new(1.0);
        let desc = Direction::ALL
            .iter()
            .fold(free(), |d, &dir| d.with_insulated(dir));
        assert_eq!(update_cell(4.0, desc, [100.0; 4], c), 0.75 * 4.0 + 0.25 * 16.0);
    }

    #[test]
    fn zero_rate_leaves_free_cells_unchanged() {
        let c = Coefficients::new(0.0);
        assert_eq!(update_cell(3.5, free(), [100.0, -7.0, 1.0, 0.0], c), 3.5);
    }

    fn hot_centre_3x3(steps: usize) -> Vec<f32> {
        let n = 3;
        let mut props = vec![CellFlags::FREE; 9];
        props[4] = CellFlags::FIXED;
        let mut prev = vec![0.0f32; 9];
        prev[4] = 100.0;
        let desc = to_words(&encode(&props, n, EdgePolicy::Clamp).unwrap());
        let mut next = vec![0.0f32; 9];
        for _ in 0..steps {
            step(&prev, &desc, n, EdgePolicy::Clamp, Coefficients::new(1.0), &mut next);
            std::mem::swap(&mut prev, &mut next);
        }
        prev
    }

    #[test]
    fn three_by_three_fixed_centre_after_one_step() {
        let next = hot_centre_3x3(1);
        assert_eq!(next[4], 100.0);
        // One hot neighbour weighted by outer / 4.
        for i in [1, 3, 5, 7] {
            assert_eq!(next[i], 25.0, "edge midpoint {i}");
        }
        for i in [0, 2, 6, 8] {
            assert_eq!(next[i], 0.0, "corner {i}");
        }
    }

    #[test]
    fn three_by_three_fixed_centre_after_three_steps() {
        let next = hot_centre_3x3(3);
        assert_eq!(next[4], 100.0);
        for i in [1, 3, 5, 7] {
            assert_eq!(next[i], 81.25, "edge midpoint {i}");
        }
        for i in [0, 2, 6, 8] {
            assert_eq!(next[i], 40.625, "corner {i}");
        }
        assert!(next.iter().all(|&t| (0.0..=100.0).contains(&t)));
    }

    #[test]
    fn clamped_edge_reads_own_value() {
        // 1x1 free cell: every neighbour resolves to itself.
        let c = Coefficients::new(0.3);
        let mut next = [0.0f32];
        step(&[7.0], &[0], 1, EdgePolicy::Clamp, c, &mut next);
        assert_eq!(next[0], c.inner * 7.0 + c.quarter * (7.0 + 7.0 + 7.0 + 7.0));
    }

    #[test]
    fn wrap_reads_opposite_side() {
        // 3x1 ring along x is not expressible; use 3x3 with a hot left column.
        let n = 3;
        let mut prev = vec![0.0f32; 9];
        for y in 0..n {
            prev[y * n] = 8.0;
        }
        let desc = vec![0u32; 9];
        let c = Coefficients::new(1.0);
        let mut next = vec![0.0f32; 9];
        step(&prev, &desc, n, EdgePolicy::Wrap, c, &mut next);
        // (2,1) has its right neighbour wrapped to (0,1) = 8.
        assert_eq!(next[5], 0.25 * 8.0);
        let mut clamped = vec![0.0f32; 9];
        step(&prev, &desc, n, EdgePolicy::Clamp, c, &mut clamped);
        assert_eq!(clamped[5], 0.0);
    }

    #[test]
    fn empty_grid_step_is_noop() {
        let mut next: [f32; 0] = [];
        step(&[], &[], 0, EdgePolicy::Clamp, Coefficients::new(1.0), &mut next);
    }

    proptest! {
        #[test]
        fn uniform_field_scales_by_total_weight(
            v in -1000.0f32..1000.0,
            alpha in 0.0f32..=4.0,
        ) {
            let c = Coefficients::new(alpha);
            let out = update_cell(v, free(), [v; 4], c);
            let expected = v * (1.0 + 0.75 * alpha);
            prop_assert!(
                (out - expected).abs() <= expected.abs() * 8.0 * f32::EPSILON + f32::EPSILON,
                "{out} vs {expected}"
            );
        }

        #[test]
        fn zero_rate_is_exact_identity(
            own in -1000.0f32..1000.0,
            nbs in prop::array::uniform4(-1000.0f32..1000.0),
        ) {
            let out = update_cell(own, free(), nbs, Coefficients::new(0.0));
            prop_assert_eq!(out.to_bits(), own.to_bits());
        }

        #[test]
        fn output_is_bounded_by_weighted_extremes(
            own in 0.0f32..1.0,
            nbs in prop::array::uniform4(0.0f32..1.0),
            alpha in 0.0f32..=4.0,
        ) {
            // Non-negative weights keep a non-negative field non-negative and
            // scale its maximum by at most `inner + outer`.
            let c = Coefficients::new(alpha);
            let out = update_cell(own, free(), nbs, c);
            let lo = nbs.iter().copied().fold(own, f32::min);
            let hi = nbs.iter().copied().fold(own, f32::max);
            let total = c.inner + 4.0 * c.quarter;
            prop_assert!(out >= lo * total - 1e-5, "{out} below {lo} * {total}");
            prop_assert!(out <= hi * total + 1e-5, "{out} above {hi} * {total}");
        }
    }
}
