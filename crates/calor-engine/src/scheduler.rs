//! Double-buffered step loop.
//!
//! [`StepScheduler`] owns the roles of the two state buffers. Each step
//! reads "current", writes "next", waits on a barrier, then swaps roles:
//!
//! ```text
//! step:     0        1        2     ...
//! reads:    A        B        A
//! writes:   B        A        B
//! ```
//!
//! After `k` steps the result lives in A when `k` is even and in B when
//! it is odd. The backend rejects a launch that binds its output as an
//! input, so a step never observes its own writes.

use calor_backend::{BackendError, BufferId, ComputeBackend, KernelArg, ProgramId};
use calor_core::{Coefficients, EdgePolicy};

use crate::kernel::ENTRY_POINT;

/// The run-constant part of every step launch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepLaunch {
    /// Compiled program holding `heat_step`.
    pub program: ProgramId,
    /// Grid dimension; the index space is `[n, n]`.
    pub n: usize,
    /// Diffusion weights.
    pub coefficients: Coefficients,
    /// Edge policy passed to the kernel.
    pub edge: EdgePolicy,
    /// Read-only descriptor buffer.
    pub descriptors: BufferId,
}

impl StepLaunch {
    fn args(&self, current: BufferId, next: BufferId) -> [KernelArg; 6] {
        [
            KernelArg::Float(self.coefficients.inner),
            KernelArg::Float(self.coefficients.outer),
            KernelArg::Uint(self.edge.code()),
            KernelArg::Buffer(self.descriptors),
            KernelArg::Buffer(current),
            KernelArg::Buffer(next),
        ]
    }
}

/// Alternates two state buffers across steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepScheduler {
    buffers: [BufferId; 2],
    /// Which buffer holds the current state (false = A, true = B).
    b_is_current: bool,
    steps_run: usize,
}

impl StepScheduler {
    /// Start with `a` holding the initial state and `b` as scratch.
    pub fn new(a: BufferId, b: BufferId) -> Self {
        Self {
            buffers: [a, b],
            b_is_current: false,
            steps_run: 0,
        }
    }

    /// Buffer holding the latest completed state.
    pub fn current(&self) -> BufferId {
        self.buffers[self.b_is_current as usize]
    }

    /// Buffer the next step writes.
    pub fn next(&self) -> BufferId {
        self.buffers[!self.b_is_current as usize]
    }

    /// Steps completed so far.
    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    /// Exchange the roles of the two buffers.
    pub fn swap(&mut self) {
        self.b_is_current = !self.b_is_current;
    }

    /// Run `steps` launches, each followed by a barrier and a swap.
    ///
    /// On error the roles are left as they were after the last completed
    /// step; callers discard the run.
    pub fn run<B: ComputeBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        launch: &StepLaunch,
        steps: usize,
    ) -> Result<(), BackendError> {
        let global = [launch.n, launch.n];
        for t in 0..steps {
            let args = launch.args(self.current(), self.next());
            backend.launch(launch.program, ENTRY_POINT, global, &args)?;
            backend.barrier()?;
            self.swap();
            self.steps_run += 1;
            tracing::trace!(step = t, current = %self.current(), "step complete");
        }
        Ok(())
    }
}
