//! Benchmark profiles for the Calor heat simulator.
//!
//! - [`reference_profile`]: 128x128 grid (16K cells), generated materials
//! - [`stress_profile`]: 512x512 grid (~262K cells) for scaling runs
//! - [`config`]: a host config for a fixed step count and device

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use calor_core::HeatWorldInput;
use calor_engine::{puzzle, HostConfig};

/// Build the reference profile: 128x128 grid with alpha 0.1.
pub fn reference_profile(seed: u64) -> HeatWorldInput {
    puzzle::generate(128, seed)
}

/// Build the stress profile: 512x512 grid with alpha 0.1.
pub fn stress_profile(seed: u64) -> HeatWorldInput {
    puzzle::generate(512, seed)
}

/// Host config running `steps` steps on `device` with `workers` threads.
pub fn config(device: usize, workers: usize, steps: usize) -> HostConfig {
    HostConfig {
        device,
        workers: Some(workers),
        steps: Some(steps),
        ..Default::default()
    }
}
