//! The host side of a run: discovery, compilation, buffers, stepping and
//! read-back over any [`BackendProvider`].

use std::time::Instant;

use calor_backend::cpu::CpuProvider;
use calor_backend::{
    AccessMode, BackendError, BackendExt, BackendProvider, ComputeBackend, DeviceInfo,
    PlatformInfo,
};
use calor_core::{descriptor, HeatWorldInput, HeatWorldOutput};

use crate::config::HostConfig;
use crate::error::RunError;
use crate::kernel;
use crate::metrics::RunMetrics;
use crate::report;
use crate::scheduler::{StepLaunch, StepScheduler};

/// Runs heat simulations with one fixed [`HostConfig`].
#[derive(Clone, Debug, Default)]
pub struct HeatWorld {
    config: HostConfig,
}

impl HeatWorld {
    /// Create an orchestrator. The config is validated on every run.
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    /// The configuration runs use.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// A CPU provider sized by the configured worker count.
    pub fn cpu_provider(&self) -> CpuProvider {
        kernel::cpu_provider(Some(self.config.resolved_workers()))
    }

    /// Run the simulation and return the final temperatures.
    ///
    /// The run is atomic: on any error no output is produced.
    pub fn execute<P: BackendProvider>(
        &self,
        provider: &P,
        input: &HeatWorldInput,
    ) -> Result<HeatWorldOutput, RunError> {
        self.execute_with_metrics(provider, input)
            .map(|(output, _)| output)
    }

    /// Like [`execute`](Self::execute), also returning per-phase metrics.
    pub fn execute_with_metrics<P: BackendProvider>(
        &self,
        provider: &P,
        input: &HeatWorldInput,
    ) -> Result<(HeatWorldOutput, RunMetrics), RunError> {
        let started = Instant::now();
        let mut metrics = RunMetrics::default();

        // ── Input ──
        self.config.validate()?;
        input.validate()?;
        let n = input.n;
        let steps = self.config.steps_for(n);
        let coefficients = input.coefficients();
        if input.alpha <= 0.0 || input.alpha > 4.0 {
            tracing::warn!(
                alpha = input.alpha,
                "alpha outside (0, 4]; the explicit scheme is unstable or inert"
            );
        }
        if n == 0 {
            tracing::debug!("empty grid, nothing to run");
            return Ok((HeatWorldOutput { state: Vec::new() }, metrics));
        }

        // ── Discovery ──
        let phase = Instant::now();
        let (platform, device) =
            select_device(provider, self.config.platform, self.config.device)
                .map_err(RunError::Discovery)?;
        tracing::info!(platform = %platform.name, device = %device.name, "selected device");
        let mut backend = provider
            .open(self.config.platform, self.config.device)
            .map_err(RunError::Discovery)?;
        metrics.discovery_us = phase.elapsed().as_micros() as u64;

        // ── Compilation ──
        let phase = Instant::now();
        let source = kernel::load_source(self.config.kernel_dir.as_deref())?;
        let program = match backend.compile(&source) {
            Ok(program) => program,
            Err(e) => {
                for log in e.compile_logs() {
                    tracing::error!(device = %log.device, "kernel build failed:\n{}", log.text());
                }
                return Err(RunError::Compile(e));
            }
        };
        metrics.compile_us = phase.elapsed().as_micros() as u64;

        // ── Setup ──
        let phase = Instant::now();
        report::dump_properties(&input.properties, n);
        let table = descriptor::encode(&input.properties, n, self.config.edge)?;
        let words = descriptor::to_words(&table);
        let bytes = input.cell_count() * 4;
        let exec = RunError::Execution;
        let descriptors = backend
            .allocate(bytes, AccessMode::ReadOnly)
            .map_err(exec)?;
        let state_a = backend
            .allocate(bytes, AccessMode::ReadWrite)
            .map_err(exec)?;
        let state_b = backend
            .allocate(bytes, AccessMode::ReadWrite)
            .map_err(exec)?;
        backend.write_slice(descriptors, &words).map_err(exec)?;
        backend.write_slice(state_a, &input.state).map_err(exec)?;
        metrics.setup_us = phase.elapsed().as_micros() as u64;

        // ── Steps ──
        let phase = Instant::now();
        let launch = StepLaunch {
            program,
            n,
            coefficients,
            edge: self.config.edge,
            descriptors,
        };
        let mut scheduler = StepScheduler::new(state_a, state_b);
        scheduler.run(&mut backend, &launch, steps).map_err(exec)?;
        metrics.steps_us = phase.elapsed().as_micros() as u64;
        metrics.steps = scheduler.steps_run();

        // ── Read-back ──
        let phase = Instant::now();
        let state: Vec<f32> = backend
            .read_vec(scheduler.current(), input.cell_count())
            .map_err(exec)?;
        metrics.readback_us = phase.elapsed().as_micros() as u64;
        report::dump_state("final state", &state, n);

        let stats = backend.stats();
        metrics.bands = stats.bands;
        metrics.bytes_written = stats.bytes_written;
        metrics.bytes_read = stats.bytes_read;
        metrics.total_us = started.elapsed().as_micros() as u64;
        tracing::debug!(
            steps = metrics.steps,
            total_us = metrics.total_us,
            "run complete"
        );
        Ok((HeatWorldOutput { state }, metrics))
    }
}

/// Discover platforms and devices, log them, and pick the requested pair.
pub fn select_device<P: BackendProvider + ?Sized>(
    provider: &P,
    platform: usize,
    device: usize,
) -> Result<(PlatformInfo, DeviceInfo), BackendError> {
    let platforms = provider.platforms();
    if platforms.is_empty() {
        return Err(BackendError::NoPlatforms);
    }
    for (i, p) in platforms.iter().enumerate() {
        tracing::info!(index = i, name = %p.name, vendor = %p.vendor, version = %p.version, "platform");
    }
    let count = platforms.len();
    let chosen = platforms
        .into_iter()
        .nth(platform)
        .ok_or(BackendError::PlatformOutOfRange {
            index: platform,
            count,
        })?;

    let devices = provider.devices(platform)?;
    if devices.is_empty() {
        return Err(BackendError::NoDevices {
            platform: chosen.name,
        });
    }
    for (i, d) in devices.iter().enumerate() {
        tracing::info!(index = i, name = %d.name, compute_units = d.compute_units, "device");
    }
    let count = devices.len();
    let picked = devices
        .into_iter()
        .nth(device)
        .ok_or(BackendError::DeviceOutOfRange {
            index: device,
            count,
        })?;
    Ok((chosen, picked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calor_core::{reference, CellFlags, EdgePolicy};

    fn hot_centre() -> HeatWorldInput {
        let mut properties = vec![CellFlags::FREE; 9];
        properties[4] = CellFlags::FIXED;
        let mut state = vec![0.0; 9];
        state[4] = 100.0;
        HeatWorldInput {
            n: 3,
            alpha: 1.0,
            properties,
            state,
        }
    }

    #[test]
    fn one_step_scenario() {
        let world = HeatWorld::new(HostConfig {
            steps: Some(1),
            workers: Some(2),
            ..Default::default()
        });
        let out = world.execute(&world.cpu_provider(), &hot_centre()).unwrap();
        assert_eq!(
            out.state,
            vec![0.0, 25.0, 0.0, 25.0, 100.0, 25.0, 0.0, 25.0, 0.0]
        );
    }

    #[test]
    fn default_steps_match_reference() {
        let world = HeatWorld::default();
        let input = hot_centre();
        let out = world.execute(&world.cpu_provider(), &input).unwrap();
        let expected = reference::simulate(&input, 3, EdgePolicy::Clamp).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn metrics_count_steps_and_bytes() {
        let world = HeatWorld::new(HostConfig {
            steps: Some(5),
            ..Default::default()
        });
        let (_, m) = world
            .execute_with_metrics(&world.cpu_provider(), &hot_centre())
            .unwrap();
        assert_eq!(m.steps, 5);
        // descriptors + initial state
        assert_eq!(m.bytes_written, 2 * 9 * 4);
        assert_eq!(m.bytes_read, 9 * 4);
        assert!(m.bands >= 5);
    }

    #[test]
    fn empty_grid_skips_the_backend() {
        let world = HeatWorld::new(HostConfig {
            platform: 99,
            ..Default::default()
        });
        let input = HeatWorldInput {
            n: 0,
            alpha: 0.5,
            properties: Vec::new(),
            state: Vec::new(),
        };
        let (out, m) = world
            .execute_with_metrics(&world.cpu_provider(), &input)
            .unwrap();
        assert!(out.state.is_empty());
        assert_eq!(m, RunMetrics::default());
    }

    #[test]
    fn out_of_range_selection_is_discovery_error() {
        let p = kernel::cpu_provider(Some(1));
        assert_eq!(
            select_device(&p, 1, 0),
            Err(BackendError::PlatformOutOfRange { index: 1, count: 1 })
        );
        assert_eq!(
            select_device(&p, 0, 2),
            Err(BackendError::DeviceOutOfRange { index: 2, count: 2 })
        );
        let (platform, device) = select_device(&p, 0, 1).unwrap();
        assert_eq!(platform.name, "host");
        assert_eq!(device.name, "cpu-serial");
    }
}
