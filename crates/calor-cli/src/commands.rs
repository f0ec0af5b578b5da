//! Subcommand implementations.

use std::error::Error;
use std::path::{Path, PathBuf};

use calor_backend::BackendProvider;
use calor_core::{reference, EdgePolicy};
use calor_engine::{puzzle, HeatWorld, HostConfig};

use crate::io::{self, InputFile, OutputFile};

/// Host selection flags shared by `run`, `verify` and `devices`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct HostArgs {
    /// Platform index
    #[arg(long, env = "CALOR_PLATFORM", default_value_t = 0)]
    pub platform: usize,

    /// Device index on the selected platform
    #[arg(long, env = "CALOR_DEVICE", default_value_t = 0)]
    pub device: usize,

    /// Directory containing heat_world.kern (default: built-in program)
    #[arg(long, env = "CALOR_KERNEL_DIR")]
    pub kernel_dir: Option<PathBuf>,

    /// Worker threads for the parallel CPU device (default: all cores)
    #[arg(long, env = "CALOR_WORKERS")]
    pub workers: Option<usize>,

    /// Edge policy: clamp, insulated or wrap
    #[arg(long, default_value = "clamp")]
    pub edge: EdgePolicy,

    /// Number of steps (default: grid size)
    #[arg(long)]
    pub steps: Option<usize>,
}

impl HostArgs {
    pub fn config(&self) -> HostConfig {
        HostConfig {
            platform: self.platform,
            device: self.device,
            kernel_dir: self.kernel_dir.clone(),
            edge: self.edge,
            steps: self.steps,
            workers: self.workers,
        }
    }
}

pub fn run(
    host: &HostArgs,
    input: &Path,
    output: Option<&Path>,
    metrics: bool,
) -> Result<(), Box<dyn Error>> {
    let input = io::load_input(input)?;
    tracing::info!(n = input.n, alpha = input.alpha, "input loaded");
    let world = HeatWorld::new(host.config());
    let (result, m) = world.execute_with_metrics(&world.cpu_provider(), &input)?;
    if metrics {
        eprintln!(
            "steps: {}  total: {} us  compile: {} us  steps: {} us ({} us/step)  bytes: {} up, {} down",
            m.steps,
            m.total_us,
            m.compile_us,
            m.steps_us,
            m.mean_step_us(),
            m.bytes_written,
            m.bytes_read
        );
    }
    let text = serde_json::to_string(&OutputFile::from(result))?;
    io::write_text(output, &text)
}

pub fn generate(
    n: usize,
    seed: u64,
    alpha: f32,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let input = puzzle::generate_with_alpha(n, seed, alpha);
    let text = serde_json::to_string(&InputFile::from(&input))?;
    io::write_text(output, &text)
}

/// Run on the selected device and on the host reference; fail if any
/// cell differs by more than `tolerance`.
pub fn verify(host: &HostArgs, input: &Path, tolerance: f32) -> Result<(), Box<dyn Error>> {
    let input = io::load_input(input)?;
    let config = host.config();
    let world = HeatWorld::new(config.clone());
    let device = world.execute(&world.cpu_provider(), &input)?;
    let expected = reference::simulate(&input, config.steps_for(input.n), config.edge)?;
    let diff = device
        .state
        .iter()
        .zip(&expected.state)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    println!(
        "max abs difference: {diff:e} over {} cells ({} steps)",
        input.cell_count(),
        config.steps_for(input.n)
    );
    if diff > tolerance {
        return Err(format!("difference {diff:e} exceeds tolerance {tolerance:e}").into());
    }
    tracing::info!(diff, tolerance, "verification passed");
    println!("ok");
    Ok(())
}

pub fn devices(host: &HostArgs) -> Result<(), Box<dyn Error>> {
    let provider = HeatWorld::new(host.config()).cpu_provider();
    for (p, platform) in provider.platforms().iter().enumerate() {
        println!(
            "platform {p}: {} ({} {})",
            platform.name, platform.vendor, platform.version
        );
        for (d, device) in provider.devices(p)?.iter().enumerate() {
            println!(
                "  device {d}: {} ({} compute units)",
                device.name, device.compute_units
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("calor-cli-{}-{name}", std::process::id()))
    }

    #[test]
    fn generate_then_run_then_verify() {
        let input = scratch("input.json");
        let output = scratch("output.json");
        generate(6, 3, 0.25, Some(&input)).unwrap();
        let host = HostArgs {
            workers: Some(2),
            steps: Some(4),
            ..Default::default()
        };
        run(&host, &input, Some(&output), false).unwrap();
        let out: OutputFile =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(out.state.len(), 36);
        verify(&host, &input, 0.0).unwrap();
        let _ = std::fs::remove_file(input);
        let _ = std::fs::remove_file(output);
    }

    #[test]
    fn bad_device_is_reported_as_discovery() {
        let input = scratch("bad-device.json");
        generate(3, 1, 0.5, Some(&input)).unwrap();
        let host = HostArgs {
            device: 9,
            ..Default::default()
        };
        let err = run(&host, &input, None, false).unwrap_err();
        let run_err = err.downcast_ref::<calor_engine::RunError>().unwrap();
        assert_eq!(run_err.stage(), calor_engine::Stage::Discovery);
        let _ = std::fs::remove_file(input);
    }
}
