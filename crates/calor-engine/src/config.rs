//! Host configuration and its validation.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use calor_core::EdgePolicy;

/// Upper bound on configured worker threads.
pub const MAX_WORKERS: usize = 256;

// ── ConfigError ─────────────────────────────────────────────────

/// Errors detected by [`HostConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Worker count is zero or above [`MAX_WORKERS`].
    InvalidWorkerCount {
        /// The configured value.
        value: usize,
    },
    /// The kernel directory does not exist or is not a directory.
    KernelDirNotFound {
        /// The configured path.
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWorkerCount { value } => {
                write!(f, "worker count must be in [1, {MAX_WORKERS}], got {value}")
            }
            Self::KernelDirNotFound { path } => {
                write!(f, "kernel directory {} is not a directory", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

// ── HostConfig ──────────────────────────────────────────────────

/// Everything about a run that is not part of the input grid.
///
/// Built explicitly by the caller. Nothing in the engine reads the
/// process environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostConfig {
    /// Index into the discovered platform list. Default: 0.
    pub platform: usize,
    /// Index into the selected platform's device list. Default: 0.
    pub device: usize,
    /// Directory holding `heat_world.kern`. `None` uses the embedded program.
    pub kernel_dir: Option<PathBuf>,
    /// Treatment of neighbours beyond the grid edge. Default: clamp.
    pub edge: EdgePolicy,
    /// Number of steps. `None` runs `n` steps for an `n` × `n` grid.
    pub steps: Option<usize>,
    /// CPU backend worker threads. `None` = available parallelism.
    pub workers: Option<usize>,
}

impl HostConfig {
    /// Check the configuration without touching any backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(value) = self.workers {
            if value == 0 || value > MAX_WORKERS {
                return Err(ConfigError::InvalidWorkerCount { value });
            }
        }
        if let Some(path) = &self.kernel_dir {
            if !path.is_dir() {
                return Err(ConfigError::KernelDirNotFound { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Steps to run for an `n` × `n` grid.
    pub fn steps_for(&self, n: usize) -> usize {
        self.steps.unwrap_or(n)
    }

    /// Resolve the worker count, applying auto-detection if `None`.
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            Some(n) => n.clamp(1, MAX_WORKERS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_WORKERS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = HostConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.platform, 0);
        assert_eq!(c.device, 0);
        assert_eq!(c.edge, EdgePolicy::Clamp);
    }

    #[test]
    fn steps_default_to_grid_size() {
        let mut c = HostConfig::default();
        assert_eq!(c.steps_for(17), 17);
        c.steps = Some(3);
        assert_eq!(c.steps_for(17), 3);
        c.steps = Some(0);
        assert_eq!(c.steps_for(17), 0);
    }

    #[test]
    fn zero_workers_rejected() {
        let c = HostConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidWorkerCount { value: 0 })
        );
    }

    #[test]
    fn resolved_workers_is_at_least_one() {
        assert!(HostConfig::default().resolved_workers() >= 1);
        let c = HostConfig {
            workers: Some(4),
            ..Default::default()
        };
        assert_eq!(c.resolved_workers(), 4);
    }

    #[test]
    fn missing_kernel_dir_rejected() {
        let c = HostConfig {
            kernel_dir: Some(PathBuf::from("/definitely/not/a/real/calor/dir")),
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::KernelDirNotFound { .. })
        ));
    }

    #[test]
    fn existing_kernel_dir_accepted() {
        let c = HostConfig {
            kernel_dir: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("kernels")),
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }
}
