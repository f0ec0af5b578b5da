//! Run errors and the stage they are reported under.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use calor_backend::BackendError;
use calor_core::InputError;

use crate::config::ConfigError;

/// The phase of a run an error belongs to, for user-facing reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input or configuration validation.
    Input,
    /// Platform and device discovery and selection.
    Discovery,
    /// Loading and building the kernel program.
    Compilation,
    /// Buffer setup, stepping and read-back.
    Execution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Input => "input",
            Stage::Discovery => "discovery",
            Stage::Compilation => "compilation",
            Stage::Execution => "execution",
        })
    }
}

/// Errors from [`HeatWorld::execute`](crate::HeatWorld::execute).
///
/// A failed run produces no output.
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// The input grid is malformed.
    Input(InputError),
    /// The host configuration is invalid.
    Config(ConfigError),
    /// No usable platform or device.
    Discovery(BackendError),
    /// The kernel program file could not be read.
    KernelSource {
        /// File that was read.
        path: PathBuf,
        /// OS error text.
        reason: String,
    },
    /// The kernel program failed to build.
    Compile(BackendError),
    /// A backend operation failed after compilation.
    Execution(BackendError),
}

impl RunError {
    /// The stage this error is reported under.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Input(_) | Self::Config(_) => Stage::Input,
            Self::Discovery(_) => Stage::Discovery,
            Self::KernelSource { .. } | Self::Compile(_) => Stage::Compilation,
            Self::Execution(_) => Stage::Execution,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "invalid input: {e}"),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Discovery(e) => write!(f, "{e}"),
            Self::KernelSource { path, reason } => {
                write!(f, "cannot read kernel source {}: {reason}", path.display())
            }
            Self::Compile(e) => write!(f, "{e}"),
            Self::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Discovery(e) | Self::Compile(e) | Self::Execution(e) => Some(e),
            Self::KernelSource { .. } => None,
        }
    }
}

impl From<InputError> for RunError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
