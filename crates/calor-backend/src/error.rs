//! Backend error types and compile diagnostics.

use std::error::Error;
use std::fmt;

use crate::backend::{AccessMode, BufferId, ProgramId};

// ── Diagnostics ─────────────────────────────────────────────────

/// One line-numbered problem found while compiling a kernel program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// The build log of one device for a failed compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileLog {
    /// Device the program was built for.
    pub device: String,
    /// Every problem reported by that device.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileLog {
    /// The log as text, one diagnostic per line.
    pub fn text(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for CompileLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build log for device '{}':", self.device)?;
        for d in &self.diagnostics {
            write!(f, "\n  {d}")?;
        }
        Ok(())
    }
}

// ── BackendError ────────────────────────────────────────────────

/// Errors reported by a compute backend or its provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendError {
    /// The provider exposes no platforms.
    NoPlatforms,
    /// The selected platform exposes no devices.
    NoDevices {
        /// Platform name.
        platform: String,
    },
    /// Platform index beyond the discovered list.
    PlatformOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of platforms available.
        count: usize,
    },
    /// Device index beyond the discovered list.
    DeviceOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of devices available.
        count: usize,
    },
    /// The kernel program failed to build; one log per device.
    Compile(Vec<CompileLog>),
    /// No program with this id was compiled on this backend.
    UnknownProgram(ProgramId),
    /// The program does not declare this kernel.
    UnknownEntryPoint {
        /// Requested kernel name.
        name: String,
    },
    /// No buffer with this id was allocated on this backend.
    UnknownBuffer(BufferId),
    /// Allocation size is zero or not a multiple of 4 bytes.
    InvalidSize {
        /// Requested size in bytes.
        byte_size: usize,
    },
    /// A transfer does not cover the whole buffer.
    SizeMismatch {
        /// Buffer involved.
        buffer: BufferId,
        /// Buffer size in bytes.
        expected: usize,
        /// Host slice size in bytes.
        actual: usize,
    },
    /// Launch arguments do not match the kernel's declared parameters.
    ArgumentMismatch {
        /// Kernel name.
        kernel: String,
        /// What was wrong.
        detail: String,
    },
    /// A buffer was bound to a parameter its access mode forbids.
    AccessViolation {
        /// Kernel name.
        kernel: String,
        /// Offending buffer.
        buffer: BufferId,
        /// The buffer's access mode.
        access: AccessMode,
    },
    /// The output buffer of a launch is also bound as one of its inputs.
    AliasedOutput {
        /// Kernel name.
        kernel: String,
        /// The aliased buffer.
        buffer: BufferId,
    },
    /// The output buffer is too small for the launch's index space.
    OutputTooSmall {
        /// Kernel name.
        kernel: String,
        /// Output buffer.
        buffer: BufferId,
        /// Bytes needed, 4 per work item.
        required: usize,
        /// Bytes available.
        actual: usize,
    },
    /// A launch failed while running.
    ExecutionFailed {
        /// Kernel name.
        kernel: String,
        /// What went wrong.
        reason: String,
    },
    /// A worker thread could not be started.
    WorkerSpawnFailed {
        /// OS error text.
        reason: String,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPlatforms => write!(f, "no compute platforms found"),
            Self::NoDevices { platform } => {
                write!(f, "platform '{platform}' has no devices")
            }
            Self::PlatformOutOfRange { index, count } => {
                write!(f, "platform index {index} out of range ({count} available)")
            }
            Self::DeviceOutOfRange { index, count } => {
                write!(f, "device index {index} out of range ({count} available)")
            }
            Self::Compile(logs) => {
                write!(f, "kernel program failed to build on {} device(s)", logs.len())
            }
            Self::UnknownProgram(id) => write!(f, "unknown program {id}"),
            Self::UnknownEntryPoint { name } => write!(f, "program has no kernel '{name}'"),
            Self::UnknownBuffer(id) => write!(f, "unknown buffer {id}"),
            Self::InvalidSize { byte_size } => {
                write!(f, "buffer size {byte_size} must be a non-zero multiple of 4")
            }
            Self::SizeMismatch {
                buffer,
                expected,
                actual,
            } => write!(
                f,
                "transfer of {actual} bytes does not match {buffer} of {expected} bytes"
            ),
            Self::ArgumentMismatch { kernel, detail } => {
                write!(f, "bad arguments for kernel '{kernel}': {detail}")
            }
            Self::AccessViolation {
                kernel,
                buffer,
                access,
            } => write!(
                f,
                "kernel '{kernel}' cannot use {access} {buffer} in that position"
            ),
            Self::AliasedOutput { kernel, buffer } => write!(
                f,
                "kernel '{kernel}' writes {buffer} which is also bound as an input"
            ),
            Self::OutputTooSmall {
                kernel,
                buffer,
                required,
                actual,
            } => write!(
                f,
                "kernel '{kernel}' needs {required} bytes in {buffer}, which holds {actual}"
            ),
            Self::ExecutionFailed { kernel, reason } => {
                write!(f, "kernel '{kernel}' failed: {reason}")
            }
            Self::WorkerSpawnFailed { reason } => {
                write!(f, "failed to spawn worker thread: {reason}")
            }
        }
    }
}

impl Error for BackendError {}

impl BackendError {
    /// Per-device build logs, if this is a compile failure.
    pub fn compile_logs(&self) -> &[CompileLog] {
        match self {
            Self::Compile(logs) => logs,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_log_lists_every_diagnostic() {
        let log = CompileLog {
            device: "cpu".into(),
            diagnostics: vec![
                Diagnostic::new(3, "unknown type 'double'"),
                Diagnostic::new(7, "expected ';'"),
            ],
        };
        assert_eq!(
            log.text(),
            "line 3: unknown type 'double'\nline 7: expected ';'"
        );
        assert!(log.to_string().starts_with("build log for device 'cpu':"));
    }

    #[test]
    fn compile_logs_accessor() {
        let err = BackendError::Compile(vec![CompileLog {
            device: "d".into(),
            diagnostics: Vec::new(),
        }]);
        assert_eq!(err.compile_logs().len(), 1);
        assert!(BackendError::NoPlatforms.compile_logs().is_empty());
    }

    #[test]
    fn display_mentions_buffer() {
        let err = BackendError::AliasedOutput {
            kernel: "k".into(),
            buffer: BufferId(2),
        };
        assert_eq!(
            err.to_string(),
            "kernel 'k' writes buffer#2 which is also bound as an input"
        );
    }
}
