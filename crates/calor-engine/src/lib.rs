//! Step scheduler and host orchestrator for Calor heat simulations.
//!
//! [`HeatWorld`] drives one run end to end over any
//! [`BackendProvider`](calor_backend::BackendProvider): discovery and
//! selection, kernel compilation, buffer setup, the double-buffered
//! [`StepScheduler`] loop, and read-back. The [`kernel`] module supplies
//! the program source and the native `heat_step` kernel for the CPU
//! backend.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod orchestrator;
pub mod puzzle;
pub mod report;
pub mod scheduler;

pub use config::{ConfigError, HostConfig};
pub use error::{RunError, Stage};
pub use kernel::cpu_provider;
pub use metrics::RunMetrics;
pub use orchestrator::HeatWorld;
pub use scheduler::{StepLaunch, StepScheduler};
