//! Compute backend seam for Calor.
//!
//! A backend is anything that can discover platforms and devices,
//! compile a kernel program, hold device buffers, and run launches on an
//! in-order queue separated by barriers. The heat engine only talks to
//! the [`ComputeBackend`] and [`BackendProvider`] traits.
//!
//! One implementation ships here: the [`cpu`] backend, which runs native
//! row kernels on a crossbeam worker pool. Kernel programs are written in
//! a small declaration language (see [`source`]) whose entries bind to
//! native implementations registered in a [`cpu::KernelRegistry`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cpu;
pub mod error;
pub mod source;

pub use backend::{
    AccessMode, BackendExt, BackendProvider, BackendStats, BufferId, ComputeBackend, DeviceInfo,
    KernelArg, PlatformInfo, ProgramId,
};
pub use error::{BackendError, CompileLog, Diagnostic};
pub use source::{KernelSignature, Param, ParamKind};
