//! The backend traits and the handles they exchange.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::BackendError;

// ── Handles ─────────────────────────────────────────────────────

/// Identifies a compiled program on one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Identifies a device buffer on one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// What kernels may do with a buffer. The host may always read and
/// write every buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Kernels may only read.
    ReadOnly,
    /// Kernels may only write.
    WriteOnly,
    /// Kernels may read and write.
    ReadWrite,
}

impl AccessMode {
    /// Whether a kernel may bind this buffer to a `const` parameter.
    pub fn kernel_readable(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    /// Whether a kernel may bind this buffer to a writable parameter.
    pub fn kernel_writable(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        })
    }
}

/// One positional kernel argument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelArg {
    /// A `float` scalar.
    Float(f32),
    /// A `uint` scalar.
    Uint(u32),
    /// A global buffer.
    Buffer(BufferId),
}

impl KernelArg {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            KernelArg::Float(_) => "float",
            KernelArg::Uint(_) => "uint",
            KernelArg::Buffer(_) => "buffer",
        }
    }
}

// ── Discovery ───────────────────────────────────────────────────

/// A compute platform as reported by discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Platform name.
    pub name: String,
    /// Vendor string.
    pub vendor: String,
    /// Version string.
    pub version: String,
}

/// A device on a platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device name.
    pub name: String,
    /// Number of parallel execution units.
    pub compute_units: usize,
}

/// Counters accumulated by a backend since it was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Programs compiled successfully.
    pub programs: u64,
    /// Buffers allocated.
    pub buffers: u64,
    /// Kernel launches enqueued.
    pub launches: u64,
    /// Barriers issued.
    pub barriers: u64,
    /// Row bands executed by workers.
    pub bands: u64,
    /// Bytes copied host → device.
    pub bytes_written: u64,
    /// Bytes copied device → host.
    pub bytes_read: u64,
}

// ── Traits ──────────────────────────────────────────────────────

/// One opened device context with its command queue.
///
/// Launches are queued in order. A launch observes every effect of the
/// launches queued before it. [`barrier`](Self::barrier) blocks until
/// the queue is empty. [`read`](Self::read) and [`write`](Self::write)
/// are blocking and also complete all queued work first.
pub trait ComputeBackend {
    /// The device this context runs on.
    fn device(&self) -> &DeviceInfo;

    /// Build a kernel program from source.
    ///
    /// On failure returns [`BackendError::Compile`] carrying one
    /// [`CompileLog`](crate::CompileLog) per device.
    fn compile(&mut self, source: &str) -> Result<ProgramId, BackendError>;

    /// Allocate a zero-filled buffer. `byte_size` must be a non-zero
    /// multiple of 4.
    fn allocate(&mut self, byte_size: usize, access: AccessMode) -> Result<BufferId, BackendError>;

    /// Overwrite a whole buffer from host memory.
    fn write(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), BackendError>;

    /// Copy a whole buffer into host memory.
    fn read(&mut self, buffer: BufferId, out: &mut [u8]) -> Result<(), BackendError>;

    /// Enqueue `entry` from `program` over a `[width, height]` index space.
    ///
    /// Arguments are checked against the kernel's declared parameters
    /// before anything is queued.
    fn launch(
        &mut self,
        program: ProgramId,
        entry: &str,
        global: [usize; 2],
        args: &[KernelArg],
    ) -> Result<(), BackendError>;

    /// Block until every queued launch has completed.
    fn barrier(&mut self) -> Result<(), BackendError>;

    /// Counters since the context was opened.
    fn stats(&self) -> BackendStats;
}

/// Discovery and context creation.
pub trait BackendProvider {
    /// Context type produced by [`open`](Self::open).
    type Backend: ComputeBackend;

    /// All platforms, in a stable order.
    fn platforms(&self) -> Vec<PlatformInfo>;

    /// Devices on `platform`, in a stable order.
    fn devices(&self, platform: usize) -> Result<Vec<DeviceInfo>, BackendError>;

    /// Open a context on one device.
    fn open(&self, platform: usize, device: usize) -> Result<Self::Backend, BackendError>;
}

/// Typed transfers over [`ComputeBackend`].
pub trait BackendExt: ComputeBackend {
    /// Overwrite a buffer from a slice of plain values.
    fn write_slice<T: Pod>(&mut self, buffer: BufferId, data: &[T]) -> Result<(), BackendError> {
        self.write(buffer, bytemuck::cast_slice(data))
    }

    /// Read a buffer back as `len` plain values.
    fn read_vec<T: Pod>(&mut self, buffer: BufferId, len: usize) -> Result<Vec<T>, BackendError> {
        let mut out = vec![<T as Zeroable>::zeroed(); len];
        self.read(buffer, bytemuck::cast_slice_mut(out.as_mut_slice()))?;
        Ok(out)
    }
}

impl<B: ComputeBackend + ?Sized> BackendExt for B {}
