//! Host CPU backend.
//!
//! One platform (`host`) with two devices: `cpu`, which runs launches on
//! one worker per configured thread, and `cpu-serial`, which uses a
//! single worker. Both produce identical results for deterministic
//! kernels because every work item is computed by the same native row
//! function regardless of banding.
//!
//! Buffers are word vectors behind `Arc`. A launch snapshots its input
//! buffers when it executes, so workers read immutable data while the
//! dispatcher owns the only writable handle to the output.

mod pool;
mod registry;

pub use registry::{BoundArgs, KernelFault, KernelRegistry, NativeKernel, RowFn};

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::backend::{
    AccessMode, BackendProvider, BackendStats, BufferId, ComputeBackend, DeviceInfo, KernelArg,
    PlatformInfo, ProgramId,
};
use crate::error::{BackendError, CompileLog, Diagnostic};
use crate::source::{self, format_kinds, KernelSignature};
use pool::WorkerPool;
use registry::BoundValue;

/// Name of the single CPU platform.
pub const PLATFORM_NAME: &str = "host";

// ── Provider ────────────────────────────────────────────────────

/// Discovery for the CPU backend.
#[derive(Clone, Debug)]
pub struct CpuProvider {
    registry: Arc<KernelRegistry>,
    workers: usize,
}

impl CpuProvider {
    /// A provider whose `cpu` device uses every available core.
    pub fn new(registry: KernelRegistry) -> Self {
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            registry: Arc::new(registry),
            workers,
        }
    }

    /// Override the worker count of the `cpu` device.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Worker count of the `cpu` device.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The native kernels programs can bind to.
    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    fn device_list(&self) -> Vec<DeviceInfo> {
        vec![
            DeviceInfo {
                name: "cpu".into(),
                compute_units: self.workers,
            },
            DeviceInfo {
                name: "cpu-serial".into(),
                compute_units: 1,
            },
        ]
    }
}

impl BackendProvider for CpuProvider {
    type Backend = CpuBackend;

    fn platforms(&self) -> Vec<PlatformInfo> {
        vec![PlatformInfo {
            name: PLATFORM_NAME.into(),
            vendor: "calor".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }]
    }

    fn devices(&self, platform: usize) -> Result<Vec<DeviceInfo>, BackendError> {
        if platform != 0 {
            return Err(BackendError::PlatformOutOfRange {
                index: platform,
                count: 1,
            });
        }
        Ok(self.device_list())
    }

    fn open(&self, platform: usize, device: usize) -> Result<CpuBackend, BackendError> {
        let devices = self.devices(platform)?;
        let count = devices.len();
        let build_targets = devices.iter().map(|d| d.name.clone()).collect();
        let info = devices
            .into_iter()
            .nth(device)
            .ok_or(BackendError::DeviceOutOfRange {
                index: device,
                count,
            })?;
        CpuBackend::new(info, build_targets, Arc::clone(&self.registry))
    }
}

// ── Backend ─────────────────────────────────────────────────────

struct Buffer {
    words: Arc<Vec<u32>>,
    access: AccessMode,
}

impl Buffer {
    fn byte_len(&self) -> usize {
        self.words.len() * 4
    }
}

#[derive(Clone)]
struct BoundKernel {
    signature: KernelSignature,
    native: NativeKernel,
    output: usize,
}

struct Program {
    kernels: IndexMap<String, BoundKernel>,
}

/// A launch accepted onto the queue, not yet executed.
struct Pending {
    kernel: BoundKernel,
    global: [usize; 2],
    args: Vec<KernelArg>,
    output: BufferId,
}

/// A CPU device context.
///
/// Programs are built for every device of the platform, as a context
/// spanning the whole platform would, so a failed build carries one log
/// per device.
pub struct CpuBackend {
    device: DeviceInfo,
    build_targets: Vec<String>,
    registry: Arc<KernelRegistry>,
    pool: WorkerPool,
    programs: Vec<Program>,
    buffers: Vec<Buffer>,
    queue: VecDeque<Pending>,
    stats: BackendStats,
}

impl CpuBackend {
    fn new(
        device: DeviceInfo,
        build_targets: Vec<String>,
        registry: Arc<KernelRegistry>,
    ) -> Result<Self, BackendError> {
        let prefix = format!("calor-{}", device.name);
        let pool = WorkerPool::new(device.compute_units, &prefix)?;
        tracing::debug!(device = %device.name, workers = pool.workers(), "opened cpu context");
        Ok(Self {
            device,
            build_targets,
            registry,
            pool,
            programs: Vec::new(),
            buffers: Vec::new(),
            queue: VecDeque::new(),
            stats: BackendStats::default(),
        })
    }

    /// Launches queued but not yet executed.
    pub fn pending_launches(&self) -> usize {
        self.queue.len()
    }

    /// One build log per platform device, each with the same diagnostics.
    fn build_logs(&self, diagnostics: Vec<Diagnostic>) -> Vec<CompileLog> {
        self.build_targets
            .iter()
            .map(|device| CompileLog {
                device: device.clone(),
                diagnostics: diagnostics.clone(),
            })
            .collect()
    }

    fn buffer(&self, id: BufferId) -> Result<&Buffer, BackendError> {
        self.buffers
            .get(id.0 as usize)
            .ok_or(BackendError::UnknownBuffer(id))
    }

    fn bind(&self, sig: &KernelSignature) -> Result<BoundKernel, Diagnostic> {
        let native = self.registry.get(&sig.name).ok_or_else(|| {
            let known = self.registry.names().collect::<Vec<_>>();
            let known = if known.is_empty() {
                "none registered".to_string()
            } else {
                format!("registered: {}", known.join(", "))
            };
            Diagnostic::new(
                sig.line,
                format!("no native implementation for kernel '{}' ({known})", sig.name),
            )
        })?;
        let declared = sig.kinds();
        if declared.as_slice() != native.params() {
            return Err(Diagnostic::new(
                sig.line,
                format!(
                    "kernel '{}' declared as {} but the native implementation takes {}",
                    sig.name,
                    format_kinds(&declared),
                    format_kinds(native.params()),
                ),
            ));
        }
        let output = sig.output_index().ok_or_else(|| {
            Diagnostic::new(sig.line, format!("kernel '{}' has no output", sig.name))
        })?;
        Ok(BoundKernel {
            signature: sig.clone(),
            native: native.clone(),
            output,
        })
    }

    /// Check `args` against the kernel and return the output buffer.
    fn check_args(
        &self,
        kernel: &BoundKernel,
        global: [usize; 2],
        args: &[KernelArg],
    ) -> Result<BufferId, BackendError> {
        let name = &kernel.signature.name;
        let params = &kernel.signature.params;
        let mismatch = |detail: String| BackendError::ArgumentMismatch {
            kernel: name.clone(),
            detail,
        };
        if args.len() != params.len() {
            return Err(mismatch(format!(
                "expected {} arguments, got {}",
                params.len(),
                args.len()
            )));
        }

        let mut output = None;
        let mut inputs = Vec::new();
        for (index, (arg, param)) in args.iter().zip(params).enumerate() {
            match (arg, param.kind.is_buffer()) {
                (KernelArg::Float(_), false) if param.kind == source::ParamKind::Float => {}
                (KernelArg::Uint(_), false) if param.kind == source::ParamKind::Uint => {}
                (KernelArg::Buffer(id), true) => {
                    let buffer = self.buffer(*id)?;
                    let allowed = if param.kind.is_output() {
                        buffer.access.kernel_writable()
                    } else {
                        buffer.access.kernel_readable()
                    };
                    if !allowed {
                        return Err(BackendError::AccessViolation {
                            kernel: name.clone(),
                            buffer: *id,
                            access: buffer.access,
                        });
                    }
                    if param.kind.is_output() {
                        output = Some(*id);
                    } else {
                        inputs.push(*id);
                    }
                }
                _ => {
                    return Err(mismatch(format!(
                        "argument {index} ('{}') expects {}, got {}",
                        param.name,
                        param.kind,
                        arg.kind_name()
                    )))
                }
            }
        }

        let output = output.ok_or_else(|| mismatch("no output buffer bound".into()))?;
        if inputs.contains(&output) {
            return Err(BackendError::AliasedOutput {
                kernel: name.clone(),
                buffer: output,
            });
        }
        let required = global[0]
            .checked_mul(global[1])
            .and_then(|items| items.checked_mul(4))
            .ok_or_else(|| mismatch(format!("index space {global:?} overflows")))?;
        let actual = self.buffer(output)?.byte_len();
        if required > actual {
            return Err(BackendError::OutputTooSmall {
                kernel: name.clone(),
                buffer: output,
                required,
                actual,
            });
        }
        Ok(output)
    }

    /// Execute every queued launch in order.
    fn flush(&mut self) -> Result<(), BackendError> {
        while let Some(pending) = self.queue.pop_front() {
            if let Err(e) = self.execute(&pending) {
                self.queue.clear();
                return Err(e);
            }
        }
        Ok(())
    }

    fn execute(&mut self, pending: &Pending) -> Result<(), BackendError> {
        let kernel = &pending.kernel;
        let name = kernel.signature.name.clone();
        let [width, height] = pending.global;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let mut values = Vec::with_capacity(pending.args.len());
        for (index, arg) in pending.args.iter().enumerate() {
            values.push(match *arg {
                KernelArg::Float(v) => BoundValue::Float(v),
                KernelArg::Uint(v) => BoundValue::Uint(v),
                KernelArg::Buffer(_) if index == kernel.output => BoundValue::Output,
                KernelArg::Buffer(id) => BoundValue::Input(Arc::clone(&self.buffer(id)?.words)),
            });
        }
        let args = Arc::new(registry::BoundArgs::new(name.clone(), pending.global, values));
        let bands = self.pool.run(args, kernel.native.row())?;
        self.stats.bands += bands.len() as u64;

        let mut rows = Vec::with_capacity(bands.len());
        for band in bands {
            let words = band.words.map_err(|fault| BackendError::ExecutionFailed {
                kernel: name.clone(),
                reason: fault.to_string(),
            })?;
            rows.push((band.start, words));
        }

        let slot = self
            .buffers
            .get_mut(pending.output.0 as usize)
            .ok_or(BackendError::UnknownBuffer(pending.output))?;
        let out = Arc::make_mut(&mut slot.words);
        for (start, words) in rows {
            let offset = start * width;
            out[offset..offset + words.len()].copy_from_slice(&words);
        }
        tracing::trace!(kernel = %name, width, height, "launch complete");
        Ok(())
    }
}

impl ComputeBackend for CpuBackend {
    fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn compile(&mut self, text: &str) -> Result<ProgramId, BackendError> {
        let signatures = source::parse(text)
            .map_err(|diagnostics| BackendError::Compile(self.build_logs(diagnostics)))?;

        let mut kernels = IndexMap::new();
        let mut diagnostics = Vec::new();
        for sig in &signatures {
            match self.bind(sig) {
                Ok(bound) => {
                    kernels.insert(sig.name.clone(), bound);
                }
                Err(d) => diagnostics.push(d),
            }
        }
        if !diagnostics.is_empty() {
            return Err(BackendError::Compile(self.build_logs(diagnostics)));
        }

        let id = ProgramId(self.programs.len() as u32);
        tracing::debug!(program = %id, kernels = kernels.len(), "program built");
        self.programs.push(Program { kernels });
        self.stats.programs += 1;
        Ok(id)
    }

    fn allocate(&mut self, byte_size: usize, access: AccessMode) -> Result<BufferId, BackendError> {
        if byte_size == 0 || byte_size % 4 != 0 {
            return Err(BackendError::InvalidSize { byte_size });
        }
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Buffer {
            words: Arc::new(vec![0u32; byte_size / 4]),
            access,
        });
        self.stats.buffers += 1;
        tracing::debug!(buffer = %id, byte_size, %access, "buffer allocated");
        Ok(id)
    }

    fn write(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), BackendError> {
        self.flush()?;
        let expected = self.buffer(buffer)?.byte_len();
        if data.len() != expected {
            return Err(BackendError::SizeMismatch {
                buffer,
                expected,
                actual: data.len(),
            });
        }
        let slot = &mut self.buffers[buffer.0 as usize];
        let words = Arc::make_mut(&mut slot.words);
        for (word, bytes) in words.iter_mut().zip(data.chunks_exact(4)) {
            *word = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        self.stats.bytes_written += data.len() as u64;
        Ok(())
    }

    fn read(&mut self, buffer: BufferId, out: &mut [u8]) -> Result<(), BackendError> {
        self.flush()?;
        let slot = self.buffer(buffer)?;
        let expected = slot.byte_len();
        if out.len() != expected {
            return Err(BackendError::SizeMismatch {
                buffer,
                expected,
                actual: out.len(),
            });
        }
        out.copy_from_slice(bytemuck::cast_slice(slot.words.as_slice()));
        self.stats.bytes_read += out.len() as u64;
        Ok(())
    }

    fn launch(
        &mut self,
        program: ProgramId,
        entry: &str,
        global: [usize; 2],
        args: &[KernelArg],
    ) -> Result<(), BackendError> {
        let kernel = self
            .programs
            .get(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))?
            .kernels
            .get(entry)
            .ok_or_else(|| BackendError::UnknownEntryPoint {
                name: entry.to_string(),
            })?
            .clone();
        let output = self.check_args(&kernel, global, args)?;
        self.queue.push_back(Pending {
            kernel,
            global,
            args: args.to_vec(),
            output,
        });
        self.stats.launches += 1;
        Ok(())
    }

    fn barrier(&mut self) -> Result<(), BackendError> {
        self.stats.barriers += 1;
        self.flush()
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}
