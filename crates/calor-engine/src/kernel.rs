//! The `heat_step` kernel: program text and its native CPU implementation.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use calor_backend::cpu::{BoundArgs, CpuProvider, KernelFault, KernelRegistry, NativeKernel};
use calor_backend::ParamKind;
use calor_core::stencil::{self, Coefficients};
use calor_core::EdgePolicy;

use crate::error::RunError;

/// File name of the kernel program inside a kernel directory.
pub const KERNEL_FILE: &str = "heat_world.kern";

/// Entry point launched once per step.
pub const ENTRY_POINT: &str = "heat_step";

/// The program shipped with the crate, used when no kernel directory is set.
pub const EMBEDDED_SOURCE: &str = include_str!("../kernels/heat_world.kern");

// Argument order of `heat_step`.
pub(crate) const ARG_INNER: usize = 0;
pub(crate) const ARG_OUTER: usize = 1;
pub(crate) const ARG_EDGE: usize = 2;
pub(crate) const ARG_PACKED: usize = 3;
pub(crate) const ARG_STATE: usize = 4;

/// Parameter kinds of `heat_step`, in declaration order.
pub fn heat_step_params() -> Vec<ParamKind> {
    vec![
        ParamKind::Float,
        ParamKind::Float,
        ParamKind::Uint,
        ParamKind::ConstUintPtr,
        ParamKind::ConstFloatPtr,
        ParamKind::FloatPtr,
    ]
}

/// Row `y` of one diffusion step.
fn heat_step_row(args: &BoundArgs, y: usize, out: &mut [u32]) -> Result<(), KernelFault> {
    let n = args.width();
    if args.height() != n {
        return Err(KernelFault::new(format!(
            "heat_step needs a square index space, got [{n}, {}]",
            args.height()
        )));
    }
    let inner = args.float(ARG_INNER)?;
    let outer = args.float(ARG_OUTER)?;
    let code = args.uint(ARG_EDGE)?;
    let edge = EdgePolicy::from_code(code)
        .ok_or_else(|| KernelFault::new(format!("unknown edge policy code {code}")))?;
    let packed = args.words(ARG_PACKED)?;
    let state = args.floats(ARG_STATE)?;
    let cells = n * n;
    if packed.len() < cells || state.len() < cells {
        return Err(KernelFault::new(format!(
            "heat_step buffers hold {} descriptors and {} cells, need {cells}",
            packed.len(),
            state.len()
        )));
    }
    let c = Coefficients {
        outer,
        quarter: outer / 4.0,
        inner,
    };
    stencil::step_row(
        &state[..cells],
        &packed[..cells],
        n,
        y,
        edge,
        c,
        bytemuck::cast_slice_mut::<u32, f32>(out),
    );
    Ok(())
}

/// The native `heat_step` kernel.
pub fn heat_step_kernel() -> NativeKernel {
    NativeKernel::new(ENTRY_POINT, heat_step_params(), heat_step_row)
}

/// A registry holding every kernel Calor programs use.
pub fn registry() -> KernelRegistry {
    KernelRegistry::new().with(heat_step_kernel())
}

/// A CPU provider with the Calor kernels registered.
///
/// `workers` sets the thread count of the parallel `cpu` device; `None`
/// uses the available parallelism.
pub fn cpu_provider(workers: Option<usize>) -> CpuProvider {
    let provider = CpuProvider::new(registry());
    match workers {
        Some(w) => provider.with_workers(w),
        None => provider,
    }
}

/// Read the kernel program from `dir`, or fall back to the embedded copy.
pub fn load_source(dir: Option<&Path>) -> Result<Cow<'static, str>, RunError> {
    let Some(dir) = dir else {
        return Ok(Cow::Borrowed(EMBEDDED_SOURCE));
    };
    let path: PathBuf = dir.join(KERNEL_FILE);
    std::fs::read_to_string(&path)
        .map(Cow::Owned)
        .map_err(|e| RunError::KernelSource {
            path,
            reason: e.to_string(),
        })
}
