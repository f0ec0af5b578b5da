//! Native kernel implementations and the arguments they run against.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::source::ParamKind;

/// Failure raised by a native kernel while computing a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelFault {
    /// What went wrong.
    pub message: String,
}

impl KernelFault {
    /// Build a fault from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for KernelFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for KernelFault {}

/// Computes row `y` of a launch into `out`, which holds one 32-bit word
/// per work item of that row.
pub type RowFn = fn(&BoundArgs, usize, &mut [u32]) -> Result<(), KernelFault>;

/// A kernel the CPU backend can bind program declarations to.
#[derive(Clone)]
pub struct NativeKernel {
    name: String,
    params: Vec<ParamKind>,
    row: RowFn,
}

impl NativeKernel {
    /// Describe a native kernel by name and parameter kinds.
    pub fn new(name: impl Into<String>, params: Vec<ParamKind>, row: RowFn) -> Self {
        Self {
            name: name.into(),
            params,
            row,
        }
    }

    /// Kernel name, matched against program declarations.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter kinds, matched against program declarations.
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub(crate) fn row(&self) -> RowFn {
        self.row
    }
}

impl fmt::Debug for NativeKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeKernel")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// The set of native kernels available to programs, by name.
#[derive(Clone, Debug, Default)]
pub struct KernelRegistry {
    kernels: IndexMap<String, NativeKernel>,
}

impl KernelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a kernel; returns the one it replaced.
    pub fn register(&mut self, kernel: NativeKernel) -> Option<NativeKernel> {
        self.kernels.insert(kernel.name.clone(), kernel)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, kernel: NativeKernel) -> Self {
        self.register(kernel);
        self
    }

    /// Look up a kernel by name.
    pub fn get(&self, name: &str) -> Option<&NativeKernel> {
        self.kernels.get(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }

    /// Number of registered kernels.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether no kernels are registered.
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

// ── Bound arguments ─────────────────────────────────────────────

/// One argument value as seen by a running kernel.
#[derive(Clone, Debug)]
pub(crate) enum BoundValue {
    Float(f32),
    Uint(u32),
    /// Immutable snapshot of an input buffer.
    Input(Arc<Vec<u32>>),
    /// The launch's output; written through the row slice, not here.
    Output,
}

/// The arguments of one launch, shared read-only by every worker.
#[derive(Debug)]
pub struct BoundArgs {
    kernel: String,
    global: [usize; 2],
    values: Vec<BoundValue>,
}

impl BoundArgs {
    pub(crate) fn new(kernel: String, global: [usize; 2], values: Vec<BoundValue>) -> Self {
        Self {
            kernel,
            global,
            values,
        }
    }

    /// Kernel being run.
    pub fn kernel(&self) -> &str {
        &self.kernel
    }

    /// Work items per row.
    pub fn width(&self) -> usize {
        self.global[0]
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.global[1]
    }

    /// `float` argument at `index`.
    pub fn float(&self, index: usize) -> Result<f32, KernelFault> {
        match self.values.get(index) {
            Some(BoundValue::Float(v)) => Ok(*v),
            _ => Err(self.wrong_kind(index, "float")),
        }
    }

    /// `uint` argument at `index`.
    pub fn uint(&self, index: usize) -> Result<u32, KernelFault> {
        match self.values.get(index) {
            Some(BoundValue::Uint(v)) => Ok(*v),
            _ => Err(self.wrong_kind(index, "uint")),
        }
    }

    /// Input buffer at `index` as raw words.
    pub fn words(&self, index: usize) -> Result<&[u32], KernelFault> {
        match self.values.get(index) {
            Some(BoundValue::Input(words)) => Ok(words.as_slice()),
            _ => Err(self.wrong_kind(index, "input buffer")),
        }
    }

    /// Input buffer at `index` reinterpreted as `f32`.
    pub fn floats(&self, index: usize) -> Result<&[f32], KernelFault> {
        self.words(index).map(bytemuck::cast_slice)
    }

    fn wrong_kind(&self, index: usize, expected: &str) -> KernelFault {
        KernelFault::new(format!(
            "kernel '{}' read argument {index} as {expected}",
            self.kernel
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &BoundArgs, _: usize, _: &mut [u32]) -> Result<(), KernelFault> {
        Ok(())
    }

    #[test]
    fn registry_keeps_registration_order() {
        let reg = KernelRegistry::new()
            .with(NativeKernel::new("b", vec![ParamKind::UintPtr], noop))
            .with(NativeKernel::new("a", vec![ParamKind::FloatPtr], noop));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(reg.get("a").map(|k| k.params()), Some(&[ParamKind::FloatPtr][..]));
        assert!(reg.get("c").is_none());
    }

    #[test]
    fn register_replaces_by_name() {
        let mut reg = KernelRegistry::new();
        assert!(reg
            .register(NativeKernel::new("k", vec![ParamKind::UintPtr], noop))
            .is_none());
        let old = reg.register(NativeKernel::new("k", vec![ParamKind::FloatPtr], noop));
        assert_eq!(old.map(|k| k.params().to_vec()), Some(vec![ParamKind::UintPtr]));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn accessors_check_kinds() {
        let args = BoundArgs::new(
            "k".into(),
            [2, 1],
            vec![
                BoundValue::Float(0.5),
                BoundValue::Uint(3),
                BoundValue::Input(Arc::new(vec![1.0f32.to_bits(), 2.0f32.to_bits()])),
                BoundValue::Output,
            ],
        );
        assert_eq!(args.float(0), Ok(0.5));
        assert_eq!(args.uint(1), Ok(3));
        assert_eq!(args.floats(2).unwrap(), &[1.0f32, 2.0]);
        assert!(args.float(1).is_err());
        assert!(args.words(3).is_err());
        assert!(args.uint(9).is_err());
    }
}
