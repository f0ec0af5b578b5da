//! Discovery doubles.
//!
//! Each provider fails at a known step so error paths can be driven
//! without a real device.

use calor_backend::cpu::{CpuBackend, CpuProvider, KernelRegistry};
use calor_backend::{BackendError, BackendProvider, DeviceInfo, PlatformInfo};

/// Reports no platforms at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPlatforms;

impl BackendProvider for NoPlatforms {
    type Backend = CpuBackend;

    fn platforms(&self) -> Vec<PlatformInfo> {
        Vec::new()
    }

    fn devices(&self, platform: usize) -> Result<Vec<DeviceInfo>, BackendError> {
        Err(BackendError::PlatformOutOfRange {
            index: platform,
            count: 0,
        })
    }

    fn open(&self, platform: usize, _device: usize) -> Result<CpuBackend, BackendError> {
        Err(BackendError::PlatformOutOfRange {
            index: platform,
            count: 0,
        })
    }
}

/// One platform with an empty device list.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDevices;

impl BackendProvider for NoDevices {
    type Backend = CpuBackend;

    fn platforms(&self) -> Vec<PlatformInfo> {
        vec![PlatformInfo {
            name: "empty".into(),
            vendor: "test".into(),
            version: "0".into(),
        }]
    }

    fn devices(&self, _platform: usize) -> Result<Vec<DeviceInfo>, BackendError> {
        Ok(Vec::new())
    }

    fn open(&self, _platform: usize, device: usize) -> Result<CpuBackend, BackendError> {
        Err(BackendError::DeviceOutOfRange {
            index: device,
            count: 0,
        })
    }
}

/// A working CPU provider with no native kernels, so every program
/// that declares a kernel fails to build.
pub fn no_kernels() -> CpuProvider {
    CpuProvider::new(KernelRegistry::new()).with_workers(1)
}
