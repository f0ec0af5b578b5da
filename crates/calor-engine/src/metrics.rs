//! Per-run timing and transfer metrics.

/// Timing and transfer data collected during one
/// [`HeatWorld::execute_with_metrics`](crate::HeatWorld::execute_with_metrics) call.
///
/// All durations are in microseconds. Phases that did not run (for an
/// empty grid, every phase) stay at zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Wall-clock time for the whole run, in microseconds.
    pub total_us: u64,
    /// Platform and device discovery plus context creation, in microseconds.
    pub discovery_us: u64,
    /// Loading and compiling the kernel program, in microseconds.
    pub compile_us: u64,
    /// Encoding descriptors, allocating and uploading buffers, in microseconds.
    pub setup_us: u64,
    /// The step loop, in microseconds.
    pub steps_us: u64,
    /// Reading the final state back, in microseconds.
    pub readback_us: u64,
    /// Steps executed.
    pub steps: usize,
    /// Row bands executed across all launches.
    pub bands: u64,
    /// Bytes uploaded to the device.
    pub bytes_written: u64,
    /// Bytes read back from the device.
    pub bytes_read: u64,
}

impl RunMetrics {
    /// Mean step time in microseconds, or zero when no step ran.
    pub fn mean_step_us(&self) -> u64 {
        if self.steps == 0 {
            0
        } else {
            self.steps_us / self.steps as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = RunMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.discovery_us, 0);
        assert_eq!(m.compile_us, 0);
        assert_eq!(m.setup_us, 0);
        assert_eq!(m.steps_us, 0);
        assert_eq!(m.readback_us, 0);
        assert_eq!(m.steps, 0);
        assert_eq!(m.bands, 0);
        assert_eq!(m.bytes_written, 0);
        assert_eq!(m.bytes_read, 0);
    }

    #[test]
    fn mean_step_time() {
        let m = RunMetrics {
            steps_us: 90,
            steps: 4,
            ..Default::default()
        };
        assert_eq!(m.mean_step_us(), 22);
        assert_eq!(RunMetrics::default().mean_step_us(), 0);
    }
}
