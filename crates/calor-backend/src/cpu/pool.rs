//! Row-band worker pool.
//!
//! Each launch is split into contiguous row bands, one task per worker.
//! Workers receive [`BandTask`]s over a shared crossbeam channel, compute
//! their rows into a buffer they allocate themselves, and send it back on
//! the task's reply channel. The dispatcher commits the bands. Workers
//! never touch backend buffers directly.

use std::ops::Range;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use super::registry::{BoundArgs, KernelFault, RowFn};
use crate::error::BackendError;

/// A band of rows dispatched to one worker.
pub(crate) struct BandTask {
    args: Arc<BoundArgs>,
    row: RowFn,
    rows: Range<usize>,
    reply: Sender<BandResult>,
}

/// A worker's answer for one band.
#[derive(Debug)]
pub(crate) struct BandResult {
    /// First row of the band.
    pub start: usize,
    /// `rows * width` words, or the first fault.
    pub words: Result<Vec<u32>, KernelFault>,
}

/// Split `height` rows into at most `parts` contiguous, ordered bands
/// whose sizes differ by at most one.
pub(crate) fn split_rows(height: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.min(height).max(1);
    let base = height / parts;
    let extra = height % parts;
    let mut bands = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        if len == 0 {
            break;
        }
        bands.push(start..start + len);
        start += len;
    }
    bands
}

/// Fixed set of worker threads sharing one task channel.
pub(crate) struct WorkerPool {
    task_tx: Option<Sender<BandTask>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` threads named `{prefix}-{i}`.
    pub fn new(workers: usize, prefix: &str) -> Result<Self, BackendError> {
        let workers = workers.max(1);
        let (task_tx, task_rx) = crossbeam_channel::bounded(workers * 4);
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = task_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("{prefix}-{i}"))
                .spawn(move || worker_loop(rx))
                .map_err(|e| BackendError::WorkerSpawnFailed {
                    reason: e.to_string(),
                })?;
            handles.push(handle);
        }
        tracing::debug!(workers, "worker pool started");
        Ok(Self {
            task_tx: Some(task_tx),
            handles,
        })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Run one launch to completion and return its bands in row order.
    pub fn run(&self, args: Arc<BoundArgs>, row: RowFn) -> Result<Vec<BandResult>, BackendError> {
        let kernel = args.kernel().to_string();
        let failed = |reason: &str| BackendError::ExecutionFailed {
            kernel: kernel.clone(),
            reason: reason.to_string(),
        };
        let task_tx = self
            .task_tx
            .as_ref()
            .ok_or_else(|| failed("worker pool is shut down"))?;

        let bands = split_rows(args.height(), self.workers());
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(bands.len());
        for rows in &bands {
            let task = BandTask {
                args: Arc::clone(&args),
                row,
                rows: rows.clone(),
                reply: reply_tx.clone(),
            };
            task_tx
                .send(task)
                .map_err(|_| failed("all workers have exited"))?;
        }
        // Only workers hold reply senders now, so a lost band shows up as
        // a disconnect instead of a hang.
        drop(reply_tx);
        drop(args);

        let mut results = Vec::with_capacity(bands.len());
        for _ in 0..bands.len() {
            let result = reply_rx
                .recv()
                .map_err(|_| failed("a worker exited before finishing its band"))?;
            results.push(result);
        }
        results.sort_by_key(|r| r.start);
        Ok(results)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.task_tx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(task_rx: Receiver<BandTask>) {
    while let Ok(task) = task_rx.recv() {
        let BandTask {
            args,
            row,
            rows,
            reply,
        } = task;
        let width = args.width();
        let mut words = vec![0u32; rows.len() * width];
        let mut outcome = Ok(());
        for (y, out) in rows.clone().zip(words.chunks_mut(width.max(1))) {
            if let Err(fault) = row(&args, y, out) {
                outcome = Err(fault);
                break;
            }
        }
        // Release the input snapshots before the dispatcher commits.
        drop(args);
        let _ = reply.send(BandResult {
            start: rows.start,
            words: outcome.map(|()| words),
        });
    }
}
