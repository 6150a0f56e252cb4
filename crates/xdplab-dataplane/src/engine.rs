//! Replay Engine
//!
//! Run-to-completion packet processing across worker threads, standing in
//! for per-CPU program invocation. Frames are fed through a bounded
//! channel; each worker runs the program on one frame at a time and sends
//! the verdict back. Packets carry a sequence number since workers finish
//! out of order.

use crate::buffer::Frame;
use crate::programs::XdpProgram;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use xdplab_common::XdpAction;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Frames queued ahead of the workers
    pub queue_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus(),
            queue_depth: 1024,
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// A frame waiting for a worker
struct Job {
    seq: u64,
    frame: Frame,
}

/// Outcome for one frame
#[derive(Debug)]
pub struct Verdict {
    /// Submission order
    pub seq: u64,
    /// Terminal action
    pub action: XdpAction,
    /// Frame as the program left it
    pub frame: Frame,
}

/// Per-action counters (atomic, lock-free)
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Frames processed
    pub rx_packets: AtomicU64,
    /// Bytes processed, measured on ingress
    pub rx_bytes: AtomicU64,
    /// ABORTED verdicts
    pub aborted: AtomicU64,
    /// DROP verdicts
    pub dropped: AtomicU64,
    /// PASS verdicts
    pub passed: AtomicU64,
    /// REDIRECT verdicts
    pub redirected: AtomicU64,
}

impl EngineStats {
    #[inline(always)]
    fn record(&self, action: XdpAction, bytes: u64) {
        self.rx_packets.fetch_add(1, Ordering::Relaxed);
        self.rx_bytes.fetch_add(bytes, Ordering::Relaxed);
        let counter = match action {
            XdpAction::Aborted => &self.aborted,
            XdpAction::Drop => &self.dropped,
            XdpAction::Pass => &self.passed,
            XdpAction::Redirect(_) => &self.redirected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Stats snapshot
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            rx_packets: self.rx_packets.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            redirected: self.redirected.load(Ordering::Relaxed),
        }
    }
}

/// Stats snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatsSnapshot {
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub aborted: u64,
    pub dropped: u64,
    pub passed: u64,
    pub redirected: u64,
}

/// Multi-worker executor for one program
pub struct Engine {
    program: Arc<dyn XdpProgram>,
    jobs: Mutex<Option<Sender<Job>>>,
    verdicts: Receiver<Verdict>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    stats: Arc<EngineStats>,
    next_seq: AtomicU64,
}

impl Engine {
    /// Spawn the workers
    pub fn start(program: Arc<dyn XdpProgram>, config: EngineConfig) -> Result<Self, EngineError> {
        if config.workers == 0 {
            return Err(EngineError::ConfigError("at least one worker required".into()));
        }

        let (job_tx, job_rx) = bounded::<Job>(config.queue_depth.max(1));
        let (verdict_tx, verdict_rx) = unbounded::<Verdict>();
        let stats = Arc::new(EngineStats::default());

        let mut workers = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let worker = Worker {
                id: worker_id,
                program: program.clone(),
                jobs: job_rx.clone(),
                verdicts: verdict_tx.clone(),
                stats: stats.clone(),
            };

            let handle = thread::Builder::new()
                .name(format!("xdplab-worker-{}", worker_id))
                .spawn(move || worker.run())
                .map_err(|e| EngineError::SpawnFailed(e.to_string()))?;
            workers.push(handle);
        }

        tracing::info!(
            program = program.name(),
            workers = config.workers,
            "engine started"
        );

        Ok(Self {
            program,
            jobs: Mutex::new(Some(job_tx)),
            verdicts: verdict_rx,
            workers: Mutex::new(workers),
            stats,
            next_seq: AtomicU64::new(0),
        })
    }

    /// Queue a frame; blocks while the queue is full
    ///
    /// Returns the frame's sequence number.
    pub fn submit(&self, frame: Frame) -> Result<u64, EngineError> {
        let jobs = self.jobs.lock().clone().ok_or(EngineError::Stopped)?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        jobs.send(Job { seq, frame })
            .map_err(|_| EngineError::Stopped)?;
        Ok(seq)
    }

    /// Verdicts, in completion order
    pub fn verdicts(&self) -> &Receiver<Verdict> {
        &self.verdicts
    }

    /// Stop accepting frames, let the workers drain the queue and join them
    pub fn shutdown(&self) {
        let was_running = self.jobs.lock().take().is_some();

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                tracing::warn!(program = self.program.name(), "worker panicked");
            }
        }

        if was_running {
            tracing::info!(program = self.program.name(), "engine stopped");
        }
    }

    /// Process `frames` to completion and return verdicts in submission order
    pub fn run_to_completion(&self, frames: Vec<Frame>) -> Result<Vec<Verdict>, EngineError> {
        for frame in frames {
            self.submit(frame)?;
        }
        self.shutdown();

        let mut verdicts: Vec<_> = self.verdicts.try_iter().collect();
        verdicts.sort_by_key(|v| v.seq);
        Ok(verdicts)
    }

    /// Get engine stats
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Per-thread worker
struct Worker {
    id: usize,
    program: Arc<dyn XdpProgram>,
    jobs: Receiver<Job>,
    verdicts: Sender<Verdict>,
    stats: Arc<EngineStats>,
}

impl Worker {
    fn run(self) {
        tracing::debug!(worker = self.id, "worker starting");

        for Job { seq, mut frame } in self.jobs.iter() {
            let bytes = frame.len() as u64;
            let action = self.program.run(&mut frame);

            self.stats.record(action, bytes);
            metrics::counter!(
                "xdplab_packets_total",
                "program" => self.program.name(),
                "action" => action.name()
            )
            .increment(1);

            if self.verdicts.send(Verdict { seq, action, frame }).is_err() {
                break;
            }
        }

        tracing::debug!(worker = self.id, "worker stopped");
    }
}

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine stopped")]
    Stopped,

    #[error("failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}
