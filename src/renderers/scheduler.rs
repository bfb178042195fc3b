// Copyright @yucwang 2026

use crate::core::error::{Result, TracerError};
use crate::core::particle_handler::ParticleHandler;
use crate::core::particle_process::ParticleProcess;
use crate::core::particle_tracer::{ParticleTracer, TracerConfig};
use crate::core::resources::Resources;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

enum WorkerMessage<O> {
    Output(O),
    Failed(usize, TracerError),
}

/// Totals of one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub worker_count: usize,
    pub ranges: u64,
    pub generated: u64,
    pub results: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Worker pool driving a `ParticleProcess` with one `ParticleTracer` per
/// OS thread.
pub struct Scheduler {
    worker_count: usize,
}

impl Scheduler {
    /// `None` uses every available core.
    pub fn new(worker_count: Option<usize>) -> Self {
        let worker_count = worker_count
            .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);
        Self { worker_count }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs `process` to exhaustion or until `stop` is raised. Handler
    /// outputs are passed to `on_output` on the calling thread in arrival
    /// order. The first worker setup failure is returned after all workers
    /// have wound down.
    pub fn run<H, F, C>(&self,
                        process: &ParticleProcess,
                        config: TracerConfig,
                        resources: &Resources,
                        make_handler: F,
                        mut on_output: C,
                        stop: &AtomicBool) -> Result<RunSummary>
    where
        H: ParticleHandler,
        F: Fn(usize) -> H + Sync,
        C: FnMut(H::Output),
    {
        log::info!("tracing {:?} work count {} on {} workers (granularity {})",
                   process.mode(), process.work_count(), self.worker_count, process.granularity());

        let start = Instant::now();
        let make_handler = &make_handler;
        let (tx, rx) = mpsc::channel::<WorkerMessage<H::Output>>();
        let mut ranges = 0u64;
        let mut first_error: Option<TracerError> = None;

        thread::scope(|scope| {
            for worker in 0..self.worker_count {
                let tx = tx.clone();
                scope.spawn(move || {
                    let mut tracer = ParticleTracer::new(config, make_handler(worker));
                    if let Err(err) = tracer.prepare(resources) {
                        stop.store(true, Ordering::Relaxed);
                        let _ = tx.send(WorkerMessage::Failed(worker, err));
                        return;
                    }

                    while !stop.load(Ordering::Relaxed) {
                        let range = match process.generate_work(worker) {
                            Some(range) => range,
                            None => break,
                        };
                        if let Err(err) = tracer.process(&range, stop) {
                            stop.store(true, Ordering::Relaxed);
                            let _ = tx.send(WorkerMessage::Failed(worker, err));
                            return;
                        }

                        let output = tracer.handler_mut().take_output();
                        process.increase_result_count(H::result_count(&output));
                        if tx.send(WorkerMessage::Output(output)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(tx);
            for message in rx {
                match message {
                    WorkerMessage::Output(output) => {
                        ranges += 1;
                        on_output(output);
                    }
                    WorkerMessage::Failed(worker, err) => {
                        log::error!("worker {} failed: {}", worker, err);
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
            }
        });
        process.finish();

        if let Some(err) = first_error {
            return Err(err);
        }

        let summary = RunSummary {
            worker_count: self.worker_count,
            ranges,
            generated: process.num_generated(),
            results: process.received_result_count(),
            cancelled: stop.load(Ordering::Relaxed) && !process.is_exhausted(),
            elapsed: start.elapsed(),
        };
        log::info!("finished {} ranges ({} units, {} results) in {:.2?}",
                   summary.ranges, summary.generated, summary.results, summary.elapsed);
        Ok(summary)
    }
}
