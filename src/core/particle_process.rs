// Copyright @yucwang 2026

use crate::core::range::WorkRange;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

/// How the process decides that no more work remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleMode {
    /// Generate exactly `work_count` particles.
    Trace,
    /// Keep generating until `work_count` results have been received.
    Gather,
}

#[derive(Debug, Default)]
struct Counters {
    num_generated: u64,
    received_result_count: u64,
}

/// Coordinator that carves particle indices into `WorkRange`s and counts
/// the results coming back from workers.
pub struct ParticleProcess {
    mode: ParticleMode,
    work_count: u64,
    granularity: u64,
    counters: Mutex<Counters>,
    progress: ProgressBar,
}

impl ParticleProcess {
    /// A `granularity` of zero picks `max(1, work_count / (16 * worker_count))`.
    pub fn new(mode: ParticleMode, work_count: u64, granularity: u64,
               worker_count: usize, progress_text: &str) -> Self {
        let granularity = if granularity == 0 {
            let workers = worker_count.max(1) as u64;
            std::cmp::max(1, work_count / (16 * workers))
        } else {
            granularity
        };

        let progress = ProgressBar::new(work_count);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message(progress_text.to_string());

        log::debug!("particle process: mode={:?}, work_count={}, granularity={}", mode, work_count, granularity);

        Self {
            mode,
            work_count,
            granularity,
            counters: Mutex::new(Counters::default()),
            progress,
        }
    }

    pub fn with_progress_bar(mut self, progress: ProgressBar) -> Self {
        progress.set_length(self.work_count);
        self.progress = progress;
        self
    }

    pub fn mode(&self) -> ParticleMode {
        self.mode
    }

    pub fn work_count(&self) -> u64 {
        self.work_count
    }

    pub fn granularity(&self) -> u64 {
        self.granularity
    }

    pub fn num_generated(&self) -> u64 {
        self.counters.lock().num_generated
    }

    pub fn received_result_count(&self) -> u64 {
        self.counters.lock().received_result_count
    }

    pub fn progress(&self) -> &ProgressBar {
        &self.progress
    }

    pub fn is_exhausted(&self) -> bool {
        let counters = self.counters.lock();
        self.exhausted(&counters)
    }

    fn exhausted(&self, counters: &Counters) -> bool {
        match self.mode {
            ParticleMode::Trace => counters.num_generated >= self.work_count,
            ParticleMode::Gather => counters.received_result_count >= self.work_count,
        }
    }

    /// Hands out the next range of particle indices, or `None` once the
    /// process is exhausted.
    pub fn generate_work(&self, _worker: usize) -> Option<WorkRange> {
        let mut counters = self.counters.lock();
        if self.exhausted(&counters) {
            return None;
        }

        let size = match self.mode {
            ParticleMode::Trace => self.granularity.min(self.work_count - counters.num_generated),
            ParticleMode::Gather => self.granularity,
        };

        let range = WorkRange::new(counters.num_generated, counters.num_generated + size - 1);
        counters.num_generated += size;
        Some(range)
    }

    pub fn increase_result_count(&self, count: u64) {
        let mut counters = self.counters.lock();
        counters.received_result_count += count;
        self.progress.set_position(counters.received_result_count.min(self.work_count));
    }

    pub fn finish(&self) {
        self.progress.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn process(mode: ParticleMode, work_count: u64, granularity: u64, workers: usize) -> ParticleProcess {
        ParticleProcess::new(mode, work_count, granularity, workers, "test")
            .with_progress_bar(ProgressBar::hidden())
    }

    fn drain(process: &ParticleProcess) -> Vec<WorkRange> {
        let mut ranges = Vec::new();
        while let Some(range) = process.generate_work(0) {
            ranges.push(range);
        }
        ranges
    }

    #[test]
    fn test_trace_ranges_cover_work_exactly() {
        for &(work_count, granularity, workers) in &[(100, 7, 1), (1, 0, 8), (1000, 0, 3), (64, 64, 2), (65, 64, 2)] {
            let process = process(ParticleMode::Trace, work_count, granularity, workers);
            let ranges = drain(&process);
            let mut expected = 0;
            for range in &ranges {
                assert_eq!(range.start(), expected);
                assert!(range.len() <= process.granularity());
                expected = range.end() + 1;
            }
            assert_eq!(expected, work_count);
            assert_eq!(process.num_generated(), work_count);
            assert!(process.is_exhausted());
            assert!(process.generate_work(0).is_none());
        }
    }

    #[test]
    fn test_default_granularity_single_particle_ranges() {
        let process = process(ParticleMode::Trace, 100, 0, 4);
        assert_eq!(process.granularity(), 1);
        let ranges = drain(&process);
        assert_eq!(ranges.len(), 100);
        assert!(ranges.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_default_granularity_scales_with_workers() {
        assert_eq!(process(ParticleMode::Trace, 6400, 0, 4).granularity(), 100);
        assert_eq!(process(ParticleMode::Trace, 10, 0, 0).granularity(), 1);
    }

    #[test]
    fn test_gather_keeps_generating_until_results_arrive() {
        let process = process(ParticleMode::Gather, 10, 4, 1);
        for i in 0..5 {
            let range = process.generate_work(0).expect("gather mode must keep generating");
            assert_eq!(range.start(), 4 * i);
            assert_eq!(range.len(), 4);
        }
        assert_eq!(process.num_generated(), 20);
        assert!(!process.is_exhausted());

        process.increase_result_count(9);
        assert!(process.generate_work(0).is_some());
        process.increase_result_count(1);
        assert!(process.generate_work(0).is_none());
        assert_eq!(process.num_generated(), 24);
    }

    #[test]
    fn test_concurrent_result_counting() {
        let process = Arc::new(process(ParticleMode::Gather, 1_000_000, 1, 8));
        let handles: Vec<_> = (0..8).map(|worker| {
            let process = Arc::clone(&process);
            thread::spawn(move || {
                for i in 0..1000u64 {
                    process.increase_result_count((i + worker) % 3);
                }
            })
        }).collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let expected: u64 = (0..8u64).map(|w| (0..1000u64).map(|i| (i + w) % 3).sum::<u64>()).sum();
        assert_eq!(process.received_result_count(), expected);
        assert_eq!(process.progress().position(), expected);
    }

    #[test]
    fn test_progress_is_clamped() {
        let process = process(ParticleMode::Gather, 5, 2, 1);
        process.increase_result_count(3);
        assert_eq!(process.progress().position(), 3);
        process.increase_result_count(10);
        assert_eq!(process.progress().position(), 5);
        assert_eq!(process.received_result_count(), 13);
    }
}
