use std::{
    fs,
    sync::atomic::{AtomicUsize, Ordering},
};

use composer::{LabelRecord, SampleBuilder};
use indicatif::ProgressBar;
use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use rand_xoshiro::SplitMix64;
use rayon::{ThreadPoolBuilder, prelude::*};

use crate::{
    assets::ImageSet,
    config::{FailurePolicy, GenCfg},
    error::GenError,
    io::{LabelStore, save_sample},
};

const HEADROOM: usize = 4;
const FALLBACK_PARALLELISM: usize = 28;

/// Pool size for `samples` tasks: one thread per core plus a little
/// headroom for tasks blocked on encoding, never more than there are tasks.
pub fn worker_count(samples: usize, requested: Option<usize>) -> usize {
    let limit = requested.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_PARALLELISM)
            + HEADROOM
    });
    samples.min(limit).max(1)
}

pub fn sample_seeds(base: u64, count: usize) -> Vec<u64> {
    let mut sm = SplitMix64::seed_from_u64(base);
    (0..count).map(|_| sm.next_u64()).collect()
}

#[derive(Debug)]
pub struct BatchReport {
    pub requested: usize,
    pub written: usize,
    pub failures: Vec<GenError>,
    /// Batches in the store after the append, `None` when nothing was appended.
    pub stored_batches: Option<usize>,
}

/// Builds one batch of samples on a bounded pool and appends their labels
/// to the store once every task has finished.
pub struct BatchGenerator<'a> {
    images: &'a ImageSet,
    cfg: &'a GenCfg,
    completed: AtomicUsize,
    progress: ProgressBar,
}

impl<'a> BatchGenerator<'a> {
    pub fn new(images: &'a ImageSet, cfg: &'a GenCfg) -> Self {
        Self {
            images,
            cfg,
            completed: AtomicUsize::new(0),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Samples finished so far in this generator, failed ones included.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn run(&self) -> Result<BatchReport, GenError> {
        let n = self.cfg.samples;
        let out_dir = &self.cfg.out_dir;
        fs::create_dir_all(out_dir).map_err(|source| GenError::OutputDir {
            dir: out_dir.clone(),
            source,
        })?;

        if n == 0 {
            log::info!("nothing to generate");
            return Ok(BatchReport {
                requested: 0,
                written: 0,
                failures: Vec::new(),
                stored_batches: None,
            });
        }

        let workers = worker_count(n, self.cfg.workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("synthgen-{i}"))
            .build()?;

        let base_seed = self.cfg.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("generating {n} samples on {workers} workers (seed {base_seed})");

        let seeds = sample_seeds(base_seed, n);
        let results: Vec<Result<LabelRecord, GenError>> = pool.install(|| {
            seeds
                .par_iter()
                .map(|&seed| {
                    let result = self.create_sample(seed);
                    self.completed.fetch_add(1, Ordering::Relaxed);
                    self.progress.inc(1);
                    result
                })
                .collect()
        });
        self.progress.finish_and_clear();

        let (records, failures): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
        let records: Vec<LabelRecord> = records.into_iter().filter_map(Result::ok).collect();
        let mut failures: Vec<GenError> = failures.into_iter().filter_map(Result::err).collect();

        if !failures.is_empty() && self.cfg.failure_policy == FailurePolicy::Abort {
            let failed = failures.len();
            return Err(GenError::BatchAborted {
                failed,
                total: n,
                first: Box::new(failures.swap_remove(0)),
            });
        }
        for err in &failures {
            log::warn!("skipped sample: {err}");
        }

        let written = records.len();
        let stored_batches = if records.is_empty() {
            log::warn!("no samples succeeded, label store left unchanged");
            None
        } else {
            let store = LabelStore::in_dir(out_dir);
            let batches = store.append(records)?;
            log::info!(
                "wrote {written} samples, {} now holds {batches} batches",
                store.path().display()
            );
            Some(batches)
        };

        Ok(BatchReport {
            requested: n,
            written,
            failures,
            stored_batches,
        })
    }

    fn create_sample(&self, seed: u64) -> Result<LabelRecord, GenError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let sample = SampleBuilder::new(&self.images.cards, &self.images.backgrounds)
            .draw_boxes(self.cfg.draw_boxes)
            .build(&mut rng)?;
        let path = save_sample(&self.cfg.out_dir, &sample)?;
        log::debug!(
            "saved {} with {} cards",
            path.display(),
            sample.record.input_images.len()
        );
        Ok(sample.record)
    }
}
