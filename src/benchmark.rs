//! Throughput of the train function over a ramp of batch sizes.

use crate::error::{Error, Result};
use crate::trainer::TrainFn;
use burn::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Config, Debug, PartialEq)]
pub struct BatchSweep {
    /// First batch size, also the increment between batch sizes.
    pub starting_batch_size: usize,
    /// Number of batch sizes.
    pub runs: usize,
    /// Timed runs per batch size.
    #[config(default = 1)]
    pub reps: usize,
}

impl BatchSweep {
    /// Images needed by the largest batch.
    pub fn num_images(&self) -> usize {
        self.starting_batch_size * self.runs
    }

    /// `s, 2s, ..., runs * s`
    pub fn batch_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.runs).map(|run| run * self.starting_batch_size)
    }

    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("starting batch size", self.starting_batch_size),
            ("runs", self.runs),
            ("reps", self.reps),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);
        match zero {
            Some((name, _)) => Err(Error::InvalidSweep(format!("{name} must be positive"))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStat {
    pub batch_size: usize,
    pub run_time: Duration,
    pub images_per_second: f64,
}

impl RunStat {
    pub fn new(batch_size: usize, run_time: Duration) -> Self {
        let secs = run_time.as_secs_f64();
        let images_per_second = if secs > 0. {
            batch_size as f64 / secs
        } else {
            f64::INFINITY
        };
        Self {
            batch_size,
            run_time,
            images_per_second,
        }
    }
}

impl fmt::Display for RunStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} images in {:.3} seconds: {:.1} / sec",
            self.batch_size,
            self.run_time.as_secs_f64(),
            self.images_per_second
        )
    }
}

/// Wall time of a single call to the train function.
///
/// The train function returns the scalar loss, which waits for the backend.
pub fn timed_training_run<B: Backend, T: TrainFn<B>>(
    images: Tensor<B, 4>,
    train_fn: &mut T,
) -> Duration {
    let mark = Instant::now();
    let loss = train_fn.train_batch(images);
    let elapsed = mark.elapsed();
    tracing::debug!("loss {loss:.5} in {elapsed:?}");
    elapsed
}

/// Times the train function `reps` times for every batch size of the sweep,
/// each time on the first `batch_size` images.
///
/// `on_run` sees every stat as soon as it is measured.
pub fn sweep<B, T, F>(
    images: &Tensor<B, 4>,
    train_fn: &mut T,
    sweep: &BatchSweep,
    mut on_run: F,
) -> Result<Vec<RunStat>>
where
    B: Backend,
    T: TrainFn<B>,
    F: FnMut(&RunStat),
{
    sweep.validate()?;
    let [available, ..] = images.dims();
    if available < sweep.num_images() {
        return Err(Error::NotEnoughImages {
            requested: sweep.num_images(),
            available,
        });
    }

    let mut run_stats = Vec::with_capacity(sweep.runs * sweep.reps);
    for batch_size in sweep.batch_sizes() {
        let batch = images.clone().narrow(0, 0, batch_size);
        for _ in 0..sweep.reps {
            let run_time = timed_training_run(batch.clone(), train_fn);
            let stat = RunStat::new(batch_size, run_time);
            on_run(&stat);
            run_stats.push(stat);
        }
    }
    Ok(run_stats)
}
