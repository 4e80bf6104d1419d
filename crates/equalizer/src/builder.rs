//! Parallel histogram accumulation.
//!
//! The image is split into bands of whole rows; each band is one rayon task.
//! Two accumulation strategies are available for the parallel case:
//!
//! - **Atomic**: every task increments the shared [`ChannelHistogram`]
//!   directly. Colliding buckets are resolved by the atomic counters.
//! - **LocalMerge**: every task fills a private [`LocalHistogram`]; partials
//!   are reduced pairwise and the result is merged into the shared histogram
//!   once.
//!
//! In both cases rayon's join is the stage barrier: `build` only returns after
//! every task has finished, and the histogram is frozen before anyone reads it.

use std::fmt;
use std::str::FromStr;

use equalize_common::{Channel, EqualizeError, EqualizeResult, ImageView, INTENSITY_LEVELS};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::histogram::{ChannelHistogram, HistogramSnapshot, LocalHistogram};

/// Bands per worker when the caller does not pick a band height.
const BANDS_PER_WORKER: usize = 4;

/// How workers combine their counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationStrategy {
    /// Shared atomic buckets, incremented in place.
    Atomic,
    /// Worker-private tables reduced by elementwise addition.
    #[default]
    LocalMerge,
    /// Single thread; the reference result.
    Sequential,
}

impl AccumulationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccumulationStrategy::Atomic => "atomic",
            AccumulationStrategy::LocalMerge => "local_merge",
            AccumulationStrategy::Sequential => "sequential",
        }
    }
}

impl fmt::Display for AccumulationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccumulationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "atomic" => Ok(AccumulationStrategy::Atomic),
            "local_merge" | "local" => Ok(AccumulationStrategy::LocalMerge),
            "sequential" | "serial" => Ok(AccumulationStrategy::Sequential),
            other => Err(format!("unknown accumulation strategy: {}", other)),
        }
    }
}

/// Histogram stage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub strategy: AccumulationStrategy,
    /// Rows per task. `None` derives it from the worker count.
    pub rows_per_task: Option<usize>,
    /// Rebuild sequentially and compare bucket by bucket.
    pub verify: bool,
}

/// Scans an image and produces its frozen per-channel histogram.
#[derive(Debug, Clone, Default)]
pub struct HistogramBuilder {
    config: BuilderConfig,
}

impl HistogramBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Count every pixel of `image` exactly once per channel.
    ///
    /// Fails with `InvalidInput` for empty or malformed images, and with
    /// `AccumulationMismatch` when verification is on and the parallel result
    /// differs from the sequential one.
    pub fn build(&self, image: &ImageView<'_>) -> EqualizeResult<HistogramSnapshot> {
        image.validate()?;

        let histogram = ChannelHistogram::new();
        let rows_per_task = self.rows_per_task(image.height() as usize);

        match self.config.strategy {
            AccumulationStrategy::Sequential => accumulate_sequential(&histogram, image),
            AccumulationStrategy::Atomic => accumulate_atomic(&histogram, image, rows_per_task),
            AccumulationStrategy::LocalMerge => {
                accumulate_local_merge(&histogram, image, rows_per_task)
            }
        }

        let snapshot = histogram.into_snapshot();

        tracing::debug!(
            strategy = %self.config.strategy,
            rows_per_task,
            pixels = snapshot.total(),
            "Histogram accumulated"
        );

        if self.config.verify && self.config.strategy != AccumulationStrategy::Sequential {
            let reference = ChannelHistogram::new();
            accumulate_sequential(&reference, image);
            compare_with_reference(&snapshot, &reference.into_snapshot())?;
        }

        Ok(snapshot)
    }

    fn rows_per_task(&self, height: usize) -> usize {
        let rows = match self.config.rows_per_task {
            Some(rows) => rows,
            None => height / (rayon::current_num_threads() * BANDS_PER_WORKER),
        };
        rows.clamp(1, height.max(1))
    }
}

/// Bytes per parallel band. Never zero, never overflows.
fn band_bytes(image: &ImageView<'_>, rows_per_task: usize) -> usize {
    image.row_bytes().saturating_mul(rows_per_task).max(1)
}

fn accumulate_sequential(histogram: &ChannelHistogram, image: &ImageView<'_>) {
    let mut local = LocalHistogram::default();
    for pixel in image.as_bytes().chunks_exact(image.layout().bytes_per_pixel()) {
        local.record_pixel(pixel);
    }
    histogram.merge(&local);
}

fn accumulate_atomic(histogram: &ChannelHistogram, image: &ImageView<'_>, rows_per_task: usize) {
    let bpp = image.layout().bytes_per_pixel();
    image
        .as_bytes()
        .par_chunks(band_bytes(image, rows_per_task))
        .for_each(|band| {
            for pixel in band.chunks_exact(bpp) {
                histogram.record_pixel(pixel);
            }
        });
}

fn accumulate_local_merge(
    histogram: &ChannelHistogram,
    image: &ImageView<'_>,
    rows_per_task: usize,
) {
    let bpp = image.layout().bytes_per_pixel();
    let merged = image
        .as_bytes()
        .par_chunks(band_bytes(image, rows_per_task))
        .fold(LocalHistogram::default, |mut local, band| {
            for pixel in band.chunks_exact(bpp) {
                local.record_pixel(pixel);
            }
            local
        })
        .reduce(LocalHistogram::default, LocalHistogram::absorb);
    histogram.merge(&merged);
}

/// First bucket where the two histograms disagree becomes the error.
fn compare_with_reference(
    parallel: &HistogramSnapshot,
    reference: &HistogramSnapshot,
) -> EqualizeResult<()> {
    for channel in Channel::ALL {
        for intensity in 0..INTENSITY_LEVELS {
            let p = parallel.counts(channel)[intensity];
            let r = reference.counts(channel)[intensity];
            if p != r {
                tracing::warn!(
                    channel = %channel,
                    intensity,
                    parallel = p,
                    reference = r,
                    "Parallel histogram disagrees with sequential reference"
                );
                return Err(EqualizeError::AccumulationMismatch {
                    channel: channel.index(),
                    intensity,
                    parallel: p,
                    reference: r,
                });
            }
        }
    }
    Ok(())
}
