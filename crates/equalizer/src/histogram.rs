//! Per-channel intensity histograms.
//!
//! [`ChannelHistogram`] is the one shared mutable structure of a frame. Its
//! buckets are atomic counters, so workers may increment colliding buckets
//! concurrently without losing updates. Once every worker has joined, the
//! histogram is consumed into a [`HistogramSnapshot`]; taking it by value is
//! what guarantees no writer can still touch it during the mapping stage.
//!
//! [`LocalHistogram`] is the plain, single-owner table a worker fills when
//! partial histograms are merged instead of incremented in place.

use std::sync::atomic::{AtomicU64, Ordering};

use equalize_common::{checked_bucket, Channel, EqualizeError, EqualizeResult, CHANNEL_COUNT, INTENSITY_LEVELS};
use serde::Serialize;

/// Raw bucket counts: `counts[channel][intensity]`.
pub type BucketCounts = [[u64; INTENSITY_LEVELS]; CHANNEL_COUNT];

/// Shared histogram with exact concurrent accumulation.
#[derive(Debug)]
pub struct ChannelHistogram {
    buckets: [[AtomicU64; INTENSITY_LEVELS]; CHANNEL_COUNT],
}

impl Default for ChannelHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHistogram {
    pub fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| std::array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    /// Zero all 768 buckets.
    pub fn reset(&self) {
        for bucket in self.buckets.iter().flatten() {
            bucket.store(0, Ordering::Relaxed);
        }
    }

    /// Add one to `counts[channel][intensity]`.
    ///
    /// Fails with `InvalidIndex` when `channel` is outside `[0, 2]` or
    /// `intensity` outside `[0, 255]`.
    pub fn increment(&self, channel: usize, intensity: usize) -> EqualizeResult<()> {
        let (channel, intensity) = checked_bucket(channel, intensity)?;
        self.record(channel, intensity);
        Ok(())
    }

    /// Typed increment; cannot be out of range.
    #[inline(always)]
    pub fn record(&self, channel: Channel, intensity: u8) {
        // Addition commutes, and the stage barrier (worker join) orders every
        // increment before the snapshot is read, so relaxed is enough.
        self.buckets[channel.index()][intensity as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Count the three channel bytes at the start of `pixel`.
    #[inline(always)]
    pub fn record_pixel(&self, pixel: &[u8]) {
        self.record(Channel::Red, pixel[0]);
        self.record(Channel::Green, pixel[1]);
        self.record(Channel::Blue, pixel[2]);
    }

    /// Add a worker's partial counts into the shared buckets.
    pub fn merge(&self, local: &LocalHistogram) {
        for (shared_row, local_row) in self.buckets.iter().zip(local.counts.iter()) {
            for (bucket, &count) in shared_row.iter().zip(local_row.iter()) {
                if count > 0 {
                    bucket.fetch_add(count, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn count(&self, channel: Channel, intensity: u8) -> u64 {
        self.buckets[channel.index()][intensity as usize].load(Ordering::Relaxed)
    }

    /// Freeze the histogram. Consuming `self` ends the accumulation phase.
    pub fn into_snapshot(self) -> HistogramSnapshot {
        let counts: BucketCounts = self
            .buckets
            .map(|row| row.map(|bucket| bucket.into_inner()));
        let total = counts[0].iter().sum();
        debug_assert!(
            counts.iter().all(|row| row.iter().sum::<u64>() == total),
            "every pixel must contribute one count per channel"
        );
        HistogramSnapshot { counts, total }
    }
}

/// Worker-private histogram, merged into the shared one when the worker is done.
#[derive(Debug, Clone)]
pub struct LocalHistogram {
    counts: BucketCounts,
}

impl Default for LocalHistogram {
    fn default() -> Self {
        Self {
            counts: [[0; INTENSITY_LEVELS]; CHANNEL_COUNT],
        }
    }
}

impl LocalHistogram {
    #[inline(always)]
    pub fn record_pixel(&mut self, pixel: &[u8]) {
        self.counts[0][pixel[0] as usize] += 1;
        self.counts[1][pixel[1] as usize] += 1;
        self.counts[2][pixel[2] as usize] += 1;
    }

    /// Elementwise sum, used to combine partials pairwise.
    pub fn absorb(mut self, other: LocalHistogram) -> Self {
        for (row, other_row) in self.counts.iter_mut().zip(other.counts.iter()) {
            for (count, &other_count) in row.iter_mut().zip(other_row.iter()) {
                *count += other_count;
            }
        }
        self
    }
}

/// Summary of one channel's distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStats {
    pub channel: Channel,
    pub min: u8,
    pub max: u8,
    pub distinct_levels: usize,
    pub mean: f64,
}

/// Read-only histogram handed to the mapping stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSnapshot {
    counts: BucketCounts,
    total: u64,
}

impl HistogramSnapshot {
    /// Build a snapshot from raw counts.
    ///
    /// Every channel must account for the same number of pixels, and that
    /// number must be non-zero.
    pub fn from_counts(counts: BucketCounts) -> EqualizeResult<Self> {
        let totals: Vec<u64> = counts.iter().map(|row| row.iter().sum()).collect();
        let total = totals[0];
        if total == 0 {
            return Err(EqualizeError::InvalidInput(
                "histogram holds no pixels".to_string(),
            ));
        }
        if totals.iter().any(|&t| t != total) {
            return Err(EqualizeError::InvalidInput(format!(
                "channel totals disagree: {:?}",
                totals
            )));
        }
        Ok(Self { counts, total })
    }

    pub fn counts(&self, channel: Channel) -> &[u64; INTENSITY_LEVELS] {
        &self.counts[channel.index()]
    }

    pub fn raw_counts(&self) -> &BucketCounts {
        &self.counts
    }

    pub fn count(&self, channel: Channel, intensity: u8) -> u64 {
        self.counts[channel.index()][intensity as usize]
    }

    /// Number of pixels in the image the histogram was built from.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn channel_total(&self, channel: Channel) -> u64 {
        self.counts(channel).iter().sum()
    }

    /// Cumulative counts: `cdf[i]` is the number of pixels with intensity `<= i`.
    pub fn cdf(&self, channel: Channel) -> [u64; INTENSITY_LEVELS] {
        let mut cdf = [0u64; INTENSITY_LEVELS];
        let mut running = 0u64;
        for (slot, &count) in cdf.iter_mut().zip(self.counts(channel).iter()) {
            running += count;
            *slot = running;
        }
        cdf
    }

    /// Cumulative count at the first occupied intensity level.
    pub fn cdf_min(&self, channel: Channel) -> Option<u64> {
        self.counts(channel).iter().copied().find(|&c| c > 0)
    }

    pub fn min_intensity(&self, channel: Channel) -> Option<u8> {
        self.counts(channel)
            .iter()
            .position(|&c| c > 0)
            .map(|i| i as u8)
    }

    pub fn max_intensity(&self, channel: Channel) -> Option<u8> {
        self.counts(channel)
            .iter()
            .rposition(|&c| c > 0)
            .map(|i| i as u8)
    }

    pub fn distinct_levels(&self, channel: Channel) -> usize {
        self.counts(channel).iter().filter(|&&c| c > 0).count()
    }

    /// A channel whose pixels all share one intensity.
    pub fn is_degenerate(&self, channel: Channel) -> bool {
        self.distinct_levels(channel) <= 1
    }

    pub fn stats(&self, channel: Channel) -> ChannelStats {
        let counts = self.counts(channel);
        let weighted: u64 = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| i as u64 * c)
            .sum();
        ChannelStats {
            channel,
            min: self.min_intensity(channel).unwrap_or(0),
            max: self.max_intensity(channel).unwrap_or(0),
            distinct_levels: self.distinct_levels(channel),
            mean: if self.total > 0 {
                weighted as f64 / self.total as f64
            } else {
                0.0
            },
        }
    }

    pub fn all_stats(&self) -> [ChannelStats; CHANNEL_COUNT] {
        Channel::ALL.map(|channel| self.stats(channel))
    }
}
