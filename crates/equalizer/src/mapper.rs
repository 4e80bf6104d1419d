//! Cumulative-distribution remapping tables.

use std::fmt;
use std::str::FromStr;

use equalize_common::{Channel, CHANNEL_COUNT, INTENSITY_LEVELS, MAX_INTENSITY};
use serde::{Deserialize, Serialize};

use crate::histogram::HistogramSnapshot;

/// How cumulative counts are turned into output intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// `round((cdf[i] - cdf_min) / (total - cdf_min) * 255)`: the darkest
    /// occupied level maps to 0 and the brightest to 255.
    #[default]
    Normalized,
    /// `floor(cdf[i] * 255 / total)`: no black-point shift, the darkest
    /// occupied level keeps its share of the range.
    Cumulative,
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingMode::Normalized => "normalized",
            MappingMode::Cumulative => "cumulative",
        })
    }
}

impl FromStr for MappingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normalized" => Ok(MappingMode::Normalized),
            "cumulative" => Ok(MappingMode::Cumulative),
            other => Err(format!("unknown mapping mode: {}", other)),
        }
    }
}

/// Tie-breaking for `Normalized` mapping when the scaled value is exactly `.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    #[default]
    HalfUp,
    HalfEven,
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rounding::HalfUp => "half_up",
            Rounding::HalfEven => "half_even",
        })
    }
}

impl FromStr for Rounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "half_up" => Ok(Rounding::HalfUp),
            "half_even" => Ok(Rounding::HalfEven),
            other => Err(format!("unknown rounding mode: {}", other)),
        }
    }
}

/// Per-channel lookup tables: `map[channel][input] -> output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    map: [[u8; INTENSITY_LEVELS]; CHANNEL_COUNT],
    degenerate: [bool; CHANNEL_COUNT],
}

impl MappingTable {
    /// Table that leaves every intensity unchanged.
    pub fn identity() -> Self {
        Self {
            map: [identity_row(); CHANNEL_COUNT],
            degenerate: [false; CHANNEL_COUNT],
        }
    }

    #[inline(always)]
    pub fn get(&self, channel: Channel, intensity: u8) -> u8 {
        self.map[channel.index()][intensity as usize]
    }

    pub fn channel(&self, channel: Channel) -> &[u8; INTENSITY_LEVELS] {
        &self.map[channel.index()]
    }

    pub fn is_identity(&self, channel: Channel) -> bool {
        *self.channel(channel) == identity_row()
    }

    /// Whether the channel took the single-intensity identity path.
    pub fn is_degenerate(&self, channel: Channel) -> bool {
        self.degenerate[channel.index()]
    }

    pub fn degenerate_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|&c| self.is_degenerate(c))
            .collect()
    }
}

fn identity_row() -> [u8; INTENSITY_LEVELS] {
    std::array::from_fn(|i| i as u8)
}

/// Derives mapping tables from a frozen histogram. Pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualizationMapper {
    mode: MappingMode,
    rounding: Rounding,
}

impl EqualizationMapper {
    pub fn new(mode: MappingMode, rounding: Rounding) -> Self {
        Self { mode, rounding }
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn map(&self, histogram: &HistogramSnapshot) -> MappingTable {
        let mut table = MappingTable::identity();
        for channel in Channel::ALL {
            let (row, degenerate) = self.map_channel(histogram, channel);
            table.map[channel.index()] = row;
            table.degenerate[channel.index()] = degenerate;
        }
        table
    }

    /// One channel's table and whether it was degenerate.
    pub fn map_channel(
        &self,
        histogram: &HistogramSnapshot,
        channel: Channel,
    ) -> ([u8; INTENSITY_LEVELS], bool) {
        let total = histogram.channel_total(channel);
        let cdf_min = match histogram.cdf_min(channel) {
            Some(min) if min < total => min,
            // Empty or single-spike channel: keep intensities as they are.
            _ => return (identity_row(), true),
        };

        let cdf = histogram.cdf(channel);
        let row = match self.mode {
            MappingMode::Normalized => cdf.map(|c| {
                scale_rounded(c.saturating_sub(cdf_min), total - cdf_min, self.rounding)
            }),
            MappingMode::Cumulative => cdf.map(|c| scale_floor(c, total)),
        };
        (row, false)
    }
}

/// `round(numerator / denominator * 255)` in exact integer arithmetic.
fn scale_rounded(numerator: u64, denominator: u64, rounding: Rounding) -> u8 {
    let product = numerator as u128 * MAX_INTENSITY as u128;
    let denominator = denominator as u128;
    let quotient = product / denominator;
    let twice_remainder = 2 * (product % denominator);
    let rounded = match rounding {
        Rounding::HalfUp => quotient + u128::from(twice_remainder >= denominator),
        Rounding::HalfEven => {
            let round_up = twice_remainder > denominator
                || (twice_remainder == denominator && quotient % 2 == 1);
            quotient + u128::from(round_up)
        }
    };
    rounded.min(MAX_INTENSITY as u128) as u8
}

fn scale_floor(numerator: u64, denominator: u64) -> u8 {
    let scaled = numerator as u128 * MAX_INTENSITY as u128 / denominator as u128;
    scaled.min(MAX_INTENSITY as u128) as u8
}
