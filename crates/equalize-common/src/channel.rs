//! Color channels and intensity levels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EqualizeError, EqualizeResult};

/// Number of equalized channels (R, G, B).
pub const CHANNEL_COUNT: usize = 3;

/// Number of intensity levels per channel (8-bit).
pub const INTENSITY_LEVELS: usize = 256;

/// Highest intensity value.
pub const MAX_INTENSITY: u8 = u8::MAX;

/// One of the three independently equalized color components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All channels in pixel byte order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Byte offset of this channel inside a pixel, also its histogram row.
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    /// Channel for a raw index, failing with `InvalidIndex` outside `[0, 2]`.
    pub fn from_index(index: usize) -> EqualizeResult<Self> {
        match index {
            0 => Ok(Channel::Red),
            1 => Ok(Channel::Green),
            2 => Ok(Channel::Blue),
            _ => Err(EqualizeError::InvalidIndex {
                channel: index,
                intensity: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for Channel {
    type Error = EqualizeError;

    fn try_from(index: usize) -> EqualizeResult<Self> {
        Channel::from_index(index)
    }
}

/// Validate a raw `(channel, intensity)` pair and return it in typed form.
pub fn checked_bucket(channel: usize, intensity: usize) -> EqualizeResult<(Channel, u8)> {
    if channel >= CHANNEL_COUNT || intensity >= INTENSITY_LEVELS {
        return Err(EqualizeError::InvalidIndex { channel, intensity });
    }
    Ok((Channel::from_index(channel)?, intensity as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index_roundtrip() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
            assert_eq!(Channel::from_index(i).unwrap(), *channel);
        }
    }

    #[test]
    fn test_channel_out_of_range() {
        assert_eq!(
            Channel::try_from(3),
            Err(EqualizeError::InvalidIndex { channel: 3, intensity: 0 })
        );
    }

    #[test]
    fn test_checked_bucket() {
        assert_eq!(checked_bucket(2, 255).unwrap(), (Channel::Blue, 255));
        assert!(matches!(
            checked_bucket(0, 256),
            Err(EqualizeError::InvalidIndex { channel: 0, intensity: 256 })
        ));
        assert!(checked_bucket(3, 10).is_err());
    }
}
