use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of heater outputs on the board.
pub const CHANNEL_COUNT: usize = 4;

pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed-point value in hundredths, the representation used on the wire and
/// in the persisted configuration image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const SCALE: f32 = 100.0;

    /// Truncates toward zero. NaN maps to zero and out of range values saturate.
    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::SCALE) as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl From<i32> for Fixed {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_f32())
    }
}

/// Stable identity of an output channel, always below [`CHANNEL_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelIndex(u8);

impl ChannelIndex {
    pub fn new(index: usize) -> Result<Self> {
        if index < CHANNEL_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(Error::ChannelOutOfRange)
        }
    }

    /// For array slots, which are in range by construction.
    pub(crate) fn from_slot(slot: usize) -> Self {
        debug_assert!(slot < CHANNEL_COUNT);
        Self(slot as u8)
    }

    pub fn all() -> impl Iterator<Item = ChannelIndex> {
        (0..CHANNEL_COUNT as u8).map(ChannelIndex)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<i32> for ChannelIndex {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        usize::try_from(value)
            .map_err(|_| Error::ChannelOutOfRange)
            .and_then(Self::new)
    }
}

impl fmt::Display for ChannelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_truncates_toward_zero() {
        assert_eq!(Fixed::from_f32(9.267), Fixed(926));
        assert_eq!(Fixed::from_f32(-1.239), Fixed(-123));
        assert_eq!(Fixed::from_f32(f32::NAN), Fixed(0));
    }

    #[test]
    fn test_fixed_to_f32() {
        assert_eq!(Fixed(250).to_f32(), 2.5);
        assert_eq!(Fixed(-75).to_f32(), -0.75);
    }

    #[test]
    fn test_channel_index_bounds() {
        assert!(ChannelIndex::new(3).is_ok());
        assert_eq!(ChannelIndex::new(4), Err(Error::ChannelOutOfRange));
        assert_eq!(ChannelIndex::try_from(-1), Err(Error::ChannelOutOfRange));
        assert_eq!(ChannelIndex::try_from(2).map(ChannelIndex::as_usize), Ok(2));
        assert_eq!(ChannelIndex::all().count(), CHANNEL_COUNT);
    }
}
