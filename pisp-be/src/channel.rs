//! Channel identities and per-channel containers.
//!
//! Every client group owns the same fixed set of channels. Source images
//! come first, then captures, then the config channel last:
//!
//! | Channel | Direction | Hardware block |
//! |---------|-----------|----------------|
//! | [`ChannelId::MainInput`] | in | Bayer or RGB input, up to 3 planes |
//! | [`ChannelId::TdnInput`] | in | Temporal denoise history |
//! | [`ChannelId::StitchInput`] | in | HDR stitch history |
//! | [`ChannelId::HogOutput`] | out | HoG detection statistics |
//! | [`ChannelId::Output0`] / [`ChannelId::Output1`] | out | Image outputs, up to 3 planes |
//! | [`ChannelId::TdnOutput`] | out | Temporal denoise write-back |
//! | [`ChannelId::StitchOutput`] | out | HDR stitch write-back |
//! | [`ChannelId::Config`] | in | Per-job configuration |

use core::fmt;
use core::ops::{Index, IndexMut};

use bitflags::bitflags;

use crate::constants::NUM_CHANNELS;

/// One logical buffer stream of a client group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    MainInput = 0,
    TdnInput = 1,
    StitchInput = 2,
    HogOutput = 3,
    Output0 = 4,
    Output1 = 5,
    TdnOutput = 6,
    StitchOutput = 7,
    Config = 8,
}

impl ChannelId {
    /// All channels, in hardware job order.
    pub const ALL: [ChannelId; NUM_CHANNELS] = [
        ChannelId::MainInput,
        ChannelId::TdnInput,
        ChannelId::StitchInput,
        ChannelId::HogOutput,
        ChannelId::Output0,
        ChannelId::Output1,
        ChannelId::TdnOutput,
        ChannelId::StitchOutput,
        ChannelId::Config,
    ];

    /// Position of this channel in [`ChannelId::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The image output channel with the given output number.
    pub const fn output(n: usize) -> Option<ChannelId> {
        match n {
            0 => Some(ChannelId::Output0),
            1 => Some(ChannelId::Output1),
            _ => None,
        }
    }

    /// Streaming-map bit for this channel.
    pub const fn bit(self) -> ChannelSet {
        ChannelSet::from_bits_truncate(1 << self as u16)
    }


    /// Short name used in log messages.
    pub const fn name(self) -> &'static str {
        match self {
            ChannelId::MainInput => "input",
            ChannelId::TdnInput => "tdn_input",
            ChannelId::StitchInput => "stitch_input",
            ChannelId::HogOutput => "hog_output",
            ChannelId::Output0 => "output0",
            ChannelId::Output1 => "output1",
            ChannelId::TdnOutput => "tdn_output",
            ChannelId::StitchOutput => "stitch_output",
            ChannelId::Config => "config",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of channels, used as the per-group streaming map.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelSet: u16 {
        const MAIN_INPUT = 1 << 0;
        const TDN_INPUT = 1 << 1;
        const STITCH_INPUT = 1 << 2;
        const HOG_OUTPUT = 1 << 3;
        const OUTPUT0 = 1 << 4;
        const OUTPUT1 = 1 << 5;
        const TDN_OUTPUT = 1 << 6;
        const STITCH_OUTPUT = 1 << 7;
        const CONFIG = 1 << 8;
    }
}

impl ChannelSet {
    /// Channels that must both stream before any job can form.
    pub const MINIMUM: ChannelSet = ChannelSet::CONFIG.union(ChannelSet::MAIN_INPUT);

    /// Whether `channel` is a member of this set.
    pub fn has(self, channel: ChannelId) -> bool {
        self.contains(channel.bit())
    }
}

/// A value for every channel, indexed by [`ChannelId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap<T> {
    slots: [T; NUM_CHANNELS],
}

impl<T> ChannelMap<T> {
    /// Build a map by evaluating `f` for each channel in order.
    pub fn from_fn(mut f: impl FnMut(ChannelId) -> T) -> Self {
        ChannelMap {
            slots: core::array::from_fn(|i| f(ChannelId::ALL[i])),
        }
    }

    /// Iterate over `(channel, value)` pairs in hardware job order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &T)> {
        ChannelId::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T: Default> Default for ChannelMap<T> {
    fn default() -> Self {
        ChannelMap::from_fn(|_| T::default())
    }
}

impl<T> Index<ChannelId> for ChannelMap<T> {
    type Output = T;

    fn index(&self, channel: ChannelId) -> &T {
        &self.slots[channel.index()]
    }
}

impl<T> IndexMut<ChannelId> for ChannelMap<T> {
    fn index_mut(&mut self, channel: ChannelId) -> &mut T {
        &mut self.slots[channel.index()]
    }
}

impl<T> IntoIterator for ChannelMap<T> {
    type Item = (ChannelId, T);
    type IntoIter = core::iter::Zip<
        core::array::IntoIter<ChannelId, NUM_CHANNELS>,
        core::array::IntoIter<T, NUM_CHANNELS>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        ChannelId::ALL.into_iter().zip(self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_index_order() {
        for (i, channel) in ChannelId::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn bits_are_distinct() {
        let mut seen = ChannelSet::empty();
        for channel in ChannelId::ALL {
            assert!(!seen.has(channel));
            seen |= channel.bit();
        }
        assert_eq!(seen, ChannelSet::all());
    }

    #[test]
    fn minimum_set_is_config_and_main_input() {
        assert!(ChannelSet::MINIMUM.has(ChannelId::Config));
        assert!(ChannelSet::MINIMUM.has(ChannelId::MainInput));
        assert!(!ChannelSet::MINIMUM.has(ChannelId::Output0));
    }

    #[test]
    fn output_lookup() {
        assert_eq!(ChannelId::output(0), Some(ChannelId::Output0));
        assert_eq!(ChannelId::output(1), Some(ChannelId::Output1));
        assert_eq!(ChannelId::output(2), None);
    }

    #[test]
    fn map_index_and_iter() {
        let mut map: ChannelMap<u32> = ChannelMap::default();
        map[ChannelId::Output1] = 7;
        assert_eq!(map[ChannelId::Output1], 7);
        assert_eq!(map[ChannelId::Output0], 0);

        let found = map.iter().find(|(_, v)| **v == 7).map(|(c, _)| c);
        assert_eq!(found, Some(ChannelId::Output1));
    }
}
