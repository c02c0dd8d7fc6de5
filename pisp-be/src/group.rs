//! Client groups.
//!
//! A client group is one independent user of the shared engine, with its
//! own full set of channel queues and its own job sequence. The queues live
//! in [`ClientGroup`] behind their own locks; the streaming map, sequence
//! and negotiated formats live in [`GroupState`], which is only reachable
//! through the backend's scheduling lock.

use core::fmt;

use crate::channel::{ChannelId, ChannelMap, ChannelSet};
use crate::constants::{CONFIG_BUFFER_SIZE, NUM_CLIENT_GROUPS};
use crate::format::ChannelFormat;
use crate::queue::ChannelQueue;

/// Index of a client group, always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(u8);

impl GroupId {
    pub fn new(index: usize) -> Option<GroupId> {
        (index < NUM_CLIENT_GROUPS).then_some(GroupId(index as u8))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every group, in the fixed order dispatch visits them.
    pub fn all() -> impl Iterator<Item = GroupId> {
        (0..NUM_CLIENT_GROUPS as u8).map(GroupId)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group{}", self.0)
    }
}

/// The channel queues of one client group.
pub struct ClientGroup {
    queues: ChannelMap<ChannelQueue>,
}

impl ClientGroup {
    pub fn new() -> Self {
        ClientGroup {
            queues: ChannelMap::from_fn(|_| ChannelQueue::new()),
        }
    }

    pub fn queue(&self, channel: ChannelId) -> &ChannelQueue {
        &self.queues[channel]
    }
}

impl Default for ClientGroup {
    fn default() -> Self {
        ClientGroup::new()
    }
}

/// Scheduling state of one client group, guarded by the scheduling lock.
#[derive(Debug, Clone)]
pub struct GroupState {
    /// Channels currently streaming.
    pub streaming: ChannelSet,
    /// Sequence number given to the next completed job.
    pub sequence: u32,
    /// Geometry negotiated on each channel.
    pub formats: ChannelMap<ChannelFormat>,
}

impl GroupState {
    pub fn new() -> Self {
        let mut formats: ChannelMap<ChannelFormat> = ChannelMap::default();
        formats[ChannelId::Config] = ChannelFormat::meta(CONFIG_BUFFER_SIZE);
        GroupState {
            streaming: ChannelSet::empty(),
            sequence: 0,
            formats,
        }
    }

    /// Whether the channels every job needs are streaming.
    pub fn can_form_jobs(&self) -> bool {
        self.streaming.contains(ChannelSet::MINIMUM)
    }
}

impl Default for GroupState {
    fn default() -> Self {
        GroupState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_ids_are_bounded() {
        assert!(GroupId::new(0).is_some());
        assert!(GroupId::new(NUM_CLIENT_GROUPS - 1).is_some());
        assert!(GroupId::new(NUM_CLIENT_GROUPS).is_none());
        assert_eq!(GroupId::all().count(), NUM_CLIENT_GROUPS);
    }

    #[test]
    fn jobs_need_config_and_input_streaming() {
        let mut state = GroupState::new();
        assert!(!state.can_form_jobs());
        state.streaming |= ChannelSet::CONFIG;
        assert!(!state.can_form_jobs());
        state.streaming |= ChannelSet::MAIN_INPUT;
        assert!(state.can_form_jobs());
    }

    #[test]
    fn config_channel_defaults_to_full_tile_table() {
        let state = GroupState::new();
        assert_eq!(state.formats[ChannelId::Config].planes[0].size_image, 10_304);
        assert_eq!(state.formats[ChannelId::Config].num_planes(), 1);
    }
}
