//! A matched set of buffers run by the engine as one unit.

use crate::buffer::{Buffer, BufferSink, BufferStatus, Completion};
use crate::channel::{ChannelId, ChannelMap};
use crate::group::GroupId;
use crate::payload::ConfigPayload;

/// One job: a buffer (or nothing) for every channel of its group.
///
/// A job always holds a config buffer and a main input buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Job {
    pub group: GroupId,
    pub buffers: ChannelMap<Option<Buffer>>,
}

impl Job {
    pub fn new(group: GroupId, buffers: ChannelMap<Option<Buffer>>) -> Self {
        Job { group, buffers }
    }

    /// The payload of the job's config buffer.
    pub fn config(&self) -> Option<&ConfigPayload> {
        self.buffers[ChannelId::Config]
            .as_ref()
            .and_then(|b| b.config.as_ref())
    }

    pub fn buffer(&self, channel: ChannelId) -> Option<&Buffer> {
        self.buffers[channel].as_ref()
    }

    /// Whether the job holds a buffer of `channel`.
    pub fn holds(&self, channel: ChannelId) -> bool {
        self.buffers[channel].is_some()
    }

    /// Number of buffers the job holds.
    pub fn len(&self) -> usize {
        self.buffers.iter().filter(|(_, b)| b.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand every held buffer back to its owner.
    pub fn retire<S: BufferSink>(
        self,
        sink: &S,
        status: BufferStatus,
        timestamp_ns: u64,
        sequence: u32,
    ) {
        let group = self.group;
        for (channel, buffer) in self.buffers {
            if let Some(buffer) = buffer {
                sink.retire(
                    buffer,
                    Completion {
                        group,
                        channel,
                        status,
                        timestamp_ns,
                        sequence,
                    },
                );
            }
        }
    }
}
