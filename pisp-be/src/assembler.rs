//! Job assembly.
//!
//! A job is formed from the head of every streaming channel queue of one
//! group, or not at all. Assembly runs with the scheduling lock held, which
//! is what makes the check-then-pop sequence below safe: nobody else removes
//! from a queue head while that lock is held, and submitters only append.

use crate::buffer::Buffer;
use crate::channel::{ChannelId, ChannelMap, ChannelSet};
use crate::group::{ClientGroup, GroupId, GroupState};
use crate::job::Job;
use crate::payload::{BayerEnables, ConfigPayload, RgbEnables};

/// Whether a streaming channel must have a buffer ready for a job to form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Formation waits for this channel.
    Required,
    /// A queued buffer is taken along and handed back with the job, but
    /// its absence does not hold the job up.
    Optional,
}

impl Requirement {
    /// The rule for `channel` under `config`.
    ///
    /// Outputs and side channels are only needed when the config enables
    /// the block they feed. The config, the main input and the HoG output
    /// are always needed once streaming.
    pub fn of(channel: ChannelId, config: &ConfigPayload) -> Requirement {
        let bayer = config.bayer_enables;
        let rgb = config.rgb_enables;
        let needed = match channel {
            ChannelId::Config | ChannelId::MainInput | ChannelId::HogOutput => true,
            ChannelId::Output0 => rgb.contains(RgbEnables::OUTPUT0),
            ChannelId::Output1 => rgb.contains(RgbEnables::OUTPUT1),
            ChannelId::TdnInput => bayer.contains(BayerEnables::TDN_INPUT),
            ChannelId::TdnOutput => bayer.contains(BayerEnables::TDN_OUTPUT),
            ChannelId::StitchInput => bayer.contains(BayerEnables::STITCH_INPUT),
            ChannelId::StitchOutput => bayer.contains(BayerEnables::STITCH_OUTPUT),
        };
        if needed {
            Requirement::Required
        } else {
            Requirement::Optional
        }
    }
}

/// Try to form a job for one group.
///
/// Returns `None`, with every queue untouched, when the group is not
/// streaming its config and main input or when any required channel has
/// nothing queued. Otherwise pops the head of every streaming channel that
/// has one.
pub fn try_assemble(group: GroupId, queues: &ClientGroup, state: &GroupState) -> Option<Job> {
    if !state.can_form_jobs() {
        return None;
    }

    let config = queues
        .queue(ChannelId::Config)
        .with_head(|b| b.config.clone())??;

    let mut take = ChannelSet::empty();
    for channel in ChannelId::ALL {
        if !state.streaming.has(channel) {
            continue;
        }
        if queues.queue(channel).has_head() {
            take |= channel.bit();
        } else if Requirement::of(channel, &config) == Requirement::Required {
            log::debug!("{}: nothing to do, {} is empty", group, channel);
            return None;
        }
    }

    let buffers: ChannelMap<Option<Buffer>> = ChannelMap::from_fn(|channel| {
        if take.has(channel) {
            queues.queue(channel).pop_head()
        } else {
            None
        }
    });
    Some(Job::new(group, buffers))
}
