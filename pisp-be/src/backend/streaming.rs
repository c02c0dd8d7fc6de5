//! Channel start and stop.

use embedded_hal::delay::DelayNs;

use crate::buffer::{BufferSink, BufferStatus, Completion};
use crate::channel::ChannelId;
use crate::clock::Clock;
use crate::error::BackendError;
use crate::group::GroupId;
use crate::hw::RegisterBus;

use super::Backend;

impl<B: RegisterBus, C: Clock, S: BufferSink> Backend<B, C, S> {
    /// Mark a channel as streaming and try to start a job for its group.
    ///
    /// Restarts the group's sequence numbering.
    pub fn start_streaming(&self, group: GroupId, channel: ChannelId) {
        self.hw.lock(|hw| {
            let state = hw.group_mut(group);
            state.streaming |= channel.bit();
            state.sequence = 0;
            log::debug!("{}: streaming {:#05x}", group, state.streaming.bits());
        });
        self.try_dispatch_one(group);
    }

    /// Stop a channel.
    ///
    /// Every buffer still waiting on the channel is handed back with
    /// [`BufferStatus::Error`] straight away. Buffers already part of a
    /// dispatched job are left alone; this call then waits, polling with
    /// `delay`, until no dispatched job holds one. The channel stops
    /// streaming either way.
    ///
    /// Returns how many buffers were cancelled, or
    /// [`BackendError::StopTimeout`] if the wait gave up.
    pub fn stop_streaming<D: DelayNs>(
        &self,
        group: GroupId,
        channel: ChannelId,
        delay: &mut D,
    ) -> Result<usize, BackendError> {
        let (cancelled, config) = self.hw.lock(|hw| {
            let sequence = hw.group(group).sequence;
            let timestamp_ns = self.clock.now_ns();
            let cancelled = self.queues[group.index()]
                .queue(channel)
                .cancel_all_pending(|buffer| {
                    self.sink.retire(
                        buffer,
                        Completion {
                            group,
                            channel,
                            status: BufferStatus::Error,
                            timestamp_ns,
                            sequence,
                        },
                    )
                });
            (cancelled, *hw.engine.config())
        });
        log::debug!("{}: {} stopping, {} cancelled", group, channel, cancelled);

        let poll_us = config.stop_poll_us.max(1);
        let limit_us = config.stop_timeout_ms as u64 * 1000;
        let mut waited_us = 0u64;
        let timed_out = loop {
            if !self.hw.lock(|hw| hw.in_flight(group, channel)) {
                break false;
            }
            if waited_us >= limit_us {
                break true;
            }
            delay.delay_us(poll_us);
            waited_us += poll_us as u64;
        };

        self.hw.lock(|hw| {
            let state = hw.group_mut(group);
            state.streaming.remove(channel.bit());
            log::debug!("{}: streaming {:#05x}", group, state.streaming.bits());
        });

        if timed_out {
            log::error!("{}: {} still held by a running job", group, channel);
            return Err(BackendError::StopTimeout(channel));
        }
        Ok(cancelled)
    }
}
