//! The shared Back End device.
//!
//! [`Backend`] ties the client groups' channel queues to the one engine.
//! All scheduling state sits behind a single lock that masks interrupts
//! while held:
//!
//! | State | Meaning |
//! |-------|---------|
//! | `started` / `done` | Shadow of the hardware's wrapping job counters |
//! | `busy` | The engine's queue slot holds a job not yet seen to start |
//! | `queued` | Job programmed into the engine, not yet started |
//! | `running` | Job the engine is executing |
//! | `groups` | Streaming map, sequence and formats of every group |
//!
//! The lock is held from job assembly through programming, and for the
//! whole interrupt handler. Queue locks are only ever taken inside it.
//!
//! | File | Entry points |
//! |------|--------------|
//! | `dispatch` | [`Backend::try_dispatch_one`], [`Backend::try_dispatch_any`] |
//! | `reconcile` | [`Backend::on_interrupt`] |
//! | `streaming` | [`Backend::start_streaming`], [`Backend::stop_streaming`] |

mod dispatch;
mod reconcile;
mod streaming;

use crate::buffer::{Buffer, BufferSink};
use crate::channel::ChannelId;
use crate::clock::Clock;
use crate::constants::NUM_CLIENT_GROUPS;
use crate::error::{BackendError, SubmitError};
use crate::format::ChannelFormat;
use crate::group::{ClientGroup, GroupId, GroupState};
use crate::hw::{BatchStatus, Engine, EngineConfig, RegisterBus};
use crate::job::Job;
use crate::lock::IrqMutex;
use crate::payload::validate_config;

/// Hardware anomalies recovered from without failing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnomalyCounts {
    /// Shadow counters forced to match the hardware after an interrupt.
    pub counter_resyncs: u32,
    /// Jobs found unrunnable after address sanitization.
    pub bad_jobs: u32,
    /// Address registers that read back differently from what was written.
    pub readback_mismatches: u32,
}

/// Everything guarded by the scheduling lock.
struct HwState<B> {
    engine: Engine<B>,
    started: u8,
    done: u8,
    busy: bool,
    queued: Option<Job>,
    running: Option<Job>,
    groups: [GroupState; NUM_CLIENT_GROUPS],
    anomalies: AnomalyCounts,
}

impl<B> HwState<B> {
    fn group(&self, group: GroupId) -> &GroupState {
        &self.groups[group.index()]
    }

    fn group_mut(&mut self, group: GroupId) -> &mut GroupState {
        &mut self.groups[group.index()]
    }

    /// Whether a dispatched job holds a buffer of `channel` in `group`.
    fn in_flight(&self, group: GroupId, channel: ChannelId) -> bool {
        [&self.queued, &self.running]
            .into_iter()
            .flatten()
            .any(|job| job.group == group && job.holds(channel))
    }
}

/// One Back End shared by [`NUM_CLIENT_GROUPS`] client groups.
///
/// - `B`: register access
/// - `C`: completion timestamps
/// - `S`: receiver of retired buffers
pub struct Backend<B, C, S> {
    hw: IrqMutex<HwState<B>>,
    queues: [ClientGroup; NUM_CLIENT_GROUPS],
    clock: C,
    sink: S,
}

impl<B: RegisterBus, C: Clock, S: BufferSink> Backend<B, C, S> {
    /// Create the device. Call [`init()`](Self::init) before use.
    pub fn new(bus: B, config: EngineConfig, clock: C, sink: S) -> Self {
        Backend {
            hw: IrqMutex::new(HwState {
                engine: Engine::new(bus, config),
                started: 0,
                done: 0,
                busy: false,
                queued: None,
                running: None,
                groups: core::array::from_fn(|_| GroupState::new()),
                anomalies: AnomalyCounts::default(),
            }),
            queues: core::array::from_fn(|_| ClientGroup::new()),
            clock,
            sink,
        }
    }

    /// Bring the engine up and seed the shadow counters from it.
    pub fn init(&self) -> Result<(), BackendError> {
        self.hw.lock(|hw| {
            let batch = hw.engine.init()?;
            hw.started = batch.started;
            hw.done = batch.done;
            hw.busy = false;
            Ok(())
        })
    }

    // ── Formats ────────────────────────────────────────────────────────

    /// Set the geometry buffers of `channel` will be checked against.
    ///
    /// Refused while the channel is streaming.
    pub fn set_format(
        &self,
        group: GroupId,
        channel: ChannelId,
        format: ChannelFormat,
    ) -> Result<(), BackendError> {
        self.hw.lock(|hw| {
            let state = hw.group_mut(group);
            if state.streaming.has(channel) {
                return Err(BackendError::ChannelStreaming(channel));
            }
            state.formats[channel] = format;
            Ok(())
        })
    }

    pub fn format(&self, group: GroupId, channel: ChannelId) -> ChannelFormat {
        self.hw.lock(|hw| hw.group(group).formats[channel])
    }

    // ── Submission ─────────────────────────────────────────────────────

    /// Queue a buffer on one channel and try to start a job.
    ///
    /// Config buffers are validated against the group's negotiated formats
    /// here, so a config that can never run is refused before any job is
    /// formed from it. On error the buffer is not queued.
    pub fn submit(
        &self,
        group: GroupId,
        channel: ChannelId,
        buffer: Buffer,
    ) -> Result<(), SubmitError> {
        self.prepare(group, channel, &buffer)?;

        self.queues[group.index()]
            .queue(channel)
            .submit(buffer)
            .map_err(|buffer| SubmitError::QueueFull { channel, buffer })?;

        self.try_dispatch_one(group);
        Ok(())
    }

    fn prepare(&self, group: GroupId, channel: ChannelId, buffer: &Buffer) -> Result<(), SubmitError> {
        let formats = self.hw.lock(|hw| hw.group(group).formats.clone());

        match (channel, &buffer.config) {
            (ChannelId::Config, None) => return Err(SubmitError::MissingPayload),
            (ChannelId::Config, Some(_)) => {}
            (_, Some(_)) => return Err(SubmitError::UnexpectedPayload(channel)),
            (_, None) => {}
        }

        let fmt = &formats[channel];
        for plane in 0..fmt.num_planes() {
            let required = fmt.planes[plane].size_image;
            let len = buffer.planes().get(plane).map(|p| p.len).unwrap_or(0);
            if len < required {
                log::error!("{} {}: buffer too small for plane {}", group, channel, plane);
                return Err(SubmitError::PlaneTooSmall {
                    channel,
                    plane,
                    len,
                    required,
                });
            }
        }

        if let Some(config) = &buffer.config {
            validate_config(config, &formats)?;
        }
        Ok(())
    }

    // ── Inspection ─────────────────────────────────────────────────────

    pub fn anomalies(&self) -> AnomalyCounts {
        self.hw.lock(|hw| hw.anomalies)
    }

    /// Whether the engine's queue slot is taken.
    pub fn is_busy(&self) -> bool {
        self.hw.lock(|hw| hw.busy)
    }

    /// Shadow copy of the hardware job counters.
    pub fn shadow_counters(&self) -> BatchStatus {
        self.hw.lock(|hw| BatchStatus {
            started: hw.started,
            done: hw.done,
        })
    }

    /// Group owning the job programmed but not yet started, if any.
    pub fn queued_group(&self) -> Option<GroupId> {
        self.hw.lock(|hw| hw.queued.as_ref().map(|job| job.group))
    }

    /// Group owning the job the engine is executing, if any.
    pub fn running_group(&self) -> Option<GroupId> {
        self.hw.lock(|hw| hw.running.as_ref().map(|job| job.group))
    }

    /// Sequence number the group's next completed job will carry.
    pub fn sequence(&self, group: GroupId) -> u32 {
        self.hw.lock(|hw| hw.group(group).sequence)
    }

    pub fn is_streaming(&self, group: GroupId, channel: ChannelId) -> bool {
        self.hw.lock(|hw| hw.group(group).streaming.has(channel))
    }

    /// Buffers waiting on a channel queue.
    pub fn pending(&self, group: GroupId, channel: ChannelId) -> usize {
        self.queues[group.index()].queue(channel).len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
