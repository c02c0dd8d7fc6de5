//! Filling the engine's queue slot.

use crate::assembler::try_assemble;
use crate::buffer::{BufferSink, BufferStatus};
use crate::clock::Clock;
use crate::group::GroupId;
use crate::hw::{BadJobPolicy, HwProgram, ProgramOutcome, RegisterBus};

use super::{Backend, HwState};

impl<B: RegisterBus, C: Clock, S: BufferSink> Backend<B, C, S> {
    /// Try to start a job for one group.
    ///
    /// Does nothing while the engine's queue slot is taken. Returns whether
    /// a job was programmed.
    pub fn try_dispatch_one(&self, group: GroupId) -> bool {
        self.hw.lock(|hw| !hw.busy && self.dispatch_locked(hw, group))
    }

    /// Try to start a job for whichever group can form one first.
    ///
    /// With `clear_busy` the queue slot is first marked free, in the same
    /// critical section, so a freed slot is never left unfilled.
    pub fn try_dispatch_any(&self, clear_busy: bool) -> bool {
        self.hw.lock(|hw| self.dispatch_any_locked(hw, clear_busy))
    }

    pub(super) fn dispatch_any_locked(&self, hw: &mut HwState<B>, clear_busy: bool) -> bool {
        if clear_busy {
            hw.busy = false;
        }
        if hw.busy {
            return false;
        }
        // One free slot: stop at the first group that fills it.
        GroupId::all().any(|group| self.dispatch_locked(hw, group))
    }

    /// Assemble, check and program a job for `group`. The caller has
    /// checked the queue slot is free.
    fn dispatch_locked(&self, hw: &mut HwState<B>, group: GroupId) -> bool {
        loop {
            let Some(job) = try_assemble(group, &self.queues[group.index()], hw.group(group))
            else {
                return false;
            };

            let mut prog = HwProgram::build(&job, &hw.group(group).formats);
            if !prog.is_runnable() {
                log::error!(
                    "{}: bad job: {} tiles, bayer {:#x}, rgb {:#x}",
                    group,
                    prog.num_tiles,
                    prog.bayer.bits(),
                    prog.rgb.bits()
                );
                hw.anomalies.bad_jobs += 1;
                match hw.engine.config().bad_job_policy {
                    BadJobPolicy::Reject => {
                        let sequence = hw.group(group).sequence;
                        job.retire(&self.sink, BufferStatus::Error, self.clock.now_ns(), sequence);
                        // Retry with the next config in line.
                        continue;
                    }
                    BadJobPolicy::ZeroTiles => prog.num_tiles = 0,
                }
            }

            let params = job.config().map(|c| c.params).unwrap_or_default();
            if let ProgramOutcome::ReadbackMismatch { slot, wrote, read } =
                hw.engine.program_job(&prog, &params)
            {
                log::error!(
                    "{}: address slot {} wrote {:#x} read {:#x}",
                    group,
                    slot,
                    wrote,
                    read
                );
                hw.anomalies.readback_mismatches += 1;
            }

            log::debug!("{}: job queued, {} tiles", group, prog.num_tiles);
            hw.queued = Some(job);
            hw.busy = true;
            return true;
        }
    }
}
