//! Interrupt handling.
//!
//! The engine reports progress only through two 8-bit wrapping counters,
//! `started` and `done`. Between two interrupts either may have moved, and
//! under load `done` can move by two while `started` moves by one: the
//! running job finished, and the queued job both started and finished.

use crate::buffer::{BufferSink, BufferStatus};
use crate::clock::Clock;
use crate::hw::RegisterBus;
use crate::job::Job;

use super::{Backend, HwState};

impl<B: RegisterBus, C: Clock, S: BufferSink> Backend<B, C, S> {
    /// Handle a Back End interrupt.
    ///
    /// Returns `false`, having changed nothing, if the engine has no
    /// interrupt pending (the line may be shared).
    pub fn on_interrupt(&self) -> bool {
        self.hw.lock(|hw| self.reconcile(hw))
    }

    fn reconcile(&self, hw: &mut HwState<B>) -> bool {
        let status = hw.engine.interrupt_status();
        if status == 0 {
            return false;
        }
        hw.engine.ack_interrupts(status);

        let batch = hw.engine.batch_status();
        log::debug!(
            "pispbe: hw started {} done {}, previously started {} done {}",
            batch.started,
            batch.done,
            hw.started,
            hw.done
        );

        if hw.done != batch.done {
            if let Some(job) = hw.running.take() {
                self.job_done(hw, job);
                hw.done = hw.done.wrapping_add(1);
                log::debug!("pispbe: running job done");
            }
        }

        let mut can_queue_another = false;
        if hw.started != batch.started {
            hw.started = hw.started.wrapping_add(1);
            can_queue_another = true;
            log::debug!("pispbe: job started");

            let queued = hw.queued.take();
            match queued {
                // Started and finished since the last interrupt.
                Some(job) if hw.done != batch.done => {
                    self.job_done(hw, job);
                    hw.done = hw.done.wrapping_add(1);
                    log::debug!("pispbe: queued job done");
                }
                queued => hw.running = queued,
            }
        }

        if hw.started != batch.started || hw.done != batch.done {
            log::error!(
                "pispbe: counters out of step: hw started {} done {}, shadow started {} done {}",
                batch.started,
                batch.done,
                hw.started,
                hw.done
            );
            hw.started = batch.started;
            hw.done = batch.done;
            hw.anomalies.counter_resyncs += 1;
        }

        self.dispatch_any_locked(hw, can_queue_another);
        true
    }

    fn job_done(&self, hw: &mut HwState<B>, job: Job) {
        let state = hw.group_mut(job.group);
        let sequence = state.sequence;
        state.sequence = sequence.wrapping_add(1);
        job.retire(&self.sink, BufferStatus::Done, self.clock.now_ns(), sequence);
    }
}
