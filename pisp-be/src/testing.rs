//! Test doubles shared by the unit and integration tests.

use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use crate::buffer::{Buffer, BufferId, BufferSink, BufferStatus, Completion};
use crate::clock::Clock;
use crate::hw::registers as reg;
use crate::hw::RegisterBus;

// ── Mock register file ────────────────────────────────────────────────

const NUM_REGS: usize = 128;
const LOG_LEN: usize = 256;

struct MockRegs {
    regs: [u32; NUM_REGS],
    /// Write log in chronological order; only the first `LOG_LEN` kept.
    log: [(u32, u32); LOG_LEN],
    log_count: usize,
    launches: usize,
    /// Offset whose writes are stored inverted, to fake a read-back fault.
    corrupt: Option<u32>,
}

/// Simulated Back End register block.
///
/// Interrupt status is write-one-to-clear; everything else stores what is
/// written. Shared by reference so tests can poke it while a backend owns
/// the bus.
pub struct MockHw {
    inner: Mutex<MockRegs>,
}

impl MockHw {
    pub fn new() -> Self {
        MockHw {
            inner: Mutex::new(MockRegs {
                regs: [0; NUM_REGS],
                log: [(0, 0); LOG_LEN],
                log_count: 0,
                launches: 0,
                corrupt: None,
            }),
        }
    }

    /// A register file that passes bring-up.
    pub fn ready() -> Self {
        let hw = MockHw::new();
        hw.set(reg::VERSION, reg::VERSION_2712C1);
        hw
    }

    pub fn get(&self, offset: u32) -> u32 {
        self.inner.lock().regs[(offset / 4) as usize]
    }

    /// Set a register without logging it.
    pub fn set(&self, offset: u32, value: u32) {
        self.inner.lock().regs[(offset / 4) as usize] = value;
    }

    pub fn set_batch(&self, started: u8, done: u8) {
        self.set(reg::BATCH_STATUS, ((started as u32) << 8) | done as u32);
    }

    pub fn batch(&self) -> (u8, u8) {
        let raw = self.get(reg::BATCH_STATUS);
        ((raw >> 8) as u8, raw as u8)
    }

    /// Assert interrupt status bits.
    pub fn raise(&self, bits: u32) {
        self.inner.lock().regs[(reg::INTERRUPT_STATUS / 4) as usize] |= bits;
    }

    /// The engine picks up its queued job.
    pub fn start_job(&self) {
        let (started, done) = self.batch();
        self.set_batch(started.wrapping_add(1), done);
        self.raise(reg::IRQ_STARTED);
    }

    /// The engine finishes its running job.
    pub fn finish_job(&self) {
        let (started, done) = self.batch();
        self.set_batch(started, done.wrapping_add(1));
        self.raise(reg::IRQ_DONE);
    }

    pub fn corrupt_writes_to(&self, offset: u32) {
        self.inner.lock().corrupt = Some(offset);
    }

    /// Get the (register, value) of the nth write.
    pub fn write_at(&self, idx: usize) -> (u32, u32) {
        self.inner.lock().log[idx]
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().log_count
    }

    /// Number of jobs launched through the control register.
    pub fn launches(&self) -> usize {
        self.inner.lock().launches
    }
}

impl RegisterBus for &MockHw {
    fn read(&mut self, offset: u32) -> u32 {
        self.get(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        let mut m = self.inner.lock();
        if m.log_count < LOG_LEN {
            let n = m.log_count;
            m.log[n] = (offset, value);
        }
        m.log_count += 1;

        let slot = (offset / 4) as usize;
        match offset {
            reg::INTERRUPT_STATUS => m.regs[slot] &= !value,
            reg::CONTROL => {
                m.regs[slot] = value;
                m.launches += 1;
            }
            _ if m.corrupt == Some(offset) => m.regs[slot] = !value,
            _ => m.regs[slot] = value,
        }
    }
}

// ── Recording sink ────────────────────────────────────────────────────

const MAX_RETIRED: usize = 128;

/// Records every retired buffer in order.
pub struct RecordingSink {
    retired: Mutex<([Option<(BufferId, Completion)>; MAX_RETIRED], usize)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink {
            retired: Mutex::new(([None; MAX_RETIRED], 0)),
        }
    }

    pub fn count(&self) -> usize {
        self.retired.lock().1
    }

    pub fn get(&self, idx: usize) -> Option<(BufferId, Completion)> {
        self.retired.lock().0.get(idx).copied().flatten()
    }

    /// How many times `id` has been retired.
    pub fn times_retired(&self, id: BufferId) -> usize {
        let r = self.retired.lock();
        r.0[..r.1].iter().flatten().filter(|(b, _)| *b == id).count()
    }

    /// Completion of the first retirement of `id`.
    pub fn find(&self, id: BufferId) -> Option<Completion> {
        let r = self.retired.lock();
        r.0[..r.1]
            .iter()
            .flatten()
            .find(|(b, _)| *b == id)
            .map(|&(_, c)| c)
    }

    pub fn count_status(&self, status: BufferStatus) -> usize {
        let r = self.retired.lock();
        r.0[..r.1]
            .iter()
            .flatten()
            .filter(|(_, c)| c.status == status)
            .count()
    }
}

impl BufferSink for RecordingSink {
    fn retire(&self, buffer: Buffer, completion: Completion) {
        let mut r = self.retired.lock();
        let n = r.1;
        r.0[n] = Some((buffer.id, completion));
        r.1 += 1;
    }
}

// ── Stepping clock ────────────────────────────────────────────────────

/// Advances by a fixed step every time it is read.
pub struct MockClock {
    now: AtomicU64,
    step: u64,
}

impl MockClock {
    pub fn new(step: u64) -> Self {
        MockClock {
            now: AtomicU64::new(0),
            step,
        }
    }
}

impl Clock for MockClock {
    fn now_ns(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::Relaxed) + self.step
    }
}
