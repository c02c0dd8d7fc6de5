//! Back End register protocol.
//!
//! [`Engine`] owns the register bus and knows the order things must be
//! written in. It holds no scheduling state; the backend decides when a job
//! may be programmed and what the counters mean.

use crate::constants::NUM_HW_ADDRESSES;

use super::bus::RegisterBus;
use super::program::HwProgram;
use super::registers as reg;
use crate::error::EngineError;

/// What to do with a job that cannot run safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadJobPolicy {
    /// Retire the job's buffers with an error and never program it.
    #[default]
    Reject,
    /// Program it with zero tiles. The engine survives this but may advance
    /// its counters by more than one; the interrupt handler resyncs.
    ZeroTiles,
}

/// Bring-up and runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Version register value expected after masking the minor bits.
    pub expected_version: u32,
    pub version_minor_mask: u32,
    /// AXI master configuration written at bring-up.
    pub axi_config: u32,
    /// Interrupt sources enabled at bring-up.
    pub interrupt_enables: u32,
    pub bad_job_policy: BadJobPolicy,
    /// Poll interval while a stopping channel waits for its jobs.
    pub stop_poll_us: u32,
    /// Give up waiting for a stopping channel's jobs after this long.
    pub stop_timeout_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            expected_version: reg::VERSION_2712C1,
            version_minor_mask: reg::VERSION_MINOR_BITS,
            axi_config: reg::AXI_DEFAULT,
            interrupt_enables: reg::IRQ_DONE | reg::IRQ_STARTED,
            bad_job_policy: BadJobPolicy::Reject,
            stop_poll_us: 1000,
            stop_timeout_ms: 1000,
        }
    }
}

/// The two wrapping job counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStatus {
    pub started: u8,
    pub done: u8,
}

impl BatchStatus {
    pub fn decode(raw: u32) -> Self {
        BatchStatus {
            done: raw as u8,
            started: (raw >> 8) as u8,
        }
    }
}

/// Result of programming one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramOutcome {
    Launched,
    /// An address register read back differently. The job was launched
    /// anyway.
    ReadbackMismatch { slot: usize, wrote: u64, read: u64 },
}

/// Register-level driver for one Back End.
pub struct Engine<B> {
    bus: B,
    config: EngineConfig,
    hw_version: u32,
}

impl<B: RegisterBus> Engine<B> {
    pub fn new(bus: B, config: EngineConfig) -> Self {
        Engine {
            bus,
            config,
            hw_version: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Version read at the last [`init()`](Self::init).
    pub fn hw_version(&self) -> u32 {
        self.hw_version
    }

    // ── Bring-up ───────────────────────────────────────────────────────

    /// Check the hardware is present and idle, then configure it.
    ///
    /// Returns the counters to seed the shadow state with.
    pub fn init(&mut self) -> Result<BatchStatus, EngineError> {
        let version = self.bus.read(reg::VERSION);
        log::info!("pispbe: HW version: {:#010x}", version);
        self.hw_version = version;
        if version & !self.config.version_minor_mask != self.config.expected_version {
            return Err(EngineError::UnknownVersion(version));
        }

        // Clear leftover interrupts
        self.bus.write(reg::INTERRUPT_STATUS, 0xFFFF_FFFF);

        let raw = self.bus.read(reg::BATCH_STATUS);
        log::info!("pispbe: BatchStatus: {:#010x}", raw);
        let batch = BatchStatus::decode(raw);

        let status = self.bus.read(reg::STATUS);
        log::info!("pispbe: Status: {:#010x}", status);
        if status != 0 || batch.done != batch.started {
            log::error!("pispbe: HW is stuck or busy");
            return Err(EngineError::Stuck {
                status,
                started: batch.started,
                done: batch.done,
            });
        }

        self.bus.write(reg::AXI, self.config.axi_config);
        self.bus.write(reg::INTERRUPT_EN, self.config.interrupt_enables);
        Ok(batch)
    }

    // ── Interrupts ─────────────────────────────────────────────────────

    pub fn interrupt_status(&mut self) -> u32 {
        self.bus.read(reg::INTERRUPT_STATUS)
    }

    /// Clear the given interrupt status bits.
    pub fn ack_interrupts(&mut self, bits: u32) {
        self.bus.write(reg::INTERRUPT_STATUS, bits);
    }

    pub fn batch_status(&mut self) -> BatchStatus {
        BatchStatus::decode(self.bus.read(reg::BATCH_STATUS))
    }

    // ── Job programming ────────────────────────────────────────────────

    /// Write a job to the engine and queue it.
    ///
    /// The caller must know the engine's queue slot is free. Order matters:
    /// parameter block, addresses and enables, read-back check, tile
    /// pointer, and finally the control write that queues the job.
    pub fn program_job(&mut self, prog: &HwProgram, params: &[u32]) -> ProgramOutcome {
        if self.bus.read(reg::STATUS) & reg::STATUS_QUEUED != 0 {
            log::error!("pispbe: not safe to queue new job");
        }

        for (i, &word) in params.iter().enumerate() {
            self.bus.write(reg::PARAMS_BASE + 4 * i as u32, word);
        }

        for (n, &addr) in prog.addrs.iter().enumerate() {
            self.bus.write(reg::io_addr_lo(n), addr as u32);
            self.bus.write(reg::io_addr_hi(n), (addr >> 32) as u32);
        }
        self.bus.write(reg::GLOBAL_BAYER_ENABLE, prog.bayer.bits());
        self.bus.write(reg::GLOBAL_RGB_ENABLE, prog.rgb.bits());

        let outcome = self.check_addresses(&prog.addrs);

        self.bus.write(reg::TILE_ADDR_LO, prog.tiles as u32);
        self.bus.write(reg::TILE_ADDR_HI, (prog.tiles >> 32) as u32);

        self.bus.write(
            reg::CONTROL,
            reg::CONTROL_START | reg::CONTROL_QUEUE | (prog.num_tiles << reg::CONTROL_TILES_SHIFT),
        );
        outcome
    }

    fn check_addresses(&mut self, addrs: &[u64; NUM_HW_ADDRESSES]) -> ProgramOutcome {
        for (slot, &wrote) in addrs.iter().enumerate() {
            let lo = self.bus.read(reg::io_addr_lo(slot)) as u64;
            let hi = self.bus.read(reg::io_addr_hi(slot)) as u64;
            let read = lo | (hi << 32);
            if read != wrote {
                log::error!("pispbe: config error: check if ISP RAMs enabled?");
                return ProgramOutcome::ReadbackMismatch { slot, wrote, read };
            }
        }
        ProgramOutcome::Launched
    }
}
