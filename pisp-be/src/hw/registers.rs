//! Back End register offsets and bitfield definitions.
//!
//! All registers are 32 bits wide and addressed by byte offset from the
//! block base. 64-bit DMA addresses are split into LO/HI register pairs.

// Some fields are defined for completeness but are not yet used by the driver.
#![allow(dead_code)]

use crate::constants::NUM_HW_ADDRESSES;

// ── Identification ─────────────────────────────────────────────────────────

/// Hardware version (read-only).
/// - Bits 31:4 — version
/// - Bits  3:0 — minor revision
pub const VERSION: u32 = 0x00;

/// Known-good version with the minor revision bits masked off.
pub const VERSION_2712C1: u32 = 0x0225_2700;

/// Minor revision bits ignored by the version check.
pub const VERSION_MINOR_BITS: u32 = 0xF;

// ── Control and status ─────────────────────────────────────────────────────

/// Job control. Writing it queues the programmed job.
/// - Bits 31:16 — NUM_TILES
/// - Bit      1 — QUEUE
/// - Bit      0 — START
pub const CONTROL: u32 = 0x04;

pub const CONTROL_START: u32 = 1 << 0;
pub const CONTROL_QUEUE: u32 = 1 << 1;
pub const CONTROL_TILES_SHIFT: u32 = 16;

/// Tile table DMA address.
pub const TILE_ADDR_LO: u32 = 0x08;
pub const TILE_ADDR_HI: u32 = 0x0C;

/// Engine status.
/// - Bit 0 — a job is queued and not yet started
pub const STATUS: u32 = 0x10;

pub const STATUS_QUEUED: u32 = 1 << 0;

/// Free-running job counters.
/// - Bits 15:8 — STARTED
/// - Bits  7:0 — DONE
pub const BATCH_STATUS: u32 = 0x14;

// ── Interrupts ─────────────────────────────────────────────────────────────

/// Interrupt enable.
pub const INTERRUPT_EN: u32 = 0x18;

/// Interrupt status (write one to clear).
pub const INTERRUPT_STATUS: u32 = 0x1C;

/// Job finished.
pub const IRQ_DONE: u32 = 1 << 0;
/// Queued job started.
pub const IRQ_STARTED: u32 = 1 << 1;

// ── Bus interface ──────────────────────────────────────────────────────────

/// AXI master configuration.
/// - Bits 31:28 — QOS (write)
/// - Bits 22:20 — sub-64-byte bursts and AWID/BID variability
/// - Bits 15:12 — CACHE
/// - Bits 10:8  — PROT
pub const AXI: u32 = 0x20;

/// QOS=0, CACHE=0b0010, PROT=0b011, chicken bits 22:20 set.
pub const AXI_DEFAULT: u32 = 0x3270_3200;

// ── Per-job configuration block ────────────────────────────────────────────

/// Start of the per-job configuration registers.
pub const CONFIG_BASE: u32 = 0x40;

/// DMA address slot `n` (LO word; HI word follows at +4).
pub const fn io_addr_lo(n: usize) -> u32 {
    CONFIG_BASE + 8 * n as u32
}

pub const fn io_addr_hi(n: usize) -> u32 {
    io_addr_lo(n) + 4
}

/// Global Bayer pipe enables.
pub const GLOBAL_BAYER_ENABLE: u32 = CONFIG_BASE + 8 * NUM_HW_ADDRESSES as u32;

/// Global RGB pipe enables.
pub const GLOBAL_RGB_ENABLE: u32 = GLOBAL_BAYER_ENABLE + 4;

/// First register of the opaque parameter block.
pub const PARAMS_BASE: u32 = GLOBAL_RGB_ENABLE + 4;

// ── DMA address slots ──────────────────────────────────────────────────────

/// Main input planes 0..3.
pub const SLOT_MAIN_INPUT: usize = 0;
pub const SLOT_TDN_INPUT: usize = 3;
pub const SLOT_STITCH_INPUT: usize = 4;
pub const SLOT_TDN_OUTPUT: usize = 5;
pub const SLOT_STITCH_OUTPUT: usize = 6;
/// Output `n` planes occupy `SLOT_OUTPUT0 + 3 * n ..`.
pub const SLOT_OUTPUT0: usize = 7;
pub const SLOT_HOG_OUTPUT: usize = 13;
