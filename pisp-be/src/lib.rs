//! # pisp-be
//!
//! A `no_std`, zero-allocation job scheduler for the Raspberry Pi PiSP
//! Back End image signal processor. Several independent client groups
//! submit buffers on per-channel queues; the scheduler matches them into
//! jobs, programs the one shared engine, and reconciles its progress
//! counters from the interrupt handler.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Model | [`channel`] / [`buffer`] / [`format`] / [`payload`] | Channels, buffers, geometry, config payloads |
//! | Queues | [`ring`] / [`queue`] / [`group`] | Fixed-size FIFOs per channel, grouped per client |
//! | Jobs | [`job`] / [`assembler`] | All-or-nothing job formation |
//! | Hardware | [`hw`] | Register map, address sanitization, engine protocol |
//! | Device | [`backend`] | Dispatch, interrupt reconciliation, streaming |
//!
//! ## Job pipeline
//!
//! ```text
//! submit() ─→ ChannelQueue ─→ try_assemble() ─→ HwProgram ─→ Engine
//!                                                  │
//!            BufferSink ←─ retire ←─ on_interrupt() ←─ started / done
//! ```
//!
//! The engine holds at most two jobs: one `queued` (programmed, not yet
//! started) and one `running`. A new job is programmed as soon as the
//! interrupt handler sees the queued one start.
//!
//! ## Quick start
//!
//! ```ignore
//! use pisp_be::backend::Backend;
//! use pisp_be::hw::{EngineConfig, MmioBus};
//!
//! let bus = unsafe { MmioBus::new(PISP_BE_BASE as *mut u32) };
//! let be = Backend::new(bus, EngineConfig::default(), clock, sink);
//! be.init()?;
//!
//! be.start_streaming(group, ChannelId::Config);
//! be.start_streaming(group, ChannelId::MainInput);
//! be.submit(group, ChannelId::Config, config_buffer)?;
//! be.submit(group, ChannelId::MainInput, input_buffer)?;
//!
//! // From the Back End interrupt:
//! be.on_interrupt();
//! ```
//!
//! State shared with the interrupt handler is guarded by
//! [`critical_section`] locks, so the platform must link a
//! `critical-section` implementation (on single-core Cortex-M, cortex-m's
//! `critical-section-single-core` feature).
//!
//! ## Limits
//!
//! - **Client groups:** 2 ([`constants::NUM_CLIENT_GROUPS`])
//! - **Queue depth:** 32 buffers per channel ([`constants::QUEUE_DEPTH`])
//! - **Tiles per job:** 1 to 64 ([`constants::MAX_TILES`])

#![no_std]

pub mod constants;
pub mod channel;
pub mod ring;
pub mod buffer;
pub mod format;
pub mod payload;
pub mod error;
mod lock;
pub mod queue;
pub mod group;
pub mod job;
pub mod assembler;
pub mod hw;
pub mod clock;
pub mod backend;

#[cfg(test)]
mod testing;
