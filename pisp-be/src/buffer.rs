//! Buffers and their hand-back path.
//!
//! A [`Buffer`] is owned by the backend from the moment it is submitted
//! until it is handed back through [`BufferSink::retire`], exactly once,
//! either with the job it was part of or when its channel is stopped.

use core::fmt;

use crate::channel::ChannelId;
use crate::constants::MAX_PLANES;
use crate::group::GroupId;
use crate::payload::ConfigPayload;

/// Opaque handle chosen by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One device-visible memory plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Plane {
    /// DMA address as seen by the engine.
    pub addr: u64,
    /// Length in bytes.
    pub len: u32,
}

/// A buffer queued on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub id: BufferId,
    planes: [Plane; MAX_PLANES],
    num_planes: u8,
    /// Decoded payload, present only on config buffers.
    pub config: Option<ConfigPayload>,
}

impl Buffer {
    /// A buffer with the given planes (at most [`MAX_PLANES`] are kept).
    pub fn new(id: BufferId, planes: &[Plane]) -> Self {
        let mut stored = [Plane::default(); MAX_PLANES];
        let n = planes.len().min(MAX_PLANES);
        stored[..n].copy_from_slice(&planes[..n]);
        Buffer {
            id,
            planes: stored,
            num_planes: n as u8,
            config: None,
        }
    }

    /// A single-plane buffer.
    pub fn single(id: BufferId, addr: u64, len: u32) -> Self {
        Buffer::new(id, &[Plane { addr, len }])
    }

    /// A config buffer: the payload plus the device-visible copy it was
    /// decoded from (which also holds the tile table).
    pub fn config(id: BufferId, addr: u64, len: u32, payload: ConfigPayload) -> Self {
        let mut buf = Buffer::single(id, addr, len);
        buf.config = Some(payload);
        buf
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes[..self.num_planes as usize]
    }

    /// DMA address of plane `p`, if the buffer has that plane.
    pub fn plane_addr(&self, p: usize) -> Option<u64> {
        self.planes().get(p).map(|plane| plane.addr)
    }
}

/// Final state of a retired buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferStatus {
    /// Processed by the engine.
    Done,
    /// Cancelled or refused; contents are undefined.
    Error,
}

/// Everything the owner learns about a buffer when it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub group: GroupId,
    pub channel: ChannelId,
    pub status: BufferStatus,
    /// Monotonic nanoseconds at retirement.
    pub timestamp_ns: u64,
    /// Job sequence number of the owning group.
    pub sequence: u32,
}

/// Receiver of retired buffers (the buffer-queue layer).
///
/// Called from interrupt context with the scheduling lock held: it must
/// not block and must not call back into the backend.
pub trait BufferSink {
    fn retire(&self, buffer: Buffer, completion: Completion);
}
