//! Per-channel pending-buffer queue.
//!
//! Each queue has its own short interrupt-masking lock, taken only to link
//! or unlink a buffer. The scheduling lock may be held while a queue lock
//! is taken, never the other way round.
//!
//! Submitters only ever append at the tail, and only holders of the
//! scheduling lock remove from the head. So a head observed under the
//! scheduling lock stays the head until that lock is released.

use crate::buffer::Buffer;
use crate::constants::QUEUE_DEPTH;
use crate::lock::IrqMutex;
use crate::ring::Ring;

/// FIFO of buffers submitted on one channel and not yet part of a job.
pub struct ChannelQueue {
    ready: IrqMutex<Ring<Buffer, QUEUE_DEPTH>>,
}

impl ChannelQueue {
    pub const fn new() -> Self {
        ChannelQueue {
            ready: IrqMutex::new(Ring::new()),
        }
    }

    /// Append a buffer. Returns it back if the queue is full.
    pub fn submit(&self, buffer: Buffer) -> Result<(), Buffer> {
        self.ready.lock(|ring| ring.push(buffer))
    }

    /// Inspect the head buffer in place.
    pub fn with_head<R>(&self, f: impl FnOnce(&Buffer) -> R) -> Option<R> {
        self.ready.lock(|ring| ring.peek().map(f))
    }

    pub fn has_head(&self) -> bool {
        !self.is_empty()
    }

    pub fn pop_head(&self) -> Option<Buffer> {
        self.ready.lock(|ring| ring.pop())
    }

    /// Remove every pending buffer, oldest first, handing each to `f`.
    ///
    /// Returns how many were removed.
    pub fn cancel_all_pending(&self, mut f: impl FnMut(Buffer)) -> usize {
        let mut count = 0;
        while let Some(buffer) = self.pop_head() {
            f(buffer);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.ready.lock(|ring| ring.len())
    }

    pub fn is_empty(&self) -> bool {
        self.ready.lock(|ring| ring.is_empty())
    }
}

impl Default for ChannelQueue {
    fn default() -> Self {
        ChannelQueue::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferId;

    fn buf(id: u32) -> Buffer {
        Buffer::single(BufferId(id), 0x1000 * id as u64, 64)
    }

    #[test]
    fn fifo_order() {
        let q = ChannelQueue::new();
        q.submit(buf(1)).unwrap();
        q.submit(buf(2)).unwrap();
        assert_eq!(q.with_head(|b| b.id), Some(BufferId(1)));
        assert_eq!(q.pop_head().map(|b| b.id), Some(BufferId(1)));
        assert_eq!(q.pop_head().map(|b| b.id), Some(BufferId(2)));
        assert!(q.pop_head().is_none());
    }

    #[test]
    fn full_queue_returns_buffer() {
        let q = ChannelQueue::new();
        for i in 0..QUEUE_DEPTH as u32 {
            q.submit(buf(i)).unwrap();
        }
        let rejected = q.submit(buf(99)).unwrap_err();
        assert_eq!(rejected.id, BufferId(99));
        assert_eq!(q.len(), QUEUE_DEPTH);
    }

    #[test]
    fn cancel_drains_in_order() {
        let q = ChannelQueue::new();
        q.submit(buf(1)).unwrap();
        q.submit(buf(2)).unwrap();
        q.submit(buf(3)).unwrap();

        let mut seen = [0u32; 3];
        let mut n = 0;
        let count = q.cancel_all_pending(|b| {
            seen[n] = b.id.0;
            n += 1;
        });
        assert_eq!(count, 3);
        assert_eq!(seen, [1, 2, 3]);
        assert!(q.is_empty());
    }
}
