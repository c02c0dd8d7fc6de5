//! Fixed-capacity FIFO ring buffer.
//!
//! Storage behind each channel queue. Unlike a lock-free SPSC ring, the
//! head may be inspected in place before it is removed, which the job
//! assembler relies on to look at every channel before committing to a job.
//! Callers provide exclusion (the ring is always held inside a lock).

use core::mem::MaybeUninit;

/// A bounded FIFO holding up to `N` items.
pub struct Ring<T, const N: usize> {
    buffer: [MaybeUninit<T>; N],
    /// Index of the oldest item.
    head: usize,
    /// Number of items stored.
    len: usize,
}

impl<T, const N: usize> Ring<T, N> {
    /// Create a new empty ring.
    pub const fn new() -> Self {
        assert!(N >= 1, "ring must have at least one slot");

        Ring {
            // SAFETY: An array of uninitialized MaybeUninit<T> is always valid.
            buffer: unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() },
            head: 0,
            len: 0,
        }
    }

    /// Append an item at the tail.
    ///
    /// Returns `Err(val)` if the ring is full, returning ownership to the caller.
    pub fn push(&mut self, val: T) -> Result<(), T> {
        if self.len == N {
            return Err(val);
        }
        let tail = (self.head + self.len) % N;
        self.buffer[tail].write(val);
        self.len += 1;
        Ok(())
    }

    /// Borrow the oldest item without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: slots head..head+len are initialized.
        Some(unsafe { self.buffer[self.head].assume_init_ref() })
    }

    /// Remove and return the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: the head slot is initialized and is vacated below.
        let val = unsafe { self.buffer[self.head].assume_init_read() };
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(val)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<T, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Ring::new()
    }
}

impl<T, const N: usize> Drop for Ring<T, N> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop() {
        let mut r: Ring<i32, 3> = Ring::new();
        assert!(r.is_empty());

        r.push(10).unwrap();
        r.push(20).unwrap();
        r.push(30).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.push(40), Err(40));

        assert_eq!(r.pop(), Some(10));
        assert_eq!(r.pop(), Some(20));
        assert_eq!(r.pop(), Some(30));
        assert_eq!(r.pop(), None);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut r: Ring<i32, 4> = Ring::new();
        assert_eq!(r.peek(), None);
        r.push(5).unwrap();
        assert_eq!(r.peek(), Some(&5));
        assert_eq!(r.len(), 1);
        assert_eq!(r.pop(), Some(5));
    }

    #[test]
    fn wraparound() {
        let mut r: Ring<i32, 2> = Ring::new();
        for round in 0..10 {
            let base = round * 100;
            r.push(base + 1).unwrap();
            r.push(base + 2).unwrap();
            assert_eq!(r.peek(), Some(&(base + 1)));
            assert_eq!(r.pop(), Some(base + 1));
            assert_eq!(r.pop(), Some(base + 2));
        }
    }

    #[test]
    fn refill_after_partial_drain_keeps_order() {
        let mut r: Ring<i32, 3> = Ring::new();
        r.push(1).unwrap();
        r.push(2).unwrap();
        r.pop();
        r.push(3).unwrap();
        r.push(4).unwrap();
        assert_eq!(r.push(5), Err(5));
        assert_eq!(r.pop(), Some(2));
        assert_eq!(r.pop(), Some(3));
        assert_eq!(r.pop(), Some(4));
        assert!(r.is_empty());
    }

    #[test]
    fn drop_cleans_up_remaining() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct Trackable;
        impl Drop for Trackable {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::Relaxed);
            }
        }

        DROP_COUNT.store(0, Ordering::Relaxed);
        {
            let mut r: Ring<Trackable, 4> = Ring::new();
            let _ = r.push(Trackable);
            let _ = r.push(Trackable);
        }
        assert_eq!(DROP_COUNT.load(Ordering::Relaxed), 2);
    }
}
