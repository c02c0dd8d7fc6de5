//! Completion timestamps.

/// Monotonic time source, read once per retired job.
pub trait Clock {
    /// Nanoseconds since an arbitrary fixed point. Must never go backwards.
    fn now_ns(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
}
