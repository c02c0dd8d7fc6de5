//! Lock shared between thread code and the Back End interrupt handler.
//!
//! Every entry goes through [`critical_section::with`], so while the lock
//! is held the interrupt cannot preempt the holder on the local core. On
//! Cortex-M that is cortex-m's `critical-section-single-core`.

use core::cell::RefCell;

use critical_section::Mutex;

pub(crate) struct IrqMutex<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> IrqMutex<T> {
    pub(crate) const fn new(value: T) -> Self {
        IrqMutex {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` on the guarded value with interrupts masked.
    ///
    /// Panics if `f` locks the same value again.
    pub(crate) fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_returns_closure_result() {
        let m = IrqMutex::new(3u32);
        let doubled = m.lock(|v| {
            *v *= 2;
            *v
        });
        assert_eq!(doubled, 6);
        assert_eq!(m.lock(|v| *v), 6);
    }

    #[test]
    fn distinct_locks_nest() {
        let outer = IrqMutex::new(1u32);
        let inner = IrqMutex::new(2u32);
        let sum = outer.lock(|a| inner.lock(|b| *a + *b));
        assert_eq!(sum, 3);
    }

    #[test]
    fn usable_inside_an_open_critical_section() {
        let m = IrqMutex::new(0u32);
        critical_section::with(|_| m.lock(|v| *v = 5));
        assert_eq!(m.lock(|v| *v), 5);
    }
}
