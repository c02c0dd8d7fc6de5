//! Raw register access.

use core::ptr::{read_volatile, write_volatile};

/// 32-bit register read/write at byte offsets from the block base.
pub trait RegisterBus {
    fn read(&mut self, offset: u32) -> u32;
    fn write(&mut self, offset: u32, value: u32);
}

/// Memory-mapped register block.
pub struct MmioBus {
    base: *mut u32,
}

// SAFETY: The bus only performs volatile accesses to device memory, and the
// backend serialises every access through its scheduling lock.
unsafe impl Send for MmioBus {}

impl MmioBus {
    /// Wrap a mapped register block.
    ///
    /// # Safety
    /// `base` must point to the Back End register block, mapped as device
    /// memory, and stay valid for the lifetime of the bus.
    pub unsafe fn new(base: *mut u32) -> Self {
        MmioBus { base }
    }
}

impl RegisterBus for MmioBus {
    #[inline]
    fn read(&mut self, offset: u32) -> u32 {
        // SAFETY: `new` requires a valid mapping covering every offset used.
        unsafe { read_volatile(self.base.add((offset / 4) as usize)) }
    }

    #[inline]
    fn write(&mut self, offset: u32, value: u32) {
        // SAFETY: as above.
        unsafe { write_volatile(self.base.add((offset / 4) as usize), value) }
    }
}
