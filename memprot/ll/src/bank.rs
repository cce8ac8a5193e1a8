//! Register bank access

use core::ptr;

use memprot_core::Bus;

use crate::layout::bus_layout;

/// Word-addressed view of one bus's register block.
///
/// Offsets are in bytes from the start of the block and always word
/// aligned.
pub trait RegisterBank {
    fn read(&self, offset: usize) -> u32;

    fn write(&mut self, offset: usize, value: u32);

    /// Read-modify-write
    fn modify<F>(&mut self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }
}

/// Memory-mapped register block
#[derive(Debug)]
pub struct MmioBank {
    base: usize,
}

impl MmioBank {
    /// # Safety
    ///
    /// `base` must be the address of a PMS register block that stays
    /// mapped for the program's lifetime, and no other `MmioBank` may be
    /// created for the same block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Register block of `bus` at its fixed address on this target
    ///
    /// # Safety
    ///
    /// Same contract as [`MmioBank::new`].
    pub const unsafe fn for_bus(bus: Bus) -> Self {
        Self::new(bus_layout(bus).base)
    }

    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBank for MmioBank {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` guarantees the block is mapped; offsets come from
        // the bus layout tables and stay inside the block.
        unsafe { ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&mut self, offset: usize, value: u32) {
        // SAFETY: see `read`
        unsafe { ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}
