//! Register block layout of each protection bus
//!
//! Field encoding shared by all buses:
//!
//! | register | bits                                                         |
//! |----------|--------------------------------------------------------------|
//! | LOCK     | `[0]` lock, sticky until reset                               |
//! | PERM     | `[3b+2:3b]` unified block `b`, `[14:12]` low, `[17:15]` high |
//! | SPLIT    | `[16:0]` split word offset from the region base              |
//! | CONF     | `[10:0]` split word offset, `[13:11]` low, `[16:14]` high    |
//! | INTR     | `[0]` clear, `[1]` enable, `[2]` pending (read only)         |
//! | FAULT    | `[0]` write, `[1]` data access, `[21:2]` address             |
//!
//! A permission group is `W` at bit 0, `R` at bit 1, `X` at bit 2.

use memprot_core::Bus;

pub const LOCK_BIT: u32 = 1 << 0;

pub const INTR_CLR: u32 = 1 << 0;
pub const INTR_EN: u32 = 1 << 1;
pub const INTR_PENDING: u32 = 1 << 2;

pub const FAULT_WR: u32 = 1 << 0;
pub const FAULT_LOADSTORE: u32 = 1 << 1;

pub const GROUP_W: u32 = 1 << 0;
pub const GROUP_R: u32 = 1 << 1;
pub const GROUP_X: u32 = 1 << 2;
pub const GROUP_MASK: u32 = 0b111;
pub const GROUP_WIDTH: u32 = 3;

pub const PERM_LOW_SHIFT: u32 = 12;
pub const PERM_HIGH_SHIFT: u32 = 15;
pub const SPLIT_MASK: u32 = 0x1_FFFF;

pub const CONF_SPLIT_MASK: u32 = 0x7FF;
pub const CONF_LOW_SHIFT: u32 = 11;
pub const CONF_HIGH_SHIFT: u32 = 14;

/// Configuration registers of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfRegs {
    /// Permission and split line in separate registers (SRAM)
    Split { perm: usize, split: usize },
    /// Permission and split line packed in one register (RTC, PERI)
    Combined { conf: usize },
}

/// Register block of one bus. Offsets are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLayout {
    pub bus: Bus,
    /// Physical base address of the block
    pub base: usize,
    pub lock: usize,
    pub intr: usize,
    pub fault: usize,
    /// Indexed by `Region::slot`
    pub conf: [Option<ConfRegs>; 2],
}

impl BusLayout {
    /// Size of the block in words
    pub const fn words(&self) -> usize {
        let mut end = self.lock;
        if self.intr > end {
            end = self.intr;
        }
        if self.fault > end {
            end = self.fault;
        }
        end / 4 + 1
    }
}

#[cfg(feature = "esp32s2")]
mod esp32s2 {
    use super::{BusLayout, ConfRegs};
    use memprot_core::Bus;

    const PMS_BASE: usize = 0x3F4C_1000;

    pub const IRAM0: BusLayout = BusLayout {
        bus: Bus::Iram0,
        base: PMS_BASE + 0x0A8,
        lock: 0x00,
        intr: 0x10,
        fault: 0x14,
        conf: [
            Some(ConfRegs::Split { perm: 0x04, split: 0x08 }),
            Some(ConfRegs::Combined { conf: 0x0C }),
        ],
    };

    pub const DRAM0: BusLayout = BusLayout {
        bus: Bus::Dram0,
        base: PMS_BASE + 0x0C0,
        ..IRAM0
    };

    pub const PERI1: BusLayout = BusLayout {
        bus: Bus::Peri1,
        base: PMS_BASE + 0x0D8,
        lock: 0x00,
        intr: 0x08,
        fault: 0x0C,
        conf: [Some(ConfRegs::Combined { conf: 0x04 }), None],
    };

    pub const PERI2: BusLayout = BusLayout {
        bus: Bus::Peri2,
        base: PMS_BASE + 0x0F0,
        lock: 0x00,
        intr: 0x0C,
        fault: 0x10,
        conf: [
            Some(ConfRegs::Combined { conf: 0x04 }),
            Some(ConfRegs::Combined { conf: 0x08 }),
        ],
    };
}

/// Register block layout of `bus` on this target
#[cfg(feature = "esp32s2")]
pub const fn bus_layout(bus: Bus) -> &'static BusLayout {
    match bus {
        Bus::Iram0 => &esp32s2::IRAM0,
        Bus::Dram0 => &esp32s2::DRAM0,
        Bus::Peri1 => &esp32s2::PERI1,
        Bus::Peri2 => &esp32s2::PERI2,
    }
}
