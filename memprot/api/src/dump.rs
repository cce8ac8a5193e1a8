//! Human-readable configuration dump

use core::fmt::{self, Write};

use memprot_core::{Bus, Platform};
use memprot_ll::ProtectionUnit;

use crate::coordinator::Memprot;

/// Fixed-capacity buffer large enough for a full dump
pub type DumpBuffer = heapless::String<4096>;

impl<U: ProtectionUnit, P: Platform> Memprot<U, P> {
    /// Write the link layout, the region map and the live state of every bus
    pub fn dump_configuration<W: Write>(&self, out: &mut W) -> fmt::Result {
        let layout = self.table().layout();
        writeln!(out, "Memory protection configuration")?;
        writeln!(out, "  iram_text_end:     0x{:08X}", layout.iram_text_end)?;
        writeln!(out, "  rtc_text_end:      0x{:08X}", layout.rtc_text_end)?;
        writeln!(out, "  dram_data_start:   0x{:08X}", layout.dram_data_start)?;
        writeln!(out, "  rtc_dummy_end:     0x{:08X}", layout.rtc_dummy_end)?;
        writeln!(out, "  rtc_slow_reserved: 0x{:X}", layout.rtc_slow_reserved)?;

        for bus in Bus::ALL {
            let unit = self.unit(bus);
            writeln!(
                out,
                "{}: lock={} intr_en={} pending={}",
                bus,
                unit.is_locked() as u8,
                unit.is_intr_enabled() as u8,
                unit.is_intr_pending() as u8
            )?;

            for region in bus.regions().iter().copied() {
                let info = self.region_info(region);
                writeln!(
                    out,
                    "  {}: 0x{:08X}-0x{:08X} min_split=0x{:08X}",
                    region, info.low, info.high, info.min_split
                )?;
                match (unit.split_addr(region), unit.permissions(region)) {
                    (Ok(split), Ok(perms)) => {
                        writeln!(out, "    split=0x{:08X} {}", split, perms)?
                    }
                    (Err(err), _) | (_, Err(err)) => writeln!(out, "    unreadable: {}", err)?,
                }
                for block in 0..info.uni_block_count() {
                    if let Ok(perms) = unit.uni_block_perm(region, block) {
                        writeln!(out, "    block{}={}", block, perms)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Dump into a [`DumpBuffer`]; output past its capacity is dropped
    pub fn dump_to_buffer(&self) -> DumpBuffer {
        let mut buffer = DumpBuffer::new();
        if self.dump_configuration(&mut buffer).is_err() {
            log::warn!("configuration dump truncated at {} bytes", buffer.len());
        }
        buffer
    }
}
