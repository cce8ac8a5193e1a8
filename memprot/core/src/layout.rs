//! Region descriptor table
//!
//! Fixed per-target address bounds combined with the link-time layout of
//! the running firmware. The minimum split address of each region keeps
//! the split line from carving into the firmware's own code or data.

use crate::target;
use crate::{Bus, MemprotError, MemprotResult, Permissions, Region, RegionPermissions};

/// Split addresses are programmed as word offsets
pub const SPLIT_ALIGN: u32 = 4;

/// Section boundaries produced by the linker.
///
/// On the device these come from linker symbols (`memprot-ll`, feature
/// `rt`); hosts construct them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkLayout {
    /// End of executable code in internal IRAM
    pub iram_text_end: u32,
    /// End of code placed in RTC fast memory
    pub rtc_text_end: u32,
    /// Start of initialized data in internal DRAM
    pub dram_data_start: u32,
    /// End of the DRAM alias reserved for RTC fast code
    pub rtc_dummy_end: u32,
    /// Bytes of RTC slow memory reserved by the firmware
    pub rtc_slow_reserved: u32,
}

impl Default for LinkLayout {
    fn default() -> Self {
        target::DEFAULT_LINK_LAYOUT
    }
}

/// Which link-time boundary bounds a region's split line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitFloor {
    IramTextEnd,
    RtcTextEnd,
    DramDataStart,
    RtcDummyEnd,
    RtcSlowReserved,
}

impl SplitFloor {
    fn resolve(self, layout: &LinkLayout, low: u32) -> u32 {
        match self {
            SplitFloor::IramTextEnd => layout.iram_text_end,
            SplitFloor::RtcTextEnd => layout.rtc_text_end,
            SplitFloor::DramDataStart => layout.dram_data_start,
            SplitFloor::RtcDummyEnd => layout.rtc_dummy_end,
            SplitFloor::RtcSlowReserved => low.saturating_add(layout.rtc_slow_reserved),
        }
    }
}

/// Hardware features of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    pub exec: bool,
    pub unified_blocks: bool,
}

/// Compiled-in description of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub region: Region,
    pub low: u32,
    pub high: u32,
    pub caps: Capabilities,
    pub split_floor: SplitFloor,
    /// Address bits above the fault register's 22-bit window
    pub fault_addr_hi: u32,
    pub default_permissions: RegionPermissions,
}

/// Resolved view of one region for the current firmware image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionInfo {
    pub region: Region,
    pub low: u32,
    pub high: u32,
    pub min_split: u32,
    pub caps: Capabilities,
    pub fault_addr_hi: u32,
}

impl RegionInfo {
    pub const fn bus(&self) -> Bus {
        self.region.bus()
    }

    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.low && addr <= self.high
    }

    /// Check a requested split address against this region
    pub fn validate_split(&self, addr: u32) -> MemprotResult<u32> {
        if addr % SPLIT_ALIGN != 0 {
            return Err(MemprotError::SplitAddrUnaligned(addr));
        }
        if addr < self.min_split || addr > self.high {
            return Err(MemprotError::SplitAddrOutOfRange(addr));
        }
        Ok(addr)
    }

    /// Number of unified blocks (zero when unsupported)
    pub const fn uni_block_count(&self) -> usize {
        if self.caps.unified_blocks {
            target::UNI_BLOCK_COUNT
        } else {
            0
        }
    }

    /// Lowest address of unified block `block`
    pub fn uni_block_base(&self, block: usize) -> MemprotResult<u32> {
        if !self.caps.unified_blocks {
            return Err(MemprotError::NotSupported(self.region));
        }
        if block >= target::UNI_BLOCK_COUNT {
            return Err(MemprotError::InvalidBlock(block));
        }
        Ok(self.low + block as u32 * target::UNI_BLOCK_SIZE)
    }

    /// Index of the unified block holding `addr`, if any
    pub fn uni_block_containing(&self, addr: u32) -> Option<usize> {
        if !self.caps.unified_blocks || addr < self.low {
            return None;
        }
        let block = ((addr - self.low) / target::UNI_BLOCK_SIZE) as usize;
        (block < target::UNI_BLOCK_COUNT).then_some(block)
    }
}

/// Region descriptor table for the current target and firmware image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTable {
    layout: LinkLayout,
    regions: [RegionInfo; Region::COUNT],
}

impl RegionTable {
    pub fn new(layout: LinkLayout) -> Self {
        let regions = Region::ALL.map(|region| {
            let desc = target::descriptor(region);
            RegionInfo {
                region,
                low: desc.low,
                high: desc.high,
                min_split: normalize_split(desc.split_floor.resolve(&layout, desc.low), desc.low, desc.high),
                caps: desc.caps,
                fault_addr_hi: desc.fault_addr_hi,
            }
        });
        Self { layout, regions }
    }

    pub fn layout(&self) -> &LinkLayout {
        &self.layout
    }

    /// Descriptor of `region`. Total over the region enum.
    pub fn lookup(&self, region: Region) -> &RegionInfo {
        &self.regions[region.index()]
    }

    /// Region whose bounds contain `addr`; the first match in dispatch order wins
    pub fn region_containing(&self, addr: u32) -> Option<Region> {
        self.regions
            .iter()
            .find(|info| info.contains(addr))
            .map(|info| info.region)
    }

    /// Same as [`region_containing`](Self::region_containing) but restricted to `bus`
    pub fn region_on_bus(&self, bus: Bus, addr: u32) -> Option<Region> {
        bus.regions()
            .iter()
            .copied()
            .find(|region| self.lookup(*region).contains(addr))
    }

    /// Default policy of the target for `region`
    pub fn default_permissions(&self, region: Region) -> RegionPermissions {
        let perms = target::descriptor(region).default_permissions;
        if self.lookup(region).caps.exec {
            perms
        } else {
            RegionPermissions::new(perms.low.without_exec(), perms.high.without_exec())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionInfo> {
        self.regions.iter()
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new(LinkLayout::default())
    }
}

/// Word-align up and clamp into the region
fn normalize_split(addr: u32, low: u32, high: u32) -> u32 {
    let aligned = addr.saturating_add(SPLIT_ALIGN - 1) & !(SPLIT_ALIGN - 1);
    aligned.clamp(low, high & !(SPLIT_ALIGN - 1))
}

/// Shorthand used by target descriptor tables
pub(crate) const fn perms(low: Permissions, high: Permissions) -> RegionPermissions {
    RegionPermissions::new(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rounds_up_and_clamps() {
        assert_eq!(normalize_split(0x1001, 0x1000, 0x1FFF), 0x1004);
        assert_eq!(normalize_split(0x0800, 0x1000, 0x1FFF), 0x1000);
        assert_eq!(normalize_split(0x3000, 0x1000, 0x1FFF), 0x1FFC);
    }

    #[test]
    fn table_rows_follow_enum_order() {
        let table = RegionTable::default();
        for (info, region) in table.iter().zip(Region::ALL) {
            assert_eq!(info.region, region);
            assert!(info.low < info.high);
            assert!(info.contains(info.min_split));
            assert_eq!(info.min_split % SPLIT_ALIGN, 0);
        }
    }

    #[test]
    fn uni_block_math() {
        let table = RegionTable::default();
        let sram = table.lookup(Region::Iram0Sram);
        assert_eq!(sram.uni_block_count(), target::UNI_BLOCK_COUNT);
        assert_eq!(sram.uni_block_base(1), Ok(sram.low + target::UNI_BLOCK_SIZE));
        assert_eq!(sram.uni_block_containing(sram.low + 3), Some(0));
        assert_eq!(sram.uni_block_base(target::UNI_BLOCK_COUNT), Err(MemprotError::InvalidBlock(4)));

        let rtc = table.lookup(Region::Iram0RtcFast);
        assert_eq!(rtc.uni_block_base(0), Err(MemprotError::NotSupported(Region::Iram0RtcFast)));
        assert_eq!(rtc.uni_block_containing(rtc.low), None);
    }
}
