//! ESP32-S2 address map and default protection policy

use crate::layout::{perms, Capabilities, RegionDescriptor, SplitFloor};
use crate::{Bus, InterruptSource, LinkLayout, Permissions, Region};

pub const NAME: &str = "esp32s2";

/// Size of one unified permission block at the bottom of an SRAM region
pub const UNI_BLOCK_SIZE: u32 = 0x2000;
pub const UNI_BLOCK_COUNT: usize = 4;

/// CPU interrupt shared by memory access errors and cache errors
pub const MEMACCESS_ERR_VECTOR: u8 = 25;

/// Bits of the fault address latched by the status register
pub const FAULT_ADDR_MASK: u32 = 0x003F_FFFC;

const IRAM0_SRAM: RegionDescriptor = RegionDescriptor {
    region: Region::Iram0Sram,
    low: 0x4002_0000,
    high: 0x4006_FFFF,
    caps: Capabilities { exec: true, unified_blocks: true },
    split_floor: SplitFloor::IramTextEnd,
    fault_addr_hi: 0x4000_0000,
    default_permissions: perms(Permissions::RX, Permissions::NONE),
};

const IRAM0_RTCFAST: RegionDescriptor = RegionDescriptor {
    region: Region::Iram0RtcFast,
    low: 0x4007_0000,
    high: 0x4007_1FFF,
    caps: Capabilities { exec: true, unified_blocks: false },
    split_floor: SplitFloor::RtcTextEnd,
    // data above the split
    default_permissions: perms(Permissions::RX, Permissions::RW),
    ..IRAM0_SRAM
};

const DRAM0_SRAM: RegionDescriptor = RegionDescriptor {
    region: Region::Dram0Sram,
    low: 0x3FFB_0000,
    high: 0x3FFF_FFFF,
    caps: Capabilities { exec: false, unified_blocks: true },
    split_floor: SplitFloor::DramDataStart,
    fault_addr_hi: 0x3FC0_0000,
    default_permissions: perms(Permissions::R, Permissions::RW),
};

const DRAM0_RTCFAST: RegionDescriptor = RegionDescriptor {
    region: Region::Dram0RtcFast,
    low: 0x3FF9_E000,
    high: 0x3FF9_FFFF,
    caps: Capabilities { exec: false, unified_blocks: false },
    split_floor: SplitFloor::RtcDummyEnd,
    ..DRAM0_SRAM
};

const PERI1_RTCSLOW: RegionDescriptor = RegionDescriptor {
    region: Region::Peri1RtcSlow,
    low: 0x3F42_1000,
    high: 0x3F42_2FFF,
    caps: Capabilities { exec: false, unified_blocks: false },
    split_floor: SplitFloor::RtcSlowReserved,
    fault_addr_hi: 0x3F40_0000,
    default_permissions: perms(Permissions::R, Permissions::RW),
};

const PERI2_RTCSLOW_0: RegionDescriptor = RegionDescriptor {
    region: Region::Peri2RtcSlow0,
    low: 0x5000_0000,
    high: 0x5000_1FFF,
    caps: Capabilities { exec: true, unified_blocks: false },
    split_floor: SplitFloor::RtcSlowReserved,
    fault_addr_hi: 0x5000_0000,
    default_permissions: perms(Permissions::RX, Permissions::R),
};

const PERI2_RTCSLOW_1: RegionDescriptor = RegionDescriptor {
    region: Region::Peri2RtcSlow1,
    low: 0x6002_1000,
    high: 0x6002_2FFF,
    fault_addr_hi: 0x6000_0000,
    ..PERI2_RTCSLOW_0
};

/// Descriptor of `region` on this target
pub const fn descriptor(region: Region) -> RegionDescriptor {
    match region {
        Region::Iram0Sram => IRAM0_SRAM,
        Region::Iram0RtcFast => IRAM0_RTCFAST,
        Region::Dram0Sram => DRAM0_SRAM,
        Region::Dram0RtcFast => DRAM0_RTCFAST,
        Region::Peri1RtcSlow => PERI1_RTCSLOW,
        Region::Peri2RtcSlow0 => PERI2_RTCSLOW_0,
        Region::Peri2RtcSlow1 => PERI2_RTCSLOW_1,
    }
}

/// Interrupt matrix source of each bus's violation interrupt
pub const fn interrupt_source(bus: Bus) -> InterruptSource {
    match bus {
        Bus::Iram0 => InterruptSource(79),
        Bus::Dram0 => InterruptSource(80),
        Bus::Peri1 => InterruptSource(81),
        Bus::Peri2 => InterruptSource(82),
    }
}

/// Layout of a typical application image, used when no linker symbols are available
pub const DEFAULT_LINK_LAYOUT: LinkLayout = LinkLayout {
    iram_text_end: 0x4002_9A40,
    rtc_text_end: 0x4007_0200,
    dram_data_start: 0x3FFB_C000,
    rtc_dummy_end: 0x3FF9_E200,
    rtc_slow_reserved: 0x200,
};
