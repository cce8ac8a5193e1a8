//! Region and bus identifiers

use core::fmt;

use crate::{MemprotError, MemprotResult};

/// Protection bus. Each bus has one lock bit and one interrupt enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bus {
    Iram0,
    Dram0,
    Peri1,
    Peri2,
}

impl Bus {
    /// Number of buses
    pub const COUNT: usize = 4;

    /// All buses in bank order
    pub const ALL: [Bus; Bus::COUNT] = [Bus::Iram0, Bus::Dram0, Bus::Peri1, Bus::Peri2];

    /// Dense index, usable for per-bus arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Bus::Iram0 => "IRAM0",
            Bus::Dram0 => "DRAM0",
            Bus::Peri1 => "PERI1",
            Bus::Peri2 => "PERI2",
        }
    }

    /// Regions served by this bus
    pub const fn regions(self) -> &'static [Region] {
        match self {
            Bus::Iram0 => &[Region::Iram0Sram, Region::Iram0RtcFast],
            Bus::Dram0 => &[Region::Dram0Sram, Region::Dram0RtcFast],
            Bus::Peri1 => &[Region::Peri1RtcSlow],
            Bus::Peri2 => &[Region::Peri2RtcSlow0, Region::Peri2RtcSlow1],
        }
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Protectable memory window.
///
/// Declaration order is the fault dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    Iram0Sram,
    Iram0RtcFast,
    Dram0Sram,
    Dram0RtcFast,
    Peri1RtcSlow,
    Peri2RtcSlow0,
    Peri2RtcSlow1,
}

impl Region {
    /// Number of regions
    pub const COUNT: usize = 7;

    /// All regions in dispatch order
    pub const ALL: [Region; Region::COUNT] = [
        Region::Iram0Sram,
        Region::Iram0RtcFast,
        Region::Dram0Sram,
        Region::Dram0RtcFast,
        Region::Peri1RtcSlow,
        Region::Peri2RtcSlow0,
        Region::Peri2RtcSlow1,
    ];

    /// Dense index, usable for per-region arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Mask bit of this region (ESP-IDF `MEMPROT_*` value)
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Convert a single ESP-IDF mask bit into a region
    pub fn from_bits(raw: u32) -> MemprotResult<Self> {
        Region::ALL
            .iter()
            .copied()
            .find(|region| region.bit() == raw)
            .ok_or(MemprotError::InvalidRegion(raw))
    }

    pub const fn bus(self) -> Bus {
        match self {
            Region::Iram0Sram | Region::Iram0RtcFast => Bus::Iram0,
            Region::Dram0Sram | Region::Dram0RtcFast => Bus::Dram0,
            Region::Peri1RtcSlow => Bus::Peri1,
            Region::Peri2RtcSlow0 | Region::Peri2RtcSlow1 => Bus::Peri2,
        }
    }

    /// Position of this region among its bus's regions
    pub const fn slot(self) -> usize {
        match self {
            Region::Iram0Sram | Region::Dram0Sram | Region::Peri1RtcSlow | Region::Peri2RtcSlow0 => 0,
            Region::Iram0RtcFast | Region::Dram0RtcFast | Region::Peri2RtcSlow1 => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Region::Iram0Sram => "IRAM0_SRAM",
            Region::Iram0RtcFast => "IRAM0_RTCFAST",
            Region::Dram0Sram => "DRAM0_SRAM",
            Region::Dram0RtcFast => "DRAM0_RTCFAST",
            Region::Peri1RtcSlow => "PERI1_RTCSLOW",
            Region::Peri2RtcSlow0 => "PERI2_RTCSLOW_0",
            Region::Peri2RtcSlow1 => "PERI2_RTCSLOW_1",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of regions, bit-compatible with the ESP-IDF `mem_type_prot_t` mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionMask(u32);

impl RegionMask {
    pub const NONE: RegionMask = RegionMask(0);
    pub const ALL: RegionMask = RegionMask((1 << Region::COUNT as u32) - 1);

    /// Validate a raw mask; unknown bits are rejected
    pub fn from_bits(raw: u32) -> MemprotResult<Self> {
        let unknown = raw & !Self::ALL.0;
        if unknown != 0 {
            Err(MemprotError::InvalidRegion(unknown))
        } else {
            Ok(RegionMask(raw))
        }
    }

    pub const fn from_region(region: Region) -> Self {
        RegionMask(region.bit())
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, region: Region) -> bool {
        self.0 & region.bit() != 0
    }

    pub const fn with(self, region: Region) -> Self {
        RegionMask(self.0 | region.bit())
    }

    pub const fn union(self, other: RegionMask) -> Self {
        RegionMask(self.0 | other.0)
    }

    /// Regions in the mask, in dispatch order
    pub fn iter(self) -> impl Iterator<Item = Region> {
        Region::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    /// True if any region of `bus` is in the mask
    pub fn touches(self, bus: Bus) -> bool {
        bus.regions().iter().any(|r| self.contains(*r))
    }

    /// Buses with at least one region in the mask, in bank order
    pub fn buses(self) -> impl Iterator<Item = Bus> {
        Bus::ALL.into_iter().filter(move |b| self.touches(*b))
    }
}

impl From<Region> for RegionMask {
    fn from(region: Region) -> Self {
        RegionMask::from_region(region)
    }
}

impl core::ops::BitOr for RegionMask {
    type Output = RegionMask;

    fn bitor(self, rhs: RegionMask) -> RegionMask {
        self.union(rhs)
    }
}

impl core::ops::BitOr<Region> for RegionMask {
    type Output = RegionMask;

    fn bitor(self, rhs: Region) -> RegionMask {
        self.with(rhs)
    }
}

impl fmt::Display for RegionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for region in self.iter() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(region.name())?;
            first = false;
        }
        Ok(())
    }
}
