#![no_std]
#![forbid(unsafe_code)]

//! # Memprot Core
//!
//! Target-independent vocabulary of the memory protection (PMS) driver:
//! region and bus identifiers, permission sets, fault records, the
//! region descriptor table and the platform hooks the coordinator needs.
//!
//! The concrete address map is compiled in per target through a cargo
//! feature (`esp32s2`).

#[cfg(any(test, feature = "std"))]
extern crate std;

use core::fmt;

pub mod fault;
pub mod layout;
pub mod perms;
pub mod platform;
pub mod region;
pub mod target;

pub use fault::*;
pub use layout::*;
pub use perms::*;
pub use platform::*;
pub use region::*;

/// Driver version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the memory protection driver
pub type MemprotResult<T> = Result<T, MemprotError>;

/// Error class, matching the `esp_err_t` taxonomy of the C driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Bad identifier, address or mask; nothing was touched
    InvalidArgument,
    /// The bus is locked until the next reset
    InvalidState,
    /// The region lacks the hardware capability
    NotSupported,
}

/// Error types for memory protection operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemprotError {
    /// Raw region identifier or mask bit unknown on this target
    InvalidRegion(u32),
    /// Region mask selects nothing
    EmptyRegionMask,
    /// Split address outside the region or below its minimum
    SplitAddrOutOfRange(u32),
    /// Split address not word aligned
    SplitAddrUnaligned(u32),
    /// Unified block index out of range
    InvalidBlock(usize),
    /// Core index not present on this target, or listed twice
    InvalidCore(u8),
    /// Configuration of the bus is locked
    Locked(Bus),
    /// Region has no hardware for the requested operation
    NotSupported(Region),
}

impl MemprotError {
    /// Classify the error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            MemprotError::InvalidRegion(_)
            | MemprotError::EmptyRegionMask
            | MemprotError::SplitAddrOutOfRange(_)
            | MemprotError::SplitAddrUnaligned(_)
            | MemprotError::InvalidBlock(_)
            | MemprotError::InvalidCore(_) => ErrorKind::InvalidArgument,
            MemprotError::Locked(_) => ErrorKind::InvalidState,
            MemprotError::NotSupported(_) => ErrorKind::NotSupported,
        }
    }

    /// ESP-IDF `esp_err_t` value for this error
    pub const fn code(&self) -> i32 {
        const ESP_ERR_INVALID_ARG: i32 = 0x102;
        const ESP_ERR_INVALID_STATE: i32 = 0x103;
        const ESP_ERR_NOT_SUPPORTED: i32 = 0x106;
        const ESP_ERR_MEMPROT_BASE: i32 = 0xd000;

        match self {
            MemprotError::InvalidRegion(_) => ESP_ERR_MEMPROT_BASE + 1,
            MemprotError::EmptyRegionMask => ESP_ERR_INVALID_ARG,
            MemprotError::SplitAddrOutOfRange(_) => ESP_ERR_MEMPROT_BASE + 3,
            MemprotError::SplitAddrUnaligned(_) => ESP_ERR_MEMPROT_BASE + 4,
            MemprotError::InvalidBlock(_) => ESP_ERR_MEMPROT_BASE + 5,
            MemprotError::InvalidCore(_) => ESP_ERR_MEMPROT_BASE + 8,
            MemprotError::Locked(_) => ESP_ERR_INVALID_STATE,
            MemprotError::NotSupported(_) => ESP_ERR_NOT_SUPPORTED,
        }
    }
}

impl fmt::Display for MemprotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemprotError::InvalidRegion(raw) => write!(f, "Invalid memory region 0x{:08X}", raw),
            MemprotError::EmptyRegionMask => write!(f, "Region mask selects no region"),
            MemprotError::SplitAddrOutOfRange(addr) => {
                write!(f, "Split address 0x{:08X} out of range", addr)
            }
            MemprotError::SplitAddrUnaligned(addr) => {
                write!(f, "Split address 0x{:08X} not word aligned", addr)
            }
            MemprotError::InvalidBlock(block) => write!(f, "Invalid unified block {}", block),
            MemprotError::InvalidCore(core) => write!(f, "Invalid CPU core {}", core),
            MemprotError::Locked(bus) => write!(f, "{} configuration is locked", bus),
            MemprotError::NotSupported(region) => {
                write!(f, "Operation not supported on {}", region)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MemprotError {}

#[cfg(feature = "defmt")]
impl defmt::Format for MemprotError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            MemprotError::InvalidRegion(raw) => defmt::write!(fmt, "InvalidRegion({=u32:#x})", raw),
            MemprotError::EmptyRegionMask => defmt::write!(fmt, "EmptyRegionMask"),
            MemprotError::SplitAddrOutOfRange(addr) => {
                defmt::write!(fmt, "SplitAddrOutOfRange({=u32:#x})", addr)
            }
            MemprotError::SplitAddrUnaligned(addr) => {
                defmt::write!(fmt, "SplitAddrUnaligned({=u32:#x})", addr)
            }
            MemprotError::InvalidBlock(block) => defmt::write!(fmt, "InvalidBlock({})", block),
            MemprotError::InvalidCore(core) => defmt::write!(fmt, "InvalidCore({})", core),
            MemprotError::Locked(bus) => defmt::write!(fmt, "Locked({})", bus),
            MemprotError::NotSupported(region) => defmt::write!(fmt, "NotSupported({})", region),
        }
    }
}

/// CPU core identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreId(u8);

impl CoreId {
    /// Protocol (boot) core
    pub const PRO: CoreId = CoreId(0);

    /// Application core
    pub const APP: CoreId = CoreId(1);

    /// Create a core identifier without validation against the target
    pub const fn new(index: u8) -> Self {
        CoreId(index)
    }

    /// Raw core index
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CoreId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "CPU{}", self.0);
    }
}
