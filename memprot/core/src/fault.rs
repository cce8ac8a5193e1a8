//! Fault records captured from a protection unit

use core::fmt;

use crate::Region;

/// Instruction fetch or data access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessKind {
    InstructionFetch,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessDirection {
    Read,
    Write,
}

/// Operation type latched by the fault status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultAccess {
    pub kind: AccessKind,
    pub direction: AccessDirection,
}

impl FaultAccess {
    pub const fn is_write(self) -> bool {
        matches!(self.direction, AccessDirection::Write)
    }

    pub const fn is_exec(self) -> bool {
        matches!(self.kind, AccessKind::InstructionFetch)
    }
}

impl fmt::Display for FaultAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.direction) {
            (AccessKind::InstructionFetch, _) => f.write_str("EXECUTE"),
            (AccessKind::Data, AccessDirection::Read) => f.write_str("READ"),
            (AccessKind::Data, AccessDirection::Write) => f.write_str("WRITE"),
        }
    }
}

/// Attributed violation, read once from hardware and then cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultRecord {
    pub region: Region,
    pub address: u32,
    pub access: FaultAccess,
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} violation at 0x{:08X} in {}",
            self.access, self.address, self.region
        )
    }
}
