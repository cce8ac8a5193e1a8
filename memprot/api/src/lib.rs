#![no_std]
#![forbid(unsafe_code)]

//! # ESP Memprot
//!
//! Memory protection driver for the PMS units of Espressif SoCs.
//!
//! [`Memprot`] owns one [`ProtectionUnit`] per bus and drives the boot
//! time protection sequence ([`Memprot::configure_protection`]); the
//! fault dispatch half ([`Memprot::service_fault`]) runs from the
//! memory-access-error interrupt. [`MemprotCell`] lets both live behind a
//! `static`.
//!
//! ```ignore
//! static MEMPROT: MemprotCell<PmsUnit<MmioBank>, BoardPlatform> = MemprotCell::new();
//!
//! let table = RegionTable::new(memprot_ll::link::link_layout());
//! let memprot = Memprot::new(table, BoardPlatform::take(), |bus, table| {
//!     PmsUnit::new(bus, unsafe { MmioBank::for_bus(bus) }, table)
//! });
//! MEMPROT.install(memprot);
//! MEMPROT.with(|m| m.configure(&ProtectionConfig::default()));
//! ```

#[cfg(test)]
extern crate std;

pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod dump;
pub mod global;

pub use config::{ProtectionConfig, ProtectionConfigBuilder, MAX_CORES};
pub use coordinator::Memprot;
pub use dump::DumpBuffer;
pub use global::MemprotCell;

pub use memprot_core::*;
pub use memprot_ll::{MmioBank, PmsUnit, ProtectionUnit, RegisterBank};
