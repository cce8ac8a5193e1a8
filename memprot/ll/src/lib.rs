#![no_std]

//! # Memprot LL
//!
//! Low-level half of the memory protection driver. A [`PmsUnit`] drives
//! one protection bus through a [`RegisterBank`]; on the device the bank
//! is memory mapped ([`MmioBank`]), on the host it is the register
//! simulator in [`sim`].
//!
//! `unsafe` is confined to [`bank`] and [`link`].

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bank;
pub mod layout;
pub mod unit;

#[cfg(feature = "rt")]
pub mod link;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use bank::{MmioBank, RegisterBank};
pub use layout::{bus_layout, BusLayout, ConfRegs};
pub use unit::{PmsUnit, ProtectionUnit};
