//! Hooks into the CPU and interrupt matrix the driver depends on

use core::fmt;

use crate::CoreId;

/// Peripheral interrupt source number in the interrupt matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterruptSource(pub u16);

impl fmt::Display for InterruptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

/// CPU services used by the protection coordinator.
///
/// Implemented by the board support code on the device and by
/// `memprot_ll::sim::SimPlatform` on the host.
pub trait Platform {
    /// True while an on-chip debugger is attached to the calling core
    fn debugger_attached(&self) -> bool;

    /// Number of CPU cores on the target
    fn core_count(&self) -> u8;

    /// Mask the CPU interrupt line `vector` on `core`
    fn disable_cpu_interrupt(&mut self, core: CoreId, vector: u8);

    /// Unmask the CPU interrupt line `vector` on `core`
    fn enable_cpu_interrupt(&mut self, core: CoreId, vector: u8);

    /// Route `source` to CPU interrupt `vector` on `core`
    fn route_interrupt(&mut self, core: CoreId, source: InterruptSource, vector: u8);
}
