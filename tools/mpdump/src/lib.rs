//! Host-side decoding of memory protection register snapshots.
//!
//! A snapshot is the raw register words of the four PMS banks, dumped
//! from a device (JTAG memory read, core dump) as JSON. It is loaded into
//! simulated banks and decoded through the same protection units the
//! firmware uses, so the report reflects the driver's view of the
//! hardware. Decoding never clears a latched fault.

mod report;
mod snapshot;

pub use report::{BusReport, RegionReport, Report, ReportFormatter};
pub use snapshot::{Banks, Snapshot, SnapshotError};

#[cfg(test)]
mod tests;
