//! Fault dispatch
//!
//! All buses share one interrupt line. The owner of a pending violation
//! is found by polling the units in [`Region::ALL`] order; the first
//! match wins when several buses are pending at once.

use memprot_core::{Bus, FaultRecord, Platform, Region};
use memprot_ll::ProtectionUnit;

use crate::coordinator::Memprot;

impl<U: ProtectionUnit, P: Platform> Memprot<U, P> {
    /// Region whose bus holds a pending violation, if any
    pub fn identify_faulting_bus(&self) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|region| self.unit(region.bus()).is_interrupt_mine(*region))
    }

    /// Bus with a pending violation whose address no region on it claims
    pub fn unattributed_fault(&self) -> Option<Bus> {
        Bus::ALL.into_iter().find(|bus| {
            let unit = self.unit(*bus);
            unit.is_intr_pending() && !bus.regions().iter().any(|r| unit.is_interrupt_mine(*r))
        })
    }

    /// Alias of [`identify_faulting_bus`](Self::identify_faulting_bus)
    pub fn active_interrupt(&self) -> Option<Region> {
        self.identify_faulting_bus()
    }

    /// Read the fault latched for `region` without clearing it.
    ///
    /// Panics if the latched address does not belong to `region`; the
    /// hardware and the descriptor table disagree about the address map.
    pub fn build_fault_report(&self, region: Region) -> FaultRecord {
        let unit = self.unit(region.bus());
        let address = match unit.fault_address(region) {
            Ok(address) => address,
            Err(err) => {
                log::error!("Fatal error: fault address of {} unreadable: {}", region, err);
                panic!("memprot: fault record of {} unreadable", region);
            }
        };

        let owner = self.table().region_on_bus(region.bus(), address);
        if owner != Some(region) {
            log::error!(
                "Fatal error: fault at 0x{:08X} reported for {} but maps to {:?}",
                address,
                region,
                owner
            );
            panic!("memprot: fault attribution mismatch for {}", region);
        }

        FaultRecord {
            region,
            address,
            access: unit.fault_access(),
        }
    }

    /// Acknowledge the violation pending on the bus of `region`
    pub fn clear_interrupt(&mut self, region: Region) {
        self.unit_mut(region.bus()).clear_interrupt();
    }

    /// Interrupt handler body: identify, read, then clear.
    ///
    /// Panics if a bus is pending but its fault address lies outside
    /// every region of that bus; left alone it would retrigger forever.
    pub fn service_fault(&mut self) -> Option<FaultRecord> {
        let Some(region) = self.identify_faulting_bus() else {
            if let Some(bus) = self.unattributed_fault() {
                let fault = self.unit(bus).fault_register();
                log::error!(
                    "Fatal error: {} violation pending but fault register 0x{:08X} matches no region",
                    bus,
                    fault
                );
                panic!("memprot: unattributed violation on {}", bus);
            }
            return None;
        };
        let record = self.build_fault_report(region);
        self.clear_interrupt(region);
        log::debug!("{}", record);
        Some(record)
    }
}
