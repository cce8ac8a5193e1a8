//! Fault dispatch tests

use esp_memprot::{
    AccessDirection, AccessKind, Bus, Memprot, ProtectionUnit, Region, RegionMask, RegionTable,
};
use memprot_ll::sim::{SimBank, SimPlatform};
use memprot_ll::PmsUnit;

fn configured() -> Memprot<PmsUnit<SimBank>, SimPlatform> {
    let mut memprot = Memprot::new(RegionTable::default(), SimPlatform::new(1), |bus, table| {
        PmsUnit::new(bus, SimBank::new(bus), table)
    });
    memprot
        .configure_protection(RegionMask::ALL, true, true)
        .unwrap();
    memprot
}

/// An address above the split line of `region`
fn address_above_split(memprot: &Memprot<PmsUnit<SimBank>, SimPlatform>, region: Region) -> u32 {
    let info = memprot.region_info(region);
    (info.min_split + info.high) / 2 & !3
}

#[test]
fn test_fault_round_trip_for_every_region() {
    let mut memprot = configured();
    for region in Region::ALL {
        let address = address_above_split(&memprot, region);
        assert!(memprot
            .unit_mut(region.bus())
            .bank_mut()
            .inject_violation(address, true, false));

        assert_eq!(memprot.identify_faulting_bus(), Some(region));
        let record = memprot.build_fault_report(region);
        assert_eq!(record.region, region);
        assert_eq!(record.address, address);
        assert_eq!(record.access.kind, AccessKind::Data);
        assert_eq!(record.access.direction, AccessDirection::Write);

        memprot.clear_interrupt(region);
        assert!(!memprot.unit(region.bus()).is_interrupt_mine(region));
        assert_eq!(memprot.identify_faulting_bus(), None);
    }
}

#[test]
fn test_clear_survives_lock() {
    let mut memprot = configured();
    assert!(memprot.is_locked_any());
    memprot
        .unit_mut(Region::Peri2RtcSlow0.bus())
        .bank_mut()
        .inject_violation(0x5000_1000, false, true);

    let record = memprot.service_fault().unwrap();
    assert_eq!(record.region, Region::Peri2RtcSlow0);
    assert_eq!(record.access.kind, AccessKind::InstructionFetch);
    assert!(memprot.unit(Region::Peri2RtcSlow0.bus()).is_intr_enabled());
    assert_eq!(memprot.service_fault(), None);
}

#[test]
#[should_panic(expected = "unattributed violation")]
fn test_fault_outside_every_region_halts() {
    let mut memprot = configured();
    // below IRAM0_SRAM, still decoded on the IRAM0 bus
    memprot
        .unit_mut(Bus::Iram0)
        .bank_mut()
        .inject_violation(0x4001_0000, true, false);
    assert_eq!(memprot.unattributed_fault(), Some(Bus::Iram0));
    memprot.service_fault();
}
