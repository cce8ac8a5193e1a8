//! Protection unit tests against the register simulator

use memprot_core::{
    Bus, ErrorKind, MemprotError, Permissions, Region, RegionPermissions, RegionTable,
};
use memprot_ll::sim::SimBank;
use memprot_ll::{PmsUnit, ProtectionUnit};

fn units(table: &RegionTable) -> [PmsUnit<SimBank>; Bus::COUNT] {
    Bus::ALL.map(|bus| PmsUnit::new(bus, SimBank::new(bus), table))
}

#[test]
fn test_every_region_round_trips_defaults() {
    let table = RegionTable::default();
    let mut units = units(&table);
    for region in Region::ALL {
        let unit = &mut units[region.bus().index()];
        let perms = table.default_permissions(region);
        unit.set_split_and_permissions(region, None, perms).unwrap();
        assert_eq!(unit.permissions(region).unwrap(), perms, "{}", region);
        assert!(unit.split_addr(region).unwrap() >= table.lookup(region).min_split);
    }
}

#[test]
fn test_lock_is_one_way_for_every_bus() {
    let table = RegionTable::default();
    let mut units = units(&table);
    for unit in units.iter_mut() {
        let bus = unit.bus();
        let region = bus.regions()[0];
        unit.set_split_and_permissions(region, None, table.default_permissions(region))
            .unwrap();
        unit.set_lock().unwrap();
        let snapshot = unit.bank().words().to_vec();

        for result in [
            unit.set_split_and_permissions(region, None, RegionPermissions::default()),
            unit.set_read_perm(region, false, false),
            unit.set_write_perm(region, true, true),
            unit.set_exec_perm(region, true, true),
        ] {
            let err = result.unwrap_err();
            assert_eq!(err, MemprotError::Locked(bus));
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
        assert_eq!(unit.bank().words(), snapshot.as_slice());
    }
}

#[test]
fn test_explicit_split_is_honoured() {
    let table = RegionTable::default();
    let mut unit = PmsUnit::new(Bus::Dram0, SimBank::new(Bus::Dram0), &table);
    let info = table.lookup(Region::Dram0Sram);
    let split = info.min_split + 0x1000;
    unit.set_split_and_permissions(
        Region::Dram0Sram,
        Some(split),
        RegionPermissions::new(Permissions::R, Permissions::RW),
    )
    .unwrap();
    assert_eq!(unit.split_addr(Region::Dram0Sram), Ok(split));
    assert_eq!(unit.split_addr(Region::Dram0RtcFast), Ok(table.lookup(Region::Dram0RtcFast).low));
}

#[test]
fn test_clear_interrupt_acknowledges_once() {
    let table = RegionTable::default();
    let mut unit = PmsUnit::new(Bus::Dram0, SimBank::new(Bus::Dram0), &table);
    unit.intr_enable(true).unwrap();

    assert!(unit.bank_mut().inject_violation(0x3FFC_0000, true, false));
    // a second violation is not latched until the first is cleared
    assert!(!unit.bank_mut().inject_violation(0x3FF9_E100, false, false));
    assert_eq!(unit.fault_address(Region::Dram0Sram), Ok(0x3FFC_0000));

    unit.clear_interrupt();
    assert!(!unit.is_interrupt_mine(Region::Dram0Sram));

    assert!(unit.bank_mut().inject_violation(0x3FF9_E100, false, false));
    assert!(unit.is_interrupt_mine(Region::Dram0RtcFast));
}

#[test]
fn test_disabled_unit_does_not_latch() {
    let table = RegionTable::default();
    let mut unit = PmsUnit::new(Bus::Iram0, SimBank::new(Bus::Iram0), &table);
    unit.intr_enable(true).unwrap();
    unit.intr_enable(false).unwrap();
    assert!(!unit.is_intr_enabled());
    assert!(!unit.bank_mut().inject_violation(0x4003_0000, false, true));
    assert!(!unit.is_interrupt_mine(Region::Iram0Sram));
}
