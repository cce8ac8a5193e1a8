//! Protection coordinator tests

use esp_memprot::{
    Bus, ErrorKind, Memprot, MemprotError, Permissions, ProtectionConfig, ProtectionUnit, Region,
    RegionMask, RegionPermissions, RegionTable,
};
use memprot_ll::sim::{SimBank, SimPlatform};
use memprot_ll::PmsUnit;

type SimMemprot = Memprot<PmsUnit<SimBank>, SimPlatform>;

fn memprot_with(platform: SimPlatform) -> SimMemprot {
    Memprot::new(RegionTable::default(), platform, |bus, table| {
        PmsUnit::new(bus, SimBank::new(bus), table)
    })
}

fn memprot() -> SimMemprot {
    memprot_with(SimPlatform::new(1))
}

#[test]
fn test_dram0_sram_scenario() {
    let mut memprot = memprot();
    memprot
        .configure_protection(Region::Dram0Sram.into(), true, true)
        .unwrap();

    assert!(memprot.is_locked(Region::Dram0Sram));
    assert_eq!(
        memprot.permissions(Region::Dram0Sram).unwrap(),
        RegionPermissions::new(
            Permissions::new(true, false, false),
            Permissions::new(true, true, false)
        )
    );
    let err = memprot
        .set_write_perm(Region::Dram0Sram, true, true)
        .unwrap_err();
    assert_eq!(err, MemprotError::Locked(Bus::Dram0));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_default_split_respects_floor() {
    let mut memprot = memprot();
    memprot
        .configure_protection(RegionMask::ALL, false, false)
        .unwrap();
    for region in Region::ALL {
        let split = memprot.split_addr(region).unwrap();
        assert!(split >= memprot.region_info(region).min_split, "{}", region);
        assert_eq!(
            memprot.permissions(region).unwrap(),
            memprot.table().default_permissions(region)
        );
    }
}

#[test]
fn test_debugger_attached_skips_everything() {
    let mut memprot = memprot_with(SimPlatform::new(1).with_debugger(true));
    assert_eq!(
        memprot.configure_protection(RegionMask::ALL, true, true),
        Ok(())
    );
    for bus in Bus::ALL {
        assert_eq!(memprot.unit(bus).bank().write_count(), 0, "{}", bus);
    }
    assert!(memprot.platform().events().is_empty());
    assert!(!memprot.is_locked_any());
    assert!(!memprot.is_intr_ena_any());
    assert!(memprot.active_config().is_none());
}

#[test]
fn test_fault_while_disabled_is_not_reported() {
    let mut memprot = memprot();
    // DRAM0 write sequence: intr off, split, perm, intr on, lock
    memprot
        .unit_mut(Bus::Dram0)
        .bank_mut()
        .arm_violation_after_writes(2, 0x3FFB_1000, true, false);
    memprot
        .configure_protection(Region::Dram0Sram.into(), true, true)
        .unwrap();

    assert!(!memprot.unit(Bus::Dram0).bank().is_armed());
    assert_eq!(memprot.identify_faulting_bus(), None);
}

#[test]
fn test_fault_after_enable_is_reported() {
    let mut memprot = memprot();
    memprot
        .unit_mut(Bus::Dram0)
        .bank_mut()
        .arm_violation_after_writes(4, 0x3FFB_1000, true, false);
    memprot
        .configure_protection(Region::Dram0Sram.into(), true, true)
        .unwrap();

    assert_eq!(memprot.identify_faulting_bus(), Some(Region::Dram0Sram));
    let record = memprot.service_fault().unwrap();
    assert_eq!(record.address, 0x3FFB_1000);
    assert!(record.access.is_write());
}

#[test]
fn test_fault_before_configure_is_reported() {
    let mut memprot = memprot();
    memprot.intr_enable(Region::Iram0Sram, true).unwrap();
    assert!(memprot
        .unit_mut(Bus::Iram0)
        .bank_mut()
        .inject_violation(0x4004_0000, false, true));

    memprot
        .configure_protection(Region::Iram0Sram.into(), true, false)
        .unwrap();

    let record = memprot.service_fault().unwrap();
    assert_eq!(record.region, Region::Iram0Sram);
    assert!(record.access.is_exec());
}

#[test]
fn test_invalid_mask_has_no_side_effects() {
    assert_eq!(
        RegionMask::from_bits(0x100),
        Err(MemprotError::InvalidRegion(0x100))
    );

    let mut memprot = memprot();
    assert_eq!(
        memprot.configure_protection(RegionMask::NONE, true, true),
        Err(MemprotError::EmptyRegionMask)
    );
    for bus in Bus::ALL {
        assert_eq!(memprot.unit(bus).bank().write_count(), 0);
    }
}

#[test]
fn test_locked_bus_aborts_sequence() {
    let mut memprot = memprot();
    memprot
        .configure_protection(Region::Iram0Sram.into(), false, true)
        .unwrap();
    let peri1_writes = memprot.unit(Bus::Peri1).bank().write_count();

    let mask = RegionMask::from(Region::Iram0RtcFast) | Region::Peri1RtcSlow;
    let err = memprot
        .configure_protection(mask, false, true)
        .unwrap_err();
    assert_eq!(err, MemprotError::Locked(Bus::Iram0));
    // IRAM0 is reached first, so PERI1 is never touched
    assert_eq!(memprot.unit(Bus::Peri1).bank().write_count(), peri1_writes);
    assert!(!memprot.unit(Bus::Peri1).is_locked());
}

#[test]
fn test_queries_are_idempotent() {
    let mut memprot = memprot();
    memprot
        .configure_protection(RegionMask::ALL, false, true)
        .unwrap();
    for region in Region::ALL {
        assert_eq!(memprot.permissions(region), memprot.permissions(region));
        assert_eq!(memprot.split_addr(region), memprot.split_addr(region));
        assert_eq!(memprot.is_locked(region), memprot.is_locked(region));
    }
}

#[test]
fn test_split_override_applies_to_its_region() {
    let mut memprot = memprot();
    let split = memprot.region_info(Region::Dram0Sram).min_split + 0x1000;
    let config = ProtectionConfig::builder()
        .regions(RegionMask::from(Region::Dram0Sram) | Region::Iram0Sram)
        .lock_after_configure(false)
        .split_addr(split)
        .build()
        .unwrap();
    memprot.configure(&config).unwrap();

    assert_eq!(memprot.split_addr(Region::Dram0Sram).unwrap(), split);
    assert_eq!(
        memprot.split_addr(Region::Iram0Sram).unwrap(),
        memprot.region_info(Region::Iram0Sram).min_split
    );
    assert_eq!(memprot.active_config().unwrap().split_addr, Some(split));
}

#[test]
fn test_split_override_below_floor_is_rejected() {
    let mut memprot = memprot();
    let floor = memprot.region_info(Region::Iram0Sram).min_split & !3;
    let config = ProtectionConfig::builder()
        .regions(Region::Iram0Sram.into())
        .split_addr(floor - 4)
        .build()
        .unwrap();

    let err = memprot.configure(&config).unwrap_err();
    assert_eq!(err, MemprotError::SplitAddrOutOfRange(floor - 4));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    for bus in Bus::ALL {
        assert_eq!(memprot.unit(bus).bank().write_count(), 0, "{}", bus);
    }
    assert!(memprot.platform().events().is_empty());
    assert!(memprot.active_config().is_none());
}
