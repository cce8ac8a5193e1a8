use esp_memprot::{Bus, Permissions, ProtectionUnit, Region, RegionMask};

use crate::{Report, ReportFormatter, Snapshot};

/// Snapshot of a device after the default boot-time configuration
fn configured_snapshot() -> Snapshot {
    let mut memprot = Snapshot::power_on().to_memprot();
    memprot
        .configure_protection(RegionMask::ALL, true, true)
        .unwrap();
    memprot
        .unit_mut(Bus::Dram0)
        .bank_mut()
        .inject_violation(0x3FFB_0010, true, false);

    let mut snapshot = Snapshot::power_on();
    snapshot.banks.iram0 = memprot.unit(Bus::Iram0).bank().words().to_vec();
    snapshot.banks.dram0 = memprot.unit(Bus::Dram0).bank().words().to_vec();
    snapshot.banks.peri1 = memprot.unit(Bus::Peri1).bank().words().to_vec();
    snapshot.banks.peri2 = memprot.unit(Bus::Peri2).bank().words().to_vec();
    snapshot
}

#[test]
fn power_on_report_is_idle() {
    let memprot = Snapshot::power_on().to_memprot();
    let report = Report::decode(&memprot).unwrap();
    assert_eq!(report.fault, None);
    assert!(report.buses.iter().all(|bus| !bus.locked && !bus.intr_enabled));
    let text = ReportFormatter::new(false).render_text(&report);
    assert!(text.ends_with("no pending violation\n"));
}

#[test]
fn decodes_configured_device() {
    let snapshot = configured_snapshot();
    let memprot = snapshot.to_memprot();
    let report = Report::decode(&memprot).unwrap();

    assert!(report.buses.iter().all(|bus| bus.locked && bus.intr_enabled));
    let dram = &report.buses[Bus::Dram0.index()];
    assert!(dram.intr_pending);
    let sram = &dram.regions[0];
    assert_eq!(sram.region, Region::Dram0Sram);
    assert_eq!(sram.split, sram.min_split);
    assert_eq!(sram.permissions.low, Permissions::R);
    assert_eq!(sram.permissions.high, Permissions::RW);
    assert_eq!(sram.uni_blocks.len(), 4);

    let fault = report.fault.unwrap();
    assert_eq!(fault.region, Region::Dram0Sram);
    assert_eq!(fault.address, 0x3FFB_0010);

    // decoding leaves the fault latched
    assert!(memprot.unit(Bus::Dram0).is_intr_pending());
}

#[test]
fn text_and_json_rendering() {
    let memprot = configured_snapshot().to_memprot();
    let report = Report::decode(&memprot).unwrap();
    let formatter = ReportFormatter::new(false);

    let text = formatter.render_text(&report);
    assert!(text.contains("DRAM0  LOCKED intr on"));
    assert!(text.contains("low r--  high rw-"));
    assert!(text.contains("VIOLATION WRITE violation at 0x3FFB0010 in DRAM0_SRAM"));

    let json: serde_json::Value = serde_json::from_str(&formatter.render_json(&report).unwrap()).unwrap();
    assert_eq!(json["fault"]["region"], "Dram0Sram");
    assert_eq!(json["buses"][0]["bus"], "Iram0");
    assert_eq!(json["buses"][0]["locked"], true);
}
