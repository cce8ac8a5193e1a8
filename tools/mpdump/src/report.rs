//! Decoded protection state and its text/JSON rendering

use std::fmt::Write;

use colored::Colorize;
use esp_memprot::{
    Bus, FaultRecord, LinkLayout, MemprotResult, Permissions, ProtectionUnit, Region,
    RegionPermissions,
};
use serde::Serialize;

use crate::snapshot::SnapshotMemprot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionReport {
    pub region: Region,
    pub low: u32,
    pub high: u32,
    pub min_split: u32,
    pub split: u32,
    pub permissions: RegionPermissions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uni_blocks: Vec<Permissions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusReport {
    pub bus: Bus,
    pub locked: bool,
    pub intr_enabled: bool,
    pub intr_pending: bool,
    pub conf_registers: Vec<u32>,
    pub fault_register: u32,
    pub regions: Vec<RegionReport>,
}

/// Everything decoded from one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub layout: LinkLayout,
    pub buses: Vec<BusReport>,
    /// Latched violation, attributed but left pending
    pub fault: Option<FaultRecord>,
}

impl Report {
    pub fn decode(memprot: &SnapshotMemprot) -> MemprotResult<Self> {
        let mut buses = Vec::with_capacity(Bus::COUNT);
        for bus in Bus::ALL {
            let unit = memprot.unit(bus);
            let mut regions = Vec::new();
            let mut conf_registers = Vec::new();
            for region in bus.regions().iter().copied() {
                let info = memprot.region_info(region);
                let uni_blocks = (0..info.uni_block_count())
                    .map(|block| unit.uni_block_perm(region, block))
                    .collect::<MemprotResult<Vec<_>>>()?;
                conf_registers.push(unit.conf_register(region)?);
                regions.push(RegionReport {
                    region,
                    low: info.low,
                    high: info.high,
                    min_split: info.min_split,
                    split: unit.split_addr(region)?,
                    permissions: unit.permissions(region)?,
                    uni_blocks,
                });
            }
            buses.push(BusReport {
                bus,
                locked: unit.is_locked(),
                intr_enabled: unit.is_intr_enabled(),
                intr_pending: unit.is_intr_pending(),
                conf_registers,
                fault_register: unit.fault_register(),
                regions,
            });
        }

        let fault = memprot
            .identify_faulting_bus()
            .map(|region| memprot.build_fault_report(region));

        Ok(Self {
            layout: *memprot.table().layout(),
            buses,
            fault,
        })
    }
}

/// Renders a [`Report`] for the terminal
pub struct ReportFormatter {
    color: bool,
}

impl ReportFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn render_json(&self, report: &Report) -> serde_json::Result<String> {
        serde_json::to_string_pretty(report)
    }

    pub fn render_text(&self, report: &Report) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.write_text(&mut out, report);
        out
    }

    fn write_text(&self, out: &mut String, report: &Report) -> std::fmt::Result {
        for bus in &report.buses {
            let lock = if bus.locked {
                self.paint("LOCKED", |s| s.bright_green().bold())
            } else {
                self.paint("unlocked", |s| s.yellow())
            };
            let intr = if bus.intr_enabled {
                self.paint("intr on", |s| s.green())
            } else {
                self.paint("intr off", |s| s.yellow())
            };
            writeln!(out, "{:6} {} {}", self.paint(bus.bus.name(), |s| s.bold()), lock, intr)?;
            if bus.intr_pending && report.fault.map(|f| f.region.bus()) != Some(bus.bus) {
                writeln!(
                    out,
                    "       {} (fault register 0x{:08X} matches no region)",
                    self.paint("pending", |s| s.bright_red()),
                    bus.fault_register
                )?;
            }

            for region in &bus.regions {
                writeln!(
                    out,
                    "  {:16} 0x{:08X}..0x{:08X} split 0x{:08X} (min 0x{:08X})",
                    region.region.name(),
                    region.low,
                    region.high,
                    region.split,
                    region.min_split
                )?;
                writeln!(
                    out,
                    "  {:16} low {}  high {}",
                    "",
                    self.perms(region.permissions.low),
                    self.perms(region.permissions.high)
                )?;
                if !region.uni_blocks.is_empty() {
                    let blocks: Vec<String> = region
                        .uni_blocks
                        .iter()
                        .map(|perms| self.perms(*perms))
                        .collect();
                    writeln!(out, "  {:16} blocks {}", "", blocks.join(" "))?;
                }
            }
        }

        match &report.fault {
            Some(fault) => writeln!(
                out,
                "{} {}",
                self.paint("VIOLATION", |s| s.bright_red().bold()),
                fault
            ),
            None => writeln!(out, "no pending violation"),
        }
    }

    fn perms(&self, perms: Permissions) -> String {
        let text = perms.to_string();
        if perms.write && perms.exec {
            self.paint(&text, |s| s.bright_red())
        } else {
            text
        }
    }

    fn paint<F>(&self, text: &str, style: F) -> String
    where
        F: FnOnce(&str) -> colored::ColoredString,
    {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}
