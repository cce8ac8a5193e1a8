//! Protection coordinator
//!
//! Boot-time sequence, per touched bus:
//!
//! 1. interrupt disabled
//! 2. violation source routed to the memory-access-error vector
//! 3. split line and default permissions written
//! 4. interrupt enabled
//! 5. lock set
//!
//! Writing permissions with the interrupt enabled could fault on a half
//! written configuration, so steps 1 and 4 bracket every write. The
//! first failing step aborts the sequence; nothing is rolled back.

use memprot_core::target;
use memprot_core::{
    Bus, CoreId, MemprotResult, Permissions, Platform, Region, RegionInfo, RegionMask,
    RegionPermissions, RegionTable,
};
use memprot_ll::ProtectionUnit;

use crate::config::ProtectionConfig;

/// Memory protection context: one unit per bus plus the CPU hooks
#[derive(Debug)]
pub struct Memprot<U, P> {
    table: RegionTable,
    units: [U; Bus::COUNT],
    platform: P,
    active: Option<ProtectionConfig>,
}

impl<U: ProtectionUnit, P: Platform> Memprot<U, P> {
    /// Build the context, creating the unit of each bus with `make_unit`
    pub fn new<F>(table: RegionTable, platform: P, mut make_unit: F) -> Self
    where
        F: FnMut(Bus, &RegionTable) -> U,
    {
        let units = Bus::ALL.map(|bus| make_unit(bus, &table));
        Self {
            table,
            units,
            platform,
            active: None,
        }
    }

    pub fn table(&self) -> &RegionTable {
        &self.table
    }

    pub fn region_info(&self, region: Region) -> &RegionInfo {
        self.table.lookup(region)
    }

    pub fn unit(&self, bus: Bus) -> &U {
        &self.units[bus.index()]
    }

    pub fn unit_mut(&mut self, bus: Bus) -> &mut U {
        &mut self.units[bus.index()]
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Configuration applied by the last successful [`configure`](Self::configure)
    pub fn active_config(&self) -> Option<&ProtectionConfig> {
        self.active.as_ref()
    }

    /// Protect `regions` with the target's default policy, routing faults
    /// to core 0
    pub fn configure_protection(
        &mut self,
        regions: RegionMask,
        invoke_fatal_handler: bool,
        lock_after_configure: bool,
    ) -> MemprotResult<()> {
        let config = ProtectionConfig {
            regions,
            invoke_fatal_handler,
            lock_after_configure,
            ..ProtectionConfig::default()
        };
        self.configure(&config)
    }

    /// Run the full protection sequence for `config`.
    ///
    /// With a debugger attached nothing is written and `Ok(())` is
    /// returned. Panics if the debugger probe reads inconsistently or
    /// the hardware does not hold the written configuration.
    pub fn configure(&mut self, config: &ProtectionConfig) -> MemprotResult<()> {
        config.validate(self.platform.core_count())?;
        config.validate_split(&self.table)?;

        if self.platform.debugger_attached() {
            if !self.platform.debugger_attached() {
                log::error!("Fatal error: inconsistent debugger state, possible fault injection");
                panic!("memprot: debugger probe glitch");
            }
            log::info!("debugger attached, memory protection not configured");
            return Ok(());
        }

        for bus in config.regions.buses() {
            self.unit_mut(bus).intr_enable(false)?;
        }

        if config.invoke_fatal_handler {
            for core in config.target_cores.iter().copied() {
                self.route_interrupts(core, config.regions);
            }
        }

        for region in config.regions.iter() {
            let perms = self.table.default_permissions(region);
            let split = self.requested_split(config, region);
            self.unit_mut(region.bus())
                .set_split_and_permissions(region, split, perms)?;
        }

        for bus in config.regions.buses() {
            self.unit_mut(bus).intr_enable(true)?;
        }

        if config.lock_after_configure {
            for bus in config.regions.buses() {
                self.unit_mut(bus).set_lock()?;
            }
        }

        self.verify(config);
        self.active = Some(config.clone());
        log::info!(
            "memory protection enabled for {} (lock: {})",
            config.regions,
            config.lock_after_configure
        );
        Ok(())
    }

    fn route_interrupts(&mut self, core: CoreId, regions: RegionMask) {
        let vector = target::MEMACCESS_ERR_VECTOR;
        self.platform.disable_cpu_interrupt(core, vector);
        for bus in regions.buses() {
            let source = self.units[bus.index()].interrupt_source();
            self.platform.route_interrupt(core, source, vector);
            log::debug!("{}: {} routed to {} vector {}", bus, source, core, vector);
        }
        self.platform.enable_cpu_interrupt(core, vector);
    }

    fn requested_split(&self, config: &ProtectionConfig, region: Region) -> Option<u32> {
        config
            .split_addr
            .filter(|addr| self.table.lookup(region).contains(*addr))
    }

    /// Read back everything [`configure`](Self::configure) wrote
    fn verify(&self, config: &ProtectionConfig) {
        for region in config.regions.iter() {
            let unit = self.unit(region.bus());
            let expected_split = self
                .requested_split(config, region)
                .unwrap_or(self.table.lookup(region).min_split);
            let split = unit.split_addr(region).ok();
            if split != Some(expected_split) {
                log::error!(
                    "Fatal error: {} split address configuration corrupted (expected 0x{:08X}, stored {:?})",
                    region,
                    expected_split,
                    split
                );
                panic!("memprot: {} split address corrupted", region);
            }

            let expected = self.table.default_permissions(region);
            let perms = unit.permissions(region).ok();
            if perms != Some(expected) {
                log::error!(
                    "Fatal error: {} permission configuration corrupted (expected {}, stored {:?})",
                    region,
                    expected,
                    perms
                );
                panic!("memprot: {} permissions corrupted", region);
            }
        }

        for bus in config.regions.buses() {
            let unit = self.unit(bus);
            if !unit.is_intr_enabled() {
                log::error!("Fatal error: {} interrupt enable configuration corrupted", bus);
                panic!("memprot: {} interrupt enable corrupted", bus);
            }
            if config.lock_after_configure && !unit.is_locked() {
                log::error!("Fatal error: {} lock configuration corrupted", bus);
                panic!("memprot: {} lock corrupted", bus);
            }
        }
    }

    pub fn set_split_and_permissions(
        &mut self,
        region: Region,
        split: Option<u32>,
        perms: RegionPermissions,
    ) -> MemprotResult<()> {
        self.unit_mut(region.bus())
            .set_split_and_permissions(region, split, perms)
    }

    pub fn permissions(&self, region: Region) -> MemprotResult<RegionPermissions> {
        self.unit(region.bus()).permissions(region)
    }

    pub fn split_addr(&self, region: Region) -> MemprotResult<u32> {
        self.unit(region.bus()).split_addr(region)
    }

    pub fn set_read_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()> {
        self.unit_mut(region.bus()).set_read_perm(region, low, high)
    }

    pub fn set_write_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()> {
        self.unit_mut(region.bus()).set_write_perm(region, low, high)
    }

    pub fn set_exec_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()> {
        self.unit_mut(region.bus()).set_exec_perm(region, low, high)
    }

    pub fn set_uni_block_perm(
        &mut self,
        region: Region,
        block: usize,
        perms: Permissions,
    ) -> MemprotResult<()> {
        self.unit_mut(region.bus())
            .set_uni_block_perm(region, block, perms)
    }

    pub fn uni_block_perm(&self, region: Region, block: usize) -> MemprotResult<Permissions> {
        self.unit(region.bus()).uni_block_perm(region, block)
    }

    pub fn intr_enable(&mut self, region: Region, enable: bool) -> MemprotResult<()> {
        self.unit_mut(region.bus()).intr_enable(enable)
    }

    /// Lock the bus of `region`; its sibling regions are locked with it
    pub fn set_lock(&mut self, region: Region) -> MemprotResult<()> {
        self.unit_mut(region.bus()).set_lock()
    }

    pub fn is_locked(&self, region: Region) -> bool {
        self.unit(region.bus()).is_locked()
    }

    pub fn is_locked_any(&self) -> bool {
        self.units.iter().any(|unit| unit.is_locked())
    }

    pub fn is_intr_ena_any(&self) -> bool {
        self.units.iter().any(|unit| unit.is_intr_enabled())
    }
}
