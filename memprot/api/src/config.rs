//! Protection request

use heapless::Vec;
use memprot_core::{CoreId, MemprotError, MemprotResult, RegionMask, RegionTable};

/// Largest core count of any supported target
pub const MAX_CORES: usize = 2;

/// What [`Memprot::configure`](crate::Memprot::configure) should set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionConfig {
    /// Regions to protect with the target's default policy
    pub regions: RegionMask,
    /// Route violations to the memory-access-error vector
    pub invoke_fatal_handler: bool,
    /// Lock every touched bus once configured
    pub lock_after_configure: bool,
    /// Cores whose interrupt matrix gets the violation sources
    pub target_cores: Vec<CoreId, MAX_CORES>,
    /// Split line for the requested SRAM region containing it. The other
    /// regions, and RTC memory always, use their minimum split.
    pub split_addr: Option<u32>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        let mut target_cores = Vec::new();
        // capacity is at least one
        let _ = target_cores.push(CoreId::PRO);
        Self {
            regions: RegionMask::ALL,
            invoke_fatal_handler: true,
            lock_after_configure: true,
            target_cores,
            split_addr: None,
        }
    }
}

impl ProtectionConfig {
    pub fn builder() -> ProtectionConfigBuilder {
        ProtectionConfigBuilder::default()
    }

    /// Reject requests that cannot be applied on a target with `core_count` cores.
    /// Performs no hardware access.
    pub fn validate(&self, core_count: u8) -> MemprotResult<()> {
        if self.regions.is_empty() {
            return Err(MemprotError::EmptyRegionMask);
        }
        if self.target_cores.is_empty() {
            return Err(MemprotError::InvalidCore(0));
        }
        for (i, core) in self.target_cores.iter().enumerate() {
            if core.raw() >= core_count || self.target_cores[..i].contains(core) {
                return Err(MemprotError::InvalidCore(core.raw()));
            }
        }
        Ok(())
    }

    /// Check [`split_addr`](Self::split_addr) against the requested regions
    pub fn validate_split(&self, table: &RegionTable) -> MemprotResult<()> {
        let Some(addr) = self.split_addr else {
            return Ok(());
        };
        let info = self
            .regions
            .iter()
            .map(|region| table.lookup(region))
            .find(|info| info.caps.unified_blocks && info.contains(addr))
            .ok_or(MemprotError::SplitAddrOutOfRange(addr))?;
        info.validate_split(addr).map(|_| ())
    }
}

/// Builder for [`ProtectionConfig`]
#[derive(Debug, Clone, Default)]
pub struct ProtectionConfigBuilder {
    config: ProtectionConfig,
    explicit_cores: bool,
    rejected_core: Option<CoreId>,
}

impl ProtectionConfigBuilder {
    pub fn regions(mut self, regions: RegionMask) -> Self {
        self.config.regions = regions;
        self
    }

    pub fn invoke_fatal_handler(mut self, enable: bool) -> Self {
        self.config.invoke_fatal_handler = enable;
        self
    }

    pub fn lock_after_configure(mut self, enable: bool) -> Self {
        self.config.lock_after_configure = enable;
        self
    }

    pub fn split_addr(mut self, addr: u32) -> Self {
        self.config.split_addr = Some(addr);
        self
    }

    /// Add a target core. The first call replaces the default (core 0).
    pub fn target_core(mut self, core: CoreId) -> Self {
        if !self.explicit_cores {
            self.config.target_cores.clear();
            self.explicit_cores = true;
        }
        if self.config.target_cores.push(core).is_err() {
            self.rejected_core.get_or_insert(core);
        }
        self
    }

    /// Fails if more cores were added than any target has
    pub fn build(self) -> MemprotResult<ProtectionConfig> {
        match self.rejected_core {
            Some(core) => Err(MemprotError::InvalidCore(core.raw())),
            None => Ok(self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memprot_core::Region;

    #[test]
    fn default_matches_esp_idf() {
        let config = ProtectionConfig::default();
        assert_eq!(config.regions, RegionMask::ALL);
        assert!(config.invoke_fatal_handler);
        assert!(config.lock_after_configure);
        assert_eq!(config.target_cores.as_slice(), &[CoreId::PRO]);
    }

    #[test]
    fn builder_replaces_default_core() {
        let config = ProtectionConfig::builder()
            .regions(Region::Dram0Sram.into())
            .lock_after_configure(false)
            .target_core(CoreId::APP)
            .build()
            .unwrap();
        assert_eq!(config.regions.bits(), 0x04);
        assert!(!config.lock_after_configure);
        assert_eq!(config.target_cores.as_slice(), &[CoreId::APP]);
    }

    #[test]
    fn builder_rejects_too_many_cores() {
        let result = ProtectionConfig::builder()
            .target_core(CoreId::PRO)
            .target_core(CoreId::APP)
            .target_core(CoreId::new(2))
            .build();
        assert_eq!(result, Err(MemprotError::InvalidCore(2)));
    }

    #[test]
    fn validate_checks_cores() {
        let mut config = ProtectionConfig::default();
        assert_eq!(config.validate(1), Ok(()));

        config.target_cores.push(CoreId::APP).unwrap();
        assert_eq!(config.validate(1), Err(MemprotError::InvalidCore(1)));
        assert_eq!(config.validate(2), Ok(()));

        config.target_cores[1] = CoreId::PRO;
        assert_eq!(config.validate(2), Err(MemprotError::InvalidCore(0)));

        config.target_cores.clear();
        assert_eq!(config.validate(2), Err(MemprotError::InvalidCore(0)));
    }

    #[test]
    fn split_override_must_hit_requested_sram() {
        let table = RegionTable::default();
        let floor = table.lookup(Region::Dram0Sram).min_split;
        let mut config = ProtectionConfig::builder()
            .regions(RegionMask::from(Region::Dram0Sram) | Region::Dram0RtcFast)
            .split_addr(floor + 0x1000)
            .build()
            .unwrap();
        assert_eq!(config.validate_split(&table), Ok(()));

        config.split_addr = Some(floor - 4);
        assert_eq!(
            config.validate_split(&table),
            Err(MemprotError::SplitAddrOutOfRange(floor - 4))
        );

        config.split_addr = Some(floor + 2);
        assert_eq!(
            config.validate_split(&table),
            Err(MemprotError::SplitAddrUnaligned(floor + 2))
        );

        // RTC fast memory always takes its default line
        config.split_addr = Some(0x3FF9_F000);
        assert_eq!(
            config.validate_split(&table),
            Err(MemprotError::SplitAddrOutOfRange(0x3FF9_F000))
        );

        config.regions = Region::Iram0Sram.into();
        config.split_addr = Some(floor + 0x1000);
        assert!(config.validate_split(&table).is_err());
    }

    #[test]
    fn validate_checks_mask() {
        let config = ProtectionConfig {
            regions: RegionMask::NONE,
            ..Default::default()
        };
        assert_eq!(config.validate(2), Err(MemprotError::EmptyRegionMask));
    }
}
