//! Per-bus protection unit

use memprot_core::target;
use memprot_core::{
    AccessDirection, AccessKind, Bus, FaultAccess, InterruptSource, MemprotError, MemprotResult,
    Permissions, Region, RegionInfo, RegionPermissions, RegionTable,
};

use crate::bank::RegisterBank;
use crate::layout::*;

/// Mechanism of one protection bus.
///
/// Setters either complete or fail before touching hardware. A locked
/// bus reports [`MemprotError::Locked`] instead of letting the hardware
/// drop the write. Interrupt enable is never toggled implicitly; the
/// caller owns the disable/configure/enable ordering.
pub trait ProtectionUnit {
    fn bus(&self) -> Bus;

    /// Descriptor of `region`, or an error if the region is not on this bus
    fn region_info(&self, region: Region) -> MemprotResult<&RegionInfo>;

    /// Program the split line and both permission halves. `None` selects
    /// the region's minimum split address.
    fn set_split_and_permissions(
        &mut self,
        region: Region,
        split: Option<u32>,
        perms: RegionPermissions,
    ) -> MemprotResult<()>;

    fn permissions(&self, region: Region) -> MemprotResult<RegionPermissions>;

    fn split_addr(&self, region: Region) -> MemprotResult<u32>;

    fn set_read_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()>;

    fn set_write_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()>;

    fn set_exec_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()>;

    fn set_uni_block_perm(
        &mut self,
        region: Region,
        block: usize,
        perms: Permissions,
    ) -> MemprotResult<()>;

    fn uni_block_perm(&self, region: Region, block: usize) -> MemprotResult<Permissions>;

    fn intr_enable(&mut self, enable: bool) -> MemprotResult<()>;

    fn is_intr_enabled(&self) -> bool;

    /// Raw pending flag of the bus, regardless of region
    fn is_intr_pending(&self) -> bool;

    /// Pending fault whose reconstructed address falls inside `region`
    fn is_interrupt_mine(&self, region: Region) -> bool;

    /// Acknowledge the pending fault. Call once per fault, after reading it.
    fn clear_interrupt(&mut self);

    /// Latched fault address, high bits reconstructed for `region`
    fn fault_address(&self, region: Region) -> MemprotResult<u32>;

    fn fault_access(&self) -> FaultAccess;

    /// Lock the bus until reset
    fn set_lock(&mut self) -> MemprotResult<()>;

    fn is_locked(&self) -> bool;

    fn interrupt_source(&self) -> InterruptSource;

    /// Raw permission register of `region`, for diagnostics
    fn conf_register(&self, region: Region) -> MemprotResult<u32>;

    /// Raw fault status register, for diagnostics
    fn fault_register(&self) -> u32;
}

/// [`ProtectionUnit`] over a PMS register block
#[derive(Debug)]
pub struct PmsUnit<B> {
    layout: &'static BusLayout,
    regions: [Option<RegionInfo>; 2],
    bank: B,
}

impl<B: RegisterBank> PmsUnit<B> {
    pub fn new(bus: Bus, bank: B, table: &RegionTable) -> Self {
        let regions = [0, 1].map(|slot| bus.regions().get(slot).map(|r| *table.lookup(*r)));
        Self {
            layout: bus_layout(bus),
            regions,
            bank,
        }
    }

    pub fn layout(&self) -> &'static BusLayout {
        self.layout
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn into_bank(self) -> B {
        self.bank
    }

    fn conf_regs(&self, region: Region) -> MemprotResult<(RegionInfo, ConfRegs)> {
        let info = *self.region_info(region)?;
        self.layout.conf[region.slot()]
            .map(|regs| (info, regs))
            .ok_or(MemprotError::InvalidRegion(region.bit()))
    }

    fn ensure_unlocked(&self) -> MemprotResult<()> {
        if self.is_locked() {
            log::warn!("{}: write rejected, configuration locked", self.layout.bus);
            Err(MemprotError::Locked(self.layout.bus))
        } else {
            Ok(())
        }
    }

    fn decode_split(&self, info: &RegionInfo, regs: ConfRegs) -> u32 {
        let offset = match regs {
            ConfRegs::Split { split, .. } => self.bank.read(split) & SPLIT_MASK,
            ConfRegs::Combined { conf } => self.bank.read(conf) & CONF_SPLIT_MASK,
        };
        info.low + offset * 4
    }

    fn decode_perms(&self, regs: ConfRegs) -> RegionPermissions {
        let (value, low_shift, high_shift) = match regs {
            ConfRegs::Split { perm, .. } => (self.bank.read(perm), PERM_LOW_SHIFT, PERM_HIGH_SHIFT),
            ConfRegs::Combined { conf } => (self.bank.read(conf), CONF_LOW_SHIFT, CONF_HIGH_SHIFT),
        };
        RegionPermissions::new(
            decode_group(value >> low_shift),
            decode_group(value >> high_shift),
        )
    }

    /// Rewrite the low/high groups only, keeping the split line and unified blocks
    fn write_halves(&mut self, regs: ConfRegs, perms: RegionPermissions) {
        let (offset, low_shift, high_shift) = match regs {
            ConfRegs::Split { perm, .. } => (perm, PERM_LOW_SHIFT, PERM_HIGH_SHIFT),
            ConfRegs::Combined { conf } => (conf, CONF_LOW_SHIFT, CONF_HIGH_SHIFT),
        };
        self.bank.modify(offset, |value| {
            let cleared = value & !(GROUP_MASK << low_shift) & !(GROUP_MASK << high_shift);
            cleared | encode_group(perms.low) << low_shift | encode_group(perms.high) << high_shift
        });
    }

    fn update_perm<F>(&mut self, region: Region, update: F) -> MemprotResult<()>
    where
        F: FnOnce(&mut Permissions, &mut Permissions),
    {
        let (_, regs) = self.conf_regs(region)?;
        self.ensure_unlocked()?;
        let mut perms = self.decode_perms(regs);
        update(&mut perms.low, &mut perms.high);
        critical_section::with(|_| self.write_halves(regs, perms));
        log::debug!("{}: permissions set to {}", region, perms);
        Ok(())
    }
}

impl<B: RegisterBank> ProtectionUnit for PmsUnit<B> {
    fn bus(&self) -> Bus {
        self.layout.bus
    }

    fn region_info(&self, region: Region) -> MemprotResult<&RegionInfo> {
        if region.bus() != self.layout.bus {
            return Err(MemprotError::InvalidRegion(region.bit()));
        }
        self.regions[region.slot()]
            .as_ref()
            .ok_or(MemprotError::InvalidRegion(region.bit()))
    }

    fn set_split_and_permissions(
        &mut self,
        region: Region,
        split: Option<u32>,
        perms: RegionPermissions,
    ) -> MemprotResult<()> {
        let (info, regs) = self.conf_regs(region)?;
        self.ensure_unlocked()?;
        if !info.caps.exec && (perms.low.exec || perms.high.exec) {
            return Err(MemprotError::NotSupported(region));
        }
        let split = match split {
            Some(addr) => info.validate_split(addr)?,
            None => info.min_split,
        };
        let offset = (split - info.low) / 4;
        let low = encode_group(perms.low);
        let high = encode_group(perms.high);

        match regs {
            ConfRegs::Split { perm, split: split_reg } => {
                let mut value = low << PERM_LOW_SHIFT | high << PERM_HIGH_SHIFT;
                for block in 0..info.uni_block_count() {
                    let base = info.uni_block_base(block)?;
                    let group = if base <= split { low } else { high };
                    value |= group << (block as u32 * GROUP_WIDTH);
                }
                critical_section::with(|_| {
                    self.bank.write(split_reg, offset & SPLIT_MASK);
                    self.bank.write(perm, value);
                });
            }
            ConfRegs::Combined { conf } => {
                let value = offset & CONF_SPLIT_MASK | low << CONF_LOW_SHIFT | high << CONF_HIGH_SHIFT;
                self.bank.write(conf, value);
            }
        }

        log::debug!("{}: split 0x{:08X}, {}", region, split, perms);
        Ok(())
    }

    fn permissions(&self, region: Region) -> MemprotResult<RegionPermissions> {
        let (_, regs) = self.conf_regs(region)?;
        Ok(self.decode_perms(regs))
    }

    fn split_addr(&self, region: Region) -> MemprotResult<u32> {
        let (info, regs) = self.conf_regs(region)?;
        Ok(self.decode_split(&info, regs))
    }

    fn set_read_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()> {
        self.update_perm(region, |l, h| {
            l.read = low;
            h.read = high;
        })
    }

    fn set_write_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()> {
        self.update_perm(region, |l, h| {
            l.write = low;
            h.write = high;
        })
    }

    fn set_exec_perm(&mut self, region: Region, low: bool, high: bool) -> MemprotResult<()> {
        let (info, _) = self.conf_regs(region)?;
        self.ensure_unlocked()?;
        if !info.caps.exec {
            return Err(MemprotError::NotSupported(region));
        }
        self.update_perm(region, |l, h| {
            l.exec = low;
            h.exec = high;
        })
    }

    fn set_uni_block_perm(
        &mut self,
        region: Region,
        block: usize,
        perms: Permissions,
    ) -> MemprotResult<()> {
        let (info, regs) = self.conf_regs(region)?;
        self.ensure_unlocked()?;
        info.uni_block_base(block)?;
        if !info.caps.exec && perms.exec {
            return Err(MemprotError::NotSupported(region));
        }
        let ConfRegs::Split { perm, .. } = regs else {
            return Err(MemprotError::NotSupported(region));
        };
        let shift = block as u32 * GROUP_WIDTH;
        self.bank
            .modify(perm, |value| value & !(GROUP_MASK << shift) | encode_group(perms) << shift);
        log::debug!("{}: unified block {} set to {}", region, block, perms);
        Ok(())
    }

    fn uni_block_perm(&self, region: Region, block: usize) -> MemprotResult<Permissions> {
        let (info, regs) = self.conf_regs(region)?;
        info.uni_block_base(block)?;
        let ConfRegs::Split { perm, .. } = regs else {
            return Err(MemprotError::NotSupported(region));
        };
        Ok(decode_group(self.bank.read(perm) >> (block as u32 * GROUP_WIDTH)))
    }

    fn intr_enable(&mut self, enable: bool) -> MemprotResult<()> {
        self.ensure_unlocked()?;
        let intr = self.layout.intr;
        self.bank.modify(intr, |value| {
            let value = value & !(INTR_CLR | INTR_PENDING);
            if enable {
                value | INTR_EN
            } else {
                value & !INTR_EN
            }
        });
        log::debug!("{}: violation interrupt {}", self.layout.bus, if enable { "enabled" } else { "disabled" });
        Ok(())
    }

    fn is_intr_enabled(&self) -> bool {
        self.bank.read(self.layout.intr) & INTR_EN != 0
    }

    fn is_intr_pending(&self) -> bool {
        self.bank.read(self.layout.intr) & INTR_PENDING != 0
    }

    fn is_interrupt_mine(&self, region: Region) -> bool {
        if !self.is_intr_pending() {
            return false;
        }
        match (self.region_info(region), self.fault_address(region)) {
            (Ok(info), Ok(addr)) => info.contains(addr),
            _ => false,
        }
    }

    fn clear_interrupt(&mut self) {
        let intr = self.layout.intr;
        let en = self.bank.read(intr) & INTR_EN;
        self.bank.write(intr, en | INTR_CLR);
        self.bank.write(intr, en);
        log::debug!("{}: violation cleared", self.layout.bus);
    }

    fn fault_address(&self, region: Region) -> MemprotResult<u32> {
        let info = self.region_info(region)?;
        Ok(self.fault_register() & target::FAULT_ADDR_MASK | info.fault_addr_hi)
    }

    fn fault_access(&self) -> FaultAccess {
        let fault = self.fault_register();
        let kind = if fault & FAULT_LOADSTORE != 0 {
            AccessKind::Data
        } else {
            AccessKind::InstructionFetch
        };
        let direction = if fault & FAULT_WR != 0 {
            AccessDirection::Write
        } else {
            AccessDirection::Read
        };
        FaultAccess { kind, direction }
    }

    fn set_lock(&mut self) -> MemprotResult<()> {
        self.ensure_unlocked()?;
        self.bank.write(self.layout.lock, LOCK_BIT);
        log::debug!("{}: configuration locked", self.layout.bus);
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.bank.read(self.layout.lock) & LOCK_BIT != 0
    }

    fn interrupt_source(&self) -> InterruptSource {
        target::interrupt_source(self.layout.bus)
    }

    fn conf_register(&self, region: Region) -> MemprotResult<u32> {
        let (_, regs) = self.conf_regs(region)?;
        Ok(match regs {
            ConfRegs::Split { perm, .. } => self.bank.read(perm),
            ConfRegs::Combined { conf } => self.bank.read(conf),
        })
    }

    fn fault_register(&self) -> u32 {
        self.bank.read(self.layout.fault)
    }
}

fn encode_group(perms: Permissions) -> u32 {
    let mut group = 0;
    if perms.write {
        group |= GROUP_W;
    }
    if perms.read {
        group |= GROUP_R;
    }
    if perms.exec {
        group |= GROUP_X;
    }
    group
}

fn decode_group(bits: u32) -> Permissions {
    Permissions::new(bits & GROUP_R != 0, bits & GROUP_W != 0, bits & GROUP_X != 0)
}
