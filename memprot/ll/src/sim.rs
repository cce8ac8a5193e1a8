//! Host-side register simulator
//!
//! [`SimBank`] models the write gating of a PMS register block: the lock
//! bit is sticky, configuration and interrupt-enable writes are dropped
//! while locked, the clear bit keeps working, and a violation only
//! latches while the interrupt is enabled and nothing is pending.

use core::cell::Cell;

use heapless::Vec;
use memprot_core::target;
use memprot_core::{Bus, CoreId, InterruptSource, Platform};

use crate::bank::RegisterBank;
use crate::layout::*;

const MAX_WORDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedViolation {
    after_writes: usize,
    addr: u32,
    write: bool,
    exec: bool,
}

/// Simulated register block of one bus
#[derive(Debug, Clone)]
pub struct SimBank {
    layout: &'static BusLayout,
    regs: [u32; MAX_WORDS],
    stuck_zero: [u32; MAX_WORDS],
    writes: usize,
    armed: Option<ArmedViolation>,
}

impl SimBank {
    /// Power-on state: everything zero
    pub fn new(bus: Bus) -> Self {
        Self {
            layout: bus_layout(bus),
            regs: [0; MAX_WORDS],
            stuck_zero: [0; MAX_WORDS],
            writes: 0,
            armed: None,
        }
    }

    pub fn bus(&self) -> Bus {
        self.layout.bus
    }

    /// Register writes seen since creation, including dropped ones
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Raw register words, `words()` long
    pub fn words(&self) -> &[u32] {
        &self.regs[..self.layout.words()]
    }

    /// Load a raw value, bypassing the write gating (snapshot restore)
    pub fn poke(&mut self, offset: usize, value: u32) {
        if let Some(reg) = self.regs.get_mut(offset / 4) {
            *reg = value;
        }
    }

    /// Make `mask` bits of a configuration register ignore writes of one
    pub fn set_stuck_at_zero(&mut self, offset: usize, mask: u32) {
        if let Some(stuck) = self.stuck_zero.get_mut(offset / 4) {
            *stuck = mask;
        }
    }

    fn locked(&self) -> bool {
        self.regs[self.layout.lock / 4] & LOCK_BIT != 0
    }

    /// Present a denied access to the unit. Returns true if it latched.
    pub fn inject_violation(&mut self, addr: u32, write: bool, exec: bool) -> bool {
        let intr = self.regs[self.layout.intr / 4];
        if intr & INTR_EN == 0 || intr & (INTR_PENDING | INTR_CLR) != 0 {
            return false;
        }
        let mut fault = addr & target::FAULT_ADDR_MASK;
        if write {
            fault |= FAULT_WR;
        }
        if !exec {
            fault |= FAULT_LOADSTORE;
        }
        self.regs[self.layout.fault / 4] = fault;
        self.regs[self.layout.intr / 4] = intr | INTR_PENDING;
        true
    }

    /// Inject a violation right after the `n`-th subsequent register write
    pub fn arm_violation_after_writes(&mut self, n: usize, addr: u32, write: bool, exec: bool) {
        self.armed = Some(ArmedViolation {
            after_writes: self.writes + n,
            addr,
            write,
            exec,
        });
    }

    /// True until the armed violation has fired
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.regs[self.layout.intr / 4] & INTR_PENDING != 0
    }
}

impl RegisterBank for SimBank {
    fn read(&self, offset: usize) -> u32 {
        self.regs.get(offset / 4).copied().unwrap_or(0)
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.writes += 1;
        let locked = self.locked();
        let index = offset / 4;

        if offset == self.layout.lock {
            self.regs[index] |= value & LOCK_BIT;
        } else if offset == self.layout.intr {
            let current = self.regs[index];
            let en = if locked { current & INTR_EN } else { value & INTR_EN };
            let mut pending = current & INTR_PENDING;
            if value & INTR_CLR != 0 {
                pending = 0;
                self.regs[self.layout.fault / 4] = 0;
            }
            self.regs[index] = en | pending | value & INTR_CLR;
        } else if offset == self.layout.fault {
            // read only
        } else if !locked && index < MAX_WORDS {
            self.regs[index] = value & !self.stuck_zero[index];
        }

        if let Some(armed) = self.armed {
            if self.writes >= armed.after_writes {
                self.armed = None;
                self.inject_violation(armed.addr, armed.write, armed.exec);
            }
        }
    }
}

/// CPU-side call recorded by [`SimPlatform`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    DisableInterrupt { core: CoreId, vector: u8 },
    EnableInterrupt { core: CoreId, vector: u8 },
    Route { core: CoreId, source: InterruptSource, vector: u8 },
}

/// Simulated CPU and interrupt matrix
#[derive(Debug, Default)]
pub struct SimPlatform {
    debugger: bool,
    glitch: bool,
    debugger_reads: Cell<u32>,
    cores: u8,
    events: Vec<PlatformEvent, 32>,
}

impl SimPlatform {
    pub fn new(cores: u8) -> Self {
        Self {
            cores,
            ..Self::default()
        }
    }

    pub fn with_debugger(mut self, attached: bool) -> Self {
        self.debugger = attached;
        self
    }

    /// Make every second debugger probe disagree with the first
    pub fn with_glitch(mut self) -> Self {
        self.glitch = true;
        self
    }

    pub fn events(&self) -> &[PlatformEvent] {
        &self.events
    }

    pub fn routes(&self) -> impl Iterator<Item = (CoreId, InterruptSource, u8)> + '_ {
        self.events.iter().filter_map(|event| match *event {
            PlatformEvent::Route { core, source, vector } => Some((core, source, vector)),
            _ => None,
        })
    }

    fn record(&mut self, event: PlatformEvent) {
        if self.events.push(event).is_err() {
            log::warn!("sim platform event log full, dropping {:?}", event);
        }
    }
}

impl Platform for SimPlatform {
    fn debugger_attached(&self) -> bool {
        let reads = self.debugger_reads.get();
        self.debugger_reads.set(reads + 1);
        if self.glitch && reads % 2 == 1 {
            !self.debugger
        } else {
            self.debugger
        }
    }

    fn core_count(&self) -> u8 {
        self.cores
    }

    fn disable_cpu_interrupt(&mut self, core: CoreId, vector: u8) {
        self.record(PlatformEvent::DisableInterrupt { core, vector });
    }

    fn enable_cpu_interrupt(&mut self, core: CoreId, vector: u8) {
        self.record(PlatformEvent::EnableInterrupt { core, vector });
    }

    fn route_interrupt(&mut self, core: CoreId, source: InterruptSource, vector: u8) {
        self.record(PlatformEvent::Route { core, source, vector });
    }
}
