//! Process-wide memory protection context

use core::cell::RefCell;

use critical_section::Mutex;
use memprot_core::{FaultRecord, Platform};
use memprot_ll::ProtectionUnit;

use crate::coordinator::Memprot;

/// Holder for the one [`Memprot`] of the system.
///
/// Every access runs inside a critical section, which serializes boot
/// code on either core against the fault handler.
pub struct MemprotCell<U, P> {
    inner: Mutex<RefCell<Option<Memprot<U, P>>>>,
}

impl<U, P> MemprotCell<U, P> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }
}

impl<U, P> Default for MemprotCell<U, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: ProtectionUnit, P: Platform> MemprotCell<U, P> {
    /// Install the context, returning the previous one
    pub fn install(&self, memprot: Memprot<U, P>) -> Option<Memprot<U, P>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(memprot))
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Run `f` on the installed context. `None` if nothing is installed.
    pub fn with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Memprot<U, P>) -> R,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Fault handler entry
    pub fn service_fault(&self) -> Option<FaultRecord> {
        self.with(|memprot| memprot.service_fault()).flatten()
    }
}
