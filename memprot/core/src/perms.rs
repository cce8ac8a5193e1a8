//! Permission sets for the halves of a split region

use core::fmt;

/// Read/write/exec flags of one half (or one unified block) of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub exec: bool,
}

impl Permissions {
    pub const NONE: Permissions = Permissions::new(false, false, false);
    pub const R: Permissions = Permissions::new(true, false, false);
    pub const RW: Permissions = Permissions::new(true, true, false);
    pub const RX: Permissions = Permissions::new(true, false, true);
    pub const RWX: Permissions = Permissions::new(true, true, true);

    pub const fn new(read: bool, write: bool, exec: bool) -> Self {
        Self { read, write, exec }
    }

    /// Drop the exec flag, for regions without exec control
    pub const fn without_exec(self) -> Self {
        Self { exec: false, ..self }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.exec, 'x')
        )
    }
}

/// Permissions below and above the split address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionPermissions {
    pub low: Permissions,
    pub high: Permissions,
}

impl RegionPermissions {
    pub const fn new(low: Permissions, high: Permissions) -> Self {
        Self { low, high }
    }
}

impl fmt::Display for RegionPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "low {} / high {}", self.low, self.high)
    }
}

/// Which half of a region an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Half {
    Low,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_rwx_string() {
        use std::string::ToString;

        assert_eq!(Permissions::RX.to_string(), "r-x");
        assert_eq!(Permissions::NONE.to_string(), "---");
        assert_eq!(
            RegionPermissions::new(Permissions::R, Permissions::RW).to_string(),
            "low r-- / high rw-"
        );
    }
}
