use std::fs;
use std::path::{Path, PathBuf};

use esp_memprot::{target, Bus, LinkLayout, Memprot, PmsUnit, RegionTable};
use memprot_ll::bus_layout;
use memprot_ll::sim::{SimBank, SimPlatform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoder context built from a snapshot
pub type SnapshotMemprot = Memprot<PmsUnit<SimBank>, SimPlatform>;

/// Errors produced while loading a register snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot is for target `{found}`, this build decodes `{expected}`")]
    UnknownTarget { expected: &'static str, found: String },
    #[error("{bus} bank has {found} words, expected {expected}")]
    BankTooShort {
        bus: Bus,
        expected: usize,
        found: usize,
    },
}

/// Raw register words of each bank, in bank order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banks {
    pub iram0: Vec<u32>,
    pub dram0: Vec<u32>,
    pub peri1: Vec<u32>,
    pub peri2: Vec<u32>,
}

impl Banks {
    pub fn get(&self, bus: Bus) -> &[u32] {
        match bus {
            Bus::Iram0 => &self.iram0,
            Bus::Dram0 => &self.dram0,
            Bus::Peri1 => &self.peri1,
            Bus::Peri2 => &self.peri2,
        }
    }

    fn get_mut(&mut self, bus: Bus) -> &mut Vec<u32> {
        match bus {
            Bus::Iram0 => &mut self.iram0,
            Bus::Dram0 => &mut self.dram0,
            Bus::Peri1 => &mut self.peri1,
            Bus::Peri2 => &mut self.peri2,
        }
    }
}

/// Register snapshot of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub target: String,
    /// Link layout of the image that was running; target default if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LinkLayout>,
    pub banks: Banks,
}

impl Snapshot {
    /// Registers at power-on: every bank zeroed
    pub fn power_on() -> Self {
        let mut banks = Banks::default();
        for bus in Bus::ALL {
            *banks.get_mut(bus) = vec![0; bus_layout(bus).words()];
        }
        Self {
            target: target::NAME.to_string(),
            layout: Some(LinkLayout::default()),
            banks,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.target != target::NAME {
            return Err(SnapshotError::UnknownTarget {
                expected: target::NAME,
                found: self.target.clone(),
            });
        }
        for bus in Bus::ALL {
            let expected = bus_layout(bus).words();
            let found = self.banks.get(bus).len();
            if found < expected {
                return Err(SnapshotError::BankTooShort { bus, expected, found });
            }
        }
        Ok(())
    }

    /// Load the registers into simulated banks behind a decoder context
    pub fn to_memprot(&self) -> SnapshotMemprot {
        let table = RegionTable::new(self.layout.unwrap_or_default());
        Memprot::new(table, SimPlatform::new(1), |bus, table| {
            let mut bank = SimBank::new(bus);
            for (index, word) in self.banks.get(bus).iter().enumerate() {
                bank.poke(index * 4, *word);
            }
            PmsUnit::new(bus, bank, table)
        })
    }
}
