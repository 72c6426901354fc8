//! Chip configuration, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::decode::{ChipSelect, Decoder, Register, REGISTER_SLOTS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("register index {0:#x} out of range")]
    IndexOutOfRange(u8),
    #[error("register {register} at index {index:#x} cannot be {access}")]
    InvalidAccess {
        index: u8,
        access: AccessKind,
        register: Register,
    },
}

/// Which half of the register table an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Read,
    Write,
}
impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "written"),
        }
    }
}

/// Replaces one slot in the register table. A missing register makes the slot a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOverride {
    pub index: u8,
    pub access: AccessKind,
    #[serde(default)]
    pub register: Option<Register>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Level of CS1 that selects the chip.
    pub cs1_active_high: bool,
    /// Level of CS2 that selects the chip.
    pub cs2_active_high: bool,
    /// Route RS0-high accesses to the on-chip RAM.
    pub ram_select: bool,
    /// Let control-line edges raise interrupt flags.
    pub edge_interrupts: bool,
    pub registers: Vec<RegisterOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cs1_active_high: true,
            cs2_active_high: false,
            ram_select: true,
            edge_interrupts: true,
            registers: vec![],
        }
    }
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for ov in &self.registers {
            if usize::from(ov.index) >= REGISTER_SLOTS {
                return Err(ConfigError::IndexOutOfRange(ov.index));
            }
            if let Some(register) = ov.register {
                let ok = match ov.access {
                    AccessKind::Read => register.is_readable(),
                    AccessKind::Write => register.is_writable(),
                };
                if !ok {
                    return Err(ConfigError::InvalidAccess {
                        index: ov.index,
                        access: ov.access,
                        register,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn chip_select(&self) -> ChipSelect {
        ChipSelect {
            cs1: self.cs1_active_high,
            cs2: self.cs2_active_high,
            ram_select: self.ram_select,
        }
    }

    /// Builds the register decoder, applying overrides in order.
    pub fn decoder(&self) -> Result<Decoder, ConfigError> {
        self.validate()?;
        let decoder = self
            .registers
            .iter()
            .fold(Decoder::new(self.chip_select()), |decoder, ov| {
                let index = usize::from(ov.index);
                match ov.access {
                    AccessKind::Read => decoder.with_read(index, ov.register),
                    AccessKind::Write => decoder.with_write(index, ov.register),
                }
            });
        Ok(decoder)
    }
}
