//! Chip select and register decode.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::pins::M6530Pins;
use super::port::PortId;
use super::timer::Prescale;

/// Size of the on-chip RAM.
pub const RAM_SIZE: usize = 64;

/// Number of register slots addressed by A3..A0.
pub const REGISTER_SLOTS: usize = 16;

/// An internal register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Register {
    /// Port output register on write, effective pins on read.
    PortData { port: PortId },
    PortDirection { port: PortId },
    /// Loads the timer. Write only.
    Timer { prescale: Prescale, irq: bool },
    /// Live counter; reading clears the timer flag.
    TimerValue,
    /// Interrupt flags; reading clears the edge flags.
    InterruptFlags,
    InterruptEnable,
    PeripheralControl,
    AuxControl,
}
impl Register {
    pub fn is_readable(self) -> bool {
        !matches!(self, Self::Timer { .. })
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Self::TimerValue | Self::InterruptFlags)
    }
}
impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PortData { port } => write!(f, "P{port:?}D"),
            Self::PortDirection { port } => write!(f, "P{port:?}DD"),
            Self::Timer { prescale, irq } => {
                let irq = if *irq { "+irq" } else { "" };
                write!(f, "TIM/{}{irq}", prescale.divisor())
            }
            Self::TimerValue => write!(f, "TIMER"),
            Self::InterruptFlags => write!(f, "IFR"),
            Self::InterruptEnable => write!(f, "IER"),
            Self::PeripheralControl => write!(f, "PCR"),
            Self::AuxControl => write!(f, "ACR"),
        }
    }
}

/// A bus cycle aimed at this chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(Register),
    Write(Register),
    RamRead(u8),
    RamWrite(u8),
}

/// How the chip-select inputs are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipSelect {
    /// Level of CS1 that selects the chip.
    pub cs1: bool,
    /// Level of CS2 that selects the chip.
    pub cs2: bool,
    /// When set, RS0 high routes the access to RAM instead of the registers.
    pub ram_select: bool,
}
impl Default for ChipSelect {
    fn default() -> Self {
        Self {
            cs1: true,
            cs2: false,
            ram_select: true,
        }
    }
}

type Table = [Option<Register>; REGISTER_SLOTS];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    select: ChipSelect,
    read: Table,
    write: Table,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(ChipSelect::default())
    }
}

impl Decoder {
    /// Builds a decoder with the stock 6530 register map.
    ///
    /// | A3..A0 | Read | Write |
    /// |--------|------|-------|
    /// | 0 | PAD | PAD |
    /// | 1 | PADD | PADD |
    /// | 2 | PBD | PBD |
    /// | 3 | PBDD | PBDD |
    /// | 4, 6, C, E | timer | timer, prescale from A1..A0, irq enable from A3 |
    /// | 5, 7, D, F | flags | timer, prescale from A1..A0, irq enable from A3 |
    /// | 8 | PCR | PCR |
    /// | 9 | ACR | ACR |
    /// | A | IER | IER |
    pub fn new(select: ChipSelect) -> Self {
        let mut read: Table = [None; REGISTER_SLOTS];
        let mut write: Table = [None; REGISTER_SLOTS];
        for (port, base) in [(PortId::A, 0), (PortId::B, 2)] {
            for (reg, offset) in [
                (Register::PortData { port }, 0),
                (Register::PortDirection { port }, 1),
            ] {
                read[base + offset] = Some(reg);
                write[base + offset] = Some(reg);
            }
        }
        for index in [0x4, 0x5, 0x6, 0x7, 0xc, 0xd, 0xe, 0xf] {
            write[index] = Some(Register::Timer {
                prescale: Prescale::from_addr(index as u8),
                irq: index & 0x8 != 0,
            });
            read[index] = Some(if index & 0x1 == 0 {
                Register::TimerValue
            } else {
                Register::InterruptFlags
            });
        }
        for (index, reg) in [
            (0x8, Register::PeripheralControl),
            (0x9, Register::AuxControl),
            (0xa, Register::InterruptEnable),
        ] {
            read[index] = Some(reg);
            write[index] = Some(reg);
        }
        Self {
            select,
            read,
            write,
        }
    }

    /// Replaces the register read at `index`. Out-of-range indices are ignored.
    #[must_use]
    pub fn with_read(mut self, index: usize, reg: Option<Register>) -> Self {
        if let Some(slot) = self.read.get_mut(index) {
            *slot = reg;
        }
        self
    }

    /// Replaces the register written at `index`. Out-of-range indices are ignored.
    #[must_use]
    pub fn with_write(mut self, index: usize, reg: Option<Register>) -> Self {
        if let Some(slot) = self.write.get_mut(index) {
            *slot = reg;
        }
        self
    }

    pub fn chip_select(&self) -> ChipSelect {
        self.select
    }

    pub fn is_selected(&self, pins: M6530Pins) -> bool {
        pins.get_cs1() == self.select.cs1 && pins.get_cs2() == self.select.cs2
    }

    /// Decodes the bus cycle, if any, that targets this chip.
    pub fn decode(&self, pins: M6530Pins) -> Option<Access> {
        if !self.is_selected(pins) {
            return None;
        }
        let addr = pins.get_addr();
        let read = pins.get_rw();
        if self.select.ram_select && pins.get_rs0() {
            let offset = (addr as usize % RAM_SIZE) as u8;
            return Some(if read {
                Access::RamRead(offset)
            } else {
                Access::RamWrite(offset)
            });
        }
        let index = addr as usize % REGISTER_SLOTS;
        if read {
            self.read[index].map(Access::Read)
        } else {
            self.write[index].map(Access::Write)
        }
    }

    /// Iterates over the register slots as `(index, read, write)`.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<Register>, Option<Register>)> + '_ {
        self.read
            .iter()
            .zip(self.write.iter())
            .enumerate()
            .map(|(index, (r, w))| (index, *r, *w))
    }
}
