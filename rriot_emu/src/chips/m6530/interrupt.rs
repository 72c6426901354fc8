//! Interrupt flag/enable pair.
//!
//! Flags use the 6522 bit layout:
//!
//! | Bit | Source |
//! |-----|--------|
//! | 7 | any enabled flag set (read only) |
//! | 6 | timer underflow |
//! | 4 | CB1 edge |
//! | 3 | CB2 edge |
//! | 1 | CA1 edge |
//! | 0 | CA2 edge |

use rand::distr::{Distribution, StandardUniform};

pub const IRQ_CA2: u8 = 1 << 0;
pub const IRQ_CA1: u8 = 1 << 1;
pub const IRQ_CB2: u8 = 1 << 3;
pub const IRQ_CB1: u8 = 1 << 4;
pub const IRQ_TIMER: u8 = 1 << 6;
pub const IRQ_ANY: u8 = 1 << 7;

/// All control-line edge sources.
pub const IRQ_EDGES: u8 = IRQ_CA2 | IRQ_CA1 | IRQ_CB2 | IRQ_CB1;
/// All sources that can be enabled.
pub const IRQ_SOURCES: u8 = IRQ_EDGES | IRQ_TIMER;

/// Width of one pipeline stage. Each stage holds a full flag byte.
const STAGE_BITS: u32 = 8;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Interrupts {
    enable_mask: u8,
    flag_mask: u8,
    /// Stage 0 (bits 0..7) holds flags landing on the current tick, stage 1 (bits 8..15) those
    /// landing on the next.
    pip: u16,
}

impl Distribution<Interrupts> for StandardUniform {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Interrupts {
        Interrupts {
            enable_mask: rng.random::<u8>() & IRQ_SOURCES,
            flag_mask: rng.random::<u8>() & IRQ_SOURCES,
            pip: rng.random::<u16>() & (u16::from(IRQ_SOURCES) << STAGE_BITS),
        }
    }
}

impl Interrupts {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances the pipeline and schedules this tick's triggers. Returns the IRQ line state.
    pub fn tick(&mut self, triggers: u8) -> bool {
        self.pip >>= STAGE_BITS;
        self.flag_mask |= self.pip as u8;
        self.pip = u16::from(triggers & IRQ_SOURCES) << STAGE_BITS;
        self.irq()
    }

    pub fn irq(&self) -> bool {
        self.enable_mask & self.flag_mask != 0
    }

    /// Flag register as presented on the data bus. `latched` adds edge sources that have been
    /// seen but whose flags have not landed yet.
    pub fn read_flags(&self, latched: u8) -> u8 {
        self.flag_mask | (latched & IRQ_EDGES) | if self.irq() { IRQ_ANY } else { 0 }
    }

    /// Enable register as presented on the data bus; bit 7 always reads as 1.
    pub fn read_enable(&self) -> u8 {
        self.enable_mask | IRQ_ANY
    }

    /// Writes the enable register. Bit 7 selects whether the other set bits are enabled (1) or
    /// disabled (0).
    pub fn write_enable(&mut self, val: u8) {
        self.set_enabled(val & IRQ_SOURCES, val & IRQ_ANY != 0);
    }

    pub fn set_enabled(&mut self, mask: u8, enabled: bool) {
        if enabled {
            self.enable_mask |= mask;
        } else {
            self.enable_mask &= !mask;
        }
    }

    /// Clears flags that are currently set. Flags still in the pipeline are unaffected.
    pub fn clear(&mut self, mask: u8) {
        self.flag_mask &= !mask;
    }

    /// Clears flags and drops any matching events still in the pipeline.
    pub fn cancel(&mut self, mask: u8) {
        self.clear(mask);
        self.pip &= !(u16::from(mask) << STAGE_BITS | u16::from(mask));
    }

    pub fn enable_mask(&self) -> u8 {
        self.enable_mask
    }

    pub fn flag_mask(&self) -> u8 {
        self.flag_mask
    }

    /// Flags scheduled to land on the next tick.
    pub fn pending(&self) -> u8 {
        (self.pip >> STAGE_BITS) as u8
    }
}
