//! Bit field helpers for 64-bit pin vectors.

/// A contiguous run of bits within a pin vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    lsb: u8,
    width: u8,
}

impl Field {
    pub const fn new(lsb: u8, width: u8) -> Self {
        assert!(width > 0 && width <= 16 && lsb as u32 + width as u32 <= 64);
        Self { lsb, width }
    }

    pub const fn bit(lsb: u8) -> Self {
        Self::new(lsb, 1)
    }

    pub const fn byte(lsb: u8) -> Self {
        Self::new(lsb, 8)
    }

    /// Mask of the field, in place.
    pub const fn mask(self) -> u64 {
        ((1u64 << self.width) - 1) << self.lsb
    }

    pub const fn get(self, pins: u64) -> u16 {
        ((pins & self.mask()) >> self.lsb) as u16
    }

    /// Returns `pins` with this field replaced by `val`. Bits of `val` above the field width are
    /// dropped.
    pub const fn set(self, pins: u64, val: u16) -> u64 {
        (pins & !self.mask()) | (((val as u64) << self.lsb) & self.mask())
    }

    pub const fn get_1(self, pins: u64) -> bool {
        pins & self.mask() != 0
    }

    pub const fn set_1(self, pins: u64, val: bool) -> u64 {
        self.set(pins, val as u16)
    }
}
