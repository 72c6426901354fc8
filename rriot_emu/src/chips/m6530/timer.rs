//! Programmable interval timer.

use rand::distr::{Distribution, StandardUniform};

/// Count-enable stage that takes effect on the current tick.
const PIP_ACTIVE: u8 = 1 << 0;

/// Clock divider applied before the counter decrements.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Prescale {
    #[default]
    #[serde(rename = "1")]
    Div1,
    #[serde(rename = "8")]
    Div8,
    #[serde(rename = "64")]
    Div64,
    #[serde(rename = "1024")]
    Div1024,
}
impl Prescale {
    /// Decodes the divider from address lines A1..A0.
    pub fn from_addr(addr: u8) -> Self {
        match addr & 0x3 {
            0 => Self::Div1,
            1 => Self::Div8,
            2 => Self::Div64,
            _ => Self::Div1024,
        }
    }

    pub fn divisor(self) -> u16 {
        match self {
            Self::Div1 => 1,
            Self::Div8 => 8,
            Self::Div64 => 64,
            Self::Div1024 => 1024,
        }
    }
}

impl Distribution<Prescale> for StandardUniform {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Prescale {
        Prescale::from_addr(rng.random())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    /// Value last written by software.
    latch: u16,
    /// Live countdown value.
    counter: u16,
    prescale: Prescale,
    /// Ticks elapsed in the current prescale interval.
    divider: u16,
    /// Flips on every underflow.
    underflow_toggle: bool,
    /// True for the single tick on which the counter underflowed.
    underflow_pulse: bool,
    /// Count-enable delay pipeline. Bit n set before the per-tick shift takes effect n-1 ticks
    /// later; bit 0 after the shift is "now".
    pip: u8,
}

impl Default for Timer {
    /// Power-on state: counter at zero, counting from the first tick at the undivided rate.
    fn default() -> Self {
        Self {
            latch: 0,
            counter: 0,
            prescale: Prescale::Div1,
            divider: 0,
            underflow_toggle: false,
            underflow_pulse: false,
            pip: PIP_ACTIVE << 1,
        }
    }
}

impl Distribution<Timer> for StandardUniform {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Timer {
        let prescale: Prescale = rng.random();
        Timer {
            latch: rng.random::<u8>().into(),
            counter: rng.random(),
            prescale,
            divider: rng.random_range(0..prescale.divisor()),
            underflow_toggle: rng.random(),
            underflow_pulse: rng.random(),
            pip: PIP_ACTIVE << rng.random_range(1..=2u32),
        }
    }
}

impl Timer {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Loads the timer. The write tick does not count; counting resumes on the next tick.
    pub fn write(&mut self, val: u8, prescale: Prescale) {
        self.latch = val.into();
        self.counter = self.latch;
        self.prescale = prescale;
        self.divider = 0;
        self.pip = PIP_ACTIVE << 2;
    }

    /// Low byte of the live counter, as presented on the data bus.
    pub fn read(&self) -> u8 {
        self.counter as u8
    }

    /// Advances the timer by one tick. Returns true if the counter underflowed.
    pub fn tick(&mut self) -> bool {
        self.underflow_pulse = false;
        self.pip >>= 1;
        if self.pip & PIP_ACTIVE == 0 {
            return false;
        }
        // Keep counting on the next tick.
        self.pip |= PIP_ACTIVE << 1;

        self.divider += 1;
        if self.divider < self.prescale.divisor() {
            return false;
        }
        self.divider = 0;

        let (counter, underflow) = self.counter.overflowing_sub(1);
        self.counter = counter;
        if underflow {
            // No reload: the counter free-runs at the undivided clock until rewritten.
            self.underflow_toggle = !self.underflow_toggle;
            self.underflow_pulse = true;
            self.prescale = Prescale::Div1;
            tracing::trace!(latch = self.latch, "timer underflow");
        }
        underflow
    }

    pub fn latch(&self) -> u16 {
        self.latch
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    pub fn prescale(&self) -> Prescale {
        self.prescale
    }

    pub fn underflow_toggle(&self) -> bool {
        self.underflow_toggle
    }

    pub fn underflow_pulse(&self) -> bool {
        self.underflow_pulse
    }
}
