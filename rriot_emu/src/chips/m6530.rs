//! MOS 6530 RRIOT emulation
//!
//! The RRIOT (ROM-RAM-I/O-Timer) pairs with the 6502 and provides two 8-bit I/O ports with
//! data-direction control, an interval timer with a selectable prescaler, 64 bytes of RAM, and an
//! interrupt flag/enable pair that drives a shared IRQ line. The mask ROM is not modelled.
//!
//! All interaction goes through a 64-bit pin vector (see [`pins::pin`]), re-evaluated once per
//! clock cycle by [`M6530::tick`].

use std::fmt::Display;

use rand::distr::{Distribution, StandardUniform};

pub mod config;
pub mod decode;
pub mod interrupt;
pub mod pins;
pub mod port;
pub mod timer;

#[cfg(test)]
mod tests;

use config::{Config, ConfigError};
use decode::{Access, Decoder, Register, RAM_SIZE};
use interrupt::{Interrupts, IRQ_CA1, IRQ_CA2, IRQ_CB1, IRQ_CB2, IRQ_EDGES, IRQ_TIMER};
use pins::M6530Pins;
use port::{Port, PortControl, PortId};
use timer::Timer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct M6530 {
    decoder: Decoder,
    /// Whether control-line edges raise interrupt flags.
    edge_interrupts: bool,
    port_a: Port,
    port_b: Port,
    timer: Timer,
    interrupts: Interrupts,
    /// Peripheral control register. Low nibble controls port A, high nibble port B.
    pcr: u8,
    /// Auxiliary control register. Stored, but has no effect.
    acr: u8,
    /// Not cleared by reset.
    ram: [u8; RAM_SIZE],
    /// Pin vector returned by the last tick.
    pins: M6530Pins,
    initialized: bool,
    /// False until the edge detectors have seen one sample since reset.
    primed: bool,
}

impl Default for M6530 {
    /// An un-reset chip. Call [`M6530::reset`] before the first tick, or use [`M6530::new`].
    fn default() -> Self {
        Self {
            decoder: Decoder::default(),
            edge_interrupts: true,
            port_a: Port::default(),
            port_b: Port::default(),
            timer: Timer::default(),
            interrupts: Interrupts::default(),
            pcr: 0,
            acr: 0,
            ram: [0; RAM_SIZE],
            pins: M6530Pins::default(),
            initialized: false,
            primed: false,
        }
    }
}

impl Display for M6530 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PA={pa:02x}/{pad:02x} PB={pb:02x}/{pbd:02x} T={t:04x}/{p:<4} IFR={ifr:02x} IER={ier:02x} \
             PCR={pcr:02x} IRQ={irq}",
            pa = self.port_a.pins(),
            pad = self.port_a.direction(),
            pb = self.port_b.pins(),
            pbd = self.port_b.direction(),
            t = self.timer.counter(),
            p = self.timer.prescale().divisor(),
            ifr = self.interrupts.flag_mask(),
            ier = self.interrupts.enable_mask(),
            pcr = self.pcr,
            irq = self.interrupts.irq() as u8,
        )
    }
}

impl Distribution<M6530> for StandardUniform {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> M6530 {
        let mut ram = [0; RAM_SIZE];
        rng.fill(&mut ram[..]);
        M6530 {
            decoder: Decoder::default(),
            edge_interrupts: true,
            port_a: rng.random(),
            port_b: rng.random(),
            timer: rng.random(),
            interrupts: rng.random(),
            pcr: rng.random(),
            acr: rng.random(),
            ram,
            pins: M6530Pins(rng.random::<u64>() & M6530Pins::mask_all()),
            initialized: true,
            primed: rng.random(),
        }
    }
}

impl M6530 {
    /// Creates a chip with the stock configuration, already reset.
    pub fn new() -> Self {
        let mut chip = Self::default();
        chip.reset();
        chip
    }

    /// Creates a reset chip with the given configuration.
    pub fn with_config(config: &Config) -> Result<Self, ConfigError> {
        let mut chip = Self {
            decoder: config.decoder()?,
            edge_interrupts: config.edge_interrupts,
            ..Self::default()
        };
        chip.reset();
        Ok(chip)
    }

    /// Restores power-on state. RAM contents survive.
    pub fn reset(&mut self) {
        tracing::debug!("reset");
        self.port_a.reset();
        self.port_b.reset();
        self.timer.reset();
        self.interrupts.reset();
        self.pcr = 0;
        self.acr = 0;
        self.pins = M6530Pins::default();
        self.initialized = true;
        self.primed = false;
    }

    /// Fills RAM with random bytes, as found at power-on.
    pub fn randomize_ram<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        rng.fill(&mut self.ram[..]);
    }

    /// Advances the chip by one clock cycle.
    ///
    /// The returned pin vector is `pins` with the chip's outputs spliced in: PA and PB carry the
    /// effective port levels, IRQ the interrupt line, CA2/CB2 their level when driven by the
    /// chip, and the data bus the value read when the cycle was a selected read.
    pub fn tick(&mut self, pins: u64) -> u64 {
        debug_assert!(self.initialized, "M6530 ticked before reset");
        let pins = M6530Pins(pins);
        if pins.get_res() {
            self.reset();
        }
        self.port_a.sample(pins.get_pa());
        self.port_b.sample(pins.get_pb());
        if pins.get_res() {
            self.pins = self.output_pins(pins, None);
            return self.pins.0;
        }

        let data = match self.decoder.decode(pins) {
            Some(Access::Read(reg)) => {
                let val = self.read_register(reg);
                tracing::trace!(%reg, val, "read");
                Some(val)
            }
            Some(Access::Write(reg)) => {
                let val = pins.get_data();
                tracing::trace!(%reg, val, "write");
                self.write_register(reg, val);
                None
            }
            Some(Access::RamRead(offset)) => Some(self.ram[usize::from(offset)]),
            Some(Access::RamWrite(offset)) => {
                self.ram[usize::from(offset)] = pins.get_data();
                None
            }
            None => None,
        };

        let mut triggers = 0;
        if self.timer.tick() {
            triggers |= IRQ_TIMER;
        }

        let detect = self.primed;
        self.primed = true;
        let (ctrl_a, ctrl_b) = (self.port_control(PortId::A), self.port_control(PortId::B));
        let a = self
            .port_a
            .tick_control(ctrl_a, pins.get_ca1(), pins.get_ca2(), detect);
        let b = self
            .port_b
            .tick_control(ctrl_b, pins.get_cb1(), pins.get_cb2(), detect);
        if self.edge_interrupts {
            for (edge, mask) in [(a.c1, IRQ_CA1), (a.c2, IRQ_CA2), (b.c1, IRQ_CB1), (b.c2, IRQ_CB2)] {
                if edge {
                    triggers |= mask;
                }
            }
        }

        self.interrupts.tick(triggers);
        self.pins = self.output_pins(pins, data);
        self.pins.0
    }

    fn output_pins(&self, mut pins: M6530Pins, data: Option<u8>) -> M6530Pins {
        pins.set_pa(self.port_a.pins());
        pins.set_pb(self.port_b.pins());
        pins.set_irq(self.interrupts.irq());
        if let Some(level) = self.port_a.c2_output() {
            pins.set_ca2(level);
        }
        if let Some(level) = self.port_b.c2_output() {
            pins.set_cb2(level);
        }
        if let Some(data) = data {
            pins.set_data(data);
        }
        pins
    }

    fn port_control(&self, id: PortId) -> PortControl {
        match id {
            PortId::A => PortControl(self.pcr & 0xf),
            PortId::B => PortControl(self.pcr >> 4),
        }
    }

    fn port_mut(&mut self, id: PortId) -> &mut Port {
        match id {
            PortId::A => &mut self.port_a,
            PortId::B => &mut self.port_b,
        }
    }

    /// Edge latches of both ports, in flag register layout.
    fn latched_edges(&self) -> u8 {
        [
            (self.port_a.c1.edge_latched, IRQ_CA1),
            (self.port_a.c2.edge_latched, IRQ_CA2),
            (self.port_b.c1.edge_latched, IRQ_CB1),
            (self.port_b.c2.edge_latched, IRQ_CB2),
        ]
        .into_iter()
        .filter_map(|(latched, mask)| latched.then_some(mask))
        .fold(0, |acc, mask| acc | mask)
    }

    fn read_register(&mut self, reg: Register) -> u8 {
        match reg {
            Register::PortData { port } => self.port(port).pins(),
            Register::PortDirection { port } => self.port(port).direction(),
            Register::TimerValue => {
                self.interrupts.clear(IRQ_TIMER);
                self.timer.read()
            }
            Register::InterruptFlags => {
                let val = self.interrupts.read_flags(self.latched_edges());
                // An edge seen through its latch is acknowledged here, even if its flag has
                // not landed yet.
                self.interrupts.cancel(val & IRQ_EDGES);
                self.port_a.clear_edges();
                self.port_b.clear_edges();
                val
            }
            Register::InterruptEnable => self.interrupts.read_enable(),
            Register::PeripheralControl => self.pcr,
            Register::AuxControl => self.acr,
            Register::Timer { .. } => {
                tracing::warn!(%reg, "read of write-only register");
                0
            }
        }
    }

    fn write_register(&mut self, reg: Register, val: u8) {
        match reg {
            Register::PortData { port } => self.port_mut(port).write_data(val),
            Register::PortDirection { port } => self.port_mut(port).write_direction(val),
            Register::Timer { prescale, irq } => {
                self.interrupts.cancel(IRQ_TIMER);
                self.interrupts.set_enabled(IRQ_TIMER, irq);
                self.timer.write(val, prescale);
            }
            Register::InterruptEnable => self.interrupts.write_enable(val),
            Register::PeripheralControl => self.pcr = val,
            Register::AuxControl => self.acr = val,
            Register::TimerValue | Register::InterruptFlags => {
                tracing::warn!(%reg, "write to read-only register");
            }
        }
    }

    pub fn port(&self, id: PortId) -> &Port {
        match id {
            PortId::A => &self.port_a,
            PortId::B => &self.port_b,
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn interrupts(&self) -> &Interrupts {
        &self.interrupts
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn pcr(&self) -> u8 {
        self.pcr
    }

    pub fn acr(&self) -> u8 {
        self.acr
    }

    pub fn ram(&self) -> &[u8; RAM_SIZE] {
        &self.ram
    }

    /// Pin vector returned by the last tick.
    pub fn pins(&self) -> M6530Pins {
        self.pins
    }

    pub fn irq(&self) -> bool {
        self.interrupts.irq()
    }
}
