//! Peripheral I/O ports.

use rand::distr::{Distribution, StandardUniform};

/// One of the two peripheral ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortId {
    A,
    B,
}

/// Operating mode of the second control line, decoded from a PCR nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C2Mode {
    /// Input, latching on the rising (true) or falling (false) edge.
    Input { rising: bool },
    /// Driven by the chip at the given level.
    Output(bool),
}

/// Port control bits, i.e. one nibble of the peripheral control register.
///
/// Bit layout:
/// - 0: C1 active edge (1 = rising, 0 = falling)
/// - 1: C2 output level in manual output mode
/// - 2: C2 active edge in input mode (1 = rising, 0 = falling)
/// - 3: C2 output enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortControl(pub u8);
impl PortControl {
    pub fn c1_rising(self) -> bool {
        self.0 & 0x1 != 0
    }

    pub fn c2_mode(self) -> C2Mode {
        match (self.0 >> 1) & 0x7 {
            0b110 => C2Mode::Output(false),
            0b111 => C2Mode::Output(true),
            // Handshake and pulse modes are not modelled; the line idles high.
            0b100 | 0b101 => C2Mode::Output(true),
            m => C2Mode::Input {
                rising: m & 0b010 != 0,
            },
        }
    }
}

/// Edge-detect latch and level shadow for one control line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControlLine {
    /// Last sampled (or driven) level.
    pub level: bool,
    /// True when the chip drives the line instead of sampling it.
    pub driven: bool,
    /// Set on an active edge, cleared by reading the interrupt flags.
    pub edge_latched: bool,
}
impl ControlLine {
    /// Samples an externally supplied level. Returns true on an active edge.
    ///
    /// Driven lines and unprimed detectors never report an edge.
    fn sample(&mut self, level: bool, rising: bool, detect: bool) -> bool {
        if self.driven {
            return false;
        }
        let edge = detect
            && if rising {
                !self.level && level
            } else {
                self.level && !level
            };
        self.level = level;
        self.edge_latched |= edge;
        edge
    }

    fn drive(&mut self, level: Option<bool>) {
        match level {
            Some(level) => {
                self.driven = true;
                self.level = level;
            }
            None => self.driven = false,
        }
    }
}

impl Distribution<ControlLine> for StandardUniform {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> ControlLine {
        ControlLine {
            level: rng.random(),
            driven: rng.random(),
            edge_latched: rng.random(),
        }
    }
}

/// Edges detected on a port's control lines during one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Edges {
    pub c1: bool,
    pub c2: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Port {
    /// Externally driven level for this tick.
    input_level: u8,
    /// Output register.
    output_register: u8,
    /// Data direction register, 1 = output.
    direction: u8,
    pub c1: ControlLine,
    pub c2: ControlLine,
}

impl Distribution<Port> for StandardUniform {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Port {
        Port {
            input_level: rng.random(),
            output_register: rng.random(),
            direction: rng.random(),
            c1: ControlLine {
                driven: false,
                ..rng.random()
            },
            c2: rng.random(),
        }
    }
}

impl Port {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Latches the externally supplied pin levels.
    pub fn sample(&mut self, input_level: u8) {
        self.input_level = input_level;
    }

    /// The level seen on each port line.
    pub fn pins(&self) -> u8 {
        (self.output_register & self.direction) | (self.input_level & !self.direction)
    }

    pub fn input_level(&self) -> u8 {
        self.input_level
    }

    pub fn output_register(&self) -> u8 {
        self.output_register
    }

    pub fn direction(&self) -> u8 {
        self.direction
    }

    pub fn write_data(&mut self, val: u8) {
        self.output_register = val;
    }

    pub fn write_direction(&mut self, val: u8) {
        self.direction = val;
    }

    /// Advances the control-line edge detectors.
    ///
    /// `detect` is false on the first tick after a reset, when there is no previous level to
    /// compare against.
    pub fn tick_control(&mut self, ctrl: PortControl, c1: bool, c2: bool, detect: bool) -> Edges {
        let c1 = self.c1.sample(c1, ctrl.c1_rising(), detect);
        let c2 = match ctrl.c2_mode() {
            C2Mode::Input { rising } => {
                self.c2.drive(None);
                self.c2.sample(c2, rising, detect)
            }
            C2Mode::Output(level) => {
                self.c2.drive(Some(level));
                false
            }
        };
        Edges { c1, c2 }
    }

    /// The level the chip drives on C2, if any.
    pub fn c2_output(&self) -> Option<bool> {
        self.c2.driven.then_some(self.c2.level)
    }

    /// Clears both edge latches.
    pub fn clear_edges(&mut self) {
        self.c1.edge_latched = false;
        self.c2.edge_latched = false;
    }
}
