//! A single 6530 on a test bench.
//!
//! The bench owns the chip and the pin vector it is ticked against. Port and control-line
//! levels set by input events persist until changed; bus accesses and reset pulses last one
//! tick. Changes on the chip's outputs are recorded in an output event log.

use std::path::Path;

use itertools::Itertools;

use crate::chips::m6530::pins::M6530Pins;
use crate::chips::m6530::M6530;
use crate::event::{
    EventError, InputEvent, InputEventLog, InputKind, OutputEvent, OutputEventLog, OutputKind,
};

pub struct Bench {
    chip: M6530,
    /// Externally driven levels.
    pins: M6530Pins,
    /// Pins returned by the last tick.
    last: M6530Pins,
    clock_cycle: u64,
    input_events: InputEventLog,
    output_events: OutputEventLog,
}

impl Bench {
    pub fn new(chip: M6530) -> Self {
        let mut this = Self {
            chip,
            pins: M6530Pins::default(),
            last: M6530Pins::default(),
            clock_cycle: 0,
            input_events: InputEventLog::default(),
            output_events: OutputEventLog::default(),
        };
        this.reset();
        this
    }

    #[must_use]
    pub fn with_events(mut self, events: InputEventLog) -> Self {
        self.input_events = events;
        self
    }

    /// Resets the chip and rewinds the event logs.
    pub fn reset(&mut self) {
        self.chip.reset();
        self.pins = M6530Pins::default();
        self.deselect();
        self.last = self.pins;
        self.clock_cycle = 0;
        self.input_events.reset();
        self.output_events.clear();
    }

    pub fn chip(&self) -> &M6530 {
        &self.chip
    }

    pub fn pins(&self) -> M6530Pins {
        self.pins
    }

    /// Current tick number.
    pub fn now(&self) -> u64 {
        self.clock_cycle
    }

    pub fn add_event(&mut self, event: InputEvent) {
        let now = self.now();
        self.input_events.add(event, now);
    }

    pub fn output_events(&self) -> &OutputEventLog {
        &self.output_events
    }

    pub fn print_output_events(&self) {
        let iter = self.output_events.iter().sorted_by_key(|e| e.tick);
        for OutputEvent {
            tick,
            kind,
            addr,
            value,
        } in iter
        {
            match kind {
                OutputKind::Data => println!("{tick:08x} {kind:?} [{addr:03x}] {value:02x}"),
                _ => println!("{tick:08x} {kind:?} {value:02x}"),
            }
        }
    }

    pub fn write_output_events(&self, path: impl AsRef<Path>) -> Result<(), EventError> {
        self.output_events.to_file(path)
    }

    fn select(&mut self, addr: u16, read: bool, ram: bool) {
        let cs = self.chip.decoder().chip_select();
        self.pins.set_cs1(cs.cs1);
        self.pins.set_cs2(cs.cs2);
        self.pins.set_addr(addr);
        self.pins.set_rw(read);
        self.pins.set_rs0(ram);
    }

    fn deselect(&mut self) {
        let cs = self.chip.decoder().chip_select();
        self.pins.set_cs1(!cs.cs1);
        self.pins.set_cs2(cs.cs2);
        self.pins.set_rw(true);
        self.pins.set_rs0(false);
        self.pins.set_res(false);
        self.pins.set_data(0);
    }

    fn apply_event(&mut self, e: InputEvent) {
        tracing::trace!(?e, "apply");
        let busy = self.pins.get_res() || self.chip.decoder().is_selected(self.pins);
        if e.kind.is_bus_cycle() && busy {
            tracing::warn!(?e, "bus already driven this tick; event overrides it");
        }
        let level = e.value != 0;
        match e.kind {
            InputKind::Pa => self.pins.set_pa(e.value),
            InputKind::Pb => self.pins.set_pb(e.value),
            InputKind::Ca1 => self.pins.set_ca1(level),
            InputKind::Ca2 => self.pins.set_ca2(level),
            InputKind::Cb1 => self.pins.set_cb1(level),
            InputKind::Cb2 => self.pins.set_cb2(level),
            InputKind::Read => self.select(e.addr, true, false),
            InputKind::Write => {
                self.select(e.addr, false, false);
                self.pins.set_data(e.value);
            }
            InputKind::RamRead => self.select(e.addr, true, true),
            InputKind::RamWrite => {
                self.select(e.addr, false, true);
                self.pins.set_data(e.value);
            }
            InputKind::Reset => self.pins.set_res(true),
        }
    }

    /// Applies due input events, then ticks the chip once.
    pub fn tick(&mut self) -> M6530Pins {
        let now = self.now();
        while let Some(e) = self.input_events.pop_next_at(now) {
            self.apply_event(e);
        }

        let read = self.pins.get_rw()
            && !self.pins.get_res()
            && self.chip.decoder().is_selected(self.pins);
        let out = M6530Pins(self.chip.tick(self.pins.0));
        self.record(now, out, read);

        // Bus cycles last one tick.
        self.deselect();
        self.clock_cycle += 1;
        out
    }

    fn record(&mut self, now: u64, out: M6530Pins, read: bool) {
        let last = self.last;
        let changes = [
            (OutputKind::Pa, last.get_pa(), out.get_pa()),
            (OutputKind::Pb, last.get_pb(), out.get_pb()),
            (OutputKind::Irq, last.get_irq().into(), out.get_irq().into()),
            (OutputKind::Ca2, last.get_ca2().into(), out.get_ca2().into()),
            (OutputKind::Cb2, last.get_cb2().into(), out.get_cb2().into()),
        ];
        for (kind, prev, value) in changes {
            if prev != value {
                self.output_events.push(OutputEvent::new(now, kind, value));
            }
        }
        if read {
            self.output_events.push(
                OutputEvent::new(now, OutputKind::Data, out.get_data()).with_addr(out.get_addr()),
            );
        }
        self.last = out;
    }

    /// Ticks until the clock reaches `end`.
    pub fn run_until(&mut self, end: u64) {
        while self.clock_cycle < end {
            self.tick();
        }
    }

    /// Writes a register on the current tick.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.add_event(InputEvent::new(self.now(), InputKind::Write, value).with_addr(addr));
        self.tick();
    }

    /// Reads a register on the current tick.
    pub fn read(&mut self, addr: u16) -> u8 {
        self.add_event(InputEvent::new(self.now(), InputKind::Read, 0).with_addr(addr));
        self.tick().get_data()
    }
}
