//! Event replay
//!
//! Events are keyed by tick number and stored as headerless CSV rows of the form
//! `tick,kind,addr,value`. The address column is only meaningful for bus accesses.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid event kind: {0}")]
    InvalidKind(String),
}

/// Something that happens to the chip's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    /// Drive the port A lines.
    Pa,
    /// Drive the port B lines.
    Pb,
    Ca1,
    Ca2,
    Cb1,
    Cb2,
    /// One-tick register read.
    Read,
    /// One-tick register write.
    Write,
    /// One-tick RAM read.
    RamRead,
    /// One-tick RAM write.
    RamWrite,
    /// One-tick reset pulse.
    Reset,
}
impl InputKind {
    /// Whether the event drives the bus for a single tick rather than setting a level.
    pub fn is_bus_cycle(self) -> bool {
        matches!(
            self,
            Self::Read | Self::Write | Self::RamRead | Self::RamWrite | Self::Reset
        )
    }
}
impl FromStr for InputKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "pa" => Self::Pa,
            "pb" => Self::Pb,
            "ca1" => Self::Ca1,
            "ca2" => Self::Ca2,
            "cb1" => Self::Cb1,
            "cb2" => Self::Cb2,
            "read" => Self::Read,
            "write" => Self::Write,
            "ram-read" => Self::RamRead,
            "ram-write" => Self::RamWrite,
            "reset" => Self::Reset,
            _ => return Err(EventError::InvalidKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// A change on one of the chip's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Pa,
    Pb,
    Irq,
    Ca2,
    Cb2,
    /// Value driven onto the data bus by a read.
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<K> {
    pub tick: u64,
    pub kind: K,
    pub addr: u16,
    pub value: u8,
}
impl<K> Event<K> {
    pub fn new(tick: u64, kind: K, value: u8) -> Self {
        Self {
            tick,
            kind,
            addr: 0,
            value,
        }
    }

    #[must_use]
    pub fn with_addr(mut self, addr: u16) -> Self {
        self.addr = addr;
        self
    }
}

fn read_csv<K>(r: impl Read) -> Result<Vec<Event<K>>, EventError>
where
    K: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(r);
    let mut events = vec![];
    for event in reader.deserialize() {
        events.push(event?);
    }
    Ok(events)
}

fn write_csv<K: Serialize>(w: impl Write, events: &[Event<K>]) -> Result<(), EventError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    Ok(())
}

pub type InputEvent = Event<InputKind>;

/// An input event log.
#[derive(Debug, Default, Clone)]
pub struct InputEventLog {
    /// Pending events, sorted ascending by tick. Events on the same tick keep their file order.
    pending: VecDeque<InputEvent>,

    /// Expired events, in no particular order.
    expired: Vec<InputEvent>,
}
impl InputEventLog {
    /// Reads an input event log from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EventError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader(r: impl Read) -> Result<Self, EventError> {
        let mut events = read_csv(r)?;
        events.sort_by_key(|e| e.tick);
        Ok(Self {
            pending: events.into(),
            expired: vec![],
        })
    }

    /// Adds a new event to the log. An event scheduled before `now` is treated as expired,
    /// whereas an event at or after `now` is treated as pending.
    pub fn add(&mut self, event: InputEvent, now: u64) {
        if event.tick < now {
            tracing::warn!(?event, now, "event added in the past");
            self.expired.push(event);
        } else {
            let idx = self.pending.partition_point(|e| e.tick <= event.tick);
            self.pending.insert(idx, event);
        }
    }

    /// Pops the next pending event due at or before `tick`.
    pub fn pop_next_at(&mut self, tick: u64) -> Option<InputEvent> {
        if !self.pending.front().is_some_and(|e| e.tick <= tick) {
            return None;
        }
        let e = self.pending.pop_front()?;
        self.expired.push(e);
        Some(e)
    }

    /// Moves all expired events back into the sorted pending list.
    pub fn reset(&mut self) {
        let mut expired = std::mem::take(&mut self.expired);
        expired.sort_by_key(|e| e.tick);
        for e in expired.into_iter().rev() {
            self.pending.push_front(e);
        }
    }

    /// Number of events not yet applied.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Iterates over all events in the log, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = InputEvent> + '_ {
        self.expired.iter().chain(self.pending.iter()).copied()
    }
}

pub type OutputEvent = Event<OutputKind>;

#[derive(Debug, Default, Clone)]
pub struct OutputEventLog(Vec<OutputEvent>);
impl OutputEventLog {
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), EventError> {
        self.to_writer(BufWriter::new(File::create(path)?))
    }

    pub fn to_writer(&self, w: impl Write) -> Result<(), EventError> {
        write_csv(w, &self.0)
    }

    /// Adds an event to the event log.
    pub fn push(&mut self, event: OutputEvent) {
        self.0.push(event);
    }

    /// Removes all events from the log.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all events in the log, in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = OutputEvent> + '_ {
        self.0.iter().copied()
    }
}
