//! Command definitions

use std::{path::PathBuf, sync::LazyLock};

use clap::{Parser, Subcommand};
use color_eyre::{
    eyre::{self, OptionExt},
    Result,
};
use regex::Regex;
use rriot_emu::{
    event::{InputEvent, InputKind},
    Config,
};

mod regs;
mod run;

use regs::RegsArgs;
use run::RunArgs;

#[derive(Parser)]
#[command(name = "rriot", about = "MOS 6530 RRIOT emulator")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}
impl Cli {
    pub fn run(self) -> Result<()> {
        self.command.run()
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the register map
    Regs(RegsArgs),
    /// Replay input events against a chip
    Run(RunArgs),
}
impl Command {
    pub fn run(self) -> Result<()> {
        match self {
            Command::Regs(args) => regs::run(args),
            Command::Run(args) => run::run(args),
        }
    }
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Chip configuration, as JSON.
    ///
    /// Sets the chip-select levels, RAM select, edge interrupt sources, and register table
    /// overrides. Defaults to the stock 6530 wiring.
    #[arg(short, long)]
    config: Option<PathBuf>,
}
impl CommonArgs {
    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Ok(Config::from_file(path)?),
            None => Ok(Config::default()),
        }
    }
}

/// Parses a hex (`0x` prefix) or decimal number.
fn parse_number(s: &str) -> Result<u64> {
    if let Some(hex) = s.to_lowercase().strip_prefix("0x") {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u64>()?)
    }
}

/// Parses a tick count, with an optional `k` or `m` multiplier.
fn parse_ticks(s: &str) -> Result<u64> {
    static REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new("^(0x[0-9a-f]+|[0-9]+)([km])?$").unwrap());
    let lower = s.to_lowercase();
    let cap = REGEX
        .captures(&lower)
        .ok_or_eyre("must match [0-9]+[km]? or 0x[0-9a-f]+ (case insensitive)")?;
    let base = parse_number(&cap[1])?;
    let factor = match cap.get(2).map(|m| m.as_str()) {
        None => 1,
        Some("k") => 1_000,
        Some("m") => 1_000_000,
        Some(_) => unreachable!(),
    };
    base.checked_mul(factor).ok_or_eyre("tick count overflows")
}

/// Parses an input event of the form `TICK:KIND[@ADDR][=VALUE]`.
fn parse_event(s: &str) -> Result<InputEvent> {
    static REGEX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?x)
            ^
            (?P<tick>0x[0-9a-f]+|[0-9]+[km]?)   # tick
            :
            (?P<kind>[a-z0-9-]+)                # event kind
            (?:@(?P<addr>0x[0-9a-f]+|[0-9]+))?  # optional address
            (?:=(?P<value>0x[0-9a-f]+|[0-9]+))? # optional value
            $",
        )
        .unwrap()
    });
    let lower = s.to_lowercase();
    let caps = REGEX
        .captures(&lower)
        .ok_or_eyre("must be of the form TICK:KIND[@ADDR][=VALUE]")?;
    let tick = parse_ticks(&caps["tick"])?;
    let kind: InputKind = caps["kind"].parse()?;
    let addr = caps
        .name("addr")
        .map(|m| parse_number(m.as_str()))
        .transpose()?
        .unwrap_or(0);
    let value = caps
        .name("value")
        .map(|m| parse_number(m.as_str()))
        .transpose()?
        .unwrap_or(0);
    if addr > 0x3ff {
        eyre::bail!("address {addr:#x} exceeds A0..A9");
    }
    let Ok(value) = u8::try_from(value) else {
        eyre::bail!("value {value:#x} exceeds one byte");
    };
    Ok(InputEvent::new(tick, kind, value).with_addr(addr as u16))
}
