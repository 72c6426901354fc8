use std::path::PathBuf;

use clap::Parser;
use rriot_emu::{
    event::{InputEvent, InputEventLog},
    systems::bench::Bench,
    M6530,
};

use super::{parse_event, parse_ticks, CommonArgs};

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// An event log to replay.
    #[arg(long)]
    pub input_events: Option<PathBuf>,

    /// Additional input event, as `TICK:KIND[@ADDR][=VALUE]`. May be provided multiple times.
    #[arg(short, long, value_parser=parse_event)]
    pub event: Vec<InputEvent>,

    /// Where to write the output event log. Printed to stdout if omitted.
    #[arg(long)]
    pub output_events: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(short, long, value_parser=parse_ticks, default_value = "1k")]
    pub ticks: u64,

    /// Fill the on-chip RAM with random bytes before starting.
    #[arg(long)]
    pub random_ram: bool,

    /// Print the chip state when done.
    #[arg(long)]
    pub dump: bool,
}

pub fn run(args: RunArgs) -> color_eyre::Result<()> {
    let config = args.common.load_config()?;
    let mut chip = M6530::with_config(&config)?;
    if args.random_ram {
        chip.randomize_ram(&mut rand::rng());
    }
    let events = match &args.input_events {
        Some(path) => InputEventLog::from_file(path)?,
        None => InputEventLog::default(),
    };
    let mut bench = Bench::new(chip).with_events(events);
    for event in args.event {
        bench.add_event(event);
    }
    bench.run_until(args.ticks);
    tracing::info!(
        ticks = args.ticks,
        outputs = bench.output_events().len(),
        "run complete"
    );
    match &args.output_events {
        Some(path) => bench.write_output_events(path)?,
        None => bench.print_output_events(),
    }
    if args.dump {
        println!("{}", bench.chip());
    }
    Ok(())
}
