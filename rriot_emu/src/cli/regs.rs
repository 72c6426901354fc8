use clap::Parser;
use rriot_emu::chips::m6530::decode::Register;

use super::CommonArgs;

#[derive(Parser, Debug)]
pub struct RegsArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn name(reg: Option<Register>) -> String {
    reg.map_or_else(|| "-".to_string(), |r| r.to_string())
}

pub fn run(args: RegsArgs) -> color_eyre::Result<()> {
    let config = args.common.load_config()?;
    let decoder = config.decoder()?;
    let cs = decoder.chip_select();
    println!(
        "select: cs1={} cs2={} ram={}",
        u8::from(cs.cs1),
        u8::from(cs.cs2),
        if cs.ram_select { "rs0" } else { "off" },
    );
    println!("idx  read        write");
    for (index, read, write) in decoder.slots() {
        println!("{index:x}    {:<11} {}", name(read), name(write));
    }
    Ok(())
}
