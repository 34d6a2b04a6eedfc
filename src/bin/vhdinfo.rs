extern crate better_panic;
extern crate clap;
#[macro_use]
extern crate log;
extern crate vhdraw;

#[allow(dead_code, unused_imports)]
mod utils;

use std::fs::File;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use vhdraw::vhd::{read_bat, read_dynamic_header, read_footer, DiskType};

#[derive(Parser)]
#[clap(about = "Print VHD footer and dynamic header")]
struct Options {
    #[clap(short, long, parse(from_occurrences))]
    verbose: u32,

    #[clap(parse(from_os_str))]
    file: PathBuf,
}

fn run(options: Options) -> anyhow::Result<()> {
    let mut file = File::open(&options.file).context("failed to open file")?;

    let footer = read_footer(&mut file)?;
    println!("{}", footer);

    if footer.disk_type == DiskType::Fixed {
        return Ok(());
    }

    let header = read_dynamic_header(&mut file, footer.data_offset)?;
    println!("{}", header);

    let bat = read_bat(&mut file, &header)?;
    println!(
        "Allocated Blocks      : {} of {}
Disk Size             : {}",
        bat.allocated_blocks(),
        bat.len(),
        utils::size_to_string(header.disk_size())
    );

    Ok(())
}

fn main() {
    better_panic::install();
    let options = Options::parse();
    utils::setup_logging(options.verbose);

    if let Err(e) = run(options) {
        error!("{:#}", e);
        process::exit(utils::exit_code(&e));
    }
}
