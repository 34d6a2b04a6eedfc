extern crate better_panic;
extern crate clap;
#[macro_use]
extern crate log;
extern crate vhdraw;

mod utils;

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgEnum, Parser};
use vhdraw::vhd::DynamicDisk;
use vhdraw::{BlockReconstructor, ConvertOptions, HoleMode};

#[derive(Copy, Clone, ArgEnum)]
enum Holes {
    Seek,
    Zero,
}

impl From<Holes> for HoleMode {
    fn from(x: Holes) -> Self {
        match x {
            Holes::Seek => Self::Seek,
            Holes::Zero => Self::Zero,
        }
    }
}

#[derive(Parser)]
#[clap(about = "Convert a dynamically expanding VHD into a flat raw disk image")]
struct Options {
    #[clap(short, long, parse(from_occurrences))]
    verbose: u32,

    #[clap(
        arg_enum,
        long,
        default_value = "seek",
        help = "How unallocated blocks are produced, seek leaves holes in a sparse file, zero writes zeroes"
    )]
    holes: Holes,

    #[clap(long)]
    progress: bool,

    #[clap(parse(from_os_str), help = "Input VHD")]
    input: PathBuf,

    #[clap(parse(from_os_str), help = "Output raw image, created or truncated")]
    output: PathBuf,
}

fn run(options: Options) -> anyhow::Result<()> {
    let mut input = File::open(&options.input).context("failed to open input")?;
    let disk = DynamicDisk::open(&mut input)?;

    info!(
        "{} blocks of {} bytes, {} allocated",
        disk.bat.len(),
        disk.block_size,
        disk.bat.allocated_blocks()
    );

    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&options.output)
        .context("failed to open output")?;

    let reconstructor = BlockReconstructor::new(
        &disk,
        ConvertOptions {
            hole_mode: options.holes.into(),
        },
    );

    if options.progress {
        let mut progress = utils::Progress::new(disk.block_size);
        reconstructor.run_with_progress(&mut input, &mut output, |done, total| {
            progress.update(done, total)
        })?;
    } else {
        reconstructor.run(&mut input, &mut output)?;
    }

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
