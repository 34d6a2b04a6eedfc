mod progress;

pub use progress::Progress;

use std::io;

pub fn setup_logging(verbosity_level: u32) {
    use fern::colors::{Color, ColoredLevelConfig};

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::White)
        .debug(Color::BrightWhite)
        .trace(Color::Cyan);

    let r = fern::Dispatch::new()
        .format(move |out, message, record| {
            let color = colors.get_color(&record.level());
            let prefix = format!(
                "[{}][{}]\x1b[{}m ",
                record.target(),
                record.level(),
                color.to_fg_str()
            );
            const SUFFIX: &str = "\x1b[0m";

            // Prefix every line of multi-line records (footer/header dumps)
            let s = format!("{}", message);
            let mut buf = String::with_capacity(s.len() + prefix.len() + SUFFIX.len());
            for (i, line) in s.split('\n').enumerate() {
                if i != 0 {
                    buf.push('\n');
                }
                buf += &prefix;
                buf += line;
                buf += SUFFIX;
            }

            out.finish(format_args!("{}", buf))
        })
        .level(match verbosity_level {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .chain(io::stderr())
        .apply();

    if let Err(e) = r {
        eprintln!("failed to set up logging: {}", e);
    }
}

/// Process exit status for a failed run.
pub fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<vhdraw::Error>() {
        Some(x) if x.is_unsupported() => 2,
        Some(x) if x.is_corrupt() => 3,
        _ => 1,
    }
}

#[allow(non_upper_case_globals)]
pub fn size_to_string(s: u64) -> String {
    const KiB: u64 = 1024;
    const MiB: u64 = 1048576;
    const GiB: u64 = 1073741824;
    const TiB: u64 = 1099511627776;

    match s {
        0..=1023 => format!("{}", s),
        1024..=1048575 => format!("{} KiB", s / KiB),
        1048576..=1073741823 => format!("{} MiB", s / MiB),
        1073741824..=1099511627775 => format!("{} GiB", s / GiB),
        _ => format!("{} TiB", s / TiB),
    }
}
