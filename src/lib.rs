extern crate byteorder;
extern crate uuid;
#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

mod error;
pub mod convert;
pub mod vhd;

pub use convert::{convert, BlockReconstructor, ConvertOptions, ConvertStats, HoleMode};
pub use error::*;

#[cfg(test)]
extern crate better_panic;

#[cfg(test)]
pub(crate) fn tests_init() {
    better_panic::install();
}
