mod bat;
mod decoder;
mod dynamic_header;
mod footer;

#[cfg(test)]
pub(crate) mod fixture;

pub use bat::{Bat, BlockLocation};
pub use decoder::{read_bat, read_dynamic_header, read_footer, DynamicDisk};
pub use dynamic_header::{DynamicHeader, ParentLocator};
pub use footer::{Features, Footer, Geometry};

use crate::FormatError;
use std::convert::TryFrom;
use std::fmt;

pub const SECTOR_SIZE: u64 = 512;

pub const FOOTER_COOKIE: &[u8; 8] = b"conectix";
pub const DYNAMIC_COOKIE: &[u8; 8] = b"cxsparse";

pub const FOOTER_VERSION_CURRENT: u32 = 0x0001_0000;
pub const DYNAMIC_VERSION_CURRENT: u32 = 0x0001_0000;

pub const BAT_ENTRY_NULL: u32 = 0xFFFF_FFFF;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u32)]
pub enum DiskType {
    Fixed = 2,
    Dynamic = 3,
    Differencing = 4,
}

impl TryFrom<u32> for DiskType {
    type Error = FormatError;

    fn try_from(x: u32) -> Result<Self, Self::Error> {
        match x {
            2 => Ok(Self::Fixed),
            3 => Ok(Self::Dynamic),
            4 => Ok(Self::Differencing),
            _ => Err(FormatError::UnknownDiskType(x)),
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Fixed => "fixed",
            Self::Dynamic => "dynamic",
            Self::Differencing => "differencing",
        })
    }
}

/// Splits a `major.minor` version word.
pub(crate) fn split_version(v: u32) -> (u16, u16) {
    ((v >> 16) as u16, (v & 0xFFFF) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_type() {
        crate::tests_init();

        assert_eq!(DiskType::try_from(2), Ok(DiskType::Fixed));
        assert_eq!(DiskType::try_from(3), Ok(DiskType::Dynamic));
        assert_eq!(DiskType::try_from(4), Ok(DiskType::Differencing));
        assert_eq!(DiskType::try_from(0), Err(FormatError::UnknownDiskType(0)));
        assert_eq!(DiskType::try_from(5), Err(FormatError::UnknownDiskType(5)));
        assert_eq!(split_version(FOOTER_VERSION_CURRENT), (1, 0));
    }
}
