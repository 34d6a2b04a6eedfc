use std::{fmt, io, result};

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

/// Stage of the conversion an I/O failure happened in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operation {
    ReadFooter,
    ReadDynamicHeader,
    ReadBat,
    ReadBlock,
    WriteBlock,
    SkipHole,
    SeekOutput,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::ReadFooter => "reading footer",
            Self::ReadDynamicHeader => "reading dynamic header",
            Self::ReadBat => "reading block allocation table",
            Self::ReadBlock => "reading block",
            Self::WriteBlock => "writing block",
            Self::SkipHole => "skipping unallocated block",
            Self::SeekOutput => "seeking output",
        })
    }
}

/// Which on-disk record a cookie belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Record {
    Footer,
    DynamicHeader,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Footer => "footer",
            Self::DynamicHeader => "dynamic header",
        })
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum FormatError {
    #[error("invalid VHD {record} cookie {found:02X?}")]
    BadMagic { record: Record, found: [u8; 8] },
    #[error("unknown or deprecated disk type {0}")]
    UnknownDiskType(u32),
    #[error("invalid block size {0}")]
    InvalidBlockSize(u32),
}

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum UnsupportedFormat {
    #[error("fixed disks are unsupported, the image already is a raw disk followed by a footer (try dd)")]
    Fixed,
    #[error("differencing disks are unsupported")]
    Differencing,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error while {operation} at offset 0x{offset:X}")]
    Io {
        operation: Operation,
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFormat),
}

impl Error {
    pub(crate) fn io(operation: Operation, offset: u64) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io {
            operation,
            offset,
            source,
        }
    }

    /// Disk type is recognized but not handled.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Container is damaged or not a VHD at all.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}
