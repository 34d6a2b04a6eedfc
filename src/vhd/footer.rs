use crate::vhd::{split_version, DiskType, FOOTER_COOKIE};
use crate::{FormatError, Record};
use byteorder::{BigEndian, ByteOrder};
use chrono::prelude::*;
use std::convert::TryFrom;
use std::{fmt, str};
use uuid::Uuid;

/// Seconds between the Unix epoch and 2000-01-01 00:00:00 UTC.
const VHD_EPOCH: i64 = 946684800;

bitflags! {
    pub struct Features: u32 {
        const TEMPORARY = 0x0000_0001;
        const RESERVED = 0x0000_0002;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    pub cylinders: u16,
    pub heads: u8,
    pub sectors_per_track: u8,
}

impl From<u32> for Geometry {
    fn from(x: u32) -> Self {
        Self {
            cylinders: (x >> 16) as u16,
            heads: (x >> 8) as u8,
            sectors_per_track: x as u8,
        }
    }
}

pub struct Footer {
    pub features: Features,
    pub version: u32,
    pub data_offset: u64,
    pub time_stamp: u32,
    pub creator_app: [u8; 4],
    pub creator_version: u32,
    pub creator_host_os: [u8; 4],
    pub original_size: u64,
    pub current_size: u64,
    pub disk_geometry: Geometry,
    pub disk_type: DiskType,
    pub checksum: u32,
    pub uuid: Uuid,
    pub saved_state: u8,
}

impl Footer {
    pub const SIZE: usize = 512;

    /// Decodes a footer, validating the cookie before the disk type.
    /// Checksum is carried as-is and never verified.
    pub fn decode(buffer: &[u8; Self::SIZE]) -> Result<Self, FormatError> {
        let mut cookie = [0u8; 8];
        cookie.copy_from_slice(&buffer[0..8]);
        if &cookie != FOOTER_COOKIE {
            return Err(FormatError::BadMagic {
                record: Record::Footer,
                found: cookie,
            });
        }

        let disk_type = DiskType::try_from(BigEndian::read_u32(&buffer[60..64]))?;

        let mut creator_app = [0u8; 4];
        creator_app.copy_from_slice(&buffer[28..32]);
        let mut creator_host_os = [0u8; 4];
        creator_host_os.copy_from_slice(&buffer[36..40]);
        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&buffer[68..84]);

        Ok(Self {
            features: Features::from_bits_truncate(BigEndian::read_u32(&buffer[8..12])),
            version: BigEndian::read_u32(&buffer[12..16]),
            data_offset: BigEndian::read_u64(&buffer[16..24]),
            time_stamp: BigEndian::read_u32(&buffer[24..28]),
            creator_app,
            creator_version: BigEndian::read_u32(&buffer[32..36]),
            creator_host_os,
            original_size: BigEndian::read_u64(&buffer[40..48]),
            current_size: BigEndian::read_u64(&buffer[48..56]),
            disk_geometry: Geometry::from(BigEndian::read_u32(&buffer[56..60])),
            disk_type,
            checksum: BigEndian::read_u32(&buffer[64..68]),
            uuid: Uuid::from_bytes(uuid),
            saved_state: buffer[84],
        })
    }

    #[inline]
    pub fn version(&self) -> (u16, u16) {
        split_version(self.version)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time_stamp as i64 + VHD_EPOCH, 0)
            .single()
    }
}

fn fourcc(x: &[u8; 4]) -> String {
    str::from_utf8(x).map_or_else(
        |_| format!("0x{:08X}", u32::from_be_bytes(*x)),
        |x| x.to_owned(),
    )
}

impl fmt::Display for Footer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let version = self.version();
        let created = self
            .created()
            .map_or_else(|| "<invalid>".to_owned(), |x| x.to_rfc3339());

        write!(
            f,
            "Features              : {:?}
Version               : {}.{}
Data Offset           : 0x{:016X}
Creation Date         : {}
Creator               : {}
Creator Version       : 0x{:08X}
Creator Host OS       : {}
Original Size         : 0x{:016X}
Current Size          : 0x{:016X}
Geometry (C/H/S)      : {}/{}/{}
Disk Type             : {}
Checksum              : 0x{:08X}
UUID                  : {{{}}}
Saved State           : {}",
            self.features,
            version.0,
            version.1,
            self.data_offset,
            created,
            fourcc(&self.creator_app),
            self.creator_version,
            fourcc(&self.creator_host_os),
            self.original_size,
            self.current_size,
            self.disk_geometry.cylinders,
            self.disk_geometry.heads,
            self.disk_geometry.sectors_per_track,
            self.disk_type,
            self.checksum,
            self.uuid,
            self.saved_state
        )
    }
}
