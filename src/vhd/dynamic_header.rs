use crate::vhd::{split_version, DYNAMIC_COOKIE};
use crate::{FormatError, Record};
use byteorder::{BigEndian, ByteOrder};
use std::{fmt, str};
use uuid::Uuid;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ParentLocator {
    pub platform_code: [u8; 4],
    pub platform_data_space: u32,
    pub platform_data_length: u32,
    pub platform_data_offset: u64,
}

impl ParentLocator {
    pub const SIZE: usize = 24;

    fn decode(buffer: &[u8]) -> Self {
        debug_assert_eq!(buffer.len(), Self::SIZE);

        let mut platform_code = [0u8; 4];
        platform_code.copy_from_slice(&buffer[0..4]);

        Self {
            platform_code,
            platform_data_space: BigEndian::read_u32(&buffer[4..8]),
            platform_data_length: BigEndian::read_u32(&buffer[8..12]),
            platform_data_offset: BigEndian::read_u64(&buffer[16..24]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.platform_code == [0; 4]
    }
}

pub struct DynamicHeader {
    pub data_offset: u64,
    pub bat_offset: u64,
    pub header_version: u32,
    pub max_table_entries: u32,
    pub block_size: u32,
    pub checksum: u32,
    pub parent_uuid: Uuid,
    pub parent_time_stamp: u32,
    pub parent_unicode_name: String,
    pub parent_locators: [ParentLocator; 8],
}

impl DynamicHeader {
    pub const SIZE: usize = 1024;

    pub fn decode(buffer: &[u8; Self::SIZE]) -> Result<Self, FormatError> {
        let mut cookie = [0u8; 8];
        cookie.copy_from_slice(&buffer[0..8]);
        if &cookie != DYNAMIC_COOKIE {
            return Err(FormatError::BadMagic {
                record: Record::DynamicHeader,
                found: cookie,
            });
        }

        let mut parent_uuid = [0u8; 16];
        parent_uuid.copy_from_slice(&buffer[40..56]);

        // UTF-16BE, NUL padded
        let name: Vec<u16> = buffer[64..576]
            .chunks_exact(2)
            .map(BigEndian::read_u16)
            .take_while(|&c| c != 0)
            .collect();

        let mut parent_locators = [ParentLocator::default(); 8];
        for (i, locator) in parent_locators.iter_mut().enumerate() {
            let start = 576 + i * ParentLocator::SIZE;
            *locator = ParentLocator::decode(&buffer[start..start + ParentLocator::SIZE]);
        }

        Ok(Self {
            data_offset: BigEndian::read_u64(&buffer[8..16]),
            bat_offset: BigEndian::read_u64(&buffer[16..24]),
            header_version: BigEndian::read_u32(&buffer[24..28]),
            max_table_entries: BigEndian::read_u32(&buffer[28..32]),
            block_size: BigEndian::read_u32(&buffer[32..36]),
            checksum: BigEndian::read_u32(&buffer[36..40]),
            parent_uuid: Uuid::from_bytes(parent_uuid),
            parent_time_stamp: BigEndian::read_u32(&buffer[56..60]),
            parent_unicode_name: String::from_utf16_lossy(&name),
            parent_locators,
        })
    }

    #[inline]
    pub fn header_version(&self) -> (u16, u16) {
        split_version(self.header_version)
    }

    /// Size of the virtual disk as described by the BAT.
    pub fn disk_size(&self) -> u64 {
        self.max_table_entries as u64 * self.block_size as u64
    }
}

impl fmt::Display for DynamicHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let header_version = self.header_version();

        write!(
            f,
            "Data Offset           : 0x{:016X}
BAT Offset            : 0x{:016X}
Header Version        : {}.{}
Max Table Entries     : {}
Block Size            : 0x{:08X}
Checksum              : 0x{:08X}",
            self.data_offset,
            self.bat_offset,
            header_version.0,
            header_version.1,
            self.max_table_entries,
            self.block_size,
            self.checksum
        )?;

        if !self.parent_uuid.is_nil() || !self.parent_unicode_name.is_empty() {
            write!(
                f,
                "
Parent UUID           : {{{}}}
Parent Name           : {}",
                self.parent_uuid, self.parent_unicode_name
            )?;
        }

        for (i, locator) in self.parent_locators.iter().enumerate() {
            if locator.is_empty() {
                continue;
            }
            write!(
                f,
                "
Parent Locator {}      : {} at 0x{:016X} ({} bytes)",
                i,
                str::from_utf8(&locator.platform_code).unwrap_or("<invalid>"),
                locator.platform_data_offset,
                locator.platform_data_length
            )?;
        }

        Ok(())
    }
}
