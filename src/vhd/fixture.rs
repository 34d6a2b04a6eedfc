//! Synthetic dynamic VHD images for tests.

use crate::vhd::{
    DynamicHeader, Footer, BAT_ENTRY_NULL, DYNAMIC_COOKIE, DYNAMIC_VERSION_CURRENT,
    FOOTER_COOKIE, FOOTER_VERSION_CURRENT, SECTOR_SIZE,
};
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Cursor, Read, Seek, SeekFrom};

fn checksum(buffer: &[u8]) -> u32 {
    !buffer
        .iter()
        .fold(0u32, |sum, &x| sum.wrapping_add(x.into()))
}

fn sector_align(x: u64) -> u64 {
    (x + SECTOR_SIZE - 1) / SECTOR_SIZE * SECTOR_SIZE
}

pub fn footer_bytes(disk_type: u32, data_offset: u64) -> [u8; Footer::SIZE] {
    let mut b = [0u8; Footer::SIZE];
    b[0..8].copy_from_slice(FOOTER_COOKIE);
    BigEndian::write_u32(&mut b[8..12], 2);
    BigEndian::write_u32(&mut b[12..16], FOOTER_VERSION_CURRENT);
    BigEndian::write_u64(&mut b[16..24], data_offset);
    // 2020-01-01T00:00:00Z
    BigEndian::write_u32(&mut b[24..28], 631152000);
    b[28..32].copy_from_slice(b"vpc ");
    BigEndian::write_u32(&mut b[32..36], 0x0005_0003);
    b[36..40].copy_from_slice(b"Wi2k");
    BigEndian::write_u64(&mut b[40..48], 45088768);
    BigEndian::write_u64(&mut b[48..56], 45088768);
    BigEndian::write_u32(&mut b[56..60], (1350 << 16) | (4 << 8) | 17);
    BigEndian::write_u32(&mut b[60..64], disk_type);
    b[68..84].copy_from_slice(&[
        0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd,
        0xef,
    ]);
    let sum = checksum(&b);
    BigEndian::write_u32(&mut b[64..68], sum);
    b
}

pub fn dynamic_header_bytes(
    bat_offset: u64,
    max_table_entries: u32,
    block_size: u32,
) -> [u8; DynamicHeader::SIZE] {
    let mut b = [0u8; DynamicHeader::SIZE];
    b[0..8].copy_from_slice(DYNAMIC_COOKIE);
    BigEndian::write_u64(&mut b[8..16], 0xFFFF_FFFF_FFFF_FFFF);
    BigEndian::write_u64(&mut b[16..24], bat_offset);
    BigEndian::write_u32(&mut b[24..28], DYNAMIC_VERSION_CURRENT);
    BigEndian::write_u32(&mut b[28..32], max_table_entries);
    BigEndian::write_u32(&mut b[32..36], block_size);
    let sum = checksum(&b);
    BigEndian::write_u32(&mut b[36..40], sum);
    b
}

/// Lays out footer copy, dynamic header, BAT, then every allocated block as
/// a bitmap sector followed by its data, and a trailing footer.
pub struct ImageBuilder {
    block_size: u32,
    disk_type: u32,
    blocks: Vec<Option<Vec<u8>>>,
}

impl ImageBuilder {
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size,
            disk_type: 3,
            blocks: Vec::new(),
        }
    }

    pub fn disk_type(mut self, disk_type: u32) -> Self {
        self.disk_type = disk_type;
        self
    }

    pub fn block(mut self, data: Option<Vec<u8>>) -> Self {
        if let Some(ref data) = data {
            assert_eq!(data.len(), self.block_size as usize);
        }
        self.blocks.push(data);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        const BAT_OFFSET: u64 = 1536;

        let mut image = Vec::new();
        image.extend_from_slice(&footer_bytes(self.disk_type, 512));
        image.extend_from_slice(&dynamic_header_bytes(
            BAT_OFFSET,
            self.blocks.len() as u32,
            self.block_size,
        ));
        assert_eq!(image.len() as u64, BAT_OFFSET);

        let bat_size = sector_align(self.blocks.len() as u64 * 4);
        image.resize((BAT_OFFSET + bat_size) as usize, 0xFF);

        for (i, block) in self.blocks.iter().enumerate() {
            let entry = match block {
                Some(data) => {
                    let sector = (image.len() as u64 / SECTOR_SIZE) as u32;
                    image.extend_from_slice(&[0xFF; SECTOR_SIZE as usize]);
                    image.extend_from_slice(data);
                    sector
                }
                None => BAT_ENTRY_NULL,
            };
            let at = BAT_OFFSET as usize + i * 4;
            BigEndian::write_u32(&mut image[at..at + 4], entry);
        }

        image.extend_from_slice(&footer_bytes(self.disk_type, 512));
        image
    }

    /// Flat image the container should expand to.
    pub fn expected(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        for block in &self.blocks {
            match block {
                Some(data) => raw.extend_from_slice(data),
                None => raw.resize(raw.len() + self.block_size as usize, 0),
            }
        }
        raw
    }
}

/// Records `(offset, requested length)` of every read.
pub struct TrackingReader {
    inner: Cursor<Vec<u8>>,
    pub reads: Vec<(u64, usize)>,
}

impl TrackingReader {
    pub fn new(inner: Cursor<Vec<u8>>) -> Self {
        Self {
            inner,
            reads: Vec::new(),
        }
    }
}

impl Read for TrackingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.push((self.inner.position(), buf.len()));
        self.inner.read(buf)
    }
}

impl Seek for TrackingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
