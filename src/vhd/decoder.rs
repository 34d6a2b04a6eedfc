use crate::vhd::{
    Bat, DiskType, DynamicHeader, Footer, DYNAMIC_VERSION_CURRENT, FOOTER_VERSION_CURRENT,
    SECTOR_SIZE,
};
use crate::{Error, FormatError, Operation, Result, UnsupportedFormat};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

/// Reads the footer copy at the start of the container.
pub fn read_footer<R>(input: &mut R) -> Result<Footer>
where
    R: Read + Seek,
{
    let mut buffer = [0u8; Footer::SIZE];
    input
        .seek(SeekFrom::Start(0))
        .and_then(|_| input.read_exact(&mut buffer))
        .map_err(Error::io(Operation::ReadFooter, 0))?;

    let footer = Footer::decode(&buffer)?;
    debug!("{}", footer);

    if footer.version != FOOTER_VERSION_CURRENT {
        warn!("unexpected footer version 0x{:08X}", footer.version);
    }

    Ok(footer)
}

pub fn read_dynamic_header<R>(input: &mut R, offset: u64) -> Result<DynamicHeader>
where
    R: Read + Seek,
{
    trace!("dynamic header at 0x{:X}", offset);

    let mut buffer = [0u8; DynamicHeader::SIZE];
    input
        .seek(SeekFrom::Start(offset))
        .and_then(|_| input.read_exact(&mut buffer))
        .map_err(Error::io(Operation::ReadDynamicHeader, offset))?;

    let header = DynamicHeader::decode(&buffer)?;
    debug!("{}", header);

    if header.header_version != DYNAMIC_VERSION_CURRENT {
        warn!(
            "unexpected dynamic header version 0x{:08X}",
            header.header_version
        );
    }

    Ok(header)
}

/// Loads the whole BAT in one read.
pub fn read_bat<R>(input: &mut R, header: &DynamicHeader) -> Result<Bat>
where
    R: Read + Seek,
{
    let offset = header.bat_offset;
    let count = header.max_table_entries as usize;
    trace!("BAT at 0x{:X}, {} entries", offset, count);
    if offset % SECTOR_SIZE != 0 {
        warn!("BAT offset 0x{:X} is not sector aligned", offset);
    }

    // Refuse to allocate a table the input cannot hold
    let input_size = input
        .seek(SeekFrom::End(0))
        .map_err(Error::io(Operation::ReadBat, offset))?;
    let bat_end = offset.checked_add(count as u64 * 4);
    if bat_end.map_or(true, |x| x > input_size) {
        return Err(Error::io(Operation::ReadBat, offset)(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "block allocation table extends past end of input",
        )));
    }

    let mut entries = vec![0u32; count];
    input
        .seek(SeekFrom::Start(offset))
        .and_then(|_| input.read_u32_into::<BigEndian>(&mut entries))
        .map_err(Error::io(Operation::ReadBat, offset))?;

    Ok(Bat::new(entries))
}

/// Geometry and allocation table of a dynamic disk, everything the
/// reconstructor needs.
#[derive(Debug, Clone)]
pub struct DynamicDisk {
    pub block_size: u32,
    pub bat: Bat,
}

impl DynamicDisk {
    pub fn open<R>(input: &mut R) -> Result<Self>
    where
        R: Read + Seek,
    {
        let footer = read_footer(input)?;

        match footer.disk_type {
            DiskType::Fixed => return Err(UnsupportedFormat::Fixed.into()),
            DiskType::Differencing => return Err(UnsupportedFormat::Differencing.into()),
            DiskType::Dynamic => {}
        }

        let header = read_dynamic_header(input, footer.data_offset)?;

        let block_size = header.block_size;
        if block_size == 0 {
            return Err(FormatError::InvalidBlockSize(block_size).into());
        }
        if !block_size.is_power_of_two() || (block_size as u64) < SECTOR_SIZE {
            warn!("unusual block size 0x{:X}", block_size);
        }

        let bat = read_bat(input, &header)?;
        if bat.is_empty() {
            warn!("allocation table has no entries");
        }

        Ok(Self { block_size, bat })
    }

    /// Size of the flat image this disk expands to.
    pub fn disk_size(&self) -> u64 {
        self.bat.len() as u64 * self.block_size as u64
    }
}
