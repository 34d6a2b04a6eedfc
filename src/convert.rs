use crate::vhd::{Bat, DynamicDisk};
use crate::{Error, Operation, Result};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// How unallocated blocks end up in the output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HoleMode {
    /// Seek past the block, the filesystem zero fills the gap and may keep
    /// it sparse. Output must be empty.
    Seek,
    /// Write `block_size` zero bytes.
    Zero,
}

impl Default for HoleMode {
    fn default() -> Self {
        Self::Seek
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct ConvertOptions {
    pub hole_mode: HoleMode,
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ConvertStats {
    pub allocated_blocks: u64,
    pub unallocated_blocks: u64,
    pub bytes_copied: u64,
    pub output_size: u64,
}

/// Expands a dynamic disk into a flat image, one BAT entry at a time.
pub struct BlockReconstructor<'a> {
    block_size: u32,
    bat: &'a Bat,
    options: ConvertOptions,
}

impl<'a> BlockReconstructor<'a> {
    pub fn new(disk: &'a DynamicDisk, options: ConvertOptions) -> Self {
        Self {
            block_size: disk.block_size,
            bat: &disk.bat,
            options,
        }
    }

    pub fn run<R, W>(&self, input: &mut R, output: &mut W) -> Result<ConvertStats>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        self.run_with_progress(input, output, |_, _| {})
    }

    /// `progress` is called after every block with `(blocks_done, blocks_total)`.
    pub fn run_with_progress<R, W, F>(
        &self,
        input: &mut R,
        output: &mut W,
        mut progress: F,
    ) -> Result<ConvertStats>
    where
        R: Read + Seek,
        W: Write + Seek,
        F: FnMut(u64, u64),
    {
        let block_size = self.block_size as u64;
        let total = self.bat.len() as u64;
        let mut stats = ConvertStats::default();

        // A block larger than the whole input cannot be read, fail before
        // allocating a buffer for it
        if let Some(first) = self.bat.locations().find_map(|x| x.data_offset()) {
            let input_size = input
                .seek(SeekFrom::End(0))
                .map_err(Error::io(Operation::ReadBlock, first))?;
            if block_size > input_size {
                return Err(Error::io(Operation::ReadBlock, first)(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "block size exceeds input size",
                )));
            }
        }

        // Sized on the first allocated block, reused for every other one
        let mut buffer: Vec<u8> = Vec::new();

        output
            .seek(SeekFrom::Start(0))
            .map_err(Error::io(Operation::SeekOutput, 0))?;

        // Output position is always i * block_size at the top of the loop
        let mut position = 0u64;
        let mut trailing_hole = false;

        for (i, location) in self.bat.locations().enumerate() {
            trace!("{:08x}: {:?}", i, location);
            debug_assert_eq!(position, i as u64 * block_size);

            match location.data_offset() {
                None => {
                    match self.options.hole_mode {
                        HoleMode::Seek => {
                            output
                                .seek(SeekFrom::Current(i64::from(self.block_size)))
                                .map_err(Error::io(Operation::SkipHole, position))?;
                            trailing_hole = true;
                        }
                        HoleMode::Zero => {
                            io::copy(&mut io::repeat(0).take(block_size), output)
                                .map_err(Error::io(Operation::WriteBlock, position))?;
                        }
                    }
                    stats.unallocated_blocks += 1;
                }
                Some(offset) => {
                    if buffer.is_empty() {
                        buffer.resize(self.block_size as usize, 0);
                    }
                    input
                        .seek(SeekFrom::Start(offset))
                        .and_then(|_| input.read_exact(&mut buffer))
                        .map_err(Error::io(Operation::ReadBlock, offset))?;
                    output
                        .write_all(&buffer)
                        .map_err(Error::io(Operation::WriteBlock, position))?;
                    trailing_hole = false;
                    stats.allocated_blocks += 1;
                    stats.bytes_copied += block_size;
                }
            }

            position += block_size;
            progress(i as u64 + 1, total);
        }

        // Seeking past the end does not extend the output
        if trailing_hole && self.options.hole_mode == HoleMode::Seek {
            let last = position - 1;
            output
                .seek(SeekFrom::Start(last))
                .and_then(|_| output.write_all(&[0]))
                .map_err(Error::io(Operation::SkipHole, last))?;
        }

        output
            .flush()
            .map_err(Error::io(Operation::WriteBlock, position))?;

        stats.output_size = position;
        info!(
            "{} blocks copied, {} unallocated, {} bytes written",
            stats.allocated_blocks, stats.unallocated_blocks, stats.output_size
        );

        Ok(stats)
    }
}

/// Decodes the container on `input` and writes the flat disk image to
/// `output`.
///
/// With [`HoleMode::Seek`] the output must be empty: hole regions are never
/// written, so bytes already there survive, and an output longer than the
/// image keeps its length.
pub fn convert<R, W>(input: &mut R, output: &mut W, options: ConvertOptions) -> Result<ConvertStats>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let disk = DynamicDisk::open(input)?;
    BlockReconstructor::new(&disk, options).run(input, output)
}
