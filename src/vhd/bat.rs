use crate::vhd::{BAT_ENTRY_NULL, SECTOR_SIZE};

/// Where the data of one logical block lives in the container.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlockLocation {
    Unallocated,
    /// Sector of the block's bitmap; data follows it.
    Sector(u32),
}

impl BlockLocation {
    pub fn from_entry(entry: u32) -> Self {
        if entry == BAT_ENTRY_NULL {
            Self::Unallocated
        } else {
            Self::Sector(entry)
        }
    }

    /// Absolute byte offset of block data, past the one sector bitmap.
    pub fn data_offset(self) -> Option<u64> {
        match self {
            Self::Unallocated => None,
            Self::Sector(x) => Some((x as u64 + 1) * SECTOR_SIZE),
        }
    }
}

/// Block allocation table, entries already converted to host byte order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Bat {
    entries: Vec<u32>,
}

impl Bat {
    pub fn new(entries: Vec<u32>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub fn locations(&self) -> impl Iterator<Item = BlockLocation> + '_ {
        self.entries.iter().copied().map(BlockLocation::from_entry)
    }

    pub fn allocated_blocks(&self) -> usize {
        self.entries.iter().filter(|&&x| x != BAT_ENTRY_NULL).count()
    }
}
