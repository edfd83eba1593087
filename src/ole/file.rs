use super::codepage::decode_utf16le;
use super::consts::*;
use crate::common::binary::{read_u16_le, read_u32_le};
use bytes::Bytes;
use fixedbitset::FixedBitSet;
use log::{debug, warn};
use thiserror::Error;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
///
/// This represents the on-disk format of a directory entry.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    /// Left sibling SID
    sid_left: U32<LE>,
    /// Right sibling SID
    sid_right: U32<LE>,
    /// Child SID
    sid_child: U32<LE>,
    /// CLSID (16 bytes)
    clsid: [u8; 16],
    /// State bits
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    /// Starting sector
    start_sector: U32<LE>,
    /// Stream size
    stream_size: U64<LE>,
}

/// Represents an OLE directory entry (stream or storage)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name (UTF-16 decoded to UTF-8)
    pub name: String,
    /// Entry type (stream, storage, root, etc.)
    pub entry_type: u8,
    /// Index of left sibling in red-black tree
    pub sid_left: u32,
    /// Index of right sibling in red-black tree
    pub sid_right: u32,
    /// Index of child node in red-black tree
    pub sid_child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
}

impl DirectoryEntry {
    #[inline]
    pub fn is_stream(&self) -> bool {
        self.entry_type == STGTY_STREAM
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.entry_type == STGTY_ROOT
    }
}

/// Error types for OLE file parsing
#[derive(Debug, Error)]
pub enum OleError {
    #[error("Not an OLE file")]
    NotOleFile,
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Stream not found: {0}")]
    StreamNotFound(String),
}

/// A parsed compound file (OLE2 structured storage).
///
/// The whole file is held in memory. Every table (FAT, DIFAT, MiniFAT, directory)
/// is decoded once in [`CompoundFile::open`]; afterwards the value is immutable and
/// streams are materialized on request.
#[derive(Debug, Clone)]
pub struct CompoundFile {
    /// The complete file contents
    data: Bytes,
    /// Sector size (512 or 4096 bytes)
    sector_size: usize,
    /// Mini sector size (typically 64 bytes)
    mini_sector_size: usize,
    /// Mini stream cutoff size (typically 4096 bytes)
    mini_stream_cutoff: u32,
    /// Sector ids of the FAT sectors, header DIFAT first
    difat: Vec<u32>,
    /// File Allocation Table - maps sector to next sector in chain
    fat: Vec<u32>,
    /// Mini FAT - for streams smaller than cutoff size
    minifat: Vec<u32>,
    /// All directory entries indexed by SID
    entries: Vec<DirectoryEntry>,
    /// Contents of the mini stream (the root entry's chain)
    ministream: Vec<u8>,
}

impl CompoundFile {
    /// Parse a compound file from an in-memory buffer.
    ///
    /// Fails only when the buffer is not a compound file at all (wrong or missing
    /// signature, unusable sector size). Damaged allocation tables are repaired by
    /// truncation and reported through the log.
    pub fn open(data: impl Into<Bytes>) -> Result<Self, OleError> {
        let data: Bytes = data.into();

        if data.len() < HEADER_SIZE {
            return Err(OleError::NotOleFile);
        }
        let header = &data[..HEADER_SIZE];
        if &header[0..8] != MAGIC && &header[0..8] != MAGIC_REVERSED {
            return Err(OleError::NotOleFile);
        }

        // Parse header fields (little-endian)
        let field16 = |offset: usize| read_u16_le(header, offset).unwrap_or(0);
        let field32 = |offset: usize| read_u32_le(header, offset).unwrap_or(0);

        let major_version = field16(0x1A);
        let byte_order = field16(0x1C);
        let sector_shift = field16(0x1E);
        let mini_sector_shift = field16(0x20);
        let first_dir_sector = field32(0x30);
        let mini_stream_cutoff = field32(0x38);
        let first_minifat_sector = field32(0x3C);
        let first_difat_sector = field32(0x44);
        let num_difat_sectors = field32(0x48);

        if byte_order != 0xFFFE {
            warn!("unexpected byte order mark {byte_order:#06x}, assuming little-endian");
        }
        if !(7..=16).contains(&sector_shift) {
            return Err(OleError::InvalidFormat(format!(
                "unsupported sector shift {sector_shift}"
            )));
        }

        let sector_size = 1usize << sector_shift;
        let mini_sector_size = if (1..sector_shift).contains(&mini_sector_shift) {
            1usize << mini_sector_shift
        } else {
            warn!("implausible mini sector shift {mini_sector_shift}, using 64-byte mini sectors");
            DEFAULT_MINI_SECTOR_SIZE
        };
        debug!(
            "compound file v{major_version}: {sector_size}-byte sectors, {} bytes total",
            data.len()
        );

        let mut cfb = CompoundFile {
            data,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff,
            difat: Vec::new(),
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            ministream: Vec::new(),
        };

        cfb.difat = cfb.load_difat(first_difat_sector, num_difat_sectors);
        cfb.fat = cfb.load_fat();
        cfb.entries = cfb.load_directory(first_dir_sector);
        cfb.minifat = cfb.load_minifat(first_minifat_sector);
        cfb.ministream = cfb.load_ministream();

        Ok(cfb)
    }

    /// Sector size in bytes.
    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// The decoded FAT (`sector -> next sector or sentinel`).
    #[inline]
    pub fn fat(&self) -> &[u32] {
        &self.fat
    }

    /// Sector ids holding the FAT, in table order.
    #[inline]
    pub fn difat(&self) -> &[u32] {
        &self.difat
    }

    /// Collect the FAT sector ids: the 109 header slots, then any DIFAT sectors.
    fn load_difat(&self, first_difat_sector: u32, num_difat_sectors: u32) -> Vec<u32> {
        let header = &self.data[..HEADER_SIZE];
        let mut difat: Vec<u32> = (0..HEADER_DIFAT_ENTRIES)
            .map(|i| read_u32_le(header, HEADER_DIFAT_OFFSET + i * 4).unwrap_or(FREESECT))
            .take_while(|&sector| sector <= MAXREGSECT)
            .collect();

        if num_difat_sectors == 0 || first_difat_sector > MAXREGSECT {
            return difat;
        }

        let entries_per_sector = self.sector_size / 4 - 1; // last slot links to the next DIFAT sector
        let mut visited = FixedBitSet::with_capacity(self.sector_count());
        let mut current = first_difat_sector;
        for _ in 0..num_difat_sectors {
            let index = current as usize;
            if index >= visited.len() || visited.put(index) {
                warn!("DIFAT chain broken at sector {current:#x}; truncating FAT");
                break;
            }
            let Some(sector) = self.sector(current) else {
                warn!("DIFAT sector {current} lies beyond the end of the file");
                break;
            };
            difat.extend(
                (0..entries_per_sector)
                    .map(|i| read_u32_le(sector, i * 4).unwrap_or(FREESECT))
                    .filter(|&id| id <= MAXREGSECT),
            );
            current = read_u32_le(sector, entries_per_sector * 4).unwrap_or(ENDOFCHAIN);
            if current > MAXREGSECT {
                break;
            }
        }

        difat
    }

    /// Read all FAT sectors and build the FAT table
    fn load_fat(&self) -> Vec<u32> {
        let entries_per_sector = self.sector_size / 4;
        let mut fat = Vec::with_capacity(self.difat.len() * entries_per_sector);

        for &sector_id in &self.difat {
            match self.sector(sector_id) {
                Some(sector) => fat.extend(
                    (0..entries_per_sector).map(|i| read_u32_le(sector, i * 4).unwrap_or(FREESECT)),
                ),
                None => {
                    warn!("FAT sector {sector_id} lies beyond the end of the file");
                    fat.extend(std::iter::repeat_n(FREESECT, entries_per_sector));
                },
            }
        }

        fat
    }

    /// Parse the directory stream into 128-byte entries, indexed by SID.
    fn load_directory(&self, first_dir_sector: u32) -> Vec<DirectoryEntry> {
        let dir_data = self.read_chain(first_dir_sector, usize::MAX);
        dir_data
            .chunks_exact(DIRENTRY_SIZE)
            .enumerate()
            .map(|(sid, raw)| self.parse_directory_entry(raw, sid as u32))
            .collect()
    }

    /// Parse a single directory entry from 128 bytes
    fn parse_directory_entry(&self, data: &[u8], sid: u32) -> DirectoryEntry {
        let Ok(raw) = RawDirectoryEntry::read_from_bytes(data) else {
            return DirectoryEntry::empty(sid);
        };

        let name_len = (raw.name_len.get() as usize).min(64);
        let name = decode_utf16le(&raw.name[..name_len]);

        // 512-byte sector files only use the low 32 bits of the size
        let size = if self.sector_size == 512 {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };

        DirectoryEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            start_sector: raw.start_sector.get(),
            size,
        }
    }

    /// Load the Mini FAT (for small streams)
    fn load_minifat(&self, first_minifat_sector: u32) -> Vec<u32> {
        if first_minifat_sector > MAXREGSECT {
            return Vec::new();
        }
        self.read_chain(first_minifat_sector, usize::MAX)
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn load_ministream(&self) -> Vec<u8> {
        match self.entries.first() {
            Some(root) if root.is_root() && root.start_sector <= MAXREGSECT => {
                self.read_chain(root.start_sector, clamp_size(root.size))
            },
            _ => Vec::new(),
        }
    }

    #[inline]
    fn sector_count(&self) -> usize {
        (self.data.len() / self.sector_size).saturating_sub(1) + 1
    }

    /// Bytes of one sector. A trailing short sector is returned as-is.
    fn sector(&self, sector_id: u32) -> Option<&[u8]> {
        // Sector position in file: (sector_id + 1) * sector_size
        let start = (sector_id as usize).checked_add(1)?.checked_mul(self.sector_size)?;
        if start >= self.data.len() {
            return None;
        }
        let end = (start + self.sector_size).min(self.data.len());
        Some(&self.data[start..end])
    }

    /// Follow a FAT chain from `start` to END_OF_CHAIN.
    ///
    /// Stops early (with a warning) on an index outside the FAT or on a sector that
    /// was already visited, so corrupt or cyclic chains always terminate.
    pub fn sector_chain(&self, start: u32) -> Vec<u32> {
        walk_chain(&self.fat, start, "FAT")
    }

    /// Concatenate the sectors of a FAT chain, keeping at most `size` bytes.
    fn read_chain(&self, start: u32, size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size.min(self.data.len()));
        for sector_id in self.sector_chain(start) {
            if data.len() >= size {
                break;
            }
            match self.sector(sector_id) {
                Some(sector) => data.extend_from_slice(sector),
                None => {
                    warn!("sector {sector_id} lies beyond the end of the file; truncating stream");
                    break;
                },
            }
        }
        data.truncate(size);
        data
    }

    /// Concatenate the mini sectors of a MiniFAT chain, keeping at most `size` bytes.
    fn read_mini_chain(&self, start: u32, size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size.min(self.ministream.len()));
        for mini_id in walk_chain(&self.minifat, start, "MiniFAT") {
            if data.len() >= size {
                break;
            }
            let position = mini_id as usize * self.mini_sector_size;
            if position >= self.ministream.len() {
                warn!("mini sector {mini_id} lies beyond the mini stream; truncating stream");
                break;
            }
            let end = (position + self.mini_sector_size).min(self.ministream.len());
            data.extend_from_slice(&self.ministream[position..end]);
        }
        data.truncate(size);
        data
    }

    /// All non-empty directory entries in SID order.
    pub fn list_entries(&self) -> impl Iterator<Item = &DirectoryEntry> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.entry_type != STGTY_EMPTY)
    }

    /// Read the contents of a stream entry.
    ///
    /// The result is truncated to the declared size and never longer, even if the
    /// chain holds more sectors. A chain that ends early yields a short stream.
    pub fn read_stream(&self, entry: &DirectoryEntry) -> Result<Vec<u8>, OleError> {
        if !entry.is_stream() && !entry.is_root() {
            return Err(OleError::InvalidFormat(format!(
                "'{}' is not a stream",
                entry.name
            )));
        }

        let size = clamp_size(entry.size);
        let data = if entry.is_stream() && entry.size < self.mini_stream_cutoff as u64 {
            self.read_mini_chain(entry.start_sector, size)
        } else {
            self.read_chain(entry.start_sector, size)
        };

        if data.len() < size {
            warn!(
                "stream '{}' declares {} bytes but its chain holds {}",
                entry.name,
                entry.size,
                data.len()
            );
        }
        Ok(data)
    }

    /// Find a top-level entry by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        let root = self.entries.first().filter(|root| root.is_root());
        let found = root.and_then(|root| self.find_child_by_name(root.sid_child, name));

        // A damaged sibling tree can hide entries; fall back to a linear scan
        found.or_else(|| {
            self.entries
                .iter()
                .find(|entry| !entry.is_root() && entry.name.eq_ignore_ascii_case(name))
        })
    }

    /// Find a child entry by name in the red-black sibling tree.
    fn find_child_by_name(&self, sid: u32, name: &str) -> Option<&DirectoryEntry> {
        let mut visited = FixedBitSet::with_capacity(self.entries.len());
        let mut pending = vec![sid];

        while let Some(sid) = pending.pop() {
            let index = sid as usize;
            if sid == NOSTREAM || index >= self.entries.len() || visited.put(index) {
                continue;
            }
            let entry = &self.entries[index];
            if entry.name.eq_ignore_ascii_case(name) {
                return Some(entry);
            }
            pending.push(entry.sid_left);
            pending.push(entry.sid_right);
        }

        None
    }

    /// Read a top-level stream by name.
    pub fn read_stream_by_name(&self, name: &str) -> Result<Vec<u8>, OleError> {
        let entry = self
            .find(name)
            .ok_or_else(|| OleError::StreamNotFound(name.to_string()))?;
        self.read_stream(entry)
    }

    /// Check if a top-level entry exists
    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl DirectoryEntry {
    fn empty(sid: u32) -> Self {
        DirectoryEntry {
            sid,
            name: String::new(),
            entry_type: STGTY_EMPTY,
            sid_left: NOSTREAM,
            sid_right: NOSTREAM,
            sid_child: NOSTREAM,
            start_sector: ENDOFCHAIN,
            size: 0,
        }
    }
}

/// Walk an allocation table from `start`, guarding against cycles and bad indices.
fn walk_chain(table: &[u32], start: u32, label: &str) -> Vec<u32> {
    let mut chain = Vec::new();
    let mut visited = FixedBitSet::with_capacity(table.len());
    let mut current = start;

    while current != ENDOFCHAIN {
        let index = current as usize;
        if index >= table.len() {
            if current <= MAXREGSECT {
                warn!("{label} chain points outside the table at sector {current}; truncating");
            } else if current != FREESECT {
                debug!("{label} chain ends on sentinel {current:#x}");
            }
            break;
        }
        if visited.put(index) {
            warn!("{label} chain loops back to sector {current}; truncating");
            break;
        }
        chain.push(current);
        current = table[index];
    }

    chain
}

#[inline]
fn clamp_size(size: u64) -> usize {
    usize::try_from(size).unwrap_or(usize::MAX)
}

/// Check if data starts with a compound file signature (either byte order)
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && (&data[0..8] == MAGIC || &data[0..8] == MAGIC_REVERSED)
}
