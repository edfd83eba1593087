/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// The same signature written with its byte order reversed; some writers emit it
pub const MAGIC_REVERSED: &[u8; 8] = b"\xE1\x1A\xB1\xA1\xE0\x11\xCF\xD0";

/// Local file header signature of a ZIP archive (OOXML packages)
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Size of the compound file header in bytes
pub const HEADER_SIZE: usize = 512;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Number of FAT sector ids stored in the header DIFAT
pub const HEADER_DIFAT_ENTRIES: usize = 109;

/// Offset of the header DIFAT array
pub const HEADER_DIFAT_OFFSET: usize = 0x4C;

/// Default mini sector size (64 bytes) used when the header shift is implausible
pub const DEFAULT_MINI_SECTOR_SIZE: usize = 64;

// Sector IDs (from AAF specifications)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage (from AAF specifications)
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;
