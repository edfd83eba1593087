//! Builders for compound files and WordDocument streams used by the integration tests.
#![allow(dead_code)]

const SECTOR: usize = 512;
const MINI_SECTOR: usize = 64;
const ENTRIES_PER_SECTOR: usize = SECTOR / 128;
const IDS_PER_SECTOR: usize = SECTOR / 4;

const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";
const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
const FREESECT: u32 = 0xFFFF_FFFF;
const FATSECT: u32 = 0xFFFF_FFFD;
const NOSTREAM: u32 = 0xFFFF_FFFF;

/// Writes a version 3 compound file with top-level streams.
pub struct CfbBuilder {
    cutoff: usize,
    streams: Vec<(String, Vec<u8>)>,
}

impl Default for CfbBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CfbBuilder {
    pub fn new() -> Self {
        Self {
            cutoff: 4096,
            streams: Vec::new(),
        }
    }

    /// Store every stream in regular sectors.
    pub fn without_mini_stream(mut self) -> Self {
        self.cutoff = 0;
        self
    }

    pub fn stream(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.streams.push((name.to_string(), data.into()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.build_with_fat(|_, _| {})
    }

    /// Build, letting `patch` edit the FAT. It also receives each stream's first sector.
    pub fn build_with_fat(self, patch: impl FnOnce(&mut Vec<u32>, &[(String, u32)])) -> Vec<u8> {
        let is_mini = |data: &Vec<u8>| !data.is_empty() && data.len() < self.cutoff;

        // Mini stream and MiniFAT
        let mut mini_stream = Vec::new();
        let mut minifat = Vec::new();
        let mut mini_starts = Vec::new();
        for (_, data) in &self.streams {
            if !is_mini(data) {
                mini_starts.push(None);
                continue;
            }
            let first = (mini_stream.len() / MINI_SECTOR) as u32;
            let count = data.len().div_ceil(MINI_SECTOR);
            for i in 0..count {
                let next = if i + 1 == count { ENDOFCHAIN } else { first + i as u32 + 1 };
                minifat.push(next);
            }
            mini_stream.extend_from_slice(data);
            mini_stream.resize((first as usize + count) * MINI_SECTOR, 0);
            mini_starts.push(Some(first));
        }

        let dir_sectors = (self.streams.len() + 1).div_ceil(ENTRIES_PER_SECTOR);
        let minifat_sectors = (minifat.len() * 4).div_ceil(SECTOR);
        let mini_stream_sectors = mini_stream.len().div_ceil(SECTOR);
        let big_sectors: Vec<usize> = self
            .streams
            .iter()
            .map(|(_, data)| if is_mini(data) { 0 } else { data.len().div_ceil(SECTOR) })
            .collect();
        let rest = dir_sectors + minifat_sectors + mini_stream_sectors + big_sectors.iter().sum::<usize>();

        let mut fat_sectors = 1;
        while (fat_sectors + rest).div_ceil(IDS_PER_SECTOR) > fat_sectors {
            fat_sectors += 1;
        }
        assert!(fat_sectors <= 109, "test files stay within the header DIFAT");

        let mut fat = vec![FREESECT; fat_sectors * IDS_PER_SECTOR];
        let mut next_sector = 0usize;
        let mut allocate = |fat: &mut Vec<u32>, count: usize, marker: Option<u32>| -> u32 {
            if count == 0 {
                return ENDOFCHAIN;
            }
            let first = next_sector;
            for i in 0..count {
                fat[first + i] = match marker {
                    Some(marker) => marker,
                    None if i + 1 == count => ENDOFCHAIN,
                    None => (first + i + 1) as u32,
                };
            }
            next_sector += count;
            first as u32
        };

        allocate(&mut fat, fat_sectors, Some(FATSECT));
        let dir_start = allocate(&mut fat, dir_sectors, None);
        let minifat_start = allocate(&mut fat, minifat_sectors, None);
        let mini_stream_start = allocate(&mut fat, mini_stream_sectors, None);
        let big_starts: Vec<u32> = big_sectors
            .iter()
            .map(|&count| allocate(&mut fat, count, None))
            .collect();
        let total_sectors = next_sector;

        let starts: Vec<(String, u32)> = self
            .streams
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), mini_starts[i].unwrap_or(big_starts[i])))
            .collect();
        patch(&mut fat, &starts);

        let mut file = vec![0u8; SECTOR * (total_sectors + 1)];
        let header = &mut file[..SECTOR];
        header[0..8].copy_from_slice(MAGIC);
        put_u16(header, 0x18, 0x3E);
        put_u16(header, 0x1A, 3);
        put_u16(header, 0x1C, 0xFFFE);
        put_u16(header, 0x1E, 9);
        put_u16(header, 0x20, 6);
        put_u32(header, 0x2C, fat_sectors as u32);
        put_u32(header, 0x30, dir_start);
        put_u32(header, 0x38, self.cutoff as u32);
        put_u32(header, 0x3C, minifat_start);
        put_u32(header, 0x40, minifat_sectors as u32);
        put_u32(header, 0x44, ENDOFCHAIN);
        put_u32(header, 0x48, 0);
        for i in 0..109 {
            let id = if i < fat_sectors { i as u32 } else { FREESECT };
            put_u32(header, 0x4C + i * 4, id);
        }

        // FAT sectors are 0..fat_sectors
        for (i, id) in fat.iter().enumerate() {
            put_u32(&mut file, SECTOR + i * 4, *id);
        }

        let mut directory = vec![0u8; dir_sectors * SECTOR];
        let root_child = if self.streams.is_empty() { NOSTREAM } else { 1 };
        let root_start = if mini_stream.is_empty() { ENDOFCHAIN } else { mini_stream_start };
        write_entry(
            &mut directory[0..128],
            "Root Entry",
            5,
            NOSTREAM,
            root_child,
            root_start,
            mini_stream.len() as u64,
        );
        for (i, (name, data)) in self.streams.iter().enumerate() {
            let right = if i + 1 < self.streams.len() { i as u32 + 2 } else { NOSTREAM };
            let slot = &mut directory[(i + 1) * 128..(i + 2) * 128];
            write_entry(slot, name, 2, right, NOSTREAM, starts[i].1, data.len() as u64);
        }
        for slot in directory.chunks_exact_mut(128).skip(self.streams.len() + 1) {
            write_entry(slot, "", 0, NOSTREAM, NOSTREAM, FREESECT, 0);
        }
        write_chain(&mut file, dir_start, &directory);

        let minifat_bytes: Vec<u8> = minifat.iter().flat_map(|id| id.to_le_bytes()).collect();
        write_chain(&mut file, minifat_start, &minifat_bytes);
        write_chain(&mut file, mini_stream_start, &mini_stream);
        for (i, (_, data)) in self.streams.iter().enumerate() {
            if mini_starts[i].is_none() {
                write_chain(&mut file, big_starts[i], data);
            }
        }

        file
    }
}

/// Copy `data` into consecutive sectors starting at `start`.
fn write_chain(file: &mut [u8], start: u32, data: &[u8]) {
    if data.is_empty() {
        return;
    }
    let offset = (start as usize + 1) * SECTOR;
    file[offset..offset + data.len()].copy_from_slice(data);
}

fn write_entry(slot: &mut [u8], name: &str, kind: u8, right: u32, child: u32, start: u32, size: u64) {
    let units: Vec<u16> = name.encode_utf16().collect();
    for (i, unit) in units.iter().enumerate() {
        slot[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    let name_len = if units.is_empty() { 0 } else { (units.len() as u16 + 1) * 2 };
    slot[64..66].copy_from_slice(&name_len.to_le_bytes());
    slot[66] = kind;
    slot[67] = 1;
    slot[68..72].copy_from_slice(&NOSTREAM.to_le_bytes());
    slot[72..76].copy_from_slice(&right.to_le_bytes());
    slot[76..80].copy_from_slice(&child.to_le_bytes());
    slot[116..120].copy_from_slice(&start.to_le_bytes());
    slot[120..128].copy_from_slice(&size.to_le_bytes());
}

pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Field offsets of one FIB generation.
#[derive(Debug, Clone, Copy)]
pub struct FibLayout {
    pub ident: u16,
    pub nfib: u16,
    pub ccp_base: usize,
    pub plcf_bte_chpx: usize,
    pub plcf_bte_papx: usize,
    pub clx: usize,
}

/// Word 97-2003
pub const MODERN: FibLayout = FibLayout {
    ident: 0xA5EC,
    nfib: 0x00C1,
    ccp_base: 0x4C,
    plcf_bte_chpx: 0xFA,
    plcf_bte_papx: 0x102,
    clx: 0x1A2,
};

/// Word 6/95
pub const LEGACY: FibLayout = FibLayout {
    ident: 0xA5DC,
    nfib: 0x0065,
    ccp_base: 0x34,
    plcf_bte_chpx: 0xB8,
    plcf_bte_papx: 0xC0,
    clx: 0x160,
};

pub const FLAG_ENCRYPTED: u16 = 0x0100;
pub const FLAG_WHICH_TBL_STM: u16 = 0x0200;

/// A zeroed WordDocument stream of `len` bytes with a FIB header for `layout`.
pub fn word_document(layout: FibLayout, len: usize, ccp_text: u32) -> Vec<u8> {
    let mut doc = vec![0u8; len.max(SECTOR)];
    put_u16(&mut doc, 0, layout.ident);
    put_u16(&mut doc, 2, layout.nfib);
    put_u16(&mut doc, 6, 0x0409);
    put_u32(&mut doc, layout.ccp_base, ccp_text);
    doc
}

pub fn set_flags(doc: &mut [u8], flags: u16) {
    put_u16(doc, 0x0A, flags);
}

pub fn set_fc_lcb(doc: &mut [u8], offset: usize, fc: usize, lcb: usize) {
    put_u32(doc, offset, fc as u32);
    put_u32(doc, offset + 4, lcb as u32);
}

pub fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Tagged CLX holding a PlcPcd built from CP limits and raw piece offsets.
pub fn clx(cps: &[u32], raw_fcs: &[u32]) -> Vec<u8> {
    let mut body: Vec<u8> = cps.iter().flat_map(|cp| cp.to_le_bytes()).collect();
    for fc in raw_fcs {
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&fc.to_le_bytes());
        body.extend_from_slice(&[0, 0]);
    }
    let mut clx = vec![0x02];
    clx.extend_from_slice(&(body.len() as u32).to_le_bytes());
    clx.extend_from_slice(&body);
    clx
}

/// A PLC of `positions` with 4-byte elements.
pub fn plc(positions: &[u32], elements: &[u32]) -> Vec<u8> {
    positions
        .iter()
        .chain(elements)
        .flat_map(|value| value.to_le_bytes())
        .collect()
}

/// A FKP page of runs over `fcs`; `grpprls[i]` is the CHPX of run `i`, empty for none.
pub fn chpx_page(fcs: &[u32], grpprls: &[&[u8]]) -> [u8; SECTOR] {
    let mut page = [0u8; SECTOR];
    for (i, fc) in fcs.iter().enumerate() {
        put_u32(&mut page, i * 4, *fc);
    }
    let bx_offset = fcs.len() * 4;
    let mut next = SECTOR - 1;
    for (i, grpprl) in grpprls.iter().enumerate() {
        if grpprl.is_empty() {
            continue;
        }
        next = (next - grpprl.len() - 1) & !1;
        page[next] = grpprl.len() as u8;
        page[next + 1..next + 1 + grpprl.len()].copy_from_slice(grpprl);
        page[bx_offset + i] = (next / 2) as u8;
    }
    page[SECTOR - 1] = (fcs.len() - 1) as u8;
    page
}

/// A PAPX FKP page of runs over `fcs`, every run using style 0.
pub fn papx_page(fcs: &[u32]) -> [u8; SECTOR] {
    let mut page = [0u8; SECTOR];
    for (i, fc) in fcs.iter().enumerate() {
        put_u32(&mut page, i * 4, *fc);
    }
    page[SECTOR - 1] = (fcs.len() - 1) as u8;
    page
}

/// Word 6/95 file whose main text is the 8-bit string "Hi".
pub fn hi_word_document() -> Vec<u8> {
    let mut doc = word_document(LEGACY, 0x400, 2);
    put_u32(&mut doc, 0x18, 0x300);
    put_u32(&mut doc, 0x1C, 0x302);
    doc[0x300..0x302].copy_from_slice(b"Hi");

    let clx = clx(&[0, 2], &[0x300]);
    doc[0x320..0x320 + clx.len()].copy_from_slice(&clx);
    set_fc_lcb(&mut doc, LEGACY.clx, 0x320, clx.len());
    doc
}

/// Word 97 streams for "Hello " + "World" as two UTF-16 pieces at 0x400 and 0x40C.
///
/// With `with_papx`, a PAPX page covering both pieces is stored at page 3 and a CHPX
/// page at page 4 marks the first piece bold.
pub fn hello_world_streams(with_papx: bool) -> (Vec<u8>, Vec<u8>) {
    let mut doc = word_document(MODERN, 0xA00, 11);
    put_u32(&mut doc, 0x18, 0x400);
    put_u32(&mut doc, 0x1C, 0x416);
    let text = utf16("Hello World");
    doc[0x400..0x400 + text.len()].copy_from_slice(&text);

    let mut table = clx(&[0, 6, 11], &[0x400, 0x40C]);
    set_fc_lcb(&mut doc, MODERN.clx, 0, table.len());

    if with_papx {
        doc[0x600..0x800].copy_from_slice(&papx_page(&[0x400, 0x416]));
        let bold: &[u8] = &[0x35, 0x08, 0x01];
        doc[0x800..0xA00].copy_from_slice(&chpx_page(&[0x400, 0x40C, 0x416], &[bold, &[]]));

        let papx_bte = plc(&[0x400, 0x416], &[3]);
        set_fc_lcb(&mut doc, MODERN.plcf_bte_papx, table.len(), papx_bte.len());
        table.extend_from_slice(&papx_bte);

        let chpx_bte = plc(&[0x400, 0x416], &[4]);
        set_fc_lcb(&mut doc, MODERN.plcf_bte_chpx, table.len(), chpx_bte.len());
        table.extend_from_slice(&chpx_bte);
    }

    (doc, table)
}

/// A complete file holding the Hello World streams under `0Table`.
pub fn hello_world_file(with_papx: bool) -> Vec<u8> {
    let (doc, table) = hello_world_streams(with_papx);
    CfbBuilder::new()
        .stream("WordDocument", doc)
        .stream("0Table", table)
        .build()
}
