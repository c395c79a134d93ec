//! In-memory Zip32 reader.
//!
//! # Supported
//! - Zip32 (EOCD + central directory), entries stored (0) or deflated (8).
//!
//! # Not Supported
//! - Zip64 (sentinel `0xFFFF` / `0xFFFF_FFFF` fields), multi-disk archives.
//! - Encrypted entries (flag bit 0); they are reported per entry.
//!
//! # Invariants
//! - Every size and offset read from the archive is bounds-checked against
//!   the buffer before it is used.
//! - Only the central directory is read by [`ZipIndex::parse`]; entry data is
//!   decompressed on demand by [`read_entry`], which also verifies size and
//!   CRC-32. [`salvage_entry`] recovers what it can from a refused entry.
//! - A local header that is not at its recorded offset is searched for in a
//!   small window around it, which recovers archives with shifted offsets.

use std::io::Read;

use flate2::Crc;
use flate2::read::DeflateDecoder;

use crate::error::{ContainerError, EntryError};

const SIG_EOCD: u32 = 0x0605_4b50;
const SIG_CDFH: u32 = 0x0201_4b50;
const SIG_LFH: u32 = 0x0403_4b50;

const EOCD_MIN_LEN: usize = 22;
const EOCD_SEARCH_MAX: usize = 66 * 1024; // 64 KiB comment + header margin

/// Central directory fixed header length.
const CDFH_LEN: usize = 46;
/// Local file header fixed length.
const LFH_LEN: usize = 30;

/// Window searched for a misplaced local header.
const LFH_SEARCH_BACK: usize = 8;
const LFH_SEARCH_FORWARD: usize = 64;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// Upper bound on the up-front allocation for one inflated entry.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

#[inline]
fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

#[inline]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[inline]
fn to_usize(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

/// Central-directory metadata for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in the central directory.
    pub index: usize,
    /// Entry path as stored (UTF-8, else Latin-1).
    pub name: String,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    local_header_offset: usize,
}

impl ArchiveEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/') || self.name.ends_with('\\')
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    /// Last path segment of the entry name.
    #[must_use]
    pub fn basename(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.name)
    }

    /// Entry whose name marks it as a ZIP archive itself.
    #[must_use]
    pub fn is_nested_archive(&self) -> bool {
        !self.is_dir() && self.basename().to_ascii_lowercase().ends_with(".zip")
    }
}

/// Parsed central directory of one archive buffer.
///
/// Holds no reference to the buffer; pass the same bytes to [`read_entry`].
#[derive(Debug, Clone, Default)]
pub struct ZipIndex {
    entries: Vec<ArchiveEntry>,
}

impl ZipIndex {
    /// Locate the end-of-central-directory record and read every entry header.
    pub fn parse(data: &[u8]) -> Result<Self, ContainerError> {
        let eocd_at = find_eocd(data).ok_or(ContainerError::NoEndOfCentralDirectory)?;
        let eocd = &data[eocd_at..];

        let disk_no = le_u16(&eocd[4..6]);
        let cd_disk = le_u16(&eocd[6..8]);
        let entries_disk = le_u16(&eocd[8..10]);
        let entries_total = le_u16(&eocd[10..12]);
        let cd_size = le_u32(&eocd[12..16]);
        let cd_off = le_u32(&eocd[16..20]);

        if disk_no != 0 || cd_disk != 0 || entries_disk != entries_total {
            return Err(ContainerError::MultiDisk);
        }
        if entries_total == 0xFFFF || cd_size == 0xFFFF_FFFF || cd_off == 0xFFFF_FFFF {
            return Err(ContainerError::Zip64);
        }

        let cd_start = to_usize(u64::from(cd_off));
        let cd_end = cd_start
            .checked_add(to_usize(u64::from(cd_size)))
            .filter(|&end| end <= eocd_at)
            .ok_or(ContainerError::CentralDirectoryOutOfBounds)?;

        let mut entries = Vec::with_capacity(usize::from(entries_total));
        let mut pos = cd_start;
        for index in 0..usize::from(entries_total) {
            let header = pos
                .checked_add(CDFH_LEN)
                .filter(|&end| end <= cd_end)
                .map(|end| &data[pos..end])
                .ok_or(ContainerError::Truncated { offset: pos })?;
            if le_u32(header) != SIG_CDFH {
                return Err(ContainerError::BadCentralHeader { offset: pos });
            }

            let flags = le_u16(&header[8..10]);
            let method = le_u16(&header[10..12]);
            let crc32 = le_u32(&header[16..20]);
            let compressed = le_u32(&header[20..24]);
            let uncompressed = le_u32(&header[24..28]);
            let name_len = usize::from(le_u16(&header[28..30]));
            let extra_len = usize::from(le_u16(&header[30..32]));
            let comment_len = usize::from(le_u16(&header[32..34]));
            let local = le_u32(&header[42..46]);

            if compressed == 0xFFFF_FFFF || uncompressed == 0xFFFF_FFFF || local == 0xFFFF_FFFF {
                return Err(ContainerError::Zip64);
            }

            let name_start = pos + CDFH_LEN;
            let name_end = name_start + name_len;
            if name_end > cd_end {
                return Err(ContainerError::Truncated { offset: pos });
            }

            entries.push(ArchiveEntry {
                index,
                name: decode_name(&data[name_start..name_end]),
                flags,
                method,
                crc32,
                compressed_size: u64::from(compressed),
                uncompressed_size: u64::from(uncompressed),
                local_header_offset: to_usize(u64::from(local)),
            });
            pos = name_end + extra_len + comment_len;
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decompress one entry of `data`, verifying its size and CRC-32.
pub fn read_entry(data: &[u8], entry: &ArchiveEntry) -> Result<Vec<u8>, EntryError> {
    if entry.is_encrypted() {
        return Err(EntryError::Encrypted);
    }
    if !matches!(entry.method, METHOD_STORED | METHOD_DEFLATE) {
        return Err(EntryError::UnsupportedMethod(entry.method));
    }

    let raw = entry_data(data, entry)?;
    let bytes = if entry.method == METHOD_STORED {
        raw.to_vec()
    } else {
        inflate(raw, entry.uncompressed_size)?
    };

    let actual = bytes.len() as u64;
    if actual != entry.uncompressed_size {
        return Err(EntryError::SizeMismatch {
            expected: entry.uncompressed_size,
            actual,
        });
    }

    let mut crc = Crc::new();
    crc.update(&bytes);
    if crc.sum() != entry.crc32 {
        return Err(EntryError::CrcMismatch {
            expected: entry.crc32,
            actual: crc.sum(),
        });
    }
    Ok(bytes)
}

/// Best bytes recoverable from an entry that [`read_entry`] refused.
///
/// Inflated output when decompression succeeds but size or CRC-32 do not
/// match, otherwise the data exactly as stored in the container. `None`
/// when the entry data cannot be located.
#[must_use]
pub fn salvage_entry(data: &[u8], entry: &ArchiveEntry) -> Option<Vec<u8>> {
    let raw = entry_data(data, entry).ok()?;
    if entry.method == METHOD_DEFLATE && !entry.is_encrypted() {
        if let Ok(bytes) = inflate(raw, entry.uncompressed_size) {
            return Some(bytes);
        }
    }
    Some(raw.to_vec())
}

/// Compressed data span of `entry`, located through its local header.
fn entry_data<'a>(data: &'a [u8], entry: &ArchiveEntry) -> Result<&'a [u8], EntryError> {
    let header_at =
        locate_local_header(data, entry.local_header_offset).ok_or(EntryError::MissingLocalHeader)?;
    let lfh = &data[header_at..header_at + LFH_LEN];
    let name_len = usize::from(le_u16(&lfh[26..28]));
    let extra_len = usize::from(le_u16(&lfh[28..30]));

    let start = header_at + LFH_LEN + name_len + extra_len;
    let end = start
        .checked_add(to_usize(entry.compressed_size))
        .filter(|&end| end <= data.len())
        .ok_or(EntryError::Truncated)?;
    Ok(&data[start..end])
}

fn find_eocd(data: &[u8]) -> Option<usize> {
    if data.len() < EOCD_MIN_LEN {
        return None;
    }
    let floor = data.len().saturating_sub(EOCD_SEARCH_MAX);
    let mut pos = data.len() - EOCD_MIN_LEN;
    loop {
        if le_u32(&data[pos..]) == SIG_EOCD {
            // A signature inside the comment is a false positive when its
            // own comment length overruns the buffer.
            let comment_len = usize::from(le_u16(&data[pos + 20..]));
            if pos + EOCD_MIN_LEN + comment_len <= data.len() {
                return Some(pos);
            }
        }
        if pos == floor {
            return None;
        }
        pos -= 1;
    }
}

fn locate_local_header(data: &[u8], offset: usize) -> Option<usize> {
    let has_sig = |at: usize| {
        at.checked_add(LFH_LEN)
            .filter(|&end| end <= data.len())
            .is_some_and(|_| le_u32(&data[at..]) == SIG_LFH)
    };
    if has_sig(offset) {
        return Some(offset);
    }
    let from = offset.saturating_sub(LFH_SEARCH_BACK);
    let to = offset.saturating_add(LFH_SEARCH_FORWARD).min(data.len());
    (from..to).find(|&at| has_sig(at))
}

fn inflate(raw: &[u8], expected: u64) -> Result<Vec<u8>, EntryError> {
    let mut out = Vec::with_capacity(to_usize(expected).min(MAX_PREALLOC));
    // One byte past the declared size is enough to detect a lying header.
    DeflateDecoder::new(raw)
        .take(expected.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| EntryError::Inflate(e.to_string()))?;
    Ok(out)
}

fn decode_name(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(name) => name.to_string(),
        Err(_) => raw.iter().map(|&b| char::from(b)).collect(),
    }
}
