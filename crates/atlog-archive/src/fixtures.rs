//! In-memory ZIP builder for tests.
//!
//! Compiled for this crate's tests and for downstream crates that enable the
//! `fixtures` feature.

#![allow(clippy::cast_possible_truncation)]

use std::io::Write;

use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;

struct Entry {
    name: String,
    data: Vec<u8>,
    raw_len: usize,
    crc: u32,
    method: u16,
    flags: u16,
}

/// Builds Zip32 archives entry by entry.
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
}

fn crc_of(bytes: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(bytes);
    crc.sum()
}

impl ZipBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, data: Vec<u8>, raw_len: usize, crc: u32, method: u16, flags: u16) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data,
            raw_len,
            crc,
            method,
            flags,
        });
        self
    }

    #[must_use]
    pub fn stored(self, name: &str, bytes: &[u8]) -> Self {
        self.push(name, bytes.to_vec(), bytes.len(), crc_of(bytes), 0, 0)
    }

    /// # Panics
    ///
    /// Panics if the in-memory deflate encoder fails.
    #[must_use]
    pub fn deflated(self, name: &str, bytes: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).expect("in-memory deflate");
        let data = encoder.finish().expect("in-memory deflate");
        self.push(name, data, bytes.len(), crc_of(bytes), 8, 0)
    }

    /// Stored entry whose recorded CRC-32 is wrong.
    #[must_use]
    pub fn with_bad_crc(self, name: &str, bytes: &[u8]) -> Self {
        self.push(name, bytes.to_vec(), bytes.len(), !crc_of(bytes), 0, 0)
    }

    /// Stored entry flagged as encrypted.
    #[must_use]
    pub fn encrypted(self, name: &str, bytes: &[u8]) -> Self {
        self.push(name, bytes.to_vec(), bytes.len(), crc_of(bytes), 0, 0x0001)
    }

    /// Entry whose bytes are another archive, stored.
    #[must_use]
    pub fn nested(self, name: &str, inner: &Self) -> Self {
        let bytes = inner.build();
        self.stored(name, &bytes)
    }

    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            offsets.push(out.len() as u32);
            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&entry.flags.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // time + date
            out.extend_from_slice(&entry.crc.to_le_bytes());
            out.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.raw_len as u32).to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.data);
        }

        let cd_start = out.len();
        for (entry, offset) in self.entries.iter().zip(offsets) {
            out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version made by
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&entry.flags.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // time + date
            out.extend_from_slice(&entry.crc.to_le_bytes());
            out.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.raw_len as u32).to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&[0u8; 12]); // extra, comment, disk, attrs
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(entry.name.as_bytes());
        }
        let cd_size = out.len() - cd_start;

        let count = self.entries.len() as u16;
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]); // disk numbers
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&(cd_size as u32).to_le_bytes());
        out.extend_from_slice(&(cd_start as u32).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // comment
        out
    }
}
