//! In-memory ROM image.

use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Size of an address field in the image
pub const POINTER_SIZE: usize = 4;

/// The whole ROM, addressed by absolute file offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomImage {
    data: Vec<u8>,
}

impl RomImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Read the image from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let data = fs::read(path)?;
        debug!("Loaded ROM {} ({} bytes)", path.display(), data.len());
        Ok(Self { data })
    }

    /// Write the image through a temporary file that replaces `path` only once
    /// every byte has been written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&self.data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!("Saved ROM {} ({} bytes)", path.display(), self.data.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn read_bytes(&self, offset: usize, size: usize) -> Option<&[u8]> {
        self.data.get(offset..offset.checked_add(size)?)
    }

    pub fn read_u32_le(&self, offset: usize) -> Option<u32> {
        let bytes = self.read_bytes(offset, POINTER_SIZE)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn write_u32_le(&mut self, offset: usize, value: u32) -> Result<()> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let range = self.checked_range(offset, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Overwrite `range` with `byte`
    pub fn fill(&mut self, range: Range<usize>, byte: u8) -> Result<()> {
        let range = self.checked_range(range.start, range.len())?;
        self.data[range].fill(byte);
        Ok(())
    }

    /// Position of the first `byte` at or after `offset`
    pub fn find_byte(&self, offset: usize, byte: u8) -> Option<usize> {
        let tail = self.data.get(offset..)?;
        memchr::memchr(byte, tail).map(|pos| offset + pos)
    }

    /// Bytes from `offset` up to, not including, the next `terminator`.
    ///
    /// `None` when the offset is outside the image or no terminator follows it.
    pub fn string_at(&self, offset: usize, terminator: u8) -> Option<&[u8]> {
        let end = self.find_byte(offset, terminator)?;
        Some(&self.data[offset..end])
    }

    /// Length of the storage slot starting at `offset`, terminator included.
    ///
    /// Zero when no terminator follows the offset.
    pub fn slot_len(&self, offset: usize, terminator: u8) -> usize {
        self.find_byte(offset, terminator)
            .map_or(0, |end| end - offset + 1)
    }

    fn checked_range(&self, offset: usize, size: usize) -> Result<Range<usize>> {
        match offset.checked_add(size) {
            Some(end) if end <= self.data.len() => Ok(offset..end),
            _ => Err(Error::InvalidOffset(format!(
                "0x{:08X}+{} is outside the image (0x{:X} bytes)",
                offset,
                size,
                self.data.len()
            ))),
        }
    }
}

impl From<Vec<u8>> for RomImage {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
