//! Pointer discovery.
//!
//! Text is only reachable through 32-bit little-endian addresses stored
//! elsewhere in the image. The scanner reads those words either from the
//! configured address tables or from every aligned position of the image, and
//! keeps the ones that land inside the text area.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AddressWindow, ScanConfig, ScanMode, TableRegion};
use crate::rom::{POINTER_SIZE, RomImage};

/// A 32-bit word that looks like a pointer to text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointerCandidate {
    /// Where the pointer itself is stored
    pub pointer_offset: usize,
    pub raw_address: u32,
    /// File offset the pointer refers to
    pub target_offset: usize,
}

pub struct PointerScanner<'a> {
    rom: &'a RomImage,
    scan: &'a ScanConfig,
    window: AddressWindow,
}

impl<'a> PointerScanner<'a> {
    pub fn new(rom: &'a RomImage, scan: &'a ScanConfig, window: AddressWindow) -> Self {
        Self { rom, scan, window }
    }

    /// Scan with the configured strategy, in scan order
    pub fn scan(&self) -> Vec<PointerCandidate> {
        let candidates = match self.scan.mode {
            ScanMode::Tables => self.scan_tables(),
            ScanMode::Exhaustive => self.scan_exhaustive(),
        };
        info!(
            "{} scan found {} pointer candidates",
            self.scan.mode,
            candidates.len()
        );
        candidates
    }

    /// Read one word per row of every configured table
    pub fn scan_tables(&self) -> Vec<PointerCandidate> {
        let mut candidates = Vec::new();
        for table in &self.scan.tables {
            let before = candidates.len();
            self.scan_table(table, &mut candidates);
            debug!(
                "Table 0x{:X}..0x{:X} (row {}): {} candidates",
                table.start,
                table.end,
                table.row_size,
                candidates.len() - before
            );
        }
        candidates
    }

    fn scan_table(&self, table: &TableRegion, out: &mut Vec<PointerCandidate>) {
        let step = table.row_size.max(POINTER_SIZE);
        let mut offset = table.start;
        while offset < table.end {
            let Some(raw) = self.rom.read_u32_le(offset) else {
                break;
            };
            out.extend(self.candidate(offset, raw));
            offset += step;
        }
    }

    /// Read every 4-byte-aligned word of the image
    pub fn scan_exhaustive(&self) -> Vec<PointerCandidate> {
        let len = self.rom.len();
        (0..len)
            .step_by(POINTER_SIZE)
            .take_while(|offset| offset + POINTER_SIZE <= len)
            .filter_map(|offset| {
                let raw = self.rom.read_u32_le(offset)?;
                self.candidate(offset, raw)
            })
            .collect()
    }

    /// Accept `raw` only if it points into the text area of this image
    pub fn candidate(&self, pointer_offset: usize, raw: u32) -> Option<PointerCandidate> {
        let target_offset = self.window.to_offset(raw)?;
        (target_offset < self.rom.len() && target_offset >= self.scan.min_text_offset).then_some(
            PointerCandidate {
                pointer_offset,
                raw_address: raw,
                target_offset,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x0800_0000;

    fn rom_with_words(len: usize, words: &[(usize, u32)]) -> RomImage {
        let mut rom = RomImage::new(vec![0xFF; len]);
        for &(offset, value) in words {
            rom.write_u32_le(offset, value).unwrap();
        }
        rom
    }

    fn scan_config(mode: ScanMode, tables: Vec<TableRegion>) -> ScanConfig {
        ScanConfig {
            mode,
            min_text_offset: 0x80,
            tables,
        }
    }

    #[test]
    fn test_exhaustive_filters_window_and_bounds() {
        let rom = rom_with_words(
            0x100,
            &[
                (0x00, BASE + 0xC0),
                (0x04, BASE + 0x40),   // below min_text_offset
                (0x08, BASE + 0x100),  // past the image
                (0x0C, 0x0900_0000),   // outside the window
                (0x10, BASE + 0x80),
                (0xFC, BASE + 0xF0),
            ],
        );
        let scan = scan_config(ScanMode::Exhaustive, Vec::new());
        let candidates = PointerScanner::new(&rom, &scan, AddressWindow::default()).scan();

        let found: Vec<_> = candidates
            .iter()
            .map(|c| (c.pointer_offset, c.target_offset))
            .collect();
        assert_eq!(found, vec![(0x00, 0xC0), (0x10, 0x80), (0xFC, 0xF0)]);
        assert_eq!(candidates[0].raw_address, BASE + 0xC0);
    }

    #[test]
    fn test_exhaustive_skips_unaligned_words() {
        let mut rom = RomImage::new(vec![0; 0x100]);
        rom.write_u32_le(0x02, BASE + 0xC0).unwrap();
        let scan = scan_config(ScanMode::Exhaustive, Vec::new());
        assert!(PointerScanner::new(&rom, &scan, AddressWindow::default())
            .scan()
            .is_empty());
    }

    #[test]
    fn test_tables_respect_row_size() {
        let rom = rom_with_words(
            0x100,
            &[
                (0x00, BASE + 0x80),
                (0x04, BASE + 0x90), // attribute column, not a row start
                (0x08, BASE + 0xA0),
                (0x20, BASE + 0xB0),
                (0x30, BASE + 0xC0),
                (0x40, BASE + 0xD0), // past the second table
            ],
        );
        let scan = scan_config(
            ScanMode::Tables,
            vec![
                TableRegion::new(0x00, 0x10, 8),
                TableRegion::new(0x20, 0x40, 16),
            ],
        );
        let candidates = PointerScanner::new(&rom, &scan, AddressWindow::default()).scan();
        let pointers: Vec<_> = candidates.iter().map(|c| c.pointer_offset).collect();
        assert_eq!(pointers, vec![0x00, 0x08, 0x20, 0x30]);
    }

    #[test]
    fn test_table_stops_at_image_end() {
        let rom = rom_with_words(0x90, &[(0x88, BASE + 0x80), (0x8C, BASE + 0x80)]);
        let scan = scan_config(ScanMode::Tables, vec![TableRegion::new(0x88, 0x200, 8)]);
        let candidates = PointerScanner::new(&rom, &scan, AddressWindow::default()).scan();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].pointer_offset, 0x88);
    }
}
