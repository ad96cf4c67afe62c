//! Reinsertion of edited text.
//!
//! Repacking runs in two passes over the parsed dialogue file:
//!
//! 1. every canonical entry is encoded and written back into its original slot
//!    when it fits (the remainder padded with terminators) or appended to free
//!    space otherwise, and its final offset is recorded
//! 2. every pointer, duplicates included, is rewritten to the final offset of
//!    the canonical string it refers to
//!
//! Slot sizes are always measured on the unmodified image, so the result does
//! not depend on the order in which entries are placed.

mod allocator;
mod relocation;

pub use allocator::FreeSpaceAllocator;
pub use relocation::{Placement, RelocationMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::TextCodec;
use crate::config::{AddressWindow, Config, FreeSpaceConfig};
use crate::error::{Error, Result};
use crate::extract::StringEntry;
use crate::rom::{POINTER_SIZE, RomImage};

/// Characters that had to be replaced while encoding one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappableText {
    pub id: u32,
    pub chars: String,
}

/// A pointer that was left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPointer {
    pub id: u32,
    pub pointer_offset: usize,
    pub reason: String,
}

/// Summary of one repack run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepackReport {
    pub in_place: usize,
    pub relocated: usize,
    pub pointers_patched: usize,
    pub unmappable: Vec<UnmappableText>,
    /// Entries whose canonical string was never placed
    pub dangling: Vec<SkippedPointer>,
    /// Pointers stored outside the image or whose target has no address
    pub out_of_range: Vec<SkippedPointer>,
    /// Free space cursor after the last relocation
    pub free_space_cursor: usize,
}

impl RepackReport {
    pub fn is_clean(&self) -> bool {
        self.unmappable.is_empty() && self.dangling.is_empty() && self.out_of_range.is_empty()
    }
}

pub struct Repacker<'a, C: TextCodec> {
    codec: &'a C,
    window: AddressWindow,
    free_space: FreeSpaceConfig,
}

impl<'a, C: TextCodec> Repacker<'a, C> {
    pub fn new(codec: &'a C, config: &Config) -> Self {
        Self {
            codec,
            window: config.window,
            free_space: config.free_space,
        }
    }

    /// Build a patched copy of `rom`.
    ///
    /// `rom` itself is never modified; on error nothing has been produced.
    pub fn repack(
        &self,
        rom: &RomImage,
        entries: &[StringEntry],
    ) -> Result<(RomImage, RepackReport)> {
        if self.free_space.end > rom.len() {
            return Err(Error::Config(format!(
                "free space end 0x{:X} is past the end of the image (0x{:X} bytes)",
                self.free_space.end,
                rom.len()
            )));
        }

        let mut out = rom.clone();
        let mut report = RepackReport::default();
        let mut allocator = FreeSpaceAllocator::from_config(&self.free_space);

        let relocations = self.place_all(rom, &mut out, entries, &mut allocator, &mut report)?;
        report.free_space_cursor = allocator.cursor();
        info!(
            "Placed {} strings ({} in place, {} relocated), free space cursor at 0x{:08X}",
            relocations.len(),
            report.in_place,
            report.relocated,
            allocator.cursor()
        );

        self.patch_pointers(&mut out, entries, &relocations, &mut report);
        info!("Patched {} pointers", report.pointers_patched);

        Ok((out, report))
    }

    fn place_all(
        &self,
        pristine: &RomImage,
        out: &mut RomImage,
        entries: &[StringEntry],
        allocator: &mut FreeSpaceAllocator,
        report: &mut RepackReport,
    ) -> Result<RelocationMap> {
        let mut relocations = RelocationMap::new();

        for entry in entries.iter().filter(|e| !e.is_duplicate()) {
            let text = entry.text.as_deref().unwrap_or_default();
            let encoded = self.codec.encode(text);
            if !encoded.is_lossless() {
                let chars: String = encoded.unmappable.iter().collect();
                warn!(
                    "<STRING {:04}>: replaced characters the encoding cannot represent: {:?}",
                    entry.id, chars
                );
                report.unmappable.push(UnmappableText { id: entry.id, chars });
            }

            let slot = pristine.slot_len(entry.text_offset, self.codec.terminator());
            let (offset, placement) = if encoded.len() <= slot {
                out.write_bytes(entry.text_offset, &encoded.bytes)?;
                let padding = entry.text_offset + encoded.len()..entry.text_offset + slot;
                out.fill(padding, self.codec.terminator())?;
                report.in_place += 1;
                (entry.text_offset, Placement::InPlace)
            } else {
                let offset = allocator.allocate(encoded.len())?;
                out.write_bytes(offset, &encoded.bytes)?;
                report.relocated += 1;
                (offset, Placement::Relocated)
            };

            debug!(
                "<STRING {:04}>: {} bytes, slot {} -> {:?} at 0x{:08X}",
                entry.id,
                encoded.len(),
                slot,
                placement,
                offset
            );
            relocations.record(entry.id, offset);
        }

        Ok(relocations)
    }

    fn patch_pointers(
        &self,
        out: &mut RomImage,
        entries: &[StringEntry],
        relocations: &RelocationMap,
        report: &mut RepackReport,
    ) {
        for entry in entries {
            let target_id = entry.canonical_id();
            let Some(offset) = relocations.get(target_id) else {
                warn!(
                    "<STRING {:04}>: no placed string <STRING {:04}>, pointer at 0x{:08X} left unchanged",
                    entry.id, target_id, entry.pointer_offset
                );
                report.dangling.push(SkippedPointer {
                    id: entry.id,
                    pointer_offset: entry.pointer_offset,
                    reason: format!("<STRING {:04}> was not placed", target_id),
                });
                continue;
            };

            let Some(address) = self.window.to_address(offset) else {
                self.skip_out_of_range(report, entry, format!("0x{:08X} has no address", offset));
                continue;
            };
            if out.write_u32_le(entry.pointer_offset, address).is_err() {
                let reason = format!(
                    "pointer needs {} bytes at 0x{:08X}, image is 0x{:X} bytes",
                    POINTER_SIZE,
                    entry.pointer_offset,
                    out.len()
                );
                self.skip_out_of_range(report, entry, reason);
                continue;
            }
            report.pointers_patched += 1;
        }
    }

    fn skip_out_of_range(&self, report: &mut RepackReport, entry: &StringEntry, reason: String) {
        warn!("<STRING {:04}>: pointer not updated: {}", entry.id, reason);
        report.out_of_range.push(SkippedPointer {
            id: entry.id,
            pointer_offset: entry.pointer_offset,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ShiftJisCodec;
    use crate::extract::tests::RomBuilder;

    const BASE: u32 = 0x0800_0000;

    fn config(start: usize, end: usize) -> Config {
        let mut config = Config::default();
        config.free_space = FreeSpaceConfig { start, end };
        config
    }

    fn repack(
        rom: &RomImage,
        entries: &[StringEntry],
        config: &Config,
    ) -> Result<(RomImage, RepackReport)> {
        let codec = ShiftJisCodec::new(&config.text);
        Repacker::new(&codec, config).repack(rom, entries)
    }

    fn shared_offset_rom() -> RomImage {
        RomBuilder::new(0x8000)
            .pointer(0x100, 0x5000)
            .pointer(0x200, 0x5000)
            .string(0x5000, b"Hello")
            .build()
    }

    #[test]
    fn test_grown_string_relocates_and_patches_duplicates() {
        let rom = shared_offset_rom();
        let entries = vec![
            StringEntry::canonical(0, 0x100, 0x5000, "Hello, and welcome!".to_string()),
            StringEntry::duplicate(1, 0x200, 0x5000, 0),
        ];

        let (out, report) = repack(&rom, &entries, &config(0x7000, 0x7FFF)).unwrap();

        assert_eq!(out.read_u32_le(0x100), Some(BASE + 0x7000));
        assert_eq!(out.read_u32_le(0x200), Some(BASE + 0x7000));
        assert_eq!(out.string_at(0x7000, 0), Some(&b"Hello, and welcome!"[..]));
        assert_eq!(report.relocated, 1);
        assert_eq!(report.pointers_patched, 2);
        assert_eq!(report.free_space_cursor, 0x7000 + 20);
        assert!(report.is_clean());
        // the source image is untouched
        assert_eq!(rom.read_u32_le(0x100), Some(BASE + 0x5000));
    }

    #[test]
    fn test_dump_edit_repack_shared_offset() {
        use crate::classify::Classifier;
        use crate::export::{format_entries, parse_export};
        use crate::extract::Extractor;

        let rom = RomBuilder::new(0x8000)
            .pointer(0x100, 0x5000)
            .pointer(0x200, 0x5000)
            .string(0x5000, b"\x82\xb1\x82\xf1\x82\xc9\x82\xbf\x82\xcd")
            .build();
        let mut config = config(0x7000, 0x7FFF);
        config.scan.min_text_offset = 0x80;

        let codec = ShiftJisCodec::new(&config.text);
        let classifier = Classifier::new(config.classifier.clone());
        let (entries, stats) = Extractor::new(&rom, &codec, &classifier).run(&config);
        assert_eq!(stats.canonical, 1);
        assert_eq!(stats.duplicates, 1);

        let dialogue = format_entries(&entries);
        assert!(dialogue.contains("[DUPLICATE OF <STRING 0000>]"));
        let edited = dialogue.replace("こんにちは", "こんにちはABCDEFGHIJ");
        let entries = parse_export(&edited).unwrap();

        let (out, report) = Repacker::new(&codec, &config).repack(&rom, &entries).unwrap();

        assert_eq!(out.read_u32_le(0x100), Some(0x0800_7000));
        assert_eq!(out.read_u32_le(0x200), Some(0x0800_7000));
        let bytes = out.string_at(0x7000, codec.terminator()).unwrap();
        assert_eq!(codec.decode(bytes).as_deref(), Some("こんにちはABCDEFGHIJ"));
        assert_eq!(report.relocated, 1);
        assert_eq!(report.pointers_patched, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_shorter_string_is_padded_in_place() {
        let rom = shared_offset_rom();
        let entries = vec![StringEntry::canonical(0, 0x100, 0x5000, "Hi".to_string())];

        let (out, report) = repack(&rom, &entries, &config(0x7000, 0x7FFF)).unwrap();

        assert_eq!(out.read_bytes(0x5000, 6), Some(&b"Hi\x00\x00\x00\x00"[..]));
        // byte after the original slot is untouched
        assert_eq!(out.read_bytes(0x5006, 1), Some(&[0xFF][..]));
        assert_eq!(out.read_u32_le(0x100), Some(BASE + 0x5000));
        assert_eq!(report.in_place, 1);
        assert_eq!(report.free_space_cursor, 0x7000);
    }

    #[test]
    fn test_slots_are_measured_on_the_original_image() {
        // a relocated string must not change the slot seen by a later entry
        let rom = RomBuilder::new(0x8000)
            .string(0x5000, b"ABCD")
            .string(0x5005, b"EFGH")
            .build();
        let entries = vec![
            StringEntry::canonical(0, 0x100, 0x5000, "Much longer text".to_string()),
            StringEntry::canonical(1, 0x104, 0x5005, "EFGH".to_string()),
        ];

        let (out, report) = repack(&rom, &entries, &config(0x7000, 0x7FFF)).unwrap();
        assert_eq!(report.in_place, 1);
        assert_eq!(report.relocated, 1);
        assert_eq!(out.string_at(0x5005, 0), Some(&b"EFGH"[..]));
    }

    #[test]
    fn test_exhausted_free_space_aborts() {
        let rom = shared_offset_rom();
        let entries = vec![StringEntry::canonical(
            0,
            0x100,
            0x5000,
            "This text is far too long for the space".to_string(),
        )];

        let err = repack(&rom, &entries, &config(0x7000, 0x7010)).unwrap_err();
        assert!(err.is_fatal_repack());
        assert!(matches!(
            err,
            Error::FreeSpaceExhausted {
                needed: 40,
                cursor: 0x7000,
                limit: 0x7010
            }
        ));
    }

    #[test]
    fn test_dangling_duplicate_is_left_unchanged() {
        let rom = shared_offset_rom();
        let entries = vec![StringEntry::duplicate(0, 0x200, 0x5000, 7)];

        let (out, report) = repack(&rom, &entries, &config(0x7000, 0x7FFF)).unwrap();

        assert_eq!(out.read_u32_le(0x200), Some(BASE + 0x5000));
        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.dangling[0].pointer_offset, 0x200);
        assert_eq!(report.pointers_patched, 0);
    }

    #[test]
    fn test_pointer_outside_image_is_skipped() {
        let rom = shared_offset_rom();
        let entries = vec![StringEntry::canonical(0, 0x7FFE, 0x5000, "Hello".to_string())];

        let (_, report) = repack(&rom, &entries, &config(0x7000, 0x7FFF)).unwrap();
        assert_eq!(report.out_of_range.len(), 1);
        assert_eq!(report.pointers_patched, 0);
    }

    #[test]
    fn test_unmappable_characters_are_reported() {
        let rom = shared_offset_rom();
        let entries = vec![StringEntry::canonical(0, 0x100, 0x5000, "Hi😀".to_string())];

        let (out, report) = repack(&rom, &entries, &config(0x7000, 0x7FFF)).unwrap();

        assert_eq!(out.string_at(0x5000, 0), Some(&b"Hi?"[..]));
        assert_eq!(
            report.unmappable,
            vec![UnmappableText {
                id: 0,
                chars: "😀".to_string()
            }]
        );
    }

    #[test]
    fn test_free_space_past_image_is_rejected() {
        let rom = shared_offset_rom();
        let err = repack(&rom, &[], &config(0x7000, 0x9000)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
