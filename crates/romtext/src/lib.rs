//! # romtext
//!
//! Text extraction and reinsertion for GBA ROM images.
//!
//! This crate provides:
//! - Pointer discovery via address tables or an exhaustive aligned scan
//! - A Shift_JIS codec with lossless `<$HEX$>` escape tokens
//! - A rule-based classifier that separates dialogue from binary noise
//! - Deduplicated extraction into an editable dialogue file
//! - Repacking with in-place writes, free space relocation and pointer patching

pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod prelude;
pub mod repack;
pub mod rom;
pub mod scan;

pub use classify::{Classifier, Decision, TextStats, Verdict};
pub use codec::{Encoded, ShiftJisCodec, TextCodec};
pub use config::{
    AddressWindow, ClassifierConfig, Config, DEFAULT_CONFIG_FILE, FreeSpaceConfig, ScanConfig,
    ScanMode, TableRegion, TextConfig,
};
pub use error::{Error, Result};
pub use export::{format_entries, load_export, parse_export, save_export, save_json};
pub use extract::{ExtractionContext, ExtractionStats, Extractor, StringEntry};
pub use repack::{FreeSpaceAllocator, RelocationMap, RepackReport, Repacker};
pub use rom::{POINTER_SIZE, RomImage};
pub use scan::{PointerCandidate, PointerScanner};
