//! The editable dialogue file: the only hand-off between dump and repack.
//!
//! ```text
//! <STRING 0000>
//! POINTER_OFFSET: 0x00000100
//! TEXT_OFFSET: 0x00005000
//! decoded text
//!
//! <STRING 0001>
//! POINTER_OFFSET: 0x00000200
//! TEXT_OFFSET: 0x00005000
//! [DUPLICATE OF <STRING 0000>]
//! ```

mod format;
mod parse;

pub use format::{duplicate_marker, format_entries, format_entry, string_label};
pub use parse::parse_export;

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::extract::StringEntry;

/// Write entries to a UTF-8 dialogue file
pub fn save_export<P: AsRef<Path>>(path: P, entries: &[StringEntry]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_entries(entries))?;
    info!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Read and parse a dialogue file
pub fn load_export<P: AsRef<Path>>(path: P) -> Result<Vec<StringEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let entries = parse_export(&fs::read_to_string(path)?)?;
    info!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Save a serializable report as pretty-printed JSON
pub fn save_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
