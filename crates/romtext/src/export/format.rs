//! Writing the editable dialogue file

use std::fmt::Write;

use crate::extract::StringEntry;

/// Block header such as `<STRING 0007>`
pub fn string_label(id: u32) -> String {
    format!("<STRING {:04}>", id)
}

/// Body written in place of the text of a duplicate entry
pub fn duplicate_marker(of: u32) -> String {
    format!("[DUPLICATE OF {}]", string_label(of))
}

/// Format a single entry, blank separator line included
pub fn format_entry(entry: &StringEntry) -> String {
    let mut out = String::new();
    write_entry(&mut out, entry);
    out
}

/// Format every entry in the given order
pub fn format_entries(entries: &[StringEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        write_entry(&mut out, entry);
    }
    out
}

fn write_entry(out: &mut String, entry: &StringEntry) {
    let body = match entry.duplicate_of {
        Some(of) => duplicate_marker(of),
        None => entry.text.clone().unwrap_or_default(),
    };
    // writing to a String cannot fail
    let _ = write!(
        out,
        "{}\nPOINTER_OFFSET: 0x{:08X}\nTEXT_OFFSET: 0x{:08X}\n{}\n\n",
        string_label(entry.id),
        entry.pointer_offset,
        entry.text_offset,
        body
    );
}
