//! Hexdump command implementation.
//!
//! Displays raw ROM bytes in traditional hexdump format, useful for looking at
//! pointer tables and text around an offset.
//!
//! # Output Format
//!
//! ```text
//! 0x0010F488: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
//! ```

use std::path::Path;

use anyhow::{Result, bail};
use romtext::RomImage;

const BYTES_PER_LINE: usize = 16;

/// Run the hexdump command
pub fn run(rom_path: &Path, offset: usize, size: usize, ascii: bool) -> Result<()> {
    let rom = RomImage::load(rom_path)?;
    if offset >= rom.len() {
        bail!(
            "Offset 0x{:X} is past the end of the image (0x{:X} bytes)",
            offset,
            rom.len()
        );
    }

    let size = size.min(rom.len() - offset);
    let bytes = rom.read_bytes(offset, size).unwrap_or_default();

    println!("Hexdump at 0x{:08X} ({} bytes):", offset, size);
    println!();
    for line in format_lines(offset, bytes, ascii) {
        println!("{}", line);
    }

    Ok(())
}

fn format_lines(start: usize, bytes: &[u8], ascii: bool) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| format_line(start + i * BYTES_PER_LINE, chunk, ascii))
        .collect()
}

fn format_line(offset: usize, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:08X}: ", offset);

    for j in 0..BYTES_PER_LINE {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            // Padding for incomplete lines
            None => line.push_str("   "),
        }
    }

    if ascii {
        line.push_str(" |");
        for byte in chunk {
            if (0x20..0x7F).contains(byte) {
                line.push(*byte as char);
            } else {
                line.push('.');
            }
        }
        for _ in chunk.len()..BYTES_PER_LINE {
            line.push(' ');
        }
        line.push('|');
    }

    line
}
