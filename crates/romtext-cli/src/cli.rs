use std::path::PathBuf;

use clap::{Parser, Subcommand};
use romtext::ScanMode;

#[derive(Parser)]
#[command(name = "romtext")]
#[command(about = "Dialogue extraction and repacking for GBA ROM images", version)]
pub struct Args {
    /// Config file (defaults to romtext.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract dialogue into an editable text file
    Dump {
        /// Source ROM
        #[arg(long, value_name = "ROM")]
        rom: PathBuf,
        /// Output text file
        #[arg(short, long, default_value = "dialogue_for_translation.txt")]
        output: PathBuf,
        /// Pointer scan strategy (exhaustive or tables)
        #[arg(long)]
        mode: Option<ScanMode>,
        /// Save extraction statistics as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Write an edited text file back into a copy of the ROM
    Repack {
        /// Source ROM
        #[arg(long, value_name = "ROM")]
        rom: PathBuf,
        /// Edited text file
        #[arg(long, value_name = "TXT")]
        text: PathBuf,
        /// Output ROM
        #[arg(short, long, default_value = "translated.gba")]
        output: PathBuf,
        /// Start of free space (hex, e.g., 0x79D6D8)
        #[arg(long)]
        free_start: Option<String>,
        /// Hard end of free space (hex)
        #[arg(long)]
        free_end: Option<String>,
        /// Save the repack report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Dump raw bytes from the ROM (hexdump)
    Hexdump {
        /// Source ROM
        #[arg(long, value_name = "ROM")]
        rom: PathBuf,
        /// Start offset (hex, e.g., 0x10F488)
        #[arg(long)]
        offset: String,
        /// Number of bytes to dump (default: 256)
        #[arg(long, default_value = "256")]
        size: usize,
        /// Include ASCII representation
        #[arg(long)]
        ascii: bool,
    },
    /// Decode the string at an offset and show how it is classified
    Inspect {
        /// Source ROM
        #[arg(long, value_name = "ROM")]
        rom: PathBuf,
        /// Text offset (hex)
        #[arg(long)]
        offset: String,
    },
}
