//! Repack command: write edited dialogue into a new ROM.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use romtext::{RepackReport, Repacker, RomImage, ShiftJisCodec, load_export};

use super::hex_utils::format_hex_offset;
use super::{load_config, require_inputs, save_report};

/// Command line overrides for a repack run
#[derive(Debug, Default)]
pub struct RepackOptions {
    pub free_start: Option<usize>,
    pub free_end: Option<usize>,
    pub report: Option<PathBuf>,
}

pub fn run(
    rom_path: &Path,
    text_path: &Path,
    output: &Path,
    config_path: Option<&Path>,
    options: &RepackOptions,
) -> Result<()> {
    require_inputs(&[rom_path, text_path])?;

    let mut config = load_config(config_path)?;
    if let Some(start) = options.free_start {
        config.free_space.start = start;
    }
    if let Some(end) = options.free_end {
        config.free_space.end = end;
    }
    config.validate()?;

    let rom = RomImage::load(rom_path)?;
    let entries = load_export(text_path)
        .with_context(|| format!("reading {}", text_path.display()))?;
    eprintln!(
        "Repacking {} entries into {}",
        entries.len(),
        rom_path.display()
    );

    let codec = ShiftJisCodec::new(&config.text);
    let (patched, report) = match Repacker::new(&codec, &config).repack(&rom, &entries) {
        Ok(result) => result,
        Err(e) if e.is_fatal_repack() => {
            eprintln!("{} {}", "FATAL:".red().bold(), e);
            eprintln!("No output was written.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    patched.save(output)?;
    if let Some(path) = &options.report {
        save_report(path, &report)?;
    }

    print_summary(&report, output);
    Ok(())
}

fn print_summary(report: &RepackReport, output: &Path) {
    eprintln!(
        "{} {} in place, {} relocated, {} pointers patched -> {}",
        "Repacked".green().bold(),
        report.in_place,
        report.relocated,
        report.pointers_patched,
        output.display()
    );
    eprintln!(
        "Free space cursor at {}",
        format_hex_offset(report.free_space_cursor)
    );

    for text in &report.unmappable {
        eprintln!(
            "{} <STRING {:04}> replaced {:?}",
            "warning:".yellow().bold(),
            text.id,
            text.chars
        );
    }
    for skipped in report.dangling.iter().chain(&report.out_of_range) {
        eprintln!(
            "{} <STRING {:04}> pointer at {} left unchanged: {}",
            "warning:".yellow().bold(),
            skipped.id,
            format_hex_offset(skipped.pointer_offset),
            skipped.reason
        );
    }
}
