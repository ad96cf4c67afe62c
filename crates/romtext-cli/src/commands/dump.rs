//! Dump command: extract dialogue into an editable text file.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use romtext::{Classifier, Extractor, RomImage, ScanMode, ShiftJisCodec, save_export};

use super::{load_config, require_inputs, save_report};

pub fn run(
    rom_path: &Path,
    output: &Path,
    config_path: Option<&Path>,
    mode: Option<ScanMode>,
    report: Option<&Path>,
) -> Result<()> {
    require_inputs(&[rom_path])?;

    let mut config = load_config(config_path)?;
    if let Some(mode) = mode {
        config.scan.mode = mode;
        config.validate()?;
    }

    let rom = RomImage::load(rom_path)?;
    eprintln!(
        "Scanning {} ({} bytes, {} mode)",
        rom_path.display(),
        rom.len(),
        config.scan.mode
    );

    let codec = ShiftJisCodec::new(&config.text);
    let classifier = Classifier::new(config.classifier.clone());
    let (entries, stats) = Extractor::new(&rom, &codec, &classifier).run(&config);

    save_export(output, &entries)?;
    if let Some(report) = report {
        save_report(report, &stats)?;
    }

    eprintln!(
        "{} {} strings ({} unique, {} duplicates) -> {}",
        "Extracted".green().bold(),
        entries.len(),
        stats.canonical,
        stats.duplicates,
        output.display()
    );
    eprintln!(
        "Skipped {} candidates ({} rejected, {} undecodable)",
        stats.rejected + stats.undecodable,
        stats.rejected,
        stats.undecodable
    );

    Ok(())
}
