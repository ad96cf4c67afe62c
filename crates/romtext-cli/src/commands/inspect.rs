//! Inspect command: show how a single string is decoded and classified.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use romtext::{
    Classifier, PointerScanner, RomImage, ShiftJisCodec, TextCodec, TextStats, Verdict,
};

use super::hex_utils::format_hex_offset;
use super::load_config;

pub fn run(rom_path: &Path, offset: usize, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let rom = RomImage::load(rom_path)?;
    let codec = ShiftJisCodec::new(&config.text);

    let Some(bytes) = rom.string_at(offset, codec.terminator()) else {
        bail!(
            "No terminated string at {} (image is 0x{:X} bytes)",
            format_hex_offset(offset),
            rom.len()
        );
    };
    println!(
        "String at {}: {} bytes + terminator",
        format_hex_offset(offset),
        bytes.len()
    );

    let Some(text) = codec.decode(bytes) else {
        println!("{}", "Not decodable".red());
        return Ok(());
    };
    println!("{}", text);
    println!();

    let classifier = Classifier::new(config.classifier.clone());
    let decision = classifier.decide(&text);
    match decision.verdict {
        Verdict::Accept => println!("{} (rule: {})", "ACCEPT".green().bold(), decision.rule),
        Verdict::Reject => println!("{} (rule: {})", "REJECT".red().bold(), decision.rule),
    }

    let stats = TextStats::compute(&text, classifier.config());
    println!(
        "chars {}, native {}, latin/digits {}, printable {:.2}, escapes {} ({:.2}), control {}",
        stats.len,
        stats.native,
        stats.latin_digits,
        stats.printable_frac(),
        stats.escape_tokens,
        stats.escape_frac(),
        stats.control
    );

    let pointers: Vec<_> = PointerScanner::new(&rom, &config.scan, config.window)
        .scan()
        .into_iter()
        .filter(|c| c.target_offset == offset)
        .map(|c| format_hex_offset(c.pointer_offset))
        .collect();
    if pointers.is_empty() {
        println!("No {} pointers refer to this offset", config.scan.mode);
    } else {
        println!("Referenced from: {}", pointers.join(", "));
    }

    Ok(())
}
