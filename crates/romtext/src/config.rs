//! Runtime configuration.
//!
//! Every game-specific constant (pointer tables, address window, control bytes,
//! free space bounds and classifier thresholds) is read from a TOML file. The
//! defaults describe the Pia Carrot e Youkoso!! 3.3 GBA image the tool was
//! written for, so running without a config file reproduces that setup.
//!
//! ```toml
//! [scan]
//! mode = "tables"
//! min_text_offset = 0x10C000
//!
//! [[scan.tables]]
//! start = 0x10F488
//! end = 0x10FE50
//! row_size = 8
//!
//! [free_space]
//! start = 0x79D6D8
//! end = 0x7FFFFF
//!
//! [text.tags]
//! "[PLAYER_NAME]" = "0201"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::error::{Error, Result};

/// Default config file name looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "romtext.toml";

/// Row stride of a plain pointer table (pointer + 4 bytes of attributes)
pub const STANDARD_ROW_SIZE: usize = 8;
/// Row stride of tables that interleave pointers with 12 bytes of other data
pub const ALTERNATING_ROW_SIZE: usize = 16;

/// Pointer scanning strategy
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanMode {
    /// Read every 4-byte-aligned word of the image
    #[default]
    Exhaustive,
    /// Read only the configured address tables
    Tables,
}

/// A contiguous address table inside the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegion {
    pub start: usize,
    /// Exclusive end offset
    pub end: usize,
    #[serde(default = "default_row_size")]
    pub row_size: usize,
}

fn default_row_size() -> usize {
    STANDARD_ROW_SIZE
}

impl TableRegion {
    pub const fn new(start: usize, end: usize, row_size: usize) -> Self {
        Self {
            start,
            end,
            row_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Offsets below this hold code and structures, never text
    pub min_text_offset: usize,
    pub tables: Vec<TableRegion>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Exhaustive,
            min_text_offset: 0x0010_C000,
            tables: vec![
                TableRegion::new(0x10F488, 0x10FE50, STANDARD_ROW_SIZE),
                TableRegion::new(0x114D50, 0x1150D4, STANDARD_ROW_SIZE),
                TableRegion::new(0x11603C, 0x11625C, ALTERNATING_ROW_SIZE),
                TableRegion::new(0x116AFC, 0x11707C, ALTERNATING_ROW_SIZE),
                TableRegion::new(0x1179CC, 0x117B44, ALTERNATING_ROW_SIZE),
                TableRegion::new(0x117CCC, 0x117DA8, STANDARD_ROW_SIZE),
            ],
        }
    }
}

/// Range of 32-bit values recognized as pointers into the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressWindow {
    /// Address that maps to file offset 0
    pub base: u32,
    /// Exclusive upper bound
    pub end: u32,
}

impl Default for AddressWindow {
    fn default() -> Self {
        Self {
            base: 0x0800_0000,
            end: 0x0900_0000,
        }
    }
}

impl AddressWindow {
    pub fn contains(&self, address: u32) -> bool {
        (self.base..self.end).contains(&address)
    }

    /// Map an address inside the window to a file offset
    pub fn to_offset(&self, address: u32) -> Option<usize> {
        self.contains(address)
            .then(|| (address - self.base) as usize)
    }

    /// Map a file offset back to an address inside the window
    pub fn to_address(&self, offset: usize) -> Option<u32> {
        let offset = u32::try_from(offset).ok()?;
        let address = self.base.checked_add(offset)?;
        self.contains(address).then_some(address)
    }
}

/// Control bytes of the native text format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub terminator: u8,
    pub newline: u8,
    /// Written in place of characters the native encoding cannot represent
    pub replacement: u8,
    /// Named control sequences a translator may type, e.g.
    /// `"[PLAYER_NAME]" = "0201"`; values are hex bytes
    pub tags: BTreeMap<String, String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            terminator: 0x00,
            newline: 0x0A,
            replacement: b'?',
            tags: BTreeMap::new(),
        }
    }
}

impl TextConfig {
    /// Tags with their hex values decoded, skipping malformed ones
    pub fn tag_bytes(&self) -> Vec<(String, Vec<u8>)> {
        self.tags
            .iter()
            .filter_map(|(name, hex)| Some((name.clone(), parse_hex_bytes(hex)?)))
            .collect()
    }
}

/// Parse a hex byte string such as `"02 01"` or `"0201"`
fn parse_hex_bytes(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok())
        .collect()
}

/// Unused region that receives strings which outgrew their slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSpaceConfig {
    pub start: usize,
    /// Hard ceiling; an allocation may not end past this offset
    pub end: usize,
}

impl Default for FreeSpaceConfig {
    fn default() -> Self {
        Self {
            start: 0x0079_D6D8,
            end: 0x007F_FFFF,
        }
    }
}

/// Thresholds of the dialogue classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub min_trimmed_chars: usize,
    pub max_total_chars: usize,
    pub max_control_frac: f64,
    pub min_native_override: usize,
    pub min_latin_digits: usize,
    pub min_printable_frac: f64,
    pub max_escape_frac: f64,
    pub min_non_native_printable: usize,
    pub max_pattern_block: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_trimmed_chars: 2,
            max_total_chars: 1024,
            max_control_frac: 0.05,
            min_native_override: 2,
            min_latin_digits: 3,
            min_printable_frac: 0.55,
            max_escape_frac: 0.15,
            min_non_native_printable: 5,
            max_pattern_block: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub window: AddressWindow,
    pub text: TextConfig,
    pub free_space: FreeSpaceConfig,
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Load and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.base >= self.window.end {
            return Err(Error::Config(format!(
                "address window is empty (base 0x{:08X}, end 0x{:08X})",
                self.window.base, self.window.end
            )));
        }

        for table in &self.scan.tables {
            if table.row_size < 4 {
                return Err(Error::Config(format!(
                    "table at 0x{:X} has row_size {} (minimum is 4)",
                    table.start, table.row_size
                )));
            }
            if table.start >= table.end {
                return Err(Error::Config(format!(
                    "table start 0x{:X} is not below its end 0x{:X}",
                    table.start, table.end
                )));
            }
        }

        if self.scan.mode == ScanMode::Tables && self.scan.tables.is_empty() {
            return Err(Error::Config(
                "scan mode is 'tables' but no tables are configured".to_string(),
            ));
        }

        if self.free_space.start > self.free_space.end {
            return Err(Error::Config(format!(
                "free space start 0x{:X} is past its end 0x{:X}",
                self.free_space.start, self.free_space.end
            )));
        }

        let text = &self.text;
        if text.terminator == text.newline {
            return Err(Error::Config(
                "terminator and newline bytes must differ".to_string(),
            ));
        }
        if text.replacement == text.terminator || text.replacement == text.newline {
            return Err(Error::Config(
                "replacement byte must differ from terminator and newline".to_string(),
            ));
        }

        for (name, hex) in &text.tags {
            if name.is_empty() || name.chars().any(|c| c == '<' || c == '$' || c.is_control()) {
                return Err(Error::Config(format!(
                    "tag name '{}' must be non-empty without '<', '$' or control characters",
                    name
                )));
            }
            if parse_hex_bytes(hex).is_none() {
                return Err(Error::Config(format!(
                    "tag '{}' has invalid hex bytes '{}'",
                    name, hex
                )));
            }
        }

        let classifier = &self.classifier;
        for (name, value) in [
            ("max_control_frac", classifier.max_control_frac),
            ("min_printable_frac", classifier.min_printable_frac),
            ("max_escape_frac", classifier.max_escape_frac),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "classifier.{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.scan.tables.len(), 6);
        assert_eq!(config.scan.tables[2].row_size, ALTERNATING_ROW_SIZE);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [scan]
            mode = "tables"

            [[scan.tables]]
            start = 0x1000
            end = 0x1100

            [free_space]
            start = 0x2000
            end = 0x3000
            "#,
        )
        .unwrap();

        assert_eq!(config.scan.mode, ScanMode::Tables);
        assert_eq!(config.scan.tables, vec![TableRegion::new(0x1000, 0x1100, 8)]);
        assert_eq!(config.scan.min_text_offset, 0x10C000);
        assert_eq!(config.free_space.start, 0x2000);
        assert_eq!(config.window, AddressWindow::default());
        assert_eq!(config.text.newline, 0x0A);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[text]\nterminator = 0xFF\nnewline = 0x01").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.text.terminator, 0xFF);
        assert_eq!(config.text.newline, 0x01);
        assert_eq!(config.text.replacement, b'?');
    }

    #[test]
    fn test_rejects_inconsistent_values() {
        assert!(Config::from_toml_str("[window]\nbase = 0x09000000\nend = 0x08000000").is_err());
        assert!(Config::from_toml_str("[text]\nterminator = 0\nnewline = 0").is_err());
        assert!(
            Config::from_toml_str("[[scan.tables]]\nstart = 0\nend = 16\nrow_size = 2").is_err()
        );
        assert!(Config::from_toml_str("[scan]\nmode = \"tables\"\ntables = []").is_err());
        assert!(Config::from_toml_str("[classifier]\nmax_escape_frac = 1.5").is_err());
        assert!(matches!(
            Config::from_toml_str("[scan]\nmode = \"sideways\""),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_tags_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [text.tags]
            "[PLAYER_NAME]" = "02 01"
            "[WAIT]" = "03"
            "#,
        )
        .unwrap();

        assert_eq!(config.text.terminator, 0x00);
        assert_eq!(
            config.text.tag_bytes(),
            vec![
                ("[PLAYER_NAME]".to_string(), vec![0x02, 0x01]),
                ("[WAIT]".to_string(), vec![0x03]),
            ]
        );

        let written = toml::to_string(&config).unwrap();
        assert_eq!(Config::from_toml_str(&written).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_tags() {
        assert!(Config::from_toml_str("[text.tags]\n\"[X]\" = \"0\"").is_err());
        assert!(Config::from_toml_str("[text.tags]\n\"[X]\" = \"zz\"").is_err());
        assert!(Config::from_toml_str("[text.tags]\n\"\" = \"01\"").is_err());
        assert!(Config::from_toml_str("[text.tags]\n\"<$X\" = \"01\"").is_err());
        assert!(Config::from_toml_str("[text.tags]\n\"[A$B]\" = \"01\"").is_err());
    }

    #[test]
    fn test_scan_mode_strings() {
        assert_eq!(ScanMode::Tables.to_string(), "tables");
        assert_eq!("exhaustive".parse::<ScanMode>().unwrap(), ScanMode::Exhaustive);
    }

    #[test]
    fn test_address_window_mapping() {
        let window = AddressWindow::default();
        assert_eq!(window.to_offset(0x0800_5000), Some(0x5000));
        assert_eq!(window.to_offset(0x0900_0000), None);
        assert_eq!(window.to_offset(0x0000_5000), None);
        assert_eq!(window.to_address(0x5000), Some(0x0800_5000));
        assert_eq!(window.to_address(0x0100_0000), None);
    }
}
