use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Malformed export file at line {line}: {message}")]
    ExportParse { line: usize, message: String },

    #[error(
        "Ran out of free space: need {needed} bytes at 0x{cursor:08X}, limit is 0x{limit:08X}"
    )]
    FreeSpaceExhausted {
        needed: usize,
        cursor: usize,
        limit: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::MissingInput(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether the error aborted a repack that had already started mutating the image
    pub fn is_fatal_repack(&self) -> bool {
        matches!(self, Error::FreeSpaceExhausted { .. })
    }
}
