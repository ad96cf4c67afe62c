//! Prelude module for convenient imports
//!
//! ```ignore
//! use romtext::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Image and configuration: `RomImage`, `Config`
//! - Text handling: `TextCodec`, `ShiftJisCodec`, `Classifier`
//! - Pipelines: `Extractor`, `Repacker`, `StringEntry`
//! - Error handling: `Error`, `Result`

pub use crate::classify::Classifier;
pub use crate::codec::{ShiftJisCodec, TextCodec};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::export::{load_export, save_export};
pub use crate::extract::{ExtractionStats, Extractor, StringEntry};
pub use crate::repack::{RepackReport, Repacker};
pub use crate::rom::RomImage;
