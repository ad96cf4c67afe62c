//! Extraction: scan, decode, classify and deduplicate.
//!
//! Every pointer candidate becomes at most one [`StringEntry`]. The first time
//! a text offset is reached and accepted it gets a canonical entry; every later
//! pointer to the same offset becomes a duplicate entry that refers back to it,
//! so repacking can patch all of them.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::codec::TextCodec;
use crate::config::Config;
use crate::rom::RomImage;
use crate::scan::{PointerCandidate, PointerScanner};

/// One pointer and the string it refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringEntry {
    pub id: u32,
    pub pointer_offset: usize,
    pub text_offset: usize,
    /// Decoded text; `None` for duplicates
    pub text: Option<String>,
    /// Canonical entry sharing this text offset
    pub duplicate_of: Option<u32>,
}

impl StringEntry {
    pub fn canonical(id: u32, pointer_offset: usize, text_offset: usize, text: String) -> Self {
        Self {
            id,
            pointer_offset,
            text_offset,
            text: Some(text),
            duplicate_of: None,
        }
    }

    pub fn duplicate(id: u32, pointer_offset: usize, text_offset: usize, of: u32) -> Self {
        Self {
            id,
            pointer_offset,
            text_offset,
            text: None,
            duplicate_of: Some(of),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }

    /// Id of the entry that owns the text bytes
    pub fn canonical_id(&self) -> u32 {
        self.duplicate_of.unwrap_or(self.id)
    }
}

/// Counters of one extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub candidates: usize,
    pub canonical: usize,
    pub duplicates: usize,
    /// Decoded but judged not to be dialogue
    pub rejected: usize,
    /// No terminator or not decodable at all
    pub undecodable: usize,
}

/// State carried across one forward pass over the candidates
#[derive(Debug, Default)]
pub struct ExtractionContext {
    next_id: u32,
    /// Accepted text offset -> canonical id
    seen: HashMap<usize, u32>,
    entries: Vec<StringEntry>,
    stats: ExtractionStats,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonical_for(&self, text_offset: usize) -> Option<u32> {
        self.seen.get(&text_offset).copied()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_canonical(&mut self, candidate: &PointerCandidate, text: String) -> u32 {
        let id = self.next_id();
        self.seen.insert(candidate.target_offset, id);
        self.entries.push(StringEntry::canonical(
            id,
            candidate.pointer_offset,
            candidate.target_offset,
            text,
        ));
        self.stats.canonical += 1;
        id
    }

    fn push_duplicate(&mut self, candidate: &PointerCandidate, of: u32) -> u32 {
        let id = self.next_id();
        self.entries.push(StringEntry::duplicate(
            id,
            candidate.pointer_offset,
            candidate.target_offset,
            of,
        ));
        self.stats.duplicates += 1;
        id
    }

    pub fn stats(&self) -> ExtractionStats {
        self.stats
    }

    pub fn into_parts(self) -> (Vec<StringEntry>, ExtractionStats) {
        (self.entries, self.stats)
    }
}

pub struct Extractor<'a, C: TextCodec> {
    rom: &'a RomImage,
    codec: &'a C,
    classifier: &'a Classifier,
}

impl<'a, C: TextCodec> Extractor<'a, C> {
    pub fn new(rom: &'a RomImage, codec: &'a C, classifier: &'a Classifier) -> Self {
        Self {
            rom,
            codec,
            classifier,
        }
    }

    /// Scan the image with `config` and extract every accepted string
    pub fn run(&self, config: &Config) -> (Vec<StringEntry>, ExtractionStats) {
        let candidates = PointerScanner::new(self.rom, &config.scan, config.window).scan();
        self.extract(&candidates)
    }

    /// Turn candidates, in scan order, into entries ordered by id
    pub fn extract(&self, candidates: &[PointerCandidate]) -> (Vec<StringEntry>, ExtractionStats) {
        let mut ctx = ExtractionContext::new();
        for candidate in candidates {
            self.process(&mut ctx, candidate);
        }

        let stats = ctx.stats();
        info!(
            "Extracted {} strings ({} duplicates) from {} candidates, rejected {}, undecodable {}",
            stats.canonical, stats.duplicates, stats.candidates, stats.rejected, stats.undecodable
        );
        ctx.into_parts()
    }

    fn process(&self, ctx: &mut ExtractionContext, candidate: &PointerCandidate) {
        ctx.stats.candidates += 1;

        if let Some(of) = ctx.canonical_for(candidate.target_offset) {
            let id = ctx.push_duplicate(candidate, of);
            debug!(
                "0x{:08X} -> 0x{:08X}: #{} duplicates #{}",
                candidate.pointer_offset, candidate.target_offset, id, of
            );
            return;
        }

        let text = self
            .rom
            .string_at(candidate.target_offset, self.codec.terminator())
            .and_then(|bytes| self.codec.decode(bytes));
        let Some(text) = text else {
            ctx.stats.undecodable += 1;
            return;
        };

        let decision = self.classifier.decide(&text);
        if !decision.is_accept() {
            ctx.stats.rejected += 1;
            debug!(
                "0x{:08X} -> 0x{:08X}: rejected by {}",
                candidate.pointer_offset, candidate.target_offset, decision.rule
            );
            return;
        }

        let id = ctx.push_canonical(candidate, text);
        debug!(
            "0x{:08X} -> 0x{:08X}: #{} accepted by {}",
            candidate.pointer_offset, candidate.target_offset, id, decision.rule
        );
    }
}
