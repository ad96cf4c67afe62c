use std::collections::HashMap;

use serde::Serialize;

/// How a canonical string was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Rewritten inside its original slot
    InPlace,
    /// Moved to free space
    Relocated,
}

/// Final offset of every placed canonical string, keyed by id
#[derive(Debug, Clone, Default)]
pub struct RelocationMap {
    offsets: HashMap<u32, usize>,
}

impl RelocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: u32, offset: usize) {
        self.offsets.insert(id, offset);
    }

    pub fn get(&self, id: u32) -> Option<usize> {
        self.offsets.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
