//! Bump allocation inside the configured free space

use crate::config::FreeSpaceConfig;
use crate::error::{Error, Result};

/// Hands out consecutive regions of free space; the cursor never moves back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSpaceAllocator {
    cursor: usize,
    hard_limit: usize,
}

impl FreeSpaceAllocator {
    pub fn new(start: usize, hard_limit: usize) -> Self {
        Self {
            cursor: start,
            hard_limit,
        }
    }

    pub fn from_config(free_space: &FreeSpaceConfig) -> Self {
        Self::new(free_space.start, free_space.end)
    }

    /// Reserve `len` bytes and return their offset
    pub fn allocate(&mut self, len: usize) -> Result<usize> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|&end| end <= self.hard_limit)
            .ok_or(Error::FreeSpaceExhausted {
                needed: len,
                cursor: self.cursor,
                limit: self.hard_limit,
            })?;
        let offset = self.cursor;
        self.cursor = end;
        Ok(offset)
    }

    /// First offset not yet handed out
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn hard_limit(&self) -> usize {
        self.hard_limit
    }

    pub fn remaining(&self) -> usize {
        self.hard_limit.saturating_sub(self.cursor)
    }
}
