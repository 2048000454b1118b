// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Boundary-aware text splitter
//!
//! Cuts text into windows of at most `chunk_size` characters that overlap by
//! `overlap` characters. A window prefers to end just after the last newline
//! inside it, then after the last space, and only splits mid-word when the
//! window contains neither. Positions are counted in chars so multi-byte text
//! is never cut inside a character.

use std::iter::FusedIterator;

use crate::errors::{KbError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextSplitter {
    /// Create a splitter, rejecting `chunk_size == 0` and `overlap >= chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(KbError::InvalidSplitConfig {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily split `text` into trimmed, non-empty slices of the input
    pub fn split<'a>(&self, text: &'a str) -> Splits<'a> {
        Splits {
            text,
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            cursor: 0,
            done: false,
        }
    }
}

/// One-shot split of `text` with explicit parameters
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Splits<'_>> {
    Ok(TextSplitter::new(chunk_size, overlap)?.split(text))
}

/// Iterator returned by [`TextSplitter::split`]
///
/// Walks the text from the cursor on demand; each window costs
/// `O(chunk_size)` and nothing is precomputed.
#[derive(Debug, Clone)]
pub struct Splits<'a> {
    text: &'a str,
    chunk_size: usize,
    overlap: usize,
    /// Byte offset of the current window start, always on a char boundary
    cursor: usize,
    done: bool,
}

impl<'a> Splits<'a> {
    /// Byte offset `chunk_size` chars past the cursor, clamped to the text end
    fn hard_end(&self) -> usize {
        self.text[self.cursor..]
            .char_indices()
            .nth(self.chunk_size)
            .map_or(self.text.len(), |(i, _)| self.cursor + i)
    }

    /// Byte offset just after the last newline, else the last space, in the window
    fn boundary_end(&self, hard_end: usize) -> Option<usize> {
        let window = &self.text[self.cursor..hard_end];
        window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .map(|pos| self.cursor + pos + 1)
    }

    /// Start of the next window: `overlap` chars before `end`, if that moves forward
    fn overlap_start(&self, end: usize) -> Option<usize> {
        if self.overlap == 0 {
            return Some(end);
        }
        self.text[self.cursor..end]
            .char_indices()
            .rev()
            .nth(self.overlap - 1)
            .map(|(i, _)| self.cursor + i)
            .filter(|&next| next > self.cursor)
    }
}

impl<'a> Iterator for Splits<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            if self.done || self.cursor >= self.text.len() {
                self.done = true;
                return None;
            }

            let hard_end = self.hard_end();
            let end = if hard_end < self.text.len() {
                self.boundary_end(hard_end).unwrap_or(hard_end)
            } else {
                hard_end
            };

            let piece = self.text[self.cursor..end].trim();

            if end >= self.text.len() {
                self.done = true;
            } else {
                // Windows no longer than the overlap step forward one char.
                self.cursor = self.overlap_start(end).unwrap_or_else(|| {
                    let step = self.text[self.cursor..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                    self.cursor + step
                });
            }

            if !piece.is_empty() {
                return Some(piece);
            }
        }
    }
}

impl FusedIterator for Splits<'_> {}
