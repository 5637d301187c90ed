//! Recursive character text splitting.
//!
//! Text is split on the first separator it contains, pieces that are still
//! too large are split again on the next separator, and the small pieces are
//! merged back into chunks of at most `chunk_size` characters with up to
//! `chunk_overlap` characters repeated between neighbours.

use std::collections::VecDeque;

use super::error::ProcessorError;
use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Separators tried in order: paragraphs, lines, words, characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splits text into overlapping chunks measured in characters.
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveTextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ProcessorError> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(ProcessorError::InvalidChunking {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in split_keep_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge_splits(&small));
                small.clear();
            }

            if remaining.is_empty() {
                push_trimmed(piece, &mut chunks);
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge_splits(&small));
        }

        chunks
    }

    /// Greedily packs pieces into chunks, carrying a tail of at most
    /// `chunk_overlap` characters into the next chunk.
    fn merge_splits(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&current.iter().copied().collect::<String>(), &mut chunks);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front);
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_trimmed(&current.iter().copied().collect::<String>(), &mut chunks);
        chunks
    }
}

/// Splits on `separator`, keeping each separator at the start of the piece
/// that follows it. An empty separator splits into characters.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    pieces.push(&text[start..]);

    pieces.retain(|p| !p.is_empty());
    pieces
}

fn push_trimmed(chunk: &str, out: &mut Vec<String>) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
