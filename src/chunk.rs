//! Sliding-window text chunker.
//!
//! Splits the corpus into fixed-size windows of `chunk_size` characters that
//! overlap by `overlap` characters, so a sentence cut at one window's edge
//! reappears whole at the start of the next. The window advances by
//! `chunk_size - overlap` and stops once a window reaches the end of the
//! text; a trailing window that would fall entirely inside the previous
//! overlap is never emitted.

use anyhow::{bail, Result};

use crate::models::Chunk;

/// Default window width in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap between consecutive windows in characters.
pub const DEFAULT_OVERLAP: usize = 50;

/// Split `text` into overlapping windows of at most `chunk_size` characters.
///
/// Offsets in the returned chunks are character offsets. Consecutive chunks
/// overlap by exactly `overlap` characters; the last chunk may be shorter.
/// Empty input produces an empty vec. For non-empty input of `L` characters
/// the chunk count is `ceil((L - overlap) / (chunk_size - overlap))`,
/// bounded below by 1.
///
/// # Errors
///
/// Fails when `overlap >= chunk_size`: the window would never advance.
/// [`load_config`](crate::config::load_config) rejects such values up front,
/// so reaching this from the pipeline means the config check was bypassed.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    if overlap >= chunk_size {
        bail!(
            "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
            overlap,
            chunk_size
        );
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary (plus the end of the text), so char
    // offsets map to valid slice boundaries without re-walking the string.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    let total_chars = boundaries.len() - 1;

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(total_chars);
        chunks.push(Chunk {
            id: chunks.len(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start_offset: start,
            end_offset: end,
        });
        if end == total_chars {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
