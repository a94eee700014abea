//! Overlapping sliding-window text chunker.
//!
//! Splits document body text into fixed-size [`Chunk`]s (default 1500
//! characters with 500 characters of overlap) for embedding and retrieval.
//! Window size and overlap count characters, not bytes, so non-ASCII
//! corpora get full-sized chunks. Cut points prefer paragraph breaks, then
//! line breaks, then spaces within the back half of the window, so chunks
//! rarely split mid-sentence.
//!
//! Each chunk records its byte offset into the document body and a SHA-256
//! hash of its text for staleness detection.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Split text into overlapping chunks of `chunk_size` characters with
/// `overlap` characters shared between neighbors. Returns chunks with
/// contiguous indices starting at 0; whitespace-only windows are dropped.
/// Empty input yields no chunks.
pub fn chunk_text(document_id: &str, text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    debug_assert!(chunk_size > 0 && overlap < chunk_size);

    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index: i64 = 0;

    while start < len {
        let mut end = advance_chars(text, start, chunk_size);

        if end < len {
            end = soft_cut(text, start, end, chunk_size);
        }

        let piece = &text[start..end];
        if !piece.trim().is_empty() {
            chunks.push(make_chunk(document_id, index, start as i64, piece));
            index += 1;
        }

        if end >= len {
            break;
        }

        let mut next = back_chars(text, end, overlap);
        if next <= start {
            next = end;
        }
        start = next;
    }

    chunks
}

/// Move a cut point back to the latest paragraph break, line break, or space
/// in the back half of the window. Falls back to the hard cut.
fn soft_cut(text: &str, start: usize, end: usize, chunk_size: usize) -> usize {
    let min_cut = advance_chars(text, start, chunk_size / 2).min(end);
    let rel_min = min_cut - start;
    let window = &text[start..end];

    let cut = window[rel_min..]
        .rfind("\n\n")
        .map(|p| rel_min + p + 2)
        .or_else(|| window[rel_min..].rfind('\n').map(|p| rel_min + p + 1))
        .or_else(|| window[rel_min..].rfind(' ').map(|p| rel_min + p + 1));

    match cut {
        Some(c) if c > 0 => start + c,
        _ => end,
    }
}

/// Byte index after stepping `n` characters forward from `start`.
fn advance_chars(text: &str, start: usize, n: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len())
}

/// Byte index after stepping `n` characters back from `end`.
fn back_chars(text: &str, end: usize, n: usize) -> usize {
    if n == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn make_chunk(document_id: &str, index: i64, start_offset: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        start_offset,
        text: text.to_string(),
        hash,
    }
}
