//! Core data models used throughout HealthMate.
//!
//! These types represent the documents, chunks, and chat messages that flow
//! through the ingestion, retrieval, and chat layers.

use serde::Serialize;

/// A source PDF as discovered on disk, before extraction.
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub path: std::path::PathBuf,
    /// File name relative to the documents directory.
    pub file_name: String,
}

/// A fixed-size, overlapping slice of a document's body text.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: i64,
    /// Byte offset of this chunk within the document body.
    pub start_offset: i64,
    pub text: String,
    pub hash: String,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub score: f64,
}

/// A single turn in a chat session. Held in process memory only.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub text: String,
    /// Display timestamp, e.g. "03:47 PM".
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(sender: &str, text: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp: chrono::Local::now().format("%I:%M %p").to_string(),
        }
    }
}
