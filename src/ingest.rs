//! Ingestion pipeline orchestration.
//!
//! Coordinates the offline flow: scan PDF directory → extract text →
//! chunk with overlap → store → embed. Corrupt or unreadable PDFs are
//! reported and skipped rather than aborting the batch; embedding is
//! inline but non-fatal, so a run without a reachable embedding service
//! still persists documents and chunks (backfill with `hmate embed pending`).

use anyhow::Result;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::db;
use crate::documents;
use crate::embed_cmd;

pub async fn run_ingest(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut files = documents::scan_documents(&config.documents.dir)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }

    if dry_run {
        println!("ingest {} (dry-run)", config.documents.dir.display());
        println!("  pdf files found: {}", files.len());
        pool.close().await;
        return Ok(());
    }

    let mut ingested = 0u64;
    let mut unchanged = 0u64;
    let mut skipped = 0u64;
    let mut chunks_written = 0u64;
    let mut embeddings_written = 0u64;
    let mut embeddings_pending = 0u64;

    for file in &files {
        let extracted = match documents::extract_pdf(&file.path) {
            Ok(e) => e,
            Err(e) => {
                eprintln!("Warning: skipping {}: {}", file.file_name, e);
                skipped += 1;
                continue;
            }
        };

        if extracted.text.trim().is_empty() {
            eprintln!(
                "Warning: skipping {}: no text could be extracted",
                file.file_name
            );
            skipped += 1;
            continue;
        }

        let dedup_hash = hash_text(&extracted.text);
        if let Some(existing) = existing_hash(&pool, &file.file_name).await? {
            if existing == dedup_hash {
                unchanged += 1;
                continue;
            }
        }

        let doc_id = upsert_document(
            &pool,
            &file.file_name,
            extracted.pages,
            &extracted.text,
            &dedup_hash,
        )
        .await?;

        let chunks = chunk_text(
            &doc_id,
            &extracted.text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        );
        let chunk_count = chunks.len() as u64;
        replace_chunks(&pool, &doc_id, &chunks).await?;

        // Inline embedding (non-fatal)
        let (emb_ok, emb_pending) = embed_cmd::embed_chunks_inline(config, &pool, &chunks).await;
        embeddings_written += emb_ok;
        embeddings_pending += emb_pending;

        ingested += 1;
        chunks_written += chunk_count;
    }

    println!("ingest {}", config.documents.dir.display());
    println!("  pdf files found: {}", files.len());
    println!("  documents ingested: {}", ingested);
    println!("  unchanged: {}", unchanged);
    println!("  skipped: {}", skipped);
    println!("  chunks written: {}", chunks_written);
    println!("  embeddings written: {}", embeddings_written);
    println!("  embeddings pending: {}", embeddings_pending);
    println!("ok");

    pool.close().await;
    Ok(())
}

async fn existing_hash(pool: &SqlitePool, file_name: &str) -> Result<Option<String>> {
    let hash: Option<String> =
        sqlx::query_scalar("SELECT dedup_hash FROM documents WHERE file_name = ?")
            .bind(file_name)
            .fetch_optional(pool)
            .await?;
    Ok(hash)
}

async fn upsert_document(
    pool: &SqlitePool,
    file_name: &str,
    pages: i64,
    body: &str,
    dedup_hash: &str,
) -> Result<String> {
    let existing_id: Option<String> =
        sqlx::query_scalar("SELECT id FROM documents WHERE file_name = ?")
            .bind(file_name)
            .fetch_optional(pool)
            .await?;

    let doc_id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let title = std::path::Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());

    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO documents (id, file_name, title, pages, body, ingested_at, dedup_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(file_name) DO UPDATE SET
            title = excluded.title,
            pages = excluded.pages,
            body = excluded.body,
            ingested_at = excluded.ingested_at,
            dedup_hash = excluded.dedup_hash
        "#,
    )
    .bind(&doc_id)
    .bind(file_name)
    .bind(&title)
    .bind(pages)
    .bind(body)
    .bind(now)
    .bind(dedup_hash)
    .execute(pool)
    .await?;

    Ok(doc_id)
}

async fn replace_chunks(
    pool: &SqlitePool,
    document_id: &str,
    chunks: &[crate::models::Chunk],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    // Delete old vectors and embeddings for this document's chunks
    sqlx::query(
        "DELETE FROM chunk_vectors WHERE chunk_id IN (SELECT id FROM chunks WHERE document_id = ?)",
    )
    .bind(document_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "DELETE FROM embeddings WHERE chunk_id IN (SELECT id FROM chunks WHERE document_id = ?)",
    )
    .bind(document_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM chunks WHERE document_id = ?")
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

    for chunk in chunks {
        sqlx::query(
            "INSERT INTO chunks (id, document_id, chunk_index, start_offset, text, hash) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&chunk.id)
        .bind(&chunk.document_id)
        .bind(chunk.chunk_index)
        .bind(chunk.start_offset)
        .bind(&chunk.text)
        .bind(&chunk.hash)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
