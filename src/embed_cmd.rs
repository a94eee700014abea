//! Embedding maintenance commands.
//!
//! `embed pending` backfills chunks whose vectors are missing or stale
//! (the chunk's text hash no longer matches the hash recorded with its
//! embedding); `embed rebuild` clears everything and regenerates. Ingest
//! reuses the same batch writer through [`embed_chunks_inline`], where
//! failures leave chunks pending for a later backfill instead of failing
//! the run.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::embedding::{self, Embedder};
use crate::models::Chunk;

/// Find and embed chunks that are missing or have stale embeddings.
pub async fn run_embed_pending(
    config: &Config,
    limit: Option<usize>,
    batch_size_override: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    let embedder = Embedder::from_config(&config.embedding)?;
    let pool = db::connect(config).await?;

    let pending = find_pending_chunks(&pool, embedder.model_name(), limit).await?;

    if dry_run {
        println!("embed pending (dry-run)");
        println!("  chunks needing embeddings: {}", pending.len());
        pool.close().await;
        return Ok(());
    }

    if pending.is_empty() {
        println!("embed pending");
        println!("  all chunks up to date");
        pool.close().await;
        return Ok(());
    }

    let batch_size = batch_size_override.unwrap_or(config.embedding.batch_size);
    let (embedded, failed) = write_embeddings(&embedder, &pool, &pending, batch_size).await;

    println!("embed pending");
    println!("  total pending: {}", pending.len());
    println!("  embedded: {}", embedded);
    println!("  failed: {}", failed);

    pool.close().await;
    Ok(())
}

/// Delete all embeddings and regenerate for all chunks. Useful when
/// switching embedding models or dimensions.
pub async fn run_embed_rebuild(config: &Config, batch_size_override: Option<usize>) -> Result<()> {
    let embedder = Embedder::from_config(&config.embedding)?;
    let pool = db::connect(config).await?;

    sqlx::query("DELETE FROM chunk_vectors")
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM embeddings").execute(&pool).await?;

    println!("embed rebuild — cleared existing embeddings");

    let chunks = find_pending_chunks(&pool, embedder.model_name(), None).await?;

    if chunks.is_empty() {
        println!("  no chunks to embed");
        pool.close().await;
        return Ok(());
    }

    let batch_size = batch_size_override.unwrap_or(config.embedding.batch_size);
    let (embedded, failed) = write_embeddings(&embedder, &pool, &chunks, batch_size).await;

    println!("embed rebuild");
    println!("  total chunks: {}", chunks.len());
    println!("  embedded: {}", embedded);
    println!("  failed: {}", failed);

    pool.close().await;
    Ok(())
}

/// Embed freshly written chunks during an ingest run. Tolerant of
/// failure: an unreachable provider leaves the chunks pending rather
/// than failing the ingest. Returns `(embedded, pending)`.
pub async fn embed_chunks_inline(
    config: &Config,
    pool: &SqlitePool,
    chunks: &[Chunk],
) -> (u64, u64) {
    let embedder = match Embedder::from_config(&config.embedding) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Warning: could not create embedding provider: {}", e);
            return (0, chunks.len() as u64);
        }
    };

    // Chunk.hash is already the text hash; reuse it for staleness tracking
    let pending: Vec<PendingChunk> = chunks
        .iter()
        .map(|c| PendingChunk {
            chunk_id: c.id.clone(),
            document_id: c.document_id.clone(),
            text: c.text.clone(),
            text_hash: c.hash.clone(),
        })
        .collect();

    write_embeddings(&embedder, pool, &pending, config.embedding.batch_size).await
}

struct PendingChunk {
    chunk_id: String,
    document_id: String,
    text: String,
    text_hash: String,
}

/// One batched pass over `pending`: embed each batch and upsert the
/// vectors. A failed batch (API error or store error) is counted and
/// skipped; the pass never aborts. Returns `(embedded, failed)`.
async fn write_embeddings(
    embedder: &Embedder,
    pool: &SqlitePool,
    pending: &[PendingChunk],
    batch_size: usize,
) -> (u64, u64) {
    let mut embedded = 0u64;
    let mut failed = 0u64;

    for batch in pending.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();

        let vectors = match embedder.embed(&texts).await {
            Ok(v) if v.len() == batch.len() => v,
            Ok(v) => {
                eprintln!(
                    "Warning: embedding batch returned {} vectors for {} texts",
                    v.len(),
                    batch.len()
                );
                failed += batch.len() as u64;
                continue;
            }
            Err(e) => {
                eprintln!("Warning: embedding batch failed: {}", e);
                failed += batch.len() as u64;
                continue;
            }
        };

        for (item, vector) in batch.iter().zip(&vectors) {
            match upsert_embedding(pool, item, embedder, vector).await {
                Ok(()) => embedded += 1,
                Err(e) => {
                    eprintln!(
                        "Warning: failed to store embedding for {}: {}",
                        item.chunk_id, e
                    );
                    failed += 1;
                }
            }
        }
    }

    (embedded, failed)
}

async fn find_pending_chunks(
    pool: &SqlitePool,
    model: &str,
    limit: Option<usize>,
) -> Result<Vec<PendingChunk>> {
    // LIMIT -1 disables the cap in SQLite
    let limit_val = limit.map(|l| l as i64).unwrap_or(-1);

    let rows = sqlx::query(
        r#"
        SELECT c.id AS chunk_id, c.document_id, c.text, c.hash
        FROM chunks c
        LEFT JOIN embeddings e ON e.chunk_id = c.id AND e.model = ?
        WHERE e.chunk_id IS NULL OR e.hash != c.hash
        ORDER BY c.document_id, c.chunk_index
        LIMIT ?
        "#,
    )
    .bind(model)
    .bind(limit_val)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| PendingChunk {
            chunk_id: row.get("chunk_id"),
            document_id: row.get("document_id"),
            text: row.get("text"),
            text_hash: row.get("hash"),
        })
        .collect())
}

async fn upsert_embedding(
    pool: &SqlitePool,
    item: &PendingChunk,
    embedder: &Embedder,
    vector: &[f32],
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let blob = embedding::vec_to_blob(vector);

    sqlx::query(
        r#"
        INSERT INTO embeddings (chunk_id, model, dims, created_at, hash)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(chunk_id) DO UPDATE SET
            model = excluded.model,
            dims = excluded.dims,
            created_at = excluded.created_at,
            hash = excluded.hash
        "#,
    )
    .bind(&item.chunk_id)
    .bind(embedder.model_name())
    .bind(embedder.dims() as i64)
    .bind(now)
    .bind(&item.text_hash)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO chunk_vectors (chunk_id, document_id, embedding)
        VALUES (?, ?, ?)
        ON CONFLICT(chunk_id) DO UPDATE SET
            document_id = excluded.document_id,
            embedding = excluded.embedding
        "#,
    )
    .bind(&item.chunk_id)
    .bind(&item.document_id)
    .bind(&blob)
    .execute(pool)
    .await?;

    Ok(())
}
