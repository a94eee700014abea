//! Corpus statistics and health overview.
//!
//! Quick summary of what's indexed: document counts, chunk counts, and
//! embedding coverage, with a per-document breakdown. Used by `hmate stats`
//! to give confidence that ingest and embedding are working as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

struct DocStats {
    file_name: String,
    pages: i64,
    chunk_count: i64,
    embedded_count: i64,
    ingested_at: i64,
}

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&pool)
        .await?;

    let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
        .fetch_one(&pool)
        .await?;

    let total_embedded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.store.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("HealthMate — Store Stats");
    println!("========================");
    println!();
    println!("  Store:       {}", config.store.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", total_docs);
    println!("  Chunks:      {}", total_chunks);
    println!(
        "  Embedded:    {} / {} ({}%)",
        total_embedded,
        total_chunks,
        if total_chunks > 0 {
            (total_embedded * 100) / total_chunks
        } else {
            0
        }
    );

    let doc_rows = sqlx::query(
        r#"
        SELECT
            d.file_name,
            d.pages,
            d.ingested_at,
            COUNT(DISTINCT c.id) AS chunk_count,
            COUNT(DISTINCT cv.chunk_id) AS embedded_count
        FROM documents d
        LEFT JOIN chunks c ON c.document_id = d.id
        LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
        GROUP BY d.id
        ORDER BY d.file_name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let doc_stats: Vec<DocStats> = doc_rows
        .iter()
        .map(|row| DocStats {
            file_name: row.get("file_name"),
            pages: row.get("pages"),
            chunk_count: row.get("chunk_count"),
            embedded_count: row.get("embedded_count"),
            ingested_at: row.get("ingested_at"),
        })
        .collect();

    if !doc_stats.is_empty() {
        println!();
        println!("  By document:");
        println!(
            "  {:<40} {:>6} {:>8} {:>10}   {}",
            "FILE", "PAGES", "CHUNKS", "EMBEDDED", "INGESTED"
        );
        println!("  {}", "-".repeat(88));

        for d in &doc_stats {
            println!(
                "  {:<40} {:>6} {:>8} {:>10}   {}",
                d.file_name,
                d.pages,
                d.chunk_count,
                d.embedded_count,
                format_ts(d.ingested_at)
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a UTC date-time string.
fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
