//! Retrieval-augmented query pipeline.
//!
//! Given a free-text health question, expands it into several paraphrases,
//! retrieves the most similar chunks from the vector store for each,
//! merges and deduplicates them into a single context, and asks the
//! generation model for an answer grounded in that context.
//!
//! The pipeline is driven through [`QueryContext`], an explicit immutable
//! context (configuration + store pool) constructed once at process start
//! and passed into every invocation — there is no hidden module-level
//! singleton.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::llm;
use crate::models::RetrievedChunk;

/// Instruction block constraining the assistant to context-grounded
/// medical answers. Filled into every generation request.
pub const SYSTEM_PROMPT: &str = "\
You are Dr. HealthMate, a highly experienced and professional medical doctor. You provide accurate, clear, and trustworthy medical advice based only on the verified medical literature provided in the context.

Your responsibilities include:
- Explaining diseases, symptoms, and medical terms in simple language
- Recommending over-the-counter medications when appropriate
- Providing first-aid tips and home remedies
- Advising when to consult a physician
- Never guessing — if the context does not contain a valid answer, respond with: \"Based on the current information, I cannot provide a reliable answer. Please consult a qualified medical professional.\"

Only use the provided context to generate your response. Do NOT answer questions unrelated to medicine or healthcare.";

const EXPANSION_SYSTEM_PROMPT: &str = "\
You generate alternative phrasings of a user's medical question to improve \
document retrieval. Respond with one paraphrase per line and nothing else: \
no numbering, no commentary.";

/// Immutable pipeline context: configuration plus the vector store pool.
pub struct QueryContext {
    pub config: Config,
    pool: SqlitePool,
}

impl QueryContext {
    /// Connect to the persisted store and build the pipeline context.
    pub async fn connect(config: Config) -> Result<Self> {
        let pool = db::connect(&config).await?;
        Ok(Self { config, pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Answer a question grounded in retrieved context. This is the entire
    /// contract the front ends depend on: question string in, answer
    /// string out, any failure surfaced as a single error.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            bail!("Question must not be empty");
        }

        let queries = self.expand_query(question).await;
        let retrieved = self.retrieve(&queries).await?;

        let context: Vec<&str> = retrieved.iter().map(|c| c.text.as_str()).collect();
        let user_prompt = build_user_prompt(&context, question);

        llm::chat(&self.config.llm, SYSTEM_PROMPT, &user_prompt).await
    }

    /// Multi-query expansion. Best-effort: on model failure the original
    /// question alone is used, retrieval still proceeds.
    async fn expand_query(&self, question: &str) -> Vec<String> {
        let mut queries = vec![question.to_string()];

        let want = self.config.llm.expansions;
        if want == 0 {
            return queries;
        }

        let request = format!(
            "Give {} alternative phrasings of this medical question:\n{}",
            want, question
        );

        match llm::chat(&self.config.llm, EXPANSION_SYSTEM_PROMPT, &request).await {
            Ok(raw) => {
                queries.extend(parse_expansions(&raw, question, want));
            }
            Err(e) => {
                eprintln!("Warning: query expansion failed, using original only: {}", e);
            }
        }

        queries
    }

    /// Similarity search per expanded query, merged and deduplicated.
    async fn retrieve(&self, queries: &[String]) -> Result<Vec<RetrievedChunk>> {
        let embedder = embedding::Embedder::from_config(&self.config.embedding)?;
        let query_vecs = embedder.embed(queries).await?;

        let stored = self.load_vectors().await?;

        let per_query: Vec<Vec<RetrievedChunk>> = query_vecs
            .iter()
            .map(|qv| top_k_for_query(qv, &stored, self.config.retrieval.top_k))
            .collect();

        Ok(merge_candidates(
            per_query,
            self.config.retrieval.max_context_chunks,
        ))
    }

    async fn load_vectors(&self) -> Result<Vec<StoredVector>> {
        let rows = sqlx::query(
            r#"
            SELECT cv.chunk_id, cv.document_id, cv.embedding, c.text
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let stored = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                StoredVector {
                    chunk_id: row.get("chunk_id"),
                    document_id: row.get("document_id"),
                    text: row.get("text"),
                    vector: embedding::blob_to_vec(&blob),
                }
            })
            .collect();

        Ok(stored)
    }
}

struct StoredVector {
    chunk_id: String,
    document_id: String,
    text: String,
    vector: Vec<f32>,
}

fn top_k_for_query(query_vec: &[f32], stored: &[StoredVector], k: usize) -> Vec<RetrievedChunk> {
    let mut scored: Vec<RetrievedChunk> = stored
        .iter()
        .map(|s| RetrievedChunk {
            chunk_id: s.chunk_id.clone(),
            document_id: s.document_id.clone(),
            text: s.text.clone(),
            score: embedding::cosine_similarity(query_vec, &s.vector) as f64,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk_id.cmp(&b.chunk_id))
    });
    scored.truncate(k);
    scored
}

/// Merge per-query candidates by chunk id, keeping each chunk's best score.
/// Ordered by score desc then chunk id asc (deterministic); truncated to
/// `max` chunks.
pub fn merge_candidates(
    per_query: Vec<Vec<RetrievedChunk>>,
    max: usize,
) -> Vec<RetrievedChunk> {
    let mut best: HashMap<String, RetrievedChunk> = HashMap::new();

    for candidates in per_query {
        for cand in candidates {
            match best.get(&cand.chunk_id) {
                Some(existing) if existing.score >= cand.score => {}
                _ => {
                    best.insert(cand.chunk_id.clone(), cand);
                }
            }
        }
    }

    let mut merged: Vec<RetrievedChunk> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk_id.cmp(&b.chunk_id))
    });
    merged.truncate(max);
    merged
}

/// Parse the expansion model's raw output into clean query strings:
/// one per line, numbering and bullets stripped, duplicates and the
/// original question dropped, capped at `max`.
pub fn parse_expansions(raw: &str, original: &str, max: usize) -> Vec<String> {
    let original_lower = original.trim().to_lowercase();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for line in raw.lines() {
        let cleaned = line
            .trim()
            .trim_start_matches(|c: char| {
                c.is_ascii_digit() || c == '.' || c == ')' || c == '-' || c == '*' || c == '•'
            })
            .trim()
            .trim_matches('"')
            .trim();

        if cleaned.is_empty() {
            continue;
        }

        let lower = cleaned.to_lowercase();
        if lower == original_lower || !seen.insert(lower) {
            continue;
        }

        out.push(cleaned.to_string());
        if out.len() == max {
            break;
        }
    }

    out
}

/// Substitute retrieved context and the question into the fixed template.
pub fn build_user_prompt(context: &[&str], question: &str) -> String {
    format!(
        "Context:\n{}\n\nQuestion: {}",
        context.join("\n\n"),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, score: f64) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: id.to_string(),
            document_id: "d1".to_string(),
            text: format!("text for {}", id),
            score,
        }
    }

    #[test]
    fn test_parse_expansions_strips_numbering() {
        let raw = "1. What causes a high temperature?\n2) Why do fevers happen?\n- Reasons for fever\n";
        let out = parse_expansions(raw, "What causes fever?", 3);
        assert_eq!(
            out,
            vec![
                "What causes a high temperature?",
                "Why do fevers happen?",
                "Reasons for fever"
            ]
        );
    }

    #[test]
    fn test_parse_expansions_drops_original_and_duplicates() {
        let raw = "What causes fever?\nwhat causes fever?\nWhy do fevers happen?\nWhy do fevers happen?";
        let out = parse_expansions(raw, "What causes fever?", 5);
        assert_eq!(out, vec!["Why do fevers happen?"]);
    }

    #[test]
    fn test_parse_expansions_caps_at_max() {
        let raw = "a\nb\nc\nd\ne";
        let out = parse_expansions(raw, "q", 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_parse_expansions_empty_output() {
        assert!(parse_expansions("", "q", 3).is_empty());
        assert!(parse_expansions("\n  \n", "q", 3).is_empty());
    }

    #[test]
    fn test_merge_dedupes_keeping_best_score() {
        let merged = merge_candidates(
            vec![
                vec![chunk("c1", 0.9), chunk("c2", 0.5)],
                vec![chunk("c2", 0.8), chunk("c3", 0.4)],
            ],
            10,
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].chunk_id, "c1");
        assert_eq!(merged[1].chunk_id, "c2");
        assert!((merged[1].score - 0.8).abs() < 1e-9);
        assert_eq!(merged[2].chunk_id, "c3");
    }

    #[test]
    fn test_merge_truncates_to_max() {
        let merged = merge_candidates(
            vec![vec![chunk("c1", 0.9), chunk("c2", 0.8), chunk("c3", 0.7)]],
            2,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].chunk_id, "c1");
    }

    #[test]
    fn test_merge_deterministic_on_ties() {
        let merged = merge_candidates(
            vec![vec![chunk("c2", 0.5), chunk("c1", 0.5), chunk("c3", 0.5)]],
            10,
        );
        let ids: Vec<&str> = merged.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_top_k_orders_by_similarity() {
        let stored = vec![
            StoredVector {
                chunk_id: "far".to_string(),
                document_id: "d1".to_string(),
                text: "far".to_string(),
                vector: vec![0.0, 1.0],
            },
            StoredVector {
                chunk_id: "near".to_string(),
                document_id: "d1".to_string(),
                text: "near".to_string(),
                vector: vec![1.0, 0.0],
            },
        ];
        let top = top_k_for_query(&[1.0, 0.0], &stored, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].chunk_id, "near");
    }

    #[test]
    fn test_build_user_prompt_contains_parts() {
        let prompt = build_user_prompt(&["chunk one", "chunk two"], "What is a fever?");
        assert!(prompt.starts_with("Context:\nchunk one\n\nchunk two"));
        assert!(prompt.ends_with("Question: What is a fever?"));
    }
}
