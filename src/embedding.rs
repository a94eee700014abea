//! Embedding backends and vector utilities.
//!
//! An [`Embedder`] is one of two configured backends:
//! - **Ollama** — a local instance's `/api/embed` endpoint (default).
//! - **OpenAI** — the `/v1/embeddings` API; requires `OPENAI_API_KEY`.
//!
//! Both share the retrying JSON client in [`crate::http`].
//!
//! Also provides vector utilities for the SQLite store:
//! - [`cosine_similarity`] — similarity between two embedding vectors
//! - [`vec_to_blob`] / [`blob_to_vec`] — little-endian f32 BLOB encoding

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::config::EmbeddingConfig;
use crate::http::Endpoint;

/// A configured embedding backend, ready to embed batches of text.
#[derive(Debug)]
pub enum Embedder {
    Ollama {
        model: String,
        dims: usize,
        endpoint: Endpoint,
    },
    OpenAi {
        model: String,
        dims: usize,
        endpoint: Endpoint,
    },
}

impl Embedder {
    /// Build the backend selected by `[embedding] provider`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            bail!("embedding.model must be specified");
        }

        match config.provider.as_str() {
            "ollama" => {
                let base = config.url.as_deref().unwrap_or("http://localhost:11434");
                Ok(Self::Ollama {
                    model: config.model.clone(),
                    dims: config.dims,
                    endpoint: Endpoint {
                        url: format!("{}/api/embed", base),
                        bearer: None,
                        timeout_secs: config.timeout_secs,
                        max_retries: config.max_retries,
                    },
                })
            }
            "openai" => {
                let api_key = std::env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
                let base = config.url.as_deref().unwrap_or("https://api.openai.com");
                Ok(Self::OpenAi {
                    model: config.model.clone(),
                    dims: config.dims,
                    endpoint: Endpoint {
                        url: format!("{}/v1/embeddings", base),
                        bearer: Some(api_key),
                        timeout_secs: config.timeout_secs,
                        max_retries: config.max_retries,
                    },
                })
            }
            other => bail!(
                "Unknown embedding provider: '{}'. Must be ollama or openai.",
                other
            ),
        }
    }

    /// The model identifier (e.g. `"nomic-embed-text"`), as recorded in
    /// the embeddings table.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Ollama { model, .. } | Self::OpenAi { model, .. } => model,
        }
    }

    /// Embedding vector dimensionality (e.g. `768`).
    pub fn dims(&self) -> usize {
        match self {
            Self::Ollama { dims, .. } | Self::OpenAi { dims, .. } => *dims,
        }
    }

    /// Embed a batch of texts. Returns one vector per input, in input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Ollama {
                model, endpoint, ..
            } => {
                let body = serde_json::json!({ "model": model, "input": texts });
                let json = endpoint.post_json(&body).await?;
                let parsed: OllamaEmbedResponse = serde_json::from_value(json)
                    .map_err(|e| anyhow::anyhow!("Unexpected embed response: {}", e))?;
                Ok(parsed.embeddings)
            }
            Self::OpenAi {
                model, endpoint, ..
            } => {
                let body = serde_json::json!({ "model": model, "input": texts });
                let json = endpoint.post_json(&body).await?;
                let parsed: OpenAiEmbedResponse = serde_json::from_value(json)
                    .map_err(|e| anyhow::anyhow!("Unexpected embed response: {}", e))?;
                Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
            }
        }
    }
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors
/// of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(d, na, nb), (x, y)| {
            (d + x * y, na + x * x, nb + y * y)
        });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(provider: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: provider.to_string(),
            model: "nomic-embed-text".to_string(),
            dims: 8,
            url: None,
            batch_size: 4,
            max_retries: 0,
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_from_config_ollama_default_url() {
        let embedder = Embedder::from_config(&base_config("ollama")).unwrap();
        match embedder {
            Embedder::Ollama { endpoint, .. } => {
                assert_eq!(endpoint.url, "http://localhost:11434/api/embed");
                assert!(endpoint.bearer.is_none());
            }
            _ => panic!("expected the Ollama backend"),
        }
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let err = Embedder::from_config(&base_config("magic")).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_from_config_empty_model_rejected() {
        let mut config = base_config("ollama");
        config.model = "  ".to_string();
        assert!(Embedder::from_config(&config).is_err());
    }

    #[test]
    fn test_ollama_response_shape() {
        let json = serde_json::json!({ "embeddings": [[0.1, 0.2], [0.3, 0.4]] });
        let parsed: OllamaEmbedResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[0].len(), 2);
    }

    #[test]
    fn test_ollama_response_missing_field() {
        let json = serde_json::json!({ "vectors": [] });
        assert!(serde_json::from_value::<OllamaEmbedResponse>(json).is_err());
    }

    #[test]
    fn test_openai_response_shape() {
        let json = serde_json::json!({
            "data": [
                { "embedding": [0.1, 0.2], "index": 0 },
                { "embedding": [0.3, 0.4], "index": 1 }
            ]
        });
        let parsed: OpenAiEmbedResponse = serde_json::from_value(json).unwrap();
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        let restored = blob_to_vec(&blob);
        assert_eq!(vec, restored);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_empty_or_mismatched() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }
}
