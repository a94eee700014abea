//! Generation model client.
//!
//! Sends a system + user exchange to a local Ollama instance's `/api/chat`
//! endpoint (`stream: false`) and returns the completion text. Transport
//! and retry behavior live in [`crate::http`], shared with the embedding
//! backends.

use anyhow::Result;
use serde::Deserialize;

use crate::config::LlmConfig;
use crate::http::Endpoint;

/// Send a single system + user exchange to the generation model and
/// return the completion text.
pub async fn chat(config: &LlmConfig, system: &str, user: &str) -> Result<String> {
    let base = config.url.as_deref().unwrap_or("http://localhost:11434");
    let endpoint = Endpoint {
        url: format!("{}/api/chat", base),
        bearer: None,
        timeout_secs: config.timeout_secs,
        max_retries: config.max_retries,
    };

    let mut body = serde_json::json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user },
        ],
        "stream": false,
    });
    if let Some(t) = config.temperature {
        body["options"] = serde_json::json!({ "temperature": t });
    }

    let json = endpoint.post_json(&body).await?;
    let parsed: ChatResponse = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Unexpected chat response: {}", e))?;

    Ok(parsed.message.content)
}

#[derive(Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_shape() {
        let json = serde_json::json!({
            "model": "llama3",
            "message": { "role": "assistant", "content": "Drink fluids and rest." },
            "done": true
        });
        let parsed: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.message.content, "Drink fluids and rest.");
    }

    #[test]
    fn test_chat_response_missing_content() {
        let json = serde_json::json!({ "done": true });
        assert!(serde_json::from_value::<ChatResponse>(json).is_err());
    }
}
