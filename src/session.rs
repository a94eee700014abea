//! In-memory chat session store.
//!
//! Sessions map an opaque identifier (a browser cookie value) to an
//! ordered message list. The store is an explicit abstraction injected
//! into request handlers rather than ambient global state; the in-memory
//! implementation has no eviction or persistence — history is lost on
//! process restart, and multi-process deployments are a known limitation.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::ChatMessage;
use crate::render;

/// Get/append/clear operations over per-session chat history.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Vec<ChatMessage>;
    fn append(&self, session_id: &str, message: ChatMessage) -> ChatMessage;
    fn clear(&self, session_id: &str);
}

/// Process-local [`SessionStore`] backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    fn append(&self, session_id: &str, message: ChatMessage) -> ChatMessage {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session_id.to_string(), Vec::new());
    }
}

/// Render a session's history as a plain-text transcript: boilerplate
/// header followed by one `[timestamp] sender: text` line per message,
/// with HTML markup stripped.
pub fn export_transcript(history: &[ChatMessage]) -> String {
    let mut out = String::from("Dr. HealthMate Chat Export\n");
    out.push_str(&format!(
        "Date: {}\n",
        chrono::Local::now().format("%B %d, %Y")
    ));
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for msg in history {
        let clean = render::strip_html(&msg.text);
        out.push_str(&format!("[{}] {}: {}\n\n", msg.timestamp, msg.sender, clean));
    }

    out
}

/// File name for a transcript download, stamped to the second.
pub fn export_filename() -> String {
    format!(
        "healthmate_chat_{}.txt",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: "m1".to_string(),
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp: "10:30 AM".to_string(),
        }
    }

    #[test]
    fn test_append_and_get_in_order() {
        let store = MemorySessionStore::new();
        store.append("s1", msg("You", "first"));
        store.append("s1", msg("Dr. HealthMate", "second"));

        let history = store.get("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "first");
        assert_eq!(history[1].text, "second");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = MemorySessionStore::new();
        store.append("s1", msg("You", "hello"));
        assert!(store.get("s2").is_empty());
    }

    #[test]
    fn test_clear_then_export_is_boilerplate_only() {
        let store = MemorySessionStore::new();
        store.append("s1", msg("You", "hello"));
        store.clear("s1");

        let transcript = export_transcript(&store.get("s1"));
        assert!(transcript.starts_with("Dr. HealthMate Chat Export\n"));
        assert!(transcript.trim_end().ends_with(&"=".repeat(50)));
    }

    #[test]
    fn test_export_strips_html_and_keeps_turn_order() {
        let store = MemorySessionStore::new();
        store.append("s1", msg("You", "What helps a fever?"));
        store.append(
            "s1",
            msg("Dr. HealthMate", "<strong>Rest</strong> and <em>fluids</em>.<br>"),
        );

        let transcript = export_transcript(&store.get("s1"));
        let user_pos = transcript.find("You: What helps a fever?").unwrap();
        let bot_pos = transcript.find("Dr. HealthMate: Rest and fluids.").unwrap();
        assert!(user_pos < bot_pos);
        assert!(!transcript.contains("<strong>"));
    }
}
