//! HTTP chat front end.
//!
//! Serves the chat page and a small JSON API over the query pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Server-rendered chat page |
//! | `POST` | `/ask` | Ask a question, returns the bot reply and suggestions |
//! | `POST` | `/clear_chat` | Reset the session's chat history |
//! | `GET`  | `/export_chat` | Plain-text transcript of the session |
//! | `GET`  | `/quick_actions` | Static suggestion chips |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Sessions are identified by a `session_id` cookie (UUID v4, set on first
//! touch). Pipeline failures are converted at this boundary into an apology
//! bot message with `success: false` — the client always gets a well-formed
//! response for a non-empty question.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::models::ChatMessage;
use crate::query::QueryContext;
use crate::render;
use crate::session::{self, MemorySessionStore, SessionStore};
use crate::suggest;

const BOT_NAME: &str = "Dr. HealthMate";

const APOLOGY: &str =
    "⚠️ I'm experiencing technical difficulties. Please try again in a moment.";

const WELCOME: &str = "\
👋 Hello! I'm Dr. HealthMate, your AI medical assistant.
<br><br>
I can help you with:
<br>• General health questions
<br>• Symptom information
<br>• Medication guidance
<br>• Health tips and advice
<br><br>
<strong>⚠️ Disclaimer:</strong> I provide general information only. \
Always consult healthcare professionals for medical emergencies or serious concerns.
<br><br>
What health question can I help you with today?";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    ctx: Arc<QueryContext>,
    sessions: Arc<dyn SessionStore>,
}

/// Starts the HTTP chat server. Binds to `[server].bind` and runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let ctx = Arc::new(QueryContext::connect(config.clone()).await?);

    let state = AppState {
        ctx,
        sessions: Arc::new(MemorySessionStore::new()),
    };

    let app = router(state);

    println!("HealthMate chat listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/ask", post(handle_ask))
        .route("/clear_chat", post(handle_clear_chat))
        .route("/export_chat", get(handle_export_chat))
        .route("/quick_actions", get(handle_quick_actions))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Session cookie ============

/// Read the session id from the request cookie, or mint a fresh one.
/// Returns `(session_id, is_new)`.
fn session_from_headers(headers: &HeaderMap) -> (String, bool) {
    if let Some(cookie) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for part in cookie.split(';') {
            if let Some(value) = part.trim().strip_prefix("session_id=") {
                if !value.is_empty() {
                    return (value.to_string(), false);
                }
            }
        }
    }
    (Uuid::new_v4().to_string(), true)
}

fn session_cookie_headers(
    session_id: &str,
    is_new: bool,
) -> AppendHeaders<Vec<(HeaderName, String)>> {
    let mut headers = Vec::new();
    if is_new {
        headers.push((
            header::SET_COOKIE,
            format!("session_id={}; Path=/; HttpOnly", session_id),
        ));
    }
    AppendHeaders(headers)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET / ============

async fn handle_index(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let (session_id, is_new) = session_from_headers(&headers);

    let mut history = state.sessions.get(&session_id);
    if history.is_empty() {
        state
            .sessions
            .append(&session_id, ChatMessage::new(BOT_NAME, WELCOME));
        history = state.sessions.get(&session_id);
    }

    let rendered: String = history
        .iter()
        .map(|msg| {
            let class = if msg.sender == BOT_NAME { "bot" } else { "user" };
            format!(
                "<div class=\"msg {}\"><div class=\"sender\">{}</div><div class=\"text\">{}</div><div class=\"time\">{}</div></div>\n",
                class, msg.sender, msg.text, msg.timestamp
            )
        })
        .collect();

    let page = CHAT_PAGE.replace("{{messages}}", &rendered);

    (session_cookie_headers(&session_id, is_new), Html(page))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct AskResponse {
    user_message: ChatMessage,
    bot_message: ChatMessage,
    suggestions: Vec<&'static str>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn handle_ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (session_id, is_new) = session_from_headers(&headers);

    let user_input = req.message.trim().to_string();
    if user_input.is_empty() {
        // Rejected before the pipeline is ever invoked.
        return Err(bad_request("message must not be empty"));
    }

    let user_message = state
        .sessions
        .append(&session_id, ChatMessage::new("You", &user_input));

    let response = match state.ctx.ask(&user_input).await {
        Ok(answer) => {
            let cleaned = render::clean_response(&answer);
            let bot_message = state
                .sessions
                .append(&session_id, ChatMessage::new(BOT_NAME, &cleaned));

            AskResponse {
                user_message,
                bot_message,
                suggestions: suggest::health_suggestions(&user_input),
                success: true,
                error: None,
            }
        }
        Err(e) => {
            let bot_message = state
                .sessions
                .append(&session_id, ChatMessage::new(BOT_NAME, APOLOGY));

            AskResponse {
                user_message,
                bot_message,
                suggestions: Vec::new(),
                success: false,
                error: Some(e.to_string()),
            }
        }
    };

    Ok((session_cookie_headers(&session_id, is_new), Json(response)))
}

// ============ POST /clear_chat ============

#[derive(Serialize)]
struct ClearResponse {
    success: bool,
}

async fn handle_clear_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (session_id, is_new) = session_from_headers(&headers);
    state.sessions.clear(&session_id);
    (
        session_cookie_headers(&session_id, is_new),
        Json(ClearResponse { success: true }),
    )
}

// ============ GET /export_chat ============

#[derive(Serialize)]
struct ExportResponse {
    export_text: String,
    filename: String,
}

async fn handle_export_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (session_id, is_new) = session_from_headers(&headers);
    let history = state.sessions.get(&session_id);

    (
        session_cookie_headers(&session_id, is_new),
        Json(ExportResponse {
            export_text: session::export_transcript(&history),
            filename: session::export_filename(),
        }),
    )
}

// ============ GET /quick_actions ============

async fn handle_quick_actions() -> Json<Vec<suggest::QuickAction>> {
    Json(suggest::quick_actions())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Chat page ============

const CHAT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Dr. HealthMate</title>
<style>
  body { font-family: Arial, sans-serif; background: #1a1a1a; color: #fff; margin: 0; }
  .wrap { max-width: 720px; margin: 0 auto; padding: 16px; }
  h1 { color: #4CAF50; font-size: 1.4em; }
  #chat { background: #2c2c2c; border: 2px solid #4CAF50; border-radius: 12px;
          padding: 16px; height: 420px; overflow-y: auto; }
  .msg { margin: 10px 0; padding: 10px; border-radius: 12px; max-width: 80%; }
  .msg.bot { background: #4CAF50; }
  .msg.user { background: #ffcc00; color: #1a1a1a; margin-left: auto; }
  .sender { font-weight: bold; font-size: 0.85em; }
  .time { font-size: 0.7em; opacity: 0.7; margin-top: 4px; }
  #controls { display: flex; gap: 8px; margin-top: 12px; }
  #input { flex: 1; padding: 10px; border-radius: 8px; border: none; background: #333; color: #fff; }
  button { padding: 10px 14px; border: none; border-radius: 8px; background: #4CAF50;
           color: #fff; cursor: pointer; }
  #suggestions button { background: #333; font-size: 0.85em; margin: 4px 4px 0 0; }
</style>
</head>
<body>
<div class="wrap">
  <h1>🩺 Dr. HealthMate</h1>
  <div id="chat">{{messages}}</div>
  <div id="suggestions"></div>
  <div id="controls">
    <input id="input" placeholder="Ask a health question...">
    <button onclick="send()">Send</button>
    <button onclick="clearChat()">Clear</button>
    <button onclick="exportChat()">Export</button>
  </div>
</div>
<script>
const chat = document.getElementById('chat');
const input = document.getElementById('input');
const suggestions = document.getElementById('suggestions');

function addMessage(msg, cls) {
  const div = document.createElement('div');
  div.className = 'msg ' + cls;
  div.innerHTML = '<div class="sender">' + msg.sender + '</div>' +
                  '<div class="text">' + msg.text + '</div>' +
                  '<div class="time">' + msg.timestamp + '</div>';
  chat.appendChild(div);
  chat.scrollTop = chat.scrollHeight;
}

async function send() {
  const message = input.value.trim();
  if (!message) return;
  input.value = '';
  const resp = await fetch('/ask', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ message })
  });
  if (!resp.ok) return;
  const data = await resp.json();
  addMessage(data.user_message, 'user');
  addMessage(data.bot_message, 'bot');
  suggestions.innerHTML = '';
  (data.suggestions || []).forEach(s => {
    const b = document.createElement('button');
    b.textContent = s;
    b.onclick = () => { input.value = s; send(); };
    suggestions.appendChild(b);
  });
}

async function clearChat() {
  await fetch('/clear_chat', { method: 'POST' });
  location.reload();
}

async function exportChat() {
  const resp = await fetch('/export_chat');
  const data = await resp.json();
  const blob = new Blob([data.export_text], { type: 'text/plain' });
  const a = document.createElement('a');
  a.href = URL.createObjectURL(blob);
  a.download = data.filename;
  a.click();
}

input.addEventListener('keydown', e => { if (e.key === 'Enter') send(); });
</script>
</body>
</html>
"#;
